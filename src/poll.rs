use core::time::Duration;

use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{
  As7262, Error, Op,
  defs::*,
  log::{debug, trace},
};

/// Which status bit counts as "ready".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Direction {
  /// A byte is waiting in the read register.
  Reading,
  /// The write register can take a byte.
  Writing,
  /// Read register empty (stale bytes are drained) and write register free.
  ClearBuffer,
}

/// Time budget of one operation, measured in poll ticks.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
  budget_us: u64,
  elapsed_us: u64,
}

impl Deadline {
  pub(crate) fn new(timeout: Duration) -> Self {
    Self { budget_us: timeout.as_micros().min(u64::MAX as u128) as u64, elapsed_us: 0 }
  }

  pub(crate) fn expired(&self) -> bool {
    self.elapsed_us >= self.budget_us
  }

  pub(crate) fn elapse(&mut self, us: u32) {
    self.elapsed_us = self.elapsed_us.saturating_add(us as u64);
  }
}

impl<I, D, P, E> As7262<'_, I, D, P>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Poll the status register until `dir` is ready.
  ///
  /// Checked after every status read, in this order: halted, ready, deadline.
  /// A halted device fails without touching the bus.
  pub(crate) async fn poll_status(&mut self, dir: Direction, deadline: &mut Deadline) -> Result<(), Error<E>> {
    if self.halt.is_halted() {
      return Err(Error::Halted);
    }

    loop {
      let st = self.read_status().await?;
      let ready = match dir {
        Direction::Reading => st & RX_VALID != 0,
        Direction::Writing => st & TX_VALID == 0,
        Direction::ClearBuffer if st & RX_VALID != 0 => {
          let _stale = self.read_data(Op::ClearingBuffer).await?;
          trace!("drained stale byte {=u8:#x}", _stale);
          false
        }
        Direction::ClearBuffer => st & TX_VALID == 0,
      };

      if self.halt.is_halted() {
        return Err(Error::Halted);
      }
      if ready {
        return Ok(());
      }
      if deadline.expired() {
        debug!("status poll ({}) deadline exceeded", dir);
        return Err(Error::Deadline);
      }
      self.delay.delay_us(POLL_TICK_US).await;
      deadline.elapse(POLL_TICK_US);
    }
  }

  /// [`poll_status`](Self::poll_status) against `shared`, or against a fresh
  /// window of the configured timeout when there is none.
  pub(crate) async fn poll_within(&mut self, dir: Direction, shared: Option<&mut Deadline>) -> Result<(), Error<E>> {
    match shared {
      Some(deadline) => self.poll_status(dir, deadline).await,
      None => self.poll_status(dir, &mut Deadline::new(self.timeout)).await,
    }
  }
}
