//! Host-side test doubles: a simulated chip speaking the virtual register
//! protocol, a tick-counting delay, a scriptable ready pin, and transaction
//! builders for `embedded-hal-mock`.

use core::time::Duration;

use embedded_hal::digital::ErrorKind as PinErrorKind;
use embedded_hal_async::{delay::DelayNs, digital, i2c::*};
use embedded_hal_mock::eh1::i2c::Transaction;

use crate::{Halt, Op, defs::*};

const DATA_RDY: u8 = 0x02;

/// Simulated AS7262 behind the three physical registers.
pub(crate) struct Chip<'h> {
  pub regs: [u8; 0x40],
  /// Every exchange in order, with the role it played on the wire.
  pub log: Vec<(Op, Vec<u8>)>,
  /// Unread byte left over from an earlier transfer.
  pub stale: Option<u8>,
  /// Status reads reporting "write busy" after each accepted write.
  pub busy_polls: usize,
  pub stuck_busy: bool,
  /// Control register reads after a one-shot trigger before DATA_RDY is set.
  pub conversion_reads: usize,
  /// Exchange index that fails with a bus error.
  pub fail_at: Option<usize>,
  halt_at: Option<(usize, &'h Halt)>,
  rx: Option<u8>,
  addr: Option<u8>,
  busy_left: usize,
  converting: Option<usize>,
}

impl<'h> Chip<'h> {
  pub fn new() -> Self {
    Self {
      regs: [0; 0x40],
      log: Vec::new(),
      stale: None,
      busy_polls: 0,
      stuck_busy: false,
      conversion_reads: 0,
      fail_at: None,
      halt_at: None,
      rx: None,
      addr: None,
      busy_left: 0,
      converting: None,
    }
  }

  /// Chip with channel data loaded: raw counts `0xAABB`, calibrated values
  /// `cal`, temperature `temp`.
  pub fn loaded(cal: [f32; CHANNELS], temp: u8) -> Self {
    let mut chip = Self::new();
    for i in 0..CHANNELS {
      let raw = VReg::RawBase as usize + i * 2;
      chip.regs[raw..raw + 2].copy_from_slice(&[0xAA, 0xBB]);
      let c = VReg::CalBase as usize + i * 4;
      chip.regs[c..c + 4].copy_from_slice(&cal[i].to_be_bytes());
    }
    chip.regs[VReg::DeviceTemp as usize] = temp;
    chip
  }

  /// Trigger `halt` right after exchange `n` (0-based) completes.
  pub fn halt_after(mut self, n: usize, halt: &'h Halt) -> Self {
    self.halt_at = Some((n, halt));
    self
  }

  pub fn ops(&self) -> Vec<Op> {
    self.log.iter().map(|(op, _)| *op).collect()
  }

  fn role(&self, w: &[u8]) -> Op {
    match w {
      [0x01, _] if self.addr.is_some() => Op::WritingVirtualRegister,
      [0x01, _] => Op::SettingVirtualRegister,
      [0x02] if self.stale.is_some() => Op::ClearingBuffer,
      [0x02] => Op::ReadingVirtualRegister,
      _ => Op::ReadingStatus,
    }
  }

  fn store(&mut self, a: u8, v: u8) {
    let a = a & 0x3F;
    if a == VReg::Control as u8 {
      self.regs[a as usize] = v & !DATA_RDY & 0x7F;
      if (v >> 2) & 0x03 == 0x03 {
        self.converting = Some(self.conversion_reads);
      }
    } else {
      self.regs[a as usize] = v;
    }
  }

  fn load(&mut self, a: u8) -> u8 {
    let a = a & 0x3F;
    if a == VReg::Control as u8 {
      match self.converting {
        Some(0) => {
          self.regs[a as usize] |= DATA_RDY;
          self.converting = None;
        }
        Some(n) => self.converting = Some(n - 1),
        None => {}
      }
    }
    self.regs[a as usize]
  }

  fn process(&mut self, w: &[u8], r: &mut [u8]) {
    match w {
      [0x00] => {
        let mut st = 0;
        if self.rx.is_some() || self.stale.is_some() {
          st |= RX_VALID;
        }
        if self.stuck_busy || self.busy_left > 0 {
          st |= TX_VALID;
          self.busy_left = self.busy_left.saturating_sub(1);
        }
        r[0] = st;
      }
      [0x01, b] => {
        let b = *b;
        match self.addr.take() {
          Some(a) => self.store(a, b),
          None if b & WRITE_BIT != 0 => self.addr = Some(b & !WRITE_BIT),
          None => self.rx = Some(self.load(b)),
        }
        self.busy_left = self.busy_polls;
      }
      [0x02] => r[0] = self.stale.take().or(self.rx.take()).unwrap_or(0),
      other => panic!("unexpected exchange {other:02x?}"),
    }
  }
}

impl ErrorType for Chip<'_> {
  type Error = ErrorKind;
}

impl I2c<SevenBitAddress> for Chip<'_> {
  async fn transaction(&mut self, address: SevenBitAddress, ops: &mut [Operation<'_>]) -> Result<(), Self::Error> {
    assert_eq!(address, ADDR_I2C);
    let mut w = Vec::new();
    for op in ops.iter() {
      if let Operation::Write(b) = op {
        w.extend_from_slice(b);
      }
    }
    let idx = self.log.len();
    let role = self.role(&w);
    self.log.push((role, w.clone()));
    if self.fail_at == Some(idx) {
      return Err(ErrorKind::Other);
    }

    let mut r = [0u8; 1];
    self.process(&w, &mut r);
    for op in ops.iter_mut() {
      if let Operation::Read(buf) = op {
        assert_eq!(buf.len(), 1, "reads are one byte at a time");
        buf[0] = r[0];
      }
    }

    if let Some((n, halt)) = self.halt_at {
      if n == idx {
        halt.halt();
      }
    }
    Ok(())
  }
}

/// Delay that counts calls. Optionally sleeps for real, or never finishes
/// for delays longer than `hang_over_us`.
#[derive(Default)]
pub(crate) struct TickDelay {
  pub ticks: usize,
  pub real: bool,
  pub hang_over_us: Option<u32>,
}

impl DelayNs for TickDelay {
  async fn delay_ns(&mut self, ns: u32) {
    self.ticks += 1;
    if let Some(max) = self.hang_over_us {
      if ns / 1_000 > max {
        core::future::pending::<()>().await;
      }
    }
    if self.real {
      std::thread::sleep(Duration::from_nanos(ns as u64));
    }
  }

  async fn delay_us(&mut self, us: u32) {
    self.delay_ns(us.saturating_mul(1_000)).await
  }

  async fn delay_ms(&mut self, ms: u32) {
    self.delay_ns(ms.saturating_mul(1_000_000)).await
  }
}

/// Ready pin that has either already fired, fails, or never fires.
#[derive(Default)]
pub(crate) struct TestPin {
  pub fired: bool,
  pub fail: bool,
}

impl TestPin {
  async fn edge(&mut self) -> Result<(), PinErrorKind> {
    if self.fail {
      return Err(PinErrorKind::Other);
    }
    if !self.fired {
      core::future::pending::<()>().await;
    }
    Ok(())
  }
}

impl embedded_hal::digital::ErrorType for TestPin {
  type Error = PinErrorKind;
}

impl digital::Wait for TestPin {
  async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
    self.edge().await
  }

  async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
    self.edge().await
  }

  async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
    self.edge().await
  }

  async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
    self.edge().await
  }

  async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
    self.edge().await
  }
}

// embedded-hal-mock transaction builders

pub(crate) fn status(v: u8) -> Transaction {
  Transaction::write_read(ADDR_I2C, vec![Reg::Status as u8], vec![v])
}

pub(crate) fn status_err() -> Transaction {
  status(0x00).with_error(ErrorKind::Other)
}

pub(crate) fn write(v: u8) -> Transaction {
  Transaction::write(ADDR_I2C, vec![Reg::Write as u8, v])
}

pub(crate) fn write_err(v: u8) -> Transaction {
  write(v).with_error(ErrorKind::Other)
}

pub(crate) fn read(v: u8) -> Transaction {
  Transaction::write_read(ADDR_I2C, vec![Reg::Read as u8], vec![v])
}

pub(crate) fn read_err() -> Transaction {
  read(0x00).with_error(ErrorKind::Other)
}

/// Traffic of one virtual register write against an idle chip.
pub(crate) fn vwrite(reg: u8, v: u8) -> [Transaction; 4] {
  [status(0x00), write(reg | WRITE_BIT), status(0x00), write(v)]
}

/// Traffic of one virtual register byte read against an idle chip.
pub(crate) fn vread(reg: u8, v: u8) -> [Transaction; 4] {
  [status(0x00), write(reg), status(RX_VALID), read(v)]
}

pub(crate) type MockDev<'h> = crate::As7262<'h, embedded_hal_mock::eh1::i2c::Mock, TickDelay>;

/// Driver on a mocked bus replaying `tx`, polling for completion.
pub(crate) fn mock_dev<'h>(tx: &[Transaction], halt: &'h Halt, timeout: Duration) -> MockDev<'h> {
  let opts = crate::Opts { timeout, ..crate::Opts::polling() };
  crate::As7262::new(embedded_hal_mock::eh1::i2c::Mock::new(tx), TickDelay::default(), halt, opts).unwrap()
}

/// Check that every expected transaction was consumed.
pub(crate) fn finish(dev: MockDev<'_>) {
  let (mut i2c, _, _) = dev.release();
  i2c.done();
}
