use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{As7262, Error, Op, defs::*};

impl<I, D, P, E> As7262<'_, I, D, P>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// One addressed exchange: write `w`, then read `r` if it is not empty.
  /// Failures are tagged with `op` and never retried.
  pub(crate) async fn exchange(&mut self, w: &[u8], r: &mut [u8], op: Op) -> Result<(), Error<E>> {
    let res = if r.is_empty() {
      self.i2c.write(ADDR_I2C, w).await
    } else {
      self.i2c.write_read(ADDR_I2C, w, r).await
    };
    res.map_err(|e| Error::I2c(op, e))
  }

  /// Read the physical status register.
  pub(crate) async fn read_status(&mut self) -> Result<u8, Error<E>> {
    let mut b = [0u8; 1];
    self.exchange(&[Reg::Status.into()], &mut b, Op::ReadingStatus).await?;
    Ok(b[0])
  }

  /// Put one byte into the physical write register.
  pub(crate) async fn write_data(&mut self, v: u8, op: Op) -> Result<(), Error<E>> {
    self.exchange(&[Reg::Write.into(), v], &mut [], op).await
  }

  /// Take one byte from the physical read register.
  pub(crate) async fn read_data(&mut self, op: Op) -> Result<u8, Error<E>> {
    let mut b = [0u8; 1];
    self.exchange(&[Reg::Read.into()], &mut b, op).await?;
    Ok(b[0])
  }
}
