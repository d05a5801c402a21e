use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{
  As7262, Error, Op,
  defs::*,
  poll::{Deadline, Direction},
};

impl<I, D, P, E> As7262<'_, I, D, P>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Write one virtual register.
  ///
  /// The address goes out with the write bit set, then the value. The chip
  /// asserts busy after taking the address, so both phases wait for the
  /// write register to drain. Both waits run against `shared` when given,
  /// otherwise each gets its own timeout window.
  pub(crate) async fn write_virtual(&mut self, reg: u8, v: u8, mut shared: Option<&mut Deadline>) -> Result<(), Error<E>> {
    self.poll_within(Direction::Writing, shared.as_deref_mut()).await?;
    self.write_data(reg | WRITE_BIT, Op::SettingVirtualRegister).await?;
    self.poll_within(Direction::Writing, shared).await?;
    self.write_data(v, Op::WritingVirtualRegister).await
  }

  /// Read `out.len()` consecutive virtual registers starting at `reg`, one
  /// byte per address select. Any stale byte in the read register is
  /// drained before each select. Every status wait gets its own timeout
  /// window.
  pub(crate) async fn read_virtual(&mut self, reg: u8, out: &mut [u8]) -> Result<(), Error<E>> {
    for (i, b) in out.iter_mut().enumerate() {
      self.poll_within(Direction::ClearBuffer, None).await?;
      self.write_data(reg.wrapping_add(i as u8), Op::SettingVirtualRegister).await?;
      self.poll_within(Direction::Reading, None).await?;
      *b = self.read_data(Op::ReadingVirtualRegister).await?;
    }
    Ok(())
  }

  pub(crate) async fn write_vreg(&mut self, reg: VReg, v: u8) -> Result<(), Error<E>> {
    self.write_virtual(reg.into(), v, None).await
  }

  pub(crate) async fn read_vreg(&mut self, reg: VReg, out: &mut [u8]) -> Result<(), Error<E>> {
    self.read_virtual(reg.into(), out).await
  }

  /// Read and unpack a one-byte register into a typed value.
  pub(crate) async fn read_reg<T>(&mut self, reg: VReg) -> Result<T, Error<E>>
  where
    T: TryFrom<[u8; 1]>,
  {
    let mut b = [0u8; 1];
    self.read_vreg(reg, &mut b).await?;
    b.try_into().map_err(|_| Error::Data)
  }

  pub(crate) async fn write_reg<T>(&mut self, reg: VReg, v: T) -> Result<(), Error<E>>
  where
    T: TryInto<[u8; 1]>,
  {
    let [b]: [u8; 1] = v.try_into().map_err(|_| Error::Data)?;
    self.write_vreg(reg, b).await
  }
}
