//! Control register, gain selection and device identification.
//!
//! # Examples
//!
//! ```no_run
//! # async fn example<I: embedded_hal_async::i2c::I2c, D: embedded_hal_async::delay::DelayNs>(
//! #   mut sensor: as7262::As7262<'_, I, D>,
//! # ) -> Result<(), as7262::Error<I::Error>> {
//! use as7262::Gain;
//!
//! sensor.probe().await?;
//! sensor.set_gain(Gain::G16x).await?;
//! let ctrl = sensor.get_control().await?;
//! assert_eq!(ctrl.gain, Gain::G16x);
//! # Ok(())
//! # }
//! ```

use core::time::Duration;

use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{As7262, BankMode, Error, Gain, defs::*, log::debug, poll::Deadline};

/// Time the device needs to come back after a soft reset, in milliseconds.
/// Conservative: the datasheet gives no figure, boot from reset takes a few hundred.
pub const SOFT_RESET_DELAY_MS: u32 = 1_000;

/// Control register (virtual register `0x04`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub struct Control {
  #[skip(1)]
  /// Conversion finished, data registers hold a fresh sample.
  #[bits(1)]
  pub data_ready: bool,
  #[bits(2)]
  pub bank: BankMode,
  #[bits(2)]
  pub gain: Gain,
  /// Drive the INT pin low when data is ready. The pin stays idle without
  /// it, so measurements waiting on a ready pin set it with the trigger.
  #[bits(1)]
  pub interrupt: bool,
  /// Soft reset, self-clearing.
  #[bits(1)]
  pub reset: bool,
}

/// Contents of the identification registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HwVersion {
  pub device_type: u8,
  pub hw_version: u8,
}

impl<I, D, P, E> As7262<'_, I, D, P>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  pub async fn get_control(&mut self) -> Result<Control, Error<E>> {
    self.read_reg(VReg::Control).await
  }

  pub async fn set_control(&mut self, ctrl: Control) -> Result<(), Error<E>> {
    self.write_reg(VReg::Control, ctrl).await
  }

  /// Write the gain into the control register. Other control fields are
  /// cleared. The cached gain used by [`measure`](Self::measure) only
  /// changes if the write succeeds.
  pub async fn set_gain(&mut self, gain: Gain) -> Result<(), Error<E>> {
    self.set_control(Control { gain, ..Default::default() }).await?;
    self.gain = gain;
    debug!("gain set to {}", gain);
    Ok(())
  }

  /// [`set_gain`](Self::set_gain) from a raw register code. Codes outside
  /// `0..=3` are rejected without touching the bus.
  pub async fn set_gain_raw(&mut self, code: u8) -> Result<(), Error<E>> {
    let gain = Gain::try_from(code).map_err(|_| Error::InvalidGain(code))?;
    self.set_gain(gain).await
  }

  /// Reset the device and wait for it to come back. All registers return to
  /// their power-on values; the cached gain is kept and applied again by the
  /// next measurement. The wait is checked for a halt every poll tick.
  pub async fn soft_reset(&mut self) -> Result<(), Error<E>> {
    self.set_control(Control { reset: true, ..Default::default() }).await?;
    let mut boot = Deadline::new(Duration::from_millis(SOFT_RESET_DELAY_MS as u64));
    while !boot.expired() {
      if self.halt.is_halted() {
        return Err(Error::Halted);
      }
      self.delay.delay_us(POLL_TICK_US).await;
      boot.elapse(POLL_TICK_US);
    }
    if self.halt.is_halted() {
      return Err(Error::Halted);
    }
    Ok(())
  }

  pub async fn get_hw_version(&mut self) -> Result<HwVersion, Error<E>> {
    let mut b = [0u8; 2];
    self.read_vreg(VReg::DeviceType, &mut b).await?;
    Ok(HwVersion { device_type: b[0], hw_version: b[1] })
  }

  /// Check that an AS7262 answers on the bus.
  pub async fn probe(&mut self) -> Result<HwVersion, Error<E>> {
    let v = self.get_hw_version().await?;
    if v.device_type != AS7262_DEVICE_TYPE {
      return Err(Error::InvalidDeviceType(v.device_type));
    }
    Ok(v)
  }

  /// Die temperature in degrees Celsius.
  pub async fn temperature(&mut self) -> Result<u8, Error<E>> {
    let mut b = [0u8; 1];
    self.read_vreg(VReg::DeviceTemp, &mut b).await?;
    Ok(b[0])
  }
}
