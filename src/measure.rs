//! One-shot spectral measurement.
//!
//! [`As7262::measure`] runs the whole conversion: integration time, LED drive
//! and one-shot trigger are written, completion is awaited (on the ready pin
//! or by polling the control register), the LED is switched off again and
//! all six channels plus the die temperature are read back.
//!
//! # Examples
//!
//! ```no_run
//! # async fn example<I: embedded_hal_async::i2c::I2c, D: embedded_hal_async::delay::DelayNs>(
//! #   mut sensor: as7262::As7262<'_, I, D>,
//! # ) -> Result<(), as7262::Error<I::Error>> {
//! use core::time::Duration;
//!
//! let spectrum = sensor.measure(25.0, Duration::from_millis(100)).await?;
//! for band in &spectrum.bands {
//!   let _ = (band.wavelength_nm, band.value);
//! }
//! # Ok(())
//! # }
//! ```

use core::{fmt, time::Duration};

use embassy_futures::select::{Either3, select3};
use embedded_hal_async::{delay::DelayNs, digital, i2c::*};

use crate::{
  As7262, BankMode, Error, Gain, LedDrive,
  calib::{self, calibrated, raw_counts},
  control::Control,
  defs::*,
  log::{debug, trace, warning},
  poll::Deadline,
};

/// Progress of a measurement. `Halted` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
  #[default]
  Idle,
  Configuring,
  AwaitingConversion,
  Draining,
  Done,
  Halted,
}

/// One spectral channel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Band {
  /// Channel letter: V, B, G, Y, O or R.
  pub name: char,
  /// Center wavelength.
  pub wavelength_nm: u16,
  /// Calibrated intensity as stored by the device.
  pub value: f32,
  /// Raw ADC counts.
  pub counts: u16,
}

impl fmt::Display for Band {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} Band({}nm) {:7.1} counts", self.name, self.wavelength_nm, self.value)
  }
}

const BANDS: [(char, u16); CHANNELS] = [('V', 450), ('B', 500), ('G', 550), ('Y', 570), ('O', 600), ('R', 650)];

/// Result of one measurement, with the settings actually applied.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Spectrum {
  /// Ordered by wavelength, violet first.
  pub bands: [Band; CHANNELS],
  /// Die temperature in degrees Celsius.
  pub temperature_c: u8,
  pub gain: Gain,
  pub led_drive: LedDrive,
  /// Quantized integration time.
  pub integration: Duration,
}

impl Spectrum {
  fn new(raw: &[u8; RAW_LEN], cal: &[u8; CAL_LEN], temperature_c: u8, gain: Gain, led_drive: LedDrive, integration: Duration) -> Self {
    let counts = raw_counts(raw);
    let values = calibrated(cal);
    let bands = core::array::from_fn(|i| Band { name: BANDS[i].0, wavelength_nm: BANDS[i].1, value: values[i], counts: counts[i] });
    Self { bands, temperature_c, gain, led_drive, integration }
  }
}

impl fmt::Display for Spectrum {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Spectrum: Gain:{}, Led Drive {}, Sense Time: ", self.gain, self.led_drive)?;
    write_ms(f, self.integration)?;
    for band in &self.bands {
      write!(f, "\n{band}")?;
    }
    Ok(())
  }
}

// Milliseconds with trailing zeros of the fraction trimmed: 2.8ms, 714ms.
fn write_ms(f: &mut fmt::Formatter<'_>, d: Duration) -> fmt::Result {
  let us = d.as_micros();
  write!(f, "{}", us / 1_000)?;
  let mut frac = us % 1_000;
  if frac != 0 {
    let mut width = 3;
    while frac % 10 == 0 {
      frac /= 10;
      width -= 1;
    }
    write!(f, ".{frac:0width$}")?;
  }
  f.write_str("ms")
}

impl<I, D, P, E> As7262<'_, I, D, P>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  P: digital::Wait,
{
  /// Take one measurement with the LED driven at up to `drive_ma` milliamps
  /// for `integration`.
  ///
  /// Both settings are floored to what the device supports and the drive is
  /// capped by [`Opts::max_drive`](crate::Opts::max_drive); the returned
  /// [`Spectrum`] records the values actually used. Fails with
  /// [`Error::Halted`] if the device is halted before or during the
  /// measurement, never with a late result.
  pub async fn measure(&mut self, drive_ma: f32, integration: Duration) -> Result<Spectrum, Error<E>> {
    let res = self.run_measure(drive_ma, integration).await;
    let stage = match &res {
      Ok(_) => Stage::Done,
      Err(_) if self.halt.is_halted() => Stage::Halted,
      Err(_) => Stage::Idle,
    };
    if res.is_err() {
      debug!("measurement failed in stage {}", self.stage);
    }
    self.set_stage(stage);
    res
  }

  async fn run_measure(&mut self, drive_ma: f32, integration: Duration) -> Result<Spectrum, Error<E>> {
    if self.halt.is_halted() {
      return Err(Error::Halted);
    }

    let (int_code, integration) = calib::integration_code(integration);
    let led_drive = LedDrive::floor(drive_ma).min(self.max_drive);
    let ctrl = Control { bank: BankMode::OneShot, gain: self.gain, interrupt: self.int_pin.is_some(), ..Default::default() };
    let [ctrl]: [u8; 1] = ctrl.try_into().map_err(|_| Error::Data)?;

    self.set_stage(Stage::Configuring);
    let mut deadline = Deadline::new(self.timeout);
    self.write_virtual(VReg::IntTime.into(), int_code, Some(&mut deadline)).await?;
    self.write_virtual(VReg::LedControl.into(), led_drive.code(), Some(&mut deadline)).await?;
    self.write_virtual(VReg::Control.into(), ctrl, Some(&mut deadline)).await?;

    self.set_stage(Stage::AwaitingConversion);
    if self.int_pin.is_some() {
      self.wait_ready_pin().await?;
    } else {
      self.poll_data_ready().await?;
    }

    self.set_stage(Stage::Draining);
    self.write_vreg(VReg::LedControl, LedDrive::Off.code()).await?;
    let mut raw = [0u8; RAW_LEN];
    self.read_vreg(VReg::RawBase, &mut raw).await?;
    let mut cal = [0u8; CAL_LEN];
    self.read_vreg(VReg::CalBase, &mut cal).await?;
    let temperature_c = self.temperature().await?;

    if self.halt.is_halted() {
      return Err(Error::Halted);
    }
    Ok(Spectrum::new(&raw, &cal, temperature_c, self.gain, led_drive, integration))
  }

  /// Re-read the control register until DATA_RDY is set. Every read gets
  /// its own status deadline, the whole wait is bounded by the timeout.
  async fn poll_data_ready(&mut self) -> Result<(), Error<E>> {
    let mut budget = Deadline::new(self.timeout);
    loop {
      let ctrl: Control = self.read_reg(VReg::Control).await?;
      if self.halt.is_halted() {
        return Err(Error::Halted);
      }
      if ctrl.data_ready {
        return Ok(());
      }
      if budget.expired() {
        debug!("conversion did not complete in time");
        return Err(Error::Deadline);
      }
      trace!("conversion pending");
      self.delay.delay_us(POLL_TICK_US).await;
      budget.elapse(POLL_TICK_US);
    }
  }

  /// Wait for the INT falling edge, the timeout or a halt, whichever is first.
  async fn wait_ready_pin(&mut self) -> Result<(), Error<E>> {
    let Some(pin) = self.int_pin.as_mut() else {
      return Ok(());
    };
    let timeout_us = self.timeout.as_micros().min(u32::MAX as u128) as u32;

    let res = select3(pin.wait_for_falling_edge(), self.delay.delay_us(timeout_us), self.halt.wait()).await;
    match res {
      Either3::First(Ok(())) => {}
      Either3::First(Err(_)) => {
        warning!("ready pin failed");
        return Err(Error::Pin);
      }
      Either3::Second(()) => {
        warning!("no ready signal within {=u32} us", timeout_us);
        return Err(Error::PinTimeout);
      }
      Either3::Third(()) => return Err(Error::Halted),
    }

    if self.halt.is_halted() {
      return Err(Error::Halted);
    }
    Ok(())
  }

  fn set_stage(&mut self, stage: Stage) {
    if self.stage != stage {
      trace!("stage {} -> {}", self.stage, stage);
      self.stage = stage;
    }
  }
}
