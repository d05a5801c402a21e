//! Conversions between physical quantities and register contents.
//!
//! Integration time and LED drive current are quantized by the device, so
//! the requested values are floored to what the hardware can do. Callers
//! should use the returned actual values (they are recorded in
//! [`Spectrum`](crate::Spectrum)) rather than what they asked for.

use core::{fmt, time::Duration};

use crate::defs::*;

/// Integration time register value for `t`, and the integration time it
/// actually yields.
///
/// The register counts 2.8 ms steps, from 1 (2.8 ms) to 255 (714 ms).
/// Requests below one step use the shortest time, requests above 714 ms
/// saturate.
///
/// ```
/// # use core::time::Duration;
/// let (code, actual) = as7262::calib::integration_code(Duration::from_millis(500));
/// assert_eq!(code, 178);
/// assert_eq!(actual, Duration::from_micros(498_400));
/// ```
pub fn integration_code(t: Duration) -> (u8, Duration) {
  let steps = t.as_micros() / INT_TICK_US as u128;
  let code = steps.clamp(1, 255) as u8;
  (code, Duration::from_micros(code as u64 * INT_TICK_US as u64))
}

/// LED driver current levels (`LED_CONTROL.ICL_DRV`, bits 5:4, gated by bit 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedDrive {
  #[default]
  Off,
  Ma12_5,
  Ma25,
  Ma50,
  Ma100,
}

const LED_DRV_EN: u8 = 0x08;
const LED_DRV_SHIFT: u8 = 4;

impl LedDrive {
  /// Highest level not exceeding `ma` milliamps. Anything below 12.5 mA,
  /// negative or NaN switches the LED off.
  pub fn floor(ma: f32) -> Self {
    if ma >= 100.0 {
      LedDrive::Ma100
    } else if ma >= 50.0 {
      LedDrive::Ma50
    } else if ma >= 25.0 {
      LedDrive::Ma25
    } else if ma >= 12.5 {
      LedDrive::Ma12_5
    } else {
      LedDrive::Off
    }
  }

  pub const fn milliamps(self) -> f32 {
    match self {
      LedDrive::Off => 0.0,
      LedDrive::Ma12_5 => 12.5,
      LedDrive::Ma25 => 25.0,
      LedDrive::Ma50 => 50.0,
      LedDrive::Ma100 => 100.0,
    }
  }

  /// `LED_CONTROL` register value with the indicator LED off.
  pub const fn code(self) -> u8 {
    match self {
      LedDrive::Off => 0x00,
      LedDrive::Ma12_5 => LED_DRV_EN,
      LedDrive::Ma25 => LED_DRV_EN | 1 << LED_DRV_SHIFT,
      LedDrive::Ma50 => LED_DRV_EN | 2 << LED_DRV_SHIFT,
      LedDrive::Ma100 => LED_DRV_EN | 3 << LED_DRV_SHIFT,
    }
  }
}

impl fmt::Display for LedDrive {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LedDrive::Ma12_5 => f.write_str("12.5mA"),
      d => write!(f, "{}mA", d.milliamps() as u32),
    }
  }
}

/// `LED_CONTROL` value for a requested drive current in milliamps.
pub fn led_drive_code(ma: f32) -> u8 {
  LedDrive::floor(ma).code()
}

/// Raw ADC counts, one big-endian u16 per channel.
pub fn raw_counts(b: &[u8; RAW_LEN]) -> [u16; CHANNELS] {
  let mut out = [0u16; CHANNELS];
  for (o, c) in out.iter_mut().zip(b.chunks_exact(2)) {
    *o = u16::from_be_bytes([c[0], c[1]]);
  }
  out
}

/// Calibrated channel values. The device stores them as big-endian IEEE-754
/// floats, they are reinterpreted, not computed from the raw counts.
pub fn calibrated(b: &[u8; CAL_LEN]) -> [f32; CHANNELS] {
  let mut out = [0f32; CHANNELS];
  for (o, c) in out.iter_mut().zip(b.chunks_exact(4)) {
    *o = f32::from_be_bytes([c[0], c[1], c[2], c[3]]);
  }
  out
}
