use core::fmt;

/// Analog gain applied before digitization (`CONTROL.GAIN`, bits 5:4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
  #[default]
  G1x = 0x00,
  /// Nominally 4x, 3.7x per datasheet.
  G3_7x = 0x01,
  G16x = 0x02,
  G64x = 0x03,
}

impl Gain {
  /// Amplification factor.
  pub const fn multiplier(self) -> f32 {
    match self {
      Gain::G1x => 1.0,
      Gain::G3_7x => 3.7,
      Gain::G16x => 16.0,
      Gain::G64x => 64.0,
    }
  }
}

impl From<Gain> for u8 {
  fn from(value: Gain) -> Self {
    value as u8
  }
}

impl TryFrom<u8> for Gain {
  type Error = ();

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0x00 => Ok(Gain::G1x),
      0x01 => Ok(Gain::G3_7x),
      0x02 => Ok(Gain::G16x),
      0x03 => Ok(Gain::G64x),
      _ => Err(()),
    }
  }
}

impl fmt::Display for Gain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Gain::G1x => "1x",
      Gain::G3_7x => "3.7x",
      Gain::G16x => "16x",
      Gain::G64x => "64x",
    })
  }
}

/// Channel bank selection (`CONTROL.BANK`, bits 3:2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BankMode {
  /// Continuous, channels V, B, G, Y.
  #[default]
  Vbgy = 0x00,
  /// Continuous, channels G, Y, O, R.
  Gyor = 0x01,
  /// Continuous, all six channels.
  All = 0x02,
  /// One-shot, all six channels.
  OneShot = 0x03,
}

impl From<BankMode> for u8 {
  fn from(value: BankMode) -> Self {
    value as u8
  }
}

impl TryFrom<u8> for BankMode {
  type Error = ();

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0x00 => Ok(BankMode::Vbgy),
      0x01 => Ok(BankMode::Gyor),
      0x02 => Ok(BankMode::All),
      0x03 => Ok(BankMode::OneShot),
      _ => Err(()),
    }
  }
}
