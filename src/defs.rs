#![allow(dead_code)]

/// Physical registers, the only ones addressable on the bus.
#[repr(u8)]
pub(crate) enum Reg {
  Status = 0x00,
  Write = 0x01,
  Read = 0x02,
}

impl From<Reg> for u8 {
  #[inline]
  fn from(r: Reg) -> Self {
    r as u8
  }
}

/// Virtual registers, reached through `Reg::Write`/`Reg::Read`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VReg {
  DeviceType = 0x00,
  HwVersion = 0x01,
  Control = 0x04,
  IntTime = 0x05,
  DeviceTemp = 0x06,
  LedControl = 0x07,
  RawBase = 0x08,
  CalBase = 0x14,
}

impl From<VReg> for u8 {
  #[inline]
  fn from(r: VReg) -> Self {
    r as u8
  }
}

// Status register bits
pub(crate) const RX_VALID: u8 = 0x01;
pub(crate) const TX_VALID: u8 = 0x02;

// Set on the address byte of a virtual register write.
pub(crate) const WRITE_BIT: u8 = 0x80;

// I2C address
pub(crate) const ADDR_I2C: u8 = 0x49;

pub(crate) const AS7262_DEVICE_TYPE: u8 = 0x40;

/// Status poll interval in microseconds.
pub(crate) const POLL_TICK_US: u32 = 1_000;

/// Integration time register LSB, in microseconds.
pub(crate) const INT_TICK_US: u32 = 2_800;

pub(crate) const CHANNELS: usize = 6;
pub(crate) const RAW_LEN: usize = CHANNELS * 2;
pub(crate) const CAL_LEN: usize = CHANNELS * 4;
