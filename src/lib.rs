#![cfg_attr(not(test), no_std)]
#![doc = include_str!("../README.md")]
//!
//! ## Design Principles
//!
//! - **Type-safe**: gain, LED drive and interrupt source are enums, invalid
//!   raw values are rejected before any bus traffic
//! - **Async-first**: built on `embedded-hal-async` I2C, delay and pin traits
//! - **Cancellable**: every status poll and the ready-pin wait observe a shared
//!   [`Halt`] token
//!
//! ## Module Organization
//!
//! - [`calib`]: integration time and LED drive quantization, channel decoding
//! - [`control`]: gain, reset and identification
//! - [`halt`]: cooperative cancellation
//! - [`measure`]: conversion sequencing and the [`Spectrum`] result
//!
//! ## Basic Usage
//!
//! ```no_run
//! # async fn example<I, D>(i2c: I, delay: D) -> Result<(), as7262::Error<I::Error>>
//! # where I: embedded_hal_async::i2c::I2c, D: embedded_hal_async::delay::DelayNs {
//! use as7262::{As7262, Halt, Opts};
//! use core::time::Duration;
//!
//! static HALT: Halt = Halt::new();
//!
//! let mut sensor = As7262::new(i2c, delay, &HALT, Opts::polling())?;
//! let spectrum = sensor.measure(100.0, Duration::from_millis(50)).await?;
//! # Ok(())
//! # }
//! ```

use core::{fmt, time::Duration};

use embedded_hal_async::{delay::DelayNs, digital, i2c::*};

pub mod calib;
pub mod control;
mod defs;
pub mod halt;
mod log;
pub mod measure;
mod poll;
pub(crate) mod rw;
#[cfg(test)]
mod sim;
mod types;
mod virt;

pub use calib::LedDrive;
pub use halt::Halt;
pub use measure::{Band, Spectrum, Stage};
pub use types::*;

/// Bus operation active when a transport error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Op {
  ReadingStatus,
  SettingVirtualRegister,
  WritingVirtualRegister,
  ReadingVirtualRegister,
  ClearingBuffer,
}

impl Op {
  pub const fn as_str(self) -> &'static str {
    match self {
      Op::ReadingStatus => "reading status register",
      Op::SettingVirtualRegister => "setting virtual register",
      Op::WritingVirtualRegister => "writing virtual register",
      Op::ReadingVirtualRegister => "reading virtual register",
      Op::ClearingBuffer => "clearing buffer",
    }
  }
}

impl fmt::Display for Op {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Driver error type.
///
/// Wraps the underlying I2C error together with the operation that was on
/// the bus, and adds the AS7262-specific failure modes.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
  /// I2C exchange failed. Never retried.
  I2c(Op, E),
  /// Status register did not become ready before the timeout
  Deadline,
  /// The device was halted
  Halted,
  /// Raw gain code outside `0..=3`
  InvalidGain(u8),
  /// Rejected configuration (e.g. a zero timeout)
  InvalidConfig,
  /// Ready pin did not fire before the timeout
  PinTimeout,
  /// Ready pin reported an error while waiting
  Pin,
  /// Device type mismatch (expected 0x40)
  InvalidDeviceType(u8),
  /// Register contents could not be packed or unpacked
  Data,
}

impl<E> Error<E> {
  /// Bus operation for transport errors.
  pub fn op(&self) -> Option<Op> {
    match self {
      Error::I2c(op, _) => Some(*op),
      _ => None,
    }
  }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Error::I2c(op, e) => write!(f, "ioerror while {op}: {e:?}"),
      Error::Deadline => f.write_str("status deadline exceeded"),
      Error::Halted => f.write_str("sensor halted"),
      Error::InvalidGain(g) => write!(f, "bad gain value {g:#04x}"),
      Error::InvalidConfig => f.write_str("invalid configuration"),
      Error::PinTimeout => f.write_str("timeout waiting for interrupt signal on pin"),
      Error::Pin => f.write_str("error waiting for interrupt signal on pin"),
      Error::InvalidDeviceType(t) => write!(f, "unexpected device type {t:#04x}"),
      Error::Data => f.write_str("undecodable register contents"),
    }
  }
}

/// How conversion completion is detected.
pub enum InterruptSource<P> {
  /// Poll the control register's data-ready bit.
  Poll,
  /// Wait for a falling edge on the sensor's INT output.
  Pin(P),
}

/// Stand-in pin for [`InterruptSource::Poll`]. Never fires.
pub struct NoPin;

impl embedded_hal::digital::ErrorType for NoPin {
  type Error = core::convert::Infallible;
}

impl digital::Wait for NoPin {
  async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
    core::future::pending().await
  }

  async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
    core::future::pending().await
  }

  async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
    core::future::pending().await
  }

  async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
    core::future::pending().await
  }

  async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
    core::future::pending().await
  }
}

/// Device configuration.
pub struct Opts<P = NoPin> {
  /// Initial gain, used by [`As7262::measure`].
  pub gain: Gain,
  /// Highest LED drive `measure` will ever apply.
  pub max_drive: LedDrive,
  pub interrupt: InterruptSource<P>,
  /// Per-operation timeout for status polls and conversion.
  pub timeout: Duration,
}

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_millis(200);

impl Opts<NoPin> {
  /// 1x gain, 100 mA drive cap, polled completion, 200 ms timeout.
  pub const fn polling() -> Self {
    Self { gain: Gain::G1x, max_drive: LedDrive::Ma100, interrupt: InterruptSource::Poll, timeout: DEFAULT_TIMEOUT }
  }
}

impl<P> Opts<P> {
  /// Same defaults as [`polling`](Opts::polling) with completion signalled on `pin`.
  pub const fn with_pin(pin: P) -> Self {
    Self { gain: Gain::G1x, max_drive: LedDrive::Ma100, interrupt: InterruptSource::Pin(pin), timeout: DEFAULT_TIMEOUT }
  }
}

impl Default for Opts<NoPin> {
  fn default() -> Self {
    Self::polling()
  }
}

/// AS7262 device driver instance.
///
/// Owns the I2C bus, the delay provider used as poll ticker and the optional
/// ready pin. Only one operation may run at a time (enforced by `&mut self`);
/// the shared [`Halt`] is the one way to stop an operation that is in flight.
///
/// # Type Parameters
///
/// - `I`: I2C implementation (must implement `embedded_hal_async::i2c::I2c`)
/// - `D`: Delay provider (must implement `embedded_hal_async::delay::DelayNs`)
/// - `P`: Ready pin (must implement `embedded_hal_async::digital::Wait`)
pub struct As7262<'a, I, D, P = NoPin> {
  i2c: I,
  delay: D,
  int_pin: Option<P>,
  halt: &'a Halt,
  gain: Gain,
  max_drive: LedDrive,
  timeout: Duration,
  stage: Stage,
}

impl<'a, I, D, P, E> As7262<'a, I, D, P>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  P: digital::Wait,
{
  /// Create a driver instance. No bus traffic happens here.
  ///
  /// Fails with [`Error::InvalidConfig`] for a zero timeout.
  pub fn new(i2c: I, delay: D, halt: &'a Halt, opts: Opts<P>) -> Result<Self, Error<E>> {
    if opts.timeout.is_zero() {
      return Err(Error::InvalidConfig);
    }
    let int_pin = match opts.interrupt {
      InterruptSource::Poll => None,
      InterruptSource::Pin(p) => Some(p),
    };
    Ok(Self {
      i2c,
      delay,
      int_pin,
      halt,
      gain: opts.gain,
      max_drive: opts.max_drive,
      timeout: opts.timeout,
      stage: Stage::Idle,
    })
  }

  /// Halt the device. Any in-flight or later operation fails with
  /// [`Error::Halted`]. Always succeeds, repeated calls included.
  pub fn halt(&self) -> Result<(), Error<E>> {
    self.halt.halt();
    Ok(())
  }

  pub fn is_halted(&self) -> bool {
    self.halt.is_halted()
  }

  /// Gain applied by the next measurement.
  pub fn gain(&self) -> Gain {
    self.gain
  }

  /// Where the last (or current) measurement got to.
  pub fn stage(&self) -> Stage {
    self.stage
  }

  /// Give back the bus, the delay and the ready pin.
  pub fn release(self) -> (I, D, Option<P>) {
    (self.i2c, self.delay, self.int_pin)
  }
}

impl<I, D, P> fmt::Display for As7262<'_, I, D, P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("AMS AS7262 6 channel visible spectrum sensor")
  }
}
