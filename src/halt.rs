//! Cooperative cancellation of in-flight device operations.
//!
//! A [`Halt`] is shared between the task driving the sensor and whoever may
//! need to stop it. The driver checks it at every suspension point (each
//! status poll tick and the wait on the ready pin), so a halt is observed
//! within one tick. Halting is one-shot: a halted device rejects everything
//! afterwards and has to be dropped.
//!
//! ```no_run
//! use as7262::Halt;
//!
//! static HALT: Halt = Halt::new();
//!
//! // from an interrupt handler, another task or another core:
//! HALT.halt();
//! ```

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use portable_atomic::{AtomicBool, Ordering};

/// Halt latch plus a wake-up for tasks parked on the ready pin.
pub struct Halt {
  halted: AtomicBool,
  wake: Signal<CriticalSectionRawMutex, ()>,
}

impl Halt {
  pub const fn new() -> Self {
    Self { halted: AtomicBool::new(false), wake: Signal::new() }
  }

  /// Latch the halt and wake any pending ready-pin wait. Idempotent.
  pub fn halt(&self) {
    self.halted.store(true, Ordering::Release);
    self.wake.signal(());
  }

  #[inline]
  pub fn is_halted(&self) -> bool {
    self.halted.load(Ordering::Acquire)
  }

  /// Resolves once [`halt`](Self::halt) has been called. Several devices
  /// may wait on one token: each waiter hands the wake-up on to the next.
  pub(crate) async fn wait(&self) {
    while !self.is_halted() {
      self.wake.wait().await;
    }
    self.wake.signal(());
  }
}

impl Default for Halt {
  fn default() -> Self {
    Self::new()
  }
}
