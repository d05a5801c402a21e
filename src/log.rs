// Internal logging. Forwards to `defmt` when the feature is on, otherwise the
// arguments are only borrowed so nothing is moved or left unused.

macro_rules! trace {
  ($s:literal $(, $x:expr)* $(,)?) => {{
    #[cfg(feature = "defmt")]
    defmt::trace!($s $(, $x)*);
    #[cfg(not(feature = "defmt"))]
    let _ = ($(&$x,)*);
  }};
}

macro_rules! debug {
  ($s:literal $(, $x:expr)* $(,)?) => {{
    #[cfg(feature = "defmt")]
    defmt::debug!($s $(, $x)*);
    #[cfg(not(feature = "defmt"))]
    let _ = ($(&$x,)*);
  }};
}

macro_rules! warning {
  ($s:literal $(, $x:expr)* $(,)?) => {{
    #[cfg(feature = "defmt")]
    defmt::warn!($s $(, $x)*);
    #[cfg(not(feature = "defmt"))]
    let _ = ($(&$x,)*);
  }};
}

pub(crate) use {debug, trace, warning};
