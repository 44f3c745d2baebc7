//! Hardware seams: where the engine meets pins and time.
//!
//! The engine never touches a peripheral directly. Levels come in through
//! [`InputLine`], timestamps through [`Clock`], so the decoding logic is
//! portable and can be driven off-target in tests.

use core::convert::Infallible;

use embedded_hal::digital::v2::InputPin;

/// Input bias of a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    /// High-impedance input, biased externally.
    Floating,
    /// Internal pull-up enabled.
    Up,
}

/// One digital input line.
pub trait InputLine {
    /// Apply the input bias. Called once, before polling starts.
    fn configure(&mut self, pull: Pull);

    /// Sample the current level, true = high.
    fn read(&mut self) -> bool;
}

/// Monotonic millisecond counter.
///
/// Wraps at `u32::MAX`; every duration in this crate is computed with
/// wrapping subtraction, so a wrap mid-sequence is harmless.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// A shared reference works as a clock, so one timer instance can serve
/// any number of switches.
impl<'a, C: Clock> Clock for &'a C {
    fn now_ms(&self) -> u32 {
        (*self).now_ms()
    }
}

/// Adapter for infallible `embedded-hal` input pins.
///
/// HAL pins carry their bias in the type and arrive here already
/// configured, so `configure` is a no-op for them.
pub struct HalLine<P> {
    pin: P,
}

impl<P> HalLine<P> {
    pub fn new(pin: P) -> Self {
        HalLine { pin }
    }

    /// Give the wrapped pin back.
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P> InputLine for HalLine<P>
where
    P: InputPin<Error = Infallible>,
{
    fn configure(&mut self, _pull: Pull) {}

    fn read(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(level) => level,
            Err(e) => match e {},
        }
    }
}
