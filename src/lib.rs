//! Debouncing and gesture decoding for mechanical switches, push buttons
//! and rotary encoders.
//!
//! Raw pin levels bounce. This crate turns them into a small set of clean
//! state transitions — "single push", "double push", "long push", "turned
//! right", "turned left" — using one cooperative, poll-driven engine:
//!
//! - [`Switch`] polls one or two input lines on a timed cadence, applies
//!   debounce filtering and optional level inversion, and reports when
//!   its output state changes.
//! - An [`Analyzer`] attached to the switch interprets the debounced raw
//!   codes: [`RotaryDecoder`] does quadrature decoding,
//!   [`HoldRepeatDecoder`] and [`MultiPressDecoder`] decode timed push
//!   gestures, and `PassThrough` leaves codes untouched for plain
//!   debouncing.
//!
//! Hardware stays outside: pins come in through the [`InputLine`] trait
//! (with [`HalLine`] adapting `embedded-hal` input pins) and time through
//! the [`Clock`] trait, a monotonic millisecond counter. Call
//! [`Switch::poll`] from your main loop or a timer task at least as often
//! as the analyzer's read-cycle period; polling is non-blocking and never
//! suspends.

#![cfg_attr(not(test), no_std)]

mod analyzer;
pub mod hal;
pub mod pushbutton;
pub mod rotary;
mod switch;

pub use analyzer::Analyzer;
pub use hal::{Clock, HalLine, InputLine, Pull};
pub use pushbutton::{HoldRepeatDecoder, HoldRepeatEvent, MultiPressDecoder, MultiPressEvent};
pub use rotary::{rotary_encoder, DualLine, RotaryDecoder, RotaryEncoder, RotaryEvent};
pub use switch::{RawSource, SingleLine, Switch, MAX_STATES, RAW_OFF, RAW_ON, STATE_UNDEFINED};
