//! Quadrature decoding for mechanical rotary encoders.
//!
//! Both phase lines are sampled together into a 2-bit raw code. A detent
//! step shows up as `OFF -> A -> [AB] -> [B] -> OFF` for a right turn and
//! the mirror image for a left turn. The decoder only cares which phase
//! started the sequence and when the code returns to OFF; every raw code
//! in between is treated as bounce and ignored, so noisy edges never
//! produce a spurious direction report.

use crate::analyzer::Analyzer;
use crate::hal::{Clock, InputLine, Pull};
use crate::switch::{RawSource, Switch};

/// Raw code: both phases low.
pub const RAW_OFF: u8 = 0b00;
/// Raw code: only phase A high.
pub const RAW_A: u8 = 0b01;
/// Raw code: only phase B high.
pub const RAW_B: u8 = 0b10;
/// Raw code: both phases high.
pub const RAW_AB: u8 = 0b11;

/// Output codes of the quadrature decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RotaryEvent {
    /// No completed movement.
    Off = 0,
    /// One detent step clockwise.
    Right = 1,
    /// One detent step counter-clockwise.
    Left = 2,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Undefined,
    Off,
    RightA,
    LeftB,
}

/// Quadrature decode state machine.
pub struct RotaryDecoder {
    state: State,
}

impl RotaryDecoder {
    pub fn new() -> Self {
        RotaryDecoder {
            state: State::Undefined,
        }
    }

    /// 2 ms, fast enough not to miss the brief AB/B intermediate codes
    /// of a hand-turned encoder.
    pub fn read_cycle_ms(&self) -> u8 {
        2
    }

    pub fn num_output_states(&self) -> u8 {
        3
    }

    pub fn num_raw_states(&self) -> u8 {
        4
    }

    pub fn reset(&mut self) {
        self.state = State::Undefined;
    }

    /// One step of the decode state machine.
    pub fn analyze(&mut self, raw: u8) -> u8 {
        if self.state == State::Undefined {
            self.state = State::Off;
        }

        match self.state {
            State::Off => {
                if raw == RAW_A {
                    self.state = State::RightA;
                } else if raw == RAW_B {
                    self.state = State::LeftB;
                }
                // anything else is bounce, stay put
            }
            State::RightA => {
                if raw == RAW_OFF {
                    self.state = State::Off;
                    return RotaryEvent::Right as u8;
                }
            }
            State::LeftB => {
                if raw == RAW_OFF {
                    self.state = State::Off;
                    return RotaryEvent::Left as u8;
                }
            }
            State::Undefined => {}
        }

        RotaryEvent::Off as u8
    }
}

impl Default for RotaryDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Two input lines sampled as one 2-bit raw code, phase A in bit 0 and
/// phase B in bit 1.
pub struct DualLine<A, B> {
    a: A,
    b: B,
}

impl<A: InputLine, B: InputLine> DualLine<A, B> {
    pub fn new(a: A, b: B) -> Self {
        DualLine { a, b }
    }
}

impl<A: InputLine, B: InputLine> RawSource for DualLine<A, B> {
    fn configure(&mut self, pull: Pull) {
        self.a.configure(pull);
        self.b.configure(pull);
    }

    fn raw_state(&mut self) -> u8 {
        (self.a.read() as u8) | ((self.b.read() as u8) << 1)
    }
}

/// A debounced rotary encoder: a [`Switch`] over both phase lines with a
/// [`RotaryDecoder`] attached.
pub type RotaryEncoder<A, B, C> = Switch<DualLine<A, B>, C>;

/// Build a [`RotaryEncoder`] from its two phase lines.
pub fn rotary_encoder<A, B, C>(
    a: A,
    b: B,
    clock: C,
    debounce_ms: u8,
    invert_raw: bool,
) -> RotaryEncoder<A, B, C>
where
    A: InputLine,
    B: InputLine,
    C: Clock,
{
    Switch::with_analyzer(
        DualLine::new(a, b),
        clock,
        Analyzer::Rotary(RotaryDecoder::new()),
        debounce_ms,
        invert_raw,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(decoder: &mut RotaryDecoder, raws: &[u8]) -> std::vec::Vec<u8> {
        raws.iter().map(|&r| decoder.analyze(r)).collect()
    }

    fn non_off(events: &[u8]) -> std::vec::Vec<u8> {
        events
            .iter()
            .copied()
            .filter(|&e| e != RotaryEvent::Off as u8)
            .collect()
    }

    #[test]
    fn full_right_sequence_yields_one_right() {
        let mut d = RotaryDecoder::new();
        let events = run(&mut d, &[RAW_OFF, RAW_A, RAW_AB, RAW_B, RAW_OFF]);
        assert_eq!(non_off(&events), [RotaryEvent::Right as u8]);
    }

    #[test]
    fn short_right_sequence_yields_one_right() {
        let mut d = RotaryDecoder::new();
        let events = run(&mut d, &[RAW_OFF, RAW_A, RAW_OFF]);
        assert_eq!(non_off(&events), [RotaryEvent::Right as u8]);
    }

    #[test]
    fn left_sequences_mirror_right() {
        let mut d = RotaryDecoder::new();
        let events = run(&mut d, &[RAW_OFF, RAW_B, RAW_AB, RAW_A, RAW_OFF]);
        assert_eq!(non_off(&events), [RotaryEvent::Left as u8]);

        d.reset();
        let events = run(&mut d, &[RAW_OFF, RAW_B, RAW_OFF]);
        assert_eq!(non_off(&events), [RotaryEvent::Left as u8]);
    }

    #[test]
    fn stray_ab_codes_are_ignored() {
        let mut d = RotaryDecoder::new();
        // AB without a leading A or B starts nothing.
        let events = run(&mut d, &[RAW_OFF, RAW_AB, RAW_OFF, RAW_AB, RAW_OFF]);
        assert!(non_off(&events).is_empty());
    }

    #[test]
    fn first_call_after_reset_settles_into_a_defined_state() {
        let mut d = RotaryDecoder::new();
        d.reset();
        // Even a mid-sequence code on the first call must not panic and
        // must leave the decoder in its idle state.
        assert_eq!(d.analyze(RAW_AB), RotaryEvent::Off as u8);
        assert!(d.state == State::Off);
    }

    #[test]
    fn consecutive_turns_each_report_once() {
        let mut d = RotaryDecoder::new();
        let events = run(
            &mut d,
            &[
                RAW_OFF, RAW_A, RAW_OFF, // right
                RAW_B, RAW_AB, RAW_A, RAW_OFF, // left
                RAW_A, RAW_B, RAW_OFF, // right, bouncing through B
            ],
        );
        assert_eq!(
            non_off(&events),
            [
                RotaryEvent::Right as u8,
                RotaryEvent::Left as u8,
                RotaryEvent::Right as u8
            ]
        );
    }
}
