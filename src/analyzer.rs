//! Sequence analyzers pluggable into a [`Switch`](crate::Switch).

use crate::pushbutton::{HoldRepeatDecoder, MultiPressDecoder};
use crate::rotary::RotaryDecoder;

/// Converts debounced raw codes into semantic output codes, keeping
/// whatever sequence state it needs between polls.
///
/// `PassThrough` leaves raw codes untouched and is what a
/// [`Switch`](crate::Switch) built without an analyzer uses: plain
/// two-state debouncing.
pub enum Analyzer {
    PassThrough,
    Rotary(RotaryDecoder),
    HoldRepeat(HoldRepeatDecoder),
    MultiPress(MultiPressDecoder),
}

impl Analyzer {
    /// Minimum poll interval in milliseconds needed to resolve this
    /// analyzer's fastest transition. Zero means no requirement.
    pub fn read_cycle_ms(&self) -> u8 {
        match self {
            Analyzer::PassThrough => 0,
            Analyzer::Rotary(d) => d.read_cycle_ms(),
            Analyzer::HoldRepeat(d) => d.read_cycle_ms(),
            Analyzer::MultiPress(d) => d.read_cycle_ms(),
        }
    }

    /// Number of distinct output codes this analyzer produces.
    pub fn num_output_states(&self) -> u8 {
        match self {
            Analyzer::PassThrough => 2,
            Analyzer::Rotary(d) => d.num_output_states(),
            Analyzer::HoldRepeat(d) => d.num_output_states(),
            Analyzer::MultiPress(d) => d.num_output_states(),
        }
    }

    /// Number of raw input codes this analyzer accepts.
    pub fn num_raw_states(&self) -> u8 {
        match self {
            Analyzer::PassThrough => 2,
            Analyzer::Rotary(d) => d.num_raw_states(),
            Analyzer::HoldRepeat(d) => d.num_raw_states(),
            Analyzer::MultiPress(d) => d.num_raw_states(),
        }
    }

    /// Clear all sequence state back to undefined.
    pub fn reset(&mut self) {
        match self {
            Analyzer::PassThrough => {}
            Analyzer::Rotary(d) => d.reset(),
            Analyzer::HoldRepeat(d) => d.reset(),
            Analyzer::MultiPress(d) => d.reset(),
        }
    }

    /// Feed one debounced raw code, yielding the output code.
    pub fn analyze(&mut self, raw: u8, now_ms: u32) -> u8 {
        match self {
            Analyzer::PassThrough => raw,
            Analyzer::Rotary(d) => d.analyze(raw),
            Analyzer::HoldRepeat(d) => d.analyze(raw, now_ms),
            Analyzer::MultiPress(d) => d.analyze(raw, now_ms),
        }
    }

    pub(crate) fn is_pass_through(&self) -> bool {
        matches!(self, Analyzer::PassThrough)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_through_is_the_identity() {
        let mut a = Analyzer::PassThrough;
        assert_eq!(a.read_cycle_ms(), 0);
        assert_eq!(a.num_output_states(), 2);
        assert_eq!(a.num_raw_states(), 2);
        assert_eq!(a.analyze(0, 0), 0);
        assert_eq!(a.analyze(1, 1000), 1);
        a.reset();
        assert_eq!(a.analyze(1, 2000), 1);
    }
}
