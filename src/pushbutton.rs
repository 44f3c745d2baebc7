//! Timed gesture decoding for push buttons.
//!
//! Two decoders over the same two-state raw alphabet:
//!
//! - [`HoldRepeatDecoder`] tells a short push apart from a hold and, while
//!   held, toggles between two repeat phases — the classic
//!   press-and-hold-to-autorepeat behavior.
//! - [`MultiPressDecoder`] classifies a completed sequence as a single,
//!   double or long push.
//!
//! All elapsed times are truncated to u16 before use, which keeps the
//! arithmetic wrap-safe for holds up to ~65 seconds.

use crate::switch::RAW_ON;

/// Upper bound for all timing thresholds.
const THRESHOLD_MAX_MS: u16 = 2000;

/// Output codes of [`HoldRepeatDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum HoldRepeatEvent {
    /// Nothing completed.
    Off = 0,
    /// One push shorter than the hold threshold, now released.
    Single = 1,
    /// Hold in progress, phase A.
    RepeatA = 2,
    /// Hold in progress, phase B.
    RepeatB = 3,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RepeatState {
    Undefined,
    Off,
    On,
    RepeatA,
    RepeatB,
}

/// Single push vs. hold-with-repeat decoder.
pub struct HoldRepeatDecoder {
    long_start_ms: u16,
    repeat_ms: u16,
    proc_start: u32,
    state: RepeatState,
}

impl HoldRepeatDecoder {
    /// `long_start_ms` separates a single push from the start of a hold;
    /// `repeat_ms` is the length of each repeat phase while held. Both
    /// are clamped to 2000 ms, and zero in either disables hold
    /// detection.
    pub fn new(long_start_ms: u16, repeat_ms: u16) -> Self {
        HoldRepeatDecoder {
            long_start_ms: long_start_ms.min(THRESHOLD_MAX_MS),
            repeat_ms: repeat_ms.min(THRESHOLD_MAX_MS),
            proc_start: 0,
            state: RepeatState::Undefined,
        }
    }

    /// Single-push-only operation.
    pub fn single_only() -> Self {
        Self::new(0, 0)
    }

    /// Fast enough to resolve the repeat-phase boundaries with ~5%
    /// granularity.
    pub fn read_cycle_ms(&self) -> u8 {
        (self.repeat_ms / 20).max(1) as u8
    }

    pub fn num_output_states(&self) -> u8 {
        4
    }

    pub fn num_raw_states(&self) -> u8 {
        2
    }

    pub fn reset(&mut self) {
        self.state = RepeatState::Undefined;
        self.proc_start = 0;
    }

    pub fn analyze(&mut self, raw: u8, now_ms: u32) -> u8 {
        let on = raw == RAW_ON;

        if self.state == RepeatState::Undefined {
            if on {
                self.proc_start = now_ms;
                self.state = RepeatState::On;
            } else {
                self.state = RepeatState::Off;
            }
        }

        let elapsed = now_ms.wrapping_sub(self.proc_start) as u16;
        let mut phase = 0;
        if self.repeat_ms > 0 && elapsed > self.long_start_ms {
            // position within the A/B toggle cycle since the hold began
            phase = (elapsed - self.long_start_ms) % (2 * self.repeat_ms);
        }

        match self.state {
            RepeatState::Off => {
                if on {
                    self.proc_start = now_ms;
                    self.state = RepeatState::On;
                }
            }
            RepeatState::On => {
                if on {
                    if self.long_start_ms > 0 && elapsed >= self.long_start_ms {
                        self.state = RepeatState::RepeatA;
                        return HoldRepeatEvent::RepeatA as u8;
                    }
                } else {
                    self.state = RepeatState::Off;
                    self.proc_start = 0;
                    return HoldRepeatEvent::Single as u8;
                }
            }
            RepeatState::RepeatA => {
                if on {
                    if phase >= self.repeat_ms {
                        self.state = RepeatState::RepeatB;
                        return HoldRepeatEvent::RepeatB as u8;
                    }
                    return HoldRepeatEvent::RepeatA as u8;
                }
                self.state = RepeatState::Off;
                self.proc_start = 0;
            }
            RepeatState::RepeatB => {
                if on {
                    if phase < self.repeat_ms {
                        self.state = RepeatState::RepeatA;
                        return HoldRepeatEvent::RepeatA as u8;
                    }
                    return HoldRepeatEvent::RepeatB as u8;
                }
                self.state = RepeatState::Off;
                self.proc_start = 0;
            }
            RepeatState::Undefined => {}
        }

        HoldRepeatEvent::Off as u8
    }
}

/// Output codes of [`MultiPressDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MultiPressEvent {
    /// Nothing completed.
    Off = 0,
    /// One push, with no second push inside the double window.
    Single = 1,
    /// Two pushes completed inside the double window.
    Double = 2,
    /// One push held past the long threshold.
    Long = 3,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum PressState {
    Undefined,
    Off,
    On,
    /// Released after a first push, waiting for a possible second one.
    GapOff,
    /// Second push of a potential double in progress.
    SecondOn,
    /// Long push already reported by time-out, waiting for release.
    LongFired,
}

/// Single / double / long push classifier.
pub struct MultiPressDecoder {
    max_double_ms: u16,
    min_long_ms: u16,
    end_long_by_time: bool,
    proc_start: u32,
    state: PressState,
}

impl MultiPressDecoder {
    /// `max_double_ms` is the window for completing a double push,
    /// `min_long_ms` the minimum hold for a long push; zero disables the
    /// respective detection and both are clamped to 2000 ms. With
    /// `end_long_by_time` a long push is reported the moment the
    /// threshold passes while still held, otherwise on release.
    pub fn new(max_double_ms: u16, min_long_ms: u16, end_long_by_time: bool) -> Self {
        MultiPressDecoder {
            max_double_ms: max_double_ms.min(THRESHOLD_MAX_MS),
            min_long_ms: min_long_ms.min(THRESHOLD_MAX_MS),
            end_long_by_time,
            proc_start: 0,
            state: PressState::Undefined,
        }
    }

    /// Single-push-only operation.
    pub fn single_only() -> Self {
        Self::new(0, 0, false)
    }

    pub fn read_cycle_ms(&self) -> u8 {
        (self.max_double_ms.max(self.min_long_ms) / 20) as u8
    }

    pub fn num_output_states(&self) -> u8 {
        4
    }

    pub fn num_raw_states(&self) -> u8 {
        2
    }

    pub fn reset(&mut self) {
        self.state = PressState::Undefined;
        self.proc_start = 0;
    }

    pub fn analyze(&mut self, raw: u8, now_ms: u32) -> u8 {
        let on = raw == RAW_ON;

        if self.state == PressState::Undefined {
            if on {
                self.proc_start = now_ms;
                self.state = PressState::On;
            } else {
                self.state = PressState::Off;
            }
        }

        let elapsed = now_ms.wrapping_sub(self.proc_start) as u16;

        // Time-outs take precedence over level transitions.
        if self.end_long_by_time
            && self.min_long_ms > 0
            && elapsed > self.min_long_ms
            && self.state == PressState::On
        {
            self.state = PressState::LongFired;
            return MultiPressEvent::Long as u8;
        }

        if self.max_double_ms > 0
            && elapsed > self.max_double_ms
            && (self.state == PressState::GapOff || self.state == PressState::SecondOn)
        {
            // The double window expired, so the first push stands alone
            // as a single. The level sampled right now seeds the next
            // sequence, letting a fresh press start immediately.
            if on {
                self.proc_start = now_ms;
                self.state = PressState::On;
            } else {
                self.proc_start = 0;
                self.state = PressState::Off;
            }
            return MultiPressEvent::Single as u8;
        }

        match self.state {
            PressState::Off => {
                if on {
                    self.proc_start = now_ms;
                    self.state = PressState::On;
                }
            }
            PressState::On => {
                if on {
                    // still held, nothing to report yet
                } else if self.min_long_ms > 0 && elapsed > self.min_long_ms {
                    self.state = PressState::Off;
                    self.proc_start = 0;
                    return MultiPressEvent::Long as u8;
                } else if self.max_double_ms > 0 && elapsed < self.max_double_ms {
                    self.state = PressState::GapOff;
                } else {
                    self.state = PressState::Off;
                    self.proc_start = 0;
                    return MultiPressEvent::Single as u8;
                }
            }
            PressState::GapOff => {
                if on {
                    // second push; its expiry is checked on the next poll
                    self.proc_start = now_ms;
                    self.state = PressState::SecondOn;
                }
            }
            PressState::SecondOn => {
                if !on {
                    self.state = PressState::Off;
                    self.proc_start = 0;
                    return MultiPressEvent::Double as u8;
                }
            }
            PressState::LongFired => {
                if !on {
                    self.state = PressState::Off;
                    self.proc_start = 0;
                }
            }
            PressState::Undefined => {}
        }

        MultiPressEvent::Off as u8
    }
}
