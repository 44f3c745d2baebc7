//! The debounced read-cycle engine.
//!
//! A [`Switch`] polls a [`RawSource`] on a timed cadence, filters contact
//! bounce, optionally inverts the raw code, runs it through its
//! [`Analyzer`] and reports when the resulting output state changes.

use heapless::Vec;

use crate::analyzer::Analyzer;
use crate::hal::{Clock, InputLine, Pull};

/// Raw code of a released two-state input.
pub const RAW_OFF: u8 = 0;
/// Raw code of an actuated two-state input.
pub const RAW_ON: u8 = 1;

/// Sentinel for "no state seen yet"; never a valid state code.
pub const STATE_UNDEFINED: u8 = 0xFF;

/// Upper bound on the state count; `num_states` is clamped to
/// `2..=MAX_STATES`.
pub const MAX_STATES: u8 = 64;

/// Where the engine samples its raw code each read cycle.
///
/// A plain switch reads one line, a rotary encoder combines two. The raw
/// code space is defined by the attached analyzer (two states for
/// pass-through operation).
pub trait RawSource {
    fn configure(&mut self, pull: Pull);
    fn raw_state(&mut self) -> u8;
}

/// One input line read as a two-state raw source.
pub struct SingleLine<L> {
    line: L,
}

impl<L: InputLine> SingleLine<L> {
    pub fn new(line: L) -> Self {
        SingleLine { line }
    }
}

impl<L: InputLine> RawSource for SingleLine<L> {
    fn configure(&mut self, pull: Pull) {
        self.line.configure(pull);
    }

    fn raw_state(&mut self) -> u8 {
        self.line.read() as u8
    }
}

/// Debounce engine for one input device.
pub struct Switch<S, C> {
    source: S,
    clock: C,
    analyzer: Analyzer,
    num_states: u8,
    read_cycle_ms: u8,
    debounce_ms: u8,
    invert_raw: bool,
    mapping: Option<Vec<u8, 64>>,
    current: u8,
    previous: u8,
    last_raw: u8,
    last_read_ms: u32,
    debouncing: bool,
}

impl<S: RawSource, C: Clock> Switch<S, C> {
    /// Plain debounced switch: raw codes pass through unanalyzed.
    ///
    /// `num_states` is the size of the raw code space (clamped to
    /// `2..=MAX_STATES`), two for an ordinary on/off switch. A
    /// `read_cycle_ms` of zero polls as fast as the caller does.
    pub fn new(
        source: S,
        clock: C,
        num_states: u8,
        read_cycle_ms: u8,
        debounce_ms: u8,
        invert_raw: bool,
    ) -> Self {
        Self::build(
            source,
            clock,
            Analyzer::PassThrough,
            num_states,
            read_cycle_ms,
            debounce_ms,
            invert_raw,
        )
    }

    /// Debounced switch with a sequence analyzer attached. The state
    /// count and the read-cycle period come from the analyzer.
    pub fn with_analyzer(
        source: S,
        clock: C,
        mut analyzer: Analyzer,
        debounce_ms: u8,
        invert_raw: bool,
    ) -> Self {
        analyzer.reset();
        let num_states = analyzer.num_output_states();
        let read_cycle_ms = analyzer.read_cycle_ms();
        Self::build(
            source,
            clock,
            analyzer,
            num_states,
            read_cycle_ms,
            debounce_ms,
            invert_raw,
        )
    }

    fn build(
        source: S,
        clock: C,
        analyzer: Analyzer,
        num_states: u8,
        read_cycle_ms: u8,
        debounce_ms: u8,
        invert_raw: bool,
    ) -> Self {
        Switch {
            source,
            clock,
            analyzer,
            num_states: num_states.clamp(2, MAX_STATES),
            read_cycle_ms,
            debounce_ms,
            invert_raw,
            mapping: None,
            current: STATE_UNDEFINED,
            previous: STATE_UNDEFINED,
            last_raw: STATE_UNDEFINED,
            last_read_ms: 0,
            debouncing: false,
        }
    }

    /// Attach an output mapping table, identity-initialized.
    pub fn with_mapping(mut self) -> Self {
        let mut table = Vec::new();
        for i in 0..self.num_states {
            let _ = table.push(i);
        }
        self.mapping = Some(table);
        self
    }

    /// Configure the input line(s): pull-up when the raw level is
    /// inverted, floating otherwise. Call once before polling.
    pub fn configure_lines(&mut self) {
        let pull = if self.invert_raw {
            Pull::Up
        } else {
            Pull::Floating
        };
        self.source.configure(pull);
    }

    /// One cooperative read cycle.
    ///
    /// Returns true iff the analyzed output state changed since the last
    /// accepted state; the previous state is then available through
    /// [`prev_state`](Switch::prev_state). Never blocks. Call at least as
    /// often as the analyzer's read-cycle period; polling faster is
    /// always safe.
    pub fn poll(&mut self) -> bool {
        let now = self.clock.now_ms();
        let elapsed = now.wrapping_sub(self.last_read_ms);

        // Honor the running wait: the debounce window while a change is
        // pending, the read cycle otherwise.
        if self.debouncing {
            if elapsed < u32::from(self.debounce_ms) {
                return false;
            }
        } else if self.read_cycle_ms > 0 && elapsed < u32::from(self.read_cycle_ms) {
            return false;
        }

        let mut raw = self.source.raw_state();
        self.last_read_ms = now;

        if self.invert_raw {
            let span = if self.analyzer.is_pass_through() {
                self.num_states
            } else {
                self.analyzer.num_raw_states()
            };
            raw = (span - 1).wrapping_sub(raw);
        }

        // A changed raw code is accepted only after it has survived one
        // full debounce window.
        if !self.debouncing && self.debounce_ms > 0 && self.last_raw != raw {
            self.debouncing = true;
            return false;
        }

        self.debouncing = false;
        self.last_raw = raw;

        let state = self.analyzer.analyze(raw, now);

        if state != self.current {
            self.previous = self.current;
            self.current = state;
            return true;
        }
        false
    }

    /// Current output state, `STATE_UNDEFINED` until the first accepted
    /// read.
    pub fn state(&self) -> u8 {
        self.current
    }

    /// Output state before the most recent change.
    pub fn prev_state(&self) -> u8 {
        self.previous
    }

    /// Current state run through the mapping table, when one is attached
    /// and the state is defined; the bare state otherwise.
    pub fn mapped_state(&self) -> u8 {
        self.map(self.current)
    }

    /// Previous state run through the mapping table.
    pub fn prev_mapped_state(&self) -> u8 {
        self.map(self.previous)
    }

    fn map(&self, state: u8) -> u8 {
        match &self.mapping {
            Some(table) if state != STATE_UNDEFINED => {
                table.get(state as usize).copied().unwrap_or(state)
            }
            _ => state,
        }
    }

    /// Replace one mapping entry. Silently ignored without a table or
    /// when `state` is out of range.
    pub fn set_mapping(&mut self, state: u8, value: u8) {
        if let Some(table) = &mut self.mapping {
            if let Some(entry) = table.get_mut(state as usize) {
                *entry = value;
            }
        }
    }

    /// Back to the freshly constructed state, analyzer included.
    pub fn reset(&mut self) {
        self.current = STATE_UNDEFINED;
        self.previous = STATE_UNDEFINED;
        self.last_raw = STATE_UNDEFINED;
        self.last_read_ms = 0;
        self.debouncing = false;
        self.analyzer.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotary::{rotary_encoder, RotaryEvent};

    use core::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone)]
    struct TestClock(Rc<Cell<u32>>);

    impl TestClock {
        fn new() -> Self {
            TestClock(Rc::new(Cell::new(0)))
        }

        fn set(&self, ms: u32) {
            self.0.set(ms);
        }
    }

    impl Clock for TestClock {
        fn now_ms(&self) -> u32 {
            self.0.get()
        }
    }

    #[derive(Clone)]
    struct TestLine {
        level: Rc<Cell<bool>>,
        reads: Rc<Cell<u32>>,
        pull: Rc<Cell<Option<Pull>>>,
    }

    impl TestLine {
        fn new() -> Self {
            TestLine {
                level: Rc::new(Cell::new(false)),
                reads: Rc::new(Cell::new(0)),
                pull: Rc::new(Cell::new(None)),
            }
        }

        fn set(&self, high: bool) {
            self.level.set(high);
        }
    }

    impl InputLine for TestLine {
        fn configure(&mut self, pull: Pull) {
            self.pull.set(Some(pull));
        }

        fn read(&mut self) -> bool {
            self.reads.set(self.reads.get() + 1);
            self.level.get()
        }
    }

    fn plain_switch(
        line: &TestLine,
        clock: &TestClock,
        read_cycle_ms: u8,
        debounce_ms: u8,
        invert: bool,
    ) -> Switch<SingleLine<TestLine>, TestClock> {
        Switch::new(
            SingleLine::new(line.clone()),
            clock.clone(),
            2,
            read_cycle_ms,
            debounce_ms,
            invert,
        )
    }

    #[test]
    fn glitch_shorter_than_debounce_window_is_rejected() {
        let line = TestLine::new();
        let clock = TestClock::new();
        let mut sw = plain_switch(&line, &clock, 0, 5, false);

        // First read starts a debounce cycle (nothing was stored yet),
        // the second accepts the initial level.
        assert!(!sw.poll());
        clock.set(5);
        assert!(sw.poll());
        assert_eq!(sw.state(), RAW_OFF);

        // Bounce: high for less than the window, back low before the
        // window elapses.
        line.set(true);
        clock.set(7);
        assert!(!sw.poll());
        line.set(false);
        clock.set(12);
        assert!(!sw.poll());
        assert_eq!(sw.state(), RAW_OFF);

        // A level that stays put for the full window is accepted.
        line.set(true);
        clock.set(20);
        assert!(!sw.poll());
        clock.set(25);
        assert!(sw.poll());
        assert_eq!(sw.state(), RAW_ON);
        assert_eq!(sw.prev_state(), RAW_OFF);
    }

    #[test]
    fn polls_inside_read_cycle_touch_no_hardware() {
        let line = TestLine::new();
        let clock = TestClock::new();
        let mut sw = plain_switch(&line, &clock, 10, 0, false);

        for ms in 0..10 {
            clock.set(ms);
            assert!(!sw.poll());
        }
        assert_eq!(line.reads.get(), 0);
        assert_eq!(sw.state(), STATE_UNDEFINED);

        clock.set(10);
        assert!(sw.poll());
        assert_eq!(line.reads.get(), 1);
        assert_eq!(sw.state(), RAW_OFF);
    }

    #[test]
    fn invert_complements_the_raw_code() {
        let line = TestLine::new();
        let clock = TestClock::new();
        let mut sw = plain_switch(&line, &clock, 0, 0, true);

        // Line idles high with a pull-up; inverted that reads as OFF.
        line.set(true);
        clock.set(1);
        assert!(sw.poll());
        assert_eq!(sw.state(), RAW_OFF);

        line.set(false);
        clock.set(2);
        assert!(sw.poll());
        assert_eq!(sw.state(), RAW_ON);
    }

    #[test]
    fn configure_lines_matches_the_invert_flag() {
        let line = TestLine::new();
        let clock = TestClock::new();

        let mut sw = plain_switch(&line, &clock, 0, 0, false);
        sw.configure_lines();
        assert_eq!(line.pull.get(), Some(Pull::Floating));

        let mut sw = plain_switch(&line, &clock, 0, 0, true);
        sw.configure_lines();
        assert_eq!(line.pull.get(), Some(Pull::Up));
    }

    #[test]
    fn mapping_table_applies_only_when_attached_and_defined() {
        let line = TestLine::new();
        let clock = TestClock::new();
        let mut sw = plain_switch(&line, &clock, 0, 0, false).with_mapping();

        // Undefined states pass through the table untouched.
        assert_eq!(sw.mapped_state(), STATE_UNDEFINED);

        sw.set_mapping(RAW_ON, 0x42);
        sw.set_mapping(200, 7); // out of range, ignored

        line.set(true);
        clock.set(1);
        assert!(sw.poll());
        assert_eq!(sw.state(), RAW_ON);
        assert_eq!(sw.mapped_state(), 0x42);

        line.set(false);
        clock.set(2);
        assert!(sw.poll());
        assert_eq!(sw.mapped_state(), RAW_OFF);
        assert_eq!(sw.prev_mapped_state(), 0x42);
    }

    #[test]
    fn state_count_is_clamped() {
        let line = TestLine::new();
        let clock = TestClock::new();

        let sw = Switch::new(
            SingleLine::new(line.clone()),
            clock.clone(),
            0,
            0,
            0,
            false,
        )
        .with_mapping();
        assert_eq!(sw.mapping.as_ref().unwrap().len(), 2);

        let sw = Switch::new(SingleLine::new(line), clock, 200, 0, 0, false).with_mapping();
        assert_eq!(sw.mapping.as_ref().unwrap().len(), MAX_STATES as usize);
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let line = TestLine::new();
        let clock = TestClock::new();
        let mut sw = plain_switch(&line, &clock, 0, 0, false);

        line.set(true);
        clock.set(1);
        assert!(sw.poll());
        assert_eq!(sw.state(), RAW_ON);

        sw.reset();
        assert_eq!(sw.state(), STATE_UNDEFINED);
        assert_eq!(sw.prev_state(), STATE_UNDEFINED);

        // Polling again re-reports the held level as a fresh change.
        clock.set(2);
        assert!(sw.poll());
        assert_eq!(sw.state(), RAW_ON);
    }

    #[test]
    fn elapsed_time_survives_clock_wraparound() {
        let line = TestLine::new();
        let clock = TestClock::new();
        let mut sw = plain_switch(&line, &clock, 4, 0, false);

        clock.set(u32::MAX - 3);
        assert!(sw.poll());
        assert_eq!(sw.state(), RAW_OFF);

        // 5 ms later the counter has wrapped; the read cycle must still
        // be seen as elapsed.
        line.set(true);
        clock.set(1);
        assert!(sw.poll());
        assert_eq!(sw.state(), RAW_ON);
    }

    #[test]
    fn rotary_encoder_reports_one_turn_end_to_end() {
        let a = TestLine::new();
        let b = TestLine::new();
        let clock = TestClock::new();
        let mut enc = rotary_encoder(a.clone(), b.clone(), clock.clone(), 0, false);

        let mut now = 0;
        let mut events = std::vec::Vec::new();
        let steps: &[(bool, bool)] = &[
            (false, false), // idle
            (true, false),  // A leads
            (true, true),
            (false, true),
            (false, false), // back to detent
            (false, false),
        ];
        for &(la, lb) in steps {
            a.set(la);
            b.set(lb);
            now += 2;
            clock.set(now);
            if enc.poll() {
                events.push(enc.state());
            }
        }

        // Initial Off, the single right turn, then Off again.
        assert_eq!(
            events,
            [
                RotaryEvent::Off as u8,
                RotaryEvent::Right as u8,
                RotaryEvent::Off as u8
            ]
        );
    }
}
