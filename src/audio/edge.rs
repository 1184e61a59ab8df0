//! Edge timing: turns the per-block "tone present" flag into timed mark/space intervals.

use crate::audio::clock::{Clock, SystemClock};
use crate::defaults;
use crate::pipeline::types::Detection;
use std::time::{Duration, Instant};

/// Tracks rising and falling edges of the tone flag and the silence timeout.
///
/// Owned by exactly one thread; nothing here is shared.
pub struct EdgeDetector<C: Clock = SystemClock> {
    previous_state: bool,
    mark_start: Instant,
    space_start: Instant,
    silence_timeout: Duration,
    clock: C,
}

impl EdgeDetector<SystemClock> {
    /// Creates a detector on the system clock.
    pub fn new(silence_timeout: Duration) -> Self {
        Self::with_clock(silence_timeout, SystemClock)
    }
}

impl Default for EdgeDetector<SystemClock> {
    fn default() -> Self {
        Self::new(Duration::from_millis(defaults::SILENCE_TIMEOUT_MS))
    }
}

impl<C: Clock> EdgeDetector<C> {
    /// Creates a detector whose interval start times are taken from `clock` now.
    pub fn with_clock(silence_timeout: Duration, clock: C) -> Self {
        let now = clock.now();
        Self {
            previous_state: false,
            mark_start: now,
            space_start: now,
            silence_timeout,
            clock,
        }
    }

    /// Feeds one tone flag and returns the interval it completed, if any.
    ///
    /// An edge emits the *previous* state with the length of the interval that just
    /// ended. Sustained silence longer than the timeout emits a space and restarts the
    /// silence interval. A sustained mark never emits.
    pub fn process(&mut self, tone: bool) -> Option<Detection> {
        let now = self.clock.now();
        self.process_at(tone, now)
    }

    /// Like [`process`](Self::process), for a flag observed at `now` rather than on
    /// arrival. Times earlier than an interval's start count as zero-length.
    pub fn process_at(&mut self, tone: bool, now: Instant) -> Option<Detection> {
        if tone != self.previous_state {
            self.previous_state = tone;
            let detection = if tone {
                let space = Detection::space(now.saturating_duration_since(self.space_start));
                self.mark_start = now;
                space
            } else {
                let mark = Detection::mark(now.saturating_duration_since(self.mark_start));
                self.space_start = now;
                mark
            };
            log::debug!(
                "edge: {} {:?}",
                if detection.state { "mark" } else { "space" },
                detection.duration
            );
            return Some(detection);
        }

        if !tone {
            let silence = now.saturating_duration_since(self.space_start);
            if silence > self.silence_timeout {
                self.space_start = now;
                log::debug!("edge: silence timeout after {:?}", silence);
                return Some(Detection::space(silence));
            }
        }

        None
    }

    /// The last tone flag seen.
    pub fn previous_state(&self) -> bool {
        self.previous_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::clock::ManualClock;

    fn detector() -> (EdgeDetector<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (
            EdgeDetector::with_clock(Duration::from_secs(2), clock.clone()),
            clock,
        )
    }

    #[test]
    fn test_rising_edge_emits_preceding_space() {
        let (mut edge, clock) = detector();
        clock.advance(Duration::from_millis(300));
        let detection = edge.process(true).unwrap();
        assert_eq!(detection, Detection::space(Duration::from_millis(300)));
        assert!(edge.previous_state());
    }

    #[test]
    fn test_falling_edge_emits_mark_duration() {
        let (mut edge, clock) = detector();
        edge.process(true);
        clock.advance(Duration::from_millis(48));
        assert_eq!(edge.process(true), None);
        clock.advance(Duration::from_millis(96));
        assert_eq!(
            edge.process(false),
            Some(Detection::mark(Duration::from_millis(144)))
        );
    }

    #[test]
    fn test_sustained_mark_never_emits() {
        let (mut edge, clock) = detector();
        edge.process(true);
        for _ in 0..10 {
            clock.advance(Duration::from_secs(1));
            assert_eq!(edge.process(true), None);
        }
    }

    #[test]
    fn test_silence_timeout_flushes_and_restarts() {
        let (mut edge, clock) = detector();
        edge.process(true);
        clock.advance(Duration::from_millis(48));
        edge.process(false);

        clock.advance(Duration::from_secs(2));
        // Exactly at the timeout is not yet past it
        assert_eq!(edge.process(false), None);

        clock.advance(Duration::from_millis(16));
        assert_eq!(
            edge.process(false),
            Some(Detection::space(Duration::from_millis(2016)))
        );

        clock.advance(Duration::from_millis(16));
        assert_eq!(edge.process(false), None);
    }

    #[test]
    fn test_space_after_timeout_measures_from_restart() {
        let (mut edge, clock) = detector();
        clock.advance(Duration::from_millis(2100));
        assert!(edge.process(false).is_some());
        clock.advance(Duration::from_millis(144));
        assert_eq!(
            edge.process(true),
            Some(Detection::space(Duration::from_millis(144)))
        );
    }

    #[test]
    fn test_process_at_uses_given_instant() {
        let (mut edge, clock) = detector();
        let start = clock.now();
        // The detector's own clock never moves
        edge.process_at(true, start + Duration::from_millis(100));
        assert_eq!(
            edge.process_at(false, start + Duration::from_millis(148)),
            Some(Detection::mark(Duration::from_millis(48)))
        );
        assert_eq!(
            edge.process_at(false, start + Duration::from_millis(2149)),
            Some(Detection::space(Duration::from_millis(2001)))
        );
    }

    #[test]
    fn test_alternating_edges_keep_order() {
        let (mut edge, clock) = detector();
        let mut out = Vec::new();
        for (tone, ms) in [(true, 10), (false, 48), (true, 48), (false, 144)] {
            clock.advance(Duration::from_millis(ms));
            out.extend(edge.process(tone));
        }
        assert_eq!(
            out,
            vec![
                Detection::space(Duration::from_millis(10)),
                Detection::mark(Duration::from_millis(48)),
                Detection::space(Duration::from_millis(48)),
                Detection::mark(Duration::from_millis(144)),
            ]
        );
    }
}
