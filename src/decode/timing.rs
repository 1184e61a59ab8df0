//! Speed-derived timing windows.
//!
//! Bounds are whole milliseconds: the tolerated dit bounds are truncated first, and the
//! dah, character-gap and word-gap bounds are exact 3x and 7x multiples of them.
//! Durations are truncated to whole milliseconds before comparison.

use crate::defaults::UNITS_PER_WORD;
use std::time::Duration;

/// Inclusive range of whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingWindow {
    pub min_ms: i64,
    pub max_ms: i64,
}

impl TimingWindow {
    pub fn new(min_ms: i64, max_ms: i64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Whether `duration`, truncated to milliseconds, falls inside the window.
    pub fn contains(&self, duration: Duration) -> bool {
        let ms = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        ms >= self.min_ms && ms <= self.max_ms
    }

    /// Both bounds multiplied by `factor`.
    pub fn scaled(&self, factor: i64) -> Self {
        Self::new(self.min_ms * factor, self.max_ms * factor)
    }
}

/// Every window the decoder classifies against, for one speed and tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingWindows {
    dit: TimingWindow,
}

impl TimingWindows {
    /// Derives windows for `wpm` words per minute (PARIS) with fractional `tolerance`.
    pub fn new(wpm: u32, tolerance: f64) -> Self {
        let unit_ms = unit_ms(wpm);
        let min = (unit_ms - unit_ms * tolerance) as i64;
        let max = (unit_ms + unit_ms * tolerance) as i64;
        Self {
            dit: TimingWindow::new(min, max),
        }
    }

    pub fn dit(&self) -> TimingWindow {
        self.dit
    }

    pub fn dah(&self) -> TimingWindow {
        self.dit.scaled(3)
    }

    /// Gap between elements of one character; same bounds as a dit.
    pub fn element_gap(&self) -> TimingWindow {
        self.dit
    }

    pub fn char_gap(&self) -> TimingWindow {
        self.dit.scaled(3)
    }

    pub fn word_gap(&self) -> TimingWindow {
        self.dit.scaled(7)
    }
}

/// One unit in milliseconds: `60000 / (50 * wpm)`.
pub fn unit_ms(wpm: u32) -> f64 {
    60_000.0 / (UNITS_PER_WORD as f64 * wpm as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_unit_at_25_wpm() {
        assert_eq!(unit_ms(25), 48.0);
        assert_eq!(unit_ms(20), 60.0);
    }

    #[test]
    fn test_windows_at_25_wpm() {
        let windows = TimingWindows::new(25, 0.4);
        assert_eq!(windows.dit(), TimingWindow::new(28, 67));
        assert_eq!(windows.dah(), TimingWindow::new(84, 201));
        assert_eq!(windows.element_gap(), windows.dit());
        assert_eq!(windows.char_gap(), windows.dah());
        assert_eq!(windows.word_gap(), TimingWindow::new(196, 469));
    }

    #[test]
    fn test_windows_are_exact_multiples() {
        for wpm in [5, 12, 18, 25, 33, 40, 60] {
            for tolerance in [0.0, 0.1, 0.25, 0.4, 0.5, 1.0] {
                let windows = TimingWindows::new(wpm, tolerance);
                let dit = windows.dit();
                assert_eq!(windows.dah(), TimingWindow::new(dit.min_ms * 3, dit.max_ms * 3));
                assert_eq!(
                    windows.word_gap(),
                    TimingWindow::new(dit.min_ms * 7, dit.max_ms * 7)
                );
            }
        }
    }

    #[test]
    fn test_contains_is_inclusive_and_truncates() {
        let window = TimingWindow::new(28, 67);
        assert!(window.contains(ms(28)));
        assert!(window.contains(ms(67)));
        assert!(window.contains(Duration::from_micros(67_999)));
        assert!(!window.contains(ms(68)));
        assert!(!window.contains(Duration::from_micros(27_999)));
    }

    #[test]
    fn test_zero_tolerance_is_a_single_millisecond() {
        let windows = TimingWindows::new(25, 0.0);
        assert_eq!(windows.dit(), TimingWindow::new(48, 48));
        assert!(!windows.dit().contains(ms(47)));
    }
}
