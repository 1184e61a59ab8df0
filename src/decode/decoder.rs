//! Timing-tolerant Morse decoder state machine.

use crate::decode::timing::TimingWindows;
use crate::decode::tree::{DecodeTree, NodeId};
use crate::defaults;
use crate::error::{MorshError, Result};
use crate::pipeline::types::{DecodedToken, Detection};

/// Speed and timing slack for the decoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderConfig {
    pub wpm: u32,
    /// Fractional slack applied to every window, 0.0 to 1.0.
    pub tolerance: f64,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            wpm: defaults::WPM,
            tolerance: defaults::TOLERANCE,
        }
    }
}

impl DecoderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.wpm == 0 {
            return Err(MorshError::invalid_value("wpm", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.tolerance) {
            return Err(MorshError::invalid_value(
                "tolerance",
                "must be within 0.0..=1.0",
            ));
        }
        Ok(())
    }
}

/// Where the decoder stands in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Root,
    Node(NodeId),
    /// The current run of elements matches no code; absorbed until the next gap.
    Error,
}

/// Classifies mark and space intervals into characters.
#[derive(Debug, Clone)]
pub struct MorseDecoder {
    tree: DecodeTree,
    windows: TimingWindows,
    cursor: Cursor,
}

impl MorseDecoder {
    pub fn new(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tree: DecodeTree::new(),
            windows: TimingWindows::new(config.wpm, config.tolerance),
            cursor: Cursor::Root,
        })
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn is_at_root(&self) -> bool {
        self.cursor == Cursor::Root
    }

    /// Consumes one interval and returns the token it closes, if any.
    pub fn decode(&mut self, detection: &Detection) -> Option<DecodedToken> {
        if detection.state {
            self.on_mark(detection);
            None
        } else {
            self.on_space(detection)
        }
    }

    fn on_mark(&mut self, detection: &Detection) {
        let node = match self.cursor {
            Cursor::Error => return,
            Cursor::Root => DecodeTree::ROOT,
            Cursor::Node(node) => node,
        };

        let next = if self.windows.dit().contains(detection.duration) {
            self.tree.dit(node)
        } else if self.windows.dah().contains(detection.duration) {
            self.tree.dah(node)
        } else {
            None
        };

        self.cursor = match next {
            Some(child) => Cursor::Node(child),
            None => {
                log::debug!("decoder: no code for mark of {:?}", detection.duration);
                Cursor::Error
            }
        };
    }

    fn on_space(&mut self, detection: &Detection) -> Option<DecodedToken> {
        if self.cursor == Cursor::Root {
            return None;
        }
        if self.windows.element_gap().contains(detection.duration) {
            return None;
        }

        let symbol = self.pending_symbol();
        self.cursor = Cursor::Root;

        let token = match symbol {
            None => DecodedToken::Undecodable,
            Some(c) if self.windows.char_gap().contains(detection.duration) => {
                DecodedToken::Character(c)
            }
            // A word gap, or a gap matching no window at all, which is taken as the
            // end of the transmission.
            Some(c) => DecodedToken::WordEnd(c),
        };
        log::debug!("decoder: {:?} after space of {:?}", token, detection.duration);
        Some(token)
    }

    fn pending_symbol(&self) -> Option<char> {
        match self.cursor {
            Cursor::Node(node) => self.tree.symbol(node),
            Cursor::Root | Cursor::Error => None,
        }
    }

    /// Closes whatever character is pending, as at shutdown.
    ///
    /// Returns nothing at the root, the error token for an error or unmapped node, and
    /// the bare character otherwise. The cursor is back at the root afterwards.
    pub fn flush(&mut self) -> Option<DecodedToken> {
        if self.cursor == Cursor::Root {
            return None;
        }
        let token = match self.pending_symbol() {
            Some(c) => DecodedToken::Character(c),
            None => DecodedToken::Undecodable,
        };
        self.cursor = Cursor::Root;
        Some(token)
    }

    /// Returns the cursor to the root without emitting anything.
    pub fn reset(&mut self) {
        self.cursor = Cursor::Root;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const UNIT: u64 = 48;

    fn decoder() -> MorseDecoder {
        MorseDecoder::new(DecoderConfig::default()).unwrap()
    }

    fn mark(ms: u64) -> Detection {
        Detection::mark(Duration::from_millis(ms))
    }

    fn space(ms: u64) -> Detection {
        Detection::space(Duration::from_millis(ms))
    }

    fn run(decoder: &mut MorseDecoder, detections: &[Detection]) -> String {
        detections
            .iter()
            .filter_map(|d| decoder.decode(d))
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn test_single_dit_then_char_gap() {
        let mut dec = decoder();
        assert_eq!(run(&mut dec, &[mark(UNIT), space(3 * UNIT)]), "E");
        assert!(dec.is_at_root());
    }

    #[test]
    fn test_space_at_root_is_ignored() {
        let mut dec = decoder();
        assert_eq!(dec.decode(&space(7 * UNIT)), None);
        assert_eq!(dec.decode(&space(5000)), None);
        assert!(dec.is_at_root());
    }

    #[test]
    fn test_element_gap_keeps_cursor() {
        let mut dec = decoder();
        dec.decode(&mark(UNIT));
        let before = dec.cursor();
        assert_eq!(dec.decode(&space(UNIT)), None);
        assert_eq!(dec.cursor(), before);
    }

    #[test]
    fn test_mark_boundaries() {
        let mut dec = decoder();
        dec.decode(&mark(67));
        assert_eq!(dec.flush(), Some(DecodedToken::Character('E')));

        dec.decode(&mark(68));
        assert_eq!(dec.cursor(), Cursor::Error);
        dec.reset();

        dec.decode(&mark(201));
        assert_eq!(dec.flush(), Some(DecodedToken::Character('T')));

        dec.decode(&mark(249));
        assert_eq!(dec.cursor(), Cursor::Error);
    }

    #[test]
    fn test_error_absorbs_marks_until_gap() {
        let mut dec = decoder();
        dec.decode(&mark(1000));
        dec.decode(&mark(UNIT));
        dec.decode(&mark(3 * UNIT));
        assert_eq!(dec.cursor(), Cursor::Error);
        assert_eq!(dec.decode(&space(UNIT)), None);
        assert_eq!(dec.decode(&space(3 * UNIT)), Some(DecodedToken::Undecodable));
        assert!(dec.is_at_root());
    }

    #[test]
    fn test_error_token_ignores_gap_length() {
        let mut dec = decoder();
        dec.decode(&mark(10));
        assert_eq!(dec.decode(&space(7 * UNIT)), Some(DecodedToken::Undecodable));
    }

    #[test]
    fn test_word_gap_appends_space() {
        let mut dec = decoder();
        dec.decode(&mark(UNIT));
        assert_eq!(dec.decode(&space(7 * UNIT)), Some(DecodedToken::WordEnd('E')));
    }

    #[test]
    fn test_overlap_prefers_char_gap() {
        // 196..=201 ms is in both the character and word gap windows
        let mut dec = decoder();
        dec.decode(&mark(UNIT));
        assert_eq!(dec.decode(&space(200)), Some(DecodedToken::Character('E')));
    }

    #[test]
    fn test_unmatched_gap_is_end_of_transmission() {
        let mut dec = decoder();
        dec.decode(&mark(UNIT));
        assert_eq!(dec.decode(&space(75)), Some(DecodedToken::WordEnd('E')));

        dec.decode(&mark(3 * UNIT));
        assert_eq!(dec.decode(&space(2016)), Some(DecodedToken::WordEnd('T')));
    }

    #[test]
    fn test_flush() {
        let mut dec = decoder();
        assert_eq!(dec.flush(), None);

        dec.decode(&mark(UNIT));
        dec.decode(&space(UNIT));
        dec.decode(&mark(3 * UNIT));
        assert_eq!(dec.flush(), Some(DecodedToken::Character('A')));
        assert!(dec.is_at_root());

        dec.decode(&mark(5000));
        assert_eq!(dec.flush(), Some(DecodedToken::Undecodable));
        assert!(dec.is_at_root());
    }

    #[test]
    fn test_invalid_config() {
        assert!(MorseDecoder::new(DecoderConfig { wpm: 0, tolerance: 0.4 }).is_err());
        assert!(MorseDecoder::new(DecoderConfig { wpm: 25, tolerance: 1.5 }).is_err());
        assert!(MorseDecoder::new(DecoderConfig { wpm: 25, tolerance: -0.1 }).is_err());
    }
}
