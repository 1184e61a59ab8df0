//! Data types passed between pipeline stations.

use crate::defaults::ERROR_TOKEN;
use std::fmt;
use std::time::{Duration, Instant};

/// The tone flag for one audio block, stamped when the block arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneSample {
    pub present: bool,
    pub at: Instant,
}

/// A completed tone-on or tone-off interval.
///
/// `state == true` means a mark (tone present) of `duration` just ended;
/// `state == false` means a space just ended or was flushed by the silence timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub state: bool,
    pub duration: Duration,
}

impl Detection {
    pub fn new(state: bool, duration: Duration) -> Self {
        Self { state, duration }
    }

    /// A tone-on interval.
    pub fn mark(duration: Duration) -> Self {
        Self::new(true, duration)
    }

    /// A tone-off interval.
    pub fn space(duration: Duration) -> Self {
        Self::new(false, duration)
    }
}

/// One unit of decoder output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedToken {
    /// A character closed by an inter-character gap.
    Character(char),
    /// A character closed by a word gap or end of transmission; renders with a trailing space.
    WordEnd(char),
    /// A sequence that maps to no character.
    Undecodable,
}

impl DecodedToken {
    /// True for the `|?|` error token.
    pub fn is_error(&self) -> bool {
        matches!(self, DecodedToken::Undecodable)
    }
}

impl fmt::Display for DecodedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedToken::Character(c) => write!(f, "{}", c),
            DecodedToken::WordEnd(c) => write!(f, "{} ", c),
            DecodedToken::Undecodable => f.write_str(ERROR_TOKEN),
        }
    }
}
