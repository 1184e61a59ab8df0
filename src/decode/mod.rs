//! Morse decoding: symbol table, decode tree, timing windows and the decoder itself.

pub mod decoder;
pub mod offline;
pub mod table;
pub mod timing;
pub mod tree;

pub use decoder::{Cursor, DecoderConfig, MorseDecoder};
pub use offline::{decode_samples, decode_tokens};
pub use table::{MORSE_TABLE, encode};
pub use timing::{TimingWindow, TimingWindows};
pub use tree::DecodeTree;
