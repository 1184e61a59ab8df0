use crate::error::Result;

/// Receives one PCM block at a time from a [`BlockSource`].
///
/// Live sources invoke this on the audio driver's thread, so implementations must not
/// block or allocate.
pub type BlockCallback = Box<dyn FnMut(&[i16]) + Send + 'static>;

/// Trait for producers of fixed-rate, mono, 16-bit PCM blocks.
///
/// This trait allows swapping implementations (live capture device vs recorded file).
pub trait BlockSource: Send {
    /// Start delivering blocks to `on_block`.
    fn start(&mut self, on_block: BlockCallback) -> Result<()>;

    /// Stop delivering blocks. Stopping a source that is not running is a no-op.
    fn stop(&mut self) -> Result<()>;

    /// Whether this source runs out on its own (a file) or runs until stopped (a device).
    fn is_finite(&self) -> bool {
        false
    }

    /// Block until a finite source has delivered its last block.
    ///
    /// Infinite sources return immediately.
    fn wait(&mut self) -> Result<()> {
        Ok(())
    }

    /// Sample rate of the delivered blocks in Hz.
    fn sample_rate(&self) -> u32;
}
