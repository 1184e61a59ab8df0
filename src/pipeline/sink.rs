use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::DecodedToken;
use std::io::{self, IsTerminal, Write};

/// Pluggable output handler for decoded tokens.
pub trait TextSink: Send + 'static {
    /// Handle one decoded token. Called in emission order.
    fn handle(&mut self, token: &DecodedToken) -> crate::error::Result<()>;

    /// Called on pipeline shutdown. Return accumulated text if applicable.
    fn finish(&mut self) -> Option<String> {
        None
    }

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Station wrapper for any TextSink implementation.
///
/// Runs until the decoder closes its output, so a character flushed at shutdown
/// still reaches the sink. The sink's `finish()` result is sent on `result_tx`.
pub(crate) struct SinkStation {
    sink: Box<dyn TextSink>,
    result_tx: Option<crossbeam_channel::Sender<Option<String>>>,
    tokens: usize,
}

impl SinkStation {
    pub(crate) fn new(
        sink: Box<dyn TextSink>,
        result_tx: crossbeam_channel::Sender<Option<String>>,
    ) -> Self {
        Self {
            sink,
            result_tx: Some(result_tx),
            tokens: 0,
        }
    }
}

impl Station for SinkStation {
    type Input = DecodedToken;
    type Output = ();

    fn name(&self) -> &'static str {
        self.sink.name()
    }

    fn process(&mut self, token: DecodedToken) -> Result<Option<()>, StationError> {
        self.tokens += 1;
        self.sink
            .handle(&token)
            .map_err(|e| StationError::Recoverable(format!("failed to write {:?}: {}", token, e)))?;
        Ok(None)
    }

    fn shutdown(&mut self) {
        log::debug!("[{}] {} tokens written", self.sink.name(), self.tokens);
        let result = self.sink.finish();
        if let Some(tx) = self.result_tx.take()
            && tx.send(result).is_err()
        {
            log::warn!("sink shutdown: result receiver already dropped");
        }
    }
}

/// Collects decoded text for offline runs and library use.
/// Returns the concatenated tokens on finish().
#[derive(Debug, Default)]
pub struct CollectorSink {
    collected: String,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextSink for CollectorSink {
    fn handle(&mut self, token: &DecodedToken) -> crate::error::Result<()> {
        use std::fmt::Write as _;
        let _ = write!(self.collected, "{}", token);
        Ok(())
    }

    fn finish(&mut self) -> Option<String> {
        if self.collected.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.collected))
        }
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

/// Writes tokens to stdout as they arrive, without newlines.
pub struct StdoutSink {
    color: bool,
    wrote_any: bool,
}

impl StdoutSink {
    /// Colours error tokens when stdout is a terminal.
    pub fn new() -> Self {
        Self {
            color: io::stdout().is_terminal(),
            wrote_any: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn render(&self, out: &mut impl Write, token: &DecodedToken) -> io::Result<()> {
        #[cfg(feature = "cli")]
        if self.color && token.is_error() {
            use owo_colors::OwoColorize;
            return write!(out, "{}", token.to_string().red());
        }
        write!(out, "{}", token)
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSink for StdoutSink {
    fn handle(&mut self, token: &DecodedToken) -> crate::error::Result<()> {
        let mut out = io::stdout().lock();
        self.render(&mut out, token)?;
        out.flush()?;
        self.wrote_any = true;
        Ok(())
    }

    fn finish(&mut self) -> Option<String> {
        if self.wrote_any {
            println!();
        }
        None
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}
