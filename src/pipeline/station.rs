//! Core station abstraction and runner for the decode pipeline.

use crate::pipeline::error::{ErrorReporter, StationError};
use crate::pipeline::shutdown::ShutdownSignal;
use crossbeam_channel::{Receiver, Sender, select};
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A processing station in the pipeline.
///
/// Each station receives input, processes it, and produces output.
/// Stations run in their own threads and are connected by channels.
pub trait Station: Send + 'static {
    /// The input type this station receives.
    type Input: Send + 'static;
    /// The output type this station produces.
    type Output: Send + 'static;

    /// Processes a single input item.
    ///
    /// Returns:
    /// - `Ok(Some(output))` - Successfully processed and produced output
    /// - `Ok(None)` - Successfully processed but no output
    /// - `Err(StationError)` - Processing failed
    fn process(&mut self, input: Self::Input) -> Result<Option<Self::Output>, StationError>;

    /// Emits whatever is still pending when the station stops.
    ///
    /// Called once, on shutdown or when the input closes, before the output closes.
    fn flush(&mut self) -> Option<Self::Output> {
        None
    }

    /// Returns the name of this station for logging and error reporting.
    fn name(&self) -> &'static str;

    /// Called when the station is shutting down, after `flush`.
    fn shutdown(&mut self) {}
}

/// Runs a station in a dedicated thread.
pub struct StationRunner<S: Station> {
    handle: Option<JoinHandle<()>>,
    station_name: &'static str,
    _phantom: PhantomData<S>,
}

impl<S: Station> StationRunner<S> {
    /// Spawns a new station in a dedicated thread.
    ///
    /// The thread runs until the shutdown signal fires, the input channel disconnects,
    /// the output channel disconnects, or the station reports a fatal error. In every
    /// case the output sender is dropped on exit, which closes the channel downstream.
    pub fn spawn(
        mut station: S,
        input_rx: Receiver<S::Input>,
        output_tx: Sender<S::Output>,
        shutdown: ShutdownSignal,
        error_reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let station_name = station.name();

        let handle = thread::spawn(move || {
            Self::run_station(&mut station, input_rx, output_tx, shutdown, error_reporter);
        });

        Self {
            handle: Some(handle),
            station_name,
            _phantom: PhantomData,
        }
    }

    /// Main processing loop for the station.
    fn run_station(
        station: &mut S,
        input_rx: Receiver<S::Input>,
        output_tx: Sender<S::Output>,
        shutdown: ShutdownSignal,
        error_reporter: Arc<dyn ErrorReporter>,
    ) {
        let station_name = station.name();
        let stop = shutdown.listener();
        let mut downstream_open = true;

        loop {
            let input = select! {
                recv(input_rx) -> msg => match msg {
                    Ok(input) => input,
                    Err(_) => break,
                },
                recv(stop) -> _ => break,
            };

            match station.process(input) {
                Ok(Some(output)) => {
                    if output_tx.send(output).is_err() {
                        downstream_open = false;
                        break;
                    }
                }
                Ok(None) => {}
                Err(error @ StationError::Recoverable(_)) => {
                    error_reporter.report(station_name, &error);
                }
                Err(error @ StationError::Fatal(_)) => {
                    error_reporter.report(station_name, &error);
                    break;
                }
            }
        }

        if downstream_open && let Some(output) = station.flush() {
            log::debug!("[{}] flushed pending output", station_name);
            let _ = output_tx.send(output);
        }
        station.shutdown();
        log::debug!("[{}] stopped", station_name);
    }

    /// Waits for the station thread to complete.
    pub fn join(mut self) -> Result<(), String> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| format!("Station '{}' thread panicked", self.station_name))
        } else {
            Ok(())
        }
    }

    /// Returns the name of the station.
    pub fn name(&self) -> &'static str {
        self.station_name
    }
}
