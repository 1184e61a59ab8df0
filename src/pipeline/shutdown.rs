//! Cooperative shutdown shared by every pipeline thread.

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};
use std::sync::{Arc, Mutex};

/// A one-shot stop signal.
///
/// Triggering drops the only sender of an internal channel, so every listener's
/// receiver becomes disconnected at once. That makes the signal usable both as a flag
/// (`is_triggered`) and inside `crossbeam_channel::select!`.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    listener: Receiver<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            trigger: Arc::new(Mutex::new(Some(tx))),
            listener: rx,
        }
    }

    /// Signals every clone. Idempotent.
    pub fn trigger(&self) {
        if let Ok(mut sender) = self.trigger.lock() {
            sender.take();
        }
    }

    pub fn is_triggered(&self) -> bool {
        matches!(self.listener.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// A receiver that disconnects when the signal fires; nothing is ever sent on it.
    pub fn listener(&self) -> Receiver<()> {
        self.listener.clone()
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
