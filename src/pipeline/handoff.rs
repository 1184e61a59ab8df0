//! Bounded hand-off queue with a selectable overflow policy.

use crossbeam_channel::{Receiver, SendError, Sender, TrySendError, bounded};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// What a full queue does with a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Evict the oldest queued value; the sender never waits.
    #[default]
    Overwrite,
    /// Wait for the consumer to make room.
    Block,
}

/// Producer half of a hand-off queue.
pub struct HandoffSender<T> {
    tx: Sender<T>,
    /// Held only under `Overwrite`, to evict stale values.
    evict: Option<Receiver<T>>,
    overwritten: Arc<AtomicU64>,
}

impl<T> Clone for HandoffSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            evict: self.evict.clone(),
            overwritten: Arc::clone(&self.overwritten),
        }
    }
}

impl<T> HandoffSender<T> {
    /// Queues `value` according to the policy.
    ///
    /// # Errors
    /// Returns the value back once the consumer has gone away.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        let Some(evict) = &self.evict else {
            return self.tx.send(value);
        };

        let mut value = value;
        loop {
            match self.tx.try_send(value) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Disconnected(v)) => return Err(SendError(v)),
                Err(TrySendError::Full(v)) => {
                    if evict.try_recv().is_ok() {
                        self.overwritten.fetch_add(1, Ordering::Relaxed);
                    }
                    value = v;
                }
            }
        }
    }

    /// Values discarded to make room so far.
    pub fn overwritten(&self) -> u64 {
        self.overwritten.load(Ordering::Relaxed)
    }

    /// The eviction counter, readable without holding the queue open.
    pub(crate) fn overwrite_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.overwritten)
    }
}

/// Creates a FIFO hand-off queue holding at most `depth` values (at least one).
pub fn handoff<T>(depth: usize, policy: OverflowPolicy) -> (HandoffSender<T>, Receiver<T>) {
    let (tx, rx) = bounded(depth.max(1));
    let evict = match policy {
        OverflowPolicy::Overwrite => Some(rx.clone()),
        OverflowPolicy::Block => None,
    };
    (
        HandoffSender {
            tx,
            evict,
            overwritten: Arc::new(AtomicU64::new(0)),
        },
        rx,
    )
}
