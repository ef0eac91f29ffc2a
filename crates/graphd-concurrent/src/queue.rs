use std::fmt;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use thiserror::Error;

#[derive(Error)]
pub enum QueueError<T> {
    /// The queue was closed; the rejected item is handed back.
    #[error("queue is closed")]
    Closed(T),
}

impl<T> QueueError<T> {
    pub fn into_inner(self) -> T {
        match self {
            QueueError::Closed(item) => item,
        }
    }
}

impl<T> fmt::Debug for QueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

/// Unbounded FIFO queue whose consumers block until an item arrives or the
/// queue is closed.
///
/// - `push` fails once the queue is closed
/// - `pop` keeps draining after close and returns `None` only when closed and empty
/// - `close` wakes every blocked consumer
///
/// The queue owns the only sender of its channel, so closing it disconnects
/// the channel and blocked `recv` calls return once the backlog is drained.
pub struct BlockingQueue<T> {
    sender: RwLock<Option<Sender<T>>>,
    receiver: Receiver<T>,
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BlockingQueue<T> {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender: RwLock::new(Some(sender)),
            receiver,
        }
    }

    pub fn push(&self, item: T) -> Result<(), QueueError<T>> {
        match &*self.sender.read() {
            Some(sender) => sender
                .send(item)
                .map_err(|err| QueueError::Closed(err.into_inner())),
            None => Err(QueueError::Closed(item)),
        }
    }

    pub fn pop(&self) -> Option<T> {
        self.receiver.recv().ok()
    }

    /// Idempotent.
    pub fn close(&self) {
        self.sender.write().take();
    }
}

impl<T> fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingQueue")
            .field("len", &self.receiver.len())
            .field("closed", &self.sender.read().is_none())
            .finish()
    }
}
