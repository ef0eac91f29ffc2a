use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

/// One-shot completion signal carrying a value from a single producer to
/// whoever waits on it. Only the first `complete` wins.
///
/// Backed by a one-slot channel: completing sends the value and drops the
/// sender, so a second `wait` sees a disconnected, empty channel.
#[derive(Debug)]
pub struct CompletionLatch<T> {
    sender: Mutex<Option<Sender<T>>>,
    receiver: Receiver<T>,
}

impl<T> Default for CompletionLatch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CompletionLatch<T> {
    pub fn new() -> Self {
        let (sender, receiver) = bounded(1);
        Self {
            sender: Mutex::new(Some(sender)),
            receiver,
        }
    }

    /// Returns `false` if the latch was already completed.
    pub fn complete(&self, value: T) -> bool {
        let Some(sender) = self.sender.lock().take() else {
            return false;
        };
        // the slot is empty and the receiver lives as long as `self`
        sender.try_send(value).is_ok()
    }

    pub fn is_complete(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Blocks until completed and takes the value. A second `wait` returns `None`.
    pub fn wait(&self) -> Option<T> {
        self.receiver.recv().ok()
    }
}
