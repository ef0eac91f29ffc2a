//! Blocking synchronisation primitives for graphd's worker pools
//!
//! - `queue`: Unbounded blocking MPMC queue over a crossbeam channel, with close + wake-all
//! - `token`: Leader token for leader-follower pools (wake-one hand-off)
//! - `latch`: One-shot completion latch carrying a value (one-slot channel)

pub mod latch;
pub mod queue;
pub mod token;

pub use latch::CompletionLatch;
pub use queue::{BlockingQueue, QueueError};
pub use token::{LeaderToken, Leadership};
