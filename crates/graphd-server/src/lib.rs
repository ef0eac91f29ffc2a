//! Unix-socket graph analysis server
//!
//! - `serial`: one connection at a time, only the requested algorithm
//! - `leader_follower`: worker pool sharing one accept, algorithms fanned out per connection
//! - `pipeline`: persistent MST → SCC → HAMILTON → MAXCLIQUE stages fed by blocking queues
//! - `job`: per-request state shared by tasks and stages
//! - `server`: binding, mode dispatch and graceful shutdown

pub mod client;
pub mod connection;
pub mod error;
pub mod job;
pub mod leader_follower;
pub mod pipeline;
pub mod serial;
pub mod server;

pub use error::{JobError, Result, ServerError};
pub use job::{GraphPair, Job, JobId};
pub use pipeline::{Pipeline, Stage};
pub use server::{Server, ServerHandle};
