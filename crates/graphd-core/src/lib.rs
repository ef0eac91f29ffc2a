pub mod algorithm;
pub mod config;
pub mod error;
pub mod graph;
pub mod protocol;

pub use algorithm::*;
pub use config::{LoggingConfig, ServerConfig, ServerMode};
pub use error::*;
pub use graph::*;
pub use protocol::{GraphRequest, MatrixRequest};
