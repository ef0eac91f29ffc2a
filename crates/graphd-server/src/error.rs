use std::path::PathBuf;

use graphd_core::protocol::{error_reply, request_error_reply};
use graphd_core::{GraphError, RequestError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind {path:?}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// Why a request never became a running job.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl JobError {
    /// Whole-response reply sent instead of any graph output.
    pub fn reply(&self) -> String {
        match self {
            JobError::Request(err) => request_error_reply(err),
            JobError::Graph(err) => error_reply(err),
        }
    }
}
