use std::io;
use thiserror::Error;

/// Errors produced by the linelog buffering layer and its host.
#[derive(Debug, Error)]
pub enum LinelogError {
    /// Byte acquisition from the producer failed partway through a write.
    ///
    /// `consumed` bytes were appended before the fault; they stay buffered
    /// for a later write or flush.
    #[error("producer read failed after {consumed} bytes: {source}")]
    Acquisition {
        consumed: usize,
        #[source]
        source: io::Error,
    },

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("session limit reached ({0})")]
    SessionLimit(usize),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

pub type LinelogResult<T> = Result<T, LinelogError>;
