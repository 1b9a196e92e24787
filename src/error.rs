//! Error taxonomy for a check run.

use crate::snapshot::Source;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CheckError>;

#[derive(Debug, Error)]
pub enum CheckError {
    /// The remote API rejected our credentials. Fatal, no partial scan.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Rate limiting or a transient server-side failure. Retried with
    /// backoff inside the remote scanner; never escapes a completed scan.
    #[error("transient remote failure: {0}")]
    Transient(String),

    /// A non-transient remote API error (bad request, missing folder, ...).
    #[error("remote API error: {0}")]
    RemoteApi(String),

    /// One side could not produce a complete snapshot. Fatal for the run;
    /// any previously cached snapshot for that side remains loadable.
    #[error("{side} scan failed: {message}")]
    Scan { side: Source, message: String },

    #[error("cache error: {0}")]
    Cache(String),

    #[error("report error: {0}")]
    Report(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl CheckError {
    pub fn scan(side: Source, message: impl Into<String>) -> Self {
        CheckError::Scan {
            side,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, CheckError::Transient(_))
    }
}
