//! Gateway Error Types
//!
//! Errors are scoped to the single request or session that triggered them.
//! None of them are fatal to the process: the front door converts every
//! [`UpstreamError`] into a failure reply or a `system` event, and a
//! [`SessionError`] only affects the connection being registered.

use std::error::Error as _;

use thiserror::Error;

use crate::session::SessionId;

/// Failures talking to the generation backend
///
/// Malformed stream lines are not errors; they are skipped by the decoder.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The HTTP call could not be established or failed at the transport level
    ///
    /// Displayed with its whole source chain, so a timeout or a refused
    /// connection is named in the text clients receive.
    #[error("upstream request failed: {}", with_causes(.0))]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("upstream returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// The stream broke after it had started delivering data
    #[error("upstream stream interrupted: {0}")]
    Interrupted(String),

    /// The HTTP client could not be built from the configuration
    #[error("failed to build upstream client: {0}")]
    Client(String),
}

/// `err` followed by each of its sources, `: `-separated
fn with_causes(err: &reqwest::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.ends_with(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

/// Session registry failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Another live session already holds this identifier
    #[error("session id {0} is already registered")]
    DuplicateId(SessionId),
}
