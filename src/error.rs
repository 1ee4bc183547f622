//! Error types for the DM account client.

use std::time::Duration;
use thiserror::Error;

/// Error type for all account and mail-capture operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure or non-2xx HTTP status from either service.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    /// Response body could not be decoded into the expected shape.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Login succeeded but the `x-dm-auth-token` header was absent or
    /// not valid UTF-8.
    #[error("auth token header missing from login response")]
    MissingAuthToken,
    /// The inbox yielded no extractable token within the retry budget.
    #[error("no token for `{match_key}` after {attempts} attempts")]
    TokenNotFound {
        /// Login or recipient address the poll was matching on.
        match_key: String,
        /// Number of inbox scans performed before giving up.
        attempts: u32,
    },
    /// A flow finished but took longer than its configured wall-clock budget.
    #[error("flow took {elapsed:?}, budget was {budget:?}")]
    DeadlineExceeded {
        /// Measured duration of the flow.
        elapsed: Duration,
        /// Configured budget it had to fit in.
        budget: Duration,
    },
}
