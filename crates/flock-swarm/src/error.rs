//! Swarm error taxonomy.

use thiserror::Error;

/// Failures in swarm coordination and routing.
///
/// Lease denial is deliberately absent: `granted: false` is a normal
/// control-flow signal carried by [`crate::lease::ClaimOutcome`].
#[derive(Debug, Error)]
pub enum SwarmError {
    /// Transport-level failure: timeout, connection refused, DNS, or an
    /// unparsable response body.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote answered cleanly with a non-2xx status.
    #[error("peer answered with status {status}")]
    Protocol { status: u16 },

    /// A relay endpoint was called for a model this node is not actively
    /// serving.
    #[error("model {0} is not actively served on this node")]
    NotServing(String),

    /// The router exhausted both remote candidates and the local fallback
    /// ladder.  Surfaced to the caller as a final, user-visible condition.
    #[error("no model available to serve the request")]
    NoModelAvailable,

    /// The local inference engine failed while serving a fallback request.
    #[error("inference engine error: {0}")]
    Engine(#[source] anyhow::Error),
}

impl SwarmError {
    /// Whether a relay attempt that failed this way should be retried on the
    /// same candidate.  Transport failures and 5xx answers are retryable;
    /// clean non-matching responses (4xx) are not.
    pub fn retryable(&self) -> bool {
        match self {
            SwarmError::Http(_) => true,
            SwarmError::Protocol { status } => *status >= 500,
            _ => false,
        }
    }
}
