//! Attempt outcomes and resolver errors.

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Maximum number of response body characters kept for diagnostics.
const BODY_SNIPPET_CHARS: usize = 200;

/// The settled result of one attempt against one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// 2xx with a valid shape. Holds the validated payload.
    Success(Value),
    /// Failed; the resolver advances to the next candidate.
    Failure(AttemptFailure),
}

/// Broad failure class used for logs and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The backend answered, but not acceptably.
    Rejected,
    /// The backend could not be reached in time.
    NetworkFailure,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::Rejected => "rejected",
            FailureClass::NetworkFailure => "network_failure",
        }
    }
}

/// Why a single attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    /// No response within the per-attempt deadline.
    #[error("timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// DNS, connect, TLS or body read failure.
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx whose body failed validation.
    #[error("malformed response (HTTP {status}): {reason}")]
    Malformed { status: u16, reason: String },
}

impl AttemptFailure {
    pub fn class(&self) -> FailureClass {
        match self {
            AttemptFailure::Timeout(_) | AttemptFailure::Network(_) => FailureClass::NetworkFailure,
            AttemptFailure::Status { .. } | AttemptFailure::Malformed { .. } => FailureClass::Rejected,
        }
    }

    pub(crate) fn status(status: u16, body: &str) -> Self {
        AttemptFailure::Status {
            status,
            body: snippet(body),
        }
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_SNIPPET_CHARS {
        trimmed.to_string()
    } else {
        let mut cut: String = trimmed.chars().take(BODY_SNIPPET_CHARS).collect();
        cut.push('…');
        cut
    }
}

/// One failed attempt, kept for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFailure {
    /// Position in the declared candidate list.
    pub index: usize,
    pub base_url: String,
    pub failure: AttemptFailure,
}

impl fmt::Display for CandidateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.index, self.base_url, self.failure)
    }
}

/// Every candidate failed (or there were none).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("all candidates failed for {operation} ({} attempted)", .failures.len())]
pub struct ExhaustedError {
    pub operation: &'static str,
    /// Per-candidate failures in attempt order.
    pub failures: Vec<CandidateFailure>,
}

impl ExhaustedError {
    /// True when no candidate was configured at all.
    pub fn no_candidates(&self) -> bool {
        self.failures.is_empty()
    }

    /// Multi-line summary of every failure.
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        for failure in &self.failures {
            out.push_str("\n  ");
            out.push_str(&failure.to_string());
        }
        out
    }
}
