//! Ordered backend candidates.
//!
//! # Responsibilities
//! - Parse and normalize candidate base URLs
//! - Preserve declared priority order
//! - Compute attempt order, optionally promoting a preferred candidate

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use url::Url;

/// Errors raised while building a candidate list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CandidateError {
    #[error("invalid candidate URL '{value}': {reason}")]
    InvalidUrl { value: String, reason: String },

    #[error("candidate URL '{0}' must use http or https")]
    UnsupportedScheme(String),

    #[error("candidate URL '{0}' appears more than once")]
    Duplicate(String),
}

/// A single backend base URL, e.g. `https://a.example/api/v1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    base: Url,
}

impl Candidate {
    /// Parse a base URL. Trailing slashes are dropped so that path
    /// suffixes can be appended verbatim.
    pub fn parse(value: &str) -> Result<Self, CandidateError> {
        let trimmed = value.trim().trim_end_matches('/');
        let base = Url::parse(trimmed).map_err(|e| CandidateError::InvalidUrl {
            value: value.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(CandidateError::UnsupportedScheme(value.to_string()));
        }
        Ok(Self { base })
    }

    /// The base URL without a trailing slash.
    pub fn as_str(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Full URL for an operation path such as `/ai/chat`.
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.as_str(), path)
        } else {
            format!("{}/{}", self.as_str(), path)
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate that answered successfully, handed back to callers so the
/// next logical call may start there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferred {
    pub base_url: String,
}

impl From<&Candidate> for Preferred {
    fn from(candidate: &Candidate) -> Self {
        Self {
            base_url: candidate.as_str().to_string(),
        }
    }
}

/// Immutable, priority-ordered list of candidates. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct CandidateList {
    candidates: Arc<[Candidate]>,
}

impl CandidateList {
    /// Build a list from raw URLs, keeping their order.
    pub fn new<I, S>(urls: I) -> Result<Self, CandidateError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut candidates: Vec<Candidate> = Vec::new();
        for url in urls {
            let candidate = Candidate::parse(url.as_ref())?;
            if candidates.contains(&candidate) {
                return Err(CandidateError::Duplicate(url.as_ref().to_string()));
            }
            candidates.push(candidate);
        }
        Ok(Self {
            candidates: candidates.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    /// Indices in the order they should be attempted.
    ///
    /// Declared order, except that a preferred candidate present in the list
    /// moves to the front. Unknown preferences are ignored.
    pub fn attempt_order(&self, preferred: Option<&Preferred>) -> Vec<usize> {
        let promoted = preferred.and_then(|p| {
            self.candidates
                .iter()
                .position(|c| c.as_str() == p.base_url.trim_end_matches('/'))
        });

        let mut order = Vec::with_capacity(self.candidates.len());
        if let Some(first) = promoted {
            order.push(first);
        }
        order.extend((0..self.candidates.len()).filter(|i| Some(*i) != promoted));
        order
    }
}
