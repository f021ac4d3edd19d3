//! Backend resolution with ordered fallback.
//!
//! # Data Flow
//! ```text
//! RequestEnvelope (operation, method, path, body, timeout, validator)
//!     → candidate.rs (attempt order, preferred candidate first)
//!     → attempt against candidate[i]:
//!         network error / timeout  → NetworkFailure, try candidate[i+1]
//!         non-2xx                  → Rejected, try candidate[i+1]
//!         2xx, validate.rs Invalid → Rejected, try candidate[i+1]
//!         2xx, validate.rs Valid   → Success (terminal)
//!     → list exhausted → ExhaustedError (terminal)
//! ```
//!
//! # Design Decisions
//! - One attempt per candidate, no retries or backoff
//! - Candidate list is immutable; the last good backend is returned to the
//!   caller as a `Preferred` value instead of being cached globally
//! - Race mode overlaps attempts but still picks winners in priority order
//! - The resolver knows nothing about the domain; callers own fallbacks

pub mod candidate;
pub mod envelope;
pub mod outcome;
pub mod validate;

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time;
use uuid::Uuid;

use crate::config::environment::candidates_for_host;
use crate::config::ClientConfig;
use crate::observability::metrics;

pub use candidate::{Candidate, CandidateError, CandidateList, Preferred};
pub use envelope::RequestEnvelope;
pub use outcome::{AttemptFailure, AttemptOutcome, CandidateFailure, ExhaustedError, FailureClass};
pub use validate::{Envelope, EnvelopeValidator, Liveness, Validation};

/// Header carrying the logical call id, shared by every attempt.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// How attempts are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One candidate at a time, in priority order.
    #[default]
    Sequential,
    /// All candidates at once; the highest-priority success wins.
    Race,
}

/// Errors building a resolver from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Candidate(#[from] CandidateError),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// A successful logical call.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: T,
    /// Position of the answering candidate in the declared list.
    pub index: usize,
    pub candidate: Candidate,
    /// Candidates that failed before this one, in attempt order.
    pub failures: Vec<CandidateFailure>,
    pub elapsed: Duration,
    pub request_id: Uuid,
}

impl<T> Resolved<T> {
    /// The answering candidate, to be passed back on the next call.
    pub fn preferred(&self) -> Preferred {
        Preferred::from(&self.candidate)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        Resolved {
            value: f(self.value),
            index: self.index,
            candidate: self.candidate,
            failures: self.failures,
            elapsed: self.elapsed,
            request_id: self.request_id,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Resolved<U>, E> {
        Ok(Resolved {
            value: f(self.value)?,
            index: self.index,
            candidate: self.candidate,
            failures: self.failures,
            elapsed: self.elapsed,
            request_id: self.request_id,
        })
    }
}

type Settled = Result<(usize, Candidate, Value, Vec<CandidateFailure>), Vec<CandidateFailure>>;

/// Ordered-fallback HTTP client.
#[derive(Debug, Clone)]
pub struct Resolver {
    http: reqwest::Client,
    candidates: CandidateList,
    strategy: Strategy,
}

impl Resolver {
    /// Create a resolver with a default HTTP client.
    pub fn new(candidates: CandidateList) -> Self {
        Self::with_client(candidates, reqwest::Client::new())
    }

    /// Create a resolver around an existing HTTP client.
    pub fn with_client(candidates: CandidateList, http: reqwest::Client) -> Self {
        Self {
            http,
            candidates,
            strategy: Strategy::Sequential,
        }
    }

    /// Build from configuration, selecting candidates for `host`.
    pub fn from_config(config: &ClientConfig, host: &str) -> Result<Self, BuildError> {
        let urls = candidates_for_host(&config.backends, host);
        let candidates = CandidateList::new(urls)?;
        let http = reqwest::Client::builder()
            .user_agent(config.resolver.user_agent.clone())
            .build()?;

        tracing::info!(
            host = %host,
            candidates = candidates.len(),
            strategy = ?config.resolver.strategy,
            "Resolver initialized"
        );

        Ok(Self::with_client(candidates, http).strategy(config.resolver.strategy))
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Try every candidate in declared order until one succeeds.
    pub async fn resolve_and_send(
        &self,
        envelope: &RequestEnvelope,
    ) -> Result<Resolved<Value>, ExhaustedError> {
        self.resolve_and_send_with(envelope, None).await
    }

    /// Like [`resolve_and_send`](Self::resolve_and_send), starting from a
    /// previously successful candidate when it is still in the list.
    pub async fn resolve_and_send_with(
        &self,
        envelope: &RequestEnvelope,
        preferred: Option<&Preferred>,
    ) -> Result<Resolved<Value>, ExhaustedError> {
        let request_id = Uuid::new_v4();
        let order = self.candidates.attempt_order(preferred);

        if order.is_empty() {
            tracing::warn!(operation = envelope.operation, "No backend candidates configured");
            metrics::record_exhausted(envelope.operation);
            return Err(ExhaustedError {
                operation: envelope.operation,
                failures: Vec::new(),
            });
        }

        let started = Instant::now();
        let settled = match self.strategy {
            Strategy::Sequential => self.sequential(&order, envelope, request_id).await,
            Strategy::Race => self.race(&order, envelope, request_id).await,
        };

        match settled {
            Ok((index, candidate, value, failures)) => {
                tracing::info!(
                    operation = envelope.operation,
                    %request_id,
                    index,
                    candidate = %candidate,
                    skipped = failures.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Backend resolved"
                );
                Ok(Resolved {
                    value,
                    index,
                    candidate,
                    failures,
                    elapsed: started.elapsed(),
                    request_id,
                })
            }
            Err(failures) => {
                tracing::warn!(
                    operation = envelope.operation,
                    %request_id,
                    attempted = failures.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "All backend candidates failed"
                );
                metrics::record_exhausted(envelope.operation);
                Err(ExhaustedError {
                    operation: envelope.operation,
                    failures,
                })
            }
        }
    }

    async fn sequential(
        &self,
        order: &[usize],
        envelope: &RequestEnvelope,
        request_id: Uuid,
    ) -> Settled {
        let mut failures = Vec::with_capacity(order.len());

        for &index in order {
            let Some(candidate) = self.candidates.get(index) else {
                continue;
            };
            tracing::debug!(
                operation = envelope.operation,
                %request_id,
                index,
                candidate = %candidate,
                "Trying backend candidate"
            );

            match attempt(&self.http, candidate, envelope, request_id).await {
                AttemptOutcome::Success(value) => {
                    return Ok((index, candidate.clone(), value, failures))
                }
                AttemptOutcome::Failure(failure) => {
                    failures.push(record_failure(envelope, request_id, index, candidate, failure));
                }
            }
        }

        Err(failures)
    }

    async fn race(&self, order: &[usize], envelope: &RequestEnvelope, request_id: Uuid) -> Settled {
        let handles: Vec<(usize, Candidate, JoinHandle<AttemptOutcome>)> = order
            .iter()
            .filter_map(|&index| {
                let candidate = self.candidates.get(index)?.clone();
                let http = self.http.clone();
                let task_candidate = candidate.clone();
                let task_envelope = envelope.clone();
                let handle = tokio::spawn(async move {
                    attempt(&http, &task_candidate, &task_envelope, request_id).await
                });
                Some((index, candidate, handle))
            })
            .collect();

        tracing::debug!(
            operation = envelope.operation,
            %request_id,
            in_flight = handles.len(),
            "Racing backend candidates"
        );

        // Dropping the guard, on any return or when the caller drops this
        // future, aborts whatever is still in flight.
        let _in_flight = InFlightGuard(handles.iter().map(|(_, _, h)| h.abort_handle()).collect());

        let mut failures = Vec::with_capacity(handles.len());

        for (index, candidate, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => AttemptOutcome::Failure(AttemptFailure::Network(format!(
                    "attempt task failed: {}",
                    e
                ))),
            };

            match outcome {
                AttemptOutcome::Success(value) => return Ok((index, candidate, value, failures)),
                AttemptOutcome::Failure(failure) => {
                    failures.push(record_failure(envelope, request_id, index, &candidate, failure));
                }
            }
        }

        Err(failures)
    }
}

/// Aborts raced attempts when the race settles or is abandoned.
struct InFlightGuard(Vec<AbortHandle>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

fn record_failure(
    envelope: &RequestEnvelope,
    request_id: Uuid,
    index: usize,
    candidate: &Candidate,
    failure: AttemptFailure,
) -> CandidateFailure {
    tracing::warn!(
        operation = envelope.operation,
        %request_id,
        index,
        candidate = %candidate,
        class = failure.class().as_str(),
        error = %failure,
        "Backend candidate failed, trying next"
    );
    CandidateFailure {
        index,
        base_url: candidate.as_str().to_string(),
        failure,
    }
}

/// Issue one attempt and classify it.
pub(crate) async fn attempt(
    http: &reqwest::Client,
    candidate: &Candidate,
    envelope: &RequestEnvelope,
    request_id: Uuid,
) -> AttemptOutcome {
    let started = Instant::now();
    let outcome = send_once(http, candidate, envelope, request_id).await;

    let label = match &outcome {
        AttemptOutcome::Success(_) => "success",
        AttemptOutcome::Failure(failure) => failure.class().as_str(),
    };
    metrics::record_attempt(envelope.operation, label, started.elapsed());

    outcome
}

async fn send_once(
    http: &reqwest::Client,
    candidate: &Candidate,
    envelope: &RequestEnvelope,
    request_id: Uuid,
) -> AttemptOutcome {
    let url = candidate.endpoint(&envelope.path);
    let mut request = http
        .request(envelope.method.clone(), &url)
        .timeout(envelope.timeout)
        .header(REQUEST_ID_HEADER, request_id.to_string());
    if !envelope.query.is_empty() {
        request = request.query(&envelope.query);
    }
    if let Some(body) = &envelope.body {
        request = request.json(body);
    }

    let exchange = async {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok::<_, reqwest::Error>((status, text))
    };

    let (status, text) = match time::timeout(envelope.timeout, exchange).await {
        Ok(Ok(exchanged)) => exchanged,
        Ok(Err(e)) if e.is_timeout() => {
            return AttemptOutcome::Failure(AttemptFailure::Timeout(envelope.timeout))
        }
        Ok(Err(e)) => return AttemptOutcome::Failure(AttemptFailure::Network(e.to_string())),
        Err(_) => return AttemptOutcome::Failure(AttemptFailure::Timeout(envelope.timeout)),
    };

    if !status.is_success() {
        return AttemptOutcome::Failure(AttemptFailure::status(status.as_u16(), &text));
    }

    let body = match serde_json::from_str::<Value>(&text) {
        Ok(json) => json,
        Err(_) => Value::String(text),
    };

    match envelope.validator.validate(body) {
        Validation::Valid(payload) => AttemptOutcome::Success(payload),
        Validation::Invalid(reason) => AttemptOutcome::Failure(AttemptFailure::Malformed {
            status: status.as_u16(),
            reason,
        }),
    }
}
