//! Deployment probe.
//!
//! # Responsibilities
//! - Periodically probe every candidate's `/health`
//! - Update per-candidate health state based on results
//! - Export health gauges and log transitions

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time;
use uuid::Uuid;

use crate::api::Operation;
use crate::config::{HealthCheckConfig, TimeoutConfig};
use crate::health::state::{CandidateHealth, HealthState};
use crate::observability::metrics;
use crate::resolver::{self, AttemptOutcome, RequestEnvelope, Resolver};

/// Result of probing one candidate once.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub index: usize,
    pub base_url: String,
    pub alive: bool,
    pub state: HealthState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

pub struct Probe {
    http: reqwest::Client,
    envelope: RequestEnvelope,
    config: HealthCheckConfig,
    candidates: Vec<Arc<CandidateHealth>>,
}

impl Probe {
    pub fn new(resolver: &Resolver, timeouts: &TimeoutConfig, config: HealthCheckConfig) -> Self {
        let candidates = resolver
            .candidates()
            .iter()
            .cloned()
            .map(|c| Arc::new(CandidateHealth::new(c)))
            .collect();

        Self {
            http: resolver.http().clone(),
            envelope: Operation::Health.envelope(None, timeouts),
            config,
            candidates,
        }
    }

    pub fn candidates(&self) -> &[Arc<CandidateHealth>] {
        &self.candidates
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if self.candidates.is_empty() {
            tracing::warn!("No backend candidates to probe");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            candidates = self.candidates.len(),
            "Deployment probe starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs.max(1)));

        // Shutdown also cuts a round short; a stalled candidate does not hold the loop.
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => break,
            }
            tokio::select! {
                _ = self.check_all() => {}
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!("Deployment probe received shutdown signal, exiting loop");
    }

    /// Probe every candidate once, in declared order.
    pub async fn check_all(&self) -> Vec<ProbeReport> {
        let mut reports = Vec::with_capacity(self.candidates.len());

        for (index, health) in self.candidates.iter().enumerate() {
            let started = Instant::now();
            let outcome =
                resolver::attempt(&self.http, &health.candidate, &self.envelope, Uuid::new_v4()).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            let (alive, error) = match outcome {
                AttemptOutcome::Success(_) => (true, None),
                AttemptOutcome::Failure(failure) => {
                    tracing::warn!(
                        candidate = %health.candidate,
                        error = %failure,
                        "Health probe failed"
                    );
                    (false, Some(failure.to_string()))
                }
            };

            let transition = if alive {
                health.mark_success(self.config.healthy_threshold)
            } else {
                health.mark_failure(self.config.unhealthy_threshold)
            };
            if let Some(state) = transition {
                tracing::info!(candidate = %health.candidate, state = ?state, "Candidate health changed");
            }

            let state = health.state();
            if let Some(healthy) = state.settled() {
                metrics::record_backend_health(health.candidate.as_str(), healthy);
            }

            reports.push(ProbeReport {
                index,
                base_url: health.candidate.as_str().to_string(),
                alive,
                state,
                error,
                elapsed_ms,
            });
        }

        reports
    }
}
