//! Per-candidate health state machine.
//!
//! # State Transitions
//! ```text
//! Unknown/Unhealthy → Healthy: consecutive successes >= healthy_threshold
//! Unknown/Healthy → Unhealthy: consecutive failures >= unhealthy_threshold
//! ```
//!
//! Hysteresis keeps a flaky deployment from flapping in the probe output.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use serde::Serialize;

use crate::resolver::Candidate;

/// Health State enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

impl HealthState {
    /// `Some(true)` or `Some(false)` once the probe has settled, `None` while unknown.
    pub fn settled(self) -> Option<bool> {
        match self {
            HealthState::Healthy => Some(true),
            HealthState::Unhealthy => Some(false),
            HealthState::Unknown => None,
        }
    }
}

/// Probe bookkeeping for one candidate.
#[derive(Debug)]
pub struct CandidateHealth {
    pub candidate: Candidate,
    state: AtomicU8,
    consecutive_failures: AtomicU32,
    consecutive_successes: AtomicU32,
}

impl CandidateHealth {
    pub fn new(candidate: Candidate) -> Self {
        Self {
            candidate,
            state: AtomicU8::new(HealthState::Unknown as u8),
            consecutive_failures: AtomicU32::new(0),
            consecutive_successes: AtomicU32::new(0),
        }
    }

    pub fn state(&self) -> HealthState {
        self.state.load(Ordering::Relaxed).into()
    }

    /// Record a successful probe. Returns the new state on a transition.
    pub fn mark_success(&self, healthy_threshold: u32) -> Option<HealthState> {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        if self.state() == HealthState::Healthy {
            return None;
        }

        let successes = self.consecutive_successes.fetch_add(1, Ordering::Relaxed) + 1;
        if successes >= healthy_threshold {
            self.consecutive_successes.store(0, Ordering::Relaxed);
            self.state.store(HealthState::Healthy as u8, Ordering::Relaxed);
            return Some(HealthState::Healthy);
        }
        None
    }

    /// Record a failed probe. Returns the new state on a transition.
    pub fn mark_failure(&self, unhealthy_threshold: u32) -> Option<HealthState> {
        self.consecutive_successes.store(0, Ordering::Relaxed);
        if self.state() == HealthState::Unhealthy {
            return None;
        }

        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= unhealthy_threshold {
            self.consecutive_failures.store(0, Ordering::Relaxed);
            self.state.store(HealthState::Unhealthy as u8, Ordering::Relaxed);
            return Some(HealthState::Unhealthy);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn health() -> CandidateHealth {
        CandidateHealth::new(Candidate::parse("https://a.example/api").unwrap())
    }

    #[test]
    fn test_starts_unknown() {
        assert_eq!(health().state(), HealthState::Unknown);
    }

    #[test]
    fn test_hysteresis() {
        let h = health();
        assert_eq!(h.mark_failure(2), None);
        assert_eq!(h.mark_failure(2), Some(HealthState::Unhealthy));
        assert_eq!(h.mark_failure(2), None);

        assert_eq!(h.mark_success(2), None);
        // A failure in between resets the success streak.
        assert_eq!(h.mark_failure(2), None);
        assert_eq!(h.mark_success(2), None);
        assert_eq!(h.mark_success(2), Some(HealthState::Healthy));
        assert_eq!(h.state(), HealthState::Healthy);
    }

    #[test]
    fn test_unknown_is_not_settled() {
        let h = health();
        assert_eq!(h.mark_failure(2), None);
        assert_eq!(h.state().settled(), None);
        assert_eq!(h.mark_failure(2), Some(HealthState::Unhealthy));
        assert_eq!(h.state().settled(), Some(false));
        assert_eq!(HealthState::Healthy.settled(), Some(true));
    }

    #[test]
    fn test_single_success_threshold() {
        let h = health();
        assert_eq!(h.mark_success(1), Some(HealthState::Healthy));
        assert_eq!(h.mark_success(1), None);
    }
}
