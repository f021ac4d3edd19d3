//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::resolver::Strategy;

/// Root configuration for the PolicyPilot client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Candidate backend base URLs and environment selection.
    pub backends: BackendsConfig,

    /// Resolution behaviour.
    pub resolver: ResolverConfig,

    /// Per-operation attempt timeouts.
    pub timeouts: TimeoutConfig,

    /// Deployment probe settings.
    pub health_check: HealthCheckConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Backend candidate lists.
///
/// Order within each list is priority order.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendsConfig {
    /// Candidates used when the page host is a static-hosting deployment.
    pub remote: Vec<String>,

    /// Candidates used for local development.
    pub local: Vec<String>,

    /// Host name fragment that selects the remote list.
    pub static_host_marker: String,

    /// Host the client pretends to be served from. Empty means local.
    pub host: String,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            remote: vec![
                "https://policy-pilot.onrender.com/api/v1".to_string(),
                "https://policy-pilot-viktorsdb.herokuapp.com/api/v1".to_string(),
            ],
            local: vec!["http://localhost:8001/api/v1".to_string()],
            static_host_marker: "github.io".to_string(),
            host: String::new(),
        }
    }
}

/// Resolver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Sequential (default) or race.
    pub strategy: Strategy,

    /// User-Agent header sent with every attempt.
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Sequential,
            user_agent: concat!("policy-pilot-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Attempt timeouts in seconds, grouped by operation criticality.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Liveness checks and cheap counters.
    pub health_secs: u64,

    /// AI chat completion.
    pub chat_secs: u64,

    /// Policy list and detail queries.
    pub query_secs: u64,

    /// Policy matching.
    pub match_secs: u64,

    /// Crawler refresh.
    pub refresh_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            health_secs: 8,
            chat_secs: 25,
            query_secs: 10,
            match_secs: 15,
            refresh_secs: 25,
        }
    }
}

/// Deployment probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Probe interval in seconds.
    pub interval_secs: u64,

    /// Number of consecutive failures before marking unhealthy.
    pub unhealthy_threshold: u32,

    /// Number of consecutive successes before marking healthy.
    pub healthy_threshold: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            unhealthy_threshold: 2,
            healthy_threshold: 1,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable Prometheus exporter.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
