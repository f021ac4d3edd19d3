//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! resolver / health probe produce:
//!     → logging.rs (structured log events, request_id per logical call)
//!     → metrics.rs (attempt counters, latency histograms, health gauges)
//!
//! Consumers:
//!     → stderr (pretty or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
