//! Deployment health monitoring.
//!
//! # Data Flow
//! ```text
//! Periodic timer (probe.rs)
//!     → GET {candidate}/health for every candidate, in order
//!     → Update state.rs
//!     → Gauge + transition log
//! ```
//!
//! # Design Decisions
//! - Independent of request resolution; the resolver never consults it
//! - State transitions require consecutive successes/failures
//! - Health state is per-candidate

pub mod probe;
pub mod state;

pub use probe::{Probe, ProbeReport};
pub use state::{CandidateHealth, HealthState};
