//! PolicyPilot client library.
//!
//! Resolves every backend call against an ordered list of candidate
//! deployments, falling back to local content when none answers.

pub mod api;
pub mod config;
pub mod fallback;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resolver;

pub use api::PolicyPilotClient;
pub use config::ClientConfig;
pub use lifecycle::Shutdown;
pub use resolver::Resolver;
