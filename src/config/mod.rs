//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → environment.rs (host → ordered candidate URLs)
//!     → CandidateList handed to the resolver
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod environment;
pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::BackendsConfig;
pub use schema::ClientConfig;
pub use schema::HealthCheckConfig;
pub use schema::TimeoutConfig;
