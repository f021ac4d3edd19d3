//! Lifecycle management for long-running commands.
//!
//! # Data Flow
//! ```text
//! Ctrl-C / SIGTERM (signals.rs)
//!     → Shutdown::trigger (shutdown.rs)
//!     → every subscribed task (deployment probe) exits its loop
//! ```
//!
//! One-shot commands never subscribe; only `probe` runs until signalled.

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_on_signal;
