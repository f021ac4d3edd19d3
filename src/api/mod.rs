//! PolicyPilot backend API.
//!
//! # Data Flow
//! ```text
//! PolicyPilotClient method (chat, match_policies, policies, ...)
//!     → operation.rs (method, path, timeout, validator)
//!     → resolver (ordered fallback across candidates)
//!     → types.rs (typed `data` payload)
//!     → on exhaustion: fallback (canned reply / built-in catalogue)
//! ```

pub mod client;
pub mod operation;
pub mod types;

pub use client::{
    AnswerSource, ChatAnswer, ClientError, PolicyListing, PolicyPilotClient, PolicySource,
};
pub use operation::Operation;
