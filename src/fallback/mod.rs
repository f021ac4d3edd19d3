//! Degraded-mode content.
//!
//! When the resolver reports every candidate exhausted, callers answer from
//! here instead of surfacing an error: a canned consultation reply or the
//! built-in policy catalogue.

pub mod catalogue;
pub mod chat;
