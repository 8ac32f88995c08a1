//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Field names are camelCase.

pub mod auth;
pub mod candidate;
pub mod credentials;
pub mod id;
pub mod results;
pub mod user;
pub mod vote;
