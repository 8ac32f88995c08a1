//! Types and helpers shared between the DB and API representations.

pub mod credential;
