//! Shared utilities for the relay workspace.
//!
//! - `logger`: tracing subscriber setup
//! - `time`: clock abstraction and ISO-8601 formatting

pub mod logger;
pub mod time;
