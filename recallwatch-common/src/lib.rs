//! # recallwatch common library
//!
//! Shared code for the recallwatch services:
//! - Canonical recall data model
//! - Database initialization and recall persistence (upsert / search / stats)
//! - TTL-bounded query cache
//! - Configuration resolution
//! - Error types

pub mod cache;
pub mod config;
pub mod db;
pub mod error;

pub use cache::QueryCache;
pub use error::{Error, Result};
