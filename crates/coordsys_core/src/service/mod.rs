//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository reads into lookup-level APIs.
//! - Own per-instance caching so callers never share hidden state.

mod cache;
pub mod coord_system_service;

pub use cache::LruCache;
