//! Orchestrator - one draw from roster to notifications
//!
//! See `engine.rs` for full implementation.

pub mod engine;

// Re-export main types for convenience
pub use engine::{Orchestrator, RunConfig, RunError};
