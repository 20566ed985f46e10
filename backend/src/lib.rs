//! Secret Santa Core - Rust Engine
//!
//! Assigns every participant a secret-santa santee under exclusion
//! constraints, records the draw, and hands out one notification per santa.
//!
//! # Architecture
//!
//! - **models**: Domain types (Participant, Registry, Assignment)
//! - **rng**: Deterministic random number generation
//! - **validation**: Cycle validator (accept/reject a candidate)
//! - **generator**: Bounded rejection-sampling search
//! - **secret_log**: Write-once record of the accepted assignment
//! - **dispatch**: Message templates and per-recipient delivery
//! - **orchestrator**: Runs the steps in order
//!
//! # Critical Invariants
//!
//! 1. Accepted assignments are single-cycle derangements honouring exclusions
//! 2. All randomness is deterministic (seeded RNG)
//! 3. The secret log is written before any notification is attempted

// Module declarations
pub mod dispatch;
pub mod generator;
pub mod models;
pub mod orchestrator;
pub mod rng;
pub mod secret_log;
pub mod validation;

// Re-exports for convenience
pub use dispatch::{
    DeliveryError, DeliveryFailure, DeliveryReport, Dispatcher, Mailer, Notification, Template,
    TemplateError,
};
pub use generator::{AssignmentError, AssignmentGenerator, Generated};
pub use models::{Assignment, Participant, Registry, RegistryError};
pub use orchestrator::{Orchestrator, RunConfig, RunError};
pub use rng::{RngManager, Shuffler};
pub use secret_log::{SecretLog, SecretLogError};
pub use validation::Rejection;
