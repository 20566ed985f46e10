//! Orchestrator Engine
//!
//! Runs one secret-santa draw end to end:
//!
//! ```text
//! 1. Validate configuration
//! 2. Generate an assignment (bounded rejection sampling)
//! 3. Write the secret log
//! 4. Notify every santa, continuing past failed sends
//! ```
//!
//! Steps run strictly in sequence. The secret log is written before the
//! assignment is handed to anything else, so a produced assignment always
//! has a durable record even if every notification later fails.
//!
//! # Example
//!
//! ```rust
//! use secret_santa_core::orchestrator::{Orchestrator, RunConfig};
//! use secret_santa_core::Registry;
//!
//! let data = "A\ta@example.com\t\nB\tb@example.com\t\nC\tc@example.com\tA\n";
//! let registry = Registry::from_reader(data.as_bytes()).unwrap();
//!
//! let dir = std::env::temp_dir().join(format!("santa-doc-{}", std::process::id()));
//! std::fs::create_dir_all(&dir).unwrap();
//! let log_path = dir.join("secret.json");
//!
//! let config = RunConfig { seed: 12345, overwrite_secret_log: true, ..RunConfig::default() };
//! let mut orchestrator = Orchestrator::new(config, registry).unwrap();
//! let assignment = orchestrator.assign(&log_path).unwrap();
//! assert_eq!(assignment.len(), 3);
//! assert!(log_path.exists());
//! # std::fs::remove_dir_all(&dir).unwrap();
//! ```

use crate::dispatch::{DeliveryReport, Dispatcher, Mailer, Template, TemplateError};
use crate::generator::{AssignmentError, AssignmentGenerator};
use crate::models::{Assignment, Registry, RegistryError};
use crate::rng::RngManager;
use crate::secret_log::{SecretLog, SecretLogError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// Configuration Types
// ============================================================================

/// Configuration of one draw
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// RNG seed; recorded in the secret log for replay
    pub seed: u64,

    /// Attempt ceiling; derived from the roster when absent
    #[serde(default)]
    pub max_attempts: Option<usize>,

    /// Replace an existing secret log instead of refusing
    #[serde(default)]
    pub overwrite_secret_log: bool,
}

/// Errors that abort a run
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Assignment(#[from] AssignmentError),

    #[error(transparent)]
    SecretLog(#[from] SecretLogError),
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Owns the roster and RNG for one run
#[derive(Debug)]
pub struct Orchestrator {
    config: RunConfig,
    registry: Registry,
    rng: RngManager,
}

impl Orchestrator {
    /// Create new orchestrator from configuration
    ///
    /// Warns about exclusions that name nobody in the roster.
    pub fn new(config: RunConfig, registry: Registry) -> Result<Self, RunError> {
        Self::validate_config(&config)?;

        for (participant, name) in registry.unknown_exclusions() {
            warn!(participant, exclusion = name, "exclusion names an unknown participant");
        }

        let rng = RngManager::new(config.seed);
        Ok(Self {
            config,
            registry,
            rng,
        })
    }

    fn validate_config(config: &RunConfig) -> Result<(), RunError> {
        if config.max_attempts == Some(0) {
            return Err(RunError::InvalidConfig(
                "max_attempts must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // ========================================================================
    // Run Steps
    // ========================================================================

    /// Draw an assignment and record it in the secret log at `secret_log`
    ///
    /// Nothing is written when no valid assignment exists.
    pub fn assign(&mut self, secret_log: &Path) -> Result<Assignment, RunError> {
        let generated = AssignmentGenerator::new(&mut self.rng)
            .with_max_attempts(self.config.max_attempts)
            .generate(&self.registry)?;

        let log = SecretLog::new(&self.registry, &generated, self.config.seed)?;
        log.write(secret_log, self.config.overwrite_secret_log)?;

        info!(
            participants = self.registry.len(),
            attempts = generated.attempts,
            run_id = %log.run_id,
            path = %secret_log.display(),
            "secret log written"
        );

        Ok(generated.assignment)
    }

    /// Send every santa their notification
    pub fn notify<M: Mailer>(
        &self,
        assignment: &Assignment,
        template: &Template,
        dispatcher: &mut Dispatcher<M>,
    ) -> DeliveryReport {
        let report = dispatcher.dispatch(&self.registry, assignment, template);
        info!(
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "notifications finished"
        );
        report
    }
}
