//! Secret Log - Persist the Accepted Assignment
//!
//! The secret log is the only durable record of the full pairing. It is
//! written once, after the generator accepts an assignment and before any
//! notification is attempted.
//!
//! # Critical Invariants
//!
//! - **Write-once**: an existing log is never clobbered unless overwrite is
//!   requested explicitly
//! - **Roster binding**: the log carries a SHA-256 digest of the registry it
//!   was drawn from, so it can only be verified against that roster
//! - **Replayability**: the seed is recorded; the same seed and roster
//!   reproduce the same assignment

use crate::generator::Generated;
use crate::models::{Assignment, Registry};
use crate::validation::{self, Rejection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use uuid::Uuid;

/// Format version written into every log
pub const SECRET_LOG_FORMAT_VERSION: u32 = 1;

/// Errors that can occur while writing, reading or verifying a secret log
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecretLogError {
    #[error("secret log {} already exists; refusing to overwrite", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("secret log {} I/O failed: {reason}", .path.display())]
    Io { path: PathBuf, reason: String },

    #[error("secret log serialization failed: {0}")]
    Serialization(String),

    #[error("unsupported secret log format version {0}")]
    UnsupportedVersion(u32),

    #[error("secret log was drawn from a different roster (expected digest {expected}, found {actual})")]
    RosterMismatch { expected: String, actual: String },

    #[error("secret log holds an invalid assignment: {0}")]
    InvalidAssignment(Rejection),
}

// ============================================================================
// Log Structure
// ============================================================================

/// Durable record of one run's accepted assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretLog {
    pub format_version: u32,

    /// Unique id of the run that produced this log
    pub run_id: Uuid,

    /// RNG seed the assignment was drawn with
    pub seed: u64,

    /// Candidates drawn before acceptance
    pub attempts: usize,

    /// SHA-256 of the canonical registry JSON
    pub roster_digest: String,

    /// Santa → santee
    pub pairs: Assignment,

    /// Gift-giving order starting from the first santa
    pub ring: Vec<String>,
}

impl SecretLog {
    /// Build the log for an accepted assignment
    pub fn new(registry: &Registry, generated: &Generated, seed: u64) -> Result<Self, SecretLogError> {
        Ok(Self {
            format_version: SECRET_LOG_FORMAT_VERSION,
            run_id: Uuid::new_v4(),
            seed,
            attempts: generated.attempts,
            roster_digest: compute_roster_digest(registry)?,
            pairs: generated.assignment.clone(),
            ring: generated
                .assignment
                .ring()
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
    }

    pub fn assignment(&self) -> &Assignment {
        &self.pairs
    }

    /// Write the log as pretty-printed JSON and sync it to disk
    ///
    /// A failed write leaves nothing at `path`, so the run can be retried
    /// without `overwrite`.
    pub fn write(&self, path: &Path, overwrite: bool) -> Result<(), SecretLogError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SecretLogError::Serialization(e.to_string()))?;

        let io_error = |e: std::io::Error| {
            if e.kind() == ErrorKind::AlreadyExists {
                SecretLogError::AlreadyExists {
                    path: path.to_path_buf(),
                }
            } else {
                SecretLogError::Io {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        };

        if !overwrite && path.exists() {
            return Err(io_error(ErrorKind::AlreadyExists.into()));
        }

        // the log only appears at `path` once it is complete and synced;
        // the temporary file is removed on every error path
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
        file.write_all(json.as_bytes()).map_err(io_error)?;
        file.write_all(b"\n").map_err(io_error)?;
        file.as_file().sync_all().map_err(io_error)?;

        let persisted = if overwrite {
            file.persist(path)
        } else {
            file.persist_noclobber(path)
        };
        persisted.map_err(|e| io_error(e.error))?;

        Ok(())
    }

    /// Load a previously written log
    pub fn read(path: &Path) -> Result<Self, SecretLogError> {
        let contents = std::fs::read_to_string(path).map_err(|e| SecretLogError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let log: SecretLog = serde_json::from_str(&contents)
            .map_err(|e| SecretLogError::Serialization(e.to_string()))?;

        if log.format_version != SECRET_LOG_FORMAT_VERSION {
            return Err(SecretLogError::UnsupportedVersion(log.format_version));
        }
        Ok(log)
    }

    /// Check the log against the roster it claims to come from
    ///
    /// Verifies the roster digest, then re-runs the validator on the stored
    /// assignment.
    pub fn verify(&self, registry: &Registry) -> Result<(), SecretLogError> {
        let actual = compute_roster_digest(registry)?;
        if actual != self.roster_digest {
            return Err(SecretLogError::RosterMismatch {
                expected: self.roster_digest.clone(),
                actual,
            });
        }

        validation::check(&self.pairs, registry).map_err(SecretLogError::InvalidAssignment)
    }
}

// ============================================================================
// Roster Digest
// ============================================================================

/// Compute deterministic SHA-256 digest of a registry
///
/// Registry iteration is sorted by identity and exclusion sets are sorted,
/// so the JSON form is canonical regardless of input record order.
pub fn compute_roster_digest(registry: &Registry) -> Result<String, SecretLogError> {
    let json = serde_json::to_string(registry).map_err(|e| {
        SecretLogError::Serialization(format!("Registry serialization failed: {}", e))
    })?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    let result = hasher.finalize();

    Ok(format!("{:x}", result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Participant;

    #[test]
    fn test_digest_independent_of_input_order() {
        let forward = Registry::from_participants([
            Participant::new("A", "a@example.com", ["B", "C"]),
            Participant::new("B", "b@example.com", Vec::<String>::new()),
        ])
        .unwrap();
        let reversed = Registry::from_participants([
            Participant::new("B", "b@example.com", Vec::<String>::new()),
            Participant::new("A", "a@example.com", ["C", "B"]),
        ])
        .unwrap();

        assert_eq!(
            compute_roster_digest(&forward).unwrap(),
            compute_roster_digest(&reversed).unwrap()
        );
    }

    #[test]
    fn test_digest_changes_with_address() {
        let one = Registry::from_participants([Participant::new(
            "A",
            "a@example.com",
            Vec::<String>::new(),
        )])
        .unwrap();
        let other = Registry::from_participants([Participant::new(
            "A",
            "a@example.org",
            Vec::<String>::new(),
        )])
        .unwrap();

        assert_ne!(
            compute_roster_digest(&one).unwrap(),
            compute_roster_digest(&other).unwrap()
        );
    }
}
