//! Participant registry
//!
//! Holds every participant of a run, keyed by identity. Built once from the
//! input records and read-only afterwards.
//!
//! # Record Format
//!
//! One participant per line, three TAB-separated fields:
//!
//! ```text
//! identity<TAB>address<TAB>exclusion,exclusion,...
//! ```
//!
//! Every field is trimmed. An empty exclusion field means no exclusions.
//! Quotes carry no special meaning. Blank lines are skipped.
//!
//! # Determinism
//!
//! Participants are stored in a BTreeMap, so iteration follows the
//! lexicographic order of identities regardless of input order.

use crate::models::participant::Participant;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Read;
use thiserror::Error;

/// Field separator of the input records
pub const FIELD_DELIMITER: u8 = b'\t';

/// Separator between exclusion identities inside the third field
pub const EXCLUSION_SEPARATOR: char = ',';

/// Number of fields every record must have
pub const FIELDS_PER_RECORD: usize = 3;

/// Errors that can occur while building a registry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("malformed record on line {line}: expected 3 fields, found {fields}")]
    MalformedRecord { line: u64, fields: usize },

    #[error("record on line {line} has an empty identity")]
    EmptyIdentity { line: u64 },

    #[error("duplicate identity {identity:?} on line {line}")]
    DuplicateIdentity { identity: String, line: u64 },

    #[error("failed to read participant records: {0}")]
    Unreadable(String),
}

/// All participants of one run, keyed by identity
///
/// Not deserializable: every registry goes through [`Registry::from_reader`]
/// or [`Registry::from_participants`].
///
/// # Example
/// ```
/// use secret_santa_core::Registry;
///
/// let data = "Alice\talice@example.com\tBob\nBob\tbob@example.com\t\n";
/// let registry = Registry::from_reader(data.as_bytes()).unwrap();
/// assert_eq!(registry.len(), 2);
/// assert!(registry.get("Alice").unwrap().excludes("Bob"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Registry {
    participants: BTreeMap<String, Participant>,
}

impl Registry {
    /// Create empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from already-constructed participants
    ///
    /// Duplicate identities are rejected; `line` in the error is the
    /// 1-based position of the offending participant.
    pub fn from_participants<I>(participants: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Participant>,
    {
        let mut registry = Self::new();
        for (idx, participant) in participants.into_iter().enumerate() {
            registry.insert(participant, idx as u64 + 1)?;
        }
        Ok(registry)
    }

    /// Parse TAB-separated participant records
    ///
    /// Fails on the first bad record; no partial registry is returned.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RegistryError> {
        let mut records = csv::ReaderBuilder::new()
            .delimiter(FIELD_DELIMITER)
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut registry = Self::new();
        for result in records.records() {
            let record = result.map_err(|e| RegistryError::Unreadable(e.to_string()))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            // a blank line is one empty field; TABs make it a record
            if record.len() == 1 && record[0].trim().is_empty() {
                continue;
            }
            if record.len() != FIELDS_PER_RECORD {
                return Err(RegistryError::MalformedRecord {
                    line,
                    fields: record.len(),
                });
            }

            let id = record[0].trim();
            if id.is_empty() {
                return Err(RegistryError::EmptyIdentity { line });
            }
            let exclusions = record[2]
                .split(EXCLUSION_SEPARATOR)
                .map(str::trim)
                .filter(|name| !name.is_empty());

            registry.insert(Participant::new(id, record[1].trim(), exclusions), line)?;
        }

        Ok(registry)
    }

    fn insert(&mut self, participant: Participant, line: u64) -> Result<(), RegistryError> {
        if self.participants.contains_key(participant.id()) {
            return Err(RegistryError::DuplicateIdentity {
                identity: participant.id().to_string(),
                line,
            });
        }
        self.participants
            .insert(participant.id().to_string(), participant);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.participants.contains_key(id)
    }

    /// Identities in sorted order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.participants.keys().map(String::as_str)
    }

    /// Participants in identity order
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    /// Exclusions that name nobody in the registry, as (participant, name)
    ///
    /// These never affect the assignment, but usually indicate a typo in
    /// the input.
    pub fn unknown_exclusions(&self) -> Vec<(&str, &str)> {
        self.participants()
            .flat_map(|p| {
                p.exclusions()
                    .iter()
                    .filter(|name| !self.contains(name))
                    .map(move |name| (p.id(), name.as_str()))
            })
            .collect()
    }

    /// Human-readable listing of the parsed registry
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for p in self.participants() {
            let exclusions: Vec<&str> = p.exclusions().iter().map(String::as_str).collect();
            let _ = writeln!(
                out,
                "{} <{}> excludes: [{}]",
                p.id(),
                p.address(),
                exclusions.join(", ")
            );
        }
        out
    }
}
