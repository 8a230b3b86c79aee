//! Event records and the source trait the reweighting loop iterates.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uw_core::{Error, Result};

/// One per-event sub-observation (e.g. a generated or reconstructed D0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Numeric fields, aligned with [`EventSource::field_names`].
    pub values: Vec<f64>,
    /// Whether the candidate is a signal candidate.
    #[serde(default = "default_signal")]
    pub signal: bool,
}

fn default_signal() -> bool {
    true
}

impl Candidate {
    /// Create a candidate.
    pub fn new(values: Vec<f64>, signal: bool) -> Self {
        Self { values, signal }
    }
}

/// One recorded event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Candidates in this event (may be empty).
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Pre-computed boolean decisions (trigger bits, filters).
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
    /// Event-level scalar quantities (vertex, calorimeter sums).
    #[serde(default)]
    pub scalars: BTreeMap<String, f64>,
}

impl EventRecord {
    /// Flag value, `false` when absent.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Scalar value, if recorded.
    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.scalars.get(name).copied()
    }
}

/// A finite, randomly accessible sequence of events.
pub trait EventSource {
    /// Number of events.
    fn len(&self) -> usize;

    /// Whether there are no events.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the candidate fields, in value order.
    fn field_names(&self) -> &[String];

    /// Position of a candidate field.
    fn field_index(&self, name: &str) -> Option<usize> {
        self.field_names().iter().position(|f| f == name)
    }

    /// Candidates of event `i`.
    fn candidates(&self, i: usize) -> &[Candidate];
}

/// Events loaded from a JSON table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTable {
    /// Candidate field names.
    pub fields: Vec<String>,
    /// Events.
    pub events: Vec<EventRecord>,
}

impl EventTable {
    /// Create a table, checking every candidate has one value per field.
    pub fn new(fields: Vec<String>, events: Vec<EventRecord>) -> Result<Self> {
        let table = Self { fields, events };
        table.validate()?;
        Ok(table)
    }

    /// Parse a JSON event table.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let table: EventTable = serde_json::from_slice(bytes)?;
        table.validate()?;
        Ok(table)
    }

    /// Read a JSON event table from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let table = Self::from_slice(&std::fs::read(path)?)?;
        tracing::info!(path = %path.display(), events = table.events.len(), "event table loaded");
        Ok(table)
    }

    fn validate(&self) -> Result<()> {
        let n = self.fields.len();
        for (i, ev) in self.events.iter().enumerate() {
            if let Some(c) = ev.candidates.iter().find(|c| c.values.len() != n) {
                return Err(Error::Validation(format!(
                    "event {i}: candidate has {} values, expected {n} ({:?})",
                    c.values.len(),
                    self.fields
                )));
            }
        }
        Ok(())
    }
}

impl EventSource for EventTable {
    fn len(&self) -> usize {
        self.events.len()
    }

    fn field_names(&self) -> &[String] {
        &self.fields
    }

    fn candidates(&self, i: usize) -> &[Candidate] {
        match self.events.get(i) {
            Some(e) => &e.candidates,
            None => &[],
        }
    }
}
