//! Named-histogram container files (JSON).
//!
//! A container holds any number of accumulators keyed by name. Weight tables
//! store their numerator, denominator and ratio here; the cut-flow tool
//! stores its per-tier histograms.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uw_core::{Error, Result};

use crate::accumulator::Accumulator;
use crate::axis::Axis;
use crate::grid::Grid;

/// Format tag written into every container.
pub const FORMAT_VERSION: &str = "uw-hist-v1";

/// Stored form of one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisRecord {
    /// Bin edges (length = n_bins + 1).
    pub edges: Vec<f64>,
    /// Axis title.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
}

/// Stored form of one accumulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramRecord {
    /// Histogram title.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Axes, first axis slowest in the cell order.
    pub axes: Vec<AxisRecord>,
    /// Per-cell sum of weights.
    pub sumw: Vec<f64>,
    /// Per-cell sum of squared weights.
    pub sumw2: Vec<f64>,
    /// Weight below the grid.
    #[serde(default)]
    pub underflow: f64,
    /// Weight at or above the grid.
    #[serde(default)]
    pub overflow: f64,
    /// In-range fill count.
    #[serde(default)]
    pub entries: u64,
}

impl From<&Accumulator> for HistogramRecord {
    fn from(acc: &Accumulator) -> Self {
        HistogramRecord {
            title: acc.title().to_string(),
            axes: acc
                .grid()
                .axes()
                .iter()
                .map(|a| AxisRecord { edges: a.edges().to_vec(), title: a.title().to_string() })
                .collect(),
            sumw: acc.values().to_vec(),
            sumw2: acc.sumw2().to_vec(),
            underflow: acc.underflow(),
            overflow: acc.overflow(),
            entries: acc.entries(),
        }
    }
}

impl HistogramRecord {
    /// Rebuild the accumulator, validating edges and cell counts.
    pub fn to_accumulator(&self, name: &str) -> Result<Accumulator> {
        let axes = self
            .axes
            .iter()
            .map(|a| Axis::from_edges(a.edges.clone()).map(|ax| ax.with_title(a.title.clone())))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| Error::Validation(format!("histogram '{name}': {e}")))?;
        Accumulator::from_parts(
            name,
            self.title.clone(),
            Grid::new(axes)?,
            self.sumw.clone(),
            self.sumw2.clone(),
            self.underflow,
            self.overflow,
            self.entries,
        )
    }
}

/// A set of named histograms with a format tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramFile {
    format: String,
    histograms: BTreeMap<String, HistogramRecord>,
}

impl Default for HistogramFile {
    fn default() -> Self {
        Self::new()
    }
}

impl HistogramFile {
    /// Empty container.
    pub fn new() -> Self {
        Self { format: FORMAT_VERSION.to_string(), histograms: BTreeMap::new() }
    }

    /// Store `acc` under `key`, replacing any previous entry.
    pub fn insert(&mut self, key: impl Into<String>, acc: &Accumulator) {
        self.histograms.insert(key.into(), HistogramRecord::from(acc));
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.histograms.contains_key(key)
    }

    /// Stored names in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.histograms.keys().map(String::as_str)
    }

    /// Number of stored histograms.
    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    /// Whether the container is empty.
    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    /// Raw record for `key`.
    pub fn record(&self, key: &str) -> Option<&HistogramRecord> {
        self.histograms.get(key)
    }

    /// Load `key` as an accumulator. `origin` names the container in errors.
    pub fn get(&self, key: &str, origin: &str) -> Result<Accumulator> {
        self.histograms
            .get(key)
            .ok_or_else(|| Error::missing_artifact(key, origin))?
            .to_accumulator(key)
    }

    /// Parse from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let file: HistogramFile = serde_json::from_slice(bytes)?;
        if file.format != FORMAT_VERSION {
            return Err(Error::Validation(format!(
                "unsupported container format '{}' (expected '{FORMAT_VERSION}')",
                file.format
            )));
        }
        Ok(file)
    }

    /// Read a container file.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let file = Self::from_slice(&bytes)?;
        tracing::debug!(path = %path.display(), histograms = file.len(), "container loaded");
        Ok(file)
    }

    /// Write the container as pretty JSON, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::debug!(path = %path.display(), histograms = self.len(), "container written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Accumulator {
        let grid = Grid::new(vec![
            Axis::from_edges(vec![0.0, 1.0, 2.5]).unwrap().with_title("p_T"),
            Axis::uniform(3, -1.5, 1.5).unwrap(),
        ])
        .unwrap();
        let mut h = Accumulator::new("h", grid).with_title("sample");
        h.fill_weighted(&[0.1, 0.1], 0.3).unwrap();
        h.fill_weighted(&[2.0, -1.2], 1.7).unwrap();
        h.fill(&[5.0, 0.0]).unwrap();
        h
    }

    #[test]
    fn record_round_trip() {
        let h = sample();
        let mut file = HistogramFile::new();
        file.insert("h", &h);
        let json = serde_json::to_vec(&file).unwrap();
        let back = HistogramFile::from_slice(&json).unwrap();
        let h2 = back.get("h", "memory").unwrap();
        assert_eq!(h2, h);
        assert_eq!(h2.grid().axis(0).unwrap().title(), "p_T");
    }

    #[test]
    fn missing_key_is_missing_artifact() {
        let file = HistogramFile::new();
        let err = file.get("h_ratio", "w.json").unwrap_err();
        assert!(matches!(err, Error::MissingArtifact { ref name, .. } if name == "h_ratio"));
    }

    #[test]
    fn rejects_foreign_format() {
        let json = br#"{"format": "other", "histograms": {}}"#;
        assert!(HistogramFile::from_slice(json).is_err());
    }

    #[test]
    fn rejects_inconsistent_record() {
        let mut file = HistogramFile::new();
        file.insert("h", &sample());
        let mut v = serde_json::to_value(&file).unwrap();
        v["histograms"]["h"]["sumw"] = serde_json::json!([1.0]);
        let back = HistogramFile::from_slice(&serde_json::to_vec(&v).unwrap()).unwrap();
        assert!(back.get("h", "memory").is_err());
    }
}
