use serde::{Deserialize, Serialize};
use uw_hist::{Accumulator, Axis};

/// One axis of a histogram artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisArtifact {
    /// Axis title.
    pub title: String,
    /// Bin edges.
    pub edges: Vec<f64>,
    /// Bin centers.
    pub centers: Vec<f64>,
}

impl From<&Axis> for AxisArtifact {
    fn from(a: &Axis) -> Self {
        Self {
            title: a.title().to_string(),
            edges: a.edges().to_vec(),
            centers: (0..a.n_bins()).map(|i| a.center(i)).collect(),
        }
    }
}

/// Flattened histogram (first axis slowest).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramArtifact {
    /// Histogram name.
    pub name: String,
    /// Histogram title.
    pub title: String,
    /// Axes.
    pub axes: Vec<AxisArtifact>,
    /// Per-cell values.
    pub y: Vec<f64>,
    /// Per-cell statistical errors.
    pub yerr: Vec<f64>,
    /// In-range fills.
    pub entries: u64,
    /// Weight below the grid.
    pub underflow: f64,
    /// Weight at or above the grid.
    pub overflow: f64,
}

impl From<&Accumulator> for HistogramArtifact {
    fn from(h: &Accumulator) -> Self {
        Self {
            name: h.name().to_string(),
            title: h.title().to_string(),
            axes: h.grid().axes().iter().map(AxisArtifact::from).collect(),
            y: h.values().to_vec(),
            yerr: (0..h.values().len()).map(|c| h.error(c)).collect(),
            entries: h.entries(),
            underflow: h.underflow(),
            overflow: h.overflow(),
        }
    }
}
