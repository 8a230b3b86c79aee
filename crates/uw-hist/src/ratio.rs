//! Per-cell weight tables derived from two accumulators.

use std::path::Path;

use serde::{Deserialize, Serialize};
use uw_core::{Error, Result, WeightLookup};

use crate::accumulator::Accumulator;
use crate::container::HistogramFile;
use crate::grid::Grid;

/// Normalization applied to numerator and denominator before dividing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Divide the accumulators as filled.
    #[default]
    AsIs,
    /// Scale both to unit integral first (shape-only weights).
    UnitIntegral,
}

/// Names of the three table components inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableKeys {
    /// Numerator histogram name.
    pub numerator: String,
    /// Denominator histogram name.
    pub denominator: String,
    /// Ratio histogram name.
    pub ratio: String,
    /// Required rank of every component, if any.
    pub rank: Option<usize>,
}

impl Default for TableKeys {
    fn default() -> Self {
        Self {
            numerator: "h_num".to_string(),
            denominator: "h_den".to_string(),
            ratio: "h_ratio".to_string(),
            rank: None,
        }
    }
}

impl TableKeys {
    /// Require every component to have `rank` axes.
    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = Some(rank);
        self
    }
}

/// Numerator, denominator and their cell-wise ratio on a shared grid.
///
/// Cells with an empty denominator carry a ratio of exactly `0`.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioTable {
    numerator: Accumulator,
    denominator: Accumulator,
    ratio: Accumulator,
    zero_denominator_cells: usize,
}

impl RatioTable {
    /// Divide `numerator` by `denominator` cell by cell.
    pub fn build(numerator: Accumulator, denominator: Accumulator) -> Result<Self> {
        Self::build_with(numerator, denominator, Normalization::AsIs)
    }

    /// Divide after applying `normalization` to both inputs.
    pub fn build_with(
        mut numerator: Accumulator,
        mut denominator: Accumulator,
        normalization: Normalization,
    ) -> Result<Self> {
        numerator.grid().check_compatible(denominator.grid())?;
        if normalization == Normalization::UnitIntegral {
            numerator.normalize()?;
            denominator.normalize()?;
        }

        let n_cells = numerator.grid().n_cells();
        let mut sumw = vec![0.0; n_cells];
        let mut sumw2 = vec![0.0; n_cells];
        let mut zero_denominator_cells = 0usize;

        for cell in 0..n_cells {
            let n = numerator.value(cell);
            let d = denominator.value(cell);
            if d <= 0.0 {
                zero_denominator_cells += 1;
                continue;
            }
            let r = n / d;
            // Uncorrelated operands: var(n/d) = (var_n d^2 + var_d n^2) / d^4.
            let var = (numerator.sumw2()[cell] * d * d + denominator.sumw2()[cell] * n * n)
                / (d * d * d * d);
            if r.is_finite() && r >= 0.0 {
                sumw[cell] = r;
                sumw2[cell] = if var.is_finite() { var } else { 0.0 };
            }
        }

        if zero_denominator_cells > 0 {
            tracing::debug!(
                numerator = numerator.name(),
                denominator = denominator.name(),
                zero_denominator_cells,
                "ratio set to 0 in cells with empty denominator"
            );
        }

        let ratio = Accumulator::from_parts(
            "ratio",
            numerator.title().to_string(),
            numerator.grid().clone(),
            sumw,
            sumw2,
            0.0,
            0.0,
            numerator.entries(),
        )?;

        Ok(Self { numerator, denominator, ratio, zero_denominator_cells })
    }

    /// Reassemble a table from stored components without recomputing the ratio.
    ///
    /// Without an expected `rank`, every component must match the ratio's.
    pub fn from_parts(
        numerator: Accumulator,
        denominator: Accumulator,
        ratio: Accumulator,
        rank: Option<usize>,
    ) -> Result<Self> {
        let rank = rank.unwrap_or(ratio.rank());
        for part in [&ratio, &numerator, &denominator] {
            if part.rank() != rank {
                return Err(Error::Validation(format!(
                    "'{}' has {} axes, expected {rank}",
                    part.name(),
                    part.rank()
                )));
            }
        }
        numerator.grid().check_compatible(denominator.grid())?;
        numerator.grid().check_compatible(ratio.grid())?;

        let zero_denominator_cells = denominator.values().iter().filter(|v| **v <= 0.0).count();
        Ok(Self { numerator, denominator, ratio, zero_denominator_cells })
    }

    /// Write the three components into a container at `path`.
    pub fn persist(&self, path: &Path, keys: &TableKeys) -> Result<()> {
        let mut file = HistogramFile::new();
        file.insert(keys.ratio.as_str(), &self.ratio);
        file.insert(keys.numerator.as_str(), &self.numerator);
        file.insert(keys.denominator.as_str(), &self.denominator);
        file.write(path)?;
        tracing::info!(
            path = %path.display(),
            cells = self.grid().n_cells(),
            "weight table written"
        );
        Ok(())
    }

    /// Load the three components from the container at `path`.
    pub fn load(path: &Path, keys: &TableKeys) -> Result<Self> {
        let file = HistogramFile::read(path)?;
        Self::from_file(&file, keys, &path.display().to_string())
    }

    /// Load the three components from an already-read container.
    pub fn from_file(file: &HistogramFile, keys: &TableKeys, origin: &str) -> Result<Self> {
        let ratio = file.get(&keys.ratio, origin)?;
        let numerator = file.get(&keys.numerator, origin)?;
        let denominator = file.get(&keys.denominator, origin)?;
        let table = Self::from_parts(numerator, denominator, ratio, keys.rank)?;
        tracing::info!(
            origin,
            rank = table.grid().rank(),
            cells = table.grid().n_cells(),
            "weight table loaded"
        );
        Ok(table)
    }

    /// Shared grid.
    pub fn grid(&self) -> &Grid {
        self.ratio.grid()
    }

    /// Numerator component.
    pub fn numerator(&self) -> &Accumulator {
        &self.numerator
    }

    /// Denominator component.
    pub fn denominator(&self) -> &Accumulator {
        &self.denominator
    }

    /// Ratio component.
    pub fn ratio(&self) -> &Accumulator {
        &self.ratio
    }

    /// Cells whose denominator is empty.
    pub fn zero_denominator_cells(&self) -> usize {
        self.zero_denominator_cells
    }
}

impl WeightLookup for RatioTable {
    fn rank(&self) -> usize {
        self.grid().rank()
    }

    fn weight(&self, coords: &[f64]) -> f64 {
        match self.grid().locate(coords) {
            Some(cell) => {
                let w = self.ratio.value(cell);
                if w.is_finite() && w > 0.0 { w } else { 0.0 }
            }
            None => 0.0,
        }
    }
}
