//! Closure curve: weighted over target, cell by cell.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use uw_core::{Error, Result};
use uw_hist::{Accumulator, Grid};

/// A 1-D projection of the closure distributions, optionally restricted to a
/// window on another axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureView {
    /// Suffix used in histogram and artifact names.
    pub name: String,
    /// Axis kept by the projection.
    pub axis: usize,
    /// `(axis, lo, hi)`: keep only bins of `axis` inside `[lo, hi]`.
    #[serde(default)]
    pub window: Option<(usize, f64, f64)>,
}

impl ClosureView {
    /// Plain projection onto `axis`.
    pub fn onto(name: impl Into<String>, axis: usize) -> Self {
        Self { name: name.into(), axis, window: None }
    }

    /// Restrict to bins of `axis` inside `[lo, hi]`.
    pub fn within(mut self, axis: usize, lo: f64, hi: f64) -> Self {
        self.window = Some((axis, lo, hi));
        self
    }

    /// Bin-index restriction for `grid`.
    pub fn restriction(&self, grid: &Grid) -> Result<Vec<(usize, Range<usize>)>> {
        let Some((axis, lo, hi)) = self.window else {
            return Ok(Vec::new());
        };
        if axis == self.axis {
            return Err(Error::Validation(format!(
                "view '{}': window axis must differ from the projected axis",
                self.name
            )));
        }
        let ax = grid.axis(axis).ok_or_else(|| {
            Error::Validation(format!(
                "view '{}': window axis {axis} out of range for rank {}",
                self.name,
                grid.rank()
            ))
        })?;
        let span = ax.bin_span(lo, hi).ok_or_else(|| {
            Error::Validation(format!(
                "view '{}': window [{lo}, {hi}] selects no bins of axis {axis}",
                self.name
            ))
        })?;
        Ok(vec![(axis, span)])
    }
}

/// Per-cell `weighted / target` with propagated statistical error.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosureCurve {
    grid: Grid,
    ratio: Vec<f64>,
    error: Vec<f64>,
    // Combined relative error, i.e. the ratio error at r = 1.
    null_error: Vec<f64>,
    defined: Vec<bool>,
}

fn rel_err(acc: &Accumulator, cell: usize) -> f64 {
    let v = acc.value(cell);
    if v > 0.0 { acc.sumw2()[cell].sqrt() / v } else { 0.0 }
}

impl ClosureCurve {
    /// Compare `weighted` against `target`.
    ///
    /// Cells with an empty target have ratio 0 and are marked undefined.
    /// Cells with a populated target but no weighted content stay defined
    /// with ratio 0.
    pub fn compare(weighted: &Accumulator, target: &Accumulator) -> Result<Self> {
        weighted.grid().check_compatible(target.grid())?;

        let n = weighted.grid().n_cells();
        let mut ratio = vec![0.0; n];
        let mut error = vec![0.0; n];
        let mut null_error = vec![0.0; n];
        let mut defined = vec![false; n];
        let mut empty_weighted = 0usize;
        for cell in 0..n {
            let w = weighted.value(cell);
            let t = target.value(cell);
            if t > 0.0 && w.is_finite() {
                let r = w / t;
                let rel = rel_err(weighted, cell).hypot(rel_err(target, cell));
                ratio[cell] = r;
                error[cell] = r * rel;
                null_error[cell] = rel;
                defined[cell] = true;
                if w == 0.0 {
                    empty_weighted += 1;
                }
            }
        }
        if empty_weighted > 0 {
            tracing::warn!(
                cells = empty_weighted,
                "closure cells with a populated target but no weighted content"
            );
        }

        let curve = Self { grid: weighted.grid().clone(), ratio, error, null_error, defined };
        let (chi2, ndf) = curve.chi2_vs_unity();
        tracing::debug!(cells = n, defined = curve.n_defined(), chi2, ndf, "closure curve");
        Ok(curve)
    }

    /// Grid of the curve.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Ratio per cell.
    pub fn ratio(&self) -> &[f64] {
        &self.ratio
    }

    /// Ratio uncertainty per cell.
    pub fn error(&self) -> &[f64] {
        &self.error
    }

    /// Whether the target was non-empty in each cell.
    pub fn defined(&self) -> &[bool] {
        &self.defined
    }

    /// Number of defined cells.
    pub fn n_defined(&self) -> usize {
        self.defined.iter().filter(|d| **d).count()
    }

    /// `sum((r - 1)^2 / err^2)` over defined cells, and the number of cells
    /// contributing. `err` is the ratio error evaluated at `r = 1`, so cells
    /// with an empty weighted content still count.
    pub fn chi2_vs_unity(&self) -> (f64, usize) {
        self.ratio
            .iter()
            .zip(&self.null_error)
            .zip(&self.defined)
            .filter(|((_, e), d)| **d && **e > 0.0)
            .fold((0.0, 0), |(chi2, n), ((r, e), _)| (chi2 + ((r - 1.0) / e).powi(2), n + 1))
    }

    /// The curve as an accumulator (value = ratio, error = propagated error).
    pub fn to_accumulator(&self, name: &str) -> Result<Accumulator> {
        Accumulator::from_parts(
            name,
            "closure",
            self.grid.clone(),
            self.ratio.clone(),
            self.error.iter().map(|e| e * e).collect(),
            0.0,
            0.0,
            self.n_defined() as u64,
        )
    }
}
