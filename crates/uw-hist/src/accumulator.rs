//! Weighted fixed-grid accumulation.

use std::ops::Range;

use rayon::prelude::*;
use uw_core::{Error, Result};

use crate::axis::AxisBin;
use crate::grid::Grid;

/// Handling of negative or non-finite fill weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegativeWeightPolicy {
    /// Replace the weight by 0 and count the entry.
    #[default]
    ClampToZero,
    /// Error on the first offending weight.
    Error,
}

/// A histogram on a [`Grid`]: sum of weights and sum of squared weights per
/// cell, plus under/overflow sums for observations outside the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    name: String,
    title: String,
    grid: Grid,
    sumw: Vec<f64>,
    sumw2: Vec<f64>,
    underflow: f64,
    overflow: f64,
    entries: u64,
    negative_weight_policy: NegativeWeightPolicy,
    negative_weight_entries: u64,
}

impl Accumulator {
    /// Fresh, empty accumulator on `grid`.
    pub fn new(name: impl Into<String>, grid: Grid) -> Self {
        let n = grid.n_cells();
        Self {
            name: name.into(),
            title: String::new(),
            grid,
            sumw: vec![0.0; n],
            sumw2: vec![0.0; n],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
            negative_weight_policy: NegativeWeightPolicy::default(),
            negative_weight_entries: 0,
        }
    }

    /// Rebuild an accumulator from stored contents.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        name: impl Into<String>,
        title: impl Into<String>,
        grid: Grid,
        sumw: Vec<f64>,
        sumw2: Vec<f64>,
        underflow: f64,
        overflow: f64,
        entries: u64,
    ) -> Result<Self> {
        let name = name.into();
        let n = grid.n_cells();
        if sumw.len() != n || sumw2.len() != n {
            return Err(Error::Validation(format!(
                "'{name}': expected {n} cells, got sumw={} sumw2={}",
                sumw.len(),
                sumw2.len()
            )));
        }
        if let Some(bad) = sumw.iter().chain(&sumw2).find(|v| !(v.is_finite() && **v >= 0.0)) {
            return Err(Error::Validation(format!("'{name}': invalid cell content {bad}")));
        }
        Ok(Self {
            name,
            title: title.into(),
            grid,
            sumw,
            sumw2,
            underflow,
            overflow,
            entries,
            negative_weight_policy: NegativeWeightPolicy::default(),
            negative_weight_entries: 0,
        })
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the negative weight policy.
    pub fn with_negative_weight_policy(mut self, policy: NegativeWeightPolicy) -> Self {
        self.negative_weight_policy = policy;
        self
    }

    /// Name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.grid.rank()
    }

    /// Per-cell sums of weights.
    pub fn values(&self) -> &[f64] {
        &self.sumw
    }

    /// Per-cell sums of squared weights.
    pub fn sumw2(&self) -> &[f64] {
        &self.sumw2
    }

    /// Sum of weights in `cell`, 0 for an invalid index.
    pub fn value(&self, cell: usize) -> f64 {
        self.sumw.get(cell).copied().unwrap_or(0.0)
    }

    /// Statistical error of `cell` (`sqrt(sumw2)`).
    pub fn error(&self, cell: usize) -> f64 {
        self.sumw2.get(cell).map_or(0.0, |v| v.sqrt())
    }

    /// Sum of weights at per-axis bin indices.
    pub fn value_at(&self, indices: &[usize]) -> f64 {
        self.grid.cell_index(indices).map_or(0.0, |c| self.sumw[c])
    }

    /// Weight recorded below the grid.
    pub fn underflow(&self) -> f64 {
        self.underflow
    }

    /// Weight recorded at or above the grid (and NaN coordinates).
    pub fn overflow(&self) -> f64 {
        self.overflow
    }

    /// Number of in-range fills.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Number of fills whose weight was clamped.
    pub fn negative_weight_entries(&self) -> u64 {
        self.negative_weight_entries
    }

    /// Fill with unit weight.
    pub fn fill(&mut self, coords: &[f64]) -> Result<()> {
        self.fill_weighted(coords, 1.0)
    }

    /// Fill with `weight`. Out-of-range observations only touch the flow sums.
    pub fn fill_weighted(&mut self, coords: &[f64], weight: f64) -> Result<()> {
        if coords.len() != self.grid.rank() {
            return Err(Error::Validation(format!(
                "'{}': expected {} coordinates, got {}",
                self.name,
                self.grid.rank(),
                coords.len()
            )));
        }

        let mut weight = weight;
        if !(weight.is_finite() && weight >= 0.0) {
            match self.negative_weight_policy {
                NegativeWeightPolicy::ClampToZero => {
                    self.negative_weight_entries += 1;
                    weight = 0.0;
                }
                NegativeWeightPolicy::Error => {
                    return Err(Error::Validation(format!(
                        "negative weight (hist='{}', weight={weight})",
                        self.name
                    )));
                }
            }
        }

        let mut cell = 0usize;
        for (axis, &x) in self.grid.axes().iter().zip(coords) {
            match axis.locate(x) {
                AxisBin::Bin(i) => cell = cell * axis.n_bins() + i,
                AxisBin::Underflow => {
                    self.underflow += weight;
                    return Ok(());
                }
                AxisBin::Overflow => {
                    self.overflow += weight;
                    return Ok(());
                }
            }
        }

        self.sumw[cell] += weight;
        self.sumw2[cell] += weight * weight;
        self.entries += 1;
        Ok(())
    }

    /// Total in-range weight.
    pub fn integral(&self) -> f64 {
        self.sumw.iter().sum()
    }

    /// Multiply contents by `factor` (errors scale accordingly).
    ///
    /// Contents stay non-negative, so `factor` must be finite and `>= 0`;
    /// anything else is rejected and leaves the accumulator untouched.
    pub fn scale(&mut self, factor: f64) -> Result<()> {
        if !(factor.is_finite() && factor >= 0.0) {
            return Err(Error::Validation(format!(
                "'{}': scale factor must be finite and non-negative, got {factor}",
                self.name
            )));
        }
        let f2 = factor * factor;
        self.sumw.iter_mut().for_each(|v| *v *= factor);
        self.sumw2.iter_mut().for_each(|v| *v *= f2);
        self.underflow *= factor;
        self.overflow *= factor;
        Ok(())
    }

    /// Scale to unit integral, returning the applied factor.
    ///
    /// An empty distribution is left untouched and reported as
    /// [`Error::ZeroIntegral`].
    pub fn normalize(&mut self) -> Result<f64> {
        let integral = self.integral();
        if !(integral.is_finite() && integral > 0.0) {
            return Err(Error::ZeroIntegral(self.name.clone()));
        }
        let factor = 1.0 / integral;
        self.scale(factor)?;
        Ok(factor)
    }

    /// Add `other` cell-wise. Grids must be shape-compatible.
    pub fn merge(&mut self, other: &Accumulator) -> Result<()> {
        self.grid.check_compatible(&other.grid)?;
        for (a, b) in self.sumw.iter_mut().zip(&other.sumw) {
            *a += b;
        }
        for (a, b) in self.sumw2.iter_mut().zip(&other.sumw2) {
            *a += b;
        }
        self.underflow += other.underflow;
        self.overflow += other.overflow;
        self.entries += other.entries;
        self.negative_weight_entries += other.negative_weight_entries;
        Ok(())
    }

    /// Consuming form of [`Accumulator::merge`].
    pub fn merged(mut self, other: &Accumulator) -> Result<Accumulator> {
        self.merge(other)?;
        Ok(self)
    }

    /// Fill from `items` split into `chunk_size` partitions, each accumulated
    /// independently in parallel and then merged in partition order.
    ///
    /// `observe` maps an item to `(coords, weight)`, or `None` to skip it.
    pub fn fill_partitioned<T, F>(
        name: &str,
        grid: &Grid,
        items: &[T],
        chunk_size: usize,
        observe: F,
    ) -> Result<Accumulator>
    where
        T: Sync,
        F: Fn(&T) -> Option<(Vec<f64>, f64)> + Sync,
    {
        let partials: Vec<Accumulator> = items
            .par_chunks(chunk_size.max(1))
            .map(|chunk| -> Result<Accumulator> {
                let mut acc = Accumulator::new(name, grid.clone());
                for item in chunk {
                    if let Some((coords, w)) = observe(item) {
                        acc.fill_weighted(&coords, w)?;
                    }
                }
                Ok(acc)
            })
            .collect::<Result<_>>()?;

        let mut total = Accumulator::new(name, grid.clone());
        for part in &partials {
            total.merge(part)?;
        }
        Ok(total)
    }

    /// Project onto `axis`, keeping only cells whose indices on the listed
    /// other axes fall inside the given ranges.
    pub fn project(
        &self,
        name: impl Into<String>,
        axis: usize,
        restrict: &[(usize, Range<usize>)],
    ) -> Result<Accumulator> {
        let grid = self.grid.project(axis)?;
        if let Some((bad, _)) = restrict.iter().find(|(a, _)| *a >= self.rank()) {
            return Err(Error::Validation(format!(
                "restriction on axis {bad} out of range for rank {}",
                self.rank()
            )));
        }

        let mut out = Accumulator::new(name, grid);
        out.title = self.title.clone();
        for cell in 0..self.sumw.len() {
            let idx = self.grid.indices(cell);
            if restrict.iter().all(|(a, r)| r.contains(&idx[*a])) {
                out.sumw[idx[axis]] += self.sumw[cell];
                out.sumw2[idx[axis]] += self.sumw2[cell];
            }
        }

        out.entries = if restrict.is_empty() {
            self.entries
        } else {
            // Effective entries for the selected slice.
            let sw: f64 = out.sumw.iter().sum();
            let sw2: f64 = out.sumw2.iter().sum();
            if sw2 > 0.0 { (sw * sw / sw2).round() as u64 } else { 0 }
        };
        Ok(out)
    }
}
