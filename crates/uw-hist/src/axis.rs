//! One binned axis: contiguous half-open bins `[lo, hi)`.

use std::fmt;

use uw_core::{Error, Result};

/// Where a coordinate lands on an [`Axis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisBin {
    /// Below the first edge.
    Underflow,
    /// Inside bin `i` (0-based, excluding flows).
    Bin(usize),
    /// At or above the last edge, or NaN.
    Overflow,
}

/// A sorted sequence of bin edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    edges: Vec<f64>,
    title: String,
}

impl Axis {
    /// `n_bins` equal-width bins spanning `[lo, hi)`.
    pub fn uniform(n_bins: usize, lo: f64, hi: f64) -> Result<Self> {
        if n_bins == 0 {
            return Err(Error::Validation("axis needs at least one bin".into()));
        }
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(Error::Validation(format!("invalid axis range [{lo}, {hi})")));
        }
        let width = (hi - lo) / n_bins as f64;
        let mut edges: Vec<f64> = (0..n_bins).map(|i| lo + i as f64 * width).collect();
        // Pin the last edge so the range is exactly the configured one.
        edges.push(hi);
        Self::from_edges(edges)
    }

    /// Axis with explicit edges (length = n_bins + 1, strictly increasing, finite).
    pub fn from_edges(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::Validation(format!(
                "axis needs at least two edges, got {}",
                edges.len()
            )));
        }
        if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
            return Err(Error::Validation(format!("non-finite bin edge: {bad}")));
        }
        if let Some(w) = edges.windows(2).find(|w| w[0] >= w[1]) {
            return Err(Error::Validation(format!(
                "bin edges must be strictly increasing ({} >= {})",
                w[0], w[1]
            )));
        }
        Ok(Self { edges, title: String::new() })
    }

    /// Attach an axis title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Axis title (may be empty).
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Bin edges.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Number of bins (excluding under/overflow).
    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// Lower edge of the first bin.
    pub fn lo(&self) -> f64 {
        self.edges[0]
    }

    /// Upper edge of the last bin (exclusive).
    pub fn hi(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    /// Center of bin `i`.
    pub fn center(&self, i: usize) -> f64 {
        0.5 * (self.edges[i] + self.edges[i + 1])
    }

    /// Locate `x`. The upper edge of the axis belongs to the overflow.
    pub fn locate(&self, x: f64) -> AxisBin {
        if x.is_nan() || x >= self.hi() {
            return AxisBin::Overflow;
        }
        if x < self.lo() {
            return AxisBin::Underflow;
        }
        // Number of edges <= x, minus one, is the containing bin.
        AxisBin::Bin(self.edges.partition_point(|e| *e <= x) - 1)
    }

    /// Index of the bin containing `x`, if in range.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        match self.locate(x) {
            AxisBin::Bin(i) => Some(i),
            AxisBin::Underflow | AxisBin::Overflow => None,
        }
    }

    /// Bins overlapping the open interval `(lo, hi)`, as an index range.
    ///
    /// With `lo` and `hi` on bin edges this selects exactly the bins inside
    /// `[lo, hi]`.
    pub fn bin_span(&self, lo: f64, hi: f64) -> Option<std::ops::Range<usize>> {
        let n = self.n_bins();
        let first = self.edges[1..].partition_point(|e| *e <= lo);
        let last = self.edges[..n].partition_point(|e| *e < hi);
        if first < last { Some(first..last) } else { None }
    }

    /// Exact edge-sequence equality.
    pub fn same_binning(&self, other: &Axis) -> bool {
        self.edges == other.edges
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.edges.len() <= 8 {
            write!(f, "{:?}", self.edges)
        } else {
            write!(f, "{}[{}, {})", self.n_bins(), self.lo(), self.hi())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_edges() {
        let a = Axis::uniform(4, 0.0, 2.0).unwrap();
        assert_eq!(a.edges(), &[0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(a.n_bins(), 4);
        assert_eq!(a.center(1), 0.75);
    }

    #[test]
    fn rejects_bad_edges() {
        assert!(Axis::from_edges(vec![0.0]).is_err());
        assert!(Axis::from_edges(vec![0.0, 1.0, 1.0]).is_err());
        assert!(Axis::from_edges(vec![0.0, f64::INFINITY]).is_err());
        assert!(Axis::uniform(0, 0.0, 1.0).is_err());
        assert!(Axis::uniform(3, 1.0, 1.0).is_err());
        assert!(Axis::uniform(3, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn locate_edge_cases() {
        let a = Axis::from_edges(vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        assert_eq!(a.locate(-0.5), AxisBin::Underflow);
        assert_eq!(a.locate(0.0), AxisBin::Bin(0));
        assert_eq!(a.locate(1.0), AxisBin::Bin(1));
        assert_eq!(a.locate(2.99), AxisBin::Bin(2));
        // Upper boundary is exclusive.
        assert_eq!(a.locate(3.0), AxisBin::Overflow);
        assert_eq!(a.locate(f64::INFINITY), AxisBin::Overflow);
        assert_eq!(a.locate(f64::NEG_INFINITY), AxisBin::Underflow);
        assert_eq!(a.locate(f64::NAN), AxisBin::Overflow);
    }

    #[test]
    fn variable_width_bins() {
        let a = Axis::from_edges(vec![0.0, 1.0, 2.0, 5.0, 10.0]).unwrap();
        assert_eq!(a.find_bin(4.999), Some(2));
        assert_eq!(a.find_bin(5.0), Some(3));
        assert_eq!(a.find_bin(10.0), None);
    }

    #[test]
    fn span_between_edges() {
        let a = Axis::from_edges(vec![0.0, 1.0, 2.0, 5.0, 10.0]).unwrap();
        assert_eq!(a.bin_span(2.0, 5.0), Some(2..3));
        assert_eq!(a.bin_span(0.0, 10.0), Some(0..4));
        assert_eq!(a.bin_span(1.5, 2.5), Some(1..3));
        assert_eq!(a.bin_span(-5.0, 0.0), None);
        assert_eq!(a.bin_span(10.0, 20.0), None);
    }

    #[test]
    fn binning_equality_is_exact() {
        let a = Axis::from_edges(vec![0.0, 1.0, 2.0]).unwrap();
        let b = Axis::from_edges(vec![0.0, 1.0 + 1e-12, 2.0]).unwrap();
        assert!(!a.same_binning(&b));
        assert!(a.same_binning(&a.clone().with_title("p_T")));
    }
}
