//! Cartesian product of axes with row-major cell indexing.

use std::fmt;

use uw_core::{Error, Result};

use crate::axis::Axis;

/// An ordered set of axes. Cell indices are row-major (first axis slowest).
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    axes: Vec<Axis>,
}

impl Grid {
    /// Create a grid from one or more axes.
    pub fn new(axes: Vec<Axis>) -> Result<Self> {
        if axes.is_empty() {
            return Err(Error::Validation("grid needs at least one axis".into()));
        }
        Ok(Self { axes })
    }

    /// One-dimensional grid.
    pub fn from_axis(axis: Axis) -> Self {
        Self { axes: vec![axis] }
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.axes.len()
    }

    /// All axes.
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Axis `i`.
    pub fn axis(&self, i: usize) -> Option<&Axis> {
        self.axes.get(i)
    }

    /// Bins per axis.
    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(Axis::n_bins).collect()
    }

    /// Total number of in-range cells.
    pub fn n_cells(&self) -> usize {
        self.axes.iter().map(Axis::n_bins).product()
    }

    /// Same rank and identical edges on every axis.
    pub fn is_compatible(&self, other: &Grid) -> bool {
        self.rank() == other.rank()
            && self.axes.iter().zip(&other.axes).all(|(a, b)| a.same_binning(b))
    }

    /// [`Error::ShapeMismatch`] unless [`Grid::is_compatible`].
    pub fn check_compatible(&self, other: &Grid) -> Result<()> {
        if self.is_compatible(other) { Ok(()) } else { Err(Error::shape_mismatch(self, other)) }
    }

    /// Cell containing `coords`, or `None` if any coordinate is out of range
    /// or the arity does not match.
    pub fn locate(&self, coords: &[f64]) -> Option<usize> {
        if coords.len() != self.axes.len() {
            return None;
        }
        let mut cell = 0usize;
        for (axis, &x) in self.axes.iter().zip(coords) {
            cell = cell * axis.n_bins() + axis.find_bin(x)?;
        }
        Some(cell)
    }

    /// Flat cell index from per-axis bin indices.
    pub fn cell_index(&self, indices: &[usize]) -> Option<usize> {
        if indices.len() != self.axes.len() {
            return None;
        }
        let mut cell = 0usize;
        for (axis, &i) in self.axes.iter().zip(indices) {
            if i >= axis.n_bins() {
                return None;
            }
            cell = cell * axis.n_bins() + i;
        }
        Some(cell)
    }

    /// Per-axis bin indices of a flat cell index.
    pub fn indices(&self, mut cell: usize) -> Vec<usize> {
        let mut out = vec![0; self.axes.len()];
        for (slot, axis) in out.iter_mut().zip(&self.axes).rev() {
            *slot = cell % axis.n_bins();
            cell /= axis.n_bins();
        }
        out
    }

    /// One-dimensional grid over axis `i`.
    pub fn project(&self, i: usize) -> Result<Grid> {
        let axis = self.axes.get(i).ok_or_else(|| {
            Error::Validation(format!("axis {i} out of range for rank {}", self.rank()))
        })?;
        Ok(Grid::from_axis(axis.clone()))
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, axis) in self.axes.iter().enumerate() {
            if i > 0 {
                write!(f, " x ")?;
            }
            write!(f, "{axis}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_2d() -> Grid {
        Grid::new(vec![Axis::uniform(3, 0.0, 3.0).unwrap(), Axis::uniform(2, -1.0, 1.0).unwrap()])
            .unwrap()
    }

    #[test]
    fn row_major_cells() {
        let g = grid_2d();
        assert_eq!(g.n_cells(), 6);
        assert_eq!(g.locate(&[0.5, -0.5]), Some(0));
        assert_eq!(g.locate(&[0.5, 0.5]), Some(1));
        assert_eq!(g.locate(&[2.5, 0.5]), Some(5));
        for cell in 0..g.n_cells() {
            assert_eq!(g.cell_index(&g.indices(cell)), Some(cell));
        }
    }

    #[test]
    fn locate_rejects_out_of_range_and_arity() {
        let g = grid_2d();
        assert_eq!(g.locate(&[3.0, 0.0]), None);
        assert_eq!(g.locate(&[0.5, 1.0]), None);
        assert_eq!(g.locate(&[0.5]), None);
        assert_eq!(g.locate(&[0.5, f64::NAN]), None);
        assert_eq!(g.cell_index(&[3, 0]), None);
    }

    #[test]
    fn compatibility() {
        let g = grid_2d();
        assert!(g.is_compatible(&g.clone()));
        let other = Grid::from_axis(Axis::uniform(3, 0.0, 3.0).unwrap());
        assert!(!g.is_compatible(&other));
        let err = g.check_compatible(&other).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
        assert!(err.to_string().contains(" x "));
    }

    #[test]
    fn projection_keeps_axis() {
        let g = grid_2d();
        let p = g.project(1).unwrap();
        assert_eq!(p.rank(), 1);
        assert_eq!(p.axis(0).unwrap().edges(), &[-1.0, 0.0, 1.0]);
        assert!(g.project(2).is_err());
    }
}
