//! # uw-hist
//!
//! Fixed-grid histogram machinery for the upcweight reweighting chain.
//!
//! An [`Accumulator`] collects weighted observations on a [`Grid`] of
//! half-open bins. Two shape-compatible accumulators form a [`RatioTable`],
//! which answers per-event weight queries through
//! [`uw_core::WeightLookup`] and round-trips through a [`HistogramFile`].
//!
//! ## Example
//!
//! ```
//! use uw_core::WeightLookup;
//! use uw_hist::{Accumulator, Axis, Grid, RatioTable};
//!
//! let grid = Grid::new(vec![Axis::uniform(4, 0.0, 4.0).unwrap()]).unwrap();
//! let mut num = Accumulator::new("h_num", grid.clone());
//! let mut den = Accumulator::new("h_den", grid);
//! num.fill(&[0.5]).unwrap();
//! num.fill(&[0.5]).unwrap();
//! den.fill(&[0.5]).unwrap();
//!
//! let table = RatioTable::build(num, den).unwrap();
//! assert_eq!(table.weight(&[0.25]), 2.0);
//! assert_eq!(table.weight(&[4.0]), 0.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accumulator;
pub mod axis;
pub mod container;
pub mod grid;
pub mod ratio;

pub use accumulator::{Accumulator, NegativeWeightPolicy};
pub use axis::{Axis, AxisBin};
pub use container::{AxisRecord, FORMAT_VERSION, HistogramFile, HistogramRecord};
pub use grid::Grid;
pub use ratio::{Normalization, RatioTable, TableKeys};
