//! # uw-reweight
//!
//! The event-level half of the reweighting chain:
//!
//! - [`event`]: the event source seam and the JSON event table.
//! - [`selection`]: choosing one representative candidate per event.
//! - [`builder`]: replaying a population through a weight table.
//! - [`closure`]: comparing the reweighted shape with the target.
//! - [`ratio_graph`] and [`points`]: mirror ratios of measured spectra.
//! - [`cutflow`]: ordered named selection tiers with per-tier counters.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod closure;
pub mod cutflow;
pub mod event;
pub mod points;
pub mod ratio_graph;
pub mod selection;

pub use builder::{ReweightStats, ReweightedDistributions, Reweighter};
pub use closure::{ClosureCurve, ClosureView};
pub use cutflow::{CategoryCutflow, CutflowCounter, SelectionCascade};
pub use event::{Candidate, EventRecord, EventSource, EventTable};
pub use points::{check_pt_window, parse_point_table, read_point, read_points, to_graph};
pub use ratio_graph::mirror_ratio;
pub use selection::{CandidateSelection, Extremum};
