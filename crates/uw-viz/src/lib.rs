//! # uw-viz
//!
//! Visualization data artifacts for upcweight.
//!
//! Every artifact is a plot-friendly JSON structure (parallel arrays instead
//! of nested objects) carrying a [`ArtifactMeta`] block. Rendering is left to
//! whatever consumes the JSON.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Closure-test artifacts.
pub mod closure;

/// Cut-flow artifacts.
pub mod cutflow;

/// Binned distribution artifacts.
pub mod histogram;

/// Artifact metadata and input digests.
pub mod meta;

/// Writing artifacts to disk.
pub mod sink;

/// Measured-spectrum and ratio-graph artifacts.
pub mod spectrum;

pub use closure::{ClosureArtifact, ClosureViewArtifact};
pub use cutflow::{CutflowArtifact, CutflowCategoryArtifact, CutflowRatioArtifact};
pub use histogram::{AxisArtifact, HistogramArtifact};
pub use meta::{ArtifactMeta, sha256_file, sha256_hex};
pub use sink::JsonFileSink;
pub use spectrum::{RatioGraphArtifact, RatioPolicy, SeriesArtifact};
