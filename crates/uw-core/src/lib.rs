//! # uw-core
//!
//! Shared building blocks for the upcweight reweighting toolkit: the error
//! type, measured-spectrum point types, and the traits that decouple weight
//! producers from their consumers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{ArtifactSink, WeightLookup};
pub use types::{GraphPoint, Point};
