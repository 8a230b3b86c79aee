use serde::{Deserialize, Serialize};
use uw_core::{GraphPoint, Result};
use uw_reweight::mirror_ratio;

use crate::meta::ArtifactMeta;

/// A 1-D series as parallel arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesArtifact {
    /// Legend label.
    pub label: String,
    /// x values.
    pub x: Vec<f64>,
    /// y values.
    pub y: Vec<f64>,
    /// x errors.
    pub xerr: Vec<f64>,
    /// y errors.
    pub yerr: Vec<f64>,
}

impl SeriesArtifact {
    /// Series from graph points.
    pub fn new(label: impl Into<String>, points: &[GraphPoint]) -> Self {
        Self {
            label: label.into(),
            x: points.iter().map(|p| p.x).collect(),
            y: points.iter().map(|p| p.y).collect(),
            xerr: points.iter().map(|p| p.x_err).collect(),
            yerr: points.iter().map(|p| p.y_err).collect(),
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// How the ratio series was formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioPolicy {
    /// Numerator series label.
    pub numerator: String,
    /// Denominator series label.
    pub denominator: String,
    /// Treatment of zero denominators.
    pub zero_policy: String,
}

/// Two measured spectra and their mirror ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioGraphArtifact {
    /// Artifact schema.
    pub schema_version: String,
    /// Provenance.
    pub meta: ArtifactMeta,
    /// Transverse-momentum window of the measurement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pt_window: Option<(f64, f64)>,
    /// Numerator spectrum.
    pub numerator: SeriesArtifact,
    /// Denominator spectrum.
    pub denominator: SeriesArtifact,
    /// Ratio at the numerator's x positions.
    pub ratio: SeriesArtifact,
    /// Ratio bookkeeping.
    pub ratio_policy: RatioPolicy,
}

impl RatioGraphArtifact {
    /// Build both spectra and their ratio.
    pub fn build(
        meta: ArtifactMeta,
        numerator: (&str, &[GraphPoint]),
        denominator: (&str, &[GraphPoint]),
    ) -> Result<Self> {
        let ratio = mirror_ratio(numerator.1, denominator.1)?;
        Ok(Self {
            schema_version: "upcweight_ratio_graph_v1".to_string(),
            meta,
            pt_window: None,
            numerator: SeriesArtifact::new(numerator.0, numerator.1),
            denominator: SeriesArtifact::new(denominator.0, denominator.1),
            ratio: SeriesArtifact::new(format!("{} / {}", numerator.0, denominator.0), &ratio),
            ratio_policy: RatioPolicy {
                numerator: numerator.0.to_string(),
                denominator: denominator.0.to_string(),
                zero_policy: "skip".to_string(),
            },
        })
    }

    /// Record the pt window.
    pub fn with_pt_window(mut self, ptmin: f64, ptmax: f64) -> Self {
        self.pt_window = Some((ptmin, ptmax));
        self
    }
}
