use serde::{Deserialize, Serialize};
use uw_core::Result;
use uw_reweight::CategoryCutflow;

use crate::meta::ArtifactMeta;

/// Counts of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutflowCategoryArtifact {
    /// Category name.
    pub name: String,
    /// Events passing each tier.
    pub counts: Vec<u64>,
}

/// Per-tier ratio between two categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutflowRatioArtifact {
    /// Numerator category.
    pub numerator: String,
    /// Denominator category.
    pub denominator: String,
    /// Ratio per tier, `null` where the denominator count is 0.
    pub values: Vec<Option<f64>>,
}

/// Cut-flow summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutflowArtifact {
    /// Artifact schema.
    pub schema_version: String,
    /// Provenance.
    pub meta: ArtifactMeta,
    /// Events read.
    pub events: u64,
    /// Tier names in order.
    pub tiers: Vec<String>,
    /// Per-category counts.
    pub categories: Vec<CutflowCategoryArtifact>,
    /// Requested category ratios.
    pub ratios: Vec<CutflowRatioArtifact>,
}

impl CutflowArtifact {
    /// Summarize `cutflow`, adding one ratio row per `(numerator, denominator)`.
    pub fn build(
        meta: ArtifactMeta,
        events: u64,
        cutflow: &CategoryCutflow,
        ratios: &[(String, String)],
    ) -> Result<Self> {
        let categories = cutflow
            .categories()
            .filter_map(|c| {
                cutflow.counter(c).map(|k| CutflowCategoryArtifact {
                    name: c.to_string(),
                    counts: k.counts().to_vec(),
                })
            })
            .collect();
        let ratios = ratios
            .iter()
            .map(|(n, d)| {
                Ok(CutflowRatioArtifact {
                    numerator: n.clone(),
                    denominator: d.clone(),
                    values: cutflow.ratio(n, d)?,
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            schema_version: "upcweight_cutflow_v1".to_string(),
            meta,
            events,
            tiers: cutflow.tiers().to_vec(),
            categories,
            ratios,
        })
    }
}
