use serde::{Deserialize, Serialize};
use uw_core::Result;
use uw_reweight::{ClosureCurve, ReweightStats, ReweightedDistributions};

use crate::histogram::HistogramArtifact;
use crate::meta::ArtifactMeta;

/// One closure comparison (full grid or a projection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureViewArtifact {
    /// View name (`full` for the whole grid).
    pub name: String,
    /// Reweighting input, weight 1.
    pub unweighted: HistogramArtifact,
    /// Reweighting input, looked-up weights.
    pub weighted: HistogramArtifact,
    /// Reference distribution.
    pub target: HistogramArtifact,
    /// `weighted / target` per cell.
    pub ratio_y: Vec<f64>,
    /// Propagated ratio error per cell.
    pub ratio_yerr: Vec<f64>,
    /// Cells where the target is non-empty.
    pub ratio_defined: Vec<bool>,
    /// Chi-square of the ratio against 1 over defined cells.
    pub chi2_vs_unity: f64,
    /// Cells contributing to `chi2_vs_unity`.
    pub ndf: usize,
}

impl ClosureViewArtifact {
    /// Compare `dist.weighted` with `dist.target`.
    pub fn from_distributions(
        name: impl Into<String>,
        dist: &ReweightedDistributions,
    ) -> Result<Self> {
        let curve = ClosureCurve::compare(&dist.weighted, &dist.target)?;
        let (chi2_vs_unity, ndf) = curve.chi2_vs_unity();
        Ok(Self {
            name: name.into(),
            unweighted: HistogramArtifact::from(&dist.unweighted),
            weighted: HistogramArtifact::from(&dist.weighted),
            target: HistogramArtifact::from(&dist.target),
            ratio_y: curve.ratio().to_vec(),
            ratio_yerr: curve.error().to_vec(),
            ratio_defined: curve.defined().to_vec(),
            chi2_vs_unity,
            ndf,
        })
    }
}

/// Closure-test artifact: the full-grid comparison plus projections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureArtifact {
    /// Artifact schema.
    pub schema_version: String,
    /// Provenance.
    pub meta: ArtifactMeta,
    /// Reweighting pass counters.
    pub stats: ReweightStats,
    /// Comparisons, full grid first.
    pub views: Vec<ClosureViewArtifact>,
}

impl ClosureArtifact {
    /// Artifact with no views yet.
    pub fn new(meta: ArtifactMeta, stats: ReweightStats) -> Self {
        Self {
            schema_version: "upcweight_closure_v1".to_string(),
            meta,
            stats,
            views: Vec::new(),
        }
    }

    /// Append a view.
    pub fn push_view(&mut self, view: ClosureViewArtifact) {
        self.views.push(view);
    }

    /// View by name.
    pub fn view(&self, name: &str) -> Option<&ClosureViewArtifact> {
        self.views.iter().find(|v| v.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uw_hist::{Accumulator, Axis, Grid};

    #[test]
    fn identity_view() {
        let g = Grid::from_axis(Axis::uniform(3, 0.0, 3.0).unwrap());
        let mut h = Accumulator::new("h", g);
        for x in [0.5, 1.5, 1.5] {
            h.fill(&[x]).unwrap();
        }
        h.normalize().unwrap();
        let dist = ReweightedDistributions {
            unweighted: h.clone(),
            weighted: h.clone(),
            target: h,
            stats: ReweightStats { events: 3, filled: 3, ..Default::default() },
        };
        let v = ClosureViewArtifact::from_distributions("full", &dist).unwrap();
        assert_eq!(v.ratio_y, vec![1.0, 1.0, 0.0]);
        assert_eq!(v.ratio_defined, vec![true, true, false]);
        assert_eq!(v.chi2_vs_unity, 0.0);
        assert_eq!(v.ndf, 2);

        let mut a = ClosureArtifact::new(ArtifactMeta::new(true).unwrap(), dist.stats);
        a.push_view(v);
        assert!(a.view("full").is_some());
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["stats"]["filled"], 3);
        assert_eq!(json["views"][0]["ratio_y"][0], 1.0);
    }
}
