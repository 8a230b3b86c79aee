//! Command configuration files (YAML, or JSON by extension).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uw_hist::{Axis, Grid, TableKeys};
use uw_reweight::{
    Candidate, CandidateSelection, ClosureView, EventRecord, EventSource, Extremum,
};

pub fn read_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path)?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let cfg: T = if ext == "json" {
        serde_json::from_slice(&bytes)?
    } else {
        // Default: YAML (serde_yaml_ng).
        serde_yaml_ng::from_slice(&bytes)?
    };
    Ok(cfg)
}

/// One axis: either `bins`/`lo`/`hi` or explicit `edges`.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisSpec {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub bins: Option<usize>,
    #[serde(default)]
    pub lo: Option<f64>,
    #[serde(default)]
    pub hi: Option<f64>,
    #[serde(default)]
    pub edges: Option<Vec<f64>>,
}

impl AxisSpec {
    pub fn to_axis(&self) -> Result<Axis> {
        let axis = match (&self.edges, self.bins, self.lo, self.hi) {
            (Some(edges), None, None, None) => Axis::from_edges(edges.clone())?,
            (None, Some(n), Some(lo), Some(hi)) => Axis::uniform(n, lo, hi)?,
            _ => anyhow::bail!(
                "axis '{}': give either `edges` or all of `bins`, `lo`, `hi`",
                self.title
            ),
        };
        Ok(axis.with_title(self.title.clone()))
    }
}

fn default_true() -> bool {
    true
}

/// Representative-candidate rule, by field name.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionSpec {
    pub rank_by: String,
    pub coords: Vec<String>,
    #[serde(default)]
    pub extremum: Extremum,
    #[serde(default = "default_true")]
    pub signal_only: bool,
}

impl SelectionSpec {
    pub fn resolve<S: EventSource + ?Sized>(&self, source: &S) -> Result<CandidateSelection> {
        Ok(CandidateSelection::from_names(
            source,
            &self.rank_by,
            &self.coords,
            self.extremum,
            self.signal_only,
        )?)
    }
}

/// `fill` configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FillConfig {
    #[serde(default)]
    pub title: String,
    pub axes: Vec<AxisSpec>,
    pub selection: SelectionSpec,
}

impl FillConfig {
    pub fn grid(&self) -> Result<Grid> {
        let axes = self.axes.iter().map(AxisSpec::to_axis).collect::<Result<Vec<_>>>()?;
        Ok(Grid::new(axes)?)
    }
}

fn default_target_key() -> String {
    "h_num".to_string()
}

/// `closure-test` configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClosureConfig {
    pub selection: SelectionSpec,
    /// Component names inside the weight file.
    #[serde(default)]
    pub keys: TableKeys,
    /// Histogram inside the target file used as reference.
    #[serde(default = "default_target_key")]
    pub target_key: String,
    /// Projections to compare besides the full grid. Empty means one per axis.
    #[serde(default)]
    pub views: Vec<ClosureView>,
}

/// One spectrum of `cross-section-ratio`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpectrumSpec {
    pub label: String,
    /// Point tables in x order; relative paths are taken from the config file's directory.
    pub tables: Vec<PathBuf>,
}

impl SpectrumSpec {
    pub fn resolve(&self, base: &Path) -> Vec<PathBuf> {
        self.tables.iter().map(|p| if p.is_relative() { base.join(p) } else { p.clone() }).collect()
    }
}

/// `cross-section-ratio` configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CrossSectionConfig {
    pub ptmin: f64,
    pub ptmax: f64,
    pub numerator: SpectrumSpec,
    pub denominator: SpectrumSpec,
}

/// Threshold on an event scalar. A missing scalar fails the cut.
#[derive(Debug, Clone, Deserialize)]
pub struct CutSpec {
    pub scalar: String,
    #[serde(default)]
    pub lt: Option<f64>,
    #[serde(default)]
    pub le: Option<f64>,
    #[serde(default)]
    pub gt: Option<f64>,
    #[serde(default)]
    pub ge: Option<f64>,
}

impl CutSpec {
    pub fn passes(&self, ev: &EventRecord) -> bool {
        let Some(v) = ev.scalar(&self.scalar) else { return false };
        self.lt.is_none_or(|t| v < t)
            && self.le.is_none_or(|t| v <= t)
            && self.gt.is_none_or(|t| v > t)
            && self.ge.is_none_or(|t| v >= t)
    }
}

/// One selection tier: all `flags`, at least one of `any_flags` (if given),
/// and all `cuts`.
#[derive(Debug, Clone, Deserialize)]
pub struct TierSpec {
    pub name: String,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub any_flags: Vec<String>,
    #[serde(default)]
    pub cuts: Vec<CutSpec>,
}

impl TierSpec {
    pub fn passes(&self, ev: &EventRecord) -> bool {
        self.flags.iter().all(|f| ev.flag(f))
            && (self.any_flags.is_empty() || self.any_flags.iter().any(|f| ev.flag(f)))
            && self.cuts.iter().all(|c| c.passes(ev))
    }
}

/// Event category, with optional extra cuts per tier name.
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySpec {
    pub name: String,
    #[serde(default)]
    pub cuts: Vec<CutSpec>,
    #[serde(default)]
    pub tier_cuts: BTreeMap<String, Vec<CutSpec>>,
}

impl CategorySpec {
    pub fn contains(&self, ev: &EventRecord) -> bool {
        self.cuts.iter().all(|c| c.passes(ev))
    }
}

/// Histogram of one event scalar, booked per category and tier.
#[derive(Debug, Clone, Deserialize)]
pub struct ScalarHistSpec {
    pub scalar: String,
    #[serde(flatten)]
    pub axis: AxisSpec,
}

/// Candidates entering a candidate-field histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateFilter {
    /// Candidates flagged as signal by the upstream selection.
    #[default]
    SignalOnly,
    All,
}

impl CandidateFilter {
    pub fn accepts(self, candidate: &Candidate) -> bool {
        match self {
            Self::SignalOnly => candidate.signal,
            Self::All => true,
        }
    }
}

/// Histogram of one candidate field, one entry per accepted candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateHistSpec {
    pub field: String,
    #[serde(default)]
    pub candidates: CandidateFilter,
    #[serde(flatten)]
    pub axis: AxisSpec,
}

/// `cutflow` configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CutflowConfig {
    pub tiers: Vec<TierSpec>,
    pub categories: Vec<CategorySpec>,
    #[serde(default)]
    pub ratios: Vec<(String, String)>,
    #[serde(default)]
    pub histograms: Vec<ScalarHistSpec>,
    #[serde(default)]
    pub candidate_histograms: Vec<CandidateHistSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(scalars: &[(&str, f64)], flags: &[(&str, bool)]) -> EventRecord {
        EventRecord {
            candidates: vec![],
            flags: flags.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            scalars: scalars.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn axis_forms() {
        let a: AxisSpec = serde_yaml_ng::from_str("{title: Gpt, edges: [0, 2, 5, 10]}").unwrap();
        assert_eq!(a.to_axis().unwrap().n_bins(), 3);
        let b: AxisSpec = serde_yaml_ng::from_str("{bins: 4, lo: -2, hi: 2}").unwrap();
        assert_eq!(b.to_axis().unwrap().edges(), &[-2.0, -1.0, 0.0, 1.0, 2.0]);
        let c: AxisSpec = serde_yaml_ng::from_str("{bins: 4, lo: -2}").unwrap();
        assert!(c.to_axis().is_err());
    }

    #[test]
    fn cuts_and_tiers() {
        let ev = event(&[("ZDCsumMinus", 500.0), ("ZDCsumPlus", 1500.0)], &[("ZB", true)]);
        let cut: CutSpec = serde_yaml_ng::from_str("{scalar: ZDCsumMinus, lt: 1000}").unwrap();
        assert!(cut.passes(&ev));
        let missing: CutSpec = serde_yaml_ng::from_str("{scalar: HFEMaxMinus, lt: 8.6}").unwrap();
        assert!(!missing.passes(&ev));

        let tier: TierSpec =
            serde_yaml_ng::from_str("{name: trig, any_flags: [ZB_Min400, ZB]}").unwrap();
        assert!(tier.passes(&ev));
        let tier: TierSpec = serde_yaml_ng::from_str("{name: trig, flags: [ZB, bkg]}").unwrap();
        assert!(!tier.passes(&ev));
    }

    #[test]
    fn candidate_filters() {
        let spec: CandidateHistSpec =
            serde_yaml_ng::from_str("{field: Dmass, bins: 30, lo: 1.7, hi: 2.0}").unwrap();
        assert_eq!(spec.candidates, CandidateFilter::SignalOnly);
        assert_eq!(spec.axis.to_axis().unwrap().n_bins(), 30);
        let bkg = Candidate::new(vec![1.8], false);
        assert!(!spec.candidates.accepts(&bkg));
        let spec: CandidateHistSpec =
            serde_yaml_ng::from_str("{field: Dmass, candidates: all, edges: [1.7, 2.0]}").unwrap();
        assert!(spec.candidates.accepts(&bkg));
    }

    #[test]
    fn closure_config_defaults() {
        let yaml = concat!(
            "selection: {rank_by: Gpt, coords: [Gpt, Gy]}\n",
            "views:\n",
            "  - {name: y_pt2to5, axis: 1, window: [0, 2.0, 5.0]}\n",
        );
        let cfg: ClosureConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(cfg.keys, TableKeys::default());
        assert_eq!(cfg.target_key, "h_num");
        assert_eq!(cfg.views[0].window, Some((0, 2.0, 5.0)));
        assert!(cfg.selection.signal_only);
        assert_eq!(cfg.selection.extremum, Extremum::Max);
    }
}
