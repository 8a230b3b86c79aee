//! `upcweight cutflow`: tiered event counting per category.

use anyhow::Result;
use uw_hist::{Accumulator, Grid, HistogramFile};
use uw_reweight::{CategoryCutflow, EventRecord, EventSource, EventTable, SelectionCascade};

use crate::config::{AxisSpec, CutflowConfig};

#[derive(Debug)]
pub struct CutflowOutcome {
    pub events: u64,
    pub uncategorized: u64,
    pub cutflow: CategoryCutflow,
    pub histograms: HistogramFile,
}

fn cascade(cfg: &CutflowConfig, category: usize) -> SelectionCascade<EventRecord> {
    let cat = &cfg.categories[category];
    let mut cascade = SelectionCascade::new();
    for tier in &cfg.tiers {
        let tier = tier.clone();
        let extra = cat.tier_cuts.get(&tier.name).cloned().unwrap_or_default();
        cascade = cascade.tier(tier.name.clone(), move |ev: &EventRecord| {
            tier.passes(ev) && extra.iter().all(|c| c.passes(ev))
        });
    }
    cascade
}

/// Cumulative tier labels: `a`, `a+b`, `a+b+c`, ...
fn tier_labels(cfg: &CutflowConfig) -> Vec<String> {
    let mut labels: Vec<String> = Vec::with_capacity(cfg.tiers.len());
    for t in &cfg.tiers {
        let label = match labels.last() {
            Some(prev) => format!("{prev}+{}", t.name),
            None => t.name.clone(),
        };
        labels.push(label);
    }
    labels
}

/// `(quantity, axis)` of every booked histogram: event scalars first, then
/// candidate fields.
fn booked(cfg: &CutflowConfig) -> impl Iterator<Item = (&str, &AxisSpec)> {
    let scalars = cfg.histograms.iter().map(|s| (s.scalar.as_str(), &s.axis));
    scalars.chain(cfg.candidate_histograms.iter().map(|s| (s.field.as_str(), &s.axis)))
}

fn book(
    cfg: &CutflowConfig,
    category: &str,
    tier: usize,
    label: &str,
) -> Result<Vec<Accumulator>> {
    booked(cfg)
        .map(|(quantity, axis)| {
            let grid = Grid::from_axis(axis.to_axis()?);
            Ok(Accumulator::new(format!("h_{quantity}_{category}_{tier}"), grid)
                .with_title(label.to_string()))
        })
        .collect()
}

fn validate(cfg: &CutflowConfig) -> Result<()> {
    if cfg.tiers.is_empty() {
        anyhow::bail!("cutflow config has no tiers");
    }
    for cat in &cfg.categories {
        for key in cat.tier_cuts.keys() {
            if !cfg.tiers.iter().any(|t| &t.name == key) {
                anyhow::bail!("category '{}': tier_cuts names unknown tier '{key}'", cat.name);
            }
        }
    }
    Ok(())
}

pub fn run(cfg: &CutflowConfig, table: &EventTable) -> Result<CutflowOutcome> {
    validate(cfg)?;
    let field_indices = cfg
        .candidate_histograms
        .iter()
        .map(|s| {
            table
                .field_index(&s.field)
                .ok_or_else(|| anyhow::anyhow!("unknown candidate field '{}'", s.field))
        })
        .collect::<Result<Vec<_>>>()?;
    let events = &table.events;
    let labels = tier_labels(cfg);
    let names: Vec<String> = cfg.categories.iter().map(|c| c.name.clone()).collect();
    let cascades: Vec<_> = (0..cfg.categories.len()).map(|i| cascade(cfg, i)).collect();

    // hists[category][tier][spec]
    let mut hists = names
        .iter()
        .map(|c| {
            labels
                .iter()
                .enumerate()
                .map(|(k, l)| book(cfg, c, k, l))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    let mut cutflow = CategoryCutflow::new(labels.clone(), &names);
    let mut uncategorized = 0u64;
    for (i, ev) in events.iter().enumerate() {
        if i % 100_000 == 0 {
            tracing::debug!(processed = i, total = events.len(), "cutflow");
        }
        // Categories are exclusive; the first match wins.
        let Some(c) = cfg.categories.iter().position(|c| c.contains(ev)) else {
            uncategorized += 1;
            continue;
        };
        let passed = cascades[c].passed(ev);
        cutflow.record(&names[c], passed)?;
        for tier_hists in hists[c].iter_mut().take(passed) {
            let (scalar_hists, candidate_hists) = tier_hists.split_at_mut(cfg.histograms.len());
            for (h, spec) in scalar_hists.iter_mut().zip(&cfg.histograms) {
                if let Some(v) = ev.scalar(&spec.scalar) {
                    h.fill(&[v])?;
                }
            }
            let candidate_specs = cfg.candidate_histograms.iter().zip(&field_indices);
            for (h, (spec, &index)) in candidate_hists.iter_mut().zip(candidate_specs) {
                for cand in ev.candidates.iter().filter(|c| spec.candidates.accepts(c)) {
                    if let Some(&v) = cand.values.get(index) {
                        h.fill(&[v])?;
                    }
                }
            }
        }
    }

    let mut histograms = HistogramFile::new();
    for h in hists.iter().flatten().flatten() {
        histograms.insert(h.name(), h);
    }

    tracing::info!(events = events.len(), uncategorized, "cutflow complete");
    Ok(CutflowOutcome { events: events.len() as u64, uncategorized, cutflow, histograms })
}
