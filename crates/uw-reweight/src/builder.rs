//! Replaying an event population through a weight table.

use serde::{Deserialize, Serialize};
use uw_core::{Error, Result, WeightLookup};
use uw_hist::{Accumulator, Grid};

use crate::closure::ClosureView;
use crate::event::EventSource;
use crate::selection::CandidateSelection;

/// Bookkeeping from one reweighting pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReweightStats {
    /// Events read.
    pub events: usize,
    /// Events whose representative fell inside the grid and was filled.
    pub filled: usize,
    /// Events without an eligible candidate.
    pub no_candidate: usize,
    /// Events whose representative fell outside the grid.
    pub out_of_range: usize,
    /// Filled events that received weight 0 (empty denominator cell).
    pub zero_weight: usize,
}

/// Unweighted, weighted and target distributions, each normalized to unit
/// integral when non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ReweightedDistributions {
    /// Population filled with weight 1.
    pub unweighted: Accumulator,
    /// Population filled with the looked-up weight.
    pub weighted: Accumulator,
    /// Independently supplied reference distribution.
    pub target: Accumulator,
    /// Pass bookkeeping.
    pub stats: ReweightStats,
}

impl ReweightedDistributions {
    /// Project all three distributions for `view` and renormalize them.
    pub fn project(&self, view: &ClosureView) -> Result<ReweightedDistributions> {
        let restrict = view.restriction(self.target.grid())?;
        let mut unweighted =
            self.unweighted.project(format!("h_unweighted_{}", view.name), view.axis, &restrict)?;
        let mut weighted =
            self.weighted.project(format!("h_weighted_{}", view.name), view.axis, &restrict)?;
        let mut target =
            self.target.project(format!("h_target_{}", view.name), view.axis, &restrict)?;
        normalize_all([&mut unweighted, &mut weighted, &mut target])?;
        Ok(ReweightedDistributions { unweighted, weighted, target, stats: self.stats })
    }
}

/// Applies a weight lookup to one representative candidate per event.
///
/// # Example
///
/// ```
/// use uw_hist::{Accumulator, Axis, Grid, RatioTable};
/// use uw_reweight::{Candidate, CandidateSelection, EventRecord, EventTable, Reweighter};
///
/// let grid = Grid::from_axis(Axis::uniform(2, 0.0, 2.0).unwrap());
/// let mut num = Accumulator::new("h_num", grid.clone());
/// let mut den = Accumulator::new("h_den", grid.clone());
/// num.fill_weighted(&[0.5], 2.0).unwrap();
/// den.fill(&[0.5]).unwrap();
/// let table = RatioTable::build(num.clone(), den).unwrap();
///
/// let events = EventTable::new(
///     vec!["pt".into()],
///     vec![EventRecord {
///         candidates: vec![Candidate::new(vec![0.5], true)],
///         ..Default::default()
///     }],
/// )
/// .unwrap();
/// let out = Reweighter::new(&table, grid, CandidateSelection::leading(0, vec![0]))
///     .run(&events, num)
///     .unwrap();
/// assert_eq!(out.weighted.values(), &[1.0, 0.0]);
/// ```
pub struct Reweighter<'a, L: WeightLookup + ?Sized> {
    lookup: &'a L,
    grid: Grid,
    selection: CandidateSelection,
    progress_every: usize,
}

impl<'a, L: WeightLookup + ?Sized> Reweighter<'a, L> {
    /// Create a reweighter filling distributions on `grid`.
    pub fn new(lookup: &'a L, grid: Grid, selection: CandidateSelection) -> Self {
        Self { lookup, grid, selection, progress_every: 100_000 }
    }

    /// Emit a progress event every `n` events (0 disables).
    pub fn progress_every(mut self, n: usize) -> Self {
        self.progress_every = n;
        self
    }

    /// Run over `source`, comparing against `target`.
    pub fn run<S: EventSource + ?Sized>(
        &self,
        source: &S,
        target: Accumulator,
    ) -> Result<ReweightedDistributions> {
        if self.lookup.rank() != self.grid.rank() {
            return Err(Error::Validation(format!(
                "weight table has {} axes but the reweighting grid has {}",
                self.lookup.rank(),
                self.grid.rank()
            )));
        }
        if self.selection.coords.len() != self.grid.rank() {
            return Err(Error::Validation(format!(
                "selection yields {} coordinates but the grid has {} axes",
                self.selection.coords.len(),
                self.grid.rank()
            )));
        }
        self.grid.check_compatible(target.grid())?;

        let mut unweighted = Accumulator::new("h_unweighted", self.grid.clone());
        let mut weighted = Accumulator::new("h_weighted", self.grid.clone());
        let mut target = target;
        target.set_name("h_target");

        let mut stats = ReweightStats { events: source.len(), ..Default::default() };
        for i in 0..source.len() {
            if self.progress_every > 0 && i % self.progress_every == 0 {
                tracing::debug!(processed = i, total = source.len(), "reweighting");
            }

            let Some(coords) = self.selection.representative(source.candidates(i)) else {
                stats.no_candidate += 1;
                continue;
            };
            if self.grid.locate(&coords).is_none() {
                stats.out_of_range += 1;
                continue;
            }

            let w = self.lookup.weight(&coords);
            if w == 0.0 {
                stats.zero_weight += 1;
            }
            unweighted.fill(&coords)?;
            weighted.fill_weighted(&coords, w)?;
            stats.filled += 1;
        }

        normalize_all([&mut unweighted, &mut weighted, &mut target])?;
        tracing::info!(
            events = stats.events,
            filled = stats.filled,
            no_candidate = stats.no_candidate,
            out_of_range = stats.out_of_range,
            zero_weight = stats.zero_weight,
            "reweighting pass complete"
        );

        Ok(ReweightedDistributions { unweighted, weighted, target, stats })
    }
}

/// Normalize each accumulator; empty ones are reported and left as-is.
fn normalize_all<const N: usize>(accs: [&mut Accumulator; N]) -> Result<()> {
    for acc in accs {
        match acc.normalize() {
            Ok(_) => {}
            Err(Error::ZeroIntegral(name)) => {
                tracing::warn!(histogram = %name, "empty distribution, left unnormalized");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
