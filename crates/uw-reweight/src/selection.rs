//! Representative-candidate selection.

use serde::{Deserialize, Serialize};
use uw_core::{Error, Result};

use crate::event::{Candidate, EventSource};

/// Which end of the ranking field wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extremum {
    /// Largest value (leading candidate).
    #[default]
    Max,
    /// Smallest value.
    Min,
}

/// Picks one candidate per event and extracts its grid coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSelection {
    /// Field index used for ranking candidates.
    pub rank_by: usize,
    /// Ranking direction.
    pub extremum: Extremum,
    /// Ignore candidates whose signal flag is false.
    pub signal_only: bool,
    /// Field indices forming the coordinates, in grid-axis order.
    pub coords: Vec<usize>,
}

impl CandidateSelection {
    /// Leading signal candidate by `rank_by`, coordinates from `coords`.
    pub fn leading(rank_by: usize, coords: Vec<usize>) -> Self {
        Self { rank_by, extremum: Extremum::Max, signal_only: true, coords }
    }

    /// Resolve field names against `source`.
    pub fn from_names<S: EventSource + ?Sized>(
        source: &S,
        rank_by: &str,
        coords: &[String],
        extremum: Extremum,
        signal_only: bool,
    ) -> Result<Self> {
        let resolve = |name: &str| {
            source.field_index(name).ok_or_else(|| {
                Error::Validation(format!(
                    "unknown candidate field '{name}' (available: {:?})",
                    source.field_names()
                ))
            })
        };
        Ok(Self {
            rank_by: resolve(rank_by)?,
            extremum,
            signal_only,
            coords: coords.iter().map(|c| resolve(c.as_str())).collect::<Result<_>>()?,
        })
    }

    /// The representative candidate, if any is eligible.
    ///
    /// Ties keep the earlier candidate; NaN ranking values are never chosen.
    pub fn pick<'a>(&self, candidates: &'a [Candidate]) -> Option<&'a Candidate> {
        let mut best: Option<(&Candidate, f64)> = None;
        for c in candidates {
            if self.signal_only && !c.signal {
                continue;
            }
            let Some(&v) = c.values.get(self.rank_by) else { continue };
            if v.is_nan() {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, b)) => match self.extremum {
                    Extremum::Max => v > b,
                    Extremum::Min => v < b,
                },
            };
            if better {
                best = Some((c, v));
            }
        }
        best.map(|(c, _)| c)
    }

    /// Coordinates of the representative candidate.
    pub fn representative(&self, candidates: &[Candidate]) -> Option<Vec<f64>> {
        let c = self.pick(candidates)?;
        self.coords.iter().map(|&i| c.values.get(i).copied()).collect()
    }
}
