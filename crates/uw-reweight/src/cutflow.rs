//! Cascaded selection tiers and per-tier event counting.

use std::fmt;

use serde::Serialize;
use uw_core::{Error, Result};

type Predicate<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// Ordered, named selection tiers. Tier `k` passes only if tiers `0..k`
/// passed, so evaluation stops at the first failing tier.
pub struct SelectionCascade<E: ?Sized> {
    tiers: Vec<(String, Predicate<E>)>,
}

impl<E: ?Sized> Default for SelectionCascade<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ?Sized> fmt::Debug for SelectionCascade<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionCascade").field("tiers", &self.names()).finish()
    }
}

impl<E: ?Sized> SelectionCascade<E> {
    /// Empty cascade.
    pub fn new() -> Self {
        Self { tiers: Vec::new() }
    }

    /// Append a tier.
    pub fn tier(
        mut self,
        name: impl Into<String>,
        predicate: impl Fn(&E) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.tiers.push((name.into(), Box::new(predicate)));
        self
    }

    /// Number of tiers.
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Whether there are no tiers.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Tier names in evaluation order.
    pub fn names(&self) -> Vec<&str> {
        self.tiers.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of leading tiers `event` passes.
    pub fn passed(&self, event: &E) -> usize {
        self.tiers.iter().take_while(|(_, p)| p(event)).count()
    }

    /// A counter sized for this cascade.
    pub fn counter(&self) -> CutflowCounter {
        CutflowCounter::new(self.tiers.iter().map(|(n, _)| n.clone()).collect())
    }
}

/// Events counted per tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CutflowCounter {
    names: Vec<String>,
    counts: Vec<u64>,
}

impl CutflowCounter {
    /// Zeroed counter for the given tiers.
    pub fn new(names: Vec<String>) -> Self {
        let counts = vec![0; names.len()];
        Self { names, counts }
    }

    /// Count an event that passed the first `passed` tiers.
    pub fn record(&mut self, passed: usize) {
        let n = passed.min(self.counts.len());
        for c in &mut self.counts[..n] {
            *c += 1;
        }
    }

    /// Tier names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Counts in tier order.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Count for tier `i`.
    pub fn count(&self, i: usize) -> Option<u64> {
        self.counts.get(i).copied()
    }

    /// Count for the tier called `name`.
    pub fn count_of(&self, name: &str) -> Option<u64> {
        self.names.iter().position(|n| n == name).map(|i| self.counts[i])
    }
}

/// Tier counters kept separately per event category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCutflow {
    tiers: Vec<String>,
    categories: Vec<(String, CutflowCounter)>,
}

impl CategoryCutflow {
    /// Counters for `categories`, all over the same tier names.
    pub fn new(tiers: Vec<String>, categories: &[String]) -> Self {
        let categories =
            categories.iter().map(|c| (c.clone(), CutflowCounter::new(tiers.clone()))).collect();
        Self { tiers, categories }
    }

    /// Tier names.
    pub fn tiers(&self) -> &[String] {
        &self.tiers
    }

    /// Category names in insertion order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(c, _)| c.as_str())
    }

    /// Counter for `category`.
    pub fn counter(&self, category: &str) -> Option<&CutflowCounter> {
        self.categories.iter().find(|(c, _)| c == category).map(|(_, k)| k)
    }

    /// Count an event of `category` that passed the first `passed` tiers.
    pub fn record(&mut self, category: &str, passed: usize) -> Result<()> {
        let counter = self
            .categories
            .iter_mut()
            .find(|(c, _)| c == category)
            .map(|(_, k)| k)
            .ok_or_else(|| Error::Validation(format!("unknown category '{category}'")))?;
        counter.record(passed);
        Ok(())
    }

    /// Per-tier `numerator / denominator` count ratio; `None` where the
    /// denominator count is zero.
    pub fn ratio(&self, numerator: &str, denominator: &str) -> Result<Vec<Option<f64>>> {
        let lookup = |c: &str| {
            self.counter(c).ok_or_else(|| Error::Validation(format!("unknown category '{c}'")))
        };
        let (n, d) = (lookup(numerator)?, lookup(denominator)?);
        Ok(n.counts()
            .iter()
            .zip(d.counts())
            .map(|(&n, &d)| (d > 0).then(|| n as f64 / d as f64))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Ev {
        trigger: bool,
        bkg: bool,
        vtx: bool,
        hf: f64,
    }

    fn cascade() -> SelectionCascade<Ev> {
        SelectionCascade::new()
            .tier("trigger", |e: &Ev| e.trigger)
            .tier("trigger+bkg", |e: &Ev| e.bkg)
            .tier("trigger+bkg+vtx", |e: &Ev| e.vtx)
            .tier("trigger+bkg+vtx+hf", |e: &Ev| e.hf < 8.6)
    }

    #[test]
    fn cascade_is_cumulative() {
        let c = cascade();
        assert_eq!(c.len(), 4);
        let all = Ev { trigger: true, bkg: true, vtx: true, hf: 1.0 };
        assert_eq!(c.passed(&all), 4);
        // A later tier cannot pass once an earlier one failed.
        let gap = Ev { trigger: true, bkg: false, vtx: true, hf: 1.0 };
        assert_eq!(c.passed(&gap), 1);
        assert_eq!(c.passed(&Ev::default()), 0);
    }

    #[test]
    fn evaluation_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let c = SelectionCascade::<Ev>::new().tier("trigger", |e: &Ev| e.trigger).tier(
            "counted",
            move |_: &Ev| {
                seen.fetch_add(1, Ordering::Relaxed);
                true
            },
        );
        c.passed(&Ev::default());
        assert_eq!(calls.load(Ordering::Relaxed), 0);
        c.passed(&Ev { trigger: true, ..Default::default() });
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn counter_by_index_and_name() {
        let c = cascade();
        let mut k = c.counter();
        for passed in [4, 2, 0, 1, 4, 9] {
            k.record(passed);
        }
        assert_eq!(k.counts(), &[5, 4, 3, 3]);
        assert_eq!(k.count(1), Some(4));
        assert_eq!(k.count(7), None);
        assert_eq!(k.count_of("trigger+bkg+vtx+hf"), Some(3));
        assert_eq!(k.count_of("nope"), None);
    }

    #[test]
    fn category_ratios() {
        let tiers = cascade().names().iter().map(|s| s.to_string()).collect();
        let mut cf = CategoryCutflow::new(tiers, &["0nXn".into(), "Xn0n".into()]);
        for p in [4, 4, 3, 1] {
            cf.record("0nXn", p).unwrap();
        }
        for p in [4, 2] {
            cf.record("Xn0n", p).unwrap();
        }
        assert!(cf.record("XnXn", 1).is_err());
        assert_eq!(cf.counter("0nXn").unwrap().counts(), &[4, 3, 3, 2]);
        let r = cf.ratio("0nXn", "Xn0n").unwrap();
        assert_eq!(r, vec![Some(2.0), Some(1.5), Some(3.0), Some(2.0)]);

        let mut empty = CategoryCutflow::new(vec!["t".into()], &["a".into(), "b".into()]);
        empty.record("a", 1).unwrap();
        assert_eq!(empty.ratio("a", "b").unwrap(), vec![None]);
        assert!(empty.ratio("a", "zz").is_err());
    }
}
