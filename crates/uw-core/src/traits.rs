//! Core traits for upcweight
//!
//! Weight producers (ratio tables) and weight consumers (the reweighting
//! loop) meet at [`WeightLookup`]; artifact producers and writers meet at
//! [`ArtifactSink`].

use crate::Result;

/// Maps a continuous coordinate to a per-event weight.
///
/// Implementations must be total: any input, including NaN, infinities and a
/// wrong number of coordinates, yields a finite non-negative number.
pub trait WeightLookup: Send + Sync {
    /// Number of coordinates a query expects.
    fn rank(&self) -> usize;

    /// Weight for `coords`, or `0.0` outside the calibrated region.
    fn weight(&self, coords: &[f64]) -> f64;
}

/// Destination for finished artifacts (distributions, curves, summaries).
pub trait ArtifactSink {
    /// Write `value` under `name`. Errors are surfaced, never retried.
    fn write(&mut self, name: &str, value: &serde_json::Value) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(f64);

    impl WeightLookup for Constant {
        fn rank(&self) -> usize {
            1
        }

        fn weight(&self, coords: &[f64]) -> f64 {
            if coords.len() == 1 { self.0 } else { 0.0 }
        }
    }

    struct Collect(Vec<String>);

    impl ArtifactSink for Collect {
        fn write(&mut self, name: &str, _value: &serde_json::Value) -> Result<()> {
            self.0.push(name.to_string());
            Ok(())
        }
    }

    #[test]
    fn lookup_is_object_safe() {
        let l: Box<dyn WeightLookup> = Box::new(Constant(2.0));
        assert_eq!(l.weight(&[1.0]), 2.0);
        assert_eq!(l.weight(&[1.0, 2.0]), 0.0);
        assert_eq!(l.rank(), 1);
    }

    #[test]
    fn sink_is_object_safe() {
        let mut c = Collect(Vec::new());
        let s: &mut dyn ArtifactSink = &mut c;
        s.write("a", &serde_json::json!({})).unwrap();
        assert_eq!(c.0, vec!["a".to_string()]);
    }
}
