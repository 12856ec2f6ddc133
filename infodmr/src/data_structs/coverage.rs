//! Run-length encoded, per-base weighted coverage.
//!
//! [`WeightedCoverage`] turns a collection of possibly overlapping weighted
//! intervals into a step function over each chromosome. Every base covered
//! by an interval receives the interval's weight; overlapping intervals add
//! up. Summing the step function over a region gives the total score mass of
//! that region.

use std::collections::BTreeMap;

use itertools::Itertools;

use super::typedef::{
    ChrName,
    PosType,
    ScoreType,
};
use super::{
    GenomicInterval,
    IntervalSignal,
};

/// A run of constant weight over `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageRun {
    pub start:  PosType,
    pub end:    PosType,
    pub weight: ScoreType,
}

impl CoverageRun {
    /// Weight mass of the part of this run falling into `[start, end)`.
    fn mass_within(
        &self,
        start: PosType,
        end: PosType,
    ) -> ScoreType {
        let lo = self.start.max(start);
        let hi = self.end.min(end);
        if hi > lo {
            self.weight * (hi - lo) as ScoreType
        }
        else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedCoverage {
    runs: BTreeMap<ChrName, Vec<CoverageRun>>,
}

impl WeightedCoverage {
    pub fn from_signal(signal: &IntervalSignal) -> Self {
        let runs = signal
            .partitions()
            .iter()
            .map(|(chr, chrom)| (chr.clone(), sweep_runs(chrom.iter())))
            .filter(|(_, runs)| !runs.is_empty())
            .collect();
        Self { runs }
    }

    /// Builds coverage from arbitrary weighted intervals, in any order.
    pub fn from_weighted_intervals<I>(intervals: I) -> Self
    where
        I: IntoIterator<Item = (GenomicInterval, ScoreType)>, {
        let runs = intervals
            .into_iter()
            .map(|(iv, w)| (iv.chr().clone(), (iv.start(), iv.end(), w)))
            .into_group_map()
            .into_iter()
            .map(|(chr, ivs)| (chr, sweep_runs(ivs.into_iter())))
            .filter(|(_, runs)| !runs.is_empty())
            .collect();
        Self { runs }
    }

    pub fn runs(
        &self,
        chr: &str,
    ) -> &[CoverageRun] {
        self.runs
            .get(chr)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn n_runs(&self) -> usize {
        self.runs.values().map(Vec::len).sum()
    }

    /// Coverage weight at a single base; 0 outside every run.
    pub fn get(
        &self,
        chr: &str,
        pos: PosType,
    ) -> ScoreType {
        let runs = self.runs(chr);
        let idx = runs.partition_point(|r| r.end <= pos);
        runs.get(idx)
            .filter(|r| r.start <= pos)
            .map(|r| r.weight)
            .unwrap_or(0.0)
    }

    /// Per-base sum of the coverage over `[start, end)` on `chr`.
    pub fn sum_over_range(
        &self,
        chr: &str,
        start: PosType,
        end: PosType,
    ) -> ScoreType {
        let runs = self.runs(chr);
        let first = runs.partition_point(|r| r.end <= start);
        runs[first..]
            .iter()
            .take_while(|r| r.start < end)
            .map(|r| r.mass_within(start, end))
            .sum()
    }

    pub fn sum_over(
        &self,
        interval: &GenomicInterval,
    ) -> ScoreType {
        self.sum_over_range(interval.chr(), interval.start(), interval.end())
    }
}

/// Sweep line over `(start, end, weight)` triples. Non-finite weights and
/// empty intervals are skipped. Runs with zero weight are not stored.
fn sweep_runs<I>(intervals: I) -> Vec<CoverageRun>
where
    I: Iterator<Item = (PosType, PosType, ScoreType)>, {
    // (position, weight delta, active interval delta)
    let mut events: Vec<(PosType, ScoreType, i64)> = Vec::new();
    for (start, end, weight) in intervals {
        if start < end && weight.is_finite() {
            events.push((start, weight, 1));
            events.push((end, -weight, -1));
        }
    }
    events.sort_by_key(|(pos, ..)| *pos);

    let mut runs: Vec<CoverageRun> = Vec::new();
    let mut depth: ScoreType = 0.0;
    let mut active: i64 = 0;
    let mut prev_pos: PosType = 0;

    for (pos, chunk) in &events.into_iter().chunk_by(|(pos, ..)| *pos) {
        if active > 0 && pos > prev_pos && depth != 0.0 {
            match runs.last_mut() {
                Some(last) if last.end == prev_pos && last.weight == depth => last.end = pos,
                _ => {
                    runs.push(CoverageRun {
                        start:  prev_pos,
                        end:    pos,
                        weight: depth,
                    })
                },
            }
        }
        for (_, weight_delta, active_delta) in chunk {
            depth += weight_delta;
            active += active_delta;
        }
        // Avoid carrying float residue across uncovered gaps.
        if active == 0 {
            depth = 0.0;
        }
        prev_pos = pos;
    }
    runs
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    fn iv(
        start: PosType,
        end: PosType,
    ) -> GenomicInterval {
        GenomicInterval::new("chr1", start, end)
    }

    #[test]
    fn empty_coverage() {
        let cov = WeightedCoverage::from_weighted_intervals(Vec::<(GenomicInterval, ScoreType)>::new());
        assert_eq!(cov.n_runs(), 0);
        assert_eq!(cov.get("chr1", 10), 0.0);
        assert_eq!(cov.sum_over(&iv(0, 100)), 0.0);
    }

    #[test]
    fn single_interval() {
        let cov = WeightedCoverage::from_weighted_intervals(vec![(iv(10, 20), 2.5)]);
        assert_eq!(cov.runs("chr1"), &[CoverageRun {
            start:  10,
            end:    20,
            weight: 2.5,
        }]);
        assert_eq!(cov.get("chr1", 9), 0.0);
        assert_eq!(cov.get("chr1", 10), 2.5);
        assert_eq!(cov.get("chr1", 20), 0.0);
        assert_approx_eq!(cov.sum_over(&iv(0, 100)), 25.0);
        assert_approx_eq!(cov.sum_over(&iv(15, 17)), 5.0);
    }

    #[test]
    fn overlapping_intervals_add_up() {
        let cov = WeightedCoverage::from_weighted_intervals(vec![
            (iv(0, 10), 1.0),
            (iv(5, 15), 2.0),
        ]);
        let runs = cov.runs("chr1");
        assert_eq!(runs.len(), 3);
        assert_eq!(cov.get("chr1", 4), 1.0);
        assert_eq!(cov.get("chr1", 7), 3.0);
        assert_eq!(cov.get("chr1", 12), 2.0);
        assert_approx_eq!(cov.sum_over(&iv(0, 15)), 10.0 + 20.0);
    }

    #[test]
    fn adjacent_equal_runs_merge() {
        let cov = WeightedCoverage::from_weighted_intervals(vec![
            (iv(0, 10), 1.0),
            (iv(10, 20), 1.0),
        ]);
        assert_eq!(cov.runs("chr1").len(), 1);
        assert_approx_eq!(cov.sum_over(&iv(0, 20)), 20.0);
    }

    #[test]
    fn gaps_and_non_finite_weights() {
        let cov = WeightedCoverage::from_weighted_intervals(vec![
            (iv(0, 1), 4.0),
            (iv(100, 101), f64::NAN),
            (iv(200, 201), 6.0),
        ]);
        assert_eq!(cov.runs("chr1").len(), 2);
        assert_approx_eq!(cov.sum_over(&iv(0, 150)), 4.0);
        assert_approx_eq!(cov.sum_over(&iv(0, 300)), 10.0);
        assert_eq!(cov.sum_over(&GenomicInterval::new("chr2", 0, 300)), 0.0);
    }
}
