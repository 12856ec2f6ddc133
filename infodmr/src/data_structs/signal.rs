//! Per-chromosome interval signals.
//!
//! [`IntervalSignal`] is the structure every pipeline stage consumes and
//! produces. Records are stored column-wise per chromosome
//! ([`ChromSignal`]) and partitions are kept in a `BTreeMap`, so iteration is
//! always chromosome-then-position ordered.

use std::collections::BTreeMap;

use itertools::Itertools;
use rayon::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};

use super::coverage::WeightedCoverage;
use super::typedef::{
    ChrName,
    PosType,
    ScoreType,
};
use super::GenomicInterval;
use crate::error::{
    DmrError,
    DmrResult,
};
use crate::utils::THREAD_POOL;

/// A single (interval, value) record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub interval: GenomicInterval,
    pub value:    ScoreType,
}

impl SignalRecord {
    pub fn new(
        interval: GenomicInterval,
        value: ScoreType,
    ) -> Self {
        Self { interval, value }
    }
}

/// Column-wise records of a single chromosome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChromSignal {
    starts: Vec<PosType>,
    ends:   Vec<PosType>,
    values: Vec<ScoreType>,
}

impl ChromSignal {
    /// Builds a partition from its columns. Columns of different length or
    /// an empty or inverted interval give an input shape error.
    pub fn try_new(
        starts: Vec<PosType>,
        ends: Vec<PosType>,
        values: Vec<ScoreType>,
    ) -> DmrResult<Self> {
        if starts.len() != ends.len() || starts.len() != values.len() {
            return Err(DmrError::InputShape(format!(
                "column lengths differ: {} starts, {} ends, {} values",
                starts.len(),
                ends.len(),
                values.len()
            )));
        }
        if let Some((idx, (start, end))) = starts
            .iter()
            .zip(ends.iter())
            .find_position(|(start, end)| start >= end)
        {
            return Err(DmrError::InputShape(format!(
                "record {} has empty or inverted interval {}-{}",
                idx, start, end
            )));
        }
        Ok(Self {
            starts,
            ends,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    pub fn starts(&self) -> &[PosType] {
        &self.starts
    }

    pub fn ends(&self) -> &[PosType] {
        &self.ends
    }

    pub fn values(&self) -> &[ScoreType] {
        &self.values
    }

    /// `start < end` must hold.
    fn push(
        &mut self,
        start: PosType,
        end: PosType,
        value: ScoreType,
    ) {
        self.starts.push(start);
        self.ends.push(end);
        self.values.push(value);
    }

    /// Iterates `(start, end, value)` triples in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (PosType, PosType, ScoreType)> + '_ {
        itertools::izip!(
            self.starts.iter().copied(),
            self.ends.iter().copied(),
            self.values.iter().copied()
        )
    }

    /// Same intervals, values replaced by `f(value)`.
    pub fn map_values<F>(
        &self,
        f: F,
    ) -> Self
    where
        F: Fn(ScoreType) -> ScoreType, {
        Self {
            starts: self.starts.clone(),
            ends:   self.ends.clone(),
            values: self.values.iter().copied().map(f).collect(),
        }
    }

    /// Keeps records for which `f` returns a value, replacing the value.
    pub fn filter_map_values<F>(
        &self,
        f: F,
    ) -> Self
    where
        F: Fn(ScoreType) -> Option<ScoreType>, {
        self.iter()
            .filter_map(|(start, end, value)| f(value).map(|v| (start, end, v)))
            .collect()
    }

    /// Stable reorder by start position.
    pub fn sorted_by_start(&self) -> Self {
        self.iter()
            .sorted_by_key(|(start, ..)| *start)
            .collect()
    }

    /// Checks the canonical layout: non-empty intervals, strictly increasing
    /// starts and no overlap between neighbours.
    pub fn validate(
        &self,
        chr: &str,
    ) -> DmrResult<()> {
        for (idx, (start, end, _)) in self.iter().enumerate() {
            if start >= end {
                return Err(DmrError::InputShape(format!(
                    "{}: record {} has empty or inverted interval {}-{}",
                    chr, idx, start, end
                )));
            }
        }
        for (idx, ((prev_start, prev_end), (start, _))) in self
            .starts
            .iter()
            .zip(self.ends.iter())
            .tuple_windows()
            .map(|((ps, pe), (s, e))| ((*ps, *pe), (*s, *e)))
            .enumerate()
        {
            if start <= prev_start {
                return Err(DmrError::InputShape(format!(
                    "{}: positions are not strictly increasing at record {} ({} after {})",
                    chr,
                    idx + 1,
                    start,
                    prev_start
                )));
            }
            if start < prev_end {
                return Err(DmrError::InputShape(format!(
                    "{}: record {} overlaps the previous interval ending at {}",
                    chr,
                    idx + 1,
                    prev_end
                )));
            }
        }
        Ok(())
    }
}

/// Collects `(start, end, value)` triples as they come. Intervals are not
/// checked; [`IntervalSignal::try_from_partitions`] and
/// [`ChromSignal::validate`] do that.
impl FromIterator<(PosType, PosType, ScoreType)> for ChromSignal {
    fn from_iter<T: IntoIterator<Item = (PosType, PosType, ScoreType)>>(iter: T) -> Self {
        let (starts, (ends, values)): (Vec<_>, (Vec<_>, Vec<_>)) = iter
            .into_iter()
            .map(|(s, e, v)| (s, (e, v)))
            .unzip();
        Self {
            starts,
            ends,
            values,
        }
    }
}

/// Ordered, per-chromosome set of (interval, value) records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalSignal {
    partitions: BTreeMap<ChrName, ChromSignal>,
}

impl IntervalSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps already partitioned data. Empty partitions are dropped, the
    /// rest must pass [`ChromSignal::validate`].
    pub fn try_from_partitions(partitions: BTreeMap<ChrName, ChromSignal>) -> DmrResult<Self> {
        let partitions: BTreeMap<_, _> = partitions
            .into_iter()
            .filter(|(_, signal)| !signal.is_empty())
            .collect();
        let signal = Self { partitions };
        signal.validate()?;
        Ok(signal)
    }

    /// Groups records by chromosome, keeping the order in which they were
    /// supplied. No canonical checks are made; see
    /// [`IntervalSignal::validate`].
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = SignalRecord>, {
        let mut partitions: BTreeMap<ChrName, ChromSignal> = BTreeMap::new();
        for record in records {
            partitions
                .entry(record.interval.chr().clone())
                .or_default()
                .push(
                    record.interval.start(),
                    record.interval.end(),
                    record.value,
                );
        }
        Self { partitions }
    }

    /// [`IntervalSignal::from_records`] followed by
    /// [`IntervalSignal::validate`].
    pub fn try_from_records<I>(records: I) -> DmrResult<Self>
    where
        I: IntoIterator<Item = SignalRecord>, {
        let signal = Self::from_records(records);
        signal.validate()?;
        Ok(signal)
    }

    pub fn validate(&self) -> DmrResult<()> {
        self.partitions
            .iter()
            .try_for_each(|(chr, signal)| signal.validate(chr))
    }

    pub fn partitions(&self) -> &BTreeMap<ChrName, ChromSignal> {
        &self.partitions
    }

    pub fn chromosome(
        &self,
        name: &str,
    ) -> Option<&ChromSignal> {
        self.partitions.get(name)
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &ChrName> {
        self.partitions.keys()
    }

    pub fn n_chr(&self) -> usize {
        self.partitions.len()
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.partitions.values().map(ChromSignal::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records in chromosome-then-position order.
    pub fn iter(&self) -> impl Iterator<Item = SignalRecord> + '_ {
        self.partitions.iter().flat_map(|(chr, signal)| {
            signal.iter().map(move |(start, end, value)| {
                SignalRecord::new(GenomicInterval::new(chr.clone(), start, end), value)
            })
        })
    }

    /// Values in chromosome-then-position order.
    pub fn values(&self) -> impl Iterator<Item = ScoreType> + '_ {
        self.partitions
            .values()
            .flat_map(|signal| signal.values().iter().copied())
    }

    /// Sub-signal limited to `names`. Names without data are ignored.
    pub fn restrict_to_chromosomes<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Self {
        let partitions = self
            .partitions
            .iter()
            .filter(|(chr, _)| names.iter().any(|n| n.as_ref() == chr.as_str()))
            .map(|(chr, signal)| (chr.clone(), signal.clone()))
            .collect();
        Self { partitions }
    }

    /// Stable per-chromosome reorder by start position.
    pub fn sorted_by_start(&self) -> Self {
        self.map_partitions(|_, signal| signal.sorted_by_start())
    }

    /// Per-base weighted coverage of the value field. Overlapping records
    /// add up.
    pub fn coverage_weighted(&self) -> WeightedCoverage {
        WeightedCoverage::from_signal(self)
    }

    pub fn map_values<F>(
        &self,
        f: F,
    ) -> Self
    where
        F: Fn(ScoreType) -> ScoreType + Sync, {
        self.map_partitions(|_, signal| signal.map_values(&f))
    }

    pub fn filter_map_values<F>(
        &self,
        f: F,
    ) -> Self
    where
        F: Fn(ScoreType) -> Option<ScoreType> + Sync, {
        self.map_partitions(|_, signal| signal.filter_map_values(&f))
    }

    /// Applies `f` to every chromosome independently on the crate thread
    /// pool. Partitions that end up empty are dropped.
    pub fn map_partitions<F>(
        &self,
        f: F,
    ) -> Self
    where
        F: Fn(&ChrName, &ChromSignal) -> ChromSignal + Sync, {
        let partitions = THREAD_POOL.install(|| {
            self.partitions
                .par_iter()
                .map(|(chr, signal)| (chr.clone(), f(chr, signal)))
                .filter(|(_, signal)| !signal.is_empty())
                .collect::<BTreeMap<_, _>>()
        });
        Self { partitions }
    }

    /// Fallible variant of [`IntervalSignal::map_partitions`]. Any error
    /// aborts, which one is reported is not fixed. The mapped partitions go
    /// through [`IntervalSignal::try_from_partitions`].
    pub fn try_map_partitions<F>(
        &self,
        f: F,
    ) -> DmrResult<Self>
    where
        F: Fn(&ChrName, &ChromSignal) -> DmrResult<ChromSignal> + Sync, {
        let partitions = THREAD_POOL.install(|| {
            self.partitions
                .par_iter()
                .map(|(chr, signal)| f(chr, signal).map(|s| (chr.clone(), s)))
                .collect::<DmrResult<Vec<_>>>()
        })?;
        Self::try_from_partitions(partitions.into_iter().collect())
    }
}

impl FromIterator<SignalRecord> for IntervalSignal {
    fn from_iter<T: IntoIterator<Item = SignalRecord>>(iter: T) -> Self {
        Self::from_records(iter)
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use rstest::{
        fixture,
        rstest,
    };

    use super::*;

    fn rec(
        chr: &str,
        start: PosType,
        end: PosType,
        value: ScoreType,
    ) -> SignalRecord {
        SignalRecord::new(GenomicInterval::new(chr, start, end), value)
    }

    #[fixture]
    fn two_chr_signal() -> IntervalSignal {
        IntervalSignal::try_from_records(vec![
            rec("chr2", 10, 11, 0.5),
            rec("chr1", 100, 101, 1.0),
            rec("chr1", 200, 201, 2.0),
            rec("chr2", 20, 21, 0.25),
        ])
        .unwrap()
    }

    #[rstest]
    fn test_from_records_partitions(two_chr_signal: IntervalSignal) {
        assert_eq!(two_chr_signal.n_chr(), 2);
        assert_eq!(two_chr_signal.len(), 4);
        let order = two_chr_signal
            .iter()
            .map(|r| r.interval.to_string())
            .collect_vec();
        assert_eq!(order, vec![
            "chr1:100-101",
            "chr1:200-201",
            "chr2:10-11",
            "chr2:20-21"
        ]);
    }

    #[rstest]
    fn test_restrict_unknown_chromosome(two_chr_signal: IntervalSignal) {
        let restricted = two_chr_signal.restrict_to_chromosomes(&["chr2", "chrUn"]);
        assert_eq!(restricted.n_chr(), 1);
        assert_eq!(restricted.len(), 2);
        assert!(restricted.chromosome("chr1").is_none());

        let empty = two_chr_signal.restrict_to_chromosomes(&["chrZ"]);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_validate_non_monotonic() {
        let res = IntervalSignal::try_from_records(vec![
            rec("chr1", 200, 201, 1.0),
            rec("chr1", 100, 101, 1.0),
        ]);
        assert!(matches!(res, Err(DmrError::InputShape(_))));
    }

    #[test]
    fn test_validate_overlap() {
        let res = IntervalSignal::try_from_records(vec![
            rec("chr1", 100, 150, 1.0),
            rec("chr1", 120, 160, 1.0),
        ]);
        assert!(matches!(res, Err(DmrError::InputShape(_))));
    }

    #[test]
    fn test_sorted_by_start_is_stable() {
        let signal = IntervalSignal::from_records(vec![
            rec("chr1", 300, 301, 3.0),
            rec("chr1", 100, 110, 1.0),
            rec("chr1", 100, 105, 2.0),
            rec("chr1", 50, 51, 0.0),
        ]);
        assert!(signal.validate().is_err());
        let sorted = signal.sorted_by_start();
        let chr1 = sorted.chromosome("chr1").unwrap();
        assert_eq!(chr1.starts(), &[50, 100, 100, 300]);
        assert_eq!(chr1.values(), &[0.0, 1.0, 2.0, 3.0]);
    }

    #[rstest]
    fn test_filter_map_drops_partitions(two_chr_signal: IntervalSignal) {
        let filtered = two_chr_signal.filter_map_values(|v| (v >= 1.0).then_some(v * 2.0));
        assert_eq!(filtered.n_chr(), 1);
        assert_eq!(filtered.chromosome("chr1").unwrap().values(), &[2.0, 4.0]);
    }

    #[test]
    fn test_chrom_signal_rejects_bad_columns() {
        assert!(ChromSignal::try_new(vec![0, 10], vec![5, 20], vec![1.0, 2.0]).is_ok());
        assert!(matches!(
            ChromSignal::try_new(vec![0, 10], vec![5], vec![1.0, 2.0]),
            Err(DmrError::InputShape(_))
        ));
        assert!(matches!(
            ChromSignal::try_new(vec![0, 10], vec![5, 10], vec![1.0, 2.0]),
            Err(DmrError::InputShape(_))
        ));
        assert!(matches!(
            ChromSignal::try_new(vec![7], vec![3], vec![1.0]),
            Err(DmrError::InputShape(_))
        ));
    }

    #[test]
    fn test_from_partitions_rejects_inverted_intervals() {
        let inverted: ChromSignal = vec![(0, 5, 1.0), (10, 8, 2.0)].into_iter().collect();
        let res = IntervalSignal::try_from_partitions(BTreeMap::from([(
            ChrName::from("chr1"),
            inverted,
        )]));
        assert!(matches!(res, Err(DmrError::InputShape(_))));

        let good = ChromSignal::try_new(vec![0, 10], vec![5, 20], vec![1.0, 2.0]).unwrap();
        let signal = IntervalSignal::try_from_partitions(BTreeMap::from([
            (ChrName::from("chr1"), good),
            (ChrName::from("chr2"), ChromSignal::default()),
        ]))
        .unwrap();
        assert_eq!(signal.n_chr(), 1);
        assert_eq!(
            signal.iter().map(|r| r.interval.to_string()).collect_vec(),
            vec!["chr1:0-5", "chr1:10-20"]
        );
    }

    #[rstest]
    fn test_try_map_partitions_stops_on_error(two_chr_signal: IntervalSignal) {
        let doubled = two_chr_signal
            .try_map_partitions(|_, chrom| Ok(chrom.map_values(|v| v * 2.0)))
            .unwrap();
        assert_eq!(doubled.chromosome("chr2").unwrap().values(), &[1.0, 0.5]);

        let res = two_chr_signal.try_map_partitions(|chr, chrom| {
            if chr.as_str() == "chr2" {
                Err(DmrError::InputShape("bad chromosome".to_string()))
            }
            else {
                Ok(chrom.clone())
            }
        });
        assert!(matches!(res, Err(DmrError::InputShape(_))));
    }

    #[rstest]
    fn test_coverage_from_signal(two_chr_signal: IntervalSignal) {
        let coverage = two_chr_signal.coverage_weighted();
        let total = coverage.sum_over(&GenomicInterval::new("chr1", 0, 1000));
        assert_approx_eq!(total, 3.0);
    }
}
