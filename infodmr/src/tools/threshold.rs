//! Thresholding, morphological closing and score aggregation.
//!
//! Records above the threshold are dilated by `closing_length / 2` on the
//! left and by the remaining `closing_length - closing_length / 2` on the
//! right, unions of overlapping or touching extents are merged and the result
//! is eroded by the same amounts. Two surviving records separated by a gap of
//! at most `closing_length` bases end up in one region. Each closed
//! region is scored with the per-base coverage of the whole cleaned signal,
//! so sub-threshold records inside a region contribute to its score.

use std::collections::BTreeMap;

use itertools::Itertools;
use log::{
    debug,
    info,
};
use rayon::prelude::*;

use crate::data_structs::typedef::{
    ChrName,
    PosType,
    ScoreType,
};
use crate::data_structs::{
    ChromSignal,
    DmrRecord,
    GenomicInterval,
    IntervalSignal,
    WeightedCoverage,
};
use crate::error::{
    DmrError,
    DmrResult,
};
use crate::utils::THREAD_POOL;
use crate::with_field_fn;

pub const DEFAULT_THRESHOLD: f64 = 20.0;
pub const DEFAULT_CLOSING_LENGTH: PosType = 50_000;
pub const DEFAULT_UNIT_SIZE: f64 = 150.0;
/// Infinite scores are replaced by this multiple of the threshold.
pub const INF_CLAMP_FACTOR: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MorphologicalThresholder {
    pub threshold:      f64,
    pub closing_length: PosType,
    pub unit_size:      f64,
    /// Chromosome lengths used to clip closed regions. Chromosomes missing
    /// here are only clipped at 0.
    pub chrom_sizes:    BTreeMap<ChrName, PosType>,
}

impl Default for MorphologicalThresholder {
    fn default() -> Self {
        Self {
            threshold:      DEFAULT_THRESHOLD,
            closing_length: DEFAULT_CLOSING_LENGTH,
            unit_size:      DEFAULT_UNIT_SIZE,
            chrom_sizes:    BTreeMap::new(),
        }
    }
}

impl MorphologicalThresholder {
    with_field_fn!(threshold, f64);
    with_field_fn!(closing_length, PosType);
    with_field_fn!(unit_size, f64);
    with_field_fn!(chrom_sizes, BTreeMap<ChrName, PosType>);

    pub fn new(
        threshold: f64,
        closing_length: PosType,
    ) -> Self {
        Self {
            threshold,
            closing_length,
            ..Default::default()
        }
    }

    fn check_params(&self) -> DmrResult<()> {
        if !self.threshold.is_finite() {
            return Err(DmrError::InvalidParameter(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        if !(self.unit_size.is_finite() && self.unit_size > 0.0) {
            return Err(DmrError::InvalidParameter(format!(
                "unit size must be positive and finite, got {}",
                self.unit_size
            )));
        }
        Ok(())
    }

    /// Drops undefined values and replaces infinities with
    /// `±INF_CLAMP_FACTOR * threshold`.
    pub fn clean(
        &self,
        signal: &IntervalSignal,
    ) -> IntervalSignal {
        let stand_in = INF_CLAMP_FACTOR * self.threshold;
        signal.filter_map_values(|value| {
            if value.is_nan() {
                None
            }
            else if value == f64::INFINITY {
                Some(stand_in)
            }
            else if value == f64::NEG_INFINITY {
                Some(-stand_in)
            }
            else {
                Some(value)
            }
        })
    }

    /// Closed regions of a single chromosome, before aggregation.
    pub fn closed_regions(
        &self,
        chr: &str,
        chrom: &ChromSignal,
    ) -> Vec<(PosType, PosType)> {
        let survivors = chrom
            .iter()
            .filter(|(_, _, value)| *value > self.threshold)
            .map(|(start, end, _)| (start, end));
        let upper = self
            .chrom_sizes
            .get(chr)
            .map(|size| *size as i64)
            .unwrap_or(PosType::MAX as i64);
        close(survivors, self.closing_length)
            .into_iter()
            .filter_map(|(start, end)| {
                let (start, end) = (start.max(0), end.min(upper));
                (start < end).then_some((start as PosType, end as PosType))
            })
            .collect()
    }

    /// Thresholds, closes and aggregates `signal` into DMRs, ordered by
    /// chromosome then start.
    pub fn threshold(
        &self,
        signal: &IntervalSignal,
    ) -> DmrResult<Vec<DmrRecord>> {
        self.check_params()?;
        signal.validate()?;

        let cleaned = self.clean(signal);
        let coverage = WeightedCoverage::from_signal(&cleaned);

        let dmrs = THREAD_POOL.install(|| {
            cleaned
                .partitions()
                .par_iter()
                .map(|(chr, chrom)| self.aggregate(chr, chrom, &coverage))
                .collect::<Vec<_>>()
        });
        let dmrs = dmrs.into_iter().flatten().collect_vec();
        debug!(
            "Thresholded {} records at {} (closing length {}): {} regions",
            signal.len(),
            self.threshold,
            self.closing_length,
            dmrs.len()
        );
        Ok(dmrs)
    }

    fn aggregate(
        &self,
        chr: &ChrName,
        chrom: &ChromSignal,
        coverage: &WeightedCoverage,
    ) -> Vec<DmrRecord> {
        self.closed_regions(chr, chrom)
            .into_iter()
            .map(|(start, end)| {
                let mass: ScoreType = coverage.sum_over_range(chr, start, end);
                DmrRecord::new(
                    GenomicInterval::new(chr.clone(), start, end),
                    mass / self.unit_size,
                )
            })
            .collect()
    }
}

/// Morphological closing of start-sorted intervals in signed coordinates.
/// Nothing is clipped here; a closing length of 0 returns the input
/// unchanged.
fn close<I>(
    intervals: I,
    closing_length: PosType,
) -> Vec<(i64, i64)>
where
    I: Iterator<Item = (PosType, PosType)>, {
    let intervals = intervals.map(|(s, e)| (s as i64, e as i64));
    if closing_length == 0 {
        return intervals.collect();
    }
    let left = (closing_length / 2) as i64;
    let right = closing_length as i64 - left;
    intervals
        .map(|(start, end)| (start - left, end + right))
        .coalesce(|(s1, e1), (s2, e2)| {
            if s2 <= e1 {
                Ok((s1, e1.max(e2)))
            }
            else {
                Err(((s1, e1), (s2, e2)))
            }
        })
        .map(|(start, end)| (start + left, end - right))
        .filter(|(start, end)| start < end)
        .collect()
}

/// Thresholds `signal` with the default unit size and no chromosome
/// bounds.
pub fn threshold(
    signal: &IntervalSignal,
    threshold_value: f64,
    closing_length: PosType,
) -> DmrResult<Vec<DmrRecord>> {
    let dmrs = MorphologicalThresholder::new(threshold_value, closing_length).threshold(signal)?;
    if dmrs.is_empty() {
        info!("No region exceeds the threshold {}", threshold_value);
    }
    Ok(dmrs)
}
