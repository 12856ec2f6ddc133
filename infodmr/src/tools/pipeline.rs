//! End-to-end DMR calling for one test sample.
//!
//! Two entry points share the same tail (significance transform and
//! thresholding) and differ in where the null distribution comes from:
//!
//! - [`DmrPipeline::run_with_replicates`] smooths reference-vs-reference
//!   comparisons and pools them into an empirical null. When many samples
//!   share the same comparisons, build that null once with
//!   [`DmrPipeline::replicate_null_model`] and pass it to
//!   [`DmrPipeline::run_with_null_model`];
//! - [`DmrPipeline::run_without_replicates`] fits a logit-space mixture to
//!   the smoothed test scores.

use std::collections::BTreeMap;

use itertools::Itertools;
use log::{
    debug,
    info,
};

use super::null_model::{
    MixtureFitConfig,
    NullModel,
};
use super::significance::{
    ScoreTransformer,
    DEFAULT_CEILING,
};
use super::smooth::{
    Smoother,
    DEFAULT_BANDWIDTH,
};
use super::threshold::{
    MorphologicalThresholder,
    DEFAULT_THRESHOLD,
    DEFAULT_UNIT_SIZE,
};
use crate::data_structs::typedef::{
    ChrName,
    PosType,
};
use crate::data_structs::{
    DmrRecord,
    IntervalSignal,
};
use crate::error::{
    DmrError,
    DmrResult,
};
use crate::with_field_fn;

/// The 22 human autosomes, `chr1` to `chr22`.
pub fn default_chromosomes() -> Vec<String> {
    (1..=22).map(|i| format!("chr{}", i)).collect()
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub chromosomes:        Vec<String>,
    pub bandwidth:          f64,
    /// Falls back to the bandwidth when unset.
    pub closing_length:     Option<PosType>,
    pub ceiling:            f64,
    pub unit_size:          f64,
    pub threshold:          f64,
    pub emit_intermediates: bool,
    pub chrom_sizes:        BTreeMap<ChrName, PosType>,
    pub mixture:            MixtureFitConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chromosomes:        default_chromosomes(),
            bandwidth:          DEFAULT_BANDWIDTH,
            closing_length:     None,
            ceiling:            DEFAULT_CEILING,
            unit_size:          DEFAULT_UNIT_SIZE,
            threshold:          DEFAULT_THRESHOLD,
            emit_intermediates: false,
            chrom_sizes:        BTreeMap::new(),
            mixture:            MixtureFitConfig::default(),
        }
    }
}

impl PipelineConfig {
    with_field_fn!(chromosomes, Vec<String>);
    with_field_fn!(bandwidth, f64);
    with_field_fn!(closing_length, Option<PosType>);
    with_field_fn!(ceiling, f64);
    with_field_fn!(unit_size, f64);
    with_field_fn!(threshold, f64);
    with_field_fn!(emit_intermediates, bool);
    with_field_fn!(chrom_sizes, BTreeMap<ChrName, PosType>);
    with_field_fn!(mixture, MixtureFitConfig);

    pub fn effective_closing_length(&self) -> PosType {
        self.closing_length
            .unwrap_or_else(|| self.bandwidth.round().max(0.0) as PosType)
    }

    pub fn smoother(&self) -> Smoother {
        Smoother::new(self.bandwidth)
    }

    pub fn transformer(&self) -> ScoreTransformer {
        ScoreTransformer::new(self.ceiling)
    }

    pub fn thresholder(&self) -> MorphologicalThresholder {
        MorphologicalThresholder::new(self.threshold, self.effective_closing_length())
            .with_unit_size(self.unit_size)
            .with_chrom_sizes(self.chrom_sizes.clone())
    }

    pub fn finish(self) -> DmrPipeline {
        DmrPipeline::new(self)
    }
}

/// Result of one pipeline run. Intermediate tracks are only kept when
/// `emit_intermediates` is set.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub dmrs:         Vec<DmrRecord>,
    pub smoothed:     Option<IntervalSignal>,
    pub significance: Option<IntervalSignal>,
    pub null_model:   NullModel,
}

#[derive(Debug, Clone, Default)]
pub struct DmrPipeline {
    config: PipelineConfig,
}

impl DmrPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Restricts to the configured chromosomes and smooths.
    pub fn prepare(
        &self,
        signal: &IntervalSignal,
    ) -> DmrResult<IntervalSignal> {
        let restricted = signal.restrict_to_chromosomes(self.config.chromosomes.as_slice());
        if restricted.is_empty() {
            return Err(DmrError::InputShape(format!(
                "no records on the {} selected chromosomes ({} records in total)",
                self.config.chromosomes.len(),
                signal.len()
            )));
        }
        debug!(
            "Kept {} of {} records on {} chromosomes",
            restricted.len(),
            signal.len(),
            restricted.n_chr()
        );
        self.config.smoother().smooth(&restricted)
    }

    /// Smooths the replicate comparisons and pools them into an empirical
    /// null.
    pub fn replicate_null_model(
        &self,
        nulls: &[IntervalSignal],
    ) -> DmrResult<NullModel> {
        if nulls.is_empty() {
            return Err(DmrError::InputShape(
                "at least one replicate comparison is required".to_string(),
            ));
        }
        let smoothed_nulls = nulls
            .iter()
            .map(|null| self.prepare(null))
            .collect::<DmrResult<Vec<_>>>()?;
        NullModel::from_replicate_signals(&smoothed_nulls)
    }

    /// DMRs of `test` against an empirical null pooled from replicate
    /// comparisons.
    pub fn run_with_replicates(
        &self,
        test: &IntervalSignal,
        nulls: &[IntervalSignal],
    ) -> DmrResult<PipelineOutput> {
        let null_model = self.replicate_null_model(nulls)?;
        let smoothed = self.prepare(test)?;
        self.finish_with(smoothed, null_model)
    }

    /// DMRs of `test` against a prebuilt null model.
    pub fn run_with_null_model(
        &self,
        test: &IntervalSignal,
        null_model: &NullModel,
    ) -> DmrResult<PipelineOutput> {
        let smoothed = self.prepare(test)?;
        self.finish_with(smoothed, null_model.clone())
    }

    /// DMRs of `test` against the lower component of a mixture fitted to its
    /// own smoothed scores.
    pub fn run_without_replicates(
        &self,
        test: &IntervalSignal,
    ) -> DmrResult<PipelineOutput> {
        let smoothed = self.prepare(test)?;
        let scores = smoothed.values().collect_vec();
        let null_model = NullModel::from_mixture_fit_with(&scores, &self.config.mixture)?;
        self.finish_with(smoothed, null_model)
    }

    fn finish_with(
        &self,
        smoothed: IntervalSignal,
        null_model: NullModel,
    ) -> DmrResult<PipelineOutput> {
        let significance = self.config.transformer().transform(&smoothed, &null_model)?;
        let dmrs = self.config.thresholder().threshold(&significance)?;

        if dmrs.is_empty() {
            info!(
                "No DMRs: no significance score above {}",
                self.config.threshold
            );
        }
        else {
            info!(
                "Found {} DMRs covering {} bp",
                dmrs.len(),
                dmrs.iter().map(|d| d.length() as u64).sum::<u64>()
            );
        }

        let (smoothed, significance) = if self.config.emit_intermediates {
            (Some(smoothed), Some(significance))
        }
        else {
            (None, None)
        };
        Ok(PipelineOutput {
            dmrs,
            smoothed,
            significance,
            null_model,
        })
    }
}
