//! Conversion of p-values into significance scores (SQS).

use log::debug;

use super::null_model::NullModel;
use crate::data_structs::{
    ChromSignal,
    IntervalSignal,
};
use crate::error::{
    DmrError,
    DmrResult,
};
use crate::utils::MIN_PVALUE;
use crate::with_field_fn;

pub const DEFAULT_CEILING: f64 = 250.0;

/// `-10 * log10(max(p, eps))`, capped at `ceiling`. NaN stays NaN.
#[inline]
pub fn to_significance(
    p: f64,
    ceiling: f64,
) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    (-10.0 * p.max(MIN_PVALUE).log10()).min(ceiling)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreTransformer {
    pub ceiling: f64,
}

impl Default for ScoreTransformer {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_CEILING,
        }
    }
}

impl ScoreTransformer {
    with_field_fn!(ceiling, f64);

    pub fn new(ceiling: f64) -> Self {
        Self { ceiling }
    }

    pub fn apply(
        &self,
        p: f64,
    ) -> f64 {
        to_significance(p, self.ceiling)
    }

    /// SQS track of `signal` under `null_model`.
    ///
    /// The whole signal is evaluated as one batch, so the boundary policy of
    /// the null model sees every chromosome. Records whose p-value is
    /// undefined are dropped.
    pub fn transform(
        &self,
        signal: &IntervalSignal,
        null_model: &NullModel,
    ) -> DmrResult<IntervalSignal> {
        if !(self.ceiling > 0.0) {
            return Err(DmrError::InvalidParameter(format!(
                "significance ceiling must be positive, got {}",
                self.ceiling
            )));
        }
        let scores = signal.values().collect::<Vec<_>>();
        let mut p_values = null_model.p_values(&scores).into_iter();

        let partitions = signal
            .partitions()
            .iter()
            .map(|(chr, chrom)| {
                let sqs: ChromSignal = chrom
                    .iter()
                    .zip(p_values.by_ref())
                    .filter_map(|((start, end, _), p)| {
                        let score = self.apply(p);
                        (!score.is_nan()).then_some((start, end, score))
                    })
                    .collect();
                (chr.clone(), sqs)
            })
            .collect();
        let sqs = IntervalSignal::try_from_partitions(partitions)?;
        debug!(
            "Converted {} of {} scores to significance ({} null)",
            sqs.len(),
            signal.len(),
            null_model.kind()
        );
        Ok(sqs)
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use rstest::rstest;

    use super::*;
    use crate::data_structs::{
        GenomicInterval,
        SignalRecord,
    };

    #[rstest]
    #[case(1.0, 0.0)]
    #[case(0.1, 10.0)]
    #[case(0.01, 20.0)]
    #[case(1e-5, 50.0)]
    fn significance_of_p(
        #[case] p: f64,
        #[case] expected: f64,
    ) {
        assert_approx_eq!(to_significance(p, DEFAULT_CEILING), expected, 1e-9);
    }

    #[test]
    fn significance_is_capped() {
        let floor = -10.0 * f64::EPSILON.log10();
        assert_approx_eq!(to_significance(0.0, 1000.0), floor, 1e-9);
        assert_approx_eq!(to_significance(1e-300, 1000.0), floor, 1e-9);
        assert_eq!(to_significance(1e-10, 50.0), 50.0);
        assert!(to_significance(f64::NAN, 50.0).is_nan());
        for p in [0.0, 1e-300, 1e-20, 0.3, 1.0] {
            let score = ScoreTransformer::default().apply(p);
            assert!((0.0..=DEFAULT_CEILING).contains(&score));
        }
    }

    #[test]
    fn transform_keeps_intervals_and_drops_undefined() {
        let signal = IntervalSignal::from_records(vec![
            SignalRecord::new(GenomicInterval::new("chr1", 0, 1), 0.5),
            SignalRecord::new(GenomicInterval::new("chr1", 10, 11), f64::NAN),
            SignalRecord::new(GenomicInterval::new("chr2", 0, 1), 3.5),
        ]);
        let null = NullModel::from_replicate_pool(vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let sqs = ScoreTransformer::default().transform(&signal, &null).unwrap();

        assert_eq!(sqs.len(), 2);
        let records = sqs.iter().collect::<Vec<_>>();
        assert_eq!(records[0].interval, GenomicInterval::new("chr1", 0, 1));
        assert_approx_eq!(records[0].value, -10.0 * 0.75f64.log10(), 1e-9);
        assert_eq!(records[1].interval, GenomicInterval::new("chr2", 0, 1));
        assert_approx_eq!(records[1].value, -10.0 * f64::EPSILON.log10(), 1e-9);
    }

    #[test]
    fn invalid_ceiling() {
        let signal = IntervalSignal::new();
        let null = NullModel::from_replicate_pool(vec![0.0]).unwrap();
        assert!(matches!(
            ScoreTransformer::new(0.0).transform(&signal, &null),
            Err(DmrError::InvalidParameter(_))
        ));
    }
}
