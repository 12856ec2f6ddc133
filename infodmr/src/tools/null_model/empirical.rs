use log::{
    debug,
    warn,
};

use super::PValue;
use crate::error::{
    DmrError,
    DmrResult,
};
use crate::utils::MIN_PVALUE;

/// Null distribution given by a frozen sample of reference scores.
///
/// `p(x)` is the fraction of the sample strictly greater than `x`, floored
/// at machine epsilon.
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalNullModel {
    sorted: Vec<f64>,
}

impl EmpiricalNullModel {
    /// Builds the model from pooled reference scores. Non-finite scores are
    /// discarded.
    pub fn new(pool: Vec<f64>) -> DmrResult<Self> {
        let n_total = pool.len();
        let mut sorted = pool
            .into_iter()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        if sorted.is_empty() {
            return Err(DmrError::InputShape(format!(
                "null pool has no finite score ({} records)",
                n_total
            )));
        }
        if sorted.len() < n_total {
            warn!(
                "Dropped {} non-finite scores from the null pool",
                n_total - sorted.len()
            );
        }
        sorted.sort_by(f64::total_cmp);
        debug!(
            "Empirical null from {} scores, range [{}, {}]",
            sorted.len(),
            sorted[0],
            sorted[sorted.len() - 1]
        );
        Ok(Self { sorted })
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Empirical CDF at `x`.
    pub fn ecdf(
        &self,
        x: f64,
    ) -> f64 {
        self.sorted.partition_point(|v| *v <= x) as f64 / self.sorted.len() as f64
    }
}

impl PValue for EmpiricalNullModel {
    fn p_value(
        &self,
        x: f64,
    ) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        (1.0 - self.ecdf(x)).max(MIN_PVALUE)
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(-1.0, 1.0)]
    #[case(1.0, 0.75)]
    #[case(2.5, 0.5)]
    #[case(3.0, 0.25)]
    #[case(4.0, MIN_PVALUE)]
    #[case(100.0, MIN_PVALUE)]
    fn survival_fraction(
        #[case] x: f64,
        #[case] expected: f64,
    ) {
        let model = EmpiricalNullModel::new(vec![4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_approx_eq!(model.p_value(x), expected, 1e-15);
    }

    #[test]
    fn p_value_is_non_increasing() {
        let model = EmpiricalNullModel::new((0..50).map(|i| (i % 7) as f64 * 0.3).collect()).unwrap();
        let grid = (0..100).map(|i| i as f64 * 0.03 - 0.5).collect::<Vec<_>>();
        for pair in grid.windows(2) {
            assert!(model.p_value(pair[0]) >= model.p_value(pair[1]));
        }
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert!(matches!(
            EmpiricalNullModel::new(vec![]),
            Err(DmrError::InputShape(_))
        ));
        assert!(matches!(
            EmpiricalNullModel::new(vec![f64::NAN, f64::INFINITY]),
            Err(DmrError::InputShape(_))
        ));
    }

    #[test]
    fn nan_score_stays_undefined() {
        let model = EmpiricalNullModel::new(vec![0.1, f64::NAN, 0.2]).unwrap();
        assert_eq!(model.len(), 2);
        assert!(model.p_value(f64::NAN).is_nan());
    }
}
