//! Null distributions of "no real signal" scores.
//!
//! Two estimators are available:
//!
//! - [`EmpiricalNullModel`]: the empirical distribution of smoothed scores
//!   pooled from reference-vs-reference comparisons;
//! - [`MixtureNullModel`]: the lower component of a two-component Gaussian
//!   mixture fitted to the logit of the test scores themselves, used when no
//!   replicates exist.
//!
//! Both map a score to a p-value in `[f64::EPSILON, 1]` through [`PValue`];
//! [`NullModel`] is the tagged union the pipeline passes around.

mod empirical;
mod mixture;

pub use empirical::EmpiricalNullModel;
use itertools::Itertools;
use log::info;
pub use mixture::{
    fit_logit_mixture,
    fit_mixture,
    ExpectationMaximization,
    GaussianComponent,
    GaussianMixtureProblem,
    MixtureFit,
    MixtureFitConfig,
    MixtureParams,
};
use statrs::distribution::{
    ContinuousCDF,
    Normal,
};

use crate::data_structs::IntervalSignal;
use crate::error::{
    DmrError,
    DmrResult,
};
use crate::utils::{
    clamp_pvalue,
    logit,
    MIN_PVALUE,
};

/// Score to p-value mapping of a null model.
pub trait PValue {
    /// Probability of a null score at least as large as `x`. NaN scores
    /// give NaN.
    fn p_value(
        &self,
        x: f64,
    ) -> f64;
}

/// Logit-normal null selected from a [`MixtureFit`].
#[derive(Debug, Clone)]
pub struct MixtureNullModel {
    mean:   f64,
    sd:     f64,
    normal: Normal,
    fit:    MixtureFit,
}

impl MixtureNullModel {
    pub fn from_fit(fit: MixtureFit) -> DmrResult<Self> {
        let (mean, sd) = fit.null_params();
        let normal = Normal::new(mean, sd).map_err(|e| {
            DmrError::FitFailure(format!(
                "null component (mean {}, sd {}) is not a valid normal: {}",
                mean, sd, e
            ))
        })?;
        Ok(Self {
            mean,
            sd,
            normal,
            fit,
        })
    }

    /// Logit-space mean of the null component.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn sd(&self) -> f64 {
        self.sd
    }

    pub fn fit(&self) -> &MixtureFit {
        &self.fit
    }

    /// Batch p-values. Scores `>= 1` take the smallest p-value of the
    /// interior scores of the same batch, or [`MIN_PVALUE`] when the batch
    /// has none; scores `<= 0` get 1.
    pub fn p_values(
        &self,
        scores: &[f64],
    ) -> Vec<f64> {
        let interior_min = scores
            .iter()
            .filter(|x| **x > 0.0 && **x < 1.0)
            .map(|x| self.p_value(*x))
            .min_by(f64::total_cmp)
            .unwrap_or(MIN_PVALUE);

        scores
            .iter()
            .map(|&x| {
                if x.is_nan() {
                    f64::NAN
                }
                else if x >= 1.0 {
                    interior_min
                }
                else {
                    self.p_value(x)
                }
            })
            .collect_vec()
    }
}

impl PValue for MixtureNullModel {
    fn p_value(
        &self,
        x: f64,
    ) -> f64 {
        if x.is_nan() {
            f64::NAN
        }
        else if x >= 1.0 {
            MIN_PVALUE
        }
        else if x <= 0.0 {
            1.0
        }
        else {
            clamp_pvalue(self.normal.sf(logit(x)))
        }
    }
}

#[derive(Debug, Clone)]
pub enum NullModel {
    Empirical(EmpiricalNullModel),
    Mixture(MixtureNullModel),
}

impl NullModel {
    /// Empirical null from already smoothed reference scores.
    pub fn from_replicate_pool(null_scores: Vec<f64>) -> DmrResult<Self> {
        EmpiricalNullModel::new(null_scores).map(Self::Empirical)
    }

    /// Empirical null pooling every record of the given smoothed
    /// reference-vs-reference signals.
    pub fn from_replicate_signals(signals: &[IntervalSignal]) -> DmrResult<Self> {
        let pool = signals
            .iter()
            .flat_map(IntervalSignal::values)
            .collect_vec();
        info!(
            "Pooling {} null scores from {} replicate comparisons",
            pool.len(),
            signals.len()
        );
        Self::from_replicate_pool(pool)
    }

    /// Mixture null with the default fit settings.
    pub fn from_mixture_fit(scores: &[f64]) -> DmrResult<Self> {
        Self::from_mixture_fit_with(scores, &MixtureFitConfig::default())
    }

    pub fn from_mixture_fit_with(
        scores: &[f64],
        config: &MixtureFitConfig,
    ) -> DmrResult<Self> {
        let fit = fit_logit_mixture(scores, config)?;
        let model = MixtureNullModel::from_fit(fit)?;
        info!(
            "Mixture null: logit mean {:.4}, sd {:.4} ({} points, converged: {})",
            model.mean(),
            model.sd(),
            model.fit().n_points,
            model.fit().converged
        );
        Ok(Self::Mixture(model))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NullModel::Empirical(_) => "empirical",
            NullModel::Mixture(_) => "mixture",
        }
    }

    /// P-values of a whole batch of scores, applying the boundary policy of
    /// the mixture model.
    pub fn p_values(
        &self,
        scores: &[f64],
    ) -> Vec<f64> {
        match self {
            NullModel::Empirical(model) => scores.iter().map(|x| model.p_value(*x)).collect(),
            NullModel::Mixture(model) => model.p_values(scores),
        }
    }
}

impl PValue for NullModel {
    fn p_value(
        &self,
        x: f64,
    ) -> f64 {
        match self {
            NullModel::Empirical(model) => model.p_value(x),
            NullModel::Mixture(model) => model.p_value(x),
        }
    }
}
