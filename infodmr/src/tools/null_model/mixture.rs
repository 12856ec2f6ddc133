use argmin::core::{
    ArgminError,
    CostFunction,
    Error,
    Executor,
    IterState,
    Problem,
    Solver,
    State,
    TerminationReason,
    TerminationStatus,
    KV,
};
use itertools::Itertools;
use log::{
    debug,
    warn,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::error::{
    DmrError,
    DmrResult,
};
use crate::utils::{
    ln_normal_pdf,
    log_sum_exp,
    logit,
    n_distinct_finite,
};
use crate::with_field_fn;

/// One component of a univariate Gaussian mixture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianComponent {
    pub weight: f64,
    pub mean:   f64,
    pub sd:     f64,
}

impl GaussianComponent {
    pub fn new(
        weight: f64,
        mean: f64,
        sd: f64,
    ) -> Self {
        Self { weight, mean, sd }
    }
}

pub type MixtureParams = [GaussianComponent; 2];

/// Settings of the two-component fit.
///
/// The objective is non-convex, so the starting guess decides which local
/// optimum is found. The defaults (means -2.0 and 0.0, both standard
/// deviations 0.5, equal weights) are the fixed seed values of the
/// procedure and should only be changed deliberately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixtureFitConfig {
    pub max_iters:    u64,
    /// Stop once the mean per-point log-likelihood changes by less than
    /// this between two iterations.
    pub tolerance:    f64,
    /// Added to every component variance in the M step.
    pub reg_var:      f64,
    pub init_means:   [f64; 2],
    pub init_sds:     [f64; 2],
    pub init_weights: [f64; 2],
}

impl Default for MixtureFitConfig {
    fn default() -> Self {
        Self {
            max_iters:    1000,
            tolerance:    1e-3,
            reg_var:      1e-6,
            init_means:   [-2.0, 0.0],
            init_sds:     [0.5, 0.5],
            init_weights: [0.5, 0.5],
        }
    }
}

impl MixtureFitConfig {
    with_field_fn!(max_iters, u64);
    with_field_fn!(tolerance, f64);
    with_field_fn!(reg_var, f64);
    with_field_fn!(init_means, [f64; 2]);
    with_field_fn!(init_sds, [f64; 2]);
    with_field_fn!(init_weights, [f64; 2]);

    pub fn initial_params(&self) -> MixtureParams {
        [0, 1].map(|k| {
            GaussianComponent::new(
                self.init_weights[k],
                self.init_means[k],
                self.init_sds[k],
            )
        })
    }

    fn check(&self) -> DmrResult<()> {
        let sds_ok = self.init_sds.iter().all(|sd| sd.is_finite() && *sd > 0.0);
        let weights_ok = self.init_weights.iter().all(|w| w.is_finite() && *w > 0.0);
        if !sds_ok || !weights_ok || !(self.tolerance >= 0.0) || !(self.reg_var >= 0.0) {
            return Err(DmrError::InvalidParameter(format!(
                "invalid mixture fit configuration: {:?}",
                self
            )));
        }
        Ok(())
    }
}

/// Outcome of the mixture fit in logit space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixtureFit {
    pub components:     MixtureParams,
    /// `false` when the iteration cap was hit before the likelihood settled.
    pub converged:      bool,
    pub iterations:     u64,
    /// Mean per-point log-likelihood of the returned parameters.
    pub log_likelihood: f64,
    pub n_points:       usize,
}

impl MixtureFit {
    /// Logit-space (mean, sd) of the null distribution.
    ///
    /// A converged fit uses the component with the smaller mean as a whole.
    /// An unconverged fit takes the larger mean and, independently, the
    /// larger standard deviation of the two components, which widens the
    /// null when the fit cannot be trusted.
    pub fn null_params(&self) -> (f64, f64) {
        let [a, b] = self.components;
        if self.converged {
            let null = if b.mean < a.mean { b } else { a };
            (null.mean, null.sd)
        }
        else {
            (a.mean.max(b.mean), a.sd.max(b.sd))
        }
    }
}

/// Logit-transformed data of a two-component Gaussian mixture.
#[derive(Debug, Clone)]
pub struct GaussianMixtureProblem {
    data:    Vec<f64>,
    reg_var: f64,
}

impl GaussianMixtureProblem {
    pub fn new(
        data: Vec<f64>,
        reg_var: f64,
    ) -> Self {
        Self { data, reg_var }
    }

    pub fn n_points(&self) -> usize {
        self.data.len()
    }

    fn ln_joint(
        x: f64,
        params: &MixtureParams,
    ) -> (f64, f64) {
        let [a, b] = params;
        (
            a.weight.ln() + ln_normal_pdf(x, a.mean, a.sd),
            b.weight.ln() + ln_normal_pdf(x, b.mean, b.sd),
        )
    }

    /// Mean per-point log-likelihood.
    pub fn log_likelihood(
        &self,
        params: &MixtureParams,
    ) -> f64 {
        let total: f64 = self
            .data
            .iter()
            .map(|&x| {
                let (la, lb) = Self::ln_joint(x, params);
                log_sum_exp(la, lb)
            })
            .sum();
        total / self.data.len() as f64
    }

    /// One expectation-maximisation update.
    pub fn em_step(
        &self,
        params: &MixtureParams,
    ) -> MixtureParams {
        let n = self.data.len() as f64;
        let responsibilities = self
            .data
            .iter()
            .map(|&x| {
                let (la, lb) = Self::ln_joint(x, params);
                (la - log_sum_exp(la, lb)).exp()
            })
            .collect_vec();

        let mut updated = *params;
        for (k, component) in updated.iter_mut().enumerate() {
            let resp = |r: f64| if k == 0 { r } else { 1.0 - r };
            let nk: f64 = responsibilities.iter().map(|&r| resp(r)).sum();
            component.weight = nk / n;
            // A collapsed component keeps its location and spread.
            if nk <= f64::EPSILON * n {
                continue;
            }
            let mean = self
                .data
                .iter()
                .zip(&responsibilities)
                .map(|(&x, &r)| resp(r) * x)
                .sum::<f64>()
                / nk;
            let var = self
                .data
                .iter()
                .zip(&responsibilities)
                .map(|(&x, &r)| resp(r) * (x - mean).powi(2))
                .sum::<f64>()
                / nk
                + self.reg_var;
            component.mean = mean;
            component.sd = var.sqrt();
        }
        updated
    }
}

impl CostFunction for GaussianMixtureProblem {
    type Param = MixtureParams;
    type Output = f64;

    fn cost(
        &self,
        params: &Self::Param,
    ) -> Result<Self::Output, Error> {
        Ok(-self.log_likelihood(params))
    }
}

type EmState = IterState<MixtureParams, (), (), (), (), f64>;

/// Expectation-maximisation as an argmin solver.
///
/// The cost is the negative mean log-likelihood; the solver reports
/// convergence once it changes by less than `tolerance` between two
/// iterations. Hitting the executor's iteration cap instead leaves the
/// termination reason at `MaxItersReached`.
#[derive(Debug, Clone, Copy)]
pub struct ExpectationMaximization {
    tolerance: f64,
}

impl ExpectationMaximization {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl Solver<GaussianMixtureProblem, EmState> for ExpectationMaximization {
    const NAME: &'static str = "ExpectationMaximization";

    fn init(
        &mut self,
        problem: &mut Problem<GaussianMixtureProblem>,
        mut state: EmState,
    ) -> Result<(EmState, Option<KV>), Error> {
        let params = state.take_param().ok_or_else(|| ArgminError::NotInitialized {
            text: "EM requires initial mixture parameters".to_string(),
        })?;
        let cost = problem.cost(&params)?;
        Ok((state.param(params).cost(cost), None))
    }

    fn next_iter(
        &mut self,
        problem: &mut Problem<GaussianMixtureProblem>,
        mut state: EmState,
    ) -> Result<(EmState, Option<KV>), Error> {
        let params = state.take_param().ok_or_else(|| ArgminError::NotInitialized {
            text: "EM requires initial mixture parameters".to_string(),
        })?;
        let updated = problem.problem("em_step_count", |p| Ok(p.em_step(&params)))?;
        let cost = problem.cost(&updated)?;
        Ok((state.param(updated).cost(cost), None))
    }

    fn terminate(
        &mut self,
        state: &EmState,
    ) -> TerminationStatus {
        if (state.get_prev_cost() - state.get_cost()).abs() < self.tolerance {
            TerminationStatus::Terminated(TerminationReason::SolverConverged)
        }
        else {
            TerminationStatus::NotTerminated
        }
    }
}

/// Fits a two-component Gaussian mixture to `data` (already on the logit
/// scale).
pub fn fit_mixture(
    data: Vec<f64>,
    config: &MixtureFitConfig,
) -> DmrResult<MixtureFit> {
    config.check()?;
    let data = data.into_iter().filter(|x| x.is_finite()).collect_vec();
    let n_distinct = n_distinct_finite(&data);
    if n_distinct < 2 {
        return Err(DmrError::FitFailure(format!(
            "{} usable points with {} distinct values, at least 2 distinct values are required",
            data.len(),
            n_distinct
        )));
    }

    let n_points = data.len();
    let problem = GaussianMixtureProblem::new(data, config.reg_var);
    let solver = ExpectationMaximization::new(config.tolerance);
    let init = config.initial_params();

    let result = Executor::new(problem, solver)
        .configure(|state| state.param(init).max_iters(config.max_iters))
        .run()
        .map_err(|e| DmrError::Optimizer(e.to_string()))?;

    let state = result.state();
    let converged = matches!(
        state.get_termination_reason(),
        Some(TerminationReason::SolverConverged)
    );
    let components = *state
        .get_best_param()
        .or(state.get_param())
        .ok_or_else(|| DmrError::Optimizer("EM returned no parameters".to_string()))?;
    let fit = MixtureFit {
        components,
        converged,
        iterations: state.get_iter(),
        log_likelihood: -state.get_best_cost(),
        n_points,
    };

    if fit.converged {
        debug!("Mixture fit converged: {:?}", fit);
    }
    else {
        warn!(
            "Mixture fit did not converge after {} iterations, widening the null \
             component",
            fit.iterations
        );
    }
    Ok(fit)
}

/// Fits the mixture to scores in the unit interval. Scores at or beyond
/// the boundary (`<= 0` or `>= 1`) never enter the fit.
pub fn fit_logit_mixture(
    scores: &[f64],
    config: &MixtureFitConfig,
) -> DmrResult<MixtureFit> {
    let data = scores
        .iter()
        .copied()
        .filter(|x| *x > 0.0 && *x < 1.0)
        .map(logit)
        .collect_vec();
    fit_mixture(data, config)
}
