//! Error type shared by the statistical core.
//!
//! Only structural problems surface as errors. Arithmetic edge cases
//! (p-values below machine epsilon, infinite scores, logit of boundary
//! values) are clamped where they occur and never reach this type, and an
//! empty DMR set is a valid result rather than a failure.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmrError {
    /// Malformed or empty input signal.
    #[error("Invalid input signal: {0}")]
    InputShape(String),
    /// The mixture model could not be estimated from the supplied scores.
    #[error("Mixture fit failed: {0}")]
    FitFailure(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Optimizer error: {0}")]
    Optimizer(String),
}

pub type DmrResult<T> = Result<T, DmrError>;
