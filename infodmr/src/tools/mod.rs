//! Statistical stages of DMR calling.
//!
//! - [`smooth`]: Gaussian kernel smoothing along genomic coordinates.
//! - [`null_model`]: empirical and mixture-based null distributions.
//! - [`significance`]: p-values to capped `-10 log10(p)` scores.
//! - [`threshold`]: thresholding, morphological closing and aggregation of
//!   the surviving regions.
//! - [`pipeline`]: the configured chain of all of the above.
pub mod null_model;
pub mod pipeline;
pub mod significance;
pub mod smooth;
pub mod threshold;
