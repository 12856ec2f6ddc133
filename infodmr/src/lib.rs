//! # infodmr
//!
//! `infodmr` calls differentially methylated regions (DMRs) from per-position
//! information-content signals. A sample is a sparse track of
//! `(chromosome, start, end, score)` records; the output is a list of
//! genomic intervals, each with an aggregated significance score.
//!
//! ## Pipeline
//!
//! 1. [`tools::smooth`]: Gaussian kernel smoothing along each chromosome.
//! 2. [`tools::null_model`]: a null distribution, either empirical (pooled
//!    reference-vs-reference comparisons) or the lower component of a
//!    two-component Gaussian mixture fitted in logit space.
//! 3. [`tools::significance`]: p-values to `-10 log10(p)` significance
//!    scores, capped at a ceiling.
//! 4. [`tools::threshold`]: thresholding, morphological closing and
//!    coverage-weighted aggregation into DMRs.
//!
//! [`tools::pipeline::DmrPipeline`] chains the stages with a single
//! [`tools::pipeline::PipelineConfig`].
//!
//! ## Usage
//!
//! ```no_run
//! use infodmr::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let test = read_signal_path("sample.bedgraph")?;
//!     let pipeline = PipelineConfig::default()
//!         .with_bandwidth(10_000.0)
//!         .finish();
//!     let output = pipeline.run_without_replicates(&test)?;
//!     for dmr in output.dmrs.iter() {
//!         println!("{}", dmr);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Per-chromosome work runs on a crate-wide Rayon pool whose size can be set
//! with the `INFODMR_NUM_THREADS` environment variable.

pub mod data_structs;
pub mod error;
pub mod io;
pub mod prelude;
pub mod utils;

#[cfg(feature = "tools")]
pub mod tools;
