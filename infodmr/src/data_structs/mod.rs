//! This module contains the core data structures used throughout the
//! `infodmr` crate.
//!
//! - [`coords`]: [`GenomicInterval`], a half-open region on a chromosome.
//! - [`IntervalSignal`]: ordered per-chromosome (interval, value) records,
//!   stored column-wise in [`ChromSignal`] partitions. Every pipeline stage
//!   consumes one and produces a new one.
//! - [`WeightedCoverage`]: run-length encoded per-base coverage built from a
//!   signal's values, used to aggregate score mass over regions.
//! - [`DmrRecord`]: the final output artifact.
//! - [`typedef`]: type aliases for positions, scores and chromosome names.

pub mod coords;
mod coverage;
mod dmr;
mod signal;
pub mod typedef;

pub use coords::GenomicInterval;
pub use coverage::{
    CoverageRun,
    WeightedCoverage,
};
pub use dmr::DmrRecord;
pub use signal::{
    ChromSignal,
    IntervalSignal,
    SignalRecord,
};
