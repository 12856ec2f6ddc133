//! This module defines data structures for representing genomic coordinates.
//!
//! - [`GenomicInterval`]: a half-open `[start, end)` region on a named
//!   chromosome. Intervals order lexicographically by chromosome name and
//!   then by start.

mod interval;

pub use interval::GenomicInterval;

#[cfg(test)]
mod tests;
