//! Gaussian kernel smoothing of an [`IntervalSignal`].
//!
//! Each chromosome is smoothed on its own. The smoothed value of a record is
//! the kernel-weighted mean of the values of all records whose start lies
//! within `truncate * bandwidth` of the record's start. The output keeps the
//! input intervals; records whose window carries no finite value are
//! dropped, so the output can be shorter than the input but never contains a
//! position the input did not have.

use log::{
    debug,
    info,
};

use crate::data_structs::typedef::ScoreType;
use crate::data_structs::{
    ChromSignal,
    IntervalSignal,
};
use crate::error::{
    DmrError,
    DmrResult,
};
use crate::with_field_fn;

pub const DEFAULT_BANDWIDTH: f64 = 50_000.0;
/// Kernel support in bandwidths. Weights beyond it are below `exp(-8)`.
pub const DEFAULT_TRUNCATE: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoother {
    pub bandwidth: f64,
    pub truncate:  f64,
}

impl Default for Smoother {
    fn default() -> Self {
        Self {
            bandwidth: DEFAULT_BANDWIDTH,
            truncate:  DEFAULT_TRUNCATE,
        }
    }
}

impl Smoother {
    with_field_fn!(bandwidth, f64);
    with_field_fn!(truncate, f64);

    pub fn new(bandwidth: f64) -> Self {
        Self {
            bandwidth,
            ..Default::default()
        }
    }

    fn check_params(&self) -> DmrResult<()> {
        if !(self.bandwidth.is_finite() && self.bandwidth > 0.0) {
            return Err(DmrError::InvalidParameter(format!(
                "smoothing bandwidth must be positive and finite, got {}",
                self.bandwidth
            )));
        }
        if !(self.truncate.is_finite() && self.truncate > 0.0) {
            return Err(DmrError::InvalidParameter(format!(
                "kernel truncation must be positive and finite, got {}",
                self.truncate
            )));
        }
        Ok(())
    }

    /// Smooths every chromosome of `signal` independently.
    ///
    /// The input must be canonical (sorted, non-overlapping); otherwise an
    /// input shape error is returned.
    pub fn smooth(
        &self,
        signal: &IntervalSignal,
    ) -> DmrResult<IntervalSignal> {
        self.check_params()?;

        let smoothed = signal.try_map_partitions(|chr, chrom| {
            chrom.validate(chr)?;
            let out = self.smooth_chrom(chrom);
            debug!(
                "Smoothed {}: {} of {} positions defined",
                chr,
                out.len(),
                chrom.len()
            );
            Ok(out)
        })?;
        info!(
            "Smoothed {} positions on {} chromosomes (bandwidth {})",
            smoothed.len(),
            smoothed.n_chr(),
            self.bandwidth
        );
        Ok(smoothed)
    }

    /// Smooths a single, start-sorted chromosome.
    pub fn smooth_chrom(
        &self,
        chrom: &ChromSignal,
    ) -> ChromSignal {
        let positions = chrom.starts();
        let values = chrom.values();
        let reach = self.truncate * self.bandwidth;
        let inv_two_var = 1.0 / (2.0 * self.bandwidth * self.bandwidth);

        let mut lo = 0usize;
        let mut hi = 0usize;

        let mut smoothed = Vec::with_capacity(chrom.len());
        for (i, (start, end, _)) in chrom.iter().enumerate() {
            let center = positions[i] as f64;
            while (center - positions[lo] as f64) > reach {
                lo += 1;
            }
            while hi < positions.len() && (positions[hi] as f64 - center) <= reach {
                hi += 1;
            }

            let (weight_sum, weighted) = (lo..hi)
                .filter(|&j| values[j].is_finite())
                .map(|j| {
                    let d = positions[j] as f64 - center;
                    let w = (-d * d * inv_two_var).exp();
                    (w, w * values[j])
                })
                .fold((0.0, 0.0), |(ws, acc), (w, wv)| (ws + w, acc + wv));

            if let Some(value) = kernel_mean(weight_sum, weighted) {
                smoothed.push((start, end, value));
            }
        }
        smoothed.into_iter().collect()
    }
}

#[inline]
fn kernel_mean(
    weight_sum: f64,
    weighted: f64,
) -> Option<ScoreType> {
    if weight_sum > 0.0 {
        let value = weighted / weight_sum;
        value.is_finite().then_some(value)
    }
    else {
        None
    }
}

/// Smooths `signal` with a Gaussian kernel of the given bandwidth.
pub fn smooth(
    signal: &IntervalSignal,
    bandwidth: f64,
) -> DmrResult<IntervalSignal> {
    Smoother::new(bandwidth).smooth(signal)
}
