use std::f64::consts::PI;

use log::warn;

/// Smallest p-value reported anywhere in the crate.
pub const MIN_PVALUE: f64 = f64::EPSILON;

/// Logit transform `ln(x / (1 - x))`.
///
/// Only meaningful on the open interval (0, 1); boundary values map to
/// infinities and callers are expected to exclude them beforehand.
#[inline]
pub fn logit(x: f64) -> f64 {
    (x / (1.0 - x)).ln()
}

/// Inverse of [`logit`].
#[inline]
pub fn expit(y: f64) -> f64 {
    1.0 / (1.0 + (-y).exp())
}

/// Natural log of the normal density at `x`.
#[inline]
pub fn ln_normal_pdf(
    x: f64,
    mean: f64,
    sd: f64,
) -> f64 {
    let z = (x - mean) / sd;
    -0.5 * z * z - sd.ln() - 0.5 * (2.0 * PI).ln()
}

/// Numerically stable `ln(exp(a) + exp(b))`.
#[inline]
pub fn log_sum_exp(
    a: f64,
    b: f64,
) -> f64 {
    let max = a.max(b);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    max + ((a - max).exp() + (b - max).exp()).ln()
}

/// Floors a p-value at [`MIN_PVALUE`] and caps it at 1.
#[inline]
pub fn clamp_pvalue(p: f64) -> f64 {
    p.clamp(MIN_PVALUE, 1.0)
}

/// Counts distinct finite values, treating values within `f64::EPSILON` of
/// each other as equal. Input does not need to be sorted.
pub fn n_distinct_finite(values: &[f64]) -> usize {
    let mut finite = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect::<Vec<_>>();
    if finite.len() != values.len() {
        warn!(
            "Ignoring {} non-finite values",
            values.len() - finite.len()
        );
    }
    finite.sort_by(f64::total_cmp);
    finite.dedup_by(|a, b| (*a - *b).abs() <= f64::EPSILON);
    finite.len()
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    #[test]
    fn logit_inverts() {
        for x in [0.01, 0.25, 0.5, 0.9, 0.999] {
            assert_approx_eq!(expit(logit(x)), x, 1e-12);
        }
        assert_eq!(logit(0.5), 0.0);
    }

    #[test]
    fn normal_pdf_peak() {
        let expected = -0.5 * (2.0 * PI).ln();
        assert_approx_eq!(ln_normal_pdf(0.0, 0.0, 1.0), expected, 1e-12);
        assert!(ln_normal_pdf(3.0, 0.0, 1.0) < ln_normal_pdf(1.0, 0.0, 1.0));
    }

    #[test]
    fn log_sum_exp_matches_naive() {
        let naive = (1.5f64.exp() + (-0.5f64).exp()).ln();
        assert_approx_eq!(log_sum_exp(1.5, -0.5), naive, 1e-12);
        assert_eq!(
            log_sum_exp(f64::NEG_INFINITY, f64::NEG_INFINITY),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn distinct_values() {
        assert_eq!(n_distinct_finite(&[1.0, 1.0, 2.0, f64::NAN]), 2);
        assert_eq!(n_distinct_finite(&[0.3; 10]), 1);
        assert_eq!(n_distinct_finite(&[]), 0);
    }

    #[test]
    fn pvalue_clamping() {
        assert_eq!(clamp_pvalue(0.0), MIN_PVALUE);
        assert_eq!(clamp_pvalue(1.5), 1.0);
        assert_eq!(clamp_pvalue(0.2), 0.2);
    }
}
