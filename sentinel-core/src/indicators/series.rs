//! Series helpers shared by the indicators.
//!
//! All helpers return a series of the input length. Undefined positions are
//! `f64::NAN`; a division by zero is undefined, never ±∞.

/// `a / b`, undefined when `b` is zero or either side is not finite.
pub fn safe_div(a: f64, b: f64) -> f64 {
    if !a.is_finite() || !b.is_finite() || b == 0.0 {
        return f64::NAN;
    }
    a / b
}

/// Element-wise `a / b`.
pub fn ratio(a: &[f64], b: &[f64]) -> Vec<f64> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(&x, &y)| safe_div(x, y)).collect()
}

/// Percent change vs the previous position, ×100. The first position is undefined.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    for i in 1..values.len() {
        let prev = values[i - 1];
        out[i] = safe_div(values[i] - prev, prev) * 100.0;
    }
    out
}

/// Trailing mean over `window` positions.
///
/// The first valid value is at index `window - 1`; any undefined value inside
/// a window makes that window undefined.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    assert!(window >= 1, "rolling window must be >= 1");
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if n < window {
        return out;
    }

    let mut sum = 0.0;
    let mut undefined = 0usize;
    for (i, &entering) in values.iter().enumerate() {
        if entering.is_finite() {
            sum += entering;
        } else {
            undefined += 1;
        }

        if i >= window {
            let leaving = values[i - window];
            if leaving.is_finite() {
                sum -= leaving;
            } else {
                undefined -= 1;
            }
        }

        if i + 1 >= window && undefined == 0 {
            out[i] = sum / window as f64;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn safe_div_zero_is_undefined() {
        assert!(safe_div(1.0, 0.0).is_nan());
        assert!(safe_div(f64::NAN, 2.0).is_nan());
        assert_approx(safe_div(3.0, 2.0), 1.5, DEFAULT_EPSILON);
    }

    #[test]
    fn pct_change_basic() {
        let out = pct_change(&[100.0, 110.0, 99.0]);
        assert!(out[0].is_nan());
        assert_approx(out[1], 10.0, 1e-9);
        assert_approx(out[2], -10.0, 1e-9);
    }

    #[test]
    fn pct_change_from_zero_is_undefined() {
        let out = pct_change(&[0.0, 5.0, 10.0]);
        assert!(out[1].is_nan());
        assert_approx(out[2], 100.0, 1e-9);
    }

    #[test]
    fn rolling_mean_basic() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert_approx(out[2], 2.0, DEFAULT_EPSILON);
        assert_approx(out[3], 3.0, DEFAULT_EPSILON);
        assert_approx(out[4], 4.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_mean_nan_in_window() {
        let out = rolling_mean(&[1.0, f64::NAN, 3.0, 4.0, 5.0], 2);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert_approx(out[3], 3.5, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_mean_too_short() {
        assert!(rolling_mean(&[1.0, 2.0], 5).iter().all(|v| v.is_nan()));
    }
}
