//! Statistics over simulation output
//!
//! Correlation is always computed on a single iteration's own price logs.
//! Summing logs across iterations before correlating them yields a number
//! with no statistical meaning, so no helper here accepts pooled logs.

use crate::error::StatsError;

/// Sample Pearson correlation coefficient of two equally long sequences.
///
/// A sequence with zero variance has no defined correlation; it is reported
/// as `0.0` so that flat price paths don't poison an average with NaN.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Result<f64, StatsError> {
    if x.len() != y.len() {
        return Err(StatsError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    let n = x.len();
    if n < 2 {
        return Err(StatsError::InsufficientData(n));
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    // the (n - 1) normalisation cancels between numerator and denominator
    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return Ok(0.0);
    }
    Ok((cov / denom).clamp(-1.0, 1.0))
}

/// Round to the nearest integer, halves towards positive infinity (`-2.5` gives `-2`)
#[must_use]
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Rounded percentage change from `initial` to `current`
#[must_use]
pub fn growth_pct(current: f64, initial: f64) -> f64 {
    round_half_up((current - initial) / initial * 100.0)
}

/// Rounded percentage gain of `value` over the money paid in
#[must_use]
pub fn yield_pct(value: f64, contributed: f64) -> Option<f64> {
    if contributed <= 0.0 {
        return None;
    }
    Some(growth_pct(value, contributed))
}

/// Average realized price of a stream of trades
#[must_use]
pub fn average_price(value: f64, units: f64) -> Option<f64> {
    if units > 0.0 { Some(value / units) } else { None }
}

/// Sample standard deviation, used by the return-generator tests and benches
#[must_use]
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_self_correlation_is_one() {
        let x = [1.0, 1.02, 0.99, 1.05, 1.01, 0.97];
        let r = pearson_correlation(&x, &x).unwrap();
        assert!((r - 1.0).abs() < EPS, "got {r}");
    }

    #[test]
    fn test_negated_correlation_is_minus_one() {
        let x = [1.0, 1.02, 0.99, 1.05, 1.01, 0.97];
        let neg: Vec<f64> = x.iter().map(|v| -v).collect();
        let r = pearson_correlation(&x, &neg).unwrap();
        assert!((r + 1.0).abs() < EPS, "got {r}");
    }

    #[test]
    fn test_known_value() {
        // classic textbook pair, r = 0.8
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        let r = pearson_correlation(&x, &y).unwrap();
        assert!((r - 0.8).abs() < 1e-9, "got {r}");
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let err = pearson_correlation(&[1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap_err();
        assert_eq!(err, StatsError::LengthMismatch { left: 3, right: 2 });
    }

    #[test]
    fn test_too_few_samples() {
        assert_eq!(
            pearson_correlation(&[1.0], &[2.0]),
            Err(StatsError::InsufficientData(1))
        );
    }

    #[test]
    fn test_flat_series_reports_zero() {
        let flat = [1.0; 10];
        let moving: Vec<f64> = (0..10).map(f64::from).collect();
        assert_eq!(pearson_correlation(&flat, &moving), Ok(0.0));
    }

    #[test]
    fn test_derived_percentages() {
        assert_eq!(growth_pct(1.234, 1.0), 23.0);
        assert_eq!(growth_pct(0.5, 1.0), -50.0);
        assert_eq!(yield_pct(4500.0, 4500.0), Some(0.0));
        assert_eq!(yield_pct(100.0, 0.0), None);
        assert_eq!(average_price(50.0, 25.0), Some(2.0));
        assert_eq!(average_price(50.0, 0.0), None);
    }

    #[test]
    fn test_halves_round_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
        assert_eq!(round_half_up(0.49), 0.0);
        assert_eq!(growth_pct(97.5, 100.0), -2.0);
    }

    #[test]
    fn test_sample_std_dev() {
        let sd = sample_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.138_089_935_299_395).abs() < 1e-9);
        assert_eq!(sample_std_dev(&[1.0]), None);
    }
}
