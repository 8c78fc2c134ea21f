//! Normal and chi-square helpers shared by the confidence intervals and
//! coefficient tests.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

use crate::error::{Result, SurvivalError};

/// significance level used when callers have no preference
pub const DEFAULT_ALPHA: f64 = 0.05;

/// alpha must lie strictly inside (0, 1)
pub fn validate_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(SurvivalError::invalid_argument(format!(
            "alpha must be in (0, 1), got {}",
            alpha
        )))
    }
}

/// two-sided critical value z such that P(|Z| > z) = alpha
pub fn critical_value(alpha: f64) -> Result<f64> {
    validate_alpha(alpha)?;
    Ok(Normal::standard().inverse_cdf(1.0 - alpha / 2.0))
}

/// two-sided p-value for a standard normal statistic
pub fn two_sided_p_value(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    2.0 * Normal::standard().sf(z.abs())
}

/// upper tail P(X > x) for X ~ chi-square(dof)
pub fn chi_square_sf(x: f64, dof: usize) -> Result<f64> {
    if dof == 0 {
        return Err(SurvivalError::invalid_argument("chi-square needs at least one degree of freedom"));
    }
    if x <= 0.0 {
        return Ok(1.0);
    }

    let dist = ChiSquared::new(dof as f64)
        .map_err(|e| SurvivalError::invalid_argument(format!("chi-square({}): {}", dof, e)))?;
    Ok(dist.sf(x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_critical_value() {
        assert_relative_eq!(critical_value(0.05).unwrap(), 1.959964, epsilon = 1e-6);
        assert_relative_eq!(critical_value(0.10).unwrap(), 1.644854, epsilon = 1e-6);
        assert!(critical_value(0.01).unwrap() > critical_value(0.05).unwrap());
    }

    #[test]
    fn test_invalid_alpha() {
        for alpha in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            assert!(validate_alpha(alpha).unwrap_err().is_invalid_argument());
        }
    }

    #[test]
    fn test_p_values() {
        assert_relative_eq!(two_sided_p_value(0.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(two_sided_p_value(1.959964), 0.05, epsilon = 1e-6);
        assert_relative_eq!(two_sided_p_value(-1.959964), 0.05, epsilon = 1e-6);
    }

    #[test]
    fn test_chi_square_sf() {
        assert_relative_eq!(chi_square_sf(3.841459, 1).unwrap(), 0.05, epsilon = 1e-6);
        assert_eq!(chi_square_sf(0.0, 2).unwrap(), 1.0);
        assert!(chi_square_sf(1.0, 0).is_err());
    }
}
