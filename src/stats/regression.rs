//! Ordinary least squares with a coefficient of determination.

use serde::{Deserialize, Serialize};

/// Coefficient of determination of a fit.
///
/// `Undefined` when the response has zero variance, where 1 − SS_res/SS_tot
/// has no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RSquared {
    /// A finite R² value.
    Value(f64),
    /// Constant response.
    Undefined,
}

impl RSquared {
    /// The numeric value, if defined.
    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Undefined => None,
        }
    }
}

impl std::fmt::Display for RSquared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v:.2}"),
            Self::Undefined => f.write_str("undefined"),
        }
    }
}

/// A fitted line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    /// Slope.
    pub slope: f64,
    /// Intercept.
    pub intercept: f64,
    /// Goodness of fit.
    pub r2: RSquared,
    /// Number of points used.
    pub n: usize,
}

impl LinearFit {
    /// Evaluate the line at `x`.
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit `y` on `x` from closed-form sums.
///
/// slope = (nΣxy − ΣxΣy) / (nΣx² − (Σx)²), intercept = (Σy − slope·Σx) / n.
///
/// Returns `None` when there are no points or all `x` are equal, since the
/// slope denominator vanishes.
#[must_use]
pub fn fit_linear(points: &[(f64, f64)]) -> Option<LinearFit> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (mut sx, mut sy, mut sxy, mut sxx) = (0.0, 0.0, 0.0, 0.0);
    for (x, y) in points {
        sx += x;
        sy += y;
        sxy += x * y;
        sxx += x * x;
    }

    let denom = n * sxx - sx * sx;
    if denom.abs() <= f64::EPSILON * n * sxx.abs().max(1.0) {
        return None;
    }
    let slope = (n * sxy - sx * sy) / denom;
    let intercept = (sy - slope * sx) / n;

    let y_mean = sy / n;
    let (mut ss_tot, mut ss_res) = (0.0, 0.0);
    for (x, y) in points {
        ss_tot += (y - y_mean).powi(2);
        ss_res += (y - (slope * x + intercept)).powi(2);
    }

    let r2 = if ss_tot == 0.0 {
        RSquared::Undefined
    } else {
        RSquared::Value(1.0 - ss_res / ss_tot)
    };

    Some(LinearFit {
        slope,
        intercept,
        r2,
        n: points.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_log_linear_relation() {
        let points: Vec<(f64, f64)> = [10.0, 100.0, 1_000.0, 5_000.0, 20_000.0, 90_000.0]
            .iter()
            .map(|co2: &f64| {
                let x = co2.ln();
                (x, 5.0 * x + 10.0)
            })
            .collect();

        let fit = fit_linear(&points).unwrap();
        assert!((fit.slope - 5.0).abs() < 1e-9);
        assert!((fit.intercept - 10.0).abs() < 1e-9);
        assert!((fit.r2.value().unwrap() - 1.0).abs() < 1e-9);
        assert!((fit.predict(0.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_response_has_undefined_r2() {
        let points = [(1.0, 70.0), (2.0, 70.0), (3.0, 70.0), (4.0, 70.0), (5.0, 70.0)];
        let fit = fit_linear(&points).unwrap();
        assert_eq!(fit.r2, RSquared::Undefined);
        assert_eq!(fit.r2.to_string(), "undefined");
        assert!(fit.slope.abs() < 1e-12);
    }

    #[test]
    fn test_vertical_data_has_no_fit() {
        let points = [(2.0, 60.0), (2.0, 70.0), (2.0, 80.0)];
        assert!(fit_linear(&points).is_none());
        assert!(fit_linear(&[]).is_none());
    }

    #[test]
    fn test_noisy_r2_between_zero_and_one() {
        let points = [(1.0, 1.0), (2.0, 3.0), (3.0, 2.0), (4.0, 5.0), (5.0, 4.0)];
        let r2 = fit_linear(&points).unwrap().r2.value().unwrap();
        assert!(r2 > 0.0 && r2 < 1.0);
        assert_eq!(RSquared::Value(r2).to_string(), format!("{r2:.2}"));
    }
}
