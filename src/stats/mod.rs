//! Statistics behind the dashboard views.
//!
//! ## Core Statistics
//!
//! - [`Summary`]: Descriptive statistics (count, mean, median, spread)
//! - [`mean`], [`pearson`]: Basic statistical functions
//!
//! ## Derived Artifacts
//!
//! - [`regression`]: least-squares fit of life expectancy on ln(CO₂) with R²
//! - [`auc`]: trapezoidal cumulative integral of a yearly series

pub mod auc;
pub mod regression;

pub use auc::{AucSummary, trapezoid_auc};
pub use regression::{LinearFit, RSquared, fit_linear};

use serde::{Deserialize, Serialize};

/// Descriptive statistics for a set of measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of values.
    pub count: usize,
    /// Mean value.
    pub mean: f64,
    /// Median value.
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
}

impl Summary {
    /// Compute summary statistics for a slice of values.
    ///
    /// Returns `None` if the slice is empty.
    #[must_use]
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;

        let mid = count / 2;
        let median = if count % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Some(Self {
            count,
            mean,
            median,
            std_dev: variance.sqrt(),
            min: sorted[0],
            max: sorted[count - 1],
        })
    }
}

/// Arithmetic mean, or `None` for an empty input.
///
/// # Example
///
/// ```
/// use lifedash::stats::mean;
///
/// assert_eq!(mean([1.0, 2.0, 3.0]), Some(2.0));
/// assert_eq!(mean(std::iter::empty()), None);
/// ```
#[must_use]
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Pearson correlation coefficient of paired samples.
///
/// Returns `None` with fewer than two pairs or when either side has zero
/// variance.
#[must_use]
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let x_mean = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let y_mean = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut x_var, mut y_var) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - x_mean;
        let dy = y - y_mean;
        cov += dx * dy;
        x_var += dx * dx;
        y_var += dy * dy;
    }

    if x_var == 0.0 || y_var == 0.0 {
        return None;
    }
    Some(cov / (x_var.sqrt() * y_var.sqrt()))
}
