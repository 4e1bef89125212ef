//! Trapezoidal area under a yearly series.

use serde::{Deserialize, Serialize};

/// Cumulative-burden summary of one yearly series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AucSummary {
    /// Σ (y_i + y_{i+1}) / 2 × (year_{i+1} − year_i).
    pub auc_raw: f64,
    /// `auc_raw / span_years`.
    pub auc_normalized: f64,
    /// `max(1, last_year − first_year)`.
    pub span_years: i32,
}

/// Integrate `(year, value)` points with the trapezoidal rule.
///
/// Points are sorted by year first. A single point reports its own value as
/// both the raw and normalized area over a span of one year. Returns `None`
/// for an empty series.
///
/// # Example
///
/// ```
/// use lifedash::stats::trapezoid_auc;
///
/// let auc = trapezoid_auc(&[(2001, 50.0), (2019, 70.0)]).unwrap();
/// assert_eq!(auc.auc_raw, 1080.0);
/// assert_eq!(auc.auc_normalized, 60.0);
/// assert_eq!(auc.span_years, 18);
/// ```
#[must_use]
pub fn trapezoid_auc(points: &[(i32, f64)]) -> Option<AucSummary> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|(year, _)| *year);

    match sorted.as_slice() {
        [] => None,
        [(_, value)] => Some(AucSummary {
            auc_raw: *value,
            auc_normalized: *value,
            span_years: 1,
        }),
        [(first, _), .., (last, _)] => {
            let auc_raw: f64 = sorted
                .windows(2)
                .map(|pair| {
                    let (x0, y0) = pair[0];
                    let (x1, y1) = pair[1];
                    (y0 + y1) / 2.0 * f64::from(x1 - x0)
                })
                .sum();
            let span_years = (last - first).max(1);
            Some(AucSummary {
                auc_raw,
                auc_normalized: auc_raw / f64::from(span_years),
                span_years,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_point_series() {
        let auc = trapezoid_auc(&[(2019, 70.0), (2001, 50.0)]).unwrap();
        assert!((auc.auc_raw - 1080.0).abs() < 1e-9);
        assert!((auc.auc_normalized - 60.0).abs() < 1e-9);
        assert_eq!(auc.span_years, 18);
    }

    #[test]
    fn test_single_year_fallback() {
        let auc = trapezoid_auc(&[(2010, 64.5)]).unwrap();
        assert_eq!(auc.auc_raw, 64.5);
        assert_eq!(auc.auc_normalized, 64.5);
        assert_eq!(auc.span_years, 1);
    }

    #[test]
    fn test_uneven_spacing() {
        // 1 year at mean 61, then 3 years at mean 63.
        let auc = trapezoid_auc(&[(2000, 60.0), (2001, 62.0), (2004, 64.0)]).unwrap();
        assert!((auc.auc_raw - (61.0 + 3.0 * 63.0)).abs() < 1e-9);
        assert!((auc.auc_normalized - 250.0 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_series() {
        assert!(trapezoid_auc(&[]).is_none());
    }
}
