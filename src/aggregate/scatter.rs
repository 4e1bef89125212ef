//! Scatter points and per-income-group regression lines.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::{IncomeGroup, Record, YearKey};
use crate::stats::{RSquared, fit_linear};

/// One plotted country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    /// Country name.
    pub country: String,
    /// Country code.
    pub country_code: String,
    /// CO₂ emissions (mean across years in all-years mode).
    pub co2: f64,
    /// Life expectancy (mean across years in all-years mode).
    pub life_expectancy: f64,
    /// Income group.
    pub income_group: IncomeGroup,
}

/// Fitted life expectancy against ln(CO₂) for one income group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionLine {
    /// Income group.
    pub group: IncomeGroup,
    /// Years of life per unit of ln(CO₂).
    pub slope: f64,
    /// Intercept.
    pub intercept: f64,
    /// Coefficient of determination.
    pub r2: RSquared,
    /// Points used in the fit.
    pub sample_count: usize,
}

/// Regression result for one income group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegressionOutcome {
    /// A line was fitted.
    Fitted(RegressionLine),
    /// Too few points for a line.
    InsufficientSample {
        /// Income group.
        group: IncomeGroup,
        /// Usable points found.
        points: usize,
    },
    /// Every point has the same CO₂, so no slope exists.
    Degenerate {
        /// Income group.
        group: IncomeGroup,
        /// Usable points found.
        points: usize,
    },
}

impl RegressionOutcome {
    /// Income group the outcome belongs to.
    #[must_use]
    pub fn group(&self) -> IncomeGroup {
        match self {
            Self::Fitted(line) => line.group,
            Self::InsufficientSample { group, .. } | Self::Degenerate { group, .. } => *group,
        }
    }

    /// The fitted line, if any.
    #[must_use]
    pub fn line(&self) -> Option<&RegressionLine> {
        match self {
            Self::Fitted(line) => Some(line),
            _ => None,
        }
    }
}

/// Build scatter points from filtered rows.
///
/// For a concrete year each row with positive CO₂ and a life expectancy is a
/// point; for all years each country contributes the mean of those rows.
/// Output is ordered by country code.
#[must_use]
pub fn scatter_points(rows: &[&Record], selection: YearKey) -> Vec<ScatterPoint> {
    let usable = rows.iter().filter_map(|r| {
        let co2 = r.co2.filter(|c| *c > 0.0)?;
        Some((*r, co2, r.life_expectancy?))
    });

    let mut points: Vec<ScatterPoint> = match selection {
        YearKey::Year(_) => usable
            .map(|(r, co2, life)| ScatterPoint {
                country: r.country.clone(),
                country_code: r.country_code.clone(),
                co2,
                life_expectancy: life,
                income_group: r.income_group,
            })
            .collect(),
        YearKey::All => {
            let mut by_country: BTreeMap<&str, (&Record, f64, f64, usize)> = BTreeMap::new();
            for (r, co2, life) in usable {
                let entry = by_country.entry(r.country_code.as_str()).or_insert((r, 0.0, 0.0, 0));
                entry.1 += co2;
                entry.2 += life;
                entry.3 += 1;
            }
            by_country
                .into_values()
                .map(|(r, co2_sum, life_sum, n)| ScatterPoint {
                    country: r.country.clone(),
                    country_code: r.country_code.clone(),
                    co2: co2_sum / n as f64,
                    life_expectancy: life_sum / n as f64,
                    income_group: r.income_group,
                })
                .collect()
        }
    };

    points.sort_by(|a, b| a.country_code.cmp(&b.country_code));
    points
}

/// Fit one line per income group present among the points.
///
/// Groups with fewer than `min_points` usable points report
/// [`RegressionOutcome::InsufficientSample`] instead of a line.
#[must_use]
pub fn regressions(points: &[ScatterPoint], min_points: usize) -> Vec<RegressionOutcome> {
    let mut by_group: BTreeMap<IncomeGroup, Vec<(f64, f64)>> = BTreeMap::new();
    for point in points {
        let xy = by_group.entry(point.income_group).or_default();
        if point.co2 > 0.0 && point.life_expectancy.is_finite() {
            xy.push((point.co2.ln(), point.life_expectancy));
        }
    }

    by_group
        .into_iter()
        .map(|(group, xy)| {
            if xy.len() < min_points {
                return RegressionOutcome::InsufficientSample {
                    group,
                    points: xy.len(),
                };
            }
            match fit_linear(&xy) {
                Some(fit) => RegressionOutcome::Fitted(RegressionLine {
                    group,
                    slope: fit.slope,
                    intercept: fit.intercept,
                    r2: fit.r2,
                    sample_count: fit.n,
                }),
                None => RegressionOutcome::Degenerate {
                    group,
                    points: xy.len(),
                },
            }
        })
        .collect()
}
