//! Per-income-group cumulative burden bars.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{YearMode, accumulate};
use crate::dataset::{IncomeGroup, Record, YearKey};
use crate::stats::trapezoid_auc;

/// Area under one income group's yearly mean life expectancy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AucBar {
    /// Income group.
    pub group: IncomeGroup,
    /// Trapezoidal area.
    pub auc_raw: f64,
    /// Area divided by the span in years.
    pub auc_normalized: f64,
    /// `max(1, last_year - first_year)`.
    pub span_years: i32,
    /// Rows that contributed a life expectancy value.
    pub sample_count: usize,
}

/// Build one bar per income group from rows with year at most `through`
/// (every year when `None`).
///
/// Bars are sorted by normalized area, largest first, then by group.
#[must_use]
pub fn auc_bars(rows: &[&Record], through: Option<i32>) -> Vec<AucBar> {
    let buckets = accumulate(rows, |r| r.income_group, YearMode::Cumulative(through));

    let mut series: BTreeMap<IncomeGroup, (Vec<(i32, f64)>, usize)> = BTreeMap::new();
    for ((group, year), acc) in buckets {
        let (YearKey::Year(year), Some(mean)) = (year, acc.mean_life()) else {
            continue;
        };
        let entry = series.entry(group).or_default();
        entry.0.push((year, mean));
        entry.1 += acc.count();
    }

    let mut bars: Vec<AucBar> = series
        .into_iter()
        .filter_map(|(group, (points, sample_count))| {
            let auc = trapezoid_auc(&points)?;
            Some(AucBar {
                group,
                auc_raw: auc.auc_raw,
                auc_normalized: auc.auc_normalized,
                span_years: auc.span_years,
                sample_count,
            })
        })
        .collect();

    bars.sort_by(|a, b| {
        b.auc_normalized
            .total_cmp(&a.auc_normalized)
            .then(a.group.cmp(&b.group))
    });
    bars
}
