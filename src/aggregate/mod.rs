//! Temporal aggregation of filtered rows.
//!
//! Every function here is pure: it takes already-filtered rows and returns
//! fresh value objects. Groups without a single contributing row are left
//! out instead of being emitted with a NaN mean.

mod auc;
mod scatter;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use auc::{AucBar, auc_bars};
pub use scatter::{RegressionLine, RegressionOutcome, ScatterPoint, regressions, scatter_points};

use crate::dataset::{Record, YearKey};

/// Entity a series is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    /// One group per country code.
    Country,
    /// One group per income group.
    IncomeGroup,
    /// One group per region.
    Region,
}

impl GroupKey {
    fn label(self, record: &Record) -> String {
        match self {
            Self::Country => record.country_code.clone(),
            Self::IncomeGroup => record.income_group.label().to_string(),
            Self::Region => record.region.clone(),
        }
    }
}

/// How rows are bucketed in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearMode {
    /// One aggregate per group across every year.
    AllYears,
    /// One aggregate per group from rows of exactly this year.
    Exact(i32),
    /// One aggregate per group per year, for years up to the bound
    /// (every year when unbounded).
    Cumulative(Option<i32>),
}

impl YearMode {
    /// Pooled or exact mode for a selection.
    #[must_use]
    pub fn pooled(selection: YearKey) -> Self {
        match selection {
            YearKey::All => Self::AllYears,
            YearKey::Year(y) => Self::Exact(y),
        }
    }

    /// Per-year series up to a selection.
    #[must_use]
    pub fn cumulative(selection: YearKey) -> Self {
        Self::Cumulative(selection.year())
    }

    /// Bucket a row falls in, or `None` if the mode excludes it.
    fn bucket(self, year: i32) -> Option<YearKey> {
        match self {
            Self::AllYears => Some(YearKey::All),
            Self::Exact(y) => (year == y).then_some(YearKey::Year(y)),
            Self::Cumulative(None) => Some(YearKey::Year(year)),
            Self::Cumulative(Some(bound)) => (year <= bound).then_some(YearKey::Year(year)),
        }
    }
}

/// Mean life expectancy (and CO₂) of one group in one year bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMeanPoint {
    /// Group label: country code, income group label, or region.
    pub group: String,
    /// Year bucket.
    pub year: YearKey,
    /// Mean life expectancy of contributing rows.
    pub mean_value: f64,
    /// Mean CO₂ of the contributing rows that report it.
    pub mean_co2: Option<f64>,
    /// Rows with a life expectancy value.
    pub sample_count: usize,
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Accumulator {
    life_sum: f64,
    life_n: usize,
    co2_sum: f64,
    co2_n: usize,
}

impl Accumulator {
    fn push(&mut self, record: &Record) {
        if let Some(life) = record.life_expectancy {
            self.life_sum += life;
            self.life_n += 1;
            if let Some(co2) = record.co2 {
                self.co2_sum += co2;
                self.co2_n += 1;
            }
        }
    }

    pub(crate) fn mean_life(&self) -> Option<f64> {
        (self.life_n > 0).then(|| self.life_sum / self.life_n as f64)
    }

    pub(crate) fn mean_co2(&self) -> Option<f64> {
        (self.co2_n > 0).then(|| self.co2_sum / self.co2_n as f64)
    }

    pub(crate) fn count(&self) -> usize {
        self.life_n
    }
}

/// Accumulate rows into ordered `(group, year)` buckets.
pub(crate) fn accumulate<K: Ord>(
    rows: &[&Record],
    key: impl Fn(&Record) -> K,
    mode: YearMode,
) -> BTreeMap<(K, YearKey), Accumulator> {
    let mut buckets: BTreeMap<(K, YearKey), Accumulator> = BTreeMap::new();
    for record in rows {
        if let Some(year) = mode.bucket(record.year) {
            buckets.entry((key(record), year)).or_default().push(record);
        }
    }
    buckets
}

/// Group filtered rows and average them per group and year bucket.
///
/// Output is ordered by group label, then year.
#[must_use]
pub fn aggregate(rows: &[&Record], key: GroupKey, mode: YearMode) -> Vec<GroupMeanPoint> {
    accumulate(rows, |r| key.label(r), mode)
        .into_iter()
        .filter_map(|((group, year), acc)| {
            Some(GroupMeanPoint {
                group,
                year,
                mean_value: acc.mean_life()?,
                mean_co2: acc.mean_co2(),
                sample_count: acc.count(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::IncomeGroup;
    use crate::dataset::fixtures::sample_dataset;

    #[test]
    fn test_all_years_mode() {
        let dataset = sample_dataset();
        let rows: Vec<&Record> = dataset.records().iter().collect();
        let points = aggregate(&rows, GroupKey::IncomeGroup, YearMode::AllYears);

        assert_eq!(points.len(), 3);
        let high = points.iter().find(|p| p.group == "High income").unwrap();
        assert_eq!(high.year, YearKey::All);
        assert!((high.mean_value - 81.0).abs() < 1e-9);
        assert_eq!(high.sample_count, 3);
    }

    #[test]
    fn test_exact_mode_filters_year() {
        let dataset = sample_dataset();
        let rows: Vec<&Record> = dataset.records().iter().collect();
        let points = aggregate(&rows, GroupKey::Region, YearMode::Exact(2002));

        assert_eq!(points.len(), 2);
        let africa = points.iter().find(|p| p.group == "Sub-Saharan Africa").unwrap();
        assert_eq!(africa.year, YearKey::Year(2002));
        assert!((africa.mean_value - 56.0).abs() < 1e-9);
        assert_eq!(africa.sample_count, 2);
    }

    #[test]
    fn test_cumulative_mode_grows_with_bound() {
        let dataset = sample_dataset();
        let rows: Vec<&Record> = dataset.records().iter().collect();

        let through_2002 =
            aggregate(&rows, GroupKey::IncomeGroup, YearMode::Cumulative(Some(2002)));
        assert_eq!(through_2002.len(), 6);
        assert!(through_2002.iter().all(|p| p.year <= YearKey::Year(2002)));

        let every_year = aggregate(&rows, GroupKey::IncomeGroup, YearMode::Cumulative(None));
        assert_eq!(every_year.len(), 9);

        let years: Vec<YearKey> = every_year
            .iter()
            .filter(|p| p.group == "Low income")
            .map(|p| p.year)
            .collect();
        assert_eq!(years, vec![YearKey::Year(2001), YearKey::Year(2002), YearKey::Year(2003)]);
    }

    #[test]
    fn test_groups_without_values_are_omitted() {
        let mut record = Record::new("Nowhere", "NWH", IncomeGroup::Low, "R", 2001);
        record.co2 = Some(5.0);
        let rows = vec![&record];
        assert!(aggregate(&rows, GroupKey::Country, YearMode::AllYears).is_empty());
        assert!(aggregate(&[], GroupKey::Country, YearMode::AllYears).is_empty());
    }

    #[test]
    fn test_mean_co2_only_from_reporting_rows() {
        let a = Record::new("A", "AAA", IncomeGroup::Low, "R", 2001).with_life(50.0).with_co2(10.0);
        let b = Record::new("A", "AAA", IncomeGroup::Low, "R", 2002).with_life(60.0);
        let points = aggregate(&[&a, &b], GroupKey::Country, YearMode::AllYears);

        assert_eq!(points[0].mean_co2, Some(10.0));
        assert!((points[0].mean_value - 55.0).abs() < 1e-9);
    }
}
