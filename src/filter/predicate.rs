//! Row-inclusion tests composed from the filter state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Bounds, FilterState};
use crate::dataset::{Dataset, IncomeGroup, Record, YearKey};

/// How a chart interprets the selected year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearScope {
    /// Only rows of the selected year.
    Exact,
    /// Rows up to and including the selected year.
    Cumulative,
    /// Every year regardless of the selection.
    Unconstrained,
}

/// Whether, and how strictly, a chart needs CO₂.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Co2Clause {
    /// CO₂ plays no part in inclusion.
    Ignore,
    /// CO₂ must be present and within the CO₂ range.
    InRange,
    /// CO₂ must be present, strictly positive, and within the CO₂ range.
    PositiveInRange,
}

/// Per-chart additions to the shared filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConstraints {
    /// Year interpretation.
    pub year: YearScope,
    /// CO₂ requirement.
    pub co2: Co2Clause,
    /// Whether the life expectancy range applies.
    pub numeric_ranges: bool,
}

impl ChartConstraints {
    /// Income and region membership only.
    #[must_use]
    pub fn membership_only() -> Self {
        Self {
            year: YearScope::Unconstrained,
            co2: Co2Clause::Ignore,
            numeric_ranges: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum YearClause {
    Any,
    Exact(i32),
    UpTo(i32),
}

/// A composed row-inclusion test.
///
/// Borrows the filter state; build a fresh one per recomputation pass.
#[derive(Debug, Clone)]
pub struct RowPredicate<'a> {
    income: Option<&'a BTreeSet<IncomeGroup>>,
    regions: &'a BTreeSet<String>,
    year: YearClause,
    life: Option<Bounds>,
    co2: Option<(Bounds, bool)>,
}

impl<'a> RowPredicate<'a> {
    /// Compose the test for one chart.
    #[must_use]
    pub fn compose(state: &'a FilterState, constraints: &ChartConstraints) -> Self {
        let year = match (constraints.year, state.selected_year()) {
            (YearScope::Unconstrained, _) | (_, YearKey::All) => YearClause::Any,
            (YearScope::Exact, YearKey::Year(y)) => YearClause::Exact(y),
            (YearScope::Cumulative, YearKey::Year(y)) => YearClause::UpTo(y),
        };

        let co2 = match constraints.co2 {
            Co2Clause::Ignore => None,
            Co2Clause::InRange => Some((state.co2_range(), false)),
            Co2Clause::PositiveInRange => Some((state.co2_range(), true)),
        };

        Self {
            income: (!state.all_income_groups()).then(|| state.income_groups()),
            regions: state.regions(),
            year,
            life: constraints.numeric_ranges.then(|| state.life_range()),
            co2: if constraints.numeric_ranges { co2 } else { None },
        }
    }

    /// Whether a record passes every enabled clause.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(groups) = self.income {
            if !groups.contains(&record.income_group) {
                return false;
            }
        }

        if !self.regions.contains(&record.region) {
            return false;
        }

        let year_ok = match self.year {
            YearClause::Any => true,
            YearClause::Exact(y) => record.year == y,
            YearClause::UpTo(y) => record.year <= y,
        };
        if !year_ok {
            return false;
        }

        if let Some(bounds) = self.life {
            if !bounds.is_unbounded() {
                match record.life_expectancy {
                    Some(life) if bounds.contains(life) => {}
                    _ => return false,
                }
            }
        }

        if let Some((bounds, positive)) = self.co2 {
            match record.co2 {
                Some(co2) if bounds.contains(co2) && (!positive || co2 > 0.0) => {}
                _ => return false,
            }
        }

        true
    }

    /// All matching records of a dataset, in dataset order. May be empty.
    #[must_use]
    pub fn filter<'d>(&self, dataset: &'d Dataset) -> Vec<&'d Record> {
        dataset.records().iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::sample_dataset;
    use crate::filter::{FilterDomain, RangeEdge};

    fn constraints(year: YearScope, co2: Co2Clause) -> ChartConstraints {
        ChartConstraints {
            year,
            co2,
            numeric_ranges: true,
        }
    }

    #[test]
    fn test_full_domain_matches_everything() {
        let dataset = sample_dataset();
        let state = FilterState::new(&FilterDomain::from_dataset(&dataset));
        let predicate =
            RowPredicate::compose(&state, &constraints(YearScope::Exact, Co2Clause::Ignore));
        assert_eq!(predicate.filter(&dataset).len(), dataset.len());
    }

    #[test]
    fn test_year_scopes() {
        let dataset = sample_dataset();
        let mut state = FilterState::new(&FilterDomain::from_dataset(&dataset));
        state.select_year(YearKey::Year(2002));

        let exact =
            RowPredicate::compose(&state, &constraints(YearScope::Exact, Co2Clause::Ignore));
        assert_eq!(exact.filter(&dataset).len(), 3);

        let cumulative =
            RowPredicate::compose(&state, &constraints(YearScope::Cumulative, Co2Clause::Ignore));
        assert_eq!(cumulative.filter(&dataset).len(), 6);

        let any = RowPredicate::compose(&state, &ChartConstraints::membership_only());
        assert_eq!(any.filter(&dataset).len(), 9);
    }

    #[test]
    fn test_membership_and_ranges() {
        let dataset = sample_dataset();
        let mut state = FilterState::new(&FilterDomain::from_dataset(&dataset));
        state.set_income_group(IncomeGroup::High, false);
        state.set_life_bound(RangeEdge::Max, 60.5);

        let predicate =
            RowPredicate::compose(&state, &constraints(YearScope::Exact, Co2Clause::Ignore));
        let rows = predicate.filter(&dataset);
        // Chad 50-52 plus Kenya 60
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.income_group != IncomeGroup::High));

        // Ranges are ignored for membership-only charts.
        let membership = RowPredicate::compose(&state, &ChartConstraints::membership_only());
        assert_eq!(membership.filter(&dataset).len(), 6);
    }

    #[test]
    fn test_co2_clause_requires_presence() {
        let mut dataset_rows = sample_dataset().records().to_vec();
        dataset_rows[0].co2 = None;
        dataset_rows[1].co2 = Some(0.0);
        let dataset = Dataset::new(dataset_rows);
        let mut state = FilterState::new(&FilterDomain::from_dataset(&dataset));
        state.clear_co2_range();

        let ignore =
            RowPredicate::compose(&state, &constraints(YearScope::Exact, Co2Clause::Ignore));
        assert_eq!(ignore.filter(&dataset).len(), 9);

        let present =
            RowPredicate::compose(&state, &constraints(YearScope::Exact, Co2Clause::InRange));
        assert_eq!(present.filter(&dataset).len(), 8);

        let positive_clause = constraints(YearScope::Exact, Co2Clause::PositiveInRange);
        let positive = RowPredicate::compose(&state, &positive_clause);
        assert_eq!(positive.filter(&dataset).len(), 7);
    }

    #[test]
    fn test_empty_result_is_valid() {
        let dataset = sample_dataset();
        let mut state = FilterState::new(&FilterDomain::from_dataset(&dataset));
        state.set_income_groups([]);
        let predicate =
            RowPredicate::compose(&state, &constraints(YearScope::Exact, Co2Clause::Ignore));
        assert!(predicate.filter(&dataset).is_empty());
    }
}
