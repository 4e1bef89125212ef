//! Shared filter state and row predicates.
//!
//! [`FilterState`] is the single source of truth for what the dashboard
//! shows. It is only changed through setters that keep two invariants:
//!
//! - the active region set is never empty (emptying it restores every region);
//! - each numeric range keeps `min <= max` (editing one bound past the other
//!   drags the other bound along).
//!
//! Aggregations receive the state by reference and never mutate it.

mod predicate;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use predicate::{ChartConstraints, Co2Clause, RowPredicate, YearScope};

use crate::dataset::{Dataset, Extent, IncomeGroup, YearDomain, YearKey};

/// Which end of a range slider was edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeEdge {
    /// Lower bound.
    Min,
    /// Upper bound.
    Max,
}

/// Inclusive numeric bounds; an unset bound disables that side of the test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower bound.
    pub min: Option<f64>,
    /// Upper bound.
    pub max: Option<f64>,
}

impl Bounds {
    /// Bounds spanning an extent, or unbounded when there is none.
    #[must_use]
    pub fn from_extent(extent: Option<Extent>) -> Self {
        extent.map_or_else(Self::default, |e| Self {
            min: Some(e.min),
            max: Some(e.max),
        })
    }

    /// Whether `value` lies within both set bounds.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    /// Whether neither bound is set.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Whether every set bound is finite and `min <= max`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let finite = |v: Option<f64>| v.map_or(true, f64::is_finite);
        finite(self.min)
            && finite(self.max)
            && match (self.min, self.max) {
                (Some(min), Some(max)) => min <= max,
                _ => true,
            }
    }

    /// Set one bound, then pull the opposite bound onto it if they crossed.
    /// Non-finite values are ignored.
    fn set_synced(&mut self, edge: RangeEdge, value: f64) {
        if !value.is_finite() {
            tracing::debug!(?edge, value, "ignoring non-finite range bound");
            return;
        }
        match edge {
            RangeEdge::Min => {
                self.min = Some(value);
                if self.max.is_some_and(|max| max < value) {
                    self.max = Some(value);
                }
            }
            RangeEdge::Max => {
                self.max = Some(value);
                if self.min.is_some_and(|min| min > value) {
                    self.min = Some(value);
                }
            }
        }
    }
}

/// Everything a filter can range over, captured once from the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDomain {
    /// All income groups.
    pub income_groups: BTreeSet<IncomeGroup>,
    /// All regions present in the data.
    pub regions: BTreeSet<String>,
    /// Life expectancy extent.
    pub life_extent: Option<Extent>,
    /// Positive CO₂ extent.
    pub co2_extent: Option<Extent>,
    /// Real years.
    pub years: YearDomain,
}

impl FilterDomain {
    /// Capture the domain of a dataset.
    #[must_use]
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            income_groups: IncomeGroup::all().iter().copied().collect(),
            regions: dataset.regions().iter().cloned().collect(),
            life_extent: dataset.life_extent(),
            co2_extent: dataset.co2_extent(),
            years: dataset.year_domain().clone(),
        }
    }
}

/// The mutable dashboard filter configuration.
///
/// The region and income domains travel with the state so that a
/// deserialized state keeps enforcing its invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFilterState")]
pub struct FilterState {
    selected_year: YearKey,
    income_groups: BTreeSet<IncomeGroup>,
    regions: BTreeSet<String>,
    life_range: Bounds,
    co2_range: Bounds,
    domain_regions: BTreeSet<String>,
    domain_income: BTreeSet<IncomeGroup>,
}

#[derive(Deserialize)]
struct RawFilterState {
    selected_year: YearKey,
    income_groups: BTreeSet<IncomeGroup>,
    regions: BTreeSet<String>,
    life_range: Bounds,
    co2_range: Bounds,
    domain_regions: BTreeSet<String>,
    domain_income: BTreeSet<IncomeGroup>,
}

impl TryFrom<RawFilterState> for FilterState {
    type Error = String;

    fn try_from(raw: RawFilterState) -> Result<Self, Self::Error> {
        if !raw.regions.is_subset(&raw.domain_regions) {
            return Err("active regions outside the region domain".to_string());
        }
        if raw.regions.is_empty() && !raw.domain_regions.is_empty() {
            return Err("active region set is empty".to_string());
        }
        if !raw.income_groups.is_subset(&raw.domain_income) {
            return Err("active income groups outside the income domain".to_string());
        }
        for bounds in [raw.life_range, raw.co2_range] {
            if !bounds.is_valid() {
                return Err(format!("invalid range {:?}..{:?}", bounds.min, bounds.max));
            }
        }
        Ok(Self {
            selected_year: raw.selected_year,
            income_groups: raw.income_groups,
            regions: raw.regions,
            life_range: raw.life_range,
            co2_range: raw.co2_range,
            domain_regions: raw.domain_regions,
            domain_income: raw.domain_income,
        })
    }
}

impl FilterState {
    /// Full-domain defaults: every group and region, full ranges, all years.
    #[must_use]
    pub fn new(domain: &FilterDomain) -> Self {
        Self {
            selected_year: YearKey::All,
            income_groups: domain.income_groups.clone(),
            regions: domain.regions.clone(),
            life_range: Bounds::from_extent(domain.life_extent),
            co2_range: Bounds::from_extent(domain.co2_extent),
            domain_regions: domain.regions.clone(),
            domain_income: domain.income_groups.clone(),
        }
    }

    /// Selected year, or the all-years bucket.
    #[must_use]
    pub fn selected_year(&self) -> YearKey {
        self.selected_year
    }

    /// Active income groups.
    #[must_use]
    pub fn income_groups(&self) -> &BTreeSet<IncomeGroup> {
        &self.income_groups
    }

    /// Whether every income group is active.
    #[must_use]
    pub fn all_income_groups(&self) -> bool {
        self.income_groups == self.domain_income
    }

    /// Active regions; never empty unless the dataset has no regions.
    #[must_use]
    pub fn regions(&self) -> &BTreeSet<String> {
        &self.regions
    }

    /// Whether every region is active.
    #[must_use]
    pub fn all_regions(&self) -> bool {
        self.regions == self.domain_regions
    }

    /// Life expectancy bounds.
    #[must_use]
    pub fn life_range(&self) -> Bounds {
        self.life_range
    }

    /// CO₂ bounds.
    #[must_use]
    pub fn co2_range(&self) -> Bounds {
        self.co2_range
    }

    /// Select a year or the all-years bucket.
    pub fn select_year(&mut self, year: YearKey) {
        self.selected_year = year;
    }

    /// Toggle one income group.
    pub fn set_income_group(&mut self, group: IncomeGroup, active: bool) {
        if active {
            self.income_groups.insert(group);
        } else {
            self.income_groups.remove(&group);
        }
    }

    /// Replace the active income groups. An empty set is allowed and simply
    /// matches no rows.
    pub fn set_income_groups(&mut self, groups: impl IntoIterator<Item = IncomeGroup>) {
        self.income_groups = groups.into_iter().collect();
    }

    /// Toggle one region. Unknown regions are ignored.
    pub fn set_region(&mut self, region: &str, active: bool) {
        if active {
            if self.domain_regions.contains(region) {
                self.regions.insert(region.to_string());
            }
        } else {
            self.regions.remove(region);
        }
        self.restore_regions_if_empty();
    }

    /// Replace the active regions. Unknown names are dropped; an empty
    /// result restores every region.
    pub fn set_regions<S: AsRef<str>>(&mut self, regions: impl IntoIterator<Item = S>) {
        self.regions = regions
            .into_iter()
            .filter(|r| self.domain_regions.contains(r.as_ref()))
            .map(|r| r.as_ref().to_string())
            .collect();
        self.restore_regions_if_empty();
    }

    /// Edit one life expectancy bound.
    pub fn set_life_bound(&mut self, edge: RangeEdge, value: f64) {
        self.life_range.set_synced(edge, value);
    }

    /// Edit one CO₂ bound.
    pub fn set_co2_bound(&mut self, edge: RangeEdge, value: f64) {
        self.co2_range.set_synced(edge, value);
    }

    /// Remove both life expectancy bounds.
    pub fn clear_life_range(&mut self) {
        self.life_range = Bounds::default();
    }

    /// Remove both CO₂ bounds.
    pub fn clear_co2_range(&mut self) {
        self.co2_range = Bounds::default();
    }

    /// Restore full-domain groups, regions, and ranges. The year selection
    /// is kept, as the reset control leaves the year slider alone.
    pub fn reset(&mut self, domain: &FilterDomain) {
        let year = self.selected_year;
        *self = Self::new(domain);
        self.selected_year = year;
    }

    fn restore_regions_if_empty(&mut self) {
        if self.regions.is_empty() {
            self.regions = self.domain_regions.clone();
        }
    }
}
