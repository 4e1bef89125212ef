//! Dataset store for country-year life expectancy records.
//!
//! The store is loaded once and never mutated afterwards. Every aggregation
//! borrows it immutably, so a single `Arc<Dataset>` can back any number of
//! recomputation passes.
//!
//! ## Example
//!
//! ```rust,ignore
//! use lifedash::dataset::{CsvImporter, Dataset};
//!
//! let (dataset, report) = CsvImporter::auto_detect().import("life_expectancy_clean.csv")?;
//! println!("{} rows, {} malformed cells", dataset.len(), report.malformed_cells);
//!
//! let years = dataset.year_domain();
//! println!("{:?}..={:?}", years.first(), years.last());
//! ```

pub mod derive;
mod import;
mod income;
mod loader;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use import::{CsvImporter, CsvSchema, CsvSchemaBuilder, ImportReport};
pub use income::IncomeGroup;
pub use loader::SharedDataset;

/// One country-year observation.
///
/// Missing source values are `None`, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Country name.
    pub country: String,

    /// ISO-3 country code; the entity key shared across views.
    pub country_code: String,

    /// Income group classification.
    pub income_group: IncomeGroup,

    /// Geographic region.
    pub region: String,

    /// Observation year.
    pub year: i32,

    /// Life expectancy at birth in years.
    pub life_expectancy: Option<f64>,

    /// CO₂ emissions.
    pub co2: Option<f64>,

    /// Corruption index.
    pub corruption: Option<f64>,

    /// Sanitation coverage.
    pub sanitation: Option<f64>,

    /// Education expenditure, % of GDP.
    pub education_exp_pct: Option<f64>,

    /// Prevalence of undernourishment.
    pub undernourishment: Option<f64>,

    /// Health expenditure, % of GDP.
    pub health_exp_pct: Option<f64>,

    /// Unemployment rate.
    pub unemployment: Option<f64>,

    /// Trailing five-year mean of life expectancy.
    pub life_expectancy_5yr_avg: Option<f64>,

    /// Whether life expectancy was filled by interpolation upstream.
    #[serde(default)]
    pub interpolated: bool,
}

impl Record {
    /// Create a record with only the identifying fields set.
    #[must_use]
    pub fn new(
        country: impl Into<String>,
        country_code: impl Into<String>,
        income_group: IncomeGroup,
        region: impl Into<String>,
        year: i32,
    ) -> Self {
        Self {
            country: country.into(),
            country_code: country_code.into(),
            income_group,
            region: region.into(),
            year,
            life_expectancy: None,
            co2: None,
            corruption: None,
            sanitation: None,
            education_exp_pct: None,
            undernourishment: None,
            health_exp_pct: None,
            unemployment: None,
            life_expectancy_5yr_avg: None,
            interpolated: false,
        }
    }

    /// Set life expectancy.
    #[must_use]
    pub fn with_life(mut self, value: f64) -> Self {
        self.life_expectancy = Some(value);
        self
    }

    /// Set CO₂ emissions.
    #[must_use]
    pub fn with_co2(mut self, value: f64) -> Self {
        self.co2 = Some(value);
        self
    }

    /// Natural log of CO₂, defined only for strictly positive emissions.
    #[must_use]
    pub fn ln_co2(&self) -> Option<f64> {
        self.co2.filter(|c| *c > 0.0).map(f64::ln)
    }
}

/// Covariate fields audited by the missingness profiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    /// Corruption index.
    Corruption,
    /// Sanitation coverage.
    Sanitation,
    /// Education expenditure.
    EducationExpPct,
    /// Undernourishment prevalence.
    Undernourishment,
    /// Health expenditure.
    HealthExpPct,
    /// Unemployment rate.
    Unemployment,
    /// CO₂ emissions.
    Co2,
}

impl TrackedField {
    /// Get all tracked fields in display order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[
            Self::Corruption,
            Self::Sanitation,
            Self::EducationExpPct,
            Self::Undernourishment,
            Self::HealthExpPct,
            Self::Unemployment,
            Self::Co2,
        ]
    }

    /// Column name of the field.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Corruption => "corruption",
            Self::Sanitation => "sanitation",
            Self::EducationExpPct => "education_exp_pct",
            Self::Undernourishment => "undernourishment",
            Self::HealthExpPct => "health_exp_pct",
            Self::Unemployment => "unemployment",
            Self::Co2 => "co2",
        }
    }

    /// Read this field from a record.
    #[must_use]
    pub fn value(self, record: &Record) -> Option<f64> {
        match self {
            Self::Corruption => record.corruption,
            Self::Sanitation => record.sanitation,
            Self::EducationExpPct => record.education_exp_pct,
            Self::Undernourishment => record.undernourishment,
            Self::HealthExpPct => record.health_exp_pct,
            Self::Unemployment => record.unemployment,
            Self::Co2 => record.co2,
        }
    }
}

impl std::fmt::Display for TrackedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A concrete year or the reserved "all years" bucket.
///
/// Used both as the filter selection and as the year label of aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearKey {
    /// Every year combined.
    #[default]
    All,
    /// A single year.
    Year(i32),
}

impl YearKey {
    /// The concrete year, if any.
    #[must_use]
    pub fn year(self) -> Option<i32> {
        match self {
            Self::All => None,
            Self::Year(y) => Some(y),
        }
    }

    /// Whether this is the "all years" bucket.
    #[must_use]
    pub fn is_all(self) -> bool {
        matches!(self, Self::All)
    }
}

impl std::fmt::Display for YearKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "All years"),
            Self::Year(y) => write!(f, "{y}"),
        }
    }
}

/// The ordered set of real years plus the slider sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearDomain {
    years: Vec<i32>,
}

impl YearDomain {
    /// Build from any collection of years; duplicates are removed.
    #[must_use]
    pub fn new(years: impl IntoIterator<Item = i32>) -> Self {
        let set: BTreeSet<i32> = years.into_iter().collect();
        Self {
            years: set.into_iter().collect(),
        }
    }

    /// Real years in ascending order.
    #[must_use]
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// First real year.
    #[must_use]
    pub fn first(&self) -> Option<i32> {
        self.years.first().copied()
    }

    /// Last real year.
    #[must_use]
    pub fn last(&self) -> Option<i32> {
        self.years.last().copied()
    }

    /// Whether the domain has no years.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Whether `year` is a real year of the dataset.
    #[must_use]
    pub fn contains(&self, year: i32) -> bool {
        self.years.binary_search(&year).is_ok()
    }

    /// Slider value reserved for "all years": one less than the first year.
    #[must_use]
    pub fn sentinel(&self) -> Option<i32> {
        self.first().map(|y| y - 1)
    }

    /// The next real year strictly after `year`.
    #[must_use]
    pub fn next_after(&self, year: i32) -> Option<i32> {
        let idx = self.years.partition_point(|y| *y <= year);
        self.years.get(idx).copied()
    }

    /// Map a slider position to a selection.
    ///
    /// The sentinel (and anything below the first year) selects all years;
    /// positions past the last year clamp to it.
    #[must_use]
    pub fn from_slider(&self, value: i32) -> YearKey {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) if value >= first => YearKey::Year(value.min(last)),
            _ => YearKey::All,
        }
    }

    /// Map a selection back to a slider position.
    #[must_use]
    pub fn to_slider(&self, key: YearKey) -> Option<i32> {
        match key {
            YearKey::All => self.sentinel(),
            YearKey::Year(y) => Some(y),
        }
    }
}

/// Inclusive numeric extent of a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
}

impl Extent {
    /// Compute the extent of an iterator of values.
    ///
    /// Returns `None` when the iterator is empty.
    #[must_use]
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(Self { min: v, max: v }),
            Some(e) => Some(Self {
                min: e.min.min(v),
                max: e.max.max(v),
            }),
        })
    }
}

/// Immutable, once-loaded collection of records.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    years: YearDomain,
    regions: Vec<String>,
    income_groups: Vec<IncomeGroup>,
    life_extent: Option<Extent>,
    co2_extent: Option<Extent>,
}

impl Dataset {
    /// Build a dataset, sorting records by country code then year.
    #[must_use]
    pub fn new(mut records: Vec<Record>) -> Self {
        records.sort_by(|a, b| {
            a.country_code
                .cmp(&b.country_code)
                .then(a.year.cmp(&b.year))
        });

        let years = YearDomain::new(records.iter().map(|r| r.year));
        let regions: BTreeSet<&str> = records.iter().map(|r| r.region.as_str()).collect();
        let regions = regions.into_iter().map(String::from).collect();
        let income_groups: BTreeSet<IncomeGroup> = records.iter().map(|r| r.income_group).collect();
        let life_extent = Extent::of(records.iter().filter_map(|r| r.life_expectancy));
        let co2_extent = Extent::of(records.iter().filter_map(|r| r.co2).filter(|c| *c > 0.0));

        Self {
            records,
            years,
            regions,
            income_groups: income_groups.into_iter().collect(),
            life_extent,
            co2_extent,
        }
    }

    /// All records, sorted by country code then year.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the dataset is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Real years present in the data.
    #[must_use]
    pub fn year_domain(&self) -> &YearDomain {
        &self.years
    }

    /// Distinct regions in sorted order.
    #[must_use]
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Income groups that occur in the data.
    #[must_use]
    pub fn income_groups(&self) -> &[IncomeGroup] {
        &self.income_groups
    }

    /// Extent of non-null life expectancy.
    #[must_use]
    pub fn life_extent(&self) -> Option<Extent> {
        self.life_extent
    }

    /// Extent of strictly positive CO₂.
    #[must_use]
    pub fn co2_extent(&self) -> Option<Extent> {
        self.co2_extent
    }

    /// Number of distinct countries.
    #[must_use]
    pub fn country_count(&self) -> usize {
        let mut count = 0;
        let mut last: Option<&str> = None;
        for record in &self.records {
            if last != Some(record.country_code.as_str()) {
                count += 1;
                last = Some(record.country_code.as_str());
            }
        }
        count
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_domains() {
        let dataset = fixtures::sample_dataset();
        assert_eq!(dataset.len(), 9);
        assert_eq!(dataset.country_count(), 3);
        assert_eq!(dataset.year_domain().years(), &[2001, 2002, 2003]);
        assert_eq!(
            dataset.regions(),
            &["Europe & Central Asia".to_string(), "Sub-Saharan Africa".to_string()]
        );
        assert_eq!(
            dataset.income_groups(),
            &[IncomeGroup::Low, IncomeGroup::LowerMiddle, IncomeGroup::High]
        );
        let life = dataset.life_extent().unwrap();
        assert!((life.min - 50.0).abs() < 1e-9);
        assert!((life.max - 82.0).abs() < 1e-9);
    }

    #[test]
    fn test_records_sorted_by_country_then_year() {
        let dataset = fixtures::sample_dataset();
        let keys: Vec<(&str, i32)> = dataset
            .records()
            .iter()
            .map(|r| (r.country_code.as_str(), r.year))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_co2_extent_ignores_non_positive() {
        let records = vec![
            Record::new("A", "AAA", IncomeGroup::Low, "R", 2001).with_co2(0.0),
            Record::new("B", "BBB", IncomeGroup::Low, "R", 2001).with_co2(5.0),
            Record::new("C", "CCC", IncomeGroup::Low, "R", 2001).with_co2(9.0),
        ];
        let extent = Dataset::new(records).co2_extent().unwrap();
        assert_eq!(extent.min, 5.0);
        assert_eq!(extent.max, 9.0);
    }

    #[test]
    fn test_year_domain_slider_mapping() {
        let domain = YearDomain::new([2003, 2001, 2002, 2001]);
        assert_eq!(domain.sentinel(), Some(2000));
        assert_eq!(domain.from_slider(2000), YearKey::All);
        assert_eq!(domain.from_slider(2002), YearKey::Year(2002));
        assert_eq!(domain.from_slider(2050), YearKey::Year(2003));
        assert_eq!(domain.to_slider(YearKey::All), Some(2000));
        assert_eq!(domain.next_after(2001), Some(2002));
        assert_eq!(domain.next_after(2003), None);
    }

    #[test]
    fn test_empty_year_domain() {
        let domain = YearDomain::default();
        assert!(domain.is_empty());
        assert_eq!(domain.sentinel(), None);
        assert_eq!(domain.from_slider(2010), YearKey::All);
    }

    #[test]
    fn test_ln_co2_requires_positive() {
        let record = Record::new("A", "AAA", IncomeGroup::Low, "R", 2001).with_co2(0.0);
        assert_eq!(record.ln_co2(), None);
        let record = record.with_co2(std::f64::consts::E);
        assert!((record.ln_co2().unwrap() - 1.0).abs() < 1e-12);
    }
}
