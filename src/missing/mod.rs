//! Missing-data profiling of tracked covariates.
//!
//! A [`MissingnessProfile`] is computed eagerly for every year in the dataset
//! plus the all-years bucket, so the year slider can look any bucket up
//! without recomputation. Only income group and region membership decide
//! which rows are audited; the numeric range filters are ignored because the
//! profile exists to show gaps in those very fields.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, IncomeGroup, Record, TrackedField, YearKey};
use crate::filter::{ChartConstraints, FilterState, RowPredicate};

/// Missing share of one field in one year bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissingnessRow {
    /// Audited field.
    pub field: TrackedField,
    /// Year bucket.
    pub year_key: YearKey,
    /// Rows where the field is null.
    pub missing_count: usize,
    /// Rows in the bucket.
    pub total_count: usize,
    /// `missing_count / total_count`, or 0 for an empty bucket.
    pub ratio: f64,
}

/// The income and region selection a profile was built for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Membership {
    /// Active income groups.
    pub income_groups: BTreeSet<IncomeGroup>,
    /// Active regions.
    pub regions: BTreeSet<String>,
}

impl Membership {
    /// Capture the membership part of a filter state.
    #[must_use]
    pub fn of(state: &FilterState) -> Self {
        Self {
            income_groups: state.income_groups().clone(),
            regions: state.regions().clone(),
        }
    }
}

/// Per-bucket missingness rows, sorted for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissingnessProfile {
    membership: Membership,
    buckets: HashMap<YearKey, Vec<MissingnessRow>>,
}

impl MissingnessProfile {
    /// Profile `fields` over the rows passing the membership filters of
    /// `state`.
    ///
    /// Year buckets with no rows are left out, so looking them up yields
    /// `None`.
    #[must_use]
    pub fn build(dataset: &Dataset, state: &FilterState, fields: &[TrackedField]) -> Self {
        let predicate = RowPredicate::compose(state, &ChartConstraints::membership_only());
        let rows = predicate.filter(dataset);

        let mut by_year: BTreeMap<i32, Vec<&Record>> = BTreeMap::new();
        for record in &rows {
            by_year.entry(record.year).or_default().push(record);
        }
        let by_year: Vec<(i32, Vec<&Record>)> = by_year.into_iter().collect();

        let mut buckets: HashMap<YearKey, Vec<MissingnessRow>> = by_year
            .par_iter()
            .map(|(year, rows)| {
                let key = YearKey::Year(*year);
                (key, profile_bucket(rows, key, fields))
            })
            .collect();

        if !rows.is_empty() {
            buckets.insert(YearKey::All, profile_bucket(&rows, YearKey::All, fields));
        }

        tracing::debug!(
            rows = rows.len(),
            buckets = buckets.len(),
            fields = fields.len(),
            "Built missingness profile"
        );

        Self {
            membership: Membership::of(state),
            buckets,
        }
    }

    /// Rows for one bucket, highest ratio first.
    #[must_use]
    pub fn lookup(&self, key: YearKey) -> Option<&[MissingnessRow]> {
        self.buckets.get(&key).map(Vec::as_slice)
    }

    /// Number of non-empty buckets, including the all-years bucket.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Membership the profile was built for.
    #[must_use]
    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    /// Whether the profile still reflects the membership filters of `state`.
    #[must_use]
    pub fn is_current_for(&self, state: &FilterState) -> bool {
        self.membership.income_groups == *state.income_groups()
            && self.membership.regions == *state.regions()
    }
}

fn profile_bucket(rows: &[&Record], key: YearKey, fields: &[TrackedField]) -> Vec<MissingnessRow> {
    let total_count = rows.len();
    let mut out: Vec<MissingnessRow> = fields
        .iter()
        .map(|&field| {
            let missing_count = rows.iter().filter(|r| field.value(r).is_none()).count();
            let ratio = if total_count == 0 {
                0.0
            } else {
                missing_count as f64 / total_count as f64
            };
            MissingnessRow {
                field,
                year_key: key,
                missing_count,
                total_count,
                ratio,
            }
        })
        .collect();
    out.sort_by(|a, b| b.ratio.total_cmp(&a.ratio).then(a.field.cmp(&b.field)));
    out
}
