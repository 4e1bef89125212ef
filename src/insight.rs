//! One-sentence narrative summaries of a snapshot.
//!
//! Every sentence is derived from the same views the charts show, so the
//! text always agrees with what is on screen.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::GroupMeanPoint;
use crate::dataset::{Dataset, IncomeGroup};
use crate::engine::{ChartRequest, MapPoint};
use crate::filter::RowPredicate;
use crate::session::DashboardSnapshot;
use crate::stats::{mean, pearson};

/// Narrative text per view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insights {
    /// Map view.
    pub map: String,
    /// Scatter view.
    pub scatter: String,
    /// Income group trends.
    pub trend: String,
    /// Region trends.
    pub region: String,
    /// Rolling average and interpolation.
    pub smoothing: String,
    /// Missing data.
    pub missing: String,
}

impl Insights {
    /// Sentences in dashboard order, labelled by view.
    pub fn lines(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("map", self.map.as_str()),
            ("scatter", self.scatter.as_str()),
            ("trend", self.trend.as_str()),
            ("region", self.region.as_str()),
            ("smoothing", self.smoothing.as_str()),
            ("missing", self.missing.as_str()),
        ]
        .into_iter()
    }
}

/// Build the narrative for `snapshot`. The smoothing sentence reads the
/// dataset rows the AUC view uses.
#[must_use]
pub fn narrate(snapshot: &DashboardSnapshot, dataset: &Dataset) -> Insights {
    Insights {
        map: map_sentence(snapshot),
        scatter: scatter_sentence(snapshot),
        trend: trend_sentence(snapshot),
        region: region_sentence(snapshot),
        smoothing: smoothing_sentence(snapshot, dataset),
        missing: missing_sentence(snapshot),
    }
}

fn map_sentence(snapshot: &DashboardSnapshot) -> String {
    let Some(map) = snapshot.views.map.ready() else {
        return "Insight unavailable for the map: no countries match the filters.".to_string();
    };
    let by_life = |a: &&MapPoint, b: &&MapPoint| {
        a.life_expectancy.total_cmp(&b.life_expectancy)
    };
    let top = map.points.iter().max_by(by_life);
    let bottom = map.points.iter().min_by(by_life);
    let (Some(top), Some(bottom)) = (top, bottom) else {
        return "Insight unavailable for the map: no countries match the filters.".to_string();
    };
    format!(
        "{}: {} has the highest average life expectancy (~{:.1} years) and {} the lowest (~{:.1}).",
        map.selection, top.country, top.life_expectancy, bottom.country, bottom.life_expectancy
    )
}

fn scatter_sentence(snapshot: &DashboardSnapshot) -> String {
    let Some(scatter) = snapshot.views.scatter.ready() else {
        return "Insight unavailable for the scatter: no rows report positive CO₂.".to_string();
    };
    let pairs: Vec<(f64, f64)> = scatter
        .points
        .iter()
        .map(|p| (p.co2.ln(), p.life_expectancy))
        .collect();
    let Some(r) = pearson(&pairs) else {
        return "Insight unavailable for the scatter: too little variation to correlate."
            .to_string();
    };

    let mut by_group: BTreeMap<IncomeGroup, Vec<f64>> = BTreeMap::new();
    for point in &scatter.points {
        by_group.entry(point.income_group).or_default().push(point.life_expectancy);
    }
    let group_mean = |g: IncomeGroup| by_group.get(&g).and_then(|v| mean(v.iter().copied()));
    let gap = match (group_mean(IncomeGroup::High), group_mean(IncomeGroup::Low)) {
        (Some(high), Some(low)) => format!("{:.1}", high - low),
        _ => "N/A".to_string(),
    };

    format!(
        "Life expectancy and ln(CO₂) show a {} association (r ≈ {r:.2}); the high-income minus low-income gap is {gap} years.",
        if r >= 0.0 { "positive" } else { "negative" },
    )
}

struct SeriesStats<'a> {
    group: &'a str,
    first: f64,
    latest: f64,
}

impl SeriesStats<'_> {
    fn gain(&self) -> f64 {
        self.latest - self.first
    }
}

fn series_stats(points: &[GroupMeanPoint]) -> Vec<SeriesStats<'_>> {
    let mut by_group: BTreeMap<&str, Vec<&GroupMeanPoint>> = BTreeMap::new();
    for point in points {
        by_group.entry(point.group.as_str()).or_default().push(point);
    }
    by_group
        .into_iter()
        .filter_map(|(group, series)| {
            let first = series.iter().min_by_key(|p| p.year)?;
            let last = series.iter().max_by_key(|p| p.year)?;
            Some(SeriesStats {
                group,
                first: first.mean_value,
                latest: last.mean_value,
            })
        })
        .collect()
}

fn trend_sentence(snapshot: &DashboardSnapshot) -> String {
    let stats = snapshot.views.trend.ready().map(|p| series_stats(p)).unwrap_or_default();
    match stats.iter().max_by(|a, b| a.gain().total_cmp(&b.gain())) {
        Some(best) => format!(
            "{} shows the largest improvement, rising by about {:.1} years (from {:.1} to {:.1}).",
            best.group,
            best.gain(),
            best.first,
            best.latest
        ),
        None => "Insight unavailable for income trends.".to_string(),
    }
}

fn region_sentence(snapshot: &DashboardSnapshot) -> String {
    let stats = snapshot.views.region.ready().map(|p| series_stats(p)).unwrap_or_default();
    let best_latest = stats.iter().max_by(|a, b| a.latest.total_cmp(&b.latest));
    let best_gain = stats.iter().max_by(|a, b| a.gain().total_cmp(&b.gain()));
    match (best_latest, best_gain) {
        (Some(latest), Some(gain)) => format!(
            "{} has the highest latest regional life expectancy (~{:.1} years), while {} records the largest gain (~{:.1} years).",
            latest.group,
            latest.latest,
            gain.group,
            gain.gain()
        ),
        _ => "Insight unavailable for regional trends.".to_string(),
    }
}

fn smoothing_sentence(snapshot: &DashboardSnapshot, dataset: &Dataset) -> String {
    let predicate = RowPredicate::compose(&snapshot.filters, &ChartRequest::Auc.constraints());
    let rows = predicate.filter(dataset);

    let gap = mean(
        rows.iter()
            .filter_map(|r| Some((r.life_expectancy? - r.life_expectancy_5yr_avg?).abs())),
    );
    let interpolated = mean(rows.iter().map(|r| if r.interpolated { 1.0 } else { 0.0 }));

    match (gap, interpolated) {
        (Some(gap), Some(share)) => format!(
            "The 5-year rolling average differs from yearly values by about {gap:.2} years on average; interpolated records are {:.1}% of observations.",
            share * 100.0
        ),
        _ => "Insight unavailable for smoothing.".to_string(),
    }
}

fn missing_sentence(snapshot: &DashboardSnapshot) -> String {
    match snapshot.views.missingness.ready().and_then(|rows| rows.first()) {
        Some(top) => format!(
            "{} is the most incomplete field, with {:.1}% missing entries ({} of {}).",
            top.field,
            top.ratio * 100.0,
            top.missing_count,
            top.total_count
        ),
        None => "Insight unavailable for missing data.".to_string(),
    }
}
