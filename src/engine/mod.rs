//! Aggregation engine.
//!
//! One entry point serves all six dashboard views. Each [`ChartRequest`]
//! picks its own row constraints on top of the shared [`FilterState`] and
//! the matching aggregator; the engine itself holds no mutable state, so
//! computing the same request twice with the same filters gives identical
//! output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{
    AucBar, GroupKey, GroupMeanPoint, RegressionOutcome, ScatterPoint, YearMode, aggregate,
    auc_bars, regressions, scatter_points,
};
use crate::config::DashboardConfig;
use crate::dataset::{Dataset, IncomeGroup, Record, YearKey};
use crate::filter::{ChartConstraints, Co2Clause, FilterState, RowPredicate, YearScope};
use crate::missing::{MissingnessProfile, MissingnessRow};

/// The six dashboard views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartRequest {
    /// Choropleth of life expectancy per country.
    Map,
    /// Life expectancy against CO₂ with regression lines.
    Scatter,
    /// Income group trends over time.
    Trend,
    /// Region trends over time.
    Region,
    /// Cumulative burden per income group.
    Auc,
    /// Missing data per tracked field.
    Missingness,
}

impl ChartRequest {
    /// Every request, in dashboard order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[
            Self::Map,
            Self::Scatter,
            Self::Trend,
            Self::Region,
            Self::Auc,
            Self::Missingness,
        ]
    }

    /// Row constraints this view adds to the shared filters.
    #[must_use]
    pub fn constraints(self) -> ChartConstraints {
        let (year, co2) = match self {
            Self::Map => (YearScope::Exact, Co2Clause::Ignore),
            Self::Scatter => (YearScope::Exact, Co2Clause::PositiveInRange),
            Self::Trend | Self::Region | Self::Auc => (YearScope::Cumulative, Co2Clause::InRange),
            Self::Missingness => return ChartConstraints::membership_only(),
        };
        ChartConstraints {
            year,
            co2,
            numeric_ranges: true,
        }
    }
}

impl std::fmt::Display for ChartRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Map => "map",
            Self::Scatter => "scatter",
            Self::Trend => "trend",
            Self::Region => "region",
            Self::Auc => "auc",
            Self::Missingness => "missingness",
        };
        f.write_str(name)
    }
}

/// A view payload, or the explicit "nothing matches" state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ChartData<T> {
    /// Computed payload.
    Ready(T),
    /// No rows survived the filters.
    DataAbsent,
}

impl<T> ChartData<T> {
    /// The payload, if present.
    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(v) => Some(v),
            Self::DataAbsent => None,
        }
    }

    /// Whether no data matched.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::DataAbsent)
    }
}

impl<T> ChartData<Vec<T>> {
    fn non_empty(items: Vec<T>) -> Self {
        if items.is_empty() { Self::DataAbsent } else { Self::Ready(items) }
    }
}

/// Life expectancy of one country on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    /// Country code, the key shared with the polygon feed.
    pub country_code: String,
    /// Country name.
    pub country: String,
    /// Income group.
    pub income_group: IncomeGroup,
    /// Region.
    pub region: String,
    /// Mean life expectancy over the selection.
    pub life_expectancy: f64,
    /// Rows averaged.
    pub sample_count: usize,
}

/// Map payload, ordered by country code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    /// Selection the values belong to.
    pub selection: YearKey,
    /// One point per country with data.
    pub points: Vec<MapPoint>,
}

impl MapView {
    /// Look a country up by code.
    #[must_use]
    pub fn lookup(&self, country_code: &str) -> Option<&MapPoint> {
        self.points
            .binary_search_by(|p| p.country_code.as_str().cmp(country_code))
            .ok()
            .map(|idx| &self.points[idx])
    }
}

/// Scatter payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterView {
    /// Plotted countries, ordered by code.
    pub points: Vec<ScatterPoint>,
    /// One outcome per income group among the points.
    pub regressions: Vec<RegressionOutcome>,
}

/// Output of a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "chart", content = "view", rename_all = "snake_case")]
pub enum ChartOutput {
    /// Map view.
    Map(ChartData<MapView>),
    /// Scatter view.
    Scatter(ChartData<ScatterView>),
    /// Income group series.
    Trend(ChartData<Vec<GroupMeanPoint>>),
    /// Region series.
    Region(ChartData<Vec<GroupMeanPoint>>),
    /// AUC bars.
    Auc(ChartData<Vec<AucBar>>),
    /// Missingness rows for the selected year bucket.
    Missingness(ChartData<Vec<MissingnessRow>>),
}

/// All six views of one recompute pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartViews {
    /// Map view.
    pub map: ChartData<MapView>,
    /// Scatter view.
    pub scatter: ChartData<ScatterView>,
    /// Income group series.
    pub trend: ChartData<Vec<GroupMeanPoint>>,
    /// Region series.
    pub region: ChartData<Vec<GroupMeanPoint>>,
    /// AUC bars.
    pub auc: ChartData<Vec<AucBar>>,
    /// Missingness rows.
    pub missingness: ChartData<Vec<MissingnessRow>>,
}

/// Stateless dispatcher over an immutable dataset.
#[derive(Debug, Clone, Copy)]
pub struct AggregationEngine<'a> {
    dataset: &'a Dataset,
    config: &'a DashboardConfig,
    missing: &'a MissingnessProfile,
}

impl<'a> AggregationEngine<'a> {
    /// Create an engine. `missing` must have been built for the membership
    /// filters the engine will be asked about.
    #[must_use]
    pub fn new(
        dataset: &'a Dataset,
        config: &'a DashboardConfig,
        missing: &'a MissingnessProfile,
    ) -> Self {
        Self {
            dataset,
            config,
            missing,
        }
    }

    fn rows(&self, state: &FilterState, request: ChartRequest) -> Vec<&'a Record> {
        RowPredicate::compose(state, &request.constraints()).filter(self.dataset)
    }

    /// Compute one view.
    #[must_use]
    pub fn compute(&self, state: &FilterState, request: ChartRequest) -> ChartOutput {
        match request {
            ChartRequest::Map => ChartOutput::Map(self.map(state)),
            ChartRequest::Scatter => ChartOutput::Scatter(self.scatter(state)),
            ChartRequest::Trend => {
                ChartOutput::Trend(self.series(state, request, GroupKey::IncomeGroup))
            }
            ChartRequest::Region => {
                ChartOutput::Region(self.series(state, request, GroupKey::Region))
            }
            ChartRequest::Auc => ChartOutput::Auc(self.auc(state)),
            ChartRequest::Missingness => ChartOutput::Missingness(self.missingness(state)),
        }
    }

    /// Compute every view for one pass.
    #[must_use]
    pub fn compute_all(&self, state: &FilterState) -> ChartViews {
        ChartViews {
            map: self.map(state),
            scatter: self.scatter(state),
            trend: self.series(state, ChartRequest::Trend, GroupKey::IncomeGroup),
            region: self.series(state, ChartRequest::Region, GroupKey::Region),
            auc: self.auc(state),
            missingness: self.missingness(state),
        }
    }

    fn map(&self, state: &FilterState) -> ChartData<MapView> {
        let rows = self.rows(state, ChartRequest::Map);
        let selection = state.selected_year();

        let mut by_code: BTreeMap<&str, &Record> = BTreeMap::new();
        for record in &rows {
            by_code.entry(record.country_code.as_str()).or_insert(record);
        }

        let points: Vec<MapPoint> = aggregate(&rows, GroupKey::Country, YearMode::pooled(selection))
            .into_iter()
            .filter_map(|p| {
                let record = by_code.get(p.group.as_str())?;
                Some(MapPoint {
                    country: record.country.clone(),
                    income_group: record.income_group,
                    region: record.region.clone(),
                    life_expectancy: p.mean_value,
                    sample_count: p.sample_count,
                    country_code: p.group,
                })
            })
            .collect();

        if points.is_empty() {
            ChartData::DataAbsent
        } else {
            ChartData::Ready(MapView { selection, points })
        }
    }

    fn scatter(&self, state: &FilterState) -> ChartData<ScatterView> {
        let rows = self.rows(state, ChartRequest::Scatter);
        let points = scatter_points(&rows, state.selected_year());
        if points.is_empty() {
            return ChartData::DataAbsent;
        }
        let regressions = regressions(&points, self.config.min_regression_points);
        ChartData::Ready(ScatterView { points, regressions })
    }

    fn series(
        &self,
        state: &FilterState,
        request: ChartRequest,
        key: GroupKey,
    ) -> ChartData<Vec<GroupMeanPoint>> {
        let rows = self.rows(state, request);
        ChartData::non_empty(aggregate(&rows, key, YearMode::cumulative(state.selected_year())))
    }

    fn auc(&self, state: &FilterState) -> ChartData<Vec<AucBar>> {
        let rows = self.rows(state, ChartRequest::Auc);
        ChartData::non_empty(auc_bars(&rows, state.selected_year().year()))
    }

    fn missingness(&self, state: &FilterState) -> ChartData<Vec<MissingnessRow>> {
        if !self.missing.is_current_for(state) {
            tracing::warn!("Missingness profile was built for different membership filters");
        }
        match self.missing.lookup(state.selected_year()) {
            Some(rows) if !rows.is_empty() => ChartData::Ready(rows.to_vec()),
            _ => ChartData::DataAbsent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TrackedField;
    use crate::dataset::fixtures::sample_dataset;
    use crate::filter::{FilterDomain, RangeEdge};

    struct Fixture {
        dataset: Dataset,
        config: DashboardConfig,
        state: FilterState,
    }

    impl Fixture {
        fn new() -> Self {
            let dataset = sample_dataset();
            let state = FilterState::new(&FilterDomain::from_dataset(&dataset));
            let config = DashboardConfig::builder().min_regression_points(3).build().unwrap();
            Self { dataset, config, state }
        }

        fn views(&self) -> ChartViews {
            let missing =
                MissingnessProfile::build(&self.dataset, &self.state, TrackedField::all());
            AggregationEngine::new(&self.dataset, &self.config, &missing).compute_all(&self.state)
        }
    }

    #[test]
    fn test_all_views_ready_on_full_domain() {
        let views = Fixture::new().views();

        let map = views.map.ready().unwrap();
        assert_eq!(map.points.len(), 3);
        assert_eq!(map.selection, YearKey::All);
        let kenya = map.lookup("KEN").unwrap();
        assert_eq!(kenya.country, "Kenya");
        assert!((kenya.life_expectancy - 61.0).abs() < 1e-9);
        assert!(map.lookup("XXX").is_none());

        let scatter = views.scatter.ready().unwrap();
        assert_eq!(scatter.points.len(), 3);
        assert_eq!(scatter.regressions.len(), 3);
        assert!(scatter
            .regressions
            .iter()
            .all(|r| matches!(r, RegressionOutcome::InsufficientSample { points: 1, .. })));

        assert_eq!(views.trend.ready().unwrap().len(), 9);
        assert_eq!(views.region.ready().unwrap().len(), 6);
        assert_eq!(views.auc.ready().unwrap().len(), 3);
        assert_eq!(views.missingness.ready().unwrap().len(), 7);
    }

    #[test]
    fn test_recompute_is_identical() {
        let fixture = Fixture::new();
        assert_eq!(fixture.views(), fixture.views());
    }

    #[test]
    fn test_exact_year_selection() {
        let mut fixture = Fixture::new();
        fixture.state.select_year(YearKey::Year(2002));
        let views = fixture.views();

        let map = views.map.ready().unwrap();
        assert_eq!(map.selection, YearKey::Year(2002));
        assert!((map.lookup("NOR").unwrap().life_expectancy - 81.0).abs() < 1e-9);

        let trend = views.trend.ready().unwrap();
        assert_eq!(trend.len(), 6);
        assert!(trend.iter().all(|p| p.year <= YearKey::Year(2002)));

        let missing = views.missingness.ready().unwrap();
        assert!(missing.iter().all(|r| r.year_key == YearKey::Year(2002)));
    }

    #[test]
    fn test_empty_filter_gives_data_absent_everywhere() {
        let mut fixture = Fixture::new();
        fixture.state.set_income_groups([]);
        let views = fixture.views();

        assert!(views.map.is_absent());
        assert!(views.scatter.is_absent());
        assert!(views.trend.is_absent());
        assert!(views.region.is_absent());
        assert!(views.auc.is_absent());
        assert!(views.missingness.is_absent());
    }

    #[test]
    fn test_co2_range_skips_map_only() {
        let mut fixture = Fixture::new();
        fixture.state.set_co2_bound(RangeEdge::Max, 1500.0);
        let views = fixture.views();

        // Only Norway (co2 1000..1200) stays in the CO₂-aware views.
        assert_eq!(views.map.ready().unwrap().points.len(), 3);
        assert_eq!(views.scatter.ready().unwrap().points.len(), 1);
        assert_eq!(views.auc.ready().unwrap().len(), 1);
    }

    #[test]
    fn test_single_request_matches_compute_all() {
        let fixture = Fixture::new();
        let missing =
            MissingnessProfile::build(&fixture.dataset, &fixture.state, TrackedField::all());
        let engine = AggregationEngine::new(&fixture.dataset, &fixture.config, &missing);
        let views = engine.compute_all(&fixture.state);

        for request in ChartRequest::all() {
            let output = engine.compute(&fixture.state, *request);
            let same = match &output {
                ChartOutput::Map(d) => *d == views.map,
                ChartOutput::Scatter(d) => *d == views.scatter,
                ChartOutput::Trend(d) => *d == views.trend,
                ChartOutput::Region(d) => *d == views.region,
                ChartOutput::Auc(d) => *d == views.auc,
                ChartOutput::Missingness(d) => *d == views.missingness,
            };
            assert!(same, "{request} differs");
        }
    }
}
