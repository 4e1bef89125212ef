//! Dashboard session.
//!
//! [`DashboardSession`] owns the one mutable piece of the dashboard, the
//! [`FilterState`], together with the playback state and the highlighted
//! entity. Every filter mutation goes through a session method that stops
//! playback if it is running, applies the setter, and runs one complete
//! recompute pass under a fresh [`RenderToken`].
//!
//! # Example
//!
//! ```rust,ignore
//! use lifedash::{DashboardConfig, DashboardSession};
//!
//! let mut session = DashboardSession::new(dataset, DashboardConfig::default());
//! let snapshot = session.select_year(YearKey::Year(2010));
//! if let Some(map) = snapshot.views.map.ready() {
//!     println!("{} countries", map.points.len());
//! }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DashboardConfig;
use crate::dataset::{Dataset, IncomeGroup, YearKey};
use crate::engine::{AggregationEngine, ChartViews, MapPoint};
use crate::error::Result;
use crate::filter::{FilterDomain, FilterState, RangeEdge};
use crate::guard::{LatestSlot, RenderToken, StalenessGuard};
use crate::missing::MissingnessProfile;
use crate::playback::{PlaybackEffect, PlaybackEvent, PlaybackState, transition};

/// Output of one recompute pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Token the pass ran under.
    pub token: RenderToken,
    /// Year selection of the pass.
    pub selection: YearKey,
    /// Filters the pass ran with.
    pub filters: FilterState,
    /// When the pass finished.
    #[serde(with = "chrono_serde")]
    pub computed_at: DateTime<Utc>,
    /// The six views.
    pub views: ChartViews,
}

/// Single-user dashboard state and its latest snapshot.
#[derive(Debug)]
pub struct DashboardSession {
    dataset: Arc<Dataset>,
    config: DashboardConfig,
    domain: FilterDomain,
    filters: FilterState,
    missing: MissingnessProfile,
    guard: StalenessGuard,
    playback: PlaybackState,
    pending_timer: Vec<PlaybackEffect>,
    highlight: Option<String>,
    snapshot: DashboardSnapshot,
}

impl DashboardSession {
    /// Start a session with full-domain filters and publish the first
    /// snapshot.
    #[must_use]
    pub fn new(dataset: Arc<Dataset>, config: DashboardConfig) -> Self {
        let domain = FilterDomain::from_dataset(&dataset);
        let filters = FilterState::new(&domain);
        let missing = MissingnessProfile::build(&dataset, &filters, &config.tracked_fields);
        let guard = StalenessGuard::new();

        let token = guard.issue();
        let snapshot = Self::pass(&dataset, &config, &missing, &filters, token);

        tracing::info!(
            rows = dataset.len(),
            countries = dataset.country_count(),
            regions = domain.regions.len(),
            years = domain.years.years().len(),
            "Dashboard session ready"
        );

        Self {
            dataset,
            config,
            domain,
            filters,
            missing,
            guard,
            playback: PlaybackState::Stopped,
            pending_timer: Vec::new(),
            highlight: None,
            snapshot,
        }
    }

    fn pass(
        dataset: &Dataset,
        config: &DashboardConfig,
        missing: &MissingnessProfile,
        filters: &FilterState,
        token: RenderToken,
    ) -> DashboardSnapshot {
        let views = AggregationEngine::new(dataset, config, missing).compute_all(filters);
        tracing::debug!(
            %token,
            selection = %filters.selected_year(),
            map_absent = views.map.is_absent(),
            scatter_absent = views.scatter.is_absent(),
            "Recomputed views"
        );
        DashboardSnapshot {
            token,
            selection: filters.selected_year(),
            filters: filters.clone(),
            computed_at: Utc::now(),
            views,
        }
    }

    /// Run one full recompute pass under a new token.
    pub fn recompute(&mut self) -> &DashboardSnapshot {
        if !self.missing.is_current_for(&self.filters) {
            self.missing = MissingnessProfile::build(
                &self.dataset,
                &self.filters,
                &self.config.tracked_fields,
            );
        }
        let token = self.guard.issue();
        self.snapshot =
            Self::pass(&self.dataset, &self.config, &self.missing, &self.filters, token);
        &self.snapshot
    }

    /// Latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &DashboardSnapshot {
        &self.snapshot
    }

    /// The dataset.
    #[must_use]
    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Filter domain.
    #[must_use]
    pub fn domain(&self) -> &FilterDomain {
        &self.domain
    }

    /// Current filters.
    #[must_use]
    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Current missingness profile.
    #[must_use]
    pub fn missingness(&self) -> &MissingnessProfile {
        &self.missing
    }

    /// Playback state.
    #[must_use]
    pub fn playback_state(&self) -> PlaybackState {
        self.playback
    }

    /// Handle on the token counter, for out-of-band work.
    #[must_use]
    pub fn guard(&self) -> &StalenessGuard {
        &self.guard
    }

    /// An empty slot that only accepts results carrying the current token.
    #[must_use]
    pub fn late_slot<T>(&self) -> LatestSlot<T> {
        LatestSlot::new(self.guard.clone())
    }

    fn manual<F>(&mut self, edit: F) -> &DashboardSnapshot
    where
        F: FnOnce(&mut FilterState, &FilterDomain),
    {
        if self.playback.is_playing() {
            tracing::info!("Manual filter change stops playback");
            self.playback = PlaybackState::Stopped;
            self.pending_timer.push(PlaybackEffect::CancelTick);
        }
        edit(&mut self.filters, &self.domain);
        self.recompute()
    }

    /// Toggle an income group.
    pub fn toggle_income_group(&mut self, group: IncomeGroup, active: bool) -> &DashboardSnapshot {
        self.manual(|f, _| f.set_income_group(group, active))
    }

    /// Replace the active income groups.
    pub fn set_income_groups(
        &mut self,
        groups: impl IntoIterator<Item = IncomeGroup>,
    ) -> &DashboardSnapshot {
        self.manual(|f, _| f.set_income_groups(groups))
    }

    /// Toggle a region.
    pub fn toggle_region(&mut self, region: &str, active: bool) -> &DashboardSnapshot {
        self.manual(|f, _| f.set_region(region, active))
    }

    /// Replace the active regions.
    pub fn set_regions<S: AsRef<str>>(
        &mut self,
        regions: impl IntoIterator<Item = S>,
    ) -> &DashboardSnapshot {
        self.manual(|f, _| f.set_regions(regions))
    }

    /// Edit a life expectancy bound.
    pub fn set_life_bound(&mut self, edge: RangeEdge, value: f64) -> &DashboardSnapshot {
        self.manual(|f, _| f.set_life_bound(edge, value))
    }

    /// Edit a CO₂ bound.
    pub fn set_co2_bound(&mut self, edge: RangeEdge, value: f64) -> &DashboardSnapshot {
        self.manual(|f, _| f.set_co2_bound(edge, value))
    }

    /// Select a year or all years.
    pub fn select_year(&mut self, year: YearKey) -> &DashboardSnapshot {
        self.manual(|f, _| f.select_year(year))
    }

    /// Select by raw year slider position.
    pub fn select_slider(&mut self, value: i32) -> &DashboardSnapshot {
        self.manual(|f, d| f.select_year(d.years.from_slider(value)))
    }

    /// Restore full-domain filters, keeping the year.
    pub fn reset_filters(&mut self) -> &DashboardSnapshot {
        self.manual(|f, d| f.reset(d))
    }

    /// Timer effects queued by manual interactions since the last call.
    pub fn take_timer_effects(&mut self) -> Vec<PlaybackEffect> {
        std::mem::take(&mut self.pending_timer)
    }

    /// Feed a playback event through the state machine.
    ///
    /// Year selection and recompute effects are applied here; the timer
    /// effects are returned for the owner of the timer.
    pub fn playback(&mut self, event: PlaybackEvent) -> Result<Vec<PlaybackEffect>> {
        let step = transition(
            self.playback,
            event,
            &self.domain.years,
            self.config.playback_period,
        )?;
        if step.next != self.playback {
            tracing::info!(from = ?self.playback, to = ?step.next, ?event, "Playback transition");
        }
        self.playback = step.next;

        let mut timer = Vec::new();
        for effect in step.effects {
            match effect {
                PlaybackEffect::SelectYear(year) => self.filters.select_year(year),
                PlaybackEffect::Recompute => {
                    self.recompute();
                }
                PlaybackEffect::ScheduleTick(_) | PlaybackEffect::CancelTick => timer.push(effect),
            }
        }
        Ok(timer)
    }

    /// Set or clear the highlighted country code.
    pub fn highlight(&mut self, key: Option<String>) {
        self.highlight = key;
    }

    /// Highlighted country code.
    #[must_use]
    pub fn highlighted(&self) -> Option<&str> {
        self.highlight.as_deref()
    }

    /// The highlighted country in the current map view, if it is on it.
    #[must_use]
    pub fn highlighted_map_point(&self) -> Option<&MapPoint> {
        let key = self.highlight.as_deref()?;
        self.snapshot.views.map.ready()?.lookup(key)
    }
}

mod chrono_serde {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        dt.to_rfc3339().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
