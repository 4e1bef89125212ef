//! # lifedash
//!
//! Filter-state and multi-view aggregation core of a life expectancy
//! dashboard.
//!
//! One shared [`FilterState`] drives six views (map, scatter with
//! regression lines, income trends, region trends, cumulative burden bars,
//! missing-data profile). Every filter change runs one synchronous recompute
//! pass over an immutable [`Dataset`] and publishes a fresh
//! [`DashboardSnapshot`] under a new [`RenderToken`]; timed playback walks the
//! year selection through the same pass.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lifedash::{CsvImporter, DashboardConfig, DashboardSession, IncomeGroup};
//!
//! let (dataset, _report) = CsvImporter::auto_detect().import("life_expectancy_clean.csv")?;
//! let mut session = DashboardSession::new(Arc::new(dataset), DashboardConfig::default());
//!
//! let snapshot = session.toggle_income_group(IncomeGroup::High, false);
//! for bar in snapshot.views.auc.ready().into_iter().flatten() {
//!     println!("{}: {:.1}", bar.group, bar.auc_normalized);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`dataset`]: records, CSV import and the one-time async loader
//! - [`filter`]: filter state and row predicates
//! - [`aggregate`]: temporal grouping, scatter points, AUC bars
//! - [`stats`]: means, correlation, OLS with R², trapezoidal AUC
//! - [`missing`]: missing-data profile per year
//! - [`engine`]: the aggregation engine behind all six views
//! - [`session`]: filter mutations, recompute passes, highlight
//! - [`playback`]: year playback state machine, timer and driver
//! - [`guard`]: staleness tokens for late results
//! - [`insight`]: narrative summaries

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod filter;
pub mod guard;
pub mod insight;
pub mod missing;
pub mod playback;
pub mod session;
pub mod stats;

// Re-export commonly used types
pub use config::{DashboardConfig, DashboardConfigBuilder};
pub use dataset::{
    CsvImporter, CsvSchema, Dataset, ImportReport, IncomeGroup, Record, SharedDataset, TrackedField,
    YearKey,
};
pub use engine::{AggregationEngine, ChartData, ChartOutput, ChartRequest, ChartViews};
pub use error::{Error, Result};
pub use filter::{FilterDomain, FilterState, RangeEdge};
pub use guard::{LatestSlot, RenderToken, StalenessGuard};
pub use insight::{Insights, narrate};
pub use missing::{MissingnessProfile, MissingnessRow};
pub use playback::{PlaybackDriver, PlaybackEvent, PlaybackState, PlayerCommand};
pub use session::{DashboardSession, DashboardSnapshot};
pub use stats::{RSquared, Summary};
