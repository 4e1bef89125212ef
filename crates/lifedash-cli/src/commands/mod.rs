//! Subcommands and the helpers they share.

pub mod missing;
pub mod play;
pub mod snapshot;
pub mod summary;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use lifedash::{
    DashboardConfig, DashboardSession, Dataset, IncomeGroup, RangeEdge, SharedDataset, YearKey,
};

/// Filter flags shared by commands that run a recompute pass.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Selected year (all years if omitted)
    #[arg(long)]
    pub year: Option<i32>,

    /// Income group to include; repeatable (all if omitted)
    #[arg(long = "income")]
    pub income: Vec<String>,

    /// Region to include; repeatable (all if omitted)
    #[arg(long = "region")]
    pub region: Vec<String>,

    /// Minimum life expectancy
    #[arg(long)]
    pub life_min: Option<f64>,

    /// Maximum life expectancy
    #[arg(long)]
    pub life_max: Option<f64>,

    /// Minimum CO₂
    #[arg(long)]
    pub co2_min: Option<f64>,

    /// Maximum CO₂
    #[arg(long)]
    pub co2_max: Option<f64>,
}

impl FilterArgs {
    /// Apply every flag to the session, one setter at a time.
    pub fn apply(&self, session: &mut DashboardSession) -> Result<()> {
        if !self.income.is_empty() {
            let groups = self
                .income
                .iter()
                .map(|name| {
                    IncomeGroup::from_str_loose(name)
                        .with_context(|| format!("Unknown income group: {name}"))
                })
                .collect::<Result<Vec<_>>>()?;
            session.set_income_groups(groups);
        }
        if !self.region.is_empty() {
            session.set_regions(&self.region);
        }
        if let Some(v) = self.life_min {
            session.set_life_bound(RangeEdge::Min, v);
        }
        if let Some(v) = self.life_max {
            session.set_life_bound(RangeEdge::Max, v);
        }
        if let Some(v) = self.co2_min {
            session.set_co2_bound(RangeEdge::Min, v);
        }
        if let Some(v) = self.co2_max {
            session.set_co2_bound(RangeEdge::Max, v);
        }
        if let Some(year) = self.year {
            session.select_year(YearKey::Year(year));
        }
        Ok(())
    }
}

/// Read the configuration file, or fall back to defaults.
pub fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    match path {
        Some(path) => DashboardConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config: {}", path.display())),
        None => Ok(DashboardConfig::default()),
    }
}

/// Load the CSV through the shared one-time loader.
pub async fn load_dataset(input: &Path, config: &DashboardConfig) -> Result<Arc<Dataset>> {
    let shared = SharedDataset::new(input).with_rolling_window(config.rolling_window);
    let dataset = shared
        .get_or_load()
        .await
        .with_context(|| format!("Failed to load dataset: {}", input.display()))?;
    if let Some(report) = shared.report() {
        tracing::info!(
            rows_read = report.rows_read,
            rows_kept = report.rows_kept,
            skipped = report.skipped_rows,
            malformed_cells = report.malformed_cells,
            "Loaded {}",
            input.display()
        );
    }
    Ok(dataset)
}

/// Load the dataset and open a session on it.
pub async fn open_session(input: &Path, config: DashboardConfig) -> Result<DashboardSession> {
    let dataset = load_dataset(input, &config).await?;
    Ok(DashboardSession::new(dataset, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_income_group_is_rejected() {
        let mut session =
            DashboardSession::new(Arc::new(Dataset::default()), DashboardConfig::default());
        let args = FilterArgs {
            income: vec!["Middle-ish".to_string()],
            ..FilterArgs::default()
        };
        assert!(args.apply(&mut session).is_err());
    }

    #[test]
    fn test_missing_config_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, DashboardConfig::default());
    }
}
