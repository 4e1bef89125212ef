//! Dashboard configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dataset::TrackedField;
use crate::error::{Error, Result};

/// Tunables shared by the session, the engine and the playback driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Time between playback ticks.
    #[serde(with = "duration_millis")]
    pub playback_period: Duration,

    /// Points an income group needs before a regression line is fitted.
    pub min_regression_points: usize,

    /// Fields audited by the missingness profile.
    pub tracked_fields: Vec<TrackedField>,

    /// Window, in rows, of the derived trailing life expectancy average.
    pub rolling_window: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            playback_period: Duration::from_millis(1200),
            min_regression_points: 5,
            tracked_fields: TrackedField::all().to_vec(),
            rolling_window: 5,
        }
    }
}

impl DashboardConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }

    /// Read a JSON configuration file. Missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the dashboard cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.playback_period.is_zero() {
            return Err(Error::Config("playback_period must be positive".to_string()));
        }
        if self.min_regression_points < 2 {
            return Err(Error::Config(format!(
                "min_regression_points must be at least 2, got {}",
                self.min_regression_points
            )));
        }
        if self.rolling_window == 0 {
            return Err(Error::Config("rolling_window must be positive".to_string()));
        }
        Ok(())
    }
}

/// Builder for [`DashboardConfig`].
#[derive(Debug, Default)]
pub struct DashboardConfigBuilder {
    playback_period: Option<Duration>,
    min_regression_points: Option<usize>,
    tracked_fields: Option<Vec<TrackedField>>,
    rolling_window: Option<usize>,
}

impl DashboardConfigBuilder {
    /// Set the playback tick period.
    #[must_use]
    pub fn playback_period(mut self, period: Duration) -> Self {
        self.playback_period = Some(period);
        self
    }

    /// Set the regression sample threshold.
    #[must_use]
    pub fn min_regression_points(mut self, points: usize) -> Self {
        self.min_regression_points = Some(points);
        self
    }

    /// Set the fields audited for missing data.
    #[must_use]
    pub fn tracked_fields(mut self, fields: Vec<TrackedField>) -> Self {
        self.tracked_fields = Some(fields);
        self
    }

    /// Set the rolling average window.
    #[must_use]
    pub fn rolling_window(mut self, window: usize) -> Self {
        self.rolling_window = Some(window);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<DashboardConfig> {
        let defaults = DashboardConfig::default();
        let config = DashboardConfig {
            playback_period: self.playback_period.unwrap_or(defaults.playback_period),
            min_regression_points: self
                .min_regression_points
                .unwrap_or(defaults.min_regression_points),
            tracked_fields: self.tracked_fields.unwrap_or(defaults.tracked_fields),
            rolling_window: self.rolling_window.unwrap_or(defaults.rolling_window),
        };
        config.validate()?;
        Ok(config)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.playback_period, Duration::from_millis(1200));
        assert_eq!(config.min_regression_points, 5);
        assert_eq!(config.tracked_fields.len(), 7);
        assert_eq!(config.rolling_window, 5);
    }

    #[test]
    fn test_builder_overrides() {
        let config = DashboardConfig::builder()
            .playback_period(Duration::from_millis(250))
            .min_regression_points(3)
            .tracked_fields(vec![TrackedField::Co2])
            .build()
            .unwrap();
        assert_eq!(config.playback_period, Duration::from_millis(250));
        assert_eq!(config.min_regression_points, 3);
        assert_eq!(config.tracked_fields, vec![TrackedField::Co2]);
        assert_eq!(config.rolling_window, 5);
    }

    #[test]
    fn test_builder_rejects_zero_period() {
        let result = DashboardConfig::builder()
            .playback_period(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_json_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"playback_period": 500, "tracked_fields": ["sanitation", "co2"]}}"#
        )
        .unwrap();

        let config = DashboardConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.playback_period, Duration::from_millis(500));
        assert_eq!(
            config.tracked_fields,
            vec![TrackedField::Sanitation, TrackedField::Co2]
        );
        assert_eq!(config.min_regression_points, 5);
    }

    #[test]
    fn test_json_round_trip_uses_millis() {
        let json = serde_json::to_value(DashboardConfig::default()).unwrap();
        assert_eq!(json["playback_period"], 1200);
    }
}
