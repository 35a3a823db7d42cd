use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::ephemeris::EphemerisConfig;
use crate::location::{default_sites, Location, LocationGrid};
use crate::search::{MatchMode, MatchOptions, SearchWindow, Thresholds};
use crate::time::SECONDS_PER_DAY;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Run parameters. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub max_gap: MaxGap,
    pub max_iterations: usize,
    pub match_mode: MatchMode,
    pub thresholds: Thresholds,
    pub locations: LocationsConfig,
    pub ephemeris: EphemerisConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            max_gap: MaxGap::Days(15.0),
            max_iterations: 10_000,
            match_mode: MatchMode::First,
            thresholds: Thresholds::default(),
            locations: LocationsConfig::default(),
            ephemeris: EphemerisConfig::default(),
        }
    }
}

/// Astronomical years, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub start_year: i32,
    pub end_year: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        // 3100 BC through 3000 BC.
        Self {
            start_year: -3099,
            end_year: -2999,
        }
    }
}

/// Gap threshold as plain days (`15`, `14.5`) or a duration string (`"15days"`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MaxGap {
    Days(f64),
    Text(String),
}

impl MaxGap {
    pub fn days(&self) -> Result<f64, ConfigError> {
        let days = match self {
            MaxGap::Days(d) => *d,
            MaxGap::Text(s) => parse_gap(s)?,
        };
        if !(days.is_finite() && days >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_gap must be a non-negative number of days, got {}",
                days
            )));
        }
        Ok(days)
    }
}

/// Accepts a bare number of days or a humantime duration such as `"15days"`
/// or `"14d 12h"`.
pub fn parse_gap(s: &str) -> Result<f64, ConfigError> {
    let s = s.trim();
    if let Ok(days) = s.parse::<f64>() {
        return Ok(days);
    }
    humantime::parse_duration(s)
        .map(|d: Duration| d.as_secs_f64() / SECONDS_PER_DAY)
        .map_err(|e| ConfigError::Invalid(format!("max_gap '{}': {}", s, e)))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LocationsConfig {
    /// Regular lattice; `null` disables it.
    pub grid: Option<LocationGrid>,
    /// Named sites tested after the grid.
    pub sites: Vec<Location>,
}

impl Default for LocationsConfig {
    fn default() -> Self {
        Self {
            grid: Some(LocationGrid::default()),
            sites: default_sites(),
        }
    }
}

impl LocationsConfig {
    /// Grid points first, then the named sites.
    pub fn resolve(&self) -> Vec<Location> {
        let mut locations = self
            .grid
            .as_ref()
            .map(LocationGrid::points)
            .unwrap_or_default();
        locations.extend(self.sites.iter().cloned());
        locations
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Check the parameters that would otherwise surface as confusing search results.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.start_year > self.window.end_year {
            return Err(ConfigError::Invalid(format!(
                "window start year {} is after end year {}",
                self.window.start_year, self.window.end_year
            )));
        }
        self.max_gap.days()?;
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid("max_iterations must be positive".into()));
        }
        if let Some(grid) = &self.locations.grid {
            grid.validate().map_err(ConfigError::Invalid)?;
        }
        if self.locations.grid.is_none() && self.locations.sites.is_empty() {
            return Err(ConfigError::Invalid("no locations configured".into()));
        }
        let t = &self.thresholds;
        if t.solar_min_fraction < 0.0
            || t.solar_max_separation_deg <= 0.0
            || t.lunar_max_opposition_deviation_deg <= 0.0
        {
            return Err(ConfigError::Invalid("thresholds must be positive".into()));
        }
        Ok(())
    }

    pub fn search_window(&self) -> Result<SearchWindow, ConfigError> {
        SearchWindow::from_years(self.window.start_year, self.window.end_year).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "years {}..{} are outside the calendar",
                self.window.start_year, self.window.end_year
            ))
        })
    }

    pub fn match_options(&self) -> Result<MatchOptions, ConfigError> {
        Ok(MatchOptions {
            max_gap_days: self.max_gap.days()?,
            mode: self.match_mode,
            thresholds: self.thresholds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.window.start_year, -3099);
        assert_eq!(config.max_gap.days().unwrap(), 15.0);
        assert_eq!(config.locations.resolve().len(), 9 * 24 + default_sites().len());
        config.validate().unwrap();
    }

    #[test]
    fn parses_full_file() {
        let yaml = r#"
window: { start_year: -2500, end_year: -2400 }
max_gap: "14days 12h"
max_iterations: 500
match_mode: all
thresholds:
  solar_min_fraction: 0.01
locations:
  grid: { lat_step: 30, lon_step: 30 }
  sites:
    - { name: "Ur", latitude_deg: 30.96, longitude_deg: 46.1 }
ephemeris: { min_year: -5000, max_year: 3000 }
"#;
        let config = Config::from_str(yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.window.end_year, -2400);
        assert!((config.max_gap.days().unwrap() - 14.5).abs() < 1e-12);
        assert_eq!(config.match_mode, MatchMode::All);
        assert_eq!(config.thresholds.solar_min_fraction, 0.01);
        assert_eq!(config.thresholds.solar_max_separation_deg, 1.1);
        assert_eq!(config.ephemeris.min_year, -5000);
        assert!(config.ephemeris.data_path.is_none());

        let locations = config.locations.resolve();
        // lat -60..=60 by 30 (5) × lon -180..180 by 30 (12), plus one site.
        assert_eq!(locations.len(), 5 * 12 + 1);
        assert_eq!(locations.last().and_then(|l| l.name.as_deref()), Some("Ur"));
    }

    #[test]
    fn numeric_gap_is_days() {
        let config = Config::from_str("max_gap: 29.5").unwrap();
        assert_eq!(config.max_gap.days().unwrap(), 29.5);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Config::from_str("max_gap: soon").unwrap().validate(),
            Err(ConfigError::Invalid(_))
        ));
        assert!(Config::from_str("window: { start_year: 10, end_year: 5 }")
            .unwrap()
            .validate()
            .is_err());
        assert!(Config::from_str("locations: { grid: { lat_step: 0 } }")
            .unwrap()
            .validate()
            .is_err());
        assert!(Config::from_str("locations: { grid: null, sites: [] }")
            .unwrap()
            .validate()
            .is_err());
        assert!(matches!(
            Config::from_str("max_iterations: [1, 2]"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn gap_strings() {
        assert_eq!(parse_gap("15").unwrap(), 15.0);
        assert_eq!(parse_gap("15days").unwrap(), 15.0);
        assert!((parse_gap("36h").unwrap() - 1.5).abs() < 1e-12);
        assert!(parse_gap("fortnight").is_err());
    }
}
