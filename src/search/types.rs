use serde::{Deserialize, Serialize};

use crate::ephemeris::{EclipseEvent, EclipseKind};
use crate::location::Location;
use crate::time::calendar_to_jd;

/// Half-open scan window `[start, end)` in UT Julian Days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchWindow {
    pub start: f64,
    pub end: f64,
    /// How far past an accepted eclipse the next query starts.
    pub advance_days: f64,
}

impl SearchWindow {
    pub const DEFAULT_ADVANCE_DAYS: f64 = 1.0;

    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            advance_days: Self::DEFAULT_ADVANCE_DAYS,
        }
    }

    /// From 1 January of `start_year` through 31 December of `end_year`
    /// (astronomical numbering, so -3099 is 3100 BC).
    pub fn from_years(start_year: i32, end_year: i32) -> Option<Self> {
        let start = calendar_to_jd(start_year, 1, 1, 0.0)?;
        let end = calendar_to_jd(end_year, 12, 31, 23.99)?;
        Some(Self::new(start, end))
    }

    pub fn span_days(&self) -> f64 {
        self.end - self.start
    }
}

/// Thresholds of the visibility test and of the verifier. All are tunable
/// run parameters; the defaults are the empirically chosen values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum fraction of the solar diameter covered for a solar eclipse
    /// to count as seen.
    pub solar_min_fraction: f64,
    /// The Moon must stand above this altitude during a lunar eclipse.
    pub lunar_min_altitude_deg: f64,
    /// Largest geocentric Sun–Moon separation accepted at a solar eclipse.
    pub solar_max_separation_deg: f64,
    /// Largest departure from exact opposition accepted at a lunar eclipse.
    pub lunar_max_opposition_deviation_deg: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            solar_min_fraction: 0.001,
            lunar_min_altitude_deg: 0.0,
            solar_max_separation_deg: 1.1,
            lunar_max_opposition_deviation_deg: 0.09,
        }
    }
}

/// Whether a candidate pair stops at the first shared location.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchMode {
    #[default]
    First,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    pub max_gap_days: f64,
    pub mode: MatchMode,
    pub thresholds: Thresholds,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            max_gap_days: 15.0,
            mode: MatchMode::First,
            thresholds: Thresholds::default(),
        }
    }
}

/// Quantity the visibility decision was based on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VisibilityMetric {
    Solar {
        diameter_fraction: f64,
        obscuration: f64,
        sun_altitude_deg: f64,
    },
    Lunar {
        umbral_magnitude: f64,
        penumbral_magnitude: f64,
        moon_altitude_deg: f64,
    },
    /// The provider gave nothing usable.
    None,
}

impl VisibilityMetric {
    /// Single number used to rank locations: covered diameter fraction for
    /// solar eclipses, Moon altitude for lunar ones.
    pub fn score(&self) -> f64 {
        match self {
            VisibilityMetric::Solar {
                diameter_fraction, ..
            } => *diameter_fraction,
            VisibilityMetric::Lunar {
                moon_altitude_deg, ..
            } => *moon_altitude_deg,
            VisibilityMetric::None => f64::NEG_INFINITY,
        }
    }
}

impl std::fmt::Display for VisibilityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VisibilityMetric::Solar {
                diameter_fraction,
                obscuration,
                sun_altitude_deg,
            } => write!(
                f,
                "coverage {:.3} of diameter, {:.3} of area, Sun at {:.1}°",
                diameter_fraction, obscuration, sun_altitude_deg
            ),
            VisibilityMetric::Lunar {
                umbral_magnitude,
                penumbral_magnitude,
                moon_altitude_deg,
            } => write!(
                f,
                "umbral mag {:.3}, penumbral mag {:.3}, Moon at {:.1}°",
                umbral_magnitude, penumbral_magnitude, moon_altitude_deg
            ),
            VisibilityMetric::None => write!(f, "no data"),
        }
    }
}

/// Outcome of testing one eclipse at one place. Derived on demand, never stored
/// apart from the pair that needed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibilityResult {
    pub kind: EclipseKind,
    pub instant: f64,
    pub location: Location,
    pub visible: bool,
    pub metric: VisibilityMetric,
}

impl VisibilityResult {
    pub fn not_visible(event: &EclipseEvent, location: &Location) -> Self {
        Self {
            kind: event.kind,
            instant: event.instant,
            location: location.clone(),
            visible: false,
            metric: VisibilityMetric::None,
        }
    }
}

/// Two eclipses within the gap threshold, both seen from `location`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EclipsePair {
    pub first: EclipseEvent,
    pub second: EclipseEvent,
    pub gap_days: f64,
    pub location: Location,
    pub first_visibility: VisibilityMetric,
    pub second_visibility: VisibilityMetric,
}

impl EclipsePair {
    pub fn kinds(&self) -> (EclipseKind, EclipseKind) {
        (self.first.kind, self.second.kind)
    }
}
