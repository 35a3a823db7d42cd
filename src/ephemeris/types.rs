use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Body {
    Sun,
    Moon,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EclipseKind {
    Solar,
    Lunar,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EclipseClass {
    Total,
    Annular,
    Partial,
    Penumbral,
}

/// One eclipse as reported by the provider. `instant` is the time of
/// greatest eclipse as a UT Julian Day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EclipseEvent {
    pub kind: EclipseKind,
    pub instant: f64,
    pub class: EclipseClass,
    /// Global magnitude for solar eclipses, umbral magnitude for lunar ones
    /// (negative for penumbral-only eclipses).
    pub magnitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalStatus {
    Eclipse(EclipseClass),
    NoEclipse,
}

impl LocalStatus {
    pub fn in_progress(&self) -> bool {
        matches!(self, LocalStatus::Eclipse(_))
    }
}

/// Solar eclipse as seen from one place at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolarLocal {
    pub status: LocalStatus,
    /// Fraction of the solar diameter covered by the Moon.
    pub diameter_fraction: f64,
    /// Fraction of the solar disk area covered.
    pub obscuration: f64,
    pub sun_altitude_deg: f64,
    pub sun_azimuth_deg: f64,
    /// Topocentric Sun–Moon centre separation.
    pub separation_deg: f64,
}

/// Lunar eclipse as seen from one place at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LunarLocal {
    pub status: LocalStatus,
    pub umbral_magnitude: f64,
    pub penumbral_magnitude: f64,
    pub moon_altitude_deg: f64,
    pub moon_azimuth_deg: f64,
}

/// Apparent geocentric position of the Sun or Moon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodyPosition {
    pub body: Body,
    pub ecliptic_lon_deg: f64,
    pub ecliptic_lat_deg: f64,
    pub right_ascension_deg: f64,
    pub declination_deg: f64,
    pub distance_km: f64,
}

impl BodyPosition {
    pub fn distance_au(&self) -> f64 {
        self.distance_km / super::AU_KM
    }
}
