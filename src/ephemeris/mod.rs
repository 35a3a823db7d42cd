//! Eclipse and Sun/Moon position provider.
//!
//! Everything astronomical sits behind the [`Ephemeris`] trait so the search
//! pipeline can run against [`AnalyticEphemeris`] in production and against
//! scripted stubs in tests. All instants are Julian Days in UT.

mod analytic;
mod error;
pub mod frames;
mod moon;
pub mod shadow;
mod sun;
mod types;

pub use analytic::{AnalyticEphemeris, EphemerisConfig, DELTA_T_FILE};
pub use error::EphemerisError;
pub use types::{
    Body, BodyPosition, EclipseClass, EclipseEvent, EclipseKind, LocalStatus, LunarLocal,
    SolarLocal,
};

use crate::location::Location;

/// Astronomical unit in km (IAU 2012).
pub const AU_KM: f64 = 149_597_870.7;

/// Apparent geocentric ecliptic coordinates of date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EclipticPosition {
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub distance_km: f64,
}

pub trait Ephemeris {
    /// Next solar eclipse whose greatest phase falls on or after `after`.
    /// `Ok(None)` means no further eclipse could be located.
    fn next_solar_eclipse(&self, after: f64) -> Result<Option<EclipseEvent>, EphemerisError>;

    /// Next lunar eclipse whose greatest phase falls on or after `after`.
    fn next_lunar_eclipse(&self, after: f64) -> Result<Option<EclipseEvent>, EphemerisError>;

    fn solar_local_circumstances(
        &self,
        instant: f64,
        location: &Location,
    ) -> Result<SolarLocal, EphemerisError>;

    fn lunar_local_circumstances(
        &self,
        instant: f64,
        location: &Location,
    ) -> Result<LunarLocal, EphemerisError>;

    fn body_position(&self, instant: f64, body: Body) -> Result<BodyPosition, EphemerisError>;

    /// Inclusive `(min_jd, max_jd)` the provider accepts.
    fn supported_range(&self) -> (f64, f64);

    fn next_eclipse(
        &self,
        kind: EclipseKind,
        after: f64,
    ) -> Result<Option<EclipseEvent>, EphemerisError> {
        match kind {
            EclipseKind::Solar => self.next_solar_eclipse(after),
            EclipseKind::Lunar => self.next_lunar_eclipse(after),
        }
    }
}
