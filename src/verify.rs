//! Independent geometric cross-check of accepted pairs.
//!
//! Recomputes Sun and Moon positions at each eclipse and checks that solar
//! eclipses sit near conjunction and lunar eclipses near opposition.
//! Discrepancies are listed, never corrected.

use log::warn;
use serde::Serialize;

use crate::ephemeris::frames::{angular_separation_deg, topocentric, wrap_180};
use crate::ephemeris::{Body, BodyPosition, EclipseEvent, EclipseKind, Ephemeris, EphemerisError};
use crate::location::Location;
use crate::search::{EclipsePair, Thresholds, VisibilityResult, VisibilityTester};
use crate::time::{format_jd, gmst_rad};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventCheck {
    pub event: EclipseEvent,
    pub location: Location,
    pub sun: BodyPosition,
    pub moon: BodyPosition,
    /// Great-circle Sun–Moon separation on RA/Dec.
    pub separation_deg: f64,
    /// Absolute ecliptic longitude difference folded into [0, 180].
    pub ecliptic_lon_diff_deg: f64,
    /// `|Δλ − 180°|`, lunar eclipses only.
    pub opposition_deviation_deg: Option<f64>,
    pub sun_altitude_deg: f64,
    pub moon_altitude_deg: f64,
    /// Local circumstances as the visibility tester sees them.
    pub visibility: VisibilityResult,
    pub issues: Vec<String>,
}

impl EventCheck {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairCheck {
    pub gap_days: f64,
    pub first: EventCheck,
    pub second: EventCheck,
}

impl PairCheck {
    pub fn passed(&self) -> bool {
        self.first.passed() && self.second.passed()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Verifier {
    pub thresholds: Thresholds,
}

impl Verifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn verify_event(
        &self,
        provider: &dyn Ephemeris,
        event: &EclipseEvent,
        location: &Location,
    ) -> Result<EventCheck, EphemerisError> {
        let sun = provider.body_position(event.instant, Body::Sun)?;
        let moon = provider.body_position(event.instant, Body::Moon)?;

        let separation_deg = angular_separation_deg(
            sun.right_ascension_deg,
            sun.declination_deg,
            moon.right_ascension_deg,
            moon.declination_deg,
        );
        let ecliptic_lon_diff_deg = wrap_180(moon.ecliptic_lon_deg - sun.ecliptic_lon_deg).abs();

        let sidereal = gmst_rad(event.instant);
        let sun_altitude_deg = altitude_deg(&sun, location, sidereal);
        let moon_altitude_deg = altitude_deg(&moon, location, sidereal);

        let visibility = VisibilityTester::new(self.thresholds).test(provider, event, location);

        let mut issues = Vec::new();
        let opposition_deviation_deg = match event.kind {
            EclipseKind::Solar => {
                if separation_deg > self.thresholds.solar_max_separation_deg {
                    issues.push(format!(
                        "Sun–Moon separation {:.4}° exceeds {:.2}°",
                        separation_deg, self.thresholds.solar_max_separation_deg
                    ));
                }
                if sun_altitude_deg <= 0.0 {
                    issues.push(format!("Sun below horizon ({:.2}°)", sun_altitude_deg));
                }
                None
            }
            EclipseKind::Lunar => {
                let deviation = (ecliptic_lon_diff_deg - 180.0).abs();
                if deviation > self.thresholds.lunar_max_opposition_deviation_deg {
                    issues.push(format!(
                        "{:.4}° from opposition exceeds {:.2}°",
                        deviation, self.thresholds.lunar_max_opposition_deviation_deg
                    ));
                }
                if moon_altitude_deg <= 0.0 {
                    issues.push(format!("Moon below horizon ({:.2}°)", moon_altitude_deg));
                }
                Some(deviation)
            }
        };
        if !visibility.visible {
            issues.push("visibility test does not pass at this location".to_string());
        }

        for issue in &issues {
            warn!(
                "{} eclipse at {} from {}: {}",
                event.kind,
                format_jd(event.instant),
                location,
                issue
            );
        }

        Ok(EventCheck {
            event: *event,
            location: location.clone(),
            sun,
            moon,
            separation_deg,
            ecliptic_lon_diff_deg,
            opposition_deviation_deg,
            sun_altitude_deg,
            moon_altitude_deg,
            visibility,
            issues,
        })
    }

    pub fn verify_pair(
        &self,
        provider: &dyn Ephemeris,
        pair: &EclipsePair,
    ) -> Result<PairCheck, EphemerisError> {
        Ok(PairCheck {
            gap_days: pair.gap_days,
            first: self.verify_event(provider, &pair.first, &pair.location)?,
            second: self.verify_event(provider, &pair.second, &pair.location)?,
        })
    }

    /// Cross-check the first `limit` pairs, one outcome per pair in order.
    /// A provider failure is logged against its pair and the rest still run.
    pub fn verify_pairs(
        &self,
        provider: &dyn Ephemeris,
        pairs: &[EclipsePair],
        limit: usize,
    ) -> Vec<PairVerification> {
        pairs
            .iter()
            .take(limit)
            .enumerate()
            .map(|(idx, pair)| match self.verify_pair(provider, pair) {
                Ok(check) => PairVerification::Checked(check),
                Err(e) => {
                    warn!("pair #{} at {} could not be verified: {}", idx + 1, pair.location, e);
                    PairVerification::Failed {
                        message: e.to_string(),
                    }
                }
            })
            .collect()
    }
}

/// Verification result for one pair of a search run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PairVerification {
    Checked(PairCheck),
    Failed { message: String },
}

impl PairVerification {
    pub fn check(&self) -> Option<&PairCheck> {
        match self {
            PairVerification::Checked(check) => Some(check),
            PairVerification::Failed { .. } => None,
        }
    }
}

/// Topocentric altitude from geocentric RA/Dec and mean sidereal time.
fn altitude_deg(body: &BodyPosition, location: &Location, sidereal_rad: f64) -> f64 {
    topocentric(
        body.right_ascension_deg,
        body.declination_deg,
        body.distance_km,
        location,
        sidereal_rad,
    )
    .altitude_deg
}
