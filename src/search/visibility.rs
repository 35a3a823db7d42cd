use log::trace;

use crate::ephemeris::{EclipseEvent, EclipseKind, Ephemeris};
use crate::location::Location;
use crate::search::types::{Thresholds, VisibilityMetric, VisibilityResult};

/// Decides whether an eclipse can be seen from a location.
///
/// Provider failures and empty answers count as "not visible"; they never
/// interrupt a scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisibilityTester {
    pub thresholds: Thresholds,
}

impl VisibilityTester {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn test(
        &self,
        provider: &dyn Ephemeris,
        event: &EclipseEvent,
        location: &Location,
    ) -> VisibilityResult {
        match event.kind {
            EclipseKind::Solar => self.test_solar(provider, event, location),
            EclipseKind::Lunar => self.test_lunar(provider, event, location),
        }
    }

    pub fn is_visible(
        &self,
        provider: &dyn Ephemeris,
        event: &EclipseEvent,
        location: &Location,
    ) -> bool {
        self.test(provider, event, location).visible
    }

    fn test_solar(
        &self,
        provider: &dyn Ephemeris,
        event: &EclipseEvent,
        location: &Location,
    ) -> VisibilityResult {
        let local = match provider.solar_local_circumstances(event.instant, location) {
            Ok(local) => local,
            Err(e) => {
                trace!("solar JD {:.5} at {}: {}", event.instant, location, e);
                return VisibilityResult::not_visible(event, location);
            }
        };

        let degenerate = !local.diameter_fraction.is_finite()
            || (local.diameter_fraction == 0.0 && local.obscuration == 0.0);
        let visible = !degenerate
            && local.status.in_progress()
            && local.diameter_fraction > self.thresholds.solar_min_fraction;

        let metric = if degenerate {
            VisibilityMetric::None
        } else {
            VisibilityMetric::Solar {
                diameter_fraction: local.diameter_fraction,
                obscuration: local.obscuration,
                sun_altitude_deg: local.sun_altitude_deg,
            }
        };

        VisibilityResult {
            kind: event.kind,
            instant: event.instant,
            location: location.clone(),
            visible,
            metric,
        }
    }

    fn test_lunar(
        &self,
        provider: &dyn Ephemeris,
        event: &EclipseEvent,
        location: &Location,
    ) -> VisibilityResult {
        let local = match provider.lunar_local_circumstances(event.instant, location) {
            Ok(local) => local,
            Err(e) => {
                trace!("lunar JD {:.5} at {}: {}", event.instant, location, e);
                return VisibilityResult::not_visible(event, location);
            }
        };

        let degenerate = !local.moon_altitude_deg.is_finite()
            || (local.umbral_magnitude <= 0.0 && local.penumbral_magnitude <= 0.0);
        let visible = !degenerate
            && local.status.in_progress()
            && local.moon_altitude_deg > self.thresholds.lunar_min_altitude_deg;

        let metric = if degenerate {
            VisibilityMetric::None
        } else {
            VisibilityMetric::Lunar {
                umbral_magnitude: local.umbral_magnitude,
                penumbral_magnitude: local.penumbral_magnitude,
                moon_altitude_deg: local.moon_altitude_deg,
            }
        };

        VisibilityResult {
            kind: event.kind,
            instant: event.instant,
            location: location.clone(),
            visible,
            metric,
        }
    }

    /// Every location from which `event` tests visible, best first.
    pub fn visible_locations(
        &self,
        provider: &dyn Ephemeris,
        event: &EclipseEvent,
        locations: &[Location],
    ) -> Vec<VisibilityResult> {
        let mut hits: Vec<VisibilityResult> = locations
            .iter()
            .map(|location| self.test(provider, event, location))
            .filter(|result| result.visible)
            .collect();
        hits.sort_by(|a, b| b.metric.score().total_cmp(&a.metric.score()));
        hits
    }
}
