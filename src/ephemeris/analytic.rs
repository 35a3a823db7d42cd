use std::path::PathBuf;

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::error::EphemerisError;
use super::frames::{self, Nutation, Topocentric};
use super::shadow::{self, MOON_RADIUS_KM, SUN_RADIUS_KM};
use super::types::{
    Body, BodyPosition, EclipseEvent, EclipseKind, LocalStatus, LunarLocal, SolarLocal,
};
use super::{moon, sun, EclipticPosition, Ephemeris};
use crate::location::Location;
use crate::time::{apparent_sidereal_time_rad, calendar_to_jd, decimal_year, DeltaT, J2000_JD};

/// Optional ΔT table looked up under the data path.
pub const DELTA_T_FILE: &str = "delta_t.txt";

const SYNODIC_MONTH_DAYS: f64 = 29.530588861;
/// First mean new moon of 2000, TT.
const NEW_MOON_EPOCH_TT: f64 = 2_451_550.09766;
/// Mean rate of change of the Sun–Moon elongation, deg/day.
const ELONGATION_RATE: f64 = 12.190749;
const SYZYGY_TOLERANCE_DEG: f64 = 1e-6;
const SYZYGY_MAX_ITER: u32 = 10;

/// Syzygies with the Moon further than this from the ecliptic are skipped.
const ECLIPSE_LAT_LIMIT_DEG: f64 = 2.0;
/// Greatest eclipse is searched within this many days of syzygy.
const GREATEST_WINDOW_DAYS: f64 = 0.25;
const GREATEST_TOLERANCE_DAYS: f64 = 1e-6;
/// There is at least one eclipse of each kind every twelve lunations.
const MAX_LUNATIONS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EphemerisConfig {
    /// Directory with optional backing tables (`delta_t.txt`).
    pub data_path: Option<PathBuf>,
    /// First supported astronomical year.
    pub min_year: i32,
    /// Last supported astronomical year.
    pub max_year: i32,
}

impl Default for EphemerisConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            min_year: -13_000,
            max_year: 17_000,
        }
    }
}

/// Sun and Moon for one instant, plus the frame quantities derived alongside.
struct Geocentric {
    sun: EclipticPosition,
    moon: EclipticPosition,
    nutation: Nutation,
    obliquity_deg: f64,
}

impl Geocentric {
    fn sun_moon_separation_deg(&self) -> f64 {
        frames::angular_separation_deg(
            self.moon.lon_deg,
            self.moon.lat_deg,
            self.sun.lon_deg,
            self.sun.lat_deg,
        )
    }

    /// Angular distance of the Moon's centre from the anti-solar point.
    fn shadow_offset_deg(&self) -> f64 {
        frames::angular_separation_deg(
            self.moon.lon_deg,
            self.moon.lat_deg,
            self.sun.lon_deg + 180.0,
            -self.sun.lat_deg,
        )
    }

    fn sidereal_rad(&self, jd_ut: f64) -> f64 {
        apparent_sidereal_time_rad(
            jd_ut,
            self.nutation.lon_deg.to_radians(),
            self.obliquity_deg.to_radians(),
        )
    }

    fn seen_from(&self, position: &EclipticPosition, observer: &Location, sidereal_rad: f64) -> Topocentric {
        let (ra, dec) =
            frames::ecliptic_to_equatorial(position.lon_deg, position.lat_deg, self.obliquity_deg);
        frames::topocentric(ra, dec, position.distance_km, observer, sidereal_rad)
    }
}

/// Self-contained Sun/Moon ephemeris with eclipse search.
#[derive(Debug, Clone)]
pub struct AnalyticEphemeris {
    delta_t: DeltaT,
    min_jd: f64,
    max_jd: f64,
}

impl AnalyticEphemeris {
    /// Set up the provider. A configured data path must exist; a `delta_t.txt`
    /// inside it replaces the built-in ΔT polynomials over its span.
    pub fn open(config: &EphemerisConfig) -> Result<Self, EphemerisError> {
        if config.min_year >= config.max_year {
            return Err(EphemerisError::InvalidConfig(format!(
                "min_year {} must be below max_year {}",
                config.min_year, config.max_year
            )));
        }
        let year_start = |year: i32| {
            calendar_to_jd(year, 1, 1, 0.0).ok_or_else(|| {
                EphemerisError::InvalidConfig(format!("year {} is not representable", year))
            })
        };
        let min_jd = year_start(config.min_year)?;
        let max_jd = year_start(config.max_year + 1)?;

        let delta_t = match &config.data_path {
            None => DeltaT::polynomial_only(),
            Some(path) => {
                if !path.is_dir() {
                    return Err(EphemerisError::DataPath(path.display().to_string()));
                }
                let table = path.join(DELTA_T_FILE);
                if table.is_file() {
                    let delta_t = DeltaT::load(&table)?;
                    info!("Loaded ΔT table from {}", table.display());
                    delta_t
                } else {
                    debug!(
                        "No {} under {}, using ΔT polynomials",
                        DELTA_T_FILE,
                        path.display()
                    );
                    DeltaT::polynomial_only()
                }
            }
        };

        Ok(Self {
            delta_t,
            min_jd,
            max_jd,
        })
    }

    pub fn delta_t(&self) -> &DeltaT {
        &self.delta_t
    }

    fn check_range(&self, jd: f64) -> Result<(), EphemerisError> {
        if jd.is_finite() && jd >= self.min_jd && jd <= self.max_jd {
            Ok(())
        } else {
            Err(EphemerisError::OutOfRange {
                jd,
                min: self.min_jd,
                max: self.max_jd,
            })
        }
    }

    fn jd_tt(&self, jd_ut: f64) -> f64 {
        jd_ut + self.delta_t.days(decimal_year(jd_ut))
    }

    fn geocentric(&self, jd_ut: f64) -> Geocentric {
        let t = (self.jd_tt(jd_ut) - J2000_JD) / 36525.0;
        let nutation = frames::nutation(t);
        Geocentric {
            sun: sun::apparent_position(t, nutation.lon_deg),
            moon: moon::apparent_position(t, nutation.lon_deg),
            obliquity_deg: frames::mean_obliquity_deg(t) + nutation.obliquity_deg,
            nutation,
        }
    }

    /// UT instant at which the Moon–Sun elongation equals `target_deg`
    /// (0 for new moon, 180 for full moon) near mean lunation `k`.
    fn syzygy(&self, k: f64, target_deg: f64) -> f64 {
        let estimate_tt = NEW_MOON_EPOCH_TT + SYNODIC_MONTH_DAYS * k;
        let mut jd = estimate_tt - self.delta_t.days(decimal_year(estimate_tt));

        for _ in 0..SYZYGY_MAX_ITER {
            let g = self.geocentric(jd);
            let error = frames::wrap_180(g.moon.lon_deg - g.sun.lon_deg - target_deg);
            jd -= error / ELONGATION_RATE;
            if error.abs() < SYZYGY_TOLERANCE_DEG {
                break;
            }
        }
        jd
    }

    /// Golden-section search for the minimum of `f` within the greatest-eclipse
    /// window around `center`.
    fn minimize<F: Fn(f64) -> f64>(center: f64, f: F) -> f64 {
        let inv_phi = (5f64.sqrt() - 1.0) / 2.0;
        let mut lo = center - GREATEST_WINDOW_DAYS;
        let mut hi = center + GREATEST_WINDOW_DAYS;
        let mut x1 = hi - inv_phi * (hi - lo);
        let mut x2 = lo + inv_phi * (hi - lo);
        let mut f1 = f(x1);
        let mut f2 = f(x2);

        while hi - lo > GREATEST_TOLERANCE_DAYS {
            if f1 < f2 {
                hi = x2;
                x2 = x1;
                f2 = f1;
                x1 = hi - inv_phi * (hi - lo);
                f1 = f(x1);
            } else {
                lo = x1;
                x1 = x2;
                f1 = f2;
                x2 = lo + inv_phi * (hi - lo);
                f2 = f(x2);
            }
        }
        0.5 * (lo + hi)
    }

    fn solar_eclipse_near(&self, k: f64) -> Option<EclipseEvent> {
        let syzygy = self.syzygy(k, 0.0);
        if self.geocentric(syzygy).moon.lat_deg.abs() > ECLIPSE_LAT_LIMIT_DEG {
            return None;
        }

        let instant = Self::minimize(syzygy, |jd| self.geocentric(jd).sun_moon_separation_deg());
        let g = self.geocentric(instant);
        let (class, magnitude) = shadow::classify_solar_global(
            g.sun_moon_separation_deg(),
            g.sun.distance_km,
            g.moon.distance_km,
        )?;

        Some(EclipseEvent {
            kind: EclipseKind::Solar,
            instant,
            class,
            magnitude,
        })
    }

    fn lunar_eclipse_near(&self, k: f64) -> Option<EclipseEvent> {
        let syzygy = self.syzygy(k, 180.0);
        if self.geocentric(syzygy).moon.lat_deg.abs() > ECLIPSE_LAT_LIMIT_DEG {
            return None;
        }

        let instant = Self::minimize(syzygy, |jd| self.geocentric(jd).shadow_offset_deg());
        let g = self.geocentric(instant);
        let offset = g.shadow_offset_deg();
        let radii = shadow::shadow_radii(g.sun.distance_km, g.moon.distance_km);
        let moon_radius = shadow::angular_radius_deg(MOON_RADIUS_KM, g.moon.distance_km);
        let class = shadow::classify_lunar(offset, moon_radius, radii)?;
        let (umbral, _) = shadow::lunar_magnitudes(offset, moon_radius, radii);

        Some(EclipseEvent {
            kind: EclipseKind::Lunar,
            instant,
            class,
            magnitude: umbral,
        })
    }

    fn find_next(&self, kind: EclipseKind, after: f64) -> Result<Option<EclipseEvent>, EphemerisError> {
        self.check_range(after)?;

        let lunation = ((self.jd_tt(after) - NEW_MOON_EPOCH_TT) / SYNODIC_MONTH_DAYS).floor() - 1.0;
        let phase = match kind {
            EclipseKind::Solar => 0.0,
            EclipseKind::Lunar => 0.5,
        };

        for i in 0..MAX_LUNATIONS {
            let k = lunation + i as f64 + phase;
            let estimate = NEW_MOON_EPOCH_TT + SYNODIC_MONTH_DAYS * k;
            self.check_range(estimate)?;

            let event = match kind {
                EclipseKind::Solar => self.solar_eclipse_near(k),
                EclipseKind::Lunar => self.lunar_eclipse_near(k),
            };
            match event {
                Some(event) if event.instant >= after => {
                    trace!("{} eclipse at JD {:.5} ({})", kind, event.instant, event.class);
                    return Ok(Some(event));
                }
                _ => continue,
            }
        }

        Ok(None)
    }
}

impl Ephemeris for AnalyticEphemeris {
    fn next_solar_eclipse(&self, after: f64) -> Result<Option<EclipseEvent>, EphemerisError> {
        self.find_next(EclipseKind::Solar, after)
    }

    fn next_lunar_eclipse(&self, after: f64) -> Result<Option<EclipseEvent>, EphemerisError> {
        self.find_next(EclipseKind::Lunar, after)
    }

    fn solar_local_circumstances(
        &self,
        instant: f64,
        location: &Location,
    ) -> Result<SolarLocal, EphemerisError> {
        self.check_range(instant)?;

        let g = self.geocentric(instant);
        let sidereal = g.sidereal_rad(instant);
        let sun = g.seen_from(&g.sun, location, sidereal);
        let moon = g.seen_from(&g.moon, location, sidereal);

        let separation = frames::angular_separation_deg(
            sun.right_ascension_deg,
            sun.declination_deg,
            moon.right_ascension_deg,
            moon.declination_deg,
        );
        let sun_radius = shadow::angular_radius_deg(SUN_RADIUS_KM, sun.distance_km);
        let moon_radius = shadow::angular_radius_deg(MOON_RADIUS_KM, moon.distance_km);

        // The upper limb must clear the horizon for any of the disk to be seen.
        let status = match shadow::classify_disks(sun_radius, moon_radius, separation) {
            Some(class) if sun.altitude_deg + sun_radius > 0.0 => LocalStatus::Eclipse(class),
            _ => LocalStatus::NoEclipse,
        };

        Ok(SolarLocal {
            status,
            diameter_fraction: shadow::diameter_fraction(sun_radius, moon_radius, separation),
            obscuration: shadow::obscuration(sun_radius, moon_radius, separation),
            sun_altitude_deg: sun.altitude_deg,
            sun_azimuth_deg: sun.azimuth_deg,
            separation_deg: separation,
        })
    }

    fn lunar_local_circumstances(
        &self,
        instant: f64,
        location: &Location,
    ) -> Result<LunarLocal, EphemerisError> {
        self.check_range(instant)?;

        let g = self.geocentric(instant);
        let offset = g.shadow_offset_deg();
        let radii = shadow::shadow_radii(g.sun.distance_km, g.moon.distance_km);
        let moon_radius = shadow::angular_radius_deg(MOON_RADIUS_KM, g.moon.distance_km);
        let (umbral, penumbral) = shadow::lunar_magnitudes(offset, moon_radius, radii);

        let status = match shadow::classify_lunar(offset, moon_radius, radii) {
            Some(class) => LocalStatus::Eclipse(class),
            None => LocalStatus::NoEclipse,
        };
        let moon = g.seen_from(&g.moon, location, g.sidereal_rad(instant));

        Ok(LunarLocal {
            status,
            umbral_magnitude: umbral,
            penumbral_magnitude: penumbral,
            moon_altitude_deg: moon.altitude_deg,
            moon_azimuth_deg: moon.azimuth_deg,
        })
    }

    fn body_position(&self, instant: f64, body: Body) -> Result<BodyPosition, EphemerisError> {
        self.check_range(instant)?;

        let g = self.geocentric(instant);
        let position = match body {
            Body::Sun => g.sun,
            Body::Moon => g.moon,
        };
        let (ra, dec) =
            frames::ecliptic_to_equatorial(position.lon_deg, position.lat_deg, g.obliquity_deg);

        Ok(BodyPosition {
            body,
            ecliptic_lon_deg: position.lon_deg,
            ecliptic_lat_deg: position.lat_deg,
            right_ascension_deg: ra,
            declination_deg: dec,
            distance_km: position.distance_km,
        })
    }

    fn supported_range(&self) -> (f64, f64) {
        (self.min_jd, self.max_jd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::EclipseClass;

    fn provider() -> AnalyticEphemeris {
        AnalyticEphemeris::open(&EphemerisConfig::default()).unwrap()
    }

    #[test]
    fn default_range_covers_antiquity() {
        let (min, max) = provider().supported_range();
        let bc_3100 = calendar_to_jd(-3099, 1, 1, 0.0).unwrap();
        assert!(min < bc_3100 && bc_3100 < max);
    }

    #[test]
    fn rejects_inverted_years() {
        let config = EphemerisConfig {
            min_year: 100,
            max_year: -100,
            ..EphemerisConfig::default()
        };
        assert!(matches!(
            AnalyticEphemeris::open(&config),
            Err(EphemerisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_missing_data_path() {
        let config = EphemerisConfig {
            data_path: Some(PathBuf::from("/nonexistent/eclipse-pairs-ephe")),
            ..EphemerisConfig::default()
        };
        assert!(matches!(
            AnalyticEphemeris::open(&config),
            Err(EphemerisError::DataPath(_))
        ));
    }

    #[test]
    fn loads_delta_t_table_from_data_path() {
        let dir = std::env::temp_dir().join(format!("eclipse-pairs-dt-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(DELTA_T_FILE), "# year seconds\n2000 63.8\n2010 66.1\n").unwrap();

        let config = EphemerisConfig {
            data_path: Some(dir.clone()),
            ..EphemerisConfig::default()
        };
        let eph = AnalyticEphemeris::open(&config).unwrap();
        assert!(eph.delta_t().is_tabulated());
        assert!((eph.delta_t().seconds(2005.0) - 64.95).abs() < 1e-9);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn queries_outside_range_fail() {
        let config = EphemerisConfig {
            min_year: -100,
            max_year: 100,
            ..EphemerisConfig::default()
        };
        let eph = AnalyticEphemeris::open(&config).unwrap();
        let jd_2017 = calendar_to_jd(2017, 8, 21, 18.0).unwrap();

        let err = eph.next_solar_eclipse(jd_2017).unwrap_err();
        assert!(err.is_out_of_range());
        assert!(eph.body_position(jd_2017, Body::Sun).unwrap_err().is_out_of_range());
        let site = Location::new(0.0, 0.0);
        assert!(eph.lunar_local_circumstances(jd_2017, &site).is_err());
    }

    #[test]
    fn new_moon_january_2000() {
        // New moon 2000-01-06 18:14 UT.
        let jd = provider().syzygy(0.0, 0.0);
        let expected = calendar_to_jd(2000, 1, 6, 18.0 + 14.0 / 60.0).unwrap();
        assert!((jd - expected).abs() < 0.01, "JD {jd} vs {expected}");
    }

    #[test]
    fn successive_eclipses_advance() {
        let eph = provider();
        let mut cursor = calendar_to_jd(2000, 1, 1, 0.0).unwrap();
        let mut previous: Option<f64> = None;
        for _ in 0..6 {
            let event = eph.next_lunar_eclipse(cursor).unwrap().unwrap();
            assert!(event.instant >= cursor);
            if let Some(prev) = previous {
                assert!(event.instant - prev > 25.0, "gap {}", event.instant - prev);
                assert!(event.instant - prev < 200.0, "gap {}", event.instant - prev);
            }
            previous = Some(event.instant);
            cursor = event.instant + 1.0;
        }
    }

    #[test]
    fn lunar_local_depends_on_moon_altitude() {
        // Total lunar eclipse of 2018-07-27, greatest near 20:22 UT.
        let eph = provider();
        let start = calendar_to_jd(2018, 7, 1, 0.0).unwrap();
        let event = eph.next_lunar_eclipse(start).unwrap().unwrap();
        assert_eq!(event.class, EclipseClass::Total);

        let babylon = Location::named("Babylon", 32.5, 44.4);
        let local = eph.lunar_local_circumstances(event.instant, &babylon).unwrap();
        assert_eq!(local.status, LocalStatus::Eclipse(EclipseClass::Total));
        assert!(local.moon_altitude_deg > 0.0, "alt {}", local.moon_altitude_deg);
        assert!(local.umbral_magnitude > 1.0);

        let kansas = Location::new(39.0, -98.0);
        let local = eph.lunar_local_circumstances(event.instant, &kansas).unwrap();
        assert!(local.moon_altitude_deg < 0.0, "alt {}", local.moon_altitude_deg);
    }

    #[test]
    fn solar_local_inside_and_outside_path() {
        // Total solar eclipse of 2017-08-21 over the United States.
        let eph = provider();
        let start = calendar_to_jd(2017, 8, 1, 0.0).unwrap();
        let event = eph.next_solar_eclipse(start).unwrap().unwrap();
        assert_eq!(event.class, EclipseClass::Total);

        let hopkinsville = Location::new(36.97, -87.67);
        let local = eph.solar_local_circumstances(event.instant, &hopkinsville).unwrap();
        assert!(local.status.in_progress());
        assert!(local.diameter_fraction > 0.95, "fraction {}", local.diameter_fraction);
        assert!(local.sun_altitude_deg > 50.0);

        // Night side.
        let perth = Location::new(-31.95, 115.86);
        let local = eph.solar_local_circumstances(event.instant, &perth).unwrap();
        assert_eq!(local.status, LocalStatus::NoEclipse);
        assert!(local.sun_altitude_deg < 0.0);
    }

    #[test]
    fn body_position_reports_both_frames() {
        let eph = provider();
        let jd = calendar_to_jd(2000, 3, 20, 7.5).unwrap();
        let sun = eph.body_position(jd, Body::Sun).unwrap();
        assert_eq!(sun.body, Body::Sun);
        assert!(sun.declination_deg.abs() < 0.05, "δ {}", sun.declination_deg);
        assert!((sun.distance_au() - 0.996).abs() < 0.01);

        let moon = eph.body_position(jd, Body::Moon).unwrap();
        assert!(moon.distance_km > 355_000.0 && moon.distance_km < 407_000.0);
        assert!(moon.declination_deg.abs() < 29.0);
    }
}
