use serde::{Deserialize, Serialize};

// WGS-84
const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.137;
const EARTH_ECCENTRICITY_SQ: f64 = 0.00669437999014;

/// An observing site on the Earth's surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    #[serde(default)]
    pub altitude_m: f64,
}

impl Location {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            name: None,
            latitude_deg,
            longitude_deg,
            altitude_m: 0.0,
        }
    }

    pub fn named(name: &str, latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::new(latitude_deg, longitude_deg)
        }
    }

    /// Parse `"lat,lon"` (degrees, north and east positive).
    pub fn from_coordinates(coordinates: &str, altitude_m: Option<f64>) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            return None;
        }
        let lat: f64 = parts[0].parse().ok()?;
        let lon: f64 = parts[1].parse().ok()?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=360.0).contains(&lon) {
            return None;
        }
        Some(Self {
            altitude_m: altitude_m.unwrap_or(0.0),
            ..Self::new(lat, lon)
        })
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    /// Earth-fixed geocentric position in km.
    pub fn position_ecef_km(&self) -> [f64; 3] {
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let n = EARTH_EQUATORIAL_RADIUS_KM / (1.0 - EARTH_ECCENTRICITY_SQ * sin_lat * sin_lat).sqrt();
        let alt_km = self.altitude_m / 1000.0;
        [
            (n + alt_km) * cos_lat * lon.cos(),
            (n + alt_km) * cos_lat * lon.sin(),
            (n * (1.0 - EARTH_ECCENTRICITY_SQ) + alt_km) * sin_lat,
        ]
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ns = if self.latitude_deg < 0.0 { 'S' } else { 'N' };
        let ew = if self.longitude_deg < 0.0 { 'W' } else { 'E' };
        write!(
            f,
            "{}°{}, {}°{}",
            self.latitude_deg.abs(),
            ns,
            self.longitude_deg.abs(),
            ew
        )?;
        if let Some(name) = &self.name {
            write!(f, " ({})", name)?;
        }
        Ok(())
    }
}

/// Regular latitude/longitude lattice. Latitude bounds are inclusive,
/// the upper longitude bound is exclusive so −180 and 180 are not both sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationGrid {
    #[serde(default = "default_lat_min")]
    pub lat_min: f64,
    #[serde(default = "default_lat_max")]
    pub lat_max: f64,
    #[serde(default = "default_step")]
    pub lat_step: f64,
    #[serde(default = "default_lon_min")]
    pub lon_min: f64,
    #[serde(default = "default_lon_max")]
    pub lon_max: f64,
    #[serde(default = "default_step")]
    pub lon_step: f64,
}

fn default_lat_min() -> f64 {
    -60.0
}

fn default_lat_max() -> f64 {
    60.0
}

fn default_lon_min() -> f64 {
    -180.0
}

fn default_lon_max() -> f64 {
    180.0
}

fn default_step() -> f64 {
    15.0
}

impl Default for LocationGrid {
    fn default() -> Self {
        Self {
            lat_min: default_lat_min(),
            lat_max: default_lat_max(),
            lat_step: default_step(),
            lon_min: default_lon_min(),
            lon_max: default_lon_max(),
            lon_step: default_step(),
        }
    }
}

impl LocationGrid {
    pub fn with_step(step_deg: f64) -> Self {
        Self {
            lat_step: step_deg,
            lon_step: step_deg,
            ..Self::default()
        }
    }

    /// Checks that both steps are positive and the bounds are ordered.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.lat_step > 0.0 && self.lon_step > 0.0) {
            return Err("grid steps must be positive".into());
        }
        if self.lat_min > self.lat_max || self.lon_min >= self.lon_max {
            return Err("grid bounds are inverted".into());
        }
        if self.lat_min < -90.0 || self.lat_max > 90.0 {
            return Err("grid latitude outside [-90, 90]".into());
        }
        Ok(())
    }

    /// Latitude-major list of grid points.
    pub fn points(&self) -> Vec<Location> {
        const EPS: f64 = 1e-9;
        let mut points = Vec::new();
        if self.validate().is_err() {
            return points;
        }

        let mut i = 0u32;
        loop {
            let lat = self.lat_min + i as f64 * self.lat_step;
            if lat > self.lat_max + EPS {
                break;
            }
            let mut j = 0u32;
            loop {
                let lon = self.lon_min + j as f64 * self.lon_step;
                if lon >= self.lon_max - EPS {
                    break;
                }
                points.push(Location::new(lat, lon));
                j += 1;
            }
            i += 1;
        }

        points
    }
}

/// Ancient sites used when no other site list is configured.
pub fn default_sites() -> Vec<Location> {
    vec![
        Location::named("Babylon", 32.5, 44.4),
        Location::named("Memphis", 29.8, 31.2),
        Location::named("Athens", 38.0, 23.7),
        Location::named("Rome", 41.9, 12.5),
        Location::named("Jerusalem", 31.8, 35.2),
        Location::named("Persepolis", 29.9, 52.9),
        Location::named("Harappa", 30.6, 72.9),
        Location::named("Mohenjo-daro", 27.3, 68.1),
        Location::named("Chang'an", 34.3, 108.9),
        Location::named("Uruk", 31.3, 45.6),
    ]
}
