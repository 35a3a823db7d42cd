//! Rotations and spherical geometry shared by the Sun/Moon theories,
//! local circumstances and the verifier.

use crate::location::Location;

/// Low-precision nutation, degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nutation {
    pub lon_deg: f64,
    pub obliquity_deg: f64,
}

/// Four-term nutation series; `t` is Julian centuries of TT from J2000.
pub fn nutation(t: f64) -> Nutation {
    let omega = (125.04452 - 1934.136261 * t).to_radians();
    let sun_l = (280.4665 + 36000.7698 * t).to_radians();
    let moon_l = (218.3165 + 481267.8813 * t).to_radians();

    let dpsi = -17.20 * omega.sin() - 1.32 * (2.0 * sun_l).sin() - 0.23 * (2.0 * moon_l).sin()
        + 0.21 * (2.0 * omega).sin();
    let deps = 9.20 * omega.cos() + 0.57 * (2.0 * sun_l).cos() + 0.10 * (2.0 * moon_l).cos()
        - 0.09 * (2.0 * omega).cos();

    Nutation {
        lon_deg: dpsi / 3600.0,
        obliquity_deg: deps / 3600.0,
    }
}

/// Mean obliquity of the ecliptic, degrees.
pub fn mean_obliquity_deg(t: f64) -> f64 {
    23.439_291_11 - (46.8150 * t + 0.00059 * t * t - 0.001813 * t * t * t) / 3600.0
}

pub fn normalize_deg(angle: f64) -> f64 {
    angle.rem_euclid(360.0)
}

/// Wrap an angle into (−180, 180].
pub fn wrap_180(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    if a > 180.0 {
        a - 360.0
    } else {
        a
    }
}

/// Ecliptic (λ, β) to equatorial (α, δ); all degrees, α in [0, 360).
pub fn ecliptic_to_equatorial(lon_deg: f64, lat_deg: f64, obliquity_deg: f64) -> (f64, f64) {
    let lon = lon_deg.to_radians();
    let lat = lat_deg.to_radians();
    let eps = obliquity_deg.to_radians();

    let ra = (lon.sin() * eps.cos() - lat.tan() * eps.sin()).atan2(lon.cos());
    let dec = (lat.sin() * eps.cos() + lat.cos() * eps.sin() * lon.sin())
        .clamp(-1.0, 1.0)
        .asin();
    (normalize_deg(ra.to_degrees()), dec.to_degrees())
}

/// Great-circle separation between two points given as (longitude, latitude)
/// pairs in degrees. Works for both ecliptic and equatorial coordinates.
pub fn angular_separation_deg(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (lon1, lat1, lon2, lat2) = (
        lon1.to_radians(),
        lat1.to_radians(),
        lon2.to_radians(),
        lat2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    (2.0 * a.sqrt().clamp(0.0, 1.0).asin()).to_degrees()
}

pub fn spherical_to_cartesian(lon_deg: f64, lat_deg: f64, distance: f64) -> [f64; 3] {
    let lon = lon_deg.to_radians();
    let lat = lat_deg.to_radians();
    [
        distance * lat.cos() * lon.cos(),
        distance * lat.cos() * lon.sin(),
        distance * lat.sin(),
    ]
}

/// Returns (longitude in [0, 360), latitude, distance).
pub fn cartesian_to_spherical(v: [f64; 3]) -> (f64, f64, f64) {
    let r = norm(v);
    if r == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let lon = v[1].atan2(v[0]).to_degrees();
    let lat = (v[2] / r).clamp(-1.0, 1.0).asin().to_degrees();
    (normalize_deg(lon), lat, r)
}

pub fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Rotate a vector about +z by `angle_rad` (counter-clockwise).
pub fn rotate_z(v: [f64; 3], angle_rad: f64) -> [f64; 3] {
    let (s, c) = angle_rad.sin_cos();
    [v[0] * c - v[1] * s, v[0] * s + v[1] * c, v[2]]
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

/// A body seen from a point on the Earth's surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Topocentric {
    pub right_ascension_deg: f64,
    pub declination_deg: f64,
    pub distance_km: f64,
    pub altitude_deg: f64,
    /// Measured from north through east.
    pub azimuth_deg: f64,
}

/// Shift a geocentric equatorial position (α, δ in degrees, distance in km)
/// to the observer and compute its horizontal coordinates.
///
/// `sidereal_rad` is Greenwich apparent sidereal time.
pub fn topocentric(
    ra_deg: f64,
    dec_deg: f64,
    distance_km: f64,
    observer: &Location,
    sidereal_rad: f64,
) -> Topocentric {
    let body = spherical_to_cartesian(ra_deg, dec_deg, distance_km);
    let station = rotate_z(observer.position_ecef_km(), sidereal_rad);
    let dr = [body[0] - station[0], body[1] - station[1], body[2] - station[2]];
    let (ra, dec, range_km) = cartesian_to_spherical(dr);

    let dr_ecef = rotate_z(dr, -sidereal_rad);
    let (east, north, up) = ecef_to_enu(dr_ecef, observer.lat_rad(), observer.lon_rad());
    let azimuth = normalize_deg(east.atan2(north).to_degrees());
    let altitude = if range_km > 0.0 {
        (up / range_km).clamp(-1.0, 1.0).asin().to_degrees()
    } else {
        0.0
    };

    Topocentric {
        right_ascension_deg: ra,
        declination_deg: dec,
        distance_km: range_km,
        altitude_deg: altitude,
        azimuth_deg: azimuth,
    }
}
