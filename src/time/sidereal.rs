use std::f64::consts::{PI, TAU};

use super::J2000_JD;

const ARCSEC_TO_RAD: f64 = PI / (180.0 * 3600.0);

/// Earth rotation angle, radians in [0, 2π).
fn earth_rotation_angle_rad(jd_ut: f64) -> f64 {
    let du = jd_ut - J2000_JD;
    let theta = TAU * (0.779_057_273_264_0 + 1.002_737_811_911_354_6 * du);
    theta.rem_euclid(TAU)
}

/// Greenwich mean sidereal time at a UT Julian Day, radians in [0, 2π).
///
/// ERA plus the precession polynomial in Julian centuries of UT.
pub fn gmst_rad(jd_ut: f64) -> f64 {
    let t = (jd_ut - J2000_JD) / 36525.0;
    let poly_arcsec = 0.014506
        + t * (4612.156534 + t * (1.3915817 + t * (-0.00000044 + t * (-0.000029956 - t * 0.0000000368))));
    (earth_rotation_angle_rad(jd_ut) + poly_arcsec * ARCSEC_TO_RAD).rem_euclid(TAU)
}

/// Greenwich apparent sidereal time: GMST plus the equation of the equinoxes.
pub fn apparent_sidereal_time_rad(jd_ut: f64, nutation_lon_rad: f64, obliquity_rad: f64) -> f64 {
    (gmst_rad(jd_ut) + nutation_lon_rad * obliquity_rad.cos()).rem_euclid(TAU)
}
