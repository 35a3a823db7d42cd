//! Low-precision solar theory (geometric mean elements plus equation of
//! centre), about 0.01° in longitude.

use super::frames::normalize_deg;
use super::{EclipticPosition, AU_KM};

/// Apparent geocentric ecliptic position of the Sun.
///
/// `t` is Julian centuries of TT from J2000, `nutation_lon_deg` is Δψ.
pub fn apparent_position(t: f64, nutation_lon_deg: f64) -> EclipticPosition {
    let l0 = 280.46646 + t * (36000.76983 + t * 0.0003032);
    let m = (357.52911 + t * (35999.05029 - t * 0.0001537)).to_radians();
    let e = 0.016708634 - t * (0.000042037 + t * 0.0000001267);

    let c = (1.914602 - t * (0.004817 + t * 0.000014)) * m.sin()
        + (0.019993 - t * 0.000101) * (2.0 * m).sin()
        + 0.000289 * (3.0 * m).sin();

    let true_lon = l0 + c;
    let anomaly = m + c.to_radians();
    let distance_au = 1.000001018 * (1.0 - e * e) / (1.0 + e * anomaly.cos());

    let aberration_deg = -20.4898 / 3600.0 / distance_au;

    EclipticPosition {
        lon_deg: normalize_deg(true_lon + nutation_lon_deg + aberration_deg),
        lat_deg: 0.0,
        distance_km: distance_au * AU_KM,
    }
}
