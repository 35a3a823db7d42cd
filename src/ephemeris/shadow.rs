//! Shadow and disk geometry for eclipse classification.
//!
//! Angles are in degrees, distances in km. The lunar shadow radii use the
//! Danjon rule: the geometric shadow of the Earth enlarged by 2% to account
//! for the atmosphere.

use super::types::EclipseClass;

/// Earth equatorial radius (IAU 2015).
pub const EARTH_RADIUS_KM: f64 = 6378.137;
/// Nominal solar radius (IAU 2015).
pub const SUN_RADIUS_KM: f64 = 696_000.0;
/// Mean lunar radius.
pub const MOON_RADIUS_KM: f64 = 1737.4;

const DANJON_ENLARGEMENT: f64 = 1.02;

/// Apparent angular radius of a sphere of `radius_km` seen from `distance_km`.
pub fn angular_radius_deg(radius_km: f64, distance_km: f64) -> f64 {
    (radius_km / distance_km).clamp(-1.0, 1.0).asin().to_degrees()
}

/// Horizontal parallax of a body at `distance_km`.
pub fn parallax_deg(distance_km: f64) -> f64 {
    angular_radius_deg(EARTH_RADIUS_KM, distance_km)
}

/// Radii of the Earth's shadow cones projected at the Moon's distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowRadii {
    pub penumbral_deg: f64,
    pub umbral_deg: f64,
}

pub fn shadow_radii(sun_distance_km: f64, moon_distance_km: f64) -> ShadowRadii {
    let pi_sun = parallax_deg(sun_distance_km);
    let pi_moon = parallax_deg(moon_distance_km);
    let s_sun = angular_radius_deg(SUN_RADIUS_KM, sun_distance_km);

    ShadowRadii {
        penumbral_deg: DANJON_ENLARGEMENT * (pi_moon + pi_sun + s_sun),
        umbral_deg: DANJON_ENLARGEMENT * (pi_moon + pi_sun - s_sun),
    }
}

/// Classify a lunar eclipse from the Moon's offset to the shadow axis.
pub fn classify_lunar(
    shadow_offset_deg: f64,
    moon_radius_deg: f64,
    radii: ShadowRadii,
) -> Option<EclipseClass> {
    let near_edge = shadow_offset_deg - moon_radius_deg;
    let far_edge = shadow_offset_deg + moon_radius_deg;

    if near_edge >= radii.penumbral_deg {
        None
    } else if far_edge <= radii.umbral_deg {
        Some(EclipseClass::Total)
    } else if near_edge < radii.umbral_deg {
        Some(EclipseClass::Partial)
    } else {
        Some(EclipseClass::Penumbral)
    }
}

/// Umbral and penumbral magnitudes: the fraction of the lunar diameter
/// immersed in each shadow. Negative when the Moon misses that shadow.
pub fn lunar_magnitudes(
    shadow_offset_deg: f64,
    moon_radius_deg: f64,
    radii: ShadowRadii,
) -> (f64, f64) {
    let diameter = 2.0 * moon_radius_deg;
    (
        (radii.umbral_deg + moon_radius_deg - shadow_offset_deg) / diameter,
        (radii.penumbral_deg + moon_radius_deg - shadow_offset_deg) / diameter,
    )
}

/// Classify two overlapping disks (Sun behind Moon) by centre separation.
pub fn classify_disks(
    sun_radius_deg: f64,
    moon_radius_deg: f64,
    separation_deg: f64,
) -> Option<EclipseClass> {
    if separation_deg >= sun_radius_deg + moon_radius_deg {
        return None;
    }

    if separation_deg < (moon_radius_deg - sun_radius_deg).abs() {
        if moon_radius_deg >= sun_radius_deg {
            Some(EclipseClass::Total)
        } else {
            Some(EclipseClass::Annular)
        }
    } else {
        Some(EclipseClass::Partial)
    }
}

/// Fraction of the solar diameter covered by the Moon. Exceeds 1 during a
/// deep total phase; clamped at 0 when the disks do not touch.
pub fn diameter_fraction(sun_radius_deg: f64, moon_radius_deg: f64, separation_deg: f64) -> f64 {
    ((sun_radius_deg + moon_radius_deg - separation_deg) / (2.0 * sun_radius_deg)).max(0.0)
}

/// Fraction of the solar disk area hidden by the Moon.
pub fn obscuration(sun_radius_deg: f64, moon_radius_deg: f64, separation_deg: f64) -> f64 {
    let (rs, rm, d) = (sun_radius_deg, moon_radius_deg, separation_deg);
    if d >= rs + rm {
        return 0.0;
    }
    if d <= (rm - rs).abs() {
        let inner = rs.min(rm);
        return (inner * inner) / (rs * rs);
    }

    let alpha = ((d * d + rs * rs - rm * rm) / (2.0 * d * rs)).clamp(-1.0, 1.0).acos();
    let beta = ((d * d + rm * rm - rs * rs) / (2.0 * d * rm)).clamp(-1.0, 1.0).acos();
    let kite = ((-d + rs + rm) * (d + rs - rm) * (d - rs + rm) * (d + rs + rm))
        .max(0.0)
        .sqrt();
    let lens = rs * rs * alpha + rm * rm * beta - 0.5 * kite;

    (lens / (std::f64::consts::PI * rs * rs)).clamp(0.0, 1.0)
}

/// Geocentric solar eclipse at minimum Sun–Moon separation.
///
/// Returns the class and global magnitude, or `None` when the penumbra
/// misses the Earth.
pub fn classify_solar_global(
    separation_deg: f64,
    sun_distance_km: f64,
    moon_distance_km: f64,
) -> Option<(EclipseClass, f64)> {
    let pi_sun = parallax_deg(sun_distance_km);
    let pi_moon = parallax_deg(moon_distance_km);
    let s_sun = angular_radius_deg(SUN_RADIUS_KM, sun_distance_km);
    let s_moon = angular_radius_deg(MOON_RADIUS_KM, moon_distance_km);

    let penumbra_limit = pi_moon - pi_sun + s_sun + s_moon;
    if separation_deg >= penumbra_limit {
        return None;
    }

    if separation_deg < pi_moon - pi_sun {
        // Shadow axis meets the Earth: compare disks from the sub-lunar surface.
        let s_moon_surface = angular_radius_deg(MOON_RADIUS_KM, moon_distance_km - EARTH_RADIUS_KM);
        let class = if s_moon_surface >= s_sun {
            EclipseClass::Total
        } else {
            EclipseClass::Annular
        };
        return Some((class, s_moon_surface / s_sun));
    }

    let magnitude = (penumbra_limit - separation_deg) / (2.0 * s_sun);
    Some((EclipseClass::Partial, magnitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    const AU: f64 = 149_597_870.7;

    #[test]
    fn shadow_radii_reasonable() {
        let radii = shadow_radii(AU, 384_400.0);
        assert!(radii.penumbral_deg > 1.1 && radii.penumbral_deg < 1.4, "{radii:?}");
        assert!(radii.umbral_deg > 0.6 && radii.umbral_deg < 0.8, "{radii:?}");
    }

    #[test]
    fn lunar_classes() {
        let radii = ShadowRadii {
            penumbral_deg: 1.25,
            umbral_deg: 0.70,
        };
        assert_eq!(classify_lunar(0.1, 0.26, radii), Some(EclipseClass::Total));
        assert_eq!(classify_lunar(0.55, 0.26, radii), Some(EclipseClass::Partial));
        assert_eq!(classify_lunar(1.05, 0.26, radii), Some(EclipseClass::Penumbral));
        assert_eq!(classify_lunar(1.6, 0.26, radii), None);
    }

    #[test]
    fn lunar_magnitudes_track_depth() {
        let radii = ShadowRadii {
            penumbral_deg: 1.25,
            umbral_deg: 0.70,
        };
        let (umbral, penumbral) = lunar_magnitudes(0.1, 0.26, radii);
        assert!(umbral > 1.0 && penumbral > umbral);

        // Penumbral-only: umbral magnitude negative, penumbral positive.
        let (umbral, penumbral) = lunar_magnitudes(1.05, 0.26, radii);
        assert!(umbral < 0.0 && penumbral > 0.0);
    }

    #[test]
    fn disk_classes() {
        assert_eq!(classify_disks(0.266, 0.270, 0.002), Some(EclipseClass::Total));
        assert_eq!(classify_disks(0.266, 0.250, 0.002), Some(EclipseClass::Annular));
        assert_eq!(classify_disks(0.266, 0.260, 0.30), Some(EclipseClass::Partial));
        assert_eq!(classify_disks(0.266, 0.260, 0.6), None);
    }

    #[test]
    fn obscuration_limits() {
        assert_eq!(obscuration(0.266, 0.26, 0.6), 0.0);
        assert!((obscuration(0.266, 0.27, 0.0) - 1.0).abs() < 1e-12);

        let annular = obscuration(0.266, 0.25, 0.0);
        assert!((annular - (0.25f64 / 0.266).powi(2)).abs() < 1e-12);

        // Equal disks offset by one radius.
        let half = obscuration(0.25, 0.25, 0.25);
        assert!(half > 0.38 && half < 0.40, "{half}");
    }

    #[test]
    fn obscuration_is_monotonic_in_separation() {
        let mut previous = f64::INFINITY;
        for i in 0..=50 {
            let sep = i as f64 * 0.011;
            let value = obscuration(0.266, 0.26, sep);
            assert!(value <= previous + 1e-12, "sep {sep}: {value} > {previous}");
            previous = value;
        }
    }

    #[test]
    fn diameter_fraction_basics() {
        assert_eq!(diameter_fraction(0.266, 0.26, 1.0), 0.0);
        assert!((diameter_fraction(0.25, 0.25, 0.25) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn global_solar_classes() {
        let moon_near = 357_000.0;
        let moon_far = 405_000.0;
        assert_eq!(
            classify_solar_global(0.01, AU, moon_near).map(|c| c.0),
            Some(EclipseClass::Total)
        );
        assert_eq!(
            classify_solar_global(0.01, AU, moon_far).map(|c| c.0),
            Some(EclipseClass::Annular)
        );
        assert_eq!(
            classify_solar_global(1.3, AU, 384_400.0).map(|c| c.0),
            Some(EclipseClass::Partial)
        );
        assert_eq!(classify_solar_global(2.0, AU, 384_400.0), None);
    }
}
