//! Truncated periodic lunar theory. Longitude and latitude good to roughly
//! 10″–30″ over historical spans, distance to a few km.

use super::frames::normalize_deg;
use super::EclipticPosition;

/// (D, M, M′, F, Σl in 1e-6 deg, Σr in 1e-3 km)
#[rustfmt::skip]
const LON_DIST_TERMS: [(i8, i8, i8, i8, i32, i32); 60] = [
    (0, 0, 1, 0, 6_288_774, -20_905_355),
    (2, 0, -1, 0, 1_274_027, -3_699_111),
    (2, 0, 0, 0, 658_314, -2_955_968),
    (0, 0, 2, 0, 213_618, -569_925),
    (0, 1, 0, 0, -185_116, 48_888),
    (0, 0, 0, 2, -114_332, -3_149),
    (2, 0, -2, 0, 58_793, 246_158),
    (2, -1, -1, 0, 57_066, -152_138),
    (2, 0, 1, 0, 53_322, -170_733),
    (2, -1, 0, 0, 45_758, -204_586),
    (0, 1, -1, 0, -40_923, -129_620),
    (1, 0, 0, 0, -34_720, 108_743),
    (0, 1, 1, 0, -30_383, 104_755),
    (2, 0, 0, -2, 15_327, 10_321),
    (0, 0, 1, 2, -12_528, 0),
    (0, 0, 1, -2, 10_980, 79_661),
    (4, 0, -1, 0, 10_675, -34_782),
    (0, 0, 3, 0, 10_034, -23_210),
    (4, 0, -2, 0, 8_548, -21_636),
    (2, 1, -1, 0, -7_888, 24_208),
    (2, 1, 0, 0, -6_766, 30_824),
    (1, 0, -1, 0, -5_163, -8_379),
    (1, 1, 0, 0, 4_987, -16_675),
    (2, -1, 1, 0, 4_036, -12_831),
    (2, 0, 2, 0, 3_994, -10_445),
    (4, 0, 0, 0, 3_861, -11_650),
    (2, 0, -3, 0, 3_665, 14_403),
    (0, 1, -2, 0, -2_689, -7_003),
    (2, 0, -1, 2, -2_602, 0),
    (2, -1, -2, 0, 2_390, 10_056),
    (1, 0, 1, 0, -2_348, 6_322),
    (2, -2, 0, 0, 2_236, -9_884),
    (0, 1, 2, 0, -2_120, 5_751),
    (0, 2, 0, 0, -2_069, 0),
    (2, -2, -1, 0, 2_048, -4_950),
    (2, 0, 1, -2, -1_773, 4_130),
    (2, 0, 0, 2, -1_595, 0),
    (4, -1, -1, 0, 1_215, -3_958),
    (0, 0, 2, 2, -1_110, 0),
    (3, 0, -1, 0, -892, 3_258),
    (2, 1, 1, 0, -810, 2_616),
    (4, -1, -2, 0, 759, -1_897),
    (0, 2, -1, 0, -713, -2_117),
    (2, 2, -1, 0, -700, 2_354),
    (2, 1, -2, 0, 691, 0),
    (2, -1, 0, -2, 596, 0),
    (4, 0, 1, 0, 549, -1_423),
    (0, 0, 4, 0, 537, -1_117),
    (4, -1, 0, 0, 520, -1_571),
    (1, 0, -2, 0, -487, -1_739),
    (2, 1, 0, -2, -399, 0),
    (0, 0, 2, -2, -381, -4_421),
    (1, 1, 1, 0, 351, 0),
    (3, 0, -2, 0, -340, 0),
    (4, 0, -3, 0, 330, 0),
    (2, -1, 2, 0, 327, 0),
    (0, 2, 1, 0, -323, 1_165),
    (1, 1, -1, 0, 299, 0),
    (2, 0, 3, 0, 294, 0),
    (2, 0, -1, -2, 0, 8_752),
];

/// (D, M, M′, F, Σb in 1e-6 deg)
#[rustfmt::skip]
const LAT_TERMS: [(i8, i8, i8, i8, i32); 60] = [
    (0, 0, 0, 1, 5_128_122),
    (0, 0, 1, 1, 280_602),
    (0, 0, 1, -1, 277_693),
    (2, 0, 0, -1, 173_237),
    (2, 0, -1, 1, 55_413),
    (2, 0, -1, -1, 46_271),
    (2, 0, 0, 1, 32_573),
    (0, 0, 2, 1, 17_198),
    (2, 0, 1, -1, 9_266),
    (0, 0, 2, -1, 8_822),
    (2, -1, 0, -1, 8_216),
    (2, 0, -2, -1, 4_324),
    (2, 0, 1, 1, 4_200),
    (2, 1, 0, -1, -3_359),
    (2, -1, -1, 1, 2_463),
    (2, -1, 0, 1, 2_211),
    (2, -1, -1, -1, 2_065),
    (0, 1, -1, -1, -1_870),
    (4, 0, -1, -1, 1_828),
    (0, 1, 0, 1, -1_794),
    (0, 0, 0, 3, -1_749),
    (0, 1, -1, 1, -1_565),
    (1, 0, 0, 1, -1_491),
    (0, 1, 1, 1, -1_475),
    (0, 1, 1, -1, -1_410),
    (0, 1, 0, -1, -1_344),
    (1, 0, 0, -1, -1_335),
    (0, 0, 3, 1, 1_107),
    (4, 0, 0, -1, 1_021),
    (4, 0, -1, 1, 833),
    (0, 0, 1, -3, 777),
    (4, 0, -2, 1, 671),
    (2, 0, 0, -3, 607),
    (2, 0, 2, -1, 596),
    (2, -1, 1, -1, 491),
    (2, 0, -2, 1, -451),
    (0, 0, 3, -1, 439),
    (2, 0, 2, 1, 422),
    (2, 0, -3, -1, 421),
    (2, 1, -1, 1, -366),
    (2, 1, 0, 1, -351),
    (4, 0, 0, 1, 331),
    (2, -1, 1, 1, 315),
    (2, -2, 0, -1, 302),
    (0, 0, 1, 3, -283),
    (2, 1, 1, -1, -229),
    (1, 1, 0, -1, 223),
    (1, 1, 0, 1, 223),
    (0, 1, -2, -1, -220),
    (2, 1, -1, -1, -220),
    (1, 0, 1, 1, -185),
    (2, -1, -2, -1, 181),
    (0, 1, 2, 1, -177),
    (4, 0, -2, -1, 176),
    (4, -1, -1, -1, 166),
    (1, 0, 1, -1, -164),
    (4, 0, 1, -1, 132),
    (1, 0, -1, -1, -119),
    (4, -1, 0, -1, 115),
    (2, -2, 0, 1, 107),
];

const MEAN_DISTANCE_KM: f64 = 385_000.56;

/// Mean elongation D, Sun's anomaly M, Moon's anomaly M′ and argument of
/// latitude F in radians, plus the Moon's mean longitude L′ in degrees.
struct Arguments {
    l_prime_deg: f64,
    d: f64,
    m: f64,
    m_prime: f64,
    f: f64,
}

fn arguments(t: f64) -> Arguments {
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;

    let l_prime = 218.3164477 + 481267.88123421 * t - 0.0015786 * t2 + t3 / 538_841.0
        - t4 / 65_194_000.0;
    let d = 297.8501921 + 445267.1114034 * t - 0.0018819 * t2 + t3 / 545_868.0
        - t4 / 113_065_000.0;
    let m = 357.5291092 + 35999.0502909 * t - 0.0001536 * t2 + t3 / 24_490_000.0;
    let m_prime = 134.9633964 + 477198.8675055 * t + 0.0087414 * t2 + t3 / 69_699.0
        - t4 / 14_712_000.0;
    let f = 93.2720950 + 483202.0175233 * t - 0.0036539 * t2 - t3 / 3_526_000.0
        + t4 / 863_310_000.0;

    Arguments {
        l_prime_deg: normalize_deg(l_prime),
        d: normalize_deg(d).to_radians(),
        m: normalize_deg(m).to_radians(),
        m_prime: normalize_deg(m_prime).to_radians(),
        f: normalize_deg(f).to_radians(),
    }
}

/// Apparent geocentric ecliptic position of the Moon.
///
/// `t` is Julian centuries of TT from J2000, `nutation_lon_deg` is Δψ.
pub fn apparent_position(t: f64, nutation_lon_deg: f64) -> EclipticPosition {
    let args = arguments(t);
    let l_prime = args.l_prime_deg.to_radians();

    let a1 = normalize_deg(119.75 + 131.849 * t).to_radians();
    let a2 = normalize_deg(53.09 + 479264.290 * t).to_radians();
    let a3 = normalize_deg(313.45 + 481266.484 * t).to_radians();

    // Terms involving M scale with the decreasing eccentricity of Earth's orbit.
    let e = 1.0 - 0.002516 * t - 0.0000074 * t * t;
    let e_factor = |m: i8| match m.abs() {
        1 => e,
        2 => e * e,
        _ => 1.0,
    };

    let mut sum_l = 0.0;
    let mut sum_r = 0.0;
    for &(d, m, mp, f, l, r) in LON_DIST_TERMS.iter() {
        let arg = d as f64 * args.d + m as f64 * args.m + mp as f64 * args.m_prime + f as f64 * args.f;
        let scale = e_factor(m);
        sum_l += l as f64 * scale * arg.sin();
        sum_r += r as f64 * scale * arg.cos();
    }

    let mut sum_b = 0.0;
    for &(d, m, mp, f, b) in LAT_TERMS.iter() {
        let arg = d as f64 * args.d + m as f64 * args.m + mp as f64 * args.m_prime + f as f64 * args.f;
        sum_b += b as f64 * e_factor(m) * arg.sin();
    }

    sum_l += 3958.0 * a1.sin() + 1962.0 * (l_prime - args.f).sin() + 318.0 * a2.sin();
    sum_b += -2235.0 * l_prime.sin()
        + 382.0 * a3.sin()
        + 175.0 * (a1 - args.f).sin()
        + 175.0 * (a1 + args.f).sin()
        + 127.0 * (l_prime - args.m_prime).sin()
        - 115.0 * (l_prime + args.m_prime).sin();

    EclipticPosition {
        lon_deg: normalize_deg(args.l_prime_deg + sum_l / 1e6 + nutation_lon_deg),
        lat_deg: sum_b / 1e6,
        distance_km: MEAN_DISTANCE_KM + sum_r / 1000.0,
    }
}
