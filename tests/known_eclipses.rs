//! The analytic provider against well-documented modern eclipses.

use eclipse_pairs::ephemeris::{
    AnalyticEphemeris, EclipseClass, EclipseKind, Ephemeris, EphemerisConfig,
};
use eclipse_pairs::location::Location;
use eclipse_pairs::search::{enumerate, SearchWindow, VisibilityTester};
use eclipse_pairs::time::calendar_to_jd;
use eclipse_pairs::verify::Verifier;

fn provider() -> AnalyticEphemeris {
    AnalyticEphemeris::open(&EphemerisConfig::default()).unwrap()
}

#[test]
fn great_american_eclipse_2017() {
    let eph = provider();
    let start = calendar_to_jd(2017, 8, 1, 0.0).unwrap();
    let event = eph.next_solar_eclipse(start).unwrap().unwrap();

    // Greatest eclipse 2017-08-21 18:25 TD, about 18:24 UT.
    let expected = calendar_to_jd(2017, 8, 21, 18.0 + 24.0 / 60.0).unwrap();
    assert!((event.instant - expected).abs() < 0.02, "JD {}", event.instant);
    assert_eq!(event.kind, EclipseKind::Solar);
    assert_eq!(event.class, EclipseClass::Total);

    let site = Location::named("Hopkinsville", 36.97, -87.67);
    let check = Verifier::default().verify_event(&eph, &event, &site).unwrap();
    assert!(check.separation_deg <= 1.1, "separation {}", check.separation_deg);
    assert!(check.sun_altitude_deg > 0.0);
    assert!(check.passed(), "{:?}", check.issues);
}

#[test]
fn total_lunar_eclipse_2018() {
    let eph = provider();
    let start = calendar_to_jd(2018, 7, 20, 0.0).unwrap();
    let event = eph.next_lunar_eclipse(start).unwrap().unwrap();

    // Greatest eclipse 2018-07-27 20:22 UT, umbral magnitude 1.61.
    let expected = calendar_to_jd(2018, 7, 27, 20.0 + 22.0 / 60.0).unwrap();
    assert!((event.instant - expected).abs() < 0.02, "JD {}", event.instant);
    assert_eq!(event.class, EclipseClass::Total);
    assert!((event.magnitude - 1.61).abs() < 0.05, "magnitude {}", event.magnitude);

    let site = Location::named("Babylon", 32.5, 44.4);
    let check = Verifier::default().verify_event(&eph, &event, &site).unwrap();
    let deviation = check.opposition_deviation_deg.unwrap();
    assert!(deviation <= 0.09, "deviation {}", deviation);
    assert!(check.moon_altitude_deg > 0.0);
    assert!(check.passed(), "{:?}", check.issues);
}

#[test]
fn eclipses_of_2019() {
    // 2019: solar Jan 6 (partial), Jul 2 (total), Dec 26 (annular);
    // lunar Jan 21 (total), Jul 16 (partial).
    let eph = provider();
    let window = SearchWindow::new(
        calendar_to_jd(2019, 1, 1, 0.0).unwrap(),
        calendar_to_jd(2020, 1, 1, 0.0).unwrap(),
    );
    let enumeration = enumerate(&eph, &window, 100);

    let summary: Vec<(EclipseKind, EclipseClass)> = enumeration
        .events
        .iter()
        .map(|e| (e.kind, e.class))
        .collect();
    assert_eq!(
        summary,
        vec![
            (EclipseKind::Solar, EclipseClass::Partial),
            (EclipseKind::Lunar, EclipseClass::Total),
            (EclipseKind::Solar, EclipseClass::Total),
            (EclipseKind::Lunar, EclipseClass::Partial),
            (EclipseKind::Solar, EclipseClass::Annular),
        ]
    );
    assert!(!enumeration.solar.stop.is_abnormal());
    assert!(!enumeration.lunar.stop.is_abnormal());
}

#[test]
fn ancient_window_enumerates_within_range() {
    // First year of the default historical window.
    let eph = provider();
    let window = SearchWindow::from_years(-3099, -3099).unwrap();
    let enumeration = enumerate(&eph, &window, 100);

    assert!(enumeration.solar.found >= 2 && enumeration.solar.found <= 5);
    assert!(enumeration.lunar.found >= 2 && enumeration.lunar.found <= 5);
    assert!(enumeration
        .events
        .iter()
        .all(|e| e.instant >= window.start && e.instant < window.end));
    assert!(enumeration
        .events
        .windows(2)
        .all(|w| w[0].instant <= w[1].instant));
}

#[test]
fn lunar_visibility_follows_night_side() {
    let eph = provider();
    let start = calendar_to_jd(2018, 7, 20, 0.0).unwrap();
    let event = eph.next_lunar_eclipse(start).unwrap().unwrap();
    let tester = VisibilityTester::default();

    assert!(tester.is_visible(&eph, &event, &Location::new(-15.0, 45.0)));
    assert!(!tester.is_visible(&eph, &event, &Location::new(40.0, -100.0)));
}
