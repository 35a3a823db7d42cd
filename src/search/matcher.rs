use log::{debug, info};

use crate::ephemeris::{EclipseEvent, Ephemeris};
use crate::location::Location;
use crate::search::types::{EclipsePair, MatchMode, MatchOptions};
use crate::search::visibility::VisibilityTester;

/// Index pairs `(i, j)`, `i < j`, whose gap is within `max_gap_days`.
///
/// `events` must be sorted by instant. The inner scan stops at the first
/// event past the threshold; the bound is inclusive.
pub fn candidate_pairs(events: &[EclipseEvent], max_gap_days: f64) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..events.len() {
        for j in (i + 1)..events.len() {
            let gap = events[j].instant - events[i].instant;
            if gap > max_gap_days {
                break;
            }
            pairs.push((i, j));
        }
    }
    pairs
}

/// Test every candidate pair against `locations` and keep those seen from a
/// common place.
pub fn match_pairs(
    provider: &dyn Ephemeris,
    events: &[EclipseEvent],
    locations: &[Location],
    options: &MatchOptions,
) -> Vec<EclipsePair> {
    let tester = VisibilityTester::new(options.thresholds);
    let candidates = candidate_pairs(events, options.max_gap_days);
    info!(
        "Testing {} candidate pairs across {} locations",
        candidates.len(),
        locations.len()
    );

    let mut pairs = Vec::new();
    for (i, j) in candidates {
        let (first, second) = (&events[i], &events[j]);
        let found = co_visible(provider, &tester, first, second, locations, options.mode);
        if found.is_empty() {
            debug!(
                "No shared location for {} JD {:.5} / {} JD {:.5}",
                first.kind, first.instant, second.kind, second.instant
            );
        }
        pairs.extend(found);
    }

    info!("Accepted {} eclipse pairs", pairs.len());
    pairs
}

fn co_visible(
    provider: &dyn Ephemeris,
    tester: &VisibilityTester,
    first: &EclipseEvent,
    second: &EclipseEvent,
    locations: &[Location],
    mode: MatchMode,
) -> Vec<EclipsePair> {
    let mut found = Vec::new();
    let gap_days = second.instant - first.instant;

    for location in locations {
        let first_result = tester.test(provider, first, location);
        if !first_result.visible {
            continue;
        }
        let second_result = tester.test(provider, second, location);
        if !second_result.visible {
            continue;
        }

        found.push(EclipsePair {
            first: *first,
            second: *second,
            gap_days,
            location: location.clone(),
            first_visibility: first_result.metric,
            second_visibility: second_result.metric,
        });
        if mode == MatchMode::First {
            break;
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::{EclipseClass, EclipseKind};

    fn events(instants: &[f64]) -> Vec<EclipseEvent> {
        instants
            .iter()
            .map(|&instant| EclipseEvent {
                kind: EclipseKind::Lunar,
                instant,
                class: EclipseClass::Penumbral,
                magnitude: -0.2,
            })
            .collect()
    }

    #[test]
    fn exact_threshold_is_included() {
        let list = events(&[2_450_000.0, 2_450_015.0]);
        assert_eq!(candidate_pairs(&list, 15.0), vec![(0, 1)]);
    }

    #[test]
    fn just_past_threshold_is_excluded() {
        let list = events(&[2_450_000.0, 2_450_015.01]);
        assert!(candidate_pairs(&list, 15.0).is_empty());
    }

    #[test]
    fn widely_spaced_events_never_pair() {
        let list = events(&[0.0, 16.0, 32.0, 48.0, 64.0]);
        assert!(candidate_pairs(&list, 15.0).is_empty());
    }

    #[test]
    fn one_pair_per_cluster() {
        // Clusters of two, separated by far more than the threshold.
        let eps = 1e-3;
        let list = events(&[0.0, 15.0 - eps, 100.0, 115.0 - eps, 200.0, 215.0 - eps]);
        assert_eq!(candidate_pairs(&list, 15.0), vec![(0, 1), (2, 3), (4, 5)]);
    }

    #[test]
    fn inner_scan_reaches_all_close_events() {
        let list = events(&[0.0, 5.0, 10.0, 14.0, 30.0]);
        let pairs = candidate_pairs(&list, 15.0);
        assert_eq!(pairs, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        for (i, j) in pairs {
            let gap = list[j].instant - list[i].instant;
            assert!((0.0..=15.0).contains(&gap));
        }
    }
}
