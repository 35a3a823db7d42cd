use log::{debug, error, info, warn};
use serde::Serialize;

use crate::ephemeris::{EclipseEvent, EclipseKind, Ephemeris};
use crate::search::types::SearchWindow;
use crate::time::format_jd;

/// Why a per-kind scan ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ScanStop {
    /// Next eclipse falls on or after the window end.
    Exhausted,
    /// Provider found no further eclipse.
    NotFound,
    /// Provider refused the cursor; usually the window reaches past its tables.
    OutOfRange { message: String },
    /// Any other provider failure.
    ProviderError { message: String },
    /// Provider returned an instant that does not move the scan forward.
    NonMonotonic { cursor: f64, returned: f64 },
    IterationLimit,
}

impl ScanStop {
    /// Stops an operator should hear about.
    pub fn is_abnormal(&self) -> bool {
        !matches!(self, ScanStop::Exhausted | ScanStop::NotFound)
    }
}

impl std::fmt::Display for ScanStop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanStop::Exhausted => write!(f, "reached end of window"),
            ScanStop::NotFound => write!(f, "no further eclipse found"),
            ScanStop::OutOfRange { message } => write!(f, "ephemeris range: {}", message),
            ScanStop::ProviderError { message } => write!(f, "ephemeris error: {}", message),
            ScanStop::NonMonotonic { cursor, returned } => write!(
                f,
                "cursor did not advance (asked after JD {:.5}, got JD {:.5})",
                cursor, returned
            ),
            ScanStop::IterationLimit => write!(f, "iteration limit reached"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub kind: EclipseKind,
    pub found: usize,
    pub stop: ScanStop,
}

/// Merged, chronologically ordered eclipses plus how each scan ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enumeration {
    pub events: Vec<EclipseEvent>,
    pub solar: ScanReport,
    pub lunar: ScanReport,
}

impl Enumeration {
    pub fn reports(&self) -> [&ScanReport; 2] {
        [&self.solar, &self.lunar]
    }
}

/// Walk `window` for one eclipse kind.
pub fn scan_kind(
    provider: &dyn Ephemeris,
    kind: EclipseKind,
    window: &SearchWindow,
    max_iterations: usize,
) -> (Vec<EclipseEvent>, ScanReport) {
    let mut events: Vec<EclipseEvent> = Vec::new();
    let mut cursor = window.start;

    let stop = loop {
        if events.len() >= max_iterations {
            warn!("{} scan hit the iteration limit of {}", kind, max_iterations);
            break ScanStop::IterationLimit;
        }

        let event = match provider.next_eclipse(kind, cursor) {
            Ok(Some(event)) => event,
            Ok(None) => break ScanStop::NotFound,
            Err(e) => {
                warn!("{} scan stopped at {}: {}", kind, format_jd(cursor), e);
                let message = e.to_string();
                break if e.is_out_of_range() {
                    ScanStop::OutOfRange { message }
                } else {
                    ScanStop::ProviderError { message }
                };
            }
        };

        if event.instant >= window.end {
            break ScanStop::Exhausted;
        }

        let behind_cursor = event.instant.is_nan() || event.instant < cursor;
        let repeats_previous = events
            .last()
            .is_some_and(|prev| event.instant <= prev.instant);
        if behind_cursor || repeats_previous {
            error!(
                "{} scan: provider returned JD {:.5} for a query after JD {:.5}; aborting scan",
                kind, event.instant, cursor
            );
            break ScanStop::NonMonotonic {
                cursor,
                returned: event.instant,
            };
        }

        debug!("{} {} eclipse at {}", event.class, kind, format_jd(event.instant));
        cursor = event.instant + window.advance_days;
        events.push(event);
    };

    let report = ScanReport {
        kind,
        found: events.len(),
        stop,
    };
    (events, report)
}

/// Enumerate solar and lunar eclipses in `window` and merge them by instant.
///
/// `max_iterations` bounds the number of events accepted per kind.
pub fn enumerate(
    provider: &dyn Ephemeris,
    window: &SearchWindow,
    max_iterations: usize,
) -> Enumeration {
    let (mut events, solar) = scan_kind(provider, EclipseKind::Solar, window, max_iterations);
    let (lunar_events, lunar) = scan_kind(provider, EclipseKind::Lunar, window, max_iterations);
    events.extend(lunar_events);

    // Stable: on an exact tie the solar eclipse stays first.
    events.sort_by(|a, b| a.instant.total_cmp(&b.instant));

    info!(
        "Found {} eclipses ({} solar, {} lunar) between {} and {}",
        events.len(),
        solar.found,
        lunar.found,
        format_jd(window.start),
        format_jd(window.end)
    );

    Enumeration {
        events,
        solar,
        lunar,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::ephemeris::{
        Body, BodyPosition, EclipseClass, EphemerisError, LunarLocal, SolarLocal,
    };
    use crate::location::Location;

    /// Replays fixed eclipse lists; optionally misbehaves.
    struct Scripted {
        solar: Vec<f64>,
        lunar: Vec<f64>,
        range_end: f64,
        stuck_at: Option<f64>,
        queries: RefCell<usize>,
    }

    impl Scripted {
        fn new(solar: Vec<f64>, lunar: Vec<f64>) -> Self {
            Self {
                solar,
                lunar,
                range_end: f64::INFINITY,
                stuck_at: None,
                queries: RefCell::new(0),
            }
        }

        fn next(&self, list: &[f64], kind: EclipseKind, after: f64) -> Result<Option<EclipseEvent>, EphemerisError> {
            *self.queries.borrow_mut() += 1;
            if after > self.range_end {
                return Err(EphemerisError::OutOfRange {
                    jd: after,
                    min: 0.0,
                    max: self.range_end,
                });
            }
            if let Some(stuck) = self.stuck_at {
                return Ok(Some(event(kind, stuck)));
            }
            Ok(list
                .iter()
                .find(|&&t| t >= after)
                .map(|&t| event(kind, t)))
        }
    }

    fn event(kind: EclipseKind, instant: f64) -> EclipseEvent {
        EclipseEvent {
            kind,
            instant,
            class: EclipseClass::Partial,
            magnitude: 0.5,
        }
    }

    impl Ephemeris for Scripted {
        fn next_solar_eclipse(&self, after: f64) -> Result<Option<EclipseEvent>, EphemerisError> {
            self.next(&self.solar, EclipseKind::Solar, after)
        }

        fn next_lunar_eclipse(&self, after: f64) -> Result<Option<EclipseEvent>, EphemerisError> {
            self.next(&self.lunar, EclipseKind::Lunar, after)
        }

        fn solar_local_circumstances(&self, _: f64, _: &Location) -> Result<SolarLocal, EphemerisError> {
            Err(EphemerisError::InvalidConfig("unused".into()))
        }

        fn lunar_local_circumstances(&self, _: f64, _: &Location) -> Result<LunarLocal, EphemerisError> {
            Err(EphemerisError::InvalidConfig("unused".into()))
        }

        fn body_position(&self, _: f64, _: Body) -> Result<BodyPosition, EphemerisError> {
            Err(EphemerisError::InvalidConfig("unused".into()))
        }

        fn supported_range(&self) -> (f64, f64) {
            (0.0, self.range_end)
        }
    }

    #[test]
    fn merges_in_order_and_respects_window() {
        let provider = Scripted::new(vec![10.0, 40.0, 200.0], vec![25.0, 39.5, 100.0]);
        let window = SearchWindow::new(0.0, 150.0);
        let result = enumerate(&provider, &window, 100);

        let instants: Vec<f64> = result.events.iter().map(|e| e.instant).collect();
        assert_eq!(instants, vec![10.0, 25.0, 39.5, 40.0, 100.0]);
        assert!(result.events.windows(2).all(|w| w[0].instant <= w[1].instant));
        assert_eq!(result.solar.stop, ScanStop::Exhausted);
        assert_eq!(result.lunar.stop, ScanStop::NotFound);
        assert_eq!(result.solar.found, 2);
    }

    #[test]
    fn start_is_inclusive_end_exclusive() {
        let provider = Scripted::new(vec![0.0, 150.0], vec![]);
        let window = SearchWindow::new(0.0, 150.0);
        let result = enumerate(&provider, &window, 100);
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].instant, 0.0);
    }

    #[test]
    fn range_error_ends_scan_with_partial_result() {
        let mut provider = Scripted::new(vec![10.0, 20.0, 30.0], vec![]);
        provider.range_end = 15.0;
        let window = SearchWindow::new(0.0, 100.0);
        let (events, report) = scan_kind(&provider, EclipseKind::Solar, &window, 100);
        // 10 and 20 are found from cursors inside the range, the query after 21 fails.
        assert_eq!(events.len(), 2);
        assert!(matches!(report.stop, ScanStop::OutOfRange { .. }));
        assert!(report.stop.is_abnormal());
    }

    #[test]
    fn stuck_provider_is_detected() {
        let mut provider = Scripted::new(vec![], vec![]);
        provider.stuck_at = Some(5.0);
        let window = SearchWindow::new(0.0, 100.0);
        let (events, report) = scan_kind(&provider, EclipseKind::Lunar, &window, 1000);

        assert_eq!(events.len(), 1);
        assert_eq!(
            report.stop,
            ScanStop::NonMonotonic {
                cursor: 6.0,
                returned: 5.0
            }
        );
        assert_eq!(*provider.queries.borrow(), 2);
    }

    #[test]
    fn iteration_limit_bounds_scan() {
        let solar: Vec<f64> = (0..50).map(|i| i as f64 * 10.0).collect();
        let provider = Scripted::new(solar, vec![]);
        let window = SearchWindow::new(0.0, 1000.0);
        let (events, report) = scan_kind(&provider, EclipseKind::Solar, &window, 5);
        assert_eq!(events.len(), 5);
        assert_eq!(report.stop, ScanStop::IterationLimit);
    }
}
