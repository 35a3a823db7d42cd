//! Flat result listings: pair reports, event lists and verification output.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::ephemeris::{EclipseClass, EclipseEvent, EclipseKind};
use crate::location::Location;
use crate::search::{EclipsePair, Enumeration, ScanReport, SearchWindow, VisibilityMetric};
use crate::time::{format_jd, CalendarStamp};
use crate::verify::{EventCheck, PairCheck, PairVerification};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// An eclipse with its calendar rendering attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventEntry {
    pub kind: EclipseKind,
    pub class: EclipseClass,
    pub magnitude: f64,
    pub jd: f64,
    pub date: Option<CalendarStamp>,
}

impl From<&EclipseEvent> for EventEntry {
    fn from(event: &EclipseEvent) -> Self {
        Self {
            kind: event.kind,
            class: event.class,
            magnitude: round4(event.magnitude),
            jd: event.instant,
            date: CalendarStamp::from_jd(event.instant),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairEntry {
    pub location: Location,
    pub gap_days: f64,
    pub first: EventEntry,
    pub second: EventEntry,
    pub first_visibility: VisibilityMetric,
    pub second_visibility: VisibilityMetric,
}

impl From<&EclipsePair> for PairEntry {
    fn from(pair: &EclipsePair) -> Self {
        Self {
            location: pair.location.clone(),
            gap_days: round4(pair.gap_days),
            first: (&pair.first).into(),
            second: (&pair.second).into(),
            first_visibility: pair.first_visibility,
            second_visibility: pair.second_visibility,
        }
    }
}

/// Everything a search run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairReport {
    pub window_start: Option<CalendarStamp>,
    pub window_end: Option<CalendarStamp>,
    pub max_gap_days: f64,
    pub locations_tested: usize,
    pub solar_eclipses: usize,
    pub lunar_eclipses: usize,
    pub scans: Vec<ScanReport>,
    pub pairs: Vec<PairEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub verification: Vec<PairVerification>,
}

impl PairReport {
    pub fn new(
        window: &SearchWindow,
        max_gap_days: f64,
        locations_tested: usize,
        enumeration: &Enumeration,
        pairs: &[EclipsePair],
    ) -> Self {
        Self {
            window_start: CalendarStamp::from_jd(window.start),
            window_end: CalendarStamp::from_jd(window.end),
            max_gap_days,
            locations_tested,
            solar_eclipses: enumeration.solar.found,
            lunar_eclipses: enumeration.lunar.found,
            scans: enumeration.reports().into_iter().cloned().collect(),
            pairs: pairs.iter().map(PairEntry::from).collect(),
            verification: Vec::new(),
        }
    }

    pub fn with_verification(mut self, outcomes: Vec<PairVerification>) -> Self {
        self.verification = outcomes;
        self
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let stamp = |s: &Option<CalendarStamp>| {
            s.as_ref()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "?".to_string())
        };

        let _ = writeln!(
            out,
            "Eclipse pairs within {} days, {} to {}",
            self.max_gap_days,
            stamp(&self.window_start),
            stamp(&self.window_end)
        );
        let _ = writeln!(
            out,
            "{} solar and {} lunar eclipses, {} locations tested",
            self.solar_eclipses, self.lunar_eclipses, self.locations_tested
        );
        for scan in self.scans.iter().filter(|s| s.stop.is_abnormal()) {
            let _ = writeln!(out, "WARNING: {} scan ended early: {}", scan.kind, scan.stop);
        }
        let _ = writeln!(out);

        for (idx, pair) in self.pairs.iter().enumerate() {
            let _ = writeln!(out, "Pair #{} at {}", idx + 1, pair.location);
            write_event_line(&mut out, &pair.first, &pair.first_visibility);
            write_event_line(&mut out, &pair.second, &pair.second_visibility);
            let _ = writeln!(out, "  gap: {:.2} days", pair.gap_days);
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "Total: {} pairs", self.pairs.len());
        if !self.verification.is_empty() {
            let _ = writeln!(out);
            write_verification(&mut out, &self.verification);
        }
        out
    }
}

fn write_event_line(out: &mut String, entry: &EventEntry, metric: &VisibilityMetric) {
    let date = entry
        .date
        .as_ref()
        .map(|d| d.to_string())
        .unwrap_or_else(|| format!("JD {:.5}", entry.jd));
    let _ = writeln!(
        out,
        "  {:<5} {:<9} mag {:>7.4}  {}  [{}]",
        entry.kind, entry.class, entry.magnitude, date, metric
    );
}

/// Plain listing for `list`.
pub fn events_text(enumeration: &Enumeration) -> String {
    let mut out = String::new();
    for event in &enumeration.events {
        let _ = writeln!(
            out,
            "{:<5} {:<9} mag {:>7.4}  JD {:.5}  {}",
            event.kind,
            event.class,
            event.magnitude,
            event.instant,
            format_jd(event.instant)
        );
    }
    for scan in enumeration.reports() {
        let _ = writeln!(out, "# {}: {} found, {}", scan.kind, scan.found, scan.stop);
    }
    out
}

pub fn events_json(enumeration: &Enumeration) -> Result<String, ReportError> {
    #[derive(Serialize)]
    struct Listing<'a> {
        events: Vec<EventEntry>,
        scans: [&'a ScanReport; 2],
    }

    let listing = Listing {
        events: enumeration.events.iter().map(EventEntry::from).collect(),
        scans: enumeration.reports(),
    };
    Ok(serde_json::to_string_pretty(&listing)?)
}

/// Detailed per-event verification, one block per pair.
pub fn verification_text(checks: &[PairCheck]) -> String {
    let outcomes: Vec<PairVerification> = checks
        .iter()
        .cloned()
        .map(PairVerification::Checked)
        .collect();
    let mut out = String::new();
    write_verification(&mut out, &outcomes);
    out
}

/// Numbered blocks matching the pair numbers of the search report.
fn write_verification(out: &mut String, outcomes: &[PairVerification]) {
    let rule = "=".repeat(72);

    for (idx, outcome) in outcomes.iter().enumerate() {
        let _ = writeln!(out, "{}", rule);
        match outcome {
            PairVerification::Checked(check) => {
                let _ = writeln!(
                    out,
                    "PAIR #{} at {}  (gap {:.2} days)",
                    idx + 1,
                    check.first.location,
                    check.gap_days
                );
                let _ = writeln!(out, "{}", rule);
                write_event_check(out, &check.first);
                write_event_check(out, &check.second);
                let _ = writeln!(
                    out,
                    "Result: {}",
                    if check.passed() { "PASS" } else { "FLAG" }
                );
            }
            PairVerification::Failed { message } => {
                let _ = writeln!(out, "PAIR #{}", idx + 1);
                let _ = writeln!(out, "{}", rule);
                let _ = writeln!(out, "Result: NOT VERIFIED ({})", message);
            }
        }
        let _ = writeln!(out);
    }

    let checked: Vec<&PairCheck> = outcomes.iter().filter_map(PairVerification::check).collect();
    let flagged = checked.iter().filter(|c| !c.passed()).count();
    let failed = outcomes.len() - checked.len();
    let _ = write!(out, "{} pairs verified, {} flagged", checked.len(), flagged);
    if failed > 0 {
        let _ = write!(out, ", {} could not be verified", failed);
    }
    let _ = writeln!(out);
}

pub fn event_check_text(check: &EventCheck) -> String {
    let mut out = String::new();
    write_event_check(&mut out, check);
    out
}

fn write_event_check(out: &mut String, check: &EventCheck) {
    let event = &check.event;
    let _ = writeln!(
        out,
        "\n{} ECLIPSE ({})",
        event.kind.to_string().to_uppercase(),
        event.class
    );
    let _ = writeln!(out, "  Date: {}", format_jd(event.instant));
    let _ = writeln!(out, "  Julian Day: {:.6}", event.instant);

    for body in [&check.sun, &check.moon] {
        let _ = writeln!(out, "  {}:", body.body.to_string().to_uppercase());
        let _ = writeln!(
            out,
            "    RA {:10.6}° = {:.4}h   Dec {:+10.6}°",
            body.right_ascension_deg,
            body.right_ascension_deg / 15.0,
            body.declination_deg
        );
        let _ = writeln!(
            out,
            "    Ecliptic lon {:10.6}°   lat {:+10.6}°",
            body.ecliptic_lon_deg, body.ecliptic_lat_deg
        );
        let _ = writeln!(
            out,
            "    Distance {:.1} km ({:.8} AU)",
            body.distance_km,
            body.distance_au()
        );
    }

    let _ = writeln!(out, "  Angular separation: {:.6}°", check.separation_deg);
    let _ = writeln!(out, "  Ecliptic lon difference: {:.6}°", check.ecliptic_lon_diff_deg);
    if let Some(deviation) = check.opposition_deviation_deg {
        let _ = writeln!(out, "  Deviation from opposition: {:.6}°", deviation);
    }
    let _ = writeln!(
        out,
        "  Sun altitude {:+.2}°, Moon altitude {:+.2}°",
        check.sun_altitude_deg, check.moon_altitude_deg
    );
    let _ = writeln!(out, "  Local circumstances: {}", check.visibility.metric);

    if check.issues.is_empty() {
        let _ = writeln!(out, "  PASS");
    }
    for issue in &check.issues {
        let _ = writeln!(out, "  FLAG: {}", issue);
    }
}

/// Write `content` to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, content: &str) -> Result<(), ReportError> {
    match path {
        Some(path) => fs::write(path, content)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::ScanStop;

    fn sample() -> (Enumeration, Vec<EclipsePair>) {
        let solar = EclipseEvent {
            kind: EclipseKind::Solar,
            instant: 589_000.25,
            class: EclipseClass::Annular,
            magnitude: 0.96,
        };
        let lunar = EclipseEvent {
            kind: EclipseKind::Lunar,
            instant: 589_014.75,
            class: EclipseClass::Partial,
            magnitude: 0.41,
        };
        let enumeration = Enumeration {
            events: vec![solar, lunar],
            solar: ScanReport {
                kind: EclipseKind::Solar,
                found: 1,
                stop: ScanStop::Exhausted,
            },
            lunar: ScanReport {
                kind: EclipseKind::Lunar,
                found: 1,
                stop: ScanStop::OutOfRange {
                    message: "too early".into(),
                },
            },
        };
        let pair = EclipsePair {
            first: solar,
            second: lunar,
            gap_days: 14.5,
            location: Location::new(-15.0, 45.0),
            first_visibility: VisibilityMetric::Solar {
                diameter_fraction: 0.3,
                obscuration: 0.2,
                sun_altitude_deg: 40.0,
            },
            second_visibility: VisibilityMetric::Lunar {
                umbral_magnitude: 0.41,
                penumbral_magnitude: 1.4,
                moon_altitude_deg: 25.0,
            },
        };
        (enumeration, vec![pair])
    }

    #[test]
    fn text_report_lists_pair_and_warning() {
        let (enumeration, pairs) = sample();
        let window = SearchWindow::new(588_900.0, 589_100.0);
        let text = PairReport::new(&window, 15.0, 216, &enumeration, &pairs).to_text();

        assert!(text.contains("Pair #1 at 15°S, 45°E"));
        assert!(text.contains("gap: 14.50 days"));
        assert!(text.contains("BC"));
        assert!(text.contains("WARNING: lunar scan ended early"));
        assert!(text.contains("Total: 1 pairs"));
    }

    #[test]
    fn json_report_is_machine_readable() {
        let (enumeration, pairs) = sample();
        let window = SearchWindow::new(588_900.0, 589_100.0);
        let json = PairReport::new(&window, 15.0, 216, &enumeration, &pairs)
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["pairs"][0]["gap_days"], 14.5);
        assert_eq!(value["pairs"][0]["first"]["kind"], "solar");
        assert_eq!(value["pairs"][0]["second_visibility"]["type"], "lunar");
        assert_eq!(value["pairs"][0]["location"]["latitude_deg"], -15.0);
        assert_eq!(value["scans"][1]["stop"]["reason"], "out_of_range");
    }

    #[test]
    fn event_listing_has_one_line_per_event() {
        let (enumeration, _) = sample();
        let text = events_text(&enumeration);
        assert_eq!(text.lines().filter(|l| !l.starts_with('#')).count(), 2);
        assert!(text.contains("annular"));

        let json = events_json(&enumeration).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["events"].as_array().map(|a| a.len()), Some(2));
    }

    #[test]
    fn unverifiable_pair_keeps_the_report() {
        let (enumeration, pairs) = sample();
        let window = SearchWindow::new(588_900.0, 589_100.0);
        let report = PairReport::new(&window, 15.0, 216, &enumeration, &pairs).with_verification(
            vec![PairVerification::Failed {
                message: "JD 589000.25 is outside the supported range".into(),
            }],
        );

        let text = report.to_text();
        assert!(text.contains("Pair #1 at 15°S, 45°E"));
        assert!(text.contains("Result: NOT VERIFIED (JD 589000.25"));
        assert!(text.contains("0 pairs verified, 0 flagged, 1 could not be verified"));

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["pairs"].as_array().map(|a| a.len()), Some(1));
        assert_eq!(value["verification"][0]["status"], "failed");
    }
}
