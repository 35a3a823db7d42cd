use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use serde::Serialize;

/// Julian Day of 2000-01-01 12:00 TT.
pub const J2000_JD: f64 = 2_451_545.0;
/// Julian Day of 1970-01-01 00:00 UTC.
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;
pub const SECONDS_PER_DAY: f64 = 86_400.0;

const DAYS_PER_GREGORIAN_YEAR: f64 = 365.2425;

/// Convert a proleptic Gregorian calendar date (astronomical year numbering,
/// year 0 = 1 BC) plus fractional hours into a Julian Day.
pub fn calendar_to_jd(year: i32, month: u32, day: u32, hour: f64) -> Option<f64> {
    let midnight = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
    let seconds = midnight.and_utc().timestamp();
    Some(UNIX_EPOCH_JD + seconds as f64 / SECONDS_PER_DAY + hour / 24.0)
}

/// Julian Day to a UTC timestamp, rounded to the millisecond.
pub fn jd_to_datetime(jd: f64) -> Option<DateTime<Utc>> {
    if !jd.is_finite() {
        return None;
    }
    let millis = ((jd - UNIX_EPOCH_JD) * SECONDS_PER_DAY * 1000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

/// Fractional year, good enough to drive ΔT models.
pub fn decimal_year(jd: f64) -> f64 {
    2000.0 + (jd - J2000_JD) / DAYS_PER_GREGORIAN_YEAR
}

/// Historical label for an astronomical year: 0 is 1 BC, -3099 is 3100 BC.
pub fn era_label(year: i32) -> String {
    if year <= 0 {
        format!("{} BC", 1 - year)
    } else {
        format!("AD {}", year)
    }
}

/// Calendar breakdown of an instant, as written into reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarStamp {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub era: String,
}

impl CalendarStamp {
    pub fn from_jd(jd: f64) -> Option<Self> {
        let dt = jd_to_datetime(jd)?;
        Some(Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
            era: era_label(dt.year()),
        })
    }
}

impl std::fmt::Display for CalendarStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{:02}-{:02} {:02}:{:02}:{:02} UTC ({})",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.era
        )
    }
}

/// Render a Julian Day as `YYYY-MM-DD hh:mm:ss UTC (era)`, falling back to the
/// raw number when the instant is outside the representable calendar.
pub fn format_jd(jd: f64) -> String {
    match CalendarStamp::from_jd(jd) {
        Some(stamp) => stamp.to_string(),
        None => format!("JD {:.5}", jd),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn j2000_noon() {
        let jd = calendar_to_jd(2000, 1, 1, 12.0).unwrap();
        assert!((jd - J2000_JD).abs() < 1e-9);
    }

    #[test]
    fn unix_epoch() {
        let jd = calendar_to_jd(1970, 1, 1, 0.0).unwrap();
        assert_eq!(jd, UNIX_EPOCH_JD);
    }

    #[test]
    fn proleptic_year_zero_exists() {
        // 0000-03-01 follows 0000-02-29: year 0 is a Gregorian leap year.
        let feb29 = calendar_to_jd(0, 2, 29, 0.0).unwrap();
        let mar1 = calendar_to_jd(0, 3, 1, 0.0).unwrap();
        assert!((mar1 - feb29 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bc_dates_render_with_negative_year() {
        let jd = calendar_to_jd(-3099, 1, 15, 21.5).unwrap();
        let stamp = CalendarStamp::from_jd(jd).unwrap();
        assert_eq!(stamp.year, -3099);
        assert_eq!(stamp.month, 1);
        assert_eq!(stamp.day, 15);
        assert_eq!(stamp.hour, 21);
        assert_eq!(stamp.minute, 30);
        assert_eq!(stamp.era, "3100 BC");
        assert_eq!(stamp.to_string(), "-3099-01-15 21:30:00 UTC (3100 BC)");
    }

    #[test]
    fn era_labels() {
        assert_eq!(era_label(0), "1 BC");
        assert_eq!(era_label(-2999), "3000 BC");
        assert_eq!(era_label(2017), "AD 2017");
    }

    #[test]
    fn decimal_year_tracks_calendar() {
        let jd = calendar_to_jd(-3000, 7, 2, 0.0).unwrap();
        assert!((decimal_year(jd) + 2999.5).abs() < 0.1);
    }

    #[test]
    fn non_finite_jd_is_rejected() {
        assert!(jd_to_datetime(f64::NAN).is_none());
        assert_eq!(format_jd(f64::INFINITY), "JD inf");
    }
}
