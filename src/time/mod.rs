//! Time scales and calendar rendering.
//!
//! Every instant handled by the search is a Julian Day in UT. The ephemeris
//! works in TT internally and converts through [`DeltaT`].

mod delta_t;
mod julian;
mod sidereal;

pub use delta_t::{DeltaT, DeltaTError};
pub use julian::{
    calendar_to_jd, decimal_year, era_label, format_jd, jd_to_datetime, CalendarStamp,
    J2000_JD, SECONDS_PER_DAY, UNIX_EPOCH_JD,
};
pub use sidereal::{apparent_sidereal_time_rad, gmst_rad};
