//! Search historical date ranges for pairs of solar and lunar eclipses that
//! fall within a few days of each other and can both be seen from one place.

pub mod config;
pub mod ephemeris;
pub mod location;
pub mod report;
pub mod search;
pub mod time;
pub mod verify;
