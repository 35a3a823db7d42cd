//! Enumerate eclipses, pair the close ones and keep the pairs seen from a
//! common location.

mod enumerator;
mod matcher;
mod types;
mod visibility;

pub use enumerator::{enumerate, scan_kind, Enumeration, ScanReport, ScanStop};
pub use matcher::{candidate_pairs, match_pairs};
pub use types::{
    EclipsePair, MatchMode, MatchOptions, SearchWindow, Thresholds, VisibilityMetric,
    VisibilityResult,
};
pub use visibility::VisibilityTester;
