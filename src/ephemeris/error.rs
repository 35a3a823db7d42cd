use thiserror::Error;

use crate::time::DeltaTError;

#[derive(Debug, Error)]
pub enum EphemerisError {
    #[error("JD {jd:.2} is outside the supported range [{min:.2}, {max:.2}]")]
    OutOfRange { jd: f64, min: f64, max: f64 },
    #[error("ephemeris data path not found: {0}")]
    DataPath(String),
    #[error("ΔT table: {0}")]
    DeltaTTable(#[from] DeltaTError),
    #[error("invalid ephemeris configuration: {0}")]
    InvalidConfig(String),
}

impl EphemerisError {
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, EphemerisError::OutOfRange { .. })
    }
}
