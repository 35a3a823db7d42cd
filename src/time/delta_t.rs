use std::fs;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeltaTError {
    #[error("ΔT table read error: {0}")]
    Read(#[from] std::io::Error),
    #[error("ΔT table line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("ΔT table years must be strictly increasing (line {0})")]
    Unordered(usize),
}

/// ΔT = TT − UT in seconds.
///
/// Uses the long-term polynomial fits (a parabola before −500, piecewise
/// polynomials through 2150) unless a tabulated series is loaded, in which
/// case values inside the table span are linearly interpolated.
#[derive(Debug, Clone, Default)]
pub struct DeltaT {
    table: Vec<(f64, f64)>,
}

impl DeltaT {
    pub fn polynomial_only() -> Self {
        Self::default()
    }

    /// Load a table of `year seconds` rows. Blank lines and `#` comments are skipped.
    pub fn load(path: &Path) -> Result<Self, DeltaTError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, DeltaTError> {
        let mut table: Vec<(f64, f64)> = Vec::new();

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let mut fields = line.split_whitespace();
            let (Some(year), Some(seconds)) = (fields.next(), fields.next()) else {
                return Err(DeltaTError::Parse {
                    line: line_no,
                    message: "expected `year seconds`".into(),
                });
            };
            let parse = |s: &str| {
                s.parse::<f64>().map_err(|e| DeltaTError::Parse {
                    line: line_no,
                    message: format!("{}: {}", s, e),
                })
            };
            let year = parse(year)?;
            let seconds = parse(seconds)?;

            if let Some(&(prev, _)) = table.last() {
                if year <= prev {
                    return Err(DeltaTError::Unordered(line_no));
                }
            }
            table.push((year, seconds));
        }

        Ok(Self { table })
    }

    pub fn is_tabulated(&self) -> bool {
        !self.table.is_empty()
    }

    /// ΔT in seconds at a fractional year.
    pub fn seconds(&self, year: f64) -> f64 {
        self.interpolate(year)
            .unwrap_or_else(|| Self::polynomial(year))
    }

    /// ΔT in days at a fractional year.
    pub fn days(&self, year: f64) -> f64 {
        self.seconds(year) / super::SECONDS_PER_DAY
    }

    fn interpolate(&self, year: f64) -> Option<f64> {
        let first = self.table.first()?;
        let last = self.table.last()?;
        if year < first.0 || year > last.0 {
            return None;
        }
        if self.table.len() == 1 {
            return Some(first.1);
        }

        let idx = self.table.partition_point(|&(y, _)| y <= year);
        let hi = idx.min(self.table.len() - 1).max(1);
        let (y0, v0) = self.table[hi - 1];
        let (y1, v1) = self.table[hi];
        let frac = (year - y0) / (y1 - y0);
        Some(v0 + frac * (v1 - v0))
    }

    /// Long-term ΔT polynomials, valid from antiquity to 2150.
    pub fn polynomial(y: f64) -> f64 {
        let long_term = |y: f64| {
            let u = (y - 1820.0) / 100.0;
            -20.0 + 32.0 * u * u
        };

        if y < -500.0 {
            long_term(y)
        } else if y < 500.0 {
            let u = y / 100.0;
            horner(
                u,
                &[
                    10583.6,
                    -1014.41,
                    33.78311,
                    -5.952053,
                    -0.1798452,
                    0.022174192,
                    0.0090316521,
                ],
            )
        } else if y < 1600.0 {
            let u = (y - 1000.0) / 100.0;
            horner(
                u,
                &[
                    1574.2,
                    -556.01,
                    71.23472,
                    0.319781,
                    -0.8503463,
                    -0.005050998,
                    0.0083572073,
                ],
            )
        } else if y < 1700.0 {
            let t = y - 1600.0;
            120.0 - 0.9808 * t - 0.01532 * t * t + t * t * t / 7129.0
        } else if y < 1800.0 {
            let t = y - 1700.0;
            horner(t, &[8.83, 0.1603, -0.0059285, 0.00013336, -1.0 / 1_174_000.0])
        } else if y < 1860.0 {
            let t = y - 1800.0;
            horner(
                t,
                &[
                    13.72,
                    -0.332447,
                    0.0068612,
                    0.0041116,
                    -0.00037436,
                    0.0000121272,
                    -0.0000001699,
                    0.000000000875,
                ],
            )
        } else if y < 1900.0 {
            let t = y - 1860.0;
            horner(
                t,
                &[
                    7.62,
                    0.5737,
                    -0.251754,
                    0.01680668,
                    -0.0004473624,
                    1.0 / 233_174.0,
                ],
            )
        } else if y < 1920.0 {
            let t = y - 1900.0;
            horner(t, &[-2.79, 1.494119, -0.0598939, 0.0061966, -0.000197])
        } else if y < 1941.0 {
            let t = y - 1920.0;
            horner(t, &[21.20, 0.84493, -0.076100, 0.0020936])
        } else if y < 1961.0 {
            let t = y - 1950.0;
            horner(t, &[29.07, 0.407, -1.0 / 233.0, 1.0 / 2547.0])
        } else if y < 1986.0 {
            let t = y - 1975.0;
            horner(t, &[45.45, 1.067, -1.0 / 260.0, -1.0 / 718.0])
        } else if y < 2005.0 {
            let t = y - 2000.0;
            horner(
                t,
                &[
                    63.86,
                    0.3345,
                    -0.060374,
                    0.0017275,
                    0.000651814,
                    0.00002373599,
                ],
            )
        } else if y < 2050.0 {
            let t = y - 2000.0;
            62.92 + 0.32217 * t + 0.005589 * t * t
        } else if y < 2150.0 {
            long_term(y) - 0.5628 * (2150.0 - y)
        } else {
            long_term(y)
        }
    }
}

/// Evaluate `c[0] + c[1] x + c[2] x² + …`.
fn horner(x: f64, coefficients: &[f64]) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}
