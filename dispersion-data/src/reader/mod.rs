//! Reader for the whitespace-separated instance format.
//!
//! ```text
//! P FAC
//! 0 1 d01
//! 0 2 d02
//! ...            one line per site pair (i < j), upper-triangular order
//! a b t          one line per facility slot pair
//! ```
//!
//! Blank lines are ignored. Distance lines are placed by position; their
//! index columns must be integers but are not otherwise interpreted.
//! Threshold lines are placed by their own `a b` columns.

mod error;

use camino::Utf8Path;
use dispersion_core::{InstanceData, InstanceError, pair_count, slot_pairs};

pub use error::{InstanceReadError, ParseError};

/// Largest magnitude a scaled value may take, `2^53`.
///
/// Every integer up to this bound survives a round trip through `f64`.
const MAX_MAGNITUDE: f64 = 9_007_199_254_740_992.0;

/// Options controlling how numeric fields are converted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Values are multiplied by `10^decimal_points` and truncated toward
    /// zero, preserving that many fractional digits as integers.
    pub decimal_points: u32,
}

impl ReadOptions {
    fn scale(self) -> f64 {
        let exponent = i32::try_from(self.decimal_points).unwrap_or(i32::MAX);
        10f64.powi(exponent)
    }
}

/// Reads and validates an instance file.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use dispersion_data::{ReadOptions, read_instance};
///
/// # fn main() -> Result<(), dispersion_data::InstanceReadError> {
/// let instance = read_instance(Utf8Path::new("instances/grid.txt"), ReadOptions::default())?;
/// assert!(instance.points() > 0);
/// # Ok(())
/// # }
/// ```
pub fn read_instance(
    path: &Utf8Path,
    options: ReadOptions,
) -> Result<InstanceData, InstanceReadError> {
    let contents =
        dispersion_fs::read_utf8_to_string(path).map_err(|source| InstanceReadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    let instance = parse_instance(&contents, options).map_err(|source| InstanceReadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!(
        "read {path}: {} sites, {} facility slots",
        instance.points(),
        instance.facilities()
    );
    Ok(instance)
}

/// Parses instance text.
///
/// # Examples
/// ```
/// use dispersion_data::{ReadOptions, parse_instance};
///
/// let text = "3 2\n0 1 5\n0 2 10\n1 2 7\n0 1 3\n";
/// let instance = parse_instance(text, ReadOptions::default()).expect("valid");
/// assert_eq!(instance.distance(0, 2), Some(10));
/// assert_eq!(instance.threshold(1, 0), Some(3));
/// ```
pub fn parse_instance(text: &str, options: ReadOptions) -> Result<InstanceData, ParseError> {
    let mut records = Records::new(text);
    let header = records.next_record("header")?;
    let points = header.count(0, "site count")?;
    let facilities = header.count(1, "facility count")?;

    let scale = options.scale();
    let mut upper = Vec::new();
    for _ in 0..pair_count(points) {
        let record = records.next_record("distance line")?;
        record.count(0, "first site")?;
        record.count(1, "second site")?;
        upper.push(record.value(2, scale)?);
    }
    if facilities < 2 {
        return Err(InstanceError::TooFewFacilities { facilities }.into());
    }
    let mut entries = Vec::new();
    for _ in 0..pair_count(facilities) {
        let record = records.next_record("threshold line")?;
        let a = record.slot(0, facilities)?;
        let b = record.slot(1, facilities)?;
        if a == b {
            return Err(ParseError::SelfPair {
                line: record.line,
                slot: a,
            });
        }
        entries.push(((a, b), record.value(2, scale)?));
    }

    let trailing = records.remaining();
    if trailing > 0 {
        log::debug!("ignoring {trailing} trailing lines");
    }
    let distances = symmetric(points, slot_pairs(points).zip(upper));
    let thresholds = symmetric(facilities, entries);
    Ok(InstanceData::new(points, facilities, distances, thresholds)?)
}

/// Expands `(row, col) -> value` entries into a full symmetric table.
///
/// Only called once every entry has been read, so the allocation is bounded
/// by the input size.
fn symmetric<I>(width: usize, entries: I) -> Vec<i64>
where
    I: IntoIterator<Item = ((usize, usize), i64)>,
{
    let mut table = vec![0_i64; width.saturating_mul(width)];
    for ((row, col), value) in entries {
        for (r, c) in [(row, col), (col, row)] {
            if let Some(cell) = table.get_mut(r * width + c) {
                *cell = value;
            }
        }
    }
    table
}

struct Records<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Records<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
        }
    }

    fn next_record(&mut self, expected: &'static str) -> Result<Record<'a>, ParseError> {
        self.lines
            .by_ref()
            .find(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| Record {
                line: index + 1,
                fields: line.split_whitespace().collect(),
            })
            .ok_or(ParseError::UnexpectedEnd { expected })
    }

    fn remaining(self) -> usize {
        self.lines.filter(|(_, line)| !line.trim().is_empty()).count()
    }
}

struct Record<'a> {
    line: usize,
    fields: Vec<&'a str>,
}

impl Record<'_> {
    fn field(&self, index: usize, field: &'static str) -> Result<&str, ParseError> {
        self.fields
            .get(index)
            .copied()
            .ok_or(ParseError::MissingField {
                line: self.line,
                field,
            })
    }

    fn count(&self, index: usize, field: &'static str) -> Result<usize, ParseError> {
        let raw = self.field(index, field)?;
        raw.parse().map_err(|source| ParseError::InvalidInteger {
            line: self.line,
            field,
            value: raw.to_owned(),
            source,
        })
    }

    fn slot(&self, index: usize, facilities: usize) -> Result<usize, ParseError> {
        let slot = self.count(index, "facility slot")?;
        if slot >= facilities {
            return Err(ParseError::SlotOutOfRange {
                line: self.line,
                slot,
                facilities,
            });
        }
        Ok(slot)
    }

    fn value(&self, index: usize, scale: f64) -> Result<i64, ParseError> {
        let raw = self.field(index, "value")?;
        let parsed: f64 = raw.parse().map_err(|source| ParseError::InvalidNumber {
            line: self.line,
            value: raw.to_owned(),
            source,
        })?;
        let scaled = (parsed * scale).trunc();
        if !scaled.is_finite() || scaled.abs() > MAX_MAGNITUDE {
            return Err(ParseError::ValueOutOfRange {
                line: self.line,
                value: raw.to_owned(),
            });
        }
        Ok(scaled as i64)
    }
}

#[cfg(test)]
mod tests;
