//! Validated p-dispersion instance data.
//!
//! Both tables are stored row-major and flattened, matching the layout the
//! element constraints index into.

use std::sync::Arc;

use thiserror::Error;

/// Immutable instance: candidate sites, facility slots and the two tables.
///
/// # Examples
///
/// ```
/// use dispersion_core::InstanceData;
///
/// # fn main() -> Result<(), dispersion_core::InstanceError> {
/// let instance = InstanceData::new(
///     3,
///     2,
///     vec![0, 5, 10, 5, 0, 7, 10, 7, 0],
///     vec![0, 3, 3, 0],
/// )?;
/// assert_eq!(instance.distance(0, 2), Some(10));
/// assert_eq!(instance.threshold(0, 1), Some(3));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceData {
    points: usize,
    facilities: usize,
    distances: Arc<[i64]>,
    separation_thresholds: Arc<[i64]>,
}

/// Reasons an instance is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceError {
    /// The instance has no candidate sites.
    #[error("instance must contain at least one candidate site")]
    NoPoints,
    /// Fewer than two facility slots leaves no pair to constrain.
    #[error("at least two facility slots are required, found {facilities}")]
    TooFewFacilities {
        /// Facility slot count supplied.
        facilities: usize,
    },
    /// The distance table does not hold `points²` entries.
    #[error("distance table must hold {expected} entries, found {actual}")]
    DistanceTableLength {
        /// Expected entry count.
        expected: usize,
        /// Entry count supplied.
        actual: usize,
    },
    /// The threshold table does not hold `facilities²` entries.
    #[error("separation threshold table must hold {expected} entries, found {actual}")]
    ThresholdTableLength {
        /// Expected entry count.
        expected: usize,
        /// Entry count supplied.
        actual: usize,
    },
    /// `distances[row][col] != distances[col][row]`.
    #[error("distance table is not symmetric at ({row}, {col})")]
    AsymmetricDistances {
        /// Row index of the mismatch.
        row: usize,
        /// Column index of the mismatch.
        col: usize,
    },
    /// A site has a non-zero distance to itself.
    #[error("distance from site {site} to itself must be 0")]
    NonZeroDiagonal {
        /// Offending site.
        site: usize,
    },
    /// `thresholds[row][col] != thresholds[col][row]`.
    #[error("separation threshold table is not symmetric at ({row}, {col})")]
    AsymmetricThresholds {
        /// Row index of the mismatch.
        row: usize,
        /// Column index of the mismatch.
        col: usize,
    },
    /// `points²` does not fit in the index arithmetic.
    #[error("{points} candidate sites overflow the linear index range")]
    TooManyPoints {
        /// Candidate site count supplied.
        points: usize,
    },
}

impl InstanceData {
    /// Validates and constructs an [`InstanceData`].
    ///
    /// Rejects empty site sets, fewer than two facility slots, tables of the
    /// wrong length, asymmetric tables and non-zero distance diagonals.
    pub fn new(
        points: usize,
        facilities: usize,
        distances: Vec<i64>,
        separation_thresholds: Vec<i64>,
    ) -> Result<Self, InstanceError> {
        if points == 0 {
            return Err(InstanceError::NoPoints);
        }
        if facilities < 2 {
            return Err(InstanceError::TooFewFacilities { facilities });
        }
        let expected = square(points).ok_or(InstanceError::TooManyPoints { points })?;
        if distances.len() != expected {
            return Err(InstanceError::DistanceTableLength {
                expected,
                actual: distances.len(),
            });
        }
        let expected_thresholds = facilities.saturating_mul(facilities);
        if separation_thresholds.len() != expected_thresholds {
            return Err(InstanceError::ThresholdTableLength {
                expected: expected_thresholds,
                actual: separation_thresholds.len(),
            });
        }
        if let Some((row, col)) = first_asymmetry(&distances, points) {
            return Err(InstanceError::AsymmetricDistances { row, col });
        }
        if let Some(site) = (0..points).find(|&site| at(&distances, points, site, site) != Some(0)) {
            return Err(InstanceError::NonZeroDiagonal { site });
        }
        if let Some((row, col)) = first_asymmetry(&separation_thresholds, facilities) {
            return Err(InstanceError::AsymmetricThresholds { row, col });
        }
        Ok(Self {
            points,
            facilities,
            distances: distances.into(),
            separation_thresholds: separation_thresholds.into(),
        })
    }

    /// Number of candidate sites (`P`).
    #[must_use]
    pub const fn points(&self) -> usize {
        self.points
    }

    /// Number of facility slots (`FAC`).
    #[must_use]
    pub const fn facilities(&self) -> usize {
        self.facilities
    }

    /// Flattened `P × P` distance table.
    #[must_use]
    pub fn distances(&self) -> &[i64] {
        &self.distances
    }

    /// Shared handle to the distance table, used as the element table.
    #[must_use]
    pub fn distance_table(&self) -> Arc<[i64]> {
        Arc::clone(&self.distances)
    }

    /// Flattened `FAC × FAC` separation threshold table.
    #[must_use]
    pub fn separation_thresholds(&self) -> &[i64] {
        &self.separation_thresholds
    }

    /// Distance between two sites, `None` when out of range.
    #[must_use]
    pub fn distance(&self, from: usize, to: usize) -> Option<i64> {
        at(&self.distances, self.points, from, to)
    }

    /// Separation threshold between two facility slots, `None` when out of range.
    #[must_use]
    pub fn threshold(&self, first: usize, second: usize) -> Option<i64> {
        at(&self.separation_thresholds, self.facilities, first, second)
    }

    /// Minimum over all slot pairs of the distance between their chosen sites.
    ///
    /// Returns `None` when the assignment has the wrong length or names a
    /// site outside `[0, points)`.
    #[must_use]
    pub fn min_pair_distance(&self, assignment: &[usize]) -> Option<i64> {
        if assignment.len() != self.facilities {
            return None;
        }
        let mut best: Option<i64> = None;
        for (first, &from) in assignment.iter().enumerate() {
            for &to in assignment.iter().skip(first + 1) {
                let distance = self.distance(from, to)?;
                best = Some(best.map_or(distance, |current| current.min(distance)));
            }
        }
        best
    }
}

fn square(n: usize) -> Option<usize> {
    let squared = n.checked_mul(n)?;
    i64::try_from(squared).ok().map(|_| squared)
}

fn at(table: &[i64], width: usize, row: usize, col: usize) -> Option<i64> {
    if row >= width || col >= width {
        return None;
    }
    table.get(row * width + col).copied()
}

fn first_asymmetry(table: &[i64], width: usize) -> Option<(usize, usize)> {
    (0..width)
        .flat_map(|row| ((row + 1)..width).map(move |col| (row, col)))
        .find(|&(row, col)| at(table, width, row, col) != at(table, width, col, row))
}
