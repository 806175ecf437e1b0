//! Turns [`InstanceData`] into a [`ConstraintSystem`].

use std::sync::Arc;

use crate::model::{Constraint, ConstraintSystem, Domain, ModelOptions, PairLink, SystemDraft, VarId};
use crate::{InstanceData, InstanceError};

/// Builds the element formulation of the p-dispersion model.
///
/// One assignment variable per facility slot selects a site. For every
/// unordered slot pair a linear index addresses the flattened distance table,
/// an element constraint reads the pair distance, and a strict threshold
/// bounds it from below. The objective is the minimum pair distance.
///
/// # Examples
///
/// ```
/// use dispersion_core::{InstanceData, ModelBuilder};
///
/// # fn main() -> Result<(), dispersion_core::InstanceError> {
/// let instance = InstanceData::new(
///     3,
///     2,
///     vec![0, 5, 10, 5, 0, 7, 10, 7, 0],
///     vec![0, 3, 3, 0],
/// )?;
/// let system = ModelBuilder::new().build(&instance, 2)?;
/// assert_eq!(system.assignment().len(), 2);
/// assert_eq!(system.pair_links().len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelBuilder {
    options: ModelOptions,
}

impl ModelBuilder {
    /// Builder producing the permissive model (sites may repeat).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with explicit [`ModelOptions`].
    #[must_use]
    pub const fn with_options(options: ModelOptions) -> Self {
        Self { options }
    }

    /// Builds the model for the instance's own facility count.
    pub fn build_instance(&self, instance: &InstanceData) -> Result<ConstraintSystem, InstanceError> {
        self.build(instance, instance.facilities())
    }

    /// Builds the model for `facility_count` slots.
    ///
    /// Fails when `facility_count < 2` or when either table does not match
    /// the requested dimensions.
    pub fn build(
        &self,
        instance: &InstanceData,
        facility_count: usize,
    ) -> Result<ConstraintSystem, InstanceError> {
        let points = instance.points();
        validate_dimensions(instance, facility_count)?;
        let stride = i64::try_from(points).map_err(|_| InstanceError::TooManyPoints { points })?;
        let cells = stride
            .checked_mul(stride)
            .ok_or(InstanceError::TooManyPoints { points })?;

        let mut draft = SystemDraft::default();
        let assignment: Vec<VarId> = (0..facility_count)
            .map(|slot| {
                draft.add_variable(
                    format!("site[{slot}]"),
                    Domain::Interval {
                        min: 0,
                        max: stride - 1,
                    },
                )
            })
            .collect();

        let table = instance.distance_table();
        let distinct = Domain::from_values(table.iter().copied());
        let mut pair_distances = Vec::with_capacity(pair_count(facility_count));

        for (first, second) in slot_pairs(facility_count) {
            let (Some(&row), Some(&column)) = (assignment.get(first), assignment.get(second))
            else {
                continue;
            };
            let threshold = instance
                .separation_thresholds()
                .get(first * facility_count + second)
                .copied()
                .unwrap_or_default();
            let index = draft.add_variable(
                format!("pair_index[{first},{second}]"),
                Domain::Interval {
                    min: 0,
                    max: cells - 1,
                },
            );
            let distance =
                draft.add_variable(format!("pair_distance[{first},{second}]"), distinct.clone());
            draft.post(Constraint::LinearIndex {
                index,
                row,
                column,
                stride,
            });
            draft.post(Constraint::Element {
                index,
                table: Arc::clone(&table),
                value: distance,
            });
            draft.post(Constraint::GreaterThan {
                var: distance,
                bound: threshold,
            });
            draft.record_pair(PairLink {
                first,
                second,
                index,
                distance,
                threshold,
            });
            pair_distances.push(distance);
        }

        if self.options.distinct_sites {
            draft.post(Constraint::AllDifferent {
                vars: assignment.clone(),
            });
        }

        let distinct_values = distinct.size();
        let objective = draft.add_variable("min_distance".to_owned(), distinct);
        draft.post(Constraint::MinEquality {
            target: objective,
            operands: pair_distances,
        });
        log::debug!(
            "built element model: {facility_count} slots, {} pairs, {distinct_values} distinct distances",
            pair_count(facility_count),
        );
        Ok(draft.finish(assignment, objective))
    }
}

fn validate_dimensions(instance: &InstanceData, facility_count: usize) -> Result<(), InstanceError> {
    let points = instance.points();
    if points == 0 {
        return Err(InstanceError::NoPoints);
    }
    if facility_count < 2 {
        return Err(InstanceError::TooFewFacilities {
            facilities: facility_count,
        });
    }
    let expected = points.saturating_mul(points);
    if instance.distances().len() != expected {
        return Err(InstanceError::DistanceTableLength {
            expected,
            actual: instance.distances().len(),
        });
    }
    let expected_thresholds = facility_count.saturating_mul(facility_count);
    if instance.separation_thresholds().len() != expected_thresholds {
        return Err(InstanceError::ThresholdTableLength {
            expected: expected_thresholds,
            actual: instance.separation_thresholds().len(),
        });
    }
    Ok(())
}

/// Unordered slot pairs `(first, second)`, `first < second`, lexicographic.
pub fn slot_pairs(facility_count: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..facility_count)
        .flat_map(move |first| ((first + 1)..facility_count).map(move |second| (first, second)))
}

/// Number of unordered slot pairs, `n·(n−1)/2`.
#[must_use]
pub const fn pair_count(facility_count: usize) -> usize {
    facility_count.saturating_mul(facility_count.saturating_sub(1)) / 2
}
