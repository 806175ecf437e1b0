//! Normalised solve results and the end-to-end pipeline.

use std::time::Duration;

use crate::{
    ConstraintSystem, InstanceData, ModelBuilder, ModelOptions, RawOutcome, SolveConfig,
    SolveError, SolveStatus, SolverBackend,
};

/// Timing and search counters attached to a [`SolveResult`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostics {
    /// Wall-clock time spent in the backend.
    pub solve_time: Duration,
    /// Improving solutions found.
    pub solutions_found: u64,
}

/// Backend-independent result of a solve.
///
/// `objective` and `assignment` are present exactly when `status` carries a
/// solution; callers branch on `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolveResult {
    /// Terminal state reported by the backend.
    pub status: SolveStatus,
    /// Minimum pair distance of the returned assignment.
    pub objective: Option<i64>,
    /// Chosen site per facility slot.
    pub assignment: Option<Vec<usize>>,
    /// Identifier of the solved instance, usually its file path.
    pub source_id: String,
    /// Timing and counters.
    pub diagnostics: Diagnostics,
}

/// Maps a raw backend outcome onto a [`SolveResult`].
///
/// Never fails: an outcome that claims a solution but lacks readable values
/// for the assignment or objective is reported as [`SolveStatus::Invalid`].
#[must_use]
pub fn extract(outcome: &RawOutcome, system: &ConstraintSystem, source_id: &str) -> SolveResult {
    let diagnostics = Diagnostics {
        solve_time: outcome.solve_time,
        solutions_found: outcome.solutions_found,
    };
    let empty = |status| SolveResult {
        status,
        objective: None,
        assignment: None,
        source_id: source_id.to_owned(),
        diagnostics: diagnostics.clone(),
    };
    if !outcome.status.has_solution() {
        return empty(outcome.status);
    }
    let Some(values) = outcome.values.as_deref() else {
        log::warn!("{source_id}: {:?} outcome carried no values", outcome.status);
        return empty(SolveStatus::Invalid);
    };
    let read = |var: crate::VarId| values.get(var.index()).copied();
    let assignment: Option<Vec<usize>> = system
        .assignment()
        .iter()
        .map(|&var| read(var).and_then(|value| usize::try_from(value).ok()))
        .collect();
    match (assignment, read(system.objective())) {
        (Some(assignment), Some(objective)) => SolveResult {
            status: outcome.status,
            objective: Some(objective),
            assignment: Some(assignment),
            source_id: source_id.to_owned(),
            diagnostics,
        },
        _ => {
            log::warn!("{source_id}: solution values do not cover the model variables");
            empty(SolveStatus::Invalid)
        }
    }
}

/// Builds, solves and extracts in one call.
///
/// # Examples
///
/// ```
/// use dispersion_core::{
///     ConstraintSystem, InstanceData, ModelOptions, RawOutcome, SolveConfig, SolveError,
///     SolveStatus, SolverBackend, solve_instance,
/// };
/// use std::time::Duration;
///
/// struct GiveUp;
///
/// impl SolverBackend for GiveUp {
///     fn name(&self) -> &'static str {
///         "give-up"
///     }
///
///     fn solve(&self, _: &ConstraintSystem, _: &SolveConfig) -> Result<RawOutcome, SolveError> {
///         Ok(RawOutcome::without_solution(SolveStatus::Unknown, Duration::ZERO))
///     }
/// }
///
/// # fn main() -> Result<(), SolveError> {
/// let instance = InstanceData::new(2, 2, vec![0, 4, 4, 0], vec![0, 1, 1, 0])?;
/// let result = solve_instance(
///     &instance,
///     ModelOptions::default(),
///     &GiveUp,
///     &SolveConfig::default(),
///     "inline",
/// )?;
/// assert_eq!(result.status, SolveStatus::Unknown);
/// assert!(result.assignment.is_none());
/// # Ok(())
/// # }
/// ```
pub fn solve_instance(
    instance: &InstanceData,
    options: ModelOptions,
    backend: &dyn SolverBackend,
    config: &SolveConfig,
    source_id: &str,
) -> Result<SolveResult, SolveError> {
    let system = ModelBuilder::with_options(options).build_instance(instance)?;
    let outcome = backend.solve(&system, config)?;
    let result = extract(&outcome, &system, source_id);
    log::debug!(
        "{source_id}: {} backend returned {:?} objective={:?}",
        backend.name(),
        result.status,
        result.objective
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn system() -> ConstraintSystem {
        let instance =
            InstanceData::new(3, 2, vec![0, 5, 10, 5, 0, 7, 10, 7, 0], vec![0, 3, 3, 0])
                .expect("valid instance");
        ModelBuilder::new().build_instance(&instance).expect("model")
    }

    fn solved(system: &ConstraintSystem, status: SolveStatus) -> RawOutcome {
        // site[0]=0, site[1]=2, pair_index=2, pair_distance=10, min_distance=10
        let values = vec![0, 2, 2, 10, 10];
        assert_eq!(values.len(), system.variables().len());
        RawOutcome {
            status,
            values: Some(values),
            solve_time: Duration::from_millis(5),
            solutions_found: 2,
        }
    }

    #[rstest]
    #[case(SolveStatus::Optimal)]
    #[case(SolveStatus::Feasible)]
    fn reads_assignment_and_objective(system: ConstraintSystem, #[case] status: SolveStatus) {
        let result = extract(&solved(&system, status), &system, "three.txt");
        assert_eq!(result.status, status);
        assert_eq!(result.objective, Some(10));
        assert_eq!(result.assignment, Some(vec![0, 2]));
        assert_eq!(result.source_id, "three.txt");
        assert_eq!(result.diagnostics.solutions_found, 2);
    }

    #[rstest]
    #[case(SolveStatus::Infeasible)]
    #[case(SolveStatus::Unknown)]
    #[case(SolveStatus::Invalid)]
    fn statuses_without_solution_leave_fields_absent(
        system: ConstraintSystem,
        #[case] status: SolveStatus,
    ) {
        let outcome = RawOutcome::without_solution(status, Duration::ZERO);
        let result = extract(&outcome, &system, "three.txt");
        assert_eq!(result.status, status);
        assert_eq!(result.objective, None);
        assert_eq!(result.assignment, None);
    }

    #[rstest]
    fn solution_values_are_ignored_for_infeasible(system: ConstraintSystem) {
        let mut outcome = solved(&system, SolveStatus::Infeasible);
        outcome.solutions_found = 0;
        let result = extract(&outcome, &system, "three.txt");
        assert_eq!(result.assignment, None);
    }

    #[rstest]
    fn optimal_without_values_is_reported_invalid(system: ConstraintSystem) {
        let outcome = RawOutcome::without_solution(SolveStatus::Optimal, Duration::ZERO);
        let result = extract(&outcome, &system, "three.txt");
        assert_eq!(result.status, SolveStatus::Invalid);
        assert_eq!(result.objective, None);
    }

    #[rstest]
    fn truncated_values_are_reported_invalid(system: ConstraintSystem) {
        let mut outcome = solved(&system, SolveStatus::Feasible);
        outcome.values = Some(vec![0, 2]);
        let result = extract(&outcome, &system, "three.txt");
        assert_eq!(result.status, SolveStatus::Invalid);
        assert_eq!(result.assignment, None);
    }

    #[rstest]
    fn negative_site_values_are_reported_invalid(system: ConstraintSystem) {
        let mut outcome = solved(&system, SolveStatus::Feasible);
        outcome.values = Some(vec![-1, 2, 1, 5, 5]);
        let result = extract(&outcome, &system, "three.txt");
        assert_eq!(result.status, SolveStatus::Invalid);
    }
}
