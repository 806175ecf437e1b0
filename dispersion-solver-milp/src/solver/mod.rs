//! `MilpSolver` implementation backed by `good_lp`.

use std::sync::Arc;
use std::time::Instant;

use dispersion_core::{
    ConstraintSystem, Progress, RawOutcome, SolveConfig, SolveError, SolveObserver, SolveStatus,
    SolverBackend,
};
use good_lp::{ResolutionError, SolutionStatus};

use crate::formulation::{self, BACKEND, Settings};

/// Configuration for [`MilpSolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilpSolverConfig {
    /// Upper bound on binary selector columns; larger models are rejected
    /// as unsupported.
    pub max_element_columns: usize,
}

impl Default for MilpSolverConfig {
    fn default() -> Self {
        Self {
            max_element_columns: 1 << 18,
        }
    }
}

/// Mixed-integer programming backend.
///
/// Linearises the constraint system and hands it to the pure-Rust `microlp`
/// engine under [`SolveConfig::time_limit`]. A proven optimum is reported as
/// [`SolveStatus::Optimal`]; an incumbent left when the budget runs out is
/// [`SolveStatus::Feasible`], and a budget that expires before any incumbent
/// yields [`SolveStatus::Unknown`]. The engine is single-threaded, so the
/// worker count is advisory.
#[derive(Clone, Default)]
pub struct MilpSolver {
    config: MilpSolverConfig,
    observer: Option<Arc<dyn SolveObserver>>,
}

impl std::fmt::Debug for MilpSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MilpSolver")
            .field("config", &self.config)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl MilpSolver {
    /// Construct a solver using default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a solver with explicit configuration.
    #[must_use]
    pub const fn with_config(config: MilpSolverConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    /// Attach an observer notified of the solution and the final status.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SolveObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &MilpSolverConfig {
        &self.config
    }
}

impl SolverBackend for MilpSolver {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn solve(&self, system: &ConstraintSystem, config: &SolveConfig) -> Result<RawOutcome, SolveError> {
        let started = Instant::now();
        let progress = Progress::new(BACKEND, config.verbosity, self.observer.clone());
        let tuning = &config.tuning;
        if tuning.presolve.is_some() || tuning.max_presolve_iterations.is_some() {
            log::debug!("presolve is managed by microlp; ignoring presolve knobs");
        }
        if tuning.probing_level.is_some() {
            log::debug!("microlp has no probing pass; ignoring probing level");
        }
        if config.workers.is_some_and(|workers| workers.get() > 1) {
            log::debug!("microlp is single-threaded; ignoring worker count");
        }

        let settings = Settings {
            max_selector_columns: self.config.max_element_columns,
            conflict_cuts: tuning.linearization_level.unwrap_or(1) >= 1,
        };
        let model = formulation::formulate(system, settings)?;
        progress.note(format_args!(
            "{} integer columns, {} selector columns ({} cut), {} rows",
            system.variables().len(),
            model.selector_columns(),
            model.pruned_selectors(),
            model.row_count()
        ));

        let (status, values) = match model.solve(config.time_limit) {
            Ok((SolutionStatus::Optimal, values)) => (SolveStatus::Optimal, Some(values)),
            Ok((SolutionStatus::TimeLimit | SolutionStatus::GapLimit, values)) => {
                progress.note(format_args!("time limit reached before proving optimality"));
                (SolveStatus::Feasible, Some(values))
            }
            Err(ResolutionError::Infeasible) => (SolveStatus::Infeasible, None),
            Err(ResolutionError::Unbounded) => (SolveStatus::Invalid, None),
            Err(ResolutionError::Other(reason)) if reason.starts_with("Time limit") => {
                progress.note(format_args!("time limit reached without an incumbent"));
                (SolveStatus::Unknown, None)
            }
            Err(err) => {
                log::warn!("microlp stopped without a result: {err}");
                (SolveStatus::Unknown, None)
            }
        };
        let elapsed = started.elapsed();
        let objective = values
            .as_ref()
            .and_then(|found| found.get(system.objective().index()).copied());
        if let Some(value) = objective {
            progress.solution(value, elapsed);
        }
        progress.finish(status, elapsed);
        Ok(RawOutcome {
            status,
            values,
            solve_time: elapsed,
            solutions_found: u64::from(objective.is_some()),
        })
    }
}
