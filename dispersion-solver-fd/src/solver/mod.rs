//! `FdSolver` implementation backed by the Pumpkin constraint solver.

use std::cell::Cell;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dispersion_core::{
    ConstraintSystem, Progress, RawOutcome, SolveConfig, SolveError, SolveObserver, SolveStatus,
    SolverBackend, TuningKnobs, VarId,
};
use pumpkin_solver::Solver;
use pumpkin_solver::branching::Brancher;
use pumpkin_solver::branching::branchers::independent_variable_value_brancher::IndependentVariableValueBrancher;
use pumpkin_solver::branching::value_selection::InDomainMin;
use pumpkin_solver::branching::variable_selection::{FirstFail, InputOrder};
use pumpkin_solver::optimisation::OptimisationDirection;
use pumpkin_solver::optimisation::linear_sat_unsat::LinearSatUnsat;
use pumpkin_solver::results::{OptimisationResult, ProblemSolution, SolutionReference};
use pumpkin_solver::termination::TimeBudget;
use pumpkin_solver::variables::DomainId;

use crate::translate::{BACKEND, Rejection, Translation};

/// Order in which unfixed assignment variables are branched on.
///
/// Only the facility assignment is branched on; propagation fixes the pair
/// indices, pair distances and the objective once every slot has a site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchOrdering {
    /// Smallest remaining domain first.
    #[default]
    FirstFail,
    /// Facility slot order.
    Lexico,
}

/// Configuration for [`FdSolver`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FdSolverConfig {
    /// Variable ordering during branching.
    pub ordering: SearchOrdering,
}

/// Finite-domain constraint-programming backend.
///
/// Translates the system into Pumpkin domains and constraints, then
/// maximises the objective with Pumpkin's linear SAT-UNSAT search under a
/// wall-clock [`TimeBudget`]. Pumpkin searches on a single thread, so
/// [`SolveConfig::workers`] is accepted and noted but has no effect.
///
/// # Examples
/// ```
/// use dispersion_core::{InstanceData, ModelBuilder, SolveConfig, SolveStatus, SolverBackend, Verbosity};
/// use dispersion_solver_fd::FdSolver;
///
/// let instance = InstanceData::new(
///     3,
///     2,
///     vec![0, 5, 10, 5, 0, 7, 10, 7, 0],
///     vec![0, 3, 3, 0],
/// )
/// .expect("valid instance");
/// let system = ModelBuilder::new().build_instance(&instance).expect("model");
/// let config = SolveConfig { verbosity: Verbosity::Quiet, ..SolveConfig::default() };
/// let outcome = FdSolver::new().solve(&system, &config).expect("supported");
/// assert_eq!(outcome.status, SolveStatus::Optimal);
/// ```
#[derive(Clone, Default)]
pub struct FdSolver {
    config: FdSolverConfig,
    observer: Option<Arc<dyn SolveObserver>>,
}

impl std::fmt::Debug for FdSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FdSolver")
            .field("config", &self.config)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl FdSolver {
    /// Construct a solver using default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a solver with explicit configuration.
    #[must_use]
    pub const fn with_config(config: FdSolverConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    /// Attach an observer notified of improving solutions and the final
    /// status.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SolveObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &FdSolverConfig {
        &self.config
    }
}

impl SolverBackend for FdSolver {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn solve(&self, system: &ConstraintSystem, config: &SolveConfig) -> Result<RawOutcome, SolveError> {
        let started = Instant::now();
        let progress = Progress::new(BACKEND, config.verbosity, self.observer.clone());
        let workers = config.workers(1);
        if workers.get() > 1 {
            progress.note(format_args!(
                "{workers} workers requested; the engine searches on one thread"
            ));
        }
        if config.tuning != TuningKnobs::default() {
            log::debug!("tuning knobs have no finite-domain counterpart; ignoring");
        }

        let mut solver = Solver::default();
        let translation = match Translation::post_system(system, &mut solver) {
            Ok(translation) => translation,
            Err(Rejection::Unsupported(err)) => return Err(err),
            Err(Rejection::RootConflict) => {
                log::debug!("root propagation proved infeasibility");
                return Ok(finish(
                    &progress,
                    RawOutcome::without_solution(SolveStatus::Infeasible, started.elapsed()),
                ));
            }
        };
        if config.time_limit.is_zero() {
            return Ok(finish(
                &progress,
                RawOutcome::without_solution(SolveStatus::Unknown, started.elapsed()),
            ));
        }

        let decisions = assignment_domains(system.assignment(), &translation)?;
        let objective = translation.domain(system.objective()).map_err(reject)?;
        progress.note(format_args!(
            "{} variables, {} constraints",
            system.variables().len(),
            system.constraints().len()
        ));
        let search = Search {
            objective,
            time_limit: config.time_limit,
            started,
            progress: &progress,
        };
        let outcome = match self.config.ordering {
            SearchOrdering::FirstFail => search.run(
                &mut solver,
                &translation,
                IndependentVariableValueBrancher::new(FirstFail::new(&decisions), InDomainMin),
            ),
            SearchOrdering::Lexico => search.run(
                &mut solver,
                &translation,
                IndependentVariableValueBrancher::new(InputOrder::new(&decisions), InDomainMin),
            ),
        };
        Ok(finish(&progress, outcome))
    }
}

fn reject(rejection: Rejection) -> SolveError {
    match rejection {
        Rejection::Unsupported(err) => err,
        Rejection::RootConflict => SolveError::BackendUnsupported {
            backend: BACKEND,
            reason: "variable lookup failed after translation".to_owned(),
        },
    }
}

fn assignment_domains(
    assignment: &[VarId],
    translation: &Translation,
) -> Result<Vec<DomainId>, SolveError> {
    assignment
        .iter()
        .map(|id| translation.domain(*id).map_err(reject))
        .collect()
}

fn finish(progress: &Progress, outcome: RawOutcome) -> RawOutcome {
    progress.finish(outcome.status, outcome.solve_time);
    outcome
}

/// One maximisation run over a translated system.
struct Search<'a> {
    objective: DomainId,
    time_limit: Duration,
    started: Instant,
    progress: &'a Progress,
}

impl Search<'_> {
    fn run<B: Brancher>(
        &self,
        solver: &mut Solver,
        translation: &Translation,
        mut brancher: B,
    ) -> RawOutcome {
        let found = Cell::new(0_u64);
        let objective = self.objective;
        let on_solution = |_: &Solver, solution: SolutionReference<'_>, _: &B| {
            found.set(found.get().saturating_add(1));
            let value = solution.get_integer_value(objective);
            self.progress
                .solution(i64::from(value), self.started.elapsed());
        };
        let mut termination = TimeBudget::starting_now(self.time_limit);
        let result = solver.optimise(
            &mut brancher,
            &mut termination,
            LinearSatUnsat::new(OptimisationDirection::Maximise, objective, on_solution),
        );
        let (status, values) = match result {
            OptimisationResult::Optimal(solution) => {
                (SolveStatus::Optimal, Some(read_values(&solution, translation)))
            }
            OptimisationResult::Satisfiable(solution) => {
                (SolveStatus::Feasible, Some(read_values(&solution, translation)))
            }
            OptimisationResult::Unsatisfiable => (SolveStatus::Infeasible, None),
            OptimisationResult::Unknown => (SolveStatus::Unknown, None),
        };
        RawOutcome {
            status,
            values,
            solve_time: self.started.elapsed(),
            solutions_found: found.get(),
        }
    }
}

fn read_values(solution: &impl ProblemSolution, translation: &Translation) -> Vec<i64> {
    translation
        .domains()
        .iter()
        .map(|domain| i64::from(solution.get_integer_value(*domain)))
        .collect()
}
