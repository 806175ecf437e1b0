//! Backend contract: solve parameters, terminal statuses and raw outcomes.

use std::num::NonZeroUsize;
use std::time::Duration;

use thiserror::Error;

use crate::{ConstraintSystem, InstanceError};

/// Default wall-clock budget for a solve.
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(3600);

/// How much progress output a backend may emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Verbosity {
    /// No progress output.
    Quiet,
    /// Progress is logged at `info` level.
    #[default]
    Normal,
}

impl Verbosity {
    /// Whether progress output is allowed.
    #[must_use]
    pub const fn is_normal(self) -> bool {
        matches!(self, Self::Normal)
    }
}

/// Backend-specific tuning knobs.
///
/// Every knob is advisory: a backend maps it to its nearest equivalent or
/// ignores it, and never fails because of one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TuningKnobs {
    /// Enable or disable presolve; `None` keeps the backend default.
    pub presolve: Option<bool>,
    /// Cap on presolve iterations.
    pub max_presolve_iterations: Option<u32>,
    /// Linear relaxation aggressiveness; `0` disables.
    pub linearization_level: Option<u8>,
    /// Probing aggressiveness; `0` disables.
    pub probing_level: Option<u8>,
}

/// Parameters for a single solve call.
///
/// # Examples
/// ```rust
/// use std::time::Duration;
/// use dispersion_core::{SolveConfig, Verbosity};
///
/// let config = SolveConfig {
///     time_limit: Duration::from_secs(10),
///     verbosity: Verbosity::Quiet,
///     ..SolveConfig::default()
/// };
/// assert_eq!(config.workers(1).get(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolveConfig {
    /// Wall-clock budget for the search.
    pub time_limit: Duration,
    /// Worker threads; `None` lets the backend choose.
    pub workers: Option<NonZeroUsize>,
    /// Progress output level.
    pub verbosity: Verbosity,
    /// Advisory backend tuning.
    pub tuning: TuningKnobs,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            time_limit: DEFAULT_TIME_LIMIT,
            workers: None,
            verbosity: Verbosity::default(),
            tuning: TuningKnobs::default(),
        }
    }
}

impl SolveConfig {
    /// Worker count, falling back to the backend's `default`.
    #[must_use]
    pub fn workers(&self, default: usize) -> NonZeroUsize {
        self.workers
            .or_else(|| NonZeroUsize::new(default))
            .unwrap_or(NonZeroUsize::MIN)
    }
}

/// Terminal state of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolveStatus {
    /// The returned solution is proven optimal.
    Optimal,
    /// A solution was found; optimality is not proven.
    Feasible,
    /// No assignment satisfies every constraint.
    Infeasible,
    /// The search ended without a usable outcome, e.g. the time limit expired
    /// before any solution.
    Unknown,
    /// The backend judged the model malformed.
    Invalid,
}

impl SolveStatus {
    /// Whether the status carries a solution.
    #[must_use]
    pub const fn has_solution(self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }
}

/// Raw result of [`SolverBackend::solve`].
///
/// `values` is indexed by [`crate::VarId::index`] and holds one value per
/// system variable when a solution exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOutcome {
    /// Terminal state.
    pub status: SolveStatus,
    /// Solution values for every variable, if any.
    pub values: Option<Vec<i64>>,
    /// Wall-clock time spent in the backend.
    pub solve_time: Duration,
    /// Improving solutions encountered during the search.
    pub solutions_found: u64,
}

impl RawOutcome {
    /// Outcome without a solution.
    #[must_use]
    pub const fn without_solution(status: SolveStatus, solve_time: Duration) -> Self {
        Self {
            status,
            values: None,
            solve_time,
            solutions_found: 0,
        }
    }
}

/// Errors returned by [`SolverBackend::solve`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    /// Instance data failed validation.
    #[error("invalid instance: {0}")]
    InvalidInstance(#[from] InstanceError),
    /// The backend cannot express the requested constraint system.
    #[error("{backend} backend cannot build this model: {reason}")]
    BackendUnsupported {
        /// Name of the rejecting backend.
        backend: &'static str,
        /// What could not be expressed.
        reason: String,
    },
}

/// Alias for the solver error type.
pub type Error = SolveError;

/// Executes a [`ConstraintSystem`] on a concrete engine.
///
/// Implementations translate the shared constraint vocabulary into native
/// calls, run the search within `config.time_limit`, and report one of the
/// [`SolveStatus`] values. Infeasibility and timeouts are outcomes, not
/// errors; [`Error::BackendUnsupported`] is reserved for models the engine
/// cannot represent.
/// Backends must be `Send + Sync` to be shared across threads.
pub trait SolverBackend: Send + Sync {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &'static str;

    /// Solve `system`, blocking until a terminal state is reached.
    fn solve(&self, system: &ConstraintSystem, config: &SolveConfig) -> Result<RawOutcome, Error>;
}

impl<B: SolverBackend + ?Sized> SolverBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn solve(&self, system: &ConstraintSystem, config: &SolveConfig) -> Result<RawOutcome, Error> {
        (**self).solve(system, config)
    }
}
