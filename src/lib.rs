//! Facade crate for the dispersion planner.
//!
//! This crate re-exports the core domain types and exposes the instance
//! reader and the solver backends behind feature flags.

#![forbid(unsafe_code)]

pub use dispersion_core::{
    Constraint, ConstraintSystem, Diagnostics, Domain, InstanceData, InstanceError, ModelBuilder,
    ModelOptions, ModelType, Progress, RawOutcome, SolveConfig, SolveError, SolveObserver,
    SolveResult, SolveStatus, SolverBackend, TuningKnobs, VarId, Variable, Verbosity, extract,
    solve_instance,
};

#[cfg(feature = "reader")]
pub use dispersion_data::{InstanceReadError, ParseError, ReadOptions, parse_instance, read_instance};

#[cfg(feature = "solver-fd")]
pub use dispersion_solver_fd::{FdSolver, FdSolverConfig, SearchOrdering};

#[cfg(feature = "solver-milp")]
pub use dispersion_solver_milp::{MilpSolver, MilpSolverConfig};
