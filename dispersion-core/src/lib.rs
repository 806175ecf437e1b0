//! Core domain types for the dispersion planner.
//!
//! An [`InstanceData`] describes candidate sites, facility slots and the two
//! tables that drive the p-dispersion problem. [`ModelBuilder`] turns it into
//! a backend-agnostic [`ConstraintSystem`], a [`SolverBackend`] searches that
//! system, and [`extract`] normalises the outcome into a [`SolveResult`].
//! [`solve_instance`] chains the three steps.
//!
//! Constructors return `Result` so invalid input surfaces before any search
//! starts.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod instance;
mod model;
mod progress;
mod result;
mod solver;

pub use builder::{ModelBuilder, pair_count, slot_pairs};
pub use instance::{InstanceData, InstanceError};
pub use model::{
    Constraint, ConstraintSystem, Domain, ModelOptions, ModelType, PairLink, ParseModelTypeError,
    VarId, Variable,
};
pub use progress::{Progress, SolveObserver};
pub use result::{Diagnostics, SolveResult, extract, solve_instance};
pub use solver::{
    DEFAULT_TIME_LIMIT, Error, RawOutcome, SolveConfig, SolveError, SolveStatus, SolverBackend,
    TuningKnobs, Verbosity,
};

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;
