//! Mixed-integer programming backend for the dispersion planner.
//!
//! [`MilpSolver`] implements [`SolverBackend`](dispersion_core::SolverBackend)
//! by linearising the constraint system: element lookups and minimum
//! aggregates become one-hot selector columns, and the model is solved by the
//! pure-Rust `microlp` engine through `good_lp`.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod formulation;
mod solver;

pub use solver::{MilpSolver, MilpSolverConfig};
