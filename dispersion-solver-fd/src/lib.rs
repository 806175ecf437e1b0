//! Finite-domain backend for the dispersion planner.
//!
//! This crate provides [`FdSolver`], an implementation of the
//! [`SolverBackend`](dispersion_core::SolverBackend) trait over the
//! [Pumpkin](https://github.com/ConSol-Lab/Pumpkin) constraint solver. The
//! adapter posts each system constraint as a native Pumpkin constraint and
//! leaves propagation and search to the engine.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod solver;
mod translate;

pub use solver::{FdSolver, FdSolverConfig, SearchOrdering};
