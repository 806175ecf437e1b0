//! Posts a [`ConstraintSystem`] into a Pumpkin [`Solver`].
//!
//! Every system variable becomes one engine domain, in [`VarId::index`]
//! order. Lookup tables are turned into arrays of fixed domains, shared
//! between element posts through a value cache. The engine works on 32-bit
//! integers; anything wider is rejected as unsupported.

use std::collections::BTreeMap;

use dispersion_core::{Constraint, ConstraintSystem, Domain, SolveError, VarId};
use pumpkin_solver::Solver;
use pumpkin_solver::constraints::{self, Constraint as EngineConstraint};
use pumpkin_solver::variables::{DomainId, TransformableVariable};

pub(crate) const BACKEND: &str = "fd";

/// Why a system could not be loaded into the engine.
#[derive(Debug)]
pub(crate) enum Rejection {
    /// The engine cannot represent a value or coefficient.
    Unsupported(SolveError),
    /// A domain was empty or a post failed at the root.
    RootConflict,
}

fn unsupported(reason: String) -> Rejection {
    Rejection::Unsupported(SolveError::BackendUnsupported {
        backend: BACKEND,
        reason,
    })
}

fn narrow(value: i64, what: &str) -> Result<i32, Rejection> {
    i32::try_from(value)
        .map_err(|_| unsupported(format!("{what} {value} is outside the 32-bit engine range")))
}

fn post(solver: &mut Solver, constraint: impl EngineConstraint) -> Result<(), Rejection> {
    solver
        .add_constraint(constraint)
        .post()
        .map_err(|_| Rejection::RootConflict)
}

/// Fixed domains standing in for table constants.
#[derive(Debug, Default)]
struct Constants {
    fixed: BTreeMap<i32, DomainId>,
}

impl Constants {
    fn get(&mut self, solver: &mut Solver, entry: i64) -> Result<DomainId, Rejection> {
        let value = narrow(entry, "table entry")?;
        Ok(*self
            .fixed
            .entry(value)
            .or_insert_with(|| solver.new_bounded_integer(value, value)))
    }
}

/// Engine domains for every system variable.
#[derive(Debug)]
pub(crate) struct Translation {
    domains: Vec<DomainId>,
}

impl Translation {
    /// Declares every variable of `system` and posts its constraints.
    pub(crate) fn post_system(
        system: &ConstraintSystem,
        solver: &mut Solver,
    ) -> Result<Self, Rejection> {
        let mut domains = Vec::with_capacity(system.variables().len());
        for variable in system.variables() {
            domains.push(declare(solver, &variable.domain, &variable.name)?);
        }
        let translation = Self { domains };
        let mut constants = Constants::default();
        for constraint in system.constraints() {
            translation.post_constraint(solver, &mut constants, constraint)?;
        }
        Ok(translation)
    }

    /// Engine domains in [`VarId::index`] order.
    pub(crate) fn domains(&self) -> &[DomainId] {
        &self.domains
    }

    /// Engine domain behind `id`.
    pub(crate) fn domain(&self, id: VarId) -> Result<DomainId, Rejection> {
        self.domains
            .get(id.index())
            .copied()
            .ok_or_else(|| unsupported(format!("constraint refers to unknown variable {id}")))
    }

    fn domains_of(&self, ids: &[VarId]) -> Result<Vec<DomainId>, Rejection> {
        ids.iter().map(|id| self.domain(*id)).collect()
    }

    fn post_constraint(
        &self,
        solver: &mut Solver,
        constants: &mut Constants,
        constraint: &Constraint,
    ) -> Result<(), Rejection> {
        match constraint {
            Constraint::LinearIndex {
                index,
                row,
                column,
                stride,
            } => {
                let terms = vec![
                    self.domain(*row)?.scaled(narrow(*stride, "row stride")?),
                    self.domain(*column)?.scaled(1),
                    self.domain(*index)?.scaled(-1),
                ];
                let tag = solver.new_constraint_tag();
                post(solver, constraints::equals(terms, 0, tag))
            }
            Constraint::Element {
                index,
                table,
                value,
            } => {
                let array = table
                    .iter()
                    .map(|entry| constants.get(solver, *entry))
                    .collect::<Result<Vec<_>, _>>()?;
                let tag = solver.new_constraint_tag();
                post(
                    solver,
                    constraints::element(self.domain(*index)?, array, self.domain(*value)?, tag),
                )
            }
            Constraint::GreaterThan { var, bound } => {
                // var > bound  <=>  -var <= -(bound + 1)
                let rhs = bound
                    .checked_add(1)
                    .and_then(i64::checked_neg)
                    .ok_or_else(|| unsupported(format!("bound {bound} cannot be tightened")))?;
                let terms = vec![self.domain(*var)?.scaled(-1)];
                let tag = solver.new_constraint_tag();
                post(
                    solver,
                    constraints::less_than_or_equals(terms, narrow(rhs, "bound")?, tag),
                )
            }
            Constraint::MinEquality { target, operands } => {
                let array = self.domains_of(operands)?;
                let tag = solver.new_constraint_tag();
                post(
                    solver,
                    constraints::minimum(array, self.domain(*target)?, tag),
                )
            }
            Constraint::AllDifferent { vars } => {
                let array = self.domains_of(vars)?;
                let tag = solver.new_constraint_tag();
                post(solver, constraints::all_different(array, tag))
            }
        }
    }
}

fn declare(solver: &mut Solver, domain: &Domain, name: &str) -> Result<DomainId, Rejection> {
    if domain.size() == 0 {
        log::debug!("variable {name} has an empty domain");
        return Err(Rejection::RootConflict);
    }
    match domain {
        Domain::Interval { min, max } => Ok(solver.new_bounded_integer(
            narrow(*min, "lower bound")?,
            narrow(*max, "upper bound")?,
        )),
        Domain::Values(values) => {
            let narrowed = values
                .iter()
                .map(|value| narrow(*value, "domain value"))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(solver.new_sparse_integer(narrowed))
        }
    }
}
