//! Mixed-integer linearisation of a [`ConstraintSystem`].
//!
//! Every system variable becomes a bounded integer column. Constraints that
//! are not linear are encoded with binary selector columns:
//!
//! - element over a linear index `stride·row + column`: the row and column
//!   variables get one-hot value selectors, shared with every other encoding
//!   of the same variable, and each admissible row contributes one continuous
//!   share column equal to `table[row][chosen column]` when that row is
//!   selected and zero otherwise;
//! - minimum: `target ≤ x_k` for every operand plus one selector per operand
//!   forcing equality with the chosen one through a big-M bound;
//! - all-different and free value sets: one selector per admissible value,
//!   with at most one variable per value for all-different.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use dispersion_core::{Constraint, ConstraintSystem, Domain, SolveError, VarId};
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolutionStatus, SolverModel,
    Variable, WithTimeLimit, constraint, default_solver, variable,
};

pub(crate) const BACKEND: &str = "milp";

/// Largest magnitude representable exactly in an `f64` column.
const MAX_EXACT: u64 = 1 << 53;

/// Longest budget handed to the engine, which stores it as float seconds.
const MAX_TIME_LIMIT: Duration = Duration::from_secs(1 << 32);

/// Limits and switches applied while building the formulation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Settings {
    /// Upper bound on selector columns across all encodings.
    pub(crate) max_selector_columns: usize,
    /// Forbid row and column selector combinations whose table value cannot
    /// clear the strict lower bound posted on the looked-up value.
    pub(crate) conflict_cuts: bool,
}

/// Columns and rows ready for the `microlp` engine.
pub(crate) struct Formulation {
    vars: ProblemVariables,
    columns: Vec<Variable>,
    rows: Vec<good_lp::Constraint>,
    objective: Variable,
    selectors: usize,
    pruned: usize,
}

impl Formulation {
    pub(crate) const fn selector_columns(&self) -> usize {
        self.selectors
    }

    pub(crate) const fn pruned_selectors(&self) -> usize {
        self.pruned
    }

    pub(crate) const fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Solves within `time_limit` and returns the engine status with one
    /// value per system variable.
    ///
    /// When the budget runs out before any incumbent exists the engine
    /// reports [`ResolutionError::Other`].
    pub(crate) fn solve(
        self,
        time_limit: Duration,
    ) -> Result<(SolutionStatus, Vec<i64>), ResolutionError> {
        let problem = self
            .vars
            .maximise(self.objective)
            .using(default_solver)
            .with_time_limit(time_limit.min(MAX_TIME_LIMIT).as_secs_f64());
        let solution = self
            .rows
            .into_iter()
            .fold(problem, |model, row| model.with(row))
            .solve()?;
        let values = self
            .columns
            .iter()
            .map(|column| to_integer(solution.value(*column)))
            .collect();
        Ok((solution.status(), values))
    }
}

fn unsupported(reason: String) -> SolveError {
    SolveError::BackendUnsupported {
        backend: BACKEND,
        reason,
    }
}

/// Converts an integer coefficient, rejecting values an `f64` cannot hold.
fn exact(value: i64) -> Result<f64, SolveError> {
    if value.unsigned_abs() > MAX_EXACT {
        return Err(unsupported(format!(
            "value {value} cannot be represented exactly as a float"
        )));
    }
    #[expect(
        clippy::cast_precision_loss,
        reason = "magnitude is checked against 2^53 above"
    )]
    let converted = value as f64;
    Ok(converted)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "columns are bounded by exactly representable integers"
)]
fn to_integer(value: f64) -> i64 {
    value.round() as i64
}

/// Builds the linearisation of `system`.
pub(crate) fn formulate(system: &ConstraintSystem, settings: Settings) -> Result<Formulation, SolveError> {
    let mut builder = Builder::new(system, settings)?;
    for constraint in system.constraints() {
        builder.post(constraint)?;
    }
    builder.encode_free_value_sets()?;
    let objective = builder.column(system.objective())?;
    let Builder {
        vars,
        columns,
        rows,
        selectors,
        pruned,
        ..
    } = builder;
    Ok(Formulation {
        vars,
        columns,
        rows,
        objective,
        selectors,
        pruned,
    })
}

struct Builder<'a> {
    system: &'a ConstraintSystem,
    settings: Settings,
    vars: ProblemVariables,
    columns: Vec<Variable>,
    rows: Vec<good_lp::Constraint>,
    /// Strongest strict lower bound posted on each variable.
    floors: BTreeMap<usize, i64>,
    /// Variables whose value is fixed by an element or minimum link.
    defined: BTreeSet<usize>,
    /// Row, column and stride behind each linear index variable.
    links: BTreeMap<usize, IndexLink>,
    /// One-hot value selectors per encoded variable.
    one_hots: BTreeMap<usize, Vec<(i64, Variable)>>,
    selectors: usize,
    pruned: usize,
}

/// Operands of a `LinearIndex` constraint.
#[derive(Debug, Clone, Copy)]
struct IndexLink {
    row: VarId,
    column: VarId,
    stride: i64,
}

impl<'a> Builder<'a> {
    fn new(system: &'a ConstraintSystem, settings: Settings) -> Result<Self, SolveError> {
        let mut vars = ProblemVariables::new();
        let mut columns = Vec::with_capacity(system.variables().len());
        for definition in system.variables() {
            let (Some(lo), Some(hi)) = (definition.domain.min(), definition.domain.max()) else {
                return Err(unsupported(format!(
                    "variable {} has an empty domain",
                    definition.name
                )));
            };
            columns.push(vars.add(variable().integer().min(exact(lo)?).max(exact(hi)?)));
        }

        let mut floors = BTreeMap::new();
        let mut defined = BTreeSet::new();
        let mut links = BTreeMap::new();
        for constraint in system.constraints() {
            match constraint {
                Constraint::GreaterThan { var, bound } => {
                    let floor = floors.entry(var.index()).or_insert(*bound);
                    *floor = (*floor).max(*bound);
                }
                Constraint::Element { value, .. } => {
                    defined.insert(value.index());
                }
                Constraint::MinEquality { target, .. } => {
                    defined.insert(target.index());
                }
                Constraint::LinearIndex {
                    index,
                    row,
                    column,
                    stride,
                } => {
                    links.insert(
                        index.index(),
                        IndexLink {
                            row: *row,
                            column: *column,
                            stride: *stride,
                        },
                    );
                }
                Constraint::AllDifferent { .. } => {}
            }
        }

        Ok(Self {
            system,
            settings,
            vars,
            columns,
            rows: Vec::new(),
            floors,
            defined,
            links,
            one_hots: BTreeMap::new(),
            selectors: 0,
            pruned: 0,
        })
    }

    fn column(&self, id: VarId) -> Result<Variable, SolveError> {
        self.columns
            .get(id.index())
            .copied()
            .ok_or_else(|| unsupported(format!("unknown variable {id}")))
    }

    fn domain(&self, id: VarId) -> Result<&'a Domain, SolveError> {
        self.domain_at(id.index())
    }

    fn domain_at(&self, position: usize) -> Result<&'a Domain, SolveError> {
        self.system
            .variables()
            .get(position)
            .map(|definition| &definition.domain)
            .ok_or_else(|| unsupported(format!("unknown variable at position {position}")))
    }

    fn reserve(&mut self, count: u64) -> Result<(), SolveError> {
        let requested = usize::try_from(count).unwrap_or(usize::MAX);
        let total = self.selectors.saturating_add(requested);
        if total > self.settings.max_selector_columns {
            return Err(unsupported(format!(
                "{total} selector columns exceed the limit of {}",
                self.settings.max_selector_columns
            )));
        }
        self.selectors = total;
        Ok(())
    }

    fn post(&mut self, constraint: &Constraint) -> Result<(), SolveError> {
        match constraint {
            Constraint::LinearIndex {
                index,
                row,
                column,
                stride,
            } => {
                let target = self.column(*index)?;
                let flattened = exact(*stride)? * self.column(*row)? + self.column(*column)?;
                self.rows.push(constraint!(target == flattened));
                Ok(())
            }
            Constraint::Element {
                index,
                table,
                value,
            } => self.element(*index, table, *value),
            Constraint::GreaterThan { var, bound } => {
                let floor = bound
                    .checked_add(1)
                    .ok_or_else(|| unsupported(format!("bound {bound} on {var} has no successor")))?;
                let target = self.column(*var)?;
                let lowest = exact(floor)?;
                self.rows.push(constraint!(target >= lowest));
                Ok(())
            }
            Constraint::MinEquality { target, operands } => self.minimum(*target, operands),
            Constraint::AllDifferent { vars } => self.all_different(vars),
        }
    }

    fn element(&mut self, index: VarId, table: &[i64], value: VarId) -> Result<(), SolveError> {
        let link = self.links.get(&index.index()).copied().ok_or_else(|| {
            unsupported(format!(
                "element index {index} is not a linear index over two variables"
            ))
        })?;
        let rows = self.one_hot(link.row.index())?;
        let columns = self.one_hot(link.column.index())?;
        let floor = self
            .settings
            .conflict_cuts
            .then(|| self.floors.get(&value.index()).copied())
            .flatten();

        let mut shares = Vec::with_capacity(rows.len());
        for (row, row_selector) in rows {
            let cells = columns
                .iter()
                .map(|(column, selector)| -> Result<(i64, Variable), SolveError> {
                    Ok((lookup(table, link, row, *column)?, *selector))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let (Some(lo), Some(hi)) = (
                cells.iter().map(|(entry, _)| *entry).min(),
                cells.iter().map(|(entry, _)| *entry).max(),
            ) else {
                continue;
            };
            let mut picked = Vec::with_capacity(cells.len());
            for (entry, selector) in &cells {
                picked.push(exact(*entry)? * *selector);
            }
            let looked_up: Expression = picked.into_iter().sum();
            let (low, high) = (exact(lo)?, exact(hi)?);
            let share = self
                .vars
                .add(variable().min(exact(lo.min(0))?).max(exact(hi.max(0))?));
            // share = looked_up when the row is selected, 0 otherwise.
            self.rows.push(constraint!(share >= low * row_selector));
            self.rows.push(constraint!(share <= high * row_selector));
            let with_high_slack = Expression::from(share) + high - high * row_selector;
            let with_low_slack = Expression::from(share) + low - low * row_selector;
            self.rows.push(constraint!(with_high_slack >= looked_up.clone()));
            self.rows.push(constraint!(with_low_slack <= looked_up));

            if let Some(bound) = floor {
                let forbidden: Vec<Variable> = cells
                    .iter()
                    .filter(|(entry, _)| *entry <= bound)
                    .map(|(_, selector)| *selector)
                    .collect();
                if !forbidden.is_empty() {
                    self.pruned += forbidden.len();
                    let clash: Expression = forbidden.into_iter().sum();
                    self.rows.push(constraint!(clash + row_selector <= 1));
                }
            }
            shares.push(share);
        }

        let value_column = self.column(value)?;
        let total: Expression = shares.into_iter().sum();
        self.rows.push(constraint!(value_column == total));
        Ok(())
    }

    fn minimum(&mut self, target: VarId, operands: &[VarId]) -> Result<(), SolveError> {
        if operands.is_empty() {
            return Err(unsupported(format!("minimum over no operands for {target}")));
        }
        self.reserve(u64::try_from(operands.len()).unwrap_or(u64::MAX))?;
        let target_column = self.column(target)?;
        let target_floor = self.domain(target)?.min().unwrap_or(0);

        let mut chosen = Vec::with_capacity(operands.len());
        for operand in operands {
            let operand_column = self.column(*operand)?;
            let ceiling = self.domain(*operand)?.max().unwrap_or(target_floor);
            let big_m = exact(ceiling.saturating_sub(target_floor).max(0))?;
            let selector = self.vars.add(variable().binary());
            chosen.push(selector);
            // target ≥ x − M·(1 − s), rearranged as target + M ≥ x + M·s.
            let raised = Expression::from(target_column) + big_m;
            let relaxed = Expression::from(operand_column) + big_m * selector;
            self.rows.push(constraint!(target_column <= operand_column));
            self.rows.push(constraint!(raised >= relaxed));
        }
        let one: Expression = chosen.into_iter().sum();
        self.rows.push(constraint!(one == 1));
        Ok(())
    }

    fn all_different(&mut self, vars: &[VarId]) -> Result<(), SolveError> {
        let mut by_value: BTreeMap<i64, Vec<Variable>> = BTreeMap::new();
        for var in vars {
            for (value, selector) in self.one_hot(var.index())? {
                by_value.entry(value).or_default().push(selector);
            }
        }
        for selectors in by_value.into_values() {
            if selectors.len() > 1 {
                let taken: Expression = selectors.into_iter().sum();
                self.rows.push(constraint!(taken <= 1));
            }
        }
        Ok(())
    }

    /// Value-set domains not pinned by an element or minimum link.
    fn encode_free_value_sets(&mut self) -> Result<(), SolveError> {
        let free: Vec<usize> = self
            .system
            .variables()
            .iter()
            .enumerate()
            .filter(|(position, definition)| {
                matches!(definition.domain, Domain::Values(_))
                    && !self.defined.contains(position)
                    && !self.one_hots.contains_key(position)
            })
            .map(|(position, _)| position)
            .collect();
        for position in free {
            self.one_hot(position)?;
        }
        Ok(())
    }

    /// One binary per admissible value; returns `(value, selector)` pairs.
    ///
    /// Repeated calls for the same variable return the selectors created by
    /// the first call.
    fn one_hot(&mut self, position: usize) -> Result<Vec<(i64, Variable)>, SolveError> {
        if let Some(pairs) = self.one_hots.get(&position) {
            return Ok(pairs.clone());
        }
        let domain = self.domain_at(position)?;
        self.reserve(domain.size())?;
        let values: Vec<i64> = match domain {
            Domain::Interval { min, max } => (*min..=*max).collect(),
            Domain::Values(values) => values.to_vec(),
        };
        let column = self
            .columns
            .get(position)
            .copied()
            .ok_or_else(|| unsupported(format!("unknown variable at position {position}")))?;
        let mut pairs = Vec::with_capacity(values.len());
        let mut weighted = Vec::with_capacity(values.len());
        for value in values {
            let selector = self.vars.add(variable().binary());
            weighted.push(exact(value)? * selector);
            pairs.push((value, selector));
        }
        let one: Expression = pairs.iter().map(|(_, selector)| *selector).sum();
        let picked: Expression = weighted.into_iter().sum();
        self.rows.push(constraint!(one == 1));
        self.rows.push(constraint!(column == picked));
        self.one_hots.insert(position, pairs.clone());
        Ok(pairs)
    }
}

/// `table[stride·row + column]`, rejecting cells outside the table.
fn lookup(table: &[i64], link: IndexLink, row: i64, column: i64) -> Result<i64, SolveError> {
    row.checked_mul(link.stride)
        .and_then(|offset| offset.checked_add(column))
        .and_then(|cell| usize::try_from(cell).ok())
        .and_then(|cell| table.get(cell))
        .copied()
        .ok_or_else(|| {
            unsupported(format!(
                "cell ({row}, {column}) lies outside a table of {} entries",
                table.len()
            ))
        })
}
