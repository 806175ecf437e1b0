//! Backend-agnostic constraint system description.
//!
//! A [`ConstraintSystem`] is plain data: integer variables with either an
//! interval or an explicit value-set domain, a small vocabulary of
//! constraints, and a single maximisation objective. Backends translate each
//! shape into their native calls and never see the instance it came from.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Handle to a variable inside a [`ConstraintSystem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    /// Position of the variable in [`ConstraintSystem::variables`].
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Domain of an integer variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Domain {
    /// Every integer in `[min, max]`.
    Interval {
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },
    /// Only the listed values, sorted ascending and deduplicated.
    Values(Arc<[i64]>),
}

impl Domain {
    /// Builds a value-set domain from arbitrary values.
    #[must_use]
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let mut sorted: Vec<i64> = values.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();
        Self::Values(sorted.into())
    }

    /// Smallest admissible value, `None` for an empty domain.
    #[must_use]
    pub fn min(&self) -> Option<i64> {
        match self {
            Self::Interval { min, max } => (min <= max).then_some(*min),
            Self::Values(values) => values.first().copied(),
        }
    }

    /// Largest admissible value, `None` for an empty domain.
    #[must_use]
    pub fn max(&self) -> Option<i64> {
        match self {
            Self::Interval { min, max } => (min <= max).then_some(*max),
            Self::Values(values) => values.last().copied(),
        }
    }

    /// Number of admissible values.
    #[must_use]
    pub fn size(&self) -> u64 {
        match self {
            Self::Interval { min, max } if min <= max => max.abs_diff(*min).saturating_add(1),
            Self::Interval { .. } => 0,
            Self::Values(values) => values.len() as u64,
        }
    }

    /// Whether `value` is admissible.
    #[must_use]
    pub fn contains(&self, value: i64) -> bool {
        match self {
            Self::Interval { min, max } => (*min..=*max).contains(&value),
            Self::Values(values) => values.binary_search(&value).is_ok(),
        }
    }
}

/// A named decision or auxiliary variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// Human-readable name, unique within the system.
    pub name: String,
    /// Admissible values.
    pub domain: Domain,
}

/// Constraint vocabulary shared by every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// `index == stride * row + column`.
    LinearIndex {
        /// Derived linear index.
        index: VarId,
        /// Row selector.
        row: VarId,
        /// Column selector.
        column: VarId,
        /// Row width of the flattened table.
        stride: i64,
    },
    /// `value == table[index]`.
    Element {
        /// Index into `table`.
        index: VarId,
        /// Lookup table, shared between all constraints over the same data.
        table: Arc<[i64]>,
        /// Looked-up value.
        value: VarId,
    },
    /// `var > bound`, strictly.
    GreaterThan {
        /// Constrained variable.
        var: VarId,
        /// Exclusive lower bound.
        bound: i64,
    },
    /// `target == min(operands)`.
    MinEquality {
        /// Aggregate variable.
        target: VarId,
        /// Aggregated variables.
        operands: Vec<VarId>,
    },
    /// All listed variables take pairwise different values.
    AllDifferent {
        /// Variables that must differ.
        vars: Vec<VarId>,
    },
}

/// Variables and constraints created for one unordered facility-slot pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairLink {
    /// Lower slot of the pair.
    pub first: usize,
    /// Higher slot of the pair.
    pub second: usize,
    /// Linear index into the flattened distance table.
    pub index: VarId,
    /// Distance between the two chosen sites.
    pub distance: VarId,
    /// Exclusive lower bound on `distance`.
    pub threshold: i64,
}

/// Options that change the shape of the generated model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelOptions {
    /// Forbid two facility slots from choosing the same site.
    pub distinct_sites: bool,
}

/// Model formulations understood by the builder.
///
/// Only the one-dimensional element formulation exists; the selector is kept
/// so invocations stay uniform across backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelType {
    /// Pair distances linked through element lookups on a flattened table.
    #[default]
    Element,
}

/// Error returned when parsing an unknown [`ModelType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported model type {0:?} (expected \"Element\" or \"1DElement\")")]
pub struct ParseModelTypeError(pub String);

impl FromStr for ModelType {
    type Err = ParseModelTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Element" | "element" | "1DElement" => Ok(Self::Element),
            other => Err(ParseModelTypeError(other.to_owned())),
        }
    }
}

/// A complete model: variables, constraints and the maximised objective.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSystem {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    assignment: Vec<VarId>,
    pair_links: Vec<PairLink>,
    objective: VarId,
}

impl ConstraintSystem {
    /// All variables, addressed by [`VarId::index`].
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Looks up a variable definition.
    #[must_use]
    pub fn variable(&self, id: VarId) -> Option<&Variable> {
        self.variables.get(id.0)
    }

    /// Posted constraints in creation order.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Assignment variables, one per facility slot.
    #[must_use]
    pub fn assignment(&self) -> &[VarId] {
        &self.assignment
    }

    /// Per-pair bookkeeping in lexicographic `(first, second)` order.
    #[must_use]
    pub fn pair_links(&self) -> &[PairLink] {
        &self.pair_links
    }

    /// Variable to maximise.
    #[must_use]
    pub const fn objective(&self) -> VarId {
        self.objective
    }
}

/// Incremental constructor for a [`ConstraintSystem`].
///
/// Used by [`crate::ModelBuilder`]; backends only consume finished systems.
#[derive(Debug, Default)]
pub(crate) struct SystemDraft {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    pair_links: Vec<PairLink>,
}

impl SystemDraft {
    pub(crate) fn add_variable(&mut self, name: String, domain: Domain) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(Variable { name, domain });
        id
    }

    pub(crate) fn post(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub(crate) fn record_pair(&mut self, link: PairLink) {
        self.pair_links.push(link);
    }

    pub(crate) fn finish(self, assignment: Vec<VarId>, objective: VarId) -> ConstraintSystem {
        ConstraintSystem {
            variables: self.variables,
            constraints: self.constraints,
            assignment,
            pair_links: self.pair_links,
            objective,
        }
    }
}
