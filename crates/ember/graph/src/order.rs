//! Deployment order types

use serde::{Deserialize, Serialize};

/// Classification of a detected dependency cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleKind {
    /// Exactly two functions depending on each other.
    Direct,
    /// A longer chain closing back on itself.
    Indirect,
}

/// A detected circular dependency.
///
/// The cycle is an ordered list of function paths closed by repeating the
/// entry node, e.g. `[a, b, a]` for a mutual dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircularDependency {
    pub cycle: Vec<String>,
    pub kind: CycleKind,
}

impl CircularDependency {
    pub fn new(cycle: Vec<String>) -> Self {
        // The closing element repeats the entry node, so the number of
        // distinct functions is one less than the list length.
        let kind = if cycle.len().saturating_sub(1) == 2 {
            CycleKind::Direct
        } else {
            CycleKind::Indirect
        };
        Self { cycle, kind }
    }

    /// Whether the given function path participates in this cycle.
    pub fn involves(&self, path: &str) -> bool {
        self.cycle.iter().any(|p| p == path)
    }
}

/// A computed deployment plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentOrder {
    /// All function paths, dependencies before dependents.
    pub functions: Vec<String>,

    /// Partition of `functions` into maximal groups whose dependencies are
    /// all satisfied by earlier batches; safe to deploy in parallel.
    pub batches: Vec<Vec<String>>,

    /// Cycles detected while ordering. A non-empty list means the order is
    /// best-effort: callers must not treat the plan as fully consistent.
    pub cycles: Vec<CircularDependency>,
}

impl DeploymentOrder {
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    /// Total number of functions in the plan.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
