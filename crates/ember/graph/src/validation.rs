//! Graph validation report

use serde::{Deserialize, Serialize};

/// Findings from a graph consistency check.
///
/// Errors (cycles) mean the computed order is best-effort; warnings (dropped
/// edges, isolated functions) are informational. Neither blocks ordering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl GraphValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_without_errors() {
        let mut validation = GraphValidation::default();
        assert!(validation.is_valid());

        validation.warnings.push("isolated function".into());
        assert!(validation.is_valid());

        validation.errors.push("cycle".into());
        assert!(!validation.is_valid());
    }
}
