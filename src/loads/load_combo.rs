//! Load combinations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named set of load-case factors. Loads whose case has no factor in the
/// active combination contribute nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadCombination {
    pub label: String,
    /// case label → scalar factor
    pub factors: HashMap<String, f64>,
}

impl LoadCombination {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            factors: HashMap::new(),
        }
    }

    /// A combination applying a single case at factor 1.0.
    pub fn single(label: &str, case: &str) -> Self {
        Self::new(label).with_case(case, 1.0)
    }

    pub fn with_case(mut self, case: &str, factor: f64) -> Self {
        self.factors.insert(case.to_string(), factor);
        self
    }

    /// Factor for a case; absent cases scale to zero.
    pub fn factor(&self, case: &str) -> f64 {
        *self.factors.get(case).unwrap_or(&0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_case_factors_to_zero() {
        let combo = LoadCombination::new("1.2D + 1.6L")
            .with_case("Dead", 1.2)
            .with_case("Live", 1.6);
        assert_eq!(combo.factor("Dead"), 1.2);
        assert_eq!(combo.factor("Live"), 1.6);
        assert_eq!(combo.factor("Wind"), 0.0);
    }
}
