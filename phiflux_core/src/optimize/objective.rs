//! Provides struct for representing an optimization problem's objective
use indexmap::IndexMap;

/// Represents the linear objective of an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Terms included in the objective (See [`ObjectiveTerm`])
    terms: Vec<ObjectiveTerm>,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    sense: ObjectiveSense,
}

impl Objective {
    /// Create a new empty objective, with a given sense
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            terms: Vec::new(),
            sense,
        }
    }

    pub fn new_maximize() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    pub fn new_minimize() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    pub fn set_sense(&mut self, sense: ObjectiveSense) {
        self.sense = sense;
    }

    pub fn terms(&self) -> &[ObjectiveTerm] {
        &self.terms
    }

    pub fn add_term(&mut self, term: ObjectiveTerm) {
        self.terms.push(term);
    }

    pub fn remove_all_terms(&mut self) {
        self.terms.clear();
    }

    /// Coefficient of every variable in the objective, summing repeated terms
    pub fn coefficients(&self) -> IndexMap<String, f64> {
        let mut coefficients: IndexMap<String, f64> = IndexMap::new();
        for term in &self.terms {
            *coefficients.entry(term.variable.clone()).or_insert(0.) += term.coefficient;
        }
        coefficients
    }

    /// Value of the objective for the given variable values, missing variables count as zero
    pub fn value(&self, variable_values: &IndexMap<String, f64>) -> f64 {
        self.terms
            .iter()
            .map(|t| t.coefficient * variable_values.get(&t.variable).copied().unwrap_or(0.))
            .sum()
    }
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}

/// A linear term in the objective
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveTerm {
    /// Id of the variable in the term
    pub variable: String,
    pub coefficient: f64,
}

impl ObjectiveTerm {
    pub fn new_linear(variable: &str, coefficient: f64) -> Self {
        ObjectiveTerm {
            variable: variable.to_string(),
            coefficient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_terms_are_summed() {
        let mut objective = Objective::new_minimize();
        objective.add_term(ObjectiveTerm::new_linear("x", 1.));
        objective.add_term(ObjectiveTerm::new_linear("y", 2.));
        objective.add_term(ObjectiveTerm::new_linear("x", 0.5));
        let coefficients = objective.coefficients();
        assert_eq!(coefficients.len(), 2);
        assert_eq!(coefficients["x"], 1.5);

        let values: IndexMap<String, f64> = [("x".to_string(), 2.), ("y".to_string(), 1.)]
            .into_iter()
            .collect();
        assert_eq!(objective.value(&values), 5.);
        objective.remove_all_terms();
        assert!(objective.terms().is_empty());
    }
}
