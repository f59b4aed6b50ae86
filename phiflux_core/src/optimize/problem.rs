//! Provides struct representing an optimization problem
use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

use crate::optimize::constraint::Constraint;
use crate::optimize::objective::{Objective, ObjectiveSense, ObjectiveTerm};
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::variable::Variable;
use crate::optimize::ProblemSolution;

/// A linear optimization problem
///
/// Variables are referred to by id everywhere, so the problem can be cloned freely and a
/// clone can be given a different objective or extra constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// Objective to optimize
    objective: Objective,
    /// Variables of the optimization problem
    variables: IndexMap<String, Variable>,
    /// Constraints of the optimization problem
    constraints: IndexMap<String, Constraint>,
}

impl Problem {
    // region Creation Functions
    pub fn new(objective_sense: ObjectiveSense) -> Self {
        Self {
            objective: Objective::new(objective_sense),
            variables: IndexMap::new(),
            constraints: IndexMap::new(),
        }
    }

    pub fn new_maximization() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    pub fn new_minimization() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }
    // endregion Creation Functions

    // region Accessors
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn variables(&self) -> &IndexMap<String, Variable> {
        &self.variables
    }

    pub fn constraints(&self) -> &IndexMap<String, Constraint> {
        &self.constraints
    }

    pub fn variable(&self, id: &str) -> Result<&Variable, ProblemError> {
        self.variables
            .get(id)
            .ok_or_else(|| ProblemError::NonExistentVariable(id.to_string()))
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
    // endregion Accessors

    /// Update the objective sense of the problem
    pub fn update_objective_sense(&mut self, sense: ObjectiveSense) {
        self.objective.set_sense(sense);
    }

    // region Adding Variables
    /// Add a variable to the optimization problem
    pub fn add_variable(&mut self, mut variable: Variable) -> Result<(), ProblemError> {
        self.validate_variable(&variable)?;
        variable.index = self.variables.len();
        self.variables.insert(variable.id.clone(), variable);
        Ok(())
    }

    /// Create a new variable and add it to the optimization problem
    pub fn add_new_variable(
        &mut self,
        id: &str,
        name: Option<&str>,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        self.add_variable(Variable {
            id: id.to_string(),
            name: name.map(str::to_string),
            lower_bound,
            upper_bound,
            index: 0,
        })
    }
    // endregion Adding Variables

    // region Adding Constraints
    /// Add a constraint to the problem
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), ProblemError> {
        self.validate_constraint(&constraint)?;
        self.constraints
            .insert(constraint.get_id().to_string(), constraint);
        Ok(())
    }

    /// Create a new equality constraint and add it to the problem
    pub fn add_new_equality_constraint<S: AsRef<str>>(
        &mut self,
        id: &str,
        variables: &[S],
        coefficients: &[f64],
        equals: f64,
    ) -> Result<(), ProblemError> {
        self.check_term_lengths(id, variables.len(), coefficients.len())?;
        self.add_constraint(Constraint::new_equality(id, variables, coefficients, equals))
    }

    /// Create a new inequality constraint and add it to the problem
    pub fn add_new_inequality_constraint<S: AsRef<str>>(
        &mut self,
        id: &str,
        variables: &[S],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        self.check_term_lengths(id, variables.len(), coefficients.len())?;
        self.add_constraint(Constraint::new_inequality(
            id,
            variables,
            coefficients,
            lower_bound,
            upper_bound,
        ))
    }

    /// Remove a constraint (by id) from the problem
    pub fn remove_constraint(&mut self, constraint_id: &str) -> Result<Constraint, ProblemError> {
        self.constraints
            .shift_remove(constraint_id)
            .ok_or_else(|| ProblemError::NonExistentConstraint(constraint_id.to_string()))
    }
    // endregion Adding Constraints

    // region Objective Terms
    /// Add a new term to the objective
    pub fn add_objective_term(&mut self, objective_term: ObjectiveTerm) -> Result<(), ProblemError> {
        if !self.variables.contains_key(&objective_term.variable) {
            return Err(ProblemError::NonExistentVariablesInObjective(
                objective_term.variable,
            ));
        }
        self.objective.add_term(objective_term);
        Ok(())
    }

    /// Add a new linear term to the objective using the variable id
    pub fn add_new_linear_objective_term(
        &mut self,
        variable_id: &str,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        self.add_objective_term(ObjectiveTerm::new_linear(variable_id, coefficient))
    }

    /// Remove all terms from the objective
    pub fn remove_all_objective_terms(&mut self) {
        self.objective.remove_all_terms();
    }
    // endregion Objective Terms

    /// Update the bounds of a variable
    pub fn update_variable_bounds(
        &mut self,
        id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        if lower_bound > upper_bound || lower_bound.is_nan() || upper_bound.is_nan() {
            return Err(ProblemError::InvalidVariableBounds(id.to_string()));
        }
        let var = self
            .variables
            .get_mut(id)
            .ok_or_else(|| ProblemError::NonExistentVariable(id.to_string()))?;
        var.lower_bound = lower_bound;
        var.upper_bound = upper_bound;
        Ok(())
    }

    /// Solve the problem with the given solver
    pub fn solve_with(&self, solver: &dyn Solver) -> Result<ProblemSolution, SolverError> {
        debug!(
            "Solving problem with {} variables and {} constraints using {}",
            self.num_variables(),
            self.num_constraints(),
            solver.name()
        );
        solver.solve(self)
    }

    // region Validation Functions
    fn validate_variable(&self, variable: &Variable) -> Result<(), ProblemError> {
        if self.variables.contains_key(&variable.id) {
            return Err(ProblemError::VariableIdAlreadyExists(variable.id.clone()));
        }
        let (lb, ub) = (variable.lower_bound, variable.upper_bound);
        if lb > ub || lb.is_nan() || ub.is_nan() {
            return Err(ProblemError::InvalidVariableBounds(variable.id.clone()));
        }
        Ok(())
    }

    fn validate_constraint(&self, constraint: &Constraint) -> Result<(), ProblemError> {
        let id = constraint.get_id();
        if self.constraints.contains_key(id) {
            return Err(ProblemError::ConstraintAlreadyExists(id.to_string()));
        }
        let (lb, ub) = constraint.bounds();
        if lb > ub || lb.is_nan() || ub.is_nan() {
            return Err(ProblemError::InvalidConstraintBounds(id.to_string()));
        }
        for term in constraint.terms() {
            if !self.variables.contains_key(&term.variable) {
                return Err(ProblemError::NonExistentVariablesInConstraint {
                    constraint: id.to_string(),
                    variable: term.variable.clone(),
                });
            }
            if !term.coefficient.is_finite() {
                return Err(ProblemError::NonFiniteCoefficient(id.to_string()));
            }
        }
        Ok(())
    }

    fn check_term_lengths(
        &self,
        id: &str,
        variables: usize,
        coefficients: usize,
    ) -> Result<(), ProblemError> {
        if variables != coefficients {
            return Err(ProblemError::MismatchedTerms(id.to_string()));
        }
        Ok(())
    }
    // endregion Validation Functions
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("Tried to add variable {0}, but a variable with the same id already exists")]
    VariableIdAlreadyExists(String),
    #[error("Variable {0} has lower_bound > upper_bound")]
    InvalidVariableBounds(String),
    #[error("Tried to add constraint {0}, but a constraint with the same id already exists")]
    ConstraintAlreadyExists(String),
    #[error("Inequality constraint {0} has lower_bound > upper_bound")]
    InvalidConstraintBounds(String),
    #[error("Constraint {constraint} uses variable {variable} which is not in the problem")]
    NonExistentVariablesInConstraint { constraint: String, variable: String },
    #[error("Constraint {0} has a coefficient which is not finite")]
    NonFiniteCoefficient(String),
    #[error("Constraint {0} has a different number of variables and coefficients")]
    MismatchedTerms(String),
    #[error("Tried adding an objective term with variable {0} which is not in the problem")]
    NonExistentVariablesInObjective(String),
    #[error("Variable {0} doesn't exist")]
    NonExistentVariable(String),
    #[error("Constraint {0} doesn't exist")]
    NonExistentConstraint(String),
}
