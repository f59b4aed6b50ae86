//! Implements a solver interface for the microlp simplex solver
use indexmap::IndexMap;
use microlp::{ComparisonOp, LinearExpr, OptimizationDirection};

use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Simplex solver backend, exact vertex solutions
#[derive(Clone, Copy, Debug, Default)]
pub struct MicrolpSolver;

impl Solver for MicrolpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let direction = match problem.objective().sense() {
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
        };
        let mut lp = microlp::Problem::new(direction);
        let coefficients = problem.objective().coefficients();
        let vars: Vec<microlp::Variable> = problem
            .variables()
            .values()
            .map(|v| {
                let coef = coefficients.get(&v.id).copied().unwrap_or(0.);
                lp.add_var(coef, (v.lower_bound, v.upper_bound))
            })
            .collect();

        for constraint in problem.constraints().values() {
            let expr = || {
                let mut expr = LinearExpr::empty();
                for term in constraint.terms() {
                    if let Some(idx) = problem.variables().get_index_of(&term.variable) {
                        expr.add(vars[idx], term.coefficient);
                    }
                }
                expr
            };
            let (lb, ub) = constraint.bounds();
            if lb == ub {
                lp.add_constraint(expr(), ComparisonOp::Eq, lb);
                continue;
            }
            if lb.is_finite() {
                lp.add_constraint(expr(), ComparisonOp::Ge, lb);
            }
            if ub.is_finite() {
                lp.add_constraint(expr(), ComparisonOp::Le, ub);
            }
        }

        match lp.solve() {
            Ok(solution) => {
                let variable_values: IndexMap<String, f64> = problem
                    .variables()
                    .keys()
                    .cloned()
                    .zip(vars.iter().map(|v| solution[*v]))
                    .collect();
                Ok(ProblemSolution {
                    status: OptimizationStatus::Optimal,
                    objective_value: Some(problem.objective().value(&variable_values)),
                    variable_values: Some(variable_values),
                })
            }
            Err(microlp::Error::Infeasible) => {
                Ok(ProblemSolution::failed(OptimizationStatus::Infeasible))
            }
            Err(microlp::Error::Unbounded) => {
                Ok(ProblemSolution::failed(OptimizationStatus::Unbounded))
            }
            Err(other) => Err(SolverError::Internal(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn simple_maximization() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", None, 0., 3.).unwrap();
        problem.add_new_variable("y", None, 0., f64::INFINITY).unwrap();
        problem
            .add_new_inequality_constraint("c1", &["x", "y"], &[1., 2.], f64::NEG_INFINITY, 4.)
            .unwrap();
        problem.add_new_linear_objective_term("x", 1.).unwrap();
        problem.add_new_linear_objective_term("y", 1.).unwrap();

        let solution = problem.solve_with(&MicrolpSolver).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Optimal);
        assert_relative_eq!(solution.objective_value.unwrap(), 3.5, epsilon = 1e-9);
    }

    #[test]
    fn infeasible_problem() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", None, 0., 3.).unwrap();
        problem
            .add_new_inequality_constraint("c1", &["x"], &[1.], 10., f64::INFINITY)
            .unwrap();
        let solution = problem.solve_with(&MicrolpSolver).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
    }
}
