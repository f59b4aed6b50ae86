//! Solver backends for linear problems
use cfg_if::cfg_if;
use thiserror::Error;

use crate::configuration::SolverChoice;
use crate::optimize::problem::Problem;
use crate::optimize::ProblemSolution;

pub mod clarabel;
#[cfg(feature = "microlp")]
pub mod microlp;

/// A backend able to solve a linear [`Problem`]
///
/// Infeasible or unbounded problems are not errors, they are reported through the status of
/// the returned [`ProblemSolution`]. Errors are reserved for failures to set up or run the
/// solver.
pub trait Solver {
    /// Name of the backend, used in log messages
    fn name(&self) -> &'static str;

    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError>;
}

/// Create the solver backend for `choice`
pub fn solver_for(choice: SolverChoice) -> Result<Box<dyn Solver>, SolverError> {
    match choice {
        SolverChoice::Clarabel => Ok(Box::new(clarabel::ClarabelSolver::default())),
        SolverChoice::Microlp => microlp_solver(),
    }
}

cfg_if! {
    if #[cfg(feature = "microlp")] {
        fn microlp_solver() -> Result<Box<dyn Solver>, SolverError> {
            Ok(Box::new(microlp::MicrolpSolver))
        }
    } else {
        fn microlp_solver() -> Result<Box<dyn Solver>, SolverError> {
            Err(SolverError::Unavailable("microlp"))
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error("Solver {0} is not available, enable the cargo feature of the same name")]
    Unavailable(&'static str),
    #[error("Unable to set up the solver: {0}")]
    Setup(String),
    #[error("Unable to assemble the constraint matrix: {0}")]
    Assembly(String),
    #[error("Solver failed: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clarabel_is_always_available() {
        assert_eq!(solver_for(SolverChoice::Clarabel).unwrap().name(), "clarabel");
    }

    #[cfg(not(feature = "microlp"))]
    #[test]
    fn microlp_requires_feature() {
        assert!(matches!(
            solver_for(SolverChoice::Microlp),
            Err(SolverError::Unavailable("microlp"))
        ));
    }
}
