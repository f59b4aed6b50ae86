//! Linear programming analyses of metabolic models
//!
//! Every analysis goes through a [`flux::FluxProblem`], which turns a model into a
//! [`Problem`](crate::optimize::problem::Problem) with one mass balance row per internal
//! metabolite, and maps solver variable values back to net reaction fluxes.
use thiserror::Error;

use crate::metabolic_model::model::ModelError;
use crate::optimize::problem::ProblemError;
use crate::optimize::solvers::SolverError;
use crate::optimize::OptimizationStatus;

pub mod deletion;
pub mod fba;
pub mod flux;
pub mod min_phi;
pub mod protein_cost;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Unable to build the optimization problem: {0}")]
    Problem(#[from] ProblemError),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error("{stage} finished with status {status}")]
    NotOptimal {
        stage: &'static str,
        status: OptimizationStatus,
    },
    #[error("The model has no objective")]
    EmptyObjective,
    #[error("Wild type objective is {0}, nothing to compare deletions against")]
    NoWildTypeGrowth(f64),
}
