//! Flux balance analysis and its parsimonious variant
use indexmap::IndexMap;
use log::info;

use crate::analysis::flux::{FluxLayout, FluxProblem};
use crate::analysis::AnalysisError;
use crate::metabolic_model::model::Model;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::solvers::Solver;
use crate::optimize::OptimizationStatus;

/// Relative slack given to the optimum when it is fixed for the second pFBA stage
const OPTIMUM_SLACK: f64 = 1e-6;

/// Id of the constraint pinning the first stage objective during pFBA
pub const FIXED_OBJECTIVE: &str = "fixed_objective";

/// Result of an FBA style analysis
#[derive(Clone, Debug, PartialEq)]
pub struct FluxSolution {
    pub status: OptimizationStatus,
    /// Value of the first stage objective at the reported fluxes
    pub objective_value: f64,
    /// Net flux of every reaction, in model order
    pub fluxes: IndexMap<String, f64>,
}

/// Maximize the model objective subject to steady state and the reaction bounds
pub fn fba(model: &Model, solver: &dyn Solver) -> Result<FluxSolution, AnalysisError> {
    let fp = objective_problem(model)?;
    info!("Running FBA on {} reactions", model.reactions.len());
    let solution = fp.solve("FBA", solver)?;
    Ok(FluxSolution {
        status: solution.status,
        objective_value: solution.objective_value,
        fluxes: fp.fluxes(&solution.variable_values),
    })
}

/// Parsimonious FBA: maximize the model objective, then minimize the total flux while keeping
/// the objective at `fraction_of_optimum` of its optimum
pub fn pfba(
    model: &Model,
    fraction_of_optimum: f64,
    solver: &dyn Solver,
) -> Result<FluxSolution, AnalysisError> {
    info!("Running pFBA on {} reactions", model.reactions.len());
    parsimonious(objective_problem(model)?, fraction_of_optimum, solver)
}

fn objective_problem(model: &Model) -> Result<FluxProblem, AnalysisError> {
    if model.objective.is_empty() {
        return Err(AnalysisError::EmptyObjective);
    }
    let mut fp = FluxProblem::new(model, FluxLayout::Split)?;
    fp.set_objective(&model.objective, ObjectiveSense::Maximize)?;
    Ok(fp)
}

/// Solve `fp` with its current objective, fix that objective at `fraction_of_optimum` of the
/// optimum and minimize the summed absolute fluxes
///
/// A maximized objective is bounded below, a minimized one above, in both cases with a small
/// relative slack.
pub fn parsimonious(
    mut fp: FluxProblem,
    fraction_of_optimum: f64,
    solver: &dyn Solver,
) -> Result<FluxSolution, AnalysisError> {
    let first = fp.solve("pFBA objective stage", solver)?;
    let objective = fp.problem().objective().clone();
    let bound = first.objective_value * fraction_of_optimum;
    let slack = OPTIMUM_SLACK * bound.abs().max(1.);
    let (lower_bound, upper_bound) = match objective.sense() {
        ObjectiveSense::Maximize => (bound - slack, f64::INFINITY),
        ObjectiveSense::Minimize => (f64::NEG_INFINITY, bound + slack),
    };
    let coefficients = objective.coefficients();
    let (vars, coefs): (Vec<String>, Vec<f64>) = coefficients.into_iter().unzip();
    fp.problem_mut().add_new_inequality_constraint(
        FIXED_OBJECTIVE,
        &vars,
        &coefs,
        lower_bound,
        upper_bound,
    )?;

    fp.minimize_total_flux()?;
    let second = fp.solve("pFBA minimal flux stage", solver)?;
    Ok(FluxSolution {
        status: second.status,
        objective_value: objective.value(&second.variable_values),
        fluxes: fp.fluxes(&second.variable_values),
    })
}
