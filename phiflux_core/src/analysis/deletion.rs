//! Single reaction and single gene deletion screens
use log::{debug, info};

use crate::analysis::flux::{FluxLayout, FluxProblem};
use crate::analysis::AnalysisError;
use crate::metabolic_model::model::Model;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::solvers::Solver;

/// A gene is essential when its deletion leaves at most this fraction of wild type growth
pub const ESSENTIAL_GROWTH_RATIO: f64 = 0.10;

/// Wild type objective values below this are treated as no growth
const MIN_WILD_TYPE_OBJECTIVE: f64 = 1e-6;

#[derive(Clone, Debug, PartialEq)]
pub struct ReactionDeletion {
    pub reaction: String,
    pub name: Option<String>,
    /// Objective with the reaction knocked out, None when the problem has no solution
    pub objective_value: Option<f64>,
    /// (wild type - knock out) / wild type × 100
    pub reduction_percent: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneDeletion {
    pub gene: String,
    /// Reactions left without an active GPR
    pub knocked_out: Vec<String>,
    pub objective_value: Option<f64>,
    /// knock out / wild type
    pub growth_ratio: f64,
    pub essential: bool,
}

/// Objective problem shared by the knock outs, with its wild type optimum
fn wild_type(model: &Model, solver: &dyn Solver) -> Result<(FluxProblem, f64), AnalysisError> {
    if model.objective.is_empty() {
        return Err(AnalysisError::EmptyObjective);
    }
    let mut fp = FluxProblem::new(model, FluxLayout::Split)?;
    fp.set_objective(&model.objective, ObjectiveSense::Maximize)?;
    let wild_type = fp.solve("Wild type FBA", solver)?.objective_value;
    if wild_type.abs() < MIN_WILD_TYPE_OBJECTIVE {
        return Err(AnalysisError::NoWildTypeGrowth(wild_type));
    }
    info!("Wild type objective {wild_type}");
    Ok((fp, wild_type))
}

/// Optimum with the given reactions unable to carry flux, None if there is none
fn knock_out_objective<'a, I>(
    base: &FluxProblem,
    reactions: I,
    solver: &dyn Solver,
) -> Result<Option<f64>, AnalysisError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut fp = base.clone();
    for rxn in reactions {
        for (var, _) in fp.net_flux_terms(rxn)? {
            fp.problem_mut().update_variable_bounds(&var, 0., 0.)?;
        }
    }
    match fp.solve("Knock out FBA", solver) {
        Ok(solution) => Ok(Some(solution.objective_value)),
        Err(AnalysisError::NotOptimal { status, .. }) => {
            debug!("Knock out finished with status {status}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Knock out every reaction in turn and report the loss of objective
///
/// A knock out without a solution counts as a 100 % reduction.
pub fn single_reaction_deletions(
    model: &Model,
    solver: &dyn Solver,
) -> Result<Vec<ReactionDeletion>, AnalysisError> {
    let (base, wild_type) = wild_type(model, solver)?;
    info!("Screening {} reaction deletions", model.reactions.len());
    model
        .reactions
        .values()
        .map(|rxn| {
            let objective_value = knock_out_objective(&base, [rxn.id.as_str()], solver)?;
            let knock_out = objective_value.unwrap_or(0.);
            Ok(ReactionDeletion {
                reaction: rxn.id.clone(),
                name: rxn.name.clone(),
                objective_value,
                reduction_percent: (wild_type - knock_out) / wild_type * 100.,
            })
        })
        .collect()
}

/// Knock out every gene in turn, together with the reactions depending on it
pub fn single_gene_deletions(
    model: &Model,
    solver: &dyn Solver,
) -> Result<Vec<GeneDeletion>, AnalysisError> {
    let (base, wild_type) = wild_type(model, solver)?;
    info!("Screening {} gene deletions", model.genes.len());
    let mut deletions = Vec::with_capacity(model.genes.len());
    for gene in model.genes.keys() {
        let knocked_out = model.clone().knock_out_gene(gene)?;
        let objective_value = if knocked_out.is_empty() {
            Some(wild_type)
        } else {
            knock_out_objective(&base, knocked_out.iter().map(String::as_str), solver)?
        };
        let growth_ratio = objective_value.unwrap_or(0.) / wild_type;
        deletions.push(GeneDeletion {
            gene: gene.clone(),
            knocked_out,
            objective_value,
            growth_ratio,
            essential: growth_ratio <= ESSENTIAL_GROWTH_RATIO,
        });
    }
    Ok(deletions)
}
