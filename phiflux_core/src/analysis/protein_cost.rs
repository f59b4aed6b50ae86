//! Parsimonious FBA under a protein cost budget
//!
//! The protein cost of a flux distribution is C(v) = Σ cost_r · v_r, summed over the reactions
//! which have a cost and are part of the model.
use indexmap::IndexMap;
use log::{info, warn};

use crate::analysis::fba::parsimonious;
use crate::analysis::flux::{FluxLayout, FluxProblem};
use crate::analysis::AnalysisError;
use crate::metabolic_model::model::Model;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::solvers::Solver;
use crate::optimize::OptimizationStatus;

/// Id of the constraint holding the protein cost
pub const PROTEIN_COST_CONSTRAINT: &str = "total_protein_cost";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CostMode {
    /// Keep the protein cost in [lower, upper] and minimize it. Growth is set through the
    /// biomass reaction bounds.
    MinimizeCost { lower: f64, upper: f64 },
    /// Fix the protein cost and maximize the biomass flux
    MaximizeGrowth { cost: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProteinCostSolution {
    pub status: OptimizationStatus,
    pub total_protein_cost: f64,
    pub biomass_flux: f64,
    pub fluxes: IndexMap<String, f64>,
}

/// Protein cost of a flux distribution
pub fn total_protein_cost(costs: &IndexMap<String, f64>, fluxes: &IndexMap<String, f64>) -> f64 {
    costs
        .iter()
        .filter_map(|(rxn, cost)| fluxes.get(rxn).map(|flux| cost * flux))
        .sum()
}

/// Run the protein cost constrained pFBA selected by `mode`
pub fn optimize_protein_cost(
    model: &Model,
    costs: &IndexMap<String, f64>,
    biomass_reaction: &str,
    mode: CostMode,
    solver: &dyn Solver,
) -> Result<ProteinCostSolution, AnalysisError> {
    model.reaction(biomass_reaction)?;
    let costs: IndexMap<String, f64> = costs
        .iter()
        .filter(|(rxn, _)| model.reactions.contains_key(*rxn))
        .map(|(rxn, cost)| (rxn.clone(), *cost))
        .collect();
    if costs.is_empty() {
        warn!("None of the protein costs name a reaction of the model");
    }

    let mut fp = FluxProblem::new(model, FluxLayout::Split)?;
    match mode {
        CostMode::MinimizeCost { lower, upper } => {
            info!("Minimizing protein cost within [{lower}, {upper}]");
            fp.add_flux_constraint(PROTEIN_COST_CONSTRAINT, &costs, lower, upper)?;
            fp.set_objective(&costs, ObjectiveSense::Minimize)?;
        }
        CostMode::MaximizeGrowth { cost } => {
            info!("Maximizing {biomass_reaction} at protein cost {cost}");
            fp.add_flux_constraint(PROTEIN_COST_CONSTRAINT, &costs, cost, cost)?;
            let biomass: IndexMap<String, f64> =
                [(biomass_reaction.to_string(), 1.)].into_iter().collect();
            fp.set_objective(&biomass, ObjectiveSense::Maximize)?;
        }
    }

    let solution = parsimonious(fp, 1., solver)?;
    let total = total_protein_cost(&costs, &solution.fluxes);
    let biomass_flux = solution
        .fluxes
        .get(biomass_reaction)
        .copied()
        .unwrap_or(0.);
    info!("Total protein cost {total}, biomass flux {biomass_flux}");
    Ok(ProteinCostSolution {
        status: solution.status,
        total_protein_cost: total,
        biomass_flux,
        fluxes: solution.fluxes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundOverride;
    use crate::metabolic_model::reaction::ReactionBuilder;
    use crate::optimize::solvers::clarabel::ClarabelSolver;
    use approx::assert_relative_eq;

    fn reaction(model: &mut Model, id: &str, stoich: &[(&str, f64)], ub: f64) {
        model.add_reaction(
            ReactionBuilder::default()
                .id(id.to_string())
                .metabolites(stoich.iter().map(|(m, c)| (m.to_string(), *c)).collect())
                .lower_bound(0.)
                .upper_bound(ub)
                .build()
                .unwrap(),
        );
    }

    /// Two routes from A to B, a cheap one and an expensive one
    fn model() -> (Model, IndexMap<String, f64>) {
        let mut model = Model::new_empty();
        reaction(&mut model, "EX_A", &[("A", 1.)], 10.);
        reaction(&mut model, "cheap", &[("A", -1.), ("B", 1.)], 2.);
        reaction(&mut model, "costly", &[("A", -1.), ("B", 1.)], 1000.);
        reaction(&mut model, "bio1_biomass", &[("B", -1.)], 1000.);
        let costs = [
            ("cheap".to_string(), 1.),
            ("costly".to_string(), 5.),
            ("absent".to_string(), 100.),
        ]
        .into_iter()
        .collect();
        (model, costs)
    }

    #[test]
    fn minimize_cost_at_fixed_growth() {
        let (model, costs) = model();
        let model = model
            .with_overrides(&[BoundOverride::fixed(&["bio1_biomass"], 4.)])
            .unwrap();
        let mode = CostMode::MinimizeCost {
            lower: 0.,
            upper: 1000.,
        };
        let solution = optimize_protein_cost(
            &model,
            &costs,
            "bio1_biomass",
            mode,
            &ClarabelSolver::default(),
        )
        .unwrap();
        // 2 units through the cheap route, the rest through the costly one
        assert_relative_eq!(solution.total_protein_cost, 12., epsilon = 1e-3);
        assert_relative_eq!(solution.fluxes["cheap"], 2., epsilon = 1e-3);
        assert_relative_eq!(solution.biomass_flux, 4., epsilon = 1e-3);
    }

    #[test]
    fn maximize_growth_at_fixed_cost() {
        let (model, costs) = model();
        let solution = optimize_protein_cost(
            &model,
            &costs,
            "bio1_biomass",
            CostMode::MaximizeGrowth { cost: 7. },
            &ClarabelSolver::default(),
        )
        .unwrap();
        // cheap route saturated at 2 (cost 2), 1 unit on the costly one (cost 5)
        assert_relative_eq!(solution.biomass_flux, 3., epsilon = 1e-3);
        assert_relative_eq!(solution.total_protein_cost, 7., epsilon = 1e-3);
    }

    #[test]
    fn missing_biomass_reaction() {
        let (model, costs) = model();
        let result = optimize_protein_cost(
            &model,
            &costs,
            "growth",
            CostMode::MaximizeGrowth { cost: 1. },
            &ClarabelSolver::default(),
        );
        assert!(matches!(result, Err(AnalysisError::Model(_))));
    }

    #[test]
    fn cost_of_fluxes() {
        let costs: IndexMap<String, f64> =
            [("R1".to_string(), 2.), ("R2".to_string(), 3.)].into_iter().collect();
        let fluxes: IndexMap<String, f64> =
            [("R1".to_string(), 1.5), ("R3".to_string(), 7.)].into_iter().collect();
        assert_eq!(total_protein_cost(&costs, &fluxes), 3.);
    }
}
