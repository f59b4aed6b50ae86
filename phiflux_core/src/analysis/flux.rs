//! Flux balance problems built from a model
use indexmap::IndexMap;
use log::{debug, warn};

use crate::analysis::AnalysisError;
use crate::metabolic_model::model::{Model, ModelError};
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::Solver;
use crate::optimize::OptimizationStatus;

/// How reaction fluxes are represented by problem variables
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FluxLayout {
    /// Each reaction gets a non-negative forward and a non-negative reverse variable, the net
    /// flux being forward - reverse
    Split,
    /// Each reaction gets one non-negative variable capped at `flux_cap`, for models whose
    /// reversible reactions were already split in two
    Irreversible { flux_cap: f64 },
}

#[derive(Clone, Debug)]
struct FluxVariables {
    forward: String,
    reverse: Option<String>,
}

/// A linear problem whose variables are the reaction fluxes of a model, constrained to steady
/// state
///
/// There is one mass balance row, `mass_balance_{metabolite}`, for every metabolite which is not
/// a boundary metabolite and takes part in at least one reaction.
#[derive(Clone, Debug)]
pub struct FluxProblem {
    problem: Problem,
    reactions: IndexMap<String, FluxVariables>,
}

/// Values of a successfully solved problem
#[derive(Clone, Debug, PartialEq)]
pub struct StageSolution {
    pub status: OptimizationStatus,
    pub objective_value: f64,
    pub variable_values: IndexMap<String, f64>,
}

impl FluxProblem {
    pub fn new(model: &Model, layout: FluxLayout) -> Result<FluxProblem, AnalysisError> {
        let mut problem = Problem::new_maximization();
        let mut reactions = IndexMap::with_capacity(model.reactions.len());
        let mut clipped = 0usize;
        for rxn in model.reactions.values() {
            let forward = rxn.get_forward_id();
            let variables = match layout {
                FluxLayout::Split => {
                    let reverse = rxn.get_reverse_id();
                    problem.add_new_variable(
                        &forward,
                        rxn.name.as_deref(),
                        rxn.get_forward_lower_bound(),
                        rxn.get_forward_upper_bound(),
                    )?;
                    problem.add_new_variable(
                        &reverse,
                        None,
                        rxn.get_reverse_lower_bound(),
                        rxn.get_reverse_upper_bound(),
                    )?;
                    FluxVariables {
                        forward,
                        reverse: Some(reverse),
                    }
                }
                FluxLayout::Irreversible { flux_cap } => {
                    if rxn.lower_bound < 0. {
                        clipped += 1;
                    }
                    let lower_bound = rxn.get_forward_lower_bound();
                    let upper_bound = rxn.get_forward_upper_bound().min(flux_cap).max(lower_bound);
                    problem.add_new_variable(
                        &forward,
                        rxn.name.as_deref(),
                        lower_bound,
                        upper_bound,
                    )?;
                    FluxVariables {
                        forward,
                        reverse: None,
                    }
                }
            };
            reactions.insert(rxn.id.clone(), variables);
        }
        if clipped > 0 {
            warn!("{clipped} reactions allow negative flux, which the irreversible layout clips to zero");
        }

        let mut balances: IndexMap<&str, (Vec<&str>, Vec<f64>)> = IndexMap::new();
        for (rxn, variables) in model.reactions.values().zip(reactions.values()) {
            for (met, coef) in &rxn.metabolites {
                if *coef == 0. || model.metabolites.get(met).is_some_and(|m| m.boundary) {
                    continue;
                }
                let (vars, coefs) = balances.entry(met.as_str()).or_default();
                vars.push(&variables.forward);
                coefs.push(*coef);
                if let Some(reverse) = &variables.reverse {
                    vars.push(reverse);
                    coefs.push(-coef);
                }
            }
        }
        for (met, (vars, coefs)) in balances {
            problem.add_new_equality_constraint(
                &format!("mass_balance_{met}"),
                &vars,
                &coefs,
                0.,
            )?;
        }
        debug!(
            "Built flux problem with {} variables and {} mass balances",
            problem.num_variables(),
            problem.num_constraints()
        );

        Ok(FluxProblem { problem, reactions })
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn problem_mut(&mut self) -> &mut Problem {
        &mut self.problem
    }

    /// Ids of the reactions whose fluxes are modelled, in model order
    pub fn reactions(&self) -> impl Iterator<Item = &str> {
        self.reactions.keys().map(String::as_str)
    }

    /// Variables and coefficients expressing the net flux of a reaction
    pub fn net_flux_terms(&self, reaction: &str) -> Result<Vec<(String, f64)>, AnalysisError> {
        let variables = self
            .reactions
            .get(reaction)
            .ok_or_else(|| ModelError::ReactionNotFound(reaction.to_string()))?;
        let mut terms = vec![(variables.forward.clone(), 1.)];
        if let Some(reverse) = &variables.reverse {
            terms.push((reverse.clone(), -1.));
        }
        Ok(terms)
    }

    /// Expand a weighted sum of net reaction fluxes into variable terms
    fn expand(
        &self,
        coefficients: &IndexMap<String, f64>,
    ) -> Result<(Vec<String>, Vec<f64>), AnalysisError> {
        let mut vars = Vec::new();
        let mut coefs = Vec::new();
        for (rxn, weight) in coefficients {
            for (var, sign) in self.net_flux_terms(rxn)? {
                vars.push(var);
                coefs.push(sign * weight);
            }
        }
        Ok((vars, coefs))
    }

    /// Replace the objective with Σ coefficient × net flux
    pub fn set_objective(
        &mut self,
        coefficients: &IndexMap<String, f64>,
        sense: ObjectiveSense,
    ) -> Result<(), AnalysisError> {
        let (vars, coefs) = self.expand(coefficients)?;
        self.problem.remove_all_objective_terms();
        self.problem.update_objective_sense(sense);
        for (var, coef) in vars.iter().zip(coefs) {
            self.problem.add_new_linear_objective_term(var, coef)?;
        }
        Ok(())
    }

    /// Replace the objective with the minimization of the summed absolute fluxes
    pub fn minimize_total_flux(&mut self) -> Result<(), AnalysisError> {
        self.problem.remove_all_objective_terms();
        self.problem.update_objective_sense(ObjectiveSense::Minimize);
        let vars: Vec<String> = self.problem.variables().keys().cloned().collect();
        for var in vars {
            self.problem.add_new_linear_objective_term(&var, 1.)?;
        }
        Ok(())
    }

    /// Constrain lower_bound <= Σ coefficient × net flux <= upper_bound
    pub fn add_flux_constraint(
        &mut self,
        id: &str,
        coefficients: &IndexMap<String, f64>,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), AnalysisError> {
        let (vars, coefs) = self.expand(coefficients)?;
        self.problem
            .add_new_inequality_constraint(id, &vars, &coefs, lower_bound, upper_bound)?;
        Ok(())
    }

    /// Solve, failing unless the solver reports a usable solution
    pub fn solve(
        &self,
        stage: &'static str,
        solver: &dyn Solver,
    ) -> Result<StageSolution, AnalysisError> {
        let solution = self.problem.solve_with(solver)?;
        match (solution.objective_value, solution.variable_values) {
            (Some(objective_value), Some(variable_values)) if solution.status.is_success() => {
                if solution.status == OptimizationStatus::AlmostOptimal {
                    warn!("{stage} only reached an approximate optimum");
                }
                Ok(StageSolution {
                    status: solution.status,
                    objective_value,
                    variable_values,
                })
            }
            _ => Err(AnalysisError::NotOptimal {
                stage,
                status: solution.status,
            }),
        }
    }

    /// Net flux of every reaction, in model order
    pub fn fluxes(&self, variable_values: &IndexMap<String, f64>) -> IndexMap<String, f64> {
        self.reactions
            .iter()
            .map(|(rxn, variables)| {
                let forward = variable_values
                    .get(&variables.forward)
                    .copied()
                    .unwrap_or(0.);
                let reverse = variables
                    .reverse
                    .as_ref()
                    .and_then(|r| variable_values.get(r))
                    .copied()
                    .unwrap_or(0.);
                (rxn.clone(), forward - reverse)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::reaction::ReactionBuilder;

    fn reaction(model: &mut Model, id: &str, stoich: &[(&str, f64)], lb: f64, ub: f64) {
        model.add_reaction(
            ReactionBuilder::default()
                .id(id.to_string())
                .metabolites(stoich.iter().map(|(m, c)| (m.to_string(), *c)).collect())
                .lower_bound(lb)
                .upper_bound(ub)
                .build()
                .unwrap(),
        );
    }

    fn model() -> Model {
        let mut model = Model::new_empty();
        reaction(&mut model, "EX_A", &[("A_e", -1.), ("A", 1.)], 0., 10.);
        reaction(&mut model, "R1", &[("A", -1.), ("B", 1.)], -1000., 1000.);
        reaction(&mut model, "R2", &[("B", -1.)], 0., 2000.);
        model.metabolites.get_mut("A_e").unwrap().boundary = true;
        model
    }

    #[test]
    fn split_layout() {
        let model = model();
        let fp = FluxProblem::new(&model, FluxLayout::Split).unwrap();
        assert_eq!(fp.problem().num_variables(), 6);
        let constraints: Vec<_> = fp.problem().constraints().keys().cloned().collect();
        assert_eq!(constraints, vec!["mass_balance_A", "mass_balance_B"]);
        let reverse = model.reactions["R1"].get_reverse_id();
        assert_eq!(fp.problem().variable(&reverse).unwrap().upper_bound, 1000.);
        assert_eq!(fp.net_flux_terms("R1").unwrap()[1], (reverse, -1.));
        assert!(fp.net_flux_terms("R9").is_err());
    }

    #[test]
    fn irreversible_layout_caps_fluxes() {
        let fp = FluxProblem::new(&model(), FluxLayout::Irreversible { flux_cap: 1000. }).unwrap();
        assert_eq!(fp.problem().num_variables(), 3);
        let r1 = fp.problem().variable("R1").unwrap();
        assert_eq!((r1.lower_bound, r1.upper_bound), (0., 1000.));
        assert_eq!(fp.problem().variable("R2").unwrap().upper_bound, 1000.);
    }

    #[test]
    fn inactive_reactions_are_fixed_at_zero() {
        let mut model = model();
        model.reactions.get_mut("R1").unwrap().knock_out();
        let fp = FluxProblem::new(&model, FluxLayout::Split).unwrap();
        let r1 = fp.problem().variable("R1").unwrap();
        assert_eq!((r1.lower_bound, r1.upper_bound), (0., 0.));
    }

    #[test]
    fn net_fluxes() {
        let model = model();
        let fp = FluxProblem::new(&model, FluxLayout::Split).unwrap();
        let values: IndexMap<String, f64> = [
            ("EX_A".to_string(), 3.),
            ("R1".to_string(), 1.),
            (model.reactions["R1"].get_reverse_id(), 4.),
        ]
        .into_iter()
        .collect();
        let fluxes = fp.fluxes(&values);
        assert_eq!(fluxes["EX_A"], 3.);
        assert_eq!(fluxes["R1"], -3.);
        assert_eq!(fluxes["R2"], 0.);
    }

    #[test]
    fn objective_over_net_flux() {
        let mut fp = FluxProblem::new(&model(), FluxLayout::Split).unwrap();
        let coefficients: IndexMap<String, f64> = [("R1".to_string(), 2.)].into_iter().collect();
        fp.set_objective(&coefficients, ObjectiveSense::Minimize).unwrap();
        assert_eq!(fp.problem().objective().sense(), ObjectiveSense::Minimize);
        let objective = fp.problem().objective().coefficients();
        assert_eq!(objective.len(), 2);
        assert_eq!(objective["R1"], 2.);
    }
}
