//! Monte-Carlo search for the flux distribution of minimal proteome cost (Φ)
//!
//! For every simulation the cost coefficients MW / kcat of its kinetic samples weight a linear
//! objective
//!
//! Φ = Σ cost_r · v_r / scale + w · Σ v_r / scale
//!
//! which is minimized over steady state fluxes with the biomass flux held above a target. The
//! second sum, with a small weight w, breaks ties in favour of lower total flux. All fluxes are
//! non-negative (the model is expected to have its reversible reactions split) and capped.
use derive_builder::Builder;
use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::analysis::flux::{FluxLayout, FluxProblem};
use crate::analysis::AnalysisError;
use crate::configuration::Configuration;
use crate::metabolic_model::model::Model;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::solvers::Solver;
use crate::optimize::OptimizationStatus;
use crate::sampling::CostSource;

/// Id of the constraint holding biomass flux above its target
pub const BIOMASS_CONSTRAINT: &str = "demand_biomass";

#[derive(Builder, Clone, Debug, PartialEq)]
pub struct MinPhiSettings {
    #[builder(setter(into), default = "\"bio1_biomass\".to_string()")]
    pub biomass_reaction: String,
    /// Minimal biomass flux
    #[builder(default = "0.73338")]
    pub biomass_target: f64,
    /// Simulations are numbered 1..=simulations
    #[builder(default = "100")]
    pub simulations: usize,
    /// Upper bound applied to every flux
    #[builder(default = "Configuration::current().flux_cap")]
    pub flux_cap: f64,
    /// Fluxes are divided by this value in the objective
    #[builder(default = "1000.")]
    pub flux_scale: f64,
    /// Weight of the total flux term
    #[builder(default = "0.001")]
    pub secondary_weight: f64,
}

impl Default for MinPhiSettings {
    fn default() -> Self {
        MinPhiSettings {
            biomass_reaction: "bio1_biomass".to_string(),
            biomass_target: 0.73338,
            simulations: 100,
            flux_cap: Configuration::current().flux_cap,
            flux_scale: 1000.,
            secondary_weight: 0.001,
        }
    }
}

/// What happened to a single simulation
#[derive(Clone, Debug, PartialEq)]
pub enum SimulationOutcome {
    Solved {
        phi: f64,
        fluxes: IndexMap<String, f64>,
    },
    /// The problem had no usable solution
    Failed { status: OptimizationStatus },
    /// The sample workbook has no column for the simulation
    Missing,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationResult {
    pub simulation: usize,
    pub outcome: SimulationOutcome,
}

impl SimulationResult {
    /// Φ of the simulation, +∞ unless it was solved
    pub fn phi(&self) -> f64 {
        match &self.outcome {
            SimulationOutcome::Solved { phi, .. } => *phi,
            _ => f64::INFINITY,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BestSimulation {
    pub simulation: usize,
    pub phi: f64,
    pub fluxes: IndexMap<String, f64>,
}

/// Running minimum over simulation results, the first simulation reaching it wins ties
#[derive(Clone, Debug, Default)]
pub struct SweepAccumulator {
    best: Option<BestSimulation>,
}

impl SweepAccumulator {
    pub fn observe(mut self, result: &SimulationResult) -> Self {
        if let SimulationOutcome::Solved { phi, fluxes } = &result.outcome {
            let improves = self.best.as_ref().map_or(true, |best| *phi < best.phi);
            if phi.is_finite() && improves {
                self.best = Some(BestSimulation {
                    simulation: result.simulation,
                    phi: *phi,
                    fluxes: fluxes.clone(),
                });
            }
        }
        self
    }

    pub fn finish(self) -> Option<BestSimulation> {
        self.best
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SweepReport {
    /// One result per simulation, in simulation order
    pub results: Vec<SimulationResult>,
    pub best: Option<BestSimulation>,
}

impl SweepReport {
    /// (simulation, Φ) for every simulation
    pub fn phi_values(&self) -> Vec<(usize, f64)> {
        self.results.iter().map(|r| (r.simulation, r.phi())).collect()
    }
}

/// Steady state problem shared by every simulation, with capped non-negative fluxes and the
/// biomass demand
pub fn build_phi_problem(
    model: &Model,
    settings: &MinPhiSettings,
) -> Result<FluxProblem, AnalysisError> {
    model.reaction(&settings.biomass_reaction)?;
    let mut fp = FluxProblem::new(
        model,
        FluxLayout::Irreversible {
            flux_cap: settings.flux_cap,
        },
    )?;
    let biomass: IndexMap<String, f64> = [(settings.biomass_reaction.clone(), 1.)]
        .into_iter()
        .collect();
    fp.add_flux_constraint(
        BIOMASS_CONSTRAINT,
        &biomass,
        settings.biomass_target,
        f64::INFINITY,
    )?;
    Ok(fp)
}

/// Objective coefficient of every reaction for the given costs
///
/// Costs naming reactions which aren't in the problem are ignored.
pub fn phi_coefficients(
    base: &FluxProblem,
    costs: &IndexMap<String, f64>,
    settings: &MinPhiSettings,
) -> IndexMap<String, f64> {
    let secondary = settings.secondary_weight / settings.flux_scale;
    base.reactions()
        .map(|rxn| {
            let cost = costs.get(rxn).copied().unwrap_or(0.);
            (rxn.to_string(), cost / settings.flux_scale + secondary)
        })
        .collect()
}

/// Minimize Φ for one set of costs
///
/// Errors from the solver are logged and reported as a failed outcome, so a sweep can carry on.
pub fn optimize_phi(
    base: &FluxProblem,
    costs: &IndexMap<String, f64>,
    settings: &MinPhiSettings,
    solver: &dyn Solver,
) -> Result<SimulationOutcome, AnalysisError> {
    let mut fp = base.clone();
    fp.set_objective(
        &phi_coefficients(base, costs, settings),
        ObjectiveSense::Minimize,
    )?;
    match fp.solve("Minimum phi", solver) {
        Ok(solution) => Ok(SimulationOutcome::Solved {
            phi: solution.objective_value,
            fluxes: fp.fluxes(&solution.variable_values),
        }),
        Err(AnalysisError::NotOptimal { status, .. }) => Ok(SimulationOutcome::Failed { status }),
        Err(AnalysisError::Solver(e)) => {
            warn!("Solver {} failed: {e}", solver.name());
            Ok(SimulationOutcome::Failed {
                status: OptimizationStatus::NumericalError,
            })
        }
        Err(e) => Err(e),
    }
}

/// Run every simulation of the sweep, in order
pub fn run_sweep<C: CostSource + ?Sized>(
    model: &Model,
    samples: &C,
    settings: &MinPhiSettings,
    solver: &dyn Solver,
) -> Result<SweepReport, AnalysisError> {
    let base = build_phi_problem(model, settings)?;
    info!(
        "Running {} minimum phi simulations with {}",
        settings.simulations,
        solver.name()
    );
    let mut results = Vec::with_capacity(settings.simulations);
    for simulation in 1..=settings.simulations {
        let outcome = match samples.costs(simulation) {
            Some(costs) => optimize_phi(&base, &costs, settings, solver)?,
            None => {
                warn!("No kinetic samples for simulation {simulation}, skipping it");
                SimulationOutcome::Missing
            }
        };
        match &outcome {
            SimulationOutcome::Solved { phi, .. } => debug!("Simulation {simulation}: phi {phi}"),
            SimulationOutcome::Failed { status } => {
                warn!("Simulation {simulation} finished with status {status}")
            }
            SimulationOutcome::Missing => {}
        }
        results.push(SimulationResult {
            simulation,
            outcome,
        });
    }
    let best = results
        .iter()
        .fold(SweepAccumulator::default(), SweepAccumulator::observe)
        .finish();
    match &best {
        Some(best) => info!(
            "Lowest phi {} found in simulation {}",
            best.phi, best.simulation
        ),
        None => warn!("No simulation reached an optimum"),
    }
    Ok(SweepReport { results, best })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solved(simulation: usize, phi: f64) -> SimulationResult {
        let fluxes = [("R".to_string(), simulation as f64)].into_iter().collect();
        SimulationResult {
            simulation,
            outcome: SimulationOutcome::Solved { phi, fluxes },
        }
    }

    #[test]
    fn accumulator_keeps_first_minimum() {
        let results = vec![
            solved(1, 3.),
            SimulationResult {
                simulation: 2,
                outcome: SimulationOutcome::Missing,
            },
            solved(3, 1.),
            solved(4, 1.),
            SimulationResult {
                simulation: 5,
                outcome: SimulationOutcome::Failed {
                    status: OptimizationStatus::Infeasible,
                },
            },
        ];
        let best = results
            .iter()
            .fold(SweepAccumulator::default(), SweepAccumulator::observe)
            .finish()
            .unwrap();
        assert_eq!(best.simulation, 3);
        assert_eq!(best.phi, 1.);
        assert_eq!(best.fluxes["R"], 3.);
    }

    #[test]
    fn accumulator_without_solutions() {
        let results = [SimulationResult {
            simulation: 1,
            outcome: SimulationOutcome::Missing,
        }];
        assert!(results
            .iter()
            .fold(SweepAccumulator::default(), SweepAccumulator::observe)
            .finish()
            .is_none());
        assert_eq!(results[0].phi(), f64::INFINITY);
    }

    #[test]
    fn settings_defaults() {
        let settings = MinPhiSettingsBuilder::default()
            .simulations(5usize)
            .build()
            .unwrap();
        assert_eq!(settings.biomass_reaction, "bio1_biomass");
        assert_eq!(settings.biomass_target, 0.73338);
        assert_eq!(settings.simulations, 5);
        assert_eq!(settings.flux_scale, 1000.);
        assert_eq!(settings.secondary_weight, 0.001);
    }
}
