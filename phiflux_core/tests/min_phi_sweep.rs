use approx::assert_relative_eq;
use indexmap::IndexMap;
use phiflux_core::analysis::min_phi::{
    run_sweep, MinPhiSettings, MinPhiSettingsBuilder, SimulationOutcome,
};
use phiflux_core::bounds::BoundOverride;
use phiflux_core::io::spreadsheet::IndexedTable;
use phiflux_core::metabolic_model::model::{Model, ModelError};
use phiflux_core::metabolic_model::reaction::ReactionBuilder;
use phiflux_core::optimize::solvers::clarabel::ClarabelSolver;
use phiflux_core::optimize::OptimizationStatus;
use phiflux_core::report::{read_phi_values, write_sweep_report};
use phiflux_core::sampling::{simulation_column, KineticSamples};

fn reaction(model: &mut Model, id: &str, stoich: &[(&str, f64)]) {
    model.add_reaction(
        ReactionBuilder::default()
            .id(id.to_string())
            .metabolites(stoich.iter().map(|(m, c)| (m.to_string(), *c)).collect())
            .lower_bound(0.)
            .upper_bound(1000.)
            .build()
            .unwrap(),
    );
}

/// A_e -> A -> B -> biomass, with A_e a boundary metabolite
fn pathway() -> Model {
    let mut model = Model::new_empty();
    reaction(&mut model, "EX_A", &[("A_e", -1.), ("A", 1.)]);
    reaction(&mut model, "R_AB", &[("A", -1.), ("B", 1.)]);
    reaction(&mut model, "bio1_biomass", &[("B", -1.)]);
    model.metabolites.get_mut("A_e").unwrap().boundary = true;
    model
}

/// Kinetic samples for R_AB, kcat and MW per simulation, None leaves the column out
fn samples(values: &[Option<(f64, f64)>]) -> KineticSamples {
    let present: Vec<(usize, (f64, f64))> = values
        .iter()
        .enumerate()
        .filter_map(|(idx, v)| v.map(|v| (idx + 1, v)))
        .collect();
    let columns: Vec<String> = present.iter().map(|(n, _)| simulation_column(*n)).collect();
    let mut kcat = IndexedTable::new("Reaction", columns.clone());
    let mut mw = IndexedTable::new("Reaction", columns);
    kcat.insert_row("R_AB", present.iter().map(|(_, (k, _))| Some(*k)).collect());
    mw.insert_row("R_AB", present.iter().map(|(_, (_, m))| Some(*m)).collect());
    KineticSamples { kcat, mw }
}

fn settings(simulations: usize, target: f64) -> MinPhiSettings {
    MinPhiSettingsBuilder::default()
        .simulations(simulations)
        .biomass_target(target)
        .build()
        .unwrap()
}

#[test]
fn single_pathway_phi() {
    let report = run_sweep(
        &pathway(),
        &samples(&[Some((5., 10.))]),
        &settings(1, 1.),
        &ClarabelSolver::default(),
    )
    .unwrap();
    // cost 10 / 5 = 2 on one unit of flux, plus 0.001 per unit over three reactions
    let best = report.best.unwrap();
    assert_eq!(best.simulation, 1);
    assert_relative_eq!(best.phi, 0.002003, epsilon = 1e-6);
    for flux in best.fluxes.values() {
        assert_relative_eq!(*flux, 1., epsilon = 1e-4);
    }
}

#[test]
fn steady_state_and_biomass_target_hold() {
    let model = pathway();
    let report = run_sweep(
        &model,
        &samples(&[Some((5., 10.)), Some((1., 3.))]),
        &settings(2, 0.73338),
        &ClarabelSolver::default(),
    )
    .unwrap();
    for result in &report.results {
        let SimulationOutcome::Solved { fluxes, .. } = &result.outcome else {
            panic!("simulation {} was not solved", result.simulation);
        };
        assert!(model.mass_balance_residual(fluxes).amax() < 1e-5);
        assert!(fluxes["bio1_biomass"] >= 0.73338 - 1e-6);
        assert!(fluxes.values().all(|v| *v >= -1e-6 && *v <= 1000. + 1e-6));
    }
}

#[test]
fn ties_keep_the_first_simulation() {
    let report = run_sweep(
        &pathway(),
        &samples(&[Some((1., 30.)), Some((5., 10.)), Some((10., 20.))]),
        &settings(3, 1.),
        &ClarabelSolver::default(),
    )
    .unwrap();
    let phi: Vec<f64> = report.phi_values().iter().map(|(_, phi)| *phi).collect();
    assert_relative_eq!(phi[1], phi[2], epsilon = 1e-9);
    assert!(phi[0] > phi[1]);
    assert_eq!(report.best.unwrap().simulation, 2);
}

#[test]
fn missing_samples_are_recorded() {
    let report = run_sweep(
        &pathway(),
        &samples(&[Some((5., 10.)), None, Some((10., 10.))]),
        &settings(3, 1.),
        &ClarabelSolver::default(),
    )
    .unwrap();
    assert_eq!(report.results.len(), 3);
    assert_eq!(report.results[1].outcome, SimulationOutcome::Missing);
    assert_eq!(report.results[1].phi(), f64::INFINITY);
    assert_eq!(report.best.unwrap().simulation, 3);
}

#[test]
fn infeasible_target_gives_infinite_phi() {
    let report = run_sweep(
        &pathway(),
        &samples(&[Some((5., 10.)), Some((1., 1.))]),
        &settings(2, 2000.),
        &ClarabelSolver::default(),
    )
    .unwrap();
    assert!(report.best.is_none());
    for result in &report.results {
        assert_eq!(result.phi(), f64::INFINITY);
        assert!(matches!(
            result.outcome,
            SimulationOutcome::Failed {
                status: OptimizationStatus::Infeasible
            }
        ));
    }
}

#[test]
fn sweep_is_idempotent_and_leaves_the_model_untouched() {
    let base = pathway();
    let model = base
        .with_overrides(&[BoundOverride::upper_only(&["EX_A"], 10.)])
        .unwrap();
    let samples = samples(&[Some((5., 10.)), Some((2., 10.))]);
    let settings = settings(2, 1.);
    let first = run_sweep(&model, &samples, &settings, &ClarabelSolver::default()).unwrap();
    let second = run_sweep(&model, &samples, &settings, &ClarabelSolver::default()).unwrap();
    assert_eq!(first.phi_values(), second.phi_values());
    assert_eq!(
        first.best.as_ref().map(|b| b.simulation),
        second.best.as_ref().map(|b| b.simulation)
    );
    assert_eq!(base.reactions["EX_A"].upper_bound, 1000.);
    assert_eq!(base, pathway());
}

#[test]
fn missing_biomass_reaction_is_fatal() {
    let mut settings = settings(1, 1.);
    settings.biomass_reaction = "growth".to_string();
    let result = run_sweep(
        &pathway(),
        &samples(&[Some((5., 10.))]),
        &settings,
        &ClarabelSolver::default(),
    );
    assert!(matches!(
        result,
        Err(phiflux_core::analysis::AnalysisError::Model(
            ModelError::ReactionNotFound(_)
        ))
    ));
}

#[test]
fn costs_for_unknown_reactions_are_ignored() {
    let mut costs: IndexMap<usize, IndexMap<String, f64>> = IndexMap::new();
    costs.insert(
        1,
        [("R_AB".to_string(), 2.), ("not_in_model".to_string(), 50.)]
            .into_iter()
            .collect(),
    );
    let report = run_sweep(&pathway(), &costs, &settings(1, 1.), &ClarabelSolver::default())
        .unwrap();
    assert_relative_eq!(report.best.unwrap().phi, 0.002003, epsilon = 1e-6);
}

#[test]
fn report_round_trip() {
    let report = run_sweep(
        &pathway(),
        &samples(&[Some((5., 10.)), None]),
        &settings(2, 1.),
        &ClarabelSolver::default(),
    )
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("optimization_results.xlsx");
    write_sweep_report(&path, &report).unwrap();
    let phi = read_phi_values(&path).unwrap();
    assert_eq!(phi.len(), 2);
    assert_relative_eq!(phi[0].1, 0.002003, epsilon = 1e-6);
    assert_eq!(phi[1], (2, f64::INFINITY));
}

/// R1: A -> B, R2: B -> C, R3 drains C at exactly one unit
fn pinned_sink() -> Model {
    let mut model = Model::new_empty();
    reaction(&mut model, "R1", &[("A", -1.), ("B", 1.)]);
    reaction(&mut model, "R2", &[("B", -1.), ("C", 1.)]);
    reaction(&mut model, "R3", &[("C", -1.)]);
    model.metabolites.get_mut("A").unwrap().boundary = true;
    let sink = model.reactions.get_mut("R3").unwrap();
    sink.lower_bound = 1.;
    sink.upper_bound = 1.;
    model
}

#[test]
fn pinned_sink_gives_unit_fluxes_and_exact_report() {
    let costs: IndexMap<String, f64> = [("R1", 1.), ("R2", 1.), ("R3", 0.)]
        .into_iter()
        .map(|(r, c)| (r.to_string(), c))
        .collect();
    let per_simulation: IndexMap<usize, IndexMap<String, f64>> =
        (1..=5).map(|n| (n, costs.clone())).collect();
    let mut settings = settings(5, 0.73338);
    settings.biomass_reaction = "R3".to_string();

    let report = run_sweep(
        &pinned_sink(),
        &per_simulation,
        &settings,
        &ClarabelSolver::default(),
    )
    .unwrap();

    let best = report.best.as_ref().unwrap();
    assert_eq!(best.simulation, 1);
    assert_relative_eq!(best.phi, 0.002003, epsilon = 1e-6);
    for rxn in ["R1", "R2", "R3"] {
        assert_relative_eq!(best.fluxes[rxn], 1., epsilon = 1e-5);
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("optimization_results.xlsx");
    write_sweep_report(&path, &report).unwrap();
    assert_eq!(read_phi_values(&path).unwrap(), report.phi_values());
}
