//! Implementation of the subcommands
use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Args;
use log::{info, warn};
use phiflux_core::analysis::deletion::{single_gene_deletions, single_reaction_deletions};
use phiflux_core::analysis::fba::{fba as run_fba, pfba};
use phiflux_core::analysis::min_phi::{run_sweep, MinPhiSettingsBuilder};
use phiflux_core::analysis::protein_cost::{optimize_protein_cost, CostMode};
use phiflux_core::io::read_model;
use phiflux_core::io::spreadsheet::read_value_table;
use phiflux_core::metabolic_model::model::Model;
use phiflux_core::optimize::solvers::Solver;
use phiflux_core::report;
use phiflux_core::sampling::{self, KineticSamples, MwSource, DEFAULT_KCAT_CAP};
use phiflux_core::scenario::Scenario;
use rand::rngs::StdRng;
use rand::SeedableRng;

type CommandResult = Result<(), Box<dyn Error>>;

/// Model and scenario shared by the analyses
#[derive(Args)]
pub struct ModelArgs {
    /// SBML (.xml) or COBRA JSON (.json) model
    #[arg(short, long)]
    model: PathBuf,

    /// Scenario file with bound overrides and targets
    #[arg(short, long)]
    scenario: Option<PathBuf>,
}

impl ModelArgs {
    /// Load the model and scenario, returning the scenario and the edited model
    fn load(&self) -> Result<(Scenario, Model), Box<dyn Error>> {
        let scenario = match &self.scenario {
            Some(path) => Scenario::read(path)?,
            None => Scenario::default(),
        };
        let model = read_model(&self.model)?;
        info!(
            "Loaded model with {} reactions, {} metabolites and {} genes",
            model.reactions.len(),
            model.metabolites.len(),
            model.genes.len()
        );
        let edited = scenario.apply(&model)?;
        Ok((scenario, edited))
    }
}

#[derive(Args)]
pub struct MinPhiArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Workbook with Kcat and MW sheets
    #[arg(long)]
    samples: PathBuf,

    /// Number of simulations, overrides the scenario
    #[arg(long)]
    simulations: Option<usize>,

    /// Minimal biomass flux, overrides the scenario
    #[arg(long)]
    biomass_target: Option<f64>,

    #[arg(short, long, default_value = "optimization_results.xlsx")]
    output: PathBuf,

    /// Also write an HTML histogram of the phi values
    #[arg(long)]
    histogram: Option<PathBuf>,
}

pub fn min_phi(args: &MinPhiArgs, solver: &dyn Solver) -> CommandResult {
    let (scenario, model) = args.model.load()?;
    let samples = KineticSamples::read_workbook(&args.samples)?;

    let simulations = args.simulations.unwrap_or(scenario.simulations);
    let available = samples.num_simulations();
    if available < simulations {
        warn!(
            "{} holds {available} complete simulations, {simulations} requested",
            args.samples.display()
        );
    }

    let mut settings = MinPhiSettingsBuilder::default();
    settings
        .biomass_reaction(scenario.biomass.clone())
        .simulations(simulations);
    if let Some(target) = args.biomass_target.or(scenario.biomass_target) {
        settings.biomass_target(target);
    }
    let settings = settings.build()?;

    let sweep = run_sweep(&model, &samples, &settings, solver)?;
    report::write_sweep_report(&args.output, &sweep)?;
    if let Some(path) = &args.histogram {
        report::write_phi_histogram(path, &sweep.phi_values())?;
    }
    match &sweep.best {
        Some(best) => println!(
            "Lowest phi {} in simulation {}, results saved to {}",
            best.phi,
            best.simulation,
            args.output.display()
        ),
        None => println!(
            "No simulation reached an optimum, results saved to {}",
            args.output.display()
        ),
    }
    Ok(())
}

#[derive(Args)]
pub struct FbaArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Minimize the total flux at the optimum
    #[arg(long)]
    pfba: bool,

    /// Fraction of the optimum kept by pFBA
    #[arg(long, default_value_t = 1.0)]
    fraction_of_optimum: f64,

    /// Workbook for the flux table
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn fba(args: &FbaArgs, solver: &dyn Solver) -> CommandResult {
    let (scenario, model) = args.model.load()?;
    let solution = if args.pfba {
        pfba(&model, args.fraction_of_optimum, solver)?
    } else {
        run_fba(&model, solver)?
    };
    println!("Objective value: {}", solution.objective_value);
    if let Some(flux) = solution.fluxes.get(&scenario.biomass) {
        println!("Biomass flux: {flux}");
    }
    if let Some(path) = &args.output {
        report::write_flux_report(path, &model, &solution.fluxes, &scenario.report_metabolites)?;
    }
    Ok(())
}

#[derive(Args)]
pub struct ProteinCostArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Workbook whose first two columns are reaction id and protein cost
    #[arg(long)]
    costs: PathBuf,

    /// Sheet of the cost workbook, the first one by default
    #[arg(long)]
    sheet: Option<String>,

    /// Fix the protein cost and maximize growth
    #[arg(long, conflicts_with_all = ["lower", "upper"])]
    cost: Option<f64>,

    /// Lower end of the protein cost window
    #[arg(long)]
    lower: Option<f64>,

    /// Upper end of the protein cost window
    #[arg(long)]
    upper: Option<f64>,

    #[arg(short, long, default_value = "protein_cost.xlsx")]
    output: PathBuf,
}

/// Pick the analysis mode: a fixed cost maximizes growth, a window minimizes the cost
fn cost_mode(args: &ProteinCostArgs, scenario: &Scenario) -> CostMode {
    if let Some(cost) = args.cost {
        return CostMode::MaximizeGrowth { cost };
    }
    let (lower, upper) = match scenario.protein_cost {
        Some(window) => (window.lower, window.upper),
        None => (0., f64::INFINITY),
    };
    let (lower, upper) = (args.lower.unwrap_or(lower), args.upper.unwrap_or(upper));
    if lower == upper {
        CostMode::MaximizeGrowth { cost: lower }
    } else {
        CostMode::MinimizeCost { lower, upper }
    }
}

pub fn protein_cost(args: &ProteinCostArgs, solver: &dyn Solver) -> CommandResult {
    let (scenario, model) = args.model.load()?;
    let costs = read_value_table(&args.costs, args.sheet.as_deref())?;
    let solution = optimize_protein_cost(
        &model,
        &costs,
        &scenario.biomass,
        cost_mode(args, &scenario),
        solver,
    )?;
    println!("Total protein cost: {}", solution.total_protein_cost);
    println!("Biomass flux: {}", solution.biomass_flux);
    report::write_protein_cost_report(
        &args.output,
        &model,
        &solution,
        &scenario.report_metabolites,
    )?;
    Ok(())
}

#[derive(Args)]
pub struct DeletionArgs {
    #[command(flatten)]
    model: ModelArgs,

    #[arg(short, long, default_value = "essential_reactions.xlsx")]
    output: PathBuf,
}

pub fn essential_reactions(args: &DeletionArgs, solver: &dyn Solver) -> CommandResult {
    let (_, model) = args.model.load()?;
    let deletions = single_reaction_deletions(&model, solver)?;
    report::write_reaction_deletions(&args.output, &deletions)?;
    Ok(())
}

#[derive(Args)]
pub struct GeneDeletionArgs {
    #[command(flatten)]
    model: ModelArgs,

    #[arg(short, long, default_value = "essential_genes.xlsx")]
    output: PathBuf,

    /// Also write the essential gene ids, one per line
    #[arg(long)]
    list: Option<PathBuf>,
}

pub fn essential_genes(args: &GeneDeletionArgs, solver: &dyn Solver) -> CommandResult {
    let (_, model) = args.model.load()?;
    let deletions = single_gene_deletions(&model, solver)?;
    report::write_gene_deletions(&args.output, &deletions)?;
    if let Some(path) = &args.list {
        report::write_essential_genes(path, &deletions)?;
    }
    let essential = deletions.iter().filter(|d| d.essential).count();
    println!("{essential} of {} genes are essential", deletions.len());
    Ok(())
}

#[derive(Args)]
pub struct SampleArgs {
    /// Model whose reactions are sampled
    #[arg(short, long)]
    model: PathBuf,

    /// Text file of observed turnover numbers, one per line
    #[arg(long)]
    kcat: PathBuf,

    /// Workbook of reaction id and molecular weight, reused in every simulation
    #[arg(long, conflicts_with = "mw_pool")]
    mw: Option<PathBuf>,

    /// Text file of molecular weights to draw from
    #[arg(long)]
    mw_pool: Option<PathBuf>,

    #[arg(long, default_value_t = 100)]
    simulations: usize,

    /// Turnover numbers above this value are left out of the pool
    #[arg(long, default_value_t = DEFAULT_KCAT_CAP)]
    kcat_cap: f64,

    /// Seed for reproducible samples
    #[arg(long)]
    seed: Option<u64>,

    #[arg(short, long, default_value = "kinetic_samples.xlsx")]
    output: PathBuf,

    /// Also write an HTML plot of the kcat pool and the drawn samples
    #[arg(long)]
    plot: Option<PathBuf>,
}

fn mw_source(mw: Option<&Path>, mw_pool: Option<&Path>) -> Result<MwSource, Box<dyn Error>> {
    match (mw, mw_pool) {
        (Some(path), _) => Ok(MwSource::PerReaction(read_value_table(path, None)?)),
        (None, Some(path)) => Ok(MwSource::Pool(sampling::read_value_pool(path)?)),
        (None, None) => Err("one of --mw or --mw-pool is required".into()),
    }
}

pub fn sample(args: &SampleArgs) -> CommandResult {
    let model = read_model(&args.model)?;
    let mw = mw_source(args.mw.as_deref(), args.mw_pool.as_deref())?;
    let reactions: Vec<String> = match &mw {
        MwSource::PerReaction(weights) => model
            .reactions
            .keys()
            .filter(|rxn| weights.contains_key(*rxn))
            .cloned()
            .collect(),
        MwSource::Pool(_) => model.reactions.keys().cloned().collect(),
    };
    let kcat_pool = sampling::read_value_pool(&args.kcat)?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let samples = sampling::generate(
        &reactions,
        &kcat_pool,
        &mw,
        args.simulations,
        args.kcat_cap,
        &mut rng,
    )?;
    samples.write_workbook(&args.output)?;
    if let Some(path) = &args.plot {
        let pool = sampling::capped_pool(&kcat_pool, args.kcat_cap);
        report::write_kcat_distribution(path, &pool, &samples)?;
    }
    println!(
        "Wrote {} simulations for {} reactions to {}",
        args.simulations,
        reactions.len(),
        args.output.display()
    );
    Ok(())
}
