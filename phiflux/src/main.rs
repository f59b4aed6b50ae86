//! Command line interface for phiflux
//!
//! # Usage
//!
//! ```bash
//! # Monte-Carlo minimum protein cost sweep
//! phiflux min-phi --model iTP251_irreversible_model.xml --samples Kcat_MW.xlsx \
//!     --scenario demos/minimum_phi.json --histogram phi.html
//!
//! # Lowest protein cost flux distribution at fixed growth
//! phiflux protein-cost --model model.xml --costs kcat_mw.xlsx \
//!     --scenario demos/glucose_lowest_protein.json
//!
//! # Bootstrap kinetic samples
//! phiflux sample --model model.xml --kcat Kcat_TP.txt --mw-pool MW.txt --seed 7
//! ```
use std::error::Error;

use clap::{Parser, Subcommand};
use env_logger::Env;
use phiflux_core::configuration::{Configuration, SolverChoice};
use phiflux_core::optimize::solvers::solver_for;

mod commands;

use commands::{
    DeletionArgs, FbaArgs, GeneDeletionArgs, MinPhiArgs, ProteinCostArgs, SampleArgs,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug messages
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Solver backend, clarabel or microlp
    #[arg(long, global = true)]
    solver: Option<SolverChoice>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monte-Carlo search for the flux distribution of minimal proteome cost
    MinPhi(MinPhiArgs),
    /// Flux balance analysis, optionally parsimonious
    Fba(FbaArgs),
    /// Parsimonious FBA under a protein cost budget
    ProteinCost(ProteinCostArgs),
    /// Biomass reduction caused by knocking out each reaction
    EssentialReactions(DeletionArgs),
    /// Genes whose deletion leaves at most 10 % of wild type growth
    EssentialGenes(GeneDeletionArgs),
    /// Bootstrap turnover number and molecular weight samples
    Sample(SampleArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let solver = solver_for(cli.solver.unwrap_or(Configuration::current().solver))?;
    match &cli.command {
        Commands::MinPhi(args) => commands::min_phi(args, solver.as_ref()),
        Commands::Fba(args) => commands::fba(args, solver.as_ref()),
        Commands::ProteinCost(args) => commands::protein_cost(args, solver.as_ref()),
        Commands::EssentialReactions(args) => commands::essential_reactions(args, solver.as_ref()),
        Commands::EssentialGenes(args) => commands::essential_genes(args, solver.as_ref()),
        Commands::Sample(args) => commands::sample(args),
    }
}
