//! Writing analysis results to workbooks and plots
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::info;
use plotly::histogram::HistNorm;
use plotly::layout::{Axis, BarMode};
use plotly::{Histogram, Layout, Plot};
use rust_xlsxwriter::Workbook;
use thiserror::Error;

use crate::analysis::deletion::{GeneDeletion, ReactionDeletion};
use crate::analysis::min_phi::SweepReport;
use crate::analysis::protein_cost::ProteinCostSolution;
use crate::io::spreadsheet::{
    add_sheet, read_indexed_sheet, write_float, write_text, write_value_sheet, SpreadsheetError,
};
use crate::metabolic_model::model::{Model, ModelError};
use crate::sampling::KineticSamples;

pub const PHI_SHEET: &str = "Phi Values";
const PHI_HEADER: [&str; 2] = ["Simulation", "Phi Value"];
const FLUX_HEADER: [&str; 2] = ["Reaction ID", "Flux"];
pub const FLUX_SHEET: &str = "Reactions Flux";
const HISTOGRAM_BINS: usize = 20;

/// Name of the sheet holding the fluxes of the best simulation
pub fn optimal_flux_sheet(simulation: usize) -> String {
    format!("Optimal Fluxes Sim {simulation}")
}

fn save(mut workbook: Workbook, path: &Path) -> Result<(), ReportError> {
    workbook.save(path).map_err(SpreadsheetError::from)?;
    info!("Wrote {}", path.display());
    Ok(())
}

// region Minimum Phi
/// Write Φ of every simulation, and the fluxes of the best one when there is one
pub fn write_sweep_report<P: AsRef<Path>>(path: P, report: &SweepReport) -> Result<(), ReportError> {
    let mut workbook = Workbook::new();
    let sheet = add_sheet(&mut workbook, PHI_SHEET, &PHI_HEADER)?;
    for (row, (simulation, phi)) in report.phi_values().into_iter().enumerate() {
        write_float(sheet, row + 1, 0, simulation as f64)?;
        write_float(sheet, row + 1, 1, phi)?;
    }
    if let Some(best) = &report.best {
        write_value_sheet(
            &mut workbook,
            &optimal_flux_sheet(best.simulation),
            FLUX_HEADER,
            &best.fluxes,
        )?;
    }
    save(workbook, path.as_ref())
}

/// Read back the (simulation, Φ) pairs of a sweep report
pub fn read_phi_values<P: AsRef<Path>>(path: P) -> Result<Vec<(usize, f64)>, ReportError> {
    let table = read_indexed_sheet(path, PHI_SHEET)?;
    let column = table
        .column_index(PHI_HEADER[1])
        .ok_or_else(|| ReportError::MissingColumn(PHI_HEADER[1].to_string()))?;
    table
        .rows
        .iter()
        .map(|(simulation, values)| {
            let simulation = simulation
                .parse::<usize>()
                .map_err(|_| ReportError::InvalidSimulation(simulation.clone()))?;
            Ok((simulation, values[column].unwrap_or(f64::INFINITY)))
        })
        .collect()
}

/// Write an HTML histogram of the finite Φ values, returning how many were plotted
pub fn write_phi_histogram<P: AsRef<Path>>(
    path: P,
    phi_values: &[(usize, f64)],
) -> Result<usize, ReportError> {
    let finite: Vec<f64> = phi_values
        .iter()
        .map(|(_, phi)| *phi)
        .filter(|phi| phi.is_finite())
        .collect();
    let plotted = finite.len();

    let mut plot = Plot::new();
    plot.add_trace(Histogram::new(finite).n_bins_x(HISTOGRAM_BINS).name("Phi"));
    plot.set_layout(
        Layout::new()
            .title(format!(
                "Distribution of Phi Values Across {} Simulations",
                phi_values.len()
            ))
            .x_axis(Axis::new().title("Phi Value"))
            .y_axis(Axis::new().title("Frequency")),
    );
    fs::write(path.as_ref(), plot.to_html())?;
    info!("Wrote histogram of {plotted} phi values to {}", path.as_ref().display());
    Ok(plotted)
}
// endregion Minimum Phi

// region Kinetic Samples
/// Write an HTML plot of the kcat pool density with each simulation's draws overlaid
///
/// Returns the number of traces, one for the pool and one per simulation.
pub fn write_kcat_distribution<P: AsRef<Path>>(
    path: P,
    pool: &[f64],
    samples: &KineticSamples,
) -> Result<usize, ReportError> {
    let mut plot = Plot::new();
    plot.add_trace(
        Histogram::new(pool.to_vec())
            .name("Observed kcat")
            .hist_norm(HistNorm::ProbabilityDensity)
            .n_bins_x(HISTOGRAM_BINS),
    );
    let draws = samples.kcat_draws();
    for (column, values) in &draws {
        plot.add_trace(
            Histogram::new(values.clone())
                .name(column.trim_end_matches(':'))
                .hist_norm(HistNorm::ProbabilityDensity)
                .n_bins_x(HISTOGRAM_BINS)
                .opacity(0.3)
                .show_legend(false),
        );
    }
    plot.set_layout(
        Layout::new()
            .title("Kcat Distribution and Monte Carlo Samples")
            .bar_mode(BarMode::Overlay)
            .x_axis(Axis::new().title("Kcat (1/s)"))
            .y_axis(Axis::new().title("Density")),
    );
    fs::write(path.as_ref(), plot.to_html())?;
    info!("Wrote kcat distribution plot to {}", path.as_ref().display());
    Ok(draws.len() + 1)
}
// endregion Kinetic Samples

// region Fluxes
/// Name of the sheet listing the reactions producing `metabolite`
pub fn producer_sheet(metabolite: &str) -> String {
    format!("Producers {metabolite}")
}

fn write_flux_sheets(
    workbook: &mut Workbook,
    model: &Model,
    fluxes: &IndexMap<String, f64>,
    metabolites: &[String],
) -> Result<(), ReportError> {
    write_value_sheet(workbook, FLUX_SHEET, FLUX_HEADER, fluxes)?;
    for met in metabolites {
        let producers: IndexMap<String, f64> = model
            .producing_reactions(met)?
            .into_iter()
            .map(|rxn| (rxn.id.clone(), fluxes.get(&rxn.id).copied().unwrap_or(0.)))
            .collect();
        write_value_sheet(workbook, &producer_sheet(met), FLUX_HEADER, &producers)?;
    }
    Ok(())
}

/// Write a flux table, and for each of `metabolites` the fluxes of the reactions producing it
pub fn write_flux_report<P: AsRef<Path>>(
    path: P,
    model: &Model,
    fluxes: &IndexMap<String, f64>,
    metabolites: &[String],
) -> Result<(), ReportError> {
    let mut workbook = Workbook::new();
    write_flux_sheets(&mut workbook, model, fluxes, metabolites)?;
    save(workbook, path.as_ref())
}

/// Like [`write_flux_report`], with a leading summary sheet of total protein cost and biomass
/// flux
pub fn write_protein_cost_report<P: AsRef<Path>>(
    path: P,
    model: &Model,
    solution: &ProteinCostSolution,
    metabolites: &[String],
) -> Result<(), ReportError> {
    let mut workbook = Workbook::new();
    let sheet = add_sheet(&mut workbook, "Summary", &["Quantity", "Value"])?;
    write_text(sheet, 1, 0, "Total protein cost")?;
    write_float(sheet, 1, 1, solution.total_protein_cost)?;
    write_text(sheet, 2, 0, "Biomass flux")?;
    write_float(sheet, 2, 1, solution.biomass_flux)?;
    write_text(sheet, 3, 0, "Status")?;
    write_text(sheet, 3, 1, &solution.status.to_string())?;
    write_flux_sheets(&mut workbook, model, &solution.fluxes, metabolites)?;
    save(workbook, path.as_ref())
}
// endregion Fluxes

// region Deletions
pub fn write_reaction_deletions<P: AsRef<Path>>(
    path: P,
    deletions: &[ReactionDeletion],
) -> Result<(), ReportError> {
    let mut workbook = Workbook::new();
    let sheet = add_sheet(
        &mut workbook,
        "Reaction Deletions",
        &["Reaction", "Biomass Reduction (%)", "Enzyme"],
    )?;
    for (idx, deletion) in deletions.iter().enumerate() {
        let row = idx + 1;
        write_text(sheet, row, 0, &deletion.reaction)?;
        write_float(sheet, row, 1, deletion.reduction_percent)?;
        write_text(sheet, row, 2, deletion.name.as_deref().unwrap_or(""))?;
    }
    save(workbook, path.as_ref())
}

pub fn write_gene_deletions<P: AsRef<Path>>(
    path: P,
    deletions: &[GeneDeletion],
) -> Result<(), ReportError> {
    let mut workbook = Workbook::new();
    let sheet = add_sheet(
        &mut workbook,
        "Gene Deletions",
        &["Gene", "Growth Ratio", "Essential", "Knocked Out Reactions"],
    )?;
    for (idx, deletion) in deletions.iter().enumerate() {
        let row = idx + 1;
        write_text(sheet, row, 0, &deletion.gene)?;
        write_float(sheet, row, 1, deletion.growth_ratio)?;
        write_text(sheet, row, 2, if deletion.essential { "yes" } else { "no" })?;
        write_text(sheet, row, 3, &deletion.knocked_out.join(", "))?;
    }
    save(workbook, path.as_ref())
}

/// Write the ids of the essential genes, one per line
pub fn write_essential_genes<P: AsRef<Path>>(
    path: P,
    deletions: &[GeneDeletion],
) -> Result<(), ReportError> {
    let content: String = deletions
        .iter()
        .filter(|d| d.essential)
        .map(|d| format!("{}\n", d.gene))
        .collect();
    fs::write(path.as_ref(), content)?;
    Ok(())
}
// endregion Deletions

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),
    #[error("Unable to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Report has no column {0}")]
    MissingColumn(String),
    #[error("{0} is not a simulation number")]
    InvalidSimulation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::min_phi::{BestSimulation, SimulationOutcome, SimulationResult};
    use crate::io::spreadsheet::read_value_table;
    use crate::optimize::OptimizationStatus;

    fn report() -> SweepReport {
        let fluxes: IndexMap<String, f64> =
            [("R1".to_string(), 1.5), ("R2".to_string(), 0.)].into_iter().collect();
        SweepReport {
            results: vec![
                SimulationResult {
                    simulation: 1,
                    outcome: SimulationOutcome::Solved {
                        phi: 0.25,
                        fluxes: fluxes.clone(),
                    },
                },
                SimulationResult {
                    simulation: 2,
                    outcome: SimulationOutcome::Failed {
                        status: OptimizationStatus::Infeasible,
                    },
                },
            ],
            best: Some(BestSimulation {
                simulation: 1,
                phi: 0.25,
                fluxes,
            }),
        }
    }

    #[test]
    fn sweep_report_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.xlsx");
        write_sweep_report(&path, &report()).unwrap();

        let phi = read_phi_values(&path).unwrap();
        assert_eq!(phi, vec![(1, 0.25), (2, f64::INFINITY)]);
        let fluxes = read_value_table(&path, Some(optimal_flux_sheet(1).as_str())).unwrap();
        assert_eq!(fluxes["R1"], 1.5);
        assert_eq!(fluxes.len(), 2);
    }

    #[test]
    fn no_flux_sheet_without_best() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.xlsx");
        let mut report = report();
        report.best = None;
        write_sweep_report(&path, &report).unwrap();
        assert!(read_value_table(&path, Some(optimal_flux_sheet(1).as_str())).is_err());
    }

    #[test]
    fn histogram_skips_infinite_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phi.html");
        let plotted =
            write_phi_histogram(&path, &[(1, 0.5), (2, f64::INFINITY), (3, 0.7)]).unwrap();
        assert_eq!(plotted, 2);
        assert!(fs::read_to_string(&path).unwrap().contains("Phi Value"));
    }

    #[test]
    fn kcat_plot_has_a_trace_per_simulation() {
        use crate::sampling::{generate, MwSource};
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let reactions = vec!["R1".to_string(), "R2".to_string()];
        let pool = [1., 5., 20.];
        let mut rng = StdRng::seed_from_u64(3);
        let samples =
            generate(&reactions, &pool, &MwSource::Pool(vec![30.]), 4, 100., &mut rng).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kcat.html");
        let traces = write_kcat_distribution(&path, &pool, &samples).unwrap();
        assert_eq!(traces, 5);
        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("Observed kcat"));
        assert!(html.contains("Simulation 4"));
    }

    #[test]
    fn essential_gene_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("essential_genes.txt");
        let gene = |id: &str, essential| GeneDeletion {
            gene: id.to_string(),
            knocked_out: vec![],
            objective_value: None,
            growth_ratio: 0.,
            essential,
        };
        write_essential_genes(&path, &[gene("g1", true), gene("g2", false), gene("g3", true)])
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "g1\ng3\n");
    }
}
