//! Per simulation kinetic samples (turnover numbers and molecular weights)
//!
//! Samples live in a workbook with a `Kcat` and a `MW` sheet. Both sheets are indexed by
//! reaction id and have one column per simulation, headed `Simulation {n}:`. The cost of a unit
//! of flux through a reaction in a simulation is MW / kcat.
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use rust_xlsxwriter::Workbook;
use thiserror::Error;

use crate::io::spreadsheet::{
    read_indexed_sheet, write_indexed_sheet, IndexedTable, SpreadsheetError,
};

pub const KCAT_SHEET: &str = "Kcat";
pub const MW_SHEET: &str = "MW";
/// Turnover numbers above this value (1/s) are dropped from a sampling pool
pub const DEFAULT_KCAT_CAP: f64 = 100.;

const INDEX_HEADER: &str = "Reaction";

/// Header of the column holding the samples of simulation `n`
pub fn simulation_column(n: usize) -> String {
    format!("Simulation {n}:")
}

/// Anything able to provide the per reaction cost coefficients of a simulation
pub trait CostSource {
    /// Cost coefficients keyed by reaction id, None when the simulation has no samples
    fn costs(&self, simulation: usize) -> Option<IndexMap<String, f64>>;
}

impl CostSource for IndexMap<usize, IndexMap<String, f64>> {
    fn costs(&self, simulation: usize) -> Option<IndexMap<String, f64>> {
        self.get(&simulation).cloned()
    }
}

/// Turnover number and molecular weight tables
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KineticSamples {
    pub kcat: IndexedTable,
    pub mw: IndexedTable,
}

impl KineticSamples {
    /// Read the `Kcat` and `MW` sheets of a workbook
    pub fn read_workbook<P: AsRef<Path>>(path: P) -> Result<KineticSamples, SamplingError> {
        let kcat = read_indexed_sheet(&path, KCAT_SHEET)?;
        let mw = read_indexed_sheet(&path, MW_SHEET)?;
        debug!(
            "Read {} kcat and {} MW rows from {}",
            kcat.rows.len(),
            mw.rows.len(),
            path.as_ref().display()
        );
        Ok(KineticSamples { kcat, mw })
    }

    pub fn write_workbook<P: AsRef<Path>>(&self, path: P) -> Result<(), SamplingError> {
        let mut workbook = Workbook::new();
        write_indexed_sheet(&mut workbook, KCAT_SHEET, &self.kcat)?;
        write_indexed_sheet(&mut workbook, MW_SHEET, &self.mw)?;
        workbook
            .save(path.as_ref())
            .map_err(SpreadsheetError::from)?;
        Ok(())
    }

    /// Number of simulation columns present in both sheets
    pub fn num_simulations(&self) -> usize {
        self.kcat
            .columns
            .iter()
            .filter(|c| self.mw.column_index(c).is_some())
            .count()
    }

    /// The drawn turnover numbers of each simulation column, in column order
    pub fn kcat_draws(&self) -> Vec<(String, Vec<f64>)> {
        self.kcat
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let values = self.kcat.rows.values().filter_map(|row| row[idx]).collect();
                (column.clone(), values)
            })
            .collect()
    }

    /// Cost coefficients MW / kcat of a simulation
    ///
    /// Only reactions with values in both sheets are kept. Entries with a non-positive kcat
    /// or a non-finite ratio are dropped with a warning. None when either sheet lacks the
    /// simulation column.
    pub fn cost_coefficients(&self, simulation: usize) -> Option<IndexMap<String, f64>> {
        let column = simulation_column(simulation);
        let kcat = self.kcat.column(&column)?;
        let mw = self.mw.column(&column)?;
        let mut costs = IndexMap::new();
        for (rxn, kcat) in kcat {
            let Some(mw) = mw.get(&rxn) else { continue };
            let cost = mw / kcat;
            if kcat <= 0. || !cost.is_finite() {
                warn!("Dropping cost of {rxn} in simulation {simulation}: kcat {kcat}, MW {mw}");
                continue;
            }
            costs.insert(rxn, cost);
        }
        Some(costs)
    }
}

impl CostSource for KineticSamples {
    fn costs(&self, simulation: usize) -> Option<IndexMap<String, f64>> {
        self.cost_coefficients(simulation)
    }
}

// region Generation
/// Where the molecular weights of generated samples come from
#[derive(Clone, Debug, PartialEq)]
pub enum MwSource {
    /// A fixed molecular weight per reaction, repeated in every simulation
    PerReaction(IndexMap<String, f64>),
    /// Values drawn with replacement, independently for each reaction and simulation
    Pool(Vec<f64>),
}

/// Read a pool of observed values, one per line, ignoring blank lines
pub fn read_value_pool<P: AsRef<Path>>(path: P) -> Result<Vec<f64>, SamplingError> {
    let content = fs::read_to_string(&path)?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            line.trim()
                .parse::<f64>()
                .map_err(|_| SamplingError::InvalidPoolValue {
                    line: idx + 1,
                    value: line.trim().to_string(),
                })
        })
        .collect()
}

/// The positive turnover numbers of `pool` not above `kcat_cap`
pub fn capped_pool(pool: &[f64], kcat_cap: f64) -> Vec<f64> {
    pool.iter()
        .copied()
        .filter(|k| *k > 0. && *k <= kcat_cap)
        .collect()
}

/// Bootstrap kinetic samples for `reactions`
///
/// Turnover numbers above `kcat_cap`, and non-positive ones, are removed from the pool before
/// drawing. Each simulation draws one kcat per reaction with replacement.
pub fn generate<R: Rng + ?Sized>(
    reactions: &[String],
    kcat_pool: &[f64],
    mw: &MwSource,
    simulations: usize,
    kcat_cap: f64,
    rng: &mut R,
) -> Result<KineticSamples, SamplingError> {
    let kcat_pool = capped_pool(kcat_pool, kcat_cap);
    if kcat_pool.is_empty() {
        return Err(SamplingError::EmptyPool(format!("kcat values <= {kcat_cap}")));
    }
    if let MwSource::Pool(pool) = mw {
        if pool.is_empty() {
            return Err(SamplingError::EmptyPool("MW values".to_string()));
        }
    }

    let columns: Vec<String> = (1..=simulations).map(simulation_column).collect();
    let mut kcat = IndexedTable::new(INDEX_HEADER, columns.clone());
    let mut mw_table = IndexedTable::new(INDEX_HEADER, columns);
    for rxn in reactions {
        let kcats = (0..simulations)
            .map(|_| kcat_pool.choose(rng).copied())
            .collect();
        kcat.insert_row(rxn, kcats);
        let weights = match mw {
            MwSource::PerReaction(weights) => match weights.get(rxn) {
                Some(weight) => vec![Some(*weight); simulations],
                None => {
                    warn!("No molecular weight for {rxn}, leaving its MW samples empty");
                    vec![None; simulations]
                }
            },
            MwSource::Pool(pool) => (0..simulations)
                .map(|_| pool.choose(rng).copied())
                .collect(),
        };
        mw_table.insert_row(rxn, weights);
    }
    Ok(KineticSamples {
        kcat,
        mw: mw_table,
    })
}
// endregion Generation

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),
    #[error("Unable to read value pool: {0}")]
    Io(#[from] std::io::Error),
    #[error("Line {line} of the value pool is not a number: {value}")]
    InvalidPoolValue { line: usize, value: String },
    #[error("Nothing left to sample from: {0}")]
    EmptyPool(String),
}
