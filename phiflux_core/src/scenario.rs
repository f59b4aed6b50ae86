//! Analysis scenarios: the bound edits and targets for a run, read from a JSON document
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bounds::BoundOverride;
use crate::metabolic_model::model::{Model, ModelError};

/// Default number of Monte-Carlo simulations in a sweep
pub const DEFAULT_SIMULATIONS: usize = 100;

/// Settings for a single analysis run
///
/// # Example
/// ```rust
/// use phiflux_core::scenario::Scenario;
/// let scenario: Scenario = r#"{
///     "bounds": [{"reactions": ["EX_cpd00027_e0_b"], "lower": 0.75, "upper": 0.75}],
///     "biomass": "bio1_biomass",
///     "biomass_target": 0.0231
/// }"#.parse().unwrap();
/// assert_eq!(scenario.simulations, 100);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Free text name of the scenario
    #[serde(default)]
    pub name: Option<String>,
    /// Bound overrides, applied in order
    #[serde(default)]
    pub bounds: Vec<BoundOverride>,
    /// Id of the biomass reaction
    #[serde(default = "default_biomass")]
    pub biomass: String,
    /// Flux the biomass reaction has to reach in the minimum protein cost problems
    #[serde(default)]
    pub biomass_target: Option<f64>,
    /// Window on the total protein cost for the protein cost constrained analyses
    #[serde(default)]
    pub protein_cost: Option<CostWindow>,
    /// Number of Monte-Carlo simulations to sweep
    #[serde(default = "default_simulations")]
    pub simulations: usize,
    /// Metabolites for which to report the producing reactions
    #[serde(default)]
    pub report_metabolites: Vec<String>,
}

/// Allowed range of the total protein cost
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostWindow {
    pub lower: f64,
    pub upper: f64,
}

fn default_biomass() -> String {
    "bio1_biomass".to_string()
}

fn default_simulations() -> usize {
    DEFAULT_SIMULATIONS
}

impl Default for Scenario {
    fn default() -> Self {
        Scenario {
            name: None,
            bounds: Vec::new(),
            biomass: default_biomass(),
            biomass_target: None,
            protein_cost: None,
            simulations: DEFAULT_SIMULATIONS,
            report_metabolites: Vec::new(),
        }
    }
}

impl Scenario {
    /// Read a scenario from a JSON file
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Scenario, ScenarioError> {
        let data = fs::read_to_string(path)?;
        data.parse()
    }

    /// Apply the scenario's bound overrides to a copy of `model`, and check that the biomass
    /// reaction exists
    pub fn apply(&self, model: &Model) -> Result<Model, ModelError> {
        let edited = model.with_overrides(&self.bounds)?;
        edited.reaction(&self.biomass)?;
        Ok(edited)
    }
}

impl FromStr for Scenario {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let scenario: Scenario = serde_json::from_str(s)?;
        if let Some(window) = scenario.protein_cost {
            if window.lower > window.upper {
                return Err(ScenarioError::InvalidCostWindow(window.lower, window.upper));
            }
        }
        Ok(scenario)
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Unable to read scenario file: {0}")]
    UnableToRead(#[from] std::io::Error),
    #[error("Unable to parse scenario: {0}")]
    UnableToParse(#[from] serde_json::Error),
    #[error("Protein cost window has lower {0} > upper {1}")]
    InvalidCostWindow(f64, f64),
}
