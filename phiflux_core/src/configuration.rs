//! Crate wide defaults used when building models and solving problems
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::{LazyLock, RwLock};

use serde::{Deserialize, Serialize};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Default values for reaction bounds and solver settings
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    /// Lower bound given to reactions which don't declare one
    pub lower_bound: f64,
    /// Upper bound given to reactions which don't declare one
    pub upper_bound: f64,
    /// Feasibility and optimality tolerance handed to the solver
    pub tolerance: f64,
    /// Solver used when none is requested explicitly
    pub solver: SolverChoice,
    /// Largest flux a single reaction may carry in the proteome cost problems
    pub flux_cap: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-07,
            solver: SolverChoice::Clarabel,
            flux_cap: 1000.,
        }
    }
}

impl Configuration {
    /// Snapshot of the current global configuration
    ///
    /// A poisoned lock still holds a usable configuration, so its contents are returned
    /// rather than propagating the poison.
    pub fn current() -> Configuration {
        match CONFIGURATION.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the global configuration
    pub fn set_global(configuration: Configuration) {
        match CONFIGURATION.write() {
            Ok(mut config) => *config = configuration,
            Err(poisoned) => *poisoned.into_inner() = configuration,
        }
    }
}

/// Enum used to specify the solver backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverChoice {
    /// Use the Clarabel interior point solver
    #[default]
    Clarabel,
    /// Use the microlp simplex solver, requires the microlp feature to be enabled
    Microlp,
}

impl Display for SolverChoice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverChoice::Clarabel => write!(f, "clarabel"),
            SolverChoice::Microlp => write!(f, "microlp"),
        }
    }
}

impl FromStr for SolverChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clarabel" => Ok(SolverChoice::Clarabel),
            "microlp" | "minilp" => Ok(SolverChoice::Microlp),
            other => Err(format!("unknown solver '{other}', expected clarabel or microlp")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_choice_parsing() {
        assert_eq!("Clarabel".parse::<SolverChoice>().unwrap(), SolverChoice::Clarabel);
        assert_eq!("microlp".parse::<SolverChoice>().unwrap(), SolverChoice::Microlp);
        assert!("gurobi".parse::<SolverChoice>().is_err());
    }

    #[test]
    fn default_bounds() {
        let config = Configuration::default();
        assert!(config.lower_bound < 0.);
        assert!(config.upper_bound > 0.);
        assert_eq!(config.flux_cap, 1000.);
    }
}
