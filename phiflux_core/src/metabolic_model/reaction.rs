//! This module provides a struct for representing reactions
use derive_builder::Builder;
use indexmap::IndexMap;

use crate::configuration::Configuration;
use crate::metabolic_model::gene::{GeneActivity, Gpr};
use crate::utils::hashing::hash_as_hex_string;

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Metabolite stoichiometry of the reaction, negative for consumed metabolites
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Gene Protein Reaction rule to determine if reaction is active
    #[builder(default = "None")]
    pub gpr: Option<Gpr>,
    /// Lower flux bound
    #[builder(default = "Configuration::current().lower_bound")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "Configuration::current().upper_bound")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Notes about the reaction
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Reaction Annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
    /// Reaction Activity
    #[builder(default = "ReactionActivity::Active")]
    pub activity: ReactionActivity,
}

impl Reaction {
    /// Determine the id to be associated with the forward reaction in the optimization problem
    ///
    /// # Note:
    /// The forward id is the reaction id itself
    pub fn get_forward_id(&self) -> String {
        self.id.clone()
    }

    /// Determine the id to be associated with the reverse reaction in the optimization problem
    ///
    /// # Note:
    /// The reverse id is "{reaction_id}_reverse_{hexidecimal hash of reaction_id}"
    pub fn get_reverse_id(&self) -> String {
        format!("{}_reverse_{}", &self.id, hash_as_hex_string(&self.id))
    }

    /// Set the reaction inactive, it can no longer carry flux in either direction
    pub fn knock_out(&mut self) {
        self.activity = ReactionActivity::Inactive;
    }

    /// Whether the reaction can carry flux in the reverse direction
    pub fn is_reversible(&self) -> bool {
        self.lower_bound < 0.
    }

    /// Stoichiometric coefficient of `metabolite`, zero if it doesn't take part
    pub fn coefficient(&self, metabolite: &str) -> f64 {
        self.metabolites.get(metabolite).copied().unwrap_or(0.)
    }

    /// Metabolites with a positive coefficient
    pub fn products(&self) -> impl Iterator<Item = &String> {
        self.metabolites
            .iter()
            .filter(|(_, coef)| **coef > 0.)
            .map(|(id, _)| id)
    }

    /// Metabolites with a negative coefficient
    pub fn reactants(&self) -> impl Iterator<Item = &String> {
        self.metabolites
            .iter()
            .filter(|(_, coef)| **coef < 0.)
            .map(|(id, _)| id)
    }

    /// Determine the upper bound of the variable associated with the forward reaction
    pub(crate) fn get_forward_upper_bound(&self) -> f64 {
        match self.activity {
            ReactionActivity::Active => self.upper_bound.max(0.),
            ReactionActivity::Inactive => 0f64,
        }
    }

    /// Determine the lower bound of the variable associated with the forward reaction
    pub(crate) fn get_forward_lower_bound(&self) -> f64 {
        match self.activity {
            ReactionActivity::Active => self.lower_bound.max(0.),
            ReactionActivity::Inactive => 0f64,
        }
    }

    /// Determine the upper bound of the variable associated with the reverse reaction
    pub(crate) fn get_reverse_upper_bound(&self) -> f64 {
        match self.activity {
            ReactionActivity::Active => (-self.lower_bound).max(0.),
            ReactionActivity::Inactive => 0f64,
        }
    }

    /// Determine the lower bound of the variable associated with the reverse reaction
    pub(crate) fn get_reverse_lower_bound(&self) -> f64 {
        match self.activity {
            ReactionActivity::Active => (-self.upper_bound).max(0.),
            ReactionActivity::Inactive => 0f64,
        }
    }
}

/// Whether a Reaction is active or inactive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReactionActivity {
    /// The Reaction is active and can carry flux
    Active,
    /// The Reaction is inactive and can't carry flux
    Inactive,
}

impl From<GeneActivity> for ReactionActivity {
    fn from(value: GeneActivity) -> Self {
        match value {
            GeneActivity::Active => ReactionActivity::Active,
            GeneActivity::Inactive => ReactionActivity::Inactive,
        }
    }
}
