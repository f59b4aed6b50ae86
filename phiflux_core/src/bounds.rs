//! Reaction bound overrides
//!
//! A loaded [`Model`] is treated as an immutable base network. Overrides are applied to a copy,
//! so a scenario can never leak bound edits into another analysis run on the same base model.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::metabolic_model::model::{Model, ModelError};

/// Set the bounds of a group of reactions
///
/// A side left as `None` keeps the reaction's current bound.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundOverride {
    /// Ids of the reactions to update
    pub reactions: Vec<String>,
    /// New lower bound
    #[serde(default)]
    pub lower: Option<f64>,
    /// New upper bound
    #[serde(default)]
    pub upper: Option<f64>,
}

impl BoundOverride {
    /// Override both bounds of `reactions`
    pub fn new<S: AsRef<str>>(reactions: &[S], lower: f64, upper: f64) -> Self {
        Self {
            reactions: reactions.iter().map(|r| r.as_ref().to_string()).collect(),
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Fix the flux through `reactions` to `value`
    pub fn fixed<S: AsRef<str>>(reactions: &[S], value: f64) -> Self {
        Self::new(reactions, value, value)
    }

    /// Prevent any flux through `reactions`
    pub fn closed<S: AsRef<str>>(reactions: &[S]) -> Self {
        Self::fixed(reactions, 0.)
    }

    /// Override only the upper bound of `reactions`
    pub fn upper_only<S: AsRef<str>>(reactions: &[S], upper: f64) -> Self {
        Self {
            reactions: reactions.iter().map(|r| r.as_ref().to_string()).collect(),
            lower: None,
            upper: Some(upper),
        }
    }
}

impl Model {
    /// Create a copy of the model with the `overrides` applied in order
    ///
    /// Every reaction id is checked before anything is changed, so a missing reaction never
    /// produces a partially edited model. After all overrides are applied every touched
    /// reaction must satisfy lower bound <= upper bound.
    pub fn with_overrides(&self, overrides: &[BoundOverride]) -> Result<Model, ModelError> {
        for bound_override in overrides {
            for id in &bound_override.reactions {
                self.reaction(id)?;
            }
        }
        let mut model = self.clone();
        for bound_override in overrides {
            for id in &bound_override.reactions {
                let rxn = model.reaction_mut(id)?;
                if let Some(lower) = bound_override.lower {
                    rxn.lower_bound = lower;
                }
                if let Some(upper) = bound_override.upper {
                    rxn.upper_bound = upper;
                }
            }
        }
        for id in overrides.iter().flat_map(|o| o.reactions.iter()) {
            let rxn = model.reaction(id)?;
            if rxn.lower_bound > rxn.upper_bound {
                return Err(ModelError::InvalidBounds {
                    id: id.clone(),
                    lower_bound: rxn.lower_bound,
                    upper_bound: rxn.upper_bound,
                });
            }
        }
        debug!(
            "Applied {} bound overrides covering {} reactions",
            overrides.len(),
            overrides.iter().map(|o| o.reactions.len()).sum::<usize>()
        );
        Ok(model)
    }
}
