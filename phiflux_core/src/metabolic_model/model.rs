//! This module provides the Model struct for representing an entire metabolic model
use indexmap::IndexMap;
use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use crate::metabolic_model::gene::{Gene, GeneActivity, GprError};
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::{Reaction, ReactionActivity};

/// Represents a Genome Scale Metabolic Model
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    /// Map of reaction ids to Reaction Objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of gene ids to Gene Objects
    pub genes: IndexMap<String, Gene>,
    /// Map of metabolite ids to Metabolite Objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to objective function coefficients
    pub objective: IndexMap<String, f64>,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Human readable name of the Model
    pub name: Option<String>,
    /// Compartments in the model
    ///
    /// An IndexMap<String, String> of {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
    /// A version identifier for the Model, stored as a string
    pub version: Option<String>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model {
            reactions: IndexMap::new(),
            genes: IndexMap::new(),
            metabolites: IndexMap::new(),
            objective: IndexMap::new(),
            id: None,
            name: None,
            compartments: None,
            version: None,
        }
    }

    // region Adding Components
    /// Add a reaction to the model
    ///
    /// Metabolites named in the reaction stoichiometry which are not yet part of the model are
    /// added as internal metabolites.
    ///
    /// # Examples
    /// ```rust
    /// use phiflux_core::metabolic_model::model::Model;
    /// use phiflux_core::metabolic_model::reaction::ReactionBuilder;
    /// let mut model = Model::new_empty();
    /// let new_reaction = ReactionBuilder::default().id("new_reaction".to_string()).build().unwrap();
    /// model.add_reaction(new_reaction);
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) {
        for met in reaction.metabolites.keys() {
            if !self.metabolites.contains_key(met) {
                self.metabolites.insert(met.clone(), Metabolite::new(met));
            }
        }
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Add a metabolite to the model, replacing any metabolite with the same id
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        let id = metabolite.id.clone();
        self.metabolites.insert(id, metabolite);
    }

    /// Add a gene to the model
    ///
    /// # Examples
    /// ```rust
    /// use phiflux_core::metabolic_model::gene::GeneBuilder;
    /// use phiflux_core::metabolic_model::model::Model;
    /// let mut model=Model::new_empty();
    /// let new_gene = GeneBuilder::default().id("new_gene".to_string()).build().unwrap();
    /// model.add_gene(new_gene);
    /// ```
    pub fn add_gene(&mut self, gene: Gene) {
        let id = gene.id.clone();
        self.genes.insert(id, gene);
    }
    // endregion Adding Components

    // region Lookup
    /// Get a reaction by id
    pub fn reaction(&self, id: &str) -> Result<&Reaction, ModelError> {
        self.reactions
            .get(id)
            .ok_or_else(|| ModelError::ReactionNotFound(id.to_string()))
    }

    /// Get a mutable reference to a reaction by id
    pub fn reaction_mut(&mut self, id: &str) -> Result<&mut Reaction, ModelError> {
        self.reactions
            .get_mut(id)
            .ok_or_else(|| ModelError::ReactionNotFound(id.to_string()))
    }

    /// Get a metabolite by id
    pub fn metabolite(&self, id: &str) -> Result<&Metabolite, ModelError> {
        self.metabolites
            .get(id)
            .ok_or_else(|| ModelError::MetaboliteNotFound(id.to_string()))
    }

    /// Get a gene by id
    pub fn gene(&self, id: &str) -> Result<&Gene, ModelError> {
        self.genes
            .get(id)
            .ok_or_else(|| ModelError::GeneNotFound(id.to_string()))
    }

    /// Reactions in which the metabolite takes part
    pub fn metabolite_reactions(&self, metabolite: &str) -> Result<Vec<&Reaction>, ModelError> {
        self.metabolite(metabolite)?;
        Ok(self
            .reactions
            .values()
            .filter(|rxn| rxn.metabolites.contains_key(metabolite))
            .collect())
    }

    /// Reactions which list the metabolite among their products
    pub fn producing_reactions(&self, metabolite: &str) -> Result<Vec<&Reaction>, ModelError> {
        Ok(self
            .metabolite_reactions(metabolite)?
            .into_iter()
            .filter(|rxn| rxn.coefficient(metabolite) > 0.)
            .collect())
    }
    // endregion Lookup

    // region Stoichiometry
    /// Dense stoichiometric matrix with metabolites as rows and reactions as columns, both in
    /// model order
    pub fn stoichiometric_matrix(&self) -> DMatrix<f64> {
        let mut matrix = DMatrix::zeros(self.metabolites.len(), self.reactions.len());
        for (col, rxn) in self.reactions.values().enumerate() {
            for (met, coef) in &rxn.metabolites {
                if let Some(row) = self.metabolites.get_index_of(met) {
                    matrix[(row, col)] = *coef;
                }
            }
        }
        matrix
    }

    /// Net production of every metabolite, S·v, for the given fluxes
    ///
    /// Reactions absent from `fluxes` are taken to carry no flux. Entries for boundary
    /// metabolites are reported as zero since they are not balanced.
    pub fn mass_balance_residual(&self, fluxes: &IndexMap<String, f64>) -> DVector<f64> {
        let flux_vector = DVector::from_iterator(
            self.reactions.len(),
            self.reactions
                .keys()
                .map(|id| fluxes.get(id).copied().unwrap_or(0.)),
        );
        let mut residual = self.stoichiometric_matrix() * flux_vector;
        for (row, met) in self.metabolites.values().enumerate() {
            if met.boundary {
                residual[row] = 0.;
            }
        }
        residual
    }
    // endregion Stoichiometry

    // region Gene Knockouts
    /// Mark a gene inactive, and knock out every reaction whose GPR no longer evaluates active
    ///
    /// Returns the ids of the reactions which were knocked out.
    pub fn knock_out_gene(&mut self, gene_id: &str) -> Result<Vec<String>, ModelError> {
        match self.genes.get_mut(gene_id) {
            Some(gene) => gene.activity = GeneActivity::Inactive,
            None => return Err(ModelError::GeneNotFound(gene_id.to_string())),
        }
        let mut knocked_out = Vec::new();
        for rxn in self.reactions.values_mut() {
            let Some(gpr) = &rxn.gpr else { continue };
            if !gpr.references(gene_id) {
                continue;
            }
            if rxn.activity == ReactionActivity::Inactive {
                continue;
            }
            if gpr.eval(&self.genes)? == GeneActivity::Inactive {
                rxn.activity = ReactionActivity::Inactive;
                knocked_out.push(rxn.id.clone());
            }
        }
        Ok(knocked_out)
    }
    // endregion Gene Knockouts
}

/// Errors associated with looking up or editing model components
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Reaction {0} is not present in the model")]
    ReactionNotFound(String),
    #[error("Metabolite {0} is not present in the model")]
    MetaboliteNotFound(String),
    #[error("Gene {0} is not present in the model")]
    GeneNotFound(String),
    #[error("Reaction {id} would be left with lower bound {lower_bound} > upper bound {upper_bound}")]
    InvalidBounds {
        id: String,
        lower_bound: f64,
        upper_bound: f64,
    },
    #[error("Unable to evaluate GPR: {0}")]
    Gpr(#[from] GprError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::gpr_parse::parse_gpr;
    use crate::metabolic_model::reaction::ReactionBuilder;

    fn reaction(id: &str, stoich: &[(&str, f64)], gpr: Option<&str>, model: &mut Model) {
        let gpr = gpr.map(|rule| parse_gpr(rule, &mut model.genes).unwrap());
        let rxn = ReactionBuilder::default()
            .id(id.to_string())
            .metabolites(stoich.iter().map(|(m, c)| (m.to_string(), *c)).collect())
            .lower_bound(0.)
            .upper_bound(1000.)
            .gpr(gpr)
            .build()
            .unwrap();
        model.add_reaction(rxn);
    }

    fn setup_model() -> Model {
        let mut model = Model::new_empty();
        reaction("R1", &[("a", -1.), ("b", 1.)], Some("g1 or g2"), &mut model);
        reaction("R2", &[("b", -1.), ("c", 1.)], Some("g1 and g3"), &mut model);
        reaction("R3", &[("c", -1.)], None, &mut model);
        model.metabolites.get_mut("a").unwrap().boundary = true;
        model
    }

    #[test]
    fn add_reaction_registers_metabolites() {
        let model = setup_model();
        assert_eq!(
            model.metabolites.keys().collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert_eq!(model.genes.len(), 3);
    }

    #[test]
    fn lookup_errors() {
        let model = setup_model();
        assert!(model.reaction("R1").is_ok());
        assert_eq!(
            model.reaction("R9"),
            Err(ModelError::ReactionNotFound("R9".to_string()))
        );
        assert!(matches!(
            model.metabolite("z"),
            Err(ModelError::MetaboliteNotFound(_))
        ));
        assert!(matches!(model.gene("g9"), Err(ModelError::GeneNotFound(_))));
    }

    #[test]
    fn producing_reactions() {
        let model = setup_model();
        let producers: Vec<_> = model
            .producing_reactions("b")
            .unwrap()
            .iter()
            .map(|r| r.id.clone())
            .collect();
        assert_eq!(producers, vec!["R1"]);
        assert_eq!(model.metabolite_reactions("b").unwrap().len(), 2);
    }

    #[test]
    fn stoichiometric_matrix_and_residual() {
        let model = setup_model();
        let s = model.stoichiometric_matrix();
        assert_eq!(s.shape(), (3, 3));
        assert_eq!(s[(1, 0)], 1.);
        assert_eq!(s[(1, 1)], -1.);

        let balanced: IndexMap<String, f64> =
            [("R1", 2.), ("R2", 2.), ("R3", 2.)]
                .into_iter()
                .map(|(r, v)| (r.to_string(), v))
                .collect();
        assert!(model.mass_balance_residual(&balanced).amax() < 1e-12);

        let unbalanced: IndexMap<String, f64> = [("R1".to_string(), 1.)].into_iter().collect();
        assert_eq!(model.mass_balance_residual(&unbalanced)[1], 1.);
    }

    #[test]
    fn gene_knockout() {
        let mut model = setup_model();
        // g2 is an isozyme of g1 for R1, so R1 survives
        assert!(model.knock_out_gene("g2").unwrap().is_empty());
        // g3 is required for R2
        assert_eq!(model.knock_out_gene("g3").unwrap(), vec!["R2"]);
        assert_eq!(model.reactions["R2"].activity, ReactionActivity::Inactive);
        assert_eq!(model.reactions["R1"].activity, ReactionActivity::Active);
        // losing g1 as well takes out R1
        assert_eq!(model.knock_out_gene("g1").unwrap(), vec!["R1"]);
        assert!(model.knock_out_gene("g9").is_err());
    }

    #[test]
    fn repeated_knockout_reports_only_new_reactions() {
        let mut model = setup_model();
        assert_eq!(model.knock_out_gene("g3").unwrap(), vec!["R2"]);
        // R2 is already off, so losing g3 again changes nothing
        assert!(model.knock_out_gene("g3").unwrap().is_empty());
        // g1 appears in R2's rule too, but R1 keeps g2
        assert!(model.knock_out_gene("g1").unwrap().is_empty());
        assert_eq!(model.knock_out_gene("g2").unwrap(), vec!["R1"]);
        assert_eq!(model.reactions["R2"].activity, ReactionActivity::Inactive);
    }
}
