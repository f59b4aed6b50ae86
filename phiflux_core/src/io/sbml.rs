//! Read models in SBML Level 3 with the flux balance constraints (fbc) package
//!
//! The document is deserialized with quick-xml's serde support. Names are matched on their
//! local part, so `fbc:lowerFluxBound` is read as `@lowerFluxBound`. Identifiers are decoded
//! the way COBRA tools write them: the `R_`, `M_` and `G_` prefixes are stripped and
//! `__NN__` character codes are replaced by the character, so `M_cpd00002__91__c0__93__`
//! becomes `cpd00002[c0]`.
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, warn};
use regex::{Captures, Regex};
use serde::Deserialize;
use thiserror::Error;

use crate::configuration::Configuration;
use crate::metabolic_model::gene::{Gene, GeneBuilder, Gpr, GprError, GprOperatorType};
use crate::metabolic_model::metabolite::MetaboliteBuilder;
use crate::metabolic_model::metabolite::MetaboliteBuilderError;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::{ReactionBuilder, ReactionBuilderError};

// region SBML Document
#[derive(Debug, Deserialize)]
struct SbmlDocument {
    model: SbmlModel,
}

#[derive(Debug, Deserialize)]
struct SbmlModel {
    #[serde(rename = "@id", default)]
    id: Option<String>,
    #[serde(rename = "@name", default)]
    name: Option<String>,
    #[serde(rename = "listOfCompartments", default)]
    compartments: ListOfCompartments,
    #[serde(rename = "listOfSpecies", default)]
    species: ListOfSpecies,
    #[serde(rename = "listOfParameters", default)]
    parameters: ListOfParameters,
    #[serde(rename = "listOfReactions", default)]
    reactions: ListOfReactions,
    #[serde(rename = "listOfObjectives", default)]
    objectives: Option<ListOfObjectives>,
    #[serde(rename = "listOfGeneProducts", default)]
    gene_products: ListOfGeneProducts,
}

#[derive(Debug, Default, Deserialize)]
struct ListOfCompartments {
    #[serde(rename = "compartment", default)]
    items: Vec<SbmlCompartment>,
}

#[derive(Debug, Deserialize)]
struct SbmlCompartment {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@name", default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListOfSpecies {
    #[serde(rename = "species", default)]
    items: Vec<SbmlSpecies>,
}

#[derive(Debug, Deserialize)]
struct SbmlSpecies {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@name", default)]
    name: Option<String>,
    #[serde(rename = "@compartment", default)]
    compartment: Option<String>,
    #[serde(rename = "@boundaryCondition", default)]
    boundary_condition: bool,
    /// fbc:charge
    #[serde(rename = "@charge", default)]
    charge: Option<i32>,
    /// fbc:chemicalFormula
    #[serde(rename = "@chemicalFormula", default)]
    formula: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListOfParameters {
    #[serde(rename = "parameter", default)]
    items: Vec<SbmlParameter>,
}

#[derive(Debug, Deserialize)]
struct SbmlParameter {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@value", default)]
    value: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ListOfReactions {
    #[serde(rename = "reaction", default)]
    items: Vec<SbmlReaction>,
}

#[derive(Debug, Deserialize)]
struct SbmlReaction {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@name", default)]
    name: Option<String>,
    #[serde(rename = "@reversible", default = "default_reversible")]
    reversible: bool,
    #[serde(rename = "@lowerFluxBound", default)]
    lower_flux_bound: Option<String>,
    #[serde(rename = "@upperFluxBound", default)]
    upper_flux_bound: Option<String>,
    #[serde(rename = "listOfReactants", default)]
    reactants: ListOfSpeciesReferences,
    #[serde(rename = "listOfProducts", default)]
    products: ListOfSpeciesReferences,
    #[serde(rename = "geneProductAssociation", default)]
    gene_product_association: Option<GeneProductAssociation>,
}

fn default_reversible() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
struct ListOfSpeciesReferences {
    #[serde(rename = "speciesReference", default)]
    items: Vec<SpeciesReference>,
}

#[derive(Debug, Deserialize)]
struct SpeciesReference {
    #[serde(rename = "@species")]
    species: String,
    #[serde(rename = "@stoichiometry", default = "default_stoichiometry")]
    stoichiometry: f64,
}

fn default_stoichiometry() -> f64 {
    1.
}

#[derive(Debug, Deserialize)]
struct GeneProductAssociation {
    #[serde(rename = "$value")]
    association: Association,
}

#[derive(Debug, Deserialize)]
enum Association {
    #[serde(rename = "and")]
    And {
        #[serde(rename = "$value", default)]
        children: Vec<Association>,
    },
    #[serde(rename = "or")]
    Or {
        #[serde(rename = "$value", default)]
        children: Vec<Association>,
    },
    #[serde(rename = "geneProductRef")]
    GeneProductRef {
        #[serde(rename = "@geneProduct")]
        gene_product: String,
    },
}

#[derive(Debug, Default, Deserialize)]
struct ListOfObjectives {
    #[serde(rename = "@activeObjective", default)]
    active_objective: Option<String>,
    #[serde(rename = "objective", default)]
    items: Vec<SbmlObjective>,
}

#[derive(Debug, Deserialize)]
struct SbmlObjective {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type", default)]
    sense: Option<String>,
    #[serde(rename = "listOfFluxObjectives", default)]
    flux_objectives: ListOfFluxObjectives,
}

#[derive(Debug, Default, Deserialize)]
struct ListOfFluxObjectives {
    #[serde(rename = "fluxObjective", default)]
    items: Vec<FluxObjective>,
}

#[derive(Debug, Deserialize)]
struct FluxObjective {
    #[serde(rename = "@reaction")]
    reaction: String,
    #[serde(rename = "@coefficient", default = "default_stoichiometry")]
    coefficient: f64,
}

#[derive(Debug, Default, Deserialize)]
struct ListOfGeneProducts {
    #[serde(rename = "geneProduct", default)]
    items: Vec<SbmlGeneProduct>,
}

#[derive(Debug, Deserialize)]
struct SbmlGeneProduct {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@label", default)]
    label: Option<String>,
    #[serde(rename = "@name", default)]
    name: Option<String>,
}
// endregion SBML Document

// region Conversions
/// Decodes SBML ids into the ids used in the model
struct IdDecoder {
    char_code: Regex,
}

impl IdDecoder {
    fn new() -> Result<Self, regex::Error> {
        Ok(IdDecoder {
            char_code: Regex::new(r"__(\d+)__")?,
        })
    }

    fn decode(&self, id: &str, prefix: &str) -> String {
        let id = id.strip_prefix(prefix).unwrap_or(id);
        self.char_code
            .replace_all(id, |caps: &Captures| {
                caps[1]
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

impl Association {
    fn to_gpr(
        &self,
        decoder: &IdDecoder,
        genes: &mut IndexMap<String, Gene>,
    ) -> Result<Option<Gpr>, GprError> {
        let (children, operator) = match self {
            Association::And { children } => (children, GprOperatorType::And),
            Association::Or { children } => (children, GprOperatorType::Or),
            Association::GeneProductRef { gene_product } => {
                let id = decoder.decode(gene_product, "G_");
                genes
                    .entry(id.clone())
                    .or_insert_with(|| Gene::new_active(&id));
                return Ok(Some(Gpr::GeneNode(id)));
            }
        };
        let mut rules = Vec::with_capacity(children.len());
        for child in children {
            if let Some(rule) = child.to_gpr(decoder, genes)? {
                rules.push(rule);
            }
        }
        Gpr::join(rules, operator)
    }
}

impl Model {
    /// Read a model from an SBML file
    pub fn read_sbml<P: AsRef<Path>>(path: P) -> Result<Model, SbmlError> {
        let data = fs::read_to_string(path)?;
        Model::from_sbml_str(&data)
    }

    /// Parse a model from an SBML document
    pub fn from_sbml_str(data: &str) -> Result<Model, SbmlError> {
        let document: SbmlDocument = quick_xml::de::from_str(data)?;
        let decoder = IdDecoder::new()?;
        let sbml = document.model;
        let mut model = Model::new_empty();
        model.id = sbml.id;
        model.name = sbml.name;
        if !sbml.compartments.items.is_empty() {
            model.compartments = Some(
                sbml.compartments
                    .items
                    .into_iter()
                    .map(|c| {
                        let name = c.name.unwrap_or_else(|| c.id.clone());
                        (c.id, name)
                    })
                    .collect(),
            );
        }

        for species in sbml.species.items {
            let metabolite = MetaboliteBuilder::default()
                .id(decoder.decode(&species.id, "M_"))
                .name(species.name)
                .compartment(species.compartment)
                .charge(species.charge.unwrap_or_default())
                .formula(species.formula)
                .boundary(species.boundary_condition)
                .build()?;
            model.add_metabolite(metabolite);
        }

        for gene_product in sbml.gene_products.items {
            let gene = GeneBuilder::default()
                .id(decoder.decode(&gene_product.id, "G_"))
                .name(gene_product.name.or(gene_product.label))
                .build()?;
            model.add_gene(gene);
        }

        let parameters: IndexMap<String, Option<f64>> = sbml
            .parameters
            .items
            .into_iter()
            .map(|p| (p.id, p.value))
            .collect();
        let bound = |reaction: &str, parameter: &str| -> Result<f64, SbmlError> {
            match parameters.get(parameter) {
                Some(Some(value)) => Ok(*value),
                _ => Err(SbmlError::MissingParameter {
                    reaction: reaction.to_string(),
                    parameter: parameter.to_string(),
                }),
            }
        };

        let defaults = Configuration::current();
        for rxn in sbml.reactions.items {
            let id = decoder.decode(&rxn.id, "R_");
            let lower_bound = match &rxn.lower_flux_bound {
                Some(parameter) => bound(&id, parameter)?,
                None if rxn.reversible => defaults.lower_bound,
                None => 0.,
            };
            let upper_bound = match &rxn.upper_flux_bound {
                Some(parameter) => bound(&id, parameter)?,
                None => defaults.upper_bound,
            };
            let mut metabolites: IndexMap<String, f64> = IndexMap::new();
            for reactant in &rxn.reactants.items {
                *metabolites
                    .entry(decoder.decode(&reactant.species, "M_"))
                    .or_insert(0.) -= reactant.stoichiometry;
            }
            for product in &rxn.products.items {
                *metabolites
                    .entry(decoder.decode(&product.species, "M_"))
                    .or_insert(0.) += product.stoichiometry;
            }
            let gpr = match &rxn.gene_product_association {
                Some(gpa) => gpa.association.to_gpr(&decoder, &mut model.genes)?,
                None => None,
            };
            let reaction = ReactionBuilder::default()
                .id(id)
                .name(rxn.name)
                .metabolites(metabolites)
                .lower_bound(lower_bound)
                .upper_bound(upper_bound)
                .gpr(gpr)
                .build()?;
            model.add_reaction(reaction);
        }

        if let Some(objectives) = sbml.objectives {
            let active = match &objectives.active_objective {
                Some(active) => objectives.items.iter().find(|o| &o.id == active),
                None => objectives.items.first(),
            };
            match active {
                Some(objective) => {
                    let sign = match objective.sense.as_deref() {
                        Some("minimize") => -1.,
                        _ => 1.,
                    };
                    for flux_objective in &objective.flux_objectives.items {
                        model.objective.insert(
                            decoder.decode(&flux_objective.reaction, "R_"),
                            sign * flux_objective.coefficient,
                        );
                    }
                }
                None => warn!("SBML model lists objectives, but none is active"),
            }
        }

        debug!(
            "Read SBML model with {} reactions, {} metabolites and {} genes",
            model.reactions.len(),
            model.metabolites.len(),
            model.genes.len()
        );
        Ok(model)
    }
}
// endregion Conversions

#[derive(Debug, Error)]
pub enum SbmlError {
    #[error("Failed to read SBML file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to deserialize SBML document: {0}")]
    DeserializeError(#[from] quick_xml::DeError),
    #[error("Invalid id pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Reaction {reaction} references missing flux bound parameter {parameter}")]
    MissingParameter { reaction: String, parameter: String },
    #[error("Unable to build metabolite: {0}")]
    Metabolite(#[from] MetaboliteBuilderError),
    #[error("Unable to build gene: {0}")]
    Gene(#[from] crate::metabolic_model::gene::GeneBuilderError),
    #[error("Unable to build reaction: {0}")]
    Reaction(#[from] ReactionBuilderError),
    #[error("Invalid gene product association: {0}")]
    Gpr(#[from] GprError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn toy_model() -> Model {
        Model::read_sbml(
            PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("test_data")
                .join("test_models")
                .join("toy_model.xml"),
        )
        .unwrap()
    }

    #[test]
    fn decode_ids() {
        let decoder = IdDecoder::new().unwrap();
        assert_eq!(
            decoder.decode("M_cpd00002__91__c0__93__", "M_"),
            "cpd00002[c0]"
        );
        assert_eq!(decoder.decode("R_rxn05319_c0", "R_"), "rxn05319_c0");
        assert_eq!(decoder.decode("plain", "G_"), "plain");
    }

    #[test]
    fn species_and_boundary() {
        let model = toy_model();
        assert_eq!(model.id.as_deref(), Some("toy_sbml"));
        assert_eq!(model.metabolites.len(), 4);
        let a_e = model.metabolite("A[e0]").unwrap();
        assert!(a_e.boundary);
        assert_eq!(a_e.formula.as_deref(), Some("C6H12O6"));
        let c = model.metabolite("C[c0]").unwrap();
        assert!(!c.boundary);
        assert_eq!(c.charge, -1);
        assert_eq!(
            model.compartments.as_ref().unwrap()["c0"],
            "Cytosol".to_string()
        );
    }

    #[test]
    fn reactions_bounds_and_stoichiometry() {
        let model = toy_model();
        assert_eq!(model.reactions.len(), 4);
        let uptake = model.reaction("EX_A").unwrap();
        assert_eq!(uptake.lower_bound, 0.);
        assert_eq!(uptake.upper_bound, 10.);
        assert_eq!(uptake.coefficient("A[e0]"), -1.);
        assert_eq!(uptake.coefficient("A[c0]"), 1.);
        let bc = model.reaction("R_BC").unwrap();
        assert_eq!(bc.lower_bound, -1000.);
        assert_eq!(bc.coefficient("C[c0]"), 2.);
    }

    #[test]
    fn objective_and_gprs() {
        let model = toy_model();
        assert_eq!(model.objective.get("bio1_biomass"), Some(&1.));
        let ab = model.reaction("R_AB").unwrap();
        assert_eq!(
            ab.gpr.as_ref().unwrap().to_string(),
            "((g1 and g2) or g3)"
        );
        assert_eq!(model.gene("g1").unwrap().name.as_deref(), Some("gene one"));
        assert!(model.reaction("bio1_biomass").unwrap().gpr.is_none());
    }

    #[test]
    fn missing_parameter_is_an_error() {
        let data = r#"<?xml version="1.0" encoding="UTF-8"?>
<sbml xmlns="http://www.sbml.org/sbml/level3/version1/core" xmlns:fbc="http://www.sbml.org/sbml/level3/version1/fbc/version2" level="3" version="1">
  <model id="broken">
    <listOfReactions>
      <reaction id="R_X" reversible="false" fbc:lowerFluxBound="nope" fbc:upperFluxBound="nope"/>
    </listOfReactions>
  </model>
</sbml>"#;
        assert!(matches!(
            Model::from_sbml_str(data),
            Err(SbmlError::MissingParameter { .. })
        ));
    }
}
