//! Metabolites of a network
use derive_builder::Builder;

/// A chemical species taking part in the reactions of a model
///
/// Boundary metabolites (SBML `boundaryCondition`) lie outside the system: they may be created
/// or consumed freely and get no mass balance row.
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Metabolite {
    /// Unique id within the model
    pub id: String,
    #[builder(default = "None")]
    pub name: Option<String>,
    #[builder(default = "None")]
    pub compartment: Option<String>,
    #[builder(default = "0")]
    pub charge: i32,
    #[builder(default = "None")]
    pub formula: Option<String>,
    #[builder(default = "false")]
    pub boundary: bool,
    #[builder(default = "None")]
    pub notes: Option<String>,
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Metabolite {
    /// Internal metabolite known only by id
    ///
    /// The compartment is taken from a trailing bracketed suffix when there is one, so
    /// `cpd00002[c0]` lands in `c0`.
    pub fn new(id: &str) -> Metabolite {
        Metabolite {
            id: id.to_string(),
            name: None,
            compartment: compartment_suffix(id).map(str::to_string),
            charge: 0,
            formula: None,
            boundary: false,
            notes: None,
            annotation: None,
        }
    }

    /// Metabolite outside the system, exempt from mass balance
    pub fn new_boundary(id: &str) -> Metabolite {
        Metabolite {
            boundary: true,
            ..Metabolite::new(id)
        }
    }
}

/// The `c0` of `cpd00002[c0]`
fn compartment_suffix(id: &str) -> Option<&str> {
    let inner = id.strip_suffix(']')?;
    let start = inner.rfind('[')?;
    let compartment = &inner[start + 1..];
    (!compartment.is_empty()).then_some(compartment)
}
