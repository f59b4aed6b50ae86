//! This module provides the Gene struct, representing a gene, and the Gpr enum, representing a
//! gene protein reaction rule
use std::fmt::{Display, Formatter};

use derive_builder::Builder;
use indexmap::IndexMap;
use thiserror::Error;

/// Structure Representing a Gene
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
pub struct Gene {
    /// Used to identify the gene
    pub id: String,
    /// Human Readable Gene Name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Whether this gene is currently active (see [`GeneActivity`])
    #[builder(default = "GeneActivity::Active")]
    pub activity: GeneActivity,
    /// Notes about the gene
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Gene Annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Gene {
    /// Create a new active gene with only an id
    pub fn new_active(id: &str) -> Gene {
        Gene {
            id: id.to_string(),
            name: None,
            activity: GeneActivity::Active,
            notes: None,
            annotation: None,
        }
    }
}

impl Display for Gene {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Whether a gene is active or not
#[derive(Clone, Debug, Hash, Eq, PartialEq, Copy)]
pub enum GeneActivity {
    /// Gene is considered active
    Active,
    /// Gene is considered inactive
    Inactive,
}

/// Representation of a Gene Protein Reaction Rule as an AST
#[derive(Clone, Debug, PartialEq)]
pub enum Gpr {
    /// Operation on genes (see [`GprOperation`])
    Operation(GprOperation),
    /// A terminal gene node, holding the id of the gene
    GeneNode(String),
}

/// Possible operations on genes
#[derive(Clone, Debug, PartialEq)]
pub enum GprOperation {
    Or { left: Box<Gpr>, right: Box<Gpr> },
    And { left: Box<Gpr>, right: Box<Gpr> },
    Not { val: Box<Gpr> },
}

/// Types of Allowed GPR Operations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GprOperatorType {
    /// Or, results in active if either left or right are active
    Or,
    /// And, results in active if both left and right are active
    And,
    /// Not, results in active if val is inactive
    Not,
}

impl Gpr {
    /// Create a new binary operation node
    pub fn new_binary_operation(
        left: Gpr,
        operator: GprOperatorType,
        right: Gpr,
    ) -> Result<Gpr, GprError> {
        let op = match operator {
            GprOperatorType::Or => GprOperation::Or {
                left: Box::new(left),
                right: Box::new(right),
            },
            GprOperatorType::And => GprOperation::And {
                left: Box::new(left),
                right: Box::new(right),
            },
            GprOperatorType::Not => return Err(GprError::InvalidBinaryOp),
        };
        Ok(Gpr::Operation(op))
    }

    /// Create a new unary operation node
    pub fn new_unary_operation(operator: GprOperatorType, operand: Gpr) -> Result<Gpr, GprError> {
        match operator {
            GprOperatorType::Not => Ok(Gpr::Operation(GprOperation::Not {
                val: Box::new(operand),
            })),
            _ => Err(GprError::InvalidUnaryOp),
        }
    }

    /// Create a new gene node
    pub fn new_gene_node(gene: &str) -> Gpr {
        Gpr::GeneNode(gene.to_string())
    }

    /// Fold a list of rules into a single rule joined by `operator`
    ///
    /// Returns None for an empty list.
    pub fn join(rules: Vec<Gpr>, operator: GprOperatorType) -> Result<Option<Gpr>, GprError> {
        let mut rules = rules.into_iter();
        let Some(mut joined) = rules.next() else {
            return Ok(None);
        };
        for rule in rules {
            joined = Gpr::new_binary_operation(joined, operator, rule)?;
        }
        Ok(Some(joined))
    }

    /// Evaluate whether the rule is Active or Inactive given the activity of the genes in
    /// `genes`
    pub fn eval(&self, genes: &IndexMap<String, Gene>) -> Result<GeneActivity, GprError> {
        match self {
            Gpr::Operation(GprOperation::Or { left, right }) => {
                let l = left.eval(genes)?;
                let r = right.eval(genes)?;
                if l == GeneActivity::Active || r == GeneActivity::Active {
                    Ok(GeneActivity::Active)
                } else {
                    Ok(GeneActivity::Inactive)
                }
            }
            Gpr::Operation(GprOperation::And { left, right }) => {
                let l = left.eval(genes)?;
                let r = right.eval(genes)?;
                if l == GeneActivity::Active && r == GeneActivity::Active {
                    Ok(GeneActivity::Active)
                } else {
                    Ok(GeneActivity::Inactive)
                }
            }
            Gpr::Operation(GprOperation::Not { val }) => match val.eval(genes)? {
                GeneActivity::Active => Ok(GeneActivity::Inactive),
                GeneActivity::Inactive => Ok(GeneActivity::Active),
            },
            Gpr::GeneNode(gene) => match genes.get(gene) {
                Some(g) => Ok(g.activity),
                None => Err(GprError::GeneNotFound(gene.clone())),
            },
        }
    }

    /// Whether the gene with id `gene` appears anywhere in the rule
    pub fn references(&self, gene: &str) -> bool {
        match self {
            Gpr::Operation(GprOperation::Or { left, right })
            | Gpr::Operation(GprOperation::And { left, right }) => {
                left.references(gene) || right.references(gene)
            }
            Gpr::Operation(GprOperation::Not { val }) => val.references(gene),
            Gpr::GeneNode(id) => id == gene,
        }
    }

    /// Generate a GPR string with gene ids from the GPR AST
    pub fn to_string_id(&self) -> String {
        match self {
            Gpr::Operation(op) => match op {
                GprOperation::Or { left, right } => {
                    format!("({} or {})", left.to_string_id(), right.to_string_id())
                }
                GprOperation::And { left, right } => {
                    format!("({} and {})", left.to_string_id(), right.to_string_id())
                }
                GprOperation::Not { val } => {
                    format!("(not {})", val.to_string_id())
                }
            },
            Gpr::GeneNode(gene_ref) => gene_ref.to_string(),
        }
    }
}

impl Display for Gpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_id())
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum GprError {
    #[error("Invalid binary operation")]
    InvalidBinaryOp,
    #[error("Invalid unary operation")]
    InvalidUnaryOp,
    #[error("Gene {0} in GPR is not present in the model")]
    GeneNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gene_map() -> IndexMap<String, Gene> {
        let mut genes = IndexMap::new();
        for (id, activity) in [
            ("active1", GeneActivity::Active),
            ("active2", GeneActivity::Active),
            ("inactive1", GeneActivity::Inactive),
            ("inactive2", GeneActivity::Inactive),
        ] {
            genes.insert(
                id.to_string(),
                GeneBuilder::default()
                    .id(id.to_string())
                    .activity(activity)
                    .build()
                    .unwrap(),
            );
        }
        genes
    }

    fn binary(left: &str, op: GprOperatorType, right: &str) -> Gpr {
        Gpr::new_binary_operation(Gpr::new_gene_node(left), op, Gpr::new_gene_node(right)).unwrap()
    }

    #[test]
    fn gene_node() {
        let genes = gene_map();
        assert_eq!(
            Gpr::new_gene_node("active1").eval(&genes).unwrap(),
            GeneActivity::Active
        );
        assert_eq!(
            Gpr::new_gene_node("inactive1").eval(&genes).unwrap(),
            GeneActivity::Inactive
        );
    }

    #[test]
    fn and_node() {
        let genes = gene_map();
        let and = GprOperatorType::And;
        assert_eq!(
            binary("active1", and, "active2").eval(&genes).unwrap(),
            GeneActivity::Active
        );
        assert_eq!(
            binary("active1", and, "inactive1").eval(&genes).unwrap(),
            GeneActivity::Inactive
        );
        assert_eq!(
            binary("inactive1", and, "inactive2").eval(&genes).unwrap(),
            GeneActivity::Inactive
        );
    }

    #[test]
    fn or_node() {
        let genes = gene_map();
        let or = GprOperatorType::Or;
        assert_eq!(
            binary("active1", or, "active2").eval(&genes).unwrap(),
            GeneActivity::Active
        );
        assert_eq!(
            binary("active1", or, "inactive1").eval(&genes).unwrap(),
            GeneActivity::Active
        );
        assert_eq!(
            binary("inactive1", or, "inactive2").eval(&genes).unwrap(),
            GeneActivity::Inactive
        );
    }

    #[test]
    fn not_node() {
        let genes = gene_map();
        let not_active =
            Gpr::new_unary_operation(GprOperatorType::Not, Gpr::new_gene_node("active1")).unwrap();
        assert_eq!(not_active.eval(&genes).unwrap(), GeneActivity::Inactive);
        assert!(Gpr::new_unary_operation(GprOperatorType::And, Gpr::new_gene_node("a")).is_err());
    }

    #[test]
    fn missing_gene() {
        let genes = gene_map();
        assert_eq!(
            Gpr::new_gene_node("nope").eval(&genes),
            Err(GprError::GeneNotFound("nope".to_string()))
        );
    }

    #[test]
    fn join_and_references() {
        let rules = vec![
            Gpr::new_gene_node("g1"),
            Gpr::new_gene_node("g2"),
            Gpr::new_gene_node("g3"),
        ];
        let joined = Gpr::join(rules, GprOperatorType::Or).unwrap().unwrap();
        assert_eq!(joined.to_string(), "((g1 or g2) or g3)");
        assert!(joined.references("g2"));
        assert!(!joined.references("g4"));
        assert!(Gpr::join(Vec::new(), GprOperatorType::And).unwrap().is_none());
    }
}
