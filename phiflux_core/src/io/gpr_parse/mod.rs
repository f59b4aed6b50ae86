//! Module for parsing Gene Protein Reaction strings into AST values
use indexmap::IndexMap;
use thiserror::Error;

use crate::io::gpr_parse::lexer::LexerError;
use crate::io::gpr_parse::parser::ParseError;
use crate::metabolic_model::gene::{Gene, Gpr};

mod lexer;
pub mod parser;
mod token;

/// Parse a Gene Protein Reaction string into a GPR Tree
///
/// # Parameters
/// - `input`: &str representing the gene protein reaction rule
/// - `gene_map`: map of gene id strings to genes, genes which are referenced by the rule but
///   not yet in the map are inserted as active genes
///
/// # Examples
/// ```rust
/// use indexmap::IndexMap;
/// use phiflux_core::io::gpr_parse::parse_gpr;
/// let mut gene_map = IndexMap::new();
/// let gpr_tree = parse_gpr("Rv0001 and Rv0002", &mut gene_map).unwrap();
/// assert_eq!(gpr_tree.to_string(), "(Rv0001 and Rv0002)");
/// assert_eq!(gene_map.len(), 2);
/// ```
pub fn parse_gpr(input: &str, gene_map: &mut IndexMap<String, Gene>) -> Result<Gpr, GprParseError> {
    let tokens = lexer::Lexer::new(input).lex()?;
    let mut parser = parser::GprParser::new(tokens, gene_map);
    Ok(parser.parse()?)
}

/// Enum representing possible lex and parse errors
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GprParseError {
    #[error("Error occurred during lexing (conversion of GPR string to tokens): {0}")]
    LexingError(#[from] LexerError),
    #[error("Error occurred during parsing (conversion of tokens to GPR tree): {0}")]
    ParsingError(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::gene::{GeneActivity, GprOperation};

    #[test]
    fn test_parse_gpr() {
        let mut gene_map: IndexMap<String, Gene> = IndexMap::new();
        gene_map.insert("Rv0001".to_string(), Gene::new_active("Rv0001"));
        let gpr_tree = parse_gpr("Rv0001 and (Rv0002 or Rv0003)", &mut gene_map).unwrap();
        match &gpr_tree {
            Gpr::Operation(GprOperation::And { left, right }) => {
                assert_eq!(**left, Gpr::new_gene_node("Rv0001"));
                assert_eq!(right.to_string(), "(Rv0002 or Rv0003)");
            }
            _ => panic!("Incorrect parse"),
        }
        assert_eq!(gene_map.len(), 3);
        assert_eq!(gpr_tree.eval(&gene_map).unwrap(), GeneActivity::Active);
    }

    #[test]
    fn grouped_expression_round_trips() {
        let mut gene_map = IndexMap::new();
        let gpr = parse_gpr("(Rv0001 and Rv0002) or Rv0003", &mut gene_map).unwrap();
        assert_eq!(gpr.to_string(), "((Rv0001 and Rv0002) or Rv0003)");
        let reparsed = parse_gpr(&gpr.to_string(), &mut gene_map).unwrap();
        assert_eq!(gpr, reparsed);
    }

    #[test]
    fn errors_are_wrapped() {
        let mut gene_map = IndexMap::new();
        assert!(matches!(
            parse_gpr("g1 & g2", &mut gene_map),
            Err(GprParseError::LexingError(_))
        ));
        assert!(matches!(
            parse_gpr("g1 and", &mut gene_map),
            Err(GprParseError::ParsingError(_))
        ));
    }
}
