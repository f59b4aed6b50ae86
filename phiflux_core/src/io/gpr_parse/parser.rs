use indexmap::IndexMap;
use thiserror::Error;

use crate::io::gpr_parse::token::Token;
use crate::metabolic_model::gene::{Gene, Gpr, GprOperatorType};

/*
GPR Grammar:
expression -> or
or -> and ("OR" and)* ;
and -> unary ("AND" unary)* ;
unary -> "NOT" unary | primary ;
primary -> GENE | "(" expression ")" ;

e.g. ( Gene1 AND Gene2) OR (Gene3 AND NOT Gene4)
 */

/// GPR Parser
pub struct GprParser<'gm> {
    /// Tokens from the GPR string, terminated by [`Token::Eof`]
    tokens: Vec<Token>,
    /// Current token being processed
    current: usize,
    /// Genes of the model, genes first seen in the rule are added as active
    gene_map: &'gm mut IndexMap<String, Gene>,
}

impl<'gm> GprParser<'gm> {
    pub fn new(tokens: Vec<Token>, gene_map: &'gm mut IndexMap<String, Gene>) -> GprParser<'gm> {
        GprParser {
            tokens,
            current: 0,
            gene_map,
        }
    }

    // region Parsing Functions

    /// Parse the token vector into a GPR AST
    pub fn parse(&mut self) -> Result<Gpr, ParseError> {
        let gpr = self.or()?;
        if !self.is_at_end() {
            return Err(ParseError::EarlyTermination);
        }
        Ok(gpr)
    }

    fn or(&mut self) -> Result<Gpr, ParseError> {
        let mut expr = self.and()?;
        while self.match_token(&Token::Or) {
            let right = self.and()?;
            expr = Gpr::new_binary_operation(expr, GprOperatorType::Or, right)
                .map_err(|_| ParseError::InvalidBinaryOperator)?;
        }
        Ok(expr)
    }

    fn and(&mut self) -> Result<Gpr, ParseError> {
        let mut expr = self.unary()?;
        while self.match_token(&Token::And) {
            let right = self.unary()?;
            expr = Gpr::new_binary_operation(expr, GprOperatorType::And, right)
                .map_err(|_| ParseError::InvalidBinaryOperator)?;
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Gpr, ParseError> {
        if self.match_token(&Token::Not) {
            let operand = self.unary()?;
            return Gpr::new_unary_operation(GprOperatorType::Not, operand)
                .map_err(|_| ParseError::InvalidUnaryOperator);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Gpr, ParseError> {
        if let Token::Identifier(id) = self.peek().clone() {
            self.current += 1;
            self.insert_if_needed(&id);
            return Ok(Gpr::GeneNode(id));
        }
        if self.match_token(&Token::LeftParen) {
            let expr = self.or()?;
            if !self.match_token(&Token::RightParen) {
                return Err(ParseError::MissingToken(
                    "Expect ')' after expression.".to_string(),
                ));
            }
            return Ok(expr);
        }
        Err(ParseError::ExpectedExpression)
    }

    // endregion Parsing Functions

    // region parsing helper functions

    /// If the current token is `token` advance past it and return true
    fn match_token(&mut self, token: &Token) -> bool {
        if !self.is_at_end() && self.peek() == token {
            self.current += 1;
            return true;
        }
        false
    }

    fn is_at_end(&self) -> bool {
        *self.peek() == Token::Eof
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.current).unwrap_or(&Token::Eof)
    }

    // endregion parsing helper functions

    fn insert_if_needed(&mut self, gene_id: &str) {
        if !self.gene_map.contains_key(gene_id) {
            self.gene_map
                .insert(gene_id.to_string(), Gene::new_active(gene_id));
        }
    }
}

/// Enum representing possible parse errors
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Invalid binary operator encountered, expected only `and` and `or`")]
    InvalidBinaryOperator,
    #[error("Invalid unary operator encountered, expected only `not`")]
    InvalidUnaryOperator,
    /// Missing expected token (e.g. a right parenthesis)
    #[error("Missing expected token: {0}")]
    MissingToken(String),
    #[error("No expression found, check that the GPR string is not empty")]
    ExpectedExpression,
    #[error("Parsing terminated early, check for a `not` between two gene identifiers/grouped expressions")]
    EarlyTermination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::gpr_parse::lexer::Lexer;

    fn parse(rule: &str) -> Result<Gpr, ParseError> {
        let tokens = Lexer::new(rule).lex().unwrap();
        let mut gene_map = IndexMap::new();
        GprParser::new(tokens, &mut gene_map).parse()
    }

    #[test]
    fn single_gene_parse() {
        assert_eq!(parse("Rv1304").unwrap(), Gpr::new_gene_node("Rv1304"));
    }

    #[test]
    fn binary_parse() {
        assert_eq!(
            parse("Rv1304 and Rv0023").unwrap().to_string(),
            "(Rv1304 and Rv0023)"
        );
        assert_eq!(
            parse("Rv1304 or Rv0023").unwrap().to_string(),
            "(Rv1304 or Rv0023)"
        );
    }

    #[test]
    fn not_parse() {
        assert_eq!(parse("not Rv0023").unwrap().to_string(), "(not Rv0023)");
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(
            parse("Rv0001 or Rv0002 and Rv0003").unwrap().to_string(),
            "(Rv0001 or (Rv0002 and Rv0003))"
        );
        assert_eq!(
            parse("(Rv3141 or Rv0023) and Rv0018").unwrap().to_string(),
            "((Rv3141 or Rv0023) and Rv0018)"
        );
    }

    #[test]
    fn repeated_binary_is_left_associative() {
        assert_eq!(
            parse("Rv0001 and Rv0002 and Rv0003").unwrap().to_string(),
            "((Rv0001 and Rv0002) and Rv0003)"
        );
    }

    #[test]
    fn invalid_parse() {
        assert_eq!(
            parse("Rv0001 not Rv0023"),
            Err(ParseError::EarlyTermination)
        );
        assert_eq!(parse(""), Err(ParseError::ExpectedExpression));
        assert!(matches!(
            parse("(Rv0001 or Rv0002"),
            Err(ParseError::MissingToken(_))
        ));
    }

    #[test]
    fn unknown_genes_added() {
        let tokens = Lexer::new("g1 and (g2 or g1)").lex().unwrap();
        let mut gene_map = IndexMap::new();
        GprParser::new(tokens, &mut gene_map).parse().unwrap();
        assert_eq!(gene_map.keys().collect::<Vec<_>>(), vec!["g1", "g2"]);
    }
}
