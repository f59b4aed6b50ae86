//! Lex a GPR string into a series of tokens for later parsing
use thiserror::Error;

use crate::io::gpr_parse::token::Token;

pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
        }
    }

    /// Consume the source, producing the tokens terminated by [`Token::Eof`]
    pub fn lex(mut self) -> Result<Vec<Token>, LexerError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }
        self.tokens.push(Token::Eof);
        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let c = self.advance();
        match c {
            '(' => self.tokens.push(Token::LeftParen),
            ')' => self.tokens.push(Token::RightParen),
            c if c.is_whitespace() => {}
            c if Lexer::is_identifier_char(c) => self.read_identifier(),
            other => {
                return Err(LexerError::InvalidCharacter {
                    character: other,
                    position: self.start,
                })
            }
        };
        Ok(())
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn read_identifier(&mut self) {
        while !self.is_at_end() && Lexer::is_identifier_char(self.source[self.current]) {
            self.current += 1;
        }
        let text: String = self.source[self.start..self.current].iter().collect();
        let token = match text.to_lowercase().as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            _ => Token::Identifier(text),
        };
        self.tokens.push(token);
    }

    // Gene ids in genome scale models contain digits, dots, dashes and colons
    fn is_identifier_char(c: char) -> bool {
        c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | ':')
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum LexerError {
    #[error("Invalid character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_gene() {
        let tokens = Lexer::new("Rv0023").lex().unwrap();
        assert_eq!(
            tokens,
            vec![Token::Identifier("Rv0023".to_string()), Token::Eof]
        );
    }

    #[test]
    fn grouping() {
        let tokens = Lexer::new("(Rv0023 OR Rv0123)").lex().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LeftParen,
                Token::Identifier("Rv0023".to_string()),
                Token::Or,
                Token::Identifier("Rv0123".to_string()),
                Token::RightParen,
                Token::Eof
            ]
        );
    }

    #[test]
    fn model_style_ids() {
        let tokens = Lexer::new("fig|83333.1.peg-12 and not b0001").lex().err();
        assert_eq!(
            tokens,
            Some(LexerError::InvalidCharacter {
                character: '|',
                position: 3
            })
        );
        let tokens = Lexer::new("83333.1.peg-12 And NOT b0001").lex().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("83333.1.peg-12".to_string()),
                Token::And,
                Token::Not,
                Token::Identifier("b0001".to_string()),
                Token::Eof
            ]
        );
    }
}
