//! Abstract Syntax Tree for GCode
//!
//! A line becomes a [`Block`]: its address words in source order plus an
//! optional comment. Numeric values are parsed here so that consumers only
//! ever see `f64` fields.

use crate::error::ParseError;
use crate::parser::lexer::{Token, TokenKind};

/// An address word like "G1" or "X-10.5"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Word {
    /// Upper-case address letter
    pub letter: char,
    pub value: f64,
}

/// A comment (semicolon or parenthetical)
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Comment text (without the delimiters)
    pub text: String,
}

/// One line of GCode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub words: Vec<Word>,
    pub comment: Option<Comment>,
}

/// Read access to the numeric fields of a command.
///
/// This is the only view the position interpreter has of its input.
pub trait WordSource {
    /// Value bound to `letter`, or `None` when the field is absent.
    fn word(&self, letter: char) -> Option<f64>;

    /// Value bound to `letter`, or `default` when the field is absent.
    fn word_or(&self, letter: char, default: f64) -> f64 {
        self.word(letter).unwrap_or(default)
    }
}

impl WordSource for Block {
    fn word(&self, letter: char) -> Option<f64> {
        let letter = letter.to_ascii_uppercase();
        self.words
            .iter()
            .find(|w| w.letter == letter)
            .map(|w| w.value)
    }
}

impl Block {
    /// True when the line carried no words (blank or comment only)
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// All values bound to `letter`, in source order (a block may hold
    /// several G or M words).
    pub fn values(&self, letter: char) -> impl Iterator<Item = f64> + '_ {
        let letter = letter.to_ascii_uppercase();
        self.words
            .iter()
            .filter(move |w| w.letter == letter)
            .map(|w| w.value)
    }

    /// Whether `letter` appears with exactly `code` (e.g. `has_code('G', 90.1)`)
    pub fn has_code(&self, letter: char, code: f64) -> bool {
        self.values(letter).any(|v| same_code(v, code))
    }
}

/// Compare G/M code numbers, tolerating decimal text like "90.10"
pub(crate) fn same_code(value: f64, code: f64) -> bool {
    (value - code).abs() < 1e-6
}

/// Convert tokens into a block
pub fn tokens_to_block(tokens: Vec<Token>) -> Result<Block, ParseError> {
    let mut block = Block::default();

    for token in tokens {
        match token.kind {
            TokenKind::Word => block.words.push(parse_word_token(&token.text)?),
            TokenKind::Comment => {
                // Keep the first comment only; later ones are usually
                // inline annotations of the same block.
                if block.comment.is_none() {
                    block.comment = Some(Comment {
                        text: extract_comment_text(&token.text),
                    });
                }
            }
        }
    }

    Ok(block)
}

/// Parse a word token like "X10.5" into a Word
fn parse_word_token(text: &str) -> Result<Word, ParseError> {
    let mut chars = text.chars();
    let letter = chars
        .next()
        .filter(|c| c.is_ascii_alphabetic())
        .ok_or_else(|| ParseError::InvalidNumber(text.to_string()))?
        .to_ascii_uppercase();

    let value_text = chars.as_str();
    if value_text.is_empty() {
        return Err(ParseError::MissingValue(letter));
    }

    let value = value_text
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber(text.to_string()))?;

    Ok(Word { letter, value })
}

/// Extract comment text, removing delimiters
fn extract_comment_text(text: &str) -> String {
    if let Some(stripped) = text.strip_prefix(';') {
        stripped.to_string()
    } else if let Some(inner) = text.strip_prefix('(') {
        inner.strip_suffix(')').unwrap_or(inner).to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_word_token() {
        let word = parse_word_token("x10.5").unwrap();
        assert_eq!(word.letter, 'X');
        assert_eq!(word.value, 10.5);
    }

    #[test]
    fn test_parse_word_token_rejects_garbage() {
        assert_eq!(
            parse_word_token("X1.2.3"),
            Err(ParseError::InvalidNumber("X1.2.3".to_string()))
        );
        assert_eq!(parse_word_token("F"), Err(ParseError::MissingValue('F')));
    }

    #[test]
    fn test_extract_comments() {
        assert_eq!(extract_comment_text("; note"), " note");
        assert_eq!(extract_comment_text("(note)"), "note");
        assert_eq!(extract_comment_text("(open"), "open");
    }

    #[test]
    fn test_word_source_lookup() {
        let block = Block {
            words: vec![
                Word { letter: 'G', value: 1.0 },
                Word { letter: 'X', value: 3.0 },
            ],
            comment: None,
        };

        assert_eq!(block.word('x'), Some(3.0));
        assert_eq!(block.word('Y'), None);
        assert_eq!(block.word_or('Y', 7.0), 7.0);
        assert!(block.has_code('G', 1.0));
        assert!(!block.has_code('G', 0.0));
    }
}
