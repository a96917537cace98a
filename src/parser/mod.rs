//! GCode Parser
//!
//! Turns program text into [`Block`]s of numeric address words.
//! Focused solely on tokenization and value extraction; what the words
//! mean is decided by the machine.

pub mod ast;
pub mod lexer;

pub use ast::{Block, Comment, Word, WordSource};
pub use lexer::{Token, TokenKind, tokenize_line};

use crate::error::ParseError;

/// Parse a single line of GCode into a block
pub fn parse_line(line: &str) -> Result<Block, ParseError> {
    let tokens = lexer::tokenize_line(line);
    ast::tokens_to_block(tokens)
}

/// Parse a whole program, one block per line.
///
/// Blank and comment-only lines are kept as empty blocks so block
/// numbers line up with source lines.
pub fn parse_program(content: &str) -> Result<Vec<Block>, ParseError> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| {
            parse_line(line).map_err(|source| ParseError::AtLine {
                line: idx + 1,
                source: Box::new(source),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_command() {
        let block = parse_line("G1 X10 Y20").unwrap();

        assert_eq!(block.words.len(), 3);
        assert_eq!(block.words[0], Word { letter: 'G', value: 1.0 });
        assert_eq!(block.word('X'), Some(10.0));
        assert_eq!(block.word('Y'), Some(20.0));
    }

    #[test]
    fn test_parse_with_comment() {
        let block = parse_line("G0 Z5 ; lift").unwrap();

        assert_eq!(
            block.comment,
            Some(Comment {
                text: " lift".to_string()
            })
        );
    }

    #[test]
    fn test_parse_empty_and_comment_lines() {
        assert!(parse_line("   ").unwrap().is_empty());
        assert!(parse_line("(setup)").unwrap().is_empty());
    }

    #[test]
    fn test_parse_program_reports_line() {
        let err = parse_program("G0 X1\nG1 X1..2\n").unwrap_err();
        match err {
            ParseError::AtLine { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
