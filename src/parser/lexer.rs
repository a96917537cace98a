//! GCode Lexer
//!
//! Splits a single line into address words and comments.
//! No numeric conversion happens here, that is left to the AST step.

/// Token types in GCode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// Address word like "G1", "X-10.5", "F1500"
    Word,
    /// Comment (semicolon or parenthetical)
    Comment,
}

/// A token with its text content
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

/// Tokenize a line of GCode into tokens
///
/// Words end where their numeric part ends, so compact input such as
/// `G1X10Y20` yields three tokens.
pub fn tokenize_line(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some((start_idx, ch)) = chars.next() {
        match ch {
            ' ' | '\t' | '\r' | '\n' | '%' => continue,

            // Block delete marker only counts at the start of a line
            '/' if tokens.is_empty() => continue,

            ';' => {
                tokens.push(Token {
                    kind: TokenKind::Comment,
                    text: line[start_idx..].to_string(),
                });
                break;
            }

            '(' => {
                let mut end_idx = line.len();
                for (idx, ch) in chars.by_ref() {
                    if ch == ')' {
                        end_idx = idx + 1;
                        break;
                    }
                }

                tokens.push(Token {
                    kind: TokenKind::Comment,
                    text: line[start_idx..end_idx].to_string(),
                });
            }

            c if c.is_ascii_alphabetic() => {
                let mut end_idx = start_idx + 1;

                // Allow blanks between the letter and its value ("X 10")
                while let Some(&(_, ' ' | '\t')) = chars.peek() {
                    chars.next();
                }

                let mut value_start = None;
                while let Some(&(idx, next_ch)) = chars.peek() {
                    if is_number_char(next_ch) {
                        value_start.get_or_insert(idx);
                        end_idx = idx + next_ch.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }

                let text = match value_start {
                    Some(value_idx) => format!("{}{}", c, &line[value_idx..end_idx]),
                    None => c.to_string(),
                };

                tokens.push(Token {
                    kind: TokenKind::Word,
                    text,
                });
            }

            // Skip other characters (malformed input)
            _ => continue,
        }
    }

    tokens
}

fn is_number_char(ch: char) -> bool {
    ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+')
}
