//! The tokenizer: raw bytes -> a flat token stream with source
//! coordinates and parenthesis deltas. Grounded on the teacher's own
//! `tokenize_script_data` state machine (`CurrentlyIn` tracks whitespace /
//! token / comment), generalized to emit a flat stream with a parenthesis
//! tag instead of building a recursive token tree, per the arena-based node
//! model this crate uses.

use crate::error::{CompileError, CompileResult};
use crate::value_type::CompileEncoding;

/// A single lexical token: a word, a string literal's inside bytes, or a
/// lone parenthesis.
#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub file: usize,
    pub line: usize,
    pub column: usize,
    pub string: String,
    /// +1 for `(`, -1 for `)`, 0 otherwise.
    pub paren: i8,
}

impl Token {
    pub(crate) fn is_left_paren(&self) -> bool {
        self.paren == 1
    }

    pub(crate) fn is_right_paren(&self) -> bool {
        self.paren == -1
    }
}

#[derive(Clone, Copy, PartialEq)]
enum CurrentlyIn {
    Whitespace,
    /// `true` if the token is a `"`-delimited string.
    Token(bool),
    /// `true` if the comment is the `;* ... *;` multi-line form.
    Comment(bool),
}

/// Tokenize one source file's bytes. `file_index` is the count of files
/// already loaded onto the owning instance (stamped onto every token).
pub(crate) fn tokenize(
    bytes: &[u8],
    file_index: usize,
    filename: &str,
    encoding: CompileEncoding,
) -> CompileResult<Vec<Token>> {
    let mut tokens = Vec::<Token>::new();

    let mut line: usize = 1;
    let mut column: usize = 0;

    let mut current_token_line: usize = 1;
    let mut current_token_column: usize = 1;
    let mut current_token_offset: usize = 0;

    let mut currently_in = CurrentlyIn::Whitespace;

    let len = bytes.len();

    let mut add_token = |tokens: &mut Vec<Token>, currently_in: CurrentlyIn, end: usize, line: usize, column: usize| -> CompileResult<()> {
        let quoted = match currently_in {
            CurrentlyIn::Token(q) => q,
            _ => unreachable!("add_token() called outside a token"),
        };
        let start = current_token_offset + if quoted { 1 } else { 0 };
        let payload = &bytes[start..end];
        let string = encoding
            .decode(payload)
            .map_err(|e| CompileError::syntax(filename, line, column, format!("failed to decode token: {e}")))?;
        tokens.push(Token {
            file: file_index,
            line: current_token_line,
            column: current_token_column,
            string,
            paren: 0,
        });
        Ok(())
    };

    for i in 0..len {
        column += 1;
        let c = bytes[i];

        if c == 0 {
            if i + 1 == len {
                break;
            }
            return Err(CompileError::syntax(filename, line, column, "unexpected embedded NUL byte"));
        }

        if c == b'(' || c == b')' {
            if matches!(currently_in, CurrentlyIn::Token(false)) {
                add_token(&mut tokens, currently_in, i, line, column)?;
                currently_in = CurrentlyIn::Whitespace;
            }
            if matches!(currently_in, CurrentlyIn::Whitespace) {
                tokens.push(Token {
                    file: file_index,
                    line,
                    column,
                    string: (c as char).to_string(),
                    paren: if c == b'(' { 1 } else { -1 },
                });
            }
            // Inside a string literal or a comment, parens are ordinary bytes.
            continue;
        }

        if c == b' ' || c == b'\t' || c == b'\r' || c == b'\n' {
            if matches!(currently_in, CurrentlyIn::Token(false)) {
                add_token(&mut tokens, currently_in, i, line, column)?;
                currently_in = CurrentlyIn::Whitespace;
            }
            if c == b'\n' {
                line += 1;
                column = 0;
                if matches!(currently_in, CurrentlyIn::Comment(false)) {
                    currently_in = CurrentlyIn::Whitespace;
                }
            }
            continue;
        }

        if c == b';' {
            if matches!(currently_in, CurrentlyIn::Token(false)) {
                add_token(&mut tokens, currently_in, i, line, column)?;
                currently_in = CurrentlyIn::Whitespace;
            }
            if matches!(currently_in, CurrentlyIn::Whitespace) {
                let is_multiline = matches!(bytes.get(i + 1), Some(b'*'));
                currently_in = CurrentlyIn::Comment(is_multiline);
            } else if matches!(currently_in, CurrentlyIn::Comment(true)) && matches!(bytes.get(i.wrapping_sub(1)), Some(b'*')) && i > 0 {
                currently_in = CurrentlyIn::Whitespace;
            }
            continue;
        }

        if matches!(currently_in, CurrentlyIn::Comment(_)) {
            continue;
        }

        if matches!(currently_in, CurrentlyIn::Whitespace) {
            currently_in = CurrentlyIn::Token(c == b'"');
            current_token_line = line;
            current_token_column = column;
            current_token_offset = i;
            continue;
        }

        if matches!(currently_in, CurrentlyIn::Token(true)) && c == b'"' {
            add_token(&mut tokens, currently_in, i, line, column)?;
            currently_in = CurrentlyIn::Whitespace;
        }
    }

    match currently_in {
        CurrentlyIn::Token(true) => {
            return Err(CompileError::syntax(filename, current_token_line, current_token_column, "unterminated string literal"));
        }
        CurrentlyIn::Comment(true) => {
            return Err(CompileError::syntax(filename, line, column, "unterminated multi-line comment"));
        }
        CurrentlyIn::Token(false) => {
            add_token(&mut tokens, currently_in, len, line, column)?;
        }
        _ => {}
    }

    // Balance check: running prefix sum of parenthesis tags stays >= 0 and
    // ends at 0. Track opener positions so an unmatched left paren can be
    // reported at the position of the first still-unclosed opener.
    let mut openers: Vec<(usize, usize)> = Vec::new();
    for t in &tokens {
        if t.is_left_paren() {
            openers.push((t.line, t.column));
        } else if t.is_right_paren() {
            if openers.pop().is_none() {
                return Err(CompileError::syntax(filename, t.line, t.column, "unmatched right parenthesis"));
            }
        }
    }
    if let Some((l, c)) = openers.into_iter().next() {
        return Err(CompileError::syntax(filename, l, c, "unmatched left parenthesis"));
    }

    Ok(tokens)
}

#[cfg(test)]
mod test {
    use super::*;

    fn tok(src: &str) -> Vec<Token> {
        tokenize(src.as_bytes(), 0, "test.hsc", CompileEncoding::Utf8).unwrap()
    }

    #[test]
    fn simple_call() {
        let t = tok("(foo 1 2)");
        let strings: Vec<&str> = t.iter().map(|x| x.string.as_str()).collect();
        assert_eq!(strings, vec!["(", "foo", "1", "2", ")"]);
    }

    #[test]
    fn string_literal_strips_delimiters() {
        let t = tok("(print \"hello world\")");
        assert_eq!(t[2].string, "hello world");
    }

    #[test]
    fn line_and_column_tracking() {
        let t = tok("(a\n  b)");
        let b = t.iter().find(|x| x.string == "b").unwrap();
        assert_eq!((b.line, b.column), (2, 3));
    }

    #[test]
    fn single_line_comment_is_transparent() {
        let with = tok("(a b)");
        let without = tok("(a ; comment here\n b)");
        let a: Vec<&str> = with.iter().map(|x| x.string.as_str()).collect();
        let b: Vec<&str> = without.iter().map(|x| x.string.as_str()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn multi_line_comment_is_transparent() {
        let with = tok("(a b)");
        let without = tok("(a ;* comment\nspanning lines *; b)");
        let a: Vec<&str> = with.iter().map(|x| x.string.as_str()).collect();
        let b: Vec<&str> = without.iter().map(|x| x.string.as_str()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn unterminated_string_errors() {
        let r = tokenize(b"(print \"oops)", 0, "t.hsc", CompileEncoding::Utf8);
        assert!(r.is_err());
    }

    #[test]
    fn embedded_nul_errors() {
        let r = tokenize(b"(a\0b)", 0, "t.hsc", CompileEncoding::Utf8);
        assert!(r.is_err());
    }

    #[test]
    fn unmatched_right_paren_errors() {
        let r = tokenize(b"(a b))", 0, "t.hsc", CompileEncoding::Utf8);
        assert!(r.is_err());
    }

    #[test]
    fn unmatched_left_paren_errors() {
        let r = tokenize(b"((a b)", 0, "t.hsc", CompileEncoding::Utf8);
        assert!(r.is_err());
    }
}
