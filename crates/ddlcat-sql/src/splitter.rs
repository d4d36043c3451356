//! Statement splitting
//!
//! Turns one file's text into its statements, in source order. A `;` only
//! terminates a statement at paren depth zero and outside quoted text.
//! Comments are replaced by a single space so recognizers see plain DDL.

use crate::lexer::{skip_double_quoted, skip_dollar_quoted, skip_single_quoted};

/// Lazy iterator over the statements of a SQL source
pub struct StatementSplitter<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> StatementSplitter<'a> {
    /// Create a splitter over `text`
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Scan one raw statement starting at `start`.
    ///
    /// Returns the comment-free text and the offset just past its terminator.
    fn scan_statement(&self, start: usize) -> (String, usize) {
        let text = self.text;
        let bytes = text.as_bytes();
        let mut out = String::new();
        let mut depth = 0usize;
        let mut segment = start;
        let mut i = start;

        while i < bytes.len() {
            match bytes[i] {
                b'\'' => i = skip_single_quoted(bytes, i),
                b'"' => i = skip_double_quoted(bytes, i),
                b'$' => i = skip_dollar_quoted(bytes, i).unwrap_or(i + 1),
                b'-' if bytes.get(i + 1) == Some(&b'-') => {
                    out.push_str(&text[segment..i]);
                    out.push(' ');
                    i = bytes[i..]
                        .iter()
                        .position(|&b| b == b'\n')
                        .map_or(bytes.len(), |p| i + p);
                    segment = i;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    out.push_str(&text[segment..i]);
                    out.push(' ');
                    i = skip_block_comment(bytes, i);
                    segment = i;
                }
                b'(' => {
                    depth += 1;
                    i += 1;
                }
                b')' => {
                    depth = depth.saturating_sub(1);
                    i += 1;
                }
                b';' if depth == 0 => {
                    out.push_str(&text[segment..i]);
                    return (out, i + 1);
                }
                _ => i += 1,
            }
        }

        out.push_str(&text[segment..]);
        (out, bytes.len())
    }
}

/// End offset (exclusive) of the block comment opening at `start`; block
/// comments nest.
fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    let mut nesting = 0usize;
    let mut i = start;

    while i < bytes.len() {
        match (bytes[i], bytes.get(i + 1)) {
            (b'/', Some(b'*')) => {
                nesting += 1;
                i += 2;
            }
            (b'*', Some(b'/')) => {
                nesting -= 1;
                i += 2;
                if nesting == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    bytes.len()
}

impl Iterator for StatementSplitter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while self.pos < self.text.len() {
            let (statement, next) = self.scan_statement(self.pos);
            self.pos = next;

            let statement = statement.trim();
            if !statement.is_empty() {
                return Some(statement.to_string());
            }
        }
        None
    }
}

/// Split `text` into trimmed, non-empty statements
pub fn split_statements(text: &str) -> StatementSplitter<'_> {
    StatementSplitter::new(text)
}
