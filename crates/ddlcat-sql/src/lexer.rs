//! Quote-aware text helpers shared by the splitter and the recognizers
//!
//! SQL delimiters are all ASCII, so scanning works on bytes: a byte of a
//! multi-byte UTF-8 sequence can never be mistaken for one of them and every
//! reported offset is a char boundary.

use ddlcat_core::QualifiedName;
use std::ops::{ControlFlow, Range};

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// End offset (exclusive) of the single-quoted literal opening at `start`.
///
/// An `E` prefix enables backslash escapes. Unterminated literals run to the
/// end of input.
pub(crate) fn skip_single_quoted(bytes: &[u8], start: usize) -> usize {
    let escapes = start > 0
        && matches!(bytes[start - 1], b'E' | b'e')
        && (start < 2 || !is_ident_byte(bytes[start - 2]));

    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if escapes => i += 2,
            b'\'' if bytes.get(i + 1) == Some(&b'\'') => i += 2,
            b'\'' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// End offset (exclusive) of the quoted identifier opening at `start`.
pub(crate) fn skip_double_quoted(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'"' if bytes.get(i + 1) == Some(&b'"') => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Length of the `$tag$` delimiter at `start`, if one opens there.
fn dollar_tag_len(bytes: &[u8], start: usize) -> Option<usize> {
    if start > 0 && is_ident_byte(bytes[start - 1]) {
        return None;
    }
    if bytes.get(start + 1).is_some_and(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut i = start + 1;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    (bytes.get(i) == Some(&b'$')).then_some(i + 1 - start)
}

/// End offset (exclusive) of the dollar-quoted body opening at `start`, or
/// `None` when `start` is not a dollar quote (e.g. a `$1` parameter).
pub(crate) fn skip_dollar_quoted(bytes: &[u8], start: usize) -> Option<usize> {
    let tag_len = dollar_tag_len(bytes, start)?;
    let tag = &bytes[start..start + tag_len];
    let body = start + tag_len;

    let end = bytes[body..]
        .windows(tag_len)
        .position(|w| w == tag)
        .map(|pos| body + pos + tag_len)
        .unwrap_or(bytes.len());
    Some(end)
}

/// Visit every byte outside quoted sections together with its paren depth.
///
/// Both parens of a group are reported at the depth enclosing the group.
pub(crate) fn scan_unquoted<F>(text: &str, mut visit: F)
where
    F: FnMut(usize, u8, usize) -> ControlFlow<()>,
{
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\'' => {
                i = skip_single_quoted(bytes, i);
                continue;
            }
            b'"' => {
                i = skip_double_quoted(bytes, i);
                continue;
            }
            b'$' => {
                if let Some(end) = skip_dollar_quoted(bytes, i) {
                    i = end;
                    continue;
                }
            }
            b')' => depth = depth.saturating_sub(1),
            _ => {}
        }

        if visit(i, b, depth).is_break() {
            return;
        }
        if b == b'(' {
            depth += 1;
        }
        i += 1;
    }
}

/// Byte spans of the pieces between separators at paren depth zero,
/// trimmed, empty pieces dropped
fn spans_where(text: &str, is_sep: impl Fn(u8) -> bool) -> Vec<Range<usize>> {
    let mut raw = Vec::new();
    let mut start = 0;

    scan_unquoted(text, |i, b, depth| {
        if depth == 0 && is_sep(b) {
            raw.push(start..i);
            start = i + 1;
        }
        ControlFlow::Continue(())
    });
    raw.push(start..text.len());

    raw.into_iter()
        .filter_map(|span| {
            let piece = &text[span.clone()];
            let lead = piece.len() - piece.trim_start().len();
            let trimmed = piece.trim();
            (!trimmed.is_empty()).then(|| span.start + lead..span.start + lead + trimmed.len())
        })
        .collect()
}

/// Split on `sep` at paren depth zero, trimming pieces and dropping empty ones
pub fn split_top_level(text: &str, sep: u8) -> Vec<&str> {
    spans_where(text, |b| b == sep)
        .into_iter()
        .map(|span| &text[span])
        .collect()
}

/// Split into whitespace-separated words; quoted text and parenthesised
/// groups never break a word.
pub fn words(text: &str) -> Vec<&str> {
    WordList::new(text).iter().collect()
}

/// Words of a text together with their positions, so that a run of words
/// can be sliced back out with its original spacing
#[derive(Debug, Clone)]
pub struct WordList<'a> {
    text: &'a str,
    spans: Vec<Range<usize>>,
}

impl<'a> WordList<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            spans: spans_where(text, |b| b.is_ascii_whitespace()),
        }
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a str> {
        self.spans.get(index).map(|span| &self.text[span.clone()])
    }

    /// Whether word `index` is the given keyword
    pub fn is(&self, index: usize, keyword: &str) -> bool {
        self.get(index).is_some_and(|w| is_keyword(w, keyword))
    }

    /// First word at or after `from` matching `pred`
    pub fn position(&self, from: usize, pred: impl Fn(&str) -> bool) -> Option<usize> {
        (from..self.len()).find(|&i| self.get(i).is_some_and(&pred))
    }

    /// Original text covering words `start..end`
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        let end = end.min(self.len());
        if start >= end {
            return "";
        }
        &self.text[self.spans[start].start..self.spans[end - 1].end]
    }

    /// Original text from word `start` to the end of input
    pub fn rest(&self, start: usize) -> &'a str {
        self.spans
            .get(start)
            .map_or("", |span| self.text[span.start..].trim_end())
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.spans.iter().map(|span| &self.text[span.clone()])
    }
}

/// Body of the first parenthesised group at depth zero
pub fn first_group(text: &str) -> Option<&str> {
    let mut open = None;
    scan_unquoted(text, |i, b, depth| {
        if b == b'(' && depth == 0 {
            open = Some(i);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
    paren_body(text, open?)
}

/// Offset of the `)` closing the `(` at `open`
pub fn matching_paren(text: &str, open: usize) -> Option<usize> {
    if text.as_bytes().get(open) != Some(&b'(') {
        return None;
    }

    let mut target: Option<usize> = None;
    let mut found = None;
    scan_unquoted(text, |i, b, depth| {
        if i == open {
            target = Some(depth);
        } else if b == b')' && i > open && Some(depth) == target {
            found = Some(i);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
    found
}

/// Text between the `(` at `open` and its matching `)`
pub fn paren_body(text: &str, open: usize) -> Option<&str> {
    matching_paren(text, open).map(|close| &text[open + 1..close])
}

/// Remove identifier quoting, undoubling embedded quotes
pub fn unquote_ident(ident: &str) -> String {
    let ident = ident.trim();
    match ident.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => ident.to_string(),
    }
}

/// Split a dotted name into unquoted parts
pub fn name_parts(name: &str) -> Vec<String> {
    split_top_level(name, b'.').into_iter().map(unquote_ident).collect()
}

/// Qualify a possibly dotted name, falling back to `default_schema`
///
/// `db.schema.name` keeps only the schema and name.
pub fn qualify(name: &str, default_schema: &str) -> QualifiedName {
    let mut parts = name_parts(name);
    let object = parts.pop().unwrap_or_default();
    let schema = parts.pop().unwrap_or_else(|| default_schema.to_string());
    QualifiedName::new(schema, object)
}

/// Unquoted leading identifier of each comma-separated element
pub fn ident_list(text: &str) -> Vec<String> {
    split_top_level(text, b',')
        .into_iter()
        .filter_map(|element| words(element).first().map(|w| unquote_ident(w)))
        .collect()
}

/// Decode a string literal: `'...'`, `E'...'` or `$tag$...$tag$`
pub fn parse_string_literal(text: &str) -> Option<String> {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix(|c: char| c == 'E' || c == 'e') {
        if rest.starts_with('\'') {
            return parse_escaped_literal(rest);
        }
    }

    if let Some(inner) = text.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        if inner.replace("''", "").contains('\'') {
            return None;
        }
        return Some(inner.replace("''", "'"));
    }

    let bytes = text.as_bytes();
    if bytes.first() == Some(&b'$') {
        let tag_len = dollar_tag_len(bytes, 0)?;
        let tag = &text[..tag_len];
        let inner = text[tag_len..].strip_suffix(tag)?;
        return Some(inner.to_string());
    }

    None
}

fn parse_escaped_literal(text: &str) -> Option<String> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                other => out.push(other),
            },
            '\'' => {
                // only a doubled quote may appear inside
                if chars.next()? != '\'' {
                    return None;
                }
                out.push('\'');
            }
            other => out.push(other),
        }
    }
    Some(out)
}

/// Case-insensitive keyword comparison
pub fn is_keyword(word: &str, keyword: &str) -> bool {
    word.eq_ignore_ascii_case(keyword)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn split_respects_parens_and_quotes() {
        let parts = split_top_level("a numeric(10, 2), b text DEFAULT 'x,y', \"c,d\" int", b',');
        assert_eq!(parts, vec!["a numeric(10, 2)", "b text DEFAULT 'x,y'", "\"c,d\" int"]);
    }

    #[test]
    fn split_skips_dollar_bodies() {
        let parts = split_top_level("$$a,b$$, $fn$c,d$fn$, $1", b',');
        assert_eq!(parts, vec!["$$a,b$$", "$fn$c,d$fn$", "$1"]);
    }

    #[test]
    fn words_keep_groups_together() {
        assert_eq!(
            words("id   numeric (10, 2) DEFAULT 'a b'  NOT NULL"),
            vec!["id", "numeric", "(10, 2)", "DEFAULT", "'a b'", "NOT", "NULL"]
        );
        assert_eq!(words("\"first name\" text"), vec!["\"first name\"", "text"]);
    }

    #[test]
    fn word_list_slices_original_text() {
        let words = WordList::new("amount  numeric(10,  2)   NOT NULL");
        assert_eq!(words.len(), 4);
        assert_eq!(words.slice(1, 2), "numeric(10,  2)");
        assert_eq!(words.slice(0, 2), "amount  numeric(10,  2)");
        assert_eq!(words.rest(2), "NOT NULL");
        assert!(words.is(3, "null"));
        assert_eq!(words.position(0, |w| is_keyword(w, "NOT")), Some(2));
        assert_eq!(words.slice(3, 3), "");
    }

    #[test]
    fn first_group_body() {
        assert_eq!(first_group("PRIMARY KEY (a, \"b\")"), Some("a, \"b\""));
        assert_eq!(first_group("UNIQUE NULLS NOT DISTINCT(email)"), Some("email"));
        assert_eq!(first_group("no group"), None);
    }

    #[test]
    fn matching_paren_skips_nested_and_quoted() {
        let text = "f(a, (b), ')') tail";
        let close = matching_paren(text, 1).unwrap();
        assert_eq!(&text[close..], ") tail");
        assert_eq!(paren_body(text, 1), Some("a, (b), ')'"));
        assert_eq!(matching_paren(text, 0), None);
    }

    #[test]
    fn qualify_names() {
        assert_eq!(qualify("users", "public"), QualifiedName::new("public", "users"));
        assert_eq!(qualify("auth.users", "public"), QualifiedName::new("auth", "users"));
        assert_eq!(qualify("\"My App\".\"Users\"", "public"), QualifiedName::new("My App", "Users"));
        assert_eq!(qualify("db.auth.users", "public"), QualifiedName::new("auth", "users"));
    }

    #[test]
    fn unquote_identifiers() {
        assert_eq!(unquote_ident("\"say \"\"hi\"\"\""), "say \"hi\"");
        assert_eq!(unquote_ident(" plain "), "plain");
    }

    #[test]
    fn ident_list_takes_leading_identifier() {
        assert_eq!(ident_list("user_id ASC, \"Email\" DESC NULLS LAST"), vec!["user_id", "Email"]);
    }

    #[test]
    fn string_literals() {
        assert_eq!(parse_string_literal("'it''s'"), Some("it's".to_string()));
        assert_eq!(parse_string_literal("E'line\\nnext'"), Some("line\nnext".to_string()));
        assert_eq!(parse_string_literal("$$raw 'text'$$"), Some("raw 'text'".to_string()));
        assert_eq!(parse_string_literal("$c$x$c$"), Some("x".to_string()));
        assert_eq!(parse_string_literal("NULL"), None);
        assert_eq!(parse_string_literal("'a' || 'b'"), None);
    }
}
