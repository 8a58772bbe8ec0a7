//! Named parameter handling.
//!
//! Callers may spell parameter keys with or without the leading `:` marker;
//! [`tokenize_params`] brings them to the canonical `:name` form before they
//! reach a [`crate::Connection`]. For drivers that only understand positional
//! markers, [`bind_positional`] rewrites the SQL text.

use crate::error::{Error, Result};
use crate::types::{Dialect, Params, PlaceholderStyle, Value};
use sqlparser::tokenizer::{Location, Token, TokenWithSpan, Tokenizer};
use std::fmt::Write;
use std::ops::Range;
#[cfg(feature = "tracing")]
use tracing::trace;

/// Prefix of a named bind parameter.
pub const MARKER: char = ':';

/// Strips every leading marker from a parameter key.
pub fn strip_marker(key: &str) -> &str {
    key.trim_start_matches(MARKER)
}

/// Canonical marker-prefixed form of a parameter or column name.
pub fn marker(name: &str) -> String {
    format!("{MARKER}{}", strip_marker(name))
}

/// Normalizes parameter keys to `:name`.
///
/// `{"id": 5}` and `{":id": 5}` yield the same map. When two keys collapse
/// to the same name the first position is kept with the last value.
pub fn tokenize_params<I, K, V>(params: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Value>,
{
    params
        .into_iter()
        .map(|(key, value)| (marker(key.as_ref()), value.into()))
        .collect()
}

/// A `:name` marker located in SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedMarker {
    /// Byte range of the marker in the source text, leading `:` included.
    pub span: Range<usize>,
    pub name: String,
}

/// Finds the `:name` markers of `sql` in source order.
///
/// Markers inside string literals, quoted identifiers and comments are not
/// reported, nor is the PostgreSQL `::` cast operator.
pub fn find_markers(sql: &str, dialect: Dialect) -> Result<Vec<NamedMarker>> {
    let sql_dialect = dialect.to_sqlparser_dialect();
    let tokens = Tokenizer::new(sql_dialect.as_ref(), sql)
        .with_unescape(false)
        .tokenize_with_location()?;

    let mut markers = Vec::new();
    let mut iter = tokens.iter().peekable();

    while let Some(token) = iter.next() {
        let (name, end) = match &token.token {
            Token::Colon => {
                let word = iter.next_if(|next| {
                    matches!(&next.token, Token::Word(word) if word.quote_style.is_none())
                });
                match word {
                    Some(TokenWithSpan {
                        token: Token::Word(word),
                        span,
                    }) => (word.value.clone(), span.end),
                    _ => continue,
                }
            }
            Token::Placeholder(p) if p.starts_with(MARKER) && p.len() > 1 => {
                (strip_marker(p).to_string(), token.span.end)
            }
            _ => continue,
        };

        let start = location_to_offset(sql, token.span.start);
        let end = location_to_offset(sql, end);
        match (start, end) {
            (Some(start), Some(end)) if start < end => markers.push(NamedMarker {
                span: start..end,
                name,
            }),
            _ => {
                return Err(Error::Tokenize(format!(
                    "marker ':{name}' has no source location"
                )))
            }
        }
    }

    Ok(markers)
}

/// Rewrites `:name` markers into the dialect's positional markers.
///
/// Returns the rewritten SQL and the values in marker order. Only the markers
/// are replaced; all other text is copied from `sql` unchanged. A marker that
/// appears twice binds its value twice.
pub fn bind_positional(sql: &str, dialect: Dialect, params: &Params) -> Result<(String, Vec<Value>)> {
    let markers = find_markers(sql, dialect)?;

    let style = dialect.placeholder_style();
    let mut rewritten = String::with_capacity(sql.len());
    let mut values = Vec::with_capacity(markers.len());
    let mut cursor = 0;

    for found in &markers {
        let value = params
            .get(&marker(&found.name))
            .ok_or_else(|| Error::MissingParameter(found.name.clone()))?;
        values.push(value.clone());

        rewritten.push_str(&sql[cursor..found.span.start]);
        match style {
            PlaceholderStyle::QuestionMark => rewritten.push('?'),
            PlaceholderStyle::Numbered => {
                // Writing to a String cannot fail.
                let _ = write!(rewritten, "${}", values.len());
            }
        }
        cursor = found.span.end;
    }
    rewritten.push_str(&sql[cursor..]);

    #[cfg(feature = "tracing")]
    trace!(sql = %rewritten, bound = values.len(), "rewrote named parameters");

    Ok((rewritten, values))
}

/// Byte offset of a 1-based tokenizer location. Columns count characters.
fn location_to_offset(sql: &str, location: Location) -> Option<usize> {
    let line = usize::try_from(location.line).ok()?;
    let column = usize::try_from(location.column).ok()?;
    if line == 0 || column == 0 {
        return None;
    }

    let mut current_line = 1usize;
    let mut current_col = 1usize;

    for (offset, ch) in sql.char_indices() {
        if current_line == line && current_col == column {
            return Some(offset);
        }
        if ch == '\n' {
            current_line += 1;
            current_col = 1;
        } else {
            current_col += 1;
        }
    }

    (current_line == line && current_col == column).then_some(sql.len())
}
