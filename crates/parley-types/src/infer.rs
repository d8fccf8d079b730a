//! Type inference from raw token text to [`Value`]s.
//!
//! Both the command parser and the rule parser feed tokens through an
//! [`Inferrer`]; they differ only in their toggles. The command parser runs
//! with everything off (bare tokens stay strings, brackets carry no special
//! meaning); the rule parser enables complex types and strict strings so
//! that list/map literals parse and quoted strings are distinguishable from
//! bare identifiers.
//!
//! Inference is priority-ordered, first match wins: regex literal, integer,
//! float, boolean, (quoted) string, then list/map literals, with a bare
//! string as the final fallback.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::value::Value;

pub(crate) static INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").unwrap());
pub(crate) static FLOAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+\.\d+$|^-?\d+(\.\d+)?[eE][+-]?\d+$").unwrap());

/// Errors raised while inferring a value from a token. These are user-caused
/// parse errors and are reported verbatim to the caller.
#[derive(Debug, thiserror::Error)]
pub enum InferError {
    #[error("invalid regular expression /{pattern}/: {source}")]
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },

    #[error("unterminated string literal: {0}")]
    UnterminatedString(String),

    #[error("malformed list literal: {0}")]
    MalformedList(String),

    #[error("malformed map literal: {0}")]
    MalformedMap(String),
}

/// A configurable token-to-value inferrer.
///
/// Construction follows the builder style:
///
/// ```
/// use parley_types::Inferrer;
///
/// let infer = Inferrer::default().complex_types(true).strict_strings(true);
/// assert!(infer.infer("[1, 2, 3]").is_ok());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Inferrer {
    complex_types: bool,
    strict_strings: bool,
}

impl Inferrer {
    /// Enable or disable parsing of `[...]` and `{...}` literals.
    pub fn complex_types(mut self, on: bool) -> Self {
        self.complex_types = on;
        self
    }

    /// When on, only tokens wrapped in matching quotes become strings at the
    /// string-inference step; bare tokens fall through to complex-type
    /// parsing before landing on the bare-string fallback.
    pub fn strict_strings(mut self, on: bool) -> Self {
        self.strict_strings = on;
        self
    }

    /// Infer the type of a single token.
    pub fn infer(&self, token: &str) -> Result<Value, InferError> {
        // /.../ regex literal
        if token.len() >= 2 && token.starts_with('/') && token.ends_with('/') {
            let pattern = &token[1..token.len() - 1];
            return Regex::new(pattern).map(Value::Regex).map_err(|source| {
                InferError::InvalidRegex {
                    pattern: pattern.to_string(),
                    source,
                }
            });
        }

        // Integer. An overflowing literal falls through to the float and
        // string steps instead of erroring.
        if INT_RE.is_match(token) {
            if let Ok(i) = token.parse::<i64>() {
                return Ok(Value::Int(i));
            }
        }

        if FLOAT_RE.is_match(token) {
            if let Ok(x) = token.parse::<f64>() {
                return Ok(Value::Float(x));
            }
        }

        if token.eq_ignore_ascii_case("true") {
            return Ok(Value::Bool(true));
        }
        if token.eq_ignore_ascii_case("false") {
            return Ok(Value::Bool(false));
        }

        // String step. A quoted token is always a string; with strict
        // strings off, any bare token is too.
        if let Some(stripped) = strip_quotes(token)? {
            return Ok(Value::String(stripped));
        }
        if !self.strict_strings {
            return Ok(Value::String(token.to_string()));
        }

        if self.complex_types {
            if token.starts_with('[') {
                return self.infer_list(token);
            }
            if token.starts_with('{') {
                return self.infer_map(token);
            }
        }

        // Bare identifiers under strict strings remain strings.
        Ok(Value::String(token.to_string()))
    }

    /// Infer every token in order.
    pub fn infer_all(&self, tokens: &[String]) -> Result<Vec<Value>, InferError> {
        tokens.iter().map(|t| self.infer(t)).collect()
    }

    fn infer_list(&self, token: &str) -> Result<Value, InferError> {
        let inner = token
            .strip_prefix('[')
            .and_then(|t| t.strip_suffix(']'))
            .ok_or_else(|| InferError::MalformedList(token.to_string()))?;

        let mut items = Vec::new();
        for part in split_top_level(inner, ',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            items.push(self.infer(part)?);
        }
        Ok(Value::List(items))
    }

    fn infer_map(&self, token: &str) -> Result<Value, InferError> {
        let inner = token
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
            .ok_or_else(|| InferError::MalformedMap(token.to_string()))?;

        let mut entries = BTreeMap::new();
        for part in split_top_level(inner, ',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (raw_key, raw_value) = split_entry(part)
                .ok_or_else(|| InferError::MalformedMap(token.to_string()))?;
            let key = match strip_quotes(raw_key.trim())? {
                Some(k) => k,
                None => raw_key.trim().to_string(),
            };
            entries.insert(key, self.infer(raw_value.trim())?);
        }
        Ok(Value::Map(entries))
    }
}

/// If the token is wrapped in matching single or double quotes, return its
/// unescaped contents. A token that *opens* a quote without closing it is an
/// error; a token that doesn't open one returns `None`.
fn strip_quotes(token: &str) -> Result<Option<String>, InferError> {
    let mut chars = token.chars();
    let quote = match chars.next() {
        Some(c @ ('"' | '\'')) => c,
        _ => return Ok(None),
    };

    let mut out = String::with_capacity(token.len());
    let mut escaped = false;
    let mut closed = false;

    for c in chars {
        if closed {
            // Trailing garbage after the closing quote: not a plain quoted
            // string, leave it to the fallback.
            return Ok(None);
        }
        if escaped {
            match c {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                '\\' | '"' | '\'' => out.push(c),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            c if c == quote => closed = true,
            c => out.push(c),
        }
    }

    if !closed {
        return Err(InferError::UnterminatedString(token.to_string()));
    }
    Ok(Some(out))
}

/// Split `s` on `sep` at nesting depth zero, honoring quotes and backslash
/// escapes so separators inside string literals or nested collections don't
/// split.
fn split_top_level(s: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in s.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                current.push(c);
                escaped = true;
            }
            '"' | '\'' => {
                match quote {
                    Some(q) if q == c => quote = None,
                    None => quote = Some(c),
                    _ => {}
                }
                current.push(c);
            }
            '[' | '{' if quote.is_none() => {
                depth += 1;
                current.push(c);
            }
            ']' | '}' if quote.is_none() => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if c == sep && depth == 0 && quote.is_none() => {
                parts.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Split a `key: value` map entry at the first top-level colon.
fn split_entry(s: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' | '\'' => match quote {
                Some(q) if q == c => quote = None,
                None => quote = Some(c),
                _ => {}
            },
            '[' | '{' if quote.is_none() => depth += 1,
            ']' | '}' if quote.is_none() => depth = depth.saturating_sub(1),
            ':' if depth == 0 && quote.is_none() => {
                return Some((&s[..i], &s[i + 1..]));
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lax() -> Inferrer {
        Inferrer::default()
    }

    fn strict() -> Inferrer {
        Inferrer::default().complex_types(true).strict_strings(true)
    }

    #[test]
    fn infers_integers() {
        assert_eq!(lax().infer("42").unwrap(), Value::Int(42));
        assert_eq!(lax().infer("-17").unwrap(), Value::Int(-17));
    }

    #[test]
    fn integer_overflow_falls_through_to_float() {
        let v = lax().infer("99999999999999999999").unwrap();
        assert!(matches!(v, Value::Float(_)));
    }

    #[test]
    fn infers_floats() {
        assert_eq!(lax().infer("3.14").unwrap(), Value::Float(3.14));
        assert_eq!(lax().infer("-0.5").unwrap(), Value::Float(-0.5));
        assert_eq!(lax().infer("1e6").unwrap(), Value::Float(1e6));
        assert_eq!(lax().infer("2.5E-3").unwrap(), Value::Float(2.5e-3));
    }

    #[test]
    fn infers_bools_case_insensitive() {
        assert_eq!(lax().infer("true").unwrap(), Value::Bool(true));
        assert_eq!(lax().infer("FALSE").unwrap(), Value::Bool(false));
    }

    #[test]
    fn infers_regex_literals() {
        let v = strict().infer(r"/^v\d+$/").unwrap();
        match v {
            Value::Regex(re) => assert_eq!(re.as_str(), r"^v\d+$"),
            other => panic!("expected regex, got {other:?}"),
        }
    }

    #[test]
    fn invalid_regex_is_an_error() {
        let err = strict().infer("/[unclosed/").unwrap_err();
        assert!(matches!(err, InferError::InvalidRegex { .. }));
    }

    #[test]
    fn bare_tokens_are_strings_in_lax_mode() {
        assert_eq!(lax().infer("hello").unwrap(), Value::String("hello".into()));
        // brackets carry no special meaning without complex types
        assert_eq!(lax().infer("[1,2]").unwrap(), Value::String("[1,2]".into()));
    }

    #[test]
    fn quoted_strings_strip_quotes_and_unescape() {
        assert_eq!(
            lax().infer("\"hello world\"").unwrap(),
            Value::String("hello world".into())
        );
        assert_eq!(
            strict().infer(r#""tab\there""#).unwrap(),
            Value::String("tab\there".into())
        );
        assert_eq!(
            strict().infer("'single'").unwrap(),
            Value::String("single".into())
        );
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = strict().infer("\"oops").unwrap_err();
        assert!(matches!(err, InferError::UnterminatedString(_)));
    }

    #[test]
    fn bare_identifiers_remain_strings_under_strict() {
        assert_eq!(
            strict().infer("user.groups").unwrap(),
            Value::String("user.groups".into())
        );
    }

    #[test]
    fn quoted_numbers_stay_numbers_before_string_step() {
        // priority order: numeric inference runs before quote stripping,
        // so only the *unquoted* shape is numeric
        assert_eq!(strict().infer("\"42\"").unwrap(), Value::String("42".into()));
        assert_eq!(strict().infer("42").unwrap(), Value::Int(42));
    }

    #[test]
    fn parses_list_literals() {
        let v = strict().infer(r#"["us-east-1", "us-west-2"]"#).unwrap();
        assert_eq!(
            v,
            Value::List(vec![
                Value::String("us-east-1".into()),
                Value::String("us-west-2".into()),
            ])
        );
    }

    #[test]
    fn parses_nested_lists() {
        let v = strict().infer("[1, [2, 3], 4]").unwrap();
        assert_eq!(
            v,
            Value::List(vec![
                Value::Int(1),
                Value::List(vec![Value::Int(2), Value::Int(3)]),
                Value::Int(4),
            ])
        );
    }

    #[test]
    fn list_commas_inside_quotes_do_not_split() {
        let v = strict().infer(r#"["a,b", "c"]"#).unwrap();
        assert_eq!(
            v,
            Value::List(vec![Value::String("a,b".into()), Value::String("c".into())])
        );
    }

    #[test]
    fn parses_map_literals() {
        let v = strict().infer(r#"{region: "us-east-1", count: 3}"#).unwrap();
        let Value::Map(m) = v else { panic!("expected map") };
        assert_eq!(m.get("region"), Some(&Value::String("us-east-1".into())));
        assert_eq!(m.get("count"), Some(&Value::Int(3)));
    }

    #[test]
    fn map_without_colon_is_malformed() {
        let err = strict().infer("{no-colon-here}").unwrap_err();
        assert!(matches!(err, InferError::MalformedMap(_)));
    }

    #[test]
    fn empty_list_and_map() {
        assert_eq!(strict().infer("[]").unwrap(), Value::List(vec![]));
        assert_eq!(strict().infer("{}").unwrap(), Value::Map(BTreeMap::new()));
    }

    #[test]
    fn infer_all_preserves_order() {
        let tokens: Vec<String> = ["1", "two", "3.0"].iter().map(|s| s.to_string()).collect();
        let values = lax().infer_all(&tokens).unwrap();
        assert_eq!(
            values,
            vec![Value::Int(1), Value::String("two".into()), Value::Float(3.0)]
        );
    }
}
