//! The canonical value representation used by command parameters, option
//! values, and rule condition operands.
//!
//! A [`Value`] is a closed tagged variant rather than an open trait object:
//! the comparison matrices below are exhaustive matches, so adding a variant
//! forces every comparison site to be revisited.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

/// A dynamically typed value.
///
/// Equality and ordering are deliberately total functions returning `bool` /
/// `Option<Ordering>` rather than errors: rule evaluation must never fail at
/// runtime, so a comparison between incompatible variants simply does not
/// hold.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// A compiled regular expression. The source pattern is recoverable via
    /// `Regex::as_str`, which is also what equality is defined over.
    Regex(Regex),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Null,
}

impl Value {
    /// Structural equality with numeric widening.
    ///
    /// - `Int` and `Float` compare numerically.
    /// - A `Regex` on either side matches against the other side's string.
    /// - Lists and maps compare element-wise / entry-wise.
    /// - `Null` equals only `Null`.
    /// - Every other cross-variant pairing is `false`.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Regex(re), Value::String(s)) | (Value::String(s), Value::Regex(re)) => {
                re.is_match(s)
            }
            (Value::Regex(a), Value::Regex(b)) => a.as_str() == b.as_str(),
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| v.equals(w)))
            }
            _ => false,
        }
    }

    /// Ordering where one is defined: strings lexicographic, numerics
    /// numeric (with `Int`/`Float` widening), bools as 0/1. Everything else
    /// is incomparable and yields `None`, which ordering-based operators
    /// treat as a failed match.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Membership: is `self` contained in `container`?
    ///
    /// - list container: element-wise [`Value::equals`] (so a regex element
    ///   matches string members and vice versa)
    /// - string container: substring check when `self` is a string, regex
    ///   match when `self` is a regex
    /// - map container: key presence when `self` is a string
    /// - anything else, including `Null` containers: `false`
    pub fn contained_in(&self, container: &Value) -> bool {
        match container {
            Value::List(items) => items.iter().any(|item| self.equals(item)),
            Value::String(s) => match self {
                Value::String(needle) => s.contains(needle.as_str()),
                Value::Regex(re) => re.is_match(s),
                _ => false,
            },
            Value::Map(entries) => match self {
                Value::String(key) => entries.contains_key(key),
                _ => false,
            },
            _ => false,
        }
    }

    /// True for `Bool(true)`; every other value is not truthy. Rule
    /// evaluation never coerces, this exists for option-flag checks.
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Regex(a), Value::Regex(b)) => a.as_str() == b.as_str(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    /// Canonical form: the output re-tokenizes and re-infers to an equal
    /// value. Strings are quoted only when the bare form would be ambiguous
    /// (whitespace, empty, or something the inferrer would read as another
    /// type).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => {
                if needs_quoting(s) {
                    write!(f, "\"{}\"", escape_string(s))
                } else {
                    write!(f, "{s}")
                }
            }
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => {
                if x.fract() == 0.0 && x.is_finite() {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Bool(b) => write!(f, "{b}"),
            Value::Regex(re) => write!(f, "/{}/", re.as_str()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Null => write!(f, "null"),
        }
    }
}

/// A string must be quoted when its bare form would re-infer as a different
/// type or would not survive tokenization intact.
fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || s.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'')
        || s.starts_with(['[', '{', '/', '-'])
        || crate::infer::INT_RE.is_match(s)
        || crate::infer::FLOAT_RE.is_match(s)
        || s.eq_ignore_ascii_case("true")
        || s.eq_ignore_ascii_case("false")
        || s.eq_ignore_ascii_case("null")
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn re(pattern: &str) -> Value {
        Value::Regex(Regex::new(pattern).unwrap())
    }

    #[test]
    fn equality_same_variant() {
        assert!(Value::String("a".into()).equals(&Value::String("a".into())));
        assert!(Value::Int(7).equals(&Value::Int(7)));
        assert!(Value::Bool(true).equals(&Value::Bool(true)));
        assert!(Value::Null.equals(&Value::Null));
        assert!(!Value::Int(7).equals(&Value::Int(8)));
    }

    #[test]
    fn equality_numeric_widening() {
        assert!(Value::Int(2).equals(&Value::Float(2.0)));
        assert!(Value::Float(2.0).equals(&Value::Int(2)));
        assert!(!Value::Int(2).equals(&Value::Float(2.5)));
    }

    #[test]
    fn equality_incompatible_variants_is_false() {
        assert!(!Value::String("1".into()).equals(&Value::Int(1)));
        assert!(!Value::Bool(true).equals(&Value::Int(1)));
        assert!(!Value::Null.equals(&Value::Int(0)));
    }

    #[test]
    fn equality_regex_matches_string() {
        let pattern = re(r"^v\d+\.\d+\.\d+$");
        assert!(pattern.equals(&Value::String("v1.2.3".into())));
        assert!(Value::String("v1.2.3".into()).equals(&pattern));
        assert!(!pattern.equals(&Value::String("latest".into())));
    }

    #[test]
    fn equality_structural_lists_and_maps() {
        let a = Value::List(vec![Value::Int(1), Value::String("x".into())]);
        let b = Value::List(vec![Value::Int(1), Value::String("x".into())]);
        assert!(a.equals(&b));

        let mut m1 = BTreeMap::new();
        m1.insert("k".to_string(), Value::Int(1));
        let mut m2 = BTreeMap::new();
        m2.insert("k".to_string(), Value::Float(1.0));
        // widening applies inside maps too
        assert!(Value::Map(m1).equals(&Value::Map(m2)));
    }

    #[test]
    fn ordering_strings_numbers_bools() {
        assert_eq!(
            Value::String("abc".into()).compare(&Value::String("abd".into())),
            Some(Ordering::Less)
        );
        assert_eq!(Value::Int(3).compare(&Value::Float(2.5)), Some(Ordering::Greater));
        assert_eq!(
            Value::Bool(false).compare(&Value::Bool(true)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn ordering_incomparable_yields_none() {
        assert_eq!(Value::String("a".into()).compare(&Value::Int(1)), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
        assert_eq!(
            Value::List(vec![]).compare(&Value::List(vec![])),
            None
        );
    }

    #[test]
    fn membership_in_list() {
        let list = Value::List(vec![
            Value::String("us-east-1".into()),
            Value::String("us-west-2".into()),
        ]);
        assert!(Value::String("us-east-1".into()).contained_in(&list));
        assert!(!Value::String("eu-west-1".into()).contained_in(&list));
    }

    #[test]
    fn membership_substring_and_map_key() {
        let hay = Value::String("production".into());
        assert!(Value::String("prod".into()).contained_in(&hay));
        assert!(!Value::String("staging".into()).contained_in(&hay));

        let mut m = BTreeMap::new();
        m.insert("region".to_string(), Value::String("x".into()));
        let map = Value::Map(m);
        assert!(Value::String("region".into()).contained_in(&map));
        assert!(!Value::String("zone".into()).contained_in(&map));
    }

    #[test]
    fn membership_in_null_is_false() {
        assert!(!Value::String("a".into()).contained_in(&Value::Null));
        assert!(!Value::Null.contained_in(&Value::Null));
    }

    #[test]
    fn display_quotes_only_when_needed() {
        assert_eq!(Value::String("plain".into()).to_string(), "plain");
        assert_eq!(Value::String("two words".into()).to_string(), "\"two words\"");
        assert_eq!(Value::String(String::new()).to_string(), "\"\"");
        assert_eq!(Value::Int(-4).to_string(), "-4");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(re("a+").to_string(), "/a+/");
    }

    #[test]
    fn display_collections() {
        let list = Value::List(vec![Value::Int(1), Value::String("a b".into())]);
        assert_eq!(list.to_string(), "[1, \"a b\"]");

        let mut m = BTreeMap::new();
        m.insert("k".to_string(), Value::Bool(true));
        assert_eq!(Value::Map(m).to_string(), "{k: true}");
    }
}
