//! The typed condition AST: operators, collection modifiers, join
//! conditions, operands, and single-expression evaluation.
//!
//! Operands are either literal values or *references* — first-class paths
//! into the evaluation environment, distinguished from string literals at
//! parse time. A quoted string is always a literal, so a literal that
//! happens to spell `user.groups` can never alias the environment.

use std::cmp::Ordering;
use std::fmt;

use parley_types::Value;

use crate::env::Environment;

/// Comparison operators available in rule conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    In,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Op::Equals => "==",
            Op::NotEquals => "!=",
            Op::LessThan => "<",
            Op::LessThanOrEqual => "<=",
            Op::GreaterThan => ">",
            Op::GreaterThanOrEqual => ">=",
            Op::In => "in",
        };
        write!(f, "{s}")
    }
}

/// How a list-valued left operand is folded over the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollectionModifier {
    /// Apply the operator to the value as-is.
    #[default]
    One,
    /// True iff at least one element matches. Empty list: false.
    Any,
    /// True iff every element matches. Empty list: true.
    All,
}

/// How an expression (or permission requirement) joins onto the running
/// result of the ones before it. `Undefined` appears only on the first
/// element of a sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Join {
    #[default]
    Undefined,
    And,
    Or,
}

/// One segment of a reference path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `.name` access (the leading root identifier is also a `Field`).
    Field(String),
    /// `[0]` numeric index into a list.
    Index(i64),
    /// `["key"]` string index into a map.
    Key(String),
}

/// A dotted/bracketed path into the evaluation environment, e.g.
/// `option["region"]`, `arg[0]`, or `user.groups`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefPath {
    pub segments: Vec<Segment>,
}

impl RefPath {
    /// The root identifier (always a `Field`).
    pub fn root(&self) -> &str {
        match &self.segments[0] {
            Segment::Field(name) => name,
            // parse() only ever produces a leading Field
            _ => "",
        }
    }
}

impl fmt::Display for RefPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                Segment::Field(name) if i == 0 => write!(f, "{name}")?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(n) => write!(f, "[{n}]")?,
                Segment::Key(k) => write!(f, "[\"{k}\"]")?,
            }
        }
        Ok(())
    }
}

/// Parse a reference path: `ident ( "." ident | "[" literal "]" )*`.
///
/// Returns `None` when the text doesn't conform; the caller then treats the
/// operand as a literal.
pub fn parse_ref_path(s: &str) -> Option<RefPath> {
    let mut chars = s.chars().peekable();
    let mut segments = Vec::new();

    segments.push(Segment::Field(take_ident(&mut chars)?));

    while let Some(&c) = chars.peek() {
        match c {
            '.' => {
                chars.next();
                segments.push(Segment::Field(take_ident(&mut chars)?));
            }
            '[' => {
                chars.next();
                segments.push(take_bracket(&mut chars)?);
            }
            _ => return None,
        }
    }

    Some(RefPath { segments })
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    let mut ident = String::new();
    match chars.peek() {
        Some(&c) if c.is_ascii_alphabetic() || c == '_' => {
            ident.push(c);
            chars.next();
        }
        _ => return None,
    }
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            ident.push(c);
            chars.next();
        } else {
            break;
        }
    }
    Some(ident)
}

fn take_bracket(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<Segment> {
    let segment = match chars.peek()? {
        '"' | '\'' => {
            let quote = *chars.peek()?;
            chars.next();
            let mut key = String::new();
            loop {
                let c = chars.next()?;
                if c == quote {
                    break;
                }
                key.push(c);
            }
            Segment::Key(key)
        }
        _ => {
            let mut digits = String::new();
            while let Some(&c) = chars.peek() {
                if c == ']' {
                    break;
                }
                digits.push(c);
                chars.next();
            }
            Segment::Index(digits.parse().ok()?)
        }
    };
    match chars.next() {
        Some(']') => Some(segment),
        _ => None,
    }
}

/// A condition operand: a literal value or an environment reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    Reference(RefPath),
}

impl Operand {
    /// Resolve against the environment. Literals clone; references look up,
    /// with unresolved paths becoming `Null`.
    pub fn resolve(&self, env: &Environment) -> Value {
        match self {
            Operand::Literal(value) => value.clone(),
            Operand::Reference(path) => env.resolve(path),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(v) => write!(f, "{v}"),
            Operand::Reference(p) => write!(f, "{p}"),
        }
    }
}

/// A single typed condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub a: Operand,
    pub b: Operand,
    pub operator: Op,
    pub modifier: CollectionModifier,
    pub join: Join,
}

impl Expression {
    /// Evaluate this expression against the environment. Never fails:
    /// unresolved references are `Null` and failed type matches are `false`.
    pub fn evaluate(&self, env: &Environment) -> bool {
        let a = self.a.resolve(env);
        let b = self.b.resolve(env);

        match (&a, self.modifier) {
            (Value::List(items), CollectionModifier::Any) => {
                items.iter().any(|item| apply(self.operator, item, &b))
            }
            (Value::List(items), CollectionModifier::All) => {
                items.iter().all(|item| apply(self.operator, item, &b))
            }
            _ => apply(self.operator, &a, &b),
        }
    }
}

/// Apply an operator to two resolved values.
fn apply(op: Op, a: &Value, b: &Value) -> bool {
    match op {
        Op::Equals => a.equals(b),
        Op::NotEquals => !a.equals(b),
        Op::LessThan => matches!(a.compare(b), Some(Ordering::Less)),
        Op::LessThanOrEqual => {
            matches!(a.compare(b), Some(Ordering::Less | Ordering::Equal))
        }
        Op::GreaterThan => matches!(a.compare(b), Some(Ordering::Greater)),
        Op::GreaterThanOrEqual => {
            matches!(a.compare(b), Some(Ordering::Greater | Ordering::Equal))
        }
        Op::In => a.contained_in(b),
    }
}

/// A permission requirement within a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    /// Fully qualified name, e.g. `"ec2:destroy"`.
    pub name: String,
    pub join: Join,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_path_parses_fields_indexes_and_keys() {
        let p = parse_ref_path("option[\"region\"]").unwrap();
        assert_eq!(
            p.segments,
            vec![
                Segment::Field("option".into()),
                Segment::Key("region".into())
            ]
        );

        let p = parse_ref_path("arg[0]").unwrap();
        assert_eq!(
            p.segments,
            vec![Segment::Field("arg".into()), Segment::Index(0)]
        );

        let p = parse_ref_path("user.groups").unwrap();
        assert_eq!(
            p.segments,
            vec![
                Segment::Field("user".into()),
                Segment::Field("groups".into())
            ]
        );
        assert_eq!(p.root(), "user");
    }

    #[test]
    fn ref_path_rejects_non_paths() {
        assert!(parse_ref_path("").is_none());
        assert!(parse_ref_path("123").is_none());
        assert!(parse_ref_path("a-b").is_none());
        assert!(parse_ref_path("a.").is_none());
        assert!(parse_ref_path("a[").is_none());
        assert!(parse_ref_path("a[x]").is_none());
        assert!(parse_ref_path("\"quoted\"").is_none());
    }

    #[test]
    fn ref_path_display_roundtrip() {
        for text in ["arg[0]", "option[\"region\"]", "user.groups", "time.hour"] {
            assert_eq!(parse_ref_path(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn apply_operator_matrix() {
        assert!(apply(Op::Equals, &Value::Int(1), &Value::Float(1.0)));
        assert!(apply(Op::NotEquals, &Value::Int(1), &Value::Int(2)));
        assert!(apply(Op::LessThan, &Value::Int(1), &Value::Int(2)));
        assert!(apply(Op::LessThanOrEqual, &Value::Int(2), &Value::Int(2)));
        assert!(apply(Op::GreaterThan, &Value::Float(2.5), &Value::Int(2)));
        assert!(apply(
            Op::GreaterThanOrEqual,
            &Value::String("b".into()),
            &Value::String("a".into())
        ));
        assert!(apply(
            Op::In,
            &Value::String("a".into()),
            &Value::List(vec![Value::String("a".into())])
        ));
    }

    #[test]
    fn ordering_on_incompatible_types_is_false() {
        assert!(!apply(Op::LessThan, &Value::String("1".into()), &Value::Int(2)));
        assert!(!apply(Op::GreaterThan, &Value::Null, &Value::Null));
        // but both directions of a failed ordering are false, not one true
        assert!(!apply(Op::GreaterThanOrEqual, &Value::Null, &Value::Int(1)));
    }

    #[test]
    fn modifier_any_and_all_fold_over_lists() {
        let env = Environment::new();
        let list = Operand::Literal(Value::List(vec![
            Value::Int(1),
            Value::Int(2),
            Value::Int(3),
        ]));

        let any = Expression {
            a: list.clone(),
            b: Operand::Literal(Value::Int(2)),
            operator: Op::Equals,
            modifier: CollectionModifier::Any,
            join: Join::Undefined,
        };
        assert!(any.evaluate(&env));

        let all = Expression {
            a: list,
            b: Operand::Literal(Value::Int(2)),
            operator: Op::Equals,
            modifier: CollectionModifier::All,
            join: Join::Undefined,
        };
        assert!(!all.evaluate(&env));
    }

    #[test]
    fn modifier_edge_cases_on_empty_list() {
        let env = Environment::new();
        let empty = Operand::Literal(Value::List(vec![]));
        let b = Operand::Literal(Value::Int(1));

        let all = Expression {
            a: empty.clone(),
            b: b.clone(),
            operator: Op::Equals,
            modifier: CollectionModifier::All,
            join: Join::Undefined,
        };
        assert!(all.evaluate(&env), "all over an empty list is vacuously true");

        let any = Expression {
            a: empty,
            b,
            operator: Op::Equals,
            modifier: CollectionModifier::Any,
            join: Join::Undefined,
        };
        assert!(!any.evaluate(&env), "any over an empty list is false");
    }

    #[test]
    fn modifier_one_compares_list_as_value() {
        let env = Environment::new();
        let expr = Expression {
            a: Operand::Literal(Value::List(vec![Value::Int(1)])),
            b: Operand::Literal(Value::List(vec![Value::Int(1)])),
            operator: Op::Equals,
            modifier: CollectionModifier::One,
            join: Join::Undefined,
        };
        assert!(expr.evaluate(&env), "One compares the lists structurally");
    }

    #[test]
    fn unresolved_reference_is_null() {
        let env = Environment::new();
        let expr = Expression {
            a: Operand::Reference(parse_ref_path("arg[99]").unwrap()),
            b: Operand::Literal(Value::Null),
            operator: Op::Equals,
            modifier: CollectionModifier::One,
            join: Join::Undefined,
        };
        assert!(expr.evaluate(&env), "missing path equals Null");
    }
}
