//! Turns [`RuleTokens`] into a typed [`Rule`].
//!
//! Each condition string is lexed into `(modifier?, a, op, b)` with the same
//! quote/bracket/regex-aware splitter used by the rule tokenizer, then the
//! operands are classified: quoted strings and recognizable literals stay
//! literals, unquoted paths rooted at an environment root become
//! [`Operand::Reference`]s.

use parley_command::split_command;
use parley_types::Inferrer;

use crate::error::RuleError;
use crate::expression::{
    parse_ref_path, CollectionModifier, Expression, Join, Op, Operand, Permission,
};
use crate::rule::Rule;
use crate::tokenizer::{split_words, tokenize, RuleTokens};

/// Roots an unquoted operand may reference. Any other bare identifier is a
/// plain string literal.
const ENV_ROOTS: &[&str] = &["command", "option", "arg", "user", "time"];

/// Parse tokenized rule segments into a typed [`Rule`].
pub fn parse(tokens: RuleTokens) -> Result<Rule, RuleError> {
    let (bundle, command) = split_command(&tokens.command)?;
    if bundle.is_empty() || command.is_empty() {
        return Err(RuleError::MalformedRule(format!(
            "rules must name a full bundle:command pair, got {:?}",
            tokens.command
        )));
    }

    let mut rule = Rule {
        command: tokens.command.clone(),
        conditions: Vec::new(),
        permissions: Vec::new(),
    };

    let mut join = Join::Undefined;
    for word in &tokens.permissions {
        match word.as_str() {
            "and" => join = Join::And,
            "or" => join = Join::Or,
            name => rule.permissions.push(Permission {
                name: name.to_string(),
                join,
            }),
        }
    }

    let mut join = Join::Undefined;
    for word in &tokens.conditions {
        match word.as_str() {
            "and" => join = Join::And,
            "or" => join = Join::Or,
            condition => {
                let (a, b, operator, modifier) = parse_condition(condition)?;
                rule.conditions.push(Expression {
                    a,
                    b,
                    operator,
                    modifier,
                    join,
                });
            }
        }
    }

    Ok(rule)
}

/// Tokenize and parse a raw rule string.
pub fn parse_rule(input: &str) -> Result<Rule, RuleError> {
    parse(tokenize(input)?)
}

/// Lex a single condition into its operands, operator, and optional
/// collection modifier.
fn parse_condition(
    condition: &str,
) -> Result<(Operand, Operand, Op, CollectionModifier), RuleError> {
    let words = split_words(condition)?;

    let op_index = words
        .iter()
        .position(|w| w == "in" || is_operator_shaped(w))
        .ok_or_else(|| RuleError::MalformedCondition(condition.to_string()))?;

    let operator = match words[op_index].as_str() {
        "==" => Op::Equals,
        "!=" => Op::NotEquals,
        "<" => Op::LessThan,
        "<=" => Op::LessThanOrEqual,
        ">" => Op::GreaterThan,
        ">=" => Op::GreaterThanOrEqual,
        "in" => Op::In,
        other => return Err(RuleError::UnsupportedOperator(other.to_string())),
    };

    let mut left = &words[..op_index];
    let right = &words[op_index + 1..];

    let modifier = if left.len() > 1 {
        let m = match left[0].as_str() {
            "all" => CollectionModifier::All,
            "any" => CollectionModifier::Any,
            other => return Err(RuleError::UnknownModifier(other.to_string())),
        };
        left = &left[1..];
        m
    } else {
        CollectionModifier::One
    };

    let ([a], [b]) = (left, right) else {
        return Err(RuleError::MalformedCondition(condition.to_string()));
    };

    Ok((parse_operand(a)?, parse_operand(b)?, operator, modifier))
}

/// True for words built purely from operator characters (which are then
/// either one of the supported operators or an `UnsupportedOperator` error).
fn is_operator_shaped(word: &str) -> bool {
    !word.is_empty() && word.len() <= 2 && word.chars().all(|c| "!<>=".contains(c))
}

/// Classify an operand word: environment-rooted unquoted paths become
/// references, everything else is inferred as a literal with complex types
/// and strict strings enabled.
fn parse_operand(word: &str) -> Result<Operand, RuleError> {
    if !word.starts_with(['"', '\'']) {
        if let Some(path) = parse_ref_path(word) {
            if ENV_ROOTS.contains(&path.root()) {
                return Ok(Operand::Reference(path));
            }
        }
    }

    let infer = Inferrer::default().complex_types(true).strict_strings(true);
    Ok(Operand::Literal(infer.infer(word)?))
}
