//! Splits a rule string into its command, condition strings, and permission
//! tokens.
//!
//! The grammar keywords (`when`, `allow`, `must have`, `with`, `and`, `or`)
//! are structural only when they appear as standalone top-level words:
//! the word splitter keeps quoted strings, `/.../` regex literals, and
//! bracketed list/map literals intact, so a keyword inside any of those is
//! plain content.

use crate::error::RuleError;

/// The raw segments of a rule, before typed parsing.
///
/// `conditions` holds condition strings (e.g. `any arg == "danger"`)
/// interleaved with the literal join tokens `"and"` / `"or"`. `permissions`
/// holds permission names interleaved the same way. Both may be empty: no
/// conditions matches every invocation, no permissions (the `allow` form)
/// always passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTokens {
    pub command: String,
    pub conditions: Vec<String>,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Conditions,
    Permissions,
    Closed,
}

/// Tokenize a rule of the form
/// `bundle:command [when COND ((and|or) COND)*] [allow | (must have|with) PERM ((and|or) PERM)*]`.
pub fn tokenize(input: &str) -> Result<RuleTokens, RuleError> {
    let words = split_words(input)?;
    let mut words = words.into_iter();

    let command = words
        .next()
        .ok_or_else(|| RuleError::MalformedRule("empty rule".to_string()))?;

    let mut tokens = RuleTokens {
        command,
        ..Default::default()
    };

    let mut phase = Phase::Start;
    let mut current: Vec<String> = Vec::new();
    let mut words = words.peekable();

    while let Some(word) = words.next() {
        if phase == Phase::Closed {
            return Err(RuleError::MalformedRule(format!(
                "unexpected token after allow: {word:?}"
            )));
        }

        match (phase, word.as_str()) {
            (Phase::Start, "when") => phase = Phase::Conditions,
            (Phase::Start, "allow") => phase = Phase::Closed,
            (Phase::Start, "must") => {
                expect_have(words.next())?;
                phase = Phase::Permissions;
            }
            (Phase::Start, "with") => phase = Phase::Permissions,
            (Phase::Start, other) => {
                return Err(RuleError::MalformedRule(format!(
                    "expected when, allow, must have, or with; found {other:?}"
                )));
            }

            (Phase::Conditions, "and" | "or") => {
                flush_condition(&mut current, &mut tokens.conditions)?;
                tokens.conditions.push(word);
            }
            (Phase::Conditions, "must") => {
                flush_condition(&mut current, &mut tokens.conditions)?;
                expect_have(words.next())?;
                phase = Phase::Permissions;
            }
            (Phase::Conditions, "with") => {
                flush_condition(&mut current, &mut tokens.conditions)?;
                phase = Phase::Permissions;
            }
            (Phase::Conditions, "allow") => {
                flush_condition(&mut current, &mut tokens.conditions)?;
                phase = Phase::Closed;
            }
            (Phase::Conditions, _) => current.push(word),

            (Phase::Permissions, _) => tokens.permissions.push(word),

            (Phase::Closed, _) => unreachable!(),
        }
    }

    if phase == Phase::Conditions {
        flush_condition(&mut current, &mut tokens.conditions)?;
    }

    if matches!(tokens.conditions.last().map(String::as_str), Some("and" | "or")) {
        return Err(RuleError::MalformedRule(
            "dangling join after last condition".to_string(),
        ));
    }
    if matches!(tokens.permissions.last().map(String::as_str), Some("and" | "or")) {
        return Err(RuleError::MalformedRule(
            "dangling join after last permission".to_string(),
        ));
    }

    Ok(tokens)
}

// `must` is only valid as `must have`.
fn expect_have(next: Option<String>) -> Result<(), RuleError> {
    match next.as_deref() {
        Some("have") => Ok(()),
        other => Err(RuleError::MalformedRule(format!(
            "expected \"have\" after \"must\", found {other:?}"
        ))),
    }
}

fn flush_condition(current: &mut Vec<String>, out: &mut Vec<String>) -> Result<(), RuleError> {
    if current.is_empty() {
        return Err(RuleError::MalformedRule("empty condition".to_string()));
    }
    out.push(current.join(" "));
    current.clear();
    Ok(())
}

/// Split a rule (or single condition) into words, keeping quoted strings,
/// `/.../` regex literals, and `[...]`/`{...}` literals together as single
/// words with their delimiters retained.
pub(crate) fn split_words(input: &str) -> Result<Vec<String>, RuleError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<(char, usize)> = None;
    let mut depth = 0usize;
    let mut in_regex = false;
    let mut escaped = false;

    for (offset, c) in input.char_indices() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        if c == '\\' {
            current.push(c);
            escaped = true;
            continue;
        }

        if in_regex {
            current.push(c);
            if c == '/' {
                in_regex = false;
            }
            continue;
        }

        if let Some((q, _)) = quote {
            current.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                quote = Some((c, offset));
                current.push(c);
            }
            '/' if current.is_empty() => {
                in_regex = true;
                current.push(c);
            }
            '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if let Some((q, offset)) = quote {
        return Err(RuleError::UnterminatedQuote { quote: q, offset });
    }
    if !current.is_empty() {
        words.push(current);
    }

    Ok(words)
}
