//! Turns a token stream into a typed [`Command`].
//!
//! The first token is the `bundle:command` pair; the rest are classified
//! left-to-right as long options (`--flag`, `--flag=value`), clusters of
//! short options (`-abc`), option values, the `--` terminator, or positional
//! parameters. Option and parameter values go through type inference with
//! complex types and strict strings both off, so a bare token stays a plain
//! string.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use parley_types::{Inferrer, Value};

use crate::error::ParseError;
use crate::tokenizer::tokenize;

/// A parsed command invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    /// May be empty, meaning "resolve across all enabled bundles".
    pub bundle: String,
    /// Never empty.
    pub command: String,
    /// Options keyed by canonical (post-alias) name.
    pub options: BTreeMap<String, Value>,
    /// Positional parameters, in order.
    pub parameters: Vec<Value>,
}

impl fmt::Display for Command {
    /// Canonical re-serialization. Bound option values are written with the
    /// `--name=value` form so the output parses back to the same `Command`
    /// without needing the original parse options.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bundle.is_empty() {
            write!(f, "{}", self.command)?;
        } else {
            write!(f, "{}:{}", self.bundle, self.command)?;
        }
        for (name, value) in &self.options {
            if value.is_true() {
                write!(f, " --{name}")?;
            } else {
                write!(f, " --{name}={value}")?;
            }
        }
        if !self.parameters.is_empty() {
            write!(f, " --")?;
            for p in &self.parameters {
                write!(f, " {p}")?;
            }
        }
        Ok(())
    }
}

/// Knobs controlling how the option classifier behaves. Built fluently:
///
/// ```
/// use parley_command::ParseOptions;
///
/// let opts = ParseOptions::default()
///     .alias("f", "force")
///     .has_argument("region", true);
/// # let _ = opts;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    agnostic_dashes: bool,
    assume_option_arguments: bool,
    aliases: HashMap<String, String>,
    has_arg: HashMap<String, bool>,
}

impl ParseOptions {
    /// When true, `-x` and `--x` behave identically (both long).
    pub fn agnostic_dashes(mut self, agnostic: bool) -> Self {
        self.agnostic_dashes = agnostic;
        self
    }

    /// When true, an option with no [`has_argument`](Self::has_argument)
    /// declaration is assumed to take a value.
    pub fn assume_option_arguments(mut self, assume: bool) -> Self {
        self.assume_option_arguments = assume;
        self
    }

    /// Register an alias; every reference to `alias` is canonicalized to
    /// `name` when options are built.
    pub fn alias(mut self, alias: impl Into<String>, name: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), name.into());
        self
    }

    /// Declare whether the (canonical) option takes a value argument.
    pub fn has_argument(mut self, name: impl Into<String>, has_arg: bool) -> Self {
        self.has_arg.insert(name.into(), has_arg);
        self
    }

    fn canonical(&self, name: &str) -> String {
        match self.aliases.get(name) {
            Some(canonical) => canonical.clone(),
            None => name.to_string(),
        }
    }

    fn takes_value(&self, name: &str) -> bool {
        self.has_arg
            .get(name)
            .copied()
            .unwrap_or(self.assume_option_arguments)
    }
}

/// Split `"bundle:command"` (or bare `"command"`) into its parts. A missing
/// bundle yields an empty bundle string; more than one colon is an error.
pub fn split_command(name: &str) -> Result<(String, String), ParseError> {
    let parts: Vec<&str> = name.split(':').collect();
    match parts.as_slice() {
        [command] => Ok((String::new(), command.to_string())),
        [bundle, command] => Ok((bundle.to_string(), command.to_string())),
        _ => Err(ParseError::InvalidBundleCommandPair(name.to_string())),
    }
}

/// Parse a token stream into a [`Command`].
pub fn parse(tokens: &[String], options: &ParseOptions) -> Result<Command, ParseError> {
    let infer = Inferrer::default();

    let first = tokens.first().ok_or(ParseError::EmptyInput)?;
    let (bundle, command) = split_command(first)?;
    if command.is_empty() {
        return Err(ParseError::EmptyCommandName(first.clone()));
    }

    let mut cmd = Command {
        bundle,
        command,
        options: BTreeMap::new(),
        parameters: Vec::new(),
    };

    let rest = &tokens[1..];
    // Canonical name of the most recent option, which may still bind a value.
    let mut pending: Option<String> = None;

    for (i, token) in rest.iter().enumerate() {
        // End of options: everything after is positional.
        if token == "--" {
            cmd.parameters = infer.infer_all(&rest[i + 1..])?;
            break;
        }

        let dashes = dash_count(token);

        // --long or --long=value
        if token.len() >= 2 && dashes == 2 {
            pending = bind_long(&mut cmd, &token[2..], options, &infer)?;
            continue;
        }

        // -x, or a cluster -xyz where only the last may bind a value
        if token.len() >= 2 && dashes == 1 {
            if options.agnostic_dashes {
                pending = bind_long(&mut cmd, &token[1..], options, &infer)?;
            } else {
                for ch in token[1..].chars() {
                    let name = options.canonical(&ch.to_string());
                    cmd.options.insert(name.clone(), Value::Bool(true));
                    pending = Some(name);
                }
            }
            continue;
        }

        // Not an option. Bind to the pending option if it expects a value.
        if let Some(name) = pending.take() {
            if options.takes_value(&name) {
                cmd.options.insert(name, infer.infer(token)?);
                continue;
            }
        }

        // Not an option, not an option value: this and the rest are
        // positional parameters.
        cmd.parameters = infer.infer_all(&rest[i..])?;
        break;
    }

    Ok(cmd)
}

/// Tokenize and parse in one step.
pub fn tokenize_and_parse(input: &str, options: &ParseOptions) -> Result<Command, ParseError> {
    let tokens = tokenize(input)?;
    parse(&tokens, options)
}

/// Insert a long option from its body (the token minus leading dashes).
/// Returns the canonical name left pending, or `None` when `=` bound a value
/// in place.
fn bind_long(
    cmd: &mut Command,
    body: &str,
    options: &ParseOptions,
    infer: &Inferrer,
) -> Result<Option<String>, ParseError> {
    if let Some((name, raw)) = body.split_once('=') {
        let name = options.canonical(name);
        cmd.options.insert(name, infer.infer(raw)?);
        return Ok(None);
    }
    let name = options.canonical(body);
    cmd.options.insert(name.clone(), Value::Bool(true));
    Ok(Some(name))
}

fn dash_count(token: &str) -> usize {
    token.chars().take_while(|&c| c == '-').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(input: &str) -> Command {
        tokenize_and_parse(input, &ParseOptions::default()).unwrap()
    }

    #[test]
    fn bare_command() {
        let cmd = parse_str("echo:echo");
        assert_eq!(cmd.bundle, "echo");
        assert_eq!(cmd.command, "echo");
        assert!(cmd.options.is_empty());
        assert!(cmd.parameters.is_empty());
    }

    #[test]
    fn command_without_bundle() {
        let cmd = parse_str("whoami");
        assert_eq!(cmd.bundle, "");
        assert_eq!(cmd.command, "whoami");

        let cmd = parse_str(":whoami");
        assert_eq!(cmd.bundle, "");
        assert_eq!(cmd.command, "whoami");
    }

    #[test]
    fn too_many_colons_is_an_error() {
        let err = tokenize_and_parse("a:b:c", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidBundleCommandPair(_)));
    }

    #[test]
    fn empty_token_list_is_an_error() {
        let err = parse(&[], &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::EmptyInput));
    }

    #[test]
    fn empty_command_name_is_an_error() {
        let err = tokenize_and_parse("bundle:", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::EmptyCommandName(_)));
    }

    #[test]
    fn short_cluster_long_equals_and_terminator() {
        // -abc explodes into three boolean flags, --flag=42 binds in place,
        // and everything after -- is positional.
        let cmd = parse_str("foo:bar -abc --flag=42 -- raw value");
        assert_eq!(cmd.bundle, "foo");
        assert_eq!(cmd.command, "bar");
        assert_eq!(cmd.options.get("a"), Some(&Value::Bool(true)));
        assert_eq!(cmd.options.get("b"), Some(&Value::Bool(true)));
        assert_eq!(cmd.options.get("c"), Some(&Value::Bool(true)));
        assert_eq!(cmd.options.get("flag"), Some(&Value::Int(42)));
        assert_eq!(
            cmd.parameters,
            vec![Value::String("raw".into()), Value::String("value".into())]
        );
    }

    #[test]
    fn undeclared_option_does_not_swallow_parameters() {
        let cmd = parse_str("foo:bar --verbose param1 param2");
        assert_eq!(cmd.options.get("verbose"), Some(&Value::Bool(true)));
        assert_eq!(
            cmd.parameters,
            vec![
                Value::String("param1".into()),
                Value::String("param2".into())
            ]
        );
    }

    #[test]
    fn declared_option_binds_following_value() {
        let opts = ParseOptions::default().has_argument("region", true);
        let cmd = tokenize_and_parse("ec2:list --region us-east-1 extra", &opts).unwrap();
        assert_eq!(
            cmd.options.get("region"),
            Some(&Value::String("us-east-1".into()))
        );
        assert_eq!(cmd.parameters, vec![Value::String("extra".into())]);
    }

    #[test]
    fn assume_option_arguments_binds_values() {
        let opts = ParseOptions::default().assume_option_arguments(true);
        let cmd = tokenize_and_parse("foo:bar --count 3 tail", &opts).unwrap();
        assert_eq!(cmd.options.get("count"), Some(&Value::Int(3)));
        assert_eq!(cmd.parameters, vec![Value::String("tail".into())]);
    }

    #[test]
    fn has_argument_false_overrides_assume() {
        let opts = ParseOptions::default()
            .assume_option_arguments(true)
            .has_argument("force", false);
        let cmd = tokenize_and_parse("foo:bar --force now", &opts).unwrap();
        assert_eq!(cmd.options.get("force"), Some(&Value::Bool(true)));
        assert_eq!(cmd.parameters, vec![Value::String("now".into())]);
    }

    #[test]
    fn only_last_short_option_in_cluster_binds() {
        let opts = ParseOptions::default().has_argument("c", true);
        let cmd = tokenize_and_parse("foo:bar -abc 9", &opts).unwrap();
        assert_eq!(cmd.options.get("a"), Some(&Value::Bool(true)));
        assert_eq!(cmd.options.get("b"), Some(&Value::Bool(true)));
        assert_eq!(cmd.options.get("c"), Some(&Value::Int(9)));
    }

    #[test]
    fn aliases_canonicalize_names() {
        let opts = ParseOptions::default()
            .alias("f", "force")
            .alias("r", "region")
            .has_argument("region", true);
        let cmd = tokenize_and_parse("ec2:stop -f -r us-west-2", &opts).unwrap();
        assert_eq!(cmd.options.get("force"), Some(&Value::Bool(true)));
        assert_eq!(
            cmd.options.get("region"),
            Some(&Value::String("us-west-2".into()))
        );
        assert!(!cmd.options.contains_key("f"));
    }

    #[test]
    fn agnostic_dashes_treats_single_as_long() {
        let opts = ParseOptions::default().agnostic_dashes(true);
        let cmd = tokenize_and_parse("foo:bar -verbose", &opts).unwrap();
        assert_eq!(cmd.options.get("verbose"), Some(&Value::Bool(true)));
    }

    #[test]
    fn quoted_parameter_keeps_spaces() {
        let cmd = parse_str(r#"echo:echo "hello there" friend"#);
        assert_eq!(
            cmd.parameters,
            vec![
                Value::String("hello there".into()),
                Value::String("friend".into())
            ]
        );
    }

    #[test]
    fn parameters_are_inferred() {
        let cmd = parse_str("calc:add 1 2.5 true stop");
        assert_eq!(
            cmd.parameters,
            vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::Bool(true),
                Value::String("stop".into())
            ]
        );
    }

    #[test]
    fn everything_after_terminator_is_positional() {
        let cmd = parse_str("foo:bar -- --flag -x");
        assert!(cmd.options.is_empty());
        assert_eq!(
            cmd.parameters,
            vec![Value::String("--flag".into()), Value::String("-x".into())]
        );
    }

    #[test]
    fn canonical_form_reparses_to_same_command() {
        for input in [
            "foo:bar -abc --flag=42 -- raw value",
            "echo:echo \"hello world\"",
            "ec2:list --region=us-east-1",
            "whoami",
        ] {
            let cmd = parse_str(input);
            let reparsed = parse_str(&cmd.to_string());
            assert_eq!(reparsed, cmd, "canonical form of {input:?} did not round-trip");
        }
    }
}
