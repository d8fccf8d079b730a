//! The authorization decision: given a parsed command and an acting user,
//! find the candidate rules and decide whether execution may proceed.
//!
//! Candidate rules are the ones attached to the command in the *enabled*
//! version of its bundle. The request is authorized iff at least one rule
//! both matches the invocation and is satisfied by the user's effective
//! permissions; with no rules at all the request is denied.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use parley_command::{tokenize_and_parse, Command, ParseOptions};
use parley_rules::{parse_rule, Environment, Rule, RuleError};
use parley_store::{DataAccess, DataAccessError};

/// The outcome of evaluating a command against its rules. Denials are data,
/// not errors: the chat response explains itself from `reason` and
/// `matched_rule`.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub allowed: bool,
    /// Source text of the deciding rule, when one matched.
    pub matched_rule: Option<String>,
    pub reason: String,
}

impl Decision {
    fn allow(rule: impl Into<String>) -> Self {
        Self {
            allowed: true,
            matched_rule: Some(rule.into()),
            reason: "allowed by rule".to_string(),
        }
    }

    fn deny(matched_rule: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            matched_rule,
            reason: reason.into(),
        }
    }
}

/// Failures that prevent a decision from being made at all, as opposed to
/// decisions that deny.
#[derive(Debug, thiserror::Error)]
pub enum AuthorizeError {
    #[error("command {command:?} is provided by multiple enabled bundles: {bundles:?}")]
    AmbiguousCommand {
        command: String,
        bundles: Vec<String>,
    },

    #[error("invalid rule {rule:?}: {source}")]
    InvalidRule {
        rule: String,
        #[source]
        source: RuleError,
    },

    #[error(transparent)]
    Parse(#[from] parley_command::ParseError),

    #[error(transparent)]
    Store(#[from] DataAccessError),
}

/// Tokenize, parse, and authorize a raw chat utterance in one step.
/// Returns the parsed command alongside the decision so the caller can hand
/// it to the executor when allowed.
pub async fn authorize_utterance(
    store: &dyn DataAccess,
    input: &str,
    parse_options: &ParseOptions,
    username: &str,
    now: DateTime<Utc>,
) -> Result<(Command, Decision), AuthorizeError> {
    let command = tokenize_and_parse(input, parse_options)?;
    let decision = authorize(store, &command, username, now).await?;
    Ok((command, decision))
}

/// Decide whether `username` may run `command`.
pub async fn authorize(
    store: &dyn DataAccess,
    command: &Command,
    username: &str,
    now: DateTime<Utc>,
) -> Result<Decision, AuthorizeError> {
    // Find the enabled bundle version providing this command. An empty
    // bundle name searches all enabled bundles.
    let enabled = store.bundle_list_enabled().await?;
    let candidates: Vec<_> = enabled
        .iter()
        .filter(|b| command.bundle.is_empty() || b.name == command.bundle)
        .filter(|b| b.commands.contains_key(&command.command))
        .collect();

    let bundle = match candidates.as_slice() {
        [] => {
            return Ok(Decision::deny(
                None,
                format!(
                    "no enabled bundle provides the command {:?}",
                    command.command
                ),
            ));
        }
        [bundle] => *bundle,
        many => {
            return Err(AuthorizeError::AmbiguousCommand {
                command: command.command.clone(),
                bundles: many.iter().map(|b| b.name.clone()).collect(),
            });
        }
    };

    let qualified = format!("{}:{}", bundle.name, command.command);
    let rule_sources = &bundle.commands[&command.command].rules;
    if rule_sources.is_empty() {
        return Ok(Decision::deny(
            None,
            format!("no rules are defined for {qualified}"),
        ));
    }

    let mut rules = Vec::with_capacity(rule_sources.len());
    for source in rule_sources {
        let rule = parse_rule(source).map_err(|e| AuthorizeError::InvalidRule {
            rule: source.clone(),
            source: e,
        })?;
        if rule.command != qualified {
            warn!(rule = %source, expected = %qualified, "rule keyed on a different command, skipping");
            continue;
        }
        rules.push((source, rule));
    }

    let user = store.user_get(username).await?;
    let groups: Vec<String> = store
        .user_group_list(username)
        .await?
        .into_iter()
        .map(|g| g.name)
        .collect();
    let permissions = store.user_permission_list(username).await?;

    // The environment sees the resolved bundle even when the utterance
    // omitted it.
    let mut resolved = command.clone();
    resolved.bundle = bundle.name.clone();
    let env = Environment::new()
        .with_command(&resolved)
        .with_user(&user, &groups)
        .with_clock(now);

    decide(&rules, &env, &permissions, &qualified)
}

fn decide(
    rules: &[(&String, Rule)],
    env: &Environment,
    permissions: &[String],
    qualified: &str,
) -> Result<Decision, AuthorizeError> {
    let mut first_denied: Option<&String> = None;

    for (source, rule) in rules {
        if !rule.matches(env) {
            continue;
        }
        if rule.allowed(permissions) {
            return Ok(Decision::allow(source.as_str()));
        }
        first_denied.get_or_insert(*source);
    }

    match first_denied {
        Some(source) => Ok(Decision::deny(
            Some(source.to_string()),
            "a rule matched but the user lacks a required permission",
        )),
        None => Ok(Decision::deny(
            None,
            format!("no rule for {qualified} matched the invocation"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use parley_store::MemoryDataAccess;
    use parley_types::{Bundle, BundleCommand, Group, User};

    async fn seed(store: &MemoryDataAccess, rules: &[&str]) {
        store
            .bundle_create(Bundle {
                name: "foo".into(),
                version: "1.0.0".into(),
                commands: BTreeMap::from([(
                    "bar".to_string(),
                    BundleCommand {
                        rules: rules.iter().map(|s| s.to_string()).collect(),
                        ..Default::default()
                    },
                )]),
                ..Default::default()
            })
            .await
            .unwrap();
        store.bundle_enable("foo", "1.0.0").await.unwrap();

        store
            .user_create(User {
                username: "alice".into(),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    async fn grant(store: &MemoryDataAccess, bundle: &str, permission: &str) {
        if !store.group_exists("team").await.unwrap() {
            store
                .group_create(Group {
                    name: "team".into(),
                    ..Default::default()
                })
                .await
                .unwrap();
            store.group_add_user("team", "alice").await.unwrap();
            store.role_create("worker").await.unwrap();
            store.group_grant_role("team", "worker").await.unwrap();
        }
        store
            .role_grant_permission("worker", bundle, permission)
            .await
            .unwrap();
    }

    async fn run(store: &MemoryDataAccess, input: &str) -> Decision {
        let (_, decision) = authorize_utterance(
            store,
            input,
            &ParseOptions::default(),
            "alice",
            Utc::now(),
        )
        .await
        .unwrap();
        decision
    }

    #[tokio::test]
    async fn allow_rule_authorizes_any_invocation() {
        let store = MemoryDataAccess::new();
        seed(&store, &["foo:bar allow"]).await;

        let decision = run(&store, "foo:bar whatever").await;
        assert!(decision.allowed);
        assert_eq!(decision.matched_rule.as_deref(), Some("foo:bar allow"));
    }

    #[tokio::test]
    async fn matching_rule_with_permission_allows() {
        let store = MemoryDataAccess::new();
        seed(&store, &[r#"foo:bar when any arg == "danger" must have foo:admin"#]).await;
        grant(&store, "foo", "admin").await;

        let decision = run(&store, "foo:bar danger now").await;
        assert!(decision.allowed);
    }

    #[tokio::test]
    async fn matching_rule_without_permission_denies() {
        let store = MemoryDataAccess::new();
        seed(&store, &[r#"foo:bar when any arg == "danger" must have foo:admin"#]).await;
        grant(&store, "foo", "read").await;

        let decision = run(&store, "foo:bar danger now").await;
        assert!(!decision.allowed);
        assert!(decision.matched_rule.is_some());
        assert!(decision.reason.contains("permission"));
    }

    #[tokio::test]
    async fn no_matching_rule_denies() {
        let store = MemoryDataAccess::new();
        seed(&store, &[r#"foo:bar when any arg == "danger" must have foo:admin"#]).await;
        grant(&store, "foo", "admin").await;

        let decision = run(&store, "foo:bar all quiet").await;
        assert!(!decision.allowed);
        assert!(decision.matched_rule.is_none());
    }

    #[tokio::test]
    async fn no_rules_at_all_denies() {
        let store = MemoryDataAccess::new();
        seed(&store, &[]).await;

        let decision = run(&store, "foo:bar").await;
        assert!(!decision.allowed);
        assert!(decision.reason.contains("no rules"));
    }

    #[tokio::test]
    async fn unknown_command_denies() {
        let store = MemoryDataAccess::new();
        seed(&store, &["foo:bar allow"]).await;

        let decision = run(&store, "foo:nonexistent").await;
        assert!(!decision.allowed);
        assert!(decision.reason.contains("no enabled bundle"));
    }

    #[tokio::test]
    async fn bare_command_resolves_across_enabled_bundles() {
        let store = MemoryDataAccess::new();
        seed(&store, &["foo:bar allow"]).await;

        let decision = run(&store, "bar").await;
        assert!(decision.allowed, "bare command should resolve to foo:bar");
    }

    #[tokio::test]
    async fn ambiguous_bare_command_is_an_error() {
        let store = MemoryDataAccess::new();
        seed(&store, &["foo:bar allow"]).await;
        store
            .bundle_create(Bundle {
                name: "other".into(),
                version: "1.0.0".into(),
                commands: BTreeMap::from([(
                    "bar".to_string(),
                    BundleCommand {
                        rules: vec!["other:bar allow".into()],
                        ..Default::default()
                    },
                )]),
                ..Default::default()
            })
            .await
            .unwrap();
        store.bundle_enable("other", "1.0.0").await.unwrap();

        let cmd = tokenize_and_parse("bar", &ParseOptions::default()).unwrap();
        let err = authorize(&store, &cmd, "alice", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthorizeError::AmbiguousCommand { .. }));
    }

    #[tokio::test]
    async fn disabled_bundle_is_invisible() {
        let store = MemoryDataAccess::new();
        seed(&store, &["foo:bar allow"]).await;
        store.bundle_disable("foo", "1.0.0").await.unwrap();

        let decision = run(&store, "foo:bar").await;
        assert!(!decision.allowed);
    }

    #[tokio::test]
    async fn first_allowing_rule_wins_among_many() {
        let store = MemoryDataAccess::new();
        seed(
            &store,
            &[
                r#"foo:bar when any arg == "danger" must have foo:admin"#,
                "foo:bar allow",
            ],
        )
        .await;

        // matches the first rule without the permission, but the second
        // rule allows everything
        let decision = run(&store, "foo:bar danger").await;
        assert!(decision.allowed);
        assert_eq!(decision.matched_rule.as_deref(), Some("foo:bar allow"));
    }

    #[tokio::test]
    async fn malformed_stored_rule_surfaces_as_error() {
        let store = MemoryDataAccess::new();
        seed(&store, &["foo:bar when arg[0] = 1"]).await;

        let cmd = tokenize_and_parse("foo:bar", &ParseOptions::default()).unwrap();
        let err = authorize(&store, &cmd, "alice", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthorizeError::InvalidRule { .. }));
    }

    #[tokio::test]
    async fn unknown_user_is_a_store_error() {
        let store = MemoryDataAccess::new();
        seed(&store, &["foo:bar allow"]).await;

        let cmd = tokenize_and_parse("foo:bar", &ParseOptions::default()).unwrap();
        let err = authorize(&store, &cmd, "mallory", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthorizeError::Store(DataAccessError::NoSuchUser)
        ));
    }
}
