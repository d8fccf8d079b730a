//! A parsed rule and its evaluation: does it match the invocation, and does
//! the acting user hold the permissions it demands?
//!
//! Both folds are strict left-to-right with no operator precedence:
//! `x and y or z` is `((x and y) or z)`. An element whose join cannot change
//! the accumulator is skipped entirely, so a condition referencing a missing
//! environment key is never evaluated once the outcome is fixed.

use crate::env::Environment;
use crate::expression::{Expression, Join, Permission};

/// A declarative guard on one `bundle:command`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// The fully qualified `bundle:command` this rule is keyed on.
    pub command: String,
    /// Ordered conditions; empty means the rule matches every invocation.
    pub conditions: Vec<Expression>,
    /// Ordered permission requirements; empty means always allowed.
    pub permissions: Vec<Permission>,
}

impl Rule {
    /// True iff the rule's conditions hold in the given environment.
    pub fn matches(&self, env: &Environment) -> bool {
        let Some(first) = self.conditions.first() else {
            return true;
        };

        let mut result = first.evaluate(env);
        for condition in &self.conditions[1..] {
            match condition.join {
                Join::And if result => result = condition.evaluate(env),
                Join::Or if !result => result = condition.evaluate(env),
                // short-circuit: the accumulator already decides this join
                _ => {}
            }
        }
        result
    }

    /// True iff the user's effective permissions satisfy the rule's
    /// requirements. `permissions` is the user's set, as sorted
    /// `"bundle:permission"` strings.
    pub fn allowed(&self, permissions: &[String]) -> bool {
        let Some(first) = self.permissions.first() else {
            return true;
        };

        let mut result = has_permission(first, permissions);
        for required in &self.permissions[1..] {
            match required.join {
                Join::And if result => result = has_permission(required, permissions),
                Join::Or if !result => result = has_permission(required, permissions),
                _ => {}
            }
        }
        result
    }
}

fn has_permission(required: &Permission, permissions: &[String]) -> bool {
    permissions.iter().any(|p| p == &required.name)
}
