//! The evaluation environment: a read-only view over the current command,
//! the acting user, and the clock, addressed by reference paths.
//!
//! Canonical roots: `command` (bundle/name), `option` (map of option name to
//! value), `arg` (list of positional parameters), `user` (name, email,
//! groups), and `time` (UTC clock projections). The clock is supplied as an
//! explicit timestamp so evaluation stays deterministic under test.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

use parley_command::Command;
use parley_types::{User, Value};

use crate::expression::{RefPath, Segment};

/// An immutable mapping from root names to values, resolvable by
/// [`RefPath`].
#[derive(Debug, Clone, Default)]
pub struct Environment {
    roots: BTreeMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project a parsed command: `command.bundle`, `command.name`,
    /// `option[...]`, and `arg[...]`.
    pub fn with_command(mut self, cmd: &Command) -> Self {
        let mut command = BTreeMap::new();
        command.insert("bundle".to_string(), Value::String(cmd.bundle.clone()));
        command.insert("name".to_string(), Value::String(cmd.command.clone()));
        self.roots.insert("command".to_string(), Value::Map(command));

        let options: BTreeMap<String, Value> = cmd
            .options
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.roots.insert("option".to_string(), Value::Map(options));

        self.roots
            .insert("arg".to_string(), Value::List(cmd.parameters.clone()));
        self
    }

    /// Project the acting user: `user.name`, `user.email`, `user.groups`.
    pub fn with_user(mut self, user: &User, groups: &[String]) -> Self {
        let mut map = BTreeMap::new();
        map.insert("name".to_string(), Value::String(user.username.clone()));
        map.insert("email".to_string(), Value::String(user.email.clone()));
        map.insert(
            "groups".to_string(),
            Value::List(groups.iter().cloned().map(Value::String).collect()),
        );
        self.roots.insert("user".to_string(), Value::Map(map));
        self
    }

    /// Project clock fields from an explicit UTC timestamp: `time.hour`,
    /// `time.minute`, `time.day`, `time.month`, `time.year`, and
    /// `time.weekday` (lowercase full name).
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        let mut map = BTreeMap::new();
        map.insert("hour".to_string(), Value::Int(i64::from(now.hour())));
        map.insert("minute".to_string(), Value::Int(i64::from(now.minute())));
        map.insert("day".to_string(), Value::Int(i64::from(now.day())));
        map.insert("month".to_string(), Value::Int(i64::from(now.month())));
        map.insert("year".to_string(), Value::Int(i64::from(now.year())));
        map.insert(
            "weekday".to_string(),
            Value::String(weekday_name(now.weekday()).to_string()),
        );
        self.roots.insert("time".to_string(), Value::Map(map));
        self
    }

    /// Resolve a reference path to its current value. Any miss along the
    /// way — unknown root, absent key, out-of-range index, segment kind not
    /// applicable to the value — yields `Null`, never an error.
    pub fn resolve(&self, path: &RefPath) -> Value {
        let mut segments = path.segments.iter();
        let root = match segments.next() {
            Some(Segment::Field(name)) => name,
            _ => return Value::Null,
        };
        let mut current = match self.roots.get(root) {
            Some(value) => value,
            None => return Value::Null,
        };

        for segment in segments {
            current = match (segment, current) {
                (Segment::Field(name), Value::Map(entries)) => match entries.get(name) {
                    Some(v) => v,
                    None => return Value::Null,
                },
                (Segment::Key(key), Value::Map(entries)) => match entries.get(key) {
                    Some(v) => v,
                    None => return Value::Null,
                },
                (Segment::Index(i), Value::List(items)) => {
                    let idx = usize::try_from(*i).ok();
                    match idx.and_then(|i| items.get(i)) {
                        Some(v) => v,
                        None => return Value::Null,
                    }
                }
                _ => return Value::Null,
            };
        }

        current.clone()
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}
