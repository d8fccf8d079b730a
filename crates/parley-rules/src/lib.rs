//! The Parley access-control rule language.
//!
//! A rule guards one `bundle:command` with optional typed conditions and
//! permission requirements:
//!
//! ```text
//! ec2:terminate when option["region"] in ["us-east-1", "us-west-2"]
//!     must have ec2:destroy
//! ```
//!
//! [`parse_rule`] turns the text into a [`Rule`]; [`Rule::matches`] checks
//! its conditions against an [`Environment`] built from the parsed command,
//! the acting user, and the clock; [`Rule::allowed`] checks its permission
//! requirements against the user's effective permissions. All of it is pure:
//! evaluation performs no I/O and never panics on malformed lookups.

pub mod env;
pub mod error;
pub mod expression;
pub mod parser;
pub mod rule;
pub mod tokenizer;

pub use env::Environment;
pub use error::RuleError;
pub use expression::{
    parse_ref_path, CollectionModifier, Expression, Join, Op, Operand, Permission, RefPath,
    Segment,
};
pub use parser::{parse, parse_rule};
pub use rule::Rule;
pub use tokenizer::{tokenize, RuleTokens};
