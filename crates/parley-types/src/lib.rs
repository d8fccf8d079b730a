//! Core types shared across all Parley crates.
//!
//! Defines the dynamic [`Value`] representation and its comparison
//! semantics, token-to-value [`Inferrer`], the identity entities (users,
//! groups, roles, bundles, tokens), and service configuration.

pub mod config;
pub mod entity;
pub mod infer;
pub mod value;

pub use config::{CommandParsingConfig, ServiceConfig};
pub use entity::{Bundle, BundleCommand, Group, Role, RolePermission, Token, User, UserMapping};
pub use infer::{InferError, Inferrer};
pub use value::Value;
