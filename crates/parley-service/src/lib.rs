//! The Parley authorization service.
//!
//! [`authorizer`] turns a chat utterance plus an acting user into a typed
//! [`Decision`](authorizer::Decision) by evaluating the access rules of the
//! enabled bundle providing the command. [`server`] exposes the `/v2`
//! administrative API over the same data-access capability.

pub mod authorizer;
pub mod server;

pub use authorizer::{authorize, authorize_utterance, AuthorizeError, Decision};
pub use server::{router, AppState};
