//! Identity and authorization storage for Parley.
//!
//! [`DataAccess`] is the single capability back-ends implement; the
//! in-memory [`MemoryDataAccess`] is both the ephemeral-deployment store and
//! the behavioral reference for persistent implementations. Token material
//! and password digests live here too, next to the store that holds them.

pub mod access;
pub mod error;
pub mod memory;
pub mod password;
pub mod token;

pub use access::DataAccess;
pub use error::DataAccessError;
pub use memory::MemoryDataAccess;
pub use password::{hash_password, verify_password};
pub use token::{generate_token_value, TOKEN_BYTES};
