//! The data-access error taxonomy.
//!
//! Every operation that names an entity validates non-emptiness before any
//! lookup (`Empty*`), and reports absence with the matching `NoSuch*`. Only
//! [`DataAccessError::DataStoreUnavailable`] and
//! [`DataAccessError::Cancelled`] are retryable; everything else is terminal
//! for the request.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataAccessError {
    #[error("username must not be empty")]
    EmptyUserName,

    #[error("group name must not be empty")]
    EmptyGroupName,

    #[error("role name must not be empty")]
    EmptyRoleName,

    #[error("bundle name must not be empty")]
    EmptyBundleName,

    #[error("no such user")]
    NoSuchUser,

    #[error("no such group")]
    NoSuchGroup,

    #[error("no such role")]
    NoSuchRole,

    #[error("no such bundle")]
    NoSuchBundle,

    #[error("no such token")]
    NoSuchToken,

    #[error("user already exists")]
    UserExists,

    #[error("group already exists")]
    GroupExists,

    #[error("role already exists")]
    RoleExists,

    #[error("bundle already exists")]
    BundleExists,

    #[error("invalid bundle version")]
    InvalidBundleVersion,

    #[error("bundle is not enabled")]
    BundleNotEnabled,

    #[error("data store unavailable: {0}")]
    DataStoreUnavailable(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl DataAccessError {
    /// Whether a caller may retry the operation (with backoff).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DataAccessError::DataStoreUnavailable(_) | DataAccessError::Cancelled
        )
    }
}
