//! The data-access contract: one capability covering users, groups, roles,
//! bundles, and session tokens.
//!
//! Implementations are swappable back-ends behind `Arc<dyn DataAccess>`; the
//! in-memory implementation in [`crate::memory`] is the reference for the
//! behavioral contract. All operations are async; cancelling the returned
//! future abandons the operation, and a back-end that observes an internal
//! deadline reports it as [`DataAccessError::Cancelled`].
//!
//! Behavioral requirements common to every implementation:
//!
//! - Name arguments are validated for non-emptiness *before* any lookup;
//!   an empty name is an `Empty*` error, a missing entity a `NoSuch*` error.
//! - List-returning operations return copies, never aliases into the store.
//! - `user_permission_list` and `role_permission_list` are sorted
//!   lexicographically by `"bundle:permission"`; `group_role_list` is sorted
//!   by role name.
//! - Operations are linearizable with respect to a single entity; no
//!   cross-entity transactional guarantees are promised.

use async_trait::async_trait;
use chrono::Duration;

use parley_types::{Bundle, Group, Role, RolePermission, Token, User};

use crate::error::DataAccessError;

#[async_trait]
pub trait DataAccess: Send + Sync {
    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Create a new user. `UserExists` if the username is taken.
    async fn user_create(&self, user: User) -> Result<(), DataAccessError>;

    /// Replace an existing user's record. `NoSuchUser` if absent.
    async fn user_update(&self, user: User) -> Result<(), DataAccessError>;

    async fn user_get(&self, username: &str) -> Result<User, DataAccessError>;

    /// Resolve a user by one of their chat-provider mappings.
    async fn user_get_by_mapping(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<User, DataAccessError>;

    async fn user_exists(&self, username: &str) -> Result<bool, DataAccessError>;

    /// Delete a user and remove them from every group.
    async fn user_delete(&self, username: &str) -> Result<(), DataAccessError>;

    async fn user_list(&self) -> Result<Vec<User>, DataAccessError>;

    /// Every group the user belongs to.
    async fn user_group_list(&self, username: &str) -> Result<Vec<Group>, DataAccessError>;

    /// The user's effective permissions: the union over their groups' roles'
    /// permissions, as deduplicated `"bundle:permission"` strings, sorted.
    async fn user_permission_list(&self, username: &str)
        -> Result<Vec<String>, DataAccessError>;

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    async fn group_create(&self, group: Group) -> Result<(), DataAccessError>;

    async fn group_get(&self, name: &str) -> Result<Group, DataAccessError>;

    async fn group_exists(&self, name: &str) -> Result<bool, DataAccessError>;

    /// Delete a group, severing user membership and role links without
    /// touching the users or roles themselves.
    async fn group_delete(&self, name: &str) -> Result<(), DataAccessError>;

    async fn group_list(&self) -> Result<Vec<Group>, DataAccessError>;

    /// Add a user to a group. Idempotent: re-adding a member is a no-op.
    async fn group_add_user(&self, name: &str, username: &str) -> Result<(), DataAccessError>;

    /// Remove a user from a group. `NoSuchUser` if they are not a member.
    async fn group_remove_user(&self, name: &str, username: &str)
        -> Result<(), DataAccessError>;

    /// Grant a role to a group. Idempotent.
    async fn group_grant_role(&self, name: &str, rolename: &str)
        -> Result<(), DataAccessError>;

    /// Revoke a role from a group. Revoking an ungranted role is a no-op.
    async fn group_revoke_role(&self, name: &str, rolename: &str)
        -> Result<(), DataAccessError>;

    /// The group's roles, sorted by name.
    async fn group_role_list(&self, name: &str) -> Result<Vec<Role>, DataAccessError>;

    // -----------------------------------------------------------------------
    // Roles
    // -----------------------------------------------------------------------

    async fn role_create(&self, rolename: &str) -> Result<(), DataAccessError>;

    /// Delete a role, severing its group links without deleting groups.
    async fn role_delete(&self, rolename: &str) -> Result<(), DataAccessError>;

    async fn role_get(&self, rolename: &str) -> Result<Role, DataAccessError>;

    async fn role_exists(&self, rolename: &str) -> Result<bool, DataAccessError>;

    async fn role_list(&self) -> Result<Vec<Role>, DataAccessError>;

    /// Grant a `(bundle, permission)` tuple to a role. Idempotent.
    async fn role_grant_permission(
        &self,
        rolename: &str,
        bundle_name: &str,
        permission: &str,
    ) -> Result<(), DataAccessError>;

    async fn role_revoke_permission(
        &self,
        rolename: &str,
        bundle_name: &str,
        permission: &str,
    ) -> Result<(), DataAccessError>;

    async fn role_permission_exists(
        &self,
        rolename: &str,
        bundle_name: &str,
        permission: &str,
    ) -> Result<bool, DataAccessError>;

    /// The role's permissions, sorted by `"bundle:permission"`.
    async fn role_permission_list(
        &self,
        rolename: &str,
    ) -> Result<Vec<RolePermission>, DataAccessError>;

    /// Inverse of [`group_grant_role`](Self::group_grant_role).
    async fn role_group_add(&self, rolename: &str, name: &str)
        -> Result<(), DataAccessError>;

    async fn role_group_delete(&self, rolename: &str, name: &str)
        -> Result<(), DataAccessError>;

    async fn role_group_exists(
        &self,
        rolename: &str,
        name: &str,
    ) -> Result<bool, DataAccessError>;

    /// Every group holding the role, sorted by name.
    async fn role_group_list(&self, rolename: &str) -> Result<Vec<Group>, DataAccessError>;

    // -----------------------------------------------------------------------
    // Bundles
    // -----------------------------------------------------------------------

    async fn bundle_create(&self, bundle: Bundle) -> Result<(), DataAccessError>;

    /// Replace an existing bundle version's record.
    async fn bundle_update(&self, bundle: Bundle) -> Result<(), DataAccessError>;

    async fn bundle_get(&self, name: &str, version: &str)
        -> Result<Bundle, DataAccessError>;

    async fn bundle_list(&self) -> Result<Vec<Bundle>, DataAccessError>;

    /// Delete a bundle version. The rules its commands carry go with it;
    /// roles keep their now-inert `(bundle, permission)` tuples.
    async fn bundle_delete(&self, name: &str, version: &str)
        -> Result<(), DataAccessError>;

    /// Enable a bundle version, atomically disabling any other enabled
    /// version of the same name.
    async fn bundle_enable(&self, name: &str, version: &str)
        -> Result<(), DataAccessError>;

    async fn bundle_disable(&self, name: &str, version: &str)
        -> Result<(), DataAccessError>;

    async fn bundle_list_enabled(&self) -> Result<Vec<Bundle>, DataAccessError>;

    // -----------------------------------------------------------------------
    // Tokens
    // -----------------------------------------------------------------------

    /// Issue a token for the user, superseding any existing one: no observer
    /// may ever see two active tokens for one username.
    async fn token_generate(
        &self,
        username: &str,
        duration: Duration,
    ) -> Result<Token, DataAccessError>;

    async fn token_invalidate(&self, token: &str) -> Result<(), DataAccessError>;

    async fn token_retrieve_by_user(&self, username: &str)
        -> Result<Token, DataAccessError>;

    async fn token_retrieve_by_token(&self, token: &str)
        -> Result<Token, DataAccessError>;

    /// True iff the token exists and has not expired. Never removes expired
    /// tokens; that is [`token_sweep`](Self::token_sweep)'s job.
    async fn token_evaluate(&self, token: &str) -> bool;

    /// Delete every expired token, returning how many were removed.
    async fn token_sweep(&self) -> Result<usize, DataAccessError>;
}
