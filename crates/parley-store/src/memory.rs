//! In-memory reference implementation of [`DataAccess`].
//!
//! Four entity maps plus the two token indexes live behind a single
//! reader-writer lock; every mutation takes the write guard for its whole
//! critical section, so multi-step updates (token supersede, link severing
//! on delete) are atomic with respect to readers.
//!
//! Relationship storage is one-sided: a group owns both its member set and
//! its role-name set. `user_group_list` and `role_group_list` derive their
//! answers by scanning groups, which keeps reads consistent with writes by
//! construction. All list-returning operations clone.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use parley_types::{Bundle, Group, Role, RolePermission, Token, User};

use crate::access::DataAccess;
use crate::error::DataAccessError;
use crate::token::generate_token_value;

#[derive(Debug, Default)]
struct StoreInner {
    users: BTreeMap<String, User>,
    groups: BTreeMap<String, Group>,
    roles: BTreeMap<String, Role>,
    /// Keyed by `(name, version)`.
    bundles: BTreeMap<(String, String), Bundle>,
    tokens_by_value: BTreeMap<String, Token>,
    tokens_by_user: BTreeMap<String, Token>,
}

/// The in-memory data store. Cheap to construct; used for ephemeral
/// deployments and as the behavioral oracle for persistent back-ends.
#[derive(Debug, Default)]
pub struct MemoryDataAccess {
    inner: RwLock<StoreInner>,
}

impl MemoryDataAccess {
    pub fn new() -> Self {
        Self::default()
    }
}

fn require_username(username: &str) -> Result<(), DataAccessError> {
    if username.is_empty() {
        return Err(DataAccessError::EmptyUserName);
    }
    Ok(())
}

fn require_group_name(name: &str) -> Result<(), DataAccessError> {
    if name.is_empty() {
        return Err(DataAccessError::EmptyGroupName);
    }
    Ok(())
}

fn require_role_name(name: &str) -> Result<(), DataAccessError> {
    if name.is_empty() {
        return Err(DataAccessError::EmptyRoleName);
    }
    Ok(())
}

fn require_bundle_key(name: &str, version: &str) -> Result<(), DataAccessError> {
    if name.is_empty() {
        return Err(DataAccessError::EmptyBundleName);
    }
    if version.is_empty() {
        return Err(DataAccessError::InvalidBundleVersion);
    }
    Ok(())
}

#[async_trait]
impl DataAccess for MemoryDataAccess {
    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    async fn user_create(&self, user: User) -> Result<(), DataAccessError> {
        require_username(&user.username)?;
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(&user.username) {
            return Err(DataAccessError::UserExists);
        }
        info!(username = %user.username, "user created");
        inner.users.insert(user.username.clone(), user);
        Ok(())
    }

    async fn user_update(&self, user: User) -> Result<(), DataAccessError> {
        require_username(&user.username)?;
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&user.username) {
            return Err(DataAccessError::NoSuchUser);
        }
        inner.users.insert(user.username.clone(), user);
        Ok(())
    }

    async fn user_get(&self, username: &str) -> Result<User, DataAccessError> {
        require_username(username)?;
        let inner = self.inner.read().await;
        inner
            .users
            .get(username)
            .cloned()
            .ok_or(DataAccessError::NoSuchUser)
    }

    async fn user_get_by_mapping(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<User, DataAccessError> {
        let inner = self.inner.read().await;
        inner
            .users
            .values()
            .find(|u| {
                u.mappings
                    .iter()
                    .any(|m| m.provider == provider && m.provider_id == provider_id)
            })
            .cloned()
            .ok_or(DataAccessError::NoSuchUser)
    }

    async fn user_exists(&self, username: &str) -> Result<bool, DataAccessError> {
        require_username(username)?;
        let inner = self.inner.read().await;
        Ok(inner.users.contains_key(username))
    }

    async fn user_delete(&self, username: &str) -> Result<(), DataAccessError> {
        require_username(username)?;
        let mut inner = self.inner.write().await;
        if inner.users.remove(username).is_none() {
            return Err(DataAccessError::NoSuchUser);
        }
        for group in inner.groups.values_mut() {
            group.users.remove(username);
        }
        info!(username, "user deleted");
        Ok(())
    }

    async fn user_list(&self) -> Result<Vec<User>, DataAccessError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().cloned().collect())
    }

    async fn user_group_list(&self, username: &str) -> Result<Vec<Group>, DataAccessError> {
        require_username(username)?;
        let inner = self.inner.read().await;
        if !inner.users.contains_key(username) {
            return Err(DataAccessError::NoSuchUser);
        }
        Ok(inner
            .groups
            .values()
            .filter(|g| g.users.contains(username))
            .cloned()
            .collect())
    }

    async fn user_permission_list(
        &self,
        username: &str,
    ) -> Result<Vec<String>, DataAccessError> {
        require_username(username)?;
        let inner = self.inner.read().await;
        if !inner.users.contains_key(username) {
            return Err(DataAccessError::NoSuchUser);
        }

        let mut permissions = BTreeSet::new();
        for group in inner.groups.values().filter(|g| g.users.contains(username)) {
            for rolename in &group.roles {
                if let Some(role) = inner.roles.get(rolename) {
                    for p in &role.permissions {
                        permissions.insert(p.to_string());
                    }
                }
            }
        }
        Ok(permissions.into_iter().collect())
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    async fn group_create(&self, group: Group) -> Result<(), DataAccessError> {
        require_group_name(&group.name)?;
        let mut inner = self.inner.write().await;
        if inner.groups.contains_key(&group.name) {
            return Err(DataAccessError::GroupExists);
        }
        info!(group = %group.name, "group created");
        inner.groups.insert(group.name.clone(), group);
        Ok(())
    }

    async fn group_get(&self, name: &str) -> Result<Group, DataAccessError> {
        require_group_name(name)?;
        let inner = self.inner.read().await;
        inner
            .groups
            .get(name)
            .cloned()
            .ok_or(DataAccessError::NoSuchGroup)
    }

    async fn group_exists(&self, name: &str) -> Result<bool, DataAccessError> {
        require_group_name(name)?;
        let inner = self.inner.read().await;
        Ok(inner.groups.contains_key(name))
    }

    async fn group_delete(&self, name: &str) -> Result<(), DataAccessError> {
        require_group_name(name)?;
        let mut inner = self.inner.write().await;
        if inner.groups.remove(name).is_none() {
            return Err(DataAccessError::NoSuchGroup);
        }
        info!(group = name, "group deleted");
        Ok(())
    }

    async fn group_list(&self) -> Result<Vec<Group>, DataAccessError> {
        let inner = self.inner.read().await;
        Ok(inner.groups.values().cloned().collect())
    }

    async fn group_add_user(&self, name: &str, username: &str) -> Result<(), DataAccessError> {
        require_group_name(name)?;
        require_username(username)?;
        let mut inner = self.inner.write().await;
        if !inner.groups.contains_key(name) {
            return Err(DataAccessError::NoSuchGroup);
        }
        if !inner.users.contains_key(username) {
            return Err(DataAccessError::NoSuchUser);
        }
        // BTreeSet insert makes re-adding a member a no-op
        inner
            .groups
            .get_mut(name)
            .expect("checked above")
            .users
            .insert(username.to_string());
        Ok(())
    }

    async fn group_remove_user(
        &self,
        name: &str,
        username: &str,
    ) -> Result<(), DataAccessError> {
        require_group_name(name)?;
        require_username(username)?;
        let mut inner = self.inner.write().await;
        let group = inner
            .groups
            .get_mut(name)
            .ok_or(DataAccessError::NoSuchGroup)?;
        if !group.users.remove(username) {
            return Err(DataAccessError::NoSuchUser);
        }
        Ok(())
    }

    async fn group_grant_role(
        &self,
        name: &str,
        rolename: &str,
    ) -> Result<(), DataAccessError> {
        require_group_name(name)?;
        require_role_name(rolename)?;
        let mut inner = self.inner.write().await;
        if !inner.groups.contains_key(name) {
            return Err(DataAccessError::NoSuchGroup);
        }
        if !inner.roles.contains_key(rolename) {
            return Err(DataAccessError::NoSuchRole);
        }
        inner
            .groups
            .get_mut(name)
            .expect("checked above")
            .roles
            .insert(rolename.to_string());
        Ok(())
    }

    async fn group_revoke_role(
        &self,
        name: &str,
        rolename: &str,
    ) -> Result<(), DataAccessError> {
        require_group_name(name)?;
        require_role_name(rolename)?;
        let mut inner = self.inner.write().await;
        let group = inner
            .groups
            .get_mut(name)
            .ok_or(DataAccessError::NoSuchGroup)?;
        group.roles.remove(rolename);
        Ok(())
    }

    async fn group_role_list(&self, name: &str) -> Result<Vec<Role>, DataAccessError> {
        require_group_name(name)?;
        let inner = self.inner.read().await;
        let group = inner.groups.get(name).ok_or(DataAccessError::NoSuchGroup)?;
        // group.roles is a sorted set, so the output is sorted by name
        Ok(group
            .roles
            .iter()
            .filter_map(|rolename| inner.roles.get(rolename))
            .cloned()
            .collect())
    }

    // -----------------------------------------------------------------------
    // Roles
    // -----------------------------------------------------------------------

    async fn role_create(&self, rolename: &str) -> Result<(), DataAccessError> {
        require_role_name(rolename)?;
        let mut inner = self.inner.write().await;
        if inner.roles.contains_key(rolename) {
            return Err(DataAccessError::RoleExists);
        }
        info!(role = rolename, "role created");
        inner.roles.insert(
            rolename.to_string(),
            Role {
                name: rolename.to_string(),
                permissions: Vec::new(),
            },
        );
        Ok(())
    }

    async fn role_delete(&self, rolename: &str) -> Result<(), DataAccessError> {
        require_role_name(rolename)?;
        let mut inner = self.inner.write().await;
        if inner.roles.remove(rolename).is_none() {
            return Err(DataAccessError::NoSuchRole);
        }
        for group in inner.groups.values_mut() {
            group.roles.remove(rolename);
        }
        info!(role = rolename, "role deleted");
        Ok(())
    }

    async fn role_get(&self, rolename: &str) -> Result<Role, DataAccessError> {
        require_role_name(rolename)?;
        let inner = self.inner.read().await;
        inner
            .roles
            .get(rolename)
            .cloned()
            .ok_or(DataAccessError::NoSuchRole)
    }

    async fn role_exists(&self, rolename: &str) -> Result<bool, DataAccessError> {
        require_role_name(rolename)?;
        let inner = self.inner.read().await;
        Ok(inner.roles.contains_key(rolename))
    }

    async fn role_list(&self) -> Result<Vec<Role>, DataAccessError> {
        let inner = self.inner.read().await;
        Ok(inner.roles.values().cloned().collect())
    }

    async fn role_grant_permission(
        &self,
        rolename: &str,
        bundle_name: &str,
        permission: &str,
    ) -> Result<(), DataAccessError> {
        require_role_name(rolename)?;
        let mut inner = self.inner.write().await;
        let role = inner
            .roles
            .get_mut(rolename)
            .ok_or(DataAccessError::NoSuchRole)?;
        let grant = RolePermission {
            bundle_name: bundle_name.to_string(),
            permission: permission.to_string(),
        };
        if !role.permissions.contains(&grant) {
            role.permissions.push(grant);
        }
        Ok(())
    }

    async fn role_revoke_permission(
        &self,
        rolename: &str,
        bundle_name: &str,
        permission: &str,
    ) -> Result<(), DataAccessError> {
        require_role_name(rolename)?;
        let mut inner = self.inner.write().await;
        let role = inner
            .roles
            .get_mut(rolename)
            .ok_or(DataAccessError::NoSuchRole)?;
        role.permissions
            .retain(|p| !(p.bundle_name == bundle_name && p.permission == permission));
        Ok(())
    }

    async fn role_permission_exists(
        &self,
        rolename: &str,
        bundle_name: &str,
        permission: &str,
    ) -> Result<bool, DataAccessError> {
        require_role_name(rolename)?;
        let inner = self.inner.read().await;
        let role = inner
            .roles
            .get(rolename)
            .ok_or(DataAccessError::NoSuchRole)?;
        Ok(role
            .permissions
            .iter()
            .any(|p| p.bundle_name == bundle_name && p.permission == permission))
    }

    async fn role_permission_list(
        &self,
        rolename: &str,
    ) -> Result<Vec<RolePermission>, DataAccessError> {
        require_role_name(rolename)?;
        let inner = self.inner.read().await;
        let role = inner
            .roles
            .get(rolename)
            .ok_or(DataAccessError::NoSuchRole)?;
        let mut permissions = role.permissions.clone();
        permissions.sort_by_key(|p| p.to_string());
        Ok(permissions)
    }

    async fn role_group_add(&self, rolename: &str, name: &str) -> Result<(), DataAccessError> {
        self.group_grant_role(name, rolename).await
    }

    async fn role_group_delete(
        &self,
        rolename: &str,
        name: &str,
    ) -> Result<(), DataAccessError> {
        self.group_revoke_role(name, rolename).await
    }

    async fn role_group_exists(
        &self,
        rolename: &str,
        name: &str,
    ) -> Result<bool, DataAccessError> {
        require_role_name(rolename)?;
        require_group_name(name)?;
        let inner = self.inner.read().await;
        if !inner.roles.contains_key(rolename) {
            return Err(DataAccessError::NoSuchRole);
        }
        let group = inner.groups.get(name).ok_or(DataAccessError::NoSuchGroup)?;
        Ok(group.roles.contains(rolename))
    }

    async fn role_group_list(&self, rolename: &str) -> Result<Vec<Group>, DataAccessError> {
        require_role_name(rolename)?;
        let inner = self.inner.read().await;
        if !inner.roles.contains_key(rolename) {
            return Err(DataAccessError::NoSuchRole);
        }
        Ok(inner
            .groups
            .values()
            .filter(|g| g.roles.contains(rolename))
            .cloned()
            .collect())
    }

    // -----------------------------------------------------------------------
    // Bundles
    // -----------------------------------------------------------------------

    async fn bundle_create(&self, mut bundle: Bundle) -> Result<(), DataAccessError> {
        require_bundle_key(&bundle.name, &bundle.version)?;
        let mut inner = self.inner.write().await;
        let key = (bundle.name.clone(), bundle.version.clone());
        if inner.bundles.contains_key(&key) {
            return Err(DataAccessError::BundleExists);
        }
        // versions start disabled; enabling goes through bundle_enable so
        // the one-enabled-version invariant holds
        bundle.enabled = false;
        info!(bundle = %bundle.name, version = %bundle.version, "bundle created");
        inner.bundles.insert(key, bundle);
        Ok(())
    }

    async fn bundle_update(&self, mut bundle: Bundle) -> Result<(), DataAccessError> {
        require_bundle_key(&bundle.name, &bundle.version)?;
        let mut inner = self.inner.write().await;
        let key = (bundle.name.clone(), bundle.version.clone());
        let existing = inner
            .bundles
            .get(&key)
            .ok_or(DataAccessError::NoSuchBundle)?;
        bundle.enabled = existing.enabled;
        inner.bundles.insert(key, bundle);
        Ok(())
    }

    async fn bundle_get(&self, name: &str, version: &str) -> Result<Bundle, DataAccessError> {
        require_bundle_key(name, version)?;
        let inner = self.inner.read().await;
        inner
            .bundles
            .get(&(name.to_string(), version.to_string()))
            .cloned()
            .ok_or(DataAccessError::NoSuchBundle)
    }

    async fn bundle_list(&self) -> Result<Vec<Bundle>, DataAccessError> {
        let inner = self.inner.read().await;
        Ok(inner.bundles.values().cloned().collect())
    }

    async fn bundle_delete(&self, name: &str, version: &str) -> Result<(), DataAccessError> {
        require_bundle_key(name, version)?;
        let mut inner = self.inner.write().await;
        if inner
            .bundles
            .remove(&(name.to_string(), version.to_string()))
            .is_none()
        {
            return Err(DataAccessError::NoSuchBundle);
        }
        info!(bundle = name, version, "bundle deleted");
        Ok(())
    }

    async fn bundle_enable(&self, name: &str, version: &str) -> Result<(), DataAccessError> {
        require_bundle_key(name, version)?;
        let mut inner = self.inner.write().await;
        let key = (name.to_string(), version.to_string());
        if !inner.bundles.contains_key(&key) {
            return Err(DataAccessError::NoSuchBundle);
        }
        // one enabled version per name: switching versions disables the rest
        for ((n, _), bundle) in inner.bundles.iter_mut() {
            if n == name {
                bundle.enabled = false;
            }
        }
        inner.bundles.get_mut(&key).expect("checked above").enabled = true;
        info!(bundle = name, version, "bundle version enabled");
        Ok(())
    }

    async fn bundle_disable(&self, name: &str, version: &str) -> Result<(), DataAccessError> {
        require_bundle_key(name, version)?;
        let mut inner = self.inner.write().await;
        let bundle = inner
            .bundles
            .get_mut(&(name.to_string(), version.to_string()))
            .ok_or(DataAccessError::NoSuchBundle)?;
        bundle.enabled = false;
        info!(bundle = name, version, "bundle version disabled");
        Ok(())
    }

    async fn bundle_list_enabled(&self) -> Result<Vec<Bundle>, DataAccessError> {
        let inner = self.inner.read().await;
        Ok(inner
            .bundles
            .values()
            .filter(|b| b.enabled)
            .cloned()
            .collect())
    }

    // -----------------------------------------------------------------------
    // Tokens
    // -----------------------------------------------------------------------

    async fn token_generate(
        &self,
        username: &str,
        duration: Duration,
    ) -> Result<Token, DataAccessError> {
        require_username(username)?;
        // Single write guard across the supersede and the insert: no reader
        // can observe two active tokens for one username.
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(username) {
            return Err(DataAccessError::NoSuchUser);
        }

        if let Some(old) = inner.tokens_by_user.remove(username) {
            inner.tokens_by_value.remove(&old.token);
            debug!(username, "superseded existing token");
        }

        let token = Token::new(
            generate_token_value(),
            username.to_string(),
            Utc::now(),
            duration,
        );
        inner
            .tokens_by_user
            .insert(username.to_string(), token.clone());
        inner
            .tokens_by_value
            .insert(token.token.clone(), token.clone());
        info!(username, "token issued");
        Ok(token)
    }

    async fn token_invalidate(&self, token: &str) -> Result<(), DataAccessError> {
        let mut inner = self.inner.write().await;
        let token = inner
            .tokens_by_value
            .remove(token)
            .ok_or(DataAccessError::NoSuchToken)?;
        inner.tokens_by_user.remove(&token.user);
        info!(username = %token.user, "token invalidated");
        Ok(())
    }

    async fn token_retrieve_by_user(&self, username: &str) -> Result<Token, DataAccessError> {
        require_username(username)?;
        let inner = self.inner.read().await;
        inner
            .tokens_by_user
            .get(username)
            .cloned()
            .ok_or(DataAccessError::NoSuchToken)
    }

    async fn token_retrieve_by_token(&self, token: &str) -> Result<Token, DataAccessError> {
        let inner = self.inner.read().await;
        inner
            .tokens_by_value
            .get(token)
            .cloned()
            .ok_or(DataAccessError::NoSuchToken)
    }

    async fn token_evaluate(&self, token: &str) -> bool {
        let inner = self.inner.read().await;
        match inner.tokens_by_value.get(token) {
            Some(t) => !t.is_expired(),
            None => false,
        }
    }

    async fn token_sweep(&self) -> Result<usize, DataAccessError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let expired: Vec<String> = inner
            .tokens_by_value
            .values()
            .filter(|t| t.is_expired_at(now))
            .map(|t| t.token.clone())
            .collect();
        for value in &expired {
            if let Some(token) = inner.tokens_by_value.remove(value) {
                inner.tokens_by_user.remove(&token.user);
            }
        }
        if !expired.is_empty() {
            debug!(count = expired.len(), "swept expired tokens");
        }
        Ok(expired.len())
    }
}
