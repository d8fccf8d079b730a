//! Shared helpers for integration tests.
//!
//! Each integration test file compiles common/ as its own module, so not
//! every helper is used in every file.
#![allow(dead_code)]

use std::collections::BTreeMap;

use parley_store::{DataAccess, MemoryDataAccess};
use parley_types::{Bundle, BundleCommand, Group, User};

/// Create a store with a single enabled bundle version whose commands carry
/// the given rules.
pub async fn store_with_bundle(
    bundle: &str,
    commands: &[(&str, &[&str])],
) -> MemoryDataAccess {
    let store = MemoryDataAccess::new();
    install_bundle(&store, bundle, "1.0.0", commands).await;
    store
}

/// Install and enable a bundle version.
pub async fn install_bundle(
    store: &MemoryDataAccess,
    name: &str,
    version: &str,
    commands: &[(&str, &[&str])],
) {
    let commands: BTreeMap<String, BundleCommand> = commands
        .iter()
        .map(|(cmd, rules)| {
            (
                cmd.to_string(),
                BundleCommand {
                    rules: rules.iter().map(|r| r.to_string()).collect(),
                    ..Default::default()
                },
            )
        })
        .collect();

    store
        .bundle_create(Bundle {
            name: name.to_string(),
            version: version.to_string(),
            commands,
            ..Default::default()
        })
        .await
        .expect("should create bundle");
    store
        .bundle_enable(name, version)
        .await
        .expect("should enable bundle");
}

/// Create a user, a dedicated group, and a dedicated role carrying the
/// given `(bundle, permission)` grants.
pub async fn user_with_permissions(
    store: &MemoryDataAccess,
    username: &str,
    grants: &[(&str, &str)],
) {
    store
        .user_create(User {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            ..Default::default()
        })
        .await
        .expect("should create user");

    let group_name = format!("{username}-group");
    let role_name = format!("{username}-role");

    store
        .group_create(Group {
            name: group_name.clone(),
            ..Default::default()
        })
        .await
        .expect("should create group");
    store
        .group_add_user(&group_name, username)
        .await
        .expect("should add user to group");
    store
        .role_create(&role_name)
        .await
        .expect("should create role");
    store
        .group_grant_role(&group_name, &role_name)
        .await
        .expect("should grant role");

    for (bundle, permission) in grants {
        store
            .role_grant_permission(&role_name, bundle, permission)
            .await
            .expect("should grant permission");
    }
}
