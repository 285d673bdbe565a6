//! Permission backend
//!
//! Access control entries (ACEs) grant a permission on an object to a set
//! of principals. Users may also carry extra principals (groups, roles).
//! Authorization asks whether any of a caller's principals appears in the
//! ACE of the required permission, optionally widened by a
//! [`BoundPermissions`] policy.

use parking_lot::RwLock;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use syncstore_core::{Result, StoreError};

/// User that owns the heartbeat sentinel principal
pub const HEARTBEAT_USER: &str = "__heartbeat__";

/// Sentinel principal added and removed by `ping`
pub const HEARTBEAT_PRINCIPAL: &str = "alive";

/// Permission -> principals of one object
pub type ObjectPermissions = BTreeMap<String, BTreeSet<String>>;

/// Which permissions satisfy a requested one
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BoundPermissions {
    /// Only the requested permission
    #[default]
    Exact,
    /// `read` is also granted by `write`
    WriteImpliesRead,
    /// Check these permissions instead of the requested one
    AnyOf(Vec<String>),
}

impl BoundPermissions {
    /// Permissions to look up for a request on `permission`
    pub fn expand(&self, permission: &str) -> Vec<String> {
        match self {
            BoundPermissions::Exact => vec![permission.to_string()],
            BoundPermissions::WriteImpliesRead if permission == "read" => {
                vec!["read".to_string(), "write".to_string()]
            }
            BoundPermissions::WriteImpliesRead => vec![permission.to_string()],
            BoundPermissions::AnyOf(permissions) => permissions.clone(),
        }
    }
}

/// Anchored regex for an object id pattern where `*` stands for any run
/// of characters
fn object_id_regex(pattern: &str) -> Result<Regex> {
    let source = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
    Regex::new(&source).map_err(|e| {
        StoreError::invalid_input(format!("invalid object id pattern '{}': {}", pattern, e))
    })
}

/// Storage of principals and access control entries
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait PermissionBackend: Send + Sync {
    /// Provision backend structures; idempotent
    fn initialize_schema(&self) -> Result<()>;

    /// Remove every principal and ACE
    fn flush(&self) -> Result<()>;

    /// Give `user_id` an extra principal
    fn add_user_principal(&self, user_id: &str, principal: &str) -> Result<()>;

    /// Take an extra principal away from `user_id`
    fn remove_user_principal(&self, user_id: &str, principal: &str) -> Result<()>;

    /// Extra principals of `user_id`
    fn user_principals(&self, user_id: &str) -> Result<BTreeSet<String>>;

    /// Grant `permission` on `object_id` to `principal`
    fn add_principal_to_ace(&self, object_id: &str, permission: &str, principal: &str) -> Result<()>;

    /// Revoke `permission` on `object_id` from `principal`
    fn remove_principal_from_ace(&self, object_id: &str, permission: &str, principal: &str)
        -> Result<()>;

    /// Principals holding exactly `permission` on `object_id`
    fn object_permission_principals(&self, object_id: &str, permission: &str)
        -> Result<BTreeSet<String>>;

    /// Principals holding `permission` on `object_id`, widened by `bound`
    fn object_permission_authorized_principals(
        &self,
        object_id: &str,
        permission: &str,
        bound: &BoundPermissions,
    ) -> Result<BTreeSet<String>>;

    /// Objects matching `object_id_match` (`*` wildcard, default all) on
    /// which one of `principals` holds `permission`, widened by `bound`
    fn principals_accessible_objects(
        &self,
        principals: &[String],
        permission: &str,
        object_id_match: Option<&str>,
        bound: &BoundPermissions,
    ) -> Result<BTreeSet<String>>;

    /// Principals per permission of `object_id`, restricted to
    /// `permissions` when given
    fn object_permissions(&self, object_id: &str, permissions: Option<&[String]>)
        -> Result<ObjectPermissions>;

    /// Replace the principals of each listed permission; others are kept
    fn replace_object_permissions(&self, object_id: &str, permissions: &ObjectPermissions) -> Result<()>;

    /// Drop every ACE of the listed objects
    fn delete_object_permissions(&self, object_ids: &[String]) -> Result<()>;

    /// True if one of `principals` may exercise `permission` on `object_id`
    fn check_permission(
        &self,
        object_id: &str,
        permission: &str,
        principals: &[String],
        bound: &BoundPermissions,
    ) -> Result<bool> {
        let authorized = self.object_permission_authorized_principals(object_id, permission, bound)?;
        Ok(principals.iter().any(|p| authorized.contains(p)))
    }

    /// Add then remove a sentinel principal
    ///
    /// If the removal fails it is retried once so the sentinel does not
    /// linger; the probe still reports failure.
    fn ping(&self) -> bool {
        if let Err(e) = self.add_user_principal(HEARTBEAT_USER, HEARTBEAT_PRINCIPAL) {
            tracing::warn!(error = %e, "Permission heartbeat failed");
            return false;
        }
        match self.remove_user_principal(HEARTBEAT_USER, HEARTBEAT_PRINCIPAL) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Permission heartbeat cleanup failed, retrying");
                if let Err(e) = self.remove_user_principal(HEARTBEAT_USER, HEARTBEAT_PRINCIPAL) {
                    tracing::error!(error = %e, "Heartbeat sentinel principal left behind");
                }
                false
            }
        }
    }
}

#[derive(Debug, Default)]
struct PermissionState {
    user_principals: FxHashMap<String, BTreeSet<String>>,
    /// (object_id, permission) -> principals
    aces: FxHashMap<(String, String), BTreeSet<String>>,
}

/// Permission backend held in process memory
#[derive(Debug, Default)]
pub struct MemoryPermission {
    state: RwLock<PermissionState>,
}

impl MemoryPermission {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }
}

fn ace_key(object_id: &str, permission: &str) -> (String, String) {
    (object_id.to_string(), permission.to_string())
}

impl PermissionBackend for MemoryPermission {
    fn initialize_schema(&self) -> Result<()> {
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut state = self.state.write();
        state.user_principals.clear();
        state.aces.clear();
        Ok(())
    }

    fn add_user_principal(&self, user_id: &str, principal: &str) -> Result<()> {
        self.state
            .write()
            .user_principals
            .entry(user_id.to_string())
            .or_default()
            .insert(principal.to_string());
        Ok(())
    }

    fn remove_user_principal(&self, user_id: &str, principal: &str) -> Result<()> {
        let mut state = self.state.write();
        if let Some(principals) = state.user_principals.get_mut(user_id) {
            principals.remove(principal);
            if principals.is_empty() {
                state.user_principals.remove(user_id);
            }
        }
        Ok(())
    }

    fn user_principals(&self, user_id: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .state
            .read()
            .user_principals
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    fn add_principal_to_ace(&self, object_id: &str, permission: &str, principal: &str) -> Result<()> {
        self.state
            .write()
            .aces
            .entry(ace_key(object_id, permission))
            .or_default()
            .insert(principal.to_string());
        Ok(())
    }

    fn remove_principal_from_ace(
        &self,
        object_id: &str,
        permission: &str,
        principal: &str,
    ) -> Result<()> {
        let mut state = self.state.write();
        let key = ace_key(object_id, permission);
        if let Some(principals) = state.aces.get_mut(&key) {
            principals.remove(principal);
            if principals.is_empty() {
                state.aces.remove(&key);
            }
        }
        Ok(())
    }

    fn object_permission_principals(
        &self,
        object_id: &str,
        permission: &str,
    ) -> Result<BTreeSet<String>> {
        Ok(self
            .state
            .read()
            .aces
            .get(&ace_key(object_id, permission))
            .cloned()
            .unwrap_or_default())
    }

    fn object_permission_authorized_principals(
        &self,
        object_id: &str,
        permission: &str,
        bound: &BoundPermissions,
    ) -> Result<BTreeSet<String>> {
        let state = self.state.read();
        let mut authorized = BTreeSet::new();
        for permission in bound.expand(permission) {
            if let Some(principals) = state.aces.get(&ace_key(object_id, &permission)) {
                authorized.extend(principals.iter().cloned());
            }
        }
        Ok(authorized)
    }

    fn principals_accessible_objects(
        &self,
        principals: &[String],
        permission: &str,
        object_id_match: Option<&str>,
        bound: &BoundPermissions,
    ) -> Result<BTreeSet<String>> {
        let pattern = object_id_regex(object_id_match.unwrap_or("*"))?;
        let permissions = bound.expand(permission);
        let state = self.state.read();
        Ok(state
            .aces
            .iter()
            .filter(|((object_id, perm), holders)| {
                permissions.contains(perm)
                    && pattern.is_match(object_id)
                    && principals.iter().any(|p| holders.contains(p))
            })
            .map(|((object_id, _), _)| object_id.clone())
            .collect())
    }

    fn object_permissions(
        &self,
        object_id: &str,
        permissions: Option<&[String]>,
    ) -> Result<ObjectPermissions> {
        let state = self.state.read();
        Ok(state
            .aces
            .iter()
            .filter(|((object, perm), _)| {
                object == object_id && permissions.map_or(true, |wanted| wanted.contains(perm))
            })
            .map(|((_, perm), principals)| (perm.clone(), principals.clone()))
            .collect())
    }

    fn replace_object_permissions(&self, object_id: &str, permissions: &ObjectPermissions) -> Result<()> {
        let mut state = self.state.write();
        for (permission, principals) in permissions {
            let key = ace_key(object_id, permission);
            if principals.is_empty() {
                state.aces.remove(&key);
            } else {
                state.aces.insert(key, principals.clone());
            }
        }
        Ok(())
    }

    fn delete_object_permissions(&self, object_ids: &[String]) -> Result<()> {
        let mut state = self.state.write();
        state
            .aces
            .retain(|(object_id, _), _| !object_ids.contains(object_id));
        Ok(())
    }
}
