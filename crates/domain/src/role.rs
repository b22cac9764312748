use std::collections::BTreeSet;

use keygate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{ScopeCatalog, ScopeId};

/// Named, reusable bundle of scopes assignable to a user within a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable role identifier, derived from the name at creation time.
    pub id: String,
    /// Human-friendly role name.
    pub name: String,
    /// One-line description shown in the role picker.
    pub description: String,
    /// Scope ids granted by this role. Every id must exist in the catalog.
    pub scopes: BTreeSet<ScopeId>,
    /// Marks the role preselected for new members.
    pub is_default: bool,
    /// Marks an administrator-created role.
    pub is_custom: bool,
    /// Marks a platform-seeded role outside tenant administration.
    pub is_system: bool,
}

impl Role {
    /// Returns whether administrators may rename, re-scope, or delete this role.
    ///
    /// Predefined and system roles are immutable; only custom roles are not.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.is_custom && !self.is_system
    }
}

/// Input payload for creating custom roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDraft {
    /// Unique role name in tenant scope.
    pub name: String,
    /// Optional description; empty is allowed.
    pub description: String,
    /// Scope ids to grant.
    pub scopes: BTreeSet<ScopeId>,
}

impl RoleDraft {
    /// Starts a draft from a preset role.
    ///
    /// The preset's scope set is copied into the draft, not merged with any
    /// prior selection; adding scopes afterwards grows the copy only. This is
    /// deliberately different from the flat builder, where applying a
    /// template replaces the whole selection.
    #[must_use]
    pub fn from_preset(
        name: impl Into<String>,
        description: impl Into<String>,
        preset: &Role,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            scopes: preset.scopes.clone(),
        }
    }

    /// Validates draft invariants against the catalog.
    ///
    /// An empty name or zero scopes blocks creation before it reaches any
    /// repository; unknown scope ids are rejected outright.
    pub fn validate(&self, catalog: &ScopeCatalog) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(
                "role name must not be empty".to_owned(),
            ));
        }

        if self.scopes.is_empty() {
            return Err(AppError::Validation(
                "role must grant at least one scope".to_owned(),
            ));
        }

        for scope_id in &self.scopes {
            if catalog.get(scope_id.as_str()).is_none() {
                return Err(AppError::Validation(format!(
                    "unknown scope id '{scope_id}'"
                )));
            }
        }

        Ok(())
    }
}

/// Partial update for an existing custom role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePatch {
    /// Replacement name, if any.
    pub name: Option<String>,
    /// Replacement description, if any.
    pub description: Option<String>,
    /// Replacement scope set, if any.
    pub scopes: Option<BTreeSet<ScopeId>>,
}

/// Derives a stable role id from a display name.
///
/// Lowercased, whitespace collapsed to single underscores. Collision handling
/// is the registry's concern, not the derivation's.
#[must_use]
pub fn derive_role_id(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn scope_set(ids: &[&str]) -> BTreeSet<ScopeId> {
    ids.iter().map(|id| ScopeId::from_raw(*id)).collect()
}

/// Returns the platform-seeded roles.
///
/// Seeded once at process start; none of these are editable through the
/// registry.
#[must_use]
pub fn predefined_roles() -> Vec<Role> {
    vec![
        Role {
            id: "owner".to_owned(),
            name: "Owner".to_owned(),
            description: "Unrestricted platform owner".to_owned(),
            scopes: scope_set(&[
                "user.read",
                "user.write",
                "user.ban",
                "user.delete",
                "license.read",
                "license.create",
                "license.update",
                "license.delete",
                "session.read",
                "session.kill",
                "subscription.read",
                "subscription.write",
                "subscription.delete",
                "log.read",
                "log.delete",
                "global.settings",
                "global.admin",
            ]),
            is_default: false,
            is_custom: false,
            is_system: true,
        },
        Role {
            id: "admin".to_owned(),
            name: "Administrator".to_owned(),
            description: "Full tenant administration".to_owned(),
            scopes: scope_set(&[
                "user.read",
                "user.write",
                "user.ban",
                "user.delete",
                "license.read",
                "license.create",
                "license.update",
                "license.delete",
                "session.read",
                "session.kill",
                "subscription.read",
                "subscription.write",
                "subscription.delete",
                "log.read",
                "log.delete",
                "global.settings",
            ]),
            is_default: true,
            is_custom: false,
            is_system: false,
        },
        Role {
            id: "developer".to_owned(),
            name: "Developer".to_owned(),
            description: "Build against the API with day-to-day license access".to_owned(),
            scopes: scope_set(&[
                "user.read",
                "license.read",
                "license.create",
                "license.update",
                "session.read",
                "session.kill",
                "subscription.read",
                "log.read",
            ]),
            is_default: false,
            is_custom: false,
            is_system: false,
        },
        Role {
            id: "support".to_owned(),
            name: "Support".to_owned(),
            description: "Help end users without destructive access".to_owned(),
            scopes: scope_set(&[
                "user.read",
                "user.ban",
                "license.read",
                "session.read",
                "session.kill",
                "log.read",
            ]),
            is_default: false,
            is_custom: false,
            is_system: false,
        },
        Role {
            id: "viewer".to_owned(),
            name: "Viewer".to_owned(),
            description: "Read-only access across the tenant".to_owned(),
            scopes: scope_set(&[
                "user.read",
                "license.read",
                "session.read",
                "subscription.read",
                "log.read",
            ]),
            is_default: false,
            is_custom: false,
            is_system: false,
        },
    ]
}
