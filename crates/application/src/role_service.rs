use std::collections::BTreeSet;
use std::sync::Arc;

use keygate_core::{AppError, AppResult, UserIdentity};
use keygate_domain::{
    AuditAction, ImpactLevel, PermissionId, Role, RoleDraft, RolePatch, ScopeCatalog, ScopeId,
    aggregate_impact, derive_role_id, expand_scopes_to_permissions,
};

use crate::access_ports::{AuditEvent, AuditRepository, RoleRepository};

/// Effective permissions and aggregate impact for a scope selection.
///
/// Backs the "N permissions selected" counter and the impact badge in both
/// the role editor and the ad hoc selection editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSummary {
    /// Union of permissions granted by the selection.
    pub permissions: BTreeSet<PermissionId>,
    /// Max-reduced impact of the selection.
    pub impact: ImpactLevel,
}

impl SelectionSummary {
    /// Returns the number of distinct permissions in the selection.
    #[must_use]
    pub fn permission_count(&self) -> usize {
        self.permissions.len()
    }
}

/// Application service for the role registry.
#[derive(Clone)]
pub struct RoleService {
    catalog: Arc<ScopeCatalog>,
    repository: Arc<dyn RoleRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl RoleService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        catalog: Arc<ScopeCatalog>,
        repository: Arc<dyn RoleRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            catalog,
            repository,
            audit_repository,
        }
    }

    /// Returns the scope catalog the registry validates against.
    #[must_use]
    pub fn catalog(&self) -> &ScopeCatalog {
        &self.catalog
    }

    /// Lists tenant roles, optionally filtered by a case-insensitive substring
    /// match over name, description and id. Registry order is preserved.
    pub async fn list_roles(
        &self,
        actor: &UserIdentity,
        filter: Option<&str>,
    ) -> AppResult<Vec<Role>> {
        let roles = self.repository.list_roles(actor.tenant_id()).await?;

        let Some(query) = filter.map(str::trim).filter(|query| !query.is_empty()) else {
            return Ok(roles);
        };
        let query = query.to_lowercase();

        Ok(roles
            .into_iter()
            .filter(|role| {
                role.name.to_lowercase().contains(&query)
                    || role.description.to_lowercase().contains(&query)
                    || role.id.to_lowercase().contains(&query)
            })
            .collect())
    }

    /// Creates a custom role and emits an audit event.
    ///
    /// The id is derived from the name; when the derived id is already taken
    /// the registry falls back to a timestamp-based id instead of failing.
    pub async fn create_role(&self, actor: &UserIdentity, draft: RoleDraft) -> AppResult<Role> {
        draft.validate(&self.catalog)?;

        let derived_id = derive_role_id(&draft.name);
        let id = if self
            .repository
            .find_role(actor.tenant_id(), &derived_id)
            .await?
            .is_some()
        {
            format!("role_{}", chrono::Utc::now().timestamp_millis())
        } else {
            derived_id
        };

        let role = Role {
            id,
            name: draft.name.trim().to_owned(),
            description: draft.description,
            scopes: draft.scopes,
            is_default: false,
            is_custom: true,
            is_system: false,
        };

        let role = self.repository.save_role(actor.tenant_id(), role).await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: Some(actor.tenant_id()),
                subject: actor.subject().to_owned(),
                action: AuditAction::RoleCreated,
                resource_type: "rbac_role".to_owned(),
                resource_id: role.id.clone(),
                detail: Some(format!("created role '{}'", role.name)),
            })
            .await?;

        Ok(role)
    }

    /// Applies a patch to a custom role and emits an audit event.
    ///
    /// System and predefined roles are immutable; the whole patched role is
    /// re-validated and then saved with replace semantics.
    pub async fn update_role(
        &self,
        actor: &UserIdentity,
        role_id: &str,
        patch: RolePatch,
    ) -> AppResult<Role> {
        let role = self.require_role(actor, role_id).await?;
        Self::require_editable(&role)?;

        let updated = Role {
            id: role.id,
            name: patch.name.unwrap_or(role.name),
            description: patch.description.unwrap_or(role.description),
            scopes: patch.scopes.unwrap_or(role.scopes),
            is_default: role.is_default,
            is_custom: role.is_custom,
            is_system: role.is_system,
        };

        let draft = RoleDraft {
            name: updated.name.clone(),
            description: updated.description.clone(),
            scopes: updated.scopes.clone(),
        };
        draft.validate(&self.catalog)?;

        let updated = self.repository.save_role(actor.tenant_id(), updated).await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: Some(actor.tenant_id()),
                subject: actor.subject().to_owned(),
                action: AuditAction::RoleUpdated,
                resource_type: "rbac_role".to_owned(),
                resource_id: updated.id.clone(),
                detail: Some(format!("updated role '{}'", updated.name)),
            })
            .await?;

        Ok(updated)
    }

    /// Deletes a custom role and emits an audit event.
    ///
    /// Cascading unassignment from members that referenced the role is the
    /// backend's responsibility.
    pub async fn delete_role(&self, actor: &UserIdentity, role_id: &str) -> AppResult<()> {
        let role = self.require_role(actor, role_id).await?;
        Self::require_editable(&role)?;

        self.repository
            .delete_role(actor.tenant_id(), role_id)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: Some(actor.tenant_id()),
                subject: actor.subject().to_owned(),
                action: AuditAction::RoleDeleted,
                resource_type: "rbac_role".to_owned(),
                resource_id: role.id.clone(),
                detail: Some(format!("deleted role '{}'", role.name)),
            })
            .await
    }

    /// Summarizes a scope selection for editor badges.
    #[must_use]
    pub fn describe_scopes<'a>(
        &self,
        scope_ids: impl IntoIterator<Item = &'a ScopeId>,
    ) -> SelectionSummary {
        let scope_ids: Vec<&ScopeId> = scope_ids.into_iter().collect();

        SelectionSummary {
            permissions: expand_scopes_to_permissions(&self.catalog, scope_ids.iter().copied()),
            impact: aggregate_impact(&self.catalog, scope_ids),
        }
    }

    async fn require_role(&self, actor: &UserIdentity, role_id: &str) -> AppResult<Role> {
        self.repository
            .find_role(actor.tenant_id(), role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))
    }

    fn require_editable(role: &Role) -> AppResult<()> {
        if role.is_editable() {
            return Ok(());
        }

        Err(AppError::NotEditable(format!(
            "role '{}' is managed by the platform and cannot be modified",
            role.id
        )))
    }
}
