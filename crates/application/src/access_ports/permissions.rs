use async_trait::async_trait;
use keygate_core::{AppError, AppResult, TenantId};
use keygate_domain::ImpactLevel;
use serde::{Deserialize, Serialize};

/// Atomic permission as owned by the management backend.
///
/// A validated record type: malformed backend payloads are rejected at
/// construction instead of being defended against at every render site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    /// Stable permission identifier, dotted `<resource>.<action>`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Resource the permission acts on.
    pub resource: String,
    /// Action the permission allows.
    pub action: String,
    /// Severity of granting the permission.
    pub impact: ImpactLevel,
    /// Creating administrator; `None` marks a system permission that cannot
    /// be edited.
    pub created_by: Option<String>,
}

impl PermissionRecord {
    /// Creates a validated permission record.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
        impact: ImpactLevel,
        created_by: Option<String>,
    ) -> AppResult<Self> {
        let id = id.into();
        let resource = resource.into();
        let action = action.into();

        if id.trim().is_empty() || resource.trim().is_empty() || action.trim().is_empty() {
            return Err(AppError::Validation(
                "permission id, resource and action must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            id,
            name: name.into(),
            description: description.into(),
            resource,
            action,
            impact,
            created_by,
        })
    }

    /// Returns whether this is a platform-seeded, non-editable permission.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.created_by.is_none()
    }
}

/// Port for hydrating permissions from the management backend.
#[async_trait]
pub trait PermissionBackend: Send + Sync {
    /// Lists all permissions visible in one tenant.
    async fn list_permissions(&self, tenant_id: TenantId) -> AppResult<Vec<PermissionRecord>>;

    /// Fetches one permission, used to lazily hydrate ids referenced by a
    /// role's scope list but not yet loaded.
    async fn get_permission(
        &self,
        tenant_id: TenantId,
        permission_id: &str,
    ) -> AppResult<PermissionRecord>;
}
