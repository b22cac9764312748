use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keygate_core::{AppResult, TenantId};
use serde::{Deserialize, Serialize};

/// One tenant-scoped role binding for a member.
///
/// A member holds at most one binding per tenant; access in one tenant never
/// implies access in another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRoleBinding {
    /// Tenant the binding applies to.
    pub tenant_id: TenantId,
    /// Role granted within that tenant.
    pub role_id: String,
    /// When the binding was created or last replaced.
    pub assigned_at: DateTime<Utc>,
}

/// Membership projection for team views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Member subject identifier.
    pub subject: String,
    /// Role granted within the queried tenant.
    pub role_id: String,
    /// When the binding was created or last replaced.
    pub assigned_at: DateTime<Utc>,
}

/// Repository port for tenant role bindings and the system-wide role axis.
///
/// The upsert shape enforces the at-most-one-binding-per-`(member, tenant)`
/// invariant structurally.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Finds the binding for a member in one tenant.
    async fn find_binding(
        &self,
        tenant_id: TenantId,
        subject: &str,
    ) -> AppResult<Option<TenantRoleBinding>>;

    /// Creates or replaces the member's binding for one tenant.
    async fn upsert_binding(
        &self,
        tenant_id: TenantId,
        subject: &str,
        role_id: &str,
    ) -> AppResult<TenantRoleBinding>;

    /// Removes the member's binding for one tenant.
    async fn remove_binding(&self, tenant_id: TenantId, subject: &str) -> AppResult<bool>;

    /// Returns the member's tenant-independent system role, if any.
    async fn system_role(&self, subject: &str) -> AppResult<Option<String>>;

    /// Sets or clears the member's system role.
    async fn set_system_role(&self, subject: &str, role_id: Option<&str>) -> AppResult<()>;

    /// Lists members of one tenant.
    async fn list_members(&self, tenant_id: TenantId) -> AppResult<Vec<MemberRecord>>;
}
