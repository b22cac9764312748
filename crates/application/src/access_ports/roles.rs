use async_trait::async_trait;
use keygate_core::{AppResult, TenantId};
use keygate_domain::Role;

/// Repository port for role persistence.
///
/// `save_role` carries full-object-replace semantics: the whole role is sent
/// back, never a partial patch, so the last write wins. No
/// optimistic-concurrency token exists on this contract.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Lists all tenant roles in registry order.
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>>;

    /// Finds a role by id.
    async fn find_role(&self, tenant_id: TenantId, role_id: &str) -> AppResult<Option<Role>>;

    /// Inserts or fully replaces a role.
    async fn save_role(&self, tenant_id: TenantId, role: Role) -> AppResult<Role>;

    /// Deletes a role by id. Unassignment of existing bindings that referenced
    /// the role is the backend's cascade, not this port's.
    async fn delete_role(&self, tenant_id: TenantId, role_id: &str) -> AppResult<()>;
}
