use std::collections::HashMap;

use async_trait::async_trait;
use keygate_application::RoleRepository;
use keygate_core::{AppResult, TenantId};
use keygate_domain::{Role, predefined_roles};
use tokio::sync::RwLock;

/// In-memory role repository.
///
/// Registry order is insertion order, with the predefined roles seeded ahead
/// of any custom role, matching what the console lists.
#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    roles: RwLock<HashMap<TenantId, Vec<Role>>>,
}

impl InMemoryRoleRepository {
    /// Creates an empty repository. Tenants are seeded with the predefined
    /// roles on first access.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roles: RwLock::new(HashMap::new()),
        }
    }

    fn seed() -> Vec<Role> {
        predefined_roles()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        let mut roles = self.roles.write().await;
        Ok(roles.entry(tenant_id).or_insert_with(Self::seed).clone())
    }

    async fn find_role(&self, tenant_id: TenantId, role_id: &str) -> AppResult<Option<Role>> {
        let mut roles = self.roles.write().await;
        Ok(roles
            .entry(tenant_id)
            .or_insert_with(Self::seed)
            .iter()
            .find(|role| role.id == role_id)
            .cloned())
    }

    async fn save_role(&self, tenant_id: TenantId, role: Role) -> AppResult<Role> {
        let mut roles = self.roles.write().await;
        let tenant_roles = roles.entry(tenant_id).or_insert_with(Self::seed);

        if let Some(stored) = tenant_roles.iter_mut().find(|stored| stored.id == role.id) {
            *stored = role.clone();
        } else {
            tenant_roles.push(role.clone());
        }

        Ok(role)
    }

    async fn delete_role(&self, tenant_id: TenantId, role_id: &str) -> AppResult<()> {
        let mut roles = self.roles.write().await;
        roles
            .entry(tenant_id)
            .or_insert_with(Self::seed)
            .retain(|role| role.id != role_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use keygate_application::RoleRepository;
    use keygate_core::TenantId;
    use keygate_domain::{Role, ScopeId};

    use super::InMemoryRoleRepository;

    fn custom_role(id: &str) -> Role {
        Role {
            id: id.to_owned(),
            name: id.to_owned(),
            description: String::new(),
            scopes: [ScopeId::from_raw("license.read")]
                .into_iter()
                .collect::<BTreeSet<_>>(),
            is_default: false,
            is_custom: true,
            is_system: false,
        }
    }

    #[tokio::test]
    async fn tenants_start_with_the_predefined_roles() {
        let repository = InMemoryRoleRepository::new();
        let roles = repository.list_roles(TenantId::new()).await;

        let ids: Vec<String> = roles
            .unwrap_or_default()
            .into_iter()
            .map(|role| role.id)
            .collect();
        assert!(ids.contains(&"admin".to_owned()));
        assert!(ids.contains(&"viewer".to_owned()));
    }

    #[tokio::test]
    async fn custom_roles_append_after_the_seed() {
        let tenant_id = TenantId::new();
        let repository = InMemoryRoleRepository::new();

        assert!(
            repository
                .save_role(tenant_id, custom_role("key_ops"))
                .await
                .is_ok()
        );

        let roles = repository.list_roles(tenant_id).await.unwrap_or_default();
        assert_eq!(roles.last().map(|role| role.id.as_str()), Some("key_ops"));
    }

    #[tokio::test]
    async fn tenants_are_isolated() {
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let repository = InMemoryRoleRepository::new();

        assert!(
            repository
                .save_role(tenant_a, custom_role("key_ops"))
                .await
                .is_ok()
        );

        let in_b = repository.find_role(tenant_b, "key_ops").await;
        assert_eq!(in_b.ok().flatten(), None);
    }

    #[tokio::test]
    async fn delete_removes_only_the_target() {
        let tenant_id = TenantId::new();
        let repository = InMemoryRoleRepository::new();

        assert!(
            repository
                .save_role(tenant_id, custom_role("key_ops"))
                .await
                .is_ok()
        );
        assert!(repository.delete_role(tenant_id, "key_ops").await.is_ok());

        let remaining = repository.list_roles(tenant_id).await.unwrap_or_default();
        assert!(remaining.iter().all(|role| role.id != "key_ops"));
        assert!(remaining.iter().any(|role| role.id == "admin"));
    }
}
