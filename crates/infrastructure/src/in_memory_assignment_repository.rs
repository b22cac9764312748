use std::collections::HashMap;

use async_trait::async_trait;
use keygate_application::{AssignmentRepository, MemberRecord, TenantRoleBinding};
use keygate_core::{AppResult, TenantId};
use tokio::sync::RwLock;

/// In-memory assignment store.
///
/// Bindings are indexed per tenant, which both answers member listings
/// without a full scan and makes the one-binding-per-`(member, tenant)`
/// invariant structural.
#[derive(Debug, Default)]
pub struct InMemoryAssignmentRepository {
    bindings: RwLock<HashMap<TenantId, HashMap<String, TenantRoleBinding>>>,
    system_roles: RwLock<HashMap<String, String>>,
}

impl InMemoryAssignmentRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn find_binding(
        &self,
        tenant_id: TenantId,
        subject: &str,
    ) -> AppResult<Option<TenantRoleBinding>> {
        Ok(self
            .bindings
            .read()
            .await
            .get(&tenant_id)
            .and_then(|members| members.get(subject))
            .cloned())
    }

    async fn upsert_binding(
        &self,
        tenant_id: TenantId,
        subject: &str,
        role_id: &str,
    ) -> AppResult<TenantRoleBinding> {
        let binding = TenantRoleBinding {
            tenant_id,
            role_id: role_id.to_owned(),
            assigned_at: chrono::Utc::now(),
        };

        self.bindings
            .write()
            .await
            .entry(tenant_id)
            .or_default()
            .insert(subject.to_owned(), binding.clone());

        Ok(binding)
    }

    async fn remove_binding(&self, tenant_id: TenantId, subject: &str) -> AppResult<bool> {
        Ok(self
            .bindings
            .write()
            .await
            .get_mut(&tenant_id)
            .is_some_and(|members| members.remove(subject).is_some()))
    }

    async fn system_role(&self, subject: &str) -> AppResult<Option<String>> {
        Ok(self.system_roles.read().await.get(subject).cloned())
    }

    async fn set_system_role(&self, subject: &str, role_id: Option<&str>) -> AppResult<()> {
        let mut system_roles = self.system_roles.write().await;
        match role_id {
            Some(role_id) => {
                system_roles.insert(subject.to_owned(), role_id.to_owned());
            }
            None => {
                system_roles.remove(subject);
            }
        }

        Ok(())
    }

    async fn list_members(&self, tenant_id: TenantId) -> AppResult<Vec<MemberRecord>> {
        let bindings = self.bindings.read().await;

        let mut members: Vec<MemberRecord> = bindings
            .get(&tenant_id)
            .map(|members| {
                members
                    .iter()
                    .map(|(subject, binding)| MemberRecord {
                        subject: subject.clone(),
                        role_id: binding.role_id.clone(),
                        assigned_at: binding.assigned_at,
                    })
                    .collect()
            })
            .unwrap_or_default();
        members.sort_by(|left, right| left.subject.cmp(&right.subject));

        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use keygate_application::AssignmentRepository;
    use keygate_core::TenantId;

    use super::InMemoryAssignmentRepository;

    #[tokio::test]
    async fn upsert_replaces_the_previous_binding() {
        let tenant_id = TenantId::new();
        let store = InMemoryAssignmentRepository::new();

        assert!(store.upsert_binding(tenant_id, "bob", "viewer").await.is_ok());
        assert!(store.upsert_binding(tenant_id, "bob", "support").await.is_ok());

        let members = store.list_members(tenant_id).await.unwrap_or_default();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].role_id, "support");
    }

    #[tokio::test]
    async fn bindings_do_not_leak_across_tenants() {
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let store = InMemoryAssignmentRepository::new();

        assert!(store.upsert_binding(tenant_a, "bob", "viewer").await.is_ok());

        let binding = store.find_binding(tenant_b, "bob").await;
        assert_eq!(binding.ok().flatten(), None);
        assert!(store.list_members(tenant_b).await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn system_role_round_trips_and_clears() {
        let store = InMemoryAssignmentRepository::new();

        assert!(store.set_system_role("bob", Some("owner")).await.is_ok());
        assert_eq!(
            store.system_role("bob").await.ok().flatten().as_deref(),
            Some("owner")
        );

        assert!(store.set_system_role("bob", None).await.is_ok());
        assert_eq!(store.system_role("bob").await.ok().flatten(), None);
    }

    #[tokio::test]
    async fn removing_an_absent_binding_reports_false() {
        let store = InMemoryAssignmentRepository::new();
        let removed = store.remove_binding(TenantId::new(), "ghost").await;
        assert_eq!(removed.ok(), Some(false));
    }
}
