use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keygate_application::{
    AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditRepository, AuditScope,
};
use keygate_core::AppResult;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

struct StoredEvent {
    event_id: Uuid,
    created_at: DateTime<Utc>,
    event: AuditEvent,
}

/// In-memory append-only audit sink and log reader.
#[derive(Default)]
pub struct InMemoryAuditRepository {
    events: RwLock<Vec<StoredEvent>>,
}

impl InMemoryAuditRepository {
    /// Creates an empty audit store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        debug!(
            action = event.action.as_str(),
            subject = %event.subject,
            resource = %event.resource_id,
            "audit event"
        );

        self.events.write().await.push(StoredEvent {
            event_id: Uuid::new_v4(),
            created_at: Utc::now(),
            event,
        });

        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditRepository {
    async fn list_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let events = self.events.read().await;

        let mut entries: Vec<AuditLogEntry> = events
            .iter()
            .filter(|stored| match query.scope {
                AuditScope::Tenant(tenant_id) => stored.event.tenant_id == Some(tenant_id),
                AuditScope::Global => stored.event.tenant_id.is_none(),
            })
            .filter(|stored| {
                query
                    .action
                    .as_deref()
                    .is_none_or(|action| stored.event.action.as_str() == action)
            })
            .filter(|stored| {
                query
                    .subject
                    .as_deref()
                    .is_none_or(|subject| stored.event.subject == subject)
            })
            .map(|stored| AuditLogEntry {
                event_id: stored.event_id.to_string(),
                tenant_id: stored.event.tenant_id,
                subject: stored.event.subject.clone(),
                action: stored.event.action.as_str().to_owned(),
                resource_type: stored.event.resource_type.clone(),
                resource_id: stored.event.resource_id.clone(),
                detail: stored.event.detail.clone(),
                created_at: stored.created_at.to_rfc3339(),
            })
            .collect();

        entries.reverse();

        Ok(entries
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use keygate_application::{
        AuditEvent, AuditLogQuery, AuditLogRepository, AuditRepository, AuditScope,
    };
    use keygate_core::TenantId;
    use keygate_domain::AuditAction;

    use super::InMemoryAuditRepository;

    fn event(tenant_id: Option<TenantId>, subject: &str, action: AuditAction) -> AuditEvent {
        AuditEvent {
            tenant_id,
            subject: subject.to_owned(),
            action,
            resource_type: "rbac_role".to_owned(),
            resource_id: "key_ops".to_owned(),
            detail: None,
        }
    }

    fn query(scope: AuditScope) -> AuditLogQuery {
        AuditLogQuery {
            scope,
            limit: 20,
            offset: 0,
            action: None,
            subject: None,
        }
    }

    #[tokio::test]
    async fn tenant_scope_excludes_global_entries() {
        let tenant_id = TenantId::new();
        let store = InMemoryAuditRepository::new();

        let appended = store
            .append_event(event(Some(tenant_id), "alice", AuditAction::RoleCreated))
            .await;
        assert!(appended.is_ok());
        let appended = store
            .append_event(event(None, "alice", AuditAction::SystemRoleChanged))
            .await;
        assert!(appended.is_ok());

        let tenant_entries = store
            .list_entries(query(AuditScope::Tenant(tenant_id)))
            .await
            .unwrap_or_default();
        assert_eq!(tenant_entries.len(), 1);
        assert_eq!(tenant_entries[0].action, "security.role.created");

        let global_entries = store
            .list_entries(query(AuditScope::Global))
            .await
            .unwrap_or_default();
        assert_eq!(global_entries.len(), 1);
        assert_eq!(global_entries[0].action, "security.system_role.changed");
    }

    #[tokio::test]
    async fn listing_is_newest_first_with_offset_pagination() {
        let tenant_id = TenantId::new();
        let store = InMemoryAuditRepository::new();

        for action in [
            AuditAction::RoleCreated,
            AuditAction::RoleUpdated,
            AuditAction::RoleDeleted,
        ] {
            let appended = store
                .append_event(event(Some(tenant_id), "alice", action))
                .await;
            assert!(appended.is_ok());
        }

        let mut paged = query(AuditScope::Tenant(tenant_id));
        paged.limit = 1;
        paged.offset = 1;

        let entries = store.list_entries(paged).await.unwrap_or_default();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "security.role.updated");
    }

    #[tokio::test]
    async fn subject_filter_is_exact() {
        let tenant_id = TenantId::new();
        let store = InMemoryAuditRepository::new();

        let appended = store
            .append_event(event(Some(tenant_id), "alice", AuditAction::RoleCreated))
            .await;
        assert!(appended.is_ok());
        let appended = store
            .append_event(event(Some(tenant_id), "bob", AuditAction::RoleCreated))
            .await;
        assert!(appended.is_ok());

        let mut filtered = query(AuditScope::Tenant(tenant_id));
        filtered.subject = Some("bob".to_owned());

        let entries = store.list_entries(filtered).await.unwrap_or_default();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].subject, "bob");
    }
}
