use async_trait::async_trait;
use keygate_application::{InviteRecord, InviteRepository};
use keygate_core::{AppResult, TenantId};
use keygate_domain::InviteStatus;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory invite store.
#[derive(Debug, Default)]
pub struct InMemoryInviteRepository {
    invites: RwLock<Vec<InviteRecord>>,
}

impl InMemoryInviteRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InviteRepository for InMemoryInviteRepository {
    async fn create_invite(&self, record: InviteRecord) -> AppResult<()> {
        self.invites.write().await.push(record);
        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<InviteRecord>> {
        Ok(self
            .invites
            .read()
            .await
            .iter()
            .find(|invite| invite.token_hash == token_hash)
            .cloned())
    }

    async fn find_by_id(&self, invite_id: Uuid) -> AppResult<Option<InviteRecord>> {
        Ok(self
            .invites
            .read()
            .await
            .iter()
            .find(|invite| invite.id == invite_id)
            .cloned())
    }

    async fn update_status(&self, invite_id: Uuid, status: InviteStatus) -> AppResult<()> {
        let mut invites = self.invites.write().await;
        if let Some(invite) = invites.iter_mut().find(|invite| invite.id == invite_id) {
            invite.status = status;
        }
        Ok(())
    }

    async fn remove(&self, invite_id: Uuid) -> AppResult<bool> {
        let mut invites = self.invites.write().await;
        let before = invites.len();
        invites.retain(|invite| invite.id != invite_id);
        Ok(invites.len() < before)
    }

    async fn list_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<InviteRecord>> {
        Ok(self
            .invites
            .read()
            .await
            .iter()
            .filter(|invite| invite.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn list_for_email(&self, email: &str) -> AppResult<Vec<InviteRecord>> {
        Ok(self
            .invites
            .read()
            .await
            .iter()
            .filter(|invite| invite.email == email)
            .cloned()
            .collect())
    }
}
