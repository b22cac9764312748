use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keygate_core::{AppResult, TenantId};
use keygate_domain::InviteStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Team invite as persisted.
///
/// The raw invite token never touches storage; only its SHA-256 hash does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteRecord {
    /// Invite identifier.
    pub id: Uuid,
    /// Tenant the recipient is invited into.
    pub tenant_id: TenantId,
    /// Recipient email, canonicalized.
    pub email: String,
    /// Role granted on acceptance.
    pub role_id: String,
    /// Subject of the inviting administrator.
    pub inviter: String,
    /// SHA-256 hash of the invite token.
    pub token_hash: String,
    /// Persisted lifecycle status. Expiry is applied lazily on top of this.
    pub status: InviteStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Deadline after which the invite is no longer actionable.
    pub expires_at: DateTime<Utc>,
}

impl InviteRecord {
    /// Returns the status with lazy expiry applied: a pending invite whose
    /// deadline has passed reports as expired without any stored transition.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> InviteStatus {
        if self.status == InviteStatus::Pending && now > self.expires_at {
            InviteStatus::Expired
        } else {
            self.status
        }
    }
}

/// Repository port for invite persistence.
#[async_trait]
pub trait InviteRepository: Send + Sync {
    /// Persists a new invite.
    async fn create_invite(&self, record: InviteRecord) -> AppResult<()>;

    /// Finds an invite by the hash of its token.
    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<InviteRecord>>;

    /// Finds an invite by id.
    async fn find_by_id(&self, invite_id: Uuid) -> AppResult<Option<InviteRecord>>;

    /// Replaces the stored status of an invite.
    async fn update_status(&self, invite_id: Uuid, status: InviteStatus) -> AppResult<()>;

    /// Removes an invite outright. Used by cancellation, which deletes rather
    /// than transitioning.
    async fn remove(&self, invite_id: Uuid) -> AppResult<bool>;

    /// Lists invites sent within one tenant.
    async fn list_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<InviteRecord>>;

    /// Lists invites addressed to one recipient email.
    async fn list_for_email(&self, email: &str) -> AppResult<Vec<InviteRecord>>;
}
