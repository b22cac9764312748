//! Team invite management.
//!
//! Invite tokens are cryptographically random, stored as SHA-256 hashes,
//! single-use, and time-limited. Expiry is evaluated lazily whenever an
//! invite is read or acted on; nothing transitions invites in the background.

use std::sync::Arc;

use chrono::Utc;
use keygate_core::{AppError, AppResult, UserIdentity};
use keygate_domain::{AuditAction, EmailAddress, InviteStatus};
use uuid::Uuid;

use crate::access_ports::{
    AssignmentRepository, AuditEvent, AuditRepository, InviteRecord, InviteRepository,
    RoleRepository,
};

/// Days an invite stays actionable after it is sent.
const INVITE_TTL_DAYS: i64 = 7;

/// A freshly issued invite together with its raw token.
///
/// The raw token exists only in this value; storage keeps the hash. Delivery
/// of the token to the recipient is the backend's concern.
#[derive(Debug, Clone)]
pub struct IssuedInvite {
    /// The persisted invite record.
    pub invite: InviteRecord,
    /// Raw token to embed in the invite link.
    pub token: String,
}

/// Application service for the invite lifecycle.
#[derive(Clone)]
pub struct InviteService {
    invites: Arc<dyn InviteRepository>,
    roles: Arc<dyn RoleRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl InviteService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        invites: Arc<dyn InviteRepository>,
        roles: Arc<dyn RoleRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            invites,
            roles,
            assignments,
            audit_repository,
        }
    }

    /// Issues an invite into the actor's tenant and emits an audit event.
    pub async fn send_invite(
        &self,
        actor: &UserIdentity,
        email: &str,
        role_id: &str,
    ) -> AppResult<IssuedInvite> {
        let canonical_email = EmailAddress::new(email)?;

        if self
            .roles
            .find_role(actor.tenant_id(), role_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' does not exist"
            )));
        }

        let (raw_token, token_hash) = generate_token();
        let now = Utc::now();

        let invite = InviteRecord {
            id: Uuid::new_v4(),
            tenant_id: actor.tenant_id(),
            email: canonical_email.as_str().to_owned(),
            role_id: role_id.to_owned(),
            inviter: actor.subject().to_owned(),
            token_hash,
            status: InviteStatus::Pending,
            created_at: now,
            expires_at: now + chrono::Duration::days(INVITE_TTL_DAYS),
        };

        self.invites.create_invite(invite.clone()).await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: Some(actor.tenant_id()),
                subject: actor.subject().to_owned(),
                action: AuditAction::InviteSent,
                resource_type: "team_invite".to_owned(),
                resource_id: invite.id.to_string(),
                detail: Some(format!(
                    "invited '{}' with role '{role_id}'",
                    invite.email
                )),
            })
            .await?;

        Ok(IssuedInvite {
            invite,
            token: raw_token,
        })
    }

    /// Accepts a pending invite and binds the accepting subject to the
    /// invite's tenant role.
    pub async fn accept_invite(&self, raw_token: &str, subject: &str) -> AppResult<InviteRecord> {
        let invite = self.require_actionable(raw_token).await?;

        self.invites
            .update_status(invite.id, InviteStatus::Accepted)
            .await?;
        self.assignments
            .upsert_binding(invite.tenant_id, subject, &invite.role_id)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: Some(invite.tenant_id),
                subject: subject.to_owned(),
                action: AuditAction::InviteAccepted,
                resource_type: "team_invite".to_owned(),
                resource_id: invite.id.to_string(),
                detail: Some(format!(
                    "accepted invite for role '{}'",
                    invite.role_id
                )),
            })
            .await?;

        Ok(InviteRecord {
            status: InviteStatus::Accepted,
            ..invite
        })
    }

    /// Declines a pending invite.
    pub async fn decline_invite(&self, raw_token: &str, subject: &str) -> AppResult<InviteRecord> {
        let invite = self.require_actionable(raw_token).await?;

        self.invites
            .update_status(invite.id, InviteStatus::Declined)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: Some(invite.tenant_id),
                subject: subject.to_owned(),
                action: AuditAction::InviteDeclined,
                resource_type: "team_invite".to_owned(),
                resource_id: invite.id.to_string(),
                detail: None,
            })
            .await?;

        Ok(InviteRecord {
            status: InviteStatus::Declined,
            ..invite
        })
    }

    /// Cancels a pending invite. Only the inviter may cancel, and cancellation
    /// removes the invite instead of transitioning it to a terminal status.
    pub async fn cancel_invite(&self, actor: &UserIdentity, invite_id: Uuid) -> AppResult<()> {
        let invite = self
            .invites
            .find_by_id(invite_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("invite '{invite_id}' does not exist")))?;

        if invite.effective_status(Utc::now()) != InviteStatus::Pending {
            return Err(AppError::Conflict(
                "only pending invites can be cancelled".to_owned(),
            ));
        }

        if invite.inviter != actor.subject() {
            return Err(AppError::Forbidden(
                "only the inviter can cancel an invite".to_owned(),
            ));
        }

        self.invites.remove(invite_id).await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: Some(invite.tenant_id),
                subject: actor.subject().to_owned(),
                action: AuditAction::InviteCancelled,
                resource_type: "team_invite".to_owned(),
                resource_id: invite.id.to_string(),
                detail: Some(format!("cancelled invite for '{}'", invite.email)),
            })
            .await
    }

    /// Lists invites sent within the actor's tenant, lazy expiry applied.
    pub async fn list_tenant_invites(&self, actor: &UserIdentity) -> AppResult<Vec<InviteRecord>> {
        let invites = self.invites.list_for_tenant(actor.tenant_id()).await?;
        Ok(Self::with_effective_status(invites))
    }

    /// Lists invites the actor sent, lazy expiry applied.
    pub async fn list_sent_invites(&self, actor: &UserIdentity) -> AppResult<Vec<InviteRecord>> {
        let invites = self.invites.list_for_tenant(actor.tenant_id()).await?;
        Ok(Self::with_effective_status(
            invites
                .into_iter()
                .filter(|invite| invite.inviter == actor.subject())
                .collect(),
        ))
    }

    /// Lists invites addressed to one email, lazy expiry applied.
    pub async fn list_received_invites(&self, email: &str) -> AppResult<Vec<InviteRecord>> {
        let canonical_email = EmailAddress::new(email)?;
        let invites = self.invites.list_for_email(canonical_email.as_str()).await?;
        Ok(Self::with_effective_status(invites))
    }

    fn with_effective_status(invites: Vec<InviteRecord>) -> Vec<InviteRecord> {
        let now = Utc::now();
        invites
            .into_iter()
            .map(|invite| {
                let status = invite.effective_status(now);
                InviteRecord { status, ..invite }
            })
            .collect()
    }

    /// Resolves a raw token to a still-actionable pending invite.
    ///
    /// A pending invite past its deadline is persisted as expired on first
    /// touch and rejected exactly like an unknown token.
    async fn require_actionable(&self, raw_token: &str) -> AppResult<InviteRecord> {
        let token_hash = hash_token(raw_token);

        let invite = self
            .invites
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid or expired invite token".to_owned()))?;

        match invite.effective_status(Utc::now()) {
            InviteStatus::Pending => Ok(invite),
            InviteStatus::Expired => {
                if invite.status == InviteStatus::Pending {
                    self.invites
                        .update_status(invite.id, InviteStatus::Expired)
                        .await?;
                }
                Err(AppError::Unauthorized(
                    "invalid or expired invite token".to_owned(),
                ))
            }
            InviteStatus::Accepted | InviteStatus::Declined => Err(AppError::Conflict(format!(
                "invite was already {}",
                invite.status.as_str()
            ))),
        }
    }
}

/// Generates a cryptographically random token and its SHA-256 hash.
///
/// Returns `(raw_token_hex, sha256_hash_hex)`.
fn generate_token() -> (String, String) {
    use std::fmt::Write;

    let mut bytes = [0u8; 32];
    // getrandom should not fail on supported platforms.
    // Fallback: this will produce a zero-filled token which will be
    // rejected on validation.
    getrandom::fill(&mut bytes).unwrap_or(());

    let raw_token = bytes
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        });

    let hash = hash_token(&raw_token);
    (raw_token, hash)
}

/// Computes the SHA-256 hash of a token string for storage.
fn hash_token(raw_token: &str) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write;

    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    let result = hasher.finalize();

    result
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use keygate_core::{AppError, AppResult, TenantId, UserIdentity};
    use keygate_domain::{InviteStatus, Role, predefined_roles};

    use crate::access_ports::{
        AssignmentRepository, AuditEvent, AuditRepository, InviteRecord, InviteRepository,
        MemberRecord, RoleRepository, TenantRoleBinding,
    };

    use super::InviteService;

    #[derive(Default)]
    struct FakeInviteRepository {
        invites: Mutex<Vec<InviteRecord>>,
    }

    #[async_trait]
    impl InviteRepository for FakeInviteRepository {
        async fn create_invite(&self, record: InviteRecord) -> AppResult<()> {
            self.invites.lock().await.push(record);
            Ok(())
        }

        async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<InviteRecord>> {
            Ok(self
                .invites
                .lock()
                .await
                .iter()
                .find(|invite| invite.token_hash == token_hash)
                .cloned())
        }

        async fn find_by_id(&self, invite_id: Uuid) -> AppResult<Option<InviteRecord>> {
            Ok(self
                .invites
                .lock()
                .await
                .iter()
                .find(|invite| invite.id == invite_id)
                .cloned())
        }

        async fn update_status(&self, invite_id: Uuid, status: InviteStatus) -> AppResult<()> {
            let mut invites = self.invites.lock().await;
            if let Some(invite) = invites.iter_mut().find(|invite| invite.id == invite_id) {
                invite.status = status;
            }
            Ok(())
        }

        async fn remove(&self, invite_id: Uuid) -> AppResult<bool> {
            let mut invites = self.invites.lock().await;
            let before = invites.len();
            invites.retain(|invite| invite.id != invite_id);
            Ok(invites.len() < before)
        }

        async fn list_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<InviteRecord>> {
            Ok(self
                .invites
                .lock()
                .await
                .iter()
                .filter(|invite| invite.tenant_id == tenant_id)
                .cloned()
                .collect())
        }

        async fn list_for_email(&self, email: &str) -> AppResult<Vec<InviteRecord>> {
            Ok(self
                .invites
                .lock()
                .await
                .iter()
                .filter(|invite| invite.email == email)
                .cloned()
                .collect())
        }
    }

    struct FakeRoleRepository;

    #[async_trait]
    impl RoleRepository for FakeRoleRepository {
        async fn list_roles(&self, _tenant_id: TenantId) -> AppResult<Vec<Role>> {
            Ok(predefined_roles())
        }

        async fn find_role(&self, _tenant_id: TenantId, role_id: &str) -> AppResult<Option<Role>> {
            Ok(predefined_roles()
                .into_iter()
                .find(|role| role.id == role_id))
        }

        async fn save_role(&self, _tenant_id: TenantId, role: Role) -> AppResult<Role> {
            Ok(role)
        }

        async fn delete_role(&self, _tenant_id: TenantId, _role_id: &str) -> AppResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeAssignmentRepository {
        bindings: Mutex<HashMap<(TenantId, String), TenantRoleBinding>>,
    }

    #[async_trait]
    impl AssignmentRepository for FakeAssignmentRepository {
        async fn find_binding(
            &self,
            tenant_id: TenantId,
            subject: &str,
        ) -> AppResult<Option<TenantRoleBinding>> {
            Ok(self
                .bindings
                .lock()
                .await
                .get(&(tenant_id, subject.to_owned()))
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
                assigned_at: Utc::now(),
            };
            self.bindings
                .lock()
                .await
                .insert((tenant_id, subject.to_owned()), binding.clone());
            Ok(binding)
        }

        async fn remove_binding(&self, tenant_id: TenantId, subject: &str) -> AppResult<bool> {
            Ok(self
                .bindings
                .lock()
                .await
                .remove(&(tenant_id, subject.to_owned()))
                .is_some())
        }

        async fn system_role(&self, _subject: &str) -> AppResult<Option<String>> {
            Ok(None)
        }

        async fn set_system_role(&self, _subject: &str, _role_id: Option<&str>) -> AppResult<()> {
            Ok(())
        }

        async fn list_members(&self, _tenant_id: TenantId) -> AppResult<Vec<MemberRecord>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct FakeAuditRepository {
        events: Mutex<Vec<AuditEvent>>,
    }

    #[async_trait]
    impl AuditRepository for FakeAuditRepository {
        async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
            self.events.lock().await.push(event);
            Ok(())
        }
    }

    fn actor(tenant_id: TenantId) -> UserIdentity {
        UserIdentity::new("alice", "Alice", None, tenant_id)
    }

    struct Harness {
        service: InviteService,
        invites: Arc<FakeInviteRepository>,
        assignments: Arc<FakeAssignmentRepository>,
        audit: Arc<FakeAuditRepository>,
    }

    fn harness() -> Harness {
        let invites = Arc::new(FakeInviteRepository::default());
        let assignments = Arc::new(FakeAssignmentRepository::default());
        let audit = Arc::new(FakeAuditRepository::default());
        let service = InviteService::new(
            invites.clone(),
            Arc::new(FakeRoleRepository),
            assignments.clone(),
            audit.clone(),
        );
        Harness {
            service,
            invites,
            assignments,
            audit,
        }
    }

    #[tokio::test]
    async fn accepting_an_invite_binds_the_tenant_role() {
        let tenant_id = TenantId::new();
        let harness = harness();

        let issued = harness
            .service
            .send_invite(&actor(tenant_id), "bob@example.com", "support")
            .await;
        assert!(issued.is_ok());
        let token = issued.map(|issued| issued.token).unwrap_or_default();

        let accepted = harness.service.accept_invite(&token, "bob").await;
        assert_eq!(
            accepted.map(|invite| invite.status).ok(),
            Some(InviteStatus::Accepted)
        );

        let binding = harness
            .assignments
            .find_binding(tenant_id, "bob")
            .await
            .ok()
            .flatten();
        assert_eq!(binding.map(|binding| binding.role_id).as_deref(), Some("support"));

        // send + accept
        assert_eq!(harness.audit.events.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn invites_are_single_use() {
        let tenant_id = TenantId::new();
        let harness = harness();

        let issued = harness
            .service
            .send_invite(&actor(tenant_id), "bob@example.com", "support")
            .await;
        let token = issued.map(|issued| issued.token).unwrap_or_default();

        assert!(harness.service.accept_invite(&token, "bob").await.is_ok());

        let again = harness.service.accept_invite(&token, "bob").await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn expired_pending_invite_is_not_actionable() {
        let tenant_id = TenantId::new();
        let harness = harness();

        let issued = harness
            .service
            .send_invite(&actor(tenant_id), "bob@example.com", "support")
            .await;
        let token = issued.map(|issued| issued.token).unwrap_or_default();

        {
            let mut invites = harness.invites.invites.lock().await;
            invites[0].expires_at = Utc::now() - chrono::Duration::hours(1);
        }

        let accepted = harness.service.accept_invite(&token, "bob").await;
        assert!(matches!(accepted, Err(AppError::Unauthorized(_))));

        let declined = harness.service.decline_invite(&token, "bob").await;
        assert!(matches!(declined, Err(AppError::Unauthorized(_))));

        // Lazy expiry surfaces in listings as well.
        let listed = harness
            .service
            .list_tenant_invites(&actor(tenant_id))
            .await
            .unwrap_or_default();
        assert_eq!(listed.first().map(|invite| invite.status), Some(InviteStatus::Expired));
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let harness = harness();
        let result = harness.service.accept_invite("bogus", "bob").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn only_the_inviter_can_cancel_and_cancel_removes() {
        let tenant_id = TenantId::new();
        let harness = harness();

        let issued = harness
            .service
            .send_invite(&actor(tenant_id), "bob@example.com", "support")
            .await;
        let invite_id = issued.map(|issued| issued.invite.id).unwrap_or_default();

        let mallory = UserIdentity::new("mallory", "Mallory", None, tenant_id);
        let denied = harness.service.cancel_invite(&mallory, invite_id).await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        let cancelled = harness
            .service
            .cancel_invite(&actor(tenant_id), invite_id)
            .await;
        assert!(cancelled.is_ok());

        // Removed, not transitioned.
        let remaining = harness
            .service
            .list_tenant_invites(&actor(tenant_id))
            .await
            .unwrap_or_default();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn accepted_invite_cannot_be_cancelled() {
        let tenant_id = TenantId::new();
        let harness = harness();

        let issued = harness
            .service
            .send_invite(&actor(tenant_id), "bob@example.com", "support")
            .await;
        let (invite_id, token) = issued
            .map(|issued| (issued.invite.id, issued.token))
            .unwrap_or_default();

        assert!(harness.service.accept_invite(&token, "bob").await.is_ok());

        let result = harness
            .service
            .cancel_invite(&actor(tenant_id), invite_id)
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn received_listing_canonicalizes_the_email() {
        let tenant_id = TenantId::new();
        let harness = harness();

        assert!(
            harness
                .service
                .send_invite(&actor(tenant_id), "Bob@Example.com", "viewer")
                .await
                .is_ok()
        );

        let received = harness
            .service
            .list_received_invites("BOB@example.COM")
            .await
            .unwrap_or_default();
        assert_eq!(received.len(), 1);
    }
}
