use std::sync::Arc;

use keygate_core::{AppError, AppResult, TenantId, UserIdentity};
use keygate_domain::AuditAction;

use crate::access_ports::{
    AssignmentRepository, AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository,
    AuditRepository, MemberRecord, RoleRepository, TenantRoleBinding,
};

/// Application service answering "what can a member do in a tenant" and
/// managing tenant role bindings plus the system-role axis.
///
/// The system role is a separate permission axis: it never merges into or
/// escalates a tenant-scoped check.
#[derive(Clone)]
pub struct MembershipService {
    roles: Arc<dyn RoleRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    audit_log_repository: Arc<dyn AuditLogRepository>,
}

impl MembershipService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        audit_log_repository: Arc<dyn AuditLogRepository>,
    ) -> Self {
        Self {
            roles,
            assignments,
            audit_repository,
            audit_log_repository,
        }
    }

    /// Returns the member's role in exactly this tenant.
    ///
    /// No inheritance: a binding in one tenant never implies access in
    /// another, and the system role is not consulted here.
    pub async fn effective_role(
        &self,
        tenant_id: TenantId,
        subject: &str,
    ) -> AppResult<Option<String>> {
        Ok(self
            .assignments
            .find_binding(tenant_id, subject)
            .await?
            .map(|binding| binding.role_id))
    }

    /// Returns the member's tenant-independent system role, if any.
    pub async fn system_role(&self, subject: &str) -> AppResult<Option<String>> {
        self.assignments.system_role(subject).await
    }

    /// Assigns a role to a member within the actor's tenant.
    ///
    /// Replaces any existing binding for the `(member, tenant)` pair, keeping
    /// the one-binding-per-tenant invariant structural.
    pub async fn assign_role(
        &self,
        actor: &UserIdentity,
        subject: &str,
        role_id: &str,
    ) -> AppResult<TenantRoleBinding> {
        self.require_role_exists(actor.tenant_id(), role_id).await?;

        let binding = self
            .assignments
            .upsert_binding(actor.tenant_id(), subject, role_id)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: Some(actor.tenant_id()),
                subject: actor.subject().to_owned(),
                action: AuditAction::RoleAssigned,
                resource_type: "rbac_subject_role".to_owned(),
                resource_id: format!("{subject}:{role_id}"),
                detail: Some(format!("assigned role '{role_id}' to '{subject}'")),
            })
            .await?;

        Ok(binding)
    }

    /// Removes a member's role binding in the actor's tenant.
    pub async fn unassign_role(&self, actor: &UserIdentity, subject: &str) -> AppResult<()> {
        let removed = self
            .assignments
            .remove_binding(actor.tenant_id(), subject)
            .await?;

        if !removed {
            return Err(AppError::NotFound(format!(
                "no role binding for '{subject}' in tenant '{}'",
                actor.tenant_id()
            )));
        }

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: Some(actor.tenant_id()),
                subject: actor.subject().to_owned(),
                action: AuditAction::RoleUnassigned,
                resource_type: "rbac_subject_role".to_owned(),
                resource_id: subject.to_owned(),
                detail: Some(format!("removed role binding from '{subject}'")),
            })
            .await
    }

    /// Sets or clears a member's system role. Emits a global audit event:
    /// system roles are tenant-independent.
    pub async fn set_system_role(
        &self,
        actor: &UserIdentity,
        subject: &str,
        role_id: Option<&str>,
    ) -> AppResult<()> {
        if let Some(role_id) = role_id {
            self.require_role_exists(actor.tenant_id(), role_id).await?;
        }

        self.assignments.set_system_role(subject, role_id).await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: None,
                subject: actor.subject().to_owned(),
                action: AuditAction::SystemRoleChanged,
                resource_type: "rbac_system_role".to_owned(),
                resource_id: subject.to_owned(),
                detail: Some(match role_id {
                    Some(role_id) => format!("granted system role '{role_id}' to '{subject}'"),
                    None => format!("cleared system role of '{subject}'"),
                }),
            })
            .await
    }

    /// Lists members of the actor's tenant, optionally only those holding one
    /// role. A predicate scan over the per-tenant member index.
    pub async fn list_members(
        &self,
        actor: &UserIdentity,
        role_filter: Option<&str>,
    ) -> AppResult<Vec<MemberRecord>> {
        let members = self.assignments.list_members(actor.tenant_id()).await?;

        let Some(role_id) = role_filter else {
            return Ok(members);
        };

        Ok(members
            .into_iter()
            .filter(|member| member.role_id == role_id)
            .collect())
    }

    /// Returns recent audit entries for one tenant or the global scope.
    pub async fn list_audit_log(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        self.audit_log_repository.list_entries(query).await
    }

    async fn require_role_exists(&self, tenant_id: TenantId, role_id: &str) -> AppResult<()> {
        if self.roles.find_role(tenant_id, role_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' does not exist"
            )));
        }

        Ok(())
    }
}
