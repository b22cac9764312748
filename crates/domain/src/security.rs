use serde::{Deserialize, Serialize};

use crate::ScopeId;

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a custom role is created.
    RoleCreated,
    /// Emitted when a custom role is updated.
    RoleUpdated,
    /// Emitted when a custom role is deleted.
    RoleDeleted,
    /// Emitted when a tenant role is assigned to a member.
    RoleAssigned,
    /// Emitted when a tenant role is removed from a member.
    RoleUnassigned,
    /// Emitted when a member's system-wide role changes.
    SystemRoleChanged,
    /// Emitted when an invite is sent.
    InviteSent,
    /// Emitted when an invite is accepted.
    InviteAccepted,
    /// Emitted when an invite is declined.
    InviteDeclined,
    /// Emitted when a pending invite is cancelled by its inviter.
    InviteCancelled,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "security.role.created",
            Self::RoleUpdated => "security.role.updated",
            Self::RoleDeleted => "security.role.deleted",
            Self::RoleAssigned => "security.role.assigned",
            Self::RoleUnassigned => "security.role.unassigned",
            Self::SystemRoleChanged => "security.system_role.changed",
            Self::InviteSent => "team.invite.sent",
            Self::InviteAccepted => "team.invite.accepted",
            Self::InviteDeclined => "team.invite.declined",
            Self::InviteCancelled => "team.invite.cancelled",
        }
    }
}

/// Bulk operation offered on the license table, with its display metadata and
/// the scope it requires.
///
/// A closed variant instead of stringly-typed action ids: each action carries
/// everything the dispatcher needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    /// Extend the subscription window of the selected licenses.
    AddTime,
    /// Generate a batch of fresh licenses.
    CreateLicense,
    /// Delete every selected license.
    DeleteSelected,
    /// Ban every selected license.
    BanSelected,
    /// Export the selected licenses.
    ExportSelected,
}

impl BulkAction {
    /// Returns the action label shown on the bulk toolbar.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::AddTime => "Add time",
            Self::CreateLicense => "Create licenses",
            Self::DeleteSelected => "Delete selected",
            Self::BanSelected => "Ban selected",
            Self::ExportSelected => "Export selected",
        }
    }

    /// Returns the scope required to run the action.
    #[must_use]
    pub fn required_scope(&self) -> ScopeId {
        let id = match self {
            Self::AddTime => "subscription.write",
            Self::CreateLicense => "license.create",
            Self::DeleteSelected => "license.delete",
            Self::BanSelected => "license.update",
            Self::ExportSelected => "license.read",
        };

        ScopeId::from_raw(id)
    }

    /// Returns all bulk actions in toolbar order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[BulkAction] = &[
            BulkAction::AddTime,
            BulkAction::CreateLicense,
            BulkAction::DeleteSelected,
            BulkAction::BanSelected,
            BulkAction::ExportSelected,
        ];

        ALL
    }
}

#[cfg(test)]
mod tests {
    use crate::ScopeCatalog;

    use super::BulkAction;

    #[test]
    fn bulk_actions_require_known_scopes() {
        let catalog = ScopeCatalog::builtin();
        for action in BulkAction::all() {
            assert!(
                catalog.get(action.required_scope().as_str()).is_some(),
                "{}",
                action.label()
            );
        }
    }
}
