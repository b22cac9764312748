//! Domain entities and invariants for the Keygate access-control core.

#![forbid(unsafe_code)]

mod builder;
mod impact;
mod invite;
mod resolver;
mod role;
mod scope;
mod security;
mod user;

pub use builder::{
    BuilderResource, ConflictMessage, PermissionLevel, PermissionSelection, ResourceKind,
    SelectionTemplate, TemplateMatch, apply_template, detect_active_template, detect_conflicts,
    level_scopes, selection_to_scopes,
};
pub use impact::ImpactLevel;
pub use invite::InviteStatus;
pub use resolver::{aggregate_impact, expand_scopes_to_permissions};
pub use role::{Role, RoleDraft, RolePatch, derive_role_id, predefined_roles};
pub use scope::{PermissionId, ResourceCategory, Scope, ScopeCatalog, ScopeId};
pub use security::{AuditAction, BulkAction};
pub use user::{EmailAddress, UserId};
