//! Ports consumed by the access-control services.
//!
//! Every port is an async trait implemented by infrastructure adapters: the
//! in-memory stores used in tests and development, and the HTTP client that
//! talks to the management backend.

mod assignments;
mod audit;
mod invites;
mod permissions;
mod roles;

pub use assignments::{AssignmentRepository, MemberRecord, TenantRoleBinding};
pub use audit::{
    AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditRepository, AuditScope,
};
pub use invites::{InviteRecord, InviteRepository};
pub use permissions::{PermissionBackend, PermissionRecord};
pub use roles::RoleRepository;
