//! Application services and ports for the Keygate access-control core.

#![forbid(unsafe_code)]

mod access_ports;
mod invite_service;
mod membership_service;
mod permission_directory;
mod role_service;

pub use access_ports::{
    AssignmentRepository, AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository,
    AuditRepository, AuditScope, InviteRecord, InviteRepository, MemberRecord, PermissionBackend,
    PermissionRecord, RoleRepository, TenantRoleBinding,
};
pub use invite_service::{InviteService, IssuedInvite};
pub use membership_service::MembershipService;
pub use permission_directory::{
    PermissionDirectory, PermissionDirectoryService, default_permissions,
};
pub use role_service::{RoleService, SelectionSummary};
