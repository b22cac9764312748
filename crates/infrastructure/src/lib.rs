//! Infrastructure adapters for the Keygate access-control core.
//!
//! In-memory implementations back the application ports in tests and local
//! development; the HTTP client implements the same ports against the
//! management backend.

#![forbid(unsafe_code)]

mod http_backend_client;
mod in_memory_assignment_repository;
mod in_memory_audit_repository;
mod in_memory_invite_repository;
mod in_memory_role_repository;

pub use http_backend_client::HttpBackendClient;
pub use in_memory_assignment_repository::InMemoryAssignmentRepository;
pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_invite_repository::InMemoryInviteRepository;
pub use in_memory_role_repository::InMemoryRoleRepository;
