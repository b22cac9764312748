use std::collections::BTreeMap;
use std::sync::Arc;

use keygate_core::{AppError, AppResult, TenantId};
use keygate_domain::ScopeCatalog;

use crate::access_ports::{PermissionBackend, PermissionRecord};

/// Hydrated permission list plus its provenance.
///
/// `degraded` signals that the backend was unreachable and the compiled-in
/// default set is being shown; the caller pairs it with a dismissible error
/// banner and a manual retry action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDirectory {
    /// Permission records, live or fallback.
    pub permissions: Vec<PermissionRecord>,
    /// Whether the list is the offline fallback rather than backend data.
    pub degraded: bool,
}

/// Application service hydrating backend-owned permissions with an offline
/// fallback so the permission editor stays usable when the backend is down.
#[derive(Clone)]
pub struct PermissionDirectoryService {
    backend: Arc<dyn PermissionBackend>,
}

impl PermissionDirectoryService {
    /// Creates a new service from a backend implementation.
    #[must_use]
    pub fn new(backend: Arc<dyn PermissionBackend>) -> Self {
        Self { backend }
    }

    /// Lists tenant permissions.
    ///
    /// A backend outage degrades to [`default_permissions`]; every other
    /// error, a missing bearer token included, propagates unchanged.
    pub async fn list(&self, tenant_id: TenantId) -> AppResult<PermissionDirectory> {
        match self.backend.list_permissions(tenant_id).await {
            Ok(permissions) => Ok(PermissionDirectory {
                permissions,
                degraded: false,
            }),
            Err(AppError::Backend(_)) => Ok(PermissionDirectory {
                permissions: default_permissions(),
                degraded: true,
            }),
            Err(error) => Err(error),
        }
    }

    /// Fetches one permission, lazily hydrating ids referenced by a role but
    /// not yet loaded. Falls back to the default set during an outage.
    pub async fn get(
        &self,
        tenant_id: TenantId,
        permission_id: &str,
    ) -> AppResult<PermissionRecord> {
        match self.backend.get_permission(tenant_id, permission_id).await {
            Ok(record) => Ok(record),
            Err(AppError::Backend(reason)) => default_permissions()
                .into_iter()
                .find(|record| record.id == permission_id)
                .ok_or(AppError::Backend(reason)),
            Err(error) => Err(error),
        }
    }
}

/// Compiled-in fallback permission set, derived from the builtin scope
/// catalog so the two never drift apart.
#[must_use]
pub fn default_permissions() -> Vec<PermissionRecord> {
    let catalog = ScopeCatalog::builtin();
    let mut records: BTreeMap<String, PermissionRecord> = BTreeMap::new();

    for scope in catalog.iter() {
        for permission in &scope.permissions {
            let id = permission.as_str();
            let (resource, action) = id.split_once('.').unwrap_or((id, ""));

            if let Ok(record) = PermissionRecord::new(
                id,
                id,
                scope.description.clone(),
                resource,
                action,
                scope.impact,
                None,
            ) {
                records.entry(record.id.clone()).or_insert(record);
            }
        }
    }

    records.into_values().collect()
}
