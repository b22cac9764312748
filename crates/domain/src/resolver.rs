use std::collections::BTreeSet;

use crate::{ImpactLevel, PermissionId, ScopeCatalog, ScopeId};

/// Expands a scope selection to the union of its bundled permissions.
///
/// Set semantics: duplicate scope ids collapse, insertion order is irrelevant.
/// Scope ids missing from the catalog expand to nothing, mirroring the
/// degrade-gracefully lookup rule.
pub fn expand_scopes_to_permissions<'a>(
    catalog: &ScopeCatalog,
    scope_ids: impl IntoIterator<Item = &'a ScopeId>,
) -> BTreeSet<PermissionId> {
    scope_ids
        .into_iter()
        .filter_map(|scope_id| catalog.get(scope_id.as_str()))
        .flat_map(|scope| scope.permissions.iter().cloned())
        .collect()
}

/// Reduces a scope selection to its aggregate impact level.
///
/// Max-reduce over the ordered enum; an empty (or entirely unknown) selection
/// yields the `Low` floor, matching the "no access" default.
pub fn aggregate_impact<'a>(
    catalog: &ScopeCatalog,
    scope_ids: impl IntoIterator<Item = &'a ScopeId>,
) -> ImpactLevel {
    scope_ids
        .into_iter()
        .filter_map(|scope_id| catalog.get(scope_id.as_str()))
        .map(|scope| scope.impact)
        .max()
        .unwrap_or(ImpactLevel::Low)
}
