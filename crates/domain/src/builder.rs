use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use keygate_core::AppError;
use serde::{Deserialize, Serialize};

use crate::ScopeId;

/// Flat access level used by the visual permission builder.
///
/// A simpler, per-resource model than scopes; lowered onto the scope catalog
/// through [`level_scopes`]. Ordering is total so "edit or above" checks stay
/// comparisons.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    /// No access.
    #[default]
    None,
    /// Read-only access.
    View,
    /// Read and mutate.
    Edit,
    /// Full control including destructive operations.
    Admin,
}

impl PermissionLevel {
    /// Returns a stable storage value for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::View => "view",
            Self::Edit => "edit",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for PermissionLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(Self::None),
            "view" => Ok(Self::View),
            "edit" => Ok(Self::Edit),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::Validation(format!(
                "unknown permission level '{value}'"
            ))),
        }
    }
}

/// Kind of resource shown in the visual builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// An OAuth application registered in the tenant.
    App,
    /// The tenant billing surface.
    Billing,
    /// Tenant team administration.
    Team,
}

/// One row of the visual builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderResource {
    /// Stable resource identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Resource kind driving conflict rules and scope lowering.
    pub kind: ResourceKind,
}

impl BuilderResource {
    /// Creates an application resource row.
    #[must_use]
    pub fn app(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: ResourceKind::App,
        }
    }

    /// Creates the billing resource row.
    #[must_use]
    pub fn billing() -> Self {
        Self {
            id: "billing".to_owned(),
            name: "Billing".to_owned(),
            kind: ResourceKind::Billing,
        }
    }

    /// Creates the team resource row.
    #[must_use]
    pub fn team() -> Self {
        Self {
            id: "team".to_owned(),
            name: "Team".to_owned(),
            kind: ResourceKind::Team,
        }
    }
}

/// Ad hoc mapping from resource id to permission level.
///
/// Resources absent from the map are at [`PermissionLevel::None`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSelection(BTreeMap<String, PermissionLevel>);

impl PermissionSelection {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level for one resource.
    pub fn set(&mut self, resource: impl Into<String>, level: PermissionLevel) {
        self.0.insert(resource.into(), level);
    }

    /// Returns the level for a resource, defaulting to `None`.
    #[must_use]
    pub fn level_for(&self, resource: &str) -> PermissionLevel {
        self.0.get(resource).copied().unwrap_or_default()
    }

    /// Iterates explicitly-set entries.
    pub fn entries(&self) -> impl Iterator<Item = (&str, PermissionLevel)> {
        self.0.iter().map(|(resource, level)| (resource.as_str(), *level))
    }
}

impl FromIterator<(String, PermissionLevel)> for PermissionSelection {
    fn from_iter<I: IntoIterator<Item = (String, PermissionLevel)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Named preset mapping of resource levels used to bulk-initialize a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionTemplate {
    /// Stable template identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Levels per resource id; resources omitted here mean `None`.
    pub levels: Vec<(String, PermissionLevel)>,
}

impl SelectionTemplate {
    fn level_for(&self, resource: &str) -> Option<PermissionLevel> {
        self.levels
            .iter()
            .find(|(candidate, _)| candidate == resource)
            .map(|(_, level)| *level)
    }
}

/// Result of matching a selection against the template list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateMatch {
    /// The selection equals this template exactly.
    Template(String),
    /// No template matches; the selection is hand-built.
    Custom,
}

/// Applies a template to the builder selection.
///
/// Whole-selection replace, never a merge: any resource the template omits
/// reverts to whatever the template specifies, i.e. `None`. This is distinct
/// from role creation, where a preset's scope set is copied into the draft.
#[must_use]
pub fn apply_template(template: &SelectionTemplate) -> PermissionSelection {
    template
        .levels
        .iter()
        .map(|(resource, level)| (resource.clone(), *level))
        .collect()
}

/// Detects which template, if any, the selection currently equals.
///
/// A template matches only on exact bidirectional equality: every template
/// entry equals the selection's level for that resource, and the selection has
/// no non-`None` entry outside the template's keys. Templates are scanned in
/// declaration order; the first full match wins.
#[must_use]
pub fn detect_active_template(
    templates: &[SelectionTemplate],
    selection: &PermissionSelection,
) -> TemplateMatch {
    for template in templates {
        let levels_match = template
            .levels
            .iter()
            .all(|(resource, level)| selection.level_for(resource) == *level);

        let no_extra_entries = selection
            .entries()
            .filter(|(_, level)| *level != PermissionLevel::None)
            .all(|(resource, _)| template.level_for(resource).is_some());

        if levels_match && no_extra_entries {
            return TemplateMatch::Template(template.id.clone());
        }
    }

    TemplateMatch::Custom
}

/// Advisory message produced by the conflict rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictMessage {
    /// Human-readable advisory text. Never blocks a save.
    pub message: String,
}

/// Evaluates the fixed conflict rule list over the whole selection.
///
/// Rules run in declaration order and every rule that fires contributes a
/// message; conflicts are advisory and never block saving.
#[must_use]
pub fn detect_conflicts(
    resources: &[BuilderResource],
    selection: &PermissionSelection,
) -> Vec<ConflictMessage> {
    let mut conflicts = Vec::new();

    let app_at_or_above = |floor: PermissionLevel| {
        resources
            .iter()
            .filter(|resource| resource.kind == ResourceKind::App)
            .any(|resource| selection.level_for(&resource.id) >= floor)
    };

    let billing_level = resources
        .iter()
        .filter(|resource| resource.kind == ResourceKind::Billing)
        .map(|resource| selection.level_for(&resource.id))
        .max()
        .unwrap_or_default();

    if app_at_or_above(PermissionLevel::Edit) && billing_level == PermissionLevel::None {
        conflicts.push(ConflictMessage {
            message: "Users with edit access to apps should have at least view access to billing"
                .to_owned(),
        });
    }

    let team_is_admin = resources
        .iter()
        .filter(|resource| resource.kind == ResourceKind::Team)
        .any(|resource| selection.level_for(&resource.id) == PermissionLevel::Admin);

    if team_is_admin && !app_at_or_above(PermissionLevel::Admin) {
        conflicts.push(ConflictMessage {
            message: "Team admins typically need admin access to at least one app".to_owned(),
        });
    }

    conflicts
}

/// Fixed lowering from a builder level to catalog scope ids.
///
/// This is the designed bridge between the flat builder model and the scope
/// model: the builder is a view, not a second source of truth.
#[must_use]
pub fn level_scopes(kind: ResourceKind, level: PermissionLevel) -> &'static [&'static str] {
    match (kind, level) {
        (_, PermissionLevel::None) => &[],
        (ResourceKind::App, PermissionLevel::View) => {
            &["user.read", "license.read", "session.read"]
        }
        (ResourceKind::App, PermissionLevel::Edit) => &[
            "user.read",
            "user.write",
            "license.read",
            "license.create",
            "license.update",
            "session.read",
            "session.kill",
        ],
        (ResourceKind::App, PermissionLevel::Admin) => &[
            "user.read",
            "user.write",
            "user.ban",
            "user.delete",
            "license.read",
            "license.create",
            "license.update",
            "license.delete",
            "session.read",
            "session.kill",
        ],
        (ResourceKind::Billing, PermissionLevel::View) => &["subscription.read"],
        (ResourceKind::Billing, PermissionLevel::Edit) => {
            &["subscription.read", "subscription.write"]
        }
        (ResourceKind::Billing, PermissionLevel::Admin) => &[
            "subscription.read",
            "subscription.write",
            "subscription.delete",
        ],
        (ResourceKind::Team, PermissionLevel::View) => &["log.read"],
        (ResourceKind::Team, PermissionLevel::Edit) => &["log.read", "global.settings"],
        (ResourceKind::Team, PermissionLevel::Admin) => {
            &["log.read", "log.delete", "global.settings", "global.admin"]
        }
    }
}

/// Lowers a flat selection onto the scope model.
#[must_use]
pub fn selection_to_scopes(
    resources: &[BuilderResource],
    selection: &PermissionSelection,
) -> BTreeSet<ScopeId> {
    resources
        .iter()
        .flat_map(|resource| {
            level_scopes(resource.kind, selection.level_for(&resource.id))
                .iter()
                .map(|id| ScopeId::from_raw(*id))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::ScopeCatalog;

    use super::{
        BuilderResource, PermissionLevel, PermissionSelection, ResourceKind, SelectionTemplate,
        TemplateMatch, apply_template, detect_active_template, detect_conflicts, level_scopes,
        selection_to_scopes,
    };

    fn resources() -> Vec<BuilderResource> {
        vec![
            BuilderResource::app("app_1", "Storefront"),
            BuilderResource::app("app_2", "Launcher"),
            BuilderResource::billing(),
            BuilderResource::team(),
        ]
    }

    fn templates() -> Vec<SelectionTemplate> {
        vec![
            SelectionTemplate {
                id: "administrator".to_owned(),
                name: "Administrator".to_owned(),
                description: "Full control everywhere".to_owned(),
                levels: vec![
                    ("app_1".to_owned(), PermissionLevel::Admin),
                    ("app_2".to_owned(), PermissionLevel::Admin),
                    ("billing".to_owned(), PermissionLevel::Admin),
                    ("team".to_owned(), PermissionLevel::Admin),
                ],
            },
            SelectionTemplate {
                id: "developer".to_owned(),
                name: "Developer".to_owned(),
                description: "Edit apps, view billing".to_owned(),
                levels: vec![
                    ("app_1".to_owned(), PermissionLevel::Edit),
                    ("app_2".to_owned(), PermissionLevel::Edit),
                    ("billing".to_owned(), PermissionLevel::View),
                    ("team".to_owned(), PermissionLevel::View),
                ],
            },
            SelectionTemplate {
                id: "billing_manager".to_owned(),
                name: "Billing manager".to_owned(),
                description: "Administer billing only".to_owned(),
                levels: vec![
                    ("app_1".to_owned(), PermissionLevel::View),
                    ("app_2".to_owned(), PermissionLevel::View),
                    ("billing".to_owned(), PermissionLevel::Admin),
                    ("team".to_owned(), PermissionLevel::None),
                ],
            },
        ]
    }

    #[test]
    fn template_round_trips_through_detection() {
        let templates = templates();
        for template in &templates {
            let applied = apply_template(template);
            assert_eq!(
                detect_active_template(&templates, &applied),
                TemplateMatch::Template(template.id.clone()),
                "{}",
                template.id
            );
        }
    }

    #[test]
    fn apply_template_replaces_whole_selection() {
        let templates = templates();
        let mut prior = PermissionSelection::new();
        prior.set("app_9", PermissionLevel::Admin);

        // Replace semantics: the prior entry must not survive application.
        let applied = apply_template(&templates[1]);
        assert_eq!(applied.level_for("app_9"), PermissionLevel::None);
        assert_eq!(applied.level_for("app_1"), PermissionLevel::Edit);
    }

    #[test]
    fn extra_non_none_entry_breaks_the_match() {
        let templates = templates();
        let mut selection = apply_template(&templates[1]);
        selection.set("app_9", PermissionLevel::View);

        assert_eq!(
            detect_active_template(&templates, &selection),
            TemplateMatch::Custom
        );
    }

    #[test]
    fn extra_none_entry_keeps_the_match() {
        let templates = templates();
        let mut selection = apply_template(&templates[1]);
        selection.set("app_9", PermissionLevel::None);

        assert_eq!(
            detect_active_template(&templates, &selection),
            TemplateMatch::Template("developer".to_owned())
        );
    }

    #[test]
    fn edit_without_billing_view_raises_single_conflict() {
        let mut selection = PermissionSelection::new();
        selection.set("app_1", PermissionLevel::Edit);
        selection.set("billing", PermissionLevel::None);

        let conflicts = detect_conflicts(&resources(), &selection);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].message.contains("billing"));
    }

    #[test]
    fn billing_view_silences_the_rule() {
        let mut selection = PermissionSelection::new();
        selection.set("app_1", PermissionLevel::Edit);
        selection.set("billing", PermissionLevel::View);

        assert!(detect_conflicts(&resources(), &selection).is_empty());
    }

    #[test]
    fn team_admin_without_app_admin_raises_conflict() {
        let mut selection = PermissionSelection::new();
        selection.set("team", PermissionLevel::Admin);
        selection.set("billing", PermissionLevel::View);

        let conflicts = detect_conflicts(&resources(), &selection);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].message.contains("Team admins"));
    }

    #[test]
    fn simultaneous_conflicts_all_surface_in_rule_order() {
        let mut selection = PermissionSelection::new();
        selection.set("app_1", PermissionLevel::Edit);
        selection.set("team", PermissionLevel::Admin);

        let conflicts = detect_conflicts(&resources(), &selection);
        assert_eq!(conflicts.len(), 2);
        assert!(conflicts[0].message.contains("billing"));
        assert!(conflicts[1].message.contains("Team admins"));
    }

    #[test]
    fn level_lowering_targets_known_scopes_only() {
        let catalog = ScopeCatalog::builtin();
        for kind in [ResourceKind::App, ResourceKind::Billing, ResourceKind::Team] {
            for level in [
                PermissionLevel::None,
                PermissionLevel::View,
                PermissionLevel::Edit,
                PermissionLevel::Admin,
            ] {
                for scope_id in level_scopes(kind, level) {
                    assert!(catalog.get(scope_id).is_some(), "{scope_id}");
                }
            }
        }
        assert!(level_scopes(ResourceKind::App, PermissionLevel::None).is_empty());
    }

    #[test]
    fn selection_lowers_to_scope_union() {
        let mut selection = PermissionSelection::new();
        selection.set("app_1", PermissionLevel::View);
        selection.set("billing", PermissionLevel::Edit);

        let scopes = selection_to_scopes(&resources(), &selection);
        assert!(scopes.iter().any(|id| id.as_str() == "license.read"));
        assert!(scopes.iter().any(|id| id.as_str() == "subscription.write"));
        assert!(!scopes.iter().any(|id| id.as_str() == "global.admin"));
    }
}
