use std::collections::{BTreeSet, HashMap};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use keygate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::ImpactLevel;

/// Identifier of a scope, dotted `<resource>.<verb>` form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScopeId(String);

impl ScopeId {
    /// Creates a validated scope identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "scope id must not be empty".to_owned(),
            ));
        }
        if !value.contains('.') {
            return Err(AppError::Validation(format!(
                "scope id '{value}' must use dotted <resource>.<verb> form"
            )));
        }

        Ok(Self(value))
    }

    /// Creates a scope identifier from trusted compiled-in data.
    #[must_use]
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ScopeId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<ScopeId> for String {
    fn from(value: ScopeId) -> Self {
        value.0
    }
}

/// Identifier of an atomic, backend-enforced permission.
///
/// Permissions are leaf units of access control; they are never assigned to a
/// role directly, only through a scope.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PermissionId(String);

impl PermissionId {
    /// Creates a validated permission identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "permission id must not be empty".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Creates a permission identifier from trusted compiled-in data.
    #[must_use]
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for PermissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Grouping label partitioning the scope catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    /// End-user accounts managed by an application.
    User,
    /// License keys and their lifecycle.
    License,
    /// Active end-user sessions.
    Session,
    /// Subscription tiers and billing windows.
    Subscription,
    /// Activity and audit log access.
    Log,
    /// Platform-wide settings and destructive operations.
    Global,
}

impl ResourceCategory {
    /// Returns a stable storage value for this category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::License => "license",
            Self::Session => "session",
            Self::Subscription => "subscription",
            Self::Log => "log",
            Self::Global => "global",
        }
    }

    /// Returns the human-friendly category name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::User => "Users",
            Self::License => "Licenses",
            Self::Session => "Sessions",
            Self::Subscription => "Subscriptions",
            Self::Log => "Logs",
            Self::Global => "Global",
        }
    }

    /// Returns a short description for category headers.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::User => "Manage end-user accounts",
            Self::License => "Create, edit and revoke license keys",
            Self::Session => "Inspect and terminate active sessions",
            Self::Subscription => "Manage subscription tiers and durations",
            Self::Log => "Read and prune activity logs",
            Self::Global => "Application-wide settings and resets",
        }
    }

    /// Returns all categories in catalog declaration order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ResourceCategory] = &[
            ResourceCategory::User,
            ResourceCategory::License,
            ResourceCategory::Session,
            ResourceCategory::Subscription,
            ResourceCategory::Log,
            ResourceCategory::Global,
        ];

        ALL
    }
}

impl FromStr for ResourceCategory {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "license" => Ok(Self::License),
            "session" => Ok(Self::Session),
            "subscription" => Ok(Self::Subscription),
            "log" => Ok(Self::Log),
            "global" => Ok(Self::Global),
            _ => Err(AppError::Validation(format!(
                "unknown resource category '{value}'"
            ))),
        }
    }
}

/// Named bundle of low-level permissions with a category and impact level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Globally unique dotted identifier.
    pub id: ScopeId,
    /// Human-friendly name.
    pub name: String,
    /// One-line description shown in the scope picker.
    pub description: String,
    /// Category partition this scope belongs to.
    pub category: ResourceCategory,
    /// Severity of granting this scope.
    pub impact: ImpactLevel,
    /// Non-empty set of permissions the scope bundles.
    pub permissions: BTreeSet<PermissionId>,
}

/// Immutable registry of scopes, seeded at process start.
#[derive(Debug, Clone)]
pub struct ScopeCatalog {
    scopes: Vec<Scope>,
    index: HashMap<String, usize>,
}

impl ScopeCatalog {
    /// Creates a catalog from caller-supplied scopes, validating invariants.
    pub fn new(scopes: Vec<Scope>) -> AppResult<Self> {
        let catalog = Self::from_scopes(scopes);
        catalog.self_check()?;
        Ok(catalog)
    }

    /// Returns the compiled-in platform catalog.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_scopes(builtin_scopes())
    }

    fn from_scopes(scopes: Vec<Scope>) -> Self {
        let mut index = HashMap::with_capacity(scopes.len());
        for (position, scope) in scopes.iter().enumerate() {
            index.entry(scope.id.as_str().to_owned()).or_insert(position);
        }

        Self { scopes, index }
    }

    /// Verifies catalog invariants: unique ids and non-empty permission sets.
    pub fn self_check(&self) -> AppResult<()> {
        if self.index.len() != self.scopes.len() {
            return Err(AppError::Validation(
                "scope catalog contains duplicate scope ids".to_owned(),
            ));
        }

        for scope in &self.scopes {
            if !scope.id.as_str().contains('.') {
                return Err(AppError::Validation(format!(
                    "scope id '{}' must use dotted <resource>.<verb> form",
                    scope.id
                )));
            }
            if scope.permissions.is_empty() {
                return Err(AppError::Validation(format!(
                    "scope '{}' must bundle at least one permission",
                    scope.id
                )));
            }
        }

        Ok(())
    }

    /// Looks up a scope by id. Unknown ids yield `None`, never a panic.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Scope> {
        self.index.get(id).and_then(|position| self.scopes.get(*position))
    }

    /// Returns the display name for a scope id, degrading to the raw id when
    /// the catalog has no entry for it.
    #[must_use]
    pub fn display_name_for<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map_or(id, |scope| scope.name.as_str())
    }

    /// Groups scopes by category, preserving catalog declaration order within
    /// each group. Categories without scopes are omitted.
    #[must_use]
    pub fn scopes_by_category(&self) -> Vec<(ResourceCategory, Vec<&Scope>)> {
        ResourceCategory::all()
            .iter()
            .filter_map(|category| {
                let members: Vec<&Scope> = self
                    .scopes
                    .iter()
                    .filter(|scope| scope.category == *category)
                    .collect();
                (!members.is_empty()).then_some((*category, members))
            })
            .collect()
    }

    /// Returns scopes whose impact matches `level` exactly.
    #[must_use]
    pub fn scopes_by_impact(&self, level: ImpactLevel) -> Vec<&Scope> {
        self.scopes
            .iter()
            .filter(|scope| scope.impact == level)
            .collect()
    }

    /// Iterates all scopes in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    /// Returns the number of scopes in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

/// Compiled-in scope table: (id, name, description, category, impact, permissions).
type ScopeRow = (
    &'static str,
    &'static str,
    &'static str,
    ResourceCategory,
    ImpactLevel,
    &'static [&'static str],
);

const BUILTIN_SCOPES: &[ScopeRow] = &[
    (
        "user.read",
        "Read users",
        "List and inspect end-user accounts",
        ResourceCategory::User,
        ImpactLevel::Low,
        &["user.retrieve_all"],
    ),
    (
        "user.write",
        "Manage users",
        "Create and update end-user accounts",
        ResourceCategory::User,
        ImpactLevel::Medium,
        &["user.create", "user.update"],
    ),
    (
        "user.ban",
        "Ban users",
        "Ban and unban end-user accounts",
        ResourceCategory::User,
        ImpactLevel::Medium,
        &["user.ban", "user.unban"],
    ),
    (
        "user.delete",
        "Delete users",
        "Delete individual accounts or wipe all users",
        ResourceCategory::User,
        ImpactLevel::High,
        &["user.delete", "user.delete_all"],
    ),
    (
        "license.read",
        "Read licenses",
        "List and inspect license keys",
        ResourceCategory::License,
        ImpactLevel::Low,
        &["license.retrieve_all"],
    ),
    (
        "license.create",
        "Create licenses",
        "Generate single or bulk license keys",
        ResourceCategory::License,
        ImpactLevel::Medium,
        &["license.create", "license.create_bulk"],
    ),
    (
        "license.update",
        "Update licenses",
        "Edit or ban existing license keys",
        ResourceCategory::License,
        ImpactLevel::Medium,
        &["license.update", "license.ban"],
    ),
    (
        "license.delete",
        "Delete licenses",
        "Delete individual keys or wipe all licenses",
        ResourceCategory::License,
        ImpactLevel::Critical,
        &["license.delete", "license.delete_all"],
    ),
    (
        "session.read",
        "Read sessions",
        "List active end-user sessions",
        ResourceCategory::Session,
        ImpactLevel::Low,
        &["session.retrieve_all"],
    ),
    (
        "session.kill",
        "Kill sessions",
        "Terminate single sessions or all at once",
        ResourceCategory::Session,
        ImpactLevel::Medium,
        &["session.kill", "session.kill_all"],
    ),
    (
        "subscription.read",
        "Read subscriptions",
        "List subscription tiers and assignments",
        ResourceCategory::Subscription,
        ImpactLevel::Low,
        &["subscription.retrieve_all"],
    ),
    (
        "subscription.write",
        "Manage subscriptions",
        "Create, update and extend subscriptions",
        ResourceCategory::Subscription,
        ImpactLevel::Medium,
        &["subscription.create", "subscription.update", "subscription.extend"],
    ),
    (
        "subscription.delete",
        "Delete subscriptions",
        "Remove subscription tiers",
        ResourceCategory::Subscription,
        ImpactLevel::High,
        &["subscription.delete"],
    ),
    (
        "log.read",
        "Read logs",
        "Read activity and audit log entries",
        ResourceCategory::Log,
        ImpactLevel::Low,
        &["log.retrieve_all"],
    ),
    (
        "log.delete",
        "Prune logs",
        "Delete activity log history",
        ResourceCategory::Log,
        ImpactLevel::High,
        &["log.delete_all"],
    ),
    (
        "global.settings",
        "Application settings",
        "Read and change application settings",
        ResourceCategory::Global,
        ImpactLevel::High,
        &["settings.read", "settings.update"],
    ),
    (
        "global.admin",
        "Application administration",
        "Reset the application or wipe all of its data",
        ResourceCategory::Global,
        ImpactLevel::Critical,
        &["application.reset", "application.delete_all"],
    ),
];

fn builtin_scopes() -> Vec<Scope> {
    BUILTIN_SCOPES
        .iter()
        .map(|(id, name, description, category, impact, permissions)| Scope {
            id: ScopeId::from_raw(*id),
            name: (*name).to_owned(),
            description: (*description).to_owned(),
            category: *category,
            impact: *impact,
            permissions: permissions
                .iter()
                .map(|permission| PermissionId::from_raw(*permission))
                .collect(),
        })
        .collect()
}
