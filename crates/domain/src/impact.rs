use std::str::FromStr;

use keygate_core::AppError;
use serde::{Deserialize, Serialize};

/// Severity ranking used to aggregate risk across a scope set.
///
/// The ordering is total (`Low < Medium < High < Critical`) and aggregation
/// is a max-reduce, so derive order must match declaration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    /// Read-only or otherwise harmless access.
    #[default]
    Low,
    /// Routine mutations with bounded blast radius.
    Medium,
    /// Destructive or account-affecting operations.
    High,
    /// Irreversible, platform-wide operations.
    Critical,
}

impl ImpactLevel {
    /// Returns a stable storage value for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Returns all levels in ascending severity order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ImpactLevel] = &[
            ImpactLevel::Low,
            ImpactLevel::Medium,
            ImpactLevel::High,
            ImpactLevel::Critical,
        ];

        ALL
    }
}

impl FromStr for ImpactLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(AppError::Validation(format!(
                "unknown impact level '{value}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::ImpactLevel;

    #[test]
    fn severity_order_is_total() {
        assert!(ImpactLevel::Low < ImpactLevel::Medium);
        assert!(ImpactLevel::Medium < ImpactLevel::High);
        assert!(ImpactLevel::High < ImpactLevel::Critical);
    }

    #[test]
    fn storage_value_roundtrip() {
        for level in ImpactLevel::all() {
            let restored = ImpactLevel::from_str(level.as_str());
            assert_eq!(restored.ok(), Some(*level));
        }
    }

    #[test]
    fn unknown_level_is_rejected() {
        assert!(ImpactLevel::from_str("catastrophic").is_err());
    }
}
