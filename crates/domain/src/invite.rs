use std::str::FromStr;

use keygate_core::AppError;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a team invite.
///
/// `Pending` is the only non-terminal state. Expiry is evaluated lazily
/// against the invite's deadline at query or action time; no background timer
/// transitions invites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    /// Sent, not yet answered.
    Pending,
    /// Recipient joined the tenant.
    Accepted,
    /// Recipient turned the invite down.
    Declined,
    /// Deadline passed before an answer.
    Expired,
}

impl InviteStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Expired => "expired",
        }
    }

    /// Returns whether the status admits no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns whether a transition to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(self, Self::Pending) && next != Self::Pending
    }
}

impl FromStr for InviteStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "expired" => Ok(Self::Expired),
            _ => Err(AppError::Validation(format!(
                "unknown invite status '{value}'"
            ))),
        }
    }
}
