use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult, TenantId};

/// Storage key under which the console keeps the bearer token.
///
/// Every privileged backend call requires a token stored under this key;
/// its absence is a hard precondition failure, not a recoverable state.
pub const ACCESS_TOKEN_STORAGE_KEY: &str = "keygate.access_token";

/// Validated bearer token for backend calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken(String);

impl AccessToken {
    /// Creates a validated access token.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Unauthorized(
                "missing bearer token for privileged call".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Renders the `Authorization` header value for this token.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

/// User information carried by the authenticated admin session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    display_name: String,
    email: Option<String>,
    tenant_id: TenantId,
}

impl UserIdentity {
    /// Creates a user identity from authentication and tenancy data.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        display_name: impl Into<String>,
        email: Option<String>,
        tenant_id: TenantId,
    ) -> Self {
        Self {
            subject: subject.into(),
            display_name: display_name.into(),
            email,
            tenant_id,
        }
    }

    /// Returns the stable subject claim from the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if the provider returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the tenant linked to the identity.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::AccessToken;

    #[test]
    fn access_token_rejects_blank_value() {
        assert!(AccessToken::new("  ").is_err());
    }

    #[test]
    fn access_token_renders_bearer_header() {
        let token = AccessToken::new("tok-123");
        assert!(token.is_ok());
        let header = token
            .map(|value| value.authorization_header())
            .unwrap_or_default();
        assert_eq!(header, "Bearer tok-123");
    }
}
