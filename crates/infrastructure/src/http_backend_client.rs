use async_trait::async_trait;
use keygate_application::{
    InviteRecord, InviteRepository, PermissionBackend, PermissionRecord, RoleRepository,
};
use keygate_core::auth::AccessToken;
use keygate_core::{AppError, AppResult, TenantId};
use keygate_domain::{ImpactLevel, InviteStatus, Role};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// HTTP client for the management backend.
///
/// Implements the permission, role and invite ports over JSON/HTTPS. Every
/// call attaches `Authorization: Bearer <token>`; a missing token fails the
/// call before any request is sent. One request per call, no retries: the
/// caller owns loading state and manual retry.
pub struct HttpBackendClient {
    http_client: reqwest::Client,
    base_url: String,
    token: Option<AccessToken>,
}

impl HttpBackendClient {
    /// Creates a new backend client.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        token: Option<AccessToken>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            http_client,
            base_url,
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn require_token(&self) -> AppResult<&AccessToken> {
        self.token.as_ref().ok_or_else(|| {
            AppError::Unauthorized("missing bearer token for privileged call".to_owned())
        })
    }

    async fn execute(&self, builder: reqwest::RequestBuilder) -> AppResult<reqwest::Response> {
        let token = self.require_token()?;

        let response = builder
            .header(reqwest::header::AUTHORIZATION, token.authorization_header())
            .send()
            .await
            .map_err(|error| {
                warn!(error = %error, "backend transport failure");
                AppError::Backend(format!("backend transport failure: {error}"))
            })?;

        Self::check_status(response).await
    }

    async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<response body unavailable>".to_owned());

        Err(if status == reqwest::StatusCode::UNAUTHORIZED {
            AppError::Unauthorized(body)
        } else if status == reqwest::StatusCode::FORBIDDEN {
            AppError::Forbidden(body)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            AppError::NotFound(body)
        } else if status == reqwest::StatusCode::CONFLICT {
            AppError::Conflict(body)
        } else if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!(status = %status, "backend unavailable");
            AppError::Backend(format!("backend returned status {status}: {body}"))
        } else {
            AppError::Validation(format!(
                "backend rejected the request with status {status}: {body}"
            ))
        })
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
        response.json::<T>().await.map_err(|error| {
            AppError::Backend(format!("backend returned a malformed payload: {error}"))
        })
    }
}

/// Permission payload as the backend serializes it.
///
/// Converted through [`PermissionRecord::new`] so malformed rows are rejected
/// at the boundary instead of at render sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PermissionDto {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    resource: String,
    action: String,
    impact: ImpactLevel,
    #[serde(default)]
    created_by: Option<String>,
}

impl PermissionDto {
    fn into_record(self) -> AppResult<PermissionRecord> {
        PermissionRecord::new(
            self.id,
            self.name,
            self.description,
            self.resource,
            self.action,
            self.impact,
            self.created_by,
        )
    }
}

#[derive(Debug, Serialize)]
struct InviteStatusPatch {
    status: InviteStatus,
}

#[async_trait]
impl PermissionBackend for HttpBackendClient {
    async fn list_permissions(&self, tenant_id: TenantId) -> AppResult<Vec<PermissionRecord>> {
        let response = self
            .execute(
                self.http_client
                    .get(self.url(&format!("/tenants/{tenant_id}/permissions"))),
            )
            .await?;

        let rows: Vec<PermissionDto> = Self::parse(response).await?;
        rows.into_iter().map(PermissionDto::into_record).collect()
    }

    async fn get_permission(
        &self,
        tenant_id: TenantId,
        permission_id: &str,
    ) -> AppResult<PermissionRecord> {
        let response = self
            .execute(self.http_client.get(self.url(&format!(
                "/tenants/{tenant_id}/permissions/{permission_id}"
            ))))
            .await?;

        let row: PermissionDto = Self::parse(response).await?;
        row.into_record()
    }
}

#[async_trait]
impl RoleRepository for HttpBackendClient {
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        let response = self
            .execute(
                self.http_client
                    .get(self.url(&format!("/tenants/{tenant_id}/roles"))),
            )
            .await?;

        Self::parse(response).await
    }

    async fn find_role(&self, tenant_id: TenantId, role_id: &str) -> AppResult<Option<Role>> {
        let result = self
            .execute(
                self.http_client
                    .get(self.url(&format!("/tenants/{tenant_id}/roles/{role_id}"))),
            )
            .await;

        match result {
            Ok(response) => Ok(Some(Self::parse(response).await?)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn save_role(&self, tenant_id: TenantId, role: Role) -> AppResult<Role> {
        // Full-object replace: the whole role goes back, last write wins.
        let patched = self
            .execute(
                self.http_client
                    .patch(self.url(&format!("/tenants/{tenant_id}/roles/{}", role.id)))
                    .json(&role),
            )
            .await;

        match patched {
            Ok(response) => Self::parse(response).await,
            Err(AppError::NotFound(_)) => {
                let response = self
                    .execute(
                        self.http_client
                            .post(self.url(&format!("/tenants/{tenant_id}/roles")))
                            .json(&role),
                    )
                    .await?;
                Self::parse(response).await
            }
            Err(error) => Err(error),
        }
    }

    async fn delete_role(&self, tenant_id: TenantId, role_id: &str) -> AppResult<()> {
        self.execute(
            self.http_client
                .delete(self.url(&format!("/tenants/{tenant_id}/roles/{role_id}"))),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl InviteRepository for HttpBackendClient {
    async fn create_invite(&self, record: InviteRecord) -> AppResult<()> {
        self.execute(
            self.http_client
                .post(self.url(&format!("/tenants/{}/invites", record.tenant_id)))
                .json(&record),
        )
        .await
        .map(|_| ())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<InviteRecord>> {
        let result = self
            .execute(
                self.http_client
                    .get(self.url(&format!("/invites/by-token/{token_hash}"))),
            )
            .await;

        match result {
            Ok(response) => Ok(Some(Self::parse(response).await?)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn find_by_id(&self, invite_id: Uuid) -> AppResult<Option<InviteRecord>> {
        let result = self
            .execute(
                self.http_client
                    .get(self.url(&format!("/invites/{invite_id}"))),
            )
            .await;

        match result {
            Ok(response) => Ok(Some(Self::parse(response).await?)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn update_status(&self, invite_id: Uuid, status: InviteStatus) -> AppResult<()> {
        self.execute(
            self.http_client
                .patch(self.url(&format!("/invites/{invite_id}")))
                .json(&InviteStatusPatch { status }),
        )
        .await
        .map(|_| ())
    }

    async fn remove(&self, invite_id: Uuid) -> AppResult<bool> {
        let result = self
            .execute(
                self.http_client
                    .delete(self.url(&format!("/invites/{invite_id}"))),
            )
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(AppError::NotFound(_)) => Ok(false),
            Err(error) => Err(error),
        }
    }

    async fn list_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<InviteRecord>> {
        let response = self
            .execute(
                self.http_client
                    .get(self.url(&format!("/tenants/{tenant_id}/invites"))),
            )
            .await?;

        Self::parse(response).await
    }

    async fn list_for_email(&self, email: &str) -> AppResult<Vec<InviteRecord>> {
        let response = self
            .execute(
                self.http_client
                    .get(self.url("/invites/received"))
                    .query(&[("email", email)]),
            )
            .await?;

        Self::parse(response).await
    }
}

#[cfg(test)]
mod tests {
    use keygate_core::auth::AccessToken;
    use keygate_core::{AppError, TenantId};
    use keygate_domain::ImpactLevel;

    use super::{HttpBackendClient, PermissionDto};

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = HttpBackendClient::new(
            reqwest::Client::new(),
            "https://api.keygate.dev/v1/",
            None,
        );
        assert_eq!(
            client.url("/tenants/abc/roles"),
            "https://api.keygate.dev/v1/tenants/abc/roles"
        );
    }

    #[test]
    fn missing_token_is_a_hard_precondition_failure() {
        let client = HttpBackendClient::new(reqwest::Client::new(), "https://api.keygate.dev", None);
        assert!(matches!(
            client.require_token(),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn present_token_passes_the_precondition() {
        let token = AccessToken::new("tok-123").ok();
        let client =
            HttpBackendClient::new(reqwest::Client::new(), "https://api.keygate.dev", token);
        assert!(client.require_token().is_ok());
    }

    #[test]
    fn malformed_permission_rows_are_rejected_at_the_boundary() {
        let dto = PermissionDto {
            id: "  ".to_owned(),
            name: String::new(),
            description: String::new(),
            resource: "license".to_owned(),
            action: "retrieve_all".to_owned(),
            impact: ImpactLevel::Low,
            created_by: None,
        };
        assert!(dto.into_record().is_err());

        // Exercised to keep the route shape honest: ids embed into paths.
        let tenant_id = TenantId::new();
        let client = HttpBackendClient::new(reqwest::Client::new(), "https://api.keygate.dev", None);
        let url = client.url(&format!("/tenants/{tenant_id}/permissions"));
        assert!(url.contains(&tenant_id.to_string()));
    }
}
