use crate::core::ip;
use crate::domain::model::{Credentials, License, LicenseUpdate, LoginResponse, NewLicense};
use crate::domain::ports::{ConfigProvider, LicenseApi};
use crate::utils::error::{AdminError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const DEFAULT_LOGIN_ERROR: &str = "Invalid username or password.";

/// 授權碼 REST API 的 reqwest 實作
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth_scheme: String,
    ip_lookup_url: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, auth_scheme: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_scheme: auth_scheme.to_string(),
            ip_lookup_url: None,
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut client = Self::new(
            config.api_base(),
            config.auth_scheme(),
            Duration::from_secs(config.request_timeout_secs()),
        )?;
        client.ip_lookup_url = config.ip_lookup_url().map(str::to_string);
        Ok(client)
    }

    pub fn with_ip_lookup(mut self, url: impl Into<String>) -> Self {
        self.ip_lookup_url = Some(url.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder.header(
            reqwest::header::AUTHORIZATION,
            format!("{} {}", self.auth_scheme, token),
        )
    }

    /// 非 2xx 轉成錯誤；401 一律視為 token 失效
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(AdminError::Unauthorized);
        }

        let detail = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| error_message(&body));

        Err(AdminError::ApiStatus {
            status: status.as_u16(),
            detail,
        })
    }

    /// 2xx 已代表動作完成，回應內容只是附帶資訊，解析失敗就略過
    async fn body_if_parsable<T: DeserializeOwned>(response: Response) -> Option<T> {
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("Could not read response body: {}", e);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::debug!("Ignoring unparsable response body: {}", e);
                None
            }
        }
    }
}

/// 從錯誤回應中取出可讀訊息 (`detail`、`error` 或 DRF 的 `non_field_errors`)
fn error_message(body: &serde_json::Value) -> Option<String> {
    if let Some(text) = body.get("detail").and_then(|v| v.as_str()) {
        return Some(text.to_string());
    }
    if let Some(text) = body.get("error").and_then(|v| v.as_str()) {
        return Some(text.to_string());
    }
    body.get("non_field_errors")
        .and_then(|v| v.as_array())
        .and_then(|errors| errors.first())
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

#[async_trait]
impl LicenseApi for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<String> {
        let url = self.url("login/");
        tracing::debug!("Logging in as '{}' via {}", credentials.username, url);

        let response = self.client.post(&url).json(credentials).send().await?;
        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);

        if status.is_success() {
            let parsed: Option<LoginResponse> = serde_json::from_value(body.clone()).ok();
            if let Some(token) = parsed.and_then(|r| r.token).filter(|t| !t.is_empty()) {
                return Ok(token);
            }
        }

        tracing::debug!("Login rejected with status {}", status);
        Err(AdminError::LoginRejected {
            message: error_message(&body).unwrap_or_else(|| DEFAULT_LOGIN_ERROR.to_string()),
        })
    }

    async fn list_licenses(&self, token: &str) -> Result<Vec<License>> {
        let url = self.url("licenses/");
        tracing::debug!("Making API request to: {}", url);

        let response = self.authorized(self.client.get(&url), token).send().await?;
        let bytes = Self::check(response).await?.bytes().await?;
        let licenses: Vec<License> = serde_json::from_slice(&bytes)?;

        tracing::debug!("Fetched {} licenses", licenses.len());
        Ok(licenses)
    }

    async fn create_license(&self, token: &str, license: &NewLicense) -> Result<Option<License>> {
        let url = self.url("licenses/");
        tracing::debug!("Creating license '{}'", license.key);

        let response = self
            .authorized(self.client.post(&url), token)
            .json(license)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(Self::body_if_parsable(response).await)
    }

    async fn set_license_active(
        &self,
        token: &str,
        id: i64,
        is_active: bool,
    ) -> Result<Option<License>> {
        let url = self.url(&format!("licenses/{}/", id));
        tracing::debug!("Setting license {} is_active={}", id, is_active);

        let response = self
            .authorized(self.client.patch(&url), token)
            .json(&LicenseUpdate { is_active })
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(Self::body_if_parsable(response).await)
    }

    async fn delete_license(&self, token: &str, id: i64) -> Result<()> {
        let url = self.url(&format!("licenses/{}/", id));
        tracing::debug!("Deleting license {}", id);

        let response = self.authorized(self.client.delete(&url), token).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn detect_ip(&self) -> Option<String> {
        let url = self.ip_lookup_url.as_deref()?;
        ip::lookup_public_ip(&self.client, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.url("/api"), "Token", Duration::from_secs(5)).unwrap()
    }

    fn license_json(id: i64, key: &str, is_active: bool) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "key": key,
            "user": 1,
            "is_active": is_active,
            "created_at": "2026-10-18T10:00:00Z",
            "updated_at": "2026-10-18T10:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_login_returns_token() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/login/")
                .json_body(serde_json::json!({"username": "admin", "password": "secret"}));
            then.status(200).json_body(serde_json::json!({"token": "abc123"}));
        });

        let token = client_for(&server)
            .login(&Credentials::new("admin", "secret"))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(token, "abc123");
    }

    #[tokio::test]
    async fn test_login_rejection_carries_server_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/login/");
            then.status(400)
                .json_body(serde_json::json!({"error": "Account disabled"}));
        });

        let err = client_for(&server)
            .login(&Credentials::new("admin", "wrong"))
            .await
            .unwrap_err();

        match err {
            AdminError::LoginRejected { message } => assert_eq!(message, "Account disabled"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_success_without_token_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/login/");
            then.status(200).json_body(serde_json::json!({}));
        });

        let err = client_for(&server)
            .login(&Credentials::new("admin", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::LoginRejected { .. }));
        assert_eq!(err.server_detail(), Some(DEFAULT_LOGIN_ERROR));
    }

    #[tokio::test]
    async fn test_list_sends_token_header() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/licenses/")
                .header("Authorization", "Token abc123");
            then.status(200).json_body(serde_json::json!([
                license_json(1, "KEY-1", true),
                license_json(2, "KEY-2", false)
            ]));
        });

        let licenses = client_for(&server).list_licenses("abc123").await.unwrap();

        mock.assert();
        assert_eq!(licenses.len(), 2);
        assert!(!licenses[1].is_active);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/licenses/");
            then.status(401)
                .json_body(serde_json::json!({"detail": "Invalid token."}));
        });

        let err = client_for(&server).list_licenses("stale").await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_create_failure_surfaces_detail() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/api/licenses/")
                .json_body(serde_json::json!({"key": "DUP", "author": 1}));
            then.status(400)
                .json_body(serde_json::json!({"detail": "license with this key already exists."}));
        });

        let err = client_for(&server)
            .create_license(
                "abc123",
                &NewLicense {
                    key: "DUP".to_string(),
                    author: 1,
                },
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.server_detail(),
            Some("license with this key already exists.")
        );
    }

    #[tokio::test]
    async fn test_patch_and_delete_paths() {
        let server = MockServer::start();
        let patch = server.mock(|when, then| {
            when.method(PATCH)
                .path("/api/licenses/5/")
                .json_body(serde_json::json!({"is_active": false}));
            then.status(200).json_body(license_json(5, "KEY-5", false));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/api/licenses/5/");
            then.status(204);
        });

        let client = client_for(&server);
        let updated = client.set_license_active("abc123", 5, false).await.unwrap();
        client.delete_license("abc123", 5).await.unwrap();

        patch.assert();
        delete.assert();
        assert!(!updated.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_created_without_is_active_is_still_success() {
        let server = MockServer::start();
        let created = server.mock(|when, then| {
            when.method(POST).path("/api/licenses/");
            then.status(201).json_body(serde_json::json!({
                "id": 7,
                "key": "NEW",
                "user": 1,
                "created_at": "2026-10-18T10:00:00Z",
                "updated_at": "2026-10-18T10:00:00Z"
            }));
        });

        let license = client_for(&server)
            .create_license(
                "abc123",
                &NewLicense {
                    key: "NEW".to_string(),
                    author: 1,
                },
            )
            .await
            .unwrap();

        created.assert();
        assert_eq!(license.map(|l| l.key).as_deref(), Some("NEW"));
    }

    #[tokio::test]
    async fn test_unreadable_success_body_is_ignored() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(PATCH).path("/api/licenses/3/");
            then.status(200).body("OK");
        });

        let updated = client_for(&server)
            .set_license_active("abc123", 3, true)
            .await
            .unwrap();
        assert_eq!(updated, None);
    }

    #[tokio::test]
    async fn test_malformed_list_is_not_a_connection_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/licenses/");
            then.status(200).body("<html>gateway</html>");
        });

        let err = client_for(&server).list_licenses("abc123").await.unwrap_err();
        assert!(matches!(err, AdminError::SerializationError(_)));
        assert!(!err.is_connection_failure());
    }

    #[tokio::test]
    async fn test_list_accepts_naive_timestamps() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/licenses/");
            then.status(200).json_body(serde_json::json!([{
                "id": 1,
                "key": "KEY-1",
                "is_active": true,
                "created_at": "2026-10-18T10:00:00.123456",
                "updated_at": "2026-10-18T10:00:00.123456"
            }]));
        });

        let licenses = client_for(&server).list_licenses("abc123").await.unwrap();
        assert_eq!(licenses.len(), 1);
    }

    #[tokio::test]
    async fn test_detect_ip_disabled_without_url() {
        let server = MockServer::start();
        assert_eq!(client_for(&server).detect_ip().await, None);
    }
}
