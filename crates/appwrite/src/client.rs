// Appwrite REST client
//
// Implements IdentityProvider and ProfileStore against the Appwrite HTTP API.
// Server-key requests carry `X-Appwrite-Key`; session-scoped requests carry the
// caller's secret in `X-Appwrite-Session`. The client itself holds no per-user
// state, so one instance serves every request.

use async_trait::async_trait;
use atelier_core::error::ProviderError;
use atelier_core::oauth::OAuthProvider;
use atelier_core::provider::{IdentityProvider, ProfileStore, ProviderResult};
use atelier_core::user::{Profile, SubscriptionUpdate, User};
use atelier_core::Session;
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::AppwriteConfig;
use crate::types::{
    AppwriteErrorBody, AppwriteSession, AppwriteUser, CreateAccountRequest, DocumentPatch,
    EmailSessionRequest, ProfileDocument, RecoveryRequest, SubscriptionPatch, TokenSessionRequest,
};

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const KEY_HEADER: &str = "X-Appwrite-Key";
const SESSION_HEADER: &str = "X-Appwrite-Session";

/// Appwrite generates the id when given this placeholder.
const UNIQUE_ID: &str = "unique()";

pub struct AppwriteClient {
    config: AppwriteConfig,
    http: reqwest::Client,
}

impl AppwriteClient {
    pub fn new(config: AppwriteConfig) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::unexpected(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header(PROJECT_HEADER, &self.config.project_id)
    }

    /// Request authorized by the server key
    fn admin(&self, method: Method, path: &str) -> RequestBuilder {
        self.request(method, path)
            .header(KEY_HEADER, self.config.api_key.expose_secret())
    }

    /// Request acting as the owner of a session
    fn as_session(&self, method: Method, path: &str, secret: &SecretString) -> RequestBuilder {
        self.request(method, path)
            .header(SESSION_HEADER, secret.expose_secret())
    }

    fn document_path(&self, document_id: &str) -> String {
        format!(
            "/databases/{}/collections/{}/documents/{}",
            self.config.database_id, self.config.profiles_collection, document_id
        )
    }

    async fn send(&self, request: RequestBuilder) -> ProviderResult<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "Appwrite request failed");
            ProviderError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<AppwriteErrorBody>(&body).ok();
        let message = parsed
            .as_ref()
            .map(|b| b.message.clone())
            .unwrap_or_default();

        if status.is_client_error() {
            tracing::debug!(
                status = status.as_u16(),
                error_type = parsed.as_ref().map(|b| b.error_type.as_str()).unwrap_or(""),
                "Appwrite rejected request"
            );
            return Err(ProviderError::rejected(status.as_u16(), message));
        }

        tracing::error!(status = status.as_u16(), body = %body, "Appwrite server error");
        Err(ProviderError::unexpected(format!(
            "status {}: {}",
            status.as_u16(),
            message
        )))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ProviderResult<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::unexpected(format!("failed to decode response: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for AppwriteClient {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> ProviderResult<User> {
        let request = self
            .admin(Method::POST, "/account")
            .json(&CreateAccountRequest {
                user_id: UNIQUE_ID,
                email,
                password,
                name,
            });
        let user: AppwriteUser = self.send_json(request).await?;
        Ok(user.into())
    }

    async fn create_password_session(
        &self,
        email: &str,
        password: &str,
    ) -> ProviderResult<Session> {
        let request = self
            .admin(Method::POST, "/account/sessions/email")
            .json(&EmailSessionRequest { email, password });
        let session: AppwriteSession = self.send_json(request).await?;
        session.into_session(None)
    }

    async fn create_token_session(&self, user_id: &str, secret: &str) -> ProviderResult<Session> {
        let request = self
            .admin(Method::POST, "/account/sessions/token")
            .json(&TokenSessionRequest { user_id, secret });
        let session: AppwriteSession = self.send_json(request).await?;
        session.into_session(None)
    }

    async fn get_account(&self, secret: &SecretString) -> ProviderResult<User> {
        let request = self.as_session(Method::GET, "/account", secret);
        let user: AppwriteUser = self.send_json(request).await?;
        Ok(user.into())
    }

    async fn get_current_session(&self, secret: &SecretString) -> ProviderResult<Session> {
        let request = self.as_session(Method::GET, "/account/sessions/current", secret);
        let session: AppwriteSession = self.send_json(request).await?;
        session.into_session(Some(secret))
    }

    async fn delete_session(
        &self,
        secret: Option<&SecretString>,
        session_id: &str,
    ) -> ProviderResult<()> {
        let path = format!("/account/sessions/{}", session_id);
        let request = match secret {
            Some(secret) => self.as_session(Method::DELETE, &path, secret),
            None => self.request(Method::DELETE, &path),
        };
        self.send(request).await?;
        Ok(())
    }

    async fn create_recovery(&self, email: &str, url: &str) -> ProviderResult<()> {
        let request = self
            .admin(Method::POST, "/account/recovery")
            .json(&RecoveryRequest { email, url });
        self.send(request).await?;
        Ok(())
    }

    fn oauth2_authorization_url(
        &self,
        provider: OAuthProvider,
        success_url: &str,
        failure_url: &str,
        scopes: &[&str],
    ) -> ProviderResult<String> {
        let mut url = Url::parse(&self.url(&format!(
            "/account/tokens/oauth2/{}",
            provider.as_str()
        )))
        .map_err(|e| ProviderError::unexpected(format!("invalid OAuth URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("project", &self.config.project_id);
            query.append_pair("success", success_url);
            query.append_pair("failure", failure_url);
            for scope in scopes {
                query.append_pair("scopes[]", scope);
            }
        }
        Ok(url.to_string())
    }
}

#[async_trait]
impl ProfileStore for AppwriteClient {
    async fn get_profile(&self, user_id: &str) -> ProviderResult<Option<Profile>> {
        let request = self.admin(Method::GET, &self.document_path(user_id));
        match self.send_json::<ProfileDocument>(request).await {
            Ok(doc) => Ok(Some(doc.into())),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update_subscription(
        &self,
        user_id: &str,
        update: &SubscriptionUpdate,
    ) -> ProviderResult<()> {
        let request = self
            .admin(Method::PATCH, &self.document_path(user_id))
            .json(&DocumentPatch {
                data: SubscriptionPatch {
                    subscription_tier: update.tier.clone(),
                    subscription_end_date: update.end_date.map(|d| d.to_rfc3339()),
                },
            });
        self.send(request).await?;
        tracing::info!(user_id = %user_id, tier = %update.tier, "Subscription updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> AppwriteClient {
        let config = AppwriteConfig::new(
            format!("{}/v1", server.uri()),
            "atelier",
            SecretString::from("server-key".to_string()),
            "main",
        );
        AppwriteClient::new(config).unwrap()
    }

    fn session_json(secret: &str) -> serde_json::Value {
        json!({
            "$id": "sess_1",
            "userId": "u1",
            "expire": "2026-11-18T10:00:00.000+00:00",
            "provider": "email",
            "secret": secret
        })
    }

    #[tokio::test]
    async fn test_password_session_uses_server_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/account/sessions/email"))
            .and(header("X-Appwrite-Project", "atelier"))
            .and(header("X-Appwrite-Key", "server-key"))
            .and(body_json(json!({"email": "a@b.com", "password": "pw123456"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(session_json("s3cr3t")))
            .expect(1)
            .mount(&server)
            .await;

        let session = client(&server)
            .create_password_session("a@b.com", "pw123456")
            .await
            .unwrap();
        assert_eq!(session.id, "sess_1");
        assert_eq!(session.secret.expose_secret(), "s3cr3t");
        assert_eq!(
            session.expires_at,
            Utc.with_ymd_and_hms(2026, 11, 18, 10, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_rejection_carries_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/account/sessions/email"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "Invalid credentials. Please check the email and password.",
                "code": 401,
                "type": "user_invalid_credentials"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .create_password_session("a@b.com", "wrong")
            .await
            .unwrap_err();
        match err {
            ProviderError::Rejected { status, message } => {
                assert_eq!(status, 401);
                assert!(message.starts_with("Invalid credentials"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_errors_are_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/account"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let secret = SecretString::from("s".to_string());
        let err = client(&server).get_account(&secret).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unexpected(_)));
    }

    #[tokio::test]
    async fn test_get_account_sends_session_secret() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/account"))
            .and(header("X-Appwrite-Session", "s3cr3t"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "$id": "u1",
                "name": "Ada",
                "email": "ada@example.com",
                "emailVerification": true,
                "prefs": {}
            })))
            .mount(&server)
            .await;

        let secret = SecretString::from("s3cr3t".to_string());
        let user = client(&server).get_account(&secret).await.unwrap();
        assert_eq!(user.id, "u1");
        assert!(user.email_verification);
    }

    #[tokio::test]
    async fn test_current_session_keeps_presented_secret() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/account/sessions/current"))
            .and(header("X-Appwrite-Session", "s3cr3t"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json("")))
            .mount(&server)
            .await;

        let secret = SecretString::from("s3cr3t".to_string());
        let session = client(&server).get_current_session(&secret).await.unwrap();
        assert_eq!(session.secret.expose_secret(), "s3cr3t");
    }

    #[tokio::test]
    async fn test_delete_session_targets_one_id() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/account/sessions/sess_1"))
            .and(header("X-Appwrite-Session", "s3cr3t"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let secret = SecretString::from("s3cr3t".to_string());
        client(&server)
            .delete_session(Some(&secret), "sess_1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_account_requests_generated_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/account"))
            .and(body_json(json!({
                "userId": "unique()",
                "email": "new@example.com",
                "password": "long-enough",
                "name": "New"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "$id": "u2",
                "name": "New",
                "email": "new@example.com",
                "emailVerification": false
            })))
            .mount(&server)
            .await;

        let user = client(&server)
            .create_account("new@example.com", "long-enough", "New")
            .await
            .unwrap();
        assert_eq!(user.id, "u2");
        assert!(user.prefs.is_object());
    }

    #[tokio::test]
    async fn test_missing_profile_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/databases/main/collections/profiles/documents/u1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Document with the requested ID could not be found.",
                "code": 404,
                "type": "document_not_found"
            })))
            .mount(&server)
            .await;

        assert!(client(&server).get_profile("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_subscription_patches_document() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v1/databases/main/collections/profiles/documents/u1"))
            .and(header("X-Appwrite-Key", "server-key"))
            .and(body_json(json!({
                "data": {
                    "subscriptionTier": "premium",
                    "subscriptionEndDate": "2026-01-01T00:00:00+00:00"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"$id": "u1"})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .update_subscription(
                "u1",
                &SubscriptionUpdate {
                    tier: "premium".into(),
                    end_date: Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_oauth_url() {
        let server = MockServer::start().await;
        let url = client(&server)
            .oauth2_authorization_url(
                OAuthProvider::Google,
                "http://localhost:3000/oauth",
                "http://localhost:3000/login",
                OAuthProvider::Google.scopes(),
            )
            .unwrap();

        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.path(), "/v1/account/tokens/oauth2/google");
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("project".into(), "atelier".into())));
        assert!(pairs.contains(&("success".into(), "http://localhost:3000/oauth".into())));
        assert!(pairs.contains(&("scopes[]".into(), "profile".into())));
    }
}
