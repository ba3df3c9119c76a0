//! Hosted auth backend speaking the GoTrue REST API.
//!
//! # Endpoints
//!
//! - `POST /auth/v1/signup` - register and (with auto-confirm) sign in
//! - `POST /auth/v1/token?grant_type=password` - sign in
//! - `POST /auth/v1/logout` - revoke the bearer token
//!
//! Every request carries the project's anon key in the `apikey` header.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use url::Url;

use pocket_store_core::{Email, UserId};

use super::{AuthError, AuthService, load_session, persist_session, remove_session, validate_password};
use crate::config::HostedAuthConfig;
use crate::models::{Session, User};
use crate::storage::KeyValueStore;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Session lifetime assumed when the backend omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Auth service backed by a hosted GoTrue-compatible API.
///
/// Sessions returned by the backend are persisted in the local store so
/// [`AuthService::get_session`] works offline.
#[derive(Clone)]
pub struct HostedAuthService {
    client: reqwest::Client,
    base_url: Url,
    store: Arc<dyn KeyValueStore>,
}

/// Successful token or auto-confirmed signup response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    user: Option<RemoteUser>,
    // Signup without auto-confirm returns the bare user object.
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    name: Option<String>,
}

/// Error body. Older servers use `error_description`, newer ones `msg`.
#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    error_code: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
}

impl ErrorResponse {
    fn text(&self) -> String {
        self.msg
            .as_deref()
            .or(self.error_description.as_deref())
            .or(self.message.as_deref())
            .unwrap_or("unknown error")
            .to_owned()
    }

    fn is_duplicate_user(&self) -> bool {
        self.error_code.as_deref() == Some("user_already_exists")
            || self.text().to_ascii_lowercase().contains("already registered")
    }
}

impl HostedAuthService {
    /// Create a client for the backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Backend` if the anon key is not a valid header
    /// value, or `AuthError::Http` if the HTTP client fails to build.
    pub fn new(config: &HostedAuthConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, AuthError> {
        let mut headers = HeaderMap::new();

        let api_key = HeaderValue::from_str(config.anon_key.expose_secret()).map_err(|e| {
            AuthError::Backend {
                status: 0,
                message: format!("invalid anon key: {e}"),
            }
        })?;
        headers.insert("apikey", api_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
            store,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    /// Map a token response onto a [`Session`], falling back to `email`
    /// when the backend omits the user's address.
    fn session_from(response: TokenResponse, email: &Email) -> Result<Session, AuthError> {
        let Some(token) = response.access_token else {
            return Err(AuthError::Backend {
                status: 200,
                message: "no session returned; email confirmation may be required".to_owned(),
            });
        };
        let remote = response.user.ok_or_else(|| AuthError::Backend {
            status: 200,
            message: "token response is missing the user".to_owned(),
        })?;

        let email = match remote.email.as_deref().map(Email::parse) {
            Some(Ok(parsed)) => parsed,
            _ => email.clone(),
        };
        let user = User {
            id: UserId::new(remote.id),
            email,
            name: remote.user_metadata.name,
        };
        let expires_in = response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let expires_at = TimeDelta::try_seconds(expires_in)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| AuthError::Backend {
                status: 200,
                message: format!("token response has out-of-range expires_in: {expires_in}"),
            })?;

        Ok(Session::new(user, SecretString::from(token), expires_at))
    }

    async fn read_error(response: reqwest::Response) -> (u16, ErrorResponse) {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let error = serde_json::from_str(&body).unwrap_or_else(|_| ErrorResponse {
            message: Some(body.chars().take(200).collect()),
            ..ErrorResponse::default()
        });
        (status, error)
    }
}

impl std::fmt::Debug for HostedAuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedAuthService")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthService for HostedAuthService {
    #[instrument(skip(self, password))]
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<Session, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let body = serde_json::json!({
            "email": email.as_str(),
            "password": password,
            "data": { "name": name },
        });
        let response = self
            .client
            .post(self.endpoint("/auth/v1/signup"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, error) = Self::read_error(response).await;
            if matches!(status, 400 | 422) && error.is_duplicate_user() {
                return Err(AuthError::UserAlreadyExists);
            }
            tracing::error!(status, message = %error.text(), "Hosted sign-up failed");
            return Err(AuthError::Backend {
                status,
                message: error.text(),
            });
        }

        let token: TokenResponse = response.json().await?;
        if token.access_token.is_none() && token.id.is_some() {
            info!("Sign-up accepted, awaiting email confirmation");
        }
        let session = Self::session_from(token, &email)?;
        persist_session(self.store.as_ref(), &session).await?;

        info!(user_id = %session.user.id, "User registered");
        Ok(session)
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let body = serde_json::json!({
            "email": email.as_str(),
            "password": password,
        });
        let response = self
            .client
            .post(self.endpoint("/auth/v1/token?grant_type=password"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, error) = Self::read_error(response).await;
            if status == 400 {
                return Err(AuthError::InvalidCredentials);
            }
            tracing::error!(status, message = %error.text(), "Hosted sign-in failed");
            return Err(AuthError::Backend {
                status,
                message: error.text(),
            });
        }

        let session = Self::session_from(response.json().await?, &email)?;
        persist_session(self.store.as_ref(), &session).await?;

        info!(user_id = %session.user.id, "User signed in");
        Ok(session)
    }

    /// Revokes the token remotely when possible, then always drops the
    /// local session. Remote failures are only logged.
    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(session) = load_session(self.store.as_ref(), Utc::now()).await? {
            let result = self
                .client
                .post(self.endpoint("/auth/v1/logout"))
                .bearer_auth(session.token.expose_secret())
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => warn!(status = %response.status(), "Remote logout rejected"),
                Err(e) => warn!(error = %e, "Remote logout failed"),
            }
        }

        remove_session(self.store.as_ref()).await
    }

    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        load_session(self.store.as_ref(), Utc::now()).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::storage::{MemoryStore, keys};

    const ANON_KEY: &str = "anon-test-key";

    fn service(server: &MockServer) -> (Arc<MemoryStore>, HostedAuthService) {
        let store = Arc::new(MemoryStore::new());
        let config = HostedAuthConfig {
            url: Url::parse(&server.base_url()).unwrap(),
            anon_key: SecretString::from(ANON_KEY),
        };
        let auth = HostedAuthService::new(&config, store.clone()).unwrap();
        (store, auth)
    }

    fn token_body(token: &str) -> serde_json::Value {
        json!({
            "access_token": token,
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r",
            "user": {
                "id": "9f1c2d3e-0000-4000-8000-000000000001",
                "email": "a@x.com",
                "user_metadata": { "name": "A" }
            }
        })
    }

    #[tokio::test]
    async fn test_sign_in_maps_token_response() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/v1/token")
                    .query_param("grant_type", "password")
                    .header("apikey", ANON_KEY)
                    .json_body(json!({"email": "a@x.com", "password": "secret1"}));
                then.status(200).json_body(token_body("tok-1"));
            })
            .await;

        let (store, auth) = service(&server);
        let session = auth.sign_in("a@x.com", "secret1").await.unwrap();

        mock.assert_async().await;
        assert_eq!(session.token.expose_secret(), "tok-1");
        assert_eq!(auth.get_session().await.unwrap(), Some(session.clone()));
        assert_eq!(session.user.name.as_deref(), Some("A"));
        assert!(session.expires_at > Utc::now() + chrono::Duration::minutes(59));
        assert!(store.get(keys::AUTH_SESSION).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_out_of_range_expiry_is_a_backend_error() {
        let server = MockServer::start_async().await;
        let mut body = token_body("tok-1");
        body["expires_in"] = json!(i64::MAX);
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/v1/token");
                then.status(200).json_body(body);
            })
            .await;

        let (store, auth) = service(&server);
        let result = auth.sign_in("a@x.com", "secret1").await;

        assert!(matches!(result, Err(AuthError::Backend { status: 200, .. })));
        assert!(store.get(keys::AUTH_SESSION).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bad_credentials_map_to_invalid_credentials() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/v1/token");
                then.status(400).json_body(json!({
                    "error": "invalid_grant",
                    "error_description": "Invalid login credentials"
                }));
            })
            .await;

        let (_, auth) = service(&server);
        assert!(matches!(
            auth.sign_in("a@x.com", "nope123").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_maps_to_user_already_exists() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/v1/signup");
                then.status(422).json_body(json!({
                    "code": 422,
                    "error_code": "user_already_exists",
                    "msg": "User already registered"
                }));
            })
            .await;

        let (_, auth) = service(&server);
        assert!(matches!(
            auth.sign_up("a@x.com", "secret1", Some("A")).await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_backend() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/v1/signup");
                then.status(500).body("boom");
            })
            .await;

        let (_, auth) = service(&server);
        let err = auth.sign_up("a@x.com", "secret1", None).await.unwrap_err();
        assert!(matches!(err, AuthError::Backend { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_unconfirmed_sign_up_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/v1/signup");
                then.status(200)
                    .json_body(json!({"id": "u-1", "email": "a@x.com"}));
            })
            .await;

        let (store, auth) = service(&server);
        let err = auth.sign_up("a@x.com", "secret1", None).await.unwrap_err();
        assert!(matches!(err, AuthError::Backend { status: 200, .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_sign_out_revokes_and_clears_even_when_remote_fails() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/v1/token");
                then.status(200).json_body(token_body("tok-2"));
            })
            .await;
        let logout = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/v1/logout")
                    .header("authorization", "Bearer tok-2");
                then.status(503);
            })
            .await;

        let (_, auth) = service(&server);
        auth.sign_in("a@x.com", "secret1").await.unwrap();
        auth.sign_out().await.unwrap();

        logout.assert_async().await;
        assert!(auth.get_session().await.unwrap().is_none());
    }
}
