//! Authentication endpoints.

use std::future::Future;

use reqwest::Method;
use url::Url;

use taskdeck_proto::auth::{AuthResponse, SignInRequest, SignUpRequest, User};

use crate::api::ApiError;
use crate::api::http::{HttpSettings, decode_json, endpoint, execute};

/// Async interface of the sign-up and login endpoints.
pub trait AuthApi: Send + Sync {
    /// Register a new account and sign in as it.
    fn sign_up(
        &self,
        request: &SignUpRequest,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    /// Sign in with email and password.
    fn sign_in(
        &self,
        request: &SignInRequest,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;
}

/// [`AuthApi`] over the REST backend (`/api/auth/signup`, `/api/auth/login`).
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    http: reqwest::Client,
    base: Url,
}

impl HttpAuthApi {
    /// Creates a client rooted at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the HTTP client cannot be built.
    pub fn new(base: Url, settings: HttpSettings) -> Result<Self, ApiError> {
        Ok(Self {
            http: settings.build_client()?,
            base,
        })
    }
}

/// The backend reports an existing account as a plain 400 or 422 rejection.
fn duplicate_account(err: ApiError) -> ApiError {
    match err {
        ApiError::Validation { status, message }
            if message.to_ascii_lowercase().contains("exists") =>
        {
            tracing::debug!(status, "sign-up rejected for existing account");
            ApiError::Conflict(message)
        }
        other => other,
    }
}

impl AuthApi for HttpAuthApi {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthResponse, ApiError> {
        let url = endpoint(&self.base, &["api", "auth", "signup"])?;
        tracing::debug!(%url, email = %request.email, "signing up");
        let response = execute(self.http.request(Method::POST, url).json(request))
            .await
            .map_err(duplicate_account)?;
        decode_json(response).await
    }

    async fn sign_in(&self, request: &SignInRequest) -> Result<AuthResponse, ApiError> {
        let url = endpoint(&self.base, &["api", "auth", "login"])?;
        tracing::debug!(%url, email = %request.email, "signing in");
        let response = execute(self.http.request(Method::POST, url).json(request)).await?;
        decode_json(response).await
    }
}

/// [`AuthApi`] for `--offline` mode: accepts any credentials and signs in
/// as a fixed local user.
#[derive(Debug, Clone)]
pub struct OfflineAuthApi {
    user: User,
}

impl OfflineAuthApi {
    /// Signs every request in as `user`.
    #[must_use]
    pub const fn new(user: User) -> Self {
        Self { user }
    }

    fn respond(&self, email: &str, name: Option<&str>) -> AuthResponse {
        AuthResponse {
            access_token: "offline".to_string(),
            token_type: Some("bearer".to_string()),
            user_id: self.user.id.clone(),
            email: email.to_string(),
            name: name.unwrap_or(&self.user.name).to_string(),
        }
    }
}

impl AuthApi for OfflineAuthApi {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthResponse, ApiError> {
        Ok(self.respond(&request.email, Some(&request.name)))
    }

    async fn sign_in(&self, request: &SignInRequest) -> Result<AuthResponse, ApiError> {
        Ok(self.respond(&request.email, None))
    }
}
