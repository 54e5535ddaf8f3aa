//! Authentication payloads for the sign-up and login endpoints.
//!
//! Request types own the plaintext password only for as long as the
//! request lives; it is wiped from memory on drop.

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Identifier of an authenticated user, as issued by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps a server-issued user identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-issued identifier used to scope every task call.
    pub id: UserId,
    /// Account email address.
    pub email: String,
    /// Display name.
    pub name: String,
}

/// Body of `POST /api/auth/signup`.
#[derive(Clone, Serialize)]
pub struct SignUpRequest {
    /// Display name for the new account.
    pub name: String,
    /// Account email address.
    pub email: String,
    /// Plaintext password, wiped on drop.
    pub password: String,
}

impl Drop for SignUpRequest {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

impl std::fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /api/auth/login`.
#[derive(Clone, Serialize)]
pub struct SignInRequest {
    /// Account email address.
    pub email: String,
    /// Plaintext password, wiped on drop.
    pub password: String,
}

impl Drop for SignInRequest {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

impl std::fmt::Debug for SignInRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful response of both auth endpoints.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for subsequent task calls.
    pub access_token: String,
    /// Token scheme, usually `bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Identifier of the authenticated user.
    pub user_id: UserId,
    /// Account email address.
    pub email: String,
    /// Display name.
    pub name: String,
}

impl AuthResponse {
    /// Splits the response into the user identity and the bearer token.
    #[must_use]
    pub fn into_parts(self) -> (User, String) {
        let user = User {
            id: self.user_id,
            email: self.email,
            name: self.name,
        };
        (user, self.access_token)
    }
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("access_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
