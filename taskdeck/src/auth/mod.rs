//! Session and identity provider.
//!
//! [`AuthProvider`] owns the authentication lifecycle: restore persisted
//! credentials at startup, sign in or sign up against the API, and sign
//! out. The resulting identity lives in a [`SessionHandle`] that the task
//! layer reads from.

pub mod client;
pub mod session;
pub mod store;

pub use client::{AuthApi, HttpAuthApi, OfflineAuthApi};
pub use session::{Session, SessionHandle};
pub use store::{CredentialStore, StoreError, StoredCredentials};

use taskdeck_proto::auth::{AuthResponse, SignInRequest, SignUpRequest, User};

use crate::api::ApiError;

/// Errors surfaced by sign-in and sign-up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Login was rejected or could not complete.
    #[error("sign-in failed: {0}")]
    SignIn(ApiError),
    /// Registration was rejected or could not complete.
    #[error("sign-up failed: {0}")]
    SignUp(ApiError),
}

impl AuthError {
    /// Short message suitable for showing on the auth screen.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::SignIn(ApiError::Unauthorized(_) | ApiError::Validation { .. }) => {
                "Invalid email or password"
            }
            Self::SignIn(_) => "Something went wrong. Please try again.",
            Self::SignUp(ApiError::Conflict(_)) => "User already exists. Please sign in instead.",
            Self::SignUp(_) => "Failed to create account. Please try again.",
        }
    }

    /// The underlying API failure.
    #[must_use]
    pub const fn api_error(&self) -> &ApiError {
        match self {
            Self::SignIn(e) | Self::SignUp(e) => e,
        }
    }
}

/// Drives sign-in, sign-up, sign-out and credential restoration.
pub struct AuthProvider<A: AuthApi> {
    api: A,
    store: CredentialStore,
    session: SessionHandle,
}

impl<A: AuthApi> AuthProvider<A> {
    /// Creates a provider that publishes identity changes to `session`.
    pub const fn new(api: A, store: CredentialStore, session: SessionHandle) -> Self {
        Self {
            api,
            store,
            session,
        }
    }

    /// The session this provider maintains.
    #[must_use]
    pub const fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Restores a previous sign-in from the credential store.
    ///
    /// The session is only established when both the user and the token
    /// are present. Unreadable or corrupt credentials leave the session
    /// signed out.
    pub fn hydrate(&self) -> Option<User> {
        self.session.set_loading(true);
        let restored = match self.store.load() {
            Ok(Some(creds)) if !creds.token.is_empty() => {
                let user = creds.user.clone();
                self.session.establish(creds.user, creds.token);
                tracing::info!(user_id = %user.id, "restored saved session");
                Some(user)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable saved session");
                None
            }
        };
        self.session.set_loading(false);
        restored
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SignIn`] if the API rejects the credentials or
    /// cannot be reached. The session is left unchanged.
    pub async fn sign_in(&self, email: &str, password: String) -> Result<User, AuthError> {
        let request = SignInRequest {
            email: email.to_string(),
            password,
        };
        match self.api.sign_in(&request).await {
            Ok(response) => Ok(self.accept(response)),
            Err(e) => {
                tracing::warn!(error = %e, "sign-in failed");
                Err(AuthError::SignIn(e))
            }
        }
    }

    /// Creates an account and signs in as it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SignUp`] if registration is rejected or the API
    /// cannot be reached. The session is left unchanged.
    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: String,
    ) -> Result<User, AuthError> {
        let request = SignUpRequest {
            name: name.to_string(),
            email: email.to_string(),
            password,
        };
        match self.api.sign_up(&request).await {
            Ok(response) => Ok(self.accept(response)),
            Err(e) => {
                tracing::warn!(error = %e, "sign-up failed");
                Err(AuthError::SignUp(e))
            }
        }
    }

    /// Signs out and forgets the stored credentials.
    pub fn sign_out(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to remove saved session");
        }
        self.session.clear();
        tracing::info!("signed out");
    }

    fn accept(&self, response: AuthResponse) -> User {
        let (user, token) = response.into_parts();
        let creds = StoredCredentials {
            user: user.clone(),
            token: token.clone(),
        };
        if let Err(e) = self.store.save(&creds) {
            tracing::warn!(error = %e, "signed in but could not persist session");
        }
        self.session.establish(user.clone(), token);
        tracing::info!(user_id = %user.id, "signed in");
        user
    }
}
