//! Shared authentication session.
//!
//! A [`SessionHandle`] is constructed once at startup and injected into
//! every component that needs the current identity. Clones share the same
//! underlying [`Session`].

use std::sync::Arc;

use parking_lot::RwLock;
use zeroize::Zeroize;

use taskdeck_proto::auth::{User, UserId};

/// Current authentication state.
#[derive(Debug, Default)]
pub struct Session {
    /// Signed-in user, `None` when signed out.
    pub user: Option<User>,
    /// Bearer token for the signed-in user.
    token: Option<String>,
    /// True while credentials are being restored at startup.
    pub auth_loading: bool,
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(token) = self.token.as_mut() {
            token.zeroize();
        }
    }
}

/// Cloneable handle to the process-wide [`Session`].
///
/// Guards are never held across an `.await`; every accessor copies the
/// value out.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Session>>,
}

impl SessionHandle {
    /// Creates a signed-out session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session already signed in as `user`.
    #[must_use]
    pub fn signed_in(user: User, token: impl Into<String>) -> Self {
        let handle = Self::new();
        handle.establish(user, token.into());
        handle
    }

    /// Id of the signed-in user, if any.
    #[must_use]
    pub fn current_user_id(&self) -> Option<UserId> {
        self.inner.read().user.as_ref().map(|u| u.id.clone())
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.inner.read().user.clone()
    }

    /// Bearer token of the signed-in user, if any.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner.read().token.clone()
    }

    /// Whether a user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.read().user.is_some()
    }

    /// Whether stored credentials are still being restored.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.read().auth_loading
    }

    /// Marks the start or end of credential restoration.
    pub fn set_loading(&self, loading: bool) {
        self.inner.write().auth_loading = loading;
    }

    /// Records a successful sign-in.
    pub fn establish(&self, user: User, token: String) {
        let mut session = self.inner.write();
        if let Some(old) = session.token.as_mut() {
            old.zeroize();
        }
        tracing::debug!(user_id = %user.id, "session established");
        session.user = Some(user);
        session.token = Some(token);
    }

    /// Signs out, wiping the token.
    pub fn clear(&self) {
        let mut session = self.inner.write();
        if let Some(token) = session.token.as_mut() {
            token.zeroize();
        }
        session.token = None;
        session.user = None;
        tracing::debug!("session cleared");
    }
}
