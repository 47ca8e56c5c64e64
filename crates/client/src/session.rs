//! Admin session state and the authentication-expiry policy.
//!
//! Every backend call goes through [`crate::http::HttpClient`], which reports
//! a 401 here exactly once per call. Expiry clears the credentials and runs
//! the registered hook (the host shell uses it to drop its session cookie and
//! return to the login screen).

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Logged in; requests carry the bearer token (if any).
    Verified,
    /// The backend rejected the session; requests fail fast until renewed.
    Expired,
}

type ExpiryHook = Box<dyn Fn() + Send + Sync>;

pub struct Session {
    verified: AtomicBool,
    token: RwLock<Option<String>>,
    on_expired: Option<ExpiryHook>,
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("has_token", &self.token().is_some())
            .finish()
    }
}

impl Session {
    pub fn new(token: Option<String>) -> Self {
        Self {
            verified: AtomicBool::new(true),
            token: RwLock::new(token),
            on_expired: None,
        }
    }

    /// Register the hook run when the session expires.
    pub fn with_expiry_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_expired = Some(Box::new(hook));
        self
    }

    pub fn state(&self) -> SessionState {
        if self.verified.load(Ordering::SeqCst) {
            SessionState::Verified
        } else {
            SessionState::Expired
        }
    }

    pub fn is_expired(&self) -> bool {
        self.state() == SessionState::Expired
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    /// Fail fast once the session is gone.
    pub fn require_verified(&self) -> Result<(), ApiError> {
        if self.is_expired() {
            Err(ApiError::AuthExpired)
        } else {
            Ok(())
        }
    }

    /// Clear credentials and run the expiry hook. Only the first call after
    /// a renewal has any effect.
    pub fn expire(&self) {
        if !self.verified.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Ok(mut token) = self.token.write() {
            *token = None;
        }
        tracing::warn!("admin session expired; credentials cleared");
        if let Some(hook) = &self.on_expired {
            hook();
        }
    }

    /// Install fresh credentials after a new login.
    pub fn renew(&self, token: Option<String>) {
        if let Ok(mut current) = self.token.write() {
            *current = token;
        }
        self.verified.store(true, Ordering::SeqCst);
        tracing::info!("admin session renewed");
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(None)
    }
}
