//! The admin API client.

use std::sync::Arc;

use anyhow::Context;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::notify::{Notification, NotificationStatus, Notifier};
use crate::session::Session;

/// Entry point for every backend call made by the console.
///
/// Cheap to clone; clones share the connection pool, session and notifier.
#[derive(Clone)]
pub struct AdminClient {
    pub(crate) backend: HttpClient,
    pub(crate) permissions: HttpClient,
    pub(crate) notifier: Arc<dyn Notifier>,
}

impl core::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminClient")
            .field("backend", &self.backend.base_url())
            .field("permissions", &self.permissions.base_url())
            .finish()
    }
}

impl AdminClient {
    /// Build a client around an existing session (shared with the host
    /// shell). The config token is ignored; the session carries credentials.
    pub fn new(
        config: &ClientConfig,
        session: Arc<Session>,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            backend: HttpClient::new(inner.clone(), config.backend_url.clone(), session.clone()),
            permissions: HttpClient::new(inner, config.client_url.clone(), session),
            notifier,
        })
    }

    /// Build a client with a fresh session seeded from the config token.
    pub fn from_config(config: &ClientConfig, notifier: Arc<dyn Notifier>) -> anyhow::Result<Self> {
        let session = Arc::new(Session::new(config.token.clone()));
        Self::new(config, session, notifier)
    }

    pub fn session(&self) -> &Arc<Session> {
        self.backend.session()
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Raise the toast for an operation's outcome and hand the result back.
    pub(crate) fn report<T>(
        &self,
        result: Result<T, ApiError>,
        success: Option<&str>,
        error_title: Option<&str>,
        fallback: &str,
    ) -> Result<T, ApiError> {
        match &result {
            Ok(_) => {
                if let Some(message) = success {
                    self.notifier.notify(Notification::success(message));
                }
            }
            Err(err) => {
                let mut n = Notification::from_error(err, fallback);
                if let (NotificationStatus::Error, Some(title)) = (n.status, error_title) {
                    n = n.with_title(title);
                }
                self.notifier.notify(n);
            }
        }
        result
    }
}
