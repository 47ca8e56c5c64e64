//! Client configuration (environment-driven).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use paydesk_permissions::{ClassificationMode, PermissionTree};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the admin backend (wallet, users, fund requests).
    pub backend_url: String,
    /// Base URL of the permission service.
    pub client_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    pub timeout: Duration,
    pub classification: ClassificationMode,
    /// JSON permission catalog; the builtin catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(backend_url: impl Into<String>) -> Self {
        let backend_url = backend_url.into();
        Self {
            client_url: backend_url.clone(),
            backend_url,
            token: None,
            timeout: DEFAULT_TIMEOUT,
            classification: ClassificationMode::default(),
            catalog_path: None,
        }
    }

    pub fn with_client_url(mut self, client_url: impl Into<String>) -> Self {
        self.client_url = client_url.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_classification(mut self, mode: ClassificationMode) -> Self {
        self.classification = mode;
        self
    }

    /// Read configuration from `PAYDESK_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend_url = get("PAYDESK_BACKEND_URL").unwrap_or_else(|| {
            tracing::info!("PAYDESK_BACKEND_URL not set; using {DEFAULT_BACKEND_URL}");
            DEFAULT_BACKEND_URL.to_string()
        });
        let mut config = Self::new(backend_url);

        if let Some(url) = get("PAYDESK_CLIENT_URL") {
            config.client_url = url;
        }
        config.token = get("PAYDESK_AUTH_TOKEN");

        if let Some(raw) = get("PAYDESK_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("PAYDESK_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"))?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = get("PAYDESK_CLASSIFICATION") {
            config.classification = raw
                .trim()
                .parse()
                .context("invalid PAYDESK_CLASSIFICATION")?;
        }
        config.catalog_path = get("PAYDESK_CATALOG").map(PathBuf::from);

        for (name, url) in [("backend", &config.backend_url), ("client", &config.client_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("{name} URL must start with http:// or https://, got {url:?}");
            }
        }

        Ok(config)
    }

    /// The permission catalog this configuration points at.
    pub fn load_catalog(&self) -> anyhow::Result<PermissionTree> {
        match &self.catalog_path {
            Some(path) => PermissionTree::load(path),
            None => Ok(PermissionTree::builtin()),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BACKEND_URL)
    }
}
