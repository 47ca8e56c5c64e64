//! Shared request/response handling for every backend call.

use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::session::Session;

/// A base URL bound to the shared `reqwest` client and admin session.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
}

impl HttpClient {
    pub fn new(inner: reqwest::Client, base_url: impl Into<String>, session: Arc<Session>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            inner,
            base_url,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Resolve a path against the base URL. Absolute URLs (pagination links
    /// handed out by the backend) are used unchanged.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.inner.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.inner.post(self.url(path))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(self.get(path)).await
    }

    /// Send a prepared request and decode its JSON body.
    pub async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let resp = self.send(req).await?;
        decode(resp).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.send(self.post(path).json(body)).await?;
        decode(resp).await
    }

    /// POST and ignore the response body.
    pub async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        self.send(self.post(path).json(body)).await.map(|_| ())
    }

    /// POST and return the raw response body (file downloads).
    pub async fn post_bytes<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Vec<u8>, ApiError> {
        let resp = self.send(self.post(path).json(body)).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    /// Send a request and map non-success statuses into [`ApiError`].
    ///
    /// A 401 expires the session here, so no call site has to.
    pub async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        self.session.require_verified()?;

        let req = match self.session.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        };

        let resp = req.send().await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let url = resp.url().to_string();
        match status {
            StatusCode::UNAUTHORIZED => {
                tracing::warn!(%url, "backend rejected the session");
                self.session.expire();
                Err(ApiError::AuthExpired)
            }
            StatusCode::NOT_FOUND => {
                tracing::debug!(%url, "backend returned 404");
                Err(ApiError::NotFound)
            }
            _ => {
                let body = resp.text().await.unwrap_or_default();
                let message = error_message(&body);
                tracing::warn!(%url, status = status.as_u16(), ?message, "backend call failed");
                Err(ApiError::Backend {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    Ok(resp.json::<T>().await?)
}

/// The backend's `message` field, or the raw body when it is not JSON.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => match map.get("message") {
            Some(serde_json::Value::String(m)) if !m.trim().is_empty() => Some(m.clone()),
            _ => Some(trimmed.to_string()),
        },
        Ok(serde_json::Value::String(s)) => Some(s),
        _ => Some(trimmed.to_string()),
    }
}
