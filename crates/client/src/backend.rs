//! The permission service seam used by the permission panel.

use async_trait::async_trait;
use paydesk_core::{RecordId, UserId};
use paydesk_permissions::PermissionToken;
use serde::{Deserialize, Serialize};

use crate::client::AdminClient;
use crate::error::ApiError;

/// A user's stored permission document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PermissionRecord {
    #[serde(rename = "_id")]
    pub record_id: RecordId,
    #[serde(default)]
    pub allowed_pages: Vec<PermissionToken>,
}

#[async_trait]
pub trait PermissionBackend: Send + Sync {
    /// Fetch the user's permission record. `ApiError::NotFound` when the user
    /// has none yet.
    async fn fetch_permissions(&self, user_id: &UserId) -> Result<PermissionRecord, ApiError>;

    /// Replace the user's stored list wholesale.
    async fn update_permissions(
        &self,
        user_id: &UserId,
        allowed_pages: &[PermissionToken],
    ) -> Result<(), ApiError>;
}

#[derive(Serialize)]
struct FetchBody<'a> {
    user_id: &'a UserId,
}

#[derive(Serialize)]
struct UpdateBody<'a> {
    allowed_pages: &'a [PermissionToken],
    user_id: &'a UserId,
}

#[async_trait]
impl PermissionBackend for AdminClient {
    async fn fetch_permissions(&self, user_id: &UserId) -> Result<PermissionRecord, ApiError> {
        let records: Vec<PermissionRecord> = self
            .permissions
            .post_json("/api/user/fetch", &FetchBody { user_id })
            .await?;
        records.into_iter().next().ok_or(ApiError::NotFound)
    }

    async fn update_permissions(
        &self,
        user_id: &UserId,
        allowed_pages: &[PermissionToken],
    ) -> Result<(), ApiError> {
        self.permissions
            .post_unit(
                "/api/user/update-permissions",
                &UpdateBody {
                    allowed_pages,
                    user_id,
                },
            )
            .await
    }
}

#[async_trait]
impl<B> PermissionBackend for std::sync::Arc<B>
where
    B: PermissionBackend + ?Sized,
{
    async fn fetch_permissions(&self, user_id: &UserId) -> Result<PermissionRecord, ApiError> {
        (**self).fetch_permissions(user_id).await
    }

    async fn update_permissions(
        &self,
        user_id: &UserId,
        allowed_pages: &[PermissionToken],
    ) -> Result<(), ApiError> {
        (**self).update_permissions(user_id, allowed_pages).await
    }
}
