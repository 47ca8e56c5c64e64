//! User management: listings, account status, remarks, credentials and
//! KYC documents.

use paydesk_core::UserId;
use serde_json::json;

use crate::client::AdminClient;
use crate::error::ApiError;
use crate::types::{KycDocument, KycFile, Page, UserSummary, UserTab};

impl AdminClient {
    /// One page of retailers or distributors matching `search`.
    /// `page_link` (a URL from a previous page) takes precedence.
    pub async fn list_users(
        &self,
        tab: UserTab,
        search: &str,
        page_link: Option<&str>,
    ) -> Result<Page<UserSummary>, ApiError> {
        let req = match page_link {
            Some(link) => self.backend.get(link),
            None => self
                .backend
                .get(&format!("/api/admin/users-list/{}", tab.as_str()))
                .query(&[("search", search), ("page", "1")]),
        };
        let result = self.backend.send_json(req).await;
        self.report(result, None, None, "Could not fetch users")
    }

    /// Activate or block a user account.
    pub async fn change_user_status(&self, user_id: &UserId, active: bool) -> Result<(), ApiError> {
        let path = format!("/api/admin/user/status/{user_id}/{}", u8::from(active));
        tracing::info!(%user_id, active, "changing user status");
        let result = self
            .backend
            .send(self.backend.get(&path))
            .await
            .map(|_| ());
        self.report(result, None, None, "Could not change user status")
    }

    pub async fn save_remarks(&self, user_id: &UserId, remarks: &str) -> Result<(), ApiError> {
        let result = self
            .backend
            .post_unit(
                "/api/admin/user/remarks",
                &json!({ "userId": user_id, "remarks": remarks }),
            )
            .await;
        self.report(
            result,
            Some("Remarks Updated"),
            Some("Error while adding remarks"),
            "Could not save remarks",
        )
    }

    /// Clear a user's remarks. The backend expects a single space.
    pub async fn remove_remarks(&self, user_id: &UserId) -> Result<(), ApiError> {
        self.save_remarks(user_id, " ").await
    }

    /// Email a user their login credentials.
    pub async fn send_credentials(&self, email: &str, name: &str) -> Result<(), ApiError> {
        let result = if email.trim().is_empty() {
            Err(ApiError::validation("User has no email address"))
        } else {
            tracing::info!(email, "sending credentials");
            self.backend
                .post_unit("/admin-send-creds", &json!({ "email": email, "name": name }))
                .await
        };
        self.report(
            result,
            Some("Credentials Sent!"),
            Some("Error while sending credentials"),
            "Could not send credentials",
        )
    }

    /// Fetch one of the user's uploaded KYC files.
    pub async fn download_kyc_document(
        &self,
        user: &UserSummary,
        kind: KycDocument,
    ) -> Result<KycFile, ApiError> {
        let result = match user.document_address(kind) {
            Some(address) => self
                .backend
                .post_bytes("/api/admin/file", &json!({ "address": address }))
                .await
                .map(|bytes| KycFile {
                    file_name: kind.file_name(),
                    bytes,
                }),
            None => Err(ApiError::validation(format!(
                "{} has not uploaded {}",
                user.full_name(),
                kind.file_name()
            ))),
        };
        self.report(result, None, None, "Could not download the document")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ClientConfig;
    use crate::notify::RecordingNotifier;

    #[tokio::test]
    async fn missing_kyc_document_is_rejected_before_sending() {
        let notifier = Arc::new(RecordingNotifier::new());
        let client =
            AdminClient::from_config(&ClientConfig::new("http://127.0.0.1:9"), notifier.clone())
                .unwrap();
        let user: UserSummary = serde_json::from_value(json!({
            "id": 5,
            "first_name": "Ravi",
            "pan_photo": "kyc/5/pan.jpeg",
        }))
        .unwrap();

        let err = client
            .download_kyc_document(&user, KycDocument::AadhaarBack)
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::validation("Ravi has not uploaded AadhaarBack.jpeg"));
        assert_eq!(notifier.take().len(), 1);
    }

    #[tokio::test]
    async fn credentials_need_an_email() {
        let client = AdminClient::from_config(
            &ClientConfig::new("http://127.0.0.1:9"),
            Arc::new(RecordingNotifier::new()),
        )
        .unwrap();
        let err = client.send_credentials(" ", "Ravi").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
