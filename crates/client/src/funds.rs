//! Admin fund transfers and the fund-request queue.

use paydesk_core::UserId;
use serde_json::json;

use crate::client::AdminClient;
use crate::error::ApiError;
use crate::types::{
    AdminFundTransaction, BeneficiaryInfo, DataEnvelope, FundRequest, FundRequestFilter,
    FundRequestStatus, FundRequestUpdate, Page, RawUserInfo, TransactionType, TransferRequest,
};

/// Rows shown in the recent-transfers table.
pub const RECENT_TRANSFERS_LIMIT: usize = 10;

const ERROR_TITLE: &str = "Error Occured";

impl AdminClient {
    /// Look up the user a transfer is about to be sent to.
    pub async fn verify_beneficiary(&self, user_id: &UserId) -> Result<BeneficiaryInfo, ApiError> {
        let path = format!("/api/admin/user/info/{user_id}");
        let result = self
            .backend
            .send_json::<DataEnvelope<RawUserInfo>>(self.backend.post(&path))
            .await
            .map(|envelope| BeneficiaryInfo::from(envelope.data));
        self.report(result, None, Some("Error while fetching user info"), "User not found!")
    }

    /// Credit (or reverse) funds on a user's wallet.
    pub async fn transfer_funds(&self, request: &TransferRequest) -> Result<(), ApiError> {
        let result = match validate_transfer(request) {
            Ok(()) => {
                tracing::info!(
                    beneficiary = %request.beneficiary_id,
                    amount = %request.amount,
                    kind = ?request.transaction_type,
                    "submitting fund transfer"
                );
                self.backend.post_unit("/api/admin/new-fund", request).await
            }
            Err(err) => Err(err),
        };
        self.report(
            result,
            Some("Transaction successful!"),
            Some(ERROR_TITLE),
            "Could not complete the transaction",
        )
    }

    /// The admin's latest transfers, newest first as the backend orders them.
    pub async fn recent_admin_funds(&self) -> Result<Vec<AdminFundTransaction>, ApiError> {
        let result = self
            .backend
            .get_json::<DataEnvelope<Vec<AdminFundTransaction>>>("/api/admin/fetch-admin-funds")
            .await
            .map(|envelope| {
                let mut rows = envelope.data;
                rows.truncate(RECENT_TRANSFERS_LIMIT);
                rows
            });
        self.report(result, None, None, "Could not fetch transactions")
    }

    /// One page of fund requests. `page_link` (a URL from a previous page)
    /// takes precedence over the filter.
    pub async fn list_fund_requests(
        &self,
        filter: &FundRequestFilter,
        page_link: Option<&str>,
    ) -> Result<Page<FundRequest>, ApiError> {
        let result = match page_link {
            Some(link) => self.backend.get_json(link).await,
            None => match validate_range(filter) {
                Ok(()) => {
                    let path = match &filter.user_id {
                        Some(user_id) => format!("/api/admin/fetch-admin-funds/{user_id}"),
                        None => "/api/admin/fetch-admin-funds".to_string(),
                    };
                    let from = filter.from.map(|d| d.to_string()).unwrap_or_default();
                    let to = filter.to.map(|d| d.to_string()).unwrap_or_default();
                    let req = self.backend.get(&path).query(&[("from", from), ("to", to)]);
                    self.backend.send_json(req).await
                }
                Err(err) => Err(err),
            },
        };
        self.report(result, None, Some(ERROR_TITLE), "Could not fetch fund requests")
    }

    pub async fn approve_fund_request(&self, request: &FundRequest) -> Result<(), ApiError> {
        let update = FundRequestUpdate {
            id: Some(&request.id),
            beneficiary_id: &request.user_id,
            status: FundRequestStatus::Approved,
            amount: request.wire_amount.clone(),
            remarks: None,
        };
        tracing::info!(fund_request = %request.id, user_id = %request.user_id, "approving fund request");
        let result = self
            .backend
            .post_unit("/api/admin/update-fund-requests", &update)
            .await;
        self.report(result, Some("Status Updated"), Some(ERROR_TITLE), "Could not update the request")
    }

    /// Decline a request. The admin's remarks are required and sent along.
    pub async fn decline_fund_request(
        &self,
        request: &FundRequest,
        admin_remarks: &str,
    ) -> Result<(), ApiError> {
        let result = if admin_remarks.trim().is_empty() {
            Err(ApiError::validation("Please add remarks also"))
        } else {
            let update = FundRequestUpdate {
                id: Some(&request.id),
                beneficiary_id: &request.user_id,
                status: FundRequestStatus::Declined,
                amount: json!(0),
                remarks: Some(admin_remarks),
            };
            tracing::info!(fund_request = %request.id, user_id = %request.user_id, "declining fund request");
            self.backend
                .post_unit("/api/admin/update-fund-requests", &update)
                .await
        };
        self.report(result, Some("Status Updated"), Some(ERROR_TITLE), "Could not update the request")
    }

    pub async fn delete_fund_request(&self, request: &FundRequest) -> Result<(), ApiError> {
        tracing::info!(fund_request = %request.id, "deleting fund request");
        let result = self
            .backend
            .post_unit("/api/admin/delete-fund", &json!({ "fundId": request.id }))
            .await;
        self.report(result, Some("Request Deleted"), Some(ERROR_TITLE), "Could not delete the request")
    }
}

fn validate_transfer(request: &TransferRequest) -> Result<(), ApiError> {
    if request.amount.is_zero() {
        return Err(ApiError::validation("Amount must be greater than zero"));
    }
    if request.transaction_type == TransactionType::Reversal && request.remarks.trim().is_empty() {
        return Err(ApiError::validation("Remarks are mandatory"));
    }
    Ok(())
}

fn validate_range(filter: &FundRequestFilter) -> Result<(), ApiError> {
    match (filter.from, filter.to) {
        (Some(from), Some(to)) if from > to => Err(ApiError::validation(format!(
            "'From' date {from} is after 'To' date {to}"
        ))),
        _ => Ok(()),
    }
}
