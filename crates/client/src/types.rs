//! Request and response shapes of the admin backend.

use chrono::NaiveDate;
use paydesk_core::{Amount, FundRequestId, UserId};
use serde::{Deserialize, Deserializer, Serialize};

/// `{ "data": ... }` wrapper used by most admin endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Paginated listing as returned by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
    #[serde(default, deserialize_with = "flexible_u32")]
    pub current_page: u32,
    #[serde(default, deserialize_with = "flexible_u32")]
    pub last_page: u32,
    #[serde(default)]
    pub first_page_url: Option<String>,
    #[serde(default)]
    pub last_page_url: Option<String>,
    #[serde(default)]
    pub next_page_url: Option<String>,
    #[serde(default)]
    pub prev_page_url: Option<String>,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next_page_url.is_some()
    }

    pub fn has_prev(&self) -> bool {
        self.prev_page_url.is_some()
    }
}

/// Which user listing to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserTab {
    #[default]
    Retailer,
    Distributor,
}

impl UserTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserTab::Retailer => "retailer",
            UserTab::Distributor => "distributor",
        }
    }
}

/// One row of the user-management grid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub firm_name: Option<String>,
    #[serde(default)]
    pub wallet: Option<Amount>,
    #[serde(default)]
    pub minimum_balance: Option<Amount>,
    #[serde(default, deserialize_with = "flexible_flag")]
    pub is_active: bool,
    #[serde(default)]
    pub delete_remarks: Option<String>,
    #[serde(default)]
    pub pan_photo: Option<String>,
    #[serde(default, alias = "aadhar_front")]
    pub aadhaar_front: Option<String>,
    #[serde(default, alias = "aadhar_back")]
    pub aadhaar_back: Option<String>,
}

impl UserSummary {
    pub fn full_name(&self) -> String {
        join_name(self.first_name.as_deref(), self.last_name.as_deref())
    }

    /// Storage address of a KYC document, if the user uploaded one.
    pub fn document_address(&self, kind: KycDocument) -> Option<&str> {
        let address = match kind {
            KycDocument::PanCard => self.pan_photo.as_deref(),
            KycDocument::AadhaarFront => self.aadhaar_front.as_deref(),
            KycDocument::AadhaarBack => self.aadhaar_back.as_deref(),
        };
        address.filter(|a| !a.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KycDocument {
    PanCard,
    AadhaarFront,
    AadhaarBack,
}

impl KycDocument {
    pub fn file_name(&self) -> &'static str {
        match self {
            KycDocument::PanCard => "PAN.jpeg",
            KycDocument::AadhaarFront => "AadhaarFront.jpeg",
            KycDocument::AadhaarBack => "AadhaarBack.jpeg",
        }
    }
}

/// A downloaded KYC file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KycFile {
    pub file_name: &'static str,
    pub bytes: Vec<u8>,
}

/// Beneficiary details shown before a transfer is confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct BeneficiaryInfo {
    pub id: UserId,
    pub name: String,
    pub firm_name: Option<String>,
    pub phone: Option<String>,
    pub wallet: Option<Amount>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawUserInfo {
    pub id: UserId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub firm_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub wallet: Option<Amount>,
}

impl From<RawUserInfo> for BeneficiaryInfo {
    fn from(raw: RawUserInfo) -> Self {
        Self {
            name: join_name(raw.first_name.as_deref(), raw.last_name.as_deref()),
            id: raw.id,
            firm_name: raw.firm_name,
            phone: raw.phone_number,
            wallet: raw.wallet,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[default]
    Transfer,
    Reversal,
}

/// Admin → user wallet transfer (or reversal).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub beneficiary_id: UserId,
    pub amount: Amount,
    pub transaction_type: TransactionType,
    pub remarks: String,
    pub mpin: String,
}

/// A row of the admin's own fund-transfer history.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdminFundTransaction {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FundRequestStatus {
    Pending,
    Approved,
    Declined,
    Deleted,
    #[serde(other)]
    Unknown,
}

/// A user's request for wallet funds awaiting admin action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawFundRequest")]
pub struct FundRequest {
    pub id: FundRequestId,
    pub user_id: UserId,
    pub amount: Amount,
    pub status: FundRequestStatus,
    pub admin_remarks: Option<String>,
    pub transaction_id: Option<String>,
    pub created_at: Option<String>,
    /// `amount` exactly as the backend sent it; approvals echo it back.
    pub(crate) wire_amount: serde_json::Value,
}

impl FundRequest {
    pub fn is_pending(&self) -> bool {
        self.status == FundRequestStatus::Pending
    }
}

#[derive(Deserialize)]
struct RawFundRequest {
    id: FundRequestId,
    user_id: UserId,
    amount: serde_json::Value,
    status: FundRequestStatus,
    #[serde(default)]
    admin_remarks: Option<String>,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl TryFrom<RawFundRequest> for FundRequest {
    type Error = String;

    fn try_from(raw: RawFundRequest) -> Result<Self, Self::Error> {
        let amount = Amount::deserialize(&raw.amount)
            .map_err(|e| format!("invalid fund request amount: {e}"))?;
        Ok(Self {
            id: raw.id,
            user_id: raw.user_id,
            amount,
            status: raw.status,
            admin_remarks: raw.admin_remarks,
            transaction_id: raw.transaction_id,
            created_at: raw.created_at,
            wire_amount: raw.amount,
        })
    }
}

/// Filters of the fund-request queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundRequestFilter {
    pub user_id: Option<UserId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FundRequestUpdate<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a FundRequestId>,
    pub beneficiary_id: &'a UserId,
    pub status: FundRequestStatus,
    pub amount: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<&'a str>,
}

fn join_name(first: Option<&str>, last: Option<&str>) -> String {
    [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Accepts `true`/`false`, `1`/`0` and `"1"`/`"0"`.
fn flexible_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => false,
        Some(Raw::Bool(b)) => b,
        Some(Raw::Int(n)) => n != 0,
        Some(Raw::Text(s)) => matches!(s.trim(), "1" | "true"),
    })
}

/// Accepts page numbers sent either as numbers or numeric strings.
fn flexible_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u32),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Raw::Int(n)) => Ok(n),
        Some(Raw::Text(s)) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
