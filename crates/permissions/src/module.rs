use core::str::FromStr;

use paydesk_core::DomainError;
use serde::{Deserialize, Serialize};

/// Logical grouping of permission tokens, one per product line of the
/// platform plus the basic pages and user management.
///
/// Variant order is the module traversal order used when flattening the
/// per-module selections for persistence.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModuleKey {
    Basic,
    Aeps,
    Bbps,
    Dmt,
    Payout,
    Cms,
    Recharge,
    Matm,
    Pan,
    Lic,
    Axis,
    Fastag,
    UserManagement,
}

impl ModuleKey {
    /// Every module, in traversal order.
    pub const ALL: [ModuleKey; 13] = [
        ModuleKey::Basic,
        ModuleKey::Aeps,
        ModuleKey::Bbps,
        ModuleKey::Dmt,
        ModuleKey::Payout,
        ModuleKey::Cms,
        ModuleKey::Recharge,
        ModuleKey::Matm,
        ModuleKey::Pan,
        ModuleKey::Lic,
        ModuleKey::Axis,
        ModuleKey::Fastag,
        ModuleKey::UserManagement,
    ];

    /// The keyword a token must contain to be sniffed into this module.
    pub fn keyword(&self) -> &'static str {
        match self {
            ModuleKey::Basic => "basic",
            ModuleKey::Aeps => "aeps",
            ModuleKey::Bbps => "bbps",
            ModuleKey::Dmt => "dmt",
            ModuleKey::Payout => "payout",
            ModuleKey::Cms => "cms",
            ModuleKey::Recharge => "recharge",
            ModuleKey::Matm => "matm",
            ModuleKey::Pan => "pan",
            ModuleKey::Lic => "lic",
            ModuleKey::Axis => "axis",
            ModuleKey::Fastag => "fastag",
            ModuleKey::UserManagement => "userManagement",
        }
    }

    /// Human-readable heading for the module's checkbox tree.
    pub fn label(&self) -> &'static str {
        match self {
            ModuleKey::Basic => "Basic",
            ModuleKey::Aeps => "AePS",
            ModuleKey::Bbps => "BBPS",
            ModuleKey::Dmt => "DMT",
            ModuleKey::Payout => "Payout",
            ModuleKey::Cms => "CMS",
            ModuleKey::Recharge => "Recharge",
            ModuleKey::Matm => "mATM",
            ModuleKey::Pan => "PAN",
            ModuleKey::Lic => "LIC",
            ModuleKey::Axis => "Axis",
            ModuleKey::Fastag => "Fastag",
            ModuleKey::UserManagement => "User Management",
        }
    }
}

impl core::fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for ModuleKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleKey::ALL
            .into_iter()
            .find(|m| m.keyword() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown module: {s:?}")))
    }
}
