use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Identifier of one grantable page/action (e.g. `"aeps.report"`).
///
/// Tokens are opaque strings. They are never normalized: comparison is
/// case-sensitive and whitespace is significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionToken(Cow<'static, str>);

impl PermissionToken {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PermissionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for PermissionToken {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PermissionToken {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for PermissionToken {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
