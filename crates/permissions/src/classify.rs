//! Mapping permission tokens onto modules.

use core::str::FromStr;

use paydesk_core::DomainError;
use serde::{Deserialize, Serialize};

use crate::{ModuleKey, PermissionToken, PermissionTree};

/// True iff `token` contains `module_keyword` as a substring.
///
/// Case-sensitive, no trimming.
pub fn classify_token(token: &str, module_keyword: &str) -> bool {
    token.contains(module_keyword)
}

/// How a loaded token is assigned to module selections.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMode {
    /// Keyword sniffing: the token lands in every module whose keyword it
    /// contains, so an overlapping token is shown (and saved) under each.
    Keyword,
    /// Catalog ownership decides; unknown tokens fall back to keyword
    /// sniffing only when exactly one keyword matches.
    #[default]
    Catalog,
}

impl core::fmt::Display for ClassificationMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ClassificationMode::Keyword => "keyword",
            ClassificationMode::Catalog => "catalog",
        })
    }
}

impl FromStr for ClassificationMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keyword" => Ok(ClassificationMode::Keyword),
            "catalog" => Ok(ClassificationMode::Catalog),
            other => Err(DomainError::validation(format!(
                "unknown classification mode {other:?} (expected \"keyword\" or \"catalog\")"
            ))),
        }
    }
}

/// Classifies tokens against a catalog under a given mode.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    catalog: &'a PermissionTree,
    mode: ClassificationMode,
}

impl<'a> Classifier<'a> {
    pub fn new(catalog: &'a PermissionTree, mode: ClassificationMode) -> Self {
        Self { catalog, mode }
    }

    /// Modules whose keyword occurs in `token`, in traversal order.
    pub fn keyword_matches(token: &PermissionToken) -> Vec<ModuleKey> {
        ModuleKey::ALL
            .into_iter()
            .filter(|m| classify_token(token.as_str(), m.keyword()))
            .collect()
    }

    /// Modules the token is placed into. Empty means unclassified.
    pub fn modules_for(&self, token: &PermissionToken) -> Vec<ModuleKey> {
        match self.mode {
            ClassificationMode::Keyword => {
                let matches = Self::keyword_matches(token);
                if matches.len() > 1 {
                    tracing::warn!(
                        token = %token,
                        modules = ?matches,
                        "permission token matches several module keywords"
                    );
                }
                matches
            }
            ClassificationMode::Catalog => {
                if let Some(owner) = self.catalog.owner_of(token) {
                    return vec![owner];
                }
                let matches = Self::keyword_matches(token);
                match matches.as_slice() {
                    [single] => vec![*single],
                    [] => Vec::new(),
                    _ => {
                        tracing::warn!(
                            token = %token,
                            modules = ?matches,
                            "uncatalogued permission token matches several modules; leaving unclassified"
                        );
                        Vec::new()
                    }
                }
            }
        }
    }
}
