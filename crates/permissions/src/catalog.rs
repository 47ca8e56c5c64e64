//! Static catalog of grantable pages, one checkbox tree per module.
//!
//! Leaves are grantable [`PermissionToken`]s; inner nodes only group leaves.
//! A token belongs to exactly one module: construction rejects a token that
//! is registered twice, so catalog ownership doubles as the token's
//! structured module tag.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use anyhow::Context;
use paydesk_core::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ModuleKey, PermissionToken, UserPermissionState};

/// One node of a module's checkbox tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionNode {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PermissionNode>,
}

impl PermissionNode {
    pub fn leaf(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn group(
        value: impl Into<String>,
        label: impl Into<String>,
        children: Vec<PermissionNode>,
    ) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn collect_leaves(&self, out: &mut Vec<PermissionToken>) {
        if self.is_leaf() {
            out.push(PermissionToken::new(self.value.clone()));
        } else {
            for child in &self.children {
                child.collect_leaves(out);
            }
        }
    }

    fn find(&self, value: &str) -> Option<&PermissionNode> {
        if self.value == value {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(value))
    }
}

/// A checked token that its module's catalog does not define.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{token} is not defined in the {module} catalog")]
pub struct CatalogViolation {
    pub module: ModuleKey,
    pub token: PermissionToken,
}

/// The permission catalog for every module.
#[derive(Debug, Clone)]
pub struct PermissionTree {
    modules: BTreeMap<ModuleKey, Vec<PermissionNode>>,
    owners: HashMap<PermissionToken, ModuleKey>,
}

impl PermissionTree {
    /// Build a catalog, enforcing unique node values within a module and
    /// unique leaf tokens across all modules.
    pub fn new(modules: BTreeMap<ModuleKey, Vec<PermissionNode>>) -> DomainResult<Self> {
        let mut owners: HashMap<PermissionToken, ModuleKey> = HashMap::new();

        for (module, roots) in &modules {
            let mut seen: HashSet<&str> = HashSet::new();
            let mut stack: Vec<&PermissionNode> = roots.iter().collect();
            while let Some(node) = stack.pop() {
                if node.value.is_empty() {
                    return Err(DomainError::validation(format!(
                        "empty node value in module {module}"
                    )));
                }
                if !seen.insert(node.value.as_str()) {
                    return Err(DomainError::conflict(format!(
                        "node {:?} listed twice in module {module}",
                        node.value
                    )));
                }
                stack.extend(node.children.iter());
            }

            let mut leaves = Vec::new();
            for root in roots {
                root.collect_leaves(&mut leaves);
            }
            for token in leaves {
                if let Some(other) = owners.insert(token.clone(), *module) {
                    return Err(DomainError::conflict(format!(
                        "token {token:?} registered under both {other} and {module}"
                    )));
                }
            }
        }

        Ok(Self { modules, owners })
    }

    /// Parse a catalog from JSON: an object keyed by module keyword whose
    /// values are arrays of nodes.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let modules: BTreeMap<ModuleKey, Vec<PermissionNode>> =
            serde_json::from_str(json).context("failed to parse permission catalog")?;
        Ok(Self::new(modules)?)
    }

    /// Load a JSON catalog from disk.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read permission catalog at {:?}", path))?;
        Self::from_json(&raw).with_context(|| format!("invalid permission catalog at {:?}", path))
    }

    /// The catalog shipped with the console.
    pub fn builtin() -> Self {
        let modules = builtin_modules();
        // Uniqueness of the builtin table is asserted in tests.
        Self::new(modules).unwrap_or_else(|err| {
            tracing::error!(error = %err, "builtin permission catalog is invalid");
            Self {
                modules: BTreeMap::new(),
                owners: HashMap::new(),
            }
        })
    }

    /// Root nodes of a module's tree (empty if the module has none).
    pub fn nodes(&self, module: ModuleKey) -> &[PermissionNode] {
        self.modules.get(&module).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The module whose catalog defines `token`.
    pub fn owner_of(&self, token: &PermissionToken) -> Option<ModuleKey> {
        self.owners.get(token).copied()
    }

    pub fn contains(&self, module: ModuleKey, token: &PermissionToken) -> bool {
        self.owner_of(token) == Some(module)
    }

    /// All grantable tokens of a module, in tree order.
    pub fn leaves(&self, module: ModuleKey) -> Vec<PermissionToken> {
        let mut out = Vec::new();
        for root in self.nodes(module) {
            root.collect_leaves(&mut out);
        }
        out
    }

    /// Leaf tokens under the node `value` (the node itself if it is a leaf).
    pub fn leaves_under(&self, module: ModuleKey, value: &str) -> Option<Vec<PermissionToken>> {
        let node = self.nodes(module).iter().find_map(|n| n.find(value))?;
        let mut out = Vec::new();
        node.collect_leaves(&mut out);
        Some(out)
    }

    /// Every checked token that is not part of its module's catalog.
    pub fn validate(&self, state: &UserPermissionState) -> Vec<CatalogViolation> {
        ModuleKey::ALL
            .into_iter()
            .flat_map(move |module| {
                state
                    .selection(module)
                    .iter()
                    .filter(move |t| !self.contains(module, t))
                    .map(move |t| CatalogViolation {
                        module,
                        token: t.clone(),
                    })
            })
            .collect()
    }
}

impl Default for PermissionTree {
    fn default() -> Self {
        Self::builtin()
    }
}

fn leaves(items: &[(&str, &str)]) -> Vec<PermissionNode> {
    items
        .iter()
        .map(|(value, label)| PermissionNode::leaf(*value, *label))
        .collect()
}

/// The module's top-level checkbox, keyed by its keyword.
fn module_root(module: ModuleKey, children: Vec<PermissionNode>) -> Vec<PermissionNode> {
    vec![PermissionNode::group(module.keyword(), module.label(), children)]
}

fn builtin_modules() -> BTreeMap<ModuleKey, Vec<PermissionNode>> {
    use ModuleKey::*;

    let basic = vec![
        PermissionNode::leaf("basic.dashboard", "Dashboard"),
        PermissionNode::leaf("basic.profile", "Profile"),
        PermissionNode::leaf("basic.fundRequest", "Fund Request"),
        PermissionNode::group(
            "basic.reports",
            "Reports",
            leaves(&[
                ("basic.reports.ledger", "Ledger"),
                ("basic.reports.daybook", "Daybook"),
                ("basic.reports.fundRequests", "Fund Requests"),
            ]),
        ),
    ];

    [
        (Basic, basic),
        (
            Aeps,
            leaves(&[
                ("aeps.transaction", "Transaction"),
                ("aeps.aadhaarPay", "Aadhaar Pay"),
                ("aeps.report", "Report"),
            ]),
        ),
        (
            Bbps,
            leaves(&[("bbps.billPay", "Bill Payment"), ("bbps.report", "Report")]),
        ),
        (
            Dmt,
            leaves(&[
                ("dmt.send", "Send Money"),
                ("dmt.refund", "Refund"),
                ("dmt.report", "Report"),
            ]),
        ),
        (
            Payout,
            leaves(&[("payout.transfer", "Transfer"), ("payout.report", "Report")]),
        ),
        (
            Cms,
            leaves(&[("cms.collect", "Collection"), ("cms.report", "Report")]),
        ),
        (
            Recharge,
            leaves(&[
                ("recharge.prepaid", "Prepaid"),
                ("recharge.postpaid", "Postpaid"),
                ("recharge.dth", "DTH"),
                ("recharge.report", "Report"),
            ]),
        ),
        (
            Matm,
            leaves(&[("matm.transaction", "Transaction"), ("matm.report", "Report")]),
        ),
        (Pan, leaves(&[("pan.apply", "Apply"), ("pan.report", "Report")])),
        (Lic, leaves(&[("lic.premium", "Premium"), ("lic.report", "Report")])),
        (
            Axis,
            leaves(&[("axis.account", "Account Opening"), ("axis.report", "Report")]),
        ),
        (
            Fastag,
            leaves(&[("fastag.payment", "Payment"), ("fastag.report", "Report")]),
        ),
        (
            UserManagement,
            leaves(&[
                ("userManagement.view", "View Users"),
                ("userManagement.create", "Create User"),
                ("userManagement.edit", "Edit User"),
                ("userManagement.status", "Change Status"),
                ("userManagement.permissions", "Manage Permissions"),
            ]),
        ),
    ]
    .into_iter()
    .map(|(module, children)| (module, module_root(module, children)))
    .collect()
}
