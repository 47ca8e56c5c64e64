//! Per-user permission state edited in the permission panel.
//!
//! A user's grants arrive from the backend as one flat list of tokens. For
//! editing they are partitioned into one selection per module; for saving
//! the selections are merged back into a single duplicate-free list.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use paydesk_core::{DomainError, DomainResult, RecordId, UserId};

use crate::{Classifier, ModuleKey, PermissionToken, PermissionTree};

/// Ordered, duplicate-free set of checked tokens for one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSelection {
    tokens: Vec<PermissionToken>,
}

static EMPTY_SELECTION: ModuleSelection = ModuleSelection { tokens: Vec::new() };

impl ModuleSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a token; returns `false` if it was already checked.
    pub fn insert(&mut self, token: PermissionToken) -> bool {
        if self.contains(&token) {
            return false;
        }
        self.tokens.push(token);
        true
    }

    /// Remove a token; returns `false` if it was not checked.
    pub fn remove(&mut self, token: &PermissionToken) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| t != token);
        self.tokens.len() != before
    }

    pub fn contains(&self, token: &PermissionToken) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PermissionToken> {
        self.tokens.iter()
    }

    pub fn as_slice(&self) -> &[PermissionToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl FromIterator<PermissionToken> for ModuleSelection {
    fn from_iter<I: IntoIterator<Item = PermissionToken>>(iter: I) -> Self {
        let mut selection = ModuleSelection::new();
        for token in iter {
            selection.insert(token);
        }
        selection
    }
}

/// The permission state of one user while the panel is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPermissionState {
    user_id: UserId,
    record_id: Option<RecordId>,
    checked: BTreeMap<ModuleKey, ModuleSelection>,
    expanded: BTreeMap<ModuleKey, BTreeSet<String>>,
    unclassified: Vec<PermissionToken>,
}

impl UserPermissionState {
    /// State with nothing checked in any module.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            record_id: None,
            checked: ModuleKey::ALL
                .into_iter()
                .map(|m| (m, ModuleSelection::new()))
                .collect(),
            expanded: ModuleKey::ALL
                .into_iter()
                .map(|m| (m, BTreeSet::new()))
                .collect(),
            unclassified: Vec::new(),
        }
    }

    /// Split a flat token list into per-module selections.
    ///
    /// Tokens no module claims are kept aside so that a later save writes
    /// them back unchanged.
    pub fn partition<I>(
        user_id: UserId,
        record_id: Option<RecordId>,
        tokens: I,
        classifier: &Classifier<'_>,
    ) -> Self
    where
        I: IntoIterator<Item = PermissionToken>,
    {
        let mut state = Self::empty(user_id);
        state.record_id = record_id;

        for token in tokens {
            let modules = classifier.modules_for(&token);
            if modules.is_empty() {
                if !state.unclassified.contains(&token) {
                    tracing::info!(token = %token, "permission token does not belong to any module");
                    state.unclassified.push(token);
                }
                continue;
            }
            for module in modules {
                state.selection_mut(module).insert(token.clone());
            }
        }

        state
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn record_id(&self) -> Option<&RecordId> {
        self.record_id.as_ref()
    }

    pub fn selection(&self, module: ModuleKey) -> &ModuleSelection {
        self.checked.get(&module).unwrap_or(&EMPTY_SELECTION)
    }

    fn selection_mut(&mut self, module: ModuleKey) -> &mut ModuleSelection {
        self.checked.entry(module).or_default()
    }

    /// Tokens that were loaded but not assigned to any module.
    pub fn unclassified(&self) -> &[PermissionToken] {
        &self.unclassified
    }

    /// Replace a module's selection as-is.
    pub fn replace_selection<I>(&mut self, module: ModuleKey, tokens: I)
    where
        I: IntoIterator<Item = PermissionToken>,
    {
        *self.selection_mut(module) = tokens.into_iter().collect();
    }

    /// Replace a module's selection, rejecting tokens outside its catalog.
    pub fn set_checked<I>(
        &mut self,
        catalog: &PermissionTree,
        module: ModuleKey,
        tokens: I,
    ) -> DomainResult<()>
    where
        I: IntoIterator<Item = PermissionToken>,
    {
        let selection: ModuleSelection = tokens.into_iter().collect();
        if let Some(foreign) = selection.iter().find(|t| !catalog.contains(module, t)) {
            return Err(DomainError::invariant(format!(
                "token {foreign} is not part of the {module} catalog"
            )));
        }
        *self.selection_mut(module) = selection;
        Ok(())
    }

    /// Check a node: a group checks every leaf below it. Returns the number
    /// of newly checked tokens.
    pub fn check(
        &mut self,
        catalog: &PermissionTree,
        module: ModuleKey,
        node: &str,
    ) -> DomainResult<usize> {
        let leaves = catalog.leaves_under(module, node).ok_or_else(|| {
            DomainError::validation(format!("no node {node:?} in the {module} catalog"))
        })?;
        let selection = self.selection_mut(module);
        Ok(leaves.into_iter().filter(|t| selection.insert(t.clone())).count())
    }

    /// Uncheck a node and every leaf below it. Returns the number of tokens
    /// removed.
    pub fn uncheck(
        &mut self,
        catalog: &PermissionTree,
        module: ModuleKey,
        node: &str,
    ) -> DomainResult<usize> {
        let leaves = catalog.leaves_under(module, node).ok_or_else(|| {
            DomainError::validation(format!("no node {node:?} in the {module} catalog"))
        })?;
        let selection = self.selection_mut(module);
        Ok(leaves.iter().filter(|t| selection.remove(t)).count())
    }

    /// Flip a tree node between expanded and collapsed. Returns whether it is
    /// now expanded.
    pub fn toggle_expanded(&mut self, module: ModuleKey, node: impl Into<String>) -> bool {
        let node = node.into();
        let expanded = self.expanded.entry(module).or_default();
        if expanded.remove(&node) {
            false
        } else {
            expanded.insert(node);
            true
        }
    }

    pub fn expanded(&self, module: ModuleKey) -> impl Iterator<Item = &str> {
        self.expanded
            .get(&module)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn total_checked(&self) -> usize {
        self.checked.values().map(ModuleSelection::len).sum()
    }

    /// Flatten every module selection, in module traversal order, followed
    /// by the unclassified tokens. A token checked in several modules is
    /// emitted once, at its first position.
    pub fn merged(&self) -> Vec<PermissionToken> {
        let mut seen: HashSet<&PermissionToken> = HashSet::new();
        ModuleKey::ALL
            .into_iter()
            .flat_map(|m| self.selection(m).iter())
            .chain(self.unclassified.iter())
            .filter(|t| seen.insert(*t))
            .cloned()
            .collect()
    }
}
