//! The permission panel: loads a user's page permissions, lets the admin
//! edit them per module, and saves the merged list back.
//!
//! Every load and save takes a ticket from a monotonically increasing
//! counter. A response is applied only while its ticket is still the latest
//! one issued, so a slow reply for a previously selected user can never
//! overwrite the state of the user now on screen.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use paydesk_core::{DomainError, DomainResult, UserId};
use paydesk_permissions::{
    ClassificationMode, Classifier, ModuleKey, PermissionToken, PermissionTree,
    UserPermissionState,
};
use serde::{Deserialize, Serialize};

use crate::backend::PermissionBackend;
use crate::client::AdminClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::notify::{Notification, Notifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelPhase {
    Unloaded,
    Loading,
    Loaded,
    /// The fetch failed for a reason other than a missing record; the panel
    /// shows empty selections.
    LoadFailed,
    Editing,
    Saving,
    Saved,
    SaveFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The user's record was loaded.
    Loaded { tokens: usize },
    /// No record (or the fetch failed); selections were reset to empty.
    Empty,
    /// A newer load or selection superseded this one; nothing was applied.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Number of tokens written.
    pub tokens: usize,
    /// Whether the panel reloaded the confirmed state afterwards.
    pub reloaded: bool,
}

#[derive(Debug)]
struct PanelInner {
    user: Option<UserId>,
    phase: PanelPhase,
    state: Option<UserPermissionState>,
}

pub struct PermissionPanel<B> {
    backend: B,
    catalog: Arc<PermissionTree>,
    mode: ClassificationMode,
    notifier: Arc<dyn Notifier>,
    latest: AtomicU64,
    inner: Mutex<PanelInner>,
}

impl PermissionPanel<AdminClient> {
    /// Panel wired to the configured permission service and catalog.
    pub fn for_client(client: AdminClient, config: &ClientConfig) -> anyhow::Result<Self> {
        let catalog = Arc::new(config.load_catalog()?);
        let notifier = client.notifier().clone();
        Ok(Self::new(client, catalog, config.classification, notifier))
    }
}

impl<B: PermissionBackend> PermissionPanel<B> {
    pub fn new(
        backend: B,
        catalog: Arc<PermissionTree>,
        mode: ClassificationMode,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            backend,
            catalog,
            mode,
            notifier,
            latest: AtomicU64::new(0),
            inner: Mutex::new(PanelInner {
                user: None,
                phase: PanelPhase::Unloaded,
                state: None,
            }),
        }
    }

    pub fn catalog(&self) -> &PermissionTree {
        &self.catalog
    }

    pub fn mode(&self) -> ClassificationMode {
        self.mode
    }

    pub fn phase(&self) -> PanelPhase {
        self.lock().phase
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.lock().user.clone()
    }

    /// A copy of the state being edited.
    pub fn snapshot(&self) -> Option<UserPermissionState> {
        self.lock().state.clone()
    }

    fn lock(&self) -> MutexGuard<'_, PanelInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Must be called with the panel lock held.
    fn issue_ticket(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }

    /// Select `user_id` and load their permissions, replacing whatever the
    /// panel showed before.
    ///
    /// A missing record or a failed fetch is not an error: the panel falls
    /// back to empty selections. Only an expired session is returned as an
    /// error, and it leaves the panel untouched.
    pub async fn load_permissions(&self, user_id: &UserId) -> Result<LoadOutcome, ApiError> {
        let (ticket, previous) = {
            let mut inner = self.lock();
            let ticket = self.issue_ticket();
            let previous = (inner.user.replace(user_id.clone()), inner.phase);
            inner.phase = PanelPhase::Loading;
            (ticket, previous)
        };
        self.fetch_and_apply(user_id, ticket, PanelPhase::Loaded, previous)
            .await
    }

    async fn fetch_and_apply(
        &self,
        user_id: &UserId,
        ticket: u64,
        loaded_phase: PanelPhase,
        previous: (Option<UserId>, PanelPhase),
    ) -> Result<LoadOutcome, ApiError> {
        tracing::info!(%user_id, ticket, "loading user permissions");
        let result = self.backend.fetch_permissions(user_id).await;

        let (state, outcome, phase) = match result {
            Ok(record) => {
                let tokens = record.allowed_pages.len();
                let classifier = Classifier::new(&self.catalog, self.mode);
                let state = UserPermissionState::partition(
                    user_id.clone(),
                    Some(record.record_id),
                    record.allowed_pages,
                    &classifier,
                );
                (state, LoadOutcome::Loaded { tokens }, loaded_phase)
            }
            Err(ApiError::AuthExpired) => {
                tracing::warn!(%user_id, ticket, "session expired while loading permissions");
                let mut inner = self.lock();
                if self.is_current(ticket) {
                    (inner.user, inner.phase) = previous;
                }
                return Err(ApiError::AuthExpired);
            }
            Err(err) => {
                let phase = if err.is_not_found() {
                    tracing::info!(%user_id, "no permissions stored yet");
                    loaded_phase
                } else {
                    tracing::warn!(%user_id, error = %err, "failed to fetch permissions; showing none");
                    PanelPhase::LoadFailed
                };
                (UserPermissionState::empty(user_id.clone()), LoadOutcome::Empty, phase)
            }
        };

        let mut inner = self.lock();
        if !self.is_current(ticket) {
            tracing::debug!(%user_id, ticket, "discarding stale permission response");
            return Ok(LoadOutcome::Superseded);
        }
        inner.state = Some(state);
        inner.phase = phase;
        Ok(outcome)
    }

    /// Persist `state` as the user's complete permission list.
    ///
    /// The list is every module selection in module order (each token once).
    /// When `state` belongs to the user on screen the panel then reloads the
    /// confirmed state; a state for any other user is written without
    /// touching the panel. On failure an error notification is raised and the
    /// panel keeps the unsaved edits.
    pub async fn save_permissions(
        &self,
        state: &UserPermissionState,
    ) -> Result<SaveOutcome, ApiError> {
        let user_id = state.user_id().clone();
        let allowed: Vec<PermissionToken> = state.merged();

        let ticket = {
            let mut inner = self.lock();
            if inner.user.as_ref() == Some(&user_id) {
                ensure_idle(inner.phase)?;
                inner.phase = PanelPhase::Saving;
                Some(self.issue_ticket())
            } else {
                None
            }
        };

        tracing::info!(%user_id, count = allowed.len(), ?ticket, "saving user permissions");
        if let Err(err) = self.backend.update_permissions(&user_id, &allowed).await {
            tracing::warn!(%user_id, error = %err, "failed to save permissions");
            if let Some(ticket) = ticket {
                let mut inner = self.lock();
                if self.is_current(ticket) {
                    inner.phase = if err == ApiError::AuthExpired {
                        PanelPhase::Editing
                    } else {
                        PanelPhase::SaveFailed
                    };
                }
            }
            self.notifier.notify(
                Notification::from_error(&err, "Could not update permissions")
                    .with_title("Error Occured"),
            );
            return Err(err);
        }

        self.notifier
            .notify(Notification::success("User permissions were updated!"));

        let reloaded = match ticket {
            Some(ticket) => self.reload_after_save(&user_id, ticket).await,
            None => false,
        };
        Ok(SaveOutcome {
            tokens: allowed.len(),
            reloaded,
        })
    }

    /// Reload the panel after a successful write. The write has landed, so a
    /// failed reload is logged and reported as `false`, never as an error.
    async fn reload_after_save(&self, user_id: &UserId, ticket: u64) -> bool {
        let (reload_ticket, previous) = {
            let mut inner = self.lock();
            if !self.is_current(ticket) {
                tracing::debug!(%user_id, ticket, "panel moved on during save; skipping reload");
                return false;
            }
            inner.phase = PanelPhase::Saved;
            (self.issue_ticket(), (inner.user.clone(), PanelPhase::Saved))
        };

        match self
            .fetch_and_apply(user_id, reload_ticket, PanelPhase::Saved, previous)
            .await
        {
            Ok(outcome) => matches!(outcome, LoadOutcome::Loaded { .. }),
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "saved permissions could not be reloaded");
                false
            }
        }
    }

    /// Save the state currently being edited. Refused while a load or save
    /// is in flight.
    pub async fn save(&self) -> Result<SaveOutcome, ApiError> {
        let state = {
            let inner = self.lock();
            ensure_idle(inner.phase)?;
            inner
                .state
                .clone()
                .ok_or_else(|| ApiError::validation("No user selected"))?
        };
        self.save_permissions(&state).await
    }

    fn edit<T>(
        &self,
        marks_dirty: bool,
        f: impl FnOnce(&mut UserPermissionState) -> DomainResult<T>,
    ) -> DomainResult<T> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        ensure_idle(inner.phase)?;
        let state = inner
            .state
            .as_mut()
            .ok_or_else(|| DomainError::validation("no user permissions loaded"))?;
        let out = f(state)?;
        if marks_dirty {
            inner.phase = PanelPhase::Editing;
        }
        Ok(out)
    }

    /// Check a tree node (a group checks all of its pages).
    pub fn check(&self, module: ModuleKey, node: &str) -> DomainResult<usize> {
        let catalog = self.catalog.clone();
        self.edit(true, |state| state.check(&catalog, module, node))
    }

    pub fn uncheck(&self, module: ModuleKey, node: &str) -> DomainResult<usize> {
        let catalog = self.catalog.clone();
        self.edit(true, |state| state.uncheck(&catalog, module, node))
    }

    /// Replace a module's checked pages, as reported by its checkbox tree.
    pub fn set_checked(
        &self,
        module: ModuleKey,
        tokens: impl IntoIterator<Item = PermissionToken>,
    ) -> DomainResult<()> {
        let catalog = self.catalog.clone();
        self.edit(true, |state| state.set_checked(&catalog, module, tokens))
    }

    pub fn toggle_expanded(&self, module: ModuleKey, node: &str) -> DomainResult<bool> {
        self.edit(false, |state| Ok(state.toggle_expanded(module, node)))
    }

    /// Close the panel, discarding unsaved edits and any in-flight response.
    pub fn close(&self) {
        let mut inner = self.lock();
        self.issue_ticket();
        inner.user = None;
        inner.state = None;
        inner.phase = PanelPhase::Unloaded;
    }
}

fn ensure_idle(phase: PanelPhase) -> DomainResult<()> {
    if matches!(phase, PanelPhase::Loading | PanelPhase::Saving) {
        return Err(DomainError::conflict("permissions are being loaded or saved"));
    }
    Ok(())
}
