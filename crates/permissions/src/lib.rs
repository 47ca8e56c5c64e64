//! `paydesk-permissions` — page permission model for the admin console.
//!
//! Pure data transformation: the catalog of grantable pages, token
//! classification into modules, and the per-user partition/merge used by the
//! permission editor. This crate is intentionally decoupled from HTTP.

pub mod catalog;
pub mod classify;
pub mod module;
pub mod state;
pub mod token;

pub use catalog::{CatalogViolation, PermissionNode, PermissionTree};
pub use classify::{ClassificationMode, Classifier, classify_token};
pub use module::ModuleKey;
pub use state::{ModuleSelection, UserPermissionState};
pub use token::PermissionToken;
