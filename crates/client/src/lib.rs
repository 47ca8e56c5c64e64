//! `paydesk-client`
//!
//! **Responsibility:** typed HTTP client for the payments admin console.
//!
//! This crate provides:
//! - The permission panel: load, edit and save a user's page permissions
//! - Fund transfer and fund-request queue operations
//! - User management operations (listing, status, remarks, KYC files)
//!
//! The backend remains the authority for every business rule; this crate
//! only shapes requests, interprets responses and reports outcomes.

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod funds;
pub mod http;
pub mod notify;
pub mod reconciler;
pub mod session;
pub mod types;
pub mod users;

pub use backend::{PermissionBackend, PermissionRecord};
pub use client::AdminClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use notify::{Notification, NotificationStatus, Notifier, RecordingNotifier, TracingNotifier};
pub use reconciler::{LoadOutcome, PanelPhase, PermissionPanel, SaveOutcome};
pub use session::{Session, SessionState};
