//! `paydesk-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the permission
//! model and the admin API client (no IO, no HTTP).

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::{FundRequestId, RecordId, UserId};
pub use value_object::Amount;
