//! `booksmith-core`: ledger foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no storage, no IO).

pub mod entity;
pub mod error;
pub mod fiscal;
pub mod id;
pub mod money;

pub use entity::Entity;
pub use error::DomainError;
pub use fiscal::FiscalYear;
pub use id::{AccountId, DocumentId, EntryId, UserId};
pub use money::{BALANCE_TOLERANCE, round_currency, within_tolerance};
