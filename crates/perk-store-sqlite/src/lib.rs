//! SQLite backend for the Perk loyalty store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Ledger writes (`earn`, `spend`,
//! `redeem`) each run as one `BEGIN IMMEDIATE` transaction on that thread.

mod encode;
mod ledger;
mod schema;
mod store;
mod users;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
