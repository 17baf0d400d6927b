//! Core types and trait definitions for the Perk loyalty ledger.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the rules that keep points a trustworthy currency: how a purchase turns
//! into earned points, when a redemption is allowed, and what a ledger write
//! looks like before a backend applies it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod campaign;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod level;
pub mod redemption;
pub mod reward;
pub mod store;
pub mod user;

pub use error::{DomainError, Error, Result};
pub use identity::Caller;
