//! Common types for the exchange core
//!
//! This crate provides the fundamental value types shared across all
//! exchange crates.
//!
//! # Modules
//!
//! - [`price`] - Interned integer-cent price values with a market sentinel
//! - [`types`] - Shared domain types (Side, MarketState)

pub mod price;
pub mod types;

pub use price::{Price, PriceError};
pub use types::{MarketState, Side};
