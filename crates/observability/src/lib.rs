//! Observability for the exchange core
//!
//! Centralizes tracing-subscriber setup so every binary logs the same
//! way.

pub mod logging;

pub use logging::{init_logging, LogFormat};
