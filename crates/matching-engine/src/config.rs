//! Engine options

use serde::{Deserialize, Serialize};

/// Tunable behavior of the matching engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Emit "Quote replaced" cancel receipts for the outgoing sides when a
    /// user replaces an active quote. Replacement is silent by default.
    #[serde(default)]
    pub emit_quote_replace_cancels: bool,
}
