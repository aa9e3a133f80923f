//! Application State

use std::sync::Arc;

use macro_advisor::MacroAnalyzer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Immutable analysis pipeline, built once at startup
    pub analyzer: Arc<MacroAnalyzer>,
}
