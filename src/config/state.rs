// Application state module
// Immutable per-process state shared by every connection

use std::sync::Arc;

use super::types::Config;
use crate::upstream::CompletionClient;

/// Application state
///
/// Built once at startup and never mutated afterwards.
pub struct AppState {
    pub config: Config,
    pub upstream: Arc<dyn CompletionClient>,
}

impl AppState {
    pub fn new(config: Config, upstream: Arc<dyn CompletionClient>) -> Self {
        Self { config, upstream }
    }

    pub const fn access_log(&self) -> bool {
        self.config.logging.access_log
    }
}
