//! Shared application state.

use std::sync::Arc;

use crate::config::ConfigV1;
use crate::store::IceCreamStore;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request handler; the store is behind a trait object so tests
/// can substitute an in-memory implementation.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Record storage.
    pub store: Arc<dyn IceCreamStore>,
}
