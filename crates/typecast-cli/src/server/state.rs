//! Application state for the web server.

use std::sync::Arc;

use typecast::{Engine, ResultStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Engine that runs each uploaded job.
    pub engine: Arc<Engine>,
    /// Where job outcomes are recorded.
    pub store: Arc<dyn ResultStore>,
}

impl AppState {
    /// Create new application state.
    pub fn new(engine: Engine, store: Arc<dyn ResultStore>) -> Self {
        Self {
            engine: Arc::new(engine),
            store,
        }
    }
}
