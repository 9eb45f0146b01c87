use std::sync::Arc;

use crate::ws::ConnectionRegistry;

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Active WebSocket connection per client id
    pub connections: Arc<ConnectionRegistry>,
    /// Origins allowed by the CORS layer
    pub allowed_origins: Vec<String>,
}
