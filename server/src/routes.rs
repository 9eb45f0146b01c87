use axum::{http::HeaderValue, response::Html, Router};
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};

use crate::state::AppState;
use crate::ws::handler as ws_handler;

/// GET / — Demo chat page. Static HTML; the page connects back to
/// /ws/{client_id} from the browser.
async fn index() -> Html<&'static str> {
    Html(include_str!("../templates/index.html"))
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// Build the full axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    // Explicit origin list with credentials. Credentialed CORS rejects
    // wildcards, so methods and headers mirror the preflight request.
    let origins: Vec<HeaderValue> = state
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    Router::new()
        .route("/", axum::routing::get(index))
        .route("/ws/{client_id}", axum::routing::get(ws_handler::ws_upgrade))
        .route("/health", axum::routing::get(health_check))
        .layer(cors)
        .with_state(state)
}
