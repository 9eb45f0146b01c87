use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    response::Response,
};

use crate::state::AppState;
use crate::ws::{actor, ClientId};

/// GET /ws/{client_id}
/// WebSocket upgrade endpoint. The client picks its own numeric id; there is
/// no authentication of that identity. A failed handshake never touches the
/// registry — registration happens inside the spawned actor.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Path(client_id): Path<ClientId>,
    ws: WebSocketUpgrade,
) -> Response {
    tracing::info!(client_id, "WebSocket upgrade requested");
    ws.on_upgrade(move |socket| actor::run_connection(socket, state, client_id))
}
