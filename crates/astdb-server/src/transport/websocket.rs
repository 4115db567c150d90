//! WebSocket transport: each `Text` frame carries one [`RequestEnvelope`],
//! answered with one `Text` frame carrying the [`ResponseEnvelope`].

use std::sync::Arc;

use astdb_domain::ports::query_server::{RequestEnvelope, ResponseEnvelope, ResponseError};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};

use crate::server::QueryServer;

/// Router exposing the query protocol over `GET /ws` (upgraded to a
/// WebSocket), alongside the same `/healthz` probe as the HTTP transport.
#[must_use]
pub fn router(server: Arc<QueryServer>) -> Router {
    Router::new()
        .route("/healthz", get(super::http::health))
        .route("/ws", get(ws_handler))
        .with_state(server)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(server): State<Arc<QueryServer>>,
    ConnectInfo(peer): ConnectInfo<std::net::SocketAddr>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, server, peer.ip().to_string()))
}

async fn handle_socket(socket: WebSocket, server: Arc<QueryServer>, client_key: String) {
    let (mut sender, mut receiver) = socket.split();

    while let Some(Ok(message)) = receiver.next().await {
        let Message::Text(text) = message else { continue };

        let response = match serde_json::from_str::<RequestEnvelope>(&text) {
            Ok(request) => {
                let id = request.id.clone();
                server.handle_request(id, text.len(), None, &client_key, request).await
            }
            Err(e) => ResponseEnvelope {
                id: "unknown".to_string(),
                result: None,
                error: Some(ResponseError { code: "protocol".to_string(), message: format!("malformed request: {e}"), data: None }),
            },
        };

        let Ok(payload) = serde_json::to_string(&response) else { break };
        if sender.send(Message::Text(payload.into())).await.is_err() {
            break;
        }
    }
}

/// Bind `addr` and serve the WebSocket transport until the process stops.
pub async fn serve(addr: std::net::SocketAddr, server: Arc<QueryServer>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let app = router(server).into_make_service_with_connect_info::<std::net::SocketAddr>();
    axum::serve(listener, app).await
}
