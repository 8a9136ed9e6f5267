pub mod config;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use encryptchat_api::AppState;
use encryptchat_gateway::{ConnectionSettings, Dispatcher, MessageSource, connection};

#[derive(Clone)]
struct GatewayState {
    dispatcher: Dispatcher,
    source: Arc<dyn MessageSource>,
    settings: ConnectionSettings,
}

/// Full HTTP surface: REST messages, WebSocket gateway, health check.
pub fn app(room: AppState, settings: ConnectionSettings) -> Router {
    let gateway_state = GatewayState {
        dispatcher: room.dispatcher().clone(),
        source: room.clone(),
        settings,
    };

    let ws_route = Router::new()
        .route("/gateway", get(ws_upgrade))
        .route("/health", get(health))
        .with_state(gateway_state);

    Router::new()
        .merge(encryptchat_api::router(room))
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn ws_upgrade(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        connection::handle_connection(socket, state.dispatcher, state.source, state.settings)
    })
}

async fn health(State(state): State<GatewayState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "subscribers": state.dispatcher.subscriber_count(),
    }))
}
