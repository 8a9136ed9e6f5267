pub mod error;
pub mod messages;
pub mod room;

use axum::{Router, routing::get};

pub use room::{AppState, ChatRoom};

/// REST routes for reading and posting messages.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/messages", get(messages::get_messages).post(messages::send_message))
        .with_state(state)
}
