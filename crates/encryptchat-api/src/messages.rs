use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{debug, error};
use uuid::Uuid;

use encryptchat_db::models::Cursor;
use encryptchat_types::api::{MessageResponse, SendMessageRequest};

use crate::error::ApiError;
use crate::room::AppState;

const MAX_AUTHOR_CHARS: usize = 64;
const MAX_TEXT_CHARS: usize = 4000;
const MAX_PAGE_SIZE: u32 = 200;

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Cursor-based pagination: pass the `timestamp` and `id` of the oldest
    /// message from the previous page to fetch older messages. Without
    /// `before_id`, everything at `before` itself is excluded.
    pub before: Option<i64>,
    pub before_id: Option<Uuid>,
}

impl MessageQuery {
    fn cursor(&self) -> Option<Cursor> {
        self.before.map(|timestamp| {
            let id = self.before_id.map(|id| id.to_string()).unwrap_or_default();
            Cursor::new(timestamp, id)
        })
    }
}

fn default_limit() -> u32 {
    50
}

pub async fn send_message(
    State(room): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("message text is empty".into()));
    }
    if req.text.chars().count() > MAX_TEXT_CHARS {
        return Err(ApiError::BadRequest(format!(
            "message text exceeds {} characters",
            MAX_TEXT_CHARS
        )));
    }

    let author = req.author.trim().to_string();
    let author_len = author.chars().count();
    if author_len == 0 || author_len > MAX_AUTHOR_CHARS {
        return Err(ApiError::BadRequest(format!(
            "author must be 1 to {} characters",
            MAX_AUTHOR_CHARS
        )));
    }

    // Run blocking DB insert off the async runtime
    let (id, msg) = tokio::task::spawn_blocking(move || room.send(&req.text, &author))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })??;

    debug!("Message {} stored for {}", id, msg.author);

    Ok((StatusCode::CREATED, Json(MessageResponse::from_message(id, &msg))))
}

pub async fn get_messages(
    State(room): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let limit = query.limit.min(MAX_PAGE_SIZE);
    let before = query.cursor();

    let messages = tokio::task::spawn_blocking(move || {
        let messages = room
            .history(limit, before.as_ref())?
            .map(|(id, msg)| MessageResponse::from_message(id, &msg))
            .collect::<Vec<_>>();
        Ok::<_, anyhow::Error>(messages)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.into())
    })??;

    Ok(Json(messages))
}
