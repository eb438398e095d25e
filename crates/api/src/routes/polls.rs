//! Poll vote endpoint.

use axum::extract::State;
use axum::Json;
use database::{message, poll};
use serde::Deserialize;

use crate::error::Result;
use crate::state::AppState;
use crate::views::{self, MessageView};

/// Vote request. `selected` is free-form JSON: a single index, a
/// numeric string, or a list of either.
#[derive(Deserialize)]
pub struct VoteRequest {
    pub message_id: i64,
    pub voter: String,
    pub selected: serde_json::Value,
}

/// Record a vote and return the updated message.
pub async fn vote(
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<MessageView>> {
    let pool = state.db.pool();

    poll::record_vote(pool, req.message_id, &req.voter, &req.selected).await?;

    let msg = message::get_message(pool, req.message_id).await?;
    Ok(Json(views::message_view(&state.db, &msg).await?))
}
