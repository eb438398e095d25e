//! Direct message send, conversation listing, deletion, chat partners.

use axum::extract::{Path, Query, State};
use axum::Json;
use database::models::{DeleteMode, NewMessage, NewPoll};
use database::{deletion, message, user, DatabaseError};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::AppState;
use crate::views::{self, MessageView, UserView};

/// Request to send a direct message.
#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub sender: String,
    pub receiver: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default, rename = "documentUrl")]
    pub document_url: Option<String>,
    #[serde(default, rename = "documentName")]
    pub document_name: Option<String>,
    #[serde(default)]
    pub poll: Option<NewPoll>,
}

/// Send response: the stored message plus both participants, so the
/// client can refresh its chat list without another round trip.
#[derive(Serialize)]
pub struct SendMessageResponse {
    pub message: MessageView,
    pub sender_info: UserView,
    pub receiver_info: UserView,
}

/// Send a direct message.
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>> {
    let pool = state.db.pool();
    let sender = user::get_user_by_username(pool, &req.sender).await?;
    let receiver = user::get_user_by_username(pool, &req.receiver).await?;

    let msg = message::create_message(
        pool,
        &NewMessage {
            sender_id: sender.id.clone(),
            receiver_id: Some(receiver.id.clone()),
            content: req.content,
            image_url: req.image_url.filter(|url| !url.is_empty()),
            document_url: req.document_url.filter(|url| !url.is_empty()),
            document_name: req.document_name.filter(|name| !name.is_empty()),
            poll: req.poll,
            ..Default::default()
        },
    )
    .await?;

    Ok(Json(SendMessageResponse {
        message: views::message_view(&state.db, &msg).await?,
        sender_info: views::user_view(&state.db, &sender).await?,
        receiver_info: views::user_view(&state.db, &receiver).await?,
    }))
}

/// Conversation query: `user1` is the requesting viewer.
#[derive(Deserialize)]
pub struct ConversationQuery {
    pub user1: String,
    pub user2: String,
}

/// List the conversation between two users as seen by `user1`.
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<ConversationQuery>,
) -> Result<Json<Vec<MessageView>>> {
    let pool = state.db.pool();
    let viewer = user::get_user_by_username(pool, &query.user1).await?;
    let partner = user::get_user_by_username(pool, &query.user2).await?;

    let messages = message::list_conversation(pool, &viewer.id, &partner.id).await?;
    Ok(Json(views::message_views(&state.db, &messages).await?))
}

/// Deletion query parameters.
#[derive(Deserialize)]
pub struct DeleteQuery {
    #[serde(rename = "type")]
    pub delete_type: Option<String>,
    pub username: Option<String>,
}

/// Delete a message for the given user or for everyone.
pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<serde_json::Value>> {
    let pool = state.db.pool();

    let username = query
        .username
        .ok_or_else(|| DatabaseError::InvalidInput("username required".to_string()))?;
    let user = user::get_user_by_username(pool, &username).await?;

    let mode = match query.delete_type.as_deref().unwrap_or("for_me") {
        "for_me" => DeleteMode::ForMe,
        "for_everyone" => DeleteMode::ForEveryone,
        other => {
            return Err(
                DatabaseError::InvalidInput(format!("invalid delete type: {}", other)).into(),
            )
        }
    };

    deletion::delete_message(pool, message_id, &user.id, mode).await?;

    let confirmation = match mode {
        DeleteMode::ForMe => "Message deleted for you",
        DeleteMode::ForEveryone => "Message deleted for everyone",
    };
    Ok(Json(serde_json::json!({ "success": confirmation })))
}

/// Chat partner query.
#[derive(Deserialize)]
pub struct CheckNewChatsQuery {
    pub username: String,
}

/// List every user the given user has visible direct traffic with.
pub async fn check_new_chats(
    State(state): State<AppState>,
    Query(query): Query<CheckNewChatsQuery>,
) -> Result<Json<Vec<UserView>>> {
    let pool = state.db.pool();
    let user = user::get_user_by_username(pool, &query.username).await?;

    let partners = message::chat_partners(pool, &user.id).await?;
    Ok(Json(views::user_views(&state.db, &partners).await?))
}
