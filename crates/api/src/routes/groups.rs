//! Group CRUD, membership, and group message endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use database::models::{NewMessage, NewPoll};
use database::{group, message, user};
use serde::Deserialize;

use crate::error::Result;
use crate::state::AppState;
use crate::views::{self, GroupView, MessageView};

/// List all groups with their members.
pub async fn list_groups(State(state): State<AppState>) -> Result<Json<Vec<GroupView>>> {
    let groups = group::list_groups(state.db.pool()).await?;

    let mut result = Vec::with_capacity(groups.len());
    for g in &groups {
        result.push(views::group_view(&state.db, g).await?);
    }
    Ok(Json(result))
}

/// Request to create a group.
#[derive(Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<String>,
}

/// Create a group with an initial member set.
pub async fn create_group(
    State(state): State<AppState>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<Json<GroupView>> {
    let g = group::create_group(state.db.pool(), &req.name, &req.member_ids).await?;
    Ok(Json(views::group_view(&state.db, &g).await?))
}

/// Membership change request.
#[derive(Deserialize)]
pub struct MemberRequest {
    pub username: String,
}

/// Add a member to a group (idempotent).
pub async fn add_member(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
    Json(req): Json<MemberRequest>,
) -> Result<Json<serde_json::Value>> {
    let pool = state.db.pool();
    let user = user::get_user_by_username(pool, &req.username).await?;
    group::add_member(pool, group_id, &user.id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Remove a member from a group (idempotent).
pub async fn remove_member(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
    Json(req): Json<MemberRequest>,
) -> Result<Json<serde_json::Value>> {
    let pool = state.db.pool();
    let user = user::get_user_by_username(pool, &req.username).await?;
    group::remove_member(pool, group_id, &user.id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Group listing query: the viewer's username is required so the
/// visibility filter knows whose deletions to apply.
#[derive(Deserialize)]
pub struct GroupMessagesQuery {
    pub group_id: i64,
    pub username: String,
}

/// List a group's messages as seen by the viewer.
pub async fn list_group_messages(
    State(state): State<AppState>,
    Query(query): Query<GroupMessagesQuery>,
) -> Result<Json<Vec<MessageView>>> {
    let pool = state.db.pool();
    let viewer = user::get_user_by_username(pool, &query.username).await?;

    let messages = message::list_group_messages(pool, query.group_id, &viewer.id).await?;
    Ok(Json(views::message_views(&state.db, &messages).await?))
}

/// Request to send a group message.
#[derive(Deserialize)]
pub struct SendGroupMessageRequest {
    pub sender: String,
    pub group_id: i64,
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

/// Send a message to a group.
pub async fn send_group_message(
    State(state): State<AppState>,
    Json(req): Json<SendGroupMessageRequest>,
) -> Result<Json<MessageView>> {
    let pool = state.db.pool();
    let sender = user::get_user_by_username(pool, &req.sender).await?;

    let msg = message::create_message(
        pool,
        &NewMessage {
            sender_id: sender.id,
            group_id: Some(req.group_id),
            content: req.content,
            image_url: req.image_url.filter(|url| !url.is_empty()),
            document_url: req.document_url.filter(|url| !url.is_empty()),
            document_name: req.document_name.filter(|name| !name.is_empty()),
            poll: req.poll,
            ..Default::default()
        },
    )
    .await?;

    Ok(Json(views::message_view(&state.db, &msg).await?))
}
