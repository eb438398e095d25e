//! Friend list and mutual add/remove.

use axum::extract::{Path, State};
use axum::Json;
use database::{friendship, user};
use tower_sessions::Session;

use crate::error::Result;
use crate::session;
use crate::state::AppState;
use crate::views::{self, UserView};

/// List the authenticated user's friends. Stale ids are pruned by the
/// friendship manager on the way out.
pub async fn friends_list(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<UserView>>> {
    let current = session::current_user(&session, &state.db).await?;
    let friends = friendship::list_friends(state.db.pool(), &current.id).await?;
    Ok(Json(views::user_views(&state.db, &friends).await?))
}

/// Add a mutual friendship between the authenticated user and the
/// target user.
pub async fn add_friend(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let current = session::current_user(&session, &state.db).await?;
    let friend = user::get_user(state.db.pool(), &user_id).await?;

    friendship::add_friend(state.db.pool(), &current.id, &friend.id).await?;

    Ok(Json(serde_json::json!({
        "message": "Friend added successfully",
        "user_id": friend.id,
        "friend_username": friend.username,
    })))
}

/// Remove a mutual friendship. Fails with 400 when the target is not in
/// the caller's friend list.
pub async fn remove_friend(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let current = session::current_user(&session, &state.db).await?;

    friendship::remove_friend(state.db.pool(), &current.id, &user_id).await?;

    Ok(Json(serde_json::json!({
        "message": "Friend removed successfully"
    })))
}
