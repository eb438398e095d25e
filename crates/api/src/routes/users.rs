//! User listing and profile updates.

use axum::extract::{Path, State};
use axum::Json;
use database::{profile, user};
use serde::Deserialize;

use crate::error::Result;
use crate::state::AppState;
use crate::views::{self, UserView};

/// List all users.
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserView>>> {
    let users = user::list_users(state.db.pool()).await?;
    Ok(Json(views::user_views(&state.db, &users).await?))
}

/// Get one user by id.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserView>> {
    let user = user::get_user(state.db.pool(), &user_id).await?;
    Ok(Json(views::user_view(&state.db, &user).await?))
}

/// Profile fields accepted on update. Identity and friends are
/// read-only here.
#[derive(Deserialize)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub email: Option<String>,
    pub mobile_number: Option<String>,
}

/// Update request wrapping the profile fields.
#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub profile: Option<ProfileUpdate>,
}

/// Update a user's profile fields.
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserView>> {
    let user = user::get_user(state.db.pool(), &user_id).await?;

    if let Some(update) = req.profile {
        profile::update_profile(
            state.db.pool(),
            &user.id,
            update.bio.as_deref(),
            update.email.as_deref(),
            update.mobile_number.as_deref(),
        )
        .await?;
    }

    Ok(Json(views::user_view(&state.db, &user).await?))
}
