//! Registration, login, logout, current user.

use axum::extract::State;
use axum::Json;
use database::user;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::error::Result;
use crate::session::{self, USER_ID_KEY};
use crate::state::AppState;
use crate::views::{self, UserView};

/// Credentials for register and login.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Register a new user.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<UserView>> {
    let user = user::register_user(state.db.pool(), &req.username, &req.password).await?;
    Ok(Json(views::user_view(&state.db, &user).await?))
}

/// Log in and store the user id in the session.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<UserView>> {
    let user = user::verify_credentials(state.db.pool(), &req.username, &req.password).await?;

    session.insert(USER_ID_KEY, user.id.clone()).await?;
    info!(username = %user.username, "User logged in");

    Ok(Json(views::user_view(&state.db, &user).await?))
}

/// Log out and drop the session.
pub async fn logout(session: Session) -> Result<Json<serde_json::Value>> {
    session.flush().await?;
    Ok(Json(serde_json::json!({
        "message": "Logged out successfully"
    })))
}

/// Get the authenticated user.
pub async fn current_user(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<UserView>> {
    let user = session::current_user(&session, &state.db).await?;
    Ok(Json(views::user_view(&state.db, &user).await?))
}
