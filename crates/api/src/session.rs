//! Session-based authentication helpers.
//!
//! Login stores the user id in the server-side session; handlers that
//! need an identity resolve it here. The database layer trusts whatever
//! identity this returns.

use database::models::User;
use database::{user, Database, DatabaseError};
use tower_sessions::Session;

use crate::error::{ApiError, Result};

/// Session key holding the authenticated user's id.
pub const USER_ID_KEY: &str = "user_id";

/// Resolve the authenticated user from the session.
///
/// Returns `Unauthorized` when the session is empty or the stored id no
/// longer resolves (the user was deleted after logging in).
pub async fn current_user(session: &Session, db: &Database) -> Result<User> {
    let user_id: Option<String> = session.get(USER_ID_KEY).await?;
    let Some(user_id) = user_id else {
        return Err(ApiError::Unauthorized);
    };

    match user::get_user(db.pool(), &user_id).await {
        Ok(user) => Ok(user),
        Err(DatabaseError::NotFound { .. }) => Err(ApiError::Unauthorized),
        Err(err) => Err(err.into()),
    }
}
