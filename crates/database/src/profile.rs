//! Profile CRUD operations.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::Profile;

/// Raw profile row with the friends list still JSON-encoded.
#[derive(Debug, FromRow)]
struct ProfileRow {
    user_id: String,
    bio: String,
    email: String,
    mobile_number: String,
    friends: String,
}

impl ProfileRow {
    fn into_profile(self) -> Result<Profile> {
        Ok(Profile {
            friends: decode_friends(&self.friends)?,
            user_id: self.user_id,
            bio: self.bio,
            email: self.email,
            mobile_number: self.mobile_number,
        })
    }
}

/// Decode a stored friends column.
pub(crate) fn decode_friends(raw: &str) -> Result<Vec<String>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw)
        .map_err(|e| DatabaseError::InvalidInput(format!("corrupt friends list: {}", e)))
}

/// Encode a friends list for storage.
pub(crate) fn encode_friends(friends: &[String]) -> String {
    serde_json::to_string(friends).unwrap_or_else(|_| "[]".to_string())
}

/// Read a friends column value from a row fetched with `SELECT friends`.
pub(crate) fn friends_from_row(row: &SqliteRow) -> Result<Vec<String>> {
    let raw: String = row
        .try_get("friends")
        .map_err(DatabaseError::Sqlx)?;
    decode_friends(&raw)
}

/// Get a user's profile.
pub async fn get_profile(pool: &SqlitePool, user_id: &str) -> Result<Profile> {
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT user_id, bio, email, mobile_number, friends
        FROM profiles
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Profile",
        id: user_id.to_string(),
    })?;

    row.into_profile()
}

/// Get a user's profile, creating an empty one if it is missing.
///
/// Registration creates profiles, so this only matters for rows that
/// predate that guarantee. The user itself must exist.
pub async fn get_or_create_profile(pool: &SqlitePool, user_id: &str) -> Result<Profile> {
    crate::user::get_user(pool, user_id).await?;

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO profiles (user_id)
        VALUES (?)
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    get_profile(pool, user_id).await
}

/// Update the mutable profile fields. Identity and friends are managed
/// elsewhere and stay untouched.
pub async fn update_profile(
    pool: &SqlitePool,
    user_id: &str,
    bio: Option<&str>,
    email: Option<&str>,
    mobile_number: Option<&str>,
) -> Result<Profile> {
    get_or_create_profile(pool, user_id).await?;

    sqlx::query(
        r#"
        UPDATE profiles
        SET bio = COALESCE(?, bio),
            email = COALESCE(?, email),
            mobile_number = COALESCE(?, mobile_number)
        WHERE user_id = ?
        "#,
    )
    .bind(bio)
    .bind(email)
    .bind(mobile_number)
    .bind(user_id)
    .execute(pool)
    .await?;

    get_profile(pool, user_id).await
}
