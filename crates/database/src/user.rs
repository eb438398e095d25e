//! User CRUD and credential checks.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::User;
use crate::validation;

/// Register a new user.
///
/// Hashes the password with argon2 and creates the user's profile in the
/// same transaction, so every user has a profile from the start.
pub async fn register_user(pool: &SqlitePool, username: &str, password: &str) -> Result<User> {
    validation::validate_username(username)?;
    validation::validate_password(password)?;
    let username = username.trim();

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    let id = Uuid::new_v4().to_string();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO users (id, username, password_hash)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(username)
    .bind(&password_hash)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "User",
                    id: username.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    sqlx::query(
        r#"
        INSERT INTO profiles (user_id)
        VALUES (?)
        "#,
    )
    .bind(&id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(username, "Registered user");

    get_user(pool, &id).await
}

/// Get a user by ID.
pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: id.to_string(),
    })
}

/// Get a user by username.
pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, created_at
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: username.to_string(),
    })
}

/// List all users, ordered by username.
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, created_at
        FROM users
        ORDER BY username
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Check a user's credentials.
///
/// Returns the user on success, `NotFound` for an unknown username, and
/// `InvalidInput` for a wrong password.
pub async fn verify_credentials(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<User> {
    let row = sqlx::query_as::<_, (String, String)>(
        r#"
        SELECT id, password_hash
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: username.to_string(),
    })?;

    let (id, password_hash) = row;
    let parsed = PasswordHash::new(&password_hash)?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_err()
    {
        return Err(DatabaseError::InvalidInput("invalid password".to_string()));
    }

    get_user(pool, &id).await
}

/// Delete a user by ID. Cascades to their profile, memberships, and
/// deletion markers.
pub async fn delete_user(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: id.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_register_and_fetch() {
        let db = test_db().await;

        let user = register_user(db.pool(), "alice", "hunter2").await.unwrap();
        assert_eq!(user.username, "alice");

        let by_id = get_user(db.pool(), &user.id).await.unwrap();
        let by_name = get_user_by_username(db.pool(), "alice").await.unwrap();
        assert_eq!(by_id, by_name);
    }

    #[tokio::test]
    async fn test_register_creates_profile() {
        let db = test_db().await;

        let user = register_user(db.pool(), "alice", "hunter2").await.unwrap();
        let profile = crate::profile::get_profile(db.pool(), &user.id)
            .await
            .unwrap();
        assert_eq!(profile.user_id, user.id);
        assert!(profile.friends.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = test_db().await;

        register_user(db.pool(), "alice", "hunter2").await.unwrap();
        let result = register_user(db.pool(), "alice", "other").await;
        assert!(matches!(
            result,
            Err(DatabaseError::AlreadyExists { entity: "User", .. })
        ));

        let users = list_users(db.pool()).await.unwrap();
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let db = test_db().await;

        let user = register_user(db.pool(), "alice", "hunter2").await.unwrap();

        let ok = verify_credentials(db.pool(), "alice", "hunter2")
            .await
            .unwrap();
        assert_eq!(ok.id, user.id);

        let wrong = verify_credentials(db.pool(), "alice", "nope").await;
        assert!(matches!(wrong, Err(DatabaseError::InvalidInput(_))));

        let unknown = verify_credentials(db.pool(), "bob", "hunter2").await;
        assert!(matches!(unknown, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_empty_username_rejected() {
        let db = test_db().await;

        let result = register_user(db.pool(), "   ", "hunter2").await;
        assert!(matches!(result, Err(DatabaseError::InvalidInput(_))));
    }
}
