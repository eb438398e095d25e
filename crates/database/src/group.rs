//! Group CRUD and membership operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Group, User};
use crate::{user, validation};

/// Create a group with an initial member set.
pub async fn create_group(pool: &SqlitePool, name: &str, member_ids: &[String]) -> Result<Group> {
    validation::validate_group_name(name)?;
    for member_id in member_ids {
        user::get_user(pool, member_id).await?;
    }

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO groups (name)
        VALUES (?)
        "#,
    )
    .bind(name.trim())
    .execute(&mut *tx)
    .await?;

    let group_id = result.last_insert_rowid();

    for member_id in member_ids {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO group_members (group_id, user_id)
            VALUES (?, ?)
            "#,
        )
        .bind(group_id)
        .bind(member_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(group_id, name, members = member_ids.len(), "Created group");

    get_group(pool, group_id).await
}

/// Get a group by ID.
pub async fn get_group(pool: &SqlitePool, id: i64) -> Result<Group> {
    sqlx::query_as::<_, Group>(
        r#"
        SELECT id, name
        FROM groups
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Group",
        id: id.to_string(),
    })
}

/// List all groups.
pub async fn list_groups(pool: &SqlitePool) -> Result<Vec<Group>> {
    let groups = sqlx::query_as::<_, Group>(
        r#"
        SELECT id, name
        FROM groups
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(groups)
}

/// Add a user to a group. Adding an existing member is a no-op.
pub async fn add_member(pool: &SqlitePool, group_id: i64, user_id: &str) -> Result<()> {
    get_group(pool, group_id).await?;
    user::get_user(pool, user_id).await?;

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO group_members (group_id, user_id)
        VALUES (?, ?)
        "#,
    )
    .bind(group_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove a user from a group. Removing a non-member is a no-op.
pub async fn remove_member(pool: &SqlitePool, group_id: i64, user_id: &str) -> Result<()> {
    get_group(pool, group_id).await?;
    user::get_user(pool, user_id).await?;

    sqlx::query(
        r#"
        DELETE FROM group_members
        WHERE group_id = ? AND user_id = ?
        "#,
    )
    .bind(group_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Check whether a user is currently a member of a group.
pub async fn is_member(pool: &SqlitePool, group_id: i64, user_id: &str) -> Result<bool> {
    let result = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT 1
        FROM group_members
        WHERE group_id = ? AND user_id = ?
        "#,
    )
    .bind(group_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(result.is_some())
}

/// Get a group's members as full user records.
pub async fn list_members(pool: &SqlitePool, group_id: i64) -> Result<Vec<User>> {
    let members = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.created_at
        FROM users u
        INNER JOIN group_members gm ON gm.user_id = u.id
        WHERE gm.group_id = ?
        ORDER BY u.username
        "#,
    )
    .bind(group_id)
    .fetch_all(pool)
    .await?;

    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{user, Database};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_group_lifecycle() {
        let db = test_db().await;
        let alice = user::register_user(db.pool(), "alice", "pw").await.unwrap();
        let bob = user::register_user(db.pool(), "bob", "pw").await.unwrap();

        let group = create_group(db.pool(), "team", &[alice.id.clone(), bob.id.clone()])
            .await
            .unwrap();
        assert_eq!(group.name, "team");

        let members = list_members(db.pool(), group.id).await.unwrap();
        assert_eq!(members.len(), 2);
        assert!(is_member(db.pool(), group.id, &alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_membership_is_idempotent() {
        let db = test_db().await;
        let alice = user::register_user(db.pool(), "alice", "pw").await.unwrap();
        let group = create_group(db.pool(), "team", &[]).await.unwrap();

        add_member(db.pool(), group.id, &alice.id).await.unwrap();
        add_member(db.pool(), group.id, &alice.id).await.unwrap();
        assert_eq!(list_members(db.pool(), group.id).await.unwrap().len(), 1);

        remove_member(db.pool(), group.id, &alice.id).await.unwrap();
        remove_member(db.pool(), group.id, &alice.id).await.unwrap();
        assert!(list_members(db.pool(), group.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_group_or_user() {
        let db = test_db().await;
        let alice = user::register_user(db.pool(), "alice", "pw").await.unwrap();

        let result = add_member(db.pool(), 99, &alice.id).await;
        assert!(matches!(
            result,
            Err(DatabaseError::NotFound { entity: "Group", .. })
        ));

        let group = create_group(db.pool(), "team", &[]).await.unwrap();
        let result = add_member(db.pool(), group.id, "missing").await;
        assert!(matches!(
            result,
            Err(DatabaseError::NotFound { entity: "User", .. })
        ));
    }

    #[tokio::test]
    async fn test_create_group_rejects_unknown_member() {
        let db = test_db().await;

        let result = create_group(db.pool(), "team", &["missing".to_string()]).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
        assert!(list_groups(db.pool()).await.unwrap().is_empty());
    }
}
