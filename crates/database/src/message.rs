//! Message creation and visibility-filtered listings.
//!
//! Listing queries implement the soft-delete model in SQL: the global
//! `deleted_for_everyone` flag hides a message from every viewer, a row
//! in `message_deletions` hides it from that viewer only. Results are
//! ordered by creation timestamp, message id breaking ties.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Message, NewMessage, User};
use crate::validation::ValidationError;
use crate::{group, profile, user};

const MESSAGE_COLUMNS: &str = r#"
    id, sender_id, receiver_id, group_id, content,
    image_url, document_url, document_name,
    deleted_for_everyone, created_at
"#;

/// Create a message, direct or group.
///
/// Exactly one of `receiver_id` / `group_id` must be set. A poll, text
/// content, or an attachment reference is required. The poll sub-entity
/// is written in the same transaction as the message.
pub async fn create_message(pool: &SqlitePool, new: &NewMessage) -> Result<Message> {
    match (&new.receiver_id, new.group_id) {
        (Some(_), Some(_)) => {
            return Err(DatabaseError::InvalidInput(
                "message cannot have both a receiver and a group".to_string(),
            ))
        }
        (None, None) => {
            return Err(DatabaseError::InvalidInput(
                "message requires a receiver or a group".to_string(),
            ))
        }
        _ => {}
    }

    user::get_user(pool, &new.sender_id).await?;
    if let Some(receiver_id) = &new.receiver_id {
        user::get_user(pool, receiver_id).await?;
        // Sending a direct message establishes the chat relationship;
        // both sides need a profile row.
        profile::get_or_create_profile(pool, &new.sender_id).await?;
        profile::get_or_create_profile(pool, receiver_id).await?;
    }
    if let Some(group_id) = new.group_id {
        group::get_group(pool, group_id).await?;
    }

    if let Some(poll) = &new.poll {
        if poll.question.trim().is_empty() || poll.options.is_empty() {
            return Err(ValidationError::InvalidPoll(
                "question and options required".to_string(),
            )
            .into());
        }
    } else if new.content.is_empty() && new.image_url.is_none() && new.document_url.is_none() {
        return Err(DatabaseError::InvalidInput(
            "content, image, or document required".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO messages (sender_id, receiver_id, group_id, content,
                              image_url, document_url, document_name)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new.sender_id)
    .bind(&new.receiver_id)
    .bind(new.group_id)
    .bind(&new.content)
    .bind(&new.image_url)
    .bind(&new.document_url)
    .bind(&new.document_name)
    .execute(&mut *tx)
    .await?;

    let message_id = result.last_insert_rowid();

    if let Some(poll) = &new.poll {
        sqlx::query(
            r#"
            INSERT INTO polls (message_id, question, options, allow_multiple)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(message_id)
        .bind(&poll.question)
        .bind(serde_json::to_string(&poll.options).unwrap_or_else(|_| "[]".to_string()))
        .bind(poll.allow_multiple)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        message_id,
        sender = %new.sender_id,
        group = ?new.group_id,
        "Stored message"
    );

    get_message(pool, message_id).await
}

/// Get a message by ID.
pub async fn get_message(pool: &SqlitePool, id: i64) -> Result<Message> {
    sqlx::query_as::<_, Message>(&format!(
        r#"
        SELECT {MESSAGE_COLUMNS}
        FROM messages
        WHERE id = ?
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Message",
        id: id.to_string(),
    })
}

/// List the direct conversation between two users, as seen by the viewer.
///
/// Candidates are messages in either direction between the two; globally
/// deleted messages and messages the viewer deleted for themselves are
/// filtered out. The partner's own deletions do not affect this listing.
pub async fn list_conversation(
    pool: &SqlitePool,
    viewer_id: &str,
    partner_id: &str,
) -> Result<Vec<Message>> {
    user::get_user(pool, viewer_id).await?;
    user::get_user(pool, partner_id).await?;

    let messages = sqlx::query_as::<_, Message>(&format!(
        r#"
        SELECT {MESSAGE_COLUMNS}
        FROM messages m
        WHERE ((m.sender_id = ?1 AND m.receiver_id = ?2)
            OR (m.sender_id = ?2 AND m.receiver_id = ?1))
          AND m.deleted_for_everyone = 0
          AND NOT EXISTS (
              SELECT 1 FROM message_deletions d
              WHERE d.message_id = m.id AND d.user_id = ?1
          )
        ORDER BY m.created_at, m.id
        "#
    ))
    .bind(viewer_id)
    .bind(partner_id)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

/// List a group's messages, as seen by the viewer.
///
/// A current member sees every message that survives the deletion
/// filters. A user who left the group keeps seeing the messages they
/// sent; one who never sent anything there is refused outright.
pub async fn list_group_messages(
    pool: &SqlitePool,
    group_id: i64,
    viewer_id: &str,
) -> Result<Vec<Message>> {
    group::get_group(pool, group_id).await?;
    user::get_user(pool, viewer_id).await?;

    let is_member = group::is_member(pool, group_id, viewer_id).await?;
    if !is_member {
        let sent: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM messages
            WHERE group_id = ? AND sender_id = ?
            "#,
        )
        .bind(group_id)
        .bind(viewer_id)
        .fetch_one(pool)
        .await?;

        if sent == 0 {
            return Err(DatabaseError::PermissionDenied(
                "not a member of this group".to_string(),
            ));
        }
    }

    let messages = sqlx::query_as::<_, Message>(&format!(
        r#"
        SELECT {MESSAGE_COLUMNS}
        FROM messages m
        WHERE m.group_id = ?1
          AND m.deleted_for_everyone = 0
          AND (?3 OR m.sender_id = ?2)
          AND NOT EXISTS (
              SELECT 1 FROM message_deletions d
              WHERE d.message_id = m.id AND d.user_id = ?2
          )
        ORDER BY m.created_at, m.id
        "#
    ))
    .bind(group_id)
    .bind(viewer_id)
    .bind(is_member)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

/// Find every user the given user has visible direct traffic with.
pub async fn chat_partners(pool: &SqlitePool, user_id: &str) -> Result<Vec<User>> {
    user::get_user(pool, user_id).await?;

    let partners = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.created_at
        FROM users u
        WHERE u.id IN (
            SELECT m.sender_id
            FROM messages m
            WHERE m.receiver_id = ?1
              AND m.deleted_for_everyone = 0
              AND NOT EXISTS (
                  SELECT 1 FROM message_deletions d
                  WHERE d.message_id = m.id AND d.user_id = ?1
              )
            UNION
            SELECT m.receiver_id
            FROM messages m
            WHERE m.sender_id = ?1
              AND m.receiver_id IS NOT NULL
              AND m.deleted_for_everyone = 0
              AND NOT EXISTS (
                  SELECT 1 FROM message_deletions d
                  WHERE d.message_id = m.id AND d.user_id = ?1
              )
        )
        ORDER BY u.username
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(partners)
}
