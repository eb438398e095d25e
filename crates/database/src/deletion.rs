//! Message deletion: authorization plus soft-delete mutation.
//!
//! Nothing here removes rows. "For me" records a per-user marker,
//! "for everyone" sets the global flag; both are idempotent and the
//! global flag is never cleared.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::DeleteMode;
use crate::{group, message, user};

/// Delete a message for the requesting user or for everyone.
///
/// Direct messages may be deleted by the sender or receiver; group
/// messages by the sender or any current member. `ForEveryone` is
/// restricted to the sender. Authorization happens before any write.
pub async fn delete_message(
    pool: &SqlitePool,
    message_id: i64,
    user_id: &str,
    mode: DeleteMode,
) -> Result<()> {
    let msg = message::get_message(pool, message_id).await?;
    user::get_user(pool, user_id).await?;

    let is_sender = msg.sender_id == user_id;
    let authorized = if let Some(group_id) = msg.group_id {
        is_sender || group::is_member(pool, group_id, user_id).await?
    } else {
        is_sender || msg.receiver_id.as_deref() == Some(user_id)
    };

    if !authorized {
        return Err(DatabaseError::PermissionDenied(if msg.is_group_message() {
            "only group members can delete group messages".to_string()
        } else {
            "only the sender or receiver can delete this message".to_string()
        }));
    }

    match mode {
        DeleteMode::ForMe => {
            // Single-statement insert: concurrent markers from different
            // users cannot lose each other, repeats are no-ops.
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO message_deletions (message_id, user_id)
                VALUES (?, ?)
                "#,
            )
            .bind(message_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        }
        DeleteMode::ForEveryone => {
            if !is_sender {
                return Err(DatabaseError::PermissionDenied(
                    "only the sender can delete a message for everyone".to_string(),
                ));
            }

            sqlx::query(
                r#"
                UPDATE messages
                SET deleted_for_everyone = 1
                WHERE id = ?
                "#,
            )
            .bind(message_id)
            .execute(pool)
            .await?;
        }
    }

    tracing::info!(message_id, user_id, ?mode, "Deleted message");
    Ok(())
}
