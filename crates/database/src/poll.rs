//! Poll vote recording and reads.

use std::collections::BTreeMap;

use serde_json::Value;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Poll;
use crate::{message, validation};

/// Record a voter's selection on a message.
///
/// The selection is normalized (single index, numeric string, or list)
/// and replaces any prior entry by the same voter. Indices are not
/// checked against the poll's option count; out-of-range votes are
/// stored as given.
pub async fn record_vote(
    pool: &SqlitePool,
    message_id: i64,
    voter: &str,
    selected: &Value,
) -> Result<Vec<i64>> {
    let selection = validation::normalize_selection(selected)?;
    message::get_message(pool, message_id).await?;

    sqlx::query(
        r#"
        INSERT INTO poll_votes (message_id, voter, selection)
        VALUES (?, ?, ?)
        ON CONFLICT(message_id, voter) DO UPDATE SET
            selection = excluded.selection
        "#,
    )
    .bind(message_id)
    .bind(voter)
    .bind(serde_json::to_string(&selection).unwrap_or_else(|_| "[]".to_string()))
    .execute(pool)
    .await?;

    tracing::info!(message_id, voter, ?selection, "Recorded poll vote");
    Ok(selection)
}

/// Get the poll attached to a message, if any.
pub async fn poll_for(pool: &SqlitePool, message_id: i64) -> Result<Option<Poll>> {
    let row = sqlx::query_as::<_, (i64, String, String, bool)>(
        r#"
        SELECT message_id, question, options, allow_multiple
        FROM polls
        WHERE message_id = ?
        "#,
    )
    .bind(message_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some((message_id, question, options, allow_multiple)) => {
            let options = serde_json::from_str(&options).map_err(|e| {
                DatabaseError::InvalidInput(format!("corrupt poll options: {}", e))
            })?;
            Ok(Some(Poll {
                message_id,
                question,
                options,
                allow_multiple,
            }))
        }
        None => Ok(None),
    }
}

/// Get a message's vote map: voter → chosen option indices.
pub async fn votes_for(pool: &SqlitePool, message_id: i64) -> Result<BTreeMap<String, Vec<i64>>> {
    let rows = sqlx::query_as::<_, (String, String)>(
        r#"
        SELECT voter, selection
        FROM poll_votes
        WHERE message_id = ?
        ORDER BY voter
        "#,
    )
    .bind(message_id)
    .fetch_all(pool)
    .await?;

    let mut votes = BTreeMap::new();
    for (voter, selection) in rows {
        let selection = serde_json::from_str(&selection).map_err(|e| {
            DatabaseError::InvalidInput(format!("corrupt vote selection: {}", e))
        })?;
        votes.insert(voter, selection);
    }

    Ok(votes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewMessage, NewPoll, User};
    use crate::{user, Database};
    use serde_json::json;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn register(db: &Database, name: &str) -> User {
        user::register_user(db.pool(), name, "pw").await.unwrap()
    }

    async fn send_poll(db: &Database, sender: &User, receiver: &User) -> i64 {
        message::create_message(
            db.pool(),
            &NewMessage {
                sender_id: sender.id.clone(),
                receiver_id: Some(receiver.id.clone()),
                poll: Some(NewPoll {
                    question: "Lunch?".to_string(),
                    options: vec!["Pizza".to_string(), "Salad".to_string()],
                    allow_multiple: false,
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_poll_round_trip() {
        let db = test_db().await;
        let alice = register(&db, "alice").await;
        let bob = register(&db, "bob").await;

        let id = send_poll(&db, &alice, &bob).await;

        let poll = poll_for(db.pool(), id).await.unwrap().unwrap();
        assert_eq!(poll.question, "Lunch?");
        assert_eq!(poll.options, vec!["Pizza", "Salad"]);
        assert!(!poll.allow_multiple);

        record_vote(db.pool(), id, "bob", &json!(0)).await.unwrap();
        let votes = votes_for(db.pool(), id).await.unwrap();
        assert_eq!(votes.get("bob"), Some(&vec![0]));
    }

    #[tokio::test]
    async fn test_revote_replaces_not_merges() {
        let db = test_db().await;
        let alice = register(&db, "alice").await;
        let bob = register(&db, "bob").await;

        let id = send_poll(&db, &alice, &bob).await;
        record_vote(db.pool(), id, "bob", &json!([0])).await.unwrap();
        record_vote(db.pool(), id, "bob", &json!([1, 2]))
            .await
            .unwrap();

        let votes = votes_for(db.pool(), id).await.unwrap();
        assert_eq!(votes.get("bob"), Some(&vec![1, 2]));
        assert_eq!(votes.len(), 1);
    }

    #[tokio::test]
    async fn test_votes_from_multiple_voters() {
        let db = test_db().await;
        let alice = register(&db, "alice").await;
        let bob = register(&db, "bob").await;

        let id = send_poll(&db, &alice, &bob).await;
        record_vote(db.pool(), id, "bob", &json!("1")).await.unwrap();
        record_vote(db.pool(), id, "alice", &json!(0)).await.unwrap();

        let votes = votes_for(db.pool(), id).await.unwrap();
        assert_eq!(votes.get("alice"), Some(&vec![0]));
        assert_eq!(votes.get("bob"), Some(&vec![1]));
    }

    #[tokio::test]
    async fn test_invalid_selection_rejected() {
        let db = test_db().await;
        let alice = register(&db, "alice").await;
        let bob = register(&db, "bob").await;

        let id = send_poll(&db, &alice, &bob).await;
        let result = record_vote(db.pool(), id, "bob", &json!("pizza")).await;
        assert!(matches!(result, Err(DatabaseError::InvalidInput(_))));
        assert!(votes_for(db.pool(), id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_vote_on_missing_message() {
        let db = test_db().await;

        let result = record_vote(db.pool(), 99, "bob", &json!(0)).await;
        assert!(matches!(
            result,
            Err(DatabaseError::NotFound { entity: "Message", .. })
        ));
    }
}
