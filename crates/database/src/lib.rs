//! SQLite persistence layer for Parley.
//!
//! This crate owns the chat domain: users and profiles, groups and
//! membership, messages with their soft-delete visibility model, the
//! mutual-friendship manager, and poll voting. All operations are async
//! SQLx queries against SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{message, user, Database};
//! use database::models::NewMessage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:parley.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let alice = user::register_user(db.pool(), "alice", "secret").await?;
//!     let bob = user::register_user(db.pool(), "bob", "secret").await?;
//!
//!     message::create_message(
//!         db.pool(),
//!         &NewMessage {
//!             sender_id: alice.id,
//!             receiver_id: Some(bob.id),
//!             content: "hello".to_string(),
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod deletion;
pub mod error;
pub mod friendship;
pub mod group;
pub mod message;
pub mod models;
pub mod poll;
pub mod profile;
pub mod user;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{DeleteMode, Group, Message, NewMessage, NewPoll, Poll, Profile, User};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 16;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `sqlite::memory:` for tests.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewMessage, NewPoll};
    use serde_json::json;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    // End-to-end run of the poll scenario: alice sends bob a poll, bob
    // votes, the vote map reads back {"bob": [0]}.
    #[tokio::test]
    async fn test_poll_scenario() {
        let db = test_db().await;

        let alice = user::register_user(db.pool(), "alice", "pw").await.unwrap();
        let bob = user::register_user(db.pool(), "bob", "pw").await.unwrap();

        let msg = message::create_message(
            db.pool(),
            &NewMessage {
                sender_id: alice.id.clone(),
                receiver_id: Some(bob.id.clone()),
                poll: Some(NewPoll {
                    question: "Lunch?".to_string(),
                    options: vec!["Pizza".to_string(), "Salad".to_string()],
                    allow_multiple: false,
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        poll::record_vote(db.pool(), msg.id, "bob", &json!(0))
            .await
            .unwrap();

        let votes = poll::votes_for(db.pool(), msg.id).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes.get("bob"), Some(&vec![0]));

        let poll = poll::poll_for(db.pool(), msg.id).await.unwrap().unwrap();
        assert_eq!(poll.question, "Lunch?");
    }

    // "Delete for me" hides the message from alice without touching
    // bob's view.
    #[tokio::test]
    async fn test_delete_for_me_scenario() {
        let db = test_db().await;

        let alice = user::register_user(db.pool(), "alice", "pw").await.unwrap();
        let bob = user::register_user(db.pool(), "bob", "pw").await.unwrap();

        let msg = message::create_message(
            db.pool(),
            &NewMessage {
                sender_id: alice.id.clone(),
                receiver_id: Some(bob.id.clone()),
                content: "hello".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        deletion::delete_message(db.pool(), msg.id, &alice.id, DeleteMode::ForMe)
            .await
            .unwrap();

        assert!(message::list_conversation(db.pool(), &alice.id, &bob.id)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            message::list_conversation(db.pool(), &bob.id, &alice.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
