//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered user. The password hash never leaves the `user` module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// UUIDv4 identifier.
    pub id: String,
    /// Unique login name.
    pub username: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// Per-user profile, created together with the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Owning user id.
    pub user_id: String,
    pub bio: String,
    pub email: String,
    pub mobile_number: String,
    /// Friend user ids. Logically a set, stored as an ordered list;
    /// the friendship module keeps it duplicate-free and symmetric.
    pub friends: Vec<String>,
}

/// A named chat group. Membership lives in the `group_members` relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: i64,
    pub name: String,
}

/// A direct or group message.
///
/// Exactly one of `receiver_id` / `group_id` is set. Deletion never
/// removes the row; `deleted_for_everyone` and the `message_deletions`
/// relation only hide it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub sender_id: String,
    pub receiver_id: Option<String>,
    pub group_id: Option<i64>,
    pub content: String,
    pub image_url: Option<String>,
    pub document_url: Option<String>,
    pub document_name: Option<String>,
    /// Irreversible global soft-delete flag.
    pub deleted_for_everyone: bool,
    /// Server-assigned, immutable.
    pub created_at: String,
}

impl Message {
    /// Whether this is a group message (as opposed to a direct one).
    pub fn is_group_message(&self) -> bool {
        self.group_id.is_some()
    }
}

/// Poll attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub message_id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub allow_multiple: bool,
}

/// Input for creating a poll alongside a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPoll {
    pub question: String,
    pub options: Vec<String>,
    #[serde(default, alias = "allowMultiple")]
    pub allow_multiple: bool,
}

/// Input for creating a message.
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub sender_id: String,
    pub receiver_id: Option<String>,
    pub group_id: Option<i64>,
    pub content: String,
    pub image_url: Option<String>,
    pub document_url: Option<String>,
    pub document_name: Option<String>,
    pub poll: Option<NewPoll>,
}

/// Message deletion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    /// Hide the message for the requesting user only.
    ForMe,
    /// Hide the message for everyone, irreversibly. Sender only.
    ForEveryone,
}
