//! Wire representations of the domain models.
//!
//! Field names mirror the client contract: mixed snake_case and
//! camelCase (`imageUrl`, `pollVotes`) are intentional.

use std::collections::BTreeMap;

use database::models::{Group, Message, Poll, User};
use database::{group, poll, profile, user, Database};
use serde::Serialize;

use crate::error::Result;

/// Profile as serialized inside a user.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    /// Owning user id.
    pub user: String,
    pub friends: Vec<String>,
    pub bio: String,
    pub email: String,
    pub mobile_number: String,
}

/// User with embedded profile.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub profile: ProfileView,
}

/// Group with hydrated members.
#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub id: i64,
    pub name: String,
    pub members: Vec<UserView>,
}

/// Poll metadata attached to a message.
#[derive(Debug, Clone, Serialize)]
pub struct PollView {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "allowMultiple")]
    pub allow_multiple: bool,
}

impl From<Poll> for PollView {
    fn from(poll: Poll) -> Self {
        Self {
            question: poll.question,
            options: poll.options,
            allow_multiple: poll.allow_multiple,
        }
    }
}

/// Message with hydrated participants, poll, and vote map.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: i64,
    pub sender: UserView,
    pub receiver: Option<UserView>,
    pub group_id: Option<i64>,
    pub content: String,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(rename = "documentUrl")]
    pub document_url: Option<String>,
    #[serde(rename = "documentName")]
    pub document_name: Option<String>,
    pub timestamp: String,
    pub poll: Option<PollView>,
    #[serde(rename = "pollVotes")]
    pub poll_votes: BTreeMap<String, Vec<i64>>,
}

/// Build the wire view of a user, embedding their profile.
pub async fn user_view(db: &Database, user: &User) -> Result<UserView> {
    let profile = profile::get_or_create_profile(db.pool(), &user.id).await?;
    Ok(UserView {
        id: user.id.clone(),
        username: user.username.clone(),
        profile: ProfileView {
            user: profile.user_id,
            friends: profile.friends,
            bio: profile.bio,
            email: profile.email,
            mobile_number: profile.mobile_number,
        },
    })
}

/// Build wire views for a list of users.
pub async fn user_views(db: &Database, users: &[User]) -> Result<Vec<UserView>> {
    let mut views = Vec::with_capacity(users.len());
    for user in users {
        views.push(user_view(db, user).await?);
    }
    Ok(views)
}

/// Build the wire view of a group, hydrating its member list.
pub async fn group_view(db: &Database, group: &Group) -> Result<GroupView> {
    let members = group::list_members(db.pool(), group.id).await?;
    Ok(GroupView {
        id: group.id,
        name: group.name.clone(),
        members: user_views(db, &members).await?,
    })
}

/// Build the wire view of a message, hydrating sender, receiver, poll,
/// and the vote map.
pub async fn message_view(db: &Database, message: &Message) -> Result<MessageView> {
    let sender = user::get_user(db.pool(), &message.sender_id).await?;
    let sender = user_view(db, &sender).await?;

    let receiver = match &message.receiver_id {
        Some(receiver_id) => {
            let receiver = user::get_user(db.pool(), receiver_id).await?;
            Some(user_view(db, &receiver).await?)
        }
        None => None,
    };

    let poll = poll::poll_for(db.pool(), message.id).await?.map(PollView::from);
    let poll_votes = poll::votes_for(db.pool(), message.id).await?;

    Ok(MessageView {
        id: message.id,
        sender,
        receiver,
        group_id: message.group_id,
        content: message.content.clone(),
        image_url: message.image_url.clone(),
        document_url: message.document_url.clone(),
        document_name: message.document_name.clone(),
        timestamp: message.created_at.clone(),
        poll,
        poll_votes,
    })
}

/// Build wire views for a list of messages.
pub async fn message_views(db: &Database, messages: &[Message]) -> Result<Vec<MessageView>> {
    let mut views = Vec::with_capacity(messages.len());
    for message in messages {
        views.push(message_view(db, message).await?);
    }
    Ok(views)
}
