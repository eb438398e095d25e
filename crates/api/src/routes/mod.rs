//! Route handlers for the Parley API.

pub mod auth;
pub mod friends;
pub mod groups;
pub mod health;
pub mod messages;
pub mod polls;
pub mod upload;
pub mod users;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Auth
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/current-user", get(auth::current_user))
        // Users
        .route("/api/users", get(users::list_users))
        .route(
            "/api/users/:id",
            get(users::get_user).put(users::update_user),
        )
        // Friends
        .route("/api/friends", get(friends::friends_list))
        .route("/api/users/:id/add_friend", post(friends::add_friend))
        .route("/api/users/:id/remove_friend", post(friends::remove_friend))
        // Direct messages
        .route("/api/send", post(messages::send_message))
        .route("/api/messages", get(messages::list_messages))
        .route("/api/messages/:id", delete(messages::delete_message))
        .route("/api/check-new-chats", get(messages::check_new_chats))
        // Polls
        .route("/api/poll/vote", post(polls::vote))
        // Groups
        .route(
            "/api/groups",
            get(groups::list_groups).post(groups::create_group),
        )
        .route("/api/groups/:id/add_member", post(groups::add_member))
        .route("/api/groups/:id/remove_member", post(groups::remove_member))
        .route(
            "/api/group_messages",
            get(groups::list_group_messages).post(groups::send_group_message),
        )
        // Uploads
        .route("/api/upload", post(upload::upload))
}
