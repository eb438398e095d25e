//! File upload endpoint.
//!
//! Stores the blob under the configured media directory and returns the
//! URL it will be served from. Only the reference string ends up in
//! messages; the bytes stay on disk.

use axum::extract::{Multipart, State};
use axum::Json;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Accept a multipart `file` field and store it.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let data = field.bytes().await?;

        // Uploads share one directory; prefix with a UUID so names
        // never collide, and keep only safe filename characters.
        let safe_name: String = original_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let stored_name = format!("{}_{}", Uuid::new_v4(), safe_name);

        tokio::fs::create_dir_all(&state.config.media_dir).await?;
        tokio::fs::write(state.config.media_dir.join(&stored_name), &data).await?;

        info!(
            file = %stored_name,
            bytes = data.len(),
            "Stored uploaded file"
        );

        return Ok(Json(serde_json::json!({
            "url": format!("/media/{}", stored_name)
        })));
    }

    Err(ApiError::Database(database::DatabaseError::InvalidInput(
        "no file uploaded".to_string(),
    )))
}
