// src/models/editor_content.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'editor_contents' table: one free-form note per user,
/// plus one shared note for anonymous sessions.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EditorContent {
    pub id: i64,
    pub content: String,
    pub user_id: Option<i64>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SaveEditorContentRequest {
    #[serde(default)]
    pub content: Option<String>,
}
