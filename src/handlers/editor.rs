// src/handlers/editor.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::editor_content::{EditorContent, SaveEditorContentRequest},
    utils::{
        extract::AppJson,
        session::Session,
    },
};

/// Saves the note of the signed-in user (or the shared anonymous note),
/// updating the existing row in place.
pub async fn save_editor_content(
    State(pool): State<PgPool>,
    Session(session): Session,
    AppJson(payload): AppJson<SaveEditorContentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let content = payload
        .content
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("No content provided".to_string()))?;

    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE editor_contents
        SET content = $1, updated_at = NOW()
        WHERE id = (
            SELECT id FROM editor_contents
            WHERE user_id IS NOT DISTINCT FROM $2
            ORDER BY id DESC
            LIMIT 1
        )
        "#,
    )
    .bind(&content)
    .bind(session.user_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        sqlx::query("INSERT INTO editor_contents (content, user_id) VALUES ($1, $2)")
            .bind(&content)
            .bind(session.user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Error saving editor content: {:?}", e);
                AppError::from(e)
            })?;
    }

    tx.commit().await?;

    Ok(Json(json!({ "message": "Content saved successfully" })))
}

pub async fn get_editor_content(
    State(pool): State<PgPool>,
    Session(session): Session,
) -> Result<impl IntoResponse, AppError> {
    let note = sqlx::query_as::<_, EditorContent>(
        r#"
        SELECT id, content, user_id, updated_at FROM editor_contents
        WHERE user_id IS NOT DISTINCT FROM $1
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(session.user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("No content found".to_string()))?;

    Ok(Json(json!({ "content": note.content, "updated_at": note.updated_at })))
}
