// src/handlers/explanation.rs

use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::further_explanation::{
        FurtherExplanation, GenerateExplanationRequest, SaveExplanationRequest,
    },
    services::explanation::build_prompt,
    state::AppState,
    utils::extract::{AppJson, AppPath},
};

/// Asks the configured text-generation providers, in order, to explain
/// why the answer is correct. Nothing is cached or stored.
#[utoipa::path(
    post,
    path = "/api/getFurtherExplanation",
    request_body = GenerateExplanationRequest,
    responses(
        (status = 200, description = "Generated explanation"),
        (status = 500, description = "Every provider failed")
    )
)]
pub async fn generate_further_explanation(
    State(state): State<AppState>,
    AppJson(payload): AppJson<GenerateExplanationRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let prompt = build_prompt(
        &payload.question_text,
        &payload.options,
        &payload.answer,
        payload.explanation.as_deref(),
    );

    let further_explanation = state.explainer.generate(&prompt).await?;

    Ok(Json(json!({ "further_explanation": further_explanation })))
}

/// Appends an explanation to a question's history.
pub async fn save_further_explanation(
    State(pool): State<PgPool>,
    AppJson(payload): AppJson<SaveExplanationRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM questions WHERE id = $1")
        .bind(payload.question_id)
        .fetch_optional(&pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    sqlx::query("INSERT INTO further_explanations (question_id, explanation) VALUES ($1, $2)")
        .bind(payload.question_id)
        .bind(&payload.explanation)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save further explanation: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Json(json!({ "message": "Further explanation saved" })))
}

/// The most recently saved explanation of a question.
pub async fn get_further_explanation(
    State(pool): State<PgPool>,
    AppPath(question_id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let latest = sqlx::query_as::<_, FurtherExplanation>(
        r#"
        SELECT id, question_id, explanation, created_at
        FROM further_explanations
        WHERE question_id = $1
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(question_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Further explanation not found".to_string()))?;

    tracing::debug!(
        "Serving explanation {} of question {} saved at {}",
        latest.id,
        latest.question_id,
        latest.created_at
    );
    Ok(Json(json!({ "explanation": latest.explanation })))
}
