// src/handlers/scraping.rs

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
    models::quiz_set::StartScrapingRequest,
    scraping::{PgQuestionSink, SourceDescriptor, discussion, ingest},
    state::AppState,
    utils::{
        extract::{AppJson, AppPath},
        session::Session,
    },
};

/// Service banner.
pub async fn home() -> impl IntoResponse {
    Json(json!({
        "status": "success",
        "message": "Your application is running. Use /api/startScraping endpoint to start scraping."
    }))
}

/// Creates a quiz set and fills it from the given sources.
///
/// The set row is committed before any page is fetched, so a failing
/// source leaves a (possibly partial) set behind that readers can see.
#[utoipa::path(
    post,
    path = "/api/startScraping",
    request_body = StartScrapingRequest,
    responses(
        (status = 200, description = "Scraping completed"),
        (status = 400, description = "Invalid title or source descriptor"),
        (status = 500, description = "An upstream page could not be fetched")
    )
)]
pub async fn start_scraping(
    State(state): State<AppState>,
    Session(session): Session,
    AppJson(payload): AppJson<StartScrapingRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let mut descriptors = Vec::with_capacity(payload.urls.len());
    for value in &payload.urls {
        match SourceDescriptor::from_value(value).map_err(AppError::BadRequest)? {
            Some(descriptor) => descriptors.push(descriptor),
            None => tracing::info!("Ignoring source entry that is not a descriptor: {}", value),
        }
    }

    let quiz_set_id = uuid::Uuid::new_v4().to_string();
    let urls = serde_json::to_string(&payload.urls)?;

    sqlx::query(
        r#"
        INSERT INTO quiz_sets (id, title, raw_urls, urls, user_id)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(&quiz_set_id)
    .bind(&payload.title)
    .bind(&payload.raw_urls)
    .bind(&urls)
    .bind(session.user_id)
    .execute(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz set: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(
        "Created quiz set {} with {} source(s)",
        quiz_set_id,
        descriptors.len()
    );

    let mut sink = PgQuestionSink::new(state.pool.clone(), quiz_set_id.clone());
    ingest::run(&state.adapters, &state.fetcher, &descriptors, &mut sink).await?;

    Ok(Json(json!({
        "message": "Scraping completed.",
        "quiz_set_id": quiz_set_id
    })))
}

/// Scrapes the comments of a question's discussion page.
pub async fn get_discussion_comments(
    State(state): State<AppState>,
    AppPath(question_id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let link = discussion_link(&state.pool, question_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Question or discussion link not found".to_string()))?;

    let comments = discussion::fetch_discussion_comments(&state.fetcher, &link).await?;

    Ok(Json(json!({ "discussion_comments": comments })))
}

async fn discussion_link(pool: &PgPool, question_id: i64) -> Result<Option<String>, AppError> {
    let link: Option<Option<String>> =
        sqlx::query_scalar("SELECT discussion_link FROM questions WHERE id = $1")
            .bind(question_id)
            .fetch_optional(pool)
            .await?;

    Ok(link.flatten().filter(|l| !l.trim().is_empty()))
}
