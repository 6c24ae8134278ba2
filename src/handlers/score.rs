// src/handlers/score.rs

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    config::Config,
    error::AppError,
    models::question::UpdateScoreRequest,
    utils::{
        extract::AppJson,
        session::{Session, session_cookie},
    },
};

/// Moves this browser's running score for a quiz set up or down by one.
/// The score never drops below zero.
pub async fn update_score(
    State(config): State<Config>,
    Session(mut session): Session,
    AppJson(payload): AppJson<UpdateScoreRequest>,
) -> Result<impl IntoResponse, AppError> {
    let score = session
        .scores
        .entry(payload.quiz_set_id.clone())
        .or_insert(0);
    *score = if payload.increment {
        *score + 1
    } else {
        (*score - 1).max(0)
    };
    let current_score = *score;

    tracing::debug!(
        "Score for quiz set {} is now {} (question {:?})",
        payload.quiz_set_id,
        current_score,
        payload.question_id
    );

    let cookie = session_cookie(&config, &session)?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "message": "Score updated", "current_score": current_score })),
    ))
}

pub async fn get_score(Session(session): Session, Path(id): Path<String>) -> Response {
    match session.scores.get(&id) {
        Some(score) => Json(json!({ "score": score })).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Score not available", "score": 0 })),
        )
            .into_response(),
    }
}
