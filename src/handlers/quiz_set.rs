// src/handlers/quiz_set.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::{Value, json};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        app_flag::{self, GLOBAL_LOCK},
        attempt::Attempt,
        quiz_set::{
            CurrentIndexRequest, DeleteMultipleRequest, EyeIconStateRequest, QuizSet,
            QuizSetStateRequest, QuizSetSummary, RecordAttemptRequest, RenameQuizSetRequest,
            SortOrderRequest, UpdateStatusRequest, compute_progress,
        },
    },
    utils::extract::AppJson,
};

/// Lock state before the global switch is first toggled.
const GLOBAL_LOCK_DEFAULT: bool = true;

fn quiz_set_not_found() -> AppError {
    AppError::NotFound("Quiz set not found".to_string())
}

async fn fetch_quiz_set(pool: &PgPool, id: &str) -> Result<QuizSet, AppError> {
    sqlx::query_as::<_, QuizSet>("SELECT * FROM quiz_sets WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch quiz set {}: {:?}", id, e);
            AppError::from(e)
        })?
        .ok_or_else(quiz_set_not_found)
}

/// Every quiz set with its attempt and answer statistics.
#[utoipa::path(
    get,
    path = "/api/getQuizSets",
    responses((status = 200, description = "All quiz sets", body = [QuizSetSummary]))
)]
pub async fn list_quiz_sets(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let sets = sqlx::query_as::<_, QuizSetSummary>(
        r#"
        SELECT
            qs.id,
            qs.title,
            qs.score,
            (SELECT COUNT(*) FROM attempts a WHERE a.quiz_set_id = qs.id) AS attempts,
            (SELECT AVG(a.score)::FLOAT8 FROM attempts a WHERE a.quiz_set_id = qs.id) AS average_score,
            (SELECT a.score FROM attempts a WHERE a.quiz_set_id = qs.id
                ORDER BY a.timestamp DESC, a.id DESC LIMIT 1) AS latest_score,
            (SELECT COUNT(*) FROM questions q WHERE q.quiz_set_id = qs.id) AS total_questions,
            (SELECT COUNT(*) FROM questions q
                WHERE q.quiz_set_id = qs.id AND q.user_selected_option IS NULL) AS unanswered_questions,
            qs.finished,
            qs.progress,
            qs.last_updated
        FROM quiz_sets qs
        ORDER BY qs.created_at, qs.id
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list quiz sets: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(sets))
}

pub async fn rename_quiz_set(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<RenameQuizSetRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let result = sqlx::query("UPDATE quiz_sets SET title = $1, last_updated = NOW() WHERE id = $2")
        .bind(&payload.new_title)
        .bind(&id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(quiz_set_not_found());
    }

    Ok(Json(json!({ "message": "Quiz set title updated successfully" })))
}

pub async fn get_quiz_set_details(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_set = fetch_quiz_set(&pool, &id).await?;

    let (total, answered): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(user_selected_option) FROM questions WHERE quiz_set_id = $1",
    )
    .bind(&id)
    .fetch_one(&pool)
    .await?;

    let urls = quiz_set
        .urls
        .as_deref()
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .unwrap_or_else(|| json!([]));

    Ok(Json(json!({
        "id": quiz_set.id,
        "title": quiz_set.title,
        "urls": urls,
        "progress": compute_progress(quiz_set.finished, answered, total),
        "total_questions": total,
        "answered_questions": answered,
        "score": quiz_set.score,
        "attempts": quiz_set.attempts,
    })))
}

/// Correct answers among the current selections.
pub async fn get_quiz_set_score(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    fetch_quiz_set(&pool, &id).await?;

    let (score, total): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE user_selected_option = answer),
            COUNT(*)
        FROM questions
        WHERE quiz_set_id = $1
        "#,
    )
    .bind(&id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({ "score": score, "total_questions": total })))
}

/// Records a finished attempt with the score the client reports.
#[utoipa::path(
    post,
    path = "/api/updateQuizSetScore/{id}",
    params(("id" = String, Path, description = "Quiz set id")),
    request_body = RecordAttemptRequest,
    responses(
        (status = 200, description = "Attempt recorded"),
        (status = 404, description = "Quiz set not found")
    )
)]
pub async fn record_attempt(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<RecordAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let mut tx = pool.begin().await?;

    let attempts: Option<i32> = sqlx::query_scalar(
        r#"
        UPDATE quiz_sets
        SET attempts = attempts + 1,
            finished = TRUE,
            progress = 100,
            score = $2,
            last_updated = NOW()
        WHERE id = $1
        RETURNING attempts
        "#,
    )
    .bind(&id)
    .bind(payload.score)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(attempts) = attempts else {
        return Err(quiz_set_not_found());
    };

    sqlx::query("INSERT INTO attempts (quiz_set_id, score) VALUES ($1, $2)")
        .bind(&id)
        .bind(payload.score)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to record attempt: {:?}", e);
            AppError::from(e)
        })?;

    tx.commit().await?;

    tracing::info!("New attempt recorded for quiz set {}. Total attempts: {}", id, attempts);

    Ok(Json(json!({ "message": "Score updated successfully" })))
}

/// Attempt history, oldest first.
pub async fn get_attempts(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    fetch_quiz_set(&pool, &id).await?;

    let attempts = sqlx::query_as::<_, Attempt>(
        "SELECT id, quiz_set_id, score, timestamp FROM attempts WHERE quiz_set_id = $1 ORDER BY timestamp, id",
    )
    .bind(&id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(attempts))
}

pub async fn delete_quiz_set(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM quiz_sets WHERE id = $1")
        .bind(&id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(quiz_set_not_found());
    }

    tracing::info!("Deleted quiz set {}", id);
    Ok(Json(json!({ "message": format!("Quiz set {} deleted successfully", id) })))
}

pub async fn delete_multiple_quiz_sets(
    State(pool): State<PgPool>,
    AppJson(payload): AppJson<DeleteMultipleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.quiz_set_ids.is_empty() {
        return Err(AppError::BadRequest(
            "No quiz sets specified for deletion".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;
    let result = sqlx::query("DELETE FROM quiz_sets WHERE id = ANY($1)")
        .bind(&payload.quiz_set_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete quiz sets: {:?}", e);
            AppError::from(e)
        })?;
    tx.commit().await?;

    tracing::info!("Deleted {} quiz set(s)", result.rows_affected());
    Ok(Json(json!({
        "message": format!("{} quiz sets deleted successfully", payload.quiz_set_ids.len())
    })))
}

pub async fn delete_all_quiz_sets(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM quiz_sets").execute(&pool).await?;

    tracing::info!("Deleted all {} quiz set(s)", result.rows_affected());
    Ok(Json(json!({ "message": "All quiz sets deleted successfully" })))
}

pub async fn get_raw_urls(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_set = fetch_quiz_set(&pool, &id).await?;
    Ok(Json(json!({ "rawUrls": quiz_set.raw_urls })))
}

pub async fn update_quiz_set_status(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("UPDATE quiz_sets SET status = $1, last_updated = NOW() WHERE id = $2")
        .bind(&payload.status)
        .bind(&id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(quiz_set_not_found());
    }

    Ok(Json(json!({ "message": "Quiz set status updated successfully" })))
}

pub async fn get_eye_icon_state(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_set = fetch_quiz_set(&pool, &id).await?;
    Ok(Json(json!({ "state": quiz_set.eye_icon_state })))
}

pub async fn update_eye_icon_state(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<EyeIconStateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("UPDATE quiz_sets SET eye_icon_state = $1 WHERE id = $2")
        .bind(payload.state)
        .bind(&id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(quiz_set_not_found());
    }

    Ok(Json(json!({ "message": "Eye icon state updated" })))
}

pub async fn toggle_eye_icon_state(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let state: bool = sqlx::query_scalar(
        "UPDATE quiz_sets SET eye_icon_state = NOT eye_icon_state WHERE id = $1 RETURNING eye_icon_state",
    )
    .bind(&id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(quiz_set_not_found)?;

    Ok(Json(json!({ "message": "Eye icon state toggled", "state": state })))
}

pub async fn toggle_lock_state(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let lock_state: bool = sqlx::query_scalar(
        "UPDATE quiz_sets SET lock_state = NOT lock_state WHERE id = $1 RETURNING lock_state",
    )
    .bind(&id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(quiz_set_not_found)?;

    Ok(Json(json!({ "message": "Lock state toggled", "lock_state": lock_state })))
}

pub async fn get_lock_state(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_set = fetch_quiz_set(&pool, &id).await?;
    Ok(Json(json!({ "lock_state": quiz_set.lock_state })))
}

/// Flips the lock shared by all quiz sets and all server processes.
pub async fn toggle_global_lock_state(
    State(pool): State<PgPool>,
) -> Result<impl IntoResponse, AppError> {
    let new_state = app_flag::toggle_flag(&pool, GLOBAL_LOCK, GLOBAL_LOCK_DEFAULT).await?;
    tracing::info!("Global lock is now {}", new_state);

    Ok(Json(json!({
        "message": "Global lock state toggled",
        "new_state": new_state
    })))
}

pub async fn get_global_lock_state(
    State(pool): State<PgPool>,
) -> Result<impl IntoResponse, AppError> {
    let lock_state = app_flag::get_flag(&pool, GLOBAL_LOCK, GLOBAL_LOCK_DEFAULT).await?;
    Ok(Json(json!({ "lock_state": lock_state })))
}

/// Applies the dashboard sort order to every quiz set.
pub async fn update_sort_order(
    State(pool): State<PgPool>,
    AppJson(payload): AppJson<SortOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let sort_order = match payload.sort_order.as_deref() {
        Some(order @ ("asc" | "desc")) => order,
        _ => return Err(AppError::BadRequest("Invalid sort order".to_string())),
    };

    sqlx::query("UPDATE quiz_sets SET sort_order = $1")
        .bind(sort_order)
        .execute(&pool)
        .await?;

    Ok(Json(json!({ "message": "Sort order updated successfully" })))
}

pub async fn get_sort_order(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let sort_order: Option<String> =
        sqlx::query_scalar("SELECT sort_order FROM quiz_sets ORDER BY created_at, id LIMIT 1")
            .fetch_optional(&pool)
            .await?;

    Ok(Json(json!({ "sortOrder": sort_order.unwrap_or_else(|| "desc".to_string()) })))
}

pub async fn update_current_question_index(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<CurrentIndexRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let result = sqlx::query("UPDATE quiz_sets SET current_question_index = $1 WHERE id = $2")
        .bind(payload.index)
        .bind(&id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(quiz_set_not_found());
    }

    Ok(Json(json!({ "message": "Current question index updated successfully" })))
}

pub async fn get_current_question_index(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_set = fetch_quiz_set(&pool, &id).await?;
    Ok(Json(json!({ "current_question_index": quiz_set.current_question_index })))
}

/// Saves where the user is in the set and which filter is active.
pub async fn update_quiz_set_state(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<QuizSetStateRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let filter = payload
        .filter
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| "all".to_string());

    let result = sqlx::query(
        "UPDATE quiz_sets SET current_question_index = $1, current_filter = $2 WHERE id = $3",
    )
    .bind(payload.index)
    .bind(&filter)
    .bind(&id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(quiz_set_not_found());
    }

    Ok(Json(json!({ "message": "Quiz set state updated successfully" })))
}

pub async fn get_quiz_set_state(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_set = fetch_quiz_set(&pool, &id).await?;
    Ok(Json(json!({
        "current_question_index": quiz_set.current_question_index,
        "current_filter": quiz_set.current_filter,
    })))
}
