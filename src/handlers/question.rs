// src/handlers/question.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use rand::seq::SliceRandom;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{
            QUESTION_COLUMNS, Question, QuestionIdRequest, QuestionResponse, UserSelectionRequest,
        },
        quiz_set::compute_progress,
    },
    utils::extract::AppJson,
};

fn no_questions() -> AppError {
    AppError::NotFound("No questions found for this quiz set".to_string())
}

async fn questions_in_order(
    conn: &mut PgConnection,
    quiz_set_id: &str,
) -> Result<Vec<QuestionResponse>, AppError> {
    let questions = sqlx::query_as::<_, Question>(&format!(
        r#"SELECT {} FROM questions WHERE quiz_set_id = $1 ORDER BY "order", id"#,
        QUESTION_COLUMNS
    ))
    .bind(quiz_set_id)
    .fetch_all(conn)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch questions of {}: {:?}", quiz_set_id, e);
        AppError::from(e)
    })?;

    Ok(questions.into_iter().map(QuestionResponse::from).collect())
}

/// Recomputes the stored progress of a quiz set from its selections.
pub(crate) async fn refresh_progress(
    conn: &mut PgConnection,
    quiz_set_id: &str,
) -> Result<(), AppError> {
    let counts: Option<(bool, i64, i64)> = sqlx::query_as(
        r#"
        SELECT qs.finished, COUNT(q.user_selected_option), COUNT(q.id)
        FROM quiz_sets qs
        LEFT JOIN questions q ON q.quiz_set_id = qs.id
        WHERE qs.id = $1
        GROUP BY qs.id
        "#,
    )
    .bind(quiz_set_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some((finished, answered, total)) = counts else {
        return Ok(());
    };

    sqlx::query("UPDATE quiz_sets SET progress = $1, last_updated = NOW() WHERE id = $2")
        .bind(compute_progress(finished, answered, total))
        .bind(quiz_set_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Questions of a set in display order.
#[utoipa::path(
    get,
    path = "/api/getQuestionsByQuizSet/{id}",
    params(("id" = String, Path, description = "Quiz set id")),
    responses((status = 200, description = "Questions in display order", body = [QuestionResponse]))
)]
pub async fn get_questions_by_quiz_set(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let questions = questions_in_order(&mut conn, &id).await?;

    tracing::debug!("Found {} questions for quiz set {}", questions.len(), id);
    Ok(Json(questions))
}

/// Every stored question, grouped by set.
pub async fn get_all_questions(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let questions = sqlx::query_as::<_, Question>(&format!(
        r#"SELECT {} FROM questions ORDER BY quiz_set_id, "order", id"#,
        QUESTION_COLUMNS
    ))
    .fetch_all(&pool)
    .await?;

    let questions: Vec<QuestionResponse> = questions.into_iter().map(Into::into).collect();
    Ok(Json(questions))
}

pub async fn get_favorites(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let questions = sqlx::query_as::<_, Question>(&format!(
        r#"SELECT {} FROM questions WHERE quiz_set_id = $1 AND favorite ORDER BY "order", id"#,
        QUESTION_COLUMNS
    ))
    .bind(&id)
    .fetch_all(&pool)
    .await?;

    let questions: Vec<QuestionResponse> = questions.into_iter().map(Into::into).collect();
    Ok(Json(questions))
}

pub async fn toggle_favorite(
    State(pool): State<PgPool>,
    AppJson(payload): AppJson<QuestionIdRequest>,
) -> Result<impl IntoResponse, AppError> {
    let favorite: bool = sqlx::query_scalar(
        "UPDATE questions SET favorite = NOT favorite WHERE id = $1 RETURNING favorite",
    )
    .bind(payload.question_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    Ok(Json(json!({ "message": "Favorite toggled", "favorite": favorite })))
}

/// Stores (or clears, with `null`) the option the user picked.
pub async fn update_user_selection(
    State(pool): State<PgPool>,
    AppJson(payload): AppJson<UserSelectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let mut tx = pool.begin().await?;

    let quiz_set_id: String = sqlx::query_scalar(
        "UPDATE questions SET user_selected_option = $1 WHERE id = $2 RETURNING quiz_set_id",
    )
    .bind(&payload.selected_option)
    .bind(payload.question_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    refresh_progress(&mut tx, &quiz_set_id).await?;
    tx.commit().await?;

    Ok(Json(json!({ "message": "User selection updated" })))
}

/// Map of question id to the selected option (or null).
pub async fn get_user_selections(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let rows: Vec<(i64, Option<String>)> = sqlx::query_as(
        "SELECT id, user_selected_option FROM questions WHERE quiz_set_id = $1",
    )
    .bind(&id)
    .fetch_all(&pool)
    .await?;

    let selections: HashMap<i64, Option<String>> = rows.into_iter().collect();
    Ok(Json(selections))
}

/// Gives the set a fresh random order and clears all selections.
pub async fn shuffle_questions(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    let mut ids: Vec<i64> =
        sqlx::query_scalar("SELECT id FROM questions WHERE quiz_set_id = $1 FOR UPDATE")
            .bind(&id)
            .fetch_all(&mut *tx)
            .await?;

    if ids.is_empty() {
        return Err(no_questions());
    }

    ids.shuffle(&mut rand::thread_rng());
    let ranks: Vec<i32> = (1..=ids.len() as i32).collect();

    sqlx::query(
        r#"
        UPDATE questions q
        SET "order" = p.rank, user_selected_option = NULL
        FROM UNNEST($1::BIGINT[], $2::INT[]) AS p(id, rank)
        WHERE q.id = p.id
        "#,
    )
    .bind(&ids)
    .bind(&ranks)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to shuffle quiz set {}: {:?}", id, e);
        AppError::from(e)
    })?;

    refresh_progress(&mut tx, &id).await?;
    let questions = questions_in_order(&mut tx, &id).await?;
    tx.commit().await?;

    Ok(Json(questions))
}

/// Clears every selection, keeping the order.
pub async fn reset_questions(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("UPDATE questions SET user_selected_option = NULL WHERE quiz_set_id = $1")
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(no_questions());
    }

    refresh_progress(&mut tx, &id).await?;
    let questions = questions_in_order(&mut tx, &id).await?;
    tx.commit().await?;

    Ok(Json(questions))
}
