// src/handlers/export.rs

use axum::{
    extract::{Path, State},
    http::{HeaderValue, header},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::question::{QUESTION_COLUMNS, Question},
    services::pdf::{PrintableQuestion, export_quiz},
};

/// Renders a quiz set with its answer key as a PDF download.
pub async fn download_quiz_pdf(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let title: String = sqlx::query_scalar("SELECT title FROM quiz_sets WHERE id = $1")
        .bind(&id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz set not found".to_string()))?;

    let questions = sqlx::query_as::<_, Question>(&format!(
        r#"SELECT {} FROM questions WHERE quiz_set_id = $1 ORDER BY "order", id"#,
        QUESTION_COLUMNS
    ))
    .bind(&id)
    .fetch_all(&pool)
    .await?;

    let printable: Vec<PrintableQuestion<'_>> = questions
        .iter()
        .map(|q| PrintableQuestion {
            text: &q.text,
            options: &q.options.0,
            answer: &q.answer,
        })
        .collect();

    let pdf = export_quiz(&title, &printable)?;
    tracing::info!("Exported quiz set {} ({} questions, {} bytes)", id, questions.len(), pdf.len());

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}.pdf\"",
        download_name(&title)
    ))
    .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    ))
}

/// Title reduced to characters that are safe inside a quoted header value.
fn download_name(title: &str) -> String {
    let name: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || " -_.()".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect();

    let name = name.trim();
    if name.is_empty() {
        "quiz".to_string()
    } else {
        name.to_string()
    }
}
