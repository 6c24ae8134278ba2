// src/models/further_explanation.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Represents the 'further_explanations' table (append-only).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FurtherExplanation {
    pub id: i64,
    pub question_id: i64,
    pub explanation: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GenerateExplanationRequest {
    #[validate(length(min = 1, message = "question_text is required."))]
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[validate(length(min = 1, message = "answer is required."))]
    pub answer: String,
    /// Existing explanation to build on.
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SaveExplanationRequest {
    pub question_id: i64,
    #[validate(length(min = 1, message = "Explanation cannot be empty."))]
    pub explanation: String,
}
