// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use utoipa::ToSchema;
use validator::Validate;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Question {
    pub id: i64,
    pub quiz_set_id: String,

    /// Sanitized HTML.
    pub text: String,

    /// Sanitized HTML per option, stored as a JSON array.
    pub options: Json<Vec<String>>,

    /// `"Option A"`, `"Option B"`, ...
    pub answer: String,

    pub favorite: bool,
    pub url: Option<String>,
    pub explanation: Option<String>,
    pub discussion_link: Option<String>,
    pub user_selected_option: Option<String>,

    /// Display position within the set, unique per set.
    pub order: i32,
}

/// Question as the frontend consumes it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuestionResponse {
    pub id: i64,
    pub order: i32,
    pub text: String,
    pub options: Vec<String>,
    pub answer: String,
    pub quiz_set_id: String,
    pub favorite: bool,
    pub url: Option<String>,
    pub explanation: Option<String>,
    pub discussion_link: Option<String>,
    pub user_selected_option: Option<String>,
}

impl From<Question> for QuestionResponse {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            order: q.order,
            text: q.text,
            options: q.options.0,
            answer: q.answer,
            quiz_set_id: q.quiz_set_id,
            favorite: q.favorite,
            url: q.url,
            explanation: q.explanation,
            discussion_link: q.discussion_link,
            user_selected_option: q.user_selected_option,
        }
    }
}

/// Column list matching [`Question`].
pub const QUESTION_COLUMNS: &str = r#"id, quiz_set_id, text, options, answer, favorite, url,
    explanation, discussion_link, user_selected_option, "order""#;

#[derive(Debug, Deserialize)]
pub struct QuestionIdRequest {
    pub question_id: i64,
}

/// `selected_option` may be null to clear the selection.
#[derive(Debug, Deserialize, Validate)]
pub struct UserSelectionRequest {
    pub question_id: i64,
    #[serde(default)]
    #[validate(length(max = 16))]
    pub selected_option: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScoreRequest {
    #[serde(default)]
    pub question_id: Option<i64>,
    pub increment: bool,
    pub quiz_set_id: String,
}
