// src/models/quiz_set.rs

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Represents the 'quiz_sets' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuizSet {
    /// UUID v4 string.
    pub id: String,
    pub title: String,

    /// The textarea contents the set was created from, verbatim.
    pub raw_urls: Option<String>,

    /// JSON-serialized list of source descriptors.
    pub urls: Option<String>,

    pub eye_icon_state: bool,
    pub lock_state: bool,
    pub score: Option<i32>,
    pub attempts: i32,
    pub finished: bool,

    /// 0..=100, refreshed whenever selections change.
    pub progress: i32,

    pub status: Option<String>,
    pub sort_order: String,
    pub current_question_index: i32,
    pub current_filter: String,
    pub user_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

/// One row of the dashboard listing, aggregated at read time.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct QuizSetSummary {
    pub id: String,
    pub title: String,
    pub score: Option<i32>,
    pub attempts: i64,
    pub average_score: Option<f64>,
    pub latest_score: Option<i32>,
    pub total_questions: i64,
    pub unanswered_questions: i64,
    pub finished: bool,
    pub progress: i32,
    pub last_updated: Option<chrono::DateTime<chrono::Utc>>,
}

/// Completion percentage: 100 once finished, otherwise the floor of the
/// answered share, and 0 for an empty set.
pub fn compute_progress(finished: bool, answered: i64, total: i64) -> i32 {
    if finished {
        return 100;
    }
    if total <= 0 {
        return 0;
    }
    (answered.clamp(0, total) * 100 / total) as i32
}

/// Titles are trimmed on the way in so length checks see what gets stored.
fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|s| s.trim().to_string())
}

fn default_title() -> String {
    "New Quiz Set".to_string()
}

/// DTO for starting an ingestion run.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StartScrapingRequest {
    #[serde(default = "default_title", deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 120, message = "Title must be between 1 and 120 characters."))]
    pub title: String,

    #[serde(default, rename = "rawUrls")]
    pub raw_urls: String,

    /// Bare URLs or `{base_url, start_url?, end_url?, start_page?, end_page?}`.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub urls: Vec<Value>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RenameQuizSetRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 120, message = "Title must be between 1 and 120 characters."))]
    pub new_title: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordAttemptRequest {
    #[validate(range(min = 0, message = "Score cannot be negative."))]
    pub score: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EyeIconStateRequest {
    pub state: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeleteMultipleRequest {
    #[serde(default, rename = "quizSetIds")]
    pub quiz_set_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SortOrderRequest {
    #[serde(default, rename = "sortOrder")]
    pub sort_order: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CurrentIndexRequest {
    #[serde(default)]
    #[validate(range(min = 0))]
    pub index: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuizSetStateRequest {
    #[serde(default)]
    #[validate(range(min = 0))]
    pub index: i32,
    #[serde(default)]
    pub filter: Option<String>,
}
