// src/models/attempt.rs

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Represents the 'attempts' table. Rows are never updated.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Attempt {
    pub id: i64,
    pub quiz_set_id: String,
    pub score: i32,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
