// src/models/app_flag.rs

use sqlx::PgPool;

/// Named switches shared by every server process.
pub const GLOBAL_LOCK: &str = "global_lock";

/// Current value, or `default` while the flag has never been toggled.
pub async fn get_flag(pool: &PgPool, name: &str, default: bool) -> Result<bool, sqlx::Error> {
    let enabled: Option<bool> = sqlx::query_scalar("SELECT enabled FROM app_flags WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(enabled.unwrap_or(default))
}

/// Flips the flag atomically and returns the new value.
pub async fn toggle_flag(pool: &PgPool, name: &str, default: bool) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO app_flags (name, enabled)
        VALUES ($1, NOT $2)
        ON CONFLICT (name) DO UPDATE SET enabled = NOT app_flags.enabled
        RETURNING enabled
        "#,
    )
    .bind(name)
    .bind(default)
    .fetch_one(pool)
    .await
}
