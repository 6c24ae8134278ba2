// src/handlers/auth.rs

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Redirect},
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{SigninRequest, SignupRequest, User, UserSummary},
    state::AppState,
    utils::{
        extract::AppJson,
        hash::{hash_password, verify_password},
        session::{Session, clear_session_cookie, cookie_header, read_cookie, session_cookie},
    },
};

/// Short-lived cookie carrying the OAuth CSRF state across the redirect.
const OAUTH_STATE_COOKIE: &str = "oauth_state";
const OAUTH_STATE_TTL_SECS: u64 = 600;

const USER_COLUMNS: &str = "id, github_id, name, email, password_hash, avatar_url, created_at";

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Redirects the browser to GitHub's consent page.
pub async fn github_login(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let github = state
        .github
        .as_ref()
        .ok_or_else(|| AppError::NotFound("GitHub login is not configured".to_string()))?;

    let (url, csrf) = github.authorize_url();
    let state_cookie = cookie_header(
        OAUTH_STATE_COOKIE,
        &csrf,
        OAUTH_STATE_TTL_SECS,
        state.config.cookie_secure,
    )?;

    tracing::debug!("Redirecting to GitHub authorization");
    Ok((AppendHeaders([(header::SET_COOKIE, state_cookie)]), Redirect::to(&url)))
}

/// Completes the GitHub flow: exchanges the code, finds or creates the
/// user (refreshing the avatar every time) and signs the session in.
pub async fn github_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Session(mut session): Session,
    Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse, AppError> {
    let github = state
        .github
        .as_ref()
        .ok_or_else(|| AppError::NotFound("GitHub login is not configured".to_string()))?;

    if let Some(error) = params.error {
        return Err(AppError::Upstream(format!("GitHub authorization failed: {}", error)));
    }

    let expected_state = read_cookie(&headers, OAUTH_STATE_COOKIE);
    if expected_state.is_none() || expected_state != params.state {
        return Err(AppError::Upstream("OAuth state mismatch".to_string()));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::Upstream("Missing authorization code".to_string()))?;

    let access_token = github.exchange_code(code).await?;
    let profile = github.fetch_user(&access_token).await?;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (github_id, name, email, avatar_url)
        VALUES (
            $1,
            $2,
            (SELECT $3::TEXT WHERE NOT EXISTS (SELECT 1 FROM users WHERE email = $3)),
            $4
        )
        ON CONFLICT (github_id) DO UPDATE SET avatar_url = EXCLUDED.avatar_url
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(profile.id.to_string())
    .bind(&profile.login)
    .bind(&profile.email)
    .bind(&profile.avatar_url)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to upsert GitHub user: {:?}", e);
        AppError::from(e)
    })?;

    session.sign_in(user.id, &user.name, user.avatar_url.as_deref());
    tracing::info!("User {} signed in with GitHub", user.id);

    let session_cookie = session_cookie(&state.config, &session)?;
    let expired_state = cookie_header(OAUTH_STATE_COOKIE, "", 0, state.config.cookie_secure)?;
    let dashboard = format!("{}/Dashboard", state.config.frontend_url.trim_end_matches('/'));

    Ok((
        AppendHeaders([
            (header::SET_COOKIE, session_cookie),
            (header::SET_COOKIE, expired_state),
        ]),
        Redirect::to(&dashboard),
    ))
}

/// Registers an email/password account.
pub async fn signup(
    State(pool): State<PgPool>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let email = payload.email.trim().to_lowercase();
    let taken: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&pool)
        .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest("Email already registered".to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    sqlx::query("INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3)")
        .bind(payload.name.trim())
        .bind(&email)
        .bind(&hashed_password)
        .execute(&pool)
        .await
        .map_err(|e| {
            // Postgres error code for unique violation is 23505
            if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
                AppError::BadRequest("Email already registered".to_string())
            } else {
                tracing::error!("Error in signup: {:?}", e);
                AppError::from(e)
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

/// Signs in with email and password.
pub async fn signin(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Session(mut session): Session,
    AppJson(payload): AppJson<SigninRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let invalid = || AppError::AuthError("Invalid email or password".to_string());

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = $1",
        USER_COLUMNS
    ))
    .bind(payload.email.trim().to_lowercase())
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Signin DB error: {:?}", e);
        AppError::from(e)
    })?
    .ok_or_else(invalid)?;

    let password_hash = user.password_hash.as_deref().ok_or_else(invalid)?;
    if !verify_password(&payload.password, password_hash)? {
        return Err(invalid());
    }

    session.sign_in(user.id, &user.name, user.avatar_url.as_deref());
    let cookie = session_cookie(&config, &session)?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "message": "Logged in successfully",
            "user": UserSummary::from(&user),
        })),
    ))
}

/// Whether the session belongs to a (still existing) user.
pub async fn auth_status(
    State(pool): State<PgPool>,
    Session(session): Session,
) -> Result<impl IntoResponse, AppError> {
    let Some(user_id) = session.user_id else {
        return Ok(Json(json!({ "isLoggedIn": false })));
    };

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = $1",
        USER_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(&pool)
    .await?;

    Ok(Json(match user {
        Some(user) => json!({
            "isLoggedIn": true,
            "username": user.name,
            "avatar": user.avatar_url,
        }),
        None => json!({ "isLoggedIn": false }),
    }))
}

/// Drops the whole session, scores included.
pub async fn logout(
    State(config): State<Config>,
    Session(session): Session,
) -> Result<impl IntoResponse, AppError> {
    tracing::debug!("Logout requested for user {:?}", session.user_name);

    Ok((
        [(header::SET_COOKIE, clear_session_cookie(&config)?)],
        Json(json!({ "message": "Logged out successfully" })),
    ))
}
