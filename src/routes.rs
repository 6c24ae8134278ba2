// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    docs,
    handlers::{auth, editor, explanation, export, question, quiz_set, score, scraping},
    state::AppState,
};

const DEFAULT_FRONTEND: &str = "http://localhost:3000";

/// Assembles the main application router.
///
/// * Every endpoint lives under `/api`.
/// * CORS admits only the configured frontend origin, with credentials, so
///   the session cookie travels.
pub fn create_router(state: AppState) -> Router {
    let origin = HeaderValue::from_str(state.config.frontend_url.trim_end_matches('/'))
        .unwrap_or_else(|_| {
            tracing::warn!(
                "FRONTEND_URL {:?} is not a valid origin, falling back to {}",
                state.config.frontend_url,
                DEFAULT_FRONTEND
            );
            HeaderValue::from_static(DEFAULT_FRONTEND)
        });

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let auth_routes = Router::new()
        .route("/github", get(auth::github_login))
        .route("/github/callback", get(auth::github_callback))
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .route("/logout", post(auth::logout))
        .route("/status", get(auth::auth_status));

    let scraping_routes = Router::new()
        .route("/startScraping", post(scraping::start_scraping))
        .route("/getDiscussionComments/{id}", get(scraping::get_discussion_comments));

    let quiz_set_routes = Router::new()
        .route("/getQuizSets", get(quiz_set::list_quiz_sets))
        .route("/renameQuizSet/{id}", put(quiz_set::rename_quiz_set))
        .route("/getQuizSetDetails/{id}", get(quiz_set::get_quiz_set_details))
        .route("/getQuizSetScore/{id}", get(quiz_set::get_quiz_set_score))
        .route("/updateQuizSetScore/{id}", post(quiz_set::record_attempt))
        .route("/getAttempts/{id}", get(quiz_set::get_attempts))
        .route("/deleteQuizSet/{id}", delete(quiz_set::delete_quiz_set))
        .route("/deleteMultipleQuizSets", post(quiz_set::delete_multiple_quiz_sets))
        .route("/deleteAllQuizSets", post(quiz_set::delete_all_quiz_sets))
        .route("/getRawUrls/{id}", get(quiz_set::get_raw_urls))
        .route("/updateQuizSetStatus/{id}", post(quiz_set::update_quiz_set_status))
        .route("/getEyeIconState/{id}", get(quiz_set::get_eye_icon_state))
        .route("/updateEyeIconState/{id}", post(quiz_set::update_eye_icon_state))
        .route("/toggleEyeIconState/{id}", post(quiz_set::toggle_eye_icon_state))
        // Static segments win over `{id}`.
        .route("/toggleLockState/global", post(quiz_set::toggle_global_lock_state))
        .route("/getLockState/global", get(quiz_set::get_global_lock_state))
        .route("/toggleLockState/{id}", post(quiz_set::toggle_lock_state))
        .route("/getLockState/{id}", get(quiz_set::get_lock_state))
        .route("/updateSortOrder", post(quiz_set::update_sort_order))
        .route("/getSortOrder", get(quiz_set::get_sort_order))
        .route(
            "/updateCurrentQuestionIndex/{id}",
            post(quiz_set::update_current_question_index),
        )
        .route(
            "/getCurrentQuestionIndex/{id}",
            get(quiz_set::get_current_question_index),
        )
        .route("/updateQuizSetState/{id}", post(quiz_set::update_quiz_set_state))
        .route("/getQuizSetState/{id}", get(quiz_set::get_quiz_set_state))
        .route("/downloadQuizPdf/{id}", get(export::download_quiz_pdf));

    let question_routes = Router::new()
        .route("/getQuestionsByQuizSet/{id}", get(question::get_questions_by_quiz_set))
        .route("/getQuestions", get(question::get_all_questions))
        .route("/getFavorites/{id}", get(question::get_favorites))
        .route("/toggleFavorite", post(question::toggle_favorite))
        .route("/updateUserSelection", post(question::update_user_selection))
        .route("/getUserSelections/{id}", get(question::get_user_selections))
        .route("/shuffleQuestions/{id}", post(question::shuffle_questions))
        .route("/resetQuestions/{id}", post(question::reset_questions))
        .route("/updateScore", post(score::update_score))
        .route("/getScore/{id}", get(score::get_score));

    let explanation_routes = Router::new()
        .route(
            "/getFurtherExplanation",
            post(explanation::generate_further_explanation),
        )
        .route(
            "/getFurtherExplanation/{question_id}",
            get(explanation::get_further_explanation),
        )
        .route(
            "/saveFurtherExplanation",
            post(explanation::save_further_explanation),
        )
        .route("/saveEditorContent", post(editor::save_editor_content))
        .route("/getEditorContent", get(editor::get_editor_content));

    let api_routes = Router::new()
        .merge(scraping_routes)
        .merge(quiz_set_routes)
        .merge(question_routes)
        .merge(explanation_routes)
        .route("/openapi.json", get(docs::openapi_json))
        .nest("/auth", auth_routes);

    Router::new()
        .route("/api", get(scraping::home))
        .nest("/api", api_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
