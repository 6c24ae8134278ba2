// src/docs.rs

use axum::Json;
use utoipa::OpenApi;

use crate::{
    handlers,
    models::{
        attempt::Attempt,
        further_explanation::GenerateExplanationRequest,
        question::QuestionResponse,
        quiz_set::{QuizSetSummary, RecordAttemptRequest, StartScrapingRequest},
    },
};

/// OpenAPI description of the core endpoints.
#[derive(OpenApi)]
#[openapi(
    info(title = "Quiz Backend API", description = "Question-bank scraping and quiz attempts"),
    paths(
        handlers::scraping::start_scraping,
        handlers::quiz_set::list_quiz_sets,
        handlers::quiz_set::record_attempt,
        handlers::question::get_questions_by_quiz_set,
        handlers::explanation::generate_further_explanation,
    ),
    components(schemas(
        StartScrapingRequest,
        QuizSetSummary,
        RecordAttemptRequest,
        QuestionResponse,
        GenerateExplanationRequest,
        Attempt,
    ))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
