// src/scraping/ingest.rs

use async_trait::async_trait;
use sqlx::{PgPool, types::Json};

use super::{
    ScrapedQuestion,
    fetch::Fetcher,
    source::{AdapterRegistry, SourceAdapter, SourceDescriptor},
};
use crate::error::AppError;

/// Where ingested questions go, one at a time, each with its final order.
#[async_trait]
pub trait QuestionSink: Send {
    async fn insert(&mut self, order: i32, question: ScrapedQuestion) -> Result<(), AppError>;
}

/// Inserts questions of one quiz set straight into Postgres.
///
/// Every insert commits on its own, so questions stored before a failing
/// page stay visible.
pub struct PgQuestionSink {
    pool: PgPool,
    quiz_set_id: String,
}

impl PgQuestionSink {
    pub fn new(pool: PgPool, quiz_set_id: impl Into<String>) -> Self {
        Self {
            pool,
            quiz_set_id: quiz_set_id.into(),
        }
    }
}

#[async_trait]
impl QuestionSink for PgQuestionSink {
    async fn insert(&mut self, order: i32, question: ScrapedQuestion) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO questions
                (quiz_set_id, text, options, answer, url, explanation, discussion_link, "order")
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&self.quiz_set_id)
        .bind(&question.text)
        .bind(Json(&question.options))
        .bind(&question.answer)
        .bind(&question.url)
        .bind(&question.explanation)
        .bind(&question.discussion_link)
        .bind(order)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert scraped question: {:?}", e);
            AppError::from(e)
        })?;

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Questions handed to the sink.
    pub inserted: usize,
    /// The order the next question would have received.
    pub next_order: i32,
    /// Descriptors no adapter recognized.
    pub skipped_descriptors: usize,
}

/// Fetches every page of one descriptor and stores its questions in page
/// order, starting at `counter`. Returns the counter for the next call.
pub async fn ingest_descriptor(
    adapter: &dyn SourceAdapter,
    fetcher: &Fetcher,
    descriptor: &SourceDescriptor,
    mut counter: i32,
    sink: &mut dyn QuestionSink,
) -> Result<i32, AppError> {
    for page_url in adapter.pages(descriptor) {
        let html = fetcher.get_html(&page_url).await?;
        let questions = adapter.parse(&page_url, &html);
        if questions.is_empty() {
            tracing::warn!("No well-formed questions on {}", page_url);
        }

        for question in questions {
            sink.insert(counter, question).await?;
            counter += 1;
        }
    }

    Ok(counter)
}

/// Runs the descriptors in request order, threading one order counter
/// through all of them. The first fetch or store error aborts the run;
/// what was stored until then stays.
pub async fn run(
    registry: &AdapterRegistry,
    fetcher: &Fetcher,
    descriptors: &[SourceDescriptor],
    sink: &mut dyn QuestionSink,
) -> Result<IngestReport, AppError> {
    let mut counter = 1;
    let mut skipped_descriptors = 0;

    for descriptor in descriptors {
        let Some(adapter) = registry.resolve(descriptor) else {
            tracing::info!("Skipping unrecognized source {}", descriptor.url());
            skipped_descriptors += 1;
            continue;
        };

        tracing::info!("Scraping {:?} source {}", adapter.kind(), descriptor.url());
        counter = ingest_descriptor(adapter, fetcher, descriptor, counter, sink).await?;
    }

    let report = IngestReport {
        inserted: (counter - 1) as usize,
        next_order: counter,
        skipped_descriptors,
    };
    tracing::info!(
        "Ingestion finished: {} question(s), {} skipped source(s)",
        report.inserted,
        report.skipped_descriptors
    );

    Ok(report)
}
