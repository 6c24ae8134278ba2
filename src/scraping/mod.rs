//! Question-bank ingestion.
//!
//! A quiz set is built from a list of source descriptors. Each descriptor is
//! classified by URL into a site family ([`source::SourceKind`]), expanded into
//! page URLs by the matching [`source::SourceAdapter`], fetched with
//! [`fetch::Fetcher`], parsed into [`ScrapedQuestion`]s and handed to a
//! [`ingest::QuestionSink`] together with a running order counter.

pub mod discussion;
pub mod examprimer;
pub mod examveda;
pub mod fetch;
pub mod indiabix;
pub mod ingest;
mod markup;
pub mod pinoybix;
pub mod source;

use serde::Serialize;

pub use ingest::{IngestReport, PgQuestionSink, QuestionSink};
pub use source::{SourceDescriptor, SourceKind};

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("no discussion comments found at {url}")]
    NoComments { url: String },

    #[error("invalid source url: {0}")]
    InvalidUrl(String),
}

impl ScrapeError {
    /// Network failures, throttling and server errors are worth another try.
    pub fn is_transient(&self) -> bool {
        match self {
            ScrapeError::Request { .. } => true,
            ScrapeError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// A question normalized out of any site family, before it gets an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedQuestion {
    /// Sanitized HTML.
    pub text: String,
    /// Sanitized HTML, in display order.
    pub options: Vec<String>,
    /// `"Option A"`, `"Option B"`, ...
    pub answer: String,
    pub url: Option<String>,
    pub explanation: Option<String>,
    pub discussion_link: Option<String>,
}

impl ScrapedQuestion {
    /// Builds a question when the page yielded text, options and an answer
    /// that points at one of them. Anything else is a malformed question.
    pub fn well_formed(
        text: String,
        options: Vec<String>,
        answer_letter: Option<char>,
        page_url: &str,
    ) -> Option<Self> {
        let text = text.trim().to_string();
        if text.is_empty() || options.is_empty() {
            return None;
        }
        if options.iter().any(|o| o.trim().is_empty()) {
            return None;
        }

        let index = letter_index(answer_letter?)?;
        if index >= options.len() {
            return None;
        }

        Some(Self {
            text,
            options,
            answer: option_label(index),
            url: Some(page_url.to_string()),
            explanation: None,
            discussion_link: None,
        })
    }

    pub fn with_explanation(mut self, explanation: Option<String>) -> Self {
        self.explanation = explanation.filter(|e| !e.trim().is_empty());
        self
    }

    pub fn with_discussion_link(mut self, link: Option<String>) -> Self {
        self.discussion_link = link;
        self
    }
}

/// `0 -> "Option A"`.
pub fn option_label(index: usize) -> String {
    let letter = (b'A' + index as u8) as char;
    format!("Option {}", letter)
}

/// `'b' -> Some(1)`; letters past `'E'` are not option identifiers.
pub fn letter_index(letter: char) -> Option<usize> {
    let upper = letter.to_ascii_uppercase();
    if ('A'..='E').contains(&upper) {
        Some((upper as u8 - b'A') as usize)
    } else {
        None
    }
}
