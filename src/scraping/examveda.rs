// src/scraping/examveda.rs

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::{
    ScrapedQuestion,
    markup::{
        absolute_link, answer_letter, collapse, element_html, explanation_after_marker, selector,
    },
    source::{MAX_RANGE_SPAN, SourceAdapter, SourceDescriptor, SourceKind},
};

static ARTICLE: LazyLock<Selector> = LazyLock::new(|| selector("article.question"));
static QUESTION: LazyLock<Selector> = LazyLock::new(|| selector(".question-main"));
static OPTION: LazyLock<Selector> = LazyLock::new(|| selector(".question-options p"));
static LABEL: LazyLock<Selector> = LazyLock::new(|| selector("label"));
static ANSWER: LazyLock<Selector> = LazyLock::new(|| selector(".answer_container"));
static DISCUSS: LazyLock<Selector> = LazyLock::new(|| selector("a[href*='discussion']"));

const DEFAULT_FIRST_PAGE: u32 = 1;
const DEFAULT_LAST_PAGE: u32 = 10;

/// Examveda: paged lists of questions, `?page=N` from the second page on.
pub struct Examveda;

impl Examveda {
    fn page_url(base_url: &str, page: u32) -> String {
        if page <= 1 {
            return base_url.to_string();
        }
        let separator = if base_url.contains('?') { '&' } else { '?' };
        format!("{}{}page={}", base_url, separator, page)
    }

    fn option_html(p: ElementRef<'_>) -> String {
        // `<label>A.</label><label>text</label>`: the last label carries the text.
        match p.select(&LABEL).last() {
            Some(label) => element_html(label),
            None => element_html(p),
        }
    }
}

impl SourceAdapter for Examveda {
    fn kind(&self) -> SourceKind {
        SourceKind::Examveda
    }

    fn pages(&self, descriptor: &SourceDescriptor) -> Vec<String> {
        let (base_url, start, end) = match descriptor {
            SourceDescriptor::Url(url) => (url.as_str(), DEFAULT_FIRST_PAGE, DEFAULT_LAST_PAGE),
            SourceDescriptor::Range {
                base_url,
                start_page,
                end_page,
                ..
            } => (
                base_url.as_str(),
                start_page.unwrap_or(DEFAULT_FIRST_PAGE),
                end_page.unwrap_or(DEFAULT_LAST_PAGE),
            ),
        };

        (start..=end)
            .take(MAX_RANGE_SPAN as usize)
            .map(|p| Self::page_url(base_url, p))
            .collect()
    }

    fn parse(&self, page_url: &str, html: &str) -> Vec<ScrapedQuestion> {
        let document = Html::parse_document(html);

        document
            .select(&ARTICLE)
            .filter_map(|article| {
                let text = article.select(&QUESTION).next().map(element_html)?;
                let options: Vec<String> = article.select(&OPTION).map(Self::option_html).collect();

                let answer_text = article
                    .select(&ANSWER)
                    .next()
                    .map(|el| collapse(&el.text().collect::<Vec<_>>().join(" ")));
                let answer = answer_text.as_deref().and_then(answer_letter);
                let explanation = answer_text.as_deref().and_then(explanation_after_marker);

                let discussion = article
                    .select(&DISCUSS)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .and_then(|href| absolute_link(page_url, href));

                let question = ScrapedQuestion::well_formed(text, options, answer, page_url);
                if question.is_none() {
                    tracing::warn!("Skipping malformed Examveda question on {}", page_url);
                }
                question.map(|q| q.with_explanation(explanation).with_discussion_link(discussion))
            })
            .collect()
    }
}
