// src/scraping/indiabix.rs

use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::{
    ScrapedQuestion,
    markup::{absolute_link, answer_letter, element_html, element_text, selector},
    source::{MAX_RANGE_SPAN, SourceAdapter, SourceDescriptor, SourceKind},
};

static CONTAINER: LazyLock<Selector> = LazyLock::new(|| selector("div.bix-div-container"));
static QUESTION: LazyLock<Selector> = LazyLock::new(|| selector("div.bix-td-qtxt"));
static OPTION: LazyLock<Selector> = LazyLock::new(|| selector("div.bix-td-option-val"));
static ANSWER: LazyLock<Selector> = LazyLock::new(|| selector("input.jq-hdnakq"));
static EXPLANATION: LazyLock<Selector> = LazyLock::new(|| selector("div.bix-ans-description"));
static DISCUSS: LazyLock<Selector> = LazyLock::new(|| selector("a[href*='discussion']"));

/// IndiaBix: one question per numbered page, `{base_url}{n}`.
pub struct IndiaBix;

impl SourceAdapter for IndiaBix {
    fn kind(&self) -> SourceKind {
        SourceKind::IndiaBix
    }

    fn pages(&self, descriptor: &SourceDescriptor) -> Vec<String> {
        match descriptor {
            SourceDescriptor::Url(url) => vec![url.clone()],
            SourceDescriptor::Range {
                base_url,
                start_url,
                end_url,
                ..
            } => {
                let start = start_url.unwrap_or(1);
                let end = end_url.unwrap_or(start);
                (start..=end)
                    .take(MAX_RANGE_SPAN as usize)
                    .map(|n| format!("{}{}", base_url, n))
                    .collect()
            }
        }
    }

    fn parse(&self, page_url: &str, html: &str) -> Vec<ScrapedQuestion> {
        let document = Html::parse_document(html);

        document
            .select(&CONTAINER)
            .filter_map(|container| {
                let text = container.select(&QUESTION).next().map(element_html)?;
                let options: Vec<String> = container.select(&OPTION).map(element_html).collect();
                let answer = container
                    .select(&ANSWER)
                    .next()
                    .and_then(|input| input.value().attr("value"))
                    .and_then(answer_letter);
                let explanation = container
                    .select(&EXPLANATION)
                    .next()
                    .map(element_text);
                // Question pages link to their discussion; discussion pages are their own.
                let discussion = container
                    .select(&DISCUSS)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .and_then(|href| absolute_link(page_url, href))
                    .unwrap_or_else(|| page_url.to_string());

                let question = ScrapedQuestion::well_formed(text, options, answer, page_url);
                if question.is_none() {
                    tracing::warn!("Skipping malformed IndiaBix question on {}", page_url);
                }
                question.map(|q| {
                    q.with_explanation(explanation)
                        .with_discussion_link(Some(discussion))
                })
            })
            .collect()
    }
}
