// src/scraping/pinoybix.rs

use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::{
    ScrapedQuestion,
    markup::{NumberedParser, collapse, element_lines, selector},
    source::{SourceAdapter, SourceDescriptor, SourceKind},
};

static FLOW: LazyLock<Selector> = LazyLock::new(|| {
    selector("div.entry-content p, div.entry-content div.su-spoiler-content")
});

const SPOILER: &str = "su-spoiler-content";

/// PinoyBix: a single article of numbered questions, each followed by a
/// collapsed spoiler holding the answer.
pub struct PinoyBix;

impl SourceAdapter for PinoyBix {
    fn kind(&self) -> SourceKind {
        SourceKind::PinoyBix
    }

    fn pages(&self, descriptor: &SourceDescriptor) -> Vec<String> {
        vec![descriptor.url().to_string()]
    }

    fn parse(&self, page_url: &str, html: &str) -> Vec<ScrapedQuestion> {
        let document = Html::parse_document(html);
        let mut parser = NumberedParser::default();

        for el in document.select(&FLOW) {
            let is_spoiler = el.value().classes().any(|c| c == SPOILER);
            if is_spoiler {
                let text = el.text().collect::<Vec<_>>().join(" ");
                parser.set_answer(&collapse(&text));
                continue;
            }

            // Paragraphs nested in a spoiler were already read with it.
            let inside_spoiler = el.ancestors().any(|node| {
                node.value()
                    .as_element()
                    .is_some_and(|e| e.classes().any(|c| c == SPOILER))
            });
            if inside_spoiler {
                continue;
            }

            for line in element_lines(el) {
                parser.feed_line(&line);
            }
        }

        parser.finish(page_url)
    }
}
