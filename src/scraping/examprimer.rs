// src/scraping/examprimer.rs

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::{
    ScrapedQuestion,
    markup::{NumberedParser, element_lines, selector},
    source::{SourceAdapter, SourceDescriptor, SourceKind},
};

static FLOW: LazyLock<Selector> = LazyLock::new(|| selector("div.entry-content p"));

static SNAPSHOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://web\.archive\.org/web/)(\d+)[a-z_]*/(.+)$").expect("valid regex")
});

/// ExamPrimer pages, only reachable through Wayback Machine snapshots.
pub struct ExamPrimer;

impl ExamPrimer {
    /// Points a snapshot URL at the raw capture (`{timestamp}id_`), which
    /// skips the archive toolbar and link rewriting.
    pub fn raw_snapshot_url(url: &str) -> String {
        SNAPSHOT.replace(url, "${1}${2}id_/${3}").into_owned()
    }
}

impl SourceAdapter for ExamPrimer {
    fn kind(&self) -> SourceKind {
        SourceKind::ArchivedExamPrimer
    }

    fn pages(&self, descriptor: &SourceDescriptor) -> Vec<String> {
        vec![Self::raw_snapshot_url(descriptor.url())]
    }

    fn parse(&self, page_url: &str, html: &str) -> Vec<ScrapedQuestion> {
        let document = Html::parse_document(html);
        let mut parser = NumberedParser::default();

        for el in document.select(&FLOW) {
            for line in element_lines(el) {
                parser.feed_line(&line);
            }
        }

        parser.finish(page_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_snapshot_to_raw_capture() {
        assert_eq!(
            ExamPrimer::raw_snapshot_url(
                "https://web.archive.org/web/20190101000000/https://examprimer.com/mcq-1/"
            ),
            "https://web.archive.org/web/20190101000000id_/https://examprimer.com/mcq-1/"
        );
        assert_eq!(
            ExamPrimer::raw_snapshot_url(
                "http://web.archive.org/web/20190101000000if_/https://examprimer.com/mcq-1/"
            ),
            "http://web.archive.org/web/20190101000000id_/https://examprimer.com/mcq-1/"
        );
        // Already raw, or not a snapshot at all.
        let raw = "https://web.archive.org/web/20190101000000id_/https://examprimer.com/";
        assert_eq!(ExamPrimer::raw_snapshot_url(raw), raw);
        assert_eq!(
            ExamPrimer::raw_snapshot_url("https://web.archive.org/"),
            "https://web.archive.org/"
        );
    }

    #[test]
    fn parses_inline_answers() {
        let page = r#"
        <html><body><div class="entry-content">
          <p>1. The transistor has how many terminals?<br>a) 2<br>b) 3<br>c) 4<br>Answer: b</p>
          <p>2. A diode conducts when</p>
          <p>A. forward biased<br>B. reverse biased</p>
          <p>Ans: A<br>Explanation: Current flows in forward bias.</p>
          <p>3. Missing its answer<br>A. one<br>B. two</p>
        </div></body></html>"#;

        let url = "https://web.archive.org/web/20190101000000id_/https://examprimer.com/x/";
        let questions = ExamPrimer.parse(url, page);

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].options, vec!["2", "3", "4"]);
        assert_eq!(questions[0].answer, "Option B");
        assert_eq!(questions[1].text, "A diode conducts when");
        assert_eq!(questions[1].answer, "Option A");
        assert_eq!(
            questions[1].explanation.as_deref(),
            Some("Current flows in forward bias.")
        );
        assert_eq!(questions[1].url.as_deref(), Some(url));
    }
}
