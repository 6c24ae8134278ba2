// tests/scraping_tests.rs
//
// Ingestion against a mock question bank. Mock paths carry the site family
// name so source classification works on the mock server's URL.

use async_trait::async_trait;
use mockito::{Matcher, Server};
use quiz_backend::{
    config::ScrapeConfig,
    error::AppError,
    scraping::{
        QuestionSink, ScrapedQuestion, SourceDescriptor, discussion, fetch::Fetcher, ingest,
        source::AdapterRegistry,
    },
};

#[derive(Default)]
struct VecSink(Vec<(i32, ScrapedQuestion)>);

#[async_trait]
impl QuestionSink for VecSink {
    async fn insert(&mut self, order: i32, question: ScrapedQuestion) -> Result<(), AppError> {
        self.0.push((order, question));
        Ok(())
    }
}

fn fetcher(retry_attempts: usize) -> Fetcher {
    Fetcher::new(&ScrapeConfig {
        timeout_secs: 5,
        retry_attempts,
        retry_delay_ms: 10,
    })
    .expect("Failed to build fetcher")
}

fn indiabix_page(question: &str, answer: Option<&str>) -> String {
    let answer = answer
        .map(|a| format!(r#"<input type="hidden" class="jq-hdnakq" value="{}">"#, a))
        .unwrap_or_default();
    format!(
        r#"<html><body>
        <div class="bix-div-container">
          <div class="bix-td-qtxt">{}</div>
          <div class="bix-td-option-val">first</div>
          <div class="bix-td-option-val">second</div>
          {}
        </div>
        </body></html>"#,
        question, answer
    )
}

fn examveda_page(questions: &[&str]) -> String {
    let articles: String = questions
        .iter()
        .map(|q| {
            format!(
                r#"<article class="question single-question">
                  <div class="question-main">{}</div>
                  <div class="question-options">
                    <p><label>A.</label><label>yes</label></p>
                    <p><label>B.</label><label>no</label></p>
                  </div>
                  <div class="answer_container"><strong>Answer: Option B</strong></div>
                </article>"#,
                q
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", articles)
}

fn range(base_url: String, start: u32, end: u32) -> SourceDescriptor {
    SourceDescriptor::Range {
        base_url,
        start_url: Some(start),
        end_url: Some(end),
        start_page: None,
        end_page: None,
    }
}

#[tokio::test]
async fn indiabix_range_skips_malformed_questions() {
    let mut server = Server::new_async().await;
    let _m1 = server
        .mock("GET", "/indiabix/q-1")
        .with_body(indiabix_page("First question", Some("B")))
        .create_async()
        .await;
    let _m2 = server
        .mock("GET", "/indiabix/q-2")
        .with_body(indiabix_page("Broken question", None))
        .create_async()
        .await;
    let _m3 = server
        .mock("GET", "/indiabix/q-3")
        .with_body(indiabix_page("Third question", Some("A")))
        .create_async()
        .await;

    let descriptors = vec![range(format!("{}/indiabix/q-", server.url()), 1, 3)];
    let mut sink = VecSink::default();

    let report = ingest::run(&AdapterRegistry::default(), &fetcher(0), &descriptors, &mut sink)
        .await
        .expect("Ingestion failed");

    assert_eq!(report.inserted, 2);
    assert_eq!(report.next_order, 3);

    let stored: Vec<(i32, &str, &str)> = sink
        .0
        .iter()
        .map(|(order, q)| (*order, q.text.as_str(), q.answer.as_str()))
        .collect();
    assert_eq!(
        stored,
        vec![
            (1, "First question", "Option B"),
            (2, "Third question", "Option A"),
        ]
    );
}

#[tokio::test]
async fn order_continues_across_descriptors() {
    let mut server = Server::new_async().await;
    let _ib = server
        .mock("GET", "/indiabix/q-7")
        .with_body(indiabix_page("IndiaBix question", Some("A")))
        .create_async()
        .await;
    let _p2 = server
        .mock("GET", "/examveda/mcq/")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_body(examveda_page(&["EV one", "EV two"]))
        .create_async()
        .await;
    let _p3 = server
        .mock("GET", "/examveda/mcq/")
        .match_query(Matcher::UrlEncoded("page".into(), "3".into()))
        .with_body(examveda_page(&["EV three"]))
        .create_async()
        .await;

    let descriptors = vec![
        range(format!("{}/indiabix/q-", server.url()), 7, 7),
        SourceDescriptor::Url("https://example.com/not-a-bank".into()),
        SourceDescriptor::Range {
            base_url: format!("{}/examveda/mcq/", server.url()),
            start_url: None,
            end_url: None,
            start_page: Some(2),
            end_page: Some(3),
        },
    ];
    let mut sink = VecSink::default();

    let report = ingest::run(&AdapterRegistry::default(), &fetcher(0), &descriptors, &mut sink)
        .await
        .expect("Ingestion failed");

    assert_eq!(report.skipped_descriptors, 1);
    let stored: Vec<(i32, &str)> = sink
        .0
        .iter()
        .map(|(order, q)| (*order, q.text.as_str()))
        .collect();
    assert_eq!(
        stored,
        vec![
            (1, "IndiaBix question"),
            (2, "EV one"),
            (3, "EV two"),
            (4, "EV three"),
        ]
    );
    assert!(sink.0.iter().skip(1).all(|(_, q)| q.answer == "Option B"));
}

#[tokio::test]
async fn upstream_failure_aborts_but_keeps_earlier_questions() {
    let mut server = Server::new_async().await;
    let _ok = server
        .mock("GET", "/indiabix/q-1")
        .with_body(indiabix_page("Stored before failure", Some("A")))
        .create_async()
        .await;
    let down = server
        .mock("GET", "/indiabix/q-2")
        .with_status(500)
        .expect(2)
        .create_async()
        .await;
    let never = server
        .mock("GET", "/indiabix/q-3")
        .expect(0)
        .create_async()
        .await;

    let descriptors = vec![range(format!("{}/indiabix/q-", server.url()), 1, 3)];
    let mut sink = VecSink::default();

    let result =
        ingest::run(&AdapterRegistry::default(), &fetcher(1), &descriptors, &mut sink).await;

    assert!(matches!(result, Err(AppError::Upstream(_))));
    assert_eq!(sink.0.len(), 1);
    assert_eq!(sink.0[0].0, 1);
    // One retry for the 5xx, then the run stops.
    down.assert_async().await;
    never.assert_async().await;
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let mut server = Server::new_async().await;
    let missing = server
        .mock("GET", "/indiabix/q-1")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let err = fetcher(3)
        .get_html(&format!("{}/indiabix/q-1", server.url()))
        .await
        .unwrap_err();

    assert!(!err.is_transient());
    missing.assert_async().await;
}

#[tokio::test]
async fn discussion_comments_are_scraped() {
    let mut server = Server::new_async().await;
    let _page = server
        .mock("GET", "/indiabix/discussion-1")
        .with_body(
            r#"<html><body>
            <div class="bix-div-comments">
              <div class="bix-comment-text">Ohm is <b>right</b>.</div>
              <div class="bix-comment-text">  Agreed   with above. </div>
            </div>
            </body></html>"#,
        )
        .create_async()
        .await;
    let _empty = server
        .mock("GET", "/indiabix/discussion-2")
        .with_body("<html><body><p>No thread here</p></body></html>")
        .create_async()
        .await;

    let comments = discussion::fetch_discussion_comments(
        &fetcher(0),
        &format!("{}/indiabix/discussion-1", server.url()),
    )
    .await
    .expect("Scrape failed");
    assert_eq!(comments, vec!["Ohm is right.", "Agreed with above."]);

    let missing = discussion::fetch_discussion_comments(
        &fetcher(0),
        &format!("{}/indiabix/discussion-2", server.url()),
    )
    .await;
    assert!(missing.is_err());
}
