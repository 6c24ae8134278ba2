// src/scraping/discussion.rs

use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::{ScrapeError, fetch::Fetcher, markup::{element_text, selector}};

/// Comment containers seen across the supported sites, most specific first.
static CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        ".bix-div-comments",
        "#comments",
        ".comment-list",
        ".discussion-comments",
    ]
    .into_iter()
    .map(selector)
    .collect()
});

static COMMENT_TEXT: LazyLock<Selector> = LazyLock::new(|| {
    selector(".bix-comment-text, .comment-content, .comment-body, .comment-text")
});

/// Downloads a question's discussion page and returns its comment texts.
pub async fn fetch_discussion_comments(
    fetcher: &Fetcher,
    link: &str,
) -> Result<Vec<String>, ScrapeError> {
    if url::Url::parse(link).is_err() {
        return Err(ScrapeError::InvalidUrl(link.to_string()));
    }

    let html = fetcher.get_html(link).await?;
    parse_comments(link, &html)
}

/// Comment texts in page order.
///
/// A page without any recognizable comment area is an error; a recognized
/// but empty area yields an empty list.
pub fn parse_comments(url: &str, html: &str) -> Result<Vec<String>, ScrapeError> {
    let document = Html::parse_document(html);

    let container = CONTAINERS
        .iter()
        .find_map(|sel| document.select(sel).next())
        .ok_or_else(|| ScrapeError::NoComments {
            url: url.to_string(),
        })?;

    let comments = container
        .select(&COMMENT_TEXT)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect();

    Ok(comments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_indiabix_comments() {
        let html = r#"
        <div class="bix-div-comments">
          <div class="bix-comment"><div class="bix-comment-text">Because   R = V / I.</div></div>
          <div class="bix-comment"><div class="bix-comment-text">Correct answer is A.</div></div>
          <div class="bix-comment"><div class="bix-comment-text">   </div></div>
        </div>"#;

        let comments = parse_comments("https://www.indiabix.com/d/1", html).unwrap();
        assert_eq!(comments, vec!["Because R = V / I.", "Correct answer is A."]);
    }

    #[test]
    fn reads_wordpress_comment_list() {
        let html = r#"
        <ol class="comment-list">
          <li><article><div class="comment-content"><p>Nice one.</p></div></article></li>
        </ol>"#;

        let comments = parse_comments("https://www.pinoybix.org/x.html", html).unwrap();
        assert_eq!(comments, vec!["Nice one."]);
    }

    #[test]
    fn empty_comment_area_is_not_an_error() {
        let html = r#"<div id="comments"></div>"#;
        assert!(parse_comments("u", html).unwrap().is_empty());
    }

    #[test]
    fn page_without_comment_area_fails() {
        let err = parse_comments("https://example.com/q", "<p>nothing</p>").unwrap_err();
        assert!(matches!(err, ScrapeError::NoComments { .. }));
    }
}
