// src/utils/html.rs

use scraper::Html;

/// Sanitizes scraped markup before it is stored.
///
/// Formatting tags (`<b>`, `<sub>`, `<img>`, ...) survive so questions with
/// formulas still render; scripts, iframes and event handlers are removed.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Visible text of an HTML fragment, entities decoded, whitespace collapsed.
pub fn to_plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
