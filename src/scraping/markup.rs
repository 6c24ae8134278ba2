// Shared DOM and text helpers for the site parsers.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use url::Url;

use super::ScrapedQuestion;
use crate::utils::html::{clean_html, to_plain_text};

static BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static ANSWER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:answer|ans|option)\s*[:.\-]?\s*(?:option\s*)?\(?([a-e])\)?(?:[^a-z]|$)")
        .expect("valid regex")
});

static QUESTION_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*[.)]\s+(.+)$").expect("valid regex"));

static OPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\(?([a-eA-E])[.)]\s+(.+)$").expect("valid regex"));

static ANSWER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:correct\s+)?(?:answer|ans)\b").expect("valid regex"));

static EXPLANATION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:solution|explanation)\s*:?\s*(.*)$").expect("valid regex")
});

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

/// Visible text of an element with whitespace collapsed.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    collapse(&el.text().collect::<String>())
}

pub(crate) fn fragment_text(html: &str) -> String {
    to_plain_text(html)
}

/// Sanitized inner HTML, trimmed.
pub(crate) fn element_html(el: ElementRef<'_>) -> String {
    clean_html(&el.inner_html()).trim().to_string()
}

pub(crate) fn collapse(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Plain-text lines of an element, split on `<br>`.
pub(crate) fn element_lines(el: ElementRef<'_>) -> Vec<String> {
    BREAK
        .split(&el.inner_html())
        .map(fragment_text)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Pulls the option letter out of texts such as `"Answer: Option B"`,
/// `"Ans: c"`, `"Option D"` or a bare `"A"`.
pub(crate) fn answer_letter(text: &str) -> Option<char> {
    if let Some(caps) = ANSWER.captures(text) {
        return caps[1].chars().next().map(|c| c.to_ascii_uppercase());
    }

    let trimmed = text.trim().trim_end_matches(['.', ')']).trim_start_matches('(');
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_uppercase()),
        _ => None,
    }
}

/// Text following a `"Solution:"` / `"Explanation:"` marker, if any.
pub(crate) fn explanation_after_marker(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let start = ["solution", "explanation"]
        .iter()
        .filter_map(|marker| lower.find(marker).map(|at| at + marker.len()))
        .min()?;

    let rest = text[start..].trim_start_matches([':', ' ']).trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Resolves `href` against the page it appeared on.
pub(crate) fn absolute_link(page_url: &str, href: &str) -> Option<String> {
    let base = Url::parse(page_url).ok()?;
    base.join(href).ok().map(String::from)
}

#[derive(Debug, Default)]
struct Block {
    number: usize,
    text: String,
    options: Vec<String>,
    answer: Option<char>,
    explanation: Option<String>,
}

/// Line-oriented parser for pages that list many numbered questions as
/// paragraphs: `"1. question"`, `"A. option"`, `"Answer: B"`.
#[derive(Debug, Default)]
pub(crate) struct NumberedParser {
    blocks: Vec<Block>,
}

impl NumberedParser {
    pub(crate) fn feed_line(&mut self, line: &str) {
        if let Some(caps) = QUESTION_START.captures(line) {
            let number = caps[1].parse::<usize>().unwrap_or(0);
            if self.starts_question(number) {
                self.blocks.push(Block {
                    number,
                    text: caps[2].trim().to_string(),
                    ..Block::default()
                });
                return;
            }
        }

        let Some(block) = self.blocks.last_mut() else {
            return;
        };

        if ANSWER_LINE.is_match(line) {
            if let Some(letter) = answer_letter(line) {
                block.answer = Some(letter);
            }
            return;
        }

        if let Some(caps) = EXPLANATION_LINE.captures(line) {
            let body = caps[1].trim();
            if !body.is_empty() {
                block.explanation = Some(body.to_string());
            }
            return;
        }

        if let Some(caps) = OPTION_LINE.captures(line) {
            let letter = caps[1].chars().next().unwrap_or('?').to_ascii_uppercase();
            let expected = (b'A' + block.options.len() as u8) as char;
            if letter == expected && block.answer.is_none() {
                block.options.push(caps[2].trim().to_string());
                return;
            }
        }

        if block.options.is_empty() && block.answer.is_none() {
            block.text.push(' ');
            block.text.push_str(line.trim());
        }
    }

    /// Applies an answer found outside the line flow (e.g. a spoiler box)
    /// to the most recent question.
    pub(crate) fn set_answer(&mut self, text: &str) {
        if let Some(block) = self.blocks.last_mut() {
            if let Some(letter) = answer_letter(text) {
                block.answer = Some(letter);
            }
            if block.explanation.is_none() {
                block.explanation = explanation_after_marker(text);
            }
        }
    }

    /// Question numbers grow by one. Any other numbered line before the
    /// options start belongs to the current question's body.
    fn starts_question(&self, number: usize) -> bool {
        match self.blocks.last() {
            None => true,
            Some(last) => {
                last.number.checked_add(1) == Some(number)
                    || !last.options.is_empty()
                    || last.answer.is_some()
            }
        }
    }

    pub(crate) fn finish(self, page_url: &str) -> Vec<ScrapedQuestion> {
        let total = self.blocks.len();
        let questions: Vec<ScrapedQuestion> = self
            .blocks
            .into_iter()
            .filter_map(|b| {
                ScrapedQuestion::well_formed(b.text, b.options, b.answer, page_url)
                    .map(|q| q.with_explanation(b.explanation))
            })
            .collect();

        if questions.len() < total {
            tracing::warn!(
                "Skipped {} malformed question(s) on {}",
                total - questions.len(),
                page_url
            );
        }
        questions
    }
}
