// src/scraping/source.rs

use serde_json::Value;

use super::{
    ScrapedQuestion, examprimer::ExamPrimer, examveda::Examveda, indiabix::IndiaBix,
    pinoybix::PinoyBix,
};

/// Supported question-bank families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// One question page per integer id.
    IndiaBix,
    /// One page holding many numbered questions.
    PinoyBix,
    /// Paged question lists.
    Examveda,
    /// ExamPrimer pages served from a Wayback Machine snapshot.
    ArchivedExamPrimer,
}

impl SourceKind {
    /// Classifies a URL by substring, first match wins.
    pub fn classify(url: &str) -> Option<Self> {
        const RULES: [(&str, SourceKind); 4] = [
            ("indiabix", SourceKind::IndiaBix),
            ("pinoybix", SourceKind::PinoyBix),
            ("examveda", SourceKind::Examveda),
            ("web.archive.org", SourceKind::ArchivedExamPrimer),
        ];

        RULES
            .iter()
            .find(|(needle, _)| url.contains(needle))
            .map(|(_, kind)| *kind)
    }
}

/// Widest id or page range one descriptor may span.
pub const MAX_RANGE_SPAN: u32 = 1000;

/// One entry of the ingestion request's `urls` list.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceDescriptor {
    Url(String),
    Range {
        base_url: String,
        start_url: Option<u32>,
        end_url: Option<u32>,
        start_page: Option<u32>,
        end_page: Option<u32>,
    },
}

impl SourceDescriptor {
    /// Reads a descriptor from raw request JSON.
    ///
    /// Returns `Ok(None)` for shapes that are not descriptors at all; those
    /// are skipped like unmatched URLs. Range bounds may be JSON numbers or
    /// numeric strings; anything else is rejected, as is a range wider than
    /// [`MAX_RANGE_SPAN`].
    pub fn from_value(value: &Value) -> Result<Option<Self>, String> {
        match value {
            Value::String(url) => Ok(Some(Self::Url(url.trim().to_string()))),
            Value::Object(map) => {
                let Some(base_url) = map.get("base_url").and_then(Value::as_str) else {
                    return Ok(None);
                };
                let start_url = bound(map.get("start_url"), "start_url")?;
                let end_url = bound(map.get("end_url"), "end_url")?;
                let start_page = bound(map.get("start_page"), "start_page")?;
                let end_page = bound(map.get("end_page"), "end_page")?;
                check_span(start_url.unwrap_or(1), end_url, "start_url", "end_url")?;
                check_span(start_page.unwrap_or(1), end_page, "start_page", "end_page")?;

                Ok(Some(Self::Range {
                    base_url: base_url.trim().to_string(),
                    start_url,
                    end_url,
                    start_page,
                    end_page,
                }))
            }
            _ => Ok(None),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Range { base_url, .. } => base_url,
        }
    }

    pub fn kind(&self) -> Option<SourceKind> {
        SourceKind::classify(self.url())
    }
}

fn bound(value: Option<&Value>, field: &str) -> Result<Option<u32>, String> {
    let invalid = || format!("'{}' must be a non-negative integer", field);
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

fn check_span(start: u32, end: Option<u32>, from: &str, to: &str) -> Result<(), String> {
    match end {
        Some(end) if end >= start && end - start >= MAX_RANGE_SPAN => Err(format!(
            "'{}'..'{}' may span at most {} entries",
            from, to, MAX_RANGE_SPAN
        )),
        _ => Ok(()),
    }
}

/// Fetch plan and page parser for one site family.
///
/// Parsing is synchronous: the DOM never lives across an `.await`.
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Page URLs to fetch for the descriptor, in order.
    fn pages(&self, descriptor: &SourceDescriptor) -> Vec<String>;

    /// Well-formed questions found on one fetched page, in page order.
    /// Malformed questions are dropped here.
    fn parse(&self, page_url: &str, html: &str) -> Vec<ScrapedQuestion>;
}

/// The set of adapters the orchestrator dispatches to.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self {
            adapters: vec![
                Box::new(IndiaBix),
                Box::new(PinoyBix),
                Box::new(Examveda),
                Box::new(ExamPrimer),
            ],
        }
    }
}

impl AdapterRegistry {
    pub fn resolve(&self, descriptor: &SourceDescriptor) -> Option<&dyn SourceAdapter> {
        let kind = descriptor.kind()?;
        self.adapters
            .iter()
            .find(|a| a.kind() == kind)
            .map(|a| &**a)
    }
}
