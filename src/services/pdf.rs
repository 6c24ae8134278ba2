// src/services/pdf.rs

use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::{error::AppError, utils::html::to_plain_text};

// US Letter, in points.
const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN_X: f32 = 30.0;
const TOP: f32 = PAGE_HEIGHT - 30.0;
const BOTTOM: f32 = 50.0;
const LINE_HEIGHT: f32 = 15.0;
const BLOCK_GAP: f32 = 5.0;
const FONT_SIZE: f32 = 12.0;
/// Helvetica at 12pt fits roughly this many characters between the margins.
const MAX_CHARS: usize = 95;

/// What the export needs from a stored question.
pub struct PrintableQuestion<'a> {
    pub text: &'a str,
    pub options: &'a [String],
    pub answer: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Baseline, in points from the bottom edge.
    pub y: f32,
    pub text: String,
}

pub type Page = Vec<Line>;

struct Cursor {
    done: Vec<Page>,
    current: Page,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            done: Vec::new(),
            current: Vec::new(),
            y: TOP,
        }
    }

    fn skip(&mut self, points: f32) {
        self.y -= points;
    }

    fn write(&mut self, text: &str) {
        for chunk in wrap(text, MAX_CHARS) {
            if self.y < BOTTOM {
                self.done.push(std::mem::take(&mut self.current));
                self.y = TOP;
            }
            self.current.push(Line { y: self.y, text: chunk });
            self.y -= LINE_HEIGHT;
        }
    }

    fn finish(mut self) -> Vec<Page> {
        if !self.current.is_empty() || self.done.is_empty() {
            self.done.push(self.current);
        }
        self.done
    }
}

/// Places every line of the export on its page.
pub fn layout_pages(title: &str, questions: &[PrintableQuestion<'_>]) -> Vec<Page> {
    let mut cursor = Cursor::new();
    cursor.write(&format!("Quiz: {}", title));
    cursor.skip(BLOCK_GAP);

    for (i, question) in questions.iter().enumerate() {
        cursor.skip(LINE_HEIGHT);
        cursor.write(&format!(
            "Question No. {}: {}",
            i + 1,
            to_plain_text(question.text)
        ));

        for (j, option) in question.options.iter().enumerate() {
            let letter = char::from_u32('A' as u32 + j as u32).unwrap_or('?');
            cursor.write(&format!("{}. {}", letter, to_plain_text(option)));
        }

        cursor.write(&format!("Answer: {}", question.answer.replace("Option ", "")));
        cursor.skip(BLOCK_GAP);
    }

    cursor.finish()
}

/// Renders laid-out pages with the built-in Helvetica font.
pub fn render(title: &str, pages: &[Page]) -> Result<Vec<u8>, AppError> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        to_mm(PAGE_WIDTH),
        to_mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| AppError::InternalServerError(format!("PDF font error: {}", e)))?;

    for (i, page) in pages.iter().enumerate() {
        let (page_index, layer_index) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(to_mm(PAGE_WIDTH), to_mm(PAGE_HEIGHT), format!("Layer {}", i + 1))
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        for line in page {
            layer.use_text(
                line.text.clone(),
                FONT_SIZE,
                to_mm(MARGIN_X),
                to_mm(line.y),
                &font,
            );
        }
    }

    doc.save_to_bytes()
        .map_err(|e| AppError::InternalServerError(format!("PDF render error: {}", e)))
}

pub fn export_quiz(title: &str, questions: &[PrintableQuestion<'_>]) -> Result<Vec<u8>, AppError> {
    render(title, &layout_pages(title, questions))
}

fn to_mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }

        let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
