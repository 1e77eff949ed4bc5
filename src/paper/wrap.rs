//! Greedy word wrapping against Helvetica metrics.

use super::metrics::PaperFont;

/// Split `text` into lines no wider than `max_width` millimetres.
///
/// Explicit newlines start a new line. Runs of whitespace collapse to a single
/// space. A word wider than the whole line is broken between characters.
/// Empty input yields a single empty line, so the caller always advances by at
/// least one line height.
pub fn wrap_text(text: &str, max_width: f32, font: PaperFont, size: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        wrap_paragraph(paragraph, max_width, font, size, &mut lines);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn wrap_paragraph(
    paragraph: &str,
    max_width: f32,
    font: PaperFont,
    size: f32,
    lines: &mut Vec<String>,
) {
    let mut current = String::new();

    for word in paragraph.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if font.text_width(&candidate, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if font.text_width(word, size) <= max_width {
            current = word.to_string();
        } else {
            current = break_long_word(word, max_width, font, size, lines);
        }
    }

    lines.push(current);
}

/// Push full-width slices of `word` and return the remainder.
fn break_long_word(
    word: &str,
    max_width: f32,
    font: PaperFont,
    size: f32,
    lines: &mut Vec<String>,
) -> String {
    let mut piece = String::new();
    for c in word.chars() {
        piece.push(c);
        if font.text_width(&piece, size) > max_width && piece.chars().count() > 1 {
            piece.pop();
            lines.push(std::mem::take(&mut piece));
            piece.push(c);
        }
    }
    piece
}
