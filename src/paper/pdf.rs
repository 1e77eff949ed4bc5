//! Serialise a [`PaperLayout`] into PDF bytes with lopdf.
//!
//! Fonts are the base-14 Helvetica faces, so nothing is embedded and the
//! widths used for wrapping match what any viewer renders. Content streams are
//! left uncompressed.

use super::layout::{Align, DrawOp, LaidOutPage, PaperLayout, PAGE_HEIGHT, PAGE_WIDTH};
use super::metrics::{PaperFont, PT_PER_MM};
use crate::error::ExamOracleError;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

/// Build the PDF for a laid-out paper.
///
/// `title` goes into the document information dictionary.
pub fn write_pdf(layout: &PaperLayout, title: &str) -> Result<Vec<u8>, ExamOracleError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font_dict(PaperFont::Regular));
    let bold_id = doc.add_object(font_dict(PaperFont::Bold));
    let resources_id = doc.add_object(Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([
            (PaperFont::Regular.resource_name(), Object::Reference(regular_id)),
            (PaperFont::Bold.resource_name(), Object::Reference(bold_id)),
        ])),
    )]));

    let media_box = Object::Array(vec![
        0.into(),
        0.into(),
        mm(PAGE_WIDTH).into(),
        mm(PAGE_HEIGHT).into(),
    ]);

    let mut kids: Vec<Object> = Vec::with_capacity(layout.pages.len());
    for page in &layout.pages {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encode_page(page)?));
        let page_id: ObjectId = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            ("MediaBox", media_box.clone()),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    let info_id = doc.add_object(Dictionary::from_iter([
        ("Title", pdf_string(title)),
        ("Producer", pdf_string(concat!("exam-oracle ", env!("CARGO_PKG_VERSION")))),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.trailer.set("Info", Object::Reference(info_id));

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| ExamOracleError::PdfWrite(format!("failed to serialise document: {e}")))?;

    debug!("Wrote {} page(s), {} bytes", count, output.len());
    Ok(output)
}

fn font_dict(font: PaperFont) -> Dictionary {
    Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(font.base_font().as_bytes().to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ])
}

fn encode_page(page: &LaidOutPage) -> Result<Vec<u8>, ExamOracleError> {
    let mut operations = Vec::new();

    for op in &page.ops {
        match op {
            DrawOp::Text {
                x,
                y,
                text,
                font,
                size,
                gray,
                align,
            } => {
                let left = match align {
                    Align::Left => *x,
                    Align::Center => *x - font.text_width(text, *size) / 2.0,
                };
                operations.extend([
                    Operation::new("BT", vec![]),
                    Operation::new("g", vec![(f32::from(*gray) / 255.0).into()]),
                    Operation::new("Tf", vec![font.resource_name().into(), (*size).into()]),
                    Operation::new("Td", vec![mm(left).into(), flip(*y).into()]),
                    Operation::new("Tj", vec![pdf_string(text)]),
                    Operation::new("ET", vec![]),
                ]);
            }
            DrawOp::Rect {
                x,
                y,
                width,
                height,
                line_width,
            } => {
                operations.extend([
                    Operation::new("w", vec![mm(*line_width).into()]),
                    Operation::new(
                        "re",
                        vec![
                            mm(*x).into(),
                            flip(y + height).into(),
                            mm(*width).into(),
                            mm(*height).into(),
                        ],
                    ),
                    Operation::new("S", vec![]),
                ]);
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                line_width,
            } => {
                operations.extend([
                    Operation::new("w", vec![mm(*line_width).into()]),
                    Operation::new("m", vec![mm(*x1).into(), flip(*y1).into()]),
                    Operation::new("l", vec![mm(*x2).into(), flip(*y2).into()]),
                    Operation::new("S", vec![]),
                ]);
            }
        }
    }

    Content { operations }
        .encode()
        .map_err(|e| ExamOracleError::PdfWrite(format!("failed to encode page content: {e}")))
}

fn mm(value: f32) -> f32 {
    value * PT_PER_MM
}

/// Top-down millimetres to bottom-up points.
fn flip(y: f32) -> f32 {
    mm(PAGE_HEIGHT - y)
}

fn pdf_string(text: &str) -> Object {
    Object::String(to_win_ansi(text), StringFormat::Literal)
}

/// Encode text for a WinAnsi font. Latin-1 maps directly, the common
/// typographic punctuation is remapped, and anything else becomes `?`.
fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => c as u8,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2026}' => 0x85,
            '\u{20AC}' => 0x80,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::layout::LaidOutPage;

    fn one_page(ops: Vec<DrawOp>) -> PaperLayout {
        PaperLayout {
            pages: vec![LaidOutPage { ops }],
            blocks: vec![],
        }
    }

    fn text_op(text: &str) -> DrawOp {
        DrawOp::Text {
            x: 20.0,
            y: 20.0,
            text: text.to_string(),
            font: PaperFont::Regular,
            size: 10.0,
            gray: 0,
            align: Align::Left,
        }
    }

    #[test]
    fn win_ansi_mapping() {
        assert_eq!(to_win_ansi("Ohm's law"), b"Ohm's law".to_vec());
        assert_eq!(to_win_ansi("caf\u{E9}"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(to_win_ansi("\u{2018}x\u{2019}"), vec![0x91, b'x', 0x92]);
        assert_eq!(to_win_ansi("\u{2013}"), vec![0x96]);
        assert_eq!(to_win_ansi("\u{03A9}"), b"?".to_vec());
    }

    #[test]
    fn flips_to_bottom_up_points() {
        assert!((flip(0.0) - 841.89).abs() < 0.01);
        assert!(flip(PAGE_HEIGHT).abs() < 1e-3);
    }

    #[test]
    fn output_loads_back() {
        let bytes = write_pdf(&one_page(vec![text_op("Define deadlock.")]), "Test").unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn content_stream_carries_text_and_fonts() {
        let mut ops = vec![text_op("Q.1 Attempt any FIVE of the following:")];
        ops.push(DrawOp::Rect {
            x: 10.0,
            y: 36.0,
            width: 190.0,
            height: 18.0,
            line_width: 0.5,
        });
        let bytes = write_pdf(&one_page(ops), "Test").unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        let decoded = Content::decode(&content).unwrap();

        let names: Vec<_> = decoded.operations.iter().map(|o| o.operator.as_str()).collect();
        assert!(names.contains(&"Tj"));
        assert!(names.contains(&"re"));

        let raw = String::from_utf8_lossy(&content);
        assert!(raw.contains("Attempt any FIVE"));
        assert!(raw.contains("/F1"));
    }

    #[test]
    fn one_pdf_page_per_layout_page() {
        let layout = PaperLayout {
            pages: vec![
                LaidOutPage { ops: vec![text_op("one")] },
                LaidOutPage { ops: vec![text_op("two")] },
                LaidOutPage { ops: vec![text_op("three")] },
            ],
            blocks: vec![],
        };
        let doc = Document::load_mem(&write_pdf(&layout, "Test").unwrap()).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }
}
