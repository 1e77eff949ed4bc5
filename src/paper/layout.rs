//! Single-pass layout of the model question paper.
//!
//! [`layout_paper`] walks the analysis once, top to bottom, and emits draw
//! operations into pages. All coordinates are millimetres on an A4 page with
//! the origin at the top-left corner; the PDF writer flips them.
//!
//! ```text
//! header ─▶ details box ─▶ instructions ─▶ Q.1 (short) ─▶ Q.2.. (long, 4 per block)
//! ```
//!
//! Page breaks are decided with two thresholds: a block header never starts
//! below [`BLOCK_BREAK_Y`], an item never starts below [`ITEM_BREAK_Y`].
//! Footers are stamped once the final page count is known.

use super::cursor::PageCursor;
use super::metrics::PaperFont;
use super::template::PaperTemplate;
use super::wrap::wrap_text;
use crate::model::{AnalysisResult, PredictedQuestion};
use tracing::debug;

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;

pub const BLOCK_X: f32 = 15.0;
pub const LABEL_X: f32 = 20.0;
pub const TEXT_X: f32 = 28.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 50.0;
pub const MARKS_X: f32 = PAGE_WIDTH - 35.0;

pub const TOP_MARGIN: f32 = 20.0;
pub const BLOCK_BREAK_Y: f32 = 250.0;
pub const ITEM_BREAK_Y: f32 = 280.0;
pub const FOOTER_Y: f32 = 290.0;

const LINE_HEIGHT: f32 = 5.0;
const NOTE_LINE_HEIGHT: f32 = 3.5;
const SHORT_SPACING: f32 = 4.0;
const LONG_SPACING: f32 = 8.0;
const HEADER_ADVANCE: f32 = 8.0;
const BLOCK_SPACING: f32 = 5.0;
const FALLBACK_ADVANCE: f32 = 10.0;

const BODY_SIZE: f32 = 10.0;
const HEADER_SIZE: f32 = 11.0;
const NOTE_SIZE: f32 = 8.0;
const NOTE_GRAY: u8 = 100;

/// Q.1 holds at most this many 2-mark items.
pub const MAX_SHORT_QUESTIONS: usize = 7;
/// Long questions per block after Q.1.
pub const LONG_CHUNK_SIZE: usize = 4;

const SHORT_INSTRUCTION: &str = "Attempt any FIVE of the following:";
const SHORT_MARKS: &str = "(10 Marks)";
const LONG_INSTRUCTION: &str = "Attempt any THREE of the following:";
const LONG_MARKS: &str = "(12 Marks)";

/// Horizontal anchoring of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    /// `x` is the centre of the run.
    Center,
}

/// One primitive drawn on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        /// Baseline.
        y: f32,
        text: String,
        font: PaperFont,
        size: f32,
        /// 0 = black, 255 = white.
        gray: u8,
        align: Align,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        line_width: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        line_width: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidOutPage {
    pub ops: Vec<DrawOp>,
}

impl LaidOutPage {
    /// Text runs on this page in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }
}

/// Summary of one numbered question block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBlock {
    /// 1 for the short-answer block, 2.. for long blocks.
    pub number: usize,
    pub instruction: String,
    pub marks_label: String,
    /// Item labels emitted, in order.
    pub labels: Vec<char>,
    /// `true` when the block shows the placeholder line instead of items.
    pub fallback: bool,
    /// 0-indexed page holding the block header.
    pub first_page: usize,
}

/// Writer-independent page model of a paper.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperLayout {
    pub pages: Vec<LaidOutPage>,
    pub blocks: Vec<QuestionBlock>,
}

impl PaperLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Label for the item at `index` inside a block: `a`, `b`, … `z`.
pub fn item_label(index: usize) -> Option<char> {
    if index < 26 {
        Some(char::from(b'a' + index as u8))
    } else {
        None
    }
}

/// Split predictions into Q.1 items (2-mark, first seven) and long items
/// (every other mark value, original order). 2-mark items past the cap are
/// left out of the paper.
pub fn partition_questions(
    questions: &[PredictedQuestion],
) -> (Vec<&PredictedQuestion>, Vec<&PredictedQuestion>) {
    let short = questions
        .iter()
        .filter(|q| q.is_short())
        .take(MAX_SHORT_QUESTIONS)
        .collect();
    let long = questions.iter().filter(|q| !q.is_short()).collect();
    (short, long)
}

/// Lay out the whole paper.
pub fn layout_paper(result: &AnalysisResult, template: &PaperTemplate) -> PaperLayout {
    let mut canvas = Canvas::new();

    let start_y = canvas.header(result, template);
    let mut cursor = PageCursor::new(start_y, TOP_MARGIN);

    let (short, long) = partition_questions(&result.predicted_questions);
    let mut blocks = Vec::with_capacity(1 + long.len().div_ceil(LONG_CHUNK_SIZE));

    blocks.push(canvas.short_block(&mut cursor, &short, template));
    for (i, chunk) in long.chunks(LONG_CHUNK_SIZE).enumerate() {
        blocks.push(canvas.long_block(&mut cursor, i + 2, chunk));
    }

    let total = canvas.pages.len();
    for (i, page) in canvas.pages.iter_mut().enumerate() {
        page.ops.push(DrawOp::Text {
            x: PAGE_WIDTH / 2.0,
            y: FOOTER_Y,
            text: template.footer(i + 1, total),
            font: PaperFont::Regular,
            size: 9.0,
            gray: 0,
            align: Align::Center,
        });
    }

    debug!(
        "Laid out '{}': {} short, {} long, {} blocks, {} pages",
        result.subject_name,
        short.len(),
        long.len(),
        blocks.len(),
        total
    );

    PaperLayout {
        pages: canvas.pages,
        blocks,
    }
}

struct Canvas {
    pages: Vec<LaidOutPage>,
}

impl Canvas {
    fn new() -> Self {
        Self {
            pages: vec![LaidOutPage::default()],
        }
    }

    fn push(&mut self, page: usize, op: DrawOp) {
        while self.pages.len() <= page {
            self.pages.push(LaidOutPage::default());
        }
        self.pages[page].ops.push(op);
    }

    #[allow(clippy::too_many_arguments)]
    fn text(
        &mut self,
        page: usize,
        x: f32,
        y: f32,
        text: impl Into<String>,
        font: PaperFont,
        size: f32,
        gray: u8,
        align: Align,
    ) {
        self.push(
            page,
            DrawOp::Text {
                x,
                y,
                text: text.into(),
                font,
                size,
                gray,
                align,
            },
        );
    }

    fn left(&mut self, page: usize, x: f32, y: f32, text: impl Into<String>, font: PaperFont, size: f32) {
        self.text(page, x, y, text, font, size, 0, Align::Left);
    }

    fn centred(&mut self, y: f32, text: impl Into<String>, font: PaperFont, size: f32) {
        self.text(0, PAGE_WIDTH / 2.0, y, text, font, size, 0, Align::Center);
    }

    /// Draw `lines` at `x` starting on baseline `y`, `line_height` apart.
    #[allow(clippy::too_many_arguments)]
    fn lines(
        &mut self,
        page: usize,
        x: f32,
        y: f32,
        lines: &[String],
        line_height: f32,
        font: PaperFont,
        size: f32,
        gray: u8,
    ) {
        for (i, line) in lines.iter().enumerate() {
            let baseline = y + i as f32 * line_height;
            self.text(page, x, baseline, line.as_str(), font, size, gray, Align::Left);
        }
    }

    /// Fixed first-page header. Returns the y where questions start.
    fn header(&mut self, result: &AnalysisResult, template: &PaperTemplate) -> f32 {
        use PaperFont::{Bold, Regular};

        self.centred(15.0, template.institution.as_str(), Bold, 14.0);
        self.centred(20.0, template.status_line.as_str(), Regular, 10.0);
        self.centred(25.0, template.certification.as_str(), Regular, 10.0);
        self.centred(32.0, template.title.as_str(), Bold, 12.0);

        self.push(
            0,
            DrawOp::Rect {
                x: 10.0,
                y: 36.0,
                width: 190.0,
                height: 18.0,
                line_width: 0.5,
            },
        );

        let code = result.subject_code().unwrap_or("-----");
        self.left(0, 15.0, 42.0, format!("Subject Name: {}", result.subject_name), Bold, 10.0);
        self.left(0, 140.0, 42.0, format!("Subject Code: {code}"), Bold, 10.0);
        self.left(0, 15.0, 49.0, format!("Course: {}", template.course), Bold, 10.0);
        self.left(0, 140.0, 49.0, format!("Time: {}", template.duration), Bold, 10.0);
        self.left(0, 170.0, 49.0, format!("Max Marks: {}", template.max_marks), Bold, 10.0);

        self.left(0, 10.0, 62.0, "Instructions:", Bold, 10.0);
        let mut y = 67.0;
        for (i, line) in template.instructions.iter().enumerate() {
            self.left(0, BLOCK_X, y, format!("{}. {line}", i + 1), Regular, 9.0);
            y += 5.0;
        }
        y += 5.0;

        self.push(
            0,
            DrawOp::Line {
                x1: 10.0,
                y1: y - 5.0,
                x2: PAGE_WIDTH - 10.0,
                y2: y - 5.0,
                line_width: 0.2,
            },
        );
        y
    }

    fn block_header(&mut self, cursor: &mut PageCursor, number: usize, instruction: &str, marks: &str) {
        let (page, y) = (cursor.page(), cursor.y());
        self.left(
            page,
            BLOCK_X,
            y,
            format!("Q.{number} {instruction}"),
            PaperFont::Bold,
            HEADER_SIZE,
        );
        self.left(page, MARKS_X, y, marks, PaperFont::Bold, HEADER_SIZE);
        cursor.advance(HEADER_ADVANCE);
    }

    fn short_block(
        &mut self,
        cursor: &mut PageCursor,
        items: &[&PredictedQuestion],
        template: &PaperTemplate,
    ) -> QuestionBlock {
        cursor.ensure_room(BLOCK_BREAK_Y);
        let first_page = cursor.page();
        self.block_header(cursor, 1, SHORT_INSTRUCTION, SHORT_MARKS);

        let mut labels = Vec::with_capacity(items.len());
        if items.is_empty() {
            self.left(
                cursor.page(),
                LABEL_X,
                cursor.y(),
                template.short_fallback.as_str(),
                PaperFont::Regular,
                BODY_SIZE,
            );
            cursor.advance(FALLBACK_ADVANCE);
        }
        for (i, question) in items.iter().enumerate() {
            let Some(label) = item_label(i) else { break };
            cursor.ensure_room(ITEM_BREAK_Y);
            let lines = self.item(cursor, label, &question.question_text);
            cursor.advance_lines(lines.len(), LINE_HEIGHT, SHORT_SPACING);
            labels.push(label);
        }
        cursor.advance(BLOCK_SPACING);

        QuestionBlock {
            number: 1,
            instruction: SHORT_INSTRUCTION.to_string(),
            marks_label: SHORT_MARKS.to_string(),
            fallback: labels.is_empty(),
            labels,
            first_page,
        }
    }

    fn long_block(
        &mut self,
        cursor: &mut PageCursor,
        number: usize,
        items: &[&PredictedQuestion],
    ) -> QuestionBlock {
        cursor.ensure_room(BLOCK_BREAK_Y);
        let first_page = cursor.page();
        self.block_header(cursor, number, LONG_INSTRUCTION, LONG_MARKS);

        let mut labels = Vec::with_capacity(items.len());
        for (i, question) in items.iter().enumerate() {
            let Some(label) = item_label(i) else { break };
            cursor.ensure_room(ITEM_BREAK_Y);
            let lines = self.item(cursor, label, &question.question_text);
            let height = lines.len() as f32 * LINE_HEIGHT;

            let note = format!(
                "[{} Prob: {}]",
                question.probability_level, question.reasoning
            );
            let note_lines = wrap_text(&note, CONTENT_WIDTH, PaperFont::Regular, NOTE_SIZE);
            self.lines(
                cursor.page(),
                TEXT_X,
                cursor.y() + height + 1.0,
                &note_lines,
                NOTE_LINE_HEIGHT,
                PaperFont::Regular,
                NOTE_SIZE,
                NOTE_GRAY,
            );

            let extra = (note_lines.len() - 1) as f32 * NOTE_LINE_HEIGHT;
            cursor.advance(height + LONG_SPACING + extra);
            labels.push(label);
        }
        cursor.advance(BLOCK_SPACING);

        QuestionBlock {
            number,
            instruction: LONG_INSTRUCTION.to_string(),
            marks_label: LONG_MARKS.to_string(),
            fallback: false,
            labels,
            first_page,
        }
    }

    /// Draw a labelled item at the cursor. Returns the wrapped text lines;
    /// the caller advances the cursor.
    fn item(&mut self, cursor: &PageCursor, label: char, text: &str) -> Vec<String> {
        let (page, y) = (cursor.page(), cursor.y());
        self.left(page, LABEL_X, y, format!("{label}) "), PaperFont::Regular, BODY_SIZE);
        let lines = wrap_text(text, CONTENT_WIDTH, PaperFont::Regular, BODY_SIZE);
        self.lines(page, TEXT_X, y, &lines, LINE_HEIGHT, PaperFont::Regular, BODY_SIZE, 0);
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Marks, ProbabilityLevel};

    fn question(text: &str, marks: Marks) -> PredictedQuestion {
        PredictedQuestion {
            question_text: text.to_string(),
            reasoning: "Asked in 2022 and 2023".to_string(),
            probability_level: ProbabilityLevel::High,
            marks,
        }
    }

    fn result(questions: Vec<PredictedQuestion>) -> AnalysisResult {
        AnalysisResult {
            subject_name: "Operating Systems".to_string(),
            subject_code: Some("22516".to_string()),
            repeated_questions: vec![],
            predicted_questions: questions,
        }
    }

    #[test]
    fn labels_are_bounded() {
        assert_eq!(item_label(0), Some('a'));
        assert_eq!(item_label(6), Some('g'));
        assert_eq!(item_label(25), Some('z'));
        assert_eq!(item_label(26), None);
    }

    #[test]
    fn partition_caps_short_and_keeps_order() {
        let mut qs: Vec<_> = (0..9).map(|i| question(&format!("s{i}"), Marks::Two)).collect();
        qs.insert(3, question("l0", Marks::Six));
        qs.push(question("l1", Marks::Four));

        let (short, long) = partition_questions(&qs);
        assert_eq!(short.len(), MAX_SHORT_QUESTIONS);
        assert_eq!(short[0].question_text, "s0");
        let long: Vec<_> = long.iter().map(|q| q.question_text.as_str()).collect();
        assert_eq!(long, vec!["l0", "l1"]);
    }

    #[test]
    fn header_is_on_first_page() {
        let layout = layout_paper(&result(vec![]), &PaperTemplate::default());
        let page = &layout.pages[0];
        assert!(page.contains_text("MAHARASHTRA STATE BOARD OF TECHNICAL EDUCATION"));
        assert!(page.contains_text("Subject Name: Operating Systems"));
        assert!(page.contains_text("Subject Code: 22516"));
        assert!(page.contains_text("5. Preferably, write the answers in sequential order."));
        assert!(page.ops.iter().any(|op| matches!(op, DrawOp::Rect { .. })));
    }

    #[test]
    fn missing_code_shows_dashes() {
        let mut r = result(vec![]);
        r.subject_code = Some("XXXXX".to_string());
        let layout = layout_paper(&r, &PaperTemplate::default());
        assert!(layout.pages[0].contains_text("Subject Code: -----"));
    }

    #[test]
    fn empty_predictions_use_fallback() {
        let layout = layout_paper(&result(vec![]), &PaperTemplate::default());
        assert_eq!(layout.blocks.len(), 1);
        assert!(layout.blocks[0].fallback);
        assert!(layout.blocks[0].labels.is_empty());
        assert!(layout.pages[0].contains_text("refer to Q.2 for important topics"));
        assert_eq!(layout.page_count(), 1);
    }

    #[test]
    fn first_question_starts_below_rule() {
        let layout = layout_paper(&result(vec![]), &PaperTemplate::default());
        let q1_y = layout.pages[0].ops.iter().find_map(|op| match op {
            DrawOp::Text { text, y, .. } if text.starts_with("Q.1 ") => Some(*y),
            _ => None,
        });
        assert_eq!(q1_y, Some(97.0));
    }

    #[test]
    fn annotation_is_grey_and_small() {
        let layout = layout_paper(
            &result(vec![question("Explain paging.", Marks::Four)]),
            &PaperTemplate::default(),
        );
        let note = layout.pages[0].ops.iter().find_map(|op| match op {
            DrawOp::Text { text, size, gray, .. } if text.starts_with("[High Prob:") => {
                Some((*size, *gray))
            }
            _ => None,
        });
        assert_eq!(note, Some((NOTE_SIZE, NOTE_GRAY)));
    }

    #[test]
    fn long_blocks_number_contiguously() {
        let qs: Vec<_> = (0..6).map(|i| question(&format!("long {i}"), Marks::Six)).collect();
        let layout = layout_paper(&result(qs), &PaperTemplate::default());
        let numbers: Vec<_> = layout.blocks.iter().map(|b| b.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(layout.blocks[1].labels, vec!['a', 'b', 'c', 'd']);
        assert_eq!(layout.blocks[2].labels, vec!['a', 'b']);
    }

    #[test]
    fn footer_on_every_page() {
        let long_text = "Describe in detail ".repeat(40);
        let qs: Vec<_> = (0..12).map(|_| question(&long_text, Marks::Six)).collect();
        let layout = layout_paper(&result(qs), &PaperTemplate::default());
        let n = layout.page_count();
        assert!(n >= 2);
        for (i, page) in layout.pages.iter().enumerate() {
            let footer = format!("Page {} of {n} - Generated by Exam Oracle AI", i + 1);
            assert_eq!(page.texts().last(), Some(footer.as_str()));
        }
    }

    #[test]
    fn items_never_start_below_threshold() {
        let long_text = "Compare ".repeat(60);
        let qs: Vec<_> = (0..10).map(|_| question(&long_text, Marks::Four)).collect();
        let layout = layout_paper(&result(qs), &PaperTemplate::default());
        for page in &layout.pages {
            for op in &page.ops {
                if let DrawOp::Text { text, y, x, .. } = op {
                    if *x == LABEL_X && text.ends_with(") ") {
                        assert!(*y <= ITEM_BREAK_Y, "item label at {y}");
                    }
                }
            }
        }
    }
}
