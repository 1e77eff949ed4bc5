//! Layout and export tests for the model question paper.
//!
//! Everything here is offline: no provider, no pdfium. PDF output is read
//! back with lopdf to check the page tree matches the layout.

use exam_oracle::paper::layout::{DrawOp, BLOCK_BREAK_Y, ITEM_BREAK_Y, LABEL_X, TOP_MARGIN};
use exam_oracle::paper::{layout_paper, paper_file_name, render_paper, write_paper};
use exam_oracle::{
    AnalysisResult, Marks, PaperTemplate, PredictedQuestion, ProbabilityLevel, Session,
};
use lopdf::Document;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn question(text: &str, marks: Marks, level: ProbabilityLevel) -> PredictedQuestion {
    PredictedQuestion {
        question_text: text.to_string(),
        reasoning: "Appeared in 2019, 2021 and 2023".to_string(),
        probability_level: level,
        marks,
    }
}

fn short(n: usize) -> Vec<PredictedQuestion> {
    (0..n)
        .map(|i| question(&format!("Define term {i}."), Marks::Two, ProbabilityLevel::High))
        .collect()
}

fn long(n: usize, text: &str) -> Vec<PredictedQuestion> {
    (0..n)
        .map(|i| {
            let marks = if i % 2 == 0 { Marks::Four } else { Marks::Six };
            question(&format!("{text} ({i})"), marks, ProbabilityLevel::Medium)
        })
        .collect()
}

fn analysis(subject: &str, predicted: Vec<PredictedQuestion>) -> AnalysisResult {
    AnalysisResult {
        subject_name: subject.to_string(),
        subject_code: Some("22320".to_string()),
        repeated_questions: vec![],
        predicted_questions: predicted,
    }
}

fn footers(layout: &exam_oracle::PaperLayout) -> Vec<String> {
    layout
        .pages
        .iter()
        .filter_map(|p| {
            p.texts()
                .filter(|t| t.starts_with("Page "))
                .last()
                .map(str::to_string)
        })
        .collect()
}

// ── Layout properties ────────────────────────────────────────────────────────

#[test]
fn empty_predictions_render_fallback_only() {
    let layout = layout_paper(&analysis("Physics", vec![]), &PaperTemplate::default());

    assert_eq!(layout.blocks.len(), 1);
    assert_eq!(layout.blocks[0].number, 1);
    assert!(layout.blocks[0].fallback);
    assert!(layout.pages[0].contains_text("[AI generated mostly long questions"));
    assert!(!layout.pages[0].texts().any(|t| t.starts_with("Q.2 ")));
}

#[test]
fn long_questions_chunk_by_four() {
    for n in [1usize, 4, 5, 8, 9, 13] {
        let layout = layout_paper(
            &analysis("Mechanics", long(n, "Explain")),
            &PaperTemplate::default(),
        );
        let long_blocks: Vec<_> = layout.blocks.iter().skip(1).collect();
        assert_eq!(long_blocks.len(), n.div_ceil(4), "n = {n}");

        let numbers: Vec<_> = long_blocks.iter().map(|b| b.number).collect();
        let expected: Vec<_> = (2..2 + n.div_ceil(4)).collect();
        assert_eq!(numbers, expected, "n = {n}");

        let items: usize = long_blocks.iter().map(|b| b.labels.len()).sum();
        assert_eq!(items, n);
        assert!(long_blocks.iter().all(|b| b.labels.len() <= 4));
        assert!(long_blocks
            .iter()
            .all(|b| b.instruction == "Attempt any THREE of the following:"
                && b.marks_label == "(12 Marks)"));
    }
}

#[test]
fn short_questions_are_lettered() {
    for m in 1..=7 {
        let layout = layout_paper(&analysis("Chemistry", short(m)), &PaperTemplate::default());
        let q1 = &layout.blocks[0];
        let expected: Vec<char> = ('a'..='g').take(m).collect();
        assert_eq!(q1.labels, expected);
        assert!(!q1.fallback);
        assert_eq!(q1.instruction, "Attempt any FIVE of the following:");
        assert_eq!(q1.marks_label, "(10 Marks)");
    }
}

#[test]
fn more_than_seven_short_questions_are_capped() {
    let layout = layout_paper(&analysis("Chemistry", short(11)), &PaperTemplate::default());
    assert_eq!(layout.blocks[0].labels.len(), 7);
    assert_eq!(layout.blocks.len(), 1);
}

#[test]
fn long_content_paginates_with_true_page_count() {
    let text = "Explain with a neat labelled diagram the construction and working of ".repeat(6);
    let layout = layout_paper(&analysis("Thermal Engineering", long(12, &text)), &PaperTemplate::default());

    let n = layout.page_count();
    assert!(n >= 2, "expected pagination, got {n} page(s)");

    let expected: Vec<String> = (1..=n)
        .map(|i| format!("Page {i} of {n} - Generated by Exam Oracle AI"))
        .collect();
    assert_eq!(footers(&layout), expected);
}

#[test]
fn continuation_pages_start_at_top_margin() {
    let text = "Derive the expression for ".repeat(12);
    let layout = layout_paper(&analysis("Maths", long(16, &text)), &PaperTemplate::default());
    assert!(layout.page_count() >= 2);

    for page in layout.pages.iter().skip(1) {
        let first_y = page.ops.iter().find_map(|op| match op {
            DrawOp::Text { y, .. } => Some(*y),
            _ => None,
        });
        assert_eq!(first_y, Some(20.0));
    }
}

/// `(page, y)` of every text op accepted by `pick`.
fn positions(layout: &exam_oracle::PaperLayout, pick: impl Fn(&str, f32) -> bool) -> Vec<(usize, f32)> {
    let mut found = Vec::new();
    for (i, page) in layout.pages.iter().enumerate() {
        for op in &page.ops {
            if let DrawOp::Text { text, x, y, .. } = op {
                if pick(text, *x) {
                    found.push((i, *y));
                }
            }
        }
    }
    found
}

#[test]
fn block_header_breaks_earlier_than_items() {
    let mut moved_header = false;
    for words in 1..=80 {
        let mut predicted: Vec<_> = (0..7)
            .map(|_| question(&"Explain ".repeat(words), Marks::Two, ProbabilityLevel::High))
            .collect();
        predicted.extend(long(1, "Describe"));
        let layout = layout_paper(&analysis("Strength of Materials", predicted), &PaperTemplate::default());

        let headers = positions(&layout, |t, _| t.starts_with("Q."));
        assert!(headers.iter().all(|&(_, y)| y <= BLOCK_BREAK_Y), "words = {words}");
        let items = positions(&layout, |t, x| x == LABEL_X && t.ends_with(") "));
        assert!(items.iter().all(|&(_, y)| y <= ITEM_BREAK_Y), "words = {words}");

        // A Q.1 item may start between the two thresholds on the first page,
        // but the Q.2 header that would follow it goes to the next page.
        let q2 = positions(&layout, |t, _| t.starts_with("Q.2 "));
        let late_item_on_first_page = items
            .iter()
            .any(|&(page, y)| page == 0 && y > BLOCK_BREAK_Y);
        if late_item_on_first_page && q2 == vec![(1, TOP_MARGIN)] {
            moved_header = true;
        }
    }
    assert!(moved_header, "no paper placed Q.2 on a fresh page after a late Q.1 item");
}

#[test]
fn mixed_paper_has_expected_blocks() {
    let mut predicted = short(5);
    predicted.extend(long(9, "Describe"));
    let layout = layout_paper(&analysis("Digital Electronics", predicted), &PaperTemplate::default());

    let numbers: Vec<_> = layout.blocks.iter().map(|b| b.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
    assert_eq!(layout.blocks[0].labels.len(), 5);
    assert!(layout.blocks[1..].iter().all(|b| b.labels.len() <= 4));
    assert_eq!(layout.blocks[3].labels, vec!['a']);

    let n = layout.page_count();
    for footer in footers(&layout) {
        assert!(footer.ends_with(&format!("of {n} - Generated by Exam Oracle AI")));
    }
}

#[test]
fn interleaved_marks_keep_long_order() {
    let predicted = vec![
        question("long one", Marks::Six, ProbabilityLevel::High),
        question("short one", Marks::Two, ProbabilityLevel::High),
        question("long two", Marks::Four, ProbabilityLevel::Low),
    ];
    let layout = layout_paper(&analysis("Networks", predicted), &PaperTemplate::default());
    let texts: Vec<&str> = layout.pages[0].texts().collect();
    let one = texts.iter().position(|t| *t == "long one");
    let two = texts.iter().position(|t| *t == "long two");
    assert!(one.is_some() && two.is_some());
    assert!(one < two);
    assert_eq!(layout.blocks[0].labels, vec!['a']);
    assert_eq!(layout.blocks[1].labels, vec!['a', 'b']);
    assert!(texts.contains(&"[Low Prob: Appeared in 2019, 2021 and 2023]"));
}

#[test]
fn layout_is_deterministic() {
    let mut predicted = short(3);
    predicted.extend(long(6, "Compare"));
    let result = analysis("Surveying", predicted);
    let template = PaperTemplate::default();
    assert_eq!(layout_paper(&result, &template), layout_paper(&result, &template));
}

#[test]
fn custom_template_changes_footer() {
    let template = PaperTemplate {
        product_name: "Paper Bot".to_string(),
        ..PaperTemplate::default()
    };
    let layout = layout_paper(&analysis("Biology", vec![]), &template);
    assert_eq!(footers(&layout), vec!["Page 1 of 1 - Generated by Paper Bot"]);
}

// ── File naming and export ───────────────────────────────────────────────────

#[test]
fn file_name_from_subject() {
    assert_eq!(
        paper_file_name("Digital Electronics 2"),
        "Digital_Electronics_2_Model_Paper.pdf"
    );
}

#[test]
fn pdf_page_count_matches_layout() {
    let text = "Write a program to implement a circular queue using arrays and explain ".repeat(5);
    let mut predicted = short(7);
    predicted.extend(long(14, &text));
    let result = analysis("Data Structures", predicted);
    let template = PaperTemplate::default();

    let layout = layout_paper(&result, &template);
    let bytes = render_paper(&result, &template).expect("render should succeed");
    let doc = Document::load_mem(&bytes).expect("output should be a valid PDF");
    assert_eq!(doc.get_pages().len(), layout.page_count());
}

#[test]
fn non_latin_text_does_not_break_export() {
    let predicted = vec![question(
        "Explain Ω-notation and the → operator",
        Marks::Four,
        ProbabilityLevel::High,
    )];
    let bytes = render_paper(&analysis("Algorithms", predicted), &PaperTemplate::default())
        .expect("render should succeed");
    assert!(Document::load_mem(&bytes).is_ok());
}

#[test]
fn write_paper_uses_sanitised_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_paper(
        &analysis("Basic  Electronics", short(2)),
        &PaperTemplate::default(),
        dir.path(),
    )
    .unwrap();
    assert_eq!(path, dir.path().join("Basic_Electronics_Model_Paper.pdf"));
    assert!(path.exists());
}

#[test]
fn session_download_requires_result() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new();
    assert!(session.download(dir.path()).is_err());
    assert!(!dir.path().join("_Model_Paper.pdf").exists());

    session.restore(analysis("Electrical Machines", short(1)));
    let path = session.download(dir.path()).unwrap();
    assert!(path.ends_with("Electrical_Machines_Model_Paper.pdf"));
}
