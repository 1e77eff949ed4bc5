//! Fixed wording of the model question paper.

/// Text blocks printed on every paper.
///
/// `Default` reproduces the MSBTE-style template; callers preparing papers for
/// another board can override any field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperTemplate {
    pub institution: String,
    pub status_line: String,
    pub certification: String,
    pub title: String,
    pub course: String,
    pub duration: String,
    pub max_marks: u32,
    /// Printed under "Instructions:", one numbered line each.
    pub instructions: Vec<String>,
    /// Shown under Q.1 when the analysis produced no 2-mark questions.
    pub short_fallback: String,
    /// Name used in the page footer.
    pub product_name: String,
}

impl Default for PaperTemplate {
    fn default() -> Self {
        Self {
            institution: "MAHARASHTRA STATE BOARD OF TECHNICAL EDUCATION".to_string(),
            status_line: "(Autonomous)".to_string(),
            certification: "(ISO/IEC - 27001 - 2013 Certified)".to_string(),
            title: "SUMMER / WINTER EXAMINATION MODEL QUESTION PAPER".to_string(),
            course: "Diploma in Engineering".to_string(),
            duration: "3 Hours".to_string(),
            max_marks: 70,
            instructions: vec![
                "All questions are compulsory.".to_string(),
                "Illustrate your answers with neat sketches wherever necessary.".to_string(),
                "Figures to the right indicate full marks.".to_string(),
                "Assume suitable data if necessary.".to_string(),
                "Preferably, write the answers in sequential order.".to_string(),
            ],
            short_fallback:
                "   [AI generated mostly long questions, refer to Q.2 for important topics]"
                    .to_string(),
            product_name: "Exam Oracle AI".to_string(),
        }
    }
}

impl PaperTemplate {
    /// Footer line for 1-indexed `page` of `total`.
    pub fn footer(&self, page: usize, total: usize) -> String {
        format!("Page {page} of {total} - Generated by {}", self.product_name)
    }
}
