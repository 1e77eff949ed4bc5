//! Prompts for the paper analysis request.
//!
//! The model sees one system message (analysis instructions followed by the
//! JSON response contract) and one user message carrying every uploaded page
//! as an inline image. Callers can replace the instructions via
//! [`crate::config::AnalysisConfig::system_prompt`]; the contract is always
//! appended so the response stays parseable.

/// Default analysis instructions.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an expert academic analyst and professor familiar with technical board examinations (like MSBTE).
Your task is to analyse the provided previous year question papers (page images).

1. Identify the Subject Name and Subject Code (e.g. 22412) from the papers.
2. Find questions that are repeated across different papers.
3. Predict potential questions for the upcoming exam.
   - Categorise them by estimated marks: '2 Marks' for short definitions/concepts, '4 Marks' or '6 Marks' for descriptions/derivations/programs.
   - Ensure a good mix of short and long questions to form a model question paper."#;

/// The JSON shape every response must follow.
pub const RESPONSE_CONTRACT: &str = r#"Output strict JSON only: no markdown fences, no commentary. Use exactly this shape:

{
  "subjectName": string,            // the name of the subject or course
  "subjectCode": string,            // the numeric subject code if visible, else "XXXXX"
  "repeatedQuestions": [
    {
      "questionText": string,
      "frequency": string,          // e.g. "Appeared in 2022, 2023"
      "context": string             // brief context or topic category
    }
  ],
  "predictedQuestions": [
    {
      "questionText": string,
      "reasoning": string,          // why this is likely to appear
      "probabilityLevel": "High" | "Medium" | "Low",
      "marks": "2 Marks" | "4 Marks" | "6 Marks"
    }
  ]
}"#;

/// Build the system message from optional custom instructions.
pub fn system_prompt(custom: Option<&str>) -> String {
    let instructions = custom
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);
    format!("{instructions}\n\n{RESPONSE_CONTRACT}")
}

/// Text accompanying the attached page images.
pub fn user_instruction(documents: usize, parts: usize) -> String {
    format!(
        "Analyse the attached previous year question papers ({documents} document(s), {parts} page image(s)) and answer with the JSON described above."
    )
}
