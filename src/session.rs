//! UI-facing session state.
//!
//! A [`Session`] owns the uploaded documents, the latest result and the last
//! error message, and exposes the three user operations: analyse, reset and
//! download. All methods take `&self`; state sits behind a mutex that is never
//! held across an `.await`, so a front end can share the session between a
//! worker task and its event loop.

use crate::analyze::PaperAnalyzer;
use crate::error::ExamOracleError;
use crate::model::AnalysisResult;
use crate::output::AnalysisStats;
use crate::paper::{self, PaperTemplate};
use crate::pipeline::input::SourceDocument;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct State {
    documents: Vec<SourceDocument>,
    result: Option<AnalysisResult>,
    stats: Option<AnalysisStats>,
    error: Option<String>,
    pending: bool,
    /// Bumped by `reset`; an analysis started in an older generation drops
    /// its outcome.
    generation: u64,
}

#[derive(Debug, Default)]
pub struct Session {
    state: Mutex<State>,
    template: PaperTemplate,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom paper template for downloads.
    pub fn with_template(template: PaperTemplate) -> Self {
        Self {
            state: Mutex::default(),
            template,
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_document(&self, document: SourceDocument) {
        debug!("Session: added '{}'", document.name);
        self.state().documents.push(document);
    }

    /// Remove the document at `index`. Returns it, or `None` when out of range.
    pub fn remove_document(&self, index: usize) -> Option<SourceDocument> {
        let mut state = self.state();
        (index < state.documents.len()).then(|| state.documents.remove(index))
    }

    /// Display names of the queued documents, in upload order.
    pub fn document_names(&self) -> Vec<String> {
        self.state().documents.iter().map(|d| d.name.clone()).collect()
    }

    pub fn document_count(&self) -> usize {
        self.state().documents.len()
    }

    pub fn result(&self) -> Option<AnalysisResult> {
        self.state().result.clone()
    }

    pub fn stats(&self) -> Option<AnalysisStats> {
        self.state().stats.clone()
    }

    /// Message of the last failed operation, verbatim.
    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.state().pending
    }

    /// Analyse the queued documents with `analyzer`.
    ///
    /// With no documents the analyzer is never called and the session error
    /// is set. While an analysis is running, further calls fail with
    /// [`ExamOracleError::AnalysisPending`] and leave the state untouched.
    pub async fn analyze<A: PaperAnalyzer>(
        &self,
        analyzer: &A,
    ) -> Result<AnalysisResult, ExamOracleError> {
        let (documents, generation) = {
            let mut state = self.state();
            if state.pending {
                return Err(ExamOracleError::AnalysisPending);
            }
            if state.documents.is_empty() {
                let err = ExamOracleError::NoDocuments;
                state.error = Some(err.to_string());
                return Err(err);
            }
            state.pending = true;
            state.error = None;
            (state.documents.clone(), state.generation)
        };

        let _pending = PendingGuard {
            session: self,
            generation,
        };
        let outcome = analyzer.analyze(&documents).await;

        let mut state = self.state();
        if state.generation != generation {
            debug!("Session was reset during analysis; discarding outcome");
            return outcome.map(|o| o.result);
        }
        match outcome {
            Ok(output) => {
                info!("Session: analysis stored for '{}'", output.result.subject_name);
                state.result = Some(output.result.clone());
                state.stats = Some(output.stats);
                Ok(output.result)
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Install a previously saved result, as if an analysis had produced it.
    pub fn restore(&self, result: AnalysisResult) {
        let mut state = self.state();
        state.result = Some(result);
        state.stats = None;
        state.error = None;
    }

    /// Clear documents, result and error.
    pub fn reset(&self) {
        let mut state = self.state();
        let generation = state.generation + 1;
        *state = State {
            generation,
            ..State::default()
        };
        debug!("Session reset");
    }

    /// Lay out and serialise the model paper for the current result.
    pub fn render_paper(&self) -> Result<Vec<u8>, ExamOracleError> {
        let result = self.result().ok_or(ExamOracleError::NoResult)?;
        paper::render_paper(&result, &self.template)
    }

    /// Write `<Subject>_Model_Paper.pdf` into `dir` and return its path.
    pub fn download(&self, dir: &Path) -> Result<PathBuf, ExamOracleError> {
        let result = self.result().ok_or(ExamOracleError::NoResult)?;
        paper::write_paper(&result, &self.template, dir).inspect_err(|e| {
            self.state().error = Some(e.to_string());
        })
    }
}

/// Clears the pending flag when the analysis future completes or is dropped.
struct PendingGuard<'a> {
    session: &'a Session,
    generation: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.session.state();
        if state.generation == self.generation {
            state.pending = false;
        }
    }
}
