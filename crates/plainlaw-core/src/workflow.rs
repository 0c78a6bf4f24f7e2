//! The document workflow: ingest, simplify, then converse.
//!
//! [`Workflow`] owns every piece of session state. Network work is handed out
//! as jobs so a UI can run them in the background and report back through the
//! matching `finish_*` method; [`Workflow::submit`] and [`Workflow::ask`]
//! drive the same steps inline.

use tracing::warn;

use crate::client::Backend;
use crate::error::WorkflowError;
use crate::ingest::{Document, ExtractJob, FileSelection, IngestRequest, PdfFile, SelectionSource};
use crate::mode::{InputMode, InputModeSelector, SimplicityLevel};
use crate::presenter::{self, Controls};
use crate::session::{ConversationSession, QuestionStart};
use crate::simplify::{OutputSurface, SimplifyJob, SimplifyOutcome, Summary};
use crate::state::{RequestState, Transcript, Turn};

/// What `begin_submit` handed back.
#[derive(Debug)]
pub enum SubmitStep {
    /// A submission is already running; nothing changed.
    Inert,
    /// Upload the PDF, then pass the result to `finish_extract`.
    Extract(ExtractJob),
    /// Simplify, then pass the result to `finish_simplify`.
    Simplify(SimplifyJob),
}

#[derive(Debug, Default)]
pub struct Workflow {
    selector: InputModeSelector,
    pasted_text: String,
    files: FileSelection,
    file_warning: Option<String>,
    level: SimplicityLevel,
    output: OutputSurface,
    summary: Option<Summary>,
    session: ConversationSession,
    ingestion: RequestState,
    simplification: RequestState,
}

impl Workflow {
    pub fn new(level: SimplicityLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    // Input

    pub fn mode(&self) -> InputMode {
        self.selector.mode()
    }

    pub fn selector(&self) -> &InputModeSelector {
        &self.selector
    }

    pub fn set_mode(&mut self, mode: InputMode) -> bool {
        self.selector.set_mode(mode)
    }

    pub fn pasted_text(&self) -> &str {
        &self.pasted_text
    }

    pub fn pasted_text_mut(&mut self) -> &mut String {
        &mut self.pasted_text
    }

    pub fn select_file(&mut self, file: PdfFile, source: SelectionSource) {
        self.files.select(file, source);
        self.file_warning = None;
    }

    /// Records why a browsed or dropped path was refused. The output area and
    /// any summary it shows are left alone.
    pub fn reject_file(&mut self, err: &WorkflowError) {
        warn!(error = %err, "file rejected");
        self.file_warning = Some(err.warning_line());
    }

    /// Warning line for the last refused file, cleared by the next selection.
    pub fn file_warning(&self) -> Option<&str> {
        self.file_warning.as_deref()
    }

    pub fn selected_file(&self) -> Option<&PdfFile> {
        self.files.file()
    }

    pub fn level(&self) -> &SimplicityLevel {
        &self.level
    }

    pub fn set_level(&mut self, level: SimplicityLevel) {
        self.level = level;
    }

    // Output

    pub fn output(&self) -> &OutputSurface {
        &self.output
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        self.session.transcript()
    }

    pub fn ingestion_state(&self) -> &RequestState {
        &self.ingestion
    }

    pub fn simplification_state(&self) -> &RequestState {
        &self.simplification
    }

    pub fn controls(&self) -> Controls {
        presenter::project(&self.ingestion, &self.simplification, self.session.state())
    }

    // Simplification

    pub fn begin_submit(&mut self) -> Result<SubmitStep, WorkflowError> {
        if self.ingestion.is_in_flight() || self.simplification.is_in_flight() {
            return Ok(SubmitStep::Inert);
        }

        self.summary = None;
        self.output = OutputSurface::Processing;

        match IngestRequest::prepare(self.mode(), self.files.file(), &self.pasted_text) {
            Err(err) => {
                warn!(error = %err, "input rejected");
                self.ingestion = RequestState::Failed(err.to_string());
                self.output = OutputSurface::Warning(err.warning_line());
                Err(err)
            }
            Ok(IngestRequest::Text(document)) => {
                self.ingestion = RequestState::Succeeded;
                Ok(SubmitStep::Simplify(self.start_simplify(document)))
            }
            Ok(IngestRequest::Pdf(file)) => {
                self.ingestion = RequestState::InFlight;
                Ok(SubmitStep::Extract(ExtractJob::new(file)))
            }
        }
    }

    fn start_simplify(&mut self, document: Document) -> SimplifyJob {
        self.simplification = RequestState::InFlight;
        SimplifyJob::new(document, self.level.clone())
    }

    /// Applies the extraction result. Returns the follow-up job on success.
    pub fn finish_extract(&mut self, result: Result<Document, WorkflowError>) -> Option<SimplifyJob> {
        match result {
            Ok(document) => {
                self.ingestion = RequestState::Succeeded;
                Some(self.start_simplify(document))
            }
            Err(err) => {
                self.ingestion = RequestState::Failed(err.to_string());
                self.output = OutputSurface::Warning(err.warning_line());
                None
            }
        }
    }

    pub fn finish_simplify(&mut self, result: Result<SimplifyOutcome, WorkflowError>) {
        match result {
            Ok(outcome) => {
                self.output = OutputSurface::from(&outcome);
                match outcome {
                    SimplifyOutcome::Summary(summary) => {
                        self.summary = Some(summary);
                        self.simplification = RequestState::Succeeded;
                    }
                    SimplifyOutcome::Missing => {
                        self.simplification = RequestState::Succeeded;
                    }
                    SimplifyOutcome::BackendWarning(message) => {
                        self.simplification = RequestState::Failed(message);
                    }
                }
            }
            Err(err) => {
                self.simplification = RequestState::Failed(err.to_string());
                self.output = OutputSurface::Warning(err.warning_line());
            }
        }
    }

    /// Runs ingest and simplify to completion.
    pub async fn submit(&mut self, backend: &dyn Backend) -> Result<(), WorkflowError> {
        let job = match self.begin_submit()? {
            SubmitStep::Inert => return Ok(()),
            SubmitStep::Simplify(job) => job,
            SubmitStep::Extract(extract) => {
                let result = extract.run(backend).await;
                let failure = result.as_ref().err().cloned();
                match self.finish_extract(result) {
                    Some(job) => job,
                    None => return failure.map_or(Ok(()), Err),
                }
            }
        };

        let result = job.run(backend).await;
        let failure = result.as_ref().err().cloned();
        self.finish_simplify(result);
        failure.map_or(Ok(()), Err)
    }

    // Conversation

    pub fn begin_question(&mut self, question: &str) -> QuestionStart {
        self.session.begin(question, self.summary.as_ref())
    }

    pub fn finish_question(&mut self, result: Result<String, WorkflowError>) -> Turn {
        self.session.finish(result)
    }

    pub async fn ask(
        &mut self,
        backend: &dyn Backend,
        question: &str,
    ) -> Result<Option<Turn>, WorkflowError> {
        self.session.ask(backend, self.summary.as_ref(), question).await
    }
}
