//! Simplification: one request to the simplify endpoint per user action.

use tracing::{info, warn};

use crate::client::{Backend, SimplifyRequest};
use crate::error::{Operation, WorkflowError, WARNING_MARKER};
use crate::ingest::Document;
use crate::markup::TrustedHtml;
use crate::mode::SimplicityLevel;

/// Shown before any document has been simplified.
pub const PLACEHOLDER_TEXT: &str = "Your simplified document will appear here.";
pub const PROCESSING_TEXT: &str = "Processing...";
pub const NO_SUMMARY_TEXT: &str = "No summary returned.";

/// A simplification result that chat questions can be asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary(TrustedHtml);

impl Summary {
    pub fn new(html: TrustedHtml) -> Self {
        Self(html)
    }

    pub fn html(&self) -> &TrustedHtml {
        &self.0
    }

    /// The text a reader sees; this is what the chatbot receives.
    pub fn plain_text(&self) -> String {
        self.0.plain_text()
    }
}

/// What the backend made of a successful request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimplifyOutcome {
    Summary(Summary),
    /// The `summary` field was absent or blank.
    Missing,
    /// The backend put its own warning in the `summary` field.
    BackendWarning(String),
}

/// Contents of the output area.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputSurface {
    #[default]
    Placeholder,
    Processing,
    Rendered(TrustedHtml),
    Notice(String),
    Warning(String),
}

impl OutputSurface {
    pub fn is_warning(&self) -> bool {
        matches!(self, OutputSurface::Warning(_))
    }

    /// The surface as plain text, markup stripped.
    pub fn plain_text(&self) -> String {
        match self {
            OutputSurface::Placeholder => PLACEHOLDER_TEXT.to_string(),
            OutputSurface::Processing => PROCESSING_TEXT.to_string(),
            OutputSurface::Rendered(html) => html.plain_text(),
            OutputSurface::Notice(text) | OutputSurface::Warning(text) => text.clone(),
        }
    }
}

impl From<&SimplifyOutcome> for OutputSurface {
    fn from(outcome: &SimplifyOutcome) -> Self {
        match outcome {
            SimplifyOutcome::Summary(summary) => OutputSurface::Rendered(summary.html().clone()),
            SimplifyOutcome::Missing => OutputSurface::Notice(NO_SUMMARY_TEXT.to_string()),
            SimplifyOutcome::BackendWarning(message) => OutputSurface::Warning(message.clone()),
        }
    }
}

/// One request to the simplify endpoint.
#[derive(Debug, Clone)]
pub struct SimplifyJob {
    document: Document,
    level: SimplicityLevel,
}

impl SimplifyJob {
    pub fn new(document: Document, level: SimplicityLevel) -> Self {
        Self { document, level }
    }

    pub async fn run(self, backend: &dyn Backend) -> Result<SimplifyOutcome, WorkflowError> {
        let request = SimplifyRequest {
            text: self.document.into_string(),
            level: self.level.as_str().to_string(),
        };

        let response = backend.simplify(&request).await.map_err(|e| {
            warn!(error = %e, "simplify request failed");
            WorkflowError::transport(Operation::Simplify, e)
        })?;

        let outcome = match response.summary {
            Some(summary) if summary.trim().is_empty() => SimplifyOutcome::Missing,
            Some(summary) if summary.starts_with(WARNING_MARKER) => {
                warn!("backend reported a simplification failure");
                SimplifyOutcome::BackendWarning(summary)
            }
            Some(summary) => SimplifyOutcome::Summary(Summary::new(TrustedHtml::from_backend(summary))),
            None => SimplifyOutcome::Missing,
        };

        if let SimplifyOutcome::Summary(summary) = &outcome {
            info!(level = %self.level, chars = summary.html().as_str().len(), "document simplified");
        }
        Ok(outcome)
    }
}

/// Sends `document` at `level` and classifies the response.
pub async fn simplify(
    backend: &dyn Backend,
    document: Document,
    level: SimplicityLevel,
) -> Result<SimplifyOutcome, WorkflowError> {
    SimplifyJob::new(document, level).run(backend).await
}
