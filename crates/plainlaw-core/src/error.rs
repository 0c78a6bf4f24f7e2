//! Errors surfaced by the document workflow.
//!
//! None of these are fatal. Each one is rendered as a single warning line in
//! the surface that triggered it (the output area or the chat transcript) and
//! the user may retry the action.

use std::path::PathBuf;
use thiserror::Error;

/// Marker the backend prefixes onto payload text to signal a failure.
pub const WARNING_MARKER: &str = "⚠️";

/// Which backend call a transport failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Extract,
    Simplify,
    Chat,
}

impl Operation {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Operation::Extract => "/extract_pdf",
            Operation::Simplify => "/simplify",
            Operation::Chat => "/chatbot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Text mode with nothing but whitespace in the paste area.
    #[error("Please paste some legal text.")]
    EmptyInput,

    /// PDF mode with no file selected.
    #[error("Please upload a PDF file.")]
    NoFileSelected,

    /// A dropped or typed path could not be used as a PDF.
    #[error("Could not open '{}': {reason}", path.display())]
    UnreadableFile { path: PathBuf, reason: String },

    /// The extraction endpoint answered, but with empty text or a warning payload.
    #[error("{0}")]
    ExtractionFailed(String),

    /// The request never produced a usable response.
    #[error("{}", transport_message(*operation, message))]
    Transport { operation: Operation, message: String },

    /// A chat question was asked before any document was simplified.
    #[error("Please simplify a legal document first before asking questions.")]
    NoSummaryYet,
}

fn transport_message(operation: Operation, message: &str) -> String {
    match operation {
        Operation::Extract => format!("PDF extraction error: {}", message),
        Operation::Simplify | Operation::Chat => format!("API Error: {}", message),
    }
}

impl WorkflowError {
    pub fn transport(operation: Operation, err: impl std::fmt::Display) -> Self {
        WorkflowError::Transport {
            operation,
            message: err.to_string(),
        }
    }

    /// Builds the extraction failure from whatever the backend sent back.
    pub fn extraction_failed(payload: Option<&str>) -> Self {
        match payload.map(str::trim) {
            Some(text) if !text.is_empty() => WorkflowError::ExtractionFailed(text.to_string()),
            _ => WorkflowError::ExtractionFailed(format!("{} PDF extraction failed.", WARNING_MARKER)),
        }
    }

    /// One-line, warning-styled rendering of this error.
    pub fn warning_line(&self) -> String {
        let message = self.to_string();
        if message.starts_with(WARNING_MARKER) {
            message
        } else {
            format!("{} {}", WARNING_MARKER, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_line_prefixes_marker() {
        assert_eq!(
            WorkflowError::EmptyInput.warning_line(),
            "⚠️ Please paste some legal text."
        );
        assert_eq!(
            WorkflowError::NoFileSelected.warning_line(),
            "⚠️ Please upload a PDF file."
        );
    }

    #[test]
    fn test_backend_extraction_message_passes_through() {
        let err = WorkflowError::extraction_failed(Some("⚠️ PDF Error: cannot open broken document"));
        assert_eq!(err.warning_line(), "⚠️ PDF Error: cannot open broken document");
    }

    #[test]
    fn test_extraction_fallback_when_payload_empty() {
        let err = WorkflowError::extraction_failed(Some("   "));
        assert_eq!(err.warning_line(), "⚠️ PDF extraction failed.");
        assert_eq!(WorkflowError::extraction_failed(None), err);
    }

    #[test]
    fn test_transport_message_depends_on_operation() {
        let extract = WorkflowError::transport(Operation::Extract, "connection refused");
        assert_eq!(extract.warning_line(), "⚠️ PDF extraction error: connection refused");

        let chat = WorkflowError::transport(Operation::Chat, "connection refused");
        assert_eq!(chat.warning_line(), "⚠️ API Error: connection refused");
    }
}
