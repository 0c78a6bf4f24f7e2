//! Ingestion: turn the active input into the text that gets simplified.
//!
//! Text mode passes the pasted string through untouched. PDF mode uploads the
//! selected file to the extraction endpoint and accepts whatever text comes
//! back, unless the backend flagged it with the warning marker.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::client::Backend;
use crate::error::{Operation, WorkflowError, WARNING_MARKER};
use crate::mode::InputMode;

/// The text handed to the simplifier. Lives for one request only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document(String);

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// A PDF picked by the user, read fully into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PdfFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }

    pub async fn load(path: &Path) -> Result<Self, WorkflowError> {
        let is_pdf = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if !is_pdf {
            return Err(WorkflowError::UnreadableFile {
                path: path.to_path_buf(),
                reason: "not a PDF file".to_string(),
            });
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| WorkflowError::UnreadableFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        Ok(Self::new(name, bytes))
    }
}

/// How the current file got picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Browse,
    Drop,
}

/// The single file slot both browse and drag-and-drop write into.
#[derive(Debug, Clone, Default)]
pub struct FileSelection {
    file: Option<PdfFile>,
    source: Option<SelectionSource>,
}

impl FileSelection {
    pub fn select(&mut self, file: PdfFile, source: SelectionSource) {
        info!(file = %file.name, bytes = file.bytes.len(), ?source, "PDF selected");
        self.file = Some(file);
        self.source = Some(source);
    }

    pub fn clear(&mut self) {
        self.file = None;
        self.source = None;
    }

    pub fn file(&self) -> Option<&PdfFile> {
        self.file.as_ref()
    }

    pub fn source(&self) -> Option<SelectionSource> {
        self.source
    }
}

/// Turns a pasted or dropped string into a path.
///
/// Terminals deliver drops as quoted paths, backslash-escaped paths or
/// `file://` URIs.
pub fn normalize_dropped_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(trimmed);

    let path = if unquoted.starts_with("file://") {
        reqwest::Url::parse(unquoted).ok()?.to_file_path().ok()?
    } else {
        PathBuf::from(unquoted.replace("\\ ", " "))
    };

    if path.as_os_str().is_empty() || unquoted.contains('\n') {
        None
    } else {
        Some(path)
    }
}

/// A validated ingestion request. Building one performs no I/O.
#[derive(Debug, Clone)]
pub enum IngestRequest {
    Text(Document),
    Pdf(PdfFile),
}

impl IngestRequest {
    /// Checks the preconditions for `mode`.
    pub fn prepare(
        mode: InputMode,
        file: Option<&PdfFile>,
        pasted_text: &str,
    ) -> Result<Self, WorkflowError> {
        match mode {
            InputMode::Text => {
                if pasted_text.trim().is_empty() {
                    return Err(WorkflowError::EmptyInput);
                }
                Ok(IngestRequest::Text(Document::new(pasted_text)))
            }
            InputMode::Pdf => file
                .cloned()
                .map(IngestRequest::Pdf)
                .ok_or(WorkflowError::NoFileSelected),
        }
    }

    /// Resolves to document text, uploading the PDF if there is one.
    pub async fn into_document(self, backend: &dyn Backend) -> Result<Document, WorkflowError> {
        match self {
            IngestRequest::Text(document) => Ok(document),
            IngestRequest::Pdf(file) => extract_pdf(backend, &file).await,
        }
    }
}

/// One upload to the extraction endpoint.
#[derive(Debug, Clone)]
pub struct ExtractJob {
    file: PdfFile,
}

impl ExtractJob {
    pub fn new(file: PdfFile) -> Self {
        Self { file }
    }

    pub async fn run(self, backend: &dyn Backend) -> Result<Document, WorkflowError> {
        extract_pdf(backend, &self.file).await
    }
}

async fn extract_pdf(backend: &dyn Backend, file: &PdfFile) -> Result<Document, WorkflowError> {
    let response = backend.extract_pdf(file).await.map_err(|e| {
        warn!(file = %file.name, error = %e, "PDF upload failed");
        WorkflowError::transport(Operation::Extract, e)
    })?;

    match response.text {
        Some(text) if !text.trim().is_empty() && !text.starts_with(WARNING_MARKER) => {
            info!(file = %file.name, chars = text.chars().count(), "PDF text extracted");
            Ok(Document::new(text))
        }
        other => {
            let err = WorkflowError::extraction_failed(other.as_deref());
            warn!(file = %file.name, error = %err, "backend could not extract PDF");
            Err(err)
        }
    }
}

/// Validates the input for `mode` and resolves it to document text.
pub async fn extract_text(
    backend: &dyn Backend,
    mode: InputMode,
    file: Option<&PdfFile>,
    pasted_text: &str,
) -> Result<Document, WorkflowError> {
    IngestRequest::prepare(mode, file, pasted_text)?
        .into_document(backend)
        .await
}
