pub mod client;
pub mod config;
pub mod error;
pub mod ingest;
pub mod markup;
pub mod mode;
pub mod presenter;
pub mod session;
pub mod simplify;
pub mod state;
pub mod workflow;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-export main types for convenience
pub use client::{Backend, BackendClient};
pub use config::Config;
pub use error::{Operation, WorkflowError};
pub use ingest::{Document, PdfFile, SelectionSource};
pub use markup::TrustedHtml;
pub use mode::{InputMode, InputSurface, SimplicityLevel};
pub use presenter::Controls;
pub use simplify::{OutputSurface, SimplifyOutcome, Summary};
pub use state::{RequestState, Role, Transcript, Turn};
pub use workflow::{SubmitStep, Workflow};
