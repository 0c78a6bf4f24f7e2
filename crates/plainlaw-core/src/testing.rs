//! In-memory [`Backend`] for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::client::{
    Backend, ChatRequest, ChatResponse, ExtractResponse, SimplifyRequest, SimplifyResponse,
};
use crate::ingest::PdfFile;

#[derive(Default)]
struct Script {
    extract: VecDeque<Result<ExtractResponse, String>>,
    simplify: VecDeque<Result<SimplifyResponse, String>>,
    chat: VecDeque<Result<ChatResponse, String>>,
    uploads: Vec<String>,
    simplify_requests: Vec<SimplifyRequest>,
    chat_requests: Vec<ChatRequest>,
}

/// Replays queued responses per endpoint and records every request.
///
/// An endpoint with nothing queued fails like an unreachable server.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<Script>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(self, f: impl FnOnce(&mut Script)) -> Self {
        f(&mut *self.script.lock().unwrap());
        self
    }

    pub fn with_extracted_text(self, text: Option<&str>) -> Self {
        let response = ExtractResponse { text: text.map(str::to_string) };
        self.with(|s| s.extract.push_back(Ok(response)))
    }

    pub fn with_extract_error(self, message: &str) -> Self {
        self.with(|s| s.extract.push_back(Err(message.to_string())))
    }

    pub fn with_summary(self, summary: Option<&str>) -> Self {
        let response = SimplifyResponse { summary: summary.map(str::to_string) };
        self.with(|s| s.simplify.push_back(Ok(response)))
    }

    pub fn with_simplify_error(self, message: &str) -> Self {
        self.with(|s| s.simplify.push_back(Err(message.to_string())))
    }

    pub fn with_answer(self, answer: Option<&str>) -> Self {
        let response = ChatResponse { answer: answer.map(str::to_string) };
        self.with(|s| s.chat.push_back(Ok(response)))
    }

    pub fn with_chat_error(self, message: &str) -> Self {
        self.with(|s| s.chat.push_back(Err(message.to_string())))
    }

    /// Total number of requests received on any endpoint.
    pub fn request_count(&self) -> usize {
        let script = self.script.lock().unwrap();
        script.uploads.len() + script.simplify_requests.len() + script.chat_requests.len()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.script.lock().unwrap().uploads.clone()
    }

    pub fn simplify_requests(&self) -> Vec<SimplifyRequest> {
        self.script.lock().unwrap().simplify_requests.clone()
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.script.lock().unwrap().chat_requests.clone()
    }
}

fn next<T>(queue: &mut VecDeque<Result<T, String>>, endpoint: &str) -> Result<T> {
    match queue.pop_front() {
        Some(Ok(response)) => Ok(response),
        Some(Err(message)) => Err(anyhow!(message)),
        None => Err(anyhow!("no response scripted for {}", endpoint)),
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn extract_pdf(&self, file: &PdfFile) -> Result<ExtractResponse> {
        let mut script = self.script.lock().unwrap();
        script.uploads.push(file.name.clone());
        next(&mut script.extract, "/extract_pdf")
    }

    async fn simplify(&self, request: &SimplifyRequest) -> Result<SimplifyResponse> {
        let mut script = self.script.lock().unwrap();
        script.simplify_requests.push(request.clone());
        next(&mut script.simplify, "/simplify")
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let mut script = self.script.lock().unwrap();
        script.chat_requests.push(request.clone());
        next(&mut script.chat, "/chatbot")
    }
}
