use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use tracing::debug;

use crate::error::Operation;
use crate::ingest::PdfFile;
use crate::state::Turn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimplifyRequest {
    pub text: String,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub summary: String,
    pub history: Vec<Turn>,
    pub question: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExtractResponse {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimplifyResponse {
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub answer: Option<String>,
}

/// The remote service that extracts, simplifies and answers.
///
/// Every call is a single attempt. Errors mean the transport failed: the
/// request could not be sent, the status was not 2xx, or the body was not
/// the expected JSON.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn extract_pdf(&self, file: &PdfFile) -> Result<ExtractResponse>;

    async fn simplify(&self, request: &SimplifyRequest) -> Result<SimplifyResponse>;

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, operation: Operation) -> String {
        format!("{}{}", self.base_url, operation.endpoint())
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        operation: Operation,
    ) -> Result<T> {
        if !response.status().is_success() {
            return Err(anyhow!(
                "{} failed with status: {}",
                operation.endpoint(),
                response.status()
            ));
        }

        response
            .json()
            .await
            .map_err(|e| anyhow!("{} returned an unreadable body: {}", operation.endpoint(), e))
    }
}

#[async_trait]
impl Backend for BackendClient {
    async fn extract_pdf(&self, file: &PdfFile) -> Result<ExtractResponse> {
        let url = self.url(Operation::Extract);
        debug!(%url, file = %file.name, bytes = file.bytes.len(), "uploading PDF");

        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str("application/pdf")?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await?;

        Self::read_json(response, Operation::Extract).await
    }

    async fn simplify(&self, request: &SimplifyRequest) -> Result<SimplifyResponse> {
        let url = self.url(Operation::Simplify);
        debug!(%url, chars = request.text.chars().count(), level = %request.level, "requesting simplification");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await?;

        Self::read_json(response, Operation::Simplify).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = self.url(Operation::Chat);
        debug!(%url, history = request.history.len(), "asking chatbot");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await?;

        Self::read_json(response, Operation::Chat).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkflowError;
    use crate::ingest::{Document, ExtractJob};
    use crate::mode::SimplicityLevel;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers a single connection with `response` and returns the base URL.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_chat_request_wire_shape() {
        let request = ChatRequest {
            summary: "Plain text.".to_string(),
            history: vec![Turn::user("What does this mean?")],
            question: "What does this mean?".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "summary": "Plain text.",
                "history": [{"role": "user", "content": "What does this mean?"}],
                "question": "What does this mean?"
            })
        );
    }

    #[test]
    fn test_missing_fields_decode_as_none() {
        let simplify: SimplifyResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(simplify.summary, None);
        let chat: ChatResponse = serde_json::from_str(r#"{"answer": null}"#).unwrap();
        assert_eq!(chat.answer, None);
        let extract: ExtractResponse = serde_json::from_str(r#"{"text": "Lease"}"#).unwrap();
        assert_eq!(extract.text.as_deref(), Some("Lease"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BackendClient::new("http://127.0.0.1:8000/");
        assert_eq!(client.url(Operation::Simplify), "http://127.0.0.1:8000/simplify");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_an_error() {
        // Port 9 (discard) on localhost is expected to refuse connections
        let client = BackendClient::new("http://127.0.0.1:9");
        let request = SimplifyRequest {
            text: "Lease".to_string(),
            level: "Standard View".to_string(),
        };
        assert!(client.simplify(&request).await.is_err());
    }

    #[tokio::test]
    async fn test_server_error_status_is_transport_failure() {
        let url = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let client = BackendClient::new(&url);

        let err = crate::simplify::simplify(
            &client,
            Document::new("The Lessee shall pay."),
            SimplicityLevel::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, WorkflowError::Transport { operation: Operation::Simplify, .. }));
        assert!(err
            .warning_line()
            .starts_with("⚠️ API Error: /simplify failed with status: 500"));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_transport_failure() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 8\r\nConnection: close\r\n\r\nnot json",
        )
        .await;
        let client = BackendClient::new(&url);

        let err = crate::simplify::simplify(
            &client,
            Document::new("The Lessee shall pay."),
            SimplicityLevel::default(),
        )
        .await
        .unwrap_err();

        assert!(err
            .warning_line()
            .starts_with("⚠️ API Error: /simplify returned an unreadable body"));
    }

    #[tokio::test]
    async fn test_extract_not_found_is_extraction_transport_failure() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let client = BackendClient::new(&url);

        let err = ExtractJob::new(PdfFile::new("lease.pdf", b"%PDF-1.7".to_vec()))
            .run(&client)
            .await
            .unwrap_err();

        assert!(err
            .warning_line()
            .starts_with("⚠️ PDF extraction error: /extract_pdf failed with status: 404"));
    }
}
