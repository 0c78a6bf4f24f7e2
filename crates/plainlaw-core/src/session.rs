//! Chat about the current summary.
//!
//! Each question moves through `Idle -> InFlight -> Succeeded | Failed`.
//! Only one question can be in flight; the finished states accept the next
//! question like `Idle` does.

use tracing::{info, warn};

use crate::client::{Backend, ChatRequest};
use crate::error::{Operation, WorkflowError};
use crate::simplify::Summary;
use crate::state::{RequestState, Transcript, Turn};

pub const NO_ANSWER_TEXT: &str = "No answer returned.";

/// Result of submitting a question.
#[derive(Debug)]
pub enum QuestionStart {
    /// Blank question; nothing recorded.
    Ignored,
    /// Another question is still in flight; nothing recorded.
    Busy,
    /// Refused before any request; a warning turn was recorded.
    Rejected(WorkflowError),
    /// The user turn was recorded; run the job and pass its result to `finish`.
    Send(ChatJob),
}

/// One request to the chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatJob {
    request: ChatRequest,
}

impl ChatJob {
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    /// Resolves to the answer text, with the fallback applied.
    pub async fn run(self, backend: &dyn Backend) -> Result<String, WorkflowError> {
        let response = backend.chat(&self.request).await.map_err(|e| {
            warn!(error = %e, "chat request failed");
            WorkflowError::transport(Operation::Chat, e)
        })?;

        Ok(response
            .answer
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| NO_ANSWER_TEXT.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct ConversationSession {
    transcript: Transcript,
    state: RequestState,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn is_sending(&self) -> bool {
        self.state.is_in_flight()
    }

    pub fn begin(&mut self, question: &str, summary: Option<&Summary>) -> QuestionStart {
        if self.is_sending() {
            return QuestionStart::Busy;
        }

        let question = question.trim();
        if question.is_empty() {
            return QuestionStart::Ignored;
        }

        let Some(summary) = summary else {
            let err = WorkflowError::NoSummaryYet;
            warn!(error = %err, "question asked before simplifying");
            self.transcript.push(Turn::ai_warning(err.warning_line()));
            return QuestionStart::Rejected(err);
        };

        self.transcript.push(Turn::user(question));
        self.state = RequestState::InFlight;

        // The question is already the last history entry; the backend also
        // expects it on its own.
        QuestionStart::Send(ChatJob {
            request: ChatRequest {
                summary: summary.plain_text(),
                history: self.transcript.history(),
                question: question.to_string(),
            },
        })
    }

    /// Records the reply (or the failure) and re-arms the session.
    pub fn finish(&mut self, result: Result<String, WorkflowError>) -> Turn {
        let turn = match result {
            Ok(answer) => {
                info!(turns = self.transcript.len() + 1, "chat answered");
                self.state = RequestState::Succeeded;
                Turn::ai(answer)
            }
            Err(err) => {
                self.state = RequestState::Failed(err.to_string());
                Turn::ai_warning(err.warning_line())
            }
        };
        self.transcript.push(turn.clone());
        turn
    }

    /// Runs a whole question: begin, request, finish.
    ///
    /// `Ok(None)` means the question was ignored or the session was busy.
    pub async fn ask(
        &mut self,
        backend: &dyn Backend,
        summary: Option<&Summary>,
        question: &str,
    ) -> Result<Option<Turn>, WorkflowError> {
        match self.begin(question, summary) {
            QuestionStart::Ignored | QuestionStart::Busy => Ok(None),
            QuestionStart::Rejected(err) => Err(err),
            QuestionStart::Send(job) => {
                let result = job.run(backend).await;
                let failure = result.as_ref().err().cloned();
                let turn = self.finish(result);
                match failure {
                    Some(err) => Err(err),
                    None => Ok(Some(turn)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::TrustedHtml;
    use crate::state::Role;
    use crate::testing::ScriptedBackend;

    fn summary(html: &str) -> Summary {
        Summary::new(TrustedHtml::from_backend(html))
    }

    #[tokio::test]
    async fn test_blank_question_is_ignored() {
        let backend = ScriptedBackend::new();
        let mut session = ConversationSession::new();
        let s = summary("<p>Plain text.</p>");

        let result = session.ask(&backend, Some(&s), "   ").await;
        assert_eq!(result, Ok(None));
        assert!(session.transcript().is_empty());
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn test_question_before_summary_appends_single_warning() {
        let backend = ScriptedBackend::new();
        let mut session = ConversationSession::new();

        let result = session.ask(&backend, None, "What does this mean?").await;
        assert_eq!(result, Err(WorkflowError::NoSummaryYet));

        let turns = session.transcript().turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::Ai);
        assert!(turns[0].warning);
        assert_eq!(
            turns[0].content,
            "⚠️ Please simplify a legal document first before asking questions."
        );
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn test_answered_question_appends_user_then_ai() {
        let backend = ScriptedBackend::new().with_answer(Some("It means X."));
        let mut session = ConversationSession::new();
        let s = summary("Plain text.");

        let turn = session
            .ask(&backend, Some(&s), "What does this mean?")
            .await
            .unwrap();
        assert_eq!(turn, Some(Turn::ai("It means X.")));
        assert_eq!(
            session.transcript().turns(),
            &[Turn::user("What does this mean?"), Turn::ai("It means X.")]
        );
        assert_eq!(session.state(), &RequestState::Succeeded);
    }

    #[tokio::test]
    async fn test_request_carries_summary_history_and_question() {
        let backend = ScriptedBackend::new()
            .with_answer(Some("Monthly."))
            .with_answer(Some("Yes."));
        let mut session = ConversationSession::new();
        let s = summary("<p>Rent is <b>monthly</b>.</p>");

        session.ask(&backend, Some(&s), " How often? ").await.unwrap();
        session.ask(&backend, Some(&s), "Is it late after the 5th?").await.unwrap();

        let requests = backend.chat_requests();
        assert_eq!(requests[0].summary, "Rent is monthly.");
        assert_eq!(requests[0].question, "How often?");
        assert_eq!(requests[0].history, vec![Turn::user("How often?")]);
        assert_eq!(
            requests[1].history,
            vec![
                Turn::user("How often?"),
                Turn::ai("Monthly."),
                Turn::user("Is it late after the 5th?"),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_answer_uses_fallback() {
        let backend = ScriptedBackend::new().with_answer(None);
        let mut session = ConversationSession::new();
        let s = summary("Plain text.");

        let turn = session.ask(&backend, Some(&s), "Why?").await.unwrap();
        assert_eq!(turn.map(|t| t.content), Some("No answer returned.".to_string()));
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_unanswered_question() {
        let backend = ScriptedBackend::new().with_chat_error("connection refused");
        let mut session = ConversationSession::new();
        let s = summary("Plain text.");

        let err = session.ask(&backend, Some(&s), "Why?").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Transport { operation: Operation::Chat, .. }));

        let turns = session.transcript().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0], Turn::user("Why?"));
        assert_eq!(turns[1].content, "⚠️ API Error: connection refused");
        assert!(turns[1].warning);
        assert!(!session.is_sending());
        // Warnings stay out of what is sent next time
        assert_eq!(session.transcript().history(), vec![Turn::user("Why?")]);
    }

    #[test]
    fn test_second_question_while_in_flight_is_busy() {
        let mut session = ConversationSession::new();
        let s = summary("Plain text.");

        let first = session.begin("First?", Some(&s));
        assert!(matches!(first, QuestionStart::Send(_)));
        assert!(session.is_sending());

        let second = session.begin("Second?", Some(&s));
        assert!(matches!(second, QuestionStart::Busy));
        assert_eq!(session.transcript().len(), 1);

        session.finish(Ok("Answer.".to_string()));
        assert!(!session.is_sending());
        assert!(matches!(session.begin("Second?", Some(&s)), QuestionStart::Send(_)));
    }
}
