use std::sync::Arc;

use plainlaw_core::error::Operation;
use plainlaw_core::ingest::{normalize_dropped_path, ExtractJob};
use plainlaw_core::mode::LEVEL_OPTIONS;
use plainlaw_core::session::{ChatJob, QuestionStart};
use plainlaw_core::simplify::SimplifyJob;
use plainlaw_core::{
    Backend, Config, Controls, Document, InputMode, PdfFile, SelectionSource, SimplicityLevel,
    SimplifyOutcome, SubmitStep, Workflow, WorkflowError,
};
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Input,
    Level,
    Output,
    Chat,
}

impl FocusPane {
    pub fn next(self) -> Self {
        match self {
            FocusPane::Input => FocusPane::Level,
            FocusPane::Level => FocusPane::Output,
            FocusPane::Output => FocusPane::Chat,
            FocusPane::Chat => FocusPane::Input,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FocusPane::Input => FocusPane::Chat,
            FocusPane::Level => FocusPane::Input,
            FocusPane::Output => FocusPane::Level,
            FocusPane::Chat => FocusPane::Output,
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub edit_mode: EditMode,
    pub focus: FocusPane,

    pub workflow: Workflow,
    pub backend: Arc<dyn Backend>,
    pub backend_url: String,
    /// Write level changes back to the config file.
    pub persist_level: bool,

    // Input fields (cursor positions are char indices)
    pub text_cursor: usize,
    pub path_input: String,
    pub path_cursor: usize,
    pub chat_input: String,
    pub chat_cursor: usize,
    pub level_state: ListState,

    // Scrolling
    pub output_scroll: u16,
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Background requests
    pub extract_task: Option<JoinHandle<Result<Document, WorkflowError>>>,
    pub simplify_task: Option<JoinHandle<Result<SimplifyOutcome, WorkflowError>>>,
    pub chat_task: Option<JoinHandle<Result<String, WorkflowError>>>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(workflow: Workflow, backend: Arc<dyn Backend>, backend_url: String) -> Self {
        let mut level_state = ListState::default();
        level_state.select(workflow.level().option_index());

        Self {
            should_quit: false,
            edit_mode: EditMode::Normal,
            focus: FocusPane::Input,
            text_cursor: workflow.pasted_text().chars().count(),
            workflow,
            backend,
            backend_url,
            persist_level: false,
            path_input: String::new(),
            path_cursor: 0,
            chat_input: String::new(),
            chat_cursor: 0,
            level_state,
            output_scroll: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            extract_task: None,
            simplify_task: None,
            chat_task: None,
            animation_frame: 0,
        }
    }

    pub fn controls(&self) -> Controls {
        self.workflow.controls()
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        if self.workflow.set_mode(mode) {
            self.edit_mode = EditMode::Normal;
        }
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.workflow.mode().toggled());
    }

    /// Moves the level selection by `delta` and remembers the choice.
    pub fn pick_level(&mut self, delta: isize) {
        let current = self.level_state.selected().unwrap_or(0) as isize;
        let last = LEVEL_OPTIONS.len() as isize - 1;
        let idx = (current + delta).clamp(0, last) as usize;
        if Some(idx) == self.level_state.selected() {
            return;
        }

        self.level_state.select(Some(idx));
        let level = SimplicityLevel::new(LEVEL_OPTIONS[idx]);
        if self.persist_level {
            if let Err(e) = Config::save_default_level(level.as_str()) {
                warn!(error = %e, "could not save default level");
            }
        }
        self.workflow.set_level(level);
    }

    /// Loads a typed or dropped path into the file slot.
    pub async fn select_path(&mut self, raw: &str, source: SelectionSource) {
        let Some(path) = normalize_dropped_path(raw) else {
            return;
        };

        match PdfFile::load(&path).await {
            Ok(file) => {
                self.path_input = path.display().to_string();
                self.path_cursor = self.path_input.chars().count();
                self.workflow.select_file(file, source);
            }
            Err(err) => self.workflow.reject_file(&err),
        }
    }

    pub fn submit(&mut self) {
        if !self.controls().submit_enabled {
            return;
        }

        self.output_scroll = 0;
        match self.workflow.begin_submit() {
            Ok(SubmitStep::Inert) | Err(_) => {}
            Ok(SubmitStep::Extract(job)) => self.spawn_extract(job),
            Ok(SubmitStep::Simplify(job)) => self.spawn_simplify(job),
        }
    }

    pub fn send_question(&mut self) {
        if !self.controls().send_enabled {
            return;
        }

        match self.workflow.begin_question(&self.chat_input) {
            QuestionStart::Busy => return,
            QuestionStart::Ignored | QuestionStart::Rejected(_) => {}
            QuestionStart::Send(job) => self.spawn_chat(job),
        }

        self.chat_input.clear();
        self.chat_cursor = 0;
        self.scroll_chat_to_bottom();
    }

    fn spawn_extract(&mut self, job: ExtractJob) {
        let backend = self.backend.clone();
        self.extract_task = Some(tokio::spawn(async move { job.run(backend.as_ref()).await }));
    }

    fn spawn_simplify(&mut self, job: SimplifyJob) {
        let backend = self.backend.clone();
        self.simplify_task = Some(tokio::spawn(async move { job.run(backend.as_ref()).await }));
    }

    fn spawn_chat(&mut self, job: ChatJob) {
        let backend = self.backend.clone();
        self.chat_task = Some(tokio::spawn(async move { job.run(backend.as_ref()).await }));
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.extract_task.is_some() || self.simplify_task.is_some() || self.chat_task.is_some()
    }

    /// Hands finished background requests back to the workflow.
    pub async fn poll_tasks(&mut self) {
        if self.extract_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.extract_task.take() {
                let result = task
                    .await
                    .unwrap_or_else(|e| Err(WorkflowError::transport(Operation::Extract, e)));
                if let Some(job) = self.workflow.finish_extract(result) {
                    self.spawn_simplify(job);
                }
            }
        }

        if self.simplify_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.simplify_task.take() {
                let result = task
                    .await
                    .unwrap_or_else(|e| Err(WorkflowError::transport(Operation::Simplify, e)));
                self.workflow.finish_simplify(result);
            }
        }

        if self.chat_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.chat_task.take() {
                let result = task
                    .await
                    .unwrap_or_else(|e| Err(WorkflowError::transport(Operation::Chat, e)));
                self.workflow.finish_question(result);
                self.scroll_chat_to_bottom();
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        let controls = self.controls();
        if controls.show_spinner || controls.chat_pending {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_output_down(&mut self) {
        self.output_scroll = self.output_scroll.saturating_add(1);
    }

    pub fn scroll_output_up(&mut self) {
        self.output_scroll = self.output_scroll.saturating_sub(1);
    }

    pub fn scroll_chat_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn scroll_chat_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    /// Scroll chat to bottom so the newest turn is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: usize = 0;

        for turn in self.workflow.transcript().turns() {
            total_lines += 1; // Role line ("You:" or "AI:")
            for line in turn.content.lines() {
                let char_count = line.chars().count();
                total_lines += char_count / wrap_width + 1;
            }
            total_lines += 1; // Blank line after turn
        }

        if self.controls().chat_pending {
            total_lines += 2; // "AI:" + "Thinking..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        let overflow = total_lines.saturating_sub(visible_height as usize);
        self.chat_scroll = u16::try_from(overflow).unwrap_or(u16::MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plainlaw_core::testing::ScriptedBackend;
    use plainlaw_core::{Summary, TrustedHtml};

    fn app_with_answer(answer: &str) -> App {
        let mut workflow = Workflow::default();
        workflow.finish_simplify(Ok(SimplifyOutcome::Summary(Summary::new(
            TrustedHtml::from_backend("<p>You pay rent monthly.</p>"),
        ))));
        let _ = workflow.begin_question("When is rent due?");
        workflow.finish_question(Ok(answer.to_string()));
        App::new(workflow, Arc::new(ScriptedBackend::new()), "http://127.0.0.1:8000".to_string())
    }

    #[test]
    fn test_scroll_chat_to_bottom_counts_wrapped_lines() {
        let mut app = app_with_answer("On the 1st.");
        app.chat_width = 50;
        app.chat_height = 3;
        app.scroll_chat_to_bottom();
        // "You:", question, blank, "AI:", answer, blank
        assert_eq!(app.chat_scroll, 3);

        app.chat_height = 40;
        app.scroll_chat_to_bottom();
        assert_eq!(app.chat_scroll, 0);
    }

    #[test]
    fn test_scroll_chat_to_bottom_clamps_huge_transcript() {
        let mut app = app_with_answer(&"x\n".repeat(70_000));
        app.chat_width = 50;
        app.chat_height = 10;
        app.scroll_chat_to_bottom();
        assert_eq!(app.chat_scroll, u16::MAX);
    }
}
