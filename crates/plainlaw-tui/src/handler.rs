use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use plainlaw_core::{InputMode, SelectionSource};
use crate::app::{App, EditMode, FocusPane};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Paste(text) => handle_paste(app, &text).await,
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    app.poll_tasks().await;
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return Ok(());
            }
            KeyCode::Char('s') => {
                app.submit();
                return Ok(());
            }
            _ => {}
        }
    }

    match app.edit_mode {
        EditMode::Normal => handle_normal_mode(app, key),
        EditMode::Editing => handle_editing_mode(app, key).await,
    }

    Ok(())
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('1') => app.set_mode(InputMode::Text),
        KeyCode::Char('2') => app.set_mode(InputMode::Pdf),
        KeyCode::Char('m') => app.toggle_mode(),
        KeyCode::Char('s') => app.submit(),
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.prev(),
        KeyCode::Char('i') | KeyCode::Enter => {
            if matches!(app.focus, FocusPane::Input | FocusPane::Chat) {
                app.edit_mode = EditMode::Editing;
            }
        }
        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Level => app.pick_level(1),
            FocusPane::Output => app.scroll_output_down(),
            FocusPane::Chat => app.scroll_chat_down(),
            FocusPane::Input => {}
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Level => app.pick_level(-1),
            FocusPane::Output => app.scroll_output_up(),
            FocusPane::Chat => app.scroll_chat_up(),
            FocusPane::Input => {}
        },
        _ => {}
    }
}

async fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.edit_mode = EditMode::Normal;
        return;
    }

    match (app.focus, app.workflow.mode()) {
        (FocusPane::Chat, _) => {
            if key.code == KeyCode::Enter {
                app.send_question();
            } else {
                edit_field(&mut app.chat_input, &mut app.chat_cursor, key);
            }
        }
        (FocusPane::Input, InputMode::Text) => {
            let text = app.workflow.pasted_text_mut();
            if key.code == KeyCode::Enter {
                insert_str(text, &mut app.text_cursor, "\n");
            } else {
                edit_field(text, &mut app.text_cursor, key);
            }
        }
        (FocusPane::Input, InputMode::Pdf) => {
            if key.code == KeyCode::Enter {
                let raw = app.path_input.clone();
                app.select_path(&raw, SelectionSource::Browse).await;
                app.edit_mode = EditMode::Normal;
            } else {
                edit_field(&mut app.path_input, &mut app.path_cursor, key);
            }
        }
        _ => app.edit_mode = EditMode::Normal,
    }
}

async fn handle_paste(app: &mut App, text: &str) {
    if app.workflow.mode() == InputMode::Pdf && app.focus != FocusPane::Chat {
        app.select_path(text, SelectionSource::Drop).await;
        return;
    }

    match app.focus {
        FocusPane::Chat => {
            let line = text.replace(['\r', '\n'], " ");
            insert_str(&mut app.chat_input, &mut app.chat_cursor, &line);
        }
        _ => {
            let text = text.replace("\r\n", "\n");
            insert_str(app.workflow.pasted_text_mut(), &mut app.text_cursor, &text);
        }
    }
}

/// Single-line editing shared by every text field.
fn edit_field(buf: &mut String, cursor: &mut usize, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(buf, *cursor);
                buf.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if *cursor < buf.chars().count() {
                let byte_pos = char_to_byte_index(buf, *cursor);
                buf.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            *cursor = (*cursor + 1).min(buf.chars().count());
        }
        KeyCode::Home => {
            *cursor = 0;
        }
        KeyCode::End => {
            *cursor = buf.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(buf, *cursor);
            buf.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => {}
    }
}

fn insert_str(buf: &mut String, cursor: &mut usize, text: &str) {
    let byte_pos = char_to_byte_index(buf, *cursor);
    buf.insert_str(byte_pos, text);
    *cursor += text.chars().count();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use plainlaw_core::testing::ScriptedBackend;
    use plainlaw_core::{OutputSurface, Role, Workflow};

    fn app_with(backend: Arc<ScriptedBackend>) -> App {
        App::new(Workflow::default(), backend, "http://127.0.0.1:8000".to_string())
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> AppEvent {
        AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c))).await.unwrap();
        }
    }

    async fn settle(app: &mut App) {
        while app.has_pending_tasks() {
            tokio::task::yield_now().await;
            app.poll_tasks().await;
        }
    }

    #[test]
    fn test_char_to_byte_index() {
        assert_eq!(char_to_byte_index("cláusula", 3), 4);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[tokio::test]
    async fn test_mode_keys_switch_visible_surface() {
        let mut app = app_with(Arc::new(ScriptedBackend::new()));
        assert_eq!(app.workflow.mode(), InputMode::Text);

        handle_event(&mut app, key(KeyCode::Char('2'))).await.unwrap();
        assert_eq!(app.workflow.mode(), InputMode::Pdf);

        handle_event(&mut app, key(KeyCode::Char('m'))).await.unwrap();
        assert_eq!(app.workflow.mode(), InputMode::Text);
    }

    #[tokio::test]
    async fn test_empty_submit_warns_without_request() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut app = app_with(backend.clone());

        handle_event(&mut app, ctrl('s')).await.unwrap();

        assert_eq!(backend.request_count(), 0);
        assert!(!app.has_pending_tasks());
        assert_eq!(
            app.workflow.output(),
            &OutputSurface::Warning("⚠️ Please paste some legal text.".to_string())
        );
    }

    #[tokio::test]
    async fn test_typed_text_is_simplified_in_background() {
        let backend = Arc::new(ScriptedBackend::new().with_summary(Some("<p>Pay on time.</p>")));
        let mut app = app_with(backend.clone());

        handle_event(&mut app, key(KeyCode::Char('i'))).await.unwrap();
        type_text(&mut app, "Rent is due.").await;
        handle_event(&mut app, key(KeyCode::Esc)).await.unwrap();
        handle_event(&mut app, key(KeyCode::Char('s'))).await.unwrap();

        assert!(!app.controls().submit_enabled);
        assert_eq!(app.workflow.output(), &OutputSurface::Processing);

        settle(&mut app).await;

        assert!(app.controls().submit_enabled);
        assert_eq!(backend.simplify_requests()[0].text, "Rent is due.");
        assert_eq!(app.workflow.output().plain_text(), "Pay on time.");
    }

    #[tokio::test]
    async fn test_send_while_answer_pending_is_inert() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .with_summary(Some("Plain text."))
                .with_answer(Some("It means X.")),
        );
        let mut app = app_with(backend.clone());
        app.workflow.pasted_text_mut().push_str("Legalese.");
        app.submit();
        settle(&mut app).await;

        app.focus = FocusPane::Chat;
        app.edit_mode = EditMode::Editing;
        type_text(&mut app, "What does this mean?").await;
        app.send_question();
        assert!(app.controls().chat_pending);

        app.chat_input = "Another?".to_string();
        app.send_question();
        assert_eq!(app.chat_input, "Another?");
        assert_eq!(app.workflow.transcript().len(), 1);

        settle(&mut app).await;
        let turns = app.workflow.transcript().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role, Role::Ai);
        assert_eq!(turns[1].content, "It means X.");
        assert_eq!(backend.chat_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_question_before_summary_shows_warning_turn() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut app = app_with(backend.clone());

        app.focus = FocusPane::Chat;
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();
        type_text(&mut app, "Can I sublet?").await;
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();

        let turns = app.workflow.transcript().turns();
        assert_eq!(turns.len(), 1);
        assert!(turns[0].warning);
        assert!(app.chat_input.is_empty());
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_pdf_is_selected_and_uploaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("My Lease.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let backend = Arc::new(
            ScriptedBackend::new()
                .with_extracted_text(Some("The Lessee shall pay."))
                .with_summary(Some("You pay.")),
        );
        let mut app = app_with(backend.clone());
        handle_event(&mut app, key(KeyCode::Char('2'))).await.unwrap();

        let dropped = format!("'{}'", path.display());
        handle_event(&mut app, AppEvent::Paste(dropped)).await.unwrap();
        assert_eq!(
            app.workflow.selected_file().map(|f| f.name.as_str()),
            Some("My Lease.pdf")
        );

        handle_event(&mut app, ctrl('s')).await.unwrap();
        settle(&mut app).await;

        assert_eq!(backend.uploads(), vec!["My Lease.pdf".to_string()]);
        assert_eq!(app.workflow.output().plain_text(), "You pay.");
    }

    #[tokio::test]
    async fn test_browsed_non_pdf_is_rejected() {
        let mut app = app_with(Arc::new(ScriptedBackend::new()));
        handle_event(&mut app, key(KeyCode::Char('2'))).await.unwrap();
        handle_event(&mut app, key(KeyCode::Char('i'))).await.unwrap();
        type_text(&mut app, "/tmp/notes.txt").await;
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();

        assert!(app.workflow.selected_file().is_none());
        assert!(app.workflow.file_warning().is_some_and(|w| w.starts_with("⚠️ ")));
        assert_eq!(app.workflow.output(), &OutputSurface::default());
        assert_eq!(app.edit_mode, EditMode::Normal);
    }

    #[tokio::test]
    async fn test_level_focus_picks_level() {
        let mut app = app_with(Arc::new(ScriptedBackend::new()));
        handle_event(&mut app, key(KeyCode::Tab)).await.unwrap();
        assert_eq!(app.focus, FocusPane::Level);

        handle_event(&mut app, key(KeyCode::Char('j'))).await.unwrap();
        assert_eq!(app.workflow.level().as_str(), "Standard View");

        handle_event(&mut app, key(KeyCode::Char('k'))).await.unwrap();
        handle_event(&mut app, key(KeyCode::Char('k'))).await.unwrap();
        assert_eq!(app.workflow.level().as_str(), "Quick Summary (ELI5)");
    }

    #[tokio::test]
    async fn test_editing_keys_do_not_quit() {
        let mut app = app_with(Arc::new(ScriptedBackend::new()));
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();
        type_text(&mut app, "quit").await;
        assert!(!app.should_quit);
        assert_eq!(app.workflow.pasted_text(), "quit");

        handle_event(&mut app, key(KeyCode::Esc)).await.unwrap();
        handle_event(&mut app, key(KeyCode::Char('q'))).await.unwrap();
        assert!(app.should_quit);
    }
}
