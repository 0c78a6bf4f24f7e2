use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use plainlaw_core::mode::LEVEL_OPTIONS;
use plainlaw_core::{InputMode, InputSurface, OutputSurface, Role};
use crate::app::{App, EditMode, FocusPane};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn border_color(focused: bool) -> Color {
    if focused { Color::Cyan } else { Color::DarkGray }
}

fn ellipsis(app: &App) -> String {
    ".".repeat((app.animation_frame as usize) + 1)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let [left_area, right_area] = Layout::horizontal([
        Constraint::Percentage(45),
        Constraint::Percentage(55),
    ])
    .areas(body_area);

    let [tabs_area, input_area, level_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(LEVEL_OPTIONS.len() as u16 + 2),
    ])
    .areas(left_area);

    let [output_area, chat_area, ask_area] = Layout::vertical([
        Constraint::Percentage(50),
        Constraint::Min(3),
        Constraint::Length(3),
    ])
    .areas(right_area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    render_header(app, frame, header_area);
    render_mode_tabs(app, frame, tabs_area);
    match app.workflow.selector().visible_surface() {
        InputSurface::TextArea => render_text_area(app, frame, input_area),
        InputSurface::FilePicker => render_file_picker(app, frame, input_area),
    }
    render_levels(app, frame, level_area);
    render_output(app, frame, output_area);
    render_chat(app, frame, chat_area);
    render_ask(app, frame, ask_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" PlainLaw ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  "),
        Span::styled(app.backend_url.clone(), Style::default().fg(Color::Gray)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_mode_tabs(app: &App, frame: &mut Frame, area: Rect) {
    let active = app.workflow.mode();
    let mut spans = Vec::new();
    for (i, mode) in InputMode::all().into_iter().enumerate() {
        let style = if mode == active {
            Style::default().bg(Color::Cyan).fg(Color::Black).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {} {} ", i + 1, mode.label()), style));
        spans.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_text_area(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Input;
    let editing = focused && app.edit_mode == EditMode::Editing;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { border_color(focused) }))
        .title(" Legal text ");

    let text = app.workflow.pasted_text();
    let paragraph = if text.is_empty() && !editing {
        Paragraph::new(Span::styled(
            "Paste or type the legal text to simplify...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Paragraph::new(text.to_string())
    };

    // Keep the cursor row in view
    let before_cursor: String = text.chars().take(app.text_cursor).collect();
    let cursor_row = before_cursor.matches('\n').count() as u16;
    let cursor_col = before_cursor
        .rsplit('\n')
        .next()
        .map(|l| l.chars().count())
        .unwrap_or(0) as u16;
    let inner_height = area.height.saturating_sub(2);
    let scroll = cursor_row.saturating_sub(inner_height.saturating_sub(1));

    frame.render_widget(paragraph.block(block).scroll((scroll, 0)), area);

    if editing {
        let max_x = area.width.saturating_sub(2);
        frame.set_cursor_position((
            area.x + 1 + cursor_col.min(max_x),
            area.y + 1 + cursor_row - scroll,
        ));
    }
}

fn render_file_picker(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Input;
    let editing = focused && app.edit_mode == EditMode::Editing;

    let [path_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { border_color(focused) }))
        .title(" PDF path (Enter to load, or drop a file) ");

    let inner_width = path_area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width > 0 && app.path_cursor >= inner_width {
        app.path_cursor - inner_width + 1
    } else {
        0
    };
    let visible: String = app.path_input.chars().skip(scroll_offset).take(inner_width).collect();
    frame.render_widget(
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan)).block(block),
        path_area,
    );

    let mut status = vec![match app.workflow.selected_file() {
        Some(file) => Line::from(vec![
            Span::styled(" Selected: ", Style::default().fg(Color::DarkGray)),
            Span::styled(file.name.clone(), Style::default().fg(Color::Green).bold()),
            Span::styled(format!(" ({} bytes)", file.bytes.len()), Style::default().fg(Color::DarkGray)),
        ]),
        None => Line::from(Span::styled(" No file selected", Style::default().fg(Color::DarkGray))),
    }];
    if let Some(warning) = app.workflow.file_warning() {
        status.push(Line::from(Span::styled(
            format!(" {}", warning),
            Style::default().fg(Color::Yellow),
        )));
    }
    frame.render_widget(Paragraph::new(status), status_area);

    if editing {
        let cursor_x = (app.path_cursor - scroll_offset) as u16;
        frame.set_cursor_position((path_area.x + cursor_x + 1, path_area.y + 1));
    }
}

fn render_levels(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Level;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(focused)))
        .title(" Simplicity level ");

    let items: Vec<ListItem> = LEVEL_OPTIONS
        .iter()
        .map(|level| ListItem::new(format!(" {} ", level)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(list, area, &mut app.level_state);
}

fn render_output(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Output;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(focused)))
        .title(" Simplified ");

    let text = match app.workflow.output() {
        OutputSurface::Placeholder => Text::from(Span::styled(
            OutputSurface::Placeholder.plain_text(),
            Style::default().fg(Color::DarkGray),
        )),
        OutputSurface::Processing => Text::from(Span::styled(
            format!("Processing{}", ellipsis(app)),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
        OutputSurface::Rendered(html) => Text::from(
            html.display_text()
                .lines()
                .map(parse_markdown_line)
                .collect::<Vec<_>>(),
        ),
        OutputSurface::Notice(message) => Text::from(message.clone()),
        OutputSurface::Warning(message) => Text::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        )),
    };

    let output = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.output_scroll, 0));
    frame.render_widget(output, area);
}

/// Transcript lines plus the pending "Thinking..." indicator.
fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for turn in app.workflow.transcript().turns() {
        match turn.role {
            Role::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(turn.content.clone()));
            }
            Role::Ai => {
                lines.push(Line::from(Span::styled(
                    "AI:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                if turn.warning {
                    lines.push(Line::from(Span::styled(
                        turn.content.clone(),
                        Style::default().fg(Color::Yellow),
                    )));
                } else {
                    lines.extend(turn.content.lines().map(parse_markdown_line));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.controls().chat_pending {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", ellipsis(app)),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_chat(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Chat;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(focused)))
        .title(" Ask about this document ");

    let transcript = app.workflow.transcript();
    let pending = app.controls().chat_pending;

    let chat_text = if transcript.is_empty() && !pending {
        Text::from(Span::styled(
            "Simplify a document, then ask questions about it...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(chat_lines(app))
    };

    let chat = Paragraph::new(chat_text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);
}

fn render_ask(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.focus == FocusPane::Chat && app.edit_mode == EditMode::Editing;
    let controls = app.controls();

    let border = if !controls.chat_input_enabled {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        border_color(app.focus == FocusPane::Chat)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(" Question ");

    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.chat_cursor;
    let scroll_offset = if inner_width > 0 && cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.chat_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let style = if controls.chat_input_enabled {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    frame.render_widget(Paragraph::new(visible_text).style(style).block(block), area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.edit_mode {
        EditMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        EditMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.edit_mode {
        EditMode::Normal => " NORMAL ",
        EditMode::Editing => " EDIT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let disabled_style = Style::default().bg(Color::Black).fg(Color::DarkGray);

    let controls = app.controls();
    let submit_hint = if controls.submit_enabled {
        Span::styled(" simplify ", label_style)
    } else {
        Span::styled(" working ", disabled_style)
    };

    let mut hints = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];

    match (app.edit_mode, app.focus) {
        (EditMode::Editing, FocusPane::Chat) => {
            hints.extend([
                Span::styled(" Enter ", key_style),
                if controls.send_enabled {
                    Span::styled(" send ", label_style)
                } else {
                    Span::styled(" waiting ", disabled_style)
                },
            ]);
        }
        (EditMode::Editing, _) if app.workflow.mode() == InputMode::Pdf => {
            hints.extend([
                Span::styled(" Enter ", key_style),
                Span::styled(" load file ", label_style),
            ]);
        }
        (EditMode::Editing, _) => {}
        (EditMode::Normal, focus) => {
            hints.extend([
                Span::styled(" 1/2 ", key_style),
                Span::styled(" mode ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" focus ", label_style),
            ]);
            if matches!(focus, FocusPane::Input | FocusPane::Chat) {
                hints.extend([
                    Span::styled(" i ", key_style),
                    Span::styled(" edit ", label_style),
                ]);
            }
            if matches!(focus, FocusPane::Level | FocusPane::Output | FocusPane::Chat) {
                hints.extend([
                    Span::styled(" j/k ", key_style),
                    Span::styled(
                        if focus == FocusPane::Level { " level " } else { " scroll " },
                        label_style,
                    ),
                ]);
            }
            hints.extend([
                Span::styled(" s ", key_style),
                submit_hint.clone(),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
        }
    }

    if app.edit_mode == EditMode::Editing {
        hints.extend([
            Span::styled(" Ctrl+S ", key_style),
            submit_hint,
            Span::styled(" Esc ", key_style),
            Span::styled(" done ", label_style),
        ]);
    }

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}
