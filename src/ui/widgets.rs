use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, PRESET_PROMPTS};
use crate::models::GenerationStatus;

use super::code;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const DESCRIPTION_PREVIEW_CHARS: usize = 100;

/// First `max_chars` characters of `text` on one line, with an ellipsis when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let header = Line::from(vec![
        Span::styled(
            format!(" {} ", app.title),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("· {}", app.model),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(header), area);
}

pub fn render_prompt_input(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.input.is_empty() {
        (
            "Describe your Vercel-ready app (e.g. a blog with API routes and vercel.json)...",
            Style::default().fg(Color::Gray),
        )
    } else {
        (
            app.input.as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    };

    let border_color = if app.is_thinking() {
        Color::DarkGray
    } else {
        Color::Cyan
    };

    let input = Paragraph::new(text)
        .style(style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" App Requirements ")
                .border_style(Style::default().fg(border_color)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(input, area);
}

pub fn render_status_line(frame: &mut Frame, app: &App, area: Rect) {
    let line = match app.status {
        GenerationStatus::Idle => Line::from(Span::styled(
            " Ready. Press Enter to generate.",
            Style::default().fg(Color::DarkGray),
        )),
        GenerationStatus::Thinking => Line::from(vec![
            Span::styled(
                format!(" {} ", SPINNER[app.spinner_frame % SPINNER.len()]),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                app.loading_caption(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            ),
        ]),
        GenerationStatus::Success => {
            let mut spans = vec![Span::styled(
                " ✓ ",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )];
            if let Some(generated) = &app.generated_app {
                spans.push(Span::styled(
                    generated.name.clone(),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ));
                if !generated.description.trim().is_empty() {
                    spans.push(Span::styled(
                        format!(" · {}", preview(&generated.description, DESCRIPTION_PREVIEW_CHARS)),
                        Style::default().fg(Color::Gray),
                    ));
                }
                spans.push(Span::raw(format!(
                    " · {} files",
                    generated.files.len()
                )));
            }
            if let Some(at) = app.generated_at {
                spans.push(Span::styled(
                    format!(" · {}", at.format("%H:%M:%S")),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            if let Some(notice) = &app.notice {
                spans.push(Span::styled(
                    format!("  {notice}"),
                    Style::default().fg(Color::Cyan),
                ));
            }
            Line::from(spans)
        }
        GenerationStatus::Error => {
            let hint = if app.error_retryable {
                "  Ctrl+R: retry"
            } else {
                "  Refine the prompt and press Enter"
            };
            Line::from(vec![
                Span::styled(
                    format!(" ✗ {}", app.error.as_deref().unwrap_or("Generation failed.")),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::styled(hint, Style::default().fg(Color::DarkGray)),
            ])
        }
    };

    frame.render_widget(Paragraph::new(line), area);
}

pub fn render_placeholder(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match app.status {
        GenerationStatus::Thinking => vec![Line::from(Span::styled(
            "Generating your project. This can take a few minutes.",
            Style::default().fg(Color::DarkGray),
        ))],
        GenerationStatus::Error => vec![Line::from(Span::styled(
            "No project generated.",
            Style::default().fg(Color::DarkGray),
        ))],
        _ => {
            let mut lines = vec![
                Line::from(Span::styled(
                    "Welcome to AppForge",
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "Describe an app and get a deployment-ready project",
                    Style::default().fg(Color::Cyan),
                )),
                Line::from(""),
            ];
            for (index, (label, _)) in PRESET_PROMPTS.iter().enumerate() {
                lines.push(Line::from(Span::styled(
                    format!("F{}: {label}", index + 1),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            lines
        }
    };

    let placeholder = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));

    frame.render_widget(placeholder, area);
}

pub fn render_file_list(frame: &mut Frame, app: &App, area: Rect) {
    let Some(generated) = &app.generated_app else {
        return;
    };

    let items: Vec<ListItem> = generated
        .files
        .iter()
        .map(|file| ListItem::new(file.path.clone()))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Files ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(app.active_file_index));
    frame.render_stateful_widget(list, area, &mut state);
}

pub fn render_code_viewer(frame: &mut Frame, app: &App, area: Rect) {
    let Some(file) = app.active_file() else {
        return;
    };

    let mut title = vec![
        Span::styled(
            format!(" {} ", file.path),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("[{}] ", file.language),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if app.is_copied() {
        title.push(Span::styled(
            "Copied! ",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
    }

    let height = area.height.saturating_sub(2) as usize;
    let lines = code::numbered_lines(&file.content, app.code_scroll, height);

    let viewer = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Line::from(title))
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(viewer, area);
}

pub fn render_bottom_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.exit_pending {
        (
            "Press Ctrl+C again to exit, Esc to cancel",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else if app.status == GenerationStatus::Success {
        (
            "Tab: Next file | Ctrl+Y: Copy | Ctrl+S: Download | Ctrl+H: Help | Ctrl+C: Quit",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        (
            "Enter: Generate | Ctrl+R: Retry | Ctrl+H: Help | Ctrl+C: Quit",
            Style::default().fg(Color::DarkGray),
        )
    };

    let bar = Paragraph::new(text).alignment(Alignment::Center).style(style);

    frame.render_widget(bar, area);
}

pub fn render_help_window(frame: &mut Frame, area: Rect) {
    let section = Style::default().add_modifier(Modifier::BOLD);
    let help_text = vec![
        Line::from(Span::styled(
            "AppForge - Keyboard Shortcuts",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Prompt:", section)),
        Line::from("  Enter         - Generate project"),
        Line::from("  Ctrl+R        - Retry last prompt"),
        Line::from("  Ctrl+L        - Clear prompt"),
        Line::from("  F1 / F2       - Load example prompt"),
        Line::from(""),
        Line::from(Span::styled("Project:", section)),
        Line::from("  Tab/Shift+Tab - Next/previous file"),
        Line::from("  Up/Down       - Scroll code"),
        Line::from("  PgUp/PgDn     - Scroll code by page"),
        Line::from("  Ctrl+Y        - Copy file"),
        Line::from("  Ctrl+S        - Download bundle"),
        Line::from(""),
        Line::from(Span::styled("General:", section)),
        Line::from("  Ctrl+H        - Show/hide this help"),
        Line::from("  Ctrl+C        - Quit (press twice)"),
        Line::from("  Ctrl+Q        - Quit immediately"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Ctrl+H or Esc to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    let popup_width = 50;
    let popup_height = 23;
    let x = (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: popup_width.min(area.width),
        height: popup_height.min(area.height),
    };

    frame.render_widget(Clear, popup_area);
    frame.render_widget(help_paragraph, popup_area);
}
