pub mod code;
pub mod widgets;

use crate::app::App;
use crate::models::GenerationStatus;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

pub fn render(frame: &mut Frame, app: &App) {
    // Input grows with the prompt, up to a quarter of the screen
    let available_width = frame.area().width.saturating_sub(2).max(1) as usize;
    let input_lines = app.input.chars().count().div_ceil(available_width).max(1);
    let max_lines = (frame.area().height as usize / 4).max(1);
    #[allow(clippy::cast_possible_truncation)]
    let input_height = (input_lines.min(max_lines) + 2) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),            // Header
            Constraint::Length(input_height), // Prompt input (dynamic height)
            Constraint::Length(1),            // Status line
            Constraint::Min(0),               // Files and code viewer
            Constraint::Length(1),            // Bottom keymap bar
        ])
        .split(frame.area());

    widgets::render_header(frame, app, chunks[0]);
    widgets::render_prompt_input(frame, app, chunks[1]);
    widgets::render_status_line(frame, app, chunks[2]);

    if app.status == GenerationStatus::Success {
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(28), Constraint::Percentage(72)])
            .split(chunks[3]);
        widgets::render_file_list(frame, app, panes[0]);
        widgets::render_code_viewer(frame, app, panes[1]);
    } else {
        widgets::render_placeholder(frame, app, chunks[3]);
    }

    widgets::render_bottom_bar(frame, app, chunks[4]);

    if app.show_help {
        widgets::render_help_window(frame, frame.area());
    }
}
