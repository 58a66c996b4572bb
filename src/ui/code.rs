// Line-numbered rendering of generated source files

use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

/// Width of the gutter needed for `line_count` lines.
pub fn gutter_width(line_count: usize) -> usize {
    line_count.max(1).to_string().len()
}

/// Render `content` starting at line `offset` (0-based), at most `height` lines.
pub fn numbered_lines(content: &str, offset: usize, height: usize) -> Vec<Line<'static>> {
    let total = content.lines().count();
    let width = gutter_width(total);

    content
        .lines()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(index, text)| {
            Line::from(vec![
                Span::styled(
                    format!("{:>width$} │ ", index + 1),
                    Style::default().fg(Color::DarkGray),
                ),
                // Tabs render with inconsistent widths across terminals
                Span::raw(text.replace('\t', "    ")),
            ])
        })
        .collect()
}
