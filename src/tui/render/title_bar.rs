use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::parse::words::word_form;
use crate::tui::app::App;

/// Render the title bar (top two rows: file info + separator).
pub fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let name = app
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("untitled");

    let mut spans = vec![
        Span::styled(
            "[~] weft ",
            Style::default().fg(app.theme.highlight).bg(bg),
        ),
        Span::styled(
            name.to_string(),
            Style::default().fg(app.theme.text_bright).bg(bg),
        ),
        Span::styled(
            format!(
                "  uses {} {}",
                app.program.task_count,
                word_form(&app.program.task_count.to_string(), "tasks")
            ),
            Style::default().fg(app.theme.text).bg(bg),
        ),
    ];
    if !app.program.params.is_empty() {
        spans.push(Span::styled(
            format!("  ({} params)", app.program.params.len()),
            Style::default().fg(app.theme.dim).bg(bg),
        ));
    }
    if app.dirty {
        spans.push(Span::styled(
            "  *modified",
            Style::default().fg(app.theme.unknown).bg(bg),
        ));
    }
    if !app.parse_issues.is_empty() {
        spans.push(Span::styled(
            format!("  {} issue(s)", app.parse_issues.len()),
            Style::default().fg(app.theme.error).bg(bg),
        ));
    }

    let separator = "\u{2500}".repeat(area.width as usize);
    let lines = vec![
        Line::from(spans),
        Line::from(Span::styled(
            separator,
            Style::default().fg(app.theme.dim).bg(bg),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}
