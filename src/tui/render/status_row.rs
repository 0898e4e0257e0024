use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode};

/// Render the status row (bottom of screen).
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let line = match app.mode {
        Mode::Edit => {
            let mut spans = vec![
                Span::styled("> ", Style::default().fg(app.theme.highlight).bg(bg)),
                Span::styled(
                    app.edit_input.clone(),
                    Style::default().fg(app.theme.text_bright).bg(bg),
                ),
                Span::styled("\u{258C}", Style::default().fg(app.theme.highlight).bg(bg)),
            ];
            push_right_hint(&mut spans, width, "Enter apply  Esc cancel", app);
            Line::from(spans)
        }
        Mode::Navigate => {
            if let Some(status) = &app.status {
                Line::from(Span::styled(
                    status.clone(),
                    Style::default().fg(app.theme.unknown).bg(bg),
                ))
            } else {
                Line::from(Span::styled(
                    "space select  d delete  c clone  L wrap  e edit  u undo  w save  ? help",
                    Style::default().fg(app.theme.dim).bg(bg),
                ))
            }
        }
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn push_right_hint(spans: &mut Vec<Span<'_>>, width: usize, hint: &str, app: &App) {
    let content_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let hint_width = hint.chars().count();
    if content_width + hint_width < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::styled(
            " ".repeat(padding),
            Style::default().bg(app.theme.background),
        ));
        spans.push(Span::styled(
            hint.to_string(),
            Style::default().fg(app.theme.dim).bg(app.theme.background),
        ));
    }
}
