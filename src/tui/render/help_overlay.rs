use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;

const HELP: &[(&str, &str)] = &[
    ("j/k", "move cursor"),
    ("space", "select (exclusive)"),
    ("v", "select (extend same kind)"),
    ("a / Esc", "select all / clear"),
    ("drag", "marquee select"),
    ("d", "delete selection"),
    ("c", "clone selection"),
    ("L", "wrap selection in a block"),
    ("U", "unwrap block"),
    ("J/K", "move row down/up"),
    ("i", "insert statement"),
    ("e / Enter", "edit line"),
    ("+/-", "change task count"),
    ("t", "toggle task grid"),
    ("u / r", "undo / redo"),
    ("w", "save"),
    ("q", "quit"),
];

/// Render the help overlay over the whole screen.
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let width = 44.min(area.width);
    let height = (HELP.len() as u16 + 2).min(area.height);
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;
    let popup = Rect::new(x, y, width, height);

    let lines: Vec<Line> = HELP
        .iter()
        .map(|(keys, action)| {
            Line::from(vec![
                Span::styled(
                    format!(" {keys:<10}"),
                    Style::default().fg(app.theme.highlight),
                ),
                Span::styled(action.to_string(), Style::default().fg(app.theme.text)),
            ])
        })
        .collect();

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().bg(app.theme.background))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" keys ")
                    .border_style(Style::default().fg(app.theme.dim)),
            ),
        popup,
    );
}

#[cfg(test)]
mod tests {
    use super::super::test_helpers::{TERM_H, TERM_W, render_to_string, test_app};
    use crate::tui::render::render;

    #[test]
    fn overlay_lists_key_bindings() {
        let mut app = test_app("uses 4 tasks\n\nall tasks synchronize\n");
        app.show_help = true;
        let output = render_to_string(TERM_W, TERM_H, |frame| render(frame, &mut app));
        assert!(output.contains("marquee select"));
        assert!(output.contains("undo / redo"));
    }
}
