use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Participation, RowKind};
use crate::tui::input::navigate::GUTTER;
use crate::util::unicode::{display_width, truncate_to_width};

/// Widest participation grid we draw; larger programs get a summary cell.
const GRID_LIMIT: usize = 32;

/// Render the body: one row per comment/statement/block line, with the
/// participation grid on statement rows.
pub fn render_program_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let bg = app.theme.background;
    let rows = app.rows();

    // Keep the cursor visible.
    let height = area.height as usize;
    if height > 0 {
        if app.cursor < app.scroll_offset {
            app.scroll_offset = app.cursor;
        } else if app.cursor >= app.scroll_offset + height {
            app.scroll_offset = app.cursor + 1 - height;
        }
    }

    let mut lines: Vec<Line> = Vec::new();
    for (i, row) in rows
        .iter()
        .enumerate()
        .skip(app.scroll_offset)
        .take(height)
    {
        let is_cursor = i == app.cursor;
        let selected = app
            .program
            .get(&row.path)
            .is_some_and(|c| c.selected && row.kind != RowKind::Comment);
        let row_bg = if selected { app.theme.selection_bg } else { bg };

        let mut spans = Vec::new();
        let marker = if is_cursor { "\u{258C} " } else { "  " };
        let marker_color = if selected {
            app.theme.selection_marker
        } else {
            app.theme.highlight
        };
        spans.push(Span::styled(
            marker,
            Style::default().fg(marker_color).bg(row_bg),
        ));
        spans.push(Span::styled(
            "  ".repeat(row.depth),
            Style::default().bg(row_bg),
        ));

        let color = match row.kind {
            RowKind::Comment => app.theme.comment,
            RowKind::BlockHeader => app.theme.block,
            RowKind::BlockEnd => app.theme.dim,
            RowKind::Statement => {
                let kind = app
                    .program
                    .get(&row.path)
                    .map(|c| c.kind_name())
                    .unwrap_or("");
                app.theme.kind_color(kind)
            }
        };

        // Trailing comment shares the row.
        let line_comment = app
            .program
            .get(&row.path)
            .filter(|_| row.kind == RowKind::Statement || row.kind == RowKind::BlockHeader)
            .and_then(|c| c.line_comment.clone());

        let grid = if row.kind == RowKind::Statement && app.show_grid {
            grid_cells(app, &row.path)
        } else {
            None
        };

        let used: usize = GUTTER as usize + row.depth * 2;
        let grid_width = grid.as_ref().map_or(0, |(text, _)| display_width(text) + 1);
        let budget = (area.width as usize)
            .saturating_sub(used)
            .saturating_sub(grid_width);

        let mut body = row.text.clone();
        if let Some(comment) = line_comment {
            body.push_str("  # ");
            body.push_str(&comment);
        }
        let body = truncate_to_width(&body, budget);
        let body_width = display_width(&body);
        spans.push(Span::styled(body, Style::default().fg(color).bg(row_bg)));

        if let Some((grid_text, not_static)) = grid {
            let pad = budget.saturating_sub(body_width);
            spans.push(Span::styled(" ".repeat(pad + 1), Style::default().bg(row_bg)));
            let grid_color = if not_static {
                app.theme.unknown
            } else {
                app.theme.grid_on
            };
            spans.push(Span::styled(
                grid_text,
                Style::default().fg(grid_color).bg(row_bg),
            ));
        }

        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

/// The participation grid text for one statement row. Returns the text and
/// whether the group is not statically resolvable.
fn grid_cells(app: &mut App, path: &[usize]) -> Option<(String, bool)> {
    let task_count = app.program.task_count;
    match app.participation(path)? {
        Participation::NotStatic => {
            let width = task_count.min(GRID_LIMIT);
            Some(("?".repeat(width), true))
        }
        Participation::Tasks(tasks) => {
            if task_count > GRID_LIMIT {
                return Some((format!("[{}/{}]", tasks.len(), task_count), false));
            }
            let cells: String = (0..task_count)
                .map(|t| {
                    if tasks.contains(&t) {
                        '\u{25A0}'
                    } else {
                        '\u{00B7}'
                    }
                })
                .collect();
            Some((cells, false))
        }
    }
}
