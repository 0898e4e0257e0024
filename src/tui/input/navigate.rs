use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::ops::edit_ops::EditCommand;
use crate::ops::select_ops::{Rect, selected_paths};
use crate::tui::app::{App, EditTarget, HEADER_ROWS, Mode, RowKind};

/// Gutter columns to the left of the body (cursor/selection markers).
pub const GUTTER: u16 = 2;

/// Handle keys in NAVIGATE mode.
pub(super) fn handle(app: &mut App, key: KeyEvent) {
    // Help overlay intercepts ? and Esc, plus nothing else
    if app.show_help {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
            app.show_help = false;
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => {
            if app.dirty {
                app.status = Some("unsaved changes (w to save, Q to quit anyway)".into());
            } else {
                app.should_quit = true;
            }
        }
        KeyCode::Char('Q') => app.should_quit = true,
        KeyCode::Char('w') => app.save(),

        KeyCode::Char('j') | KeyCode::Down => {
            app.cursor += 1;
            app.clamp_cursor();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Char('g') => app.cursor = 0,
        KeyCode::Char('G') => {
            app.cursor = app.rows().len().saturating_sub(1);
        }

        KeyCode::Char(' ') => toggle_at_cursor(app, false),
        KeyCode::Char('v') => toggle_at_cursor(app, true),
        KeyCode::Char('a') => {
            app.dispatch(EditCommand::SelectAll);
        }
        KeyCode::Esc => {
            app.dispatch(EditCommand::ClearSelection);
        }

        KeyCode::Char('d') => {
            app.dispatch(EditCommand::DeleteSelection);
        }
        KeyCode::Char('c') => {
            app.dispatch(EditCommand::CloneSelection);
        }
        KeyCode::Char('U') => {
            if let Some(at) = app.cursor_path() {
                app.dispatch(EditCommand::Unwrap { at });
            }
        }
        KeyCode::Char('J') => {
            if let Some(at) = app.cursor_path() {
                app.dispatch(EditCommand::MoveDown { at });
            }
        }
        KeyCode::Char('K') => {
            if let Some(at) = app.cursor_path() {
                app.dispatch(EditCommand::MoveUp { at });
            }
        }

        KeyCode::Char('u') => app.undo(),
        KeyCode::Char('r') => app.redo(),

        KeyCode::Char('+') | KeyCode::Char('=') => {
            let count = app.program.task_count + 1;
            app.dispatch(EditCommand::Resize { task_count: count });
        }
        KeyCode::Char('-') => {
            let count = app.program.task_count.saturating_sub(1);
            app.dispatch(EditCommand::Resize { task_count: count });
        }

        KeyCode::Char('i') => begin_insert(app),
        KeyCode::Char('e') | KeyCode::Enter => begin_replace(app),
        KeyCode::Char('L') => begin_wrap(app),

        KeyCode::Char('t') => app.show_grid = !app.show_grid,
        KeyCode::Char('?') => app.show_help = true,
        _ => {}
    }
}

fn toggle_at_cursor(app: &mut App, extend_same_kind: bool) {
    if let Some(at) = app.cursor_path() {
        app.dispatch(EditCommand::ToggleSelect {
            at,
            extend_same_kind,
        });
    }
}

/// Enter EDIT mode to insert a new statement after the cursor's component.
fn begin_insert(app: &mut App) {
    let at = match app.cursor_path() {
        Some(mut path) => {
            if let Some(last) = path.last_mut() {
                *last += 1;
            }
            path
        }
        None => vec![app.program.root.children().len()],
    };
    app.edit_target = Some(EditTarget::Insert { at });
    app.edit_input = "all tasks compute for 1 second".into();
    app.mode = Mode::Edit;
}

/// Enter EDIT mode seeded with the cursor row's canonical line.
fn begin_replace(app: &mut App) {
    let rows = app.rows();
    let Some(row) = rows.get(app.cursor) else {
        return;
    };
    if row.kind == RowKind::Comment {
        app.status = Some("comments are edited in the file".into());
        return;
    }
    // End rows edit their block's header.
    let seed = match row.kind {
        RowKind::BlockEnd => rows
            .iter()
            .find(|r| r.path == row.path && r.kind == RowKind::BlockHeader)
            .map(|r| r.text.clone())
            .unwrap_or_default(),
        _ => row.text.clone(),
    };
    app.edit_target = Some(EditTarget::Replace {
        at: row.path.clone(),
    });
    app.edit_input = seed;
    app.mode = Mode::Edit;
}

/// Enter EDIT mode for a wrap header. An empty selection wraps the
/// cursor's component.
fn begin_wrap(app: &mut App) {
    if selected_paths(&app.program).is_empty() {
        toggle_at_cursor(app, false);
    }
    app.edit_target = Some(EditTarget::Wrap);
    app.edit_input = format!("for i = 1 to {}", app.program.task_count);
    app.mode = Mode::Edit;
}

/// Translate screen coordinates into body-view coordinates.
fn body_coords(app: &App, column: u16, row: u16) -> Option<(u16, u16)> {
    if row < HEADER_ROWS {
        return None;
    }
    let y = (row - HEADER_ROWS) as usize + app.scroll_offset;
    Some((column.saturating_sub(GUTTER), y as u16))
}

/// Handle mouse input: click to select, drag for marquee selection.
pub(super) fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            app.drag_anchor = body_coords(app, mouse.column, mouse.row);
            app.drag_current = app.drag_anchor;
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if app.drag_anchor.is_some() {
                app.drag_current = body_coords(app, mouse.column, mouse.row);
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            let anchor = app.drag_anchor.take();
            let current = app.drag_current.take();
            match (anchor, current) {
                (Some((ax, ay)), Some((cx, cy))) if (ax, ay) != (cx, cy) => {
                    app.dispatch(EditCommand::Marquee {
                        rect: Rect::from_corners(ax, ay, cx, cy),
                    });
                }
                (Some((_, ay)), _) => {
                    // A click: select the component on that row.
                    let extend = mouse.modifiers.contains(KeyModifiers::CONTROL)
                        || mouse.modifiers.contains(KeyModifiers::SHIFT);
                    let rows = app.rows();
                    if let Some(row) = rows.get(ay as usize) {
                        let at = row.path.clone();
                        app.cursor = ay as usize;
                        app.dispatch(EditCommand::ToggleSelect {
                            at,
                            extend_same_kind: extend,
                        });
                    }
                }
                _ => {}
            }
        }
        _ => {}
    }
}
