use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ops::edit_ops::EditCommand;
use crate::parse::program_parser::parse_block_header_text;
use crate::tui::app::{App, EditTarget, Mode};

/// Handle keys in EDIT mode (the one-line editor at the bottom).
pub(super) fn handle(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => cancel(app),
        KeyCode::Enter => submit(app),
        KeyCode::Backspace => {
            app.edit_input.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.edit_input.push(c);
        }
        _ => {}
    }
}

fn cancel(app: &mut App) {
    app.edit_input.clear();
    app.edit_target = None;
    app.mode = Mode::Navigate;
}

/// Parse and apply the buffer. Validation failures keep the editor open
/// with the error in the status row; the tree stays untouched.
fn submit(app: &mut App) {
    let Some(target) = app.edit_target.clone() else {
        cancel(app);
        return;
    };
    let text = app.edit_input.trim().to_string();

    let applied = match target {
        EditTarget::Insert { at } => app.dispatch(EditCommand::InsertStatement { at, text }),
        EditTarget::Replace { at } => app.dispatch(EditCommand::ApplyLine { at, text }),
        EditTarget::Wrap => match parse_block_header_text(&text) {
            Some(kind) => app.dispatch(EditCommand::WrapSelection { kind }),
            None => {
                app.status = Some(format!("`{text}` is not a block header"));
                false
            }
        },
    };

    if applied {
        cancel(app);
    }
}
