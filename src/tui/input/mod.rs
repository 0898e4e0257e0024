pub mod edit;
pub mod navigate;

use crossterm::event::{KeyEvent, MouseEvent};

use crate::tui::app::{App, Mode};

/// Route a key press to the active mode's handler.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    app.status = None;
    match app.mode {
        Mode::Navigate => navigate::handle(app, key),
        Mode::Edit => edit::handle(app, key),
    }
}

/// Mouse input is only meaningful in navigate mode.
pub fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.mode == Mode::Navigate {
        navigate::handle_mouse(app, mouse);
    }
}
