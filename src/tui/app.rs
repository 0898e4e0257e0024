use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::expr::eval::{DescriptionEvaluator, ResolveCtx};
use crate::io::config_io;
use crate::io::lock::ProgramLock;
use crate::io::program_io;
use crate::io::state::{self, UiState};
use crate::io::watcher::{FileEvent, ProgramWatcher};
use crate::model::component::{CompPath, Component, ComponentKind, Statement};
use crate::model::config::EditorConfig;
use crate::model::program::Program;
use crate::ops::edit_ops::{self, EditCommand};
use crate::ops::history::History;
use crate::parse::program_parser::ParseIssue;
use crate::parse::program_serializer::{block_header_line, statement_line};
use crate::tui::theme::Theme;

/// Rows above the body view: title bar + separator.
pub const HEADER_ROWS: u16 = 2;

/// Input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    Edit,
}

/// What the edit-mode buffer will become on submit.
#[derive(Debug, Clone)]
pub enum EditTarget {
    /// Insert a new statement at this sibling position
    Insert { at: CompPath },
    /// Replace the line of the component at this path
    Replace { at: CompPath },
    /// Parse the buffer as a block header and wrap the selection in it
    Wrap,
}

/// One visible row of the body view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    Comment,
    Statement,
    BlockHeader,
    BlockEnd,
}

#[derive(Debug, Clone)]
pub struct Row {
    pub kind: RowKind,
    pub depth: usize,
    /// The component this row belongs to (block rows map to the block).
    pub path: CompPath,
    pub text: String,
}

/// Participation of one statement row, for the task grid.
pub enum Participation {
    /// Task indices that appear in the resolved pairs
    Tasks(Vec<usize>),
    NotStatic,
}

pub struct App {
    pub path: PathBuf,
    pub program: Program,
    pub parse_issues: Vec<ParseIssue>,
    pub history: History,
    pub eval: DescriptionEvaluator,
    pub config: EditorConfig,
    pub theme: Theme,
    pub mode: Mode,
    pub cursor: usize,
    pub scroll_offset: usize,
    pub show_grid: bool,
    pub edit_input: String,
    pub edit_target: Option<EditTarget>,
    pub status: Option<String>,
    pub dirty: bool,
    pub should_quit: bool,
    pub show_help: bool,
    /// Mouse-drag anchor in body coordinates
    pub drag_anchor: Option<(u16, u16)>,
    pub drag_current: Option<(u16, u16)>,
    /// Ignore watcher events briefly after our own saves
    ignore_watch_until: Option<Instant>,
}

impl App {
    pub fn new(
        path: PathBuf,
        program: Program,
        parse_issues: Vec<ParseIssue>,
        config: EditorConfig,
    ) -> Self {
        let show_grid = config.ui.show_grid;
        App {
            path,
            program,
            parse_issues,
            history: History::new(),
            eval: DescriptionEvaluator::new(),
            config,
            theme: Theme::default(),
            mode: Mode::Navigate,
            cursor: 0,
            scroll_offset: 0,
            show_grid,
            edit_input: String::new(),
            edit_target: None,
            status: None,
            dirty: false,
            should_quit: false,
            show_help: false,
            drag_anchor: None,
            drag_current: None,
            ignore_watch_until: None,
        }
    }

    /// Body rows in display order. Row numbering matches
    /// `select_ops::layout_program` so mouse coordinates map directly.
    pub fn rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        for (i, child) in self.program.root.children().iter().enumerate() {
            push_rows(child, &[i], 0, &mut rows);
        }
        rows
    }

    /// The component under the cursor, if the cursor is on a component row.
    pub fn cursor_path(&self) -> Option<CompPath> {
        self.rows().get(self.cursor).map(|r| r.path.clone())
    }

    pub fn clamp_cursor(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    /// Which tasks a statement touches, from the resolver cache. Reduce
    /// rows resolve their data tasks and root tasks independently.
    pub fn participation(&mut self, path: &[usize]) -> Option<Participation> {
        let bindings = self.program.scope_at(path);
        let ctx = ResolveCtx {
            task_count: self.program.task_count,
            bindings: &bindings,
        };
        let task_count = self.program.task_count;
        let stmt = self.program.get_mut(path)?.as_statement_mut()?;
        let pairs = match stmt {
            Statement::Reduce { group, .. } => {
                let mut pairs = group.enumerate_ignoring_targets(&self.eval, &ctx);
                pairs.extend(group.enumerate_targets_as_sources(&self.eval, &ctx));
                pairs
            }
            _ => stmt.group_mut().enumerate(&self.eval, &ctx).to_vec(),
        };
        if pairs.iter().any(|p| p.unknown) {
            return Some(Participation::NotStatic);
        }
        let mut tasks = Vec::new();
        for pair in &pairs {
            for t in [pair.source, pair.target] {
                if t < task_count && !tasks.contains(&t) {
                    tasks.push(t);
                }
            }
        }
        Some(Participation::Tasks(tasks))
    }

    /// Run one edit command, recording errors in the status row.
    /// Returns true when the command succeeded.
    pub fn dispatch(&mut self, cmd: EditCommand) -> bool {
        let destructive = !matches!(
            cmd,
            EditCommand::ToggleSelect { .. }
                | EditCommand::SelectAll
                | EditCommand::ClearSelection
                | EditCommand::Marquee { .. }
        );
        match edit_ops::apply(
            &mut self.program,
            &mut self.history,
            &self.eval,
            self.config.program.max_tasks,
            cmd,
        ) {
            Ok(()) => {
                if destructive {
                    self.dirty = true;
                    if self.config.ui.autosave {
                        self.save();
                    }
                }
                self.clamp_cursor();
                true
            }
            Err(e) => {
                self.status = Some(e.to_string());
                false
            }
        }
    }

    pub fn undo(&mut self) {
        if self.history.undo(&mut self.program) {
            self.dirty = true;
            self.clamp_cursor();
            self.status = Some("undone".into());
        } else {
            self.status = Some("nothing to undo".into());
        }
    }

    pub fn redo(&mut self) {
        if self.history.redo(&mut self.program) {
            self.dirty = true;
            self.clamp_cursor();
            self.status = Some("redone".into());
        } else {
            self.status = Some("nothing to redo".into());
        }
    }

    pub fn save(&mut self) {
        let result = ProgramLock::acquire_default(&self.path)
            .map_err(|e| e.to_string())
            .and_then(|_lock| {
                program_io::save_program(&self.path, &self.program).map_err(|e| e.to_string())
            });
        match result {
            Ok(()) => {
                self.dirty = false;
                self.ignore_watch_until = Some(Instant::now() + Duration::from_millis(500));
                self.status = Some(format!("saved {}", self.path.display()));
            }
            Err(e) => self.status = Some(e),
        }
    }

    /// Reload after an external change. History cannot span two files'
    /// worth of trees, so it is cleared.
    pub fn reload_from_disk(&mut self) {
        match program_io::load_program(&self.path) {
            Ok((program, issues)) => {
                self.program = program;
                self.parse_issues = issues;
                self.history.clear();
                self.dirty = false;
                self.clamp_cursor();
                self.status = Some("reloaded (file changed on disk)".into());
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    fn watch_events_relevant(&self, events: &[FileEvent]) -> bool {
        if events.is_empty() {
            return false;
        }
        if let Some(until) = self.ignore_watch_until
            && Instant::now() < until
        {
            return false;
        }
        true
    }
}

fn push_rows(component: &Component, path: &[usize], depth: usize, rows: &mut Vec<Row>) {
    for comment in &component.pre_comments {
        rows.push(Row {
            kind: RowKind::Comment,
            depth,
            path: path.to_vec(),
            text: comment.clone(),
        });
    }
    match &component.kind {
        ComponentKind::Statement(stmt) => {
            rows.push(Row {
                kind: RowKind::Statement,
                depth,
                path: path.to_vec(),
                text: statement_line(stmt),
            });
        }
        ComponentKind::Block(block) => {
            rows.push(Row {
                kind: RowKind::BlockHeader,
                depth,
                path: path.to_vec(),
                text: block_header_line(&block.kind),
            });
            for (i, child) in block.children.iter().enumerate() {
                let mut child_path = path.to_vec();
                child_path.push(i);
                push_rows(child, &child_path, depth + 1, rows);
            }
            rows.push(Row {
                kind: RowKind::BlockEnd,
                depth,
                path: path.to_vec(),
                text: format!("end {}", block.kind.end_word()),
            });
        }
    }
}

/// Open a program file in the TUI.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (program, parse_issues) = program_io::load_program(path)?;
    let config = config_io::load_or_default(path.parent().unwrap_or(Path::new(".")));
    let mut app = App::new(path.to_path_buf(), program, parse_issues, config);

    state::touch_recent(path);
    if let Some(ui_state) = state::read_ui_state(path) {
        app.cursor = ui_state.cursor;
        app.scroll_offset = ui_state.scroll_offset;
        if let Some(grid) = ui_state.show_grid_override {
            app.show_grid = grid;
        }
        app.clamp_cursor();
    }
    if !app.parse_issues.is_empty() {
        app.status = Some(format!(
            "{} parse issue(s); see `wf check`",
            app.parse_issues.len()
        ));
    }

    let watcher = ProgramWatcher::start(path).ok();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, watcher.as_ref());

    state::write_ui_state(
        path,
        &UiState {
            cursor: app.cursor,
            scroll_offset: app.scroll_offset,
            show_grid_override: Some(app.show_grid),
        },
    );

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: Option<&ProgramWatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| crate::tui::render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    crate::tui::input::handle_key(app, key);
                }
                Event::Mouse(mouse) => {
                    crate::tui::input::handle_mouse(app, mouse);
                }
                _ => {}
            }
        }

        if let Some(watcher) = watcher {
            let events = watcher.poll();
            if app.watch_events_relevant(&events) {
                app.reload_from_disk();
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
