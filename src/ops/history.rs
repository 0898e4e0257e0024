use crate::model::program::Program;

/// Deep snapshots are heavier than operation records, so the cap is tight.
const HISTORY_LIMIT: usize = 100;

/// The undo/redo stacks.
///
/// Each entry is a deep clone of the whole program (tree, task count,
/// comes-from parameters), captured by `push_state` immediately before a
/// destructive edit. Undo swaps the current program with the top snapshot.
pub struct History {
    undo: Vec<Program>,
    redo: Vec<Program>,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        History {
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    /// Capture the current program. Clears the redo stack.
    /// Call before mutating, never after.
    pub fn push_state(&mut self, program: &Program) {
        self.undo.push(program.clone());
        if self.undo.len() > HISTORY_LIMIT {
            self.undo.drain(..self.undo.len() - HISTORY_LIMIT);
        }
        self.redo.clear();
    }

    /// Restore the most recent snapshot. Returns false when there is
    /// nothing to undo.
    pub fn undo(&mut self, program: &mut Program) -> bool {
        match self.undo.pop() {
            Some(prev) => {
                self.redo.push(std::mem::replace(program, prev));
                true
            }
            None => false,
        }
    }

    /// Reapply the most recently undone state.
    pub fn redo(&mut self, program: &mut Program) -> bool {
        match self.redo.pop() {
            Some(next) => {
                self.undo.push(std::mem::replace(program, next));
                true
            }
            None => false,
        }
    }

    /// Drop both stacks. Called when the file is reloaded from disk.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}
