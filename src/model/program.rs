use indexmap::IndexMap;

use crate::expr::eval::Binding;
use crate::model::component::{BlockKind, CompPath, Component, ComponentKind};

/// A complete program: the task count, the comes-from parameter
/// declarations, and the root block owning the statement tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Number of tasks (0..task_count participate).
    pub task_count: usize,
    /// Comes-from declarations: parameter name → default value literal,
    /// in declaration order.
    pub params: IndexMap<String, String>,
    /// The top-level block. Always `BlockKind::Program`.
    pub root: Component,
    /// Verbatim comment lines after the last component in the file.
    pub trailing_comments: Vec<String>,
}

impl Program {
    pub fn new(task_count: usize) -> Self {
        Program {
            task_count,
            params: IndexMap::new(),
            root: Component::block(BlockKind::Program),
            trailing_comments: Vec::new(),
        }
    }

    pub fn get(&self, path: &[usize]) -> Option<&Component> {
        self.root.get(path)
    }

    pub fn get_mut(&mut self, path: &[usize]) -> Option<&mut Component> {
        self.root.get_mut(path)
    }

    /// Variables in scope at the component addressed by `path`, innermost
    /// binder first, comes-from parameters last. Loop variables and
    /// parameters carry no static value; let variables carry their
    /// initializer expression for the evaluator to fold.
    pub fn scope_at(&self, path: &[usize]) -> Vec<Binding> {
        let mut bindings = Vec::new();
        let mut node = &self.root;
        // Binders of enclosing blocks, outermost first.
        for &idx in path {
            if let ComponentKind::Block(b) = &node.kind {
                match &b.kind {
                    BlockKind::For { var, .. } => bindings.push(Binding {
                        name: var.clone(),
                        value: None,
                    }),
                    BlockKind::Let { var, value } => bindings.push(Binding {
                        name: var.clone(),
                        value: Some(value.clone()),
                    }),
                    _ => {}
                }
                match b.children.get(idx) {
                    Some(child) => node = child,
                    None => break,
                }
            } else {
                break;
            }
        }
        bindings.reverse();
        for name in self.params.keys() {
            bindings.push(Binding {
                name: name.clone(),
                value: None,
            });
        }
        bindings
    }

    /// Names of all variables in scope at `path`.
    pub fn scope_names_at(&self, path: &[usize]) -> Vec<String> {
        self.scope_at(path).into_iter().map(|b| b.name).collect()
    }

    /// Change the task count and drop every resolution cache in the tree.
    pub fn resize(&mut self, task_count: usize) {
        self.task_count = task_count;
        self.root.invalidate_groups();
    }

    /// Drop every resolution cache without changing the count (used after
    /// bulk structural edits).
    pub fn invalidate_all(&mut self) {
        self.root.invalidate_groups();
    }

    /// Every component except the root, with its path, in tree order.
    pub fn flatten(&self) -> Vec<(CompPath, &Component)> {
        let mut out = Vec::new();
        self.root.visit(&mut |path, node| {
            if !path.is_empty() {
                out.push((path.clone(), node));
            }
        });
        out
    }
}
