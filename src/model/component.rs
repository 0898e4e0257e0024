use crate::model::taskgroup::TaskGroup;

/// Path from the root block down to a component: one child index per level.
/// The empty path addresses the root itself.
pub type CompPath = Vec<usize>;

/// The kind of a composite (container) component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// The top-level program body
    Program,
    /// `for i = 1 to n` ... `end for`
    For {
        var: String,
        from: String,
        to: String,
    },
    /// `if n > 4` ... `end if`
    If { condition: String },
    /// `let half = n / 2` ... `end let`
    Let { var: String, value: String },
    /// `block "caption"` ... `end block`
    Sub { caption: String },
}

impl BlockKind {
    /// The variable this block binds for its children, if any.
    pub fn bound_var(&self) -> Option<&str> {
        match self {
            BlockKind::For { var, .. } => Some(var),
            BlockKind::Let { var, .. } => Some(var),
            _ => None,
        }
    }

    /// The keyword used in the block's `end` line.
    pub fn end_word(&self) -> &'static str {
        match self {
            BlockKind::Program => "program",
            BlockKind::For { .. } => "for",
            BlockKind::If { .. } => "if",
            BlockKind::Let { .. } => "let",
            BlockKind::Sub { .. } => "block",
        }
    }
}

/// A composite component: an ordered sequence of children.
/// Child order is the program's statement order.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub children: Vec<Component>,
}

impl Block {
    pub fn new(kind: BlockKind) -> Self {
        Block {
            kind,
            children: Vec::new(),
        }
    }

    /// The next id not used by any current child.
    pub fn next_child_id(&self) -> u32 {
        self.children.iter().map(|c| c.id).max().map_or(1, |m| m + 1)
    }
}

/// A leaf component: one program action bound to a row of tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `all tasks compute for 2 seconds`
    Compute { group: TaskGroup, duration: String },
    /// `task 0 sends 1 megabyte to task 1 aligned to 64 bytes awaited by task 2`
    Send {
        group: TaskGroup,
        size: String,
        alignment: Option<String>,
    },
    /// `all tasks reduce 1 megabyte to task 0`
    Reduce { group: TaskGroup, size: String },
    /// `all tasks synchronize`
    Synchronize { group: TaskGroup },
}

impl Statement {
    /// Short name used for same-kind selection and display.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Compute { .. } => "compute",
            Statement::Send { .. } => "send",
            Statement::Reduce { .. } => "reduce",
            Statement::Synchronize { .. } => "synchronize",
        }
    }

    pub fn group(&self) -> &TaskGroup {
        match self {
            Statement::Compute { group, .. }
            | Statement::Send { group, .. }
            | Statement::Reduce { group, .. }
            | Statement::Synchronize { group } => group,
        }
    }

    pub fn group_mut(&mut self) -> &mut TaskGroup {
        match self {
            Statement::Compute { group, .. }
            | Statement::Send { group, .. }
            | Statement::Reduce { group, .. }
            | Statement::Synchronize { group } => group,
        }
    }
}

/// Either a container or a leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentKind {
    Block(Block),
    Statement(Statement),
}

/// A node in the program tree.
///
/// Ownership is exclusive: a block owns its children by value. There are no
/// parent back-references; upward queries walk down from the root along a
/// `CompPath`.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Unique among siblings. Stable for the session, reassigned by
    /// `normalize_ids`.
    pub id: u32,
    pub selected: bool,
    /// Verbatim comment lines emitted immediately before this component.
    pub pre_comments: Vec<String>,
    /// Verbatim same-line comment text (without the leading `#`).
    pub line_comment: Option<String>,
    /// Line in the source file this component was parsed from.
    /// None when the component was created in the editor.
    pub source_line: Option<usize>,
    pub kind: ComponentKind,
}

impl Component {
    pub fn statement(stmt: Statement) -> Self {
        Component {
            id: 0,
            selected: false,
            pre_comments: Vec::new(),
            line_comment: None,
            source_line: None,
            kind: ComponentKind::Statement(stmt),
        }
    }

    pub fn block(kind: BlockKind) -> Self {
        Component {
            id: 0,
            selected: false,
            pre_comments: Vec::new(),
            line_comment: None,
            source_line: None,
            kind: ComponentKind::Block(Block::new(kind)),
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match &self.kind {
            ComponentKind::Block(b) => Some(b),
            ComponentKind::Statement(_) => None,
        }
    }

    pub fn as_block_mut(&mut self) -> Option<&mut Block> {
        match &mut self.kind {
            ComponentKind::Block(b) => Some(b),
            ComponentKind::Statement(_) => None,
        }
    }

    pub fn as_statement(&self) -> Option<&Statement> {
        match &self.kind {
            ComponentKind::Statement(s) => Some(s),
            ComponentKind::Block(_) => None,
        }
    }

    pub fn as_statement_mut(&mut self) -> Option<&mut Statement> {
        match &mut self.kind {
            ComponentKind::Statement(s) => Some(s),
            ComponentKind::Block(_) => None,
        }
    }

    /// Ordered children; empty for statements.
    pub fn children(&self) -> &[Component] {
        match &self.kind {
            ComponentKind::Block(b) => &b.children,
            ComponentKind::Statement(_) => &[],
        }
    }

    /// Short name used for same-kind selection: statements report their
    /// statement kind, blocks report their block keyword.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ComponentKind::Statement(s) => s.kind_name(),
            ComponentKind::Block(b) => b.kind.end_word(),
        }
    }

    /// Resolve a path relative to this component.
    pub fn get(&self, path: &[usize]) -> Option<&Component> {
        let mut node = self;
        for &idx in path {
            node = node.children().get(idx)?;
        }
        Some(node)
    }

    /// Mutable path resolution.
    pub fn get_mut(&mut self, path: &[usize]) -> Option<&mut Component> {
        let mut node = self;
        for &idx in path {
            node = match &mut node.kind {
                ComponentKind::Block(b) => b.children.get_mut(idx)?,
                ComponentKind::Statement(_) => return None,
            };
        }
        Some(node)
    }

    /// Append a child, assigning it a fresh sibling-unique id.
    /// No-op on statements.
    pub fn add_child(&mut self, mut child: Component) {
        if let ComponentKind::Block(b) = &mut self.kind {
            child.id = b.next_child_id();
            b.children.push(child);
        }
    }

    /// Insert a child at `index` (clamped), assigning a fresh id.
    pub fn insert_child(&mut self, index: usize, mut child: Component) {
        if let ComponentKind::Block(b) = &mut self.kind {
            child.id = b.next_child_id();
            let idx = index.min(b.children.len());
            b.children.insert(idx, child);
        }
    }

    /// Detach and return the child at `index`, if present.
    pub fn remove_child(&mut self, index: usize) -> Option<Component> {
        match &mut self.kind {
            ComponentKind::Block(b) if index < b.children.len() => Some(b.children.remove(index)),
            _ => None,
        }
    }

    /// Collect selected components depth-first, self before children,
    /// children in declaration order. Paths are relative to `prefix`.
    pub fn collect_selected(&self, prefix: &[usize], acc: &mut Vec<CompPath>) {
        if self.selected {
            acc.push(prefix.to_vec());
        }
        for (i, child) in self.children().iter().enumerate() {
            let mut p = prefix.to_vec();
            p.push(i);
            child.collect_selected(&p, acc);
        }
    }

    /// Set the selection flag on this component and every descendant.
    pub fn set_all_selected(&mut self, flag: bool) {
        self.selected = flag;
        if let ComponentKind::Block(b) = &mut self.kind {
            for child in &mut b.children {
                child.set_all_selected(flag);
            }
        }
    }

    /// Visit every component depth-first in tree order, self first.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&CompPath, &'a Component)) {
        fn walk<'a>(
            node: &'a Component,
            path: &mut CompPath,
            f: &mut impl FnMut(&CompPath, &'a Component),
        ) {
            f(path, node);
            for (i, child) in node.children().iter().enumerate() {
                path.push(i);
                walk(child, path, f);
                path.pop();
            }
        }
        let mut path = Vec::new();
        walk(self, &mut path, f);
    }

    /// Drop the resolution cache of every task group in this subtree.
    /// Called after any mutation that changes the task count.
    pub fn invalidate_groups(&mut self) {
        match &mut self.kind {
            ComponentKind::Statement(s) => s.group_mut().resize(),
            ComponentKind::Block(b) => {
                for child in &mut b.children {
                    child.invalidate_groups();
                }
            }
        }
    }

    /// Reassign sibling ids to 1..n recursively (structural normalization).
    pub fn normalize_ids(&mut self) {
        if let ComponentKind::Block(b) = &mut self.kind {
            for (i, child) in b.children.iter_mut().enumerate() {
                child.id = i as u32 + 1;
                child.normalize_ids();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::taskgroup::TaskGroup;

    fn compute(desc: &str) -> Component {
        Component::statement(Statement::Compute {
            group: TaskGroup::new(desc),
            duration: "1".into(),
        })
    }

    #[test]
    fn add_child_assigns_unique_sibling_ids() {
        let mut root = Component::block(BlockKind::Program);
        root.add_child(compute("all tasks"));
        root.add_child(compute("task 0"));
        let ids: Vec<u32> = root.children().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn insert_after_remove_does_not_reuse_live_id() {
        let mut root = Component::block(BlockKind::Program);
        root.add_child(compute("all tasks"));
        root.add_child(compute("task 0"));
        root.remove_child(0);
        root.add_child(compute("task 1"));
        let ids: Vec<u32> = root.children().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn get_resolves_nested_paths() {
        let mut root = Component::block(BlockKind::Program);
        let mut f = Component::block(BlockKind::For {
            var: "i".into(),
            from: "1".into(),
            to: "4".into(),
        });
        f.add_child(compute("task i"));
        root.add_child(f);

        assert!(root.get(&[0]).unwrap().as_block().is_some());
        assert!(root.get(&[0, 0]).unwrap().as_statement().is_some());
        assert!(root.get(&[0, 1]).is_none());
        assert!(root.get(&[0, 0, 0]).is_none());
    }

    #[test]
    fn selection_order_is_self_then_children() {
        let mut root = Component::block(BlockKind::Program);
        root.add_child(compute("all tasks"));
        root.add_child(compute("task 0"));
        root.set_all_selected(true);

        let mut acc = Vec::new();
        root.collect_selected(&[], &mut acc);
        assert_eq!(acc, vec![vec![], vec![0], vec![1]]);
    }

    #[test]
    fn set_all_selected_false_clears_descendants() {
        let mut root = Component::block(BlockKind::Program);
        let mut f = Component::block(BlockKind::If {
            condition: "n > 2".into(),
        });
        f.add_child(compute("all tasks"));
        root.add_child(f);
        root.set_all_selected(true);
        root.set_all_selected(false);

        let mut acc = Vec::new();
        root.collect_selected(&[], &mut acc);
        assert!(acc.is_empty());
    }

    #[test]
    fn clone_is_deep() {
        let mut root = Component::block(BlockKind::Program);
        let mut f = Component::block(BlockKind::Sub {
            caption: "drain".into(),
        });
        f.add_child(compute("all tasks"));
        root.add_child(f);

        let mut copy = root.clone();
        copy.get_mut(&[0, 0]).unwrap().selected = true;
        assert!(!root.get(&[0, 0]).unwrap().selected);
    }

    #[test]
    fn normalize_ids_renumbers_sequentially() {
        let mut root = Component::block(BlockKind::Program);
        root.add_child(compute("all tasks"));
        root.add_child(compute("task 0"));
        root.add_child(compute("task 1"));
        root.remove_child(0);
        root.normalize_ids();
        let ids: Vec<u32> = root.children().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
