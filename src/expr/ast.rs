/// Node kinds for parsed expressions.
///
/// One closed set covers task-set descriptions, predicates, and scalar
/// expressions; payloads live in the node's `attr` and `children`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstKind {
    /// A complete task-set description. Opaque to the generic scope walk;
    /// descriptions carry their own binding rules (see `TaskFilter`).
    Description,
    /// `all tasks`
    AllTasks,
    /// `task E` — children: [E]
    TaskIndex,
    /// `tasks v such that P` — attr: v, children: [P]
    TaskFilter,
    /// children: [lhs, rhs]; both sides are predicate sets
    And,
    /// children: [lhs, rhs]
    Or,
    /// attr: one of `<` `>` `=` `<=` `>=`; children: [lhs, rhs]
    Compare,
    /// `E is even` / `E is odd` — attr: `even` or `odd`, children: [E]
    Parity,
    /// `E is in {a, b, ...}` — children: [E, a, b, ...]
    Membership,
    /// attr: the literal text
    Number,
    /// attr: the identifier name
    Ident,
    /// attr: one of `+` `-` `*` `/`; children: [lhs, rhs]
    BinOp,
}

impl AstKind {
    /// True for the node kind that wraps a whole task-set description.
    pub fn is_task_expression(self) -> bool {
        matches!(self, AstKind::Description)
    }
}

/// A read-only parsed expression node: kind, attribute payload, ordered
/// children, originating source text, and source line.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    kind: AstKind,
    attr: String,
    children: Vec<AstNode>,
    source: String,
    line: Option<usize>,
}

impl AstNode {
    pub fn new(kind: AstKind, attr: impl Into<String>, children: Vec<AstNode>) -> Self {
        AstNode {
            kind,
            attr: attr.into(),
            children,
            source: String::new(),
            line: None,
        }
    }

    /// Attach the originating source text.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Attach the originating line number.
    pub fn with_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    pub fn kind(&self) -> AstKind {
        self.kind
    }

    pub fn attr(&self) -> &str {
        &self.attr
    }

    pub fn children(&self) -> &[AstNode] {
        &self.children
    }

    pub fn source_text(&self) -> &str {
        &self.source
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }
}
