use crate::expr::ast::{AstKind, AstNode};
use crate::expr::parser::{parse_description, parse_predicate, parse_scalar};
use crate::model::taskgroup::SourceTarget;

/// Error type for expression parsing and validation
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExprError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character `{0}`")]
    BadCharacter(char),
    #[error("expected {expected}, found `{found}`")]
    Unexpected { expected: String, found: String },
    #[error("unexpected end of expression, expected {0}")]
    UnexpectedEnd(String),
    #[error("unexpected `{0}` after the end of the expression")]
    Trailing(String),
    #[error("variable `{0}` is not in scope")]
    OutOfScope(String),
}

/// One in-scope variable. `value` is the initializer expression for
/// let-bound variables; None for loop variables and comes-from parameters,
/// whose values are only known at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub value: Option<String>,
}

/// Context for a resolution request.
#[derive(Debug, Clone, Copy)]
pub struct ResolveCtx<'a> {
    pub task_count: usize,
    /// In-scope bindings, innermost first.
    pub bindings: &'a [Binding],
}

/// Result of resolving a task-set expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Pairs(Vec<SourceTarget>),
    /// Not statically resolvable (depends on a run-time value).
    Unknown,
}

/// Which grammar an expression is validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprKind {
    Description,
    Scalar,
    Predicate,
}

/// The resolver's view of an expression evaluator.
pub trait Evaluator {
    /// Resolve a source expression (and optional target expression) into
    /// participation pairs. A lone source yields self-pairs (t, t); with a
    /// target, the cross product of the two sets.
    fn resolve(&self, source: &str, target: Option<&str>, ctx: &ResolveCtx<'_>) -> Resolution;

    /// Parse and scope-check an expression without resolving it.
    fn validate(&self, expr: &str, kind: ExprKind, scope: &[String]) -> Result<(), ExprError>;
}

/// Walk an AST subtree checking identifier scope.
///
/// Task-expression nodes short-circuit to valid — descriptions carry their
/// own binding rules and are checked by `Evaluator::validate` instead. Any
/// identifier must be present in `scope`; all other nodes recurse,
/// short-circuiting on first failure.
pub fn verify_scope_variables(node: &AstNode, scope: &[String]) -> bool {
    first_out_of_scope(node, scope).is_none()
}

fn first_out_of_scope(node: &AstNode, scope: &[String]) -> Option<String> {
    match node.kind() {
        kind if kind.is_task_expression() => None,
        AstKind::Ident => {
            if scope.iter().any(|s| s == node.attr()) {
                None
            } else {
                Some(node.attr().to_string())
            }
        }
        _ => node
            .children()
            .iter()
            .find_map(|child| first_out_of_scope(child, scope)),
    }
}

/// Non-deduplicating union: the concatenation of both sets in order.
pub fn union_sets(mut a: Vec<usize>, b: Vec<usize>) -> Vec<usize> {
    a.extend(b);
    a
}

/// True set intersection, preserving the first set's order.
pub fn intersect_sets(a: Vec<usize>, b: Vec<usize>) -> Vec<usize> {
    a.into_iter().filter(|x| b.contains(x)).collect()
}

/// The reference evaluator for the task-description language.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptionEvaluator;

impl DescriptionEvaluator {
    pub fn new() -> Self {
        DescriptionEvaluator
    }

    /// Resolve a description into a set of task indices, or None when the
    /// description depends on a run-time value. Out-of-range indices drop
    /// out of the set.
    fn resolve_set(&self, desc: &AstNode, ctx: &ResolveCtx<'_>) -> Option<Vec<usize>> {
        let inner = desc.children().first()?;
        match inner.kind() {
            AstKind::AllTasks => Some((0..ctx.task_count).collect()),
            AstKind::TaskIndex => {
                let v = fold(inner.children().first()?, ctx.bindings, &[])?;
                if v >= 0 && (v as usize) < ctx.task_count {
                    Some(vec![v as usize])
                } else {
                    Some(Vec::new())
                }
            }
            AstKind::TaskFilter => {
                let pred = inner.children().first()?;
                self.pred_set(inner.attr(), pred, ctx)
            }
            _ => None,
        }
    }

    /// The set of candidate tasks satisfying a predicate. And/Or combine
    /// whole sets (intersection / non-dedup union); leaf predicates filter
    /// the candidate range one task at a time.
    fn pred_set(&self, var: &str, pred: &AstNode, ctx: &ResolveCtx<'_>) -> Option<Vec<usize>> {
        match pred.kind() {
            AstKind::And => {
                let a = self.pred_set(var, &pred.children()[0], ctx)?;
                let b = self.pred_set(var, &pred.children()[1], ctx)?;
                Some(intersect_sets(a, b))
            }
            AstKind::Or => {
                let a = self.pred_set(var, &pred.children()[0], ctx)?;
                let b = self.pred_set(var, &pred.children()[1], ctx)?;
                Some(union_sets(a, b))
            }
            _ => {
                let mut out = Vec::new();
                for t in 0..ctx.task_count {
                    if self.pred_holds(var, t, pred, ctx)? {
                        out.push(t);
                    }
                }
                Some(out)
            }
        }
    }

    fn pred_holds(
        &self,
        var: &str,
        t: usize,
        pred: &AstNode,
        ctx: &ResolveCtx<'_>,
    ) -> Option<bool> {
        let locals = [(var, t as i64)];
        match pred.kind() {
            AstKind::Compare => {
                let l = fold(&pred.children()[0], ctx.bindings, &locals)?;
                let r = fold(&pred.children()[1], ctx.bindings, &locals)?;
                Some(match pred.attr() {
                    "<" => l < r,
                    ">" => l > r,
                    "<=" => l <= r,
                    ">=" => l >= r,
                    _ => l == r,
                })
            }
            AstKind::Parity => {
                let v = fold(&pred.children()[0], ctx.bindings, &locals)?;
                let even = v.rem_euclid(2) == 0;
                Some(if pred.attr() == "even" { even } else { !even })
            }
            AstKind::Membership => {
                let lhs = fold(&pred.children()[0], ctx.bindings, &locals)?;
                let mut found = false;
                for candidate in &pred.children()[1..] {
                    if fold(candidate, ctx.bindings, &locals)? == lhs {
                        found = true;
                    }
                }
                Some(found)
            }
            _ => None,
        }
    }
}

/// Constant-fold a scalar expression. Locals (the filter's bound variable)
/// shadow bindings; a let binding folds its own initializer against the
/// bindings outside it.
fn fold(node: &AstNode, bindings: &[Binding], locals: &[(&str, i64)]) -> Option<i64> {
    match node.kind() {
        AstKind::Number => node.attr().parse().ok(),
        AstKind::Ident => {
            if let Some((_, v)) = locals.iter().find(|(name, _)| *name == node.attr()) {
                return Some(*v);
            }
            let idx = bindings.iter().position(|b| b.name == node.attr())?;
            let value = bindings[idx].value.as_deref()?;
            let parsed = parse_scalar(value).ok()?;
            fold(&parsed, &bindings[idx + 1..], &[])
        }
        AstKind::BinOp => {
            let l = fold(&node.children()[0], bindings, locals)?;
            let r = fold(&node.children()[1], bindings, locals)?;
            match node.attr() {
                "+" => l.checked_add(r),
                "-" => l.checked_sub(r),
                "*" => l.checked_mul(r),
                "/" => l.checked_div(r),
                _ => None,
            }
        }
        _ => None,
    }
}

impl Evaluator for DescriptionEvaluator {
    fn resolve(&self, source: &str, target: Option<&str>, ctx: &ResolveCtx<'_>) -> Resolution {
        let Ok(source_ast) = parse_description(source) else {
            return Resolution::Unknown;
        };
        let Some(sources) = self.resolve_set(&source_ast, ctx) else {
            return Resolution::Unknown;
        };
        match target {
            None => Resolution::Pairs(
                sources
                    .into_iter()
                    .map(|s| SourceTarget::pair(s, s))
                    .collect(),
            ),
            Some(target) => {
                let Ok(target_ast) = parse_description(target) else {
                    return Resolution::Unknown;
                };
                let Some(targets) = self.resolve_set(&target_ast, ctx) else {
                    return Resolution::Unknown;
                };
                let mut pairs = Vec::with_capacity(sources.len() * targets.len());
                for &s in &sources {
                    for &t in &targets {
                        pairs.push(SourceTarget::pair(s, t));
                    }
                }
                Resolution::Pairs(pairs)
            }
        }
    }

    fn validate(&self, expr: &str, kind: ExprKind, scope: &[String]) -> Result<(), ExprError> {
        match kind {
            ExprKind::Scalar => {
                let node = parse_scalar(expr)?;
                check_scope(&node, scope)
            }
            ExprKind::Predicate => {
                let node = parse_predicate(expr)?;
                check_scope(&node, scope)
            }
            ExprKind::Description => {
                let node = parse_description(expr)?;
                let inner = &node.children()[0];
                match inner.kind() {
                    AstKind::AllTasks => Ok(()),
                    AstKind::TaskFilter => {
                        let mut inner_scope = scope.to_vec();
                        inner_scope.push(inner.attr().to_string());
                        check_scope(&inner.children()[0], &inner_scope)
                    }
                    _ => check_scope(inner, scope),
                }
            }
        }
    }
}

fn check_scope(node: &AstNode, scope: &[String]) -> Result<(), ExprError> {
    match first_out_of_scope(node, scope) {
        None => Ok(()),
        Some(name) => Err(ExprError::OutOfScope(name)),
    }
}
