use crate::expr::eval::{Evaluator, Resolution, ResolveCtx};

/// A resolved (source task, target task) index pair.
///
/// `unknown` marks a group whose membership cannot be statically enumerated
/// (e.g. it depends on a loop variable). An unknown pair carries no real
/// indices; consumers must check the flag before iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceTarget {
    pub source: usize,
    pub target: usize,
    pub unknown: bool,
}

impl SourceTarget {
    pub fn pair(source: usize, target: usize) -> Self {
        SourceTarget {
            source,
            target,
            unknown: false,
        }
    }

    /// The synthetic pair standing in for a non-enumerable group.
    pub fn not_static() -> Self {
        SourceTarget {
            source: 0,
            target: 0,
            unknown: true,
        }
    }
}

/// A task group: a source expression, an optional target expression, an
/// optional awaited expression, and a lazily computed resolution cache.
///
/// The cache is either absent or exactly reflects the current expression
/// strings and task count. Every setter drops it; `resize` drops it; nothing
/// else touches it.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskGroup {
    source: String,
    target: Option<String>,
    awaited: Option<String>,
    cache: Option<Vec<SourceTarget>>,
}

impl TaskGroup {
    pub fn new(source: impl Into<String>) -> Self {
        TaskGroup {
            source: source.into(),
            target: None,
            awaited: None,
            cache: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_awaited(mut self, awaited: impl Into<String>) -> Self {
        self.awaited = Some(awaited.into());
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn awaited(&self) -> Option<&str> {
        self.awaited.as_deref()
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
        self.cache = None;
    }

    pub fn set_target(&mut self, target: Option<String>) {
        self.target = target;
        self.cache = None;
    }

    pub fn set_awaited(&mut self, awaited: Option<String>) {
        self.awaited = awaited;
        self.cache = None;
    }

    /// Whether the cache is currently populated.
    pub fn is_resolved(&self) -> bool {
        self.cache.is_some()
    }

    /// Drop the cache. Must be called on every group in the tree whenever
    /// the total task count changes, before the next `enumerate`.
    pub fn resize(&mut self) {
        self.cache = None;
    }

    /// Resolve the group into participation pairs, memoized.
    ///
    /// The awaited expression, when present, is resolved independently and
    /// concatenated onto the result without deduplication. If any part is
    /// not statically resolvable the whole group collapses to a single
    /// unknown pair.
    pub fn enumerate(&mut self, eval: &dyn Evaluator, ctx: &ResolveCtx<'_>) -> &[SourceTarget] {
        if self.cache.is_none() {
            self.cache = Some(self.compute(eval, ctx));
        }
        self.cache.as_deref().unwrap_or(&[])
    }

    fn compute(&self, eval: &dyn Evaluator, ctx: &ResolveCtx<'_>) -> Vec<SourceTarget> {
        let mut pairs = match eval.resolve(&self.source, self.target.as_deref(), ctx) {
            Resolution::Pairs(p) => p,
            Resolution::Unknown => return vec![SourceTarget::not_static()],
        };
        if let Some(awaited) = &self.awaited {
            match eval.resolve(awaited, None, ctx) {
                Resolution::Pairs(mut extra) => pairs.append(&mut extra),
                Resolution::Unknown => return vec![SourceTarget::not_static()],
            }
        }
        pairs
    }

    /// Resolve only the source expression, ignoring target and awaited.
    /// Used by reduction rows whose targets are resolved independently.
    /// Not cached.
    pub fn enumerate_ignoring_targets(
        &self,
        eval: &dyn Evaluator,
        ctx: &ResolveCtx<'_>,
    ) -> Vec<SourceTarget> {
        match eval.resolve(&self.source, None, ctx) {
            Resolution::Pairs(p) => p,
            Resolution::Unknown => vec![SourceTarget::not_static()],
        }
    }

    /// Resolve the target expression as if it were itself a source-task
    /// expression. Used when the target role is semantically a worker set.
    /// Returns empty when no target expression is set. Not cached.
    pub fn enumerate_targets_as_sources(
        &self,
        eval: &dyn Evaluator,
        ctx: &ResolveCtx<'_>,
    ) -> Vec<SourceTarget> {
        let Some(target) = &self.target else {
            return Vec::new();
        };
        match eval.resolve(target, None, ctx) {
            Resolution::Pairs(p) => p,
            Resolution::Unknown => vec![SourceTarget::not_static()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Evaluator double that counts resolve calls and serves canned results.
    struct Canned {
        pairs: Option<Vec<SourceTarget>>,
        calls: Cell<u32>,
    }

    impl Canned {
        fn pairs(pairs: Vec<SourceTarget>) -> Self {
            Canned {
                pairs: Some(pairs),
                calls: Cell::new(0),
            }
        }

        fn unknown() -> Self {
            Canned {
                pairs: None,
                calls: Cell::new(0),
            }
        }
    }

    impl Evaluator for Canned {
        fn resolve(
            &self,
            _source: &str,
            _target: Option<&str>,
            _ctx: &ResolveCtx<'_>,
        ) -> Resolution {
            self.calls.set(self.calls.get() + 1);
            match &self.pairs {
                Some(p) => Resolution::Pairs(p.clone()),
                None => Resolution::Unknown,
            }
        }

        fn validate(
            &self,
            _expr: &str,
            _kind: crate::expr::eval::ExprKind,
            _scope: &[String],
        ) -> Result<(), crate::expr::eval::ExprError> {
            Ok(())
        }
    }

    fn ctx() -> ResolveCtx<'static> {
        ResolveCtx {
            task_count: 4,
            bindings: &[],
        }
    }

    #[test]
    fn enumerate_is_memoized() {
        let eval = Canned::pairs(vec![SourceTarget::pair(0, 1)]);
        let mut group = TaskGroup::new("task 0").with_target("task 1");

        let first = group.enumerate(&eval, &ctx()).to_vec();
        let second = group.enumerate(&eval, &ctx()).to_vec();
        assert_eq!(first, second);
        assert_eq!(eval.calls.get(), 1);
    }

    #[test]
    fn resize_forces_recompute() {
        let eval = Canned::pairs(vec![SourceTarget::pair(0, 1)]);
        let mut group = TaskGroup::new("task 0");

        group.enumerate(&eval, &ctx());
        group.resize();
        assert!(!group.is_resolved());
        group.enumerate(&eval, &ctx());
        assert_eq!(eval.calls.get(), 2);
    }

    #[test]
    fn setters_drop_cache() {
        let eval = Canned::pairs(vec![SourceTarget::pair(0, 0)]);
        let mut group = TaskGroup::new("task 0");
        group.enumerate(&eval, &ctx());
        assert!(group.is_resolved());

        group.set_source("task 1");
        assert!(!group.is_resolved());

        group.enumerate(&eval, &ctx());
        group.set_target(Some("task 2".into()));
        assert!(!group.is_resolved());

        group.enumerate(&eval, &ctx());
        group.set_awaited(Some("task 3".into()));
        assert!(!group.is_resolved());
    }

    #[test]
    fn unknown_yields_exactly_one_sentinel() {
        let eval = Canned::unknown();
        let mut group = TaskGroup::new("task i");
        let pairs = group.enumerate(&eval, &ctx());
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].unknown);
    }

    #[test]
    fn awaited_concatenates_without_dedup() {
        let eval = Canned::pairs(vec![SourceTarget::pair(0, 0)]);
        let mut group = TaskGroup::new("task 0").with_awaited("task 0");
        // Both the main resolve and the awaited resolve return (0, 0);
        // the merge keeps the duplicate.
        let pairs = group.enumerate(&eval, &ctx());
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], pairs[1]);
    }

    #[test]
    fn ignoring_targets_does_not_populate_cache() {
        let eval = Canned::pairs(vec![SourceTarget::pair(2, 2)]);
        let group = TaskGroup::new("task 2").with_target("task 0");
        let pairs = group.enumerate_ignoring_targets(&eval, &ctx());
        assert_eq!(pairs, vec![SourceTarget::pair(2, 2)]);
        assert!(!group.is_resolved());
    }

    #[test]
    fn targets_as_sources_empty_without_target() {
        let eval = Canned::pairs(vec![SourceTarget::pair(1, 1)]);
        let group = TaskGroup::new("all tasks");
        assert!(group.enumerate_targets_as_sources(&eval, &ctx()).is_empty());
    }
}
