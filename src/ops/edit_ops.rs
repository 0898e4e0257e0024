use crate::expr::eval::Evaluator;
use crate::model::component::{BlockKind, CompPath, Component, ComponentKind};
use crate::model::program::Program;
use crate::ops::check::validate_component;
use crate::ops::history::History;
use crate::ops::select_ops::{
    self, Rect, clear_selection, click_select, marquee_select, select_all,
};
use crate::parse::program_parser::{parse_block_header_text, parse_statement_text};

/// Error type for structural edit commands
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("no component at that position")]
    BadPath,
    #[error("the program root cannot be edited directly")]
    RootEdit,
    #[error("task count must be between 1 and {max}, got {count}")]
    BadTaskCount { count: usize, max: usize },
    #[error("nothing is selected")]
    EmptySelection,
    #[error("selection must be a contiguous run of siblings")]
    NotContiguous,
    #[error("{0}")]
    Invalid(String),
}

/// One edit, dispatched synchronously by the host UI. The core defines no
/// event loop; keys and mouse gestures are translated into these commands.
#[derive(Debug, Clone)]
pub enum EditCommand {
    /// Insert a new statement parsed from `text` at the sibling position
    /// addressed by `at`.
    InsertStatement { at: CompPath, text: String },
    /// Replace the statement or block header at `at` with a reparsed line.
    ApplyLine { at: CompPath, text: String },
    DeleteSelection,
    /// Deep-clone each selection root after itself.
    CloneSelection,
    /// Wrap a contiguous run of selected siblings in a new block.
    WrapSelection { kind: BlockKind },
    /// Replace the block at `at` with its children.
    Unwrap { at: CompPath },
    MoveUp { at: CompPath },
    MoveDown { at: CompPath },
    Resize { task_count: usize },
    ToggleSelect { at: CompPath, extend_same_kind: bool },
    SelectAll,
    ClearSelection,
    Marquee { rect: Rect },
}

/// Apply one command. Destructive commands validate first, then snapshot
/// via `history.push_state`, then mutate; a validation error leaves the
/// program and the history untouched. Selection commands are not
/// destructive and take no snapshot.
pub fn apply(
    program: &mut Program,
    history: &mut History,
    eval: &dyn Evaluator,
    max_tasks: usize,
    cmd: EditCommand,
) -> Result<(), EditError> {
    match cmd {
        EditCommand::ToggleSelect {
            at,
            extend_same_kind,
        } => {
            click_select(program, &at, extend_same_kind);
            Ok(())
        }
        EditCommand::SelectAll => {
            select_all(program);
            Ok(())
        }
        EditCommand::ClearSelection => {
            clear_selection(program);
            Ok(())
        }
        EditCommand::Marquee { rect } => {
            marquee_select(program, rect);
            Ok(())
        }
        EditCommand::InsertStatement { at, text } => insert_statement(program, history, eval, &at, &text),
        EditCommand::ApplyLine { at, text } => apply_line(program, history, eval, &at, &text),
        EditCommand::DeleteSelection => delete_selection(program, history),
        EditCommand::CloneSelection => clone_selection(program, history),
        EditCommand::WrapSelection { kind } => wrap_selection(program, history, eval, kind),
        EditCommand::Unwrap { at } => unwrap_block(program, history, &at),
        EditCommand::MoveUp { at } => move_by(program, history, &at, -1),
        EditCommand::MoveDown { at } => move_by(program, history, &at, 1),
        EditCommand::Resize { task_count } => resize(program, history, max_tasks, task_count),
    }
}

fn insert_statement(
    program: &mut Program,
    history: &mut History,
    eval: &dyn Evaluator,
    at: &[usize],
    text: &str,
) -> Result<(), EditError> {
    let Some((&index, parent_path)) = at.split_last() else {
        return Err(EditError::BadPath);
    };
    if program
        .get(parent_path)
        .and_then(|c| c.as_block())
        .is_none()
    {
        return Err(EditError::BadPath);
    }

    let stmt = parse_statement_text(text).map_err(EditError::Invalid)?;
    let component = Component::statement(stmt);
    let scope = program.scope_names_at(at);
    validate_component(&component, &scope, eval)
        .map_err(|(expr, err)| EditError::Invalid(format!("{expr}: {err}")))?;

    history.push_state(program);
    if let Some(parent) = program.get_mut(parent_path) {
        parent.insert_child(index, component);
    }
    Ok(())
}

fn apply_line(
    program: &mut Program,
    history: &mut History,
    eval: &dyn Evaluator,
    at: &[usize],
    text: &str,
) -> Result<(), EditError> {
    if at.is_empty() {
        return Err(EditError::RootEdit);
    }
    let target = program.get(at).ok_or(EditError::BadPath)?;
    let scope = program.scope_names_at(at);

    match &target.kind {
        ComponentKind::Statement(_) => {
            let stmt = parse_statement_text(text).map_err(EditError::Invalid)?;
            let candidate = Component::statement(stmt);
            validate_component(&candidate, &scope, eval)
                .map_err(|(expr, err)| EditError::Invalid(format!("{expr}: {err}")))?;

            history.push_state(program);
            if let (Some(component), ComponentKind::Statement(stmt)) =
                (program.get_mut(at), candidate.kind)
            {
                component.kind = ComponentKind::Statement(stmt);
            }
        }
        ComponentKind::Block(_) => {
            let kind = parse_block_header_text(text)
                .ok_or_else(|| EditError::Invalid(format!("`{text}` is not a block header")))?;
            let candidate = Component::block(kind.clone());
            validate_component(&candidate, &scope, eval)
                .map_err(|(expr, err)| EditError::Invalid(format!("{expr}: {err}")))?;

            history.push_state(program);
            if let Some(component) = program.get_mut(at) {
                if let ComponentKind::Block(block) = &mut component.kind {
                    block.kind = kind;
                }
                // The binder may have changed; descendants resolve afresh.
                component.invalidate_groups();
            }
        }
    }
    Ok(())
}

fn delete_selection(program: &mut Program, history: &mut History) -> Result<(), EditError> {
    let mut roots = nonroot_selection_roots(program);
    if roots.is_empty() {
        return Err(EditError::EmptySelection);
    }
    history.push_state(program);
    // Later siblings first so earlier indices stay valid.
    roots.sort();
    for path in roots.iter().rev() {
        if let Some((&index, parent_path)) = path.split_last()
            && let Some(parent) = program.get_mut(parent_path)
        {
            parent.remove_child(index);
        }
    }
    Ok(())
}

fn clone_selection(program: &mut Program, history: &mut History) -> Result<(), EditError> {
    let mut roots = nonroot_selection_roots(program);
    if roots.is_empty() {
        return Err(EditError::EmptySelection);
    }
    history.push_state(program);
    roots.sort();
    for path in roots.iter().rev() {
        let Some((&index, parent_path)) = path.split_last() else {
            continue;
        };
        let Some(original) = program.get(path) else {
            continue;
        };
        let mut copy = original.clone();
        copy.set_all_selected(false);
        clear_source_lines(&mut copy);
        if let Some(parent) = program.get_mut(parent_path) {
            parent.insert_child(index + 1, copy);
        }
    }
    Ok(())
}

fn wrap_selection(
    program: &mut Program,
    history: &mut History,
    eval: &dyn Evaluator,
    kind: BlockKind,
) -> Result<(), EditError> {
    let mut roots = nonroot_selection_roots(program);
    if roots.is_empty() {
        return Err(EditError::EmptySelection);
    }
    roots.sort();
    let (&first, parent_path) = roots[0].split_last().ok_or(EditError::BadPath)?;
    let contiguous = roots.iter().enumerate().all(|(offset, path)| {
        path.split_last()
            .is_some_and(|(&i, prefix)| prefix == parent_path && i == first + offset)
    });
    if !contiguous {
        return Err(EditError::NotContiguous);
    }

    let candidate = Component::block(kind.clone());
    let scope = program.scope_names_at(&roots[0]);
    validate_component(&candidate, &scope, eval)
        .map_err(|(expr, err)| EditError::Invalid(format!("{expr}: {err}")))?;

    history.push_state(program);
    let parent_path = parent_path.to_vec();
    if let Some(parent) = program.get_mut(&parent_path) {
        let mut wrapper = Component::block(kind);
        for _ in 0..roots.len() {
            if let Some(child) = parent.remove_child(first) {
                wrapper.add_child(child);
            }
        }
        // Binders introduced by the wrapper change what's in scope below.
        wrapper.invalidate_groups();
        parent.insert_child(first, wrapper);
    }
    Ok(())
}

fn unwrap_block(
    program: &mut Program,
    history: &mut History,
    at: &[usize],
) -> Result<(), EditError> {
    let Some((&index, parent_path)) = at.split_last() else {
        return Err(EditError::RootEdit);
    };
    match program.get(at) {
        Some(component) if component.as_block().is_some() => {}
        Some(_) => return Err(EditError::Invalid("only blocks can be unwrapped".into())),
        None => return Err(EditError::BadPath),
    }

    history.push_state(program);
    if let Some(parent) = program.get_mut(parent_path) {
        if let Some(removed) = parent.remove_child(index) {
            let pre_comments = removed.pre_comments;
            if let ComponentKind::Block(block) = removed.kind {
                let mut children = block.children;
                if let Some(head) = children.first_mut() {
                    let mut comments = pre_comments;
                    comments.extend(std::mem::take(&mut head.pre_comments));
                    head.pre_comments = comments;
                }
                for (offset, child) in children.into_iter().enumerate() {
                    parent.insert_child(index + offset, child);
                }
            }
        }
        // A binder may have been removed; descendants resolve afresh.
        parent.invalidate_groups();
    }
    Ok(())
}

fn move_by(
    program: &mut Program,
    history: &mut History,
    at: &[usize],
    delta: isize,
) -> Result<(), EditError> {
    let Some((&index, parent_path)) = at.split_last() else {
        return Err(EditError::RootEdit);
    };
    let sibling_count = program
        .get(parent_path)
        .map(|p| p.children().len())
        .ok_or(EditError::BadPath)?;
    if index >= sibling_count {
        return Err(EditError::BadPath);
    }
    let target = index as isize + delta;
    if target < 0 || target as usize >= sibling_count {
        return Ok(()); // already at the edge
    }

    history.push_state(program);
    if let Some(block) = program
        .get_mut(parent_path)
        .and_then(|p| p.as_block_mut())
    {
        block.children.swap(index, target as usize);
    }
    Ok(())
}

fn resize(
    program: &mut Program,
    history: &mut History,
    max_tasks: usize,
    task_count: usize,
) -> Result<(), EditError> {
    if task_count == 0 || task_count > max_tasks {
        return Err(EditError::BadTaskCount {
            count: task_count,
            max: max_tasks,
        });
    }
    if task_count == program.task_count {
        return Ok(());
    }
    history.push_state(program);
    program.resize(task_count);
    Ok(())
}

/// Selection roots, excluding the program root itself.
fn nonroot_selection_roots(program: &Program) -> Vec<CompPath> {
    select_ops::selection_roots(program)
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect()
}

/// Clones are synthesized in-editor; they carry no source lines.
fn clear_source_lines(component: &mut Component) {
    component.source_line = None;
    if let ComponentKind::Block(block) = &mut component.kind {
        for child in &mut block.children {
            clear_source_lines(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::eval::DescriptionEvaluator;
    use crate::parse::program_parser::parse_program;
    use crate::parse::program_serializer::serialize_program;

    const MAX: usize = 512;

    fn setup(text: &str) -> (Program, History, DescriptionEvaluator) {
        let (program, issues) = parse_program(text);
        assert!(issues.is_empty(), "{issues:?}");
        (program, History::new(), DescriptionEvaluator::new())
    }

    fn sample() -> (Program, History, DescriptionEvaluator) {
        setup(
            "uses 4 tasks\n\nall tasks compute for 2 seconds\ntask 0 sends 1 megabyte to task 1\nall tasks synchronize\n",
        )
    }

    #[test]
    fn insert_statement_at_position() {
        let (mut program, mut history, eval) = sample();
        apply(
            &mut program,
            &mut history,
            &eval,
            MAX,
            EditCommand::InsertStatement {
                at: vec![1],
                text: "all tasks reduce 1 megabyte to task 0".into(),
            },
        )
        .unwrap();
        assert_eq!(program.root.children().len(), 4);
        assert_eq!(program.get(&[1]).unwrap().kind_name(), "reduce");
        assert!(history.can_undo());
    }

    #[test]
    fn invalid_insert_leaves_everything_untouched() {
        let (mut program, mut history, eval) = sample();
        let before = program.clone();
        let err = apply(
            &mut program,
            &mut history,
            &eval,
            MAX,
            EditCommand::InsertStatement {
                at: vec![0],
                text: "task q computes for 1 second".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, EditError::Invalid(_)));
        assert_eq!(program, before);
        assert!(!history.can_undo());
    }

    #[test]
    fn delete_selection_then_undo_restores() {
        let (mut program, mut history, eval) = sample();
        let before = program.clone();
        click_select(&mut program, &[1], false);
        apply(&mut program, &mut history, &eval, MAX, EditCommand::DeleteSelection).unwrap();
        assert_eq!(program.root.children().len(), 2);

        assert!(history.undo(&mut program));
        // The snapshot was taken after selection, before deletion.
        let mut restored = before;
        click_select(&mut restored, &[1], false);
        assert_eq!(program, restored);
    }

    #[test]
    fn delete_with_nothing_selected_errors() {
        let (mut program, mut history, eval) = sample();
        let err =
            apply(&mut program, &mut history, &eval, MAX, EditCommand::DeleteSelection).unwrap_err();
        assert!(matches!(err, EditError::EmptySelection));
    }

    #[test]
    fn clone_inserts_deselected_copy_after_original() {
        let (mut program, mut history, eval) = sample();
        click_select(&mut program, &[0], false);
        apply(&mut program, &mut history, &eval, MAX, EditCommand::CloneSelection).unwrap();
        assert_eq!(program.root.children().len(), 4);
        let copy = program.get(&[1]).unwrap();
        assert_eq!(copy.kind_name(), "compute");
        assert!(!copy.selected);
        assert_eq!(copy.source_line, None);
        // Fresh sibling id, not a duplicate of the original's.
        let ids: Vec<u32> = program.root.children().iter().map(|c| c.id).collect();
        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(ids, deduped);
    }

    #[test]
    fn wrap_contiguous_selection_in_loop() {
        let (mut program, mut history, eval) = sample();
        program.get_mut(&[0]).unwrap().selected = true;
        program.get_mut(&[1]).unwrap().selected = true;

        apply(
            &mut program,
            &mut history,
            &eval,
            MAX,
            EditCommand::WrapSelection {
                kind: BlockKind::For {
                    var: "i".into(),
                    from: "1".into(),
                    to: "4".into(),
                },
            },
        )
        .unwrap();

        assert_eq!(program.root.children().len(), 2);
        let wrapper = program.get(&[0]).unwrap();
        assert_eq!(wrapper.children().len(), 2);
        assert_eq!(program.get(&[0, 0]).unwrap().kind_name(), "compute");
        assert_eq!(program.get(&[0, 1]).unwrap().kind_name(), "send");
    }

    #[test]
    fn wrap_noncontiguous_selection_errors() {
        let (mut program, mut history, eval) = sample();
        program.get_mut(&[0]).unwrap().selected = true;
        program.get_mut(&[2]).unwrap().selected = true;
        let err = apply(
            &mut program,
            &mut history,
            &eval,
            MAX,
            EditCommand::WrapSelection {
                kind: BlockKind::Sub {
                    caption: "phase".into(),
                },
            },
        )
        .unwrap_err();
        assert!(matches!(err, EditError::NotContiguous));
        assert!(!history.can_undo());
    }

    #[test]
    fn wrap_with_bad_bounds_errors() {
        let (mut program, mut history, eval) = sample();
        program.get_mut(&[0]).unwrap().selected = true;
        let err = apply(
            &mut program,
            &mut history,
            &eval,
            MAX,
            EditCommand::WrapSelection {
                kind: BlockKind::For {
                    var: "i".into(),
                    from: "1".into(),
                    to: "q".into(),
                },
            },
        )
        .unwrap_err();
        assert!(matches!(err, EditError::Invalid(_)));
    }

    #[test]
    fn unwrap_splices_children_in_place() {
        let (mut program, mut history, eval) = setup(
            "uses 4 tasks\n\nall tasks synchronize\nfor i = 1 to 4\n  all tasks compute for 1 second\n  all tasks synchronize\nend for\ntask 0 sends 1 megabyte to task 1\n",
        );
        apply(
            &mut program,
            &mut history,
            &eval,
            MAX,
            EditCommand::Unwrap { at: vec![1] },
        )
        .unwrap();
        let kinds: Vec<_> = program
            .root
            .children()
            .iter()
            .map(|c| c.kind_name())
            .collect();
        assert_eq!(kinds, vec!["synchronize", "compute", "synchronize", "send"]);
    }

    #[test]
    fn wrap_then_resolution_sees_new_binder() {
        // Wrapping `task x ...` in `let x = 2` turns an out-of-scope
        // statement into a statically resolvable one after invalidation.
        let (mut program, mut history, eval) = setup(
            "uses 4 tasks\nx comes from the command line with default 0\n\ntask x computes for 1 second\n",
        );
        program.get_mut(&[0]).unwrap().selected = true;
        apply(
            &mut program,
            &mut history,
            &eval,
            MAX,
            EditCommand::WrapSelection {
                kind: BlockKind::Let {
                    var: "x".into(),
                    value: "2".into(),
                },
            },
        )
        .unwrap();

        let bindings = program.scope_at(&[0, 0]);
        let ctx = crate::expr::eval::ResolveCtx {
            task_count: program.task_count,
            bindings: &bindings,
        };
        let stmt = program
            .get_mut(&[0, 0])
            .unwrap()
            .as_statement_mut()
            .unwrap();
        let pairs = stmt.group_mut().enumerate(&eval, &ctx);
        assert_eq!(pairs.len(), 1);
        assert!(!pairs[0].unknown);
        assert_eq!(pairs[0].source, 2);
    }

    #[test]
    fn move_up_and_down_swap_siblings() {
        let (mut program, mut history, eval) = sample();
        apply(
            &mut program,
            &mut history,
            &eval,
            MAX,
            EditCommand::MoveDown { at: vec![0] },
        )
        .unwrap();
        let kinds: Vec<_> = program
            .root
            .children()
            .iter()
            .map(|c| c.kind_name())
            .collect();
        assert_eq!(kinds, vec!["send", "compute", "synchronize"]);

        apply(
            &mut program,
            &mut history,
            &eval,
            MAX,
            EditCommand::MoveUp { at: vec![1] },
        )
        .unwrap();
        let kinds: Vec<_> = program
            .root
            .children()
            .iter()
            .map(|c| c.kind_name())
            .collect();
        assert_eq!(kinds, vec!["compute", "send", "synchronize"]);
    }

    #[test]
    fn move_at_edge_is_a_quiet_noop() {
        let (mut program, mut history, eval) = sample();
        apply(
            &mut program,
            &mut history,
            &eval,
            MAX,
            EditCommand::MoveUp { at: vec![0] },
        )
        .unwrap();
        assert!(!history.can_undo());
    }

    #[test]
    fn resize_bounds_checked() {
        let (mut program, mut history, eval) = sample();
        let err = apply(
            &mut program,
            &mut history,
            &eval,
            MAX,
            EditCommand::Resize { task_count: 0 },
        )
        .unwrap_err();
        assert!(matches!(err, EditError::BadTaskCount { .. }));

        apply(
            &mut program,
            &mut history,
            &eval,
            MAX,
            EditCommand::Resize { task_count: 8 },
        )
        .unwrap();
        assert_eq!(program.task_count, 8);
    }

    #[test]
    fn apply_line_replaces_statement_in_place() {
        let (mut program, mut history, eval) = sample();
        let id_before = program.get(&[0]).unwrap().id;
        apply(
            &mut program,
            &mut history,
            &eval,
            MAX,
            EditCommand::ApplyLine {
                at: vec![0],
                text: "task 2 computes for 5 seconds".into(),
            },
        )
        .unwrap();
        let component = program.get(&[0]).unwrap();
        assert_eq!(component.id, id_before);
        let stmt = component.as_statement().unwrap();
        assert_eq!(stmt.group().source(), "task 2");
    }

    #[test]
    fn apply_line_on_block_header_keeps_children() {
        let (mut program, mut history, eval) = setup(
            "uses 4 tasks\n\nfor i = 1 to 4\n  task i computes for 1 second\nend for\n",
        );
        apply(
            &mut program,
            &mut history,
            &eval,
            MAX,
            EditCommand::ApplyLine {
                at: vec![0],
                text: "for i = 1 to 8".into(),
            },
        )
        .unwrap();
        assert_eq!(program.get(&[0, 0]).unwrap().kind_name(), "compute");
        let text = serialize_program(&program);
        assert!(text.contains("for i = 1 to 8"));
    }

    #[test]
    fn selection_commands_take_no_snapshot() {
        let (mut program, mut history, eval) = sample();
        apply(&mut program, &mut history, &eval, MAX, EditCommand::SelectAll).unwrap();
        apply(
            &mut program,
            &mut history,
            &eval,
            MAX,
            EditCommand::Marquee {
                rect: Rect::new(0, 0, 10, 10),
            },
        )
        .unwrap();
        apply(&mut program, &mut history, &eval, MAX, EditCommand::ClearSelection).unwrap();
        assert!(!history.can_undo());
    }
}
