use crate::model::component::{CompPath, Component, ComponentKind};
use crate::model::program::Program;
use crate::parse::program_serializer::{block_header_line, statement_line};
use crate::util::unicode::display_width;

/// A rectangle in body-view cell coordinates (half-open extents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// The rectangle spanned by two drag endpoints (inclusive cells).
    pub fn from_corners(x0: u16, y0: u16, x1: u16, y1: u16) -> Self {
        let (left, right) = (x0.min(x1), x0.max(x1));
        let (top, bottom) = (y0.min(y1), y0.max(y1));
        Rect {
            x: left,
            y: top,
            width: right - left + 1,
            height: bottom - top + 1,
        }
    }

    /// The bottom-right cell of this rectangle.
    pub fn corner(&self) -> (u16, u16) {
        (
            self.x + self.width.saturating_sub(1),
            self.y + self.height.saturating_sub(1),
        )
    }
}

/// The sufficiently-contained test: a component is caught by a marquee
/// when its bottom-right corner lies strictly inside the marquee — not on
/// the marquee's own frame. Full containment is not required.
pub fn corner_strictly_inside(bounds: &Rect, marquee: &Rect) -> bool {
    let (cx, cy) = bounds.corner();
    let (cx, cy) = (cx as u32, cy as u32);
    let (mx, my) = (marquee.x as u32, marquee.y as u32);
    let (mr, mb) = (
        mx + marquee.width as u32,
        my + marquee.height as u32,
    );
    cx > mx && cx < mr && cy > my && cy < mb
}

/// Global bounds for every component, in tree order. Rows cover the body
/// view: pre-attached comment lines advance the row counter but sit outside
/// the component's own bounds; a block spans its header, children, and end
/// line.
pub fn layout_program(program: &Program) -> Vec<(CompPath, Rect)> {
    let mut out = Vec::new();
    let mut row = 0u16;
    for (i, child) in program.root.children().iter().enumerate() {
        layout_component(child, &[i], 0, &mut row, &mut out);
    }
    out
}

fn layout_component(
    component: &Component,
    path: &[usize],
    depth: u16,
    row: &mut u16,
    out: &mut Vec<(CompPath, Rect)>,
) -> Rect {
    *row += component.pre_comments.len() as u16;
    let x = depth * 2;
    let top = *row;

    let rect = match &component.kind {
        ComponentKind::Statement(stmt) => {
            let width = display_width(&statement_line(stmt)) as u16;
            *row += 1;
            Rect::new(x, top, width.max(1), 1)
        }
        ComponentKind::Block(block) => {
            let header_width = display_width(&block_header_line(&block.kind)) as u16;
            let mut right = x + header_width.max(1);
            *row += 1;
            // Reserve our slot; children land after it in `out`.
            let slot = out.len();
            out.push((path.to_vec(), Rect::default()));
            for (i, child) in block.children.iter().enumerate() {
                let mut child_path = path.to_vec();
                child_path.push(i);
                let child_rect = layout_component(child, &child_path, depth + 1, row, out);
                right = right.max(child_rect.x + child_rect.width);
            }
            let end_width = display_width(&format!("end {}", block.kind.end_word())) as u16;
            right = right.max(x + end_width);
            *row += 1;
            let rect = Rect::new(x, top, right - x, *row - top);
            out[slot].1 = rect;
            return rect;
        }
    };
    out.push((path.to_vec(), rect));
    rect
}

/// Click policy: toggle the clicked component. A plain click clears every
/// other selection; a modified click keeps selections of the same
/// statement kind and clears the rest.
pub fn click_select(program: &mut Program, path: &[usize], extend_same_kind: bool) {
    let Some(clicked) = program.get(path) else {
        return;
    };
    let kind = clicked.kind_name();
    apply_click(&mut program.root, &mut Vec::new(), path, extend_same_kind, kind);
}

fn apply_click(
    node: &mut Component,
    cur: &mut CompPath,
    target: &[usize],
    extend: bool,
    kind: &str,
) {
    if cur.as_slice() == target {
        node.selected = !node.selected;
    } else if !extend || node.kind_name() != kind {
        node.selected = false;
    }
    if let ComponentKind::Block(block) = &mut node.kind {
        for (i, child) in block.children.iter_mut().enumerate() {
            cur.push(i);
            apply_click(child, cur, target, extend, kind);
            cur.pop();
        }
    }
}

/// Marquee policy: selection is replaced by the set of components whose
/// bounds pass the corner test.
pub fn marquee_select(program: &mut Program, marquee: Rect) {
    let layout = layout_program(program);
    program.root.selected = false;
    for (path, bounds) in layout {
        let hit = corner_strictly_inside(&bounds, &marquee);
        if let Some(component) = program.get_mut(&path) {
            component.selected = hit;
        }
    }
}

/// Paths of all selected components, tree order, self before children.
pub fn selected_paths(program: &Program) -> Vec<CompPath> {
    let mut acc = Vec::new();
    program.root.collect_selected(&[], &mut acc);
    acc
}

/// Selected paths with no selected ancestor (the roots of the selection).
pub fn selection_roots(program: &Program) -> Vec<CompPath> {
    let all = selected_paths(program);
    all.iter()
        .filter(|path| {
            !all.iter()
                .any(|other| other.len() < path.len() && path.starts_with(other))
        })
        .cloned()
        .collect()
}

pub fn select_all(program: &mut Program) {
    program.root.set_all_selected(true);
}

pub fn clear_selection(program: &mut Program) {
    program.root.set_all_selected(false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::component::{BlockKind, Statement};
    use crate::model::taskgroup::TaskGroup;

    fn compute(desc: &str) -> Component {
        Component::statement(Statement::Compute {
            group: TaskGroup::new(desc),
            duration: "1".into(),
        })
    }

    fn sync() -> Component {
        Component::statement(Statement::Synchronize {
            group: TaskGroup::new("all tasks"),
        })
    }

    /// uses 4 tasks; compute; for-block [compute, sync]; sync
    fn sample_program() -> Program {
        let mut program = Program::new(4);
        program.root.add_child(compute("all tasks"));
        let mut f = Component::block(BlockKind::For {
            var: "i".into(),
            from: "1".into(),
            to: "4".into(),
        });
        f.add_child(compute("task i"));
        f.add_child(sync());
        program.root.add_child(f);
        program.root.add_child(sync());
        program
    }

    #[test]
    fn set_then_collect_orders_self_before_children() {
        let mut program = sample_program();
        program.get_mut(&[1]).unwrap().set_all_selected(true);
        let paths = selected_paths(&program);
        assert_eq!(paths, vec![vec![1], vec![1, 0], vec![1, 1]]);
    }

    #[test]
    fn plain_click_is_exclusive() {
        let mut program = sample_program();
        click_select(&mut program, &[0], false);
        assert!(program.get(&[0]).unwrap().selected);

        click_select(&mut program, &[2], false);
        assert!(!program.get(&[0]).unwrap().selected);
        assert!(program.get(&[2]).unwrap().selected);
    }

    #[test]
    fn plain_click_toggles_off() {
        let mut program = sample_program();
        click_select(&mut program, &[0], false);
        click_select(&mut program, &[0], false);
        assert!(!program.get(&[0]).unwrap().selected);
    }

    #[test]
    fn extend_click_keeps_same_kind_only() {
        let mut program = sample_program();
        // Select the top-level compute, then extend-click the nested one.
        click_select(&mut program, &[0], false);
        click_select(&mut program, &[1, 0], true);
        assert!(program.get(&[0]).unwrap().selected);
        assert!(program.get(&[1, 0]).unwrap().selected);

        // Extend-clicking a synchronize drops the computes.
        click_select(&mut program, &[2], true);
        assert!(!program.get(&[0]).unwrap().selected);
        assert!(!program.get(&[1, 0]).unwrap().selected);
        assert!(program.get(&[2]).unwrap().selected);
    }

    #[test]
    fn layout_rows_follow_tree_order() {
        let program = sample_program();
        let layout = layout_program(&program);
        let rows: Vec<(CompPath, u16, u16)> = layout
            .iter()
            .map(|(p, r)| (p.clone(), r.y, r.height))
            .collect();
        // compute row 0; for spans rows 1..=4; children rows 2 and 3; sync row 5
        assert_eq!(rows[0], (vec![0], 0, 1));
        assert_eq!(rows[1], (vec![1], 1, 4));
        assert_eq!(rows[2], (vec![1, 0], 2, 1));
        assert_eq!(rows[3], (vec![1, 1], 3, 1));
        assert_eq!(rows[4], (vec![2], 5, 1));
    }

    #[test]
    fn layout_indents_nested_components() {
        let program = sample_program();
        let layout = layout_program(&program);
        let nested = layout.iter().find(|(p, _)| p == &vec![1, 0]).unwrap();
        assert_eq!(nested.1.x, 2);
    }

    #[test]
    fn pre_comments_shift_rows_but_not_bounds() {
        let mut program = sample_program();
        program.get_mut(&[0]).unwrap().pre_comments = vec!["# setup".into()];
        let layout = layout_program(&program);
        assert_eq!(layout[0].1.y, 1);
    }

    #[test]
    fn marquee_selects_by_corner_test() {
        let mut program = sample_program();
        // Rows: 0 compute, 1 for-header, 2 `task i computes...`,
        // 3 `all tasks synchronize`, 4 end for, 5 sync.
        // Height 4 puts rows 1..3 strictly inside; the for-block's own
        // corner sits on row 4, outside.
        marquee_select(&mut program, Rect::new(0, 0, 60, 4));
        assert!(program.get(&[1, 0]).unwrap().selected);
        assert!(program.get(&[1, 1]).unwrap().selected);
        assert!(!program.get(&[1]).unwrap().selected);
        // Row 0's corner lies on the marquee frame, not strictly inside.
        assert!(!program.get(&[0]).unwrap().selected);
        assert!(!program.get(&[2]).unwrap().selected);
    }

    #[test]
    fn marquee_ignores_partial_overlap_with_corner_outside() {
        let mut program = sample_program();
        // Covers the left edge of the nested rows only; bottom-right
        // corners lie to the right of it, so the overlap selects nothing.
        marquee_select(&mut program, Rect::new(0, 0, 10, 4));
        assert!(!program.get(&[1, 0]).unwrap().selected);
        assert!(!program.get(&[1, 1]).unwrap().selected);
    }

    #[test]
    fn marquee_replaces_previous_selection() {
        let mut program = sample_program();
        select_all(&mut program);
        marquee_select(&mut program, Rect::new(0, 0, 1, 1));
        assert!(selected_paths(&program).is_empty());
    }

    #[test]
    fn corner_on_marquee_frame_is_not_inside() {
        let bounds = Rect::new(0, 0, 3, 1); // corner cell (2, 0)
        assert!(!corner_strictly_inside(&bounds, &Rect::new(2, 0, 5, 5)));
        assert!(!corner_strictly_inside(&bounds, &Rect::new(0, 0, 5, 5)));
        // strictly inside needs the corner past the marquee's frame
        assert!(corner_strictly_inside(
            &Rect::new(2, 2, 2, 2),
            &Rect::new(0, 0, 8, 8)
        ));
    }

    #[test]
    fn selection_roots_drop_nested_selected() {
        let mut program = sample_program();
        program.get_mut(&[1]).unwrap().set_all_selected(true);
        assert_eq!(selection_roots(&program), vec![vec![1]]);
    }
}
