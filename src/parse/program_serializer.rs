use crate::model::component::{BlockKind, Component, ComponentKind, Statement};
use crate::model::program::Program;
use crate::parse::words::word_form;

/// Serialize a whole program to canonical text.
pub fn serialize_program(program: &Program) -> String {
    let mut out = program_lines(program).join("\n");
    out.push('\n');
    out
}

/// Serialize a whole program to canonical lines.
pub fn program_lines(program: &Program) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "uses {} {}",
        program.task_count,
        word_form(&program.task_count.to_string(), "tasks")
    ));
    for (name, default) in &program.params {
        lines.push(format!(
            "{name} comes from the command line with default {default}"
        ));
    }

    let body = match &program.root.kind {
        ComponentKind::Block(b) => &b.children,
        ComponentKind::Statement(_) => return lines,
    };
    if !body.is_empty() {
        lines.push(String::new());
        for child in body {
            emit_component(child, 0, &mut lines);
        }
    }
    for comment in &program.trailing_comments {
        lines.push(comment.clone());
    }
    lines
}

/// Append one component's canonical lines at the given indent level.
fn emit_component(component: &Component, indent: usize, lines: &mut Vec<String>) {
    let pad = "  ".repeat(indent);
    for comment in &component.pre_comments {
        lines.push(format!("{pad}{comment}"));
    }

    match &component.kind {
        ComponentKind::Statement(stmt) => {
            lines.push(attach_comment(
                format!("{pad}{}", statement_line(stmt)),
                component.line_comment.as_deref(),
            ));
        }
        ComponentKind::Block(block) => {
            lines.push(attach_comment(
                format!("{pad}{}", block_header_line(&block.kind)),
                component.line_comment.as_deref(),
            ));
            for child in &block.children {
                emit_component(child, indent + 1, lines);
            }
            lines.push(format!("{pad}end {}", block.kind.end_word()));
        }
    }
}

fn attach_comment(line: String, comment: Option<&str>) -> String {
    match comment {
        Some(c) => format!("{line}  # {c}"),
        None => line,
    }
}

/// The canonical single-line text of a statement, without indent or
/// comments. Also used to seed the inline editor.
pub fn statement_line(stmt: &Statement) -> String {
    match stmt {
        Statement::Compute { group, duration } => {
            format!(
                "{} {} for {} {}",
                group.source(),
                word_form(group.source(), "computes"),
                duration,
                word_form(duration, "seconds")
            )
        }
        Statement::Send {
            group,
            size,
            alignment,
        } => {
            let mut line = format!(
                "{} {} {} {}",
                group.source(),
                word_form(group.source(), "sends"),
                size,
                word_form(size, "megabytes")
            );
            if let Some(target) = group.target() {
                line.push_str(&format!(" to {target}"));
            }
            if let Some(bytes) = alignment {
                line.push_str(&format!(
                    " aligned to {} {}",
                    bytes,
                    word_form(bytes, "bytes")
                ));
            }
            if let Some(awaited) = group.awaited() {
                line.push_str(&format!(" awaited by {awaited}"));
            }
            line
        }
        Statement::Reduce { group, size } => {
            let mut line = format!(
                "{} {} {} {}",
                group.source(),
                word_form(group.source(), "reduces"),
                size,
                word_form(size, "megabytes")
            );
            if let Some(target) = group.target() {
                line.push_str(&format!(" to {target}"));
            }
            line
        }
        Statement::Synchronize { group } => {
            format!(
                "{} {}",
                group.source(),
                word_form(group.source(), "synchronizes")
            )
        }
    }
}

/// The canonical header line of a block, without indent or comments.
pub fn block_header_line(kind: &BlockKind) -> String {
    match kind {
        BlockKind::Program => String::new(),
        BlockKind::For { var, from, to } => format!("for {var} = {from} to {to}"),
        BlockKind::If { condition } => format!("if {condition}"),
        BlockKind::Let { var, value } => format!("let {var} = {value}"),
        BlockKind::Sub { caption } => format!("block \"{caption}\""),
    }
}

/// Lines for a detached component (clipboard preview, tests).
pub fn component_lines(component: &Component) -> Vec<String> {
    let mut lines = Vec::new();
    emit_component(component, 0, &mut lines);
    lines
}
