use std::sync::LazyLock;

use regex::Regex;

use crate::model::component::{BlockKind, Component, Statement};
use crate::model::program::Program;
use crate::model::taskgroup::TaskGroup;

/// A line the parser could not fully accept. Parsing never fails outright;
/// problems are collected and the rest of the file is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    /// 1-based line number for display.
    pub line: usize,
    /// The offending line text.
    pub text: String,
    pub message: String,
}

static USES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^uses\s+(\d+)\s+tasks?$").unwrap());
static COMES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_]\w*)\s+comes\s+from\s+the\s+command\s+line\s+with\s+default\s+(.+)$")
        .unwrap()
});
static FOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^for\s+([A-Za-z_]\w*)\s*=\s*(.+?)\s+to\s+(.+)$").unwrap());
static IF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^if\s+(.+)$").unwrap());
static LET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^let\s+([A-Za-z_]\w*)\s*=\s*(.+)$").unwrap());
static BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^block\s+"([^"]*)"$"#).unwrap());
static END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^end\s+(for|if|let|block)$").unwrap());
static VERB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(computes?|sends?|reduces?|synchronizes?)\b").unwrap());
static COMPUTE_REST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^for\s+(.+?)\s+seconds?$").unwrap());
static PAYLOAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s+megabytes?\s+to\s+(.+)$").unwrap());
static ALIGN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+?)\s+bytes?$").unwrap());

/// Parse program text into a tree. Lenient: malformed lines become issues,
/// unclosed blocks are closed at end of file.
pub fn parse_program(text: &str) -> (Program, Vec<ParseIssue>) {
    let mut program = Program::new(1);
    let mut issues = Vec::new();
    let mut saw_header = false;
    let mut pending_comments: Vec<String> = Vec::new();
    // Open blocks, outermost first. Components attach to the innermost
    // open block, or to the program root when none is open.
    let mut stack: Vec<Component> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('#') {
            pending_comments.push(trimmed.to_string());
            continue;
        }

        let (content, line_comment) = split_line_comment(trimmed);

        if let Some(caps) = USES_RE.captures(content) {
            if saw_header {
                issues.push(issue(line_no, raw, "duplicate `uses` header"));
            } else if let Ok(count) = caps[1].parse() {
                program.task_count = count;
                saw_header = true;
            }
            continue;
        }

        if let Some(caps) = COMES_RE.captures(content) {
            let name = caps[1].to_string();
            let default = caps[2].trim().to_string();
            if program.params.contains_key(&name) {
                issues.push(issue(
                    line_no,
                    raw,
                    &format!("duplicate comes-from declaration for `{name}`"),
                ));
            } else {
                program.params.insert(name, default);
            }
            continue;
        }

        if let Some(caps) = END_RE.captures(content) {
            match stack.pop() {
                Some(top) => {
                    let expected = top
                        .as_block()
                        .map(|b| b.kind.end_word())
                        .unwrap_or("block");
                    if expected != &caps[1] {
                        issues.push(issue(
                            line_no,
                            raw,
                            &format!("expected `end {expected}`, found `end {}`", &caps[1]),
                        ));
                    }
                    attach(top, &mut stack, &mut program);
                }
                None => issues.push(issue(line_no, raw, "`end` with no open block")),
            }
            continue;
        }

        if let Some(kind) = parse_block_header_text(content) {
            let mut component = Component::block(kind);
            component.pre_comments = std::mem::take(&mut pending_comments);
            component.line_comment = line_comment;
            component.source_line = Some(idx);
            stack.push(component);
            continue;
        }

        match parse_statement_text(content) {
            Ok(stmt) => {
                let mut component = Component::statement(stmt);
                component.pre_comments = std::mem::take(&mut pending_comments);
                component.line_comment = line_comment;
                component.source_line = Some(idx);
                attach(component, &mut stack, &mut program);
            }
            Err(message) => issues.push(issue(line_no, raw, &message)),
        }
    }

    while let Some(top) = stack.pop() {
        let word = top
            .as_block()
            .map(|b| b.kind.end_word())
            .unwrap_or("block");
        issues.push(ParseIssue {
            line: top.source_line.map_or(0, |l| l + 1),
            text: String::new(),
            message: format!("unclosed `{word}` block"),
        });
        attach(top, &mut stack, &mut program);
    }

    if !saw_header {
        issues.push(ParseIssue {
            line: 1,
            text: String::new(),
            message: "missing `uses N tasks` header; assuming 1 task".to_string(),
        });
    }

    program.trailing_comments = pending_comments;
    (program, issues)
}

/// Parse a block header line (`for ...`, `if ...`, `let ...`, `block "..."`).
/// Also used by the inline editor to accept a replacement header.
pub fn parse_block_header_text(content: &str) -> Option<BlockKind> {
    if let Some(caps) = FOR_RE.captures(content) {
        return Some(BlockKind::For {
            var: caps[1].to_string(),
            from: caps[2].trim().to_string(),
            to: caps[3].trim().to_string(),
        });
    }
    if let Some(caps) = LET_RE.captures(content) {
        return Some(BlockKind::Let {
            var: caps[1].to_string(),
            value: caps[2].trim().to_string(),
        });
    }
    if let Some(caps) = BLOCK_RE.captures(content) {
        return Some(BlockKind::Sub {
            caption: caps[1].to_string(),
        });
    }
    if let Some(caps) = IF_RE.captures(content) {
        return Some(BlockKind::If {
            condition: caps[1].trim().to_string(),
        });
    }
    None
}

/// Parse one canonical statement line (no indent, no comments).
/// Also used by the inline editor to accept a replacement line.
pub fn parse_statement_text(content: &str) -> Result<Statement, String> {
    let Some(m) = VERB_RE.find(content) else {
        return Err("unrecognized line".to_string());
    };
    let desc = content[..m.start()].trim();
    if desc.is_empty() {
        return Err(format!("`{}` is missing a task description", m.as_str()));
    }
    let rest = content[m.end()..].trim();

    if m.as_str().starts_with("compute") {
        let Some(caps) = COMPUTE_REST_RE.captures(rest) else {
            return Err("compute expects `for N seconds`".to_string());
        };
        return Ok(Statement::Compute {
            group: TaskGroup::new(desc),
            duration: caps[1].trim().to_string(),
        });
    }

    if m.as_str().starts_with("synchronize") {
        if !rest.is_empty() {
            return Err(format!("unexpected `{rest}` after synchronize"));
        }
        return Ok(Statement::Synchronize {
            group: TaskGroup::new(desc),
        });
    }

    // send / reduce share the `N megabytes to <tasks>` payload shape
    let (payload, awaited) = match rest.find(" awaited by ") {
        Some(pos) => (
            rest[..pos].trim(),
            Some(rest[pos + " awaited by ".len()..].trim().to_string()),
        ),
        None => (rest, None),
    };
    let (payload, alignment) = match payload.find(" aligned to ") {
        Some(pos) => {
            let clause = payload[pos + " aligned to ".len()..].trim();
            let Some(caps) = ALIGN_RE.captures(clause) else {
                return Err("alignment expects `N bytes`".to_string());
            };
            (payload[..pos].trim(), Some(caps[1].trim().to_string()))
        }
        None => (payload, None),
    };
    let Some(caps) = PAYLOAD_RE.captures(payload) else {
        return Err(format!(
            "{} expects `N megabytes to <tasks>`",
            if m.as_str().starts_with("send") {
                "send"
            } else {
                "reduce"
            }
        ));
    };
    let size = caps[1].trim().to_string();
    let target = caps[2].trim().to_string();

    if m.as_str().starts_with("send") {
        let mut group = TaskGroup::new(desc).with_target(target);
        if let Some(awaited) = awaited {
            group = group.with_awaited(awaited);
        }
        Ok(Statement::Send {
            group,
            size,
            alignment,
        })
    } else {
        if awaited.is_some() {
            return Err("reduce does not take an awaited clause".to_string());
        }
        if alignment.is_some() {
            return Err("reduce does not take an alignment clause".to_string());
        }
        Ok(Statement::Reduce {
            group: TaskGroup::new(desc).with_target(target),
            size,
        })
    }
}

fn attach(component: Component, stack: &mut [Component], program: &mut Program) {
    match stack.last_mut() {
        Some(top) => top.add_child(component),
        None => program.root.add_child(component),
    }
}

fn issue(line: usize, text: &str, message: &str) -> ParseIssue {
    ParseIssue {
        line,
        text: text.trim().to_string(),
        message: message.to_string(),
    }
}

/// Split a trailing `# comment` off a line, respecting quoted captions.
fn split_line_comment(line: &str) -> (&str, Option<String>) {
    let mut in_quotes = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => {
                let comment = line[i + 1..].trim().to_string();
                return (line[..i].trim_end(), Some(comment));
            }
            _ => {}
        }
    }
    (line, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_clean(text: &str) -> Program {
        let (program, issues) = parse_program(text);
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
        program
    }

    #[test]
    fn header_sets_task_count() {
        let program = parse_clean("uses 4 tasks\n");
        assert_eq!(program.task_count, 4);
        let program = parse_clean("uses 1 task\n");
        assert_eq!(program.task_count, 1);
    }

    #[test]
    fn missing_header_is_an_issue() {
        let (program, issues) = parse_program("all tasks synchronize\n");
        assert_eq!(program.task_count, 1);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("uses"));
    }

    #[test]
    fn comes_from_declarations_keep_order() {
        let program = parse_clean(
            "uses 4 tasks\nn comes from the command line with default 8\nm comes from the command line with default 2\n",
        );
        let names: Vec<_> = program.params.keys().cloned().collect();
        assert_eq!(names, vec!["n", "m"]);
        assert_eq!(program.params["n"], "8");
    }

    #[test]
    fn duplicate_comes_from_is_an_issue() {
        let (_, issues) = parse_program(
            "uses 2 tasks\nn comes from the command line with default 1\nn comes from the command line with default 2\n",
        );
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn statements_attach_in_order() {
        let program = parse_clean(
            "uses 2 tasks\n\nall tasks compute for 2 seconds\ntask 0 sends 1 megabyte to task 1\n",
        );
        let kinds: Vec<_> = program
            .root
            .children()
            .iter()
            .map(|c| c.kind_name())
            .collect();
        assert_eq!(kinds, vec!["compute", "send"]);
    }

    #[test]
    fn nested_blocks_parse() {
        let program = parse_clean(
            "uses 4 tasks\n\nfor i = 1 to 4\n  if i > 2\n    all tasks synchronize\n  end if\nend for\n",
        );
        let f = program.get(&[0]).unwrap();
        assert!(matches!(
            f.as_block().map(|b| &b.kind),
            Some(BlockKind::For { .. })
        ));
        let cond = program.get(&[0, 0]).unwrap();
        assert!(matches!(
            cond.as_block().map(|b| &b.kind),
            Some(BlockKind::If { .. })
        ));
        assert!(program.get(&[0, 0, 0]).unwrap().as_statement().is_some());
    }

    #[test]
    fn send_with_all_clauses_parses() {
        let program = parse_clean(
            "uses 4 tasks\n\ntask 0 sends 2 megabytes to task 1 aligned to 64 bytes awaited by task 2\n",
        );
        let stmt = program.get(&[0]).unwrap().as_statement().unwrap();
        match stmt {
            Statement::Send {
                group,
                size,
                alignment,
            } => {
                assert_eq!(group.source(), "task 0");
                assert_eq!(group.target(), Some("task 1"));
                assert_eq!(group.awaited(), Some("task 2"));
                assert_eq!(size, "2");
                assert_eq!(alignment.as_deref(), Some("64"));
            }
            other => panic!("expected send, got {other:?}"),
        }
    }

    #[test]
    fn comments_attach_to_the_next_component() {
        let program = parse_clean(
            "uses 2 tasks\n\n# setup\n# phase one\nall tasks compute for 1 second  # fast\n",
        );
        let stmt = program.get(&[0]).unwrap();
        assert_eq!(stmt.pre_comments, vec!["# setup", "# phase one"]);
        assert_eq!(stmt.line_comment.as_deref(), Some("fast"));
    }

    #[test]
    fn trailing_comments_land_on_the_program() {
        let program = parse_clean("uses 2 tasks\n\nall tasks synchronize\n# the end\n");
        assert_eq!(program.trailing_comments, vec!["# the end"]);
    }

    #[test]
    fn unmatched_end_is_an_issue() {
        let (_, issues) = parse_program("uses 2 tasks\nend for\n");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("no open block"));
    }

    #[test]
    fn mismatched_end_keyword_is_an_issue_but_closes() {
        let (program, issues) = parse_program(
            "uses 2 tasks\nfor i = 1 to 2\n  all tasks synchronize\nend if\n",
        );
        assert_eq!(issues.len(), 1);
        assert!(program.get(&[0, 0]).is_some());
    }

    #[test]
    fn unclosed_block_closes_at_eof() {
        let (program, issues) = parse_program(
            "uses 2 tasks\nfor i = 1 to 2\n  all tasks synchronize\n",
        );
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("unclosed"));
        assert!(program.get(&[0, 0]).is_some());
    }

    #[test]
    fn unrecognized_line_is_kept_as_issue() {
        let (program, issues) = parse_program("uses 2 tasks\nwibble wobble\n");
        assert!(program.root.children().is_empty());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 2);
        assert_eq!(issues[0].text, "wibble wobble");
    }

    #[test]
    fn source_lines_recorded_zero_based() {
        let program = parse_clean("uses 2 tasks\n\nall tasks synchronize\n");
        assert_eq!(program.get(&[0]).unwrap().source_line, Some(2));
    }

    #[test]
    fn statement_text_errors() {
        assert!(parse_statement_text("computes for 1 second").is_err());
        assert!(parse_statement_text("task 0 sends 1 megabyte").is_err());
        assert!(parse_statement_text("all tasks compute 2 seconds").is_err());
        assert!(
            parse_statement_text("all tasks reduce 1 megabyte to task 0 aligned to 8 bytes")
                .is_err()
        );
        assert!(parse_statement_text("all tasks synchronize loudly").is_err());
    }
}
