use serde::Serialize;

use crate::model::taskgroup::SourceTarget;
use crate::ops::check::{CheckError, CheckResult, CheckWarning};

/// Structured result from `wf resolve`, suitable for --json output.
#[derive(Debug, Serialize)]
pub struct ResolveReport {
    pub task_count: usize,
    pub statements: Vec<StatementReport>,
}

#[derive(Debug, Serialize)]
pub struct StatementReport {
    pub path: String,
    pub line: String,
    /// Concrete pairs, absent when the group is not statically resolvable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairs: Option<Vec<PairReport>>,
    pub not_static: bool,
}

#[derive(Debug, Serialize)]
pub struct PairReport {
    pub source: usize,
    pub target: usize,
}

impl PairReport {
    pub fn from_pairs(pairs: &[SourceTarget]) -> Option<Vec<PairReport>> {
        if pairs.iter().any(|p| p.unknown) {
            return None;
        }
        Some(
            pairs
                .iter()
                .map(|p| PairReport {
                    source: p.source,
                    target: p.target,
                })
                .collect(),
        )
    }
}

/// Print a check result for humans.
pub fn print_check_result(result: &CheckResult) {
    for error in &result.errors {
        match error {
            CheckError::Parse {
                line,
                text,
                message,
            } => {
                if text.is_empty() {
                    println!("error: line {line}: {message}");
                } else {
                    println!("error: line {line}: {message}: `{text}`");
                }
            }
            CheckError::Expression {
                path,
                expr,
                message,
            } => {
                println!("error: at {path}: `{expr}`: {message}");
            }
            CheckError::TaskCount { count, max } => {
                println!("error: task count {count} is outside 1..={max}");
            }
        }
    }
    for warning in &result.warnings {
        match warning {
            CheckWarning::NotStatic { path, line } => {
                println!("warning: at {path}: `{line}` is not statically resolvable");
            }
        }
    }
    if result.valid {
        let warnings = result.warnings.len();
        if warnings == 0 {
            println!("ok");
        } else {
            println!("ok ({warnings} warning{})", if warnings == 1 { "" } else { "s" });
        }
    }
}

/// Print a resolve report for humans.
pub fn print_resolve_report(report: &ResolveReport) {
    println!("uses {} tasks", report.task_count);
    for stmt in &report.statements {
        let detail = match &stmt.pairs {
            Some(pairs) if pairs.is_empty() => "(no participants)".to_string(),
            Some(pairs) => pairs
                .iter()
                .map(|p| {
                    if p.source == p.target {
                        p.source.to_string()
                    } else {
                        format!("{}->{}", p.source, p.target)
                    }
                })
                .collect::<Vec<_>>()
                .join(", "),
            None => "not static".to_string(),
        };
        println!("{:<8} {}  [{}]", stmt.path, stmt.line, detail);
    }
}
