use serde::Serialize;

use crate::expr::eval::{Evaluator, ExprError, ExprKind, Resolution, ResolveCtx};
use crate::model::component::{BlockKind, Component, ComponentKind, Statement};
use crate::model::program::Program;
use crate::parse::program_parser::ParseIssue;
use crate::parse::program_serializer::statement_line;

/// Structured result from `wf check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A validation error (something that should be fixed).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// A line the parser could not accept
    #[serde(rename = "parse")]
    Parse {
        line: usize,
        text: String,
        message: String,
    },
    /// An expression that fails to parse or references an out-of-scope
    /// variable
    #[serde(rename = "expression")]
    Expression {
        path: String,
        expr: String,
        message: String,
    },
    /// Task count outside the accepted range
    #[serde(rename = "task_count")]
    TaskCount { count: usize, max: usize },
}

/// Something worth knowing that does not invalidate the program.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// A statement whose participation cannot be statically enumerated
    #[serde(rename = "not_static")]
    NotStatic { path: String, line: String },
}

/// Every expression a component carries, with the grammar it belongs to.
pub fn component_exprs(component: &Component) -> Vec<(ExprKind, String)> {
    let mut exprs = Vec::new();
    match &component.kind {
        ComponentKind::Statement(stmt) => {
            let group = stmt.group();
            exprs.push((ExprKind::Description, group.source().to_string()));
            if let Some(target) = group.target() {
                exprs.push((ExprKind::Description, target.to_string()));
            }
            if let Some(awaited) = group.awaited() {
                exprs.push((ExprKind::Description, awaited.to_string()));
            }
            match stmt {
                Statement::Compute { duration, .. } => {
                    exprs.push((ExprKind::Scalar, duration.clone()));
                }
                Statement::Send {
                    size, alignment, ..
                } => {
                    exprs.push((ExprKind::Scalar, size.clone()));
                    if let Some(alignment) = alignment {
                        exprs.push((ExprKind::Scalar, alignment.clone()));
                    }
                }
                Statement::Reduce { size, .. } => {
                    exprs.push((ExprKind::Scalar, size.clone()));
                }
                Statement::Synchronize { .. } => {}
            }
        }
        ComponentKind::Block(block) => match &block.kind {
            BlockKind::For { from, to, .. } => {
                exprs.push((ExprKind::Scalar, from.clone()));
                exprs.push((ExprKind::Scalar, to.clone()));
            }
            BlockKind::If { condition } => {
                exprs.push((ExprKind::Predicate, condition.clone()));
            }
            BlockKind::Let { value, .. } => {
                exprs.push((ExprKind::Scalar, value.clone()));
            }
            BlockKind::Sub { .. } | BlockKind::Program => {}
        },
    }
    exprs
}

/// Validate every expression on one component against the given scope.
/// Returns the offending expression and error on first failure.
pub fn validate_component(
    component: &Component,
    scope: &[String],
    eval: &dyn Evaluator,
) -> Result<(), (String, ExprError)> {
    for (kind, expr) in component_exprs(component) {
        eval.validate(&expr, kind, scope)
            .map_err(|e| (expr.clone(), e))?;
    }
    Ok(())
}

/// Validate a whole program: parse issues, expression and scope errors,
/// task-count bounds, plus not-statically-resolvable warnings.
pub fn check_program(
    program: &Program,
    parse_issues: &[ParseIssue],
    eval: &dyn Evaluator,
    max_tasks: usize,
) -> CheckResult {
    let mut result = CheckResult::default();

    for issue in parse_issues {
        result.errors.push(CheckError::Parse {
            line: issue.line,
            text: issue.text.clone(),
            message: issue.message.clone(),
        });
    }

    if program.task_count == 0 || program.task_count > max_tasks {
        result.errors.push(CheckError::TaskCount {
            count: program.task_count,
            max: max_tasks,
        });
    }

    for (path, component) in program.flatten() {
        let scope = program.scope_names_at(&path);
        if let Err((expr, err)) = validate_component(component, &scope, eval) {
            result.errors.push(CheckError::Expression {
                path: path_display(&path),
                expr,
                message: err.to_string(),
            });
            continue;
        }
        if let ComponentKind::Statement(stmt) = &component.kind {
            let bindings = program.scope_at(&path);
            let ctx = ResolveCtx {
                task_count: program.task_count,
                bindings: &bindings,
            };
            let group = stmt.group();
            let mut not_static = matches!(
                eval.resolve(group.source(), group.target(), &ctx),
                Resolution::Unknown
            );
            if let Some(awaited) = group.awaited() {
                not_static |= matches!(eval.resolve(awaited, None, &ctx), Resolution::Unknown);
            }
            if not_static {
                result.warnings.push(CheckWarning::NotStatic {
                    path: path_display(&path),
                    line: statement_line(stmt),
                });
            }
        }
    }

    result.valid = result.errors.is_empty();
    result
}

/// Dotted child-index path for reporting, e.g. `1.0.2`.
pub fn path_display(path: &[usize]) -> String {
    path.iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::eval::DescriptionEvaluator;
    use crate::parse::program_parser::parse_program;

    fn checked(text: &str) -> CheckResult {
        let (program, issues) = parse_program(text);
        check_program(&program, &issues, &DescriptionEvaluator::new(), 512)
    }

    #[test]
    fn clean_program_is_valid() {
        let result = checked(
            "uses 4 tasks\n\nall tasks compute for 2 seconds\ntask 0 sends 1 megabyte to task 1\n",
        );
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn out_of_scope_variable_is_an_expression_error() {
        let result = checked("uses 4 tasks\n\ntask m computes for 1 second\n");
        assert!(!result.valid);
        assert!(matches!(
            &result.errors[0],
            CheckError::Expression { expr, .. } if expr == "task m"
        ));
    }

    #[test]
    fn loop_variable_is_in_scope_inside_the_loop() {
        let result = checked(
            "uses 4 tasks\n\nfor i = 1 to 4\n  task i computes for 1 second\nend for\n",
        );
        assert!(result.valid, "{:?}", result.errors);
        // ...but resolves non-statically.
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn comes_from_parameter_is_in_scope() {
        let result = checked(
            "uses 4 tasks\nn comes from the command line with default 8\n\nif n > 4\n  all tasks synchronize\nend if\n",
        );
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn zero_tasks_is_a_task_count_error() {
        let result = checked("uses 0 tasks\n\nall tasks synchronize\n");
        assert!(
            result
                .errors
                .iter()
                .any(|e| matches!(e, CheckError::TaskCount { count: 0, .. }))
        );
    }

    #[test]
    fn parse_issues_become_errors() {
        let result = checked("uses 2 tasks\nwibble\n");
        assert!(matches!(&result.errors[0], CheckError::Parse { line: 2, .. }));
    }

    #[test]
    fn bad_for_bounds_are_reported() {
        let result = checked(
            "uses 4 tasks\n\nfor i = 1 to q\n  all tasks synchronize\nend for\n",
        );
        assert!(!result.valid);
        assert!(matches!(
            &result.errors[0],
            CheckError::Expression { expr, .. } if expr == "q"
        ));
    }

    #[test]
    fn result_serializes_to_json() {
        let result = checked("uses 4 tasks\n\ntask m computes for 1 second\n");
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"type\":\"expression\""));
    }
}
