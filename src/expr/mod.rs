pub mod ast;
pub mod eval;
pub mod parser;

pub use ast::{AstKind, AstNode};
pub use eval::{
    Binding, DescriptionEvaluator, Evaluator, ExprError, ExprKind, Resolution, ResolveCtx,
    verify_scope_variables,
};
