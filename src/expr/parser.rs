use crate::expr::ast::{AstKind, AstNode};
use crate::expr::eval::ExprError;

/// Words that cannot be used as variable names.
const KEYWORDS: &[&str] = &[
    "all", "task", "tasks", "such", "that", "is", "even", "odd", "in", "and", "or",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Parse a complete task-set description:
/// `all tasks` | `task E` | `tasks v such that P`.
pub fn parse_description(text: &str) -> Result<AstNode, ExprError> {
    let mut p = Parser::new(text)?;
    let node = p.description()?;
    p.expect_end()?;
    Ok(AstNode::new(AstKind::Description, "", vec![node]).with_source(text.trim()))
}

/// Parse a scalar expression (durations, sizes, bounds, let values).
pub fn parse_scalar(text: &str) -> Result<AstNode, ExprError> {
    let mut p = Parser::new(text)?;
    let node = p.expr()?;
    p.expect_end()?;
    Ok(node)
}

/// Parse a predicate (if-block conditions).
pub fn parse_predicate(text: &str) -> Result<AstNode, ExprError> {
    let mut p = Parser::new(text)?;
    let node = p.pred()?;
    p.expect_end()?;
    Ok(node)
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Word(String),
    Num(String),
    Sym(&'static str),
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Tok::Word(w) => w.clone(),
            Tok::Num(n) => n.clone(),
            Tok::Sym(s) => (*s).to_string(),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Tok>, ExprError> {
    let mut toks = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            toks.push(Tok::Num(chars[start..i].iter().collect()));
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            toks.push(Tok::Word(chars[start..i].iter().collect()));
        } else {
            let two: String = chars[i..(i + 2).min(chars.len())].iter().collect();
            let sym = match two.as_str() {
                "<=" => Some("<="),
                ">=" => Some(">="),
                _ => None,
            };
            if let Some(sym) = sym {
                toks.push(Tok::Sym(sym));
                i += 2;
                continue;
            }
            let sym = match c {
                '<' => "<",
                '>' => ">",
                '=' => "=",
                '+' => "+",
                '-' => "-",
                '*' => "*",
                '/' => "/",
                '(' => "(",
                ')' => ")",
                '{' => "{",
                '}' => "}",
                ',' => ",",
                other => return Err(ExprError::BadCharacter(other)),
            };
            toks.push(Tok::Sym(sym));
            i += 1;
        }
    }
    Ok(toks)
}

// ---------------------------------------------------------------------------
// Recursive descent
// ---------------------------------------------------------------------------

struct Parser {
    toks: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn new(text: &str) -> Result<Self, ExprError> {
        let toks = tokenize(text)?;
        if toks.is_empty() {
            return Err(ExprError::Empty);
        }
        Ok(Parser { toks, pos: 0 })
    }

    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if matches!(self.peek(), Some(Tok::Word(w)) if w == word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_sym(&mut self, sym: &str) -> bool {
        if matches!(self.peek(), Some(Tok::Sym(s)) if *s == sym) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_word(&mut self, word: &str) -> Result<(), ExprError> {
        if self.eat_word(word) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{word}`")))
        }
    }

    fn expect_sym(&mut self, sym: &str) -> Result<(), ExprError> {
        if self.eat_sym(sym) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{sym}`")))
        }
    }

    fn expect_end(&mut self) -> Result<(), ExprError> {
        match self.peek() {
            None => Ok(()),
            Some(tok) => Err(ExprError::Trailing(tok.describe())),
        }
    }

    fn unexpected(&self, expected: &str) -> ExprError {
        match self.peek() {
            Some(tok) => ExprError::Unexpected {
                expected: expected.to_string(),
                found: tok.describe(),
            },
            None => ExprError::UnexpectedEnd(expected.to_string()),
        }
    }

    fn ident(&mut self) -> Result<String, ExprError> {
        match self.peek() {
            Some(Tok::Word(w)) if !is_keyword(w) => {
                let name = w.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("a variable name")),
        }
    }

    // description := "all tasks" | "tasks v such that P" | "task E"
    fn description(&mut self) -> Result<AstNode, ExprError> {
        if self.eat_word("all") {
            self.expect_word("tasks")?;
            return Ok(AstNode::new(AstKind::AllTasks, "", vec![]));
        }
        if self.eat_word("tasks") {
            let var = self.ident()?;
            self.expect_word("such")?;
            self.expect_word("that")?;
            let pred = self.pred()?;
            return Ok(AstNode::new(AstKind::TaskFilter, var, vec![pred]));
        }
        self.expect_word("task")?;
        let index = self.expr()?;
        Ok(AstNode::new(AstKind::TaskIndex, "", vec![index]))
    }

    // pred := and_pred ("or" and_pred)*
    fn pred(&mut self) -> Result<AstNode, ExprError> {
        let mut node = self.and_pred()?;
        while self.eat_word("or") {
            let rhs = self.and_pred()?;
            node = AstNode::new(AstKind::Or, "", vec![node, rhs]);
        }
        Ok(node)
    }

    // and_pred := atom_pred ("and" atom_pred)*
    fn and_pred(&mut self) -> Result<AstNode, ExprError> {
        let mut node = self.atom_pred()?;
        while self.eat_word("and") {
            let rhs = self.atom_pred()?;
            node = AstNode::new(AstKind::And, "", vec![node, rhs]);
        }
        Ok(node)
    }

    // atom_pred := "(" pred ")" | E "is" even/odd/in-set | E relop E
    fn atom_pred(&mut self) -> Result<AstNode, ExprError> {
        // Parenthesized predicates are disambiguated by lookahead: a paren
        // can also open a scalar expression like `(t + 1) < n`.
        if matches!(self.peek(), Some(Tok::Sym("("))) {
            let save = self.pos;
            self.pos += 1;
            if let Ok(inner) = self.pred() {
                if self.eat_sym(")") && self.at_pred_boundary() {
                    return Ok(inner);
                }
            }
            self.pos = save;
        }

        let lhs = self.expr()?;
        if self.eat_word("is") {
            if self.eat_word("even") {
                return Ok(AstNode::new(AstKind::Parity, "even", vec![lhs]));
            }
            if self.eat_word("odd") {
                return Ok(AstNode::new(AstKind::Parity, "odd", vec![lhs]));
            }
            self.expect_word("in")?;
            self.expect_sym("{")?;
            let mut children = vec![lhs];
            loop {
                children.push(self.expr()?);
                if !self.eat_sym(",") {
                    break;
                }
            }
            self.expect_sym("}")?;
            return Ok(AstNode::new(AstKind::Membership, "", children));
        }

        for op in ["<=", ">=", "<", ">", "="] {
            if self.eat_sym(op) {
                let rhs = self.expr()?;
                return Ok(AstNode::new(AstKind::Compare, op, vec![lhs, rhs]));
            }
        }
        Err(self.unexpected("a comparison"))
    }

    /// True when the cursor sits where a predicate may end: end of input,
    /// `and`, `or`, or a closing delimiter.
    fn at_pred_boundary(&self) -> bool {
        match self.peek() {
            None => true,
            Some(Tok::Word(w)) => w == "and" || w == "or",
            Some(Tok::Sym(s)) => *s == ")" || *s == "}",
            Some(Tok::Num(_)) => false,
        }
    }

    // expr := term (("+"|"-") term)*
    fn expr(&mut self) -> Result<AstNode, ExprError> {
        let mut node = self.term()?;
        loop {
            let op = if self.eat_sym("+") {
                "+"
            } else if self.eat_sym("-") {
                "-"
            } else {
                break;
            };
            let rhs = self.term()?;
            node = AstNode::new(AstKind::BinOp, op, vec![node, rhs]);
        }
        Ok(node)
    }

    // term := factor (("*"|"/") factor)*
    fn term(&mut self) -> Result<AstNode, ExprError> {
        let mut node = self.factor()?;
        loop {
            let op = if self.eat_sym("*") {
                "*"
            } else if self.eat_sym("/") {
                "/"
            } else {
                break;
            };
            let rhs = self.factor()?;
            node = AstNode::new(AstKind::BinOp, op, vec![node, rhs]);
        }
        Ok(node)
    }

    // factor := NUMBER | IDENT | "(" expr ")"
    fn factor(&mut self) -> Result<AstNode, ExprError> {
        match self.peek().cloned() {
            Some(Tok::Num(n)) => {
                self.pos += 1;
                Ok(AstNode::new(AstKind::Number, n, vec![]))
            }
            Some(Tok::Word(w)) if !is_keyword(&w) => {
                self.pos += 1;
                Ok(AstNode::new(AstKind::Ident, w, vec![]))
            }
            Some(Tok::Sym("(")) => {
                self.pos += 1;
                let inner = self.expr()?;
                self.expect_sym(")")?;
                Ok(inner)
            }
            _ => Err(self.unexpected("a number, variable, or `(`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_tasks() {
        let node = parse_description("all tasks").unwrap();
        assert_eq!(node.kind(), AstKind::Description);
        assert_eq!(node.children()[0].kind(), AstKind::AllTasks);
        assert_eq!(node.source_text(), "all tasks");
    }

    #[test]
    fn parses_single_task_index() {
        let node = parse_description("task 3").unwrap();
        let index = &node.children()[0];
        assert_eq!(index.kind(), AstKind::TaskIndex);
        assert_eq!(index.children()[0].kind(), AstKind::Number);
        assert_eq!(index.children()[0].attr(), "3");
    }

    #[test]
    fn parses_task_index_arithmetic() {
        let node = parse_description("task i + 1").unwrap();
        let expr = &node.children()[0].children()[0];
        assert_eq!(expr.kind(), AstKind::BinOp);
        assert_eq!(expr.attr(), "+");
    }

    #[test]
    fn parses_filter_with_parity() {
        let node = parse_description("tasks t such that t is even").unwrap();
        let filter = &node.children()[0];
        assert_eq!(filter.kind(), AstKind::TaskFilter);
        assert_eq!(filter.attr(), "t");
        let pred = &filter.children()[0];
        assert_eq!(pred.kind(), AstKind::Parity);
        assert_eq!(pred.attr(), "even");
    }

    #[test]
    fn parses_membership_list() {
        let node = parse_description("tasks t such that t is in {0, 2, 5}").unwrap();
        let pred = &node.children()[0].children()[0];
        assert_eq!(pred.kind(), AstKind::Membership);
        // lhs plus three candidates
        assert_eq!(pred.children().len(), 4);
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let node =
            parse_description("tasks t such that t is even or t > 2 and t < 5").unwrap();
        let pred = &node.children()[0].children()[0];
        assert_eq!(pred.kind(), AstKind::Or);
        assert_eq!(pred.children()[1].kind(), AstKind::And);
    }

    #[test]
    fn comparison_operators_parse() {
        for op in ["<", ">", "=", "<=", ">="] {
            let text = format!("tasks t such that t {op} 2");
            let node = parse_description(&text).unwrap();
            let pred = &node.children()[0].children()[0];
            assert_eq!(pred.kind(), AstKind::Compare);
            assert_eq!(pred.attr(), op);
        }
    }

    #[test]
    fn scalar_precedence() {
        let node = parse_scalar("1 + 2 * 3").unwrap();
        assert_eq!(node.attr(), "+");
        assert_eq!(node.children()[1].attr(), "*");
    }

    #[test]
    fn scalar_parens() {
        let node = parse_scalar("(1 + 2) * 3").unwrap();
        assert_eq!(node.attr(), "*");
        assert_eq!(node.children()[0].attr(), "+");
    }

    #[test]
    fn keyword_is_not_a_variable() {
        assert!(parse_scalar("tasks").is_err());
        assert!(parse_description("tasks is such that t is even").is_err());
    }

    #[test]
    fn trailing_input_rejected() {
        assert!(matches!(
            parse_description("all tasks compute"),
            Err(ExprError::Trailing(_))
        ));
    }

    #[test]
    fn empty_input_rejected() {
        assert!(matches!(parse_scalar("   "), Err(ExprError::Empty)));
    }

    #[test]
    fn predicate_condition_parses() {
        let node = parse_predicate("n > 4 and n < 64").unwrap();
        assert_eq!(node.kind(), AstKind::And);
    }
}
