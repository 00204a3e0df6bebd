//! Expression engine: tokenizer, recursive-descent parser and evaluator.
//!
//! Supports arithmetic (+, -, *, /), comparisons (==, !=, <, <=, >, >=),
//! boolean operators (`&&`/`and`, `||`/`or`, `!`/`not`) and built-in
//! functions (abs, sqrt, log, exp, pow, min, max). A bare identifier, or
//! an identifier followed by empty parentheses (`pt()`), is a variable.
//!
//! Truth values are numbers: comparisons yield 1.0 or 0.0, and any value
//! `> 0` counts as true. NaN is never true.

use dqm_core::{Error, Result};

#[derive(Debug, Clone)]
enum Expr {
    Number(f64),
    Var(usize),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    BinOp(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

#[derive(Debug, Clone, Copy)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy)]
enum Func {
    Abs,
    Sqrt,
    Log,
    Exp,
    Pow,
    Min,
    Max,
}

impl Func {
    fn lookup(name: &str) -> Option<Func> {
        Some(match name {
            "abs" => Func::Abs,
            "sqrt" => Func::Sqrt,
            "log" => Func::Log,
            "exp" => Func::Exp,
            "pow" => Func::Pow,
            "min" => Func::Min,
            "max" => Func::Max,
            _ => return None,
        })
    }

    fn arity(self) -> usize {
        match self {
            Func::Pow | Func::Min | Func::Max => 2,
            _ => 1,
        }
    }
}

/// A parsed expression with its variables numbered by first occurrence.
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    ast: Option<Expr>,
    /// Variable names referenced by the expression, in first-occurrence order.
    pub variables: Vec<String>,
}

impl CompiledExpr {
    /// Parse `input`. An empty or all-whitespace input compiles to a
    /// constant-true expression.
    pub fn compile(input: &str) -> Result<Self> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Ok(Self::always_true());
        }
        let mut parser = Parser::new(&tokens);
        let ast = parser.parse_or()?;
        if let Some(tok) = parser.peek() {
            return Err(Error::Expression(format!(
                "unexpected token after expression in '{input}': {tok:?}"
            )));
        }
        Ok(Self { ast: Some(ast), variables: parser.variables })
    }

    /// The empty cut.
    pub fn always_true() -> Self {
        Self { ast: None, variables: Vec::new() }
    }

    /// True when the expression is the empty (always-true) cut.
    pub fn is_trivial(&self) -> bool {
        self.ast.is_none()
    }

    /// Evaluate with variable `i` supplied by `value(i)`.
    pub fn eval_with(&self, value: &dyn Fn(usize) -> f64) -> f64 {
        match &self.ast {
            Some(ast) => eval(ast, value),
            None => 1.0,
        }
    }

    /// Evaluate one row; `values` is indexed like [`CompiledExpr::variables`].
    pub fn eval_row(&self, values: &[f64]) -> f64 {
        self.eval_with(&|i| values[i])
    }
}

fn truth(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

fn eval(e: &Expr, value: &dyn Fn(usize) -> f64) -> f64 {
    match e {
        Expr::Number(n) => *n,
        Expr::Var(i) => value(*i),
        Expr::Neg(a) => -eval(a, value),
        Expr::Not(a) => {
            if eval(a, value) > 0.0 {
                0.0
            } else {
                1.0
            }
        }
        Expr::BinOp(BinOp::And, a, b) => truth(eval(a, value) > 0.0 && eval(b, value) > 0.0),
        Expr::BinOp(BinOp::Or, a, b) => truth(eval(a, value) > 0.0 || eval(b, value) > 0.0),
        Expr::BinOp(op, a, b) => {
            let lhs = eval(a, value);
            let rhs = eval(b, value);
            match op {
                BinOp::Add => lhs + rhs,
                BinOp::Sub => lhs - rhs,
                BinOp::Mul => lhs * rhs,
                BinOp::Div => lhs / rhs,
                BinOp::Eq => truth((lhs - rhs).abs() < f64::EPSILON),
                BinOp::Ne => truth((lhs - rhs).abs() >= f64::EPSILON),
                BinOp::Lt => truth(lhs < rhs),
                BinOp::Le => truth(lhs <= rhs),
                BinOp::Gt => truth(lhs > rhs),
                BinOp::Ge => truth(lhs >= rhs),
                BinOp::And | BinOp::Or => unreachable!("short-circuit operators handled above"),
            }
        }
        Expr::Call(f, args) => {
            let a0 = eval(&args[0], value);
            match f {
                Func::Abs => a0.abs(),
                Func::Sqrt => a0.sqrt(),
                Func::Log => a0.ln(),
                Func::Exp => a0.exp(),
                Func::Pow => a0.powf(eval(&args[1], value)),
                Func::Min => a0.min(eval(&args[1], value)),
                Func::Max => a0.max(eval(&args[1], value)),
            }
        }
    }
}

// ── Tokenizer ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let next = chars.get(i + 1).copied();
        let two = match (c, next) {
            ('&', Some('&')) => Some(Token::And),
            ('|', Some('|')) => Some(Token::Or),
            ('=', Some('=')) => Some(Token::Eq),
            ('!', Some('=')) => Some(Token::Ne),
            ('<', Some('=')) => Some(Token::Le),
            ('>', Some('=')) => Some(Token::Ge),
            _ => None,
        };
        if let Some(t) = two {
            tokens.push(t);
            i += 2;
            continue;
        }

        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            '<' => Some(Token::Lt),
            '>' => Some(Token::Gt),
            '!' => Some(Token::Not),
            _ => None,
        };
        if let Some(t) = single {
            tokens.push(t);
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_ascii_digit()
                    || chars[i] == '.'
                    || chars[i] == 'e'
                    || chars[i] == 'E'
                    || ((chars[i] == '+' || chars[i] == '-')
                        && i > start
                        && (chars[i - 1] == 'e' || chars[i - 1] == 'E')))
            {
                i += 1;
            }
            let s: String = chars[start..i].iter().collect();
            let n: f64 =
                s.parse().map_err(|_| Error::Expression(format!("invalid number: '{s}'")))?;
            tokens.push(Token::Num(n));
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            tokens.push(match word.as_str() {
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                _ => Token::Ident(word),
            });
        } else {
            return Err(Error::Expression(format!("unexpected character '{c}' in '{input}'")));
        }
    }

    Ok(tokens)
}

// ── Parser (recursive descent) ─────────────────────────────────

/// Maximum depth of the expression tree: parentheses, calls, unary
/// operators and chained binary operators all count.
const MAX_DEPTH: usize = 128;

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    variables: Vec<String>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0, depth: 0, variables: Vec::new() }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        match self.advance() {
            Some(t) if t == expected => Ok(()),
            other => Err(Error::Expression(format!("expected {expected:?}, got {other:?}"))),
        }
    }

    fn variable(&mut self, name: String) -> usize {
        match self.variables.iter().position(|v| *v == name) {
            Some(i) => i,
            None => {
                self.variables.push(name);
                self.variables.len() - 1
            }
        }
    }

    /// Enter one more level of the tree being built.
    fn descend(&mut self) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::Expression(format!(
                "expression nested deeper than {MAX_DEPTH} levels"
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let entry = self.depth;
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            self.descend()?;
            let rhs = self.parse_and()?;
            lhs = Expr::BinOp(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        self.depth = entry;
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let entry = self.depth;
        let mut lhs = self.parse_cmp()?;
        while self.eat(&Token::And) {
            self.descend()?;
            let rhs = self.parse_cmp()?;
            lhs = Expr::BinOp(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        self.depth = entry;
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Expr> {
        let lhs = self.parse_add()?;
        let op = match self.peek() {
            Some(Token::Eq) => BinOp::Eq,
            Some(Token::Ne) => BinOp::Ne,
            Some(Token::Lt) => BinOp::Lt,
            Some(Token::Le) => BinOp::Le,
            Some(Token::Gt) => BinOp::Gt,
            Some(Token::Ge) => BinOp::Ge,
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.parse_add()?;
        Ok(Expr::BinOp(op, Box::new(lhs), Box::new(rhs)))
    }

    fn parse_add(&mut self) -> Result<Expr> {
        let entry = self.depth;
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            self.descend()?;
            let rhs = self.parse_mul()?;
            lhs = Expr::BinOp(op, Box::new(lhs), Box::new(rhs));
        }
        self.depth = entry;
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Expr> {
        let entry = self.depth;
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.pos += 1;
            self.descend()?;
            let rhs = self.parse_unary()?;
            lhs = Expr::BinOp(op, Box::new(lhs), Box::new(rhs));
        }
        self.depth = entry;
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let entry = self.depth;
        self.descend()?;
        let e = self.parse_prefixed()?;
        self.depth = entry;
        Ok(e)
    }

    fn parse_prefixed(&mut self) -> Result<Expr> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        if self.eat(&Token::Not) {
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        match self.advance().cloned() {
            Some(Token::Num(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                let e = self.parse_or()?;
                self.expect(&Token::RParen)?;
                Ok(e)
            }
            Some(Token::Ident(name)) => {
                if !self.eat(&Token::LParen) {
                    return Ok(Expr::Var(self.variable(name)));
                }
                // `pt()` is an accessor call, not a function.
                if self.eat(&Token::RParen) {
                    return Ok(Expr::Var(self.variable(name)));
                }
                let func = Func::lookup(&name)
                    .ok_or_else(|| Error::Expression(format!("unknown function: '{name}'")))?;
                let mut args = vec![self.parse_or()?];
                while self.eat(&Token::Comma) {
                    args.push(self.parse_or()?);
                }
                self.expect(&Token::RParen)?;
                if args.len() != func.arity() {
                    return Err(Error::Expression(format!(
                        "'{name}' takes {} argument(s), got {}",
                        func.arity(),
                        args.len()
                    )));
                }
                Ok(Expr::Call(func, args))
            }
            other => Err(Error::Expression(format!(
                "expected number, identifier, or '(', got {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval1(src: &str, values: &[f64]) -> f64 {
        CompiledExpr::compile(src).unwrap().eval_row(values)
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(eval1("2 + 3 * 4", &[]), 14.0);
        assert_eq!(eval1("(1 + 2) * (3 + 4)", &[]), 21.0);
        assert_eq!(eval1("-x + 1", &[5.0]), -4.0);
        assert!((eval1("1.5e2 + 3.0E-1", &[]) - 150.3).abs() < 1e-10);
    }

    #[test]
    fn variables_in_first_occurrence_order() {
        let e = CompiledExpr::compile("pt > 6 && eta < 2.4 && pt < 100").unwrap();
        assert_eq!(e.variables, vec!["pt", "eta"]);
        assert_eq!(e.eval_row(&[30.0, 0.5]), 1.0);
        assert_eq!(e.eval_row(&[3.0, 0.5]), 0.0);
        assert_eq!(e.eval_row(&[30.0, 2.5]), 0.0);
    }

    #[test]
    fn keyword_operators() {
        let e = CompiledExpr::compile("not (a > 1) or b and c").unwrap();
        assert_eq!(e.eval_row(&[0.0, 0.0, 0.0]), 1.0);
        assert_eq!(e.eval_row(&[2.0, 1.0, 1.0]), 1.0);
        assert_eq!(e.eval_row(&[2.0, 1.0, 0.0]), 0.0);
    }

    #[test]
    fn accessor_call_syntax() {
        let e = CompiledExpr::compile("pt() > 20 && abs(eta()) < 2.1").unwrap();
        assert_eq!(e.variables, vec!["pt", "eta"]);
        assert_eq!(e.eval_row(&[25.0, -2.0]), 1.0);
    }

    #[test]
    fn functions_and_arity() {
        assert_eq!(eval1("sqrt(x)", &[9.0]), 3.0);
        assert_eq!(eval1("pow(x, 2)", &[3.0]), 9.0);
        assert_eq!(eval1("max(a, b)", &[3.0, 7.0]), 7.0);
        assert!(CompiledExpr::compile("pow(x)").is_err());
        assert!(CompiledExpr::compile("abs(x, y)").is_err());
        let deep = format!("{}x{}", "(".repeat(500), ")".repeat(500));
        assert!(CompiledExpr::compile(&deep).is_err());
        assert!(CompiledExpr::compile("--x").is_ok());
    }

    #[test]
    fn long_operator_chains_rejected_at_compile_time() {
        let sum = format!("pt{} > 0", " + pt".repeat(20_000));
        assert!(matches!(CompiledExpr::compile(&sum), Err(Error::Expression(_))));
        let cuts = vec!["pt > 0"; 20_000].join(" && ");
        assert!(CompiledExpr::compile(&cuts).is_err());
        let product = format!("x{}", " * x".repeat(20_000));
        assert!(CompiledExpr::compile(&product).is_err());

        let modest = format!("pt{} > 0", " + pt".repeat(50));
        let e = CompiledExpr::compile(&modest).unwrap();
        assert_eq!(e.eval_row(&[1.0]), 1.0);
        assert!(CompiledExpr::compile("cosh(x)").is_err());
    }

    #[test]
    fn syntax_errors() {
        for bad in ["pt >", "pt > 6 &&", "(pt", "pt # 3", "pt 6", "&& pt"] {
            assert!(CompiledExpr::compile(bad).is_err(), "'{bad}' should not compile");
        }
    }

    #[test]
    fn empty_cut_is_true() {
        let e = CompiledExpr::compile("   ").unwrap();
        assert!(e.is_trivial());
        assert_eq!(e.eval_row(&[]), 1.0);
    }

    #[test]
    fn nan_is_false_and_division_does_not_panic() {
        assert_eq!(eval1("x > 0", &[f64::NAN]), 0.0);
        assert_eq!(eval1("x < 0", &[f64::NAN]), 0.0);
        assert_eq!(eval1("1 / x > 100", &[0.0]), 1.0);
    }
}
