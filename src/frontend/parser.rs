//! The Parser module takes a token stream (Vec<Token>) from the Lexer
//! and converts it into an AST.
//!
//! Grammar, in descent order:
//!
//! ```text
//! unit    := scope EOF
//! scope   := '{' stmt* '}'
//! stmt    := scope | cond | assign ';'
//! cond    := ('if'|'while') '(' expr ')' (scope | stmt)
//! assign  := identifier '=' expr
//! expr    := term (('+'|'-') term)*
//! term    := power (('*'|'/') power)*
//! power   := atom ('^' atom)*
//! atom    := '(' expr ')' | number | identifier | keyword '(' expr ')'
//! ```
//!
//! `^` chains fold left-to-right: `2^3^2` parses as `(2^3)^2`. This is a
//! deliberate departure from the usual right-associative convention.
use std::fmt;

use super::ast::*;
use super::lexer::{OpKind, Token, TokenKind};

#[derive(Debug)]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "syntax error at line {}: {}", self.line, self.message)
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Line of the most recently consumed token, so errors at EOF still
    /// carry a usable location.
    last_line: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            last_line: 1,
        }
    }

    /// Runs the parser, consuming it and returning the top-level scope.
    /// The first missing or unexpected token aborts the whole parse; no
    /// partial AST is ever returned.
    pub fn run(mut self) -> Result<Block, SyntaxError> {
        let root = self.scope()?;

        if let Some(tok) = self.current() {
            return Err(SyntaxError {
                line: tok.line,
                message: "trailing tokens after top-level scope".to_owned(),
            });
        }

        Ok(root)
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn kind(&self) -> Option<&TokenKind> {
        self.current().map(|t| &t.kind)
    }

    /// Advances the cursor by one and returns the consumed token.
    fn consume(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if let Some(t) = tok {
            self.last_line = t.line;
        }
        self.pos += 1;
        tok
    }

    fn error(&self, message: &str) -> SyntaxError {
        SyntaxError {
            line: self.current().map(|t| t.line).unwrap_or(self.last_line),
            message: message.to_owned(),
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), SyntaxError> {
        match self.current() {
            Some(tok) if tok.kind == kind => {
                self.consume();
                Ok(())
            }
            _ => Err(self.error(&format!("expected {}", what))),
        }
    }

    /// scope := '{' stmt* '}'
    ///
    /// Statements land in a Vec in source order; a closing nested scope
    /// is one element of the enclosing list, so siblings that follow it
    /// keep their lexical position.
    fn scope(&mut self) -> Result<Block, SyntaxError> {
        debug!("parsing scope");
        self.expect(TokenKind::OpenBrace, "`{`")?;

        let mut stmts = Vec::new();
        loop {
            match self.kind() {
                Some(TokenKind::CloseBrace) => {
                    self.consume();
                    break;
                }
                Some(_) => stmts.push(self.stmt()?),
                None => return Err(self.error("missing `}` before end of input")),
            }
        }

        Ok(Block { stmts })
    }

    /// stmt := scope | cond | assign ';'
    fn stmt(&mut self) -> Result<Stmt, SyntaxError> {
        match self.kind() {
            Some(TokenKind::OpenBrace) => Ok(Stmt::Scope(self.scope()?)),
            Some(TokenKind::Keyword(word)) if word == "if" || word == "while" => self.cond(),
            _ => {
                let stmt = self.assign()?;
                self.expect(TokenKind::Semicolon, "`;` after assignment")?;
                Ok(stmt)
            }
        }
    }

    /// cond := ('if'|'while') '(' expr ')' (scope | stmt)
    ///
    /// A single-statement body is normalized to a one-element block.
    fn cond(&mut self) -> Result<Stmt, SyntaxError> {
        let word = match self.consume() {
            Some(Token {
                kind: TokenKind::Keyword(word),
                ..
            }) => word.clone(),
            _ => return Err(self.error("expected `if` or `while`")),
        };
        debug!("parsing `{}` condition", word);

        self.expect(TokenKind::OpenParen, &format!("`(` after `{}`", word))?;
        let cond = self.expr()?;
        self.expect(TokenKind::CloseParen, "`)` after condition")?;

        let body = if let Some(TokenKind::OpenBrace) = self.kind() {
            self.scope()?
        } else {
            Block {
                stmts: vec![self.stmt()?],
            }
        };

        Ok(match word.as_str() {
            "if" => Stmt::If { cond, body },
            _ => Stmt::While { cond, body },
        })
    }

    /// assign := identifier '=' expr
    fn assign(&mut self) -> Result<Stmt, SyntaxError> {
        let name = match self.current() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => name.clone(),
            _ => return Err(self.error("expected an identifier")),
        };
        self.consume();
        debug!("parsing assignment to `{}`", name);

        self.expect(TokenKind::Op(OpKind::Assign), "`=` after identifier")?;
        let value = self.expr()?;

        Ok(Stmt::Assign { name, value })
    }

    /// expr := term (('+'|'-') term)*
    fn expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.term()?;

        while let Some(TokenKind::Op(op @ (OpKind::Add | OpKind::Sub))) = self.kind() {
            let op = match op {
                OpKind::Add => BinOp::Add,
                _ => BinOp::Sub,
            };
            self.consume();

            let rhs = self.term()?;
            lhs = Expr::Bin {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    /// term := power (('*'|'/') power)*
    fn term(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.power()?;

        while let Some(TokenKind::Op(op @ (OpKind::Mul | OpKind::Div))) = self.kind() {
            let op = match op {
                OpKind::Mul => BinOp::Mul,
                _ => BinOp::Div,
            };
            self.consume();

            let rhs = self.power()?;
            lhs = Expr::Bin {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    /// power := atom ('^' atom)*, folding left.
    fn power(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.atom()?;

        while let Some(TokenKind::Op(OpKind::Pow)) = self.kind() {
            self.consume();

            let rhs = self.atom()?;
            lhs = Expr::Bin {
                op: BinOp::Pow,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    /// atom := '(' expr ')' | number | identifier | keyword '(' expr ')'
    fn atom(&mut self) -> Result<Expr, SyntaxError> {
        match self.kind() {
            Some(TokenKind::OpenParen) => {
                self.consume();
                let inner = self.expr()?;
                self.expect(TokenKind::CloseParen, "`)`")?;
                Ok(inner)
            }
            Some(TokenKind::Number(val)) => {
                let val = *val;
                debug!("atom number {}", val);
                self.consume();
                Ok(Expr::Num(val))
            }
            Some(TokenKind::Ident(name)) => {
                let name = name.clone();
                self.consume();
                Ok(Expr::Var(name))
            }
            Some(TokenKind::Keyword(word)) => {
                let name = word.clone();
                if name == "if" || name == "while" {
                    return Err(self.error(&format!("`{}` is not allowed in an expression", name)));
                }
                self.consume();

                self.expect(TokenKind::OpenParen, &format!("`(` after `{}`", name))?;
                let arg = self.expr()?;
                self.expect(TokenKind::CloseParen, &format!("`)` after `{}` argument", name))?;

                Ok(Expr::Call {
                    name,
                    arg: Box::new(arg),
                })
            }
            _ => Err(self.error("expected an expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;

    fn parse(source: &str) -> Block {
        Parser::new(tokenize(source).unwrap()).run().unwrap()
    }

    fn parse_err(source: &str) -> SyntaxError {
        Parser::new(tokenize(source).unwrap()).run().unwrap_err()
    }

    /// Numeric evaluation over an environment-free expression.
    fn eval(expr: &Expr) -> f64 {
        match expr {
            Expr::Num(val) => *val,
            Expr::Bin { op, lhs, rhs } => {
                let (l, r) = (eval(lhs), eval(rhs));
                match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => l / r,
                    BinOp::Pow => l.powf(r),
                }
            }
            _ => panic!("eval only supports numeric expressions"),
        }
    }

    fn single_assign_value(source: &str) -> Expr {
        let block = parse(source);
        assert_eq!(block.stmts.len(), 1);
        match &block.stmts[0] {
            Stmt::Assign { value, .. } => value.clone(),
            other => panic!("expected an assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence() {
        let value = single_assign_value("{ x = 2 + 3 * 4; }");

        match &value {
            Expr::Bin { op: BinOp::Add, rhs, .. } => {
                assert!(matches!(**rhs, Expr::Bin { op: BinOp::Mul, .. }));
            }
            other => panic!("expected `+` at the root, got {:?}", other),
        }

        assert_eq!(eval(&value), 14.0);
    }

    #[test]
    fn test_power_folds_left() {
        let value = single_assign_value("{ x = 2 ^ 3 ^ 2; }");

        // (2^3)^2 = 64, not 2^(3^2) = 512.
        match &value {
            Expr::Bin { op: BinOp::Pow, lhs, .. } => {
                assert!(matches!(**lhs, Expr::Bin { op: BinOp::Pow, .. }));
            }
            other => panic!("expected `^` at the root, got {:?}", other),
        }
        assert_eq!(eval(&value), 64.0);
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let value = single_assign_value("{ x = (2 + 3) * 4; }");
        assert_eq!(eval(&value), 20.0);
    }

    #[test]
    fn test_statement_order_across_nested_scopes() {
        // Three nested scopes close back-to-back, then two siblings
        // follow; the parent block must hold them in lexical order.
        let block = parse("{ { a = 1; } { b = 2; } { c = 3; } d = 4; e = 5; }");

        assert_eq!(block.stmts.len(), 5);
        for stmt in &block.stmts[..3] {
            assert!(matches!(stmt, Stmt::Scope(_)));
        }
        assert!(matches!(&block.stmts[3], Stmt::Assign { name, .. } if name == "d"));
        assert!(matches!(&block.stmts[4], Stmt::Assign { name, .. } if name == "e"));
    }

    #[test]
    fn test_deeply_nested_scope_keeps_trailing_sibling() {
        let block = parse("{ { { x = 1; } } y = 2; }");

        assert_eq!(block.stmts.len(), 2);
        match &block.stmts[0] {
            Stmt::Scope(inner) => {
                assert_eq!(inner.stmts.len(), 1);
                assert!(matches!(inner.stmts[0], Stmt::Scope(_)));
            }
            other => panic!("expected a nested scope, got {:?}", other),
        }
        assert!(matches!(&block.stmts[1], Stmt::Assign { name, .. } if name == "y"));
    }

    #[test]
    fn test_empty_scope() {
        let block = parse("{ }");
        assert!(block.stmts.is_empty());
    }

    #[test]
    fn test_while_with_scope_body() {
        let block = parse("{ while (x - 10) { x = x + 1; y = print(x); } }");

        match &block.stmts[0] {
            Stmt::While { body, .. } => assert_eq!(body.stmts.len(), 2),
            other => panic!("expected a while statement, got {:?}", other),
        }
    }

    #[test]
    fn test_builtin_call_illegal_in_statement_position() {
        // Builtins are expressions only; a bare call cannot stand as a
        // statement.
        assert!(parse_err("{ print(x); }").message.contains("identifier"));
    }

    #[test]
    fn test_if_single_statement_body_normalized() {
        let block = parse("{ if (x) y = 1; }");

        match &block.stmts[0] {
            Stmt::If { body, .. } => {
                assert_eq!(body.stmts.len(), 1);
                assert!(matches!(&body.stmts[0], Stmt::Assign { name, .. } if name == "y"));
            }
            other => panic!("expected an if statement, got {:?}", other),
        }
    }

    #[test]
    fn test_keyword_call_in_expression() {
        let value = single_assign_value("{ x = sqrt(y + 1); }");

        match value {
            Expr::Call { name, arg } => {
                assert_eq!(name, "sqrt");
                assert!(matches!(*arg, Expr::Bin { op: BinOp::Add, .. }));
            }
            other => panic!("expected a call, got {:?}", other),
        }
    }

    #[test]
    fn test_control_keyword_illegal_in_expression() {
        assert!(parse_err("{ x = if; }").message.contains("if"));
    }

    #[test]
    fn test_fail_fast() {
        // Missing semicolon.
        parse_err("{ x = 1 }");
        // Missing closing brace.
        parse_err("{ x = 1;");
        // Missing closing parenthesis.
        parse_err("{ if (x { y = 1; } }");
        // Missing condition parentheses entirely.
        parse_err("{ while x { y = 1; } }");
        // Trailing tokens after the top-level scope.
        parse_err("{ x = 1; } y = 2;");
    }

    #[test]
    fn test_error_carries_line() {
        let err = parse_err("{\n x = 1;\n y = ;\n}");
        assert_eq!(err.line, 3);
    }
}
