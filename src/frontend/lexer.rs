//! This lexer tokenizes Orn language source.
use std::fmt;

/// Words that lex as `TokenKind::Keyword` rather than `TokenKind::Ident`.
/// `if` and `while` introduce control statements; the rest are callable
/// builtins.
const KEYWORDS: [&str; 7] = ["if", "while", "sin", "cos", "sqrt", "print", "input"];

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum OpKind {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Assign,
}

#[derive(Clone, PartialEq, Debug)]
pub enum TokenKind {
    Number(f64),
    Ident(String),
    Keyword(String),
    Op(OpKind),
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Semicolon,
}

// Tokens carry the 1-based line they appear on.
#[derive(Clone, PartialEq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

#[derive(Debug)]
pub struct LexError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
}

/// Tokenizes an entire source unit, or fails on the first
/// malformed token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer {
        source: source.chars().collect(),
        pos: 0,
        line: 1,
    }
    .run()
}

impl Lexer {
    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn advance(&mut self) {
        if self.current() == Some('\n') {
            self.line += 1;
        }
        self.pos += 1;
    }

    fn error(&self, message: String) -> LexError {
        LexError {
            line: self.line,
            message,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::with_capacity(256);

        while let Some(ch) = self.current() {
            if ch.is_whitespace() {
                self.advance();
                continue;
            }

            let line = self.line;
            let kind = if ch.is_ascii_digit() {
                self.number()?
            } else if is_ident_start(ch) {
                self.word()
            } else {
                self.symbol(ch)?
            };

            tokens.push(Token { kind, line });
        }

        Ok(tokens)
    }

    /// Decimal digits with at most one fractional part. `1.2.3` is
    /// rejected here rather than splitting into two tokens.
    fn number(&mut self) -> Result<TokenKind, LexError> {
        let mut text = String::new();

        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if self.current() == Some('.') {
            text.push('.');
            self.advance();

            let mut fraction = false;
            while let Some(c) = self.current() {
                if c.is_ascii_digit() {
                    fraction = true;
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }

            if !fraction || self.current() == Some('.') {
                return Err(self.error(format!("malformed number `{}`", text)));
            }
        }

        match text.parse::<f64>() {
            Ok(val) => Ok(TokenKind::Number(val)),
            Err(_) => Err(self.error(format!("malformed number `{}`", text))),
        }
    }

    fn word(&mut self) -> TokenKind {
        let mut text = String::new();

        while let Some(c) = self.current() {
            if is_ident_sym(c) {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if KEYWORDS.contains(&text.as_str()) {
            TokenKind::Keyword(text)
        } else {
            TokenKind::Ident(text)
        }
    }

    fn symbol(&mut self, ch: char) -> Result<TokenKind, LexError> {
        let kind = match ch {
            '+' => TokenKind::Op(OpKind::Add),
            '-' => TokenKind::Op(OpKind::Sub),
            '*' => TokenKind::Op(OpKind::Mul),
            '/' => TokenKind::Op(OpKind::Div),
            '^' => TokenKind::Op(OpKind::Pow),
            '=' => TokenKind::Op(OpKind::Assign),
            '{' => TokenKind::OpenBrace,
            '}' => TokenKind::CloseBrace,
            '(' => TokenKind::OpenParen,
            ')' => TokenKind::CloseParen,
            ';' => TokenKind::Semicolon,
            _ => return Err(self.error(format!("unexpected character `{}`", ch))),
        };
        self.advance();
        Ok(kind)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_sym(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
