//! The Frontend module turns Orn language source into an AST.
//!
//! It does this with a hand-written tokenizer and a
//! single-token-lookahead recursive descent parser.

pub mod ast;
pub mod lexer;
pub mod parser;
