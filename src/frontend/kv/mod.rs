//! KV markup front-end - Lexer, Parser, Formatter

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;
pub mod printer;

pub use ast::{KvModule, Rule, Widget};
