//! Python class-declaration front-end

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;

pub use ast::{ClassDef, PyModule, TypeExpr};
