//! Token definitions for the Python class-declaration language

use crate::utils::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Structure
    Indent,
    Dedent,
    Newline,
    Eof,

    // Keywords
    Class,
    Def,
    Pass,

    // Literals
    Identifier(String),
    Integer(i64),
    Float(f64),
    String(String),

    // Punctuation
    Colon,      // :
    Comma,      // ,
    Dot,        // .
    Ellipsis,   // ...
    Arrow,      // ->
    At,         // @
    Pipe,       // |
    Eq,         // =
    Star,       // *
    DoubleStar, // **
    LParen,     // (
    RParen,     // )
    LBracket,   // [
    RBracket,   // ]
    LBrace,     // {
    RBrace,     // }

    /// Any other operator run (`+`, `==`, `<=`, ...). Only appears in
    /// method bodies and default expressions, which are never translated.
    Operator(String),
}

impl TokenKind {
    /// Human-readable form used in parse errors
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Indent => "indent".to_string(),
            TokenKind::Dedent => "dedent".to_string(),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Class => "'class'".to_string(),
            TokenKind::Def => "'def'".to_string(),
            TokenKind::Pass => "'pass'".to_string(),
            TokenKind::Identifier(s) => format!("identifier '{}'", s),
            TokenKind::Integer(i) => format!("number {}", i),
            TokenKind::Float(f) => format!("number {}", f),
            TokenKind::String(_) => "string literal".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::Ellipsis => "'...'".to_string(),
            TokenKind::Arrow => "'->'".to_string(),
            TokenKind::At => "'@'".to_string(),
            TokenKind::Pipe => "'|'".to_string(),
            TokenKind::Eq => "'='".to_string(),
            TokenKind::Star => "'*'".to_string(),
            TokenKind::DoubleStar => "'**'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::Operator(op) => format!("'{}'", op),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
