//! Token definitions for the KV markup language

use crate::utils::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Structure
    Indent,
    Dedent,
    Newline,
    Eof,

    // Literals
    /// Bare name, may contain dots (`self.width`, `canvas.before`)
    Identifier(String),
    Integer(i64),
    Float(f64),
    String(String),
    /// `f"..."` kept as written, prefix and quotes included
    FString(String),

    // Punctuation
    Colon,    // :
    Comma,    // ,
    LBracket, // [
    RBracket, // ]
    LParen,   // (
    RParen,   // )
    LBrace,   // {
    RBrace,   // }
    LAngle,   // <
    RAngle,   // >

    /// `+`, `*`, `==`, `@`, `;` ... Only meaningful inside value expressions
    /// and `<Name@Base+Mixin>` headers.
    Operator(String),
}

impl TokenKind {
    /// Whether a token can end an operand. A `-` after one is binary.
    pub fn ends_value(&self) -> bool {
        match self {
            TokenKind::Identifier(name) => !is_expression_keyword(name),
            TokenKind::Integer(_)
            | TokenKind::Float(_)
            | TokenKind::String(_)
            | TokenKind::FString(_)
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::RBrace => true,
            _ => false,
        }
    }

    /// Human-readable form used in parse errors
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Indent => "indent".to_string(),
            TokenKind::Dedent => "dedent".to_string(),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Identifier(s) => format!("identifier '{}'", s),
            TokenKind::Integer(i) => format!("number {}", i),
            TokenKind::Float(f) => format!("number {}", f),
            TokenKind::String(s) => format!("string '{}'", s),
            TokenKind::FString(s) => format!("string {}", s),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LAngle => "'<'".to_string(),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::RAngle => "'>'".to_string(),
            TokenKind::Operator(op) => format!("'{}'", op),
        }
    }
}

/// Python words that only occur inside expressions
pub fn is_expression_keyword(name: &str) -> bool {
    matches!(
        name,
        "and" | "or" | "not" | "if" | "else" | "in" | "is" | "lambda" | "for"
    )
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
