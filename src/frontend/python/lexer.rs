//! Lexer for Python class declarations
//!
//! Produces the same Indent/Dedent structure as the KV lexer. Method bodies
//! are never translated, but they still have to lex, so every ordinary
//! Python operator is accepted and reported as `Operator`.

use super::token::{Token, TokenKind};
use crate::frontend::indent::{self, IndentChange, IndentTracker};
use crate::frontend::kv::lexer::push_escape;
use crate::utils::{Error, Result, Span};

/// Tokenize Python source text.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}

const OPERATOR_CHARS: &str = "+-*/%<>=!&^~";
const STRING_PREFIXES: &[&str] = &["r", "b", "f", "u", "rb", "br", "fr", "rf"];

pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    indent: IndentTracker,
    brackets: Vec<(char, Span)>,
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            indent: IndentTracker::new(),
            brackets: Vec::new(),
            tokens: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn here(&self, len: usize) -> Span {
        Span::new(self.pos, self.pos + len, self.line, self.col)
    }

    fn push(&mut self, kind: TokenKind, start: Span) {
        let span = Span::new(start.start, self.pos, start.line, start.column);
        self.tokens.push(Token::new(kind, span));
    }

    /// Consume `len` chars and push one token for them
    fn take(&mut self, len: usize, kind: TokenKind) {
        let start = self.here(len);
        for _ in 0..len {
            self.advance();
        }
        self.push(kind, start);
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut at_line_start = true;

        while let Some(c) = self.peek() {
            if at_line_start && self.brackets.is_empty() {
                let (width, consumed) = indent::measure(&self.input, self.pos);
                for _ in 0..consumed {
                    self.advance();
                }
                match self.peek() {
                    None => break,
                    Some('\n') | Some('\r') => {
                        self.advance();
                    }
                    Some('#') => self.skip_comment(),
                    Some(_) => {
                        at_line_start = false;
                        self.apply_indent(width)?;
                    }
                }
                continue;
            }

            match c {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '\n' => {
                    let start = self.here(1);
                    self.advance();
                    if self.brackets.is_empty() {
                        self.push(TokenKind::Newline, start);
                        at_line_start = true;
                    }
                }
                '\\' => self.line_continuation()?,
                '#' => self.skip_comment(),
                '\'' | '"' => self.string(false)?,
                c if c.is_ascii_digit() => self.number()?,
                '.' if self.peek_at(1).map_or(false, |n| n.is_ascii_digit()) => self.number()?,
                '-' if self.peek_at(1).map_or(false, |n| n.is_ascii_digit())
                    && self.previous_allows_sign() =>
                {
                    self.number()?
                }
                c if c.is_alphabetic() || c == '_' => self.identifier()?,
                '.' if self.peek_at(1) == Some('.') && self.peek_at(2) == Some('.') => {
                    self.take(3, TokenKind::Ellipsis)
                }
                '.' => self.take(1, TokenKind::Dot),
                ',' => self.take(1, TokenKind::Comma),
                '@' => self.take(1, TokenKind::At),
                ';' => self.take(1, TokenKind::Operator(";".to_string())),
                ':' if self.peek_at(1) == Some('=') => {
                    self.take(2, TokenKind::Operator(":=".to_string()))
                }
                ':' => self.take(1, TokenKind::Colon),
                '|' if self.peek_at(1) == Some('=') => {
                    self.take(2, TokenKind::Operator("|=".to_string()))
                }
                '|' => self.take(1, TokenKind::Pipe),
                '-' if self.peek_at(1) == Some('>') => self.take(2, TokenKind::Arrow),
                '(' | '[' | '{' => {
                    self.brackets.push((c, self.here(1)));
                    let kind = match c {
                        '(' => TokenKind::LParen,
                        '[' => TokenKind::LBracket,
                        _ => TokenKind::LBrace,
                    };
                    self.take(1, kind);
                }
                ')' | ']' | '}' => {
                    let expected = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match self.brackets.pop() {
                        Some((open, _)) if open == expected => {}
                        _ => {
                            return Err(Error::lex(format!("unmatched '{}'", c), self.here(1)));
                        }
                    }
                    let kind = match c {
                        ')' => TokenKind::RParen,
                        ']' => TokenKind::RBracket,
                        _ => TokenKind::RBrace,
                    };
                    self.take(1, kind);
                }
                c if OPERATOR_CHARS.contains(c) => self.operator(),
                other => {
                    return Err(Error::lex(
                        format!("invalid character '{}'", other),
                        self.here(1),
                    ));
                }
            }
        }

        self.finish()
    }

    fn apply_indent(&mut self, width: usize) -> Result<()> {
        let span = self.here(0);
        match self.indent.update(width) {
            Ok(IndentChange::Same) => {}
            Ok(IndentChange::Indent) => self.tokens.push(Token::new(TokenKind::Indent, span)),
            Ok(IndentChange::Dedent(n)) => {
                for _ in 0..n {
                    self.tokens.push(Token::new(TokenKind::Dedent, span));
                }
            }
            Err(reason) => return Err(Error::lex(reason, span)),
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Token>> {
        if let Some((open, span)) = self.brackets.last() {
            return Err(Error::lex(format!("unclosed '{}'", open), *span));
        }

        let end = self.here(0);
        if matches!(self.tokens.last(), Some(t) if t.kind != TokenKind::Newline) {
            self.tokens.push(Token::new(TokenKind::Newline, end));
        }
        for _ in 0..self.indent.close_all() {
            self.tokens.push(Token::new(TokenKind::Dedent, end));
        }
        self.tokens.push(Token::new(TokenKind::Eof, end));
        Ok(self.tokens)
    }

    /// `-` binds to a number only where an operand is expected
    fn previous_allows_sign(&self) -> bool {
        match self.tokens.last().map(|t| &t.kind) {
            None => true,
            Some(kind) => !matches!(
                kind,
                TokenKind::Identifier(_)
                    | TokenKind::Integer(_)
                    | TokenKind::Float(_)
                    | TokenKind::String(_)
                    | TokenKind::RParen
                    | TokenKind::RBracket
                    | TokenKind::RBrace
            ),
        }
    }

    fn line_continuation(&mut self) -> Result<()> {
        let span = self.here(1);
        self.advance();
        if self.peek() == Some('\r') {
            self.advance();
        }
        match self.peek() {
            Some('\n') => {
                self.advance();
                Ok(())
            }
            _ => Err(Error::lex("unexpected character after line continuation", span)),
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn operator(&mut self) {
        let start = self.here(0);
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !OPERATOR_CHARS.contains(c) {
                break;
            }
            // `->` after an operator run still starts an arrow
            if c == '-' && self.peek_at(1) == Some('>') && !text.is_empty() {
                break;
            }
            text.push(c);
            self.advance();
        }
        let kind = match text.as_str() {
            "=" => TokenKind::Eq,
            "*" => TokenKind::Star,
            "**" => TokenKind::DoubleStar,
            _ => TokenKind::Operator(text),
        };
        self.push(kind, start);
    }

    fn identifier(&mut self) -> Result<()> {
        let start = self.here(0);
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if matches!(self.peek(), Some('\'') | Some('"'))
            && STRING_PREFIXES.contains(&text.to_ascii_lowercase().as_str())
        {
            let raw = text.to_ascii_lowercase().contains('r');
            // The token should start at the prefix
            let before = self.tokens.len();
            self.string(raw)?;
            if let Some(token) = self.tokens.get_mut(before) {
                token.span = Span::new(start.start, token.span.end, start.line, start.column);
            }
            return Ok(());
        }

        let kind = match text.as_str() {
            "class" => TokenKind::Class,
            "def" => TokenKind::Def,
            "pass" => TokenKind::Pass,
            _ => TokenKind::Identifier(text),
        };
        self.push(kind, start);
        Ok(())
    }

    fn number(&mut self) -> Result<()> {
        let start = self.here(0);
        let mut text = String::new();
        let mut is_float = false;

        if self.peek() == Some('-') {
            text.push('-');
            self.advance();
        }
        if self.peek() == Some('0') {
            if let Some(radix) = self.peek_at(1).and_then(radix_of) {
                return self.radix_number(start, text, radix);
            }
        }
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => text.push(c),
                '_' => {}
                '.' if !is_float => {
                    is_float = true;
                    text.push(c);
                }
                'e' | 'E' => {
                    is_float = true;
                    text.push(c);
                    self.advance();
                    if let Some(sign @ ('+' | '-')) = self.peek() {
                        text.push(sign);
                        self.advance();
                    }
                    continue;
                }
                _ => break,
            }
            self.advance();
        }

        if let Some(c) = self.peek() {
            if c.is_alphabetic() {
                return Err(Error::lex(
                    format!("unexpected character '{}' after number '{}'", c, text),
                    self.here(1),
                ));
            }
        }

        let kind = if is_float {
            text.parse()
                .map(TokenKind::Float)
                .map_err(|_| Error::lex(format!("invalid number '{}'", text), start))?
        } else {
            text.parse()
                .map(TokenKind::Integer)
                .map_err(|_| Error::lex(format!("integer '{}' out of range", text), start))?
        };
        self.push(kind, start);
        Ok(())
    }

    /// `0x..`, `0o..` and `0b..` integers
    fn radix_number(&mut self, start: Span, sign: String, radix: u32) -> Result<()> {
        self.advance(); // 0
        self.advance(); // x / o / b
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                if c != '_' {
                    digits.push(c);
                }
                self.advance();
            } else {
                break;
            }
        }
        let value = i64::from_str_radix(&digits, radix)
            .map_err(|_| Error::lex(format!("invalid number literal '{}'", digits), start))?;
        let value = if sign.is_empty() { value } else { -value };
        self.push(TokenKind::Integer(value), start);
        Ok(())
    }

    /// Single, double and triple-quoted strings. Only triple-quoted strings
    /// may span lines.
    fn string(&mut self, raw: bool) -> Result<()> {
        let start = self.here(0);
        let quote = match self.advance() {
            Some(q) => q,
            None => return Err(Error::lex("unterminated string", start)),
        };
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.advance();
            self.advance();
        }
        let mut text = String::new();

        loop {
            match self.peek() {
                None => return Err(Error::lex("unterminated string", start)),
                Some('\n') if !triple => return Err(Error::lex("unterminated string", start)),
                Some('\\') => {
                    self.advance();
                    let escaped = match self.advance() {
                        Some(e) => e,
                        None => return Err(Error::lex("unterminated string", start)),
                    };
                    if raw {
                        text.push('\\');
                        text.push(escaped);
                    } else if escaped != '\n' {
                        push_escape(&mut text, escaped);
                    }
                }
                Some(c) if c == quote => {
                    if !triple {
                        self.advance();
                        break;
                    }
                    if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                        self.advance();
                        self.advance();
                        self.advance();
                        break;
                    }
                    text.push(c);
                    self.advance();
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }

        self.push(TokenKind::String(text), start);
        Ok(())
    }
}

fn radix_of(c: char) -> Option<u32> {
    match c {
        'x' | 'X' => Some(16),
        'o' | 'O' => Some(8),
        'b' | 'B' => Some(2),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src)
            .expect("tokenize failed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn ident(s: &str) -> TokenKind {
        TokenKind::Identifier(s.to_string())
    }

    #[test]
    fn test_class_with_method() {
        let input = "class Person:\n    name: str\n    def greet(self, text: str) -> None: ...\n";
        assert_eq!(
            kinds(input),
            vec![
                TokenKind::Class,
                ident("Person"),
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Indent,
                ident("name"),
                TokenKind::Colon,
                ident("str"),
                TokenKind::Newline,
                TokenKind::Def,
                ident("greet"),
                TokenKind::LParen,
                ident("self"),
                TokenKind::Comma,
                ident("text"),
                TokenKind::Colon,
                ident("str"),
                TokenKind::RParen,
                TokenKind::Arrow,
                ident("None"),
                TokenKind::Colon,
                TokenKind::Ellipsis,
                TokenKind::Newline,
                TokenKind::Dedent,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_docstring_spans_lines() {
        let input = "class A:\n    \"\"\"Doc\n    more\"\"\"\n    pass\n";
        let tokens = tokenize(input).unwrap();
        let doc = tokens
            .iter()
            .find(|t| matches!(t.kind, TokenKind::String(_)))
            .expect("docstring token");
        assert_eq!(doc.kind, TokenKind::String("Doc\n    more".to_string()));
        assert_eq!((doc.span.line, doc.span.column), (2, 5));
        let pass = tokens.iter().find(|t| t.kind == TokenKind::Pass).unwrap();
        assert_eq!(pass.span.line, 4);
    }

    #[test]
    fn test_operators_in_bodies() {
        assert_eq!(
            kinds("x = a - 1 == b ** 2"),
            vec![
                ident("x"),
                TokenKind::Eq,
                ident("a"),
                TokenKind::Operator("-".to_string()),
                TokenKind::Integer(1),
                TokenKind::Operator("==".to_string()),
                ident("b"),
                TokenKind::DoubleStar,
                TokenKind::Integer(2),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_negative_default_and_union() {
        assert_eq!(
            kinds("age: int | None = -1"),
            vec![
                ident("age"),
                TokenKind::Colon,
                ident("int"),
                TokenKind::Pipe,
                ident("None"),
                TokenKind::Eq,
                TokenKind::Integer(-1),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_prefixed_and_raw_strings() {
        assert_eq!(
            kinds("r'a\\d' f\"x\""),
            vec![
                TokenKind::String("a\\d".to_string()),
                TokenKind::String("x".to_string()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_line_continuation_and_brackets() {
        let input = "x = 1 + \\\n    2\ny = (1,\n  2)\n";
        let k = kinds(input);
        assert!(!k.contains(&TokenKind::Indent));
        assert_eq!(k.iter().filter(|t| **t == TokenKind::Newline).count(), 2);
    }

    #[test]
    fn test_unterminated_triple_string() {
        let err = tokenize("class A:\n    '''never closed\n").unwrap_err();
        match err {
            Error::Lex { reason, span } => {
                assert_eq!(reason, "unterminated string");
                assert_eq!(span.line, 2);
            }
            other => panic!("Expected lex error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_character() {
        let err = tokenize("x = $").unwrap_err();
        assert!(matches!(err, Error::Lex { ref reason, .. } if reason.contains("'$'")));
    }
}
