//! Lexer for the KV markup language
//!
//! Converts KV source into a flat token stream. Leading whitespace on each
//! code line is turned into explicit `Indent` / `Dedent` tokens; blank lines,
//! comment lines and `#:` directives are skipped without touching the
//! indentation stack. Inside open brackets newlines are insignificant.

use super::token::{Token, TokenKind};
use crate::frontend::indent::{self, IndentChange, IndentTracker};
use crate::utils::{Error, Result, Span};

/// Tokenize KV source text.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}

pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    indent: IndentTracker,
    /// Open brackets with the span of their opening token
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

    fn peek_next(&self) -> Option<char> {
        self.input.get(self.pos + 1).copied()
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

    /// Span starting at the current position, `len` chars wide
    fn here(&self, len: usize) -> Span {
        Span::new(self.pos, self.pos + len, self.line, self.col)
    }

    fn push(&mut self, kind: TokenKind, start: Span) {
        let span = Span::new(start.start, self.pos, start.line, start.column);
        self.tokens.push(Token::new(kind, span));
    }

    fn single(&mut self, kind: TokenKind) {
        let start = self.here(1);
        self.advance();
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
                '#' => self.skip_comment(),
                '\'' | '"' => {
                    let start = self.here(0);
                    self.string(start, c, false)?
                }
                '-' if self.peek_next().map_or(false, |n| n.is_ascii_digit()) && !self.after_value() => {
                    self.number()?
                }
                '.' if self.peek_next().map_or(false, |n| n.is_ascii_digit()) => self.number()?,
                c if c.is_ascii_digit() => self.number()?,
                c if c.is_alphabetic() || c == '_' => self.identifier()?,
                // Attribute access on a call result: `root.get().text`
                '.' if self.after_value()
                    && self.peek_next().map_or(false, |n| n.is_alphabetic() || n == '_') =>
                {
                    self.identifier()?
                }
                ':' => self.single(TokenKind::Colon),
                ',' => self.single(TokenKind::Comma),
                '<' | '>' if matches!(self.peek_next(), Some('=') | Some('<') | Some('>')) => {
                    self.operator()
                }
                '<' => self.single(TokenKind::LAngle),
                '>' => self.single(TokenKind::RAngle),
                '[' | '(' | '{' => {
                    self.brackets.push((c, self.here(1)));
                    let kind = match c {
                        '[' => TokenKind::LBracket,
                        '(' => TokenKind::LParen,
                        _ => TokenKind::LBrace,
                    };
                    self.single(kind);
                }
                ']' | ')' | '}' => {
                    let (expected, kind) = match c {
                        ']' => ('[', TokenKind::RBracket),
                        ')' => ('(', TokenKind::RParen),
                        _ => ('{', TokenKind::RBrace),
                    };
                    match self.brackets.pop() {
                        Some((open, _)) if open == expected => {}
                        _ => {
                            return Err(Error::lex(format!("unmatched '{}'", c), self.here(1)));
                        }
                    }
                    self.single(kind);
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

    /// Skip to (but not past) the end of the line
    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// The previous token ends an operand
    fn after_value(&self) -> bool {
        self.tokens.last().map_or(false, |t| t.kind.ends_value())
    }

    fn identifier(&mut self) -> Result<()> {
        let start = self.here(0);
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if let Some(quote @ ('\'' | '"')) = self.peek() {
            let prefix = text.to_ascii_lowercase();
            if prefix.contains('f') && is_string_prefix(&prefix) {
                return self.format_string(start, text, quote);
            }
            if is_string_prefix(&prefix) {
                return self.string(start, quote, prefix.contains('r'));
            }
        }

        self.push(TokenKind::Identifier(text), start);
        Ok(())
    }

    /// Longest operator at the current position
    fn operator(&mut self) {
        let start = self.here(0);
        let pair: String = self.input[self.pos..].iter().take(2).collect();
        let text = if TWO_CHAR_OPERATORS.contains(&pair.as_str()) {
            pair
        } else {
            self.peek().map(String::from).unwrap_or_default()
        };
        for _ in 0..text.chars().count() {
            self.advance();
        }
        self.push(TokenKind::Operator(text), start);
    }

    fn number(&mut self) -> Result<()> {
        let start = self.here(0);
        let mut text = String::new();
        let mut is_float = false;

        if self.peek() == Some('-') {
            text.push('-');
            self.advance();
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else if c == '.'
                && !is_float
                && self.peek_next().map_or(false, |n| n.is_ascii_digit())
            {
                is_float = true;
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if let Some(c) = self.peek() {
            if c.is_alphabetic() || c == '_' {
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

    /// Quoted string starting at the opening quote. `raw` keeps backslashes.
    fn string(&mut self, start: Span, quote: char, raw: bool) -> Result<()> {
        self.advance(); // opening quote
        let mut text = String::new();

        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(Error::lex("unterminated string", start));
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some(escaped) if raw => {
                            text.push('\\');
                            text.push(escaped);
                        }
                        Some(escaped) => push_escape(&mut text, escaped),
                        None => return Err(Error::lex("unterminated string", start)),
                    }
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
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

    /// `f"..."`: the text is kept verbatim for the generator to interpolate
    fn format_string(&mut self, start: Span, prefix: String, quote: char) -> Result<()> {
        let mut text = prefix;
        text.push(quote);
        self.advance(); // opening quote
        loop {
            match self.advance() {
                None | Some('\n') => return Err(Error::lex("unterminated string", start)),
                Some('\\') => {
                    text.push('\\');
                    match self.advance() {
                        Some(escaped) if escaped != '\n' => text.push(escaped),
                        _ => return Err(Error::lex("unterminated string", start)),
                    }
                }
                Some(c) => {
                    text.push(c);
                    if c == quote {
                        break;
                    }
                }
            }
        }
        self.push(TokenKind::FString(text), start);
        Ok(())
    }
}

const OPERATOR_CHARS: &str = "+-*/%=!&|^~;@";

const TWO_CHAR_OPERATORS: &[&str] = &[
    "**", "//", "==", "!=", "<=", ">=", "<<", ">>", "+=", "-=", "*=", "/=", "->",
];

fn is_string_prefix(prefix: &str) -> bool {
    matches!(prefix, "f" | "r" | "u" | "b" | "rf" | "fr" | "rb" | "br")
}

/// Decode the character following a backslash
pub(crate) fn push_escape(text: &mut String, escaped: char) {
    match escaped {
        'n' => text.push('\n'),
        't' => text.push('\t'),
        'r' => text.push('\r'),
        '\\' | '\'' | '"' => text.push(escaped),
        other => {
            text.push('\\');
            text.push(other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_indentation() {
        let input = "
BoxLayout:
    orientation: 'vertical'
    Label:
        text: \"Hi\"
";
        let mut iter = kinds(input).into_iter();

        macro_rules! check {
            ($p:pat) => {
                let t = iter.next().unwrap();
                assert!(matches!(t, $p), "Expected {}, got {:?}", stringify!($p), t);
            };
        }

        check!(TokenKind::Identifier(_)); // BoxLayout
        check!(TokenKind::Colon);
        check!(TokenKind::Newline);

        check!(TokenKind::Indent);
        check!(TokenKind::Identifier(_)); // orientation
        check!(TokenKind::Colon);
        check!(TokenKind::String(_));
        check!(TokenKind::Newline);

        check!(TokenKind::Identifier(_)); // Label
        check!(TokenKind::Colon);
        check!(TokenKind::Newline);

        check!(TokenKind::Indent);
        check!(TokenKind::Identifier(_)); // text
        check!(TokenKind::Colon);
        check!(TokenKind::String(_));
        check!(TokenKind::Newline);

        check!(TokenKind::Dedent);
        check!(TokenKind::Dedent);
        check!(TokenKind::Eof);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_blank_and_comment_lines_do_not_affect_indentation() {
        let input = "#:kivy 2.0\nA:\n\n        # deep comment\n    b: 1\n";
        assert_eq!(
            kinds(input),
            vec![
                ident("A"),
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Indent,
                ident("b"),
                TokenKind::Colon,
                TokenKind::Integer(1),
                TokenKind::Newline,
                TokenKind::Dedent,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            kinds("x: -1, 0.5, 'a\\'b', self.width"),
            vec![
                ident("x"),
                TokenKind::Colon,
                TokenKind::Integer(-1),
                TokenKind::Comma,
                TokenKind::Float(0.5),
                TokenKind::Comma,
                TokenKind::String("a'b".to_string()),
                TokenKind::Comma,
                ident("self.width"),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_newlines_inside_brackets_are_ignored() {
        let input = "color: [1,\n        0, 0]\n";
        assert_eq!(
            kinds(input),
            vec![
                ident("color"),
                TokenKind::Colon,
                TokenKind::LBracket,
                TokenKind::Integer(1),
                TokenKind::Comma,
                TokenKind::Integer(0),
                TokenKind::Comma,
                TokenKind::Integer(0),
                TokenKind::RBracket,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_rule_header() {
        assert_eq!(
            kinds("<MyWidget>:"),
            vec![
                TokenKind::LAngle,
                ident("MyWidget"),
                TokenKind::RAngle,
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("text: 'oops\n").unwrap_err();
        match err {
            Error::Lex { reason, span } => {
                assert_eq!(reason, "unterminated string");
                assert_eq!((span.line, span.column), (1, 7));
            }
            other => panic!("Expected lex error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_character() {
        let err = tokenize("a: 1 $ 2").unwrap_err();
        assert!(matches!(err, Error::Lex { ref reason, .. } if reason.contains("'$'")));
    }

    #[test]
    fn test_inconsistent_indentation() {
        let input = "A:\n    B:\n        c: 1\n      d: 2\n";
        let err = tokenize(input).unwrap_err();
        match err {
            Error::Lex { reason, span } => {
                assert!(reason.contains("inconsistent indentation"));
                assert_eq!(span.line, 4);
            }
            other => panic!("Expected lex error, got {:?}", other),
        }
    }

    #[test]
    fn test_unmatched_brackets() {
        assert!(tokenize("a: [1, 2)").is_err());
        assert!(tokenize("a: [1, 2").is_err());
        assert!(tokenize("a: 1]").is_err());
    }

    #[test]
    fn test_spans_are_one_based() {
        let tokens = tokenize("A:\n    b: 'x'").unwrap();
        let b = tokens
            .iter()
            .find(|t| t.kind == ident("b"))
            .expect("b token");
        assert_eq!((b.span.line, b.span.column), (2, 5));
    }

    fn op(s: &str) -> TokenKind {
        TokenKind::Operator(s.to_string())
    }

    #[test]
    fn test_expression_tokens() {
        assert_eq!(
            kinds("w: self.height * 0.5 - 1"),
            vec![
                ident("w"),
                TokenKind::Colon,
                ident("self.height"),
                op("*"),
                TokenKind::Float(0.5),
                op("-"),
                TokenKind::Integer(1),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("o: -self.x <= .5"),
            vec![
                ident("o"),
                TokenKind::Colon,
                op("-"),
                ident("self.x"),
                op("<="),
                TokenKind::Float(0.5),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_dynamic_class_header() {
        assert_eq!(
            kinds("<MyButton@Button+HoverBehavior>:"),
            vec![
                TokenKind::LAngle,
                ident("MyButton"),
                op("@"),
                ident("Button"),
                op("+"),
                ident("HoverBehavior"),
                TokenKind::RAngle,
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_prefixed_strings() {
        assert_eq!(
            kinds(r#"t: f"{app.title}-{app.version}", r'\d', u'x'"#),
            vec![
                ident("t"),
                TokenKind::Colon,
                TokenKind::FString(r#"f"{app.title}-{app.version}""#.to_string()),
                TokenKind::Comma,
                TokenKind::String(r"\d".to_string()),
                TokenKind::Comma,
                TokenKind::String("x".to_string()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
        assert!(tokenize("t: f'open\n").is_err());
    }

    #[test]
    fn test_braces_and_call_attribute() {
        assert_eq!(
            kinds("p: {'x': 1,\n    'y': 2}\nq: root.get().text"),
            vec![
                ident("p"),
                TokenKind::Colon,
                TokenKind::LBrace,
                TokenKind::String("x".to_string()),
                TokenKind::Colon,
                TokenKind::Integer(1),
                TokenKind::Comma,
                TokenKind::String("y".to_string()),
                TokenKind::Colon,
                TokenKind::Integer(2),
                TokenKind::RBrace,
                TokenKind::Newline,
                ident("q"),
                TokenKind::Colon,
                ident("root.get"),
                TokenKind::LParen,
                TokenKind::RParen,
                ident(".text"),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }
}
