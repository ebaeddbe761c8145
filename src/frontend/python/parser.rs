//! Parser for Python class declarations
//!
//! Only the declaration surface is read: class headers, annotated or
//! defaulted fields, decorators and method signatures. Method bodies are
//! skipped by indentation depth without being parsed.

use super::ast::*;
use super::lexer;
use super::token::{Token, TokenKind};
use crate::middle::literal::Literal;
use crate::utils::{Error, Result, Span};

/// Parse a token stream into a module.
pub fn parse(tokens: Vec<Token>) -> Result<PyModule> {
    Parser::new(tokens).parse()
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let span = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, span));
        }
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind_at(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(&kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        let t = self.peek();
        Error::parse(expected, t.kind.describe(), t.span)
    }

    fn identifier(&mut self, expected: &str) -> Result<(String, Span)> {
        match self.peek().kind.clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Ok((name, span))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    /// `a.b.c`
    fn dotted_name(&mut self, expected: &str) -> Result<(String, Span)> {
        let (mut name, span) = self.identifier(expected)?;
        while self.check(&TokenKind::Dot) {
            self.advance();
            name.push('.');
            name.push_str(&self.identifier("name after '.'")?.0);
        }
        Ok((name, span))
    }

    /// From `start` through the last real token consumed so far
    fn extent_from(&self, start: Span) -> Span {
        let end = self.tokens[..self.pos]
            .iter()
            .rev()
            .find(|t| {
                !matches!(
                    t.kind,
                    TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent | TokenKind::Eof
                )
            })
            .map_or(start.end, |t| t.span.end);
        Span::new(start.start, end.max(start.end), start.line, start.column)
    }

    fn at_line_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof)
    }

    fn end_of_line(&mut self) -> Result<()> {
        match self.peek().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of line")),
        }
    }

    fn skip_line(&mut self) {
        while !self.at_line_end() {
            self.advance();
        }
        if self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    /// Skip one statement, with its indented block if it has one
    fn skip_statement(&mut self) {
        self.skip_line();
        self.skip_block();
    }

    /// Skip an indented block, nested blocks included
    fn skip_block(&mut self) {
        if !self.match_kind(TokenKind::Indent) {
            return;
        }
        let mut depth = 1;
        while depth > 0 {
            match self.advance().kind {
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent => depth -= 1,
                TokenKind::Eof => break,
                _ => {}
            }
        }
    }

    /// Skip tokens up to a `,` or `)` at bracket depth zero
    fn skip_argument(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek().kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace if depth == 0 => return,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => depth -= 1,
                TokenKind::Comma if depth == 0 => return,
                TokenKind::Newline | TokenKind::Eof => return,
                _ => {}
            }
            self.advance();
        }
    }

    /// Skip a bracketed group starting at the opening token
    fn skip_group(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.advance().kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                TokenKind::Eof => return,
                _ => {}
            }
        }
    }

    // --- Parsing Methods ---

    pub fn parse(&mut self) -> Result<PyModule> {
        let mut module = PyModule::default();
        let mut decorators = Vec::new();

        loop {
            match self.peek().kind.clone() {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance();
                }
                TokenKind::At => decorators.push(self.parse_decorator()?),
                TokenKind::Class => {
                    let class = self.parse_class(std::mem::take(&mut decorators))?;
                    module.classes.push(class);
                }
                // Module-level functions are not part of any class surface
                TokenKind::Def => {
                    decorators.clear();
                    self.skip_statement();
                }
                TokenKind::Identifier(word) if word == "async" && *self.peek_kind_at(1) == TokenKind::Def => {
                    decorators.clear();
                    self.skip_statement();
                }
                // Imports, docstrings, assignments, `if __name__ == '__main__':` ...
                _ if decorators.is_empty() => self.skip_statement(),
                _ => return Err(self.unexpected("class or function definition")),
            }
        }

        Ok(module)
    }

    fn parse_decorator(&mut self) -> Result<Decorator> {
        let span = self.consume(TokenKind::At, "'@'")?.span;
        let (name, _) = self.dotted_name("decorator name")?;
        let has_args = self.check(&TokenKind::LParen);
        if has_args {
            self.skip_group();
        }
        self.end_of_line()?;
        Ok(Decorator { name, has_args, span })
    }

    fn parse_class(&mut self, decorators: Vec<Decorator>) -> Result<ClassDef> {
        let span = self.consume(TokenKind::Class, "'class'")?.span;
        let (name, _) = self.identifier("class name")?;

        let mut bases = Vec::new();
        if self.match_kind(TokenKind::LParen) {
            while !self.match_kind(TokenKind::RParen) {
                // `metaclass=...` and other keywords are not bases
                if matches!(self.peek_kind_at(0), TokenKind::Identifier(_))
                    && *self.peek_kind_at(1) == TokenKind::Eq
                {
                    self.skip_argument();
                } else {
                    let (base, _) = self.dotted_name("base class")?;
                    if self.check(&TokenKind::LBracket) {
                        self.skip_group();
                    }
                    bases.push(base);
                }
                if !self.match_kind(TokenKind::Comma) {
                    self.consume(TokenKind::RParen, "',' or ')'")?;
                    break;
                }
            }
        }
        self.consume(TokenKind::Colon, "':' after class header")?;

        let mut class = ClassDef {
            name,
            bases,
            decorators,
            fields: Vec::new(),
            methods: Vec::new(),
            span,
        };

        if self.at_line_end() {
            self.end_of_line()?;
            if self.match_kind(TokenKind::Indent) {
                self.parse_class_body(&mut class)?;
            }
        } else {
            // `class A: pass`
            self.parse_member(&mut class, &mut Vec::new())?;
        }

        Ok(class)
    }

    fn parse_class_body(&mut self, class: &mut ClassDef) -> Result<()> {
        let mut pending = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Dedent => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance();
                }
                _ => self.parse_member(class, &mut pending)?,
            }
        }
        Ok(())
    }

    /// One line of a class body
    fn parse_member(&mut self, class: &mut ClassDef, pending: &mut Vec<Decorator>) -> Result<()> {
        match self.peek().kind.clone() {
            TokenKind::At => pending.push(self.parse_decorator()?),
            TokenKind::Def => {
                let method = self.parse_method(std::mem::take(pending), None)?;
                class.methods.push(method);
            }
            TokenKind::Identifier(word) if word == "async" && *self.peek_kind_at(1) == TokenKind::Def => {
                let start = self.advance().span;
                let method = self.parse_method(std::mem::take(pending), Some(start))?;
                class.methods.push(method);
            }
            TokenKind::Class => {
                // Nested classes are not part of the wrapper surface
                pending.clear();
                self.skip_line();
                self.skip_block();
            }
            TokenKind::Pass | TokenKind::Ellipsis | TokenKind::String(_) => {
                self.advance();
                self.end_of_line()?;
            }
            TokenKind::Identifier(_) => {
                pending.clear();
                if let Some(field) = self.parse_field()? {
                    class.fields.push(field);
                }
            }
            _ => return Err(self.unexpected("field, method or decorator")),
        }
        Ok(())
    }

    /// `name: type [= default]` or `name = default`
    fn parse_field(&mut self) -> Result<Option<Field>> {
        let (name, span) = self.identifier("field name")?;

        let annotation = if self.match_kind(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let default = if self.match_kind(TokenKind::Eq) {
            self.parse_default()
        } else {
            None
        };
        if annotation.is_none() && default.is_none() && !self.at_line_end() {
            return Err(self.unexpected("':' or '=' after field name"));
        }
        let extent = self.extent_from(span);
        self.end_of_line()?;

        // `__slots__`, `__match_args__` and friends are not data fields
        if name.starts_with("__") && name.ends_with("__") {
            return Ok(None);
        }
        Ok(Some(Field {
            name,
            annotation,
            default,
            span,
            extent,
        }))
    }

    /// `async_span` is the `async` keyword when there was one
    fn parse_method(&mut self, decorators: Vec<Decorator>, async_span: Option<Span>) -> Result<Method> {
        let def_span = self.consume(TokenKind::Def, "'def'")?.span;
        let start = decorators
            .first()
            .map(|d| d.span)
            .or(async_span)
            .unwrap_or(def_span);
        let (name, span) = self.identifier("method name")?;
        self.consume(TokenKind::LParen, "'(' after method name")?;
        let mut params = self.parse_params()?;

        let return_type = if self.match_kind(TokenKind::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.consume(TokenKind::Colon, "':' after method signature")?;

        if self.at_line_end() {
            self.end_of_line()?;
            self.skip_block();
        } else {
            self.skip_line();
        }
        let extent = self.extent_from(start);

        let is_static = decorators.iter().any(|d| d.name == "staticmethod");
        if !is_static && !params.is_empty() {
            params.remove(0); // self / cls
        }

        Ok(Method {
            is_constructor: name == "__init__",
            name,
            params,
            return_type,
            decorators,
            is_static,
            span,
            extent,
        })
    }

    /// Parameter list after `(`, up to and including `)`
    fn parse_params(&mut self) -> Result<Vec<Param>> {
        let mut params = Vec::new();
        loop {
            if self.match_kind(TokenKind::RParen) {
                return Ok(params);
            }

            match self.peek().kind.clone() {
                // `*args`, `**kwargs` and the bare `*` / `/` markers
                TokenKind::Star | TokenKind::DoubleStar => {
                    self.advance();
                    if matches!(self.peek().kind, TokenKind::Identifier(_)) {
                        self.advance();
                        if self.match_kind(TokenKind::Colon) {
                            self.parse_type()?;
                        }
                    }
                }
                TokenKind::Operator(op) if op == "/" => {
                    self.advance();
                }
                _ => {
                    let (name, span) = self.identifier("parameter name")?;
                    let annotation = if self.match_kind(TokenKind::Colon) {
                        Some(self.parse_type()?)
                    } else {
                        None
                    };
                    if self.match_kind(TokenKind::Eq) {
                        self.skip_argument();
                    }
                    params.push(Param { name, annotation, span });
                }
            }

            if !self.match_kind(TokenKind::Comma) {
                self.consume(TokenKind::RParen, "',' or ')'")?;
                return Ok(params);
            }
        }
    }

    // --- Defaults ---

    /// A literal default value. Anything that is not a plain literal
    /// (calls with keywords, arithmetic, dicts) is skipped and yields `None`.
    fn parse_default(&mut self) -> Option<Literal> {
        let start = self.pos;
        if let Ok(value) = self.parse_value() {
            if self.at_line_end() {
                return Some(value);
            }
        }
        self.pos = start;
        self.skip_to_line_end();
        None
    }

    fn skip_to_line_end(&mut self) {
        while !self.at_line_end() {
            self.advance();
        }
    }

    fn parse_value(&mut self) -> Result<Literal> {
        let first = self.parse_atom()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.match_kind(TokenKind::Comma) {
            if self.at_line_end() {
                break;
            }
            items.push(self.parse_atom()?);
        }
        Ok(Literal::Tuple(items))
    }

    fn parse_atom(&mut self) -> Result<Literal> {
        match self.peek().kind.clone() {
            TokenKind::String(s) => {
                self.advance();
                Ok(Literal::String(s))
            }
            TokenKind::Integer(i) => {
                self.advance();
                Ok(Literal::Integer(i))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Literal::Float(f))
            }
            TokenKind::Identifier(_) => {
                let (name, _) = self.dotted_name("value")?;
                if self.match_kind(TokenKind::LParen) {
                    let args = self.parse_sequence(TokenKind::RParen)?;
                    Ok(Literal::Call { callee: name, args })
                } else {
                    Ok(Literal::from_identifier(&name))
                }
            }
            TokenKind::LBracket => {
                self.advance();
                Ok(Literal::List(self.parse_sequence(TokenKind::RBracket)?))
            }
            TokenKind::LParen => {
                self.advance();
                if self.match_kind(TokenKind::RParen) {
                    return Ok(Literal::Tuple(Vec::new()));
                }
                let first = self.parse_atom()?;
                if self.match_kind(TokenKind::RParen) {
                    return Ok(first);
                }
                self.consume(TokenKind::Comma, "',' or ')'")?;
                let mut items = vec![first];
                items.extend(self.parse_sequence(TokenKind::RParen)?);
                Ok(Literal::Tuple(items))
            }
            _ => Err(self.unexpected("value")),
        }
    }

    fn parse_sequence(&mut self, close: TokenKind) -> Result<Vec<Literal>> {
        let mut items = Vec::new();
        loop {
            if self.match_kind(close.clone()) {
                return Ok(items);
            }
            items.push(self.parse_atom()?);
            if !self.match_kind(TokenKind::Comma) {
                self.consume(close, "',' or closing bracket")?;
                return Ok(items);
            }
        }
    }

    // --- Type Annotations ---

    pub fn parse_type(&mut self) -> Result<TypeExpr> {
        let first = self.parse_type_atom()?;
        if !self.check(&TokenKind::Pipe) {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.match_kind(TokenKind::Pipe) {
            members.push(self.parse_type_atom()?);
        }
        Ok(TypeExpr::Union(members))
    }

    fn parse_type_atom(&mut self) -> Result<TypeExpr> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::Identifier(ref name) if name == "None" => {
                self.advance();
                Ok(TypeExpr::None)
            }
            TokenKind::Identifier(_) => {
                let (name, _) = self.dotted_name("type")?;
                if self.match_kind(TokenKind::LBracket) {
                    let args = self.parse_type_list(TokenKind::RBracket)?;
                    Ok(TypeExpr::Subscript { base: name, args })
                } else {
                    Ok(TypeExpr::Name(name))
                }
            }
            TokenKind::LBracket => {
                self.advance();
                Ok(TypeExpr::ListLiteral(self.parse_type_list(TokenKind::RBracket)?))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_type()?;
                self.consume(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Ellipsis => {
                self.advance();
                Ok(TypeExpr::Ellipsis)
            }
            TokenKind::String(text) => {
                self.advance();
                Ok(parse_forward(&text))
            }
            _ => Err(self.unexpected("type")),
        }
    }

    fn parse_type_list(&mut self, close: TokenKind) -> Result<Vec<TypeExpr>> {
        let mut items = Vec::new();
        loop {
            if self.match_kind(close.clone()) {
                return Ok(items);
            }
            items.push(self.parse_type()?);
            if !self.match_kind(TokenKind::Comma) {
                self.consume(close, "',' or ']'")?;
                return Ok(items);
            }
        }
    }
}

/// A quoted annotation is parsed as a type when it is one, otherwise kept
/// as an opaque forward reference.
fn parse_forward(text: &str) -> TypeExpr {
    let parsed = lexer::tokenize(text.trim()).and_then(|tokens| {
        let mut parser = Parser::new(tokens);
        let ty = parser.parse_type()?;
        parser.end_of_line()?;
        if parser.check(&TokenKind::Eof) {
            Ok(ty)
        } else {
            Err(parser.unexpected("end of annotation"))
        }
    });
    parsed.unwrap_or_else(|_| TypeExpr::Forward(text.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::python::lexer::tokenize;
    use pretty_assertions::assert_eq;

    fn parse_src(src: &str) -> Result<PyModule> {
        parse(tokenize(src)?)
    }

    fn name(s: &str) -> TypeExpr {
        TypeExpr::Name(s.to_string())
    }

    const PERSON: &str = "\
class Person:
    name: str
    age: int
    def __init__(self, name: str, age: int):
        pass
    def greet(self, text: str):
        pass
";

    #[test]
    fn test_parse_person() {
        let module = parse_src(PERSON).expect("Failed to parse");
        assert_eq!(module.classes.len(), 1);
        let class = &module.classes[0];
        assert_eq!(class.name, "Person");

        let fields: Vec<_> = class.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["name", "age"]);
        assert_eq!(class.fields[0].annotation, Some(name("str")));

        assert_eq!(class.methods.len(), 2);
        let init = class.constructor().expect("constructor");
        assert_eq!(init.params.len(), 2);
        assert_eq!(init.params[0].name, "name");

        let greet = &class.methods[1];
        assert!(!greet.is_constructor);
        assert_eq!(greet.params.len(), 1);
        assert_eq!(greet.params[0].name, "text");
        assert_eq!(greet.params[0].annotation, Some(name("str")));
    }

    #[test]
    fn test_member_extents_cover_source() {
        let src = "\
class A:
    x: int = 1
    label = StringProperty('', allownone=True)

    @property
    def y(self) -> int:
        return 2

    async def z(self): pass
";
        let module = parse_src(src).unwrap();
        let class = &module.classes[0];
        assert_eq!(class.fields[0].extent.text(src), "x: int = 1");
        assert_eq!(class.fields[1].default, None);
        assert_eq!(
            class.fields[1].extent.text(src),
            "label = StringProperty('', allownone=True)"
        );
        assert_eq!(
            class.methods[0].extent.text(src),
            "@property\n    def y(self) -> int:\n        return 2"
        );
        assert_eq!(class.methods[1].extent.text(src), "async def z(self): pass");
    }

    #[test]
    fn test_imports_decorators_and_docstrings() {
        let input = r#"
"""Module docs."""
import os
from dataclasses import dataclass

@dataclass(frozen=True)
class Config(Base, metaclass=Meta):
    """Class docs."""
    debug = False
    ratio: float = 0.5

    @staticmethod
    def create(path: str) -> "Config": ...

    @property
    def size(self) -> int:
        return len(self.items)

    @size.setter
    def size(self, value: int) -> None:
        if value < 0:
            raise ValueError("negative")
        self._size = value
"#;
        let module = parse_src(input).expect("Failed to parse");
        let class = &module.classes[0];
        assert_eq!(class.bases, vec!["Base"]);
        assert_eq!(class.decorators.len(), 1);
        assert_eq!(class.decorators[0].name, "dataclass");
        assert!(class.decorators[0].has_args);

        assert_eq!(class.fields[0].name, "debug");
        assert_eq!(class.fields[0].annotation, None);
        assert_eq!(class.fields[0].default, Some(Literal::Bool(false)));
        assert_eq!(class.fields[1].default, Some(Literal::Float(0.5)));

        let create = &class.methods[0];
        assert!(create.is_static);
        assert_eq!(create.params.len(), 1);
        assert_eq!(create.return_type, Some(name("Config")));

        assert!(class.methods[1].is_property());
        assert!(class.methods[2].is_setter());
        assert_eq!(class.methods[2].params[0].name, "value");
    }

    #[test]
    fn test_parse_type_forms() {
        let input = "
class T:
    a: list[int]
    b: [str]
    c: dict[str, list[float]]
    d: int | None
    e: Optional[datetime.datetime]
    f: 'list[Person]'
    g: tuple[int, ...]
    h: \"Some weird thing!\"
";
        let module = parse_src(input).expect("Failed to parse");
        let types: Vec<_> = module.classes[0]
            .fields
            .iter()
            .map(|f| f.annotation.clone().unwrap())
            .collect();
        assert_eq!(
            types[0],
            TypeExpr::Subscript { base: "list".to_string(), args: vec![name("int")] }
        );
        assert_eq!(types[1], TypeExpr::ListLiteral(vec![name("str")]));
        assert!(matches!(&types[2], TypeExpr::Subscript { args, .. } if args.len() == 2));
        assert_eq!(types[3], TypeExpr::Union(vec![name("int"), TypeExpr::None]));
        assert_eq!(
            types[4],
            TypeExpr::Subscript {
                base: "Optional".to_string(),
                args: vec![name("datetime.datetime")]
            }
        );
        assert_eq!(
            types[5],
            TypeExpr::Subscript { base: "list".to_string(), args: vec![name("Person")] }
        );
        assert_eq!(
            types[6],
            TypeExpr::Subscript {
                base: "tuple".to_string(),
                args: vec![name("int"), TypeExpr::Ellipsis]
            }
        );
        assert_eq!(types[7], TypeExpr::Forward("Some weird thing!".to_string()));
    }

    #[test]
    fn test_params_and_defaults() {
        let input = "
class W:
    items = field(default_factory=list)
    pair = 1, 2
    def run(self, a, b: int = 3, *args, key: str = 'x', **kwargs) -> bool: pass
    @classmethod
    def make(cls, n: int): pass
";
        let module = parse_src(input).expect("Failed to parse");
        let class = &module.classes[0];
        assert_eq!(class.fields[0].default, None);
        assert_eq!(
            class.fields[1].default,
            Some(Literal::Tuple(vec![Literal::Integer(1), Literal::Integer(2)]))
        );

        let names: Vec<_> = class.methods[0].params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "key"]);
        assert_eq!(class.methods[0].params[0].annotation, None);
        assert_eq!(class.methods[0].return_type, Some(name("bool")));

        let make = &class.methods[1];
        assert!(make.is_classmethod());
        assert_eq!(make.params.len(), 1);
        assert_eq!(make.params[0].name, "n");
    }

    #[test]
    fn test_nested_class_and_inline_bodies() {
        let input = "
class Outer:
    class Meta:
        ordering = ['name']
    x: int
class Empty: pass
class Dots:
    ...
";
        let module = parse_src(input).expect("Failed to parse");
        assert_eq!(module.classes.len(), 3);
        assert_eq!(module.classes[0].fields.len(), 1);
        assert_eq!(module.classes[0].fields[0].name, "x");
        assert!(module.classes[1].fields.is_empty());
        assert!(module.classes[2].methods.is_empty());
    }

    #[test]
    fn test_module_level_code_is_skipped() {
        let input = r#"
"""Helpers and models."""
import json

VERSION = 1
DEFAULTS = {
    "a": 1,
}

def helper(x: int) -> int:
    return x * 2

@lru_cache(maxsize=None)
def cached():
    pass

class A:
    x: int

async def fetch():
    await thing()

if __name__ == '__main__':
    a = A()
    for i in range(3):
        print(i)

class B(A):
    def run(self) -> None: ...

print(A)
"#;
        let module = parse_src(input).expect("Failed to parse");
        let names: Vec<_> = module.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(module.classes[0].fields.len(), 1);
        assert_eq!(module.classes[1].methods.len(), 1);
    }

    #[test]
    fn test_decorated_statement_is_error() {
        let err = parse_src("@dataclass
x = 1
").unwrap_err();
        match err {
            Error::Parse { expected, found, span } => {
                assert_eq!(expected, "class or function definition");
                assert_eq!(found, "identifier 'x'");
                assert_eq!(span.line, 2);
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_colon_is_error() {
        assert!(parse_src("class A\n    x: int\n").is_err());
        assert!(parse_src("class A:\n    def f(self)\n").is_err());
    }
}
