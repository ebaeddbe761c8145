//! Parser for the KV markup language
//!
//! Single recursive-descent pass over the token stream. A line of the form
//! `Name:` with nothing after the colon opens a widget; `name: value` is a
//! property. Indented blocks hold a widget's properties and children.

use super::ast::*;
use super::printer::{format_float, quote};
use super::token::{is_expression_keyword, Token, TokenKind};
use crate::middle::literal::Literal;
use crate::utils::{Error, Result, Span};

/// Parse a token stream into a module.
pub fn parse(tokens: Vec<Token>) -> Result<KvModule> {
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

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_operator(&mut self, op: &str) -> bool {
        if matches!(&self.peek().kind, TokenKind::Operator(o) if o == op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.peek().kind == kind {
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

    /// `Name:` followed directly by the end of the line
    fn is_header(&self) -> bool {
        matches!(self.peek_kind_at(0), TokenKind::Identifier(_))
            && *self.peek_kind_at(1) == TokenKind::Colon
            && matches!(self.peek_kind_at(2), TokenKind::Newline | TokenKind::Eof)
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

    // --- Parsing Methods ---

    pub fn parse(&mut self) -> Result<KvModule> {
        let mut module = KvModule::default();

        loop {
            match self.peek().kind.clone() {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance();
                }
                TokenKind::LAngle => module.rules.push(self.parse_rule()?),
                TokenKind::Identifier(name) => {
                    if !self.is_header() {
                        return Err(Error::parse(
                            "widget header",
                            format!("property '{}'", name),
                            self.peek().span,
                        ));
                    }
                    if module.root.is_some() {
                        return Err(Error::parse(
                            "a single root widget",
                            format!("second root widget '{}'", name),
                            self.peek().span,
                        ));
                    }
                    module.root = Some(self.parse_widget()?);
                }
                _ => return Err(self.unexpected("widget header or rule")),
            }
        }

        Ok(module)
    }

    fn parse_rule(&mut self) -> Result<Rule> {
        let span = self.consume(TokenKind::LAngle, "'<'")?.span;
        let mut selectors = vec![self.parse_selector()?];
        while self.match_kind(TokenKind::Comma) {
            selectors.push(self.parse_selector()?);
        }
        self.consume(TokenKind::RAngle, "'>'")?;
        self.consume(TokenKind::Colon, "':' after rule header")?;
        self.end_of_line()?;

        let body = self.parse_body()?;
        Ok(Rule {
            selectors,
            properties: body.properties,
            children: body.children,
            canvas: body.canvas,
            span,
        })
    }

    /// `Name` or `Name@Base+Mixin`
    fn parse_selector(&mut self) -> Result<Selector> {
        let mut selector = Selector::plain(self.identifier("rule name")?.0);
        if self.match_operator("@") {
            selector.bases.push(self.identifier("base class")?.0);
            while self.match_operator("+") {
                selector.bases.push(self.identifier("base class")?.0);
            }
        }
        Ok(selector)
    }

    fn parse_widget(&mut self) -> Result<Widget> {
        let (name, span) = self.identifier("widget name")?;
        self.consume(TokenKind::Colon, "':' after widget name")?;
        self.end_of_line()?;

        let body = self.parse_body()?;
        Ok(Widget {
            name,
            properties: body.properties,
            children: body.children,
            canvas: body.canvas,
            span,
        })
    }

    fn parse_canvas(&mut self) -> Result<CanvasBlock> {
        let (name, span) = self.identifier("canvas block")?;
        self.consume(TokenKind::Colon, "':' after canvas")?;
        self.end_of_line()?;

        let body = self.parse_body()?;
        if let Some(p) = body.properties.first() {
            return Err(Error::parse(
                "canvas instruction",
                format!("property '{}'", p.name),
                p.span,
            ));
        }
        Ok(CanvasBlock {
            name,
            instructions: body.children,
            span,
        })
    }

    /// Optional indented block of properties, canvas blocks and children
    fn parse_body(&mut self) -> Result<Body> {
        let mut body = Body::default();
        if !self.match_kind(TokenKind::Indent) {
            return Ok(body);
        }

        loop {
            match self.peek().kind.clone() {
                TokenKind::Dedent => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance();
                }
                TokenKind::Identifier(name) => {
                    if self.is_header() && starts_lowercase(&name) && !is_canvas_name(&name) {
                        let span = self.tokens[self.pos + 2].span;
                        return Err(Error::parse("property value", "end of line", span));
                    }
                    if self.is_header() {
                        if is_canvas_name(&name) {
                            body.canvas.push(self.parse_canvas()?);
                        } else {
                            body.children.push(self.parse_widget()?);
                        }
                    } else {
                        body.properties.push(self.parse_property()?);
                    }
                }
                _ => return Err(self.unexpected("property or child widget")),
            }
        }

        Ok(body)
    }

    fn parse_property(&mut self) -> Result<Property> {
        let (name, span) = self.identifier("property name")?;
        self.consume(TokenKind::Colon, "':' after property name")?;
        let value = self.parse_value()?;
        self.end_of_line()?;
        Ok(Property { name, value, span })
    }

    // --- Value Expressions ---

    /// A value, or a bare comma tuple `a, b, c`
    fn parse_value(&mut self) -> Result<Literal> {
        let first = self.parse_item()?;
        if self.peek().kind != TokenKind::Comma {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.match_kind(TokenKind::Comma) {
            if matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof) {
                break; // trailing comma
            }
            items.push(self.parse_item()?);
        }
        Ok(Literal::Tuple(items))
    }

    /// One top-level item of a value. A plain literal when it is one,
    /// otherwise the raw expression up to the next top-level comma.
    fn parse_item(&mut self) -> Result<Literal> {
        let start = self.pos;
        let structured = self.parse_atom();
        if structured.is_ok()
            && matches!(self.peek().kind, TokenKind::Comma | TokenKind::Newline | TokenKind::Eof)
        {
            return structured;
        }

        let end = self.item_end(start);
        let tokens = &self.tokens[start..end];
        if !is_expression(tokens) {
            return Err(match structured {
                Err(e) => e,
                Ok(_) => self.unexpected("',' or end of line"),
            });
        }
        let text = expression_text(tokens);
        self.pos = end;
        Ok(Literal::Expression(text))
    }

    /// Index of the comma or line end closing the item that starts at `start`
    fn item_end(&self, start: usize) -> usize {
        let mut depth = 0usize;
        let mut end = start;
        while let Some(token) = self.tokens.get(end) {
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1)
                }
                TokenKind::Comma if depth == 0 => break,
                TokenKind::Newline | TokenKind::Eof => break,
                _ => {}
            }
            end += 1;
        }
        end
    }

    fn parse_atom(&mut self) -> Result<Literal> {
        let t = self.peek().clone();
        match t.kind {
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
            TokenKind::FString(text) => {
                self.advance();
                Ok(Literal::Expression(text))
            }
            TokenKind::Identifier(name) => {
                self.advance();
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
                    return Ok(first); // grouping
                }
                self.consume(TokenKind::Comma, "',' or ')'")?;
                let mut items = vec![first];
                items.extend(self.parse_sequence(TokenKind::RParen)?);
                Ok(Literal::Tuple(items))
            }
            TokenKind::Newline | TokenKind::Eof => Err(self.unexpected("property value")),
            _ => Err(self.unexpected("value")),
        }
    }

    /// Comma separated atoms up to and including `close`; trailing comma allowed
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
}

/// Tokens that only make sense as a Python expression
fn is_expression(tokens: &[Token]) -> bool {
    tokens.iter().any(|t| match &t.kind {
        TokenKind::Operator(_)
        | TokenKind::FString(_)
        | TokenKind::LBrace
        | TokenKind::LAngle
        | TokenKind::RAngle => true,
        TokenKind::Identifier(name) => is_expression_keyword(name) || name.starts_with('.'),
        _ => false,
    })
}

/// Canonical text of an expression: binary operators spaced, unary ones
/// and brackets tight, `, ` between items.
fn expression_text(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&TokenKind> = None;
    let mut prev_unary = false;
    let mut depth = 0usize;

    for token in tokens {
        let kind = &token.kind;
        let is_keyword_arg = |k: &TokenKind| depth > 0 && matches!(k, TokenKind::Operator(op) if op == "=");
        if let Some(p) = prev {
            let tight = matches!(p, TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace)
                || matches!(
                    kind,
                    TokenKind::RParen
                        | TokenKind::RBracket
                        | TokenKind::RBrace
                        | TokenKind::Comma
                        | TokenKind::Colon
                )
                || (matches!(kind, TokenKind::LParen | TokenKind::LBracket) && p.ends_value())
                || matches!(kind, TokenKind::Identifier(name) if name.starts_with('.'))
                || matches!(kind, TokenKind::Operator(op) if op == ";")
                || prev_unary
                || is_keyword_arg(kind)
                || is_keyword_arg(p);
            if !tight {
                out.push(' ');
            }
        }

        prev_unary = matches!(kind, TokenKind::Operator(op) if matches!(op.as_str(), "-" | "+" | "~"))
            && !prev.map_or(false, TokenKind::ends_value);
        match kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                depth = depth.saturating_sub(1)
            }
            _ => {}
        }
        out.push_str(&source_text(kind));
        prev = Some(kind);
    }
    out
}

fn source_text(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Identifier(name) | TokenKind::FString(name) | TokenKind::Operator(name) => {
            name.clone()
        }
        TokenKind::Integer(i) => i.to_string(),
        TokenKind::Float(f) => format_float(*f),
        TokenKind::String(s) => quote(s),
        TokenKind::Colon => ":".to_string(),
        TokenKind::Comma => ",".to_string(),
        TokenKind::LBracket => "[".to_string(),
        TokenKind::RBracket => "]".to_string(),
        TokenKind::LParen => "(".to_string(),
        TokenKind::RParen => ")".to_string(),
        TokenKind::LBrace => "{".to_string(),
        TokenKind::RBrace => "}".to_string(),
        TokenKind::LAngle => "<".to_string(),
        TokenKind::RAngle => ">".to_string(),
        TokenKind::Indent | TokenKind::Dedent | TokenKind::Newline | TokenKind::Eof => String::new(),
    }
}

/// Widget classes are capitalised; a lowercase `name:` is a property
fn starts_lowercase(name: &str) -> bool {
    name.chars().next().map_or(false, char::is_lowercase)
}

#[derive(Default)]
struct Body {
    properties: Vec<Property>,
    children: Vec<Widget>,
    canvas: Vec<CanvasBlock>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::kv::lexer::tokenize;

    fn parse_src(src: &str) -> Result<KvModule> {
        parse(tokenize(src)?)
    }

    #[test]
    fn test_parse_simple_tree() {
        let input = "
BoxLayout:
    orientation: 'vertical'
    Label:
        text: 'Hi'
";
        let module = parse_src(input).expect("Failed to parse");
        let root = module.root.expect("root widget");
        assert_eq!(root.name, "BoxLayout");
        assert_eq!(
            root.property("orientation"),
            Some(&Literal::String("vertical".to_string()))
        );
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].name, "Label");
        assert_eq!(
            root.children[0].property("text"),
            Some(&Literal::String("Hi".to_string()))
        );
    }

    #[test]
    fn test_parse_value_forms() {
        let input = "
Widget:
    size_hint: 1.0, 0.2
    color: [0.2, 0.5, 1, 1]
    pos: (10, 20)
    halign: center
    disabled: True
    size: dp(100), dp(50)
    empty: []
";
        let module = parse_src(input).expect("Failed to parse");
        let root = module.root.unwrap();
        assert_eq!(
            root.property("size_hint"),
            Some(&Literal::Tuple(vec![Literal::Float(1.0), Literal::Float(0.2)]))
        );
        assert!(matches!(root.property("color"), Some(Literal::List(items)) if items.len() == 4));
        assert_eq!(
            root.property("pos"),
            Some(&Literal::Tuple(vec![Literal::Integer(10), Literal::Integer(20)]))
        );
        assert_eq!(
            root.property("halign"),
            Some(&Literal::Identifier("center".to_string()))
        );
        assert_eq!(root.property("disabled"), Some(&Literal::Bool(true)));
        assert_eq!(
            root.property("size"),
            Some(&Literal::Tuple(vec![
                Literal::Call { callee: "dp".to_string(), args: vec![Literal::Integer(100)] },
                Literal::Call { callee: "dp".to_string(), args: vec![Literal::Integer(50)] },
            ]))
        );
        assert_eq!(root.property("empty"), Some(&Literal::List(vec![])));
    }

    #[test]
    fn test_comma_value_is_one_property() {
        let module = parse_src("Widget:\n    pos: 1, 2, 3\n").unwrap();
        let root = module.root.unwrap();
        assert_eq!(root.properties.len(), 1);
        assert!(matches!(&root.properties[0].value, Literal::Tuple(items) if items.len() == 3));
    }

    #[test]
    fn test_parse_rules_and_canvas() {
        let input = "
#:kivy 2.0
<MyCard, OtherCard>:
    padding: 10
    Label:
        text: 'In rule'

FloatLayout:
    canvas.before:
        Color:
            rgba: 1, 1, 1, 1
        Rectangle:
            pos: self.pos
    Button:
        text: 'Go'
";
        let module = parse_src(input).expect("Failed to parse");
        assert_eq!(module.rules.len(), 1);
        let names: Vec<_> = module.rules[0].selectors.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["MyCard", "OtherCard"]);
        assert_eq!(module.rules[0].primary_name(), "MyCard");
        assert_eq!(module.rules[0].children.len(), 1);

        let root = module.root.unwrap();
        assert_eq!(root.canvas.len(), 1);
        assert_eq!(root.canvas[0].name, "canvas.before");
        assert_eq!(root.canvas[0].instructions.len(), 2);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.count(), 2);
    }

    #[test]
    fn test_empty_source() {
        let module = parse_src("").unwrap();
        assert!(module.root.is_none());
        let module = parse_src("# only a comment\n\n").unwrap();
        assert!(module.root.is_none());
    }

    #[test]
    fn test_property_before_widget_is_error() {
        let err = parse_src("text: 'Hi'\n").unwrap_err();
        match err {
            Error::Parse { expected, found, span } => {
                assert_eq!(expected, "widget header");
                assert_eq!(found, "property 'text'");
                assert_eq!(span.line, 1);
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_second_root_is_error() {
        let err = parse_src("Label:\nButton:\n").unwrap_err();
        assert!(matches!(err, Error::Parse { ref found, .. } if found.contains("second root")));
    }

    #[test]
    fn test_missing_value_is_error() {
        let err = parse_src("Label:\n    text: ,\n").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_property_without_value_is_error() {
        let err = parse_src("Label:\n    text:\n").unwrap_err();
        match err {
            Error::Parse { expected, span, .. } => {
                assert_eq!(expected, "property value");
                assert_eq!(span.line, 2);
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_widget_without_body() {
        let module = parse_src("Widget:").unwrap();
        let root = module.root.unwrap();
        assert!(root.properties.is_empty());
        assert!(root.children.is_empty());
    }

    fn expr(text: &str) -> Literal {
        Literal::Expression(text.to_string())
    }

    #[test]
    fn test_expression_values() {
        let input = r#"
Label:
    width: self.height*0.5
    opacity: -self.x
    text: 'a' + 'b'
    title: f"{app.title}-{app.version}"
    size: self.width - 10, 40
    disabled: not root.ready
    color: (1, 0, 0, 1) if self.error else (0, 0, 0, 1)
    pos_hint: {'center_x': .5, 'top': 1}
    on_press: root.go(speed=2); self.text = 'x'
    size_hint: 1, None
"#;
        let root = parse_src(input).expect("Failed to parse").root.unwrap();
        assert_eq!(root.property("width"), Some(&expr("self.height * 0.5")));
        assert_eq!(root.property("opacity"), Some(&expr("-self.x")));
        assert_eq!(root.property("text"), Some(&expr("'a' + 'b'")));
        assert_eq!(root.property("title"), Some(&expr(r#"f"{app.title}-{app.version}""#)));
        assert_eq!(
            root.property("size"),
            Some(&Literal::Tuple(vec![expr("self.width - 10"), Literal::Integer(40)]))
        );
        assert_eq!(root.property("disabled"), Some(&expr("not root.ready")));
        assert_eq!(
            root.property("color"),
            Some(&expr("(1, 0, 0, 1) if self.error else (0, 0, 0, 1)"))
        );
        assert_eq!(root.property("pos_hint"), Some(&expr("{'center_x': 0.5, 'top': 1}")));
        assert_eq!(root.property("on_press"), Some(&expr("root.go(speed=2); self.text = 'x'")));
        assert_eq!(
            root.property("size_hint"),
            Some(&Literal::Tuple(vec![Literal::Integer(1), Literal::Identifier("None".to_string())]))
        );
    }

    #[test]
    fn test_adjacent_literals_are_still_an_error() {
        let err = parse_src("Label:\n    text: 'a' 'b'\n").unwrap_err();
        match err {
            Error::Parse { found, span, .. } => {
                assert_eq!(found, "string 'b'");
                assert_eq!(span.line, 2);
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_dynamic_class_rules() {
        let input = "
<MyButton@Button>:
    text: app.title

<Fancy@Label+HoverBehavior, Plain>:
    bold: True
";
        let module = parse_src(input).expect("Failed to parse");
        assert_eq!(module.rules.len(), 2);
        assert_eq!(module.rules[0].primary_name(), "MyButton");
        assert_eq!(module.rules[0].base(), Some("Button"));
        assert_eq!(module.rules[1].selectors[0].bases, vec!["Label", "HoverBehavior"]);
        assert_eq!(module.rules[1].selectors[1], Selector::plain("Plain"));
        assert!(parse_src("<A@>:\n").is_err());
    }
}

