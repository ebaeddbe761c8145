//! KV → SwiftUI generator
//!
//! Rules become `View` structs, the root widget becomes either a bare view
//! expression or its own struct. Widget classes resolve through the
//! `WidgetTable`; properties become modifiers.

use std::collections::HashSet;

use log::{debug, warn};

use super::codegen::{Generated, Generator};
use super::printer::expr_str;
use super::swift_ast::*;
use crate::config::{GeneratorConfig, MappingTables};
use crate::feedback::{Diagnostic, UNKNOWN_WIDGET};
use crate::frontend::kv::ast::{CanvasBlock, KvModule, Property, Rule, Widget};
use crate::frontend::kv::printer::format_value;
use crate::middle::literal::Literal;
use crate::middle::widgets::{is_builtin_layout, WidgetKind};

/// Consumed by view construction for every widget
const CONSTRUCTION_PROPERTIES: &[&str] = &["text", "source", "orientation", "value", "isOn", "id"];

/// Bare identifiers rendered as `.member`
const ENUM_KEYWORDS: &[&str] = &[
    "center",
    "left",
    "right",
    "top",
    "bottom",
    "middle",
    "vertical",
    "horizontal",
];

const NAMED_COLORS: &[&str] = &[
    "red", "blue", "green", "yellow", "orange", "purple", "pink", "white", "black", "gray",
    "clear",
];

const UNIT_SUFFIXES: &[&str] = &["dp", "sp", "px", "pt"];

pub struct SwiftUiGenerator<'a> {
    config: &'a GeneratorConfig,
    tables: &'a MappingTables,
}

/// Per-run state: rule names in scope and collected warnings
struct Context<'m> {
    rules: HashSet<&'m str>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> SwiftUiGenerator<'a> {
    pub fn new(config: &'a GeneratorConfig, tables: &'a MappingTables) -> Self {
        Self { config, tables }
    }

    fn rule_struct(&self, rule: &Rule, ctx: &mut Context) -> ViewStruct {
        let name = rule.primary_name().to_string();
        let header = rule.selectors.first().map(ToString::to_string).unwrap_or_else(|| name.clone());

        // `<Name@Base>:` renders as an instance of its base class
        if let Some(base) = rule.base() {
            let widget = rule.as_widget(base);
            return ViewStruct {
                comment: self.comment(format!("Generated from KV rule: <{}>", header)),
                state: self.state_vars(std::iter::once(&widget)),
                body: self.view(&widget, ctx),
                name,
            };
        }

        let mut body = match rule.children.as_slice() {
            [] => ViewExpr::new(Call::new("EmptyView", vec![])),
            [only] => self.view(only, ctx),
            many => {
                let mut stack = ViewExpr::new(Call::bare("VStack"));
                stack.children = Some(many.iter().map(|w| self.view(w, ctx)).collect());
                stack
            }
        };
        self.push_modifiers(&rule.properties, &[], &mut body.modifiers);
        self.push_canvas(&rule.canvas, &mut body.modifiers);

        ViewStruct {
            comment: self.comment(format!("Generated from KV rule: <{}>", header)),
            state: self.state_vars(rule.children.iter()),
            name,
            body,
        }
    }

    fn widget_struct(&self, widget: &Widget, ctx: &mut Context) -> ViewStruct {
        let mut name = widget
            .id()
            .map(capitalize)
            .unwrap_or_else(|| widget.name.clone());
        if ctx.rules.contains(name.as_str()) {
            name.push_str("View");
        }

        ViewStruct {
            comment: self.comment(format!("Generated from KV widget: {}", widget.name)),
            name,
            state: self.state_vars(std::iter::once(widget)),
            body: self.view(widget, ctx),
        }
    }

    fn comment(&self, text: String) -> Option<String> {
        self.config.include_comments.then_some(text)
    }

    fn resolve(&self, widget: &Widget, ctx: &Context) -> Option<WidgetKind> {
        if let Some(kind) = self.tables.widgets.lookup(&widget.name) {
            return Some(kind.clone());
        }
        ctx.rules
            .contains(widget.name.as_str())
            .then(|| WidgetKind::Custom(widget.name.clone()))
    }

    // ==================== Views ====================

    fn view(&self, widget: &Widget, ctx: &mut Context) -> ViewExpr {
        let kind = self.resolve(widget, ctx);
        let (mut view, consumed) = match &kind {
            Some(kind) => self.construct(kind, widget),
            None => {
                let message = format!("unknown widget '{}'", widget.name);
                warn!("{}; falling back to VStack", message);
                ctx.diagnostics
                    .push(Diagnostic::warning(UNKNOWN_WIDGET, message, Some(widget.span)));
                let mut view = ViewExpr::new(Call::bare("VStack"));
                view.comment = self.comment(format!("Unknown widget: {}", widget.name));
                (view, &[][..])
            }
        };

        let children: Vec<ViewExpr> = widget.children.iter().map(|c| self.view(c, ctx)).collect();
        let is_container = kind.as_ref().map_or(true, WidgetKind::is_container);

        self.push_modifiers(&widget.properties, consumed, &mut view.modifiers);
        if is_container {
            view.children = Some(children);
        } else if !children.is_empty() {
            view.modifiers.push(ViewModifier::Block {
                name: "overlay".to_string(),
                children,
            });
        }
        self.push_canvas(&widget.canvas, &mut view.modifiers);

        view
    }

    /// Build the constructor call. Returns the extra properties it consumed.
    fn construct(&self, kind: &WidgetKind, widget: &Widget) -> (ViewExpr, &'static [&'static str]) {
        let prefix = widget.id().map(|id| format!("{}_", id)).unwrap_or_default();
        let prop = |name: &str| widget.property(name).map(literal_expr);

        match kind {
            WidgetKind::Stack => {
                let horizontal = widget
                    .property("orientation")
                    .and_then(Literal::as_text)
                    .map_or(false, |o| o == "horizontal");
                let callee = if horizontal { "HStack" } else { "VStack" };
                let call = match prop("spacing") {
                    Some(spacing) => Call::new(callee, vec![Argument::labeled("spacing", spacing)]),
                    None => Call::bare(callee),
                };
                (ViewExpr::new(call), &["spacing"])
            }
            WidgetKind::VStack => (ViewExpr::new(Call::bare("VStack")), &[]),
            WidgetKind::HStack => (ViewExpr::new(Call::bare("HStack")), &[]),
            WidgetKind::Grid => {
                let columns = match widget.property("cols") {
                    Some(Literal::Integer(n)) => {
                        format!("Array(repeating: GridItem(.flexible()), count: {})", n)
                    }
                    _ => "[GridItem(.adaptive(minimum: 100))]".to_string(),
                };
                let call = Call::new("LazyVGrid", vec![Argument::labeled("columns", Expr::raw(columns))]);
                (ViewExpr::new(call), &["cols"])
            }
            WidgetKind::ZStackTopLeading => {
                let call = Call::new(
                    "ZStack",
                    vec![Argument::labeled("alignment", Expr::Member("topLeading".into()))],
                );
                (ViewExpr::new(call), &[])
            }
            WidgetKind::ZStack => (ViewExpr::new(Call::bare("ZStack")), &[]),
            WidgetKind::ScrollView => (ViewExpr::new(Call::bare("ScrollView")), &[]),
            WidgetKind::Text => {
                let text = prop("text").unwrap_or_else(|| Expr::Str("Text".into()));
                (ViewExpr::new(Call::new("Text", vec![Argument::positional(text)])), &[])
            }
            WidgetKind::Button => {
                let text = prop("text").unwrap_or_else(|| Expr::Str("Button".into()));
                let mut view = ViewExpr::new(Call::new("Button", vec![Argument::positional(text)]));
                let handlers = ["on_press", "on_release"];
                view.action = Some(if self.config.include_comments {
                    widget
                        .properties
                        .iter()
                        .filter(|p| handlers.contains(&p.name.as_str()))
                        .map(|p| format!("// {}: {}", p.name, format_value(&p.value)))
                        .collect()
                } else {
                    Vec::new()
                });
                (view, &["on_press", "on_release"])
            }
            WidgetKind::TextField => {
                let hint = prop("hint_text").unwrap_or_else(|| Expr::Str("Input".into()));
                let call = Call::new(
                    "TextField",
                    vec![
                        Argument::positional(hint),
                        Argument::labeled("text", Expr::raw(format!("${}text", prefix))),
                    ],
                );
                (ViewExpr::new(call), &["hint_text"])
            }
            WidgetKind::Image => {
                let source = prop("source").unwrap_or_else(|| Expr::Str("image".into()));
                (ViewExpr::new(Call::new("Image", vec![Argument::positional(source)])), &[])
            }
            WidgetKind::Slider => {
                let mut args = vec![Argument::labeled("value", Expr::raw(format!("${}value", prefix)))];
                if let (Some(min), Some(max)) = (prop("min"), prop("max")) {
                    let range = format!("{}...{}", expr_str(&min), expr_str(&max));
                    args.push(Argument::labeled("in", Expr::raw(range)));
                }
                (ViewExpr::new(Call::new("Slider", args)), &["min", "max"])
            }
            WidgetKind::Toggle => {
                let call = Call::new(
                    "Toggle",
                    vec![
                        Argument::positional(Expr::Str("Switch".into())),
                        Argument::labeled("isOn", Expr::raw(format!("${}isOn", prefix))),
                    ],
                );
                (ViewExpr::new(call), &["active"])
            }
            WidgetKind::ProgressView => {
                let value = prop("value").unwrap_or_else(|| Expr::raw("progress"));
                let mut args = vec![Argument::labeled("value", value)];
                if let Some(total) = prop("max") {
                    args.push(Argument::labeled("total", total));
                }
                (ViewExpr::new(Call::new("ProgressView", args)), &["max"])
            }
            WidgetKind::Custom(name) => (ViewExpr::new(Call::new(name.clone(), vec![])), &[]),
        }
    }

    // ==================== Modifiers ====================

    fn push_modifiers(&self, properties: &[Property], consumed: &[&str], out: &mut Vec<ViewModifier>) {
        for prop in properties {
            let name = prop.name.as_str();
            if CONSTRUCTION_PROPERTIES.contains(&name) || consumed.contains(&name) {
                continue;
            }
            let modifiers = property_modifiers(prop);
            if modifiers.is_empty() {
                if self.config.include_comments {
                    out.push(ViewModifier::Comment(format!(
                        "kv: {}: {}",
                        prop.name,
                        format_value(&prop.value)
                    )));
                }
            } else {
                out.extend(modifiers);
            }
        }
    }

    fn push_canvas(&self, canvas: &[CanvasBlock], out: &mut Vec<ViewModifier>) {
        if !self.config.include_comments {
            return;
        }
        for block in canvas {
            out.push(ViewModifier::Comment(format!(
                "kv: {} ({} instructions) not translated",
                block.name,
                block.instructions.len()
            )));
        }
    }

    // ==================== State ====================

    fn state_vars<'w>(&self, widgets: impl Iterator<Item = &'w Widget>) -> Vec<StateVar> {
        if !self.config.generate_state_properties {
            return Vec::new();
        }
        let mut collector = StateCollector::default();
        for widget in widgets {
            collector.visit(widget, self);
        }
        collector.vars
    }
}

impl Generator for SwiftUiGenerator<'_> {
    type Input = KvModule;
    type Output = SourceFile;

    fn generate(&self, module: &KvModule) -> Generated {
        let mut ctx = Context {
            rules: module
                .rules
                .iter()
                .flat_map(|r| r.selectors.iter().map(|s| s.name.as_str()))
                .collect(),
            diagnostics: Vec::new(),
        };

        let mut file = SourceFile {
            imports: vec!["SwiftUI".to_string()],
            items: Vec::new(),
        };
        for rule in &module.rules {
            file.items.push(Item::ViewStruct(self.rule_struct(rule, &mut ctx)));
        }
        if let Some(root) = &module.root {
            let item = if self.config.generate_structs && !is_builtin_layout(&root.name) {
                Item::ViewStruct(self.widget_struct(root, &mut ctx))
            } else {
                Item::View(self.view(root, &mut ctx))
            };
            file.items.push(item);
        }

        debug!(
            "swiftui: {} rules, {} widgets, {} warnings",
            module.rules.len(),
            module.widget_count(),
            ctx.diagnostics.len()
        );
        Generated {
            file,
            diagnostics: ctx.diagnostics,
        }
    }

    fn name(&self) -> &str {
        "swiftui"
    }
}

#[derive(Default)]
struct StateCollector {
    vars: Vec<StateVar>,
    seen: HashSet<String>,
}

impl StateCollector {
    fn visit(&mut self, widget: &Widget, generator: &SwiftUiGenerator) {
        let prefix = widget.id().map(|id| format!("{}_", id)).unwrap_or_default();
        match generator.tables.widgets.lookup(&widget.name) {
            Some(WidgetKind::TextField) => {
                self.add(format!("{}text", prefix), "String", Expr::Str(String::new()))
            }
            Some(WidgetKind::Slider) => self.add(format!("{}value", prefix), "Double", Expr::Float(0.5)),
            Some(WidgetKind::Toggle) => self.add(format!("{}isOn", prefix), "Bool", Expr::Bool(false)),
            _ => {}
        }

        if widget.properties.iter().any(|p| p.value.is_dynamic()) {
            self.add("dynamicWidth".to_string(), "CGFloat", Expr::Int(100));
            self.add("dynamicHeight".to_string(), "CGFloat", Expr::Int(100));
        }

        for child in &widget.children {
            self.visit(child, generator);
        }
    }

    fn add(&mut self, name: String, ty: &str, value: Expr) {
        if self.seen.insert(name.clone()) {
            self.vars.push(StateVar {
                name,
                ty: ty.to_string(),
                value,
            });
        }
    }
}

// ==================== Property Translation ====================

/// Modifiers for one property. Empty when there is no translation.
fn property_modifiers(prop: &Property) -> Vec<ViewModifier> {
    let value = &prop.value;
    let one = |name: &str, args: Vec<Argument>| vec![ViewModifier::Call(Call::new(name, args))];
    let infinity = || Expr::Member("infinity".into());

    match prop.name.as_str() {
        "size" => match pair(value) {
            Some((w, h)) => one("frame", vec![Argument::labeled("width", w), Argument::labeled("height", h)]),
            None => Vec::new(),
        },
        "size_hint" => one(
            "frame",
            vec![
                Argument::labeled("maxWidth", infinity()),
                Argument::labeled("maxHeight", infinity()),
            ],
        ),
        "width" => one("frame", vec![Argument::labeled("width", value_expr(value))]),
        "height" => one("frame", vec![Argument::labeled("height", value_expr(value))]),
        "pos" => match pair(value) {
            Some((x, y)) => one("offset", vec![Argument::labeled("x", x), Argument::labeled("y", y)]),
            None => Vec::new(),
        },
        "padding" => padding_modifiers(value),
        "color" | "foreground_color" => one("foregroundColor", vec![Argument::positional(color_expr(value))]),
        "background_color" => one("background", vec![Argument::positional(color_expr(value))]),
        "font_size" => {
            let system = Call::new(".system", vec![Argument::labeled("size", value_expr(value))]);
            one("font", vec![Argument::positional(Expr::Call(system))])
        }
        "opacity" => one("opacity", vec![Argument::positional(value_expr(value))]),
        "disabled" => one("disabled", vec![Argument::positional(value_expr(value))]),
        "halign" => {
            let alignment = match value.as_text() {
                Some("left") => "leading",
                Some("right") => "trailing",
                Some("center") => "center",
                _ => return Vec::new(),
            };
            one(
                "frame",
                vec![
                    Argument::labeled("maxWidth", infinity()),
                    Argument::labeled("alignment", Expr::Member(alignment.into())),
                ],
            )
        }
        "valign" => {
            let alignment = match value.as_text() {
                Some("top") => "top",
                Some("bottom") => "bottom",
                Some("middle") | Some("center") => "center",
                _ => return Vec::new(),
            };
            one(
                "frame",
                vec![
                    Argument::labeled("maxHeight", infinity()),
                    Argument::labeled("alignment", Expr::Member(alignment.into())),
                ],
            )
        }
        _ => Vec::new(),
    }
}

/// KV padding is `[left, top, right, bottom]`, `[horizontal, vertical]` or one value
fn padding_modifiers(value: &Literal) -> Vec<ViewModifier> {
    let padding = |args: Vec<Argument>| ViewModifier::Call(Call::new("padding", args));

    match value.elements() {
        None => vec![padding(vec![Argument::positional(value_expr(value))])],
        Some([all]) => vec![padding(vec![Argument::positional(value_expr(all))])],
        Some([h, v]) => vec![
            padding(vec![
                Argument::positional(Expr::Member("horizontal".into())),
                Argument::positional(value_expr(h)),
            ]),
            padding(vec![
                Argument::positional(Expr::Member("vertical".into())),
                Argument::positional(value_expr(v)),
            ]),
        ],
        Some([left, top, right, bottom]) => {
            let insets = Call::new(
                "EdgeInsets",
                vec![
                    Argument::labeled("top", value_expr(top)),
                    Argument::labeled("leading", value_expr(left)),
                    Argument::labeled("bottom", value_expr(bottom)),
                    Argument::labeled("trailing", value_expr(right)),
                ],
            );
            vec![padding(vec![Argument::positional(Expr::Call(insets))])]
        }
        Some(_) => Vec::new(),
    }
}

fn pair(value: &Literal) -> Option<(Expr, Expr)> {
    match value.elements() {
        Some([a, b]) => Some((value_expr(a), value_expr(b))),
        _ => None,
    }
}

/// `[r, g, b(, a)]`, a colour name, or `.primary`
fn color_expr(value: &Literal) -> Expr {
    if let Some(items) = value.elements() {
        if items.len() >= 3 {
            let alpha = items.get(3).map(value_expr).unwrap_or(Expr::Int(1));
            return Expr::Call(Call::new(
                "Color",
                vec![
                    Argument::labeled("red", value_expr(&items[0])),
                    Argument::labeled("green", value_expr(&items[1])),
                    Argument::labeled("blue", value_expr(&items[2])),
                    Argument::labeled("opacity", alpha),
                ],
            ));
        }
    }

    let name = value.as_text().map(str::to_lowercase).unwrap_or_default();
    let name = if name == "grey" { "gray".to_string() } else { name };
    if NAMED_COLORS.contains(&name.as_str()) {
        Expr::Member(name)
    } else {
        Expr::Member("primary".to_string())
    }
}

pub fn literal_expr(value: &Literal) -> Expr {
    match value {
        Literal::String(s) => Expr::Str(s.clone()),
        Literal::Integer(i) => Expr::Int(*i),
        Literal::Float(f) => Expr::Float(*f),
        Literal::Bool(b) => Expr::Bool(*b),
        Literal::Identifier(name) if ENUM_KEYWORDS.contains(&name.as_str()) => {
            Expr::Member(name.clone())
        }
        Literal::Identifier(name) if name == "None" => Expr::raw("nil"),
        Literal::Identifier(name) if name.contains('.') => Expr::raw(name.clone()),
        Literal::Identifier(name) => Expr::Str(name.clone()),
        Literal::List(items) => Expr::Array(items.iter().map(literal_expr).collect()),
        Literal::Tuple(items) => Expr::Tuple(items.iter().map(literal_expr).collect()),
        Literal::Call { callee, args } => match (callee.as_str(), args.as_slice()) {
            ("dp" | "sp", [inner]) => literal_expr(inner),
            _ => Expr::Call(Call::new(
                callee.clone(),
                args.iter().map(|a| Argument::positional(literal_expr(a))).collect(),
            )),
        },
        Literal::Expression(text) => Expr::raw(interpolation(text).unwrap_or_else(|| text.clone())),
    }
}

/// A lone f-string as a Swift interpolated string literal:
/// `f"{app.title}-{n}"` becomes `"\(app.title)-\(n)"`.
fn interpolation(text: &str) -> Option<String> {
    let body = text.strip_prefix('f').or_else(|| text.strip_prefix('F'))?;
    let quote = body.chars().next().filter(|q| *q == '\'' || *q == '"')?;
    let inner = body.get(1..body.len() - 1).filter(|_| body.len() >= 2 && body.ends_with(quote))?;
    if closes_early(inner, quote) {
        return None; // `f"a" + f"b"`
    }

    let mut out = String::from("\"");
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut field = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    field.push(c);
                }
                // Format specs and conversions have no Swift counterpart
                let expr = field.split([':', '!']).next().unwrap_or_default().trim();
                out.push_str(&format!("\\({})", expr));
            }
            // An unescaped quote of the other kind would end the literal early
            '"' => out.push_str("\\\""),
            '\\' => {
                out.push('\\');
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            other => out.push(other),
        }
    }
    out.push('"');
    Some(out)
}

fn closes_early(inner: &str, quote: char) -> bool {
    let mut escaped = false;
    for c in inner.chars() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return true;
        }
    }
    false
}

/// Like `literal_expr`, but a dimension string such as `'10dp'` becomes a number
fn value_expr(value: &Literal) -> Expr {
    match value {
        Literal::String(s) => unit_number(s).unwrap_or_else(|| literal_expr(value)),
        _ => literal_expr(value),
    }
}

fn unit_number(text: &str) -> Option<Expr> {
    let number = UNIT_SUFFIXES.iter().find_map(|unit| text.strip_suffix(unit))?;
    if let Ok(i) = number.parse::<i64>() {
        return Some(Expr::Int(i));
    }
    number.parse::<f64>().ok().map(Expr::Float)
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
