//! Swift Printer - Pretty print the output AST
//!
//! Deterministic: the same tree always prints to the same bytes.

use std::borrow::Cow;

use super::swift_ast::*;
use crate::middle::types::TypeDescriptor;

/// Pretty printer for generated Swift
pub struct Printer {
    output: String,
    indent_level: usize,
    indent_unit: String,
}

impl Printer {
    pub fn new(indent_width: usize) -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
            indent_unit: " ".repeat(indent_width.max(1)),
        }
    }

    /// Print a source file to string
    pub fn print(mut self, file: &SourceFile) -> String {
        for import in &file.imports {
            self.emit_line(&format!("import {}", import));
        }

        for (i, item) in file.items.iter().enumerate() {
            if i > 0 || !file.imports.is_empty() {
                self.output.push('\n');
            }
            self.print_item(item);
        }

        self.output
    }

    fn print_item(&mut self, item: &Item) {
        match item {
            Item::Class(class) => self.print_class(class),
            Item::ViewStruct(view) => self.print_view_struct(view),
            Item::View(expr) => self.print_view(expr),
            Item::Comment(text) => self.emit_line(&format!("// {}", text)),
        }
    }

    // --- Classes ---

    fn print_class(&mut self, class: &ClassDecl) {
        self.print_attributes(&class.attributes);
        self.emit_line(&format!(
            "{}class {} {{",
            modifier_prefix(&class.modifiers),
            escape_ident(&class.name)
        ));

        self.indent_level += 1;
        for member in &class.members {
            self.output.push('\n');
            self.print_member(member);
        }
        self.indent_level -= 1;

        self.emit_line("}");
    }

    fn print_member(&mut self, member: &Member) {
        match member {
            Member::Property(prop) => {
                self.print_attributes(&prop.attributes);
                self.emit_line(&format!(
                    "{}var {}: {}",
                    modifier_prefix(&prop.modifiers),
                    escape_ident(&prop.name),
                    type_str(&prop.ty)
                ));
            }
            Member::Initializer(init) => {
                self.print_attributes(&init.attributes);
                self.emit_line(&format!(
                    "{}init({}) {{",
                    modifier_prefix(&init.modifiers),
                    params_str(&init.params)
                ));
                self.emit_line("}");
            }
            Member::Method(method) => {
                self.print_attributes(&method.attributes);
                let mut signature = format!(
                    "{}func {}({})",
                    modifier_prefix(&method.modifiers),
                    escape_ident(&method.name),
                    params_str(&method.params)
                );
                if let Some(ret) = &method.return_type {
                    signature.push_str(" -> ");
                    signature.push_str(&type_str(ret));
                }
                if method.has_body {
                    signature.push_str(" {");
                    self.emit_line(&signature);
                    self.emit_line("}");
                } else {
                    self.emit_line(&signature);
                }
            }
        }
    }

    fn print_attributes(&mut self, attributes: &[Attribute]) {
        for attr in attributes {
            self.emit_line(attr.as_str());
        }
    }

    // --- Views ---

    fn print_view_struct(&mut self, view: &ViewStruct) {
        if let Some(comment) = &view.comment {
            self.emit_line(&format!("// {}", comment));
        }
        self.emit_line(&format!("struct {}: View {{", view.name));
        self.indent_level += 1;

        if !view.state.is_empty() {
            self.output.push('\n');
            for var in &view.state {
                self.emit_line(&format!(
                    "@State private var {}: {} = {}",
                    var.name,
                    var.ty,
                    expr_str(&var.value)
                ));
            }
        }

        self.output.push('\n');
        self.emit_line("var body: some View {");
        self.indent_level += 1;
        self.print_view(&view.body);
        self.indent_level -= 1;
        self.emit_line("}");

        self.indent_level -= 1;
        self.emit_line("}");
    }

    fn print_view(&mut self, view: &ViewExpr) {
        let mut head = call_str(&view.call);
        if let Some(comment) = &view.comment {
            head.push_str(&format!(" /* {} */", comment));
        }

        let block = view.action.as_ref().map(Block::Action).or_else(|| {
            view.children.as_ref().map(|c| Block::Children(c.as_slice()))
        });
        match block {
            None => self.emit_line(&head),
            Some(block) if block.is_empty() => self.emit_line(&format!("{} {{}}", head)),
            Some(block) => {
                self.emit_line(&format!("{} {{", head));
                self.indent_level += 1;
                match block {
                    Block::Action(lines) => {
                        for line in lines {
                            self.emit_line(line);
                        }
                    }
                    Block::Children(children) => {
                        for child in children {
                            self.print_view(child);
                        }
                    }
                }
                self.indent_level -= 1;
                self.emit_line("}");
            }
        }

        self.indent_level += 1;
        for modifier in &view.modifiers {
            match modifier {
                ViewModifier::Call(call) => self.emit_line(&format!(".{}", call_str(call))),
                ViewModifier::Comment(text) => self.emit_line(&format!("// {}", text)),
                ViewModifier::Block { name, children } => {
                    self.emit_line(&format!(".{} {{", name));
                    self.indent_level += 1;
                    for child in children {
                        self.print_view(child);
                    }
                    self.indent_level -= 1;
                    self.emit_line("}");
                }
            }
        }
        self.indent_level -= 1;
    }

    // --- Emit Helpers ---

    fn emit_line(&mut self, s: &str) {
        self.emit_indent();
        self.output.push_str(s);
        self.output.push('\n');
    }

    fn emit_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.output.push_str(&self.indent_unit);
        }
    }
}

enum Block<'a> {
    Action(&'a Vec<String>),
    Children(&'a [ViewExpr]),
}

impl Block<'_> {
    fn is_empty(&self) -> bool {
        match self {
            Block::Action(lines) => lines.is_empty(),
            Block::Children(children) => children.is_empty(),
        }
    }
}

/// Swift spelling of a type
pub fn type_str(ty: &TypeDescriptor) -> String {
    match ty {
        TypeDescriptor::Scalar(name) => name.clone(),
        TypeDescriptor::List(inner) => format!("[{}]", type_str(inner)),
        TypeDescriptor::Dict(key, value) => format!("[{}: {}]", type_str(key), type_str(value)),
        TypeDescriptor::Set(inner) => format!("Set<{}>", type_str(inner)),
        TypeDescriptor::Tuple(items) => format!("({})", join(items.iter().map(type_str))),
        TypeDescriptor::Optional(inner) => format!("{}?", type_str(inner)),
        TypeDescriptor::Generic(name, args) if args.is_empty() => name.clone(),
        TypeDescriptor::Generic(name, args) => {
            format!("{}<{}>", name, join(args.iter().map(type_str)))
        }
        TypeDescriptor::Unknown => "Any".to_string(),
    }
}

fn modifier_prefix(modifiers: &[Modifier]) -> String {
    modifiers.iter().map(|m| format!("{} ", m.as_str())).collect()
}

fn params_str(params: &[Param]) -> String {
    join(params.iter().map(|p| format!("{}: {}", escape_ident(&p.name), type_str(&p.ty))))
}

/// Words Swift reserves in declarations, statements and expressions
const SWIFT_KEYWORDS: &[&str] = &[
    "Any", "Self", "as", "associatedtype", "await", "break", "case", "catch", "class",
    "continue", "default", "defer", "deinit", "do", "else", "enum", "extension", "fallthrough",
    "false", "fileprivate", "for", "func", "guard", "if", "import", "in", "init", "inout",
    "internal", "is", "let", "nil", "open", "operator", "precedencegroup", "private",
    "protocol", "public", "repeat", "rethrows", "return", "self", "static", "struct",
    "subscript", "super", "switch", "throw", "throws", "true", "try", "typealias", "var",
    "where", "while",
];

/// Backtick-quote a declared name that collides with a Swift keyword
pub fn escape_ident(name: &str) -> Cow<'_, str> {
    if SWIFT_KEYWORDS.contains(&name) {
        Cow::Owned(format!("`{}`", name))
    } else {
        Cow::Borrowed(name)
    }
}

fn call_str(call: &Call) -> String {
    match &call.args {
        Some(args) => format!("{}({})", call.callee, join(args.iter().map(argument_str))),
        None => call.callee.clone(),
    }
}

fn argument_str(arg: &Argument) -> String {
    match &arg.label {
        Some(label) => format!("{}: {}", label, expr_str(&arg.value)),
        None => expr_str(&arg.value),
    }
}

pub fn expr_str(expr: &Expr) -> String {
    match expr {
        Expr::Str(s) => quote(s),
        Expr::Int(i) => i.to_string(),
        Expr::Float(f) => {
            let s = f.to_string();
            if s.contains('.') || s.contains("inf") || s.contains("NaN") {
                s
            } else {
                format!("{}.0", s)
            }
        }
        Expr::Bool(b) => b.to_string(),
        Expr::Member(name) => format!(".{}", name),
        Expr::Raw(text) => text.clone(),
        Expr::Array(items) => format!("[{}]", join(items.iter().map(expr_str))),
        Expr::Tuple(items) => format!("({})", join(items.iter().map(expr_str))),
        Expr::Call(call) => call_str(call),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn join(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<Vec<_>>().join(", ")
}
