//! KV formatter
//!
//! Re-emits a parsed module as canonical KV text: properties first, then
//! canvas blocks, then children; single-quoted strings; bare top-level
//! tuples. Parsing the output again yields a structurally equal module.

use super::ast::*;
use crate::middle::literal::Literal;

pub fn format_module(module: &KvModule, indent_width: usize) -> String {
    let mut printer = KvPrinter::new(indent_width);
    printer.print_module(module);
    printer.output
}

/// Render a property value the way it would appear after `name: `
pub fn format_value(value: &Literal) -> String {
    match value {
        Literal::Tuple(items) if !items.is_empty() => {
            let parts: Vec<String> = items.iter().map(format_nested).collect();
            if items.len() == 1 {
                format!("{},", parts[0])
            } else {
                parts.join(", ")
            }
        }
        other => format_nested(other),
    }
}

fn format_nested(value: &Literal) -> String {
    match value {
        Literal::String(s) => quote(s),
        Literal::Integer(i) => i.to_string(),
        Literal::Float(f) => format_float(*f),
        Literal::Bool(true) => "True".to_string(),
        Literal::Bool(false) => "False".to_string(),
        Literal::Identifier(name) => name.clone(),
        Literal::List(items) => format!("[{}]", join(items)),
        Literal::Tuple(items) if items.len() == 1 => format!("({},)", format_nested(&items[0])),
        Literal::Tuple(items) => format!("({})", join(items)),
        Literal::Call { callee, args } => format!("{}({})", callee, join(args)),
        Literal::Expression(text) => text.clone(),
    }
}

fn join(items: &[Literal]) -> String {
    items.iter().map(format_nested).collect::<Vec<_>>().join(", ")
}

pub(crate) fn format_float(f: f64) -> String {
    let s = f.to_string();
    if s.contains('.') || s.contains("inf") || s.contains("NaN") {
        s
    } else {
        format!("{}.0", s)
    }
}

pub(crate) fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

struct KvPrinter {
    output: String,
    indent_level: usize,
    indent_unit: String,
}

impl KvPrinter {
    fn new(indent_width: usize) -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
            indent_unit: " ".repeat(indent_width.max(1)),
        }
    }

    fn print_module(&mut self, module: &KvModule) {
        let mut first = true;
        for rule in &module.rules {
            if !first {
                self.output.push('\n');
            }
            first = false;
            let selectors: Vec<String> = rule.selectors.iter().map(Selector::to_string).collect();
            self.emit_line(&format!("<{}>:", selectors.join(", ")));
            self.print_body(&rule.properties, &rule.canvas, &rule.children);
        }
        if let Some(root) = &module.root {
            if !first {
                self.output.push('\n');
            }
            self.print_widget(root);
        }
    }

    fn print_widget(&mut self, widget: &Widget) {
        self.emit_line(&format!("{}:", widget.name));
        self.print_body(&widget.properties, &widget.canvas, &widget.children);
    }

    fn print_body(&mut self, properties: &[Property], canvas: &[CanvasBlock], children: &[Widget]) {
        self.indent_level += 1;
        for prop in properties {
            self.emit_line(&format!("{}: {}", prop.name, format_value(&prop.value)));
        }
        for block in canvas {
            self.emit_line(&format!("{}:", block.name));
            self.indent_level += 1;
            for instruction in &block.instructions {
                self.print_widget(instruction);
            }
            self.indent_level -= 1;
        }
        for child in children {
            self.print_widget(child);
        }
        self.indent_level -= 1;
    }

    fn emit_line(&mut self, s: &str) {
        for _ in 0..self.indent_level {
            self.output.push_str(&self.indent_unit);
        }
        self.output.push_str(s);
        self.output.push('\n');
    }
}
