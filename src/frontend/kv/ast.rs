//! KV markup AST
//!
//! A module holds the rules (`<Name>:` blocks) in declaration order and at
//! most one root widget.

use std::fmt;

use crate::middle::literal::Literal;
use crate::utils::Span;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KvModule {
    pub rules: Vec<Rule>,
    pub root: Option<Widget>,
}

/// A `<Name>:`, `<A,B>:` or `<Name@Base>:` class rule
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    pub properties: Vec<Property>,
    pub children: Vec<Widget>,
    pub canvas: Vec<CanvasBlock>,
    pub span: Span,
}

/// One class named in a rule header. `bases` is non-empty for a dynamic
/// class such as `<MyButton@Button+HoverBehavior>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub name: String,
    pub bases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub name: String,
    pub properties: Vec<Property>,
    pub children: Vec<Widget>,
    /// `canvas:` / `canvas.before:` / `canvas.after:` blocks
    pub canvas: Vec<CanvasBlock>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: Literal,
    pub span: Span,
}

/// Drawing instructions. Kept in the tree but never translated to views.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasBlock {
    pub name: String,
    pub instructions: Vec<Widget>,
    pub span: Span,
}

impl Rule {
    pub fn primary_name(&self) -> &str {
        self.selectors.first().map_or("Rule", |s| s.name.as_str())
    }

    /// First base of the primary selector of a dynamic class rule
    pub fn base(&self) -> Option<&str> {
        self.selectors.first()?.bases.first().map(String::as_str)
    }

    /// The rule body as an instance of `class`
    pub fn as_widget(&self, class: &str) -> Widget {
        Widget {
            name: class.to_string(),
            properties: self.properties.clone(),
            children: self.children.clone(),
            canvas: self.canvas.clone(),
            span: self.span,
        }
    }
}

impl Selector {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.bases.is_empty() {
            write!(f, "@{}", self.bases.join("+"))?;
        }
        Ok(())
    }
}

impl Widget {
    pub fn property(&self, name: &str) -> Option<&Literal> {
        find_property(&self.properties, name)
    }

    /// The `id:` of this widget, if it is a bare name or string
    pub fn id(&self) -> Option<&str> {
        self.property("id").and_then(Literal::as_text)
    }

    /// Number of widget nodes in this subtree, including `self`
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Widget::count).sum::<usize>()
    }
}

impl KvModule {
    /// Number of widget nodes across the root and all rule bodies
    pub fn widget_count(&self) -> usize {
        let in_rules: usize = self
            .rules
            .iter()
            .flat_map(|r| r.children.iter())
            .map(Widget::count)
            .sum();
        in_rules + self.root.as_ref().map_or(0, Widget::count)
    }
}

pub fn find_property<'a>(properties: &'a [Property], name: &str) -> Option<&'a Literal> {
    properties.iter().find(|p| p.name == name).map(|p| &p.value)
}

/// Names that open a canvas block rather than a child widget
pub fn is_canvas_name(name: &str) -> bool {
    matches!(name, "canvas" | "canvas.before" | "canvas.after")
}

// ==================== Structural Equality ====================

/// Equality that ignores source spans.
///
/// Used to check that re-parsing formatted output gives back the same tree.
pub trait StructureEq {
    fn structure_eq(&self, other: &Self) -> bool;
}

fn vec_structure_eq<T: StructureEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structure_eq(y))
}

impl StructureEq for KvModule {
    fn structure_eq(&self, other: &Self) -> bool {
        vec_structure_eq(&self.rules, &other.rules)
            && match (&self.root, &other.root) {
                (Some(a), Some(b)) => a.structure_eq(b),
                (None, None) => true,
                _ => false,
            }
    }
}

impl StructureEq for Rule {
    fn structure_eq(&self, other: &Self) -> bool {
        self.selectors == other.selectors
            && vec_structure_eq(&self.properties, &other.properties)
            && vec_structure_eq(&self.children, &other.children)
            && vec_structure_eq(&self.canvas, &other.canvas)
    }
}

impl StructureEq for Widget {
    fn structure_eq(&self, other: &Self) -> bool {
        self.name == other.name
            && vec_structure_eq(&self.properties, &other.properties)
            && vec_structure_eq(&self.children, &other.children)
            && vec_structure_eq(&self.canvas, &other.canvas)
    }
}

impl StructureEq for Property {
    fn structure_eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}

impl StructureEq for CanvasBlock {
    fn structure_eq(&self, other: &Self) -> bool {
        self.name == other.name && vec_structure_eq(&self.instructions, &other.instructions)
    }
}
