//! Python class-declaration AST

use crate::middle::literal::Literal;
use crate::utils::Span;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PyModule {
    pub classes: Vec<ClassDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<String>,
    pub decorators: Vec<Decorator>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub span: Span,
}

/// `@name`, `@a.b` or `@name(args)`. Arguments are not kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    pub name: String,
    pub has_args: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub annotation: Option<TypeExpr>,
    pub default: Option<Literal>,
    pub span: Span,
    /// The whole assignment, name through last token
    pub extent: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    /// Parameters with `self` / `cls` already removed
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub decorators: Vec<Decorator>,
    pub is_static: bool,
    pub is_constructor: bool,
    pub span: Span,
    /// First decorator through the last token of the body
    pub extent: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub annotation: Option<TypeExpr>,
    pub span: Span,
}

/// A type annotation as written
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `str`, `datetime.datetime`
    Name(String),
    /// `list[int]`, `Optional[str]`
    Subscript { base: String, args: Vec<TypeExpr> },
    /// `[str]` shorthand
    ListLiteral(Vec<TypeExpr>),
    /// `A | B | None`
    Union(Vec<TypeExpr>),
    None,
    /// `"Person"`
    Forward(String),
    /// The `...` in `tuple[int, ...]`
    Ellipsis,
}

impl Decorator {
    /// Last dotted segment (`setter` for `@name.setter`)
    pub fn last_segment(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

impl Method {
    pub fn has_decorator(&self, name: &str) -> bool {
        self.decorators.iter().any(|d| d.name == name)
    }

    pub fn is_property(&self) -> bool {
        self.has_decorator("property")
    }

    pub fn is_setter(&self) -> bool {
        self.decorators
            .iter()
            .any(|d| d.name.contains('.') && d.last_segment() == "setter")
    }

    pub fn is_classmethod(&self) -> bool {
        self.has_decorator("classmethod")
    }

    pub fn is_accessor(&self) -> bool {
        self.is_property() || self.is_setter()
    }
}

impl ClassDef {
    pub fn constructor(&self) -> Option<&Method> {
        self.methods.iter().find(|m| m.is_constructor)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl PyModule {
    /// Classes, fields and methods in the module
    pub fn node_count(&self) -> usize {
        self.classes
            .iter()
            .map(|c| 1 + c.fields.len() + c.methods.len())
            .sum()
    }
}
