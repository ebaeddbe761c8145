//! Type mapping for Python annotations
//!
//! Annotations are resolved to a `TypeDescriptor`, independent of how they
//! were spelled in the source (`list[str]` and `[str]` give the same
//! descriptor) and of how the back-end will spell them.

use std::collections::{BTreeMap, HashMap};

use log::warn;

use crate::frontend::python::TypeExpr;
use crate::middle::literal::{self, Literal};

/// A resolved type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// Target-language type name (`String`, `Int`, `PyPointer`, `Person`)
    Scalar(String),
    List(Box<TypeDescriptor>),
    Dict(Box<TypeDescriptor>, Box<TypeDescriptor>),
    Set(Box<TypeDescriptor>),
    Tuple(Vec<TypeDescriptor>),
    Optional(Box<TypeDescriptor>),
    Generic(String, Vec<TypeDescriptor>),
    Unknown,
}

impl TypeDescriptor {
    pub fn scalar(name: impl Into<String>) -> Self {
        TypeDescriptor::Scalar(name.into())
    }

    pub fn list(inner: TypeDescriptor) -> Self {
        TypeDescriptor::List(Box::new(inner))
    }

    pub fn dict(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        TypeDescriptor::Dict(Box::new(key), Box::new(value))
    }

    pub fn set(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Set(Box::new(inner))
    }

    /// Wrap in `Optional` unless already optional
    pub fn optional(inner: TypeDescriptor) -> Self {
        match inner {
            TypeDescriptor::Optional(_) => inner,
            other => TypeDescriptor::Optional(Box::new(other)),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TypeDescriptor::Unknown)
    }
}

// ==================== Type Table ====================

const BUILTIN_SCALARS: &[(&str, &str)] = &[
    ("str", "String"),
    ("int", "Int"),
    ("float", "Double"),
    ("bool", "Bool"),
    ("bytes", "Data"),
    ("bytearray", "Data"),
    ("datetime", "Date"),
    ("url", "URL"),
    ("None", "Void"),
    ("object", "PyPointer"),
    ("Substring", "Substring"),
];

/// Python scalar name → target type name
#[derive(Debug, Clone)]
pub struct TypeTable {
    scalars: HashMap<String, String>,
}

impl TypeTable {
    pub fn builtin() -> Self {
        let scalars = BUILTIN_SCALARS
            .iter()
            .map(|(py, swift)| (py.to_string(), swift.to_string()))
            .collect();
        Self { scalars }
    }

    /// Built-in table with user entries layered on top
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut table = Self::builtin();
        for (py, swift) in overrides {
            table.scalars.insert(py.clone(), swift.clone());
        }
        table
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.scalars.get(name).map(String::as_str)
    }

    /// Mapped name, or the name itself when unmapped
    pub fn resolve(&self, name: &str) -> String {
        self.lookup(name).unwrap_or(name).to_string()
    }

    pub fn len(&self) -> usize {
        self.scalars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty()
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

// ==================== Mapper ====================

pub struct TypeMapper<'a> {
    table: &'a TypeTable,
}

impl<'a> TypeMapper<'a> {
    pub fn new(table: &'a TypeTable) -> Self {
        Self { table }
    }

    /// Type of a parameter or field; a missing annotation means `object`
    pub fn map_or_object(&self, expr: Option<&TypeExpr>) -> TypeDescriptor {
        match expr {
            Some(e) => self.map(e),
            None => self.scalar("object"),
        }
    }

    pub fn map(&self, expr: &TypeExpr) -> TypeDescriptor {
        match expr {
            TypeExpr::Name(name) => self.map_name(last_segment(name)),
            TypeExpr::Subscript { base, args } => self.map_subscript(last_segment(base), args),
            TypeExpr::ListLiteral(items) => match items.as_slice() {
                [inner] => TypeDescriptor::list(self.map(inner)),
                _ => TypeDescriptor::list(TypeDescriptor::Unknown),
            },
            TypeExpr::Union(members) => self.map_union(members),
            TypeExpr::None => self.scalar("None"),
            TypeExpr::Forward(text) => {
                if is_dotted_identifier(text) {
                    self.map_name(last_segment(text))
                } else {
                    warn!("cannot resolve forward reference '{}'", text);
                    TypeDescriptor::Unknown
                }
            }
            TypeExpr::Ellipsis => TypeDescriptor::Unknown,
        }
    }

    fn scalar(&self, name: &str) -> TypeDescriptor {
        TypeDescriptor::Scalar(self.table.resolve(name))
    }

    fn map_name(&self, name: &str) -> TypeDescriptor {
        match name {
            "Any" => TypeDescriptor::Unknown,
            "list" | "List" | "Sequence" | "tuple" | "Tuple" => {
                TypeDescriptor::list(TypeDescriptor::Unknown)
            }
            "dict" | "Dict" | "Mapping" => {
                TypeDescriptor::dict(self.scalar("str"), TypeDescriptor::Unknown)
            }
            "set" | "Set" | "frozenset" | "FrozenSet" => {
                TypeDescriptor::set(TypeDescriptor::Unknown)
            }
            _ => self.scalar(name),
        }
    }

    fn map_subscript(&self, base: &str, args: &[TypeExpr]) -> TypeDescriptor {
        match (base, args) {
            ("list" | "List" | "Sequence", [inner]) => TypeDescriptor::list(self.map(inner)),
            ("list" | "List" | "Sequence", _) => TypeDescriptor::list(TypeDescriptor::Unknown),
            ("dict" | "Dict" | "Mapping", [key, value]) => {
                TypeDescriptor::dict(self.map(key), self.map(value))
            }
            ("dict" | "Dict" | "Mapping", _) => {
                warn!("malformed dict annotation with {} arguments", args.len());
                TypeDescriptor::dict(self.scalar("str"), TypeDescriptor::Unknown)
            }
            ("set" | "Set" | "frozenset" | "FrozenSet", [inner]) => {
                TypeDescriptor::set(self.map(inner))
            }
            ("set" | "Set" | "frozenset" | "FrozenSet", _) => {
                TypeDescriptor::set(TypeDescriptor::Unknown)
            }
            // `tuple[int, ...]` is a homogeneous variable-length sequence
            ("tuple" | "Tuple", [inner, TypeExpr::Ellipsis]) => {
                TypeDescriptor::list(self.map(inner))
            }
            ("tuple" | "Tuple", items) => {
                TypeDescriptor::Tuple(items.iter().map(|t| self.map(t)).collect())
            }
            ("Optional", [inner]) => TypeDescriptor::optional(self.map(inner)),
            ("Union", members) => self.map_union(members),
            ("ClassVar" | "Final" | "Annotated", [inner, ..]) => self.map(inner),
            (name, args) => TypeDescriptor::Generic(
                self.table.resolve(name),
                args.iter().map(|t| self.map(t)).collect(),
            ),
        }
    }

    /// `T | None` is optional; any other multi-type union is unknown
    fn map_union(&self, members: &[TypeExpr]) -> TypeDescriptor {
        let mut flat = Vec::new();
        flatten_union(members, &mut flat);

        let has_none = flat.iter().any(|m| matches!(m, TypeExpr::None));
        let mut mapped: Vec<TypeDescriptor> = Vec::new();
        for member in flat.iter().filter(|m| !matches!(m, TypeExpr::None)) {
            let ty = self.map(member);
            if !mapped.contains(&ty) {
                mapped.push(ty);
            }
        }

        match (mapped.len(), has_none) {
            (0, _) => self.scalar("None"),
            (1, true) => TypeDescriptor::optional(mapped.remove(0)),
            (1, false) => mapped.remove(0),
            (n, _) => {
                warn!("union of {} distinct types has no single target type", n);
                TypeDescriptor::Unknown
            }
        }
    }

    /// Type implied by a default value
    pub fn infer(&self, value: &Literal) -> TypeDescriptor {
        match value {
            Literal::String(_) => self.scalar("str"),
            Literal::Integer(_) => self.scalar("int"),
            Literal::Float(_) => self.scalar("float"),
            Literal::Bool(_) => self.scalar("bool"),
            Literal::List(items) => {
                let element = match items.first() {
                    Some(first) if literal::is_homogeneous(items) => {
                        if items.iter().any(|i| matches!(i, Literal::Float(_))) {
                            self.scalar("float")
                        } else {
                            self.infer(first)
                        }
                    }
                    _ => TypeDescriptor::Unknown,
                };
                TypeDescriptor::list(element)
            }
            Literal::Tuple(items) => {
                TypeDescriptor::Tuple(items.iter().map(|i| self.infer(i)).collect())
            }
            Literal::Identifier(_) | Literal::Call { .. } | Literal::Expression(_) => {
                TypeDescriptor::Unknown
            }
        }
    }
}

fn flatten_union(members: &[TypeExpr], out: &mut Vec<TypeExpr>) {
    for member in members {
        match member {
            TypeExpr::Union(inner) => flatten_union(inner, out),
            TypeExpr::Subscript { base, args } if last_segment(base) == "Optional" => {
                flatten_union(args, out);
                out.push(TypeExpr::None);
            }
            other => out.push(other.clone()),
        }
    }
}

/// `a.b.C` → `C`
fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

fn is_dotted_identifier(text: &str) -> bool {
    !text.is_empty()
        && text.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
                && chars.all(|c| c.is_alphanumeric() || c == '_')
        })
}
