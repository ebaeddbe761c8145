//! Python class → Kivy model generator
//!
//! Each class becomes two Python classes:
//!
//! - `<Name>Data(EventDispatcher)` holds the fields as Kivy properties,
//!   together with the constructor and ordinary methods copied from the
//!   source.
//! - `<Name>(<first base or Widget>)` is a widget that carries a `data`
//!   reference to the model.
//!
//! Property kinds come from the same `TypeMapper` the Swift back-end uses,
//! built on the unmodified type table so Swift name overrides do not leak
//! into Python output.

use std::collections::BTreeSet;

use log::debug;

use super::codegen::{Generated, Generator};
use crate::frontend::kv::printer::{format_float, quote};
use crate::frontend::python::ast::{ClassDef, Field, PyModule};
use crate::middle::literal::Literal;
use crate::middle::types::{TypeDescriptor, TypeMapper, TypeTable};
use crate::utils::Span;

/// Kivy property class for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KivyProperty {
    Boolean,
    Dict,
    List,
    Numeric,
    Object,
    String,
}

impl KivyProperty {
    pub const ALL: [KivyProperty; 6] = [
        KivyProperty::Boolean,
        KivyProperty::Dict,
        KivyProperty::List,
        KivyProperty::Numeric,
        KivyProperty::Object,
        KivyProperty::String,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KivyProperty::Boolean => "BooleanProperty",
            KivyProperty::Dict => "DictProperty",
            KivyProperty::List => "ListProperty",
            KivyProperty::Numeric => "NumericProperty",
            KivyProperty::Object => "ObjectProperty",
            KivyProperty::String => "StringProperty",
        }
    }

    /// Property class for a resolved type. Optionals use their inner type.
    pub fn for_type(ty: &TypeDescriptor) -> Self {
        match ty {
            TypeDescriptor::Scalar(name) => match name.as_str() {
                "String" | "Substring" => KivyProperty::String,
                "Bool" => KivyProperty::Boolean,
                "Int" | "Double" | "Float" | "CGFloat" => KivyProperty::Numeric,
                _ => KivyProperty::Object,
            },
            TypeDescriptor::List(_) | TypeDescriptor::Set(_) => KivyProperty::List,
            TypeDescriptor::Dict(..) => KivyProperty::Dict,
            TypeDescriptor::Optional(inner) => Self::for_type(inner),
            TypeDescriptor::Tuple(_) | TypeDescriptor::Generic(..) | TypeDescriptor::Unknown => {
                KivyProperty::Object
            }
        }
    }

    /// Initial value when the source gives none
    pub fn default_value(&self, ty: &TypeDescriptor) -> &'static str {
        match (self, ty) {
            (_, TypeDescriptor::Optional(_)) => "None",
            (KivyProperty::String, _) => "''",
            (KivyProperty::Numeric, TypeDescriptor::Scalar(name)) if name == "Int" => "0",
            (KivyProperty::Numeric, _) => "0.0",
            (KivyProperty::Boolean, _) => "False",
            (KivyProperty::List, _) => "[]",
            (KivyProperty::Dict, _) => "{}",
            (KivyProperty::Object, _) => "None",
        }
    }
}

// ==================== Output Model ====================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KivyModule {
    pub classes: Vec<KivyClass>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KivyClass {
    pub name: String,
    pub base: String,
    pub members: Vec<KivyMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KivyMember {
    /// `name = StringProperty('')`
    Property {
        name: String,
        kind: KivyProperty,
        default: String,
        allow_none: bool,
    },
    /// `data: PersonData`
    Annotation { name: String, annotation: String },
    /// A generated method
    Method { signature: String, body: Vec<String> },
    /// Source lines copied as written, already dedented
    Source(Vec<String>),
}

impl KivyModule {
    fn uses_base(&self, base: &str) -> bool {
        self.classes.iter().any(|c| c.base == base)
    }

    /// Property classes generated or named in copied source
    fn property_kinds(&self) -> BTreeSet<KivyProperty> {
        let mut kinds = BTreeSet::new();
        for member in self.classes.iter().flat_map(|c| &c.members) {
            match member {
                KivyMember::Property { kind, .. } => {
                    kinds.insert(*kind);
                }
                KivyMember::Source(lines) => {
                    kinds.extend(KivyProperty::ALL.into_iter().filter(|k| {
                        let call = format!("{}(", k.as_str());
                        lines.iter().any(|l| l.contains(&call))
                    }));
                }
                KivyMember::Annotation { .. } | KivyMember::Method { .. } => {}
            }
        }
        kinds
    }

    /// Python source with `indent_width` spaces per level
    pub fn render(&self, indent_width: usize) -> String {
        if self.classes.is_empty() {
            return String::new();
        }
        let unit = " ".repeat(indent_width);
        let mut out = String::new();

        if self.uses_base("EventDispatcher") {
            out.push_str("from kivy.event import EventDispatcher\n");
        }
        let kinds = self.property_kinds();
        if !kinds.is_empty() {
            let names: Vec<_> = kinds.iter().map(KivyProperty::as_str).collect();
            out.push_str(&format!("from kivy.properties import {}\n", names.join(", ")));
        }
        if self.uses_base("Widget") {
            out.push_str("from kivy.uix.widget import Widget\n");
        }

        for class in &self.classes {
            out.push_str("\n\n");
            out.push_str(&format!("class {}({}):\n", class.name, class.base));
            if class.members.is_empty() {
                out.push_str(&format!("{}pass\n", unit));
                continue;
            }
            for member in &class.members {
                out.push('\n');
                render_member(&mut out, member, &unit);
            }
        }
        out
    }
}

fn render_member(out: &mut String, member: &KivyMember, unit: &str) {
    match member {
        KivyMember::Property {
            name,
            kind,
            default,
            allow_none,
        } => {
            let extra = if *allow_none && *kind != KivyProperty::Object {
                ", allownone=True"
            } else {
                ""
            };
            out.push_str(&format!("{}{} = {}({}{})\n", unit, name, kind.as_str(), default, extra));
        }
        KivyMember::Annotation { name, annotation } => {
            out.push_str(&format!("{}{}: {}\n", unit, name, annotation));
        }
        KivyMember::Method { signature, body } => {
            out.push_str(&format!("{}{}\n", unit, signature));
            for line in body {
                out.push_str(&format!("{}{}{}\n", unit, unit, line));
            }
        }
        KivyMember::Source(lines) => {
            for line in lines {
                if line.is_empty() {
                    out.push('\n');
                } else {
                    out.push_str(&format!("{}{}\n", unit, line));
                }
            }
        }
    }
}

// ==================== Generator ====================

pub struct KivyModelGenerator<'a> {
    source: &'a str,
    types: TypeTable,
}

impl<'a> KivyModelGenerator<'a> {
    /// `source` is the text the module was parsed from; member bodies are
    /// copied out of it.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            types: TypeTable::builtin(),
        }
    }

    fn data_class(&self, class: &ClassDef) -> KivyClass {
        let mapper = TypeMapper::new(&self.types);
        let mut members: Vec<KivyMember> = class
            .fields
            .iter()
            .map(|f| self.field(&mapper, f))
            .collect();

        // Properties in the Python sense are not model state
        members.extend(
            class
                .methods
                .iter()
                .filter(|m| !m.is_accessor())
                .map(|m| KivyMember::Source(source_lines(self.source, m.extent))),
        );

        KivyClass {
            name: data_name(class),
            base: "EventDispatcher".to_string(),
            members,
        }
    }

    fn field(&self, mapper: &TypeMapper<'_>, field: &Field) -> KivyMember {
        let is_none = matches!(&field.default, Some(Literal::Identifier(n)) if n == "None");
        let ty = match (&field.annotation, &field.default) {
            (Some(annotation), _) => mapper.map(annotation),
            (None, Some(value)) if is_plain(value) => mapper.infer(value),
            (None, Some(_)) if is_none => TypeDescriptor::Unknown,
            // Existing Kivy properties and anything else unannotated
            _ => return KivyMember::Source(source_lines(self.source, field.extent)),
        };

        let kind = KivyProperty::for_type(&ty);
        let default = match &field.default {
            Some(value) => python_literal(value),
            None => kind.default_value(&ty).to_string(),
        };
        KivyMember::Property {
            name: field.name.clone(),
            kind,
            default,
            allow_none: is_none || matches!(ty, TypeDescriptor::Optional(_)),
        }
    }
}

/// Lines of `extent`, dedented by its first column
fn source_lines(source: &str, extent: Span) -> Vec<String> {
    let margin = extent.column.saturating_sub(1);
    extent
        .text(source)
        .lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                return line.trim_end().to_string();
            }
            let leading = line.chars().take_while(|c| c.is_whitespace()).count();
            let kept: String = line.chars().skip(leading.min(margin)).collect();
            kept.trim_end().to_string()
        })
        .collect()
}

fn widget_class(class: &ClassDef) -> KivyClass {
    let data = data_name(class);
    let base = class
        .bases
        .iter()
        .find(|b| b.as_str() != "object")
        .cloned()
        .unwrap_or_else(|| "Widget".to_string());

    KivyClass {
        name: class.name.clone(),
        base,
        members: vec![
            KivyMember::Annotation {
                name: "data".to_string(),
                annotation: data.clone(),
            },
            KivyMember::Method {
                signature: format!("def __init__(self, data: {}, **kwargs):", data),
                body: vec![
                    "super().__init__(**kwargs)".to_string(),
                    "self.data = data".to_string(),
                ],
            },
        ],
    }
}

fn data_name(class: &ClassDef) -> String {
    format!("{}Data", class.name)
}

/// A literal whose Python spelling we reproduce exactly
fn is_plain(value: &Literal) -> bool {
    match value {
        Literal::String(_) | Literal::Integer(_) | Literal::Float(_) | Literal::Bool(_) => true,
        Literal::List(items) | Literal::Tuple(items) => items.iter().all(is_plain),
        Literal::Identifier(_) | Literal::Call { .. } | Literal::Expression(_) => false,
    }
}

/// Python spelling of a literal
pub fn python_literal(value: &Literal) -> String {
    let join = |items: &[Literal]| {
        items
            .iter()
            .map(python_literal)
            .collect::<Vec<_>>()
            .join(", ")
    };
    match value {
        Literal::String(s) => quote(s),
        Literal::Integer(i) => i.to_string(),
        Literal::Float(f) => format_float(*f),
        Literal::Bool(true) => "True".to_string(),
        Literal::Bool(false) => "False".to_string(),
        Literal::Identifier(name) => name.clone(),
        Literal::List(items) => format!("[{}]", join(items)),
        Literal::Tuple(items) if items.len() == 1 => format!("({},)", join(items)),
        Literal::Tuple(items) => format!("({})", join(items)),
        Literal::Call { callee, args } => format!("{}({})", callee, join(args)),
        Literal::Expression(text) => text.clone(),
    }
}

impl Generator for KivyModelGenerator<'_> {
    type Input = PyModule;
    type Output = KivyModule;

    fn generate(&self, module: &PyModule) -> Generated<KivyModule> {
        let classes = module
            .classes
            .iter()
            .flat_map(|c| [self.data_class(c), widget_class(c)])
            .collect();

        debug!("kivy: {} classes", module.classes.len());
        Generated {
            file: KivyModule { classes },
            diagnostics: Vec::new(),
        }
    }

    fn name(&self) -> &str {
        "kivy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::python::{lexer, parser};
    use pretty_assertions::assert_eq;

    fn render(src: &str) -> String {
        let module = parser::parse(lexer::tokenize(src).unwrap()).unwrap();
        KivyModelGenerator::new(src).generate(&module).file.render(4)
    }

    const PERSON: &str = "\
class Person:
    name: str
    age: int
    def __init__(self, name: str, age: int):
        self.name = name
        self.age = age

    def greet(self, text: str):
        if text:
            print(text, self.name)
";

    #[test]
    fn test_person_model() {
        let expected = "\
from kivy.event import EventDispatcher
from kivy.properties import NumericProperty, StringProperty
from kivy.uix.widget import Widget


class PersonData(EventDispatcher):

    name = StringProperty('')

    age = NumericProperty(0)

    def __init__(self, name: str, age: int):
        self.name = name
        self.age = age

    def greet(self, text: str):
        if text:
            print(text, self.name)


class Person(Widget):

    data: PersonData

    def __init__(self, data: PersonData, **kwargs):
        super().__init__(**kwargs)
        self.data = data
";
        assert_eq!(render(PERSON), expected);
    }

    #[test]
    fn test_property_kinds_and_defaults() {
        let src = "\
class Settings(BoxLayout):
    title: str = 'Home'
    ratio: float
    enabled: bool
    tags: list[str]
    ids: set[int]
    extra: Dict[str, int]
    owner: Optional[str]
    level: int | None = 3
    created: datetime
    count = 5
    scale = 1.5
    flags = [True, False]
    label = StringProperty('', allownone=True)
    handler = None
    @property
    def summary(self) -> str:
        return self.title
";
        let expected = "\
from kivy.event import EventDispatcher
from kivy.properties import BooleanProperty, DictProperty, ListProperty, NumericProperty, ObjectProperty, StringProperty


class SettingsData(EventDispatcher):

    title = StringProperty('Home')

    ratio = NumericProperty(0.0)

    enabled = BooleanProperty(False)

    tags = ListProperty([])

    ids = ListProperty([])

    extra = DictProperty({})

    owner = StringProperty(None, allownone=True)

    level = NumericProperty(3, allownone=True)

    created = ObjectProperty(None)

    count = NumericProperty(5)

    scale = NumericProperty(1.5)

    flags = ListProperty([True, False])

    label = StringProperty('', allownone=True)

    handler = ObjectProperty(None)


class Settings(BoxLayout):

    data: SettingsData

    def __init__(self, data: SettingsData, **kwargs):
        super().__init__(**kwargs)
        self.data = data
";
        assert_eq!(render(src), expected);
    }

    #[test]
    fn test_empty_class_and_decorated_methods() {
        let src = "\
class Empty:
    pass

class Tools(object):
    @staticmethod
    def make(path: str) -> 'Tools': ...
";
        let output = render(src);
        assert!(output.contains("class EmptyData(EventDispatcher):\n    pass\n"), "{}", output);
        assert!(output.contains("class Empty(Widget):\n"), "{}", output);
        assert!(
            output.contains("class ToolsData(EventDispatcher):\n\n    @staticmethod\n    def make(path: str) -> 'Tools': ...\n"),
            "{}",
            output
        );
        assert!(output.contains("class Tools(Widget):\n"), "{}", output);
        assert!(!output.contains("from kivy.properties"), "{}", output);
    }

    #[test]
    fn test_copied_properties_are_imported() {
        let output = render("class A:\n    label = StringProperty('', allownone=True)\n");
        assert!(output.starts_with(
            "from kivy.event import EventDispatcher\nfrom kivy.properties import StringProperty\n"
        ));
        assert!(output.contains("\n    label = StringProperty('', allownone=True)\n"));
        assert_eq!(render(""), "");
    }

    #[test]
    fn test_indent_width_reindents_copied_bodies() {
        let src = "class A:\n  def run(self):\n    return 1\n";
        let module = parser::parse(lexer::tokenize(src).unwrap()).unwrap();
        let output = KivyModelGenerator::new(src).generate(&module).file.render(4);
        assert!(output.contains("\n    def run(self):\n      return 1\n"), "{}", output);
    }

    #[test]
    fn test_property_mapping() {
        let table = TypeTable::builtin();
        let mapper = TypeMapper::new(&table);
        let kind = |src: &str| {
            let tokens = lexer::tokenize(src).unwrap();
            let ty = parser::Parser::new(tokens).parse_type().unwrap();
            KivyProperty::for_type(&mapper.map(&ty))
        };
        assert_eq!(kind("str"), KivyProperty::String);
        assert_eq!(kind("float"), KivyProperty::Numeric);
        assert_eq!(kind("List"), KivyProperty::List);
        assert_eq!(kind("dict"), KivyProperty::Dict);
        assert_eq!(kind("Optional[bool]"), KivyProperty::Boolean);
        assert_eq!(kind("str | int"), KivyProperty::Object);
        assert_eq!(kind("Person"), KivyProperty::Object);
    }

    #[test]
    fn test_python_literal() {
        assert_eq!(python_literal(&Literal::String("it's".to_string())), "'it\\'s'");
        assert_eq!(python_literal(&Literal::Float(2.0)), "2.0");
        assert_eq!(
            python_literal(&Literal::Tuple(vec![Literal::Integer(1)])),
            "(1,)"
        );
        assert_eq!(
            python_literal(&Literal::Call {
                callee: "dp".to_string(),
                args: vec![Literal::Integer(4)],
            }),
            "dp(4)"
        );
    }
}
