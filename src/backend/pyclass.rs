//! Python class → PySwiftKit generator
//!
//! Two output styles share the same member typing:
//!
//! - `Container`: `@PyContainer` classes whose fields are reached through
//!   `@dynamicMemberLookup` and whose methods are `@PyCall` signatures.
//! - `Wrapper`: `@PyClass` classes with `@PyProperty`, `@PyInit` and
//!   `@PyMethod` members.

use log::{debug, warn};

use super::codegen::{Generated, Generator};
use super::printer::type_str;
use super::swift_ast::{
    Attribute, ClassDecl, InitDecl, Item, Member, MethodDecl, Modifier, Param, PropertyDecl,
    SourceFile,
};
use crate::config::ClassStyle;
use crate::feedback::{Diagnostic, TYPE_CONFLICT};
use crate::frontend::python::ast::{ClassDef, Field, Method, PyModule, TypeExpr};
use crate::middle::types::{TypeDescriptor, TypeMapper, TypeTable};

pub struct PyClassGenerator<'a> {
    style: ClassStyle,
    mapper: TypeMapper<'a>,
}

impl<'a> PyClassGenerator<'a> {
    pub fn new(style: ClassStyle, types: &'a TypeTable) -> Self {
        Self {
            style,
            mapper: TypeMapper::new(types),
        }
    }

    fn class(&self, class: &ClassDef, diagnostics: &mut Vec<Diagnostic>) -> ClassDecl {
        let fields: Vec<(&Field, TypeDescriptor)> = class
            .fields
            .iter()
            .map(|f| (f, self.field_type(class, f, diagnostics)))
            .collect();

        match self.style {
            ClassStyle::Container => self.container(class, &fields),
            ClassStyle::Wrapper => self.wrapper(class, &fields),
        }
    }

    fn container(&self, class: &ClassDef, fields: &[(&Field, TypeDescriptor)]) -> ClassDecl {
        let mut attributes = vec![Attribute::PyContainer];
        if !fields.is_empty() {
            attributes.push(Attribute::DynamicMemberLookup);
        }

        let members = class
            .methods
            .iter()
            .filter(|m| !m.is_constructor && !m.is_accessor())
            .map(|m| Member::Method(self.method(m, Attribute::PyCall, &[], false)))
            .collect();

        ClassDecl {
            attributes,
            modifiers: Vec::new(),
            name: class.name.clone(),
            members,
        }
    }

    fn wrapper(&self, class: &ClassDef, fields: &[(&Field, TypeDescriptor)]) -> ClassDecl {
        let mut members: Vec<Member> = fields
            .iter()
            .map(|(field, ty)| property(&field.name, ty.clone()))
            .collect();

        // A getter becomes a property; its setter folds into it
        for getter in class.methods.iter().filter(|m| m.is_property()) {
            if class.field(&getter.name).is_none() {
                let ty = self.mapper.map_or_object(getter.return_type.as_ref());
                members.push(property(&getter.name, ty));
            }
        }

        if let Some(init) = class.constructor() {
            members.push(Member::Initializer(InitDecl {
                attributes: vec![Attribute::PyInit],
                modifiers: vec![Modifier::Public],
                params: self.params(init),
            }));
        }

        members.extend(
            class
                .methods
                .iter()
                .filter(|m| !m.is_constructor && !m.is_accessor())
                .map(|m| Member::Method(self.method(m, Attribute::PyMethod, &[Modifier::Public], true))),
        );

        ClassDecl {
            attributes: vec![Attribute::PyClass],
            modifiers: vec![Modifier::Public],
            name: class.name.clone(),
            members,
        }
    }

    fn method(&self, method: &Method, marker: Attribute, base: &[Modifier], has_body: bool) -> MethodDecl {
        let mut modifiers = base.to_vec();
        if method.is_static || method.is_classmethod() {
            modifiers.push(Modifier::Static);
        }

        // `-> None` is the same as no return clause
        let return_type = match &method.return_type {
            None | Some(TypeExpr::None) => None,
            Some(ty) => Some(self.mapper.map(ty)),
        };

        MethodDecl {
            attributes: vec![marker],
            modifiers,
            name: method.name.clone(),
            params: self.params(method),
            return_type,
            has_body,
        }
    }

    fn params(&self, method: &Method) -> Vec<Param> {
        method
            .params
            .iter()
            .map(|p| Param {
                name: p.name.clone(),
                ty: self.mapper.map_or_object(p.annotation.as_ref()),
            })
            .collect()
    }

    /// Annotation first, then the matching `__init__` parameter, then the
    /// default value's kind.
    fn field_type(&self, class: &ClassDef, field: &Field, diagnostics: &mut Vec<Diagnostic>) -> TypeDescriptor {
        let from_init = class
            .constructor()
            .and_then(|init| init.params.iter().find(|p| p.name == field.name))
            .and_then(|p| p.annotation.as_ref())
            .map(|a| self.mapper.map(a));

        match (&field.annotation, from_init) {
            (Some(annotation), from_init) => {
                let declared = self.mapper.map(annotation);
                if let Some(init_ty) = from_init.filter(|t| *t != declared) {
                    let message = format!(
                        "field '{}' is annotated as {} but __init__ takes {}; keeping {}",
                        field.name,
                        type_str(&declared),
                        type_str(&init_ty),
                        type_str(&declared)
                    );
                    warn!("{}.{}: {}", class.name, field.name, message);
                    diagnostics.push(Diagnostic::warning(TYPE_CONFLICT, message, Some(field.span)));
                }
                declared
            }
            (None, Some(init_ty)) => init_ty,
            (None, None) => field
                .default
                .as_ref()
                .map_or(TypeDescriptor::Unknown, |d| self.mapper.infer(d)),
        }
    }
}

fn property(name: &str, ty: TypeDescriptor) -> Member {
    Member::Property(PropertyDecl {
        attributes: vec![Attribute::PyProperty],
        modifiers: vec![Modifier::Public],
        name: name.to_string(),
        ty,
    })
}

impl Generator for PyClassGenerator<'_> {
    type Input = PyModule;
    type Output = SourceFile;

    fn generate(&self, module: &PyModule) -> Generated {
        let mut diagnostics = Vec::new();
        let items = module
            .classes
            .iter()
            .map(|c| Item::Class(self.class(c, &mut diagnostics)))
            .collect();

        let imports = match self.style {
            ClassStyle::Container => Vec::new(),
            ClassStyle::Wrapper => vec!["PySwiftKit".to_string()],
        };

        debug!(
            "pyclass: {} classes as {:?}, {} warnings",
            module.classes.len(),
            self.style,
            diagnostics.len()
        );
        Generated {
            file: SourceFile { imports, items },
            diagnostics,
        }
    }

    fn name(&self) -> &str {
        match self.style {
            ClassStyle::Container => "pycontainer",
            ClassStyle::Wrapper => "pyclass",
        }
    }
}
