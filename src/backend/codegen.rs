//! Code Generation trait - Backend abstraction
//!
//! Every generator turns a front-end tree into an output tree: a Swift
//! `SourceFile` for the PySwiftKit and SwiftUI back-ends, a `KivyModule`
//! for the Kivy one. They never fail: anything they cannot translate
//! degrades and is reported as a diagnostic.

use super::swift_ast::SourceFile;
use crate::feedback::Diagnostic;

/// Output of one generator run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generated<F = SourceFile> {
    pub file: F,
    pub diagnostics: Vec<Diagnostic>,
}

/// Code generation backend trait
pub trait Generator {
    type Input;
    type Output;

    /// Build the output AST for a parsed module
    fn generate(&self, input: &Self::Input) -> Generated<Self::Output>;

    /// Get the backend name
    fn name(&self) -> &str;
}
