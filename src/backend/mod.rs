//! Backend module - Swift and Kivy code generation

pub mod codegen;
pub mod swift_ast;
pub mod printer;

pub mod kivy;
pub mod pyclass;
pub mod swiftui;

pub use codegen::{Generated, Generator};
pub use kivy::{KivyModelGenerator, KivyModule};
pub use printer::Printer;
pub use pyclass::PyClassGenerator;
pub use swift_ast::SourceFile;
pub use swiftui::SwiftUiGenerator;
