//! pyswiftgen
//!
//! Source-to-source transpiler with two front-ends and one Swift back-end:
//!
//! - Kivy KV markup → SwiftUI views
//! - Python class declarations → PySwiftKit `@PyContainer` / `@PyClass` wrappers
//!
//! Python classes can also be turned into Kivy `EventDispatcher` models.
//!
//! ```
//! let swift = pyswiftgen::generate_swiftui("BoxLayout:\n    Label:\n        text: 'Hi'\n");
//! assert!(swift.contains("Text(\"Hi\")"));
//! ```

pub mod backend;
pub mod config;
pub mod feedback;
pub mod frontend;
pub mod middle;
pub mod pipeline;
pub mod utils;

pub use config::{ClassStyle, GeneratorConfig};
pub use feedback::{Diagnostic, Report};
pub use pipeline::{
    generate, generate_container, generate_kivy, generate_swiftui, generate_wrapper, Frontend,
    Pipeline, Transpiled,
};
pub use utils::{Error, Result};
