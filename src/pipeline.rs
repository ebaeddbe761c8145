//! Transpilation pipeline
//!
//! text → tokens → AST → output AST → text. Every stage is pure, so one
//! `Pipeline` can serve any number of threads.

use std::sync::OnceLock;

use log::debug;

use crate::backend::{
    Generated, Generator, KivyModelGenerator, Printer, PyClassGenerator, SwiftUiGenerator,
};
use crate::config::{ClassStyle, GeneratorConfig, MappingTables};
use crate::feedback::{Diagnostic, Report, Stats};
use crate::frontend::python::PyModule;
use crate::frontend::{kv, python};
use crate::utils::Result;

/// Input language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frontend {
    Kv,
    Python,
}

impl Frontend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frontend::Kv => "kv",
            Frontend::Python => "py",
        }
    }
}

/// Generated code together with everything learned while producing it
#[derive(Debug, Clone, PartialEq)]
pub struct Transpiled {
    /// Generated source, or a single `// error: ...` line
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: Stats,
}

impl Transpiled {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn into_report(self, frontend: Frontend) -> Report {
        Report::new(frontend.as_str(), self.code, self.diagnostics, self.stats)
    }

    fn new(code: String, diagnostics: Vec<Diagnostic>, mut stats: Stats) -> Self {
        stats.lines = code.lines().count();
        debug!("emitted {} lines", stats.lines);
        Self {
            code,
            diagnostics,
            stats,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: GeneratorConfig,
    tables: MappingTables,
}

impl Pipeline {
    pub fn new(config: GeneratorConfig) -> Self {
        let tables = MappingTables::with_overrides(&config);
        Self { config, tables }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn transpile(&self, frontend: Frontend, source: &str) -> Transpiled {
        match frontend {
            Frontend::Kv => finish(self.run_kv(source), "//"),
            Frontend::Python => self.transpile_python(source, self.config.class_style),
        }
    }

    /// Python input with an explicit class style
    pub fn transpile_python(&self, source: &str, style: ClassStyle) -> Transpiled {
        finish(self.run_python(source, style), "//")
    }

    /// Python input to Kivy `EventDispatcher` models. Errors come back as a
    /// `# error: ...` line.
    pub fn transpile_kivy(&self, source: &str) -> Transpiled {
        finish(self.run_kivy(source), "#")
    }

    /// Canonical KV text for `source`
    pub fn format_kv(&self, source: &str) -> Result<String> {
        let module = kv::parser::parse(kv::lexer::tokenize(source)?)?;
        Ok(kv::printer::format_module(&module, self.config.indent_width))
    }

    fn run_kv(&self, source: &str) -> Result<Transpiled> {
        let tokens = kv::lexer::tokenize(source)?;
        let token_count = tokens.len();
        debug!("kv: {} tokens", token_count);

        let module = kv::parser::parse(tokens)?;
        debug!("kv: {} rules, {} widgets", module.rules.len(), module.widget_count());

        let generated = SwiftUiGenerator::new(&self.config, &self.tables).generate(&module);
        Ok(self.swift(generated, Stats {
            tokens: token_count,
            nodes: module.widget_count(),
            lines: 0,
        }))
    }

    fn run_python(&self, source: &str, style: ClassStyle) -> Result<Transpiled> {
        let (module, stats) = parse_python(source)?;
        let generated = PyClassGenerator::new(style, &self.tables.types).generate(&module);
        Ok(self.swift(generated, stats))
    }

    fn run_kivy(&self, source: &str) -> Result<Transpiled> {
        let (module, stats) = parse_python(source)?;
        let generated = KivyModelGenerator::new(source).generate(&module);
        let code = generated.file.render(self.config.indent_width);
        Ok(Transpiled::new(code, generated.diagnostics, stats))
    }

    fn swift(&self, generated: Generated, stats: Stats) -> Transpiled {
        let code = Printer::new(self.config.indent_width).print(&generated.file);
        Transpiled::new(code, generated.diagnostics, stats)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

fn parse_python(source: &str) -> Result<(PyModule, Stats)> {
    let tokens = python::lexer::tokenize(source)?;
    let token_count = tokens.len();
    debug!("py: {} tokens", token_count);

    let module = python::parser::parse(tokens)?;
    debug!("py: {} classes", module.classes.len());
    let stats = Stats {
        tokens: token_count,
        nodes: module.node_count(),
        lines: 0,
    };
    Ok((module, stats))
}

/// A failed run becomes one comment line behind `marker`
fn finish(result: Result<Transpiled>, marker: &str) -> Transpiled {
    result.unwrap_or_else(|error| {
        debug!("{} stage failed: {}", error.stage(), error);
        let diagnostic = Diagnostic::from_error(&error);
        Transpiled {
            code: format!("{}\n", diagnostic.comment_line(marker)),
            diagnostics: vec![diagnostic],
            stats: Stats {
                lines: 1,
                ..Stats::default()
            },
        }
    })
}

/// Shared pipeline with the built-in configuration
pub fn default_pipeline() -> &'static Pipeline {
    static DEFAULT: OnceLock<Pipeline> = OnceLock::new();
    DEFAULT.get_or_init(Pipeline::default)
}

// ==================== Entry Points ====================

/// Transpile with default settings. Never fails; errors come back as a
/// `// error: ...` line.
pub fn generate(frontend: Frontend, source: &str) -> String {
    default_pipeline().transpile(frontend, source).code
}

pub fn generate_swiftui(source: &str) -> String {
    generate(Frontend::Kv, source)
}

pub fn generate_container(source: &str) -> String {
    default_pipeline()
        .transpile_python(source, ClassStyle::Container)
        .code
}

pub fn generate_wrapper(source: &str) -> String {
    default_pipeline()
        .transpile_python(source, ClassStyle::Wrapper)
        .code
}

pub fn generate_kivy(source: &str) -> String {
    default_pipeline().transpile_kivy(source).code
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::feedback::{PARSE_ERROR, TYPE_CONFLICT, UNKNOWN_WIDGET};
    use crate::frontend::kv::ast::StructureEq;
    use pretty_assertions::assert_eq;

    const PERSON: &str = "class Person:\n    name: str\n    age: int\n    def __init__(self, name: str, age: int):\n        pass\n    def greet(self, text: str):\n        pass";

    const BOX: &str = "BoxLayout:\n    orientation: 'vertical'\n    Label:\n        text: 'Hi'";

    #[test]
    fn test_error_becomes_comment_line() {
        let result = default_pipeline().transpile(Frontend::Kv, "text: 'orphan'\n");
        assert!(result.has_errors());
        assert_eq!(result.diagnostics[0].code, PARSE_ERROR);
        assert_eq!(
            result.code,
            "// error: parse error: expected widget header, found property 'text' (line 1, column 1)\n"
        );
    }

    #[test]
    fn test_stats() {
        let result = default_pipeline().transpile(Frontend::Kv, "BoxLayout:\n    Label:\n");
        assert!(!result.has_errors());
        assert_eq!(result.stats.nodes, 2);
        assert_eq!(result.stats.lines, result.code.lines().count());
        assert!(result.stats.tokens > 0);
    }

    #[test]
    fn test_config_indent_and_style() {
        let pipeline = Pipeline::new(GeneratorConfig {
            indent_width: 2,
            class_style: ClassStyle::Wrapper,
            ..GeneratorConfig::default()
        });
        let result = pipeline.transpile(Frontend::Python, "class A:\n    x: int\n");
        assert!(result.code.contains("\n  @PyProperty\n  public var x: Int\n"));
    }

    #[test]
    fn test_format_kv() {
        let pipeline = Pipeline::default();
        let formatted = pipeline.format_kv("Label:\n        text:   \"a\"\n").unwrap();
        assert_eq!(formatted, "Label:\n    text: 'a'\n");
        assert!(pipeline.format_kv("text: 1\n").is_err());
    }

    #[test]
    fn test_report() {
        let report = default_pipeline()
            .transpile(Frontend::Python, "class A: pass\n")
            .into_report(Frontend::Python);
        assert!(report.success);
        assert_eq!(report.frontend, "py");
        assert_eq!(report.output, "@PyContainer\nclass A {\n}\n");
    }

    #[test]
    fn test_person_container() {
        let output = generate_container(PERSON);
        assert!(output.contains("@PyContainer\n@dynamicMemberLookup\nclass Person {"));
        assert!(output.contains("@PyCall\n    func greet(text: String)"));
        assert!(!output.contains("__init__"));
        assert!(!output.contains("init("));
    }

    #[test]
    fn test_box_layout_label() {
        let output = generate_swiftui(BOX);
        assert_eq!(output, "import SwiftUI\n\nVStack {\n    Text(\"Hi\")\n}\n");
        assert_eq!(output.matches("VStack {").count(), 1);
        assert_eq!(output.matches("Text(\"Hi\")").count(), 1);
    }

    #[test]
    fn test_constructor_never_emitted() {
        let sources = [
            "class A:\n    def __init__(self):\n        pass\n",
            "class B:\n    x: int\n    def __init__(self, x: int) -> None: ...\n    def run(self): ...\n",
            "@dataclass\nclass C:\n    async def __init__(self, *args, **kwargs):\n        pass\n",
        ];
        for src in sources {
            let output = generate_container(src);
            assert!(output.starts_with("@PyContainer"), "{}", output);
            assert!(!output.contains("__init__"), "{}", output);
        }
    }

    #[test]
    fn test_member_lookup_follows_fields() {
        let none = generate_container("class Empty:\n    def go(self) -> int: ...\n");
        assert!(!none.contains("@dynamicMemberLookup"));

        let one = generate_container("class One:\n    flag = True\n");
        assert!(one.contains("@dynamicMemberLookup"));
    }

    #[test]
    fn test_list_sugar_renders_like_list() {
        let cases = [
            ("list[str]", "[str]"),
            ("list[list[int]]", "[list[int]]"),
            ("list[dict[str, float]]", "[dict[str, float]]"),
        ];
        for (long, short) in cases {
            let a = generate_container(&format!("class A:\n    def f(self, v: {}): ...\n", long));
            let b = generate_container(&format!("class A:\n    def f(self, v: {}): ...\n", short));
            assert_eq!(a, b);
        }
        assert!(generate_container("class A:\n    def f(self, v: [str]): ...\n").contains("func f(v: [String])"));
    }

    #[test]
    fn test_malformed_input_is_one_error_line() {
        let output = generate_swiftui("text: 'orphan'\nLabel:\n");
        assert_eq!(output.lines().count(), 1);
        assert!(output.starts_with("// error:"));

        let output = generate(Frontend::Python, "class A\n    x: int\n");
        assert_eq!(output.lines().count(), 1);
        assert!(output.starts_with("// error:"), "{}", output);

        let output = generate_kivy("class A\n    x: int\n");
        assert_eq!(output.lines().count(), 1);
        assert!(output.starts_with("# error:"), "{}", output);
    }

    #[test]
    fn test_kv_expressions_and_dynamic_classes_translate() {
        let sources = [
            "BoxLayout:\n    width: self.height * 0.5\n",
            "<MyButton@Button>:\n    text: 'Go'\n",
            "Label:\n    text: f\"{app.title}\"\n",
            "Label:\n    opacity: -self.x\n",
            "Label:\n    text: 'a' + 'b'\n",
        ];
        for src in sources {
            let output = generate_swiftui(src);
            assert!(!output.starts_with("// error"), "{}", output);
        }
        assert!(generate_swiftui(sources[1]).contains("struct MyButton: View {"));
        assert!(generate_swiftui(sources[2]).contains("Text(\"\\(app.title)\")"));
    }

    #[test]
    fn test_module_level_python_is_ignored() {
        let src = "\
VERSION = 1

def helper(x):
    return x * 2

class A:
    x: int

if __name__ == '__main__':
    main()
";
        let output = generate_wrapper(src);
        assert!(!output.starts_with("// error"), "{}", output);
        assert!(output.contains("public class A {"));
        assert!(!output.contains("helper"));
        assert!(!output.contains("VERSION"));
    }

    #[test]
    fn test_kivy_models() {
        let result = default_pipeline().transpile_kivy(PERSON);
        assert!(!result.has_errors());
        assert_eq!(result.stats.lines, result.code.lines().count());
        assert!(result.code.contains("class PersonData(EventDispatcher):\n\n    name = StringProperty('')\n"));
        assert!(result.code.contains("class Person(Widget):\n\n    data: PersonData\n"));

        let two_space = Pipeline::new(GeneratorConfig {
            indent_width: 2,
            ..GeneratorConfig::default()
        });
        assert!(two_space
            .transpile_kivy(PERSON)
            .code
            .contains("\n  age = NumericProperty(0)\n"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let src = "\
<Row>:
    Label:
        text: 'row'
Screen:
    id: main
    TextInput:
    Slider:
    Row:
";
        let first = generate_swiftui(src);
        for _ in 0..5 {
            assert_eq!(generate_swiftui(src), first);
        }
    }

    #[test]
    fn test_concurrent_generation() {
        let expected_kv = generate_swiftui(BOX);
        let expected_py = generate_wrapper(PERSON);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                thread::spawn(move || {
                    if i % 2 == 0 {
                        generate_swiftui(BOX)
                    } else {
                        generate_wrapper(PERSON)
                    }
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let output = handle.join().unwrap();
            let expected = if i % 2 == 0 { &expected_kv } else { &expected_py };
            assert_eq!(&output, expected);
        }
    }

    #[test]
    fn test_unknown_widget_falls_back_to_vstack() {
        let result = Pipeline::default().transpile(Frontend::Kv, "BoxLayout:\n    MysteryWidget:\n");
        assert!(result.code.contains("VStack /* Unknown widget: MysteryWidget */ {}"));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, UNKNOWN_WIDGET);
        assert!(!result.has_errors());
    }

    #[test]
    fn test_optional_union() {
        let output = generate_wrapper("class A:\n    x: int | None\n    y: None | str\n    z: Optional[float] = None\n");
        assert!(output.contains("public var x: Int?"));
        assert!(output.contains("public var y: String?"));
        assert!(output.contains("public var z: Double?"));
    }

    #[test]
    fn test_wrapper_style() {
        let expected = "\
import PySwiftKit

@PyClass
public class Person {

    @PyProperty
    public var name: String

    @PyProperty
    public var age: Int

    @PyInit
    public init(name: String, age: Int) {
    }

    @PyMethod
    public func greet(text: String) {
    }
}
";
        assert_eq!(generate_wrapper(PERSON), expected);
    }

    #[test]
    fn test_field_annotation_wins_conflict() {
        let pipeline = Pipeline::default();
        let src = "class A:\n    count: int\n    def __init__(self, count: str):\n        pass\n";
        let result = pipeline.transpile_python(src, ClassStyle::Wrapper);
        assert!(result.code.contains("public var count: Int"));
        assert!(result.code.contains("public init(count: String)"));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, TYPE_CONFLICT);
        assert_eq!(
            result.diagnostics[0].message,
            "field 'count' is annotated as Int but __init__ takes String; keeping Int"
        );
    }

    #[test]
    fn test_config_overrides() {
        let config = GeneratorConfig::from_json(
            r#"{ "include_comments": false, "types": { "Decimal": "Double" }, "widgets": { "MDLabel": "Text" } }"#,
        )
        .unwrap();
        let pipeline = Pipeline::new(config);

        let py = pipeline.transpile(Frontend::Python, "class A:\n    def f(self, d: Decimal): ...\n");
        assert!(py.code.contains("func f(d: Double)"));

        let kv = pipeline.transpile(Frontend::Kv, "MDLabel:\n    text: 'x'\n    markup: True\n");
        assert_eq!(kv.code, "import SwiftUI\n\nstruct MDLabel: View {\n\n    var body: some View {\n        Text(\"x\")\n    }\n}\n");
    }

    #[test]
    fn test_kv_format_round_trip() {
        let src = "\
<Card,Tile>:
  padding: 4, 4
  Label:
     text: \"a\"
FloatLayout:
    Button:
        text: 'b'
        on_press: root.go(1)
    Image:
        source: 'x.png'
";
        let pipeline = Pipeline::default();
        let once = pipeline.format_kv(src).unwrap();
        let twice = pipeline.format_kv(&once).unwrap();
        assert_eq!(once, twice);

        let parse = |text: &str| kv::parser::parse(kv::lexer::tokenize(text).unwrap()).unwrap();
        assert!(parse(src).structure_eq(&parse(&once)));
    }
}
