//! pyswiftgen CLI
//!
//! Thin wrapper over the library: reads files, applies flags, prints.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use pyswiftgen::config::{ClassStyle, GeneratorConfig};
use pyswiftgen::frontend::{kv, python};
use pyswiftgen::pipeline::{Frontend, Pipeline, Transpiled};

/// pyswiftgen - KV to SwiftUI and Python to PySwiftKit
#[derive(Parser, Debug)]
#[command(name = "pyswiftgen")]
#[command(author = "Z1529")]
#[command(version)]
#[command(about = "Kivy KV to SwiftUI and Python class to PySwiftKit transpiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print a JSON report instead of raw output
    #[arg(long, global = true)]
    json: bool,

    /// Indent width of generated code
    #[arg(long, global = true, value_name = "N")]
    indent: Option<usize>,

    /// Exit with status 2 when generation reports an error
    #[arg(long, global = true)]
    strict: bool,

    /// Output file (stdout by default)
    #[arg(short, long, global = true, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate KV markup to SwiftUI
    Kv {
        /// Input file, or `-` for stdin
        input: PathBuf,

        /// Drop explanatory comments
        #[arg(long)]
        no_comments: bool,

        /// Emit the root widget as a bare view
        #[arg(long)]
        no_structs: bool,

        /// Skip `@State` properties
        #[arg(long)]
        no_state: bool,
    },
    /// Translate Python classes to PySwiftKit wrappers
    Py {
        /// Input file, or `-` for stdin
        input: PathBuf,

        #[arg(long, value_enum)]
        style: Option<StyleArg>,
    },
    /// Generate Kivy EventDispatcher models from Python classes
    Kivy {
        /// Input file, or `-` for stdin
        input: PathBuf,
    },
    /// Reformat KV markup
    Fmt {
        input: PathBuf,
    },
    /// Dump the token stream
    Tokens {
        input: PathBuf,

        #[arg(long, value_enum, default_value = "kv")]
        lang: Lang,
    },
    /// Dump the parsed tree
    Ast {
        input: PathBuf,

        #[arg(long, value_enum, default_value = "kv")]
        lang: Lang,
    },
    /// Print version information
    Version,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StyleArg {
    Container,
    Wrapper,
}

impl From<StyleArg> for ClassStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Container => ClassStyle::Container,
            StyleArg::Wrapper => ClassStyle::Wrapper,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Lang {
    Kv,
    Py,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(1);
        }
    }
}

/// Returns the process exit code
fn run(cli: &Cli) -> Result<i32> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(indent) = cli.indent {
        config.indent_width = indent;
    }

    match &cli.command {
        Commands::Kv {
            input,
            no_comments,
            no_structs,
            no_state,
        } => {
            config.include_comments &= !no_comments;
            config.generate_structs &= !no_structs;
            config.generate_state_properties &= !no_state;
            let source = read_input(input)?;
            let result = Pipeline::new(config).transpile(Frontend::Kv, &source);
            emit_result(cli, Frontend::Kv, result)
        }
        Commands::Py { input, style } => {
            if let Some(style) = style {
                config.class_style = (*style).into();
            }
            let source = read_input(input)?;
            let result = Pipeline::new(config).transpile(Frontend::Python, &source);
            emit_result(cli, Frontend::Python, result)
        }
        Commands::Kivy { input } => {
            let source = read_input(input)?;
            let result = Pipeline::new(config).transpile_kivy(&source);
            emit_result(cli, Frontend::Python, result)
        }
        Commands::Fmt { input } => {
            let source = read_input(input)?;
            let formatted = Pipeline::new(config)
                .format_kv(&source)
                .with_context(|| format!("cannot format {}", input.display()))?;
            write_output(cli.output.as_deref(), &formatted)?;
            Ok(0)
        }
        Commands::Tokens { input, lang } => {
            let source = read_input(input)?;
            let mut out = String::new();
            match lang {
                Lang::Kv => {
                    for token in kv::lexer::tokenize(&source)? {
                        out.push_str(&format!("{}:{}\t{:?}\n", token.span.line, token.span.column, token.kind));
                    }
                }
                Lang::Py => {
                    for token in python::lexer::tokenize(&source)? {
                        out.push_str(&format!("{}:{}\t{:?}\n", token.span.line, token.span.column, token.kind));
                    }
                }
            }
            write_output(cli.output.as_deref(), &out)?;
            Ok(0)
        }
        Commands::Ast { input, lang } => {
            let source = read_input(input)?;
            let tree = match lang {
                Lang::Kv => format!("{:#?}\n", kv::parser::parse(kv::lexer::tokenize(&source)?)?),
                Lang::Py => format!(
                    "{:#?}\n",
                    python::parser::parse(python::lexer::tokenize(&source)?)?
                ),
            };
            write_output(cli.output.as_deref(), &tree)?;
            Ok(0)
        }
        Commands::Version => {
            println!("pyswiftgen {}", env!("CARGO_PKG_VERSION"));
            println!("KV → SwiftUI, Python → PySwiftKit, Python → Kivy models");
            println!("License: Apache-2.0");
            Ok(0)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<GeneratorConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("cannot read config {}", path.display()))?;
            GeneratorConfig::from_json(&text)
                .with_context(|| format!("invalid config {}", path.display()))
        }
        None => Ok(GeneratorConfig::default()),
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("cannot read stdin")?;
        return Ok(source);
    }
    fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))
        }
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

fn emit_result(cli: &Cli, frontend: Frontend, result: Transpiled) -> Result<i32> {
    let failed = result.has_errors();
    for diagnostic in &result.diagnostics {
        log::info!("{} [{}] {}", diagnostic.severity.as_str(), diagnostic.code, diagnostic.message);
    }

    let text = if cli.json {
        let mut json = result.into_report(frontend).to_json();
        json.push('\n');
        json
    } else {
        result.code
    };
    write_output(cli.output.as_deref(), &text)?;

    Ok(if cli.strict && failed { 2 } else { 0 })
}
