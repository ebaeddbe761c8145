//! Swift output AST
//!
//! Generators build this tree; `Printer` turns it into text. Nothing here
//! knows about Python or KV.

use crate::middle::types::TypeDescriptor;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFile {
    pub imports: Vec<String>,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Class(ClassDecl),
    ViewStruct(ViewStruct),
    /// A bare view expression at file level
    View(ViewExpr),
    /// A `//` comment line
    Comment(String),
}

// ==================== Classes ====================

/// Interop marker printed on its own line above a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    PyContainer,
    DynamicMemberLookup,
    PyCall,
    PyClass,
    PyProperty,
    PyInit,
    PyMethod,
}

impl Attribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::PyContainer => "@PyContainer",
            Attribute::DynamicMemberLookup => "@dynamicMemberLookup",
            Attribute::PyCall => "@PyCall",
            Attribute::PyClass => "@PyClass",
            Attribute::PyProperty => "@PyProperty",
            Attribute::PyInit => "@PyInit",
            Attribute::PyMethod => "@PyMethod",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Public,
    Static,
}

impl Modifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Static => "static",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub attributes: Vec<Attribute>,
    pub modifiers: Vec<Modifier>,
    pub name: String,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Property(PropertyDecl),
    Initializer(InitDecl),
    Method(MethodDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub attributes: Vec<Attribute>,
    pub modifiers: Vec<Modifier>,
    pub name: String,
    pub ty: TypeDescriptor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitDecl {
    pub attributes: Vec<Attribute>,
    pub modifiers: Vec<Modifier>,
    pub params: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub attributes: Vec<Attribute>,
    pub modifiers: Vec<Modifier>,
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeDescriptor>,
    /// `false` prints a bare signature
    pub has_body: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeDescriptor,
}

// ==================== Views ====================

/// `struct Name: View { @State ...; var body: some View { ... } }`
#[derive(Debug, Clone, PartialEq)]
pub struct ViewStruct {
    /// Printed on the line above the declaration
    pub comment: Option<String>,
    pub name: String,
    pub state: Vec<StateVar>,
    pub body: ViewExpr,
}

/// `@State private var name: Type = value`
#[derive(Debug, Clone, PartialEq)]
pub struct StateVar {
    pub name: String,
    pub ty: String,
    pub value: Expr,
}

/// One view constructor with its trailing blocks and modifier chain
#[derive(Debug, Clone, PartialEq)]
pub struct ViewExpr {
    /// Inline `/* ... */` after the constructor
    pub comment: Option<String>,
    pub call: Call,
    /// Trailing action closure (`Button`), printed as comment lines
    pub action: Option<Vec<String>>,
    /// Trailing content block
    pub children: Option<Vec<ViewExpr>>,
    pub modifiers: Vec<ViewModifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: String,
    /// `None` prints no parentheses (`VStack { }`)
    pub args: Option<Vec<Argument>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub label: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewModifier {
    /// `.name(args)`
    Call(Call),
    /// `// text` inside the modifier chain
    Comment(String),
    /// `.name { children }`
    Block { name: String, children: Vec<ViewExpr> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// `.center`
    Member(String),
    /// Printed verbatim (`$text`, `self.width`, `.infinity`)
    Raw(String),
    Array(Vec<Expr>),
    Tuple(Vec<Expr>),
    Call(Call),
}

impl Call {
    pub fn new(callee: impl Into<String>, args: Vec<Argument>) -> Self {
        Self {
            callee: callee.into(),
            args: Some(args),
        }
    }

    /// Constructor without an argument list
    pub fn bare(callee: impl Into<String>) -> Self {
        Self {
            callee: callee.into(),
            args: None,
        }
    }
}

impl Argument {
    pub fn labeled(label: impl Into<String>, value: Expr) -> Self {
        Self {
            label: Some(label.into()),
            value,
        }
    }

    pub fn positional(value: Expr) -> Self {
        Self { label: None, value }
    }
}

impl ViewExpr {
    pub fn new(call: Call) -> Self {
        Self {
            comment: None,
            call,
            action: None,
            children: None,
            modifiers: Vec::new(),
        }
    }

    /// Number of view constructors in this subtree, modifier blocks included
    pub fn count(&self) -> usize {
        let in_children: usize = self
            .children
            .iter()
            .flatten()
            .map(ViewExpr::count)
            .sum();
        let in_modifiers: usize = self
            .modifiers
            .iter()
            .map(|m| match m {
                ViewModifier::Block { children, .. } => children.iter().map(ViewExpr::count).sum(),
                ViewModifier::Call(_) | ViewModifier::Comment(_) => 0,
            })
            .sum();
        1 + in_children + in_modifiers
    }
}

impl Expr {
    pub fn raw(text: impl Into<String>) -> Self {
        Expr::Raw(text.into())
    }
}
