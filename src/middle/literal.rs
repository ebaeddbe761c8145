//! Literal values shared by both front-ends.
//!
//! KV property values and Python default values resolve to the same closed
//! set of literal kinds, so every consumer matches exhaustively.

/// A resolved literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Opaque bare name: `vertical`, `self.width`, `None`
    Identifier(String),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    /// `dp(10)`, `root.do_it()`
    Call { callee: String, args: Vec<Literal> },
    /// Any other expression, as source text: `self.height * 0.5`,
    /// `f"{app.title}"`, `{'x': 0.5}`
    Expression(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    String,
    Integer,
    Float,
    Bool,
    Identifier,
    List,
    Tuple,
    Call,
    Expression,
}

impl Literal {
    /// Resolve a bare name. `True` / `False` become booleans.
    pub fn from_identifier(name: &str) -> Self {
        match name {
            "True" => Literal::Bool(true),
            "False" => Literal::Bool(false),
            _ => Literal::Identifier(name.to_string()),
        }
    }

    pub fn kind(&self) -> LiteralKind {
        match self {
            Literal::String(_) => LiteralKind::String,
            Literal::Integer(_) => LiteralKind::Integer,
            Literal::Float(_) => LiteralKind::Float,
            Literal::Bool(_) => LiteralKind::Bool,
            Literal::Identifier(_) => LiteralKind::Identifier,
            Literal::List(_) => LiteralKind::List,
            Literal::Tuple(_) => LiteralKind::Tuple,
            Literal::Call { .. } => LiteralKind::Call,
            Literal::Expression(_) => LiteralKind::Expression,
        }
    }

    /// Text of a string or bare identifier
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Literal::String(s) | Literal::Identifier(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Integer(i) => Some(*i as f64),
            Literal::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Literal::Integer(_) | Literal::Float(_))
    }

    /// Elements of a list or tuple
    pub fn elements(&self) -> Option<&[Literal]> {
        match self {
            Literal::List(items) | Literal::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// True if the value refers to runtime state (`self.x`, `root.y`, `app.z`)
    pub fn is_dynamic(&self) -> bool {
        match self {
            Literal::Identifier(name) => is_dynamic_name(name),
            Literal::List(items) | Literal::Tuple(items) => items.iter().any(Literal::is_dynamic),
            Literal::Call { callee, args } => {
                is_dynamic_name(callee) || args.iter().any(Literal::is_dynamic)
            }
            Literal::Expression(text) => text
                .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
                .any(is_dynamic_name),
            Literal::String(_) | Literal::Integer(_) | Literal::Float(_) | Literal::Bool(_) => {
                false
            }
        }
    }
}

fn is_dynamic_name(name: &str) -> bool {
    ["self.", "root.", "app."].iter().any(|p| name.starts_with(p))
}

/// Whether all items share one kind. Integers and floats count as one
/// numeric kind; an empty sequence is homogeneous.
pub fn is_homogeneous(items: &[Literal]) -> bool {
    let normalize = |k: LiteralKind| match k {
        LiteralKind::Integer => LiteralKind::Float,
        other => other,
    };
    let mut kinds = items.iter().map(|l| normalize(l.kind()));
    match kinds.next() {
        Some(first) => kinds.all(|k| k == first),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_identifier() {
        assert_eq!(Literal::from_identifier("True"), Literal::Bool(true));
        assert_eq!(Literal::from_identifier("False"), Literal::Bool(false));
        assert_eq!(
            Literal::from_identifier("vertical"),
            Literal::Identifier("vertical".to_string())
        );
    }

    #[test]
    fn test_homogeneous() {
        assert!(is_homogeneous(&[Literal::Integer(1), Literal::Float(0.5)]));
        assert!(is_homogeneous(&[]));
        assert!(!is_homogeneous(&[
            Literal::Integer(1),
            Literal::String("a".to_string())
        ]));
    }

    #[test]
    fn test_dynamic() {
        let lit = Literal::Tuple(vec![
            Literal::Identifier("self.width".to_string()),
            Literal::Integer(10),
        ]);
        assert!(lit.is_dynamic());
        assert!(!Literal::Identifier("vertical".to_string()).is_dynamic());
        let call = Literal::Call {
            callee: "dp".to_string(),
            args: vec![Literal::Identifier("root.size".to_string())],
        };
        assert!(call.is_dynamic());

        assert!(Literal::Expression("self.height * 0.5".to_string()).is_dynamic());
        assert!(Literal::Expression("f\"{app.title}\"".to_string()).is_dynamic());
        assert!(!Literal::Expression("myself.x + 1".to_string()).is_dynamic());
    }
}
