//! Middle-end module - literal values, type and widget mapping

pub mod literal;
pub mod types;
pub mod widgets;

pub use literal::Literal;
pub use types::{TypeDescriptor, TypeMapper, TypeTable};
pub use widgets::{WidgetKind, WidgetTable};
