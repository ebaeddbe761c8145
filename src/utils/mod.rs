//! Shared utilities - source spans and the front-end error type

mod span;
mod error;

pub use span::Span;
pub use error::{Error, Result};
