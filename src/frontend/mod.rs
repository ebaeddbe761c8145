//! Frontend module - KV and Python lexers and parsers

pub mod indent;
pub mod kv;
pub mod python;
