//! Generator configuration
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! { "indent_width": 2, "class_style": "wrapper", "types": { "Decimal": "Double" } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::middle::types::TypeTable;
use crate::middle::widgets::WidgetTable;

/// Output style for Python classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassStyle {
    /// `@PyContainer` classes with `@PyCall` method stubs
    #[default]
    Container,
    /// `@PyClass` classes with `@PyProperty` / `@PyInit` / `@PyMethod` members
    Wrapper,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub indent_width: usize,
    /// Emit `//` comments for unknown widgets and untranslated properties
    pub include_comments: bool,
    /// Wrap a non-layout root widget in its own `View` struct
    pub generate_structs: bool,
    pub generate_state_properties: bool,
    pub class_style: ClassStyle,
    /// KV class → SwiftUI view name
    pub widgets: BTreeMap<String, String>,
    /// Python type → Swift type name
    pub types: BTreeMap<String, String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            indent_width: 4,
            include_comments: true,
            generate_structs: true,
            generate_state_properties: true,
            class_style: ClassStyle::Container,
            widgets: BTreeMap::new(),
            types: BTreeMap::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Lookup tables resolved once from a config. Read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct MappingTables {
    pub widgets: WidgetTable,
    pub types: TypeTable,
}

impl MappingTables {
    pub fn builtin() -> Self {
        Self {
            widgets: WidgetTable::builtin(),
            types: TypeTable::builtin(),
        }
    }

    pub fn with_overrides(config: &GeneratorConfig) -> Self {
        Self {
            widgets: WidgetTable::with_overrides(&config.widgets),
            types: TypeTable::with_overrides(&config.types),
        }
    }
}
