//! KV widget classes and the SwiftUI views they become

use std::collections::{BTreeMap, HashMap};

/// Target view family for a KV widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetKind {
    /// `VStack` or `HStack` depending on `orientation`
    Stack,
    VStack,
    HStack,
    /// `LazyVGrid`
    Grid,
    ZStackTopLeading,
    ZStack,
    ScrollView,
    Text,
    Button,
    TextField,
    Image,
    Slider,
    Toggle,
    ProgressView,
    /// A user view, constructed as `Name()`
    Custom(String),
}

impl WidgetKind {
    /// Kinds that take a trailing block of child views
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            WidgetKind::Stack
                | WidgetKind::VStack
                | WidgetKind::HStack
                | WidgetKind::Grid
                | WidgetKind::ZStackTopLeading
                | WidgetKind::ZStack
                | WidgetKind::ScrollView
        )
    }

    /// Resolve a SwiftUI view name given in configuration
    pub fn from_swift_name(name: &str) -> Self {
        match name {
            "VStack" => WidgetKind::VStack,
            "HStack" => WidgetKind::HStack,
            "LazyVGrid" => WidgetKind::Grid,
            "ZStack" => WidgetKind::ZStack,
            "ScrollView" => WidgetKind::ScrollView,
            "Text" => WidgetKind::Text,
            "Button" => WidgetKind::Button,
            "TextField" => WidgetKind::TextField,
            "Image" => WidgetKind::Image,
            "Slider" => WidgetKind::Slider,
            "Toggle" => WidgetKind::Toggle,
            "ProgressView" => WidgetKind::ProgressView,
            other => WidgetKind::Custom(other.to_string()),
        }
    }
}

const BUILTIN_WIDGETS: &[(&str, WidgetKind)] = &[
    ("BoxLayout", WidgetKind::Stack),
    ("GridLayout", WidgetKind::Grid),
    ("FloatLayout", WidgetKind::ZStackTopLeading),
    ("RelativeLayout", WidgetKind::ZStackTopLeading),
    ("AnchorLayout", WidgetKind::ZStack),
    ("StackLayout", WidgetKind::VStack),
    ("Widget", WidgetKind::VStack),
    ("ScrollView", WidgetKind::ScrollView),
    ("Label", WidgetKind::Text),
    ("Button", WidgetKind::Button),
    ("TextInput", WidgetKind::TextField),
    ("Image", WidgetKind::Image),
    ("Slider", WidgetKind::Slider),
    ("Switch", WidgetKind::Toggle),
    ("ProgressBar", WidgetKind::ProgressView),
];

/// Layout classes that are emitted as a bare view when used as the root
pub const BUILTIN_LAYOUTS: &[&str] = &[
    "BoxLayout",
    "GridLayout",
    "FloatLayout",
    "RelativeLayout",
    "StackLayout",
    "ScrollView",
    "Widget",
    "AnchorLayout",
];

pub fn is_builtin_layout(name: &str) -> bool {
    BUILTIN_LAYOUTS.contains(&name)
}

/// KV class name → view kind
#[derive(Debug, Clone)]
pub struct WidgetTable {
    entries: HashMap<String, WidgetKind>,
}

impl WidgetTable {
    pub fn builtin() -> Self {
        let entries = BUILTIN_WIDGETS
            .iter()
            .map(|(name, kind)| (name.to_string(), kind.clone()))
            .collect();
        Self { entries }
    }

    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut table = Self::builtin();
        for (kv_name, swift_name) in overrides {
            table
                .entries
                .insert(kv_name.clone(), WidgetKind::from_swift_name(swift_name));
        }
        table
    }

    pub fn lookup(&self, name: &str) -> Option<&WidgetKind> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for WidgetTable {
    fn default() -> Self {
        Self::builtin()
    }
}
