use std::collections::HashMap;

use crate::color::Rgb;

/// A resolved `{primary, secondary}` color pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SchemePair {
    pub primary: Rgb,
    pub secondary: Rgb,
}

/// Identifier of the default scheme; unknown identifiers resolve to this pair.
pub const DEFAULT_SCHEME: &str = "blaze";

const BUILTINS: &[(&str, SchemePair)] = &[
    (
        "blaze",
        SchemePair {
            primary: Rgb::new(0xff, 0x6a, 0x00),
            secondary: Rgb::new(0x3d, 0x0c, 0x02),
        },
    ),
    (
        "ember",
        SchemePair {
            primary: Rgb::new(0xe2, 0x58, 0x22),
            secondary: Rgb::new(0x2b, 0x0a, 0x02),
        },
    ),
    (
        "glacier",
        SchemePair {
            primary: Rgb::new(0x7f, 0xd4, 0xff),
            secondary: Rgb::new(0x0b, 0x25, 0x45),
        },
    ),
    (
        "verdant",
        SchemePair {
            primary: Rgb::new(0x6f, 0xcf, 0x4f),
            secondary: Rgb::new(0x0c, 0x33, 0x18),
        },
    ),
    (
        "mono",
        SchemePair {
            primary: Rgb::new(0xe8, 0xe8, 0xe8),
            secondary: Rgb::new(0x1a, 0x1a, 0x1a),
        },
    ),
];

pub fn builtin(id: &str) -> Option<SchemePair> {
    BUILTINS
        .iter()
        .find(|(name, _)| *name == id)
        .map(|(_, pair)| *pair)
}

pub fn default_pair() -> SchemePair {
    BUILTINS[0].1
}

/// Built-in schemes plus custom-registered entries. Resolution never fails:
/// unknown identifiers yield the [`DEFAULT_SCHEME`] pair.
#[derive(Clone, Debug, Default)]
pub struct SchemeRegistry {
    custom: HashMap<String, SchemePair>,
}

impl SchemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a custom scheme. Custom entries shadow
    /// built-ins of the same name.
    pub fn register(&mut self, id: impl Into<String>, pair: SchemePair) {
        self.custom.insert(id.into(), pair);
    }

    pub fn resolve(&self, id: &str) -> SchemePair {
        self.custom
            .get(id)
            .copied()
            .or_else(|| builtin(id))
            .unwrap_or_else(default_pair)
    }
}
