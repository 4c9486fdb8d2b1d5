//! Configuration model for building a container.

use serde::{Deserialize, Serialize};

/// Behaviour switches for definition building and resolution.
///
/// The defaults are permissive: unknown interpolation tokens collapse to
/// their bare name and a repeated `default-for` type keeps the last entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ContainerOptions {
    /// Fail with an undefined-parameter error on unknown `{$name}` tokens.
    pub strict_interpolation: bool,
    /// Reject a second entry declaring `default-for` the same type.
    pub forbid_duplicate_defaults: bool,
}

/// A complete configuration document: entry specs, parameters, options.
///
/// Entry specs are kept as raw trees; the definition builder normalizes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyDocument {
    /// Entry id to raw entry specification.
    pub entries: serde_json::Map<String, serde_json::Value>,
    /// Initial flat parameter table.
    pub parameters: serde_json::Map<String, serde_json::Value>,
    /// Behaviour switches.
    pub options: ContainerOptions,
}

impl AssemblyDocument {
    /// Parses a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid document.
    pub fn from_json_str(text: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
