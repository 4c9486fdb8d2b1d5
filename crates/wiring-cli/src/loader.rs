//! Reading assembly documents from disk.
//!
//! `.yaml` and `.yml` files are decoded with `serde_yaml`; anything else is
//! treated as JSON.

use std::path::Path;

use anyhow::Context;
use wiring_common::config::AssemblyDocument;

/// Document encodings understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// JSON text.
    Json,
    /// YAML text.
    Yaml,
}

impl Format {
    /// Picks the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

/// Parses a document from text in the given format.
///
/// # Errors
///
/// Returns an error if the text is not a valid document.
pub fn parse_document(text: &str, format: Format) -> anyhow::Result<AssemblyDocument> {
    let document = match format {
        Format::Json => AssemblyDocument::from_json_str(text)?,
        Format::Yaml => serde_yaml::from_str(text)?,
    };
    Ok(document)
}

/// Loads a document, forcing strict interpolation when `strict` is set.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_document(path: &Path, strict: bool) -> anyhow::Result<AssemblyDocument> {
    tracing::info!(path = %path.display(), "loading assembly document");
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut document = parse_document(&text, Format::from_path(path))
        .with_context(|| format!("failed to parse {}", path.display()))?;
    if strict {
        document.options.strict_interpolation = true;
    }
    tracing::debug!(
        entries = document.entries.len(),
        parameters = document.parameters.len(),
        "document loaded"
    );
    Ok(document)
}
