//! Static validation of raw entry specifications.
//!
//! Checks an entry spec for the structural rules the builder relies on
//! before anything is lowered into the definition model.

use serde_json::{Map, Value as Json};
use wiring_common::constants::{RESERVED_ID_MARKER, keys};
use wiring_common::error::{Result, WiringError};
use wiring_common::types::Lifetime;

/// Returns `true` if `key` is present and not `null`.
pub(crate) fn has_key(spec: &Map<String, Json>, key: &str) -> bool {
    spec.get(key).is_some_and(|v| !v.is_null())
}

/// Builds a configuration error for `entry`, rendering its raw spec.
pub(crate) fn config_error(entry: &str, raw: &Json, message: impl Into<String>) -> WiringError {
    WiringError::Configuration {
        entry: entry.to_owned(),
        message: message.into(),
        spec: serde_json::to_string(raw).unwrap_or_default(),
    }
}

/// Validates a raw entry spec and returns it as a mapping.
///
/// # Checks performed
///
/// 1. The entry spec is a mapping.
/// 2. Exactly one of `class`, `value`, `factory` is present.
/// 3. `class` and `method` are strings; `factory` comes with a `method`.
/// 4. `args` and `properties`, when present, are mappings.
/// 5. A `value` entry declares no properties.
///
/// # Errors
///
/// Returns a configuration error naming `entry` if any check fails.
pub fn validate_spec<'a>(entry: &str, raw: &'a Json) -> Result<&'a Map<String, Json>> {
    let Some(spec) = raw.as_object() else {
        return Err(config_error(entry, raw, "entry specification must be a mapping"));
    };
    check_single_source(entry, raw, spec)?;
    check_string_key(entry, raw, spec, keys::CLASS)?;
    check_string_key(entry, raw, spec, keys::METHOD)?;
    if has_key(spec, keys::FACTORY) && !has_key(spec, keys::METHOD) {
        return Err(config_error(
            entry,
            raw,
            "factory dependency should have method property set",
        ));
    }
    check_mapping_key(entry, raw, spec, keys::ARGS)?;
    check_mapping_key(entry, raw, spec, keys::PROPERTIES)?;
    if has_key(spec, keys::VALUE) && non_empty_mapping(spec, keys::PROPERTIES) {
        return Err(config_error(
            entry,
            raw,
            "value dependency cannot declare properties",
        ));
    }
    Ok(spec)
}

/// Validates the id of a user-supplied entry.
///
/// # Errors
///
/// Returns a configuration error if the id is empty or uses the reserved marker.
pub fn validate_id(entry: &str, raw: &Json) -> Result<()> {
    if entry.is_empty() {
        return Err(config_error(entry, raw, "entry id must not be empty"));
    }
    if entry.starts_with(RESERVED_ID_MARKER) {
        return Err(config_error(
            entry,
            raw,
            format!("ids starting with `{RESERVED_ID_MARKER}` are reserved"),
        ));
    }
    Ok(())
}

/// Reads the `lifetime` key of a top-level entry, defaulting to singleton.
///
/// # Errors
///
/// Returns a configuration error for unknown or non-string lifetimes.
pub fn parse_lifetime(entry: &str, raw: &Json, spec: &Map<String, Json>) -> Result<Lifetime> {
    match spec.get(keys::LIFETIME) {
        None | Some(Json::Null) => Ok(Lifetime::default()),
        Some(Json::String(s)) => Lifetime::from_config(s)
            .ok_or_else(|| config_error(entry, raw, format!("unknown lifetime `{s}`"))),
        Some(_) => Err(config_error(entry, raw, "lifetime must be a string")),
    }
}

/// Reads the `default-for` key of a top-level entry.
///
/// # Errors
///
/// Returns a configuration error if the key is present but not a string.
pub fn parse_default_for(entry: &str, raw: &Json, spec: &Map<String, Json>) -> Result<Option<String>> {
    match spec.get(keys::DEFAULT_FOR) {
        None | Some(Json::Null) => Ok(None),
        Some(Json::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(config_error(entry, raw, "default-for must be a type name")),
    }
}

fn check_single_source(entry: &str, raw: &Json, spec: &Map<String, Json>) -> Result<()> {
    let present = [keys::CLASS, keys::VALUE, keys::FACTORY]
        .into_iter()
        .filter(|key| has_key(spec, key))
        .count();
    match present {
        0 => Err(config_error(
            entry,
            raw,
            "dependency should have at least one of class or value or factory property set",
        )),
        1 => Ok(()),
        _ => Err(config_error(
            entry,
            raw,
            "dependency should have only one of class, value or factory property set",
        )),
    }
}

fn check_string_key(entry: &str, raw: &Json, spec: &Map<String, Json>, key: &str) -> Result<()> {
    match spec.get(key) {
        None | Some(Json::Null | Json::String(_)) => Ok(()),
        Some(_) => Err(config_error(entry, raw, format!("`{key}` must be a string"))),
    }
}

fn check_mapping_key(entry: &str, raw: &Json, spec: &Map<String, Json>, key: &str) -> Result<()> {
    match spec.get(key) {
        None | Some(Json::Null | Json::Object(_)) => Ok(()),
        Some(_) => Err(config_error(entry, raw, format!("`{key}` must be a mapping"))),
    }
}

fn non_empty_mapping(spec: &Map<String, Json>, key: &str) -> bool {
    spec.get(key)
        .and_then(Json::as_object)
        .is_some_and(|map| !map.is_empty())
}
