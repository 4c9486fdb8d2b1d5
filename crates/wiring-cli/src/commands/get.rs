//! `wire get` — Resolve one entry and print it as JSON.
//!
//! No host types are registered, so only literal, parameter, and reference
//! graphs resolve; class entries report an unknown-type error.

use std::path::PathBuf;

use clap::Args;
use serde_json::Value as Json;
use wiring_common::config::AssemblyDocument;
use wiring_common::types::Value;
use wiring_runtime::{Container, TypeRegistry};

use crate::{loader, output};

/// Arguments for the `get` command.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Path to the assembly document (JSON or YAML).
    pub file: PathBuf,

    /// Entry id to resolve.
    pub id: String,

    /// Parameter override as `NAME=VALUE`; `VALUE` is read as JSON when it parses.
    #[arg(short, long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, Json)>,
}

/// Parses a `NAME=VALUE` parameter override.
///
/// # Errors
///
/// Returns a message if the `=` separator or the name is missing.
pub fn parse_param(raw: &str) -> Result<(String, Json), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))?;
    if name.is_empty() {
        return Err(format!("parameter name is empty in `{raw}`"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Json::String(value.to_owned()));
    Ok((name.to_owned(), value))
}

/// Builds a container for `document`, applies `overrides`, and resolves `id`.
///
/// # Errors
///
/// Returns an error if the document is malformed or resolution fails.
pub fn resolve(document: &AssemblyDocument, id: &str, overrides: &[(String, Json)]) -> anyhow::Result<Value> {
    let mut container = Container::from_document(document, TypeRegistry::new())?;
    for (name, value) in overrides {
        let _ = container.set_parameter(name.clone(), Value::from_json(value));
    }
    Ok(container.get_instance(id)?)
}

/// Executes the `get` command.
///
/// # Errors
///
/// Returns an error if loading the document or resolving the entry fails.
pub fn execute(args: GetArgs, strict: bool) -> anyhow::Result<()> {
    let document = loader::load_document(&args.file, strict)?;
    let value = resolve(&document, &args.id, &args.params)?;
    println!("{}", output::render_value(&value)?);
    Ok(())
}
