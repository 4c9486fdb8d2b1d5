//! `wire check` — Validate a document and report its entries.

use std::path::PathBuf;

use clap::Args;
use wiring_common::config::AssemblyDocument;
use wiring_common::constants::DEFAULT_DOCUMENT_FILE;
use wiring_definition::build_definitions;
use wiring_definition::graph::DependencyGraph;

use crate::loader;

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the assembly document (JSON or YAML).
    #[arg(default_value = DEFAULT_DOCUMENT_FILE)]
    pub file: PathBuf,
}

/// Findings of a static check.
#[derive(Debug, Default)]
pub struct CheckReport {
    /// Named entries declared by the document.
    pub entries: usize,
    /// Entries lifted from inline specifications.
    pub inline: usize,
    /// Initial parameters.
    pub parameters: usize,
    /// `(type, entry)` pairs of the type-default index.
    pub type_defaults: Vec<(String, String)>,
    /// `(entry, type)` lookups only a registered host type can satisfy.
    pub unbound_types: Vec<(String, String)>,
    /// `(entry, id)` references to undefined entries.
    pub dangling: Vec<(String, String)>,
}

/// Builds the definitions of `document` and inspects their graph.
///
/// # Errors
///
/// Returns an error for malformed entries or a constructor cycle.
pub fn inspect(document: &AssemblyDocument) -> anyhow::Result<CheckReport> {
    let definitions = build_definitions(&document.entries, document.options)?;
    let graph = DependencyGraph::from_definitions(&definitions);
    let _ = graph.construction_order()?;
    let inline = definitions.iter().filter(|entry| entry.is_anonymous()).count();
    Ok(CheckReport {
        entries: definitions.len() - inline,
        inline,
        parameters: document.parameters.len(),
        type_defaults: definitions
            .type_defaults()
            .map(|(type_name, id)| (type_name.to_owned(), id.to_owned()))
            .collect(),
        unbound_types: graph.unbound_types().to_vec(),
        dangling: graph.dangling_references().to_vec(),
    })
}

/// Executes the `check` command.
///
/// # Errors
///
/// Returns an error if the document is unreadable, malformed, cyclic, or
/// references undefined entries.
pub fn execute(args: &CheckArgs, strict: bool) -> anyhow::Result<()> {
    let document = loader::load_document(&args.file, strict)?;
    let report = inspect(&document)?;

    println!("Checked: {}", args.file.display());
    println!(
        "  {} entr{}, {} inline, {} parameter(s)",
        report.entries,
        if report.entries == 1 { "y" } else { "ies" },
        report.inline,
        report.parameters
    );
    for (type_name, id) in &report.type_defaults {
        println!("  default-for {type_name}: {id}");
    }
    for (entry, type_name) in &report.unbound_types {
        println!("  note: {entry} needs {type_name}, which only a registered type can satisfy");
    }
    for (entry, target) in &report.dangling {
        println!("  error: {entry} references undefined entry {target}");
    }
    if !report.dangling.is_empty() {
        anyhow::bail!("{} undefined reference(s)", report.dangling.len());
    }
    println!("  OK");
    Ok(())
}
