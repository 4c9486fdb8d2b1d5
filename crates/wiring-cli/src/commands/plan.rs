//! `wire plan` — Display the construction order of a document's entries.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Args;
use wiring_common::constants::DEFAULT_DOCUMENT_FILE;
use wiring_definition::graph::DependencyGraph;
use wiring_definition::{DefinitionSet, build_definitions};

use crate::{loader, output};

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the assembly document (JSON or YAML).
    #[arg(default_value = DEFAULT_DOCUMENT_FILE)]
    pub file: PathBuf,

    /// Hide entries lifted from inline specifications.
    #[arg(long)]
    pub named_only: bool,
}

/// Renders the construction plan of `definitions`.
///
/// # Errors
///
/// Returns an error if constructor bindings form a cycle.
pub fn render_plan(definitions: &DefinitionSet, named_only: bool) -> anyhow::Result<String> {
    let graph = DependencyGraph::from_definitions(definitions);
    let order = graph.construction_order()?;
    let mut out = String::new();
    let mut shown = 0_usize;
    for id in &order {
        let Some(entry) = definitions.get(id) else {
            continue;
        };
        if named_only && entry.is_anonymous() {
            continue;
        }
        shown += 1;
        writeln!(out, "  + {id}")?;
        writeln!(out, "      {}", output::describe_entry(entry))?;
    }
    writeln!(out)?;
    writeln!(out, "  {shown} entr{} in construction order.", if shown == 1 { "y" } else { "ies" })?;

    if !graph.deferred_links().is_empty() {
        writeln!(out)?;
        writeln!(out, "  Property links (injected after construction):")?;
        for (entry, target) in graph.deferred_links() {
            writeln!(out, "    {entry} -> {target}")?;
        }
    }
    Ok(out)
}

/// Executes the `plan` command.
///
/// # Errors
///
/// Returns an error if loading, building, or ordering the document fails.
pub fn execute(args: &PlanArgs, strict: bool) -> anyhow::Result<()> {
    let document = loader::load_document(&args.file, strict)?;
    let definitions = build_definitions(&document.entries, document.options)?;
    let plan = render_plan(&definitions, args.named_only)?;

    println!("Construction plan for: {}", args.file.display());
    println!("{}", output::rule(35));
    println!();
    print!("{plan}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiring_common::config::ContainerOptions;

    use super::*;

    fn definitions(entries: &serde_json::Value) -> DefinitionSet {
        build_definitions(entries.as_object().expect("mapping"), ContainerOptions::default())
            .expect("definitions")
    }

    #[test]
    fn dependencies_are_listed_first() {
        let set = definitions(&json!({
            "root": {"class": "SampleRoot", "args": {"arg": {"ref": "dep"}}},
            "dep": {"class": "SampleDependency", "properties": {"root": {"ref": "root"}}}
        }));
        let plan = render_plan(&set, false).expect("plan");
        let dep = plan.find("+ dep").expect("dep listed");
        let root = plan.find("+ root").expect("root listed");
        assert!(dep < root, "got:\n{plan}");
        assert!(plan.contains("2 entries in construction order."));
        assert!(plan.contains("dep -> root"));
        assert!(plan.contains("class SampleDependency, singleton, sets root"));
    }

    #[test]
    fn named_only_hides_inline_entries() {
        let set = definitions(&json!({
            "svc": {"factory": {"class": "Factory"}, "method": "build"}
        }));
        let full = render_plan(&set, false).expect("plan");
        let named = render_plan(&set, true).expect("plan");
        assert!(full.contains("+ #anon_1"));
        assert!(!named.contains("#anon_1"));
        assert!(named.contains("1 entry in construction order."));
    }

    #[test]
    fn cycles_are_errors() {
        let set = definitions(&json!({
            "a": {"class": "A", "args": {"b": {"ref": "b"}}},
            "b": {"class": "B", "args": {"a": {"ref": "a"}}}
        }));
        assert!(render_plan(&set, false).is_err());
    }
}
