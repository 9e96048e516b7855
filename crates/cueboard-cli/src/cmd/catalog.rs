use anyhow::Context;
use clap::Subcommand;
use cueboard_core::{
    resolver::CatalogEntry,
    types::{Namespace, TargetKind},
};
use std::path::Path;

use super::{block_on, print_notices, Project};
use crate::output::{print_json, print_table};

#[derive(Subcommand)]
pub enum CatalogSubcommand {
    /// Names currently offered for a target kind, fetched fresh
    Names {
        namespace: Namespace,
        /// scene, model, hotkey or expression
        kind: TargetKind,
    },
    /// Show ID/name pairs for a target kind
    List {
        namespace: Namespace,
        kind: TargetKind,
    },
    /// Add an ID/name pair
    Add {
        namespace: Namespace,
        kind: TargetKind,
        id: String,
        name: String,
    },
    /// Remove the entry with this ID
    Remove {
        namespace: Namespace,
        kind: TargetKind,
        id: String,
    },
}

pub fn run(root: &Path, subcmd: CatalogSubcommand, json: bool) -> anyhow::Result<()> {
    let mut project = Project::open(root)?;
    match subcmd {
        CatalogSubcommand::Names { namespace, kind } => names(&project, namespace, kind, json),
        CatalogSubcommand::List { namespace, kind } => list(&project, namespace, kind, json),
        CatalogSubcommand::Add {
            namespace,
            kind,
            id,
            name,
        } => add(&mut project, namespace, kind, id, name),
        CatalogSubcommand::Remove {
            namespace,
            kind,
            id,
        } => remove(&mut project, namespace, kind, &id),
    }
}

fn names(project: &Project, namespace: Namespace, kind: TargetKind, json: bool) -> anyhow::Result<()> {
    let mut session = project.session();
    let result = block_on(session.picker_options(namespace, kind))?;
    print_notices(&session.drain_notices(), json);
    let names = result?;
    if json {
        return print_json(&names);
    }
    if names.is_empty() {
        println!("No {namespace} {kind}s.");
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn list(project: &Project, namespace: Namespace, kind: TargetKind, json: bool) -> anyhow::Result<()> {
    let entries = project.catalog.entries(namespace, kind);
    if json {
        return print_json(&entries);
    }
    print_table(
        &["ID", "NAME"],
        entries
            .iter()
            .map(|e| vec![e.id.clone(), e.name.clone()])
            .collect(),
    );
    Ok(())
}

fn add(
    project: &mut Project,
    namespace: Namespace,
    kind: TargetKind,
    id: String,
    name: String,
) -> anyhow::Result<()> {
    let entries = project
        .catalog
        .entries_mut(namespace, kind)
        .with_context(|| format!("{namespace} has no {kind}s"))?;
    if entries.iter().any(|e| e.id == id) {
        anyhow::bail!("{namespace} {kind} '{id}' is already in the catalog");
    }
    if entries.iter().any(|e| e.name == name) {
        anyhow::bail!("another {namespace} {kind} is already named '{name}'");
    }
    entries.push(CatalogEntry::new(id.as_str(), name.as_str()));
    save(project)?;
    println!("Added {namespace} {kind} '{name}' ({id}).");
    Ok(())
}

fn remove(project: &mut Project, namespace: Namespace, kind: TargetKind, id: &str) -> anyhow::Result<()> {
    let entries = project
        .catalog
        .entries_mut(namespace, kind)
        .with_context(|| format!("{namespace} has no {kind}s"))?;
    let before = entries.len();
    entries.retain(|e| e.id != id);
    if entries.len() == before {
        anyhow::bail!("{namespace} {kind} '{id}' is not in the catalog");
    }
    save(project)?;
    println!("Removed {namespace} {kind} '{id}'.");
    Ok(())
}

fn save(project: &Project) -> anyhow::Result<()> {
    let path = project.config.catalog_path(&project.root);
    project
        .catalog
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))
}
