use anyhow::Context;
use cueboard_core::{action::ActionConfig, io};
use std::path::Path;

use super::Project;
use crate::output::print_json;

/// Write every stored action as `{"actions": {...}}`, to `output` or stdout.
pub fn export(root: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let config = project.db.export()?;
    let Some(path) = output else {
        return print_json(&config);
    };
    let data = serde_json::to_string_pretty(&config)?;
    io::atomic_write(path, data.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Exported {} action(s) to {}.", config.actions.len(), path.display());
    Ok(())
}

/// Load an exported file. Nothing is written unless every action in it is
/// valid and, without `overwrite`, none of its IDs are taken.
pub fn import(root: &Path, file: &Path, overwrite: bool, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let data = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let config: ActionConfig = serde_json::from_str(&data)
        .with_context(|| format!("{} is not an action file", file.display()))?;
    let count = project.db.import(&config, overwrite)?;
    if json {
        print_json(&serde_json::json!({ "imported": count }))?;
    } else {
        println!("Imported {count} action(s).");
    }
    Ok(())
}
