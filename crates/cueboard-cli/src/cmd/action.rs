use anyhow::Context;
use clap::Subcommand;
use cueboard_core::{executor::DryRun, store::ActionStore};
use std::path::Path;

use super::fields::describe_action;
use super::single::print_saved;
use super::{block_on, print_notices, Project};
use crate::output::{print_json, print_table};

#[derive(Subcommand)]
pub enum ActionSubcommand {
    /// List stored actions
    List,
    /// Show one action with names filled in
    Show {
        id: String,
        /// Print the stored JSON exactly as persisted
        #[arg(long)]
        raw: bool,
    },
    /// Check a stored action for structural and range errors
    Validate { id: String },
    /// Delete a stored action
    Delete { id: String },
    /// Store an action under a new ID and remove the old entry
    Rename { from: String, to: String },
    /// Print the steps an action would take, without running anything
    Plan { id: String },
}

pub fn run(root: &Path, subcmd: ActionSubcommand, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    match subcmd {
        ActionSubcommand::List => list(&project, json),
        ActionSubcommand::Show { id, raw } => show(&project, &id, raw, json),
        ActionSubcommand::Validate { id } => validate(&project, &id, json),
        ActionSubcommand::Delete { id } => delete(&project, &id, json),
        ActionSubcommand::Rename { from, to } => rename(&project, &from, &to, json),
        ActionSubcommand::Plan { id } => plan(&project, &id, json),
    }
}

// ---------------------------------------------------------------------------
// list / show
// ---------------------------------------------------------------------------

fn list(project: &Project, json: bool) -> anyhow::Result<()> {
    let session = project.session();
    let rows = block_on(async {
        let mut rows = Vec::new();
        for id in session.store().list_action_ids().await? {
            let action = session.store().load_action(&id).await?;
            let description = describe_action(&session, &action).await;
            rows.push((id, action.kind(), description));
        }
        anyhow::Ok(rows)
    })??;

    if json {
        let items: Vec<serde_json::Value> = rows
            .iter()
            .map(|(id, kind, description)| {
                serde_json::json!({ "id": id, "kind": kind, "description": description })
            })
            .collect();
        return print_json(&items);
    }
    if rows.is_empty() {
        println!("No actions stored.");
        return Ok(());
    }
    print_table(
        &["ID", "TYPE", "DESCRIPTION"],
        rows.into_iter()
            .map(|(id, kind, description)| vec![id, kind.to_string(), description])
            .collect(),
    );
    Ok(())
}

fn show(project: &Project, id: &str, raw: bool, json: bool) -> anyhow::Result<()> {
    if raw {
        let bytes = project
            .db
            .get_raw(id)?
            .with_context(|| format!("action not found: {id}"))?;
        println!("{}", String::from_utf8_lossy(&bytes));
        return Ok(());
    }

    let action = project.db.get(id)?;
    if json {
        return print_json(&action);
    }
    let session = project.session();
    let description = block_on(describe_action(&session, &action))?;
    println!("{id} ({})", action.kind());
    println!("  {description}");
    Ok(())
}

fn validate(project: &Project, id: &str, json: bool) -> anyhow::Result<()> {
    let action = project.db.get(id)?;
    let result = action.validate();
    if json {
        print_json(&serde_json::json!({
            "id": id,
            "valid": result.is_ok(),
            "error": result.as_ref().err().map(ToString::to_string),
        }))?;
    }
    result.with_context(|| format!("'{id}' is invalid"))?;
    if !json {
        println!("'{id}' is valid.");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// delete / rename
// ---------------------------------------------------------------------------

fn delete(project: &Project, id: &str, json: bool) -> anyhow::Result<()> {
    let mut session = project.session();
    let result = block_on(session.delete_stored(id))?;
    print_notices(&session.drain_notices(), json);
    result?;
    if json {
        print_json(&serde_json::json!({ "deleted": id }))?;
    }
    Ok(())
}

fn rename(project: &Project, from: &str, to: &str, json: bool) -> anyhow::Result<()> {
    let mut session = project.session();
    let result = block_on(async {
        session.open(from).await?;
        session.editor_mut().set_id(to);
        super::single::finish(&mut session).await
    })?;
    print_notices(&session.drain_notices(), json);
    let (outcome, action, description) = result?;
    print_saved(&outcome, &action, &description, json)
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

fn plan(project: &Project, id: &str, json: bool) -> anyhow::Result<()> {
    let runner = DryRun::new(project.db.clone());
    let steps = block_on(runner.plan_for(id))??;
    if json {
        return print_json(&steps);
    }
    for step in steps {
        println!("{step}");
    }
    Ok(())
}
