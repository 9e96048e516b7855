use anyhow::Context;
use cueboard_core::{
    action::{Action, ActionKind},
    session::SaveOutcome,
    store::ActionStore,
};
use std::path::Path;

use super::fields::{apply, describe_action, CommandArgs};
use super::{block_on, print_notices, Project, Session};
use crate::output::print_json;

pub fn run(
    root: &Path,
    id: &str,
    overwrite: bool,
    args: &CommandArgs,
    json: bool,
) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let mut session = project.session();
    let result = block_on(build(&mut session, id, overwrite, args))?;
    print_notices(&session.drain_notices(), json);
    let (outcome, action, description) = result?;
    print_saved(&outcome, &action, &description, json)
}

async fn build(
    session: &mut Session,
    id: &str,
    overwrite: bool,
    args: &CommandArgs,
) -> anyhow::Result<(SaveOutcome, Action, String)> {
    start(session, id, overwrite, ActionKind::Single).await?;
    let draft = session
        .editor_mut()
        .single_mut()
        .context("editor is not holding a single command")?;
    apply(draft, args)?;
    finish(session).await
}

/// Open `id` for editing when it exists and `overwrite` is set, otherwise
/// start a new action of `kind` under `id`.
pub async fn start(
    session: &mut Session,
    id: &str,
    overwrite: bool,
    kind: ActionKind,
) -> anyhow::Result<()> {
    let exists = session.store().list_action_ids().await?.iter().any(|s| s == id);
    if exists && overwrite {
        session.open(id).await?;
        session.editor_mut().choose_kind(kind);
    } else {
        session.start_new(kind);
        session.editor_mut().set_id(id);
    }
    Ok(())
}

/// Save, then read back what landed in the store.
pub async fn finish(session: &mut Session) -> anyhow::Result<(SaveOutcome, Action, String)> {
    let outcome = session.save().await?;
    let action = session.store().load_action(outcome.id()).await?;
    let description = describe_action(session, &action).await;
    Ok((outcome, action, description))
}

pub fn print_saved(
    outcome: &SaveOutcome,
    action: &Action,
    description: &str,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        let (status, from) = match outcome {
            SaveOutcome::Created(_) => ("created", None),
            SaveOutcome::Overwritten(_) => ("overwritten", None),
            SaveOutcome::Renamed { from, .. } => ("renamed", Some(from.as_str())),
        };
        print_json(&serde_json::json!({
            "id": outcome.id(),
            "status": status,
            "renamed_from": from,
            "action": action,
            "description": description,
        }))
    } else {
        println!("  {description}");
        Ok(())
    }
}
