use anyhow::Context;
use clap::Subcommand;
use cueboard_core::{
    action::{Action, ActionKind},
    chain::{ChainBuilder, ElementBody, Preview},
    editor::{Draft, SingleDraft},
    session::SaveOutcome,
};
use std::path::Path;

use super::fields::{apply, CommandArgs};
use super::single::{finish, print_saved, start};
use super::{block_on, print_notices, Project, Session};
use crate::output::{print_json, print_table};

#[derive(Subcommand)]
pub enum ChainSubcommand {
    /// Create an empty chain
    New {
        id: String,
        /// Replace an existing action with the same ID
        #[arg(long)]
        overwrite: bool,
    },
    /// Append a copy of a stored action
    Add {
        id: String,
        /// Stored action to copy
        source: String,
        /// Position to place it at (default: end)
        #[arg(long)]
        at: Option<usize>,
    },
    /// Append a new plugin command
    Step {
        id: String,
        /// Position to place it at (default: end)
        #[arg(long)]
        at: Option<usize>,
        #[command(flatten)]
        command: CommandArgs,
    },
    /// Edit the plugin command at a position
    Edit {
        id: String,
        index: usize,
        #[command(flatten)]
        command: CommandArgs,
    },
    /// Remove the element at a position
    Remove { id: String, index: usize },
    /// Move an element to another position
    Move { id: String, from: usize, to: usize },
    /// List the elements with their previews
    Show { id: String },
    /// Stored actions that may be copied into the chain
    Offer { id: String },
}

pub fn run(root: &Path, subcmd: ChainSubcommand, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let mut session = project.session();
    let result = match subcmd {
        ChainSubcommand::New { id, overwrite } => {
            block_on(create(&mut session, &id, overwrite))?.map(Some)
        }
        ChainSubcommand::Add { id, source, at } => {
            block_on(add(&mut session, &id, &source, at))?.map(Some)
        }
        ChainSubcommand::Step { id, at, command } => {
            block_on(step(&mut session, &id, at, &command))?.map(Some)
        }
        ChainSubcommand::Edit { id, index, command } => {
            block_on(edit(&mut session, &id, index, &command))?.map(Some)
        }
        ChainSubcommand::Remove { id, index } => block_on(edit_order(&mut session, &id, |c| {
            c.remove_at(index).map(|_| ())
        }))?
        .map(Some),
        ChainSubcommand::Move { id, from, to } => {
            block_on(edit_order(&mut session, &id, |c| c.move_to(from, to)))?.map(Some)
        }
        ChainSubcommand::Show { id } => block_on(show(&mut session, &id, json))?.map(|_| None),
        ChainSubcommand::Offer { id } => block_on(offer(&mut session, &id, json))?.map(|_| None),
    };
    print_notices(&session.drain_notices(), json);
    if let Some((outcome, action, description)) = result? {
        print_saved(&outcome, &action, &description, json)?;
    }
    Ok(())
}

type Saved = (SaveOutcome, Action, String);

async fn open_chain(session: &mut Session, id: &str) -> anyhow::Result<()> {
    session.open(id).await?;
    if session.editor().kind() != Some(ActionKind::Chain) {
        anyhow::bail!("'{id}' is not a chain");
    }
    Ok(())
}

fn chain(session: &mut Session) -> anyhow::Result<&mut ChainBuilder> {
    session
        .editor_mut()
        .chain_mut()
        .context("editor is not holding a chain")
}

/// Move the element just appended to `at`.
fn place(chain: &mut ChainBuilder, at: Option<usize>) -> anyhow::Result<()> {
    if let Some(at) = at {
        let last = chain.len().saturating_sub(1);
        chain.move_to(last, at)?;
    }
    Ok(())
}

async fn create(session: &mut Session, id: &str, overwrite: bool) -> anyhow::Result<Saved> {
    start(session, id, overwrite, ActionKind::Chain).await?;
    finish(session).await
}

async fn add(
    session: &mut Session,
    id: &str,
    source: &str,
    at: Option<usize>,
) -> anyhow::Result<Saved> {
    open_chain(session, id).await?;
    session.copy_into_chain(source).await?;
    place(chain(session)?, at)?;
    finish(session).await
}

async fn step(
    session: &mut Session,
    id: &str,
    at: Option<usize>,
    args: &CommandArgs,
) -> anyhow::Result<Saved> {
    open_chain(session, id).await?;
    let mut draft = SingleDraft::new();
    apply(&mut draft, args)?;
    let chain = chain(session)?;
    chain.push_draft(draft);
    place(chain, at)?;
    finish(session).await
}

async fn edit(
    session: &mut Session,
    id: &str,
    index: usize,
    args: &CommandArgs,
) -> anyhow::Result<Saved> {
    open_chain(session, id).await?;
    let chain = chain(session)?;
    let key = chain
        .elements()
        .get(index)
        .map(|e| e.key())
        .with_context(|| format!("'{id}' has no element {index}"))?;
    let draft = chain
        .element_mut(key)
        .and_then(|e| e.single_mut())
        .with_context(|| format!("element {index} is not a plugin command; remove and re-add it"))?;
    apply(draft, args)?;
    finish(session).await
}

async fn edit_order(
    session: &mut Session,
    id: &str,
    change: impl FnOnce(&mut ChainBuilder) -> Result<(), cueboard_core::error::ValidationError>,
) -> anyhow::Result<Saved> {
    open_chain(session, id).await?;
    change(chain(session)?)?;
    finish(session).await
}

async fn show(session: &mut Session, id: &str, json: bool) -> anyhow::Result<()> {
    open_chain(session, id).await?;
    session.refresh_previews().await;
    let Draft::Chain(chain) = session.editor().draft() else {
        anyhow::bail!("'{id}' is not a chain");
    };

    let rows: Vec<(usize, &'static str, String)> = chain
        .elements()
        .iter()
        .enumerate()
        .map(|(i, element)| {
            let kind = match element.body() {
                ElementBody::Single(_) => "command",
                ElementBody::Copy(action) => action.kind().as_str(),
            };
            let text = match element.preview() {
                Preview::Ready(text) => text,
                Preview::Pending => "(not yet available)".to_string(),
                Preview::Failed(message) => format!("(preview unavailable: {message})"),
            };
            (i, kind, text)
        })
        .collect();

    if json {
        let items: Vec<serde_json::Value> = rows
            .iter()
            .map(|(i, kind, text)| serde_json::json!({ "index": i, "kind": kind, "preview": text }))
            .collect();
        return print_json(&items);
    }
    if rows.is_empty() {
        println!("'{id}' is an empty chain.");
        return Ok(());
    }
    print_table(
        &["#", "KIND", "STEP"],
        rows.into_iter()
            .map(|(i, kind, text)| vec![i.to_string(), kind.to_string(), text])
            .collect(),
    );
    Ok(())
}

async fn offer(session: &mut Session, id: &str, json: bool) -> anyhow::Result<()> {
    open_chain(session, id).await?;
    let ids = session.offered_actions().await?;
    if json {
        return print_json(&ids);
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}
