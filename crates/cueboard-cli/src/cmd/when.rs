use anyhow::Context;
use clap::Args;
use cueboard_core::{
    action::{Action, ActionKind},
    editor::{BranchChoice, ConditionTarget},
    session::SaveOutcome,
};
use std::path::Path;

use super::fields::parse_query;
use super::single::{finish, print_saved, start};
use super::{block_on, print_notices, Project, Session};

#[derive(Args, Debug)]
pub struct WhenArgs {
    /// Condition query, e.g. streaming.is-recording or avatar.active-model-id
    #[arg(long)]
    pub query: Option<String>,

    /// Expected value: a display name, true/false, or free text
    #[arg(long)]
    pub expect: Option<String>,

    /// Stored action to run when the condition holds
    #[arg(long = "then")]
    pub then_id: Option<String>,

    /// Stored action to run otherwise
    #[arg(long = "else", conflicts_with = "no_else")]
    pub else_id: Option<String>,

    /// Do nothing when the condition does not hold
    #[arg(long)]
    pub no_else: bool,
}

pub fn run(
    root: &Path,
    id: &str,
    overwrite: bool,
    args: &WhenArgs,
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
    args: &WhenArgs,
) -> anyhow::Result<(SaveOutcome, Action, String)> {
    start(session, id, overwrite, ActionKind::If).await?;
    let draft = session
        .editor_mut()
        .if_mut()
        .context("editor is not holding a conditional")?;

    if let Some(query) = &args.query {
        draft.condition.set_query(parse_query(query)?);
    }
    if let Some(expect) = &args.expect {
        match draft.condition.target_mut() {
            ConditionTarget::None => anyhow::bail!("--expect needs --query"),
            ConditionTarget::Picker(picker) => picker.select(expect.clone()),
            ConditionTarget::Flag(flag) => {
                let value = match expect.to_ascii_lowercase().as_str() {
                    "true" | "yes" => true,
                    "false" | "no" => false,
                    _ => anyhow::bail!("--expect must be true or false for this query"),
                };
                *flag = Some(value);
            }
            ConditionTarget::Text(text) => *text = expect.clone(),
        }
    }
    if let Some(then_id) = &args.then_id {
        draft.set_then(BranchChoice::Existing(then_id.clone()))?;
    }
    if let Some(else_id) = &args.else_id {
        draft.set_else(BranchChoice::Existing(else_id.clone()))?;
    } else if args.no_else {
        draft.set_else(BranchChoice::Nothing)?;
    }
    finish(session).await
}
