use anyhow::Context;
use clap::Args;
use cueboard_core::{
    action::Action,
    describe::describe,
    editor::{ParamFields, SingleDraft},
    plugins::{CommandKind, PluginQuery},
    types::{Namespace, ParamShape},
};

use super::Session;

/// Flags describing one plugin command. Only the flags the command's
/// parameters use may be given; the rest are rejected.
#[derive(Args, Debug)]
pub struct CommandArgs {
    /// Plugin namespace: streaming, avatar or local
    #[arg(long = "plugin", short = 'p')]
    pub namespace: Namespace,

    /// Command kind, e.g. toggle-expression or program-scene-change
    #[arg(long, short = 'c')]
    pub command: String,

    /// Display name of the scene, model, hotkey or expression
    #[arg(long)]
    pub target: Option<String>,

    /// Seconds to wait (delay)
    #[arg(long)]
    pub seconds: Option<String>,

    /// Program to run (run-command)
    #[arg(long)]
    pub program: Option<String>,

    /// Program argument, repeatable; replaces the stored list (run-command)
    #[arg(long = "arg", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Drop every stored argument (run-command)
    #[arg(long, conflicts_with = "args")]
    pub clear_args: bool,

    /// Working directory (run-command)
    #[arg(long)]
    pub dir: Option<String>,

    /// Run in the default working directory (run-command)
    #[arg(long, conflicts_with = "dir")]
    pub no_dir: bool,

    #[arg(long, allow_hyphen_values = true)]
    pub x: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub y: Option<String>,

    /// Degrees, -360 to 360 (move-model)
    #[arg(long, allow_hyphen_values = true)]
    pub rotation: Option<String>,

    /// -100 to 100 (move-model)
    #[arg(long, allow_hyphen_values = true)]
    pub size: Option<String>,

    /// Animation seconds, 0 to 2 (move-model, restore-model-position)
    #[arg(long)]
    pub time: Option<String>,

    /// Position variable name (save/restore-model-position)
    #[arg(long)]
    pub variable: Option<String>,
}

impl CommandArgs {
    fn given(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        let mut note = |set: bool, flag: &'static str| {
            if set {
                flags.push(flag);
            }
        };
        note(self.target.is_some(), "--target");
        note(self.seconds.is_some(), "--seconds");
        note(self.program.is_some(), "--program");
        note(!self.args.is_empty(), "--arg");
        note(self.clear_args, "--clear-args");
        note(self.dir.is_some(), "--dir");
        note(self.no_dir, "--no-dir");
        note(self.x.is_some(), "--x");
        note(self.y.is_some(), "--y");
        note(self.rotation.is_some(), "--rotation");
        note(self.size.is_some(), "--size");
        note(self.time.is_some(), "--time");
        note(self.variable.is_some(), "--variable");
        flags
    }
}

fn accepted(shape: ParamShape) -> &'static [&'static str] {
    match shape {
        ParamShape::Nothing => &[],
        ParamShape::Target(_) => &["--target"],
        ParamShape::Delay => &["--seconds"],
        ParamShape::CommandLine => &["--program", "--arg", "--clear-args", "--dir", "--no-dir"],
        ParamShape::Position => &["--x", "--y", "--rotation", "--size", "--time"],
        ParamShape::Variable => &["--variable"],
        ParamShape::Restore => &["--variable", "--time"],
    }
}

pub fn parse_command(namespace: Namespace, name: &str) -> anyhow::Result<CommandKind> {
    CommandKind::parse(namespace, name).with_context(|| {
        let known: Vec<&str> = CommandKind::all_for(namespace)
            .into_iter()
            .map(CommandKind::as_str)
            .collect();
        format!(
            "unknown {namespace} command '{name}' (known: {})",
            known.join(", ")
        )
    })
}

/// `streaming.is-recording` or `Avatar.ActiveModelId`.
pub fn parse_query(text: &str) -> anyhow::Result<PluginQuery> {
    let (ns, kind) = text
        .split_once('.')
        .with_context(|| format!("query '{text}' must look like <plugin>.<query>"))?;
    let namespace: Namespace = ns.parse().map_err(anyhow::Error::msg)?;
    PluginQuery::parse(namespace, kind).with_context(|| {
        let known: Vec<&str> = PluginQuery::all_for(namespace)
            .into_iter()
            .map(PluginQuery::as_str)
            .collect();
        if known.is_empty() {
            format!("{namespace} has no queries")
        } else {
            format!(
                "unknown {namespace} query '{kind}' (known: {})",
                known.join(", ")
            )
        }
    })
}

/// Fill `draft` from the flags. Fields that are not given keep what the
/// draft already holds, so an existing command can be edited in part.
pub fn apply(draft: &mut SingleDraft, args: &CommandArgs) -> anyhow::Result<()> {
    let command = parse_command(args.namespace, &args.command)?;
    let allowed = accepted(command.shape());
    if let Some(flag) = args.given().into_iter().find(|f| !allowed.contains(f)) {
        anyhow::bail!("{flag} does not apply to {command}");
    }

    draft.set_namespace(args.namespace);
    draft.set_command(command)?;

    match draft.params_mut() {
        ParamFields::Nothing => {}
        ParamFields::Target(picker) => {
            if let Some(name) = &args.target {
                picker.select(name.clone());
            }
        }
        ParamFields::Delay(secs) => {
            if let Some(raw) = &args.seconds {
                secs.set(raw.clone());
            }
        }
        ParamFields::CommandLine(line) => {
            if let Some(program) = &args.program {
                line.command = program.clone();
            }
            if args.clear_args {
                line.args.clear();
            } else if !args.args.is_empty() {
                line.args = args.args.clone();
            }
            if args.no_dir {
                line.dir = None;
            } else if let Some(dir) = &args.dir {
                line.dir = Some(dir.clone());
            }
        }
        ParamFields::Position(pos) => {
            for (value, field) in [
                (&args.x, &mut pos.x),
                (&args.y, &mut pos.y),
                (&args.rotation, &mut pos.rotation),
                (&args.size, &mut pos.size),
                (&args.time, &mut pos.time_sec),
            ] {
                if let Some(raw) = value {
                    field.set(raw.clone());
                }
            }
        }
        ParamFields::Variable(var) => {
            if let Some(name) = &args.variable {
                *var = name.clone();
            }
        }
        ParamFields::Restore(restore) => {
            if let Some(name) = &args.variable {
                restore.var_id = name.clone();
            }
            if let Some(raw) = &args.time {
                restore.time_sec.set(raw.clone());
            }
        }
    }
    Ok(())
}

/// Description with names, or the ID-based form when a lookup fails.
pub async fn describe_action(session: &Session, action: &Action) -> String {
    match describe(action, session.resolver()).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "falling back to ID-based description");
            action.to_string()
        }
    }
}
