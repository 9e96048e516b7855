//! Per-namespace command and query payloads.
//!
//! Persisted shape: `{"tag": <namespace>, "content": {"tag": <kind>, "content": <params>}}`
//! for actions and `{"tag": <namespace>, "content": <kind>}` for queries.

pub mod avatar;
pub mod local;
pub mod streaming;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

use crate::error::ValidationError;
use crate::types::{matches_kind_name, Namespace, ParamShape, QueryShape, TargetKind};

pub use avatar::{
    AvatarAction, AvatarActionKind, AvatarQuery, MoveModelInput, RestoreModelInput,
    DURATION_RANGE, ROTATION_RANGE, SIZE_RANGE,
};
pub use local::{LocalAction, LocalActionKind};
pub use streaming::{StreamingAction, StreamingActionKind, StreamingQuery};

// ---------------------------------------------------------------------------
// PluginAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "content")]
pub enum PluginAction {
    Streaming(StreamingAction),
    Avatar(AvatarAction),
    Local(LocalAction),
}

impl PluginAction {
    pub fn namespace(&self) -> Namespace {
        self.kind().namespace()
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Streaming(a) => CommandKind::Streaming(a.kind()),
            Self::Avatar(a) => CommandKind::Avatar(a.kind()),
            Self::Local(a) => CommandKind::Local(a.kind()),
        }
    }

    /// The kind-specific parameters, detached from the kind.
    pub fn params(&self) -> Params {
        match self {
            Self::Streaming(StreamingAction::ProgramSceneChange(id)) => Params::Target(id.clone()),
            Self::Streaming(_) => Params::Nothing,
            Self::Avatar(a) => match a {
                AvatarAction::ToggleExpression(id)
                | AvatarAction::EnableExpression(id)
                | AvatarAction::DisableExpression(id)
                | AvatarAction::LoadModel(id)
                | AvatarAction::TriggerHotkey(id) => Params::Target(id.clone()),
                AvatarAction::MoveModel(input) => Params::Position(input.clone()),
                AvatarAction::SaveCurrentModelPosition(var) => Params::Variable(var.clone()),
                AvatarAction::RestoreModelPosition(input) => Params::Restore(input.clone()),
                AvatarAction::CheckConnection => Params::Nothing,
            },
            Self::Local(LocalAction::Delay(secs)) => Params::Delay(*secs),
            Self::Local(LocalAction::RunCommand(command, args, dir)) => Params::CommandLine {
                command: command.clone(),
                args: args.clone(),
                dir: dir.clone(),
            },
        }
    }

    /// The opaque ID this command refers to, if its parameter is one.
    pub fn target(&self) -> Option<(TargetKind, &str)> {
        let ParamShape::Target(kind) = self.kind().shape() else {
            return None;
        };
        let id = match self {
            Self::Streaming(StreamingAction::ProgramSceneChange(id))
            | Self::Avatar(AvatarAction::ToggleExpression(id))
            | Self::Avatar(AvatarAction::EnableExpression(id))
            | Self::Avatar(AvatarAction::DisableExpression(id))
            | Self::Avatar(AvatarAction::LoadModel(id))
            | Self::Avatar(AvatarAction::TriggerHotkey(id)) => id.as_str(),
            _ => return None,
        };
        Some((kind, id))
    }

    /// Range and presence checks on the parameters. Paths name the field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_params(&self.params())
    }

    /// Describe the command, showing `target_name` in place of the opaque ID
    /// when one is given.
    pub fn render(&self, target_name: Option<&str>) -> String {
        let kind = self.kind();
        match self.params() {
            Params::Nothing => kind.label().to_string(),
            Params::Target(id) => format!("{} {}", kind.label(), target_name.unwrap_or(&id)),
            Params::Delay(secs) => format!("Delay for {secs} seconds"),
            Params::CommandLine { command, args, dir } => {
                let plural = if args.len() == 1 { "" } else { "s" };
                let mut out = format!(
                    "Run the command \"{command}\" with {} argument{plural}",
                    args.len()
                );
                if let Some(dir) = dir {
                    out.push_str(&format!(" and with the current directory set to \"{dir}\""));
                }
                out
            }
            Params::Position(p) => format!(
                "{} ({}, {}), with rotation {}, size {}, with duration {}",
                kind.label(),
                p.x,
                p.y,
                p.rotation,
                p.size,
                p.time_sec
            ),
            Params::Variable(var) => format!("{} \"{var}\"", kind.label()),
            Params::Restore(r) => format!(
                "{} \"{}\" with duration {}",
                kind.label(),
                r.var_id,
                r.time_sec
            ),
        }
    }
}

impl fmt::Display for PluginAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}

// ---------------------------------------------------------------------------
// Params
// ---------------------------------------------------------------------------

/// Parameters of a command, one variant per [`ParamShape`].
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    Nothing,
    Target(String),
    Delay(f64),
    CommandLine {
        command: String,
        args: Vec<String>,
        dir: Option<String>,
    },
    Position(MoveModelInput),
    Variable(String),
    Restore(RestoreModelInput),
}

impl Params {
    pub fn shape_matches(&self, shape: ParamShape) -> bool {
        matches!(
            (self, shape),
            (Params::Nothing, ParamShape::Nothing)
                | (Params::Target(_), ParamShape::Target(_))
                | (Params::Delay(_), ParamShape::Delay)
                | (Params::CommandLine { .. }, ParamShape::CommandLine)
                | (Params::Position(_), ParamShape::Position)
                | (Params::Variable(_), ParamShape::Variable)
                | (Params::Restore(_), ParamShape::Restore)
        )
    }
}

pub(crate) fn validate_params(params: &Params) -> Result<(), ValidationError> {
    match params {
        Params::Nothing => Ok(()),
        Params::Target(id) => non_empty("target", id),
        Params::Delay(secs) => {
            if !secs.is_finite() {
                return Err(ValidationError::new("delay", "must be a finite number"));
            }
            if *secs < 0.0 {
                return Err(ValidationError::new("delay", "must not be negative"));
            }
            Ok(())
        }
        Params::CommandLine { command, args, dir } => {
            non_empty("command", command)?;
            for (i, arg) in args.iter().enumerate() {
                non_empty(&format!("args[{i}]"), arg)?;
            }
            if let Some(dir) = dir {
                non_empty("dir", dir)?;
            }
            Ok(())
        }
        Params::Position(p) => {
            check_finite("x", p.x)?;
            check_finite("y", p.y)?;
            check_range("rotation", p.rotation, &ROTATION_RANGE)?;
            check_range("size", p.size, &SIZE_RANGE)?;
            check_range("time_sec", p.time_sec, &DURATION_RANGE)
        }
        Params::Variable(var) => non_empty("variable", var),
        Params::Restore(r) => {
            non_empty("var_id", &r.var_id)?;
            check_range("time_sec", r.time_sec, &DURATION_RANGE)
        }
    }
}

fn non_empty(path: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(path, "must not be empty"));
    }
    Ok(())
}

fn check_finite(path: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::new(path, "must be a finite number"));
    }
    Ok(())
}

pub(crate) fn check_range(
    path: &str,
    value: f64,
    range: &RangeInclusive<f64>,
) -> Result<(), ValidationError> {
    check_finite(path, value)?;
    if !range.contains(&value) {
        return Err(ValidationError::new(
            path,
            format!("must be between {} and {}", range.start(), range.end()),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CommandKind
// ---------------------------------------------------------------------------

/// A command kind qualified by its namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Streaming(StreamingActionKind),
    Avatar(AvatarActionKind),
    Local(LocalActionKind),
}

impl CommandKind {
    pub fn namespace(self) -> Namespace {
        match self {
            Self::Streaming(_) => Namespace::Streaming,
            Self::Avatar(_) => Namespace::Avatar,
            Self::Local(_) => Namespace::Local,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Streaming(k) => k.as_str(),
            Self::Avatar(k) => k.as_str(),
            Self::Local(k) => k.as_str(),
        }
    }

    pub fn shape(self) -> ParamShape {
        match self {
            Self::Streaming(k) => k.shape(),
            Self::Avatar(k) => k.shape(),
            Self::Local(k) => k.shape(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Streaming(k) => k.label(),
            Self::Avatar(k) => k.label(),
            Self::Local(k) => k.as_str(),
        }
    }

    /// Every command the namespace offers, in menu order.
    pub fn all_for(namespace: Namespace) -> Vec<CommandKind> {
        match namespace {
            Namespace::Streaming => StreamingActionKind::ALL
                .iter()
                .map(|k| Self::Streaming(*k))
                .collect(),
            Namespace::Avatar => AvatarActionKind::ALL.iter().map(|k| Self::Avatar(*k)).collect(),
            Namespace::Local => LocalActionKind::ALL.iter().map(|k| Self::Local(*k)).collect(),
        }
    }

    /// Look a kind up by name (`MoveModel` or `move-model`).
    pub fn parse(namespace: Namespace, name: &str) -> Option<CommandKind> {
        Self::all_for(namespace)
            .into_iter()
            .find(|k| matches_kind_name(k.as_str(), name))
    }

    /// Build a command of this kind from parameters, then validate it.
    pub fn build(self, params: Params) -> Result<PluginAction, ValidationError> {
        let mismatch = || {
            ValidationError::new(
                "params",
                format!("{} does not take these parameters", self.as_str()),
            )
        };
        let action = match (self, params) {
            (Self::Streaming(k), Params::Target(id)) if k == StreamingActionKind::ProgramSceneChange => {
                PluginAction::Streaming(StreamingAction::ProgramSceneChange(id))
            }
            (Self::Streaming(k), Params::Nothing) => PluginAction::Streaming(match k {
                StreamingActionKind::StartStream => StreamingAction::StartStream,
                StreamingActionKind::StopStream => StreamingAction::StopStream,
                StreamingActionKind::StartRecord => StreamingAction::StartRecord,
                StreamingActionKind::StopRecord => StreamingAction::StopRecord,
                StreamingActionKind::CheckConnection => StreamingAction::CheckConnection,
                StreamingActionKind::ProgramSceneChange => return Err(mismatch()),
            }),
            (Self::Avatar(k), Params::Target(id)) => PluginAction::Avatar(match k {
                AvatarActionKind::ToggleExpression => AvatarAction::ToggleExpression(id),
                AvatarActionKind::EnableExpression => AvatarAction::EnableExpression(id),
                AvatarActionKind::DisableExpression => AvatarAction::DisableExpression(id),
                AvatarActionKind::LoadModel => AvatarAction::LoadModel(id),
                AvatarActionKind::TriggerHotkey => AvatarAction::TriggerHotkey(id),
                _ => return Err(mismatch()),
            }),
            (Self::Avatar(AvatarActionKind::MoveModel), Params::Position(p)) => {
                PluginAction::Avatar(AvatarAction::MoveModel(p))
            }
            (Self::Avatar(AvatarActionKind::SaveCurrentModelPosition), Params::Variable(v)) => {
                PluginAction::Avatar(AvatarAction::SaveCurrentModelPosition(v))
            }
            (Self::Avatar(AvatarActionKind::RestoreModelPosition), Params::Restore(r)) => {
                PluginAction::Avatar(AvatarAction::RestoreModelPosition(r))
            }
            (Self::Avatar(AvatarActionKind::CheckConnection), Params::Nothing) => {
                PluginAction::Avatar(AvatarAction::CheckConnection)
            }
            (Self::Local(LocalActionKind::Delay), Params::Delay(secs)) => {
                PluginAction::Local(LocalAction::Delay(secs))
            }
            (Self::Local(LocalActionKind::RunCommand), Params::CommandLine { command, args, dir }) => {
                PluginAction::Local(LocalAction::RunCommand(command, args, dir))
            }
            _ => return Err(mismatch()),
        };
        action.validate()?;
        Ok(action)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace(), self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PluginQuery
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", content = "content")]
pub enum PluginQuery {
    Streaming(StreamingQuery),
    Avatar(AvatarQuery),
}

impl PluginQuery {
    pub fn namespace(self) -> Namespace {
        match self {
            Self::Streaming(_) => Namespace::Streaming,
            Self::Avatar(_) => Namespace::Avatar,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Streaming(q) => q.as_str(),
            Self::Avatar(q) => q.as_str(),
        }
    }

    pub fn shape(self) -> QueryShape {
        match self {
            Self::Streaming(q) => q.shape(),
            Self::Avatar(q) => q.shape(),
        }
    }

    /// Every query the namespace offers. `Local` has none.
    pub fn all_for(namespace: Namespace) -> Vec<PluginQuery> {
        match namespace {
            Namespace::Streaming => StreamingQuery::ALL
                .iter()
                .map(|q| Self::Streaming(*q))
                .collect(),
            Namespace::Avatar => AvatarQuery::ALL.iter().map(|q| Self::Avatar(*q)).collect(),
            Namespace::Local => Vec::new(),
        }
    }

    pub fn parse(namespace: Namespace, name: &str) -> Option<PluginQuery> {
        Self::all_for(namespace)
            .into_iter()
            .find(|q| matches_kind_name(q.as_str(), name))
    }
}

impl fmt::Display for PluginQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace(), self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(rotation: f64) -> MoveModelInput {
        MoveModelInput {
            x: 0.0,
            y: 0.0,
            rotation,
            size: 0.0,
            time_sec: 0.5,
        }
    }

    #[test]
    fn persisted_form_nests_namespace_and_kind() {
        let action = PluginAction::Avatar(AvatarAction::ToggleExpression("abc".into()));
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(
            json,
            r#"{"tag":"Avatar","content":{"tag":"ToggleExpression","content":"abc"}}"#
        );
    }

    #[test]
    fn query_content_is_the_kind_name() {
        let query = PluginQuery::Streaming(StreamingQuery::IsRecording);
        let json = serde_json::to_string(&query).unwrap();
        assert_eq!(json, r#"{"tag":"Streaming","content":"IsRecording"}"#);
    }

    #[test]
    fn parse_accepts_kebab_case() {
        assert_eq!(
            CommandKind::parse(Namespace::Avatar, "move-model"),
            Some(CommandKind::Avatar(AvatarActionKind::MoveModel))
        );
        assert_eq!(CommandKind::parse(Namespace::Local, "move-model"), None);
        assert_eq!(
            PluginQuery::parse(Namespace::Streaming, "is-recording"),
            Some(PluginQuery::Streaming(StreamingQuery::IsRecording))
        );
        assert!(PluginQuery::all_for(Namespace::Local).is_empty());
    }

    #[test]
    fn build_checks_shape_and_ranges() {
        let kind = CommandKind::Avatar(AvatarActionKind::MoveModel);
        assert!(kind.build(Params::Position(pose(360.0))).is_ok());

        let err = kind.build(Params::Position(pose(361.0))).unwrap_err();
        assert_eq!(err.path, "rotation");

        let err = kind.build(Params::Nothing).unwrap_err();
        assert_eq!(err.path, "params");
    }

    #[test]
    fn build_round_trips_params() {
        let original = PluginAction::Local(LocalAction::RunCommand(
            "obs".into(),
            vec!["--minimize".into()],
            Some("/tmp".into()),
        ));
        let rebuilt = original.kind().build(original.params()).unwrap();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn run_command_rejects_empty_arguments() {
        let kind = CommandKind::Local(LocalActionKind::RunCommand);
        let err = kind
            .build(Params::CommandLine {
                command: "echo".into(),
                args: vec!["a".into(), "".into()],
                dir: None,
            })
            .unwrap_err();
        assert_eq!(err.path, "args[1]");
    }

    #[test]
    fn negative_delay_is_invalid() {
        let err = PluginAction::Local(LocalAction::Delay(-1.0)).validate().unwrap_err();
        assert_eq!(err.path, "delay");
    }

    #[test]
    fn render_uses_given_name() {
        let action = PluginAction::Avatar(AvatarAction::ToggleExpression("abc".into()));
        assert_eq!(action.render(Some("Smile")), "Toggle Avatar expression: Smile");
        assert_eq!(action.to_string(), "Toggle Avatar expression: abc");

        let cmd = PluginAction::Local(LocalAction::RunCommand("ls".into(), vec![], None));
        assert_eq!(cmd.to_string(), "Run the command \"ls\" with 0 arguments");
        assert_eq!(PluginAction::Local(LocalAction::Delay(2.0)).to_string(), "Delay for 2 seconds");
    }
}
