//! Commands run by the host itself.

use serde::{Deserialize, Serialize};

use crate::types::ParamShape;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "content")]
pub enum LocalAction {
    /// Wait this many seconds.
    Delay(f64),
    /// Program, arguments, optional working directory.
    RunCommand(String, Vec<String>, Option<String>),
}

impl LocalAction {
    pub fn kind(&self) -> LocalActionKind {
        match self {
            Self::Delay(_) => LocalActionKind::Delay,
            Self::RunCommand(..) => LocalActionKind::RunCommand,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalActionKind {
    Delay,
    RunCommand,
}

impl LocalActionKind {
    pub const ALL: &'static [LocalActionKind] = &[Self::Delay, Self::RunCommand];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delay => "Delay",
            Self::RunCommand => "RunCommand",
        }
    }

    pub fn shape(self) -> ParamShape {
        match self {
            Self::Delay => ParamShape::Delay,
            Self::RunCommand => ParamShape::CommandLine,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_command_serializes_as_triple() {
        let action = LocalAction::RunCommand("echo".into(), vec!["hi".into()], None);
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, r#"{"tag":"RunCommand","content":["echo",["hi"],null]}"#);
    }

    #[test]
    fn delay_keeps_fractional_seconds() {
        let back: LocalAction = serde_json::from_str(r#"{"tag":"Delay","content":0.25}"#).unwrap();
        assert_eq!(back, LocalAction::Delay(0.25));
    }
}
