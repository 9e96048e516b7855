//! Avatar-tool commands and queries.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::types::{ParamShape, QueryShape, TargetKind};

/// Allowed model rotation, in degrees.
pub const ROTATION_RANGE: RangeInclusive<f64> = -360.0..=360.0;
/// Allowed model size change.
pub const SIZE_RANGE: RangeInclusive<f64> = -100.0..=100.0;
/// Allowed animation duration, in seconds.
pub const DURATION_RANGE: RangeInclusive<f64> = 0.0..=2.0;

/// Target pose for `MoveModel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveModelInput {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub size: f64,
    pub time_sec: f64,
}

/// Parameters for `RestoreModelPosition`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestoreModelInput {
    /// Name of the variable a previous `SaveCurrentModelPosition` wrote.
    pub var_id: String,
    pub time_sec: f64,
}

/// A command sent to the avatar tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "content")]
pub enum AvatarAction {
    ToggleExpression(String),
    EnableExpression(String),
    DisableExpression(String),
    LoadModel(String),
    MoveModel(MoveModelInput),
    TriggerHotkey(String),
    SaveCurrentModelPosition(String),
    RestoreModelPosition(RestoreModelInput),
    CheckConnection,
}

impl AvatarAction {
    pub fn kind(&self) -> AvatarActionKind {
        match self {
            Self::ToggleExpression(_) => AvatarActionKind::ToggleExpression,
            Self::EnableExpression(_) => AvatarActionKind::EnableExpression,
            Self::DisableExpression(_) => AvatarActionKind::DisableExpression,
            Self::LoadModel(_) => AvatarActionKind::LoadModel,
            Self::MoveModel(_) => AvatarActionKind::MoveModel,
            Self::TriggerHotkey(_) => AvatarActionKind::TriggerHotkey,
            Self::SaveCurrentModelPosition(_) => AvatarActionKind::SaveCurrentModelPosition,
            Self::RestoreModelPosition(_) => AvatarActionKind::RestoreModelPosition,
            Self::CheckConnection => AvatarActionKind::CheckConnection,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AvatarActionKind {
    ToggleExpression,
    EnableExpression,
    DisableExpression,
    LoadModel,
    MoveModel,
    TriggerHotkey,
    SaveCurrentModelPosition,
    RestoreModelPosition,
    CheckConnection,
}

impl AvatarActionKind {
    pub const ALL: &'static [AvatarActionKind] = &[
        Self::ToggleExpression,
        Self::EnableExpression,
        Self::DisableExpression,
        Self::LoadModel,
        Self::MoveModel,
        Self::TriggerHotkey,
        Self::SaveCurrentModelPosition,
        Self::RestoreModelPosition,
        Self::CheckConnection,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ToggleExpression => "ToggleExpression",
            Self::EnableExpression => "EnableExpression",
            Self::DisableExpression => "DisableExpression",
            Self::LoadModel => "LoadModel",
            Self::MoveModel => "MoveModel",
            Self::TriggerHotkey => "TriggerHotkey",
            Self::SaveCurrentModelPosition => "SaveCurrentModelPosition",
            Self::RestoreModelPosition => "RestoreModelPosition",
            Self::CheckConnection => "CheckConnection",
        }
    }

    pub fn shape(self) -> ParamShape {
        match self {
            Self::ToggleExpression | Self::EnableExpression | Self::DisableExpression => {
                ParamShape::Target(TargetKind::Expression)
            }
            Self::LoadModel => ParamShape::Target(TargetKind::Model),
            Self::TriggerHotkey => ParamShape::Target(TargetKind::Hotkey),
            Self::MoveModel => ParamShape::Position,
            Self::SaveCurrentModelPosition => ParamShape::Variable,
            Self::RestoreModelPosition => ParamShape::Restore,
            Self::CheckConnection => ParamShape::Nothing,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::ToggleExpression => "Toggle Avatar expression:",
            Self::EnableExpression => "Enable Avatar expression:",
            Self::DisableExpression => "Disable Avatar expression:",
            Self::LoadModel => "Load Avatar model:",
            Self::MoveModel => "Move Avatar model to:",
            Self::TriggerHotkey => "Trigger Avatar hotkey:",
            Self::SaveCurrentModelPosition => "Save Avatar model position as:",
            Self::RestoreModelPosition => "Restore Avatar model position from:",
            Self::CheckConnection => "Check the Avatar connection",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AvatarQuery {
    ActiveModelId,
    Version,
}

impl AvatarQuery {
    pub const ALL: &'static [AvatarQuery] = &[Self::ActiveModelId, Self::Version];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ActiveModelId => "ActiveModelId",
            Self::Version => "Version",
        }
    }

    pub fn shape(self) -> QueryShape {
        match self {
            Self::ActiveModelId => QueryShape::Identity(TargetKind::Model),
            Self::Version => QueryShape::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_model_serializes_as_record() {
        let action = AvatarAction::MoveModel(MoveModelInput {
            x: 0.5,
            y: -0.5,
            rotation: 90.0,
            size: 10.0,
            time_sec: 1.0,
        });
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["tag"], "MoveModel");
        assert_eq!(value["content"]["rotation"], 90.0);
        assert_eq!(value["content"]["time_sec"], 1.0);
    }

    #[test]
    fn expression_kinds_pick_expressions() {
        for kind in [
            AvatarActionKind::ToggleExpression,
            AvatarActionKind::EnableExpression,
            AvatarActionKind::DisableExpression,
        ] {
            assert_eq!(kind.shape(), ParamShape::Target(TargetKind::Expression));
        }
        assert_eq!(AvatarQuery::ActiveModelId.shape(), QueryShape::Identity(TargetKind::Model));
    }

    #[test]
    fn ranges_are_inclusive() {
        assert!(ROTATION_RANGE.contains(&-360.0));
        assert!(SIZE_RANGE.contains(&100.0));
        assert!(!DURATION_RANGE.contains(&2.01));
    }
}
