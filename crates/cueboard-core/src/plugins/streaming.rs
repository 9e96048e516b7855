//! Streaming-tool commands and queries.

use serde::{Deserialize, Serialize};

use crate::types::{ParamShape, QueryShape, TargetKind};

/// A command sent to the streaming tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "content")]
pub enum StreamingAction {
    /// Switch the program output to the scene with this ID.
    ProgramSceneChange(String),
    StartStream,
    StopStream,
    StartRecord,
    StopRecord,
    CheckConnection,
}

impl StreamingAction {
    pub fn kind(&self) -> StreamingActionKind {
        match self {
            Self::ProgramSceneChange(_) => StreamingActionKind::ProgramSceneChange,
            Self::StartStream => StreamingActionKind::StartStream,
            Self::StopStream => StreamingActionKind::StopStream,
            Self::StartRecord => StreamingActionKind::StartRecord,
            Self::StopRecord => StreamingActionKind::StopRecord,
            Self::CheckConnection => StreamingActionKind::CheckConnection,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamingActionKind {
    ProgramSceneChange,
    StartStream,
    StopStream,
    StartRecord,
    StopRecord,
    CheckConnection,
}

impl StreamingActionKind {
    pub const ALL: &'static [StreamingActionKind] = &[
        Self::ProgramSceneChange,
        Self::StartStream,
        Self::StopStream,
        Self::StartRecord,
        Self::StopRecord,
        Self::CheckConnection,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProgramSceneChange => "ProgramSceneChange",
            Self::StartStream => "StartStream",
            Self::StopStream => "StopStream",
            Self::StartRecord => "StartRecord",
            Self::StopRecord => "StopRecord",
            Self::CheckConnection => "CheckConnection",
        }
    }

    pub fn shape(self) -> ParamShape {
        match self {
            Self::ProgramSceneChange => ParamShape::Target(TargetKind::Scene),
            _ => ParamShape::Nothing,
        }
    }

    /// Label used when describing an action of this kind.
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::ProgramSceneChange => "Change Streaming program scene to:",
            Self::StartStream => "Start streaming",
            Self::StopStream => "Stop streaming",
            Self::StartRecord => "Start recording",
            Self::StopRecord => "Stop recording",
            Self::CheckConnection => "Check the Streaming connection",
        }
    }
}

/// A value read back from the streaming tool.
///
/// `IsStreaming` and `IsRecording` report `"true"` or `"false"` as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamingQuery {
    CurrentProgramScene,
    IsStreaming,
    IsRecording,
    Version,
}

impl StreamingQuery {
    pub const ALL: &'static [StreamingQuery] = &[
        Self::CurrentProgramScene,
        Self::IsStreaming,
        Self::IsRecording,
        Self::Version,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CurrentProgramScene => "CurrentProgramScene",
            Self::IsStreaming => "IsStreaming",
            Self::IsRecording => "IsRecording",
            Self::Version => "Version",
        }
    }

    pub fn shape(self) -> QueryShape {
        match self {
            Self::CurrentProgramScene => QueryShape::Identity(TargetKind::Scene),
            Self::IsStreaming | Self::IsRecording => QueryShape::Flag,
            Self::Version => QueryShape::Text,
        }
    }
}
