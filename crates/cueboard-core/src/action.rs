//! The recursive action model.
//!
//! An [`Action`] is a finite tree: a single plugin command, an ordered chain,
//! or a conditional branch. Stored actions only ever nest copies of other
//! actions, never references, so a tree read from the store cannot loop.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ValidationError;
use crate::plugins::{AvatarQuery, PluginAction, PluginQuery, StreamingQuery};
use crate::types::{Namespace, QueryShape, TargetKind};

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// A predicate: the query's current value must equal `target`.
///
/// `target` is always a string. For flag queries it is `"true"` or `"false"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub query: PluginQuery,
    pub target: String,
}

impl Condition {
    pub fn new(query: PluginQuery, target: impl Into<String>) -> Self {
        Self {
            query,
            target: target.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.query.shape() {
            QueryShape::Identity(_) if self.target.trim().is_empty() => {
                Err(ValidationError::new("target", "must name a target"))
            }
            QueryShape::Flag if self.target != "true" && self.target != "false" => Err(
                ValidationError::new("target", "must be \"true\" or \"false\""),
            ),
            _ => Ok(()),
        }
    }

    /// The opaque ID this condition compares against, if any.
    pub fn target_ref(&self) -> Option<(Namespace, TargetKind, &str)> {
        match self.query.shape() {
            QueryShape::Identity(kind) => Some((self.query.namespace(), kind, &self.target)),
            _ => None,
        }
    }

    /// Describe the condition, showing `target_name` in place of the opaque ID.
    pub fn render(&self, target_name: Option<&str>) -> String {
        let ns = self.query.namespace();
        let target = target_name.unwrap_or(&self.target);
        let not = if self.target == "false" { "not " } else { "" };
        match self.query {
            PluginQuery::Streaming(q) => match q {
                StreamingQuery::CurrentProgramScene => {
                    format!("If the {ns} current program scene is {target}")
                }
                StreamingQuery::IsStreaming => format!("If {ns} is {not}streaming"),
                StreamingQuery::IsRecording => format!("If {ns} is {not}recording"),
                StreamingQuery::Version => {
                    format!("If the {ns} version is {target}")
                }
            },
            PluginQuery::Avatar(q) => match q {
                AvatarQuery::ActiveModelId => {
                    format!("If the current {ns} model is {target}")
                }
                AvatarQuery::Version => format!("If the {ns} version is {target}"),
            },
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Persisted as `{"tag": "Single"|"Chain"|"If", "content": ...}`. `If` is the
/// array `[condition, then, else-or-null]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "content")]
pub enum Action {
    Single(PluginAction),
    Chain(Vec<Action>),
    If(Condition, Box<Action>, Option<Box<Action>>),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Single(_) => ActionKind::Single,
            Action::Chain(_) => ActionKind::Chain,
            Action::If(..) => ActionKind::If,
        }
    }

    /// Structural and range validation of every node.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Action::Single(action) => action.validate(),
            Action::Chain(actions) => {
                for (i, action) in actions.iter().enumerate() {
                    action
                        .validate()
                        .map_err(|e| e.nested(&format!("[{i}]")).nested("chain"))?;
                }
                Ok(())
            }
            Action::If(condition, then, otherwise) => {
                condition.validate().map_err(|e| e.nested("condition"))?;
                then.validate().map_err(|e| e.nested("then"))?;
                if let Some(otherwise) = otherwise {
                    otherwise.validate().map_err(|e| e.nested("else"))?;
                }
                Ok(())
            }
        }
    }

    /// Every opaque-ID reference in the tree, in depth-first order.
    pub fn targets(&self) -> Vec<(Namespace, TargetKind, String)> {
        let mut out = Vec::new();
        self.collect_targets(&mut out);
        out
    }

    fn collect_targets(&self, out: &mut Vec<(Namespace, TargetKind, String)>) {
        match self {
            Action::Single(action) => {
                if let Some((kind, id)) = action.target() {
                    out.push((action.namespace(), kind, id.to_string()));
                }
            }
            Action::Chain(actions) => actions.iter().for_each(|a| a.collect_targets(out)),
            Action::If(condition, then, otherwise) => {
                if let Some((ns, kind, id)) = condition.target_ref() {
                    out.push((ns, kind, id.to_string()));
                }
                then.collect_targets(out);
                if let Some(otherwise) = otherwise {
                    otherwise.collect_targets(out);
                }
            }
        }
    }

    /// Describe the action, looking each opaque ID up in `names`. IDs with
    /// no entry are shown as-is.
    pub fn render(&self, names: &BTreeMap<(Namespace, TargetKind, String), String>) -> String {
        let lookup = |ns: Namespace, kind: TargetKind, id: &str| {
            names.get(&(ns, kind, id.to_string())).map(String::as_str)
        };
        match self {
            Action::Single(action) => {
                let name = action
                    .target()
                    .and_then(|(kind, id)| lookup(action.namespace(), kind, id));
                action.render(name)
            }
            Action::Chain(actions) => {
                let plural = if actions.len() == 1 { "" } else { "s" };
                format!("Chain with {} action{plural}", actions.len())
            }
            Action::If(condition, then, otherwise) => {
                let name = condition
                    .target_ref()
                    .and_then(|(ns, kind, id)| lookup(ns, kind, id));
                let otherwise = match otherwise {
                    Some(a) => a.render(names),
                    None => "do nothing".to_string(),
                };
                format!(
                    "{}, then {}, else {}",
                    condition.render(name),
                    then.render(names),
                    otherwise
                )
            }
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&BTreeMap::new()))
    }
}

/// Top-level type of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Single,
    Chain,
    If,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Single => "Single",
            ActionKind::Chain => "Chain",
            ActionKind::If => "If",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ActionConfig
// ---------------------------------------------------------------------------

/// The whole action set as one JSON document: `{"actions": {"<id>": <Action>}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    pub actions: BTreeMap<String, Action>,
}
