use thiserror::Error;

use crate::types::{Namespace, TargetKind};

/// A user-fixable problem with an action or with a field in the editor.
///
/// `path` names the offending field (`rotation`, `condition.target`,
/// `chain[1].then`) so the message can point at exactly what to fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {reason}")]
pub struct ValidationError {
    pub path: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Prefix the path with an enclosing location, e.g. `then` + `delay`
    /// becomes `then.delay`.
    pub fn nested(self, parent: &str) -> Self {
        let path = if self.path.is_empty() {
            parent.to_string()
        } else if self.path.starts_with('[') {
            format!("{parent}{}", self.path)
        } else {
            format!("{parent}.{}", self.path)
        };
        Self { path, ..self }
    }
}

/// Failure set of the name resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{namespace} {kind} not found: {key}")]
    NotFound {
        namespace: Namespace,
        kind: TargetKind,
        key: String,
    },

    #[error("{namespace} {kind} name '{name}' is shared by several entries")]
    Ambiguous {
        namespace: Namespace,
        kind: TargetKind,
        name: String,
    },

    #[error("{namespace} backend unavailable: {reason}")]
    BackendUnavailable { namespace: Namespace, reason: String },
}

#[derive(Debug, Error)]
pub enum CueError {
    #[error("not initialized: run 'cueboard init'")]
    NotInitialized,

    #[error("invalid action: {0}")]
    Validation(#[from] ValidationError),

    #[error("action not found: {0}")]
    ActionNotFound(String),

    #[error("action with ID '{0}' already exists")]
    ActionExists(String),

    #[error("invalid action ID '{0}': must be non-empty and contain no '/', '?' or '#'")]
    InvalidActionId(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("action store error: {0}")]
    Store(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("execution failed: {0}")]
    Execution(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_paths_join_with_dots_and_brackets() {
        let err = ValidationError::new("rotation", "out of range");
        assert_eq!(err.clone().nested("then").path, "then.rotation");

        let indexed = ValidationError::new("[2]", "bad").nested("chain");
        assert_eq!(indexed.path, "chain[2]");

        let root = ValidationError::new("", "empty").nested("else");
        assert_eq!(root.path, "else");
    }

    #[test]
    fn resolve_error_message_names_the_target() {
        let err = ResolveError::NotFound {
            namespace: Namespace::Avatar,
            kind: TargetKind::Expression,
            key: "abc".into(),
        };
        assert_eq!(err.to_string(), "Avatar expression not found: abc");
    }
}
