use crate::error::{CueError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const CUEBOARD_DIR: &str = ".cueboard";
pub const CONFIG_FILE: &str = ".cueboard/config.yaml";
pub const ACTIONS_DB_FILE: &str = ".cueboard/actions.redb";
pub const CATALOG_FILE: &str = ".cueboard/catalog.yaml";

/// Longest accepted action ID, in characters.
pub const MAX_ACTION_ID_LEN: usize = 128;

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn cueboard_dir(root: &Path) -> PathBuf {
    root.join(CUEBOARD_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn actions_db_path(root: &Path) -> PathBuf {
    root.join(ACTIONS_DB_FILE)
}

pub fn catalog_path(root: &Path) -> PathBuf {
    root.join(CATALOG_FILE)
}

/// Resolve a configured path: absolute paths are kept, relative ones are
/// taken from the project root.
pub fn resolve_in_root(root: &Path, configured: &str) -> PathBuf {
    let path = Path::new(configured);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

// ---------------------------------------------------------------------------
// Action ID validation
// ---------------------------------------------------------------------------

static ACTION_ID_RE: OnceLock<Regex> = OnceLock::new();

fn action_id_re() -> &'static Regex {
    ACTION_ID_RE.get_or_init(|| Regex::new(r"^[^/?#\s](?:[^/?#]*[^/?#\s])?$").unwrap())
}

pub fn validate_action_id(id: &str) -> Result<()> {
    if id.chars().count() > MAX_ACTION_ID_LEN || !action_id_re().is_match(id) {
        return Err(CueError::InvalidActionId(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_action_ids() {
        for id in ["greet", "a", "Scene Switch 2", "intro.start", "ünïcode"] {
            validate_action_id(id).unwrap_or_else(|_| panic!("expected valid: {id}"));
        }
    }

    #[test]
    fn invalid_action_ids() {
        let long = "x".repeat(MAX_ACTION_ID_LEN + 1);
        for id in ["", " padded", "padded ", "a/b", "what?", "#tag", long.as_str()] {
            assert!(validate_action_id(id).is_err(), "expected invalid: {id}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.cueboard/config.yaml")
        );
        assert_eq!(
            actions_db_path(root),
            PathBuf::from("/tmp/proj/.cueboard/actions.redb")
        );
        assert_eq!(
            resolve_in_root(root, "data/catalog.yaml"),
            PathBuf::from("/tmp/proj/data/catalog.yaml")
        );
        assert_eq!(
            resolve_in_root(root, "/etc/catalog.yaml"),
            PathBuf::from("/etc/catalog.yaml")
        );
    }
}
