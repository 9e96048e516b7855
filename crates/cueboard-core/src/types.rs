use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Namespace
// ---------------------------------------------------------------------------

/// One controlled-application domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Namespace {
    Streaming,
    Avatar,
    Local,
}

impl Namespace {
    pub fn all() -> &'static [Namespace] {
        &[Namespace::Streaming, Namespace::Avatar, Namespace::Local]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Streaming => "Streaming",
            Namespace::Avatar => "Avatar",
            Namespace::Local => "Local",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Namespace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "streaming" => Ok(Namespace::Streaming),
            "avatar" => Ok(Namespace::Avatar),
            "local" => Ok(Namespace::Local),
            _ => Err(format!(
                "unknown namespace '{s}' (expected streaming, avatar or local)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// TargetKind
// ---------------------------------------------------------------------------

/// What an opaque ID refers to inside a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Scene,
    Model,
    Hotkey,
    Expression,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Scene => "scene",
            TargetKind::Model => "model",
            TargetKind::Hotkey => "hotkey",
            TargetKind::Expression => "expression",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().trim_end_matches('s') {
            "scene" => Ok(TargetKind::Scene),
            "model" => Ok(TargetKind::Model),
            "hotkey" => Ok(TargetKind::Hotkey),
            "expression" => Ok(TargetKind::Expression),
            _ => Err(format!(
                "unknown target kind '{s}' (expected scene, model, hotkey or expression)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Parameter shapes
// ---------------------------------------------------------------------------

/// The parameter shape a command kind carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamShape {
    Nothing,
    /// A single opaque ID picked by display name.
    Target(TargetKind),
    /// Seconds to wait.
    Delay,
    /// Program, argument list and optional working directory.
    CommandLine,
    /// `{x, y, rotation, size, time_sec}`.
    Position,
    /// A free-form variable name.
    Variable,
    /// `{var_id, time_sec}`.
    Restore,
}

/// What a condition's `target` string holds for a given query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    /// An opaque ID compared for identity.
    Identity(TargetKind),
    /// `"true"` or `"false"`.
    Flag,
    /// A free-form expected value.
    Text,
}

/// Converts `CamelCase` kind names to the `kebab-case` accepted on the
/// command line, so `ProgramSceneChange` matches `program-scene-change`.
pub(crate) fn kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

pub(crate) fn matches_kind_name(name: &str, input: &str) -> bool {
    name.eq_ignore_ascii_case(input) || kebab(name) == input.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_parses_case_insensitively() {
        assert_eq!("Avatar".parse::<Namespace>().unwrap(), Namespace::Avatar);
        assert_eq!("streaming".parse::<Namespace>().unwrap(), Namespace::Streaming);
        assert!("obs".parse::<Namespace>().is_err());
    }

    #[test]
    fn target_kind_accepts_plural() {
        assert_eq!("scenes".parse::<TargetKind>().unwrap(), TargetKind::Scene);
        assert_eq!("Hotkey".parse::<TargetKind>().unwrap(), TargetKind::Hotkey);
    }

    #[test]
    fn kind_names_match_kebab_case() {
        assert_eq!(kebab("ProgramSceneChange"), "program-scene-change");
        assert!(matches_kind_name("MoveModel", "move-model"));
        assert!(matches_kind_name("MoveModel", "movemodel"));
        assert!(!matches_kind_name("MoveModel", "load-model"));
    }
}
