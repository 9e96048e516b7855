use crate::error::{CueError, Result};
use crate::paths;
use crate::types::Namespace;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Action database, relative to the project root unless absolute.
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_path() -> String {
    paths::ACTIONS_DB_FILE.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// ResolverConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// How long a name lookup may run before the user is told it may be
    /// waiting on an authorization prompt.
    #[serde(default = "default_advisory_after_ms")]
    pub advisory_after_ms: u64,
    /// Name catalog, relative to the project root unless absolute.
    #[serde(default = "default_catalog")]
    pub catalog: String,
}

fn default_advisory_after_ms() -> u64 {
    1000
}

fn default_catalog() -> String {
    paths::CATALOG_FILE.to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            advisory_after_ms: default_advisory_after_ms(),
            catalog: default_catalog(),
        }
    }
}

// ---------------------------------------------------------------------------
// PluginsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingConfig {
    pub addr: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarConfig {
    pub addr: String,
    pub token_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<StreamingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<AvatarConfig>,
    #[serde(default = "default_local")]
    pub local: bool,
}

fn default_local() -> bool {
    true
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            streaming: None,
            avatar: None,
            local: default_local(),
        }
    }
}

impl PluginsConfig {
    pub fn is_enabled(&self, namespace: Namespace) -> bool {
        match namespace {
            Namespace::Streaming => self.streaming.is_some(),
            Namespace::Avatar => self.avatar.is_some(),
            Namespace::Local => self.local,
        }
    }

    pub fn enabled(&self) -> Vec<Namespace> {
        Namespace::all()
            .iter()
            .copied()
            .filter(|ns| self.is_enabled(*ns))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub plugins: PluginsConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: ProjectConfig {
                name: project_name.into(),
                description: None,
            },
            store: StoreConfig::default(),
            resolver: ResolverConfig::default(),
            plugins: PluginsConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(CueError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn advisory_after(&self) -> Duration {
        Duration::from_millis(self.resolver.advisory_after_ms)
    }

    pub fn store_path(&self, root: &Path) -> PathBuf {
        paths::resolve_in_root(root, &self.store.path)
    }

    pub fn catalog_path(&self, root: &Path) -> PathBuf {
        paths::resolve_in_root(root, &self.resolver.catalog)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut push = |level: WarnLevel, message: String| {
            warnings.push(ConfigWarning { level, message });
        };

        if self.store.path.trim().is_empty() {
            push(WarnLevel::Error, "store.path is empty".to_string());
        }
        if self.resolver.catalog.trim().is_empty() {
            push(WarnLevel::Error, "resolver.catalog is empty".to_string());
        }
        if self.resolver.advisory_after_ms == 0 {
            push(
                WarnLevel::Warning,
                "resolver.advisory_after_ms is 0; every lookup will report as slow".to_string(),
            );
        }

        if let Some(streaming) = &self.plugins.streaming {
            if streaming.addr.trim().is_empty() {
                push(WarnLevel::Error, "plugins.streaming.addr is empty".to_string());
            }
            if streaming.port == 0 {
                push(WarnLevel::Error, "plugins.streaming.port must not be 0".to_string());
            }
        }

        if let Some(avatar) = &self.plugins.avatar {
            if avatar.addr.trim().is_empty() {
                push(WarnLevel::Error, "plugins.avatar.addr is empty".to_string());
            }
            if avatar.token_file.trim().is_empty() {
                push(
                    WarnLevel::Warning,
                    "plugins.avatar.token_file is empty; the token will not be kept".to_string(),
                );
            }
        }

        if self.plugins.enabled().is_empty() {
            push(
                WarnLevel::Warning,
                "no plugins are enabled; no actions can be built".to_string(),
            );
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::new("show");
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.project.name, "show");
        assert_eq!(parsed.version, 1);
        assert_eq!(parsed.resolver.advisory_after_ms, 1000);
        assert!(!yaml.contains("streaming"));
    }

    #[test]
    fn minimal_yaml_uses_defaults() {
        let cfg: Config = serde_yaml::from_str("project:\n  name: show\n").unwrap();
        assert_eq!(cfg.store.path, ".cueboard/actions.redb");
        assert_eq!(cfg.advisory_after(), Duration::from_secs(1));
        assert_eq!(cfg.plugins.enabled(), vec![Namespace::Local]);
    }

    #[test]
    fn plugin_sections_enable_namespaces() {
        let yaml = r#"
project:
  name: show
plugins:
  streaming:
    addr: localhost
    port: 4455
  avatar:
    addr: ws://localhost:8001
    token_file: token.txt
  local: false
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            cfg.plugins.enabled(),
            vec![Namespace::Streaming, Namespace::Avatar]
        );
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validate_flags_bad_plugin_settings() {
        let mut cfg = Config::new("show");
        cfg.plugins.streaming = Some(StreamingConfig {
            addr: "".into(),
            port: 0,
            password: None,
        });
        cfg.resolver.advisory_after_ms = 0;
        let warnings = cfg.validate();
        let errors = warnings
            .iter()
            .filter(|w| w.level == WarnLevel::Error)
            .count();
        assert_eq!(errors, 2);
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("advisory_after_ms")));
    }

    #[test]
    fn load_requires_init() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(CueError::NotInitialized)
        ));
        Config::new("show").save(dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap().project.name, "show");
    }
}
