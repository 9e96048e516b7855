//! File-backed resolver: a YAML list of `{id, name}` pairs per target kind.
//!
//! ```yaml
//! streaming:
//!   scenes:
//!     - id: 7f1c
//!       name: Intro
//! avatar:
//!   expressions:
//!     - id: abc
//!       name: Smile
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::NameResolver;
use crate::error::{CueError, ResolveError, Result};
use crate::types::{Namespace, TargetKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamingCatalog {
    #[serde(default)]
    pub scenes: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvatarCatalog {
    #[serde(default)]
    pub models: Vec<CatalogEntry>,
    #[serde(default)]
    pub expressions: Vec<CatalogEntry>,
    #[serde(default)]
    pub hotkeys: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub streaming: StreamingCatalog,
    #[serde(default)]
    pub avatar: AvatarCatalog,
}

impl Catalog {
    /// A missing file is an empty catalog. Two entries of one kind sharing a
    /// display name are rejected, since the name could not pick between them.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let catalog: Self = serde_yaml::from_str(&data)
            .map_err(|e| CueError::Catalog(format!("{}: {e}", path.display())))?;
        catalog
            .check_names()
            .map_err(|e| CueError::Catalog(format!("{}: {e}", path.display())))?;
        Ok(catalog)
    }

    fn check_names(&self) -> std::result::Result<(), ResolveError> {
        for (namespace, kind) in KINDS {
            let entries = self.entries(namespace, kind);
            for (i, entry) in entries.iter().enumerate() {
                if entries[..i].iter().any(|e| e.name == entry.name) {
                    return Err(ResolveError::Ambiguous {
                        namespace,
                        kind,
                        name: entry.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    pub fn entries(&self, namespace: Namespace, kind: TargetKind) -> &[CatalogEntry] {
        match (namespace, kind) {
            (Namespace::Streaming, TargetKind::Scene) => &self.streaming.scenes,
            (Namespace::Avatar, TargetKind::Model) => &self.avatar.models,
            (Namespace::Avatar, TargetKind::Expression) => &self.avatar.expressions,
            (Namespace::Avatar, TargetKind::Hotkey) => &self.avatar.hotkeys,
            _ => &[],
        }
    }

    pub fn entries_mut(
        &mut self,
        namespace: Namespace,
        kind: TargetKind,
    ) -> Option<&mut Vec<CatalogEntry>> {
        match (namespace, kind) {
            (Namespace::Streaming, TargetKind::Scene) => Some(&mut self.streaming.scenes),
            (Namespace::Avatar, TargetKind::Model) => Some(&mut self.avatar.models),
            (Namespace::Avatar, TargetKind::Expression) => Some(&mut self.avatar.expressions),
            (Namespace::Avatar, TargetKind::Hotkey) => Some(&mut self.avatar.hotkeys),
            _ => None,
        }
    }
}

const KINDS: [(Namespace, TargetKind); 4] = [
    (Namespace::Streaming, TargetKind::Scene),
    (Namespace::Avatar, TargetKind::Model),
    (Namespace::Avatar, TargetKind::Expression),
    (Namespace::Avatar, TargetKind::Hotkey),
];

/// Resolves against a [`Catalog`]. Namespaces whose plugin is not enabled
/// answer `BackendUnavailable`. A name shared by several entries answers
/// `Ambiguous` both ways, so a stored ID is never swapped for its twin.
pub struct CatalogResolver {
    catalog: Catalog,
    enabled: Vec<Namespace>,
}

impl CatalogResolver {
    pub fn new(catalog: Catalog, enabled: Vec<Namespace>) -> Self {
        Self { catalog, enabled }
    }

    fn entries(
        &self,
        namespace: Namespace,
        kind: TargetKind,
    ) -> std::result::Result<&[CatalogEntry], ResolveError> {
        if !self.enabled.contains(&namespace) {
            return Err(ResolveError::BackendUnavailable {
                namespace,
                reason: format!("plugin {namespace} not configured"),
            });
        }
        Ok(self.catalog.entries(namespace, kind))
    }
}

#[async_trait]
impl NameResolver for CatalogResolver {
    async fn resolve_name(
        &self,
        namespace: Namespace,
        kind: TargetKind,
        id: &str,
    ) -> std::result::Result<String, ResolveError> {
        let entries = self.entries(namespace, kind)?;
        let name = entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.name.clone())
            .ok_or_else(|| ResolveError::NotFound {
                namespace,
                kind,
                key: id.to_string(),
            })?;
        if entries.iter().filter(|e| e.name == name).count() > 1 {
            return Err(ResolveError::Ambiguous {
                namespace,
                kind,
                name,
            });
        }
        Ok(name)
    }

    async fn resolve_id(
        &self,
        namespace: Namespace,
        kind: TargetKind,
        name: &str,
    ) -> std::result::Result<String, ResolveError> {
        let mut matches = self
            .entries(namespace, kind)?
            .iter()
            .filter(|e| e.name == name);
        match (matches.next(), matches.next()) {
            (Some(entry), None) => Ok(entry.id.clone()),
            (Some(_), Some(_)) => Err(ResolveError::Ambiguous {
                namespace,
                kind,
                name: name.to_string(),
            }),
            (None, _) => Err(ResolveError::NotFound {
                namespace,
                kind,
                key: name.to_string(),
            }),
        }
    }

    async fn list_names(
        &self,
        namespace: Namespace,
        kind: TargetKind,
    ) -> std::result::Result<Vec<String>, ResolveError> {
        Ok(self
            .entries(namespace, kind)?
            .iter()
            .map(|e| e.name.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolver() -> CatalogResolver {
        let mut catalog = Catalog::default();
        catalog.avatar.expressions.push(CatalogEntry::new("abc", "Smile"));
        catalog.avatar.expressions.push(CatalogEntry::new("def", "Frown"));
        CatalogResolver::new(catalog, vec![Namespace::Avatar, Namespace::Local])
    }

    #[tokio::test]
    async fn resolves_both_ways() {
        let r = resolver();
        let name = r
            .resolve_name(Namespace::Avatar, TargetKind::Expression, "abc")
            .await
            .unwrap();
        assert_eq!(name, "Smile");
        let id = r
            .resolve_id(Namespace::Avatar, TargetKind::Expression, "Frown")
            .await
            .unwrap();
        assert_eq!(id, "def");
        let names = r
            .list_names(Namespace::Avatar, TargetKind::Expression)
            .await
            .unwrap();
        assert_eq!(names, vec!["Smile", "Frown"]);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let err = resolver()
            .resolve_name(Namespace::Avatar, TargetKind::Model, "abc")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { kind: TargetKind::Model, .. }));
    }

    #[tokio::test]
    async fn disabled_namespace_is_unavailable() {
        let err = resolver()
            .list_names(Namespace::Streaming, TargetKind::Scene)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::BackendUnavailable { .. }));
    }

    #[test]
    fn load_missing_file_is_empty_and_save_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.yaml");
        let mut catalog = Catalog::load(&path).unwrap();
        assert!(catalog.entries(Namespace::Streaming, TargetKind::Scene).is_empty());

        catalog
            .entries_mut(Namespace::Streaming, TargetKind::Scene)
            .unwrap()
            .push(CatalogEntry::new("s1", "Intro"));
        catalog.save(&path).unwrap();

        let back = Catalog::load(&path).unwrap();
        assert_eq!(
            back.entries(Namespace::Streaming, TargetKind::Scene),
            &[CatalogEntry::new("s1", "Intro")]
        );
        assert!(catalog.entries_mut(Namespace::Streaming, TargetKind::Hotkey).is_none());
    }

    #[tokio::test]
    async fn shared_names_are_ambiguous_both_ways() {
        let mut catalog = Catalog::default();
        catalog.streaming.scenes.push(CatalogEntry::new("s1", "Intro"));
        catalog.streaming.scenes.push(CatalogEntry::new("s2", "Intro"));
        let r = CatalogResolver::new(catalog, vec![Namespace::Streaming]);

        let err = r
            .resolve_id(Namespace::Streaming, TargetKind::Scene, "Intro")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Ambiguous { .. }));
        let err = r
            .resolve_name(Namespace::Streaming, TargetKind::Scene, "s2")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Ambiguous { .. }));
    }

    #[test]
    fn load_rejects_duplicate_names_of_one_kind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(
            &path,
            "streaming:\n  scenes:\n    - id: s1\n      name: Intro\n    - id: s2\n      name: Intro\n",
        )
        .unwrap();
        let err = Catalog::load(&path).unwrap_err();
        assert!(err.to_string().contains("'Intro' is shared"), "{err}");

        std::fs::write(
            &path,
            "streaming:\n  scenes:\n    - id: s1\n      name: Intro\navatar:\n  models:\n    - id: m1\n      name: Intro\n",
        )
        .unwrap();
        assert!(Catalog::load(&path).is_ok());
    }
}
