//! Persistent action storage using redb.
//!
//! One `ACTIONS` table maps the action ID to its JSON-encoded [`Action`].
//! The encoded bytes are the persisted form shared with other tools, so they
//! are written exactly as `serde_json` produces them.

use std::path::Path;

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use super::ActionStore;
use crate::action::{Action, ActionConfig};
use crate::error::{CueError, Result};
use crate::paths::validate_action_id;

// ---------------------------------------------------------------------------
// Table definition
// ---------------------------------------------------------------------------

/// Key: action ID. Value: JSON-encoded Action.
const ACTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("actions");

fn db_err(e: impl std::fmt::Display) -> CueError {
    CueError::Store(e.to_string())
}

// ---------------------------------------------------------------------------
// ActionDb
// ---------------------------------------------------------------------------

pub struct ActionDb {
    db: Database,
}

impl ActionDb {
    /// Open or create the redb database at `path`, creating the table if it
    /// doesn't already exist.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;
        let wt = db.begin_write().map_err(db_err)?;
        wt.open_table(ACTIONS).map_err(db_err)?;
        wt.commit().map_err(db_err)?;
        Ok(Self { db })
    }

    /// The stored bytes for `id`, exactly as persisted.
    pub fn get_raw(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(ACTIONS).map_err(db_err)?;
        let value = table.get(id).map_err(db_err)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    pub fn get(&self, id: &str) -> Result<Action> {
        let raw = self
            .get_raw(id)?
            .ok_or_else(|| CueError::ActionNotFound(id.to_string()))?;
        let action = serde_json::from_slice(&raw)
            .map_err(|e| CueError::Store(format!("action '{id}' is unreadable: {e}")))?;
        Ok(action)
    }

    /// Check-and-insert in a single write transaction.
    pub fn put(&self, id: &str, action: &Action, overwrite: bool) -> Result<()> {
        validate_action_id(id)?;
        let value = serde_json::to_vec(action)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(ACTIONS).map_err(db_err)?;
            if !overwrite && table.get(id).map_err(db_err)?.is_some() {
                return Err(CueError::ActionExists(id.to_string()));
            }
            table.insert(id, value.as_slice()).map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        debug!(id, overwrite, bytes = value.len(), "action stored");
        Ok(())
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(ACTIONS).map_err(db_err)?;
            if table.remove(id).map_err(db_err)?.is_none() {
                return Err(CueError::ActionNotFound(id.to_string()));
            }
        }
        wt.commit().map_err(db_err)?;
        debug!(id, "action removed");
        Ok(())
    }

    /// All IDs in key order.
    pub fn ids(&self) -> Result<Vec<String>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(ACTIONS).map_err(db_err)?;
        let mut ids = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (k, _) = entry.map_err(db_err)?;
            ids.push(k.value().to_string());
        }
        Ok(ids)
    }

    // -----------------------------------------------------------------------
    // Import / export
    // -----------------------------------------------------------------------

    /// Every stored action as one document.
    pub fn export(&self) -> Result<ActionConfig> {
        let mut config = ActionConfig::default();
        for id in self.ids()? {
            let action = self.get(&id)?;
            config.actions.insert(id, action);
        }
        Ok(config)
    }

    /// Validate then store every action in `config`. Nothing is written if
    /// any entry fails validation or, without `overwrite`, collides with a
    /// stored ID. Returns the number of actions written.
    pub fn import(&self, config: &ActionConfig, overwrite: bool) -> Result<usize> {
        for (id, action) in &config.actions {
            validate_action_id(id)?;
            action
                .validate()
                .map_err(|e| e.nested(&format!("actions.{id}")))?;
        }

        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(ACTIONS).map_err(db_err)?;
            for (id, action) in &config.actions {
                if !overwrite && table.get(id.as_str()).map_err(db_err)?.is_some() {
                    return Err(CueError::ActionExists(id.clone()));
                }
                let value = serde_json::to_vec(action)?;
                table.insert(id.as_str(), value.as_slice()).map_err(db_err)?;
            }
        }
        wt.commit().map_err(db_err)?;
        debug!(count = config.actions.len(), overwrite, "actions imported");
        Ok(config.actions.len())
    }
}

#[async_trait]
impl ActionStore for ActionDb {
    async fn load_action(&self, id: &str) -> Result<Action> {
        self.get(id)
    }

    async fn save_action(&self, id: &str, action: &Action, overwrite: bool) -> Result<()> {
        self.put(id, action, overwrite)
    }

    async fn delete_action(&self, id: &str) -> Result<()> {
        self.remove(id)
    }

    async fn list_action_ids(&self) -> Result<Vec<String>> {
        self.ids()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{LocalAction, PluginAction};
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, ActionDb) {
        let dir = TempDir::new().unwrap();
        let db = ActionDb::open(&dir.path().join("actions.redb")).unwrap();
        (dir, db)
    }

    fn delay(secs: f64) -> Action {
        Action::Single(PluginAction::Local(LocalAction::Delay(secs)))
    }

    #[test]
    fn save_without_overwrite_conflicts() {
        let (_dir, db) = open_tmp();
        db.put("intro", &delay(1.0), false).unwrap();

        let err = db.put("intro", &delay(2.0), false).unwrap_err();
        assert!(matches!(err, CueError::ActionExists(id) if id == "intro"));
        assert_eq!(db.get("intro").unwrap(), delay(1.0));
    }

    #[test]
    fn overwrite_replaces_whole_value() {
        let (_dir, db) = open_tmp();
        db.put("intro", &Action::Chain(vec![delay(1.0), delay(2.0)]), false)
            .unwrap();
        db.put("intro", &delay(3.0), true).unwrap();
        assert_eq!(db.get("intro").unwrap(), delay(3.0));
    }

    #[test]
    fn delete_missing_is_not_found() {
        let (_dir, db) = open_tmp();
        assert!(matches!(
            db.remove("ghost"),
            Err(CueError::ActionNotFound(_))
        ));
        db.put("ghost", &delay(0.0), false).unwrap();
        db.remove("ghost").unwrap();
        assert!(db.ids().unwrap().is_empty());
    }

    #[test]
    fn ids_are_sorted_and_ids_are_validated() {
        let (_dir, db) = open_tmp();
        db.put("b", &delay(1.0), false).unwrap();
        db.put("a", &delay(1.0), false).unwrap();
        assert_eq!(db.ids().unwrap(), vec!["a", "b"]);
        assert!(matches!(
            db.put("a/b", &delay(1.0), false),
            Err(CueError::InvalidActionId(_))
        ));
    }

    #[test]
    fn export_then_import_into_fresh_db() {
        let (_dir, db) = open_tmp();
        db.put("one", &delay(1.0), false).unwrap();
        db.put("two", &Action::Chain(vec![]), false).unwrap();
        let exported = db.export().unwrap();

        let (_dir2, other) = open_tmp();
        assert_eq!(other.import(&exported, false).unwrap(), 2);
        assert_eq!(other.export().unwrap(), exported);

        // Second import collides and writes nothing.
        let err = other.import(&exported, false).unwrap_err();
        assert!(matches!(err, CueError::ActionExists(_)));
        assert_eq!(other.import(&exported, true).unwrap(), 2);
    }

    #[test]
    fn import_rejects_invalid_actions_before_writing() {
        let (_dir, db) = open_tmp();
        let mut config = ActionConfig::default();
        config.actions.insert("ok".into(), delay(1.0));
        config.actions.insert("bad".into(), delay(-1.0));
        let err = db.import(&config, false).unwrap_err();
        match err {
            CueError::Validation(v) => assert_eq!(v.path, "actions.bad.delay"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(db.ids().unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_trait_delegates() {
        let (_dir, db) = open_tmp();
        let store: &dyn ActionStore = &db;
        store.save_action("x", &delay(1.0), false).await.unwrap();
        assert_eq!(store.list_action_ids().await.unwrap(), vec!["x"]);
        assert_eq!(store.load_action("x").await.unwrap(), delay(1.0));
        store.delete_action("x").await.unwrap();
        assert!(matches!(
            store.load_action("x").await,
            Err(CueError::ActionNotFound(_))
        ));
    }
}
