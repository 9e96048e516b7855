//! Drives one [`ActionEditor`] against a store and a resolver.
//!
//! The editor itself never awaits anything. The session runs the lookups
//! and previews it asks for, performs saves and deletes, and turns every
//! failure into a [`Notice`] while still returning it to the caller.

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::action::{Action, ActionKind};
use crate::describe::describe;
use crate::editor::{ActionEditor, Draft, LookupOutcome};
use crate::error::{CueError, Result, ValidationError};
use crate::executor::ActionExecutor;
use crate::notice::Notice;
use crate::resolver::NameResolver;
use crate::store::ActionStore;
use crate::types::{Namespace, TargetKind};

/// How a save landed in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(String),
    Overwritten(String),
    Renamed { from: String, to: String },
}

impl SaveOutcome {
    pub fn id(&self) -> &str {
        match self {
            SaveOutcome::Created(id) | SaveOutcome::Overwritten(id) => id,
            SaveOutcome::Renamed { to, .. } => to,
        }
    }
}

pub struct EditorSession<S, R> {
    store: S,
    resolver: R,
    editor: ActionEditor,
    notices: Vec<Notice>,
    advisories: Option<UnboundedReceiver<Notice>>,
}

impl<S: ActionStore, R: NameResolver> EditorSession<S, R> {
    /// A session editing a new, empty action.
    pub fn new(store: S, resolver: R) -> Self {
        Self {
            store,
            resolver,
            editor: ActionEditor::new(),
            notices: Vec::new(),
            advisories: None,
        }
    }

    /// Collect advisories posted by a [`Watched`](crate::resolver::Watched)
    /// resolver alongside the session's own notices.
    pub fn with_advisories(mut self, rx: UnboundedReceiver<Notice>) -> Self {
        self.advisories = Some(rx);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn editor(&self) -> &ActionEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut ActionEditor {
        &mut self.editor
    }

    /// Everything reported since the last call, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        if let Some(rx) = self.advisories.as_mut() {
            while let Ok(notice) = rx.try_recv() {
                self.notices.push(notice);
            }
        }
        std::mem::take(&mut self.notices)
    }

    fn report<T>(&mut self, err: CueError) -> Result<T> {
        warn!(error = %err, "editor operation failed");
        self.notices.push(Notice::error(err.to_string()));
        Err(err)
    }

    // -----------------------------------------------------------------------
    // Opening
    // -----------------------------------------------------------------------

    /// Start over with a blank editor.
    pub fn start_new(&mut self, kind: ActionKind) {
        self.editor = ActionEditor::new();
        self.editor.choose_kind(kind);
    }

    /// Load a stored action and fill in every display name it needs.
    pub async fn open(&mut self, id: &str) -> Result<()> {
        let action = match self.store.load_action(id).await {
            Ok(action) => action,
            Err(e) => return self.report(e),
        };
        let (editor, lookups) = ActionEditor::load(id, &action);
        debug!(id, lookups = lookups.len(), "opened action");
        self.editor = editor;
        self.resolve_pending().await;
        Ok(())
    }

    /// Run every outstanding lookup. Failures leave their field unselected
    /// and are reported; they never stop the remaining lookups.
    pub async fn resolve_pending(&mut self) {
        for lookup in self.editor.pending_lookups() {
            let result = self
                .resolver
                .resolve_name(lookup.namespace, lookup.kind, &lookup.id)
                .await;
            match self.editor.apply_lookup(&lookup, result) {
                LookupOutcome::Applied => {}
                LookupOutcome::Failed(message) => {
                    warn!(id = %lookup.id, %message, "lookup failed");
                    self.notices.push(Notice::error(format!(
                        "could not find the {} {} '{}': {message}",
                        lookup.namespace, lookup.kind, lookup.id
                    )));
                }
                LookupOutcome::Stale => debug!(id = %lookup.id, "lookup result dropped"),
            }
        }
    }

    /// Build the previews a chain is still waiting for.
    pub async fn refresh_previews(&mut self) {
        let requests = match self.editor.draft() {
            Draft::Chain(chain) => chain.pending_previews(),
            _ => return,
        };
        for request in requests {
            let result = describe(&request.action, &self.resolver).await;
            let Some(chain) = self.editor.chain_untouched() else {
                return;
            };
            if let LookupOutcome::Failed(message) =
                chain.apply_preview(request.key, request.generation, result)
            {
                self.notices
                    .push(Notice::error(format!("preview unavailable: {message}")));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Pick lists
    // -----------------------------------------------------------------------

    /// Names to offer for a picker, fetched fresh each time.
    pub async fn picker_options(
        &mut self,
        namespace: Namespace,
        kind: TargetKind,
    ) -> Result<Vec<String>> {
        match self.resolver.list_names(namespace, kind).await {
            Ok(names) => Ok(names),
            Err(e) => self.report(e.into()),
        }
    }

    /// Stored actions that may be picked as a sub-action. The action being
    /// edited is never offered.
    pub async fn offered_actions(&mut self) -> Result<Vec<String>> {
        let ids = match self.store.list_action_ids().await {
            Ok(ids) => ids,
            Err(e) => return self.report(e),
        };
        let excluded = self.editor.excluded_ids();
        Ok(ids
            .into_iter()
            .filter(|id| !excluded.contains(&id.as_str()))
            .collect())
    }

    /// Append a copy of a stored action to the chain being edited.
    pub async fn copy_into_chain(&mut self, id: &str) -> Result<u64> {
        if self.editor.excluded_ids().contains(&id) {
            let err = ValidationError::new("chain", format!("'{id}' cannot contain itself"));
            return self.report(err.into());
        }
        if self.editor.kind() != Some(ActionKind::Chain) {
            let err = ValidationError::new("type", "only a chain can take copied actions");
            return self.report(err.into());
        }
        let action = match self.store.load_action(id).await {
            Ok(action) => action,
            Err(e) => return self.report(e),
        };
        let Some(chain) = self.editor.chain_mut() else {
            return self.report(ValidationError::new("type", "not editing a chain").into());
        };
        let key = chain.push(action);
        self.resolve_pending().await;
        Ok(key)
    }

    // -----------------------------------------------------------------------
    // Saving
    // -----------------------------------------------------------------------

    /// Build the action without saving it.
    pub async fn materialize(&mut self) -> Result<Action> {
        match self.editor.materialize(&self.resolver, &self.store).await {
            Ok(action) => Ok(action),
            Err(e) => self.report(e),
        }
    }

    /// Save under the current ID.
    ///
    /// A new action must not collide with a stored one. An unchanged ID
    /// overwrites in place. A changed ID stores the new entry first and then
    /// deletes the old one; if that delete fails both entries remain and the
    /// failure is reported.
    pub async fn save(&mut self) -> Result<SaveOutcome> {
        let action = self.materialize().await?;
        let id = self.editor.id().to_string();
        let original = self.editor.original_id().map(str::to_string);

        let outcome = match original {
            None => {
                if let Err(e) = self.store.save_action(&id, &action, false).await {
                    return self.report(e);
                }
                SaveOutcome::Created(id)
            }
            Some(original) if original == id => {
                if let Err(e) = self.store.save_action(&id, &action, true).await {
                    return self.report(e);
                }
                SaveOutcome::Overwritten(id)
            }
            Some(original) => {
                if let Err(e) = self.store.save_action(&id, &action, false).await {
                    return self.report(e);
                }
                if let Err(e) = self.store.delete_action(&original).await {
                    warn!(from = %original, to = %id, error = %e, "rename left the old entry behind");
                    self.notices.push(Notice::error(format!(
                        "saved as '{id}' but could not remove '{original}': {e}"
                    )));
                }
                SaveOutcome::Renamed { from: original, to: id }
            }
        };
        self.editor.mark_saved();
        info!(id = outcome.id(), "action saved");
        self.notices
            .push(Notice::info(format!("saved '{}'", outcome.id())));
        Ok(outcome)
    }

    /// Delete the loaded action and start over with a blank editor.
    pub async fn delete(&mut self) -> Result<String> {
        let Some(id) = self.editor.original_id().map(str::to_string) else {
            return self.report(ValidationError::new("id", "nothing stored to delete").into());
        };
        if let Err(e) = self.store.delete_action(&id).await {
            return self.report(e);
        }
        info!(%id, "action deleted");
        self.editor = ActionEditor::new();
        self.notices.push(Notice::info(format!("deleted '{id}'")));
        Ok(id)
    }

    /// Delete a stored action by ID without loading it, so entries that no
    /// longer parse or whose plugin is disabled can still be removed. An
    /// editor holding that action starts over.
    pub async fn delete_stored(&mut self, id: &str) -> Result<()> {
        if let Err(e) = self.store.delete_action(id).await {
            return self.report(e);
        }
        info!(%id, "action deleted");
        if self.editor.original_id() == Some(id) {
            self.editor = ActionEditor::new();
        }
        self.notices.push(Notice::info(format!("deleted '{id}'")));
        Ok(())
    }

    /// Ask `executor` to run a stored action. Only acceptance is reported.
    pub async fn execute(&mut self, executor: &dyn ActionExecutor, id: &str) -> bool {
        match executor.execute_action(id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(id, error = %e, "execution failed");
                self.notices
                    .push(Notice::error(format!("could not run '{id}': {e}")));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::action::Condition;
    use crate::chain::{ElementBody, Preview};
    use crate::editor::{BranchChoice, ConditionTarget, ParamFields, PickerState};
    use crate::error::ResolveError;
    use crate::executor::DryRun;
    use crate::notice::NoticeLevel;
    use crate::plugins::{
        AvatarAction, LocalAction, PluginAction, PluginQuery, StreamingAction, StreamingQuery,
    };
    use crate::resolver::{Catalog, CatalogEntry, CatalogResolver};
    use crate::store::ActionDb;

    /// Counts `resolve_id` calls so saves can be shown to look IDs up again.
    struct Counting {
        inner: CatalogResolver,
        ids: AtomicUsize,
    }

    #[async_trait]
    impl NameResolver for Counting {
        async fn resolve_name(
            &self,
            namespace: Namespace,
            kind: TargetKind,
            id: &str,
        ) -> std::result::Result<String, ResolveError> {
            self.inner.resolve_name(namespace, kind, id).await
        }

        async fn resolve_id(
            &self,
            namespace: Namespace,
            kind: TargetKind,
            name: &str,
        ) -> std::result::Result<String, ResolveError> {
            self.ids.fetch_add(1, Ordering::SeqCst);
            self.inner.resolve_id(namespace, kind, name).await
        }

        async fn list_names(
            &self,
            namespace: Namespace,
            kind: TargetKind,
        ) -> std::result::Result<Vec<String>, ResolveError> {
            self.inner.list_names(namespace, kind).await
        }
    }

    fn resolver() -> Arc<Counting> {
        let mut catalog = Catalog::default();
        catalog.avatar.expressions.push(CatalogEntry::new("abc", "Smile"));
        catalog.avatar.models.push(CatalogEntry::new("m1", "Fox"));
        catalog.streaming.scenes.push(CatalogEntry::new("s1", "Intro"));
        Arc::new(Counting {
            inner: CatalogResolver::new(
                catalog,
                vec![Namespace::Streaming, Namespace::Avatar, Namespace::Local],
            ),
            ids: AtomicUsize::new(0),
        })
    }

    fn store(dir: &TempDir) -> Arc<ActionDb> {
        Arc::new(ActionDb::open(&dir.path().join("actions.redb")).unwrap())
    }

    fn greet() -> Action {
        Action::Chain(vec![
            Action::Single(PluginAction::Local(LocalAction::Delay(2.0))),
            Action::Single(PluginAction::Avatar(AvatarAction::ToggleExpression(
                "abc".into(),
            ))),
        ])
    }

    fn scene(id: &str) -> Action {
        Action::Single(PluginAction::Streaming(StreamingAction::ProgramSceneChange(
            id.into(),
        )))
    }

    #[tokio::test]
    async fn greet_round_trips_byte_for_byte() {
        let dir = TempDir::new().unwrap();
        let db = store(&dir);
        db.put("greet", &greet(), false).unwrap();
        let before = db.get_raw("greet").unwrap().unwrap();

        let names = resolver();
        let mut session = EditorSession::new(db.clone(), names.clone());
        session.open("greet").await.unwrap();

        let Draft::Chain(chain) = session.editor().draft() else {
            panic!("greet should load as a chain");
        };
        let ElementBody::Single(smile) = chain.elements()[1].body() else {
            panic!("second element should be editable");
        };
        let ParamFields::Target(picker) = smile.params() else {
            panic!("expression picker expected");
        };
        assert_eq!(picker.state(), &PickerState::Selected("Smile".into()));

        let outcome = session.save().await.unwrap();
        assert_eq!(outcome, SaveOutcome::Overwritten("greet".into()));
        assert_eq!(names.ids.load(Ordering::SeqCst), 1);
        assert_eq!(db.get_raw("greet").unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn shared_scene_name_never_retargets_the_stored_id() {
        let dir = TempDir::new().unwrap();
        let db = store(&dir);
        db.put("intro", &scene("s2"), false).unwrap();
        let before = db.get_raw("intro").unwrap().unwrap();

        let mut catalog = Catalog::default();
        catalog.streaming.scenes.push(CatalogEntry::new("s1", "Intro"));
        catalog.streaming.scenes.push(CatalogEntry::new("s2", "Intro"));
        let names = CatalogResolver::new(catalog, vec![Namespace::Streaming]);

        let mut session = EditorSession::new(db.clone(), names);
        session.open("intro").await.unwrap();
        let Draft::Single(draft) = session.editor().draft() else {
            panic!("intro should load as a single command");
        };
        assert!(matches!(
            draft.params().picker().unwrap().state(),
            PickerState::Unresolved { id, .. } if id == "s2"
        ));
        let notices = session.drain_notices();
        assert!(notices[0].message.contains("shared by several entries"));

        assert!(session.save().await.is_err());
        assert_eq!(db.get_raw("intro").unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn new_action_conflicts_with_stored_id() {
        let dir = TempDir::new().unwrap();
        let db = store(&dir);
        db.put("intro", &scene("s1"), false).unwrap();

        let mut session = EditorSession::new(db.clone(), resolver());
        session.start_new(ActionKind::Chain);
        session.editor_mut().set_id("intro");
        let err = session.save().await.unwrap_err();
        assert!(matches!(err, CueError::ActionExists(_)));
        assert_eq!(db.get("intro").unwrap(), scene("s1"));

        let notices = session.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn rename_saves_new_then_removes_old() {
        let dir = TempDir::new().unwrap();
        let db = store(&dir);
        db.put("old", &scene("s1"), false).unwrap();

        let mut session = EditorSession::new(db.clone(), resolver());
        session.open("old").await.unwrap();
        session.editor_mut().set_id("new");
        let outcome = session.save().await.unwrap();

        assert_eq!(
            outcome,
            SaveOutcome::Renamed {
                from: "old".into(),
                to: "new".into()
            }
        );
        assert_eq!(db.ids().unwrap(), vec!["new".to_string()]);
        assert_eq!(db.get("new").unwrap(), scene("s1"));
        assert_eq!(session.editor().original_id(), Some("new"));
    }

    #[tokio::test]
    async fn rename_onto_existing_id_keeps_both() {
        let dir = TempDir::new().unwrap();
        let db = store(&dir);
        db.put("a", &scene("s1"), false).unwrap();
        db.put("b", &greet(), false).unwrap();

        let mut session = EditorSession::new(db.clone(), resolver());
        session.open("a").await.unwrap();
        session.editor_mut().set_id("b");
        assert!(matches!(
            session.save().await.unwrap_err(),
            CueError::ActionExists(_)
        ));
        assert_eq!(db.get("a").unwrap(), scene("s1"));
        assert_eq!(db.get("b").unwrap(), greet());
    }

    #[tokio::test]
    async fn edited_action_is_never_offered() {
        let dir = TempDir::new().unwrap();
        let db = store(&dir);
        db.put("x", &greet(), false).unwrap();
        db.put("y", &scene("s1"), false).unwrap();

        let mut session = EditorSession::new(db.clone(), resolver());
        session.open("x").await.unwrap();
        assert_eq!(session.offered_actions().await.unwrap(), vec!["y".to_string()]);

        assert!(session.copy_into_chain("x").await.is_err());
        let key = session.copy_into_chain("y").await.unwrap();
        let Draft::Chain(chain) = session.editor().draft() else {
            panic!("chain expected");
        };
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.elements()[2].key(), key);
    }

    #[tokio::test]
    async fn failed_lookup_is_reported_and_others_fill_in() {
        let dir = TempDir::new().unwrap();
        let db = store(&dir);
        db.put(
            "pair",
            &Action::Chain(vec![
                Action::Single(PluginAction::Avatar(AvatarAction::ToggleExpression(
                    "gone".into(),
                ))),
                Action::Single(PluginAction::Avatar(AvatarAction::LoadModel("m1".into()))),
            ]),
            false,
        )
        .unwrap();

        let mut session = EditorSession::new(db.clone(), resolver());
        session.open("pair").await.unwrap();
        assert!(session.editor().is_settled());
        let notices = session.drain_notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].message.contains("gone"));

        let Draft::Chain(chain) = session.editor().draft() else {
            panic!("chain expected");
        };
        assert_eq!(
            chain.elements()[1].preview(),
            Preview::Ready("Avatar.LoadModel: Fox".into())
        );
    }

    #[tokio::test]
    async fn previews_resolve_names_for_nested_copies() {
        let dir = TempDir::new().unwrap();
        let db = store(&dir);
        let cond = Condition::new(PluginQuery::Streaming(StreamingQuery::IsRecording), "false");
        db.put("guard", &Action::If(cond, Box::new(scene("s1")), None), false)
            .unwrap();

        let mut session = EditorSession::new(db.clone(), resolver());
        session.start_new(ActionKind::Chain);
        session.editor_mut().set_id("outer");
        session.copy_into_chain("guard").await.unwrap();
        session.refresh_previews().await;

        let Draft::Chain(chain) = session.editor().draft() else {
            panic!("chain expected");
        };
        let Preview::Ready(text) = chain.elements()[0].preview() else {
            panic!("preview should be ready");
        };
        assert!(text.starts_with("If Streaming is not recording"));
        assert!(text.contains("Intro"));
    }

    #[tokio::test]
    async fn conditional_with_existing_branch_copies_at_save() {
        let dir = TempDir::new().unwrap();
        let db = store(&dir);
        db.put("intro", &scene("s1"), false).unwrap();

        let mut session = EditorSession::new(db.clone(), resolver());
        session.start_new(ActionKind::If);
        session.editor_mut().set_id("maybe-intro");
        {
            let draft = session.editor_mut().if_mut().unwrap();
            draft
                .condition
                .set_query(PluginQuery::Streaming(StreamingQuery::IsStreaming));
            *draft.condition.target_mut() = ConditionTarget::Flag(Some(true));
            draft
                .set_then(BranchChoice::Existing("intro".into()))
                .unwrap();
        }
        session.save().await.unwrap();

        let saved = db.get("maybe-intro").unwrap();
        let cond = Condition::new(PluginQuery::Streaming(StreamingQuery::IsStreaming), "true");
        assert_eq!(saved, Action::If(cond, Box::new(scene("s1")), None));
    }

    #[tokio::test]
    async fn delete_resets_the_editor() {
        let dir = TempDir::new().unwrap();
        let db = store(&dir);
        db.put("gone", &greet(), false).unwrap();

        let mut session = EditorSession::new(db.clone(), resolver());
        session.open("gone").await.unwrap();
        assert_eq!(session.delete().await.unwrap(), "gone");
        assert!(db.ids().unwrap().is_empty());
        assert_eq!(session.editor().kind(), None);
        assert!(session.delete().await.is_err());
    }

    #[tokio::test]
    async fn delete_by_id_skips_loading_the_entry() {
        let dir = TempDir::new().unwrap();
        let db = store(&dir);
        db.put("intro", &scene("s1"), false).unwrap();

        let names = CatalogResolver::new(Catalog::default(), Vec::new());
        let mut session = EditorSession::new(db.clone(), names);
        session.delete_stored("intro").await.unwrap();

        let notices = session.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Info);
        assert!(db.get_raw("intro").unwrap().is_none());

        let err = session.delete_stored("intro").await.unwrap_err();
        assert!(matches!(err, CueError::ActionNotFound(_)));
    }

    #[tokio::test]
    async fn execution_failure_becomes_a_notice() {
        let dir = TempDir::new().unwrap();
        let db = store(&dir);
        db.put("greet", &greet(), false).unwrap();

        let mut session = EditorSession::new(db.clone(), resolver());
        let executor = DryRun::new(db.clone());
        assert!(session.execute(&executor, "greet").await);
        assert!(!session.execute(&executor, "missing").await);
        let notices = session.drain_notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].message.contains("missing"));
    }

    #[tokio::test]
    async fn advisories_are_drained_with_session_notices() {
        let dir = TempDir::new().unwrap();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let mut session = EditorSession::new(store(&dir), resolver()).with_advisories(rx);
        tx.send(Notice::advisory("slow")).unwrap();
        assert!(session.open("missing").await.is_err());

        let levels: Vec<NoticeLevel> = session.drain_notices().iter().map(|n| n.level).collect();
        assert_eq!(levels, vec![NoticeLevel::Error, NoticeLevel::Advisory]);
    }
}
