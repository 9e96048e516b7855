//! Editing state for one action.
//!
//! An [`ActionEditor`] is a plain value: every transition is a method call
//! and nothing is shared. Lookups it needs are handed out as [`Lookup`]
//! values; the caller runs them and feeds results back with
//! [`ActionEditor::apply_lookup`]. A result whose epoch or field generation
//! no longer matches is dropped.
//!
//! Phases: `Empty` → `TypeChosen` → `FieldsEditing` → `Ready`, or
//! `Invalid` after a failed validation.

pub mod condition;
pub mod fields;
pub mod single;

use tracing::debug;

use crate::action::{Action, ActionKind};
use crate::chain::ChainBuilder;
use crate::error::{CueError, ResolveError, ValidationError};
use crate::paths::validate_action_id;
use crate::resolver::NameResolver;
use crate::store::ActionStore;
use crate::types::{Namespace, TargetKind};

pub use condition::{BranchChoice, ConditionDraft, ConditionTarget, IfDraft};
pub use fields::{LookupOutcome, NumericField, PickerField, PickerState};
pub use single::{ParamFields, SingleDraft};

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Which field a lookup belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The target of a single command.
    Command,
    /// The expected target of a condition.
    Condition,
    /// The target of the chain element with this key.
    Element(u64),
}

/// One pending ID → name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub epoch: u64,
    pub slot: Slot,
    pub generation: u64,
    pub namespace: Namespace,
    pub kind: TargetKind,
    pub id: String,
}

fn lookup_for(epoch: u64, slot: Slot, picker: &PickerField) -> Option<Lookup> {
    picker.resolving().map(|id| Lookup {
        epoch,
        slot,
        generation: picker.generation(),
        namespace: picker.namespace(),
        kind: picker.kind(),
        id: id.to_string(),
    })
}

// ---------------------------------------------------------------------------
// ActionEditor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    Empty,
    Single(SingleDraft),
    Chain(ChainBuilder),
    If(IfDraft),
}

impl Draft {
    fn blank(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Single => Draft::Single(SingleDraft::new()),
            ActionKind::Chain => Draft::Chain(ChainBuilder::new()),
            ActionKind::If => Draft::If(IfDraft::new()),
        }
    }

    fn loaded(action: &Action) -> Self {
        match action {
            Action::Single(single) => Draft::Single(SingleDraft::loaded(single)),
            Action::Chain(actions) => Draft::Chain(ChainBuilder::from_actions(actions)),
            Action::If(condition, then, otherwise) => {
                Draft::If(IfDraft::loaded(condition, then, otherwise.as_deref()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Empty,
    TypeChosen(ActionKind),
    FieldsEditing(ActionKind),
    Ready(ActionKind),
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionEditor {
    original_id: Option<String>,
    id: String,
    draft: Draft,
    epoch: u64,
    touched: bool,
    invalid: Option<String>,
}

impl Default for ActionEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionEditor {
    /// An editor for a new action.
    pub fn new() -> Self {
        Self {
            original_id: None,
            id: String::new(),
            draft: Draft::Empty,
            epoch: 0,
            touched: false,
            invalid: None,
        }
    }

    /// Rebuild editing state from a stored action. Type and command are set
    /// right away; every opaque ID comes back as a lookup to run.
    pub fn load(id: impl Into<String>, action: &Action) -> (Self, Vec<Lookup>) {
        let id = id.into();
        let editor = Self {
            original_id: Some(id.clone()),
            id,
            draft: Draft::loaded(action),
            epoch: 0,
            touched: false,
            invalid: None,
        };
        let lookups = editor.pending_lookups();
        debug!(id = %editor.id, lookups = lookups.len(), "editor loaded");
        (editor, lookups)
    }

    pub fn original_id(&self) -> Option<&str> {
        self.original_id.as_deref()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
        self.touch();
    }

    /// True when a loaded action will be saved under a different ID.
    pub fn is_rename(&self) -> bool {
        self.original_id
            .as_deref()
            .is_some_and(|original| original != self.id)
    }

    /// IDs the action being edited is known by. None of them may be picked
    /// as a sub-action.
    pub fn excluded_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        if let Some(original) = self.original_id.as_deref() {
            ids.push(original);
        }
        if !self.id.is_empty() && Some(self.id.as_str()) != self.original_id.as_deref() {
            ids.push(self.id.as_str());
        }
        ids
    }

    /// The action now lives under the current ID.
    pub(crate) fn mark_saved(&mut self) {
        self.original_id = Some(self.id.clone());
        self.touched = false;
        self.invalid = None;
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn kind(&self) -> Option<ActionKind> {
        match self.draft {
            Draft::Empty => None,
            Draft::Single(_) => Some(ActionKind::Single),
            Draft::Chain(_) => Some(ActionKind::Chain),
            Draft::If(_) => Some(ActionKind::If),
        }
    }

    /// Pick the top-level type. A different type discards every field and
    /// starts a new epoch so in-flight lookups are dropped.
    pub fn choose_kind(&mut self, kind: ActionKind) {
        if self.kind() == Some(kind) {
            return;
        }
        self.epoch += 1;
        self.draft = Draft::blank(kind);
        self.touched = false;
        self.invalid = None;
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn single_mut(&mut self) -> Option<&mut SingleDraft> {
        if matches!(self.draft, Draft::Single(_)) {
            self.touch();
        }
        match &mut self.draft {
            Draft::Single(draft) => Some(draft),
            _ => None,
        }
    }

    pub fn chain_mut(&mut self) -> Option<&mut ChainBuilder> {
        if matches!(self.draft, Draft::Chain(_)) {
            self.touch();
        }
        match &mut self.draft {
            Draft::Chain(chain) => Some(chain),
            _ => None,
        }
    }

    /// The chain, for bookkeeping that is not a user edit.
    pub(crate) fn chain_untouched(&mut self) -> Option<&mut ChainBuilder> {
        match &mut self.draft {
            Draft::Chain(chain) => Some(chain),
            _ => None,
        }
    }

    pub fn if_mut(&mut self) -> Option<&mut IfDraft> {
        if matches!(self.draft, Draft::If(_)) {
            self.touch();
        }
        match &mut self.draft {
            Draft::If(draft) => Some(draft),
            _ => None,
        }
    }

    fn touch(&mut self) {
        self.touched = true;
        self.invalid = None;
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Every field still showing a stored ID instead of a name.
    pub fn pending_lookups(&self) -> Vec<Lookup> {
        let epoch = self.epoch;
        match &self.draft {
            Draft::Empty => Vec::new(),
            Draft::Single(draft) => draft
                .params()
                .picker()
                .and_then(|p| lookup_for(epoch, Slot::Command, p))
                .into_iter()
                .collect(),
            Draft::If(draft) => draft
                .condition
                .picker()
                .and_then(|p| lookup_for(epoch, Slot::Condition, p))
                .into_iter()
                .collect(),
            Draft::Chain(chain) => chain
                .elements()
                .iter()
                .filter_map(|e| match e.body() {
                    crate::chain::ElementBody::Single(draft) => draft
                        .params()
                        .picker()
                        .and_then(|p| lookup_for(epoch, Slot::Element(e.key()), p)),
                    crate::chain::ElementBody::Copy(_) => None,
                })
                .collect(),
        }
    }

    fn picker_mut(&mut self, slot: Slot) -> Option<&mut PickerField> {
        match (slot, &mut self.draft) {
            (Slot::Command, Draft::Single(draft)) => draft.params_mut().picker_mut(),
            (Slot::Condition, Draft::If(draft)) => draft.condition.picker_mut(),
            (Slot::Element(key), Draft::Chain(chain)) => chain
                .element_mut(key)?
                .single_mut()?
                .params_mut()
                .picker_mut(),
            _ => None,
        }
    }

    pub fn apply_lookup(
        &mut self,
        lookup: &Lookup,
        result: Result<String, ResolveError>,
    ) -> LookupOutcome {
        if lookup.epoch != self.epoch {
            debug!(slot = ?lookup.slot, "dropping lookup from an earlier epoch");
            return LookupOutcome::Stale;
        }
        let Some(picker) = self.picker_mut(lookup.slot) else {
            return LookupOutcome::Stale;
        };
        if picker.namespace() != lookup.namespace || picker.kind() != lookup.kind {
            return LookupOutcome::Stale;
        }
        picker.apply(lookup.generation, &lookup.id, result)
    }

    /// No field is waiting on a lookup.
    pub fn is_settled(&self) -> bool {
        match &self.draft {
            Draft::Empty => true,
            Draft::Single(draft) => draft.is_settled(),
            Draft::Chain(chain) => chain.is_settled(),
            Draft::If(draft) => draft.condition.picker().map_or(true, PickerField::is_settled),
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Everything that can be checked without a round trip.
    pub fn check(&self) -> Result<(), ValidationError> {
        validate_action_id(&self.id).map_err(|e| ValidationError::new("id", e.to_string()))?;
        match &self.draft {
            Draft::Empty => Err(ValidationError::new("type", "choose an action type")),
            Draft::Single(draft) => draft.check(),
            Draft::Chain(chain) => chain.check(),
            Draft::If(draft) => draft.check(&self.excluded_ids()),
        }
    }

    /// Like [`check`](Self::check), but a failure moves the editor to
    /// `Invalid` until the next edit.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        let result = self.check();
        self.invalid = result.as_ref().err().map(ToString::to_string);
        result
    }

    pub fn phase(&self) -> Phase {
        if let Some(message) = &self.invalid {
            return Phase::Invalid(message.clone());
        }
        let Some(kind) = self.kind() else {
            return Phase::Empty;
        };
        if self.is_settled() && self.check().is_ok() {
            Phase::Ready(kind)
        } else if self.touched {
            Phase::FieldsEditing(kind)
        } else {
            Phase::TypeChosen(kind)
        }
    }

    /// Build the action to save. Picker names are looked up as IDs, branch
    /// references are copied from the store, and the first failure is
    /// returned with nothing submitted.
    pub async fn materialize(
        &mut self,
        resolver: &dyn NameResolver,
        store: &dyn ActionStore,
    ) -> Result<Action, CueError> {
        self.validate()?;
        let built: Result<Action, CueError> = match &self.draft {
            Draft::Empty => Err(ValidationError::new("type", "choose an action type").into()),
            Draft::Single(draft) => draft
                .materialize(resolver)
                .await
                .map(Action::Single)
                .map_err(CueError::from),
            Draft::Chain(chain) => chain.materialize(resolver).await.map_err(CueError::from),
            Draft::If(draft) => draft.materialize(&self.excluded_ids(), resolver, store).await,
        };
        let action = match built {
            Ok(action) => action,
            Err(e) => {
                self.invalid = Some(e.to_string());
                return Err(e);
            }
        };
        if let Err(e) = action.validate() {
            self.invalid = Some(e.to_string());
            return Err(e.into());
        }
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Condition;
    use crate::plugins::{
        AvatarAction, AvatarActionKind, CommandKind, LocalAction, PluginAction, PluginQuery,
        StreamingQuery,
    };

    fn smile() -> Action {
        Action::Single(PluginAction::Avatar(AvatarAction::ToggleExpression(
            "abc".into(),
        )))
    }

    fn delay(secs: f64) -> Action {
        Action::Single(PluginAction::Local(LocalAction::Delay(secs)))
    }

    #[test]
    fn new_editor_walks_the_phases() {
        let mut editor = ActionEditor::new();
        assert_eq!(editor.phase(), Phase::Empty);

        editor.choose_kind(ActionKind::Single);
        assert_eq!(editor.phase(), Phase::TypeChosen(ActionKind::Single));

        editor.set_id("wait");
        let draft = editor.single_mut().unwrap();
        draft.set_namespace(Namespace::Local);
        draft
            .set_command(CommandKind::Local(crate::plugins::LocalActionKind::Delay))
            .unwrap();
        assert_eq!(editor.phase(), Phase::FieldsEditing(ActionKind::Single));

        if let ParamFields::Delay(secs) = editor.single_mut().unwrap().params_mut() {
            secs.set("1.5");
        }
        assert_eq!(editor.phase(), Phase::Ready(ActionKind::Single));
    }

    #[test]
    fn failed_validation_is_reported_until_next_edit() {
        let mut editor = ActionEditor::new();
        editor.choose_kind(ActionKind::Chain);
        let err = editor.validate().unwrap_err();
        assert_eq!(err.path, "id");
        assert!(matches!(editor.phase(), Phase::Invalid(_)));

        editor.set_id("empty-chain");
        assert_eq!(editor.phase(), Phase::Ready(ActionKind::Chain));
    }

    #[test]
    fn load_sets_type_and_requests_lookups() {
        let (editor, lookups) = ActionEditor::load("greet", &Action::Chain(vec![delay(2.0), smile()]));
        assert_eq!(editor.kind(), Some(ActionKind::Chain));
        assert_eq!(lookups.len(), 1);
        assert_eq!(lookups[0].slot, Slot::Element(1));
        assert_eq!(lookups[0].id, "abc");
        assert_eq!(editor.phase(), Phase::TypeChosen(ActionKind::Chain));
        assert!(!editor.is_settled());
    }

    #[test]
    fn ready_waits_for_every_lookup() {
        let cond = Condition::new(PluginQuery::Avatar(crate::plugins::AvatarQuery::ActiveModelId), "m1");
        let (mut editor, lookups) =
            ActionEditor::load("check", &Action::If(cond, Box::new(smile()), None));
        assert_eq!(lookups.len(), 1);
        assert_ne!(editor.phase(), Phase::Ready(ActionKind::If));

        let outcome = editor.apply_lookup(&lookups[0], Ok("Fox".into()));
        assert_eq!(outcome, LookupOutcome::Applied);
        assert_eq!(editor.phase(), Phase::Ready(ActionKind::If));
    }

    #[test]
    fn failed_lookup_does_not_block_other_fields() {
        let (mut editor, lookups) = ActionEditor::load(
            "pair",
            &Action::Chain(vec![
                smile(),
                Action::Single(PluginAction::Avatar(AvatarAction::LoadModel("m1".into()))),
            ]),
        );
        let err = ResolveError::BackendUnavailable {
            namespace: Namespace::Avatar,
            reason: "offline".into(),
        };
        assert!(matches!(
            editor.apply_lookup(&lookups[0], Err(err)),
            LookupOutcome::Failed(_)
        ));
        assert!(!editor.is_settled());
        assert_eq!(
            editor.apply_lookup(&lookups[1], Ok("Fox".into())),
            LookupOutcome::Applied
        );
        assert!(editor.is_settled());
        assert_eq!(editor.check().unwrap_err().path, "chain[0].target");
    }

    #[test]
    fn lookups_from_before_a_type_change_are_stale() {
        let (mut editor, lookups) = ActionEditor::load("one", &smile());
        editor.choose_kind(ActionKind::Chain);
        editor.choose_kind(ActionKind::Single);
        assert_eq!(
            editor.apply_lookup(&lookups[0], Ok("Smile".into())),
            LookupOutcome::Stale
        );
        let draft = match editor.draft() {
            Draft::Single(draft) => draft,
            other => panic!("unexpected draft {other:?}"),
        };
        assert_eq!(draft.namespace(), None);
    }

    #[test]
    fn type_change_clears_numeric_position_fields() {
        let mut editor = ActionEditor::new();
        editor.choose_kind(ActionKind::Single);
        let draft = editor.single_mut().unwrap();
        draft.set_namespace(Namespace::Avatar);
        draft
            .set_command(CommandKind::Avatar(AvatarActionKind::MoveModel))
            .unwrap();
        assert!(matches!(draft.params(), ParamFields::Position(_)));

        editor.choose_kind(ActionKind::If);
        editor.choose_kind(ActionKind::Single);
        let draft = editor.single_mut().unwrap();
        assert_eq!(draft.params(), &ParamFields::Nothing);
        draft.set_namespace(Namespace::Streaming);
        draft
            .set_command(CommandKind::Streaming(
                crate::plugins::StreamingActionKind::ProgramSceneChange,
            ))
            .unwrap();
        assert!(matches!(draft.params(), ParamFields::Target(_)));
    }

    #[test]
    fn excluded_ids_cover_original_and_renamed() {
        let (mut editor, _) = ActionEditor::load("x", &delay(1.0));
        assert_eq!(editor.excluded_ids(), vec!["x"]);
        assert!(!editor.is_rename());
        editor.set_id("y");
        assert_eq!(editor.excluded_ids(), vec!["x", "y"]);
        assert!(editor.is_rename());
    }

    #[test]
    fn is_recording_condition_survives_load() {
        let cond = Condition::new(PluginQuery::Streaming(StreamingQuery::IsRecording), "false");
        let (editor, lookups) = ActionEditor::load("rec", &Action::If(cond, Box::new(delay(1.0)), None));
        assert!(lookups.is_empty());
        match editor.draft() {
            Draft::If(draft) => {
                assert_eq!(draft.condition.target(), &ConditionTarget::Flag(Some(false)));
                assert_eq!(draft.else_choice(), &BranchChoice::Nothing);
            }
            other => panic!("unexpected draft {other:?}"),
        }
    }

    #[test]
    fn asking_for_another_draft_kind_is_not_an_edit() {
        let mut editor = ActionEditor::new();
        editor.choose_kind(ActionKind::Single);
        assert!(editor.chain_mut().is_none());
        assert!(editor.if_mut().is_none());
        assert_eq!(editor.phase(), Phase::TypeChosen(ActionKind::Single));

        assert!(editor.validate().is_err());
        assert!(editor.chain_mut().is_none());
        assert!(matches!(editor.phase(), Phase::Invalid(_)));
    }

    #[tokio::test]
    async fn copied_branch_that_fails_validation_marks_the_editor_invalid() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = crate::store::ActionDb::open(&dir.path().join("actions.redb")).unwrap();
        db.put("bad", &delay(-1.0), false).unwrap();
        let names = crate::resolver::CatalogResolver::new(
            crate::resolver::Catalog::default(),
            vec![Namespace::Streaming],
        );

        let mut editor = ActionEditor::new();
        editor.choose_kind(ActionKind::If);
        editor.set_id("guard");
        let draft = editor.if_mut().unwrap();
        draft
            .condition
            .set_query(PluginQuery::Streaming(StreamingQuery::IsRecording));
        *draft.condition.target_mut() = ConditionTarget::Flag(Some(true));
        draft.set_then(BranchChoice::Existing("bad".into())).unwrap();
        assert_eq!(editor.phase(), Phase::Ready(ActionKind::If));

        let err = editor.materialize(&names, &db).await.unwrap_err();
        assert!(err.to_string().contains("delay"), "{err}");
        match editor.phase() {
            Phase::Invalid(message) => assert!(message.contains("delay"), "{message}"),
            other => panic!("expected invalid phase, got {other:?}"),
        }
    }
}
