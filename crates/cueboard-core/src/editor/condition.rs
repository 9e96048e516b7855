//! Editing a conditional: the condition and the two branches.

use crate::action::{Action, Condition};
use crate::error::{CueError, ValidationError};
use crate::plugins::PluginQuery;
use crate::resolver::NameResolver;
use crate::store::ActionStore;
use crate::types::QueryShape;

use super::fields::PickerField;

// ---------------------------------------------------------------------------
// ConditionDraft
// ---------------------------------------------------------------------------

/// The expected value, shaped by the chosen query.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionTarget {
    /// No query chosen yet.
    None,
    /// Identity query: pick the expected target by name.
    Picker(PickerField),
    /// Flag query: `true`, `false`, or not yet chosen.
    Flag(Option<bool>),
    /// Free-form expected value.
    Text(String),
}

impl ConditionTarget {
    fn blank(query: PluginQuery) -> Self {
        match query.shape() {
            QueryShape::Identity(kind) => Self::Picker(PickerField::new(query.namespace(), kind)),
            QueryShape::Flag => Self::Flag(None),
            QueryShape::Text => Self::Text(String::new()),
        }
    }

    fn loaded(condition: &Condition) -> Self {
        match condition.query.shape() {
            QueryShape::Identity(kind) => Self::Picker(PickerField::loading(
                condition.query.namespace(),
                kind,
                &condition.target,
            )),
            QueryShape::Flag => Self::Flag(match condition.target.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            }),
            QueryShape::Text => Self::Text(condition.target.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionDraft {
    query: Option<PluginQuery>,
    target: ConditionTarget,
}

impl Default for ConditionDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionDraft {
    pub fn new() -> Self {
        Self {
            query: None,
            target: ConditionTarget::None,
        }
    }

    pub(crate) fn loaded(condition: &Condition) -> Self {
        Self {
            query: Some(condition.query),
            target: ConditionTarget::loaded(condition),
        }
    }

    pub fn query(&self) -> Option<PluginQuery> {
        self.query
    }

    pub fn target(&self) -> &ConditionTarget {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut ConditionTarget {
        &mut self.target
    }

    /// Choosing a different query (or namespace) resets the expected value.
    pub fn set_query(&mut self, query: PluginQuery) {
        if self.query == Some(query) {
            return;
        }
        self.query = Some(query);
        self.target = ConditionTarget::blank(query);
    }

    pub fn picker(&self) -> Option<&PickerField> {
        match &self.target {
            ConditionTarget::Picker(picker) => Some(picker),
            _ => None,
        }
    }

    pub fn picker_mut(&mut self) -> Option<&mut PickerField> {
        match &mut self.target {
            ConditionTarget::Picker(picker) => Some(picker),
            _ => None,
        }
    }

    pub fn check(&self) -> Result<(), ValidationError> {
        if self.query.is_none() {
            return Err(ValidationError::new("query", "choose what to check"));
        }
        match &self.target {
            ConditionTarget::None => Err(ValidationError::new("query", "choose what to check")),
            ConditionTarget::Picker(picker) => picker.check("target"),
            ConditionTarget::Flag(None) => {
                Err(ValidationError::new("target", "choose true or false"))
            }
            ConditionTarget::Flag(Some(_)) | ConditionTarget::Text(_) => Ok(()),
        }
    }

    pub async fn materialize(
        &self,
        resolver: &dyn NameResolver,
    ) -> Result<Condition, ValidationError> {
        self.check()?;
        let query = self
            .query
            .ok_or_else(|| ValidationError::new("query", "choose what to check"))?;
        let target = match &self.target {
            ConditionTarget::Picker(picker) => picker.resolve_id("target", resolver).await?,
            // Flags persist as the strings "true" / "false".
            ConditionTarget::Flag(flag) => flag.unwrap_or_default().to_string(),
            ConditionTarget::Text(text) => text.clone(),
            ConditionTarget::None => String::new(),
        };
        let condition = Condition::new(query, target);
        condition.validate()?;
        Ok(condition)
    }
}

// ---------------------------------------------------------------------------
// Branches
// ---------------------------------------------------------------------------

/// What a branch of a conditional runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchChoice {
    /// Nothing chosen. Only valid for `else`, where it means do nothing.
    Unset,
    /// Run nothing. Only offered for `else`.
    Nothing,
    /// Keep the subtree the loaded action had here.
    KeepOriginal,
    /// Copy the stored action with this ID at save time.
    Existing(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfDraft {
    pub condition: ConditionDraft,
    then_choice: BranchChoice,
    else_choice: BranchChoice,
    original_then: Option<Box<Action>>,
    original_else: Option<Box<Action>>,
}

impl Default for IfDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl IfDraft {
    pub fn new() -> Self {
        Self {
            condition: ConditionDraft::new(),
            then_choice: BranchChoice::Unset,
            else_choice: BranchChoice::Nothing,
            original_then: None,
            original_else: None,
        }
    }

    pub(crate) fn loaded(
        condition: &Condition,
        then: &Action,
        otherwise: Option<&Action>,
    ) -> Self {
        Self {
            condition: ConditionDraft::loaded(condition),
            then_choice: BranchChoice::KeepOriginal,
            else_choice: if otherwise.is_some() {
                BranchChoice::KeepOriginal
            } else {
                BranchChoice::Nothing
            },
            original_then: Some(Box::new(then.clone())),
            original_else: otherwise.map(|a| Box::new(a.clone())),
        }
    }

    pub fn then_choice(&self) -> &BranchChoice {
        &self.then_choice
    }

    pub fn else_choice(&self) -> &BranchChoice {
        &self.else_choice
    }

    pub fn original_then(&self) -> Option<&Action> {
        self.original_then.as_deref()
    }

    pub fn original_else(&self) -> Option<&Action> {
        self.original_else.as_deref()
    }

    pub fn set_then(&mut self, choice: BranchChoice) -> Result<(), ValidationError> {
        match &choice {
            BranchChoice::Nothing => {
                return Err(ValidationError::new(
                    "then",
                    "the then branch must run an action",
                ))
            }
            BranchChoice::KeepOriginal if self.original_then.is_none() => {
                return Err(ValidationError::new("then", "there is no original action to keep"))
            }
            _ => {}
        }
        self.then_choice = choice;
        Ok(())
    }

    pub fn set_else(&mut self, choice: BranchChoice) -> Result<(), ValidationError> {
        if choice == BranchChoice::KeepOriginal && self.original_else.is_none() {
            return Err(ValidationError::new("else", "there is no original action to keep"));
        }
        self.else_choice = choice;
        Ok(())
    }

    /// IDs chosen for either branch.
    pub fn chosen_ids(&self) -> Vec<&str> {
        [&self.then_choice, &self.else_choice]
            .into_iter()
            .filter_map(|c| match c {
                BranchChoice::Existing(id) => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// `editing` lists the IDs the action being edited is known by.
    pub fn check(&self, editing: &[&str]) -> Result<(), ValidationError> {
        self.condition.check().map_err(|e| e.nested("condition"))?;
        if self.then_choice == BranchChoice::Unset {
            return Err(ValidationError::new(
                "then",
                "choose an action to run when the condition holds",
            ));
        }
        check_not_self("then", &self.then_choice, editing)?;
        check_not_self("else", &self.else_choice, editing)
    }

    pub(crate) async fn materialize(
        &self,
        editing: &[&str],
        resolver: &dyn NameResolver,
        store: &dyn ActionStore,
    ) -> Result<Action, CueError> {
        self.check(editing)?;
        let condition = self
            .condition
            .materialize(resolver)
            .await
            .map_err(|e| e.nested("condition"))?;
        let then = match self.branch("then", &self.then_choice, &self.original_then, store).await? {
            Some(action) => action,
            None => {
                return Err(ValidationError::new(
                    "then",
                    "choose an action to run when the condition holds",
                )
                .into())
            }
        };
        let otherwise = self
            .branch("else", &self.else_choice, &self.original_else, store)
            .await?;
        Ok(Action::If(condition, Box::new(then), otherwise.map(Box::new)))
    }

    async fn branch(
        &self,
        path: &str,
        choice: &BranchChoice,
        original: &Option<Box<Action>>,
        store: &dyn ActionStore,
    ) -> Result<Option<Action>, CueError> {
        match choice {
            BranchChoice::Unset | BranchChoice::Nothing => Ok(None),
            BranchChoice::KeepOriginal => Ok(original.as_deref().cloned()),
            BranchChoice::Existing(id) => match store.load_action(id).await {
                Ok(action) => Ok(Some(action)),
                Err(CueError::ActionNotFound(_)) => Err(ValidationError::new(
                    path,
                    format!("action '{id}' no longer exists"),
                )
                .into()),
                Err(e) => Err(e),
            },
        }
    }
}

fn check_not_self(
    path: &str,
    choice: &BranchChoice,
    editing: &[&str],
) -> Result<(), ValidationError> {
    match choice {
        BranchChoice::Existing(id) if editing.contains(&id.as_str()) => Err(
            ValidationError::new(path, format!("'{id}' cannot contain itself")),
        ),
        _ => Ok(()),
    }
}
