//! Ordered editing over the elements of a chain.
//!
//! Elements that are single commands stay editable (their pickers show
//! names); anything else is held as a copy and shown through an
//! asynchronously built preview.

use crate::action::Action;
use crate::editor::fields::LookupOutcome;
use crate::editor::single::SingleDraft;
use crate::error::{ResolveError, ValidationError};
use crate::resolver::NameResolver;

#[derive(Debug, Clone, PartialEq)]
pub enum ElementBody {
    Single(SingleDraft),
    Copy(Action),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// Not yet available.
    Pending,
    Ready(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainElement {
    key: u64,
    body: ElementBody,
    preview: Preview,
    preview_generation: u64,
}

impl ChainElement {
    /// Stable for the element's lifetime, unaffected by reordering.
    pub fn key(&self) -> u64 {
        self.key
    }

    pub fn body(&self) -> &ElementBody {
        &self.body
    }

    pub fn single_mut(&mut self) -> Option<&mut SingleDraft> {
        match &mut self.body {
            ElementBody::Single(draft) => Some(draft),
            ElementBody::Copy(_) => None,
        }
    }

    /// Display text: the preview for copies, the field summary for singles.
    pub fn preview(&self) -> Preview {
        match &self.body {
            ElementBody::Single(draft) if draft.is_settled() => Preview::Ready(draft.summary()),
            ElementBody::Single(_) => Preview::Pending,
            ElementBody::Copy(_) => self.preview.clone(),
        }
    }
}

/// A preview the builder is waiting for.
#[derive(Debug, Clone)]
pub struct PreviewRequest {
    pub key: u64,
    pub generation: u64,
    pub action: Action,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainBuilder {
    elements: Vec<ChainElement>,
    next_key: u64,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_actions(actions: &[Action]) -> Self {
        let mut builder = Self::new();
        for action in actions {
            builder.push(action.clone());
        }
        builder
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[ChainElement] {
        &self.elements
    }

    pub fn element_mut(&mut self, key: u64) -> Option<&mut ChainElement> {
        self.elements.iter_mut().find(|e| e.key == key)
    }

    fn element(&mut self, action: Action) -> ChainElement {
        let key = self.next_key;
        self.next_key += 1;
        let body = match action {
            Action::Single(single) => ElementBody::Single(SingleDraft::loaded(&single)),
            other => ElementBody::Copy(other),
        };
        ChainElement {
            key,
            body,
            preview: Preview::Pending,
            preview_generation: 0,
        }
    }

    /// Append and return the new element's key.
    pub fn push(&mut self, action: Action) -> u64 {
        let element = self.element(action);
        let key = element.key;
        self.elements.push(element);
        key
    }

    /// Append a blank command for the user to fill in.
    pub fn push_draft(&mut self, draft: SingleDraft) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        self.elements.push(ChainElement {
            key,
            body: ElementBody::Single(draft),
            preview: Preview::Pending,
            preview_generation: 0,
        });
        key
    }

    pub fn insert_at(&mut self, index: usize, action: Action) -> Result<u64, ValidationError> {
        if index > self.elements.len() {
            return Err(out_of_range(index, self.elements.len() + 1));
        }
        let element = self.element(action);
        let key = element.key;
        self.elements.insert(index, element);
        Ok(key)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<ChainElement, ValidationError> {
        if index >= self.elements.len() {
            return Err(out_of_range(index, self.elements.len()));
        }
        Ok(self.elements.remove(index))
    }

    /// Take the element at `from` out, then put it back at `to`.
    ///
    /// On `[A, B, C, D]`, `move_to(0, 2)` gives `[B, C, A, D]`.
    pub fn move_to(&mut self, from: usize, to: usize) -> Result<(), ValidationError> {
        let len = self.elements.len();
        if from >= len {
            return Err(out_of_range(from, len));
        }
        if to >= len {
            return Err(out_of_range(to, len));
        }
        if from == to {
            return Ok(());
        }
        let element = self.elements.remove(from);
        self.elements.insert(to, element);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Previews
    // -----------------------------------------------------------------------

    /// Copies whose preview is not yet available.
    pub fn pending_previews(&self) -> Vec<PreviewRequest> {
        self.elements
            .iter()
            .filter_map(|e| match (&e.body, &e.preview) {
                (ElementBody::Copy(action), Preview::Pending) => Some(PreviewRequest {
                    key: e.key,
                    generation: e.preview_generation,
                    action: action.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Drop the current preview and ask for a new one.
    pub fn refresh_preview(&mut self, key: u64) {
        if let Some(element) = self.element_mut(key) {
            element.preview_generation += 1;
            element.preview = Preview::Pending;
        }
    }

    /// Accept a preview unless its element was removed or re-requested since.
    pub fn apply_preview(
        &mut self,
        key: u64,
        generation: u64,
        result: Result<String, ResolveError>,
    ) -> LookupOutcome {
        let Some(element) = self.element_mut(key) else {
            return LookupOutcome::Stale;
        };
        if element.preview_generation != generation || element.preview != Preview::Pending {
            return LookupOutcome::Stale;
        }
        match result {
            Ok(text) => {
                element.preview = Preview::Ready(text);
                LookupOutcome::Applied
            }
            Err(e) => {
                let message = e.to_string();
                element.preview = Preview::Failed(message.clone());
                LookupOutcome::Failed(message)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Validation and output
    // -----------------------------------------------------------------------

    pub fn is_settled(&self) -> bool {
        self.elements.iter().all(|e| match &e.body {
            ElementBody::Single(draft) => draft.is_settled(),
            ElementBody::Copy(_) => true,
        })
    }

    pub fn check(&self) -> Result<(), ValidationError> {
        for (i, element) in self.elements.iter().enumerate() {
            let checked = match &element.body {
                ElementBody::Single(draft) => draft.check(),
                ElementBody::Copy(action) => action.validate(),
            };
            checked.map_err(|e| e.nested(&format!("[{i}]")).nested("chain"))?;
        }
        Ok(())
    }

    pub async fn materialize(&self, resolver: &dyn NameResolver) -> Result<Action, ValidationError> {
        let mut actions = Vec::with_capacity(self.elements.len());
        for (i, element) in self.elements.iter().enumerate() {
            let action = match &element.body {
                ElementBody::Single(draft) => draft.materialize(resolver).await.map(Action::Single),
                ElementBody::Copy(action) => Ok(action.clone()),
            }
            .map_err(|e| e.nested(&format!("[{i}]")).nested("chain"))?;
            actions.push(action);
        }
        Ok(Action::Chain(actions))
    }

    /// Stored IDs that may be offered for copying into the chain, with the
    /// action being edited left out.
    pub fn offer_existing(ids: &[String], editing: &[&str]) -> Vec<String> {
        ids.iter()
            .filter(|id| !editing.contains(&id.as_str()))
            .cloned()
            .collect()
    }
}

fn out_of_range(index: usize, len: usize) -> ValidationError {
    ValidationError::new(
        format!("[{index}]"),
        format!("position out of range (chain has {len} slots)"),
    )
    .nested("chain")
}
