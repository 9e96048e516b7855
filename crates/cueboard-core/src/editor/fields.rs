//! Individual editor fields.

use std::ops::RangeInclusive;

use crate::error::{ResolveError, ValidationError};
use crate::plugins::check_range;
use crate::resolver::NameResolver;
use crate::types::{Namespace, TargetKind};

// ---------------------------------------------------------------------------
// NumericField
// ---------------------------------------------------------------------------

/// Free text that must parse to a finite number inside `range`.
///
/// Invalid text is kept as typed; the value is never clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericField {
    path: &'static str,
    raw: String,
    range: RangeInclusive<f64>,
}

impl NumericField {
    pub fn new(path: &'static str, range: RangeInclusive<f64>) -> Self {
        Self {
            path,
            raw: String::new(),
            range,
        }
    }

    pub fn with_value(path: &'static str, range: RangeInclusive<f64>, value: f64) -> Self {
        Self {
            path,
            raw: value.to_string(),
            range,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn set(&mut self, raw: impl Into<String>) {
        self.raw = raw.into();
    }

    pub fn value(&self) -> Result<f64, ValidationError> {
        let text = self.raw.trim();
        if text.is_empty() {
            return Err(ValidationError::new(self.path, "a number is required"));
        }
        let value: f64 = text
            .parse()
            .map_err(|_| ValidationError::new(self.path, format!("'{text}' is not a number")))?;
        check_range(self.path, value, &self.range)?;
        Ok(value)
    }
}

/// Any finite number.
pub const ANY_FINITE: RangeInclusive<f64> = f64::MIN..=f64::MAX;
/// Any finite number not below zero.
pub const NON_NEGATIVE: RangeInclusive<f64> = 0.0..=f64::MAX;

// ---------------------------------------------------------------------------
// PickerField
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerState {
    Unset,
    /// A stored ID whose display name is being looked up.
    Resolving { id: String },
    /// A display name chosen by the user or filled in by a lookup.
    Selected(String),
    /// The lookup for a stored ID failed. The field stays unselected.
    Unresolved { id: String, message: String },
}

/// What happened to a lookup result handed back to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Applied,
    /// The lookup failed; the message is for the user.
    Failed(String),
    /// The field moved on since the lookup was issued; the result is dropped.
    Stale,
}

/// Chooses one target by display name. Only names are held here; IDs are
/// looked up again when the action is built.
#[derive(Debug, Clone, PartialEq)]
pub struct PickerField {
    namespace: Namespace,
    kind: TargetKind,
    state: PickerState,
    generation: u64,
}

impl PickerField {
    pub fn new(namespace: Namespace, kind: TargetKind) -> Self {
        Self {
            namespace,
            kind,
            state: PickerState::Unset,
            generation: 0,
        }
    }

    /// A field showing a stored ID until its name arrives.
    pub(crate) fn loading(namespace: Namespace, kind: TargetKind, id: &str) -> Self {
        Self {
            namespace,
            kind,
            state: PickerState::Resolving { id: id.to_string() },
            generation: 0,
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn state(&self) -> &PickerState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn selected(&self) -> Option<&str> {
        match &self.state {
            PickerState::Selected(name) => Some(name),
            _ => None,
        }
    }

    /// The stored ID still waiting on a lookup, if any.
    pub fn resolving(&self) -> Option<&str> {
        match &self.state {
            PickerState::Resolving { id } => Some(id),
            _ => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self.state, PickerState::Resolving { .. })
    }

    pub fn select(&mut self, name: impl Into<String>) {
        self.generation += 1;
        self.state = PickerState::Selected(name.into());
    }

    pub fn clear(&mut self) {
        self.generation += 1;
        self.state = PickerState::Unset;
    }

    pub(crate) fn apply(
        &mut self,
        generation: u64,
        id: &str,
        result: Result<String, ResolveError>,
    ) -> LookupOutcome {
        if generation != self.generation || self.resolving() != Some(id) {
            return LookupOutcome::Stale;
        }
        match result {
            Ok(name) => {
                self.state = PickerState::Selected(name);
                LookupOutcome::Applied
            }
            Err(e) => {
                let message = e.to_string();
                self.state = PickerState::Unresolved {
                    id: id.to_string(),
                    message: message.clone(),
                };
                LookupOutcome::Failed(message)
            }
        }
    }

    pub(crate) fn check(&self, path: &str) -> Result<(), ValidationError> {
        match &self.state {
            PickerState::Selected(_) => Ok(()),
            PickerState::Unset => Err(ValidationError::new(
                path,
                format!("choose a {} {}", self.namespace, self.kind),
            )),
            PickerState::Resolving { .. } => {
                Err(ValidationError::new(path, "still looking up the name"))
            }
            PickerState::Unresolved { message, .. } => {
                Err(ValidationError::new(path, message.clone()))
            }
        }
    }

    /// Look the chosen name up as an ID. Never submits the name itself.
    pub(crate) async fn resolve_id(
        &self,
        path: &str,
        resolver: &dyn NameResolver,
    ) -> Result<String, ValidationError> {
        self.check(path)?;
        let name = self.selected().unwrap_or_default();
        resolver
            .resolve_id(self.namespace, self.kind, name)
            .await
            .map_err(|e| ValidationError::new(path, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_keeps_bad_text_and_never_clamps() {
        let mut field = NumericField::new("rotation", -360.0..=360.0);
        field.set("400");
        let err = field.value().unwrap_err();
        assert_eq!(err.path, "rotation");
        assert_eq!(field.raw(), "400");

        field.set("abc");
        assert!(field.value().is_err());
        field.set("NaN");
        assert!(field.value().is_err());
        field.set("inf");
        assert!(field.value().is_err());

        field.set(" -360 ");
        assert_eq!(field.value().unwrap(), -360.0);
    }

    #[test]
    fn with_value_round_trips_exactly() {
        for v in [2.0, 0.1, 1.0 / 3.0, -42.5] {
            let field = NumericField::with_value("x", ANY_FINITE, v);
            assert_eq!(field.value().unwrap(), v);
        }
    }

    #[test]
    fn picker_drops_results_after_user_changes_it() {
        let mut picker = PickerField::loading(Namespace::Avatar, TargetKind::Expression, "abc");
        let issued = picker.generation();
        picker.select("Frown");
        let outcome = picker.apply(issued, "abc", Ok("Smile".into()));
        assert_eq!(outcome, LookupOutcome::Stale);
        assert_eq!(picker.selected(), Some("Frown"));
    }

    #[test]
    fn failed_lookup_leaves_field_unselected() {
        let mut picker = PickerField::loading(Namespace::Streaming, TargetKind::Scene, "s9");
        let outcome = picker.apply(
            0,
            "s9",
            Err(ResolveError::NotFound {
                namespace: Namespace::Streaming,
                kind: TargetKind::Scene,
                key: "s9".into(),
            }),
        );
        assert!(matches!(outcome, LookupOutcome::Failed(_)));
        assert!(picker.is_settled());
        assert!(picker.selected().is_none());
        assert_eq!(
            picker.check("target").unwrap_err().reason,
            "Streaming scene not found: s9"
        );
    }
}
