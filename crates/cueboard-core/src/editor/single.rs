//! Editing one plugin command.

use crate::error::ValidationError;
use crate::plugins::{
    validate_params, CommandKind, MoveModelInput, Params, PluginAction, RestoreModelInput,
    DURATION_RANGE, ROTATION_RANGE, SIZE_RANGE,
};
use crate::resolver::NameResolver;
use crate::types::{Namespace, ParamShape};

use super::fields::{NumericField, PickerField, PickerState, ANY_FINITE, NON_NEGATIVE};

#[derive(Debug, Clone, PartialEq)]
pub struct CommandLineFields {
    pub command: String,
    pub args: Vec<String>,
    /// `None` when no working directory is set.
    pub dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionFields {
    pub x: NumericField,
    pub y: NumericField,
    pub rotation: NumericField,
    pub size: NumericField,
    pub time_sec: NumericField,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestoreFields {
    pub var_id: String,
    pub time_sec: NumericField,
}

/// Editable parameters, one variant per [`ParamShape`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParamFields {
    Nothing,
    Target(PickerField),
    Delay(NumericField),
    CommandLine(CommandLineFields),
    Position(PositionFields),
    Variable(String),
    Restore(RestoreFields),
}

impl ParamFields {
    /// Empty fields for a freshly chosen command.
    pub fn blank(namespace: Namespace, shape: ParamShape) -> Self {
        match shape {
            ParamShape::Nothing => Self::Nothing,
            ParamShape::Target(kind) => Self::Target(PickerField::new(namespace, kind)),
            ParamShape::Delay => Self::Delay(NumericField::new("delay", NON_NEGATIVE)),
            ParamShape::CommandLine => Self::CommandLine(CommandLineFields {
                command: String::new(),
                args: Vec::new(),
                dir: None,
            }),
            ParamShape::Position => Self::Position(PositionFields {
                x: NumericField::new("x", ANY_FINITE),
                y: NumericField::new("y", ANY_FINITE),
                rotation: NumericField::new("rotation", ROTATION_RANGE),
                size: NumericField::new("size", SIZE_RANGE),
                time_sec: NumericField::new("time_sec", DURATION_RANGE),
            }),
            ParamShape::Variable => Self::Variable(String::new()),
            ParamShape::Restore => Self::Restore(RestoreFields {
                var_id: String::new(),
                time_sec: NumericField::new("time_sec", DURATION_RANGE),
            }),
        }
    }

    /// Fields holding stored parameters. An opaque ID starts out resolving.
    fn loaded(action: &PluginAction) -> Self {
        let namespace = action.namespace();
        match action.params() {
            Params::Nothing => Self::Nothing,
            Params::Target(id) => match action.target() {
                Some((kind, _)) => Self::Target(PickerField::loading(namespace, kind, &id)),
                None => Self::Nothing,
            },
            Params::Delay(secs) => {
                Self::Delay(NumericField::with_value("delay", NON_NEGATIVE, secs))
            }
            Params::CommandLine { command, args, dir } => {
                Self::CommandLine(CommandLineFields { command, args, dir })
            }
            Params::Position(p) => Self::Position(PositionFields {
                x: NumericField::with_value("x", ANY_FINITE, p.x),
                y: NumericField::with_value("y", ANY_FINITE, p.y),
                rotation: NumericField::with_value("rotation", ROTATION_RANGE, p.rotation),
                size: NumericField::with_value("size", SIZE_RANGE, p.size),
                time_sec: NumericField::with_value("time_sec", DURATION_RANGE, p.time_sec),
            }),
            Params::Variable(var) => Self::Variable(var),
            Params::Restore(r) => Self::Restore(RestoreFields {
                var_id: r.var_id,
                time_sec: NumericField::with_value("time_sec", DURATION_RANGE, r.time_sec),
            }),
        }
    }

    pub fn picker(&self) -> Option<&PickerField> {
        match self {
            Self::Target(picker) => Some(picker),
            _ => None,
        }
    }

    pub fn picker_mut(&mut self) -> Option<&mut PickerField> {
        match self {
            Self::Target(picker) => Some(picker),
            _ => None,
        }
    }

    /// Turn the fields into parameters. Picker names are looked up as IDs;
    /// everything else is taken literally.
    async fn to_params(&self, resolver: &dyn NameResolver) -> Result<Params, ValidationError> {
        Ok(match self {
            Self::Nothing => Params::Nothing,
            Self::Target(picker) => Params::Target(picker.resolve_id("target", resolver).await?),
            Self::Delay(secs) => Params::Delay(secs.value()?),
            Self::CommandLine(c) => Params::CommandLine {
                command: c.command.clone(),
                args: c.args.clone(),
                dir: c.dir.clone(),
            },
            Self::Position(p) => Params::Position(MoveModelInput {
                x: p.x.value()?,
                y: p.y.value()?,
                rotation: p.rotation.value()?,
                size: p.size.value()?,
                time_sec: p.time_sec.value()?,
            }),
            Self::Variable(var) => Params::Variable(var.clone()),
            Self::Restore(r) => Params::Restore(RestoreModelInput {
                var_id: r.var_id.clone(),
                time_sec: r.time_sec.value()?,
            }),
        })
    }

    /// Everything that can be checked without a lookup.
    fn check(&self) -> Result<(), ValidationError> {
        let literal = match self {
            Self::Nothing => return Ok(()),
            Self::Target(picker) => return picker.check("target"),
            Self::Delay(secs) => Params::Delay(secs.value()?),
            Self::CommandLine(c) => Params::CommandLine {
                command: c.command.clone(),
                args: c.args.clone(),
                dir: c.dir.clone(),
            },
            Self::Position(p) => Params::Position(MoveModelInput {
                x: p.x.value()?,
                y: p.y.value()?,
                rotation: p.rotation.value()?,
                size: p.size.value()?,
                time_sec: p.time_sec.value()?,
            }),
            Self::Variable(var) => Params::Variable(var.clone()),
            Self::Restore(r) => Params::Restore(RestoreModelInput {
                var_id: r.var_id.clone(),
                time_sec: r.time_sec.value()?,
            }),
        };
        validate_params(&literal)
    }
}

// ---------------------------------------------------------------------------
// SingleDraft
// ---------------------------------------------------------------------------

/// A single command being edited: namespace, then command, then parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleDraft {
    namespace: Option<Namespace>,
    command: Option<CommandKind>,
    params: ParamFields,
}

impl Default for SingleDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl SingleDraft {
    pub fn new() -> Self {
        Self {
            namespace: None,
            command: None,
            params: ParamFields::Nothing,
        }
    }

    pub(crate) fn loaded(action: &PluginAction) -> Self {
        Self {
            namespace: Some(action.namespace()),
            command: Some(action.kind()),
            params: ParamFields::loaded(action),
        }
    }

    pub fn namespace(&self) -> Option<Namespace> {
        self.namespace
    }

    pub fn command(&self) -> Option<CommandKind> {
        self.command
    }

    pub fn params(&self) -> &ParamFields {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParamFields {
        &mut self.params
    }

    /// Choosing a different namespace drops the command and its fields.
    pub fn set_namespace(&mut self, namespace: Namespace) {
        if self.namespace == Some(namespace) {
            return;
        }
        self.namespace = Some(namespace);
        self.command = None;
        self.params = ParamFields::Nothing;
    }

    /// Choosing a different command replaces its fields with blank ones.
    pub fn set_command(&mut self, command: CommandKind) -> Result<(), ValidationError> {
        if self.namespace != Some(command.namespace()) {
            return Err(ValidationError::new(
                "command",
                format!("{command} is not a command of the chosen namespace"),
            ));
        }
        if self.command == Some(command) {
            return Ok(());
        }
        self.command = Some(command);
        self.params = ParamFields::blank(command.namespace(), command.shape());
        Ok(())
    }

    pub fn check(&self) -> Result<(), ValidationError> {
        if self.namespace.is_none() {
            return Err(ValidationError::new("namespace", "choose a plugin"));
        }
        if self.command.is_none() {
            return Err(ValidationError::new("command", "choose a command"));
        }
        self.params.check()
    }

    pub fn is_settled(&self) -> bool {
        self.params.picker().map_or(true, PickerField::is_settled)
    }

    pub async fn materialize(
        &self,
        resolver: &dyn NameResolver,
    ) -> Result<PluginAction, ValidationError> {
        self.check()?;
        let command = self
            .command
            .ok_or_else(|| ValidationError::new("command", "choose a command"))?;
        let params = self.params.to_params(resolver).await?;
        command.build(params)
    }

    /// One-line description using the names shown in the fields.
    pub fn summary(&self) -> String {
        let Some(command) = self.command else {
            return "(no command chosen)".to_string();
        };
        let shown = match &self.params {
            ParamFields::Target(picker) => match picker.state() {
                PickerState::Selected(name) => name.clone(),
                PickerState::Resolving { id }
                | PickerState::Unresolved { id, .. } => id.clone(),
                PickerState::Unset => "?".to_string(),
            },
            ParamFields::Nothing => return command.to_string(),
            ParamFields::Delay(secs) => format!("{} s", secs.raw()),
            ParamFields::CommandLine(c) => c.command.clone(),
            ParamFields::Position(p) => format!("({}, {})", p.x.raw(), p.y.raw()),
            ParamFields::Variable(var) => var.clone(),
            ParamFields::Restore(r) => r.var_id.clone(),
        };
        format!("{command}: {shown}")
    }
}
