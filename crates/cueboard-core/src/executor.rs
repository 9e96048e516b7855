//! Running stored actions.
//!
//! Execution is fire-and-forget from the editor's side: the caller only
//! learns whether the run was accepted. [`DryRun`] walks the action and
//! reports the steps it would take without contacting any plugin.

use async_trait::async_trait;
use tracing::info;

use crate::action::Action;
use crate::error::{CueError, Result};
use crate::store::ActionStore;

#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute_action(&self, id: &str) -> Result<()>;
}

/// Step-by-step outline of an action, one line per step, indented by depth.
pub fn plan(action: &Action) -> Vec<String> {
    let mut steps = Vec::new();
    walk(action, 0, &mut steps);
    steps
}

fn walk(action: &Action, depth: usize, steps: &mut Vec<String>) {
    let pad = "  ".repeat(depth);
    match action {
        Action::Single(single) => steps.push(format!("{pad}{single}")),
        Action::Chain(actions) => {
            if actions.is_empty() {
                steps.push(format!("{pad}(nothing)"));
            }
            for action in actions {
                walk(action, depth, steps);
            }
        }
        Action::If(condition, then, otherwise) => {
            steps.push(format!("{pad}{condition}:"));
            walk(then, depth + 1, steps);
            if let Some(otherwise) = otherwise {
                steps.push(format!("{pad}Otherwise:"));
                walk(otherwise, depth + 1, steps);
            }
        }
    }
}

/// Loads the action and logs its plan.
pub struct DryRun<S> {
    store: S,
}

impl<S: ActionStore> DryRun<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn plan_for(&self, id: &str) -> Result<Vec<String>> {
        let action = self.store.load_action(id).await?;
        action
            .validate()
            .map_err(|e| CueError::Execution(format!("'{id}' is not runnable: {e}")))?;
        Ok(plan(&action))
    }
}

#[async_trait]
impl<S: ActionStore> ActionExecutor for DryRun<S> {
    async fn execute_action(&self, id: &str) -> Result<()> {
        for step in self.plan_for(id).await? {
            info!(action = id, "{step}");
        }
        Ok(())
    }
}
