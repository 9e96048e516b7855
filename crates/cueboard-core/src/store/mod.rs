//! The action store contract.
//!
//! The store is the authority for saved actions. Every call may suspend, and
//! the editor never assumes two calls are atomic together.

pub mod db;

use async_trait::async_trait;
use std::sync::Arc;

use crate::action::Action;
use crate::error::Result;

pub use db::ActionDb;

#[async_trait]
pub trait ActionStore: Send + Sync {
    /// Fails with `ActionNotFound` when no action is stored under `id`.
    async fn load_action(&self, id: &str) -> Result<Action>;

    /// Store `action` under `id`. Without `overwrite`, an existing entry
    /// fails the call with `ActionExists` and is left untouched. With it, the
    /// entry is replaced whole.
    async fn save_action(&self, id: &str, action: &Action, overwrite: bool) -> Result<()>;

    /// Fails with `ActionNotFound` when no action is stored under `id`.
    async fn delete_action(&self, id: &str) -> Result<()>;

    /// Stored IDs in ascending order.
    async fn list_action_ids(&self) -> Result<Vec<String>>;
}

#[async_trait]
impl<S: ActionStore + ?Sized> ActionStore for Arc<S> {
    async fn load_action(&self, id: &str) -> Result<Action> {
        (**self).load_action(id).await
    }

    async fn save_action(&self, id: &str, action: &Action, overwrite: bool) -> Result<()> {
        (**self).save_action(id, action, overwrite).await
    }

    async fn delete_action(&self, id: &str) -> Result<()> {
        (**self).delete_action(id).await
    }

    async fn list_action_ids(&self) -> Result<Vec<String>> {
        (**self).list_action_ids().await
    }
}
