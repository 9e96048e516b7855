//! Human-readable previews with opaque IDs replaced by display names.

use std::collections::BTreeMap;

use crate::action::Action;
use crate::error::ResolveError;
use crate::resolver::NameResolver;
use crate::types::{Namespace, TargetKind};

type Names = BTreeMap<(Namespace, TargetKind, String), String>;

/// Describe `action`, resolving every ID the description shows. The first
/// failed lookup fails the whole preview.
pub async fn describe(action: &Action, resolver: &dyn NameResolver) -> Result<String, ResolveError> {
    let mut names = Names::new();
    for (namespace, kind, id) in shown_targets(action) {
        let key = (namespace, kind, id);
        if names.contains_key(&key) {
            continue;
        }
        let name = resolver.resolve_name(namespace, kind, &key.2).await?;
        names.insert(key, name);
    }
    Ok(action.render(&names))
}

/// The IDs [`Action::render`] prints. Chains are summarised by length, so
/// their elements need no lookups.
fn shown_targets(action: &Action) -> Vec<(Namespace, TargetKind, String)> {
    match action {
        Action::Single(_) => action.targets(),
        Action::Chain(_) => Vec::new(),
        Action::If(condition, then, otherwise) => {
            let mut out = Vec::new();
            if let Some((ns, kind, id)) = condition.target_ref() {
                out.push((ns, kind, id.to_string()));
            }
            out.extend(shown_targets(then));
            if let Some(otherwise) = otherwise {
                out.extend(shown_targets(otherwise));
            }
            out
        }
    }
}
