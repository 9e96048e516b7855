//! Translation between opaque IDs and display names.
//!
//! Every call is asynchronous and may fail with [`ResolveError`]. Results are
//! never cached: `list_names` in particular is always fetched fresh so pick
//! lists reflect the backend as it is now.

pub mod catalog;

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::error::ResolveError;
use crate::notice::Notice;
use crate::types::{Namespace, TargetKind};

pub use catalog::{Catalog, CatalogEntry, CatalogResolver};

/// Bidirectional ID/name lookup. Implementations must be idempotent and
/// free of side effects.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Display name for an opaque ID.
    async fn resolve_name(
        &self,
        namespace: Namespace,
        kind: TargetKind,
        id: &str,
    ) -> Result<String, ResolveError>;

    /// Opaque ID for a display name.
    async fn resolve_id(
        &self,
        namespace: Namespace,
        kind: TargetKind,
        name: &str,
    ) -> Result<String, ResolveError>;

    /// Every display name currently offered for this target kind.
    async fn list_names(
        &self,
        namespace: Namespace,
        kind: TargetKind,
    ) -> Result<Vec<String>, ResolveError>;
}

#[async_trait]
impl<R: NameResolver + ?Sized> NameResolver for Arc<R> {
    async fn resolve_name(
        &self,
        namespace: Namespace,
        kind: TargetKind,
        id: &str,
    ) -> Result<String, ResolveError> {
        (**self).resolve_name(namespace, kind, id).await
    }

    async fn resolve_id(
        &self,
        namespace: Namespace,
        kind: TargetKind,
        name: &str,
    ) -> Result<String, ResolveError> {
        (**self).resolve_id(namespace, kind, name).await
    }

    async fn list_names(
        &self,
        namespace: Namespace,
        kind: TargetKind,
    ) -> Result<Vec<String>, ResolveError> {
        (**self).list_names(namespace, kind).await
    }
}

// ---------------------------------------------------------------------------
// Slow-call advisory
// ---------------------------------------------------------------------------

/// Drive `fut` to completion, calling `on_slow` once if it is still pending
/// after `after`. The future is never cancelled or restarted.
pub async fn with_advisory<F, T>(after: Duration, fut: F, on_slow: impl FnOnce()) -> T
where
    F: Future<Output = T>,
{
    tokio::pin!(fut);
    tokio::select! {
        biased;
        out = &mut fut => return out,
        _ = tokio::time::sleep(after) => on_slow(),
    }
    fut.await
}

/// Wraps a resolver so that any call outliving `after` posts an advisory
/// notice while the call keeps running.
pub struct Watched<R> {
    inner: R,
    after: Duration,
    notices: UnboundedSender<Notice>,
}

impl<R: NameResolver> Watched<R> {
    pub fn new(inner: R, after: Duration, notices: UnboundedSender<Notice>) -> Self {
        Self {
            inner,
            after,
            notices,
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    fn advise(&self, namespace: Namespace, what: &str) {
        warn!(%namespace, call = what, after_ms = self.after.as_millis() as u64, "slow name lookup");
        let notice = Notice::advisory(format!(
            "{namespace} is taking a while to answer ({what}); \
             this may be waiting on a pending authorization"
        ));
        // A closed channel only means nobody is listening any more.
        let _ = self.notices.send(notice);
    }
}

#[async_trait]
impl<R: NameResolver> NameResolver for Watched<R> {
    async fn resolve_name(
        &self,
        namespace: Namespace,
        kind: TargetKind,
        id: &str,
    ) -> Result<String, ResolveError> {
        debug!(%namespace, %kind, id, "resolve name");
        with_advisory(
            self.after,
            self.inner.resolve_name(namespace, kind, id),
            || self.advise(namespace, "name lookup"),
        )
        .await
    }

    async fn resolve_id(
        &self,
        namespace: Namespace,
        kind: TargetKind,
        name: &str,
    ) -> Result<String, ResolveError> {
        debug!(%namespace, %kind, name, "resolve id");
        with_advisory(
            self.after,
            self.inner.resolve_id(namespace, kind, name),
            || self.advise(namespace, "ID lookup"),
        )
        .await
    }

    async fn list_names(
        &self,
        namespace: Namespace,
        kind: TargetKind,
    ) -> Result<Vec<String>, ResolveError> {
        debug!(%namespace, %kind, "list names");
        with_advisory(
            self.after,
            self.inner.list_names(namespace, kind),
            || self.advise(namespace, "name list"),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeLevel;
    use tokio::sync::mpsc;

    /// Answers every lookup with the ID itself after a fixed delay.
    struct Slow(Duration);

    #[async_trait]
    impl NameResolver for Slow {
        async fn resolve_name(
            &self,
            _namespace: Namespace,
            _kind: TargetKind,
            id: &str,
        ) -> Result<String, ResolveError> {
            tokio::time::sleep(self.0).await;
            Ok(id.to_uppercase())
        }

        async fn resolve_id(
            &self,
            _namespace: Namespace,
            _kind: TargetKind,
            name: &str,
        ) -> Result<String, ResolveError> {
            tokio::time::sleep(self.0).await;
            Ok(name.to_lowercase())
        }

        async fn list_names(
            &self,
            _namespace: Namespace,
            _kind: TargetKind,
        ) -> Result<Vec<String>, ResolveError> {
            tokio::time::sleep(self.0).await;
            Ok(vec![])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_lookup_posts_advisory_and_still_completes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let watched = Watched::new(
            Slow(Duration::from_millis(2500)),
            Duration::from_millis(1000),
            tx,
        );

        let name = watched
            .resolve_name(Namespace::Avatar, TargetKind::Expression, "abc")
            .await
            .unwrap();
        assert_eq!(name, "ABC");

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.level, NoticeLevel::Advisory);
        assert!(notice.message.contains("pending authorization"));
        assert!(rx.try_recv().is_err(), "advisory fires once per call");
    }

    #[tokio::test(start_paused = true)]
    async fn fast_lookup_stays_quiet() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let watched = Watched::new(
            Slow(Duration::from_millis(200)),
            Duration::from_millis(1000),
            tx,
        );
        let id = watched
            .resolve_id(Namespace::Streaming, TargetKind::Scene, "Intro")
            .await
            .unwrap();
        assert_eq!(id, "intro");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn advisory_is_delivered_before_the_call_finishes() {
        let start = tokio::time::Instant::now();
        let mut fired_at = None;
        let out = with_advisory(
            Duration::from_millis(1000),
            async {
                tokio::time::sleep(Duration::from_millis(3000)).await;
                7
            },
            || fired_at = Some(tokio::time::Instant::now()),
        )
        .await;
        assert_eq!(out, 7);
        let fired = fired_at.unwrap() - start;
        assert!(fired >= Duration::from_millis(1000));
        assert!(fired < Duration::from_millis(3000));
        assert!(start.elapsed() >= Duration::from_millis(3000));
    }
}
