//! Best-effort work that runs after the response: audit writes and
//! outbound notifications.
//!
//! Everything goes through one unbounded channel drained by a single worker
//! task. Failures are logged and the most recent ones kept in a bounded
//! failure log; nothing is retried.
//! [`SideEffectQueue::flush`] waits until every effect enqueued before it
//! has been processed.

pub mod geocode;
pub mod notifier;

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::database::Repository;
use crate::models::audit::AuditLogEntry;

pub use geocode::{Coordinates, GeocodeCache, Geocoder, MemoryGeocodeCache};
pub use notifier::{LogNotifier, MemoryNotifier, NotificationEvent, Notifier, WebhookNotifier};

/// Oldest failures are dropped past this many
pub const FAILURE_LOG_CAPACITY: usize = 256;

type FailureLog = Arc<RwLock<VecDeque<SideEffectFailure>>>;

#[derive(Debug)]
pub enum SideEffect {
    Audit(AuditLogEntry),
    Notify(NotificationEvent),
    Flush(oneshot::Sender<()>),
}

impl SideEffect {
    fn kind(&self) -> &'static str {
        match self {
            SideEffect::Audit(_) => "audit",
            SideEffect::Notify(_) => "notify",
            SideEffect::Flush(_) => "flush",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SideEffectFailure {
    pub kind: &'static str,
    pub description: String,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SideEffectQueue {
    tx: mpsc::UnboundedSender<SideEffect>,
    failures: FailureLog,
}

impl SideEffectQueue {
    /// Spawn the worker on the current runtime
    pub fn start(audit_logs: Arc<dyn Repository<AuditLogEntry>>, notifier: Arc<dyn Notifier>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let failures = Arc::new(RwLock::new(VecDeque::with_capacity(FAILURE_LOG_CAPACITY)));
        tokio::spawn(run_worker(rx, audit_logs, notifier, failures.clone()));
        Self { tx, failures }
    }

    pub fn enqueue(&self, effect: SideEffect) {
        let kind = effect.kind();
        if self.tx.send(effect).is_err() {
            tracing::warn!("Side-effect worker stopped; dropping {} effect", kind);
        }
    }

    pub fn audit(&self, entry: AuditLogEntry) {
        self.enqueue(SideEffect::Audit(entry));
    }

    pub fn notify(&self, event: NotificationEvent) {
        self.enqueue(SideEffect::Notify(event));
    }

    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        self.enqueue(SideEffect::Flush(done_tx));
        let _ = done_rx.await;
    }

    pub async fn failures(&self) -> Vec<SideEffectFailure> {
        self.failures.read().await.iter().cloned().collect()
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<SideEffect>,
    audit_logs: Arc<dyn Repository<AuditLogEntry>>,
    notifier: Arc<dyn Notifier>,
    failures: FailureLog,
) {
    while let Some(effect) = rx.recv().await {
        let outcome = match effect {
            SideEffect::Audit(entry) => {
                let description = format!("{} {} {:?}", entry.action_type, entry.entity_type, entry.entity_id);
                audit_logs.insert(&entry).await.map(|_| ()).map_err(|e| ("audit", description, e.to_string()))
            }
            SideEffect::Notify(event) => {
                let description = format!("{} -> {}", event.event, event.to.join(","));
                notifier.send(&event).await.map_err(|e| ("notify", description, e.to_string()))
            }
            SideEffect::Flush(done) => {
                let _ = done.send(());
                Ok(())
            }
        };

        if let Err((kind, description, error)) = outcome {
            tracing::warn!("Side effect {} failed ({}): {}", kind, description, error);
            let mut log = failures.write().await;
            if log.len() == FAILURE_LOG_CAPACITY {
                log.pop_front();
            }
            log.push_back(SideEffectFailure { kind, description, error, failed_at: Utc::now() });
        }
    }
    tracing::debug!("Side-effect worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryRepository;
    use crate::filter::Filter;
    use async_trait::async_trait;
    use uuid::Uuid;

    fn entry() -> AuditLogEntry {
        AuditLogEntry {
            id: Uuid::new_v4(),
            admin_id: None,
            admin_email: Some("a@x.com".into()),
            action_type: "create".into(),
            entity_type: "reunion".into(),
            entity_id: Some(Uuid::new_v4()),
            entity_name: Some("CA Jan".into()),
            before: None,
            after: None,
            ip: None,
            created_at: Utc::now(),
        }
    }

    struct BrokenNotifier;

    #[async_trait]
    impl Notifier for BrokenNotifier {
        async fn send(&self, _event: &NotificationEvent) -> Result<(), notifier::NotifyError> {
            Err(notifier::NotifyError::Status(502))
        }
    }

    #[tokio::test]
    async fn flush_waits_for_pending_audit_writes() {
        let repo = Arc::new(MemoryRepository::<AuditLogEntry>::new());
        let queue = SideEffectQueue::start(repo.clone(), Arc::new(LogNotifier));
        queue.audit(entry());
        queue.audit(entry());
        queue.flush().await;
        assert_eq!(repo.count(&Filter::new()).await.unwrap(), 2);
        assert!(queue.failures().await.is_empty());
    }

    #[tokio::test]
    async fn failures_are_recorded_not_raised() {
        let repo = Arc::new(MemoryRepository::<AuditLogEntry>::new());
        let queue = SideEffectQueue::start(repo.clone(), Arc::new(BrokenNotifier));
        let duplicate = entry();
        queue.audit(duplicate.clone());
        queue.audit(duplicate);
        queue.notify(NotificationEvent::new("contact", vec!["x@y.org".into()], "Hi", serde_json::json!({})));
        queue.flush().await;

        let failures = queue.failures().await;
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].kind, "audit");
        assert_eq!(failures[1].kind, "notify");
    }

    #[tokio::test]
    async fn failure_log_keeps_only_the_latest_entries() {
        let repo = Arc::new(MemoryRepository::<AuditLogEntry>::new());
        let queue = SideEffectQueue::start(repo, Arc::new(BrokenNotifier));
        let total = FAILURE_LOG_CAPACITY + 10;
        for i in 0..total {
            queue.notify(NotificationEvent::new(&format!("event-{}", i), vec!["x@y.org".into()], "Hi", serde_json::json!({})));
        }
        queue.flush().await;

        let failures = queue.failures().await;
        assert_eq!(failures.len(), FAILURE_LOG_CAPACITY);
        assert!(failures[0].description.starts_with("event-10 "));
        assert!(failures[FAILURE_LOG_CAPACITY - 1].description.starts_with(&format!("event-{} ", total - 1)));
    }
}
