//! Shared completion counter
//!
//! A [`ProgressCounter`] is cloned into every install task. Tasks call
//! [`ProgressCounter::increment`] once when they finish; the counter never
//! renders anything itself and only reports through the event channel.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::{AppEvent, EventEmitter, EventSender, FailureContext, ProgressEvent};

#[derive(Debug)]
struct Inner {
    id: String,
    label: String,
    total: u64,
    current: AtomicU64,
    done: AtomicBool,
    started: Instant,
    tx: Option<EventSender>,
}

/// Thread-safe counter bounded by an expected total
#[derive(Debug, Clone)]
pub struct ProgressCounter {
    inner: Arc<Inner>,
}

impl ProgressCounter {
    /// Create a counter and announce it with `ProgressEvent::Started`
    #[must_use]
    pub fn new(label: impl Into<String>, total: u64, tx: Option<EventSender>) -> Self {
        let counter = Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4().to_string(),
                label: label.into(),
                total,
                current: AtomicU64::new(0),
                done: AtomicBool::new(false),
                started: Instant::now(),
                tx,
            }),
        };
        counter.emit(AppEvent::Progress(ProgressEvent::started(
            counter.id(),
            counter.label(),
            Some(total),
        )));
        counter
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.inner.total
    }

    #[must_use]
    pub fn current(&self) -> u64 {
        self.inner.current.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.inner.done.load(Ordering::Acquire)
    }

    /// Advance by one, saturating at the total, and return the new value
    pub fn increment(&self) -> u64 {
        let total = self.inner.total;
        let previous = self
            .inner
            .current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < total).then_some(n + 1)
            })
            .unwrap_or(total);
        let current = previous.saturating_add(1).min(total);
        self.emit(AppEvent::Progress(ProgressEvent::updated(
            self.id(),
            current,
            Some(total),
        )));
        current
    }

    /// Report completion. Only the first call emits.
    pub fn mark_complete(&self) {
        if self.inner.done.swap(true, Ordering::AcqRel) {
            return;
        }
        self.emit(AppEvent::Progress(ProgressEvent::completed(
            self.id(),
            self.inner.started.elapsed(),
            self.current(),
        )));
    }

    /// Report failure. Does nothing after completion has been reported.
    pub fn mark_failed(&self, failure: FailureContext) {
        if self.inner.done.swap(true, Ordering::AcqRel) {
            return;
        }
        self.emit(AppEvent::Progress(ProgressEvent::failed(
            self.id(),
            failure,
            self.current(),
        )));
    }
}

impl EventEmitter for ProgressCounter {
    fn event_sender(&self) -> Option<&EventSender> {
        self.inner.tx.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{channel, EventMessage};

    fn drain(rx: &mut crate::EventReceiver) -> Vec<EventMessage> {
        let mut out = Vec::new();
        while let Ok(message) = rx.try_recv() {
            out.push(message);
        }
        out
    }

    #[test]
    fn test_increment_saturates_at_total() {
        let counter = ProgressCounter::new("installing", 2, None);
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.current(), 2);
    }

    #[test]
    fn test_mark_complete_emits_once() {
        let (tx, mut rx) = channel();
        let counter = ProgressCounter::new("installing", 1, Some(tx));
        counter.increment();
        counter.mark_complete();
        counter.mark_complete();
        counter.mark_failed(FailureContext::new(None::<String>, "late", None::<String>, false));

        let events = drain(&mut rx);
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[0].event,
            AppEvent::Progress(ProgressEvent::Started { total: Some(1), .. })
        ));
        assert!(matches!(
            events[1].event,
            AppEvent::Progress(ProgressEvent::Updated { current: 1, .. })
        ));
        assert!(matches!(
            events[2].event,
            AppEvent::Progress(ProgressEvent::Completed {
                total_processed: 1,
                ..
            })
        ));
        assert!(counter.is_done());
    }

    #[test]
    fn test_clones_share_state() {
        let counter = ProgressCounter::new("installing", 3, None);
        let other = counter.clone();
        other.increment();
        counter.increment();
        assert_eq!(other.current(), 2);
        assert_eq!(counter.id(), other.id());
    }
}
