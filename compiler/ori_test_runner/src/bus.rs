//! Event delivery.
//!
//! Events go to a single observer callback. Delivery is synchronous and
//! serialised: the callback is wrapped together with a reentrant lock, so
//! events posted from parallel steps never enter the observer concurrently,
//! while an observer that itself records an issue on the delivering thread
//! does not deadlock.

use std::fmt;
use std::sync::Arc;

use ori_test_ir::TestId;
use parking_lot::{Mutex, ReentrantMutex};

use crate::config::Configuration;
use crate::event::{Event, EventContext, EventKind};

type Callback = dyn Fn(&Event, &EventContext) + Send + Sync;

struct HandlerInner {
    lock: ReentrantMutex<()>,
    callback: Box<Callback>,
}

/// Observer callback shared by every clone of a configuration.
#[derive(Clone)]
pub struct EventHandler {
    inner: Arc<HandlerInner>,
}

impl EventHandler {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Event, &EventContext) + Send + Sync + 'static,
    {
        EventHandler {
            inner: Arc::new(HandlerInner {
                lock: ReentrantMutex::new(()),
                callback: Box::new(callback),
            }),
        }
    }

    /// Handler that ignores every event.
    pub fn noop() -> Self {
        EventHandler::new(|_, _| {})
    }

    /// Invoke the callback once, holding the delivery lock.
    pub fn deliver(&self, event: &Event, context: &EventContext) {
        let _serialized = self.inner.lock.lock();
        (self.inner.callback)(event, context);
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventHandler(..)")
    }
}

/// Stamps, filters and delivers events for one configuration.
pub struct EventBus {
    handler: EventHandler,
    deliver_expectation_checked: bool,
}

impl EventBus {
    pub fn new(configuration: &Configuration) -> Self {
        EventBus {
            handler: configuration.event_handler.clone(),
            deliver_expectation_checked: configuration.deliver_expectation_checked_events,
        }
    }

    /// Deliver `kind` now, unless it is gated off.
    pub fn post(&self, kind: EventKind, context: &EventContext) {
        if matches!(kind, EventKind::ExpectationChecked(_)) && !self.deliver_expectation_checked {
            return;
        }
        let event = Event::now(kind);
        tracing::trace!(
            event = event.kind.name(),
            test = ?context.test_id(),
            "delivering event"
        );
        self.handler.deliver(&event, context);
    }
}

/// Handler that keeps every delivered event in memory.
///
/// Used by embedders that inspect a run after the fact, and by tests.
#[derive(Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<(Event, EventContext)>>>,
}

impl EventLog {
    pub fn new() -> Self {
        EventLog::default()
    }

    /// A handler appending to this log.
    pub fn handler(&self) -> EventHandler {
        let entries = Arc::clone(&self.entries);
        EventHandler::new(move |event, context| {
            entries.lock().push((event.clone(), context.clone()));
        })
    }

    pub fn entries(&self) -> Vec<(Event, EventContext)> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Names of all delivered events, in delivery order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.entries.lock().iter().map(|(e, _)| e.kind.name()).collect()
    }

    /// Names of the events whose context is `id`, in delivery order.
    pub fn kinds_for(&self, id: &TestId) -> Vec<&'static str> {
        self.entries
            .lock()
            .iter()
            .filter(|(_, context)| context.test_id() == Some(id))
            .map(|(e, _)| e.kind.name())
            .collect()
    }
}
