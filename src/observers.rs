use std::{cell::RefCell, rc::Rc};

use tracing::info;

use crate::events::CatalogEvent;

/// Trait for catalog change observation
pub trait CatalogObserver {
    /// Called after a mutation has been applied in memory
    fn on_event(&self, event: &CatalogEvent);
}

/// Logs every applied mutation through `tracing`
#[derive(Debug)]
pub struct EventLogger;

impl CatalogObserver for EventLogger {
    fn on_event(&self, event: &CatalogEvent) {
        match event {
            CatalogEvent::BookAdded { id, title } => info!(book = id, %title, "book added"),
            CatalogEvent::MemberAdded { id, name } => info!(member = id, %name, "member added"),
            CatalogEvent::BookIssued { book, member } => info!(book, member, "book issued"),
            CatalogEvent::BookReturned { book, member } => info!(book, member, "book returned"),
        }
    }
}

/// Keeps a copy of every event it sees.
///
/// Clones share the same buffer, so one clone can be registered while
/// another is kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    /// Shared event buffer
    events: Rc<RefCell<Vec<CatalogEvent>>>,
}

impl EventRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    #[must_use]
    pub fn events(&self) -> Vec<CatalogEvent> {
        self.events.borrow().clone()
    }
}

impl CatalogObserver for EventRecorder {
    fn on_event(&self, event: &CatalogEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
