//! Event bus for decoupled communication between the engine and the UI.
//!
//! Single-threaded by design (all state mutation happens on the UI
//! thread); interior mutability via RefCell. Events are buffered and
//! drained by the view layer on each frame.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use playground_types::message::{MessageKey, VersionId};
use playground_types::session::SessionStatus;

/// Events emitted by the session as conversation state changes.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StatusChanged { status: SessionStatus },
    MessageAppended { key: MessageKey },
    /// A leased version received new streamed content.
    VersionUpdated { key: MessageKey, version: VersionId },
    MessageDeleted { key: MessageKey },
    /// The message list was cleared (model/mode switch or explicit reset).
    HistoryCleared,
    /// A user-visible error notification (toast in the original UI).
    ErrorNotice { message: String },
}

/// Shared event bus — clone-cheap via Rc.
#[derive(Clone)]
pub struct EventBus {
    inner: Rc<RefCell<VecDeque<SessionEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Publish an event. Called by the session driver and the store.
    pub fn emit(&self, event: SessionEvent) {
        self.inner.borrow_mut().push_back(event);
    }

    /// Drain all pending events. Called by the UI layer each frame.
    pub fn drain(&self) -> Vec<SessionEvent> {
        self.inner.borrow_mut().drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
