//! Ordered handler lists keyed by event kind

use std::cell::{Cell, RefCell};
use std::fmt::{self, Debug, Formatter};
use std::rc::{Rc, Weak};

use crate::event::{CloseEvent, ErrorEvent, EventKind, MessageEvent, OpenEvent};

/// A registered callback.
pub(crate) type Handler<E> = Rc<dyn Fn(&E)>;

/// Handlers for one event kind, in registration order.
pub struct Handlers<E> {
    kind: EventKind,
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Handler<E>)>>,
}

impl<E: 'static> Handlers<E> {
    fn new(kind: EventKind) -> Rc<Self> {
        Rc::new(Self {
            kind,
            next_id: Cell::new(0),
            entries: RefCell::new(Vec::new()),
        })
    }

    pub(crate) fn add(self: &Rc<Self>, handler: Handler<E>) -> HandlerRegistration {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, handler));
        tracing::trace!(kind = %self.kind, id, "handler added");

        let list: Rc<dyn RemoveHandler> = Rc::<Self>::clone(self);
        HandlerRegistration {
            kind: self.kind,
            id,
            list: Rc::downgrade(&list),
        }
    }

    /// Run every handler registered at the time of the call, in order.
    ///
    /// The list is snapshotted first, so handlers may add or remove handlers
    /// (or fire further events) without affecting the current round.
    pub(crate) fn dispatch(&self, event: &E) -> usize {
        let snapshot: Vec<Handler<E>> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();
        tracing::debug!(kind = %self.kind, handlers = snapshot.len(), "dispatching event");

        for handler in &snapshot {
            handler(event);
        }

        snapshot.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

/// Type-erased removal, so a registration does not need to know `E`.
trait RemoveHandler {
    fn remove(&self, id: u64) -> bool;
}

impl<E> RemoveHandler for Handlers<E> {
    fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        before != entries.len()
    }
}

/// Token returned when registering a handler.
///
/// Call [`remove`](Self::remove) to detach the handler. Dropping the token
/// leaves the handler registered.
pub struct HandlerRegistration {
    kind: EventKind,
    id: u64,
    list: Weak<dyn RemoveHandler>,
}

impl HandlerRegistration {
    /// Detach the handler.
    ///
    /// Returns `false` if it was already removed or the socket is gone.
    pub fn remove(self) -> bool {
        let removed = self
            .list
            .upgrade()
            .is_some_and(|list| list.remove(self.id));
        tracing::trace!(kind = %self.kind, id = self.id, removed, "handler removed");
        removed
    }

    /// The kind of event the handler listens for.
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl Debug for HandlerRegistration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistration")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// One handler list per socket event kind.
pub struct EventRegistry {
    pub(crate) open: Rc<Handlers<OpenEvent>>,
    pub(crate) message: Rc<Handlers<MessageEvent>>,
    pub(crate) error: Rc<Handlers<ErrorEvent>>,
    pub(crate) close: Rc<Handlers<CloseEvent>>,
}

impl EventRegistry {
    pub(crate) fn new() -> Self {
        Self {
            open: Handlers::new(EventKind::Open),
            message: Handlers::new(EventKind::Message),
            error: Handlers::new(EventKind::Error),
            close: Handlers::new(EventKind::Close),
        }
    }

    pub(crate) fn count(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::Open => self.open.len(),
            EventKind::Message => self.message.len(),
            EventKind::Error => self.error.len(),
            EventKind::Close => self.close.len(),
        }
    }
}
