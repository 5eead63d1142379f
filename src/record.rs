use crate::handler::Handler;
use crate::reactor::core::ReactorCore;
use crate::reactor::Reactor;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Per-entity attachment record.
///
/// Every entity (connection, session, link, delivery, transport,
/// task, selectable, reactor) carries one of these. It has three
/// well-known slots:
///
/// - a **handler**, held strongly: the subscriber invoked for events
///   routed to this entity;
/// - the owning **reactor**, held weakly: a relation and a lookup,
///   never ownership;
/// - an internal **terminated** marker used by the reactor to emit
///   `SelectableFinal` at most once per selectable.
#[derive(Default)]
pub struct Record {
    handler: RefCell<Option<Rc<dyn Handler>>>,
    reactor: RefCell<Weak<ReactorCore>>,
    terminated: Cell<bool>,
}

impl Record {
    /// The handler attached to this record, if any.
    pub fn handler(&self) -> Option<Rc<dyn Handler>> {
        self.handler.borrow().clone()
    }

    /// Attaches a handler, replacing any previous one.
    pub fn set_handler(&self, handler: Rc<dyn Handler>) {
        *self.handler.borrow_mut() = Some(handler);
    }

    /// The reactor this record is bound to, if it is still alive and
    /// the record has been bound at all.
    pub fn reactor(&self) -> Option<Reactor> {
        self.reactor.borrow().upgrade().map(Reactor::from_core)
    }

    pub(crate) fn bind_reactor(&self, core: &Rc<ReactorCore>) {
        *self.reactor.borrow_mut() = Rc::downgrade(core);
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.terminated.get()
    }

    pub(crate) fn mark_terminated(&self) {
        self.terminated.set(true);
    }
}
