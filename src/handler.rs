use crate::event::{Event, EventContext, EventType};
use crate::reactor::Reactor;

use std::rc::Rc;

/// An event subscriber.
///
/// Handlers are attached to entities through their attachment records
/// and invoked by the reactor's dispatch loop. A handler runs to
/// completion on the reactor's thread; whatever it does is treated as
/// success. Handlers may call back into the reactor (schedule tasks,
/// register selectables, publish events) and those mutations are
/// observed by later iterations of the same dispatch pass.
pub trait Handler {
    fn on_event(&self, reactor: &Reactor, event: &Event);
}

/// Resolves the handler for an event, most specific wins.
///
/// The handler tree is never materialized; this walk derives it at
/// dispatch time: link, then session, then connection, then the task
/// or selectable the event carries, then `fallback` (the reactor's
/// root handler).
pub fn resolve(event: &Event, fallback: &Rc<dyn Handler>) -> Rc<dyn Handler> {
    if let Some(link) = event.link() {
        if let Some(handler) = link.attachments().handler() {
            return handler;
        }
    }
    if let Some(session) = event.session() {
        if let Some(handler) = session.attachments().handler() {
            return handler;
        }
    }
    if let Some(connection) = event.connection() {
        if let Some(handler) = connection.attachments().handler() {
            return handler;
        }
    }
    match event.context() {
        EventContext::Task(task) => {
            if let Some(handler) = task.attachments().handler() {
                return handler;
            }
        }
        EventContext::Selectable(selectable) => {
            if let Some(handler) = selectable.attachments().handler() {
                return handler;
            }
        }
        _ => {}
    }
    fallback.clone()
}

/// A handler that ignores every event. The reactor's default root
/// handler.
pub struct NullHandler;

impl Handler for NullHandler {
    fn on_event(&self, _reactor: &Reactor, _event: &Event) {}
}

/// The reactor's default global handler.
///
/// Its single housekeeping duty: when a `SelectableFinal` has been
/// seen by user handlers, release the selectable so it detaches from
/// the reactor's children list. Replacing the global handler without
/// delegating to this one leaves terminated selectables registered.
pub struct ReleaseHandler;

impl Handler for ReleaseHandler {
    fn on_event(&self, _reactor: &Reactor, event: &Event) {
        if event.event_type() == EventType::SelectableFinal {
            if let Some(selectable) = event.selectable() {
                selectable.release();
            }
        }
    }
}
