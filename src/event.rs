use crate::entity::{Connection, Delivery, Link, Session, Transport};
use crate::reactor::{Reactor, ReactorRef};
use crate::selectable::Selectable;
use crate::timer::Task;

use std::rc::Rc;

/// The closed set of event types dispatched by the reactor.
///
/// The reactor itself produces the `Reactor*`, `Selectable*` and
/// `TimerTask` members. The remaining members are the pass-through
/// set: an external protocol layer publishes them into the collector
/// and the reactor routes them to handlers unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Sentinel for "no event dispatched yet".
    None,

    /// The reactor has been started.
    ReactorInit,

    /// The reactor has no dispatchable events but still has work
    /// pending (timers or non-timer selectables).
    ReactorQuiesced,

    /// The reactor is stopping.
    ReactorFinal,

    /// A scheduled task has matured.
    TimerTask,

    /// A connection has been created.
    ConnectionInit,

    /// The remote peer opened the connection.
    ConnectionRemoteOpen,

    /// The remote peer closed the connection.
    ConnectionRemoteClose,

    /// The connection is done and will not produce further events.
    ConnectionFinal,

    /// A session has been created.
    SessionInit,

    /// The session is done.
    SessionFinal,

    /// A link has been created.
    LinkInit,

    /// The link is done.
    LinkFinal,

    /// A delivery arrived or changed state on a link.
    Delivery,

    /// The transport encountered an error.
    TransportError,

    /// The transport closed.
    TransportClosed,

    /// A selectable has been registered with a reactor.
    SelectableInit,

    /// A selectable's deadline or interests changed.
    SelectableUpdated,

    /// A terminal selectable is about to be released.
    SelectableFinal,
}

/// Classes of entities an event can carry as its context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityClass {
    Reactor,
    Connection,
    Session,
    Link,
    Delivery,
    Transport,
    Task,
    Selectable,
}

/// The entity an event refers to.
///
/// Queued events hold strong handles so the context stays alive until
/// the event is popped from the collector. The one exception is the
/// reactor itself: the reactor transitively owns its own queue, so a
/// strong handle there would be a cycle and the reference is weak.
#[derive(Clone)]
pub enum EventContext {
    Reactor(ReactorRef),
    Connection(Rc<Connection>),
    Session(Rc<Session>),
    Link(Rc<Link>),
    Delivery(Rc<Delivery>),
    Transport(Rc<Transport>),
    Task(Rc<Task>),
    Selectable(Rc<Selectable>),
}

/// An immutable event awaiting dispatch.
///
/// Events are produced into a [`Collector`](crate::collector::Collector)
/// and consumed exactly once per dispatch step.
#[derive(Clone)]
pub struct Event {
    event_type: EventType,
    context: EventContext,
}

impl Event {
    pub(crate) fn new(event_type: EventType, context: EventContext) -> Self {
        Self {
            event_type,
            context,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn context(&self) -> &EventContext {
        &self.context
    }

    /// The class of the context entity.
    pub fn class(&self) -> EntityClass {
        match self.context {
            EventContext::Reactor(_) => EntityClass::Reactor,
            EventContext::Connection(_) => EntityClass::Connection,
            EventContext::Session(_) => EntityClass::Session,
            EventContext::Link(_) => EntityClass::Link,
            EventContext::Delivery(_) => EntityClass::Delivery,
            EventContext::Transport(_) => EntityClass::Transport,
            EventContext::Task(_) => EntityClass::Task,
            EventContext::Selectable(_) => EntityClass::Selectable,
        }
    }

    /// The link associated with this event, if any.
    pub fn link(&self) -> Option<Rc<Link>> {
        match &self.context {
            EventContext::Link(link) => Some(link.clone()),
            EventContext::Delivery(delivery) => Some(delivery.link()),
            _ => None,
        }
    }

    /// The session associated with this event, walking up from the
    /// link for link and delivery events.
    pub fn session(&self) -> Option<Rc<Session>> {
        match &self.context {
            EventContext::Session(session) => Some(session.clone()),
            _ => self.link().map(|link| link.session()),
        }
    }

    /// The connection associated with this event, walking up the
    /// delivery → link → session chain where needed.
    pub fn connection(&self) -> Option<Rc<Connection>> {
        match &self.context {
            EventContext::Connection(connection) => Some(connection.clone()),
            EventContext::Transport(transport) => transport.connection(),
            _ => self.session().map(|session| session.connection()),
        }
    }

    /// The task carried by a [`EventType::TimerTask`] event.
    pub fn task(&self) -> Option<Rc<Task>> {
        match &self.context {
            EventContext::Task(task) => Some(task.clone()),
            _ => None,
        }
    }

    /// The selectable carried by a `Selectable*` event.
    pub fn selectable(&self) -> Option<Rc<Selectable>> {
        match &self.context {
            EventContext::Selectable(selectable) => Some(selectable.clone()),
            _ => None,
        }
    }

    /// The reactor this event belongs to.
    ///
    /// Reactor events carry it directly; task and transport events
    /// read the weak reference stored in their attachments; entity
    /// events walk to the connection and read its attachments; a
    /// selectable's owning reactor is its context.
    pub fn reactor(&self) -> Option<Reactor> {
        match &self.context {
            EventContext::Reactor(reactor) => reactor.upgrade(),
            EventContext::Task(task) => task.attachments().reactor(),
            EventContext::Transport(transport) => transport.attachments().reactor(),
            EventContext::Connection(_)
            | EventContext::Session(_)
            | EventContext::Link(_)
            | EventContext::Delivery(_) => self
                .connection()
                .and_then(|connection| connection.attachments().reactor()),
            EventContext::Selectable(selectable) => selectable.context(),
        }
    }
}
