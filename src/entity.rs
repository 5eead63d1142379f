//! Minimal protocol entities.
//!
//! These types carry just enough structure for event routing: each
//! entity owns an attachment record, and the graph is walkable
//! strictly upward (delivery → link → session → connection), so
//! cycles cannot arise. The protocol state machines behind them are
//! external collaborators.

use crate::record::Record;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// An endpoint of a messaging conversation.
pub struct Connection {
    attachments: Record,
    transport: RefCell<Option<Rc<Transport>>>,
}

impl Connection {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            attachments: Record::default(),
            transport: RefCell::new(None),
        })
    }

    pub fn attachments(&self) -> &Record {
        &self.attachments
    }

    /// The transport this connection is bound to, if any.
    pub fn transport(&self) -> Option<Rc<Transport>> {
        self.transport.borrow().clone()
    }

    pub(crate) fn unbind_transport(&self) {
        if let Some(transport) = self.transport.borrow_mut().take() {
            *transport.connection.borrow_mut() = Weak::new();
        }
    }
}

/// The wire-level carrier for a connection.
///
/// The transport holds its connection weakly; the connection owns the
/// binding.
pub struct Transport {
    attachments: Record,
    connection: RefCell<Weak<Connection>>,
}

impl Transport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            attachments: Record::default(),
            connection: RefCell::new(Weak::new()),
        })
    }

    pub fn attachments(&self) -> &Record {
        &self.attachments
    }

    pub fn connection(&self) -> Option<Rc<Connection>> {
        self.connection.borrow().upgrade()
    }
}

/// Ties a connection and a transport together.
pub fn bind(connection: &Rc<Connection>, transport: &Rc<Transport>) {
    *connection.transport.borrow_mut() = Some(transport.clone());
    *transport.connection.borrow_mut() = Rc::downgrade(connection);
}

/// A grouping of links within a connection.
pub struct Session {
    attachments: Record,
    connection: Rc<Connection>,
}

impl Session {
    pub fn new(connection: &Rc<Connection>) -> Rc<Self> {
        Rc::new(Self {
            attachments: Record::default(),
            connection: connection.clone(),
        })
    }

    pub fn attachments(&self) -> &Record {
        &self.attachments
    }

    pub fn connection(&self) -> Rc<Connection> {
        self.connection.clone()
    }
}

/// A unidirectional message route within a session.
pub struct Link {
    attachments: Record,
    session: Rc<Session>,
}

impl Link {
    pub fn new(session: &Rc<Session>) -> Rc<Self> {
        Rc::new(Self {
            attachments: Record::default(),
            session: session.clone(),
        })
    }

    pub fn attachments(&self) -> &Record {
        &self.attachments
    }

    pub fn session(&self) -> Rc<Session> {
        self.session.clone()
    }
}

/// A single message transfer on a link.
pub struct Delivery {
    attachments: Record,
    link: Rc<Link>,
}

impl Delivery {
    pub fn new(link: &Rc<Link>) -> Rc<Self> {
        Rc::new(Self {
            attachments: Record::default(),
            link: link.clone(),
        })
    }

    pub fn attachments(&self) -> &Record {
        &self.attachments
    }

    pub fn link(&self) -> Rc<Link> {
        self.link.clone()
    }
}
