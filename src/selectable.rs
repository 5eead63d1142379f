use crate::collector::Collector;
use crate::event::{EventContext, EventType};
use crate::reactor::core::ReactorCore;
use crate::reactor::Reactor;
use crate::record::Record;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Instant;

type Callback = Box<dyn Fn(&Rc<Selectable>)>;

/// A registered I/O-capable resource.
///
/// A selectable carries an optional deadline and a terminal bit, and
/// owns the callbacks the external driver invokes when the resource
/// becomes readable or writable, when its deadline expires, and when
/// it is finally released.
///
/// Each selectable emits exactly one `SelectableInit`, any number of
/// `SelectableUpdated`, and at most one `SelectableFinal` into the
/// collector it was linked to.
pub struct Selectable {
    weak: Weak<Selectable>,

    /// Handler attachment plus the internal terminated marker.
    attachments: Record,

    /// The next point in time the driver should report expiry for,
    /// if any.
    deadline: Cell<Option<Instant>>,

    /// Set once the selectable declares itself done.
    terminal: Cell<bool>,

    /// Set once the release callback has run.
    released: Cell<bool>,

    /// The owning reactor. Weak: the children list is the only
    /// owning link.
    context: RefCell<Weak<ReactorCore>>,

    /// The collector this selectable publishes its events to.
    collector: RefCell<Weak<Collector>>,

    on_readable: RefCell<Option<Callback>>,
    on_writable: RefCell<Option<Callback>>,
    on_expired: RefCell<Option<Callback>>,
    on_release: RefCell<Option<Callback>>,
}

impl Selectable {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new_cyclic(|weak| Self {
            weak: weak.clone(),
            attachments: Record::default(),
            deadline: Cell::new(None),
            terminal: Cell::new(false),
            released: Cell::new(false),
            context: RefCell::new(Weak::new()),
            collector: RefCell::new(Weak::new()),
            on_readable: RefCell::new(None),
            on_writable: RefCell::new(None),
            on_expired: RefCell::new(None),
            on_release: RefCell::new(None),
        })
    }

    fn handle(&self) -> Rc<Selectable> {
        self.weak.upgrade().unwrap()
    }

    pub fn attachments(&self) -> &Record {
        &self.attachments
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline.get()
    }

    pub fn set_deadline(&self, deadline: Option<Instant>) {
        self.deadline.set(deadline);
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal.get()
    }

    /// Declares the selectable done. The next
    /// [`update`](crate::reactor::Reactor::update) emits its
    /// `SelectableFinal`.
    pub fn terminate(&self) {
        self.terminal.set(true);
    }

    /// The reactor this selectable is registered with, if any.
    pub fn context(&self) -> Option<Reactor> {
        self.context.borrow().upgrade().map(Reactor::from_core)
    }

    pub(crate) fn set_context(&self, core: &Rc<ReactorCore>) {
        *self.context.borrow_mut() = Rc::downgrade(core);
    }

    /// Links this selectable to the collector its events go to.
    pub fn collect(&self, collector: &Rc<Collector>) {
        *self.collector.borrow_mut() = Rc::downgrade(collector);
    }

    pub(crate) fn put(&self, event_type: EventType) {
        if let Some(collector) = self.collector.borrow().upgrade() {
            collector.put(event_type, EventContext::Selectable(self.handle()));
        }
    }

    pub fn on_readable<F>(&self, callback: F)
    where
        F: Fn(&Rc<Selectable>) + 'static,
    {
        *self.on_readable.borrow_mut() = Some(Box::new(callback));
    }

    pub fn on_writable<F>(&self, callback: F)
    where
        F: Fn(&Rc<Selectable>) + 'static,
    {
        *self.on_writable.borrow_mut() = Some(Box::new(callback));
    }

    pub fn on_expired<F>(&self, callback: F)
    where
        F: Fn(&Rc<Selectable>) + 'static,
    {
        *self.on_expired.borrow_mut() = Some(Box::new(callback));
    }

    pub fn on_release<F>(&self, callback: F)
    where
        F: Fn(&Rc<Selectable>) + 'static,
    {
        *self.on_release.borrow_mut() = Some(Box::new(callback));
    }

    /// Invoked by the driver when the resource is readable.
    pub fn readable(&self) {
        if let Some(callback) = self.on_readable.borrow().as_ref() {
            callback(&self.handle());
        }
    }

    /// Invoked by the driver when the resource is writable.
    pub fn writable(&self) {
        if let Some(callback) = self.on_writable.borrow().as_ref() {
            callback(&self.handle());
        }
    }

    /// Invoked by the driver when the deadline has passed.
    pub fn expired(&self) {
        if let Some(callback) = self.on_expired.borrow().as_ref() {
            callback(&self.handle());
        }
    }

    /// Runs the release callback. Idempotent: only the first call has
    /// any effect.
    pub fn release(&self) {
        if self.released.replace(true) {
            return;
        }
        let callback = self.on_release.borrow_mut().take();
        if let Some(callback) = callback {
            callback(&self.handle());
        }
    }
}
