use crate::event::{Event, EventContext, EventType};

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use tracing::{debug, trace};

/// FIFO queue of typed events awaiting dispatch.
///
/// The collector keeps each event's context alive until the event is
/// popped. Once released, a collector drops everything it holds and
/// silently discards further puts; release is idempotent.
pub struct Collector {
    queue: RefCell<VecDeque<Event>>,
    released: Cell<bool>,
}

impl Collector {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: RefCell::new(VecDeque::with_capacity(capacity)),
            released: Cell::new(false),
        }
    }

    /// Appends an event. Dropped without effect once the collector
    /// has been released.
    pub fn put(&self, event_type: EventType, context: EventContext) {
        if self.released.get() {
            trace!(event = ?event_type, "event dropped, collector released");
            return;
        }
        self.queue.borrow_mut().push_back(Event::new(event_type, context));
    }

    /// The next event, without removing it. Repeatable until [`pop`](Self::pop).
    pub fn peek(&self) -> Option<Event> {
        self.queue.borrow().front().cloned()
    }

    /// Removes the head event, releasing its context reference.
    pub fn pop(&self) {
        self.queue.borrow_mut().pop_front();
    }

    /// Abandons all pending events.
    pub fn release(&self) {
        if !self.released.replace(true) {
            self.queue.borrow_mut().clear();
            debug!("collector released");
        }
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released.get()
    }
}
