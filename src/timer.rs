use crate::collector::Collector;
use crate::event::{EventContext, EventType};
use crate::record::Record;

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;
use std::time::Instant;

use tracing::trace;

/// A scheduled future event.
///
/// A task is created by [`Timer::schedule`] and delivered as a
/// `TimerTask` event once the timer matures. Its attachments carry
/// the handler the event will be routed to and a weak reference to
/// the owning reactor.
///
/// The task may be cancelled before it fires.
pub struct Task {
    /// The time at which the task should fire.
    deadline: Instant,

    /// Handler and owning-reactor attachments.
    attachments: Record,

    /// Cancellation flag checked when the heap pops the entry.
    cancelled: Cell<bool>,
}

impl Task {
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn attachments(&self) -> &Record {
        &self.attachments
    }

    /// Marks the task as cancelled. A cancelled task is discarded
    /// when it matures instead of producing a `TimerTask` event.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// An entry in the timer heap.
///
/// Entries are ordered by `(deadline, insertion sequence)`, so tasks
/// with equal deadlines mature in FIFO insertion order.
struct TimerEntry {
    deadline: Instant,
    seq: u64,
    task: Rc<Task>,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Ord for TimerEntry {
    /// Orders entries by deadline, then insertion sequence.
    ///
    /// Note that the comparison is **reversed** so that a
    /// `BinaryHeap<TimerEntry>` behaves as a min-heap, where the
    /// earliest deadline is popped first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of deadline → task entries.
///
/// The timer shares the reactor's collector: ticking it materializes
/// matured tasks into `TimerTask` events in non-decreasing deadline
/// order.
pub struct Timer {
    collector: Rc<Collector>,
    entries: RefCell<BinaryHeap<TimerEntry>>,
    seq: Cell<u64>,
}

impl Timer {
    pub fn new(collector: Rc<Collector>) -> Self {
        Self {
            collector,
            entries: RefCell::new(BinaryHeap::new()),
            seq: Cell::new(0),
        }
    }

    /// Inserts a task maturing at `deadline`.
    pub fn schedule(&self, deadline: Instant) -> Rc<Task> {
        let task = Rc::new(Task {
            deadline,
            attachments: Record::default(),
            cancelled: Cell::new(false),
        });

        let seq = self.seq.get();
        self.seq.set(seq + 1);
        self.entries.borrow_mut().push(TimerEntry {
            deadline,
            seq,
            task: task.clone(),
        });

        trace!(seq, "task scheduled");
        task
    }

    /// Removes every entry with `deadline <= now` and emits one
    /// `TimerTask` event per non-cancelled task.
    pub fn tick(&self, now: Instant) {
        let mut entries = self.entries.borrow_mut();

        while let Some(entry) = entries.peek() {
            if entry.deadline > now {
                break;
            }

            let entry = entries.pop().unwrap();

            if entry.task.is_cancelled() {
                continue;
            }

            self.collector
                .put(EventType::TimerTask, EventContext::Task(entry.task));
        }
    }

    /// The earliest pending deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.entries.borrow().peek().map(|entry| entry.deadline)
    }

    /// The number of pending entries, cancelled ones included until
    /// they mature and are discarded.
    pub fn tasks(&self) -> usize {
        self.entries.borrow().len()
    }
}
