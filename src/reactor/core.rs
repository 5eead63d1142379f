use crate::collector::Collector;
use crate::event::{Event, EventContext, EventType};
use crate::handler::{self, Handler, NullHandler, ReleaseHandler};
use crate::record::Record;
use crate::selectable::Selectable;
use crate::timer::{Task, Timer};

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, trace};

/// Configuration for a reactor.
#[derive(Debug, Clone)]
pub struct Config {
    /// The I/O timeout `run` hands to each `work` call.
    pub work_timeout: Duration,

    /// Initial capacity of the event queue.
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_timeout: Duration::from_millis(1000),
            event_capacity: 64,
        }
    }
}

/// Errors surfaced by the reactor's creating calls.
#[derive(Debug, Error)]
pub enum ReactorError {
    /// The reactor has been stopped and its collector released.
    #[error("reactor has been stopped")]
    Stopped,
}

pub(crate) struct ReactorCore {
    config: Config,
    attachments: Record,
    collector: Rc<Collector>,
    timer: Timer,
    global: RefCell<Rc<dyn Handler>>,
    handler: RefCell<Rc<dyn Handler>>,
    children: RefCell<Vec<Rc<Selectable>>>,
    timer_selectable: RefCell<Option<Rc<Selectable>>>,
    previous: Cell<EventType>,
    now: Cell<Instant>,
    selectables: Cell<usize>,
    timeout: Cell<Duration>,
    yielded: Cell<bool>,
    processing: Cell<bool>,
    stopping: Cell<bool>,
}

/// A weak handle to a reactor.
///
/// Entities and queued reactor events refer back to their reactor
/// through one of these; the reference never keeps the reactor alive.
#[derive(Clone)]
pub struct ReactorRef(Weak<ReactorCore>);

impl ReactorRef {
    /// The reactor, if it is still alive.
    pub fn upgrade(&self) -> Option<Reactor> {
        self.0.upgrade().map(Reactor::from_core)
    }
}

/// A single-threaded event reactor.
///
/// The reactor owns a central event collector, a set of registered
/// selectables, a timer, and a pair of handlers (root and global).
/// [`process`](Self::process) repeatedly peeks the next event,
/// resolves the most specific handler for it, invokes it followed by
/// the global handler, and pops the event. It quiesces once per drain
/// cycle and terminates cleanly when no work remains.
///
/// `Reactor` is a cheap cloneable handle; clones share one reactor.
/// All of it runs on the calling thread: handlers run to completion
/// and may call back into the reactor while they do.
///
/// # Examples
///
/// ```rust,ignore
/// let reactor = Reactor::new();
/// reactor.run();
/// ```
#[derive(Clone)]
pub struct Reactor {
    core: Rc<ReactorCore>,
}

impl PartialEq for Reactor {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }
}

impl Default for Reactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Reactor {
    /// Creates a reactor with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a reactor with the given configuration.
    pub fn with_config(config: Config) -> Self {
        let collector = Rc::new(Collector::new(config.event_capacity));
        let timer = Timer::new(collector.clone());

        Self {
            core: Rc::new(ReactorCore {
                config,
                attachments: Record::default(),
                collector,
                timer,
                global: RefCell::new(Rc::new(ReleaseHandler) as Rc<dyn Handler>),
                handler: RefCell::new(Rc::new(NullHandler) as Rc<dyn Handler>),
                children: RefCell::new(Vec::new()),
                timer_selectable: RefCell::new(None),
                previous: Cell::new(EventType::None),
                now: Cell::new(Instant::now()),
                selectables: Cell::new(0),
                timeout: Cell::new(Duration::ZERO),
                yielded: Cell::new(false),
                processing: Cell::new(false),
                stopping: Cell::new(false),
            }),
        }
    }

    pub(crate) fn from_core(core: Rc<ReactorCore>) -> Self {
        Self { core }
    }

    /// A weak handle to this reactor.
    pub fn downgrade(&self) -> ReactorRef {
        ReactorRef(Rc::downgrade(&self.core))
    }

    pub fn attachments(&self) -> &Record {
        &self.core.attachments
    }

    /// The reactor's event collector. External collaborators publish
    /// protocol events through it.
    pub fn collector(&self) -> Rc<Collector> {
        self.core.collector.clone()
    }

    /// The selectables currently registered, the internal timer
    /// selectable included. A host loop reads these to compute ready
    /// sets and invoke their callbacks.
    pub fn children(&self) -> Vec<Rc<Selectable>> {
        self.core.children.borrow().clone()
    }

    /// The global handler, invoked after the resolved handler for
    /// every event.
    pub fn global(&self) -> Rc<dyn Handler> {
        self.core.global.borrow().clone()
    }

    /// Replaces the global handler. The default
    /// [`ReleaseHandler`](crate::handler::ReleaseHandler) releases
    /// finalized selectables; a replacement that does not delegate to
    /// it takes over that duty.
    pub fn set_global(&self, handler: Rc<dyn Handler>) {
        *self.core.global.borrow_mut() = handler;
    }

    /// The root handler: the fallback when no entity on the event's
    /// resolution path carries one.
    pub fn handler(&self) -> Rc<dyn Handler> {
        self.core.handler.borrow().clone()
    }

    pub fn set_handler(&self, handler: Rc<dyn Handler>) {
        *self.core.handler.borrow_mut() = handler;
    }

    /// The I/O timeout stored by the last [`work`](Self::work) call,
    /// for the external selector to consult.
    pub fn timeout(&self) -> Duration {
        self.core.timeout.get()
    }

    /// The monotonic snapshot taken at the last [`mark`](Self::mark).
    pub fn now(&self) -> Instant {
        self.core.now.get()
    }

    /// Refreshes the monotonic snapshot. Within one `process` call
    /// every deadline computation uses a single snapshot, keeping
    /// ordering reproducible.
    pub fn mark(&self) {
        self.core.now.set(Instant::now());
    }

    /// Requests a cooperative yield: `process` returns `true` before
    /// dispatching the next queued event. A yield requested when the
    /// queue is already empty does not interrupt the quiesce and
    /// termination accounting.
    pub fn yield_now(&self) {
        self.core.yielded.set(true);
    }

    /// Registers a new selectable: links it to the collector,
    /// publishes its `SelectableInit`, and adds it to the children
    /// list with a release callback that detaches it exactly once.
    pub fn register_selectable(&self) -> Result<Rc<Selectable>, ReactorError> {
        let core = &self.core;
        if core.collector.is_released() {
            return Err(ReactorError::Stopped);
        }

        let selectable = Selectable::new();
        selectable.collect(&core.collector);
        selectable.put(EventType::SelectableInit);
        selectable.set_context(core);
        core.children.borrow_mut().push(selectable.clone());
        selectable.on_release(|selectable| {
            if let Some(reactor) = selectable.context() {
                reactor.detach_child(selectable);
            }
        });
        core.selectables.set(core.selectables.get() + 1);

        trace!(selectables = core.selectables.get(), "selectable registered");
        Ok(selectable)
    }

    /// Publishes a selectable's state change: `SelectableUpdated`
    /// while it lives, one `SelectableFinal` once it is terminal,
    /// nothing after that.
    pub fn update(&self, selectable: &Rc<Selectable>) {
        let record = selectable.attachments();
        if record.is_terminated() {
            return;
        }
        if selectable.is_terminal() {
            record.mark_terminated();
            selectable.put(EventType::SelectableFinal);
        } else {
            selectable.put(EventType::SelectableUpdated);
        }
    }

    pub(crate) fn detach_child(&self, selectable: &Rc<Selectable>) {
        let core = &self.core;
        let mut children = core.children.borrow_mut();
        let before = children.len();
        children.retain(|child| !Rc::ptr_eq(child, selectable));
        if children.len() < before {
            core.selectables.set(core.selectables.get() - 1);
            trace!(selectables = core.selectables.get(), "selectable detached");
        }
    }

    /// Schedules a task to mature after `delay`, routed to `handler`
    /// (or to the resolution fallback when `None`).
    ///
    /// The deadline is computed against the current [`now`](Self::now)
    /// snapshot. Tasks with equal deadlines are delivered in the
    /// order they were scheduled.
    pub fn schedule(
        &self,
        delay: Duration,
        handler: Option<Rc<dyn Handler>>,
    ) -> Result<Rc<Task>, ReactorError> {
        let core = &self.core;
        if core.collector.is_released() {
            return Err(ReactorError::Stopped);
        }

        let task = core.timer.schedule(core.now.get() + delay);
        task.attachments().bind_reactor(core);
        if let Some(handler) = handler {
            task.attachments().set_handler(handler);
        }

        if let Some(selectable) = core.timer_selectable.borrow().as_ref() {
            selectable.set_deadline(core.timer.deadline());
            self.update(selectable);
        }

        Ok(task)
    }

    /// Starts the reactor: publishes `ReactorInit` and registers the
    /// internal timer selectable. A second call while the timer
    /// selectable exists is a no-op, as is starting after `stop`.
    pub fn start(&self) {
        let core = &self.core;
        if core.timer_selectable.borrow().is_some() {
            return;
        }

        core.collector
            .put(EventType::ReactorInit, EventContext::Reactor(self.downgrade()));

        if let Ok(selectable) = self.register_selectable() {
            selectable.on_expired(|selectable| {
                if let Some(reactor) = selectable.context() {
                    reactor.core.timer.tick(reactor.core.now.get());
                    selectable.set_deadline(reactor.core.timer.deadline());
                    reactor.update(selectable);
                }
            });
            selectable.set_deadline(core.timer.deadline());
            *core.timer_selectable.borrow_mut() = Some(selectable);
            debug!("reactor started");
        }
    }

    /// Stores the I/O timeout and runs one [`process`](Self::process)
    /// pass.
    pub fn work(&self, timeout: Duration) -> bool {
        self.core.timeout.set(timeout);
        self.process()
    }

    /// Starts, works until drained, stops.
    pub fn run(&self) {
        self.start();
        while self.work(self.core.config.work_timeout) {}
        self.stop();
    }

    /// Stops the reactor: publishes `ReactorFinal`, drains, and
    /// releases the collector. Idempotent.
    ///
    /// Called re-entrantly from a handler, it only enqueues the final
    /// event and flags the in-flight `process` call, which finishes
    /// the drain and then releases the collector.
    pub fn stop(&self) {
        let core = &self.core;
        core.collector
            .put(EventType::ReactorFinal, EventContext::Reactor(self.downgrade()));
        if core.processing.get() {
            core.stopping.set(true);
            return;
        }
        self.process();
        core.collector.release();
        debug!("reactor stopped");
    }

    /// Dispatches queued events until a yield is honored, the reactor
    /// quiesces, or no work remains.
    ///
    /// Returns `true` while the reactor still has potential work and
    /// `false` once it is fully drained. Never fails: handler
    /// outcomes are opaque and treated as success. Re-entered from a
    /// handler, it returns `true` without dispatching; the in-flight
    /// pass keeps going.
    pub fn process(&self) -> bool {
        let core = &self.core;
        if core.processing.get() {
            return true;
        }
        core.processing.set(true);
        let result = self.process_loop();
        core.processing.set(false);
        if core.stopping.take() {
            core.collector.release();
        }
        result
    }

    fn process_loop(&self) -> bool {
        let core = &self.core;
        self.mark();
        let mut previous = EventType::None;
        loop {
            match core.collector.peek() {
                Some(event) => {
                    if core.yielded.get() {
                        core.yielded.set(false);
                        return true;
                    }
                    core.yielded.set(false);

                    trace!(event = ?event.event_type(), class = ?event.class(), "dispatching");
                    self.dispatch_pre(&event);
                    let fallback = core.handler.borrow().clone();
                    let resolved = handler::resolve(&event, &fallback);
                    resolved.on_event(self, &event);
                    let global = core.global.borrow().clone();
                    global.on_event(self, &event);
                    self.dispatch_post(&event);

                    previous = event.event_type();
                    core.previous.set(previous);
                    core.collector.pop();
                }
                None => {
                    let timer_alive = core.timer_selectable.borrow().is_some();
                    if !self.more() && !timer_alive {
                        return false;
                    }

                    let persistent = core.previous.get();
                    if previous != EventType::ReactorQuiesced
                        && persistent != EventType::ReactorQuiesced
                        && persistent != EventType::ReactorFinal
                    {
                        core.collector.put(
                            EventType::ReactorQuiesced,
                            EventContext::Reactor(self.downgrade()),
                        );
                        continue;
                    }
                    if self.more() {
                        return true;
                    }
                    if previous == EventType::ReactorQuiesced {
                        return true;
                    }

                    // Only the timer selectable is left and the
                    // quiescent state has been observed: wind it down
                    // and let its final drain.
                    let selectable = core.timer_selectable.borrow_mut().take();
                    if let Some(selectable) = selectable {
                        selectable.terminate();
                        self.update(&selectable);
                    }
                }
            }
        }
    }

    fn more(&self) -> bool {
        self.core.timer.tasks() > 0 || self.core.selectables.get() > 1
    }

    fn dispatch_pre(&self, event: &Event) {
        if event.event_type() == EventType::ConnectionInit {
            if let Some(connection) = event.connection() {
                connection.attachments().bind_reactor(&self.core);
            }
        }
    }

    fn dispatch_post(&self, event: &Event) {
        if event.event_type() == EventType::ConnectionFinal {
            if let Some(connection) = event.connection() {
                connection.unbind_transport();
            }
        }
    }
}
