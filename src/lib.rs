//! # Nuntius
//!
//! **Nuntius** is a lightweight, single-threaded event reactor for
//! asynchronous messaging stacks.
//!
//! Unlike general-purpose async runtimes, Nuntius focuses on one job:
//! owning a central event queue, a set of I/O-capable selectables and
//! a timer, and dispatching every event through the right handler
//! chain until no work remains. I/O readiness itself stays with the
//! host: an external loop selects over the registered selectables and
//! invokes their callbacks, while the reactor turns readiness and
//! deadlines into ordered, typed events.
//!
//! It offers:
//!
//! - A **cooperative dispatch loop** with quiesce and termination
//!   accounting, and a yield primitive to hand control back between
//!   events
//! - **Derived handler routing**: link, session, connection, task and
//!   selectable handlers resolved most-specific-first at dispatch
//!   time, with a global handler seeing every event
//! - **Timers** delivered as events, FIFO-ordered for equal deadlines
//! - **Selectables** with deadlines, terminal accounting, and
//!   driver-invoked readiness callbacks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nuntius::handler::Handler;
//! use nuntius::{Reactor, event::Event};
//! use std::rc::Rc;
//! use std::time::Duration;
//!
//! struct Tick;
//!
//! impl Handler for Tick {
//!     fn on_event(&self, _reactor: &Reactor, event: &Event) {
//!         println!("fired: {:?}", event.event_type());
//!     }
//! }
//!
//! let reactor = Reactor::new();
//! reactor.start();
//! reactor.schedule(Duration::from_millis(50), Some(Rc::new(Tick)))?;
//! while reactor.work(Duration::from_millis(100)) {
//!     // host I/O loop: select over reactor.children(), invoke
//!     // readable()/writable()/expired() on the ready ones
//! }
//! reactor.stop();
//! ```
//!
//! ## Modules
//!
//! - [`collector`] — FIFO queue of typed events awaiting dispatch
//! - [`event`] — event types, entity classes, and context accessors
//! - [`handler`] — the [`Handler`](handler::Handler) trait and
//!   dispatch-time resolution
//! - [`entity`] — minimal connection/session/link/delivery/transport
//!   entities
//! - [`selectable`] — registered I/O resources with deadlines
//! - [`timer`] — deadline-ordered task scheduling
//! - [`record`] — per-entity attachment records

pub mod collector;
pub mod entity;
pub mod event;
pub mod handler;
pub mod record;
pub mod selectable;
pub mod timer;

mod reactor;

pub use reactor::{Config, Reactor, ReactorError, ReactorRef};
