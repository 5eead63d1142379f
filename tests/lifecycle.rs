use nuntius::event::{Event, EventType};
use nuntius::handler::Handler;
use nuntius::{Reactor, ReactorError};

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

struct Recorder {
    seen: Rc<RefCell<Vec<EventType>>>,
}

impl Handler for Recorder {
    fn on_event(&self, _reactor: &Reactor, event: &Event) {
        self.seen.borrow_mut().push(event.event_type());
    }
}

fn recording_reactor() -> (Reactor, Rc<RefCell<Vec<EventType>>>) {
    let reactor = Reactor::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    reactor.set_handler(Rc::new(Recorder { seen: seen.clone() }));
    (reactor, seen)
}

#[test]
fn empty_run_quiesces_once_then_terminates() {
    let (reactor, seen) = recording_reactor();

    reactor.start();
    let mut returns = Vec::new();
    loop {
        let more = reactor.work(Duration::from_millis(1000));
        returns.push(more);
        if !more {
            break;
        }
    }
    reactor.stop();

    assert_eq!(
        *seen.borrow(),
        vec![
            EventType::ReactorInit,
            EventType::SelectableInit,
            EventType::ReactorQuiesced,
            EventType::SelectableFinal,
            EventType::ReactorFinal,
        ],
        "an empty run must init, quiesce once, wind down the timer selectable, and finalize"
    );
    assert_eq!(
        returns,
        vec![true, false],
        "one quiescent pass, then a drained one"
    );
}

#[test]
fn double_stop_is_observationally_single() {
    let (reactor, seen) = recording_reactor();

    reactor.run();
    let after_first = seen.borrow().clone();

    reactor.stop();

    assert_eq!(
        *seen.borrow(),
        after_first,
        "a second stop must not dispatch anything"
    );
    let finals = seen
        .borrow()
        .iter()
        .filter(|t| **t == EventType::ReactorFinal)
        .count();
    assert_eq!(finals, 1, "ReactorFinal is emitted exactly once");
}

#[test]
fn quiesced_is_never_adjacent_and_never_follows_final() {
    let (reactor, seen) = recording_reactor();

    reactor.start();
    reactor
        .schedule(Duration::from_millis(10), None)
        .expect("reactor is live");
    assert!(reactor.work(Duration::from_millis(1000)));

    std::thread::sleep(Duration::from_millis(20));
    reactor.mark();
    let timer_selectable = reactor
        .children()
        .into_iter()
        .next()
        .expect("the timer selectable is registered at start");
    timer_selectable.expired();

    while reactor.work(Duration::from_millis(1000)) {}
    reactor.stop();

    let events = seen.borrow().clone();
    assert!(
        events.contains(&EventType::TimerTask),
        "the scheduled task must have matured"
    );
    for pair in events.windows(2) {
        assert!(
            !(pair[0] == EventType::ReactorQuiesced && pair[1] == EventType::ReactorQuiesced),
            "two adjacent ReactorQuiesced events in {events:?}"
        );
    }
    let final_at = events
        .iter()
        .position(|t| *t == EventType::ReactorFinal)
        .expect("stop dispatches ReactorFinal");
    assert!(
        events[final_at..]
            .iter()
            .all(|t| *t != EventType::ReactorQuiesced),
        "ReactorQuiesced after ReactorFinal in {events:?}"
    );
}

#[test]
fn creating_calls_fail_once_stopped() {
    let reactor = Reactor::new();
    reactor.run();

    assert!(matches!(
        reactor.schedule(Duration::ZERO, None),
        Err(ReactorError::Stopped)
    ));
    assert!(matches!(
        reactor.register_selectable(),
        Err(ReactorError::Stopped)
    ));
}

#[test]
fn drained_reactor_stays_drained_until_new_work() {
    let (reactor, _seen) = recording_reactor();

    reactor.start();
    while reactor.work(Duration::from_millis(1000)) {}

    assert!(!reactor.work(Duration::from_millis(1000)));
    assert!(!reactor.work(Duration::from_millis(1000)));

    reactor
        .schedule(Duration::from_millis(5), None)
        .expect("reactor is drained but not stopped");
    assert!(
        reactor.work(Duration::from_millis(1000)),
        "a fresh task is potential work again"
    );
}
