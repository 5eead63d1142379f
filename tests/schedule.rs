use nuntius::event::{Event, EventType};
use nuntius::handler::Handler;
use nuntius::timer::Task;
use nuntius::Reactor;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

struct TaskRecorder {
    fired: Rc<RefCell<Vec<Rc<Task>>>>,
}

impl Handler for TaskRecorder {
    fn on_event(&self, _reactor: &Reactor, event: &Event) {
        if event.event_type() == EventType::TimerTask {
            self.fired
                .borrow_mut()
                .push(event.task().expect("timer events carry their task"));
        }
    }
}

struct Tag {
    id: u32,
    order: Rc<RefCell<Vec<u32>>>,
}

impl Handler for Tag {
    fn on_event(&self, _reactor: &Reactor, event: &Event) {
        if event.event_type() == EventType::TimerTask {
            self.order.borrow_mut().push(self.id);
        }
    }
}

#[test]
fn scheduled_task_fires_exactly_once() {
    let reactor = Reactor::new();
    reactor.start();

    let fired = Rc::new(RefCell::new(Vec::new()));
    let task = reactor
        .schedule(
            Duration::from_millis(50),
            Some(Rc::new(TaskRecorder {
                fired: fired.clone(),
            })),
        )
        .expect("reactor is live");

    assert!(
        reactor.work(Duration::from_millis(1000)),
        "a pending task keeps the reactor alive"
    );
    assert!(fired.borrow().is_empty(), "nothing fires before maturity");

    std::thread::sleep(Duration::from_millis(60));
    reactor.mark();
    let timer_selectable = reactor
        .children()
        .into_iter()
        .next()
        .expect("the timer selectable is registered at start");
    timer_selectable.expired();
    reactor.work(Duration::from_millis(1000));

    let fired = fired.borrow();
    assert_eq!(fired.len(), 1, "exactly one TimerTask per matured task");
    assert!(
        Rc::ptr_eq(&fired[0], &task),
        "the event context is the scheduled task"
    );
}

#[test]
fn equal_deadlines_fire_in_schedule_order() {
    let reactor = Reactor::new();
    reactor.start();

    let order = Rc::new(RefCell::new(Vec::new()));
    for id in 1..=3 {
        reactor
            .schedule(
                Duration::ZERO,
                Some(Rc::new(Tag {
                    id,
                    order: order.clone(),
                })),
            )
            .expect("reactor is live");
    }

    let timer_selectable = reactor
        .children()
        .into_iter()
        .next()
        .expect("the timer selectable is registered at start");
    timer_selectable.expired();
    reactor.work(Duration::from_millis(1000));

    assert_eq!(
        *order.borrow(),
        vec![1, 2, 3],
        "equal deadlines deliver in FIFO insertion order"
    );
}

#[test]
fn cancelled_task_never_fires() {
    let reactor = Reactor::new();
    reactor.start();

    let order = Rc::new(RefCell::new(Vec::new()));
    let doomed = reactor
        .schedule(
            Duration::ZERO,
            Some(Rc::new(Tag {
                id: 1,
                order: order.clone(),
            })),
        )
        .expect("reactor is live");
    reactor
        .schedule(
            Duration::ZERO,
            Some(Rc::new(Tag {
                id: 2,
                order: order.clone(),
            })),
        )
        .expect("reactor is live");

    doomed.cancel();

    let timer_selectable = reactor
        .children()
        .into_iter()
        .next()
        .expect("the timer selectable is registered at start");
    timer_selectable.expired();
    reactor.work(Duration::from_millis(1000));

    assert_eq!(
        *order.borrow(),
        vec![2],
        "only the surviving task is delivered"
    );
}

#[test]
fn schedule_refreshes_the_timer_selectable_deadline() {
    let reactor = Reactor::new();
    reactor.start();

    let timer_selectable = reactor
        .children()
        .into_iter()
        .next()
        .expect("the timer selectable is registered at start");
    assert_eq!(
        timer_selectable.deadline(),
        None,
        "no deadline while the heap is empty"
    );

    let task = reactor
        .schedule(Duration::from_millis(100), None)
        .expect("reactor is live");

    assert_eq!(
        timer_selectable.deadline(),
        Some(task.deadline()),
        "scheduling refreshes the carried deadline"
    );
}
