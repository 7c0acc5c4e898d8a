use super::*;
use crate::host::create_context;
use crate::test_support::FakeHost;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

fn controller() -> (Controller, Rc<FakeHost>) {
    let host = FakeHost::new();
    let controller = Controller::new(ComponentId::next(), Rc::from("Widget"), host.clone());
    (controller, host)
}

fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Task) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let record = move |label: &'static str| -> Task {
        let sink = Rc::clone(&sink);
        Box::new(move || sink.borrow_mut().push(label))
    };
    (log, record)
}

#[test]
fn notify_runs_callbacks_in_registration_order() {
    let (controller, _host) = controller();
    let (log, record) = recorder();

    controller.after_mount(record("first"));
    controller.after_mount(record("second"));
    controller.before_update(record("update"));
    controller.after_mount(record("third"));

    controller.notify(LifecycleEvent::AfterMount);
    assert_eq!(*log.borrow(), vec!["first", "second", "third"]);

    controller.notify(LifecycleEvent::BeforeUpdate);
    assert_eq!(log.borrow().last(), Some(&"update"));
}

#[test]
fn callbacks_are_not_deduplicated() {
    let (controller, _host) = controller();
    let calls = Rc::new(Cell::new(0));
    for _ in 0..3 {
        let calls = Rc::clone(&calls);
        controller.after_update(move || calls.set(calls.get() + 1));
    }

    controller.notify(LifecycleEvent::AfterUpdate);
    controller.notify(LifecycleEvent::AfterUpdate);

    assert_eq!(calls.get(), 6);
    assert_eq!(controller.callback_count(LifecycleEvent::AfterUpdate), 3);
}

#[test]
fn callback_registered_during_notify_runs_next_time() {
    let (controller, _host) = controller();
    let (log, record) = recorder();
    let late = Rc::new(RefCell::new(Some(record("late"))));

    {
        let controller = controller.clone();
        let late = Rc::clone(&late);
        let sink = Rc::clone(&log);
        controller.clone().after_update(move || {
            sink.borrow_mut().push("early");
            if let Some(task) = late.borrow_mut().take() {
                controller.after_update(task);
            }
        });
    }

    controller.notify(LifecycleEvent::AfterUpdate);
    assert_eq!(*log.borrow(), vec!["early"]);

    controller.notify(LifecycleEvent::AfterUpdate);
    assert_eq!(*log.borrow(), vec!["early", "early", "late"]);
}

#[test]
fn panicking_callback_propagates_and_keeps_list() {
    let (controller, _host) = controller();
    let (log, record) = recorder();
    let armed = Rc::new(Cell::new(true));

    controller.before_update(record("before"));
    {
        let armed = Rc::clone(&armed);
        controller.before_update(move || {
            if armed.replace(false) {
                panic!("extension failure");
            }
        });
    }
    controller.before_update(record("after"));

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        controller.notify(LifecycleEvent::BeforeUpdate);
    }));
    assert!(outcome.is_err());
    assert_eq!(*log.borrow(), vec!["before"]);
    assert_eq!(controller.callback_count(LifecycleEvent::BeforeUpdate), 3);

    controller.notify(LifecycleEvent::BeforeUpdate);
    assert_eq!(*log.borrow(), vec!["before", "before", "after"]);
}

#[test]
fn request_update_prefers_lightweight_signal() {
    let (controller, host) = controller();

    controller.refresh();
    controller.request_update(false);
    assert_eq!(host.scheduled.get(), 2);
    assert_eq!(host.forced.get(), 0);

    controller.request_update(true);
    assert_eq!(host.forced.get(), 1);
}

#[test]
fn disposed_controller_drops_callbacks_and_requests() {
    let (controller, host) = controller();
    let (log, record) = recorder();
    controller.before_unmount(record("unmount"));
    controller.after_update(record("update"));

    controller.notify(LifecycleEvent::BeforeUnmount);
    controller.dispose();
    assert!(controller.is_disposed());
    assert!(!controller.is_mounted());

    for event in LifecycleEvent::ALL {
        assert_eq!(controller.callback_count(event), 0, "{}", event.name());
    }

    controller.after_update(record("ignored"));
    controller.notify(LifecycleEvent::AfterUpdate);
    controller.refresh();

    assert_eq!(*log.borrow(), vec!["unmount"]);
    assert_eq!(host.requests(), 0);
}

#[test]
fn resolve_context_reads_lazily() {
    let (controller, host) = controller();
    let theme = create_context(|| "light".to_string());

    let read = controller.resolve_context(&theme);
    assert_eq!(read.get(), "light");

    host.provide(&theme, "dark".to_string());
    assert_eq!(read.get(), "dark");
}

#[test]
fn component_ids_are_unique_and_displayed() {
    let a = ComponentId::next();
    let b = ComponentId::next();
    assert_ne!(a, b);
    assert_eq!(a.to_string(), format!("#{}", a.as_u64()));
}
