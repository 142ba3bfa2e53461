//! The tests in this module don't quite fit the uniform `any_flavor` model, so they are
//! not in that group.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use tattle::{sync, unsync, Fault, Flag, Listener, Log, NullListener, Observers, SenderKey};

#[test]
fn dyn_listener_unsync() {
    let log = Log::new();
    let listener: unsync::DynListener<&str> = unsync::dyn_listener(log.listener());
    listener.receive(&"a").unwrap();
    assert_eq!(log.drain(), vec!["a"]);

    // Identity is the pointer, so clones are the same listener.
    assert!(Rc::ptr_eq(&listener, &listener.clone()));
    assert_eq!(format!("{listener:?}"), "LogListener { alive: true }");
}

#[test]
fn dyn_listener_sync() {
    // Flag, unlike Log, is always Send + Sync so is ok to use in this test
    // without making it conditional.
    let flag = Flag::new(false);
    let listener: sync::DynListener<&str> = sync::dyn_listener(flag.listener());
    listener.receive(&"a").unwrap();
    assert_eq!(flag.get_and_clear(), true);
    assert!(Arc::ptr_eq(&listener, &listener.clone()));
}

/// A registry whose listeners are plain callbacks rather than [`Listener`]s.
#[test]
fn custom_delivery() {
    type Callback = Rc<dyn Fn(&i32) -> Result<(), Fault>>;

    let observers: Observers<i32, Callback> =
        Observers::with_delivery(|callback, message| callback(message));
    let sender = SenderKey::new();
    let total = Rc::new(Cell::new(0));

    let adder: Callback = {
        let total = total.clone();
        Rc::new(move |n: &i32| -> Result<(), Fault> {
            total.set(total.get() + n);
            Ok(())
        })
    };
    observers.register(&sender, adder.clone()).unwrap();
    observers.fire(&sender, 2).unwrap();
    observers.fire(&sender, 3).unwrap();
    assert_eq!(total.get(), 5);

    observers.unregister(&sender, &adder);
    observers.fire(&sender, 100).unwrap();
    assert_eq!(total.get(), 5);
}

#[test]
fn custom_delivery_weak() {
    type Callback = Rc<dyn Fn(&()) -> Result<(), Fault>>;

    let observers: Observers<(), Callback> =
        Observers::with_delivery(|callback, message| callback(message));
    let sender = SenderKey::new();
    let calls = Rc::new(Cell::new(0));
    let counter: Callback = {
        let calls = calls.clone();
        Rc::new(move |_: &()| -> Result<(), Fault> {
            calls.set(calls.get() + 1);
            Ok(())
        })
    };
    observers.register_weak(&sender, counter.clone()).unwrap();
    observers.fire(&sender, ()).unwrap();
    drop(counter);
    observers.fire(&sender, ()).unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn separate_allocations_are_separate_listeners() {
    // Even of a zero-sized listener: identity is the allocation.
    let observers: unsync::Observers<()> = Observers::new();
    let sender = SenderKey::new();
    observers
        .register(&sender, unsync::dyn_listener(NullListener))
        .unwrap();
    observers
        .register(&sender, unsync::dyn_listener(NullListener))
        .unwrap();
    assert_eq!(observers.count(&sender), 2);
}
