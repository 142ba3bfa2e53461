use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};
use std::sync::{Arc, Mutex};

use super::flavor::{dyn_listener, DynListener, Observers};
use pretty_assertions::assert_eq;
use tattle::{
    Error, Fault, FnListener, Listener, Log, NullListener, Observable, Observation, SenderKey,
};

#[test]
fn basics_and_debug() {
    let observers: Observers<u8> = Observers::new();
    let sender = SenderKey::new();
    assert_eq!(format!("{observers:?}"), "Observers { senders: 0, entries: 0 }");
    // No listeners is not an error.
    assert_eq!(observers.fire(&sender, 0).unwrap(), 0);

    let log = Log::new();
    let listener = observers
        .register(&sender, dyn_listener(log.listener()))
        .unwrap();
    assert_eq!(format!("{observers:?}"), "Observers { senders: 1, entries: 1 }");
    // type annotation to prevent spurious inference failures in the presence
    // of other compiler errors
    assert_eq!(log.drain(), Vec::<u8>::new());
    observers.fire(&sender, 1).unwrap();
    observers.fire(&sender, 2).unwrap();
    assert_eq!(log.drain(), vec![1, 2]);

    observers.unregister(&sender, &listener);
    observers.fire(&sender, 3).unwrap();
    assert_eq!(log.drain(), Vec::<u8>::new());
}

#[test]
fn register_then_fire_delivers_exactly_once() {
    let observers: Observers<&str> = Observers::new();
    let sender = SenderKey::new();
    let log = Log::new();
    let listener = observers
        .register(&sender, dyn_listener(log.listener()))
        .unwrap();

    let error = observers.register(&sender, listener.clone()).unwrap_err();
    assert!(matches!(error, Error::AlreadyRegistered));
    assert!(error.is_invalid_argument());

    observers.fire(&sender, "m").unwrap();
    assert_eq!(log.drain(), vec!["m"]);
}

#[test]
fn senders_do_not_share_listeners() {
    let observers: Observers<&str> = Observers::new();
    let a = SenderKey::new();
    let b = SenderKey::new();
    let log = Log::new();
    observers
        .register(&a, dyn_listener(log.listener()))
        .unwrap();

    observers.fire(&b, "to b").unwrap();
    observers.fire(&a.clone(), "to a").unwrap();
    assert_eq!(log.drain(), vec!["to a"]);
    assert_eq!(observers.count(&a), 1);
    assert_eq!(observers.count(&b), 0);
}

#[test]
fn unregister_is_tolerant() {
    let observers: Observers<()> = Observers::new();
    let sender = SenderKey::new();
    let never_registered: DynListener<()> = dyn_listener(NullListener);
    observers.unregister(&sender, &never_registered);
    observers.unregister_all(&sender);
    assert_eq!(observers.sender_count(), 0);
}

#[test]
fn weak_listener_is_not_kept_alive() {
    let observers: Observers<u8> = Observers::new();
    let sender = SenderKey::new();
    let log = Log::new();
    let listener = observers
        .register_weak(&sender, dyn_listener(log.listener()))
        .unwrap();
    observers.fire(&sender, 1).unwrap();
    assert_eq!(log.drain(), vec![1]);

    drop(listener);
    observers.fire(&sender, 2).unwrap();
    assert_eq!(log.drain(), Vec::<u8>::new());
    assert_eq!(observers.count(&sender), 0);
    assert_eq!(observers.sender_count(), 0);
}

#[test]
fn delivery_in_registration_order() {
    let observers: Observers<u8> = Observers::new();
    let sender = SenderKey::new();
    let log = Log::new();
    for tag in ["first", "second", "third"] {
        let log = log.listener();
        observers
            .register(
                &sender,
                dyn_listener(FnListener(move |_: &u8| Listener::receive(&log, &tag))),
            )
            .unwrap();
    }
    observers.fire(&sender, 0).unwrap();
    assert_eq!(log.drain(), vec!["first", "second", "third"]);
}

#[test]
fn listener_failure_stops_delivery() {
    let observers: Observers<u8> = Observers::new();
    let sender = SenderKey::new();
    let log = Log::new();
    observers
        .register(&sender, dyn_listener(log.listener()))
        .unwrap();
    observers
        .register(
            &sender,
            dyn_listener(FnListener(|m: &u8| -> Result<(), Fault> {
                if *m == 13 {
                    Err(Fault::from("unlucky"))
                } else {
                    Ok(())
                }
            })),
        )
        .unwrap();
    let after = Log::new();
    observers
        .register(&sender, dyn_listener(after.listener()))
        .unwrap();

    let error = observers.fire(&sender, 13).unwrap_err();
    let Error::Listener(fault) = &error else {
        panic!("unexpected error {error:?}");
    };
    assert_eq!(fault.to_string(), "unlucky");
    assert_eq!(
        std::error::Error::source(&error).map(ToString::to_string),
        Some("unlucky".to_owned())
    );
    // Listeners before the failure ran; listeners after it did not.
    assert_eq!(log.drain(), vec![13]);
    assert_eq!(after.drain(), Vec::<u8>::new());

    observers.fire(&sender, 14).unwrap();
    assert_eq!(after.drain(), vec![14]);
}

#[test]
fn listener_may_register_during_delivery() {
    let observers: Arc<Observers<u8>> = Arc::new(Observers::new());
    let sender = SenderKey::new();
    let late = Log::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let late_listener = dyn_listener(late.listener());
    let registrar = {
        let observers = Arc::downgrade(&observers);
        let sender = sender.clone();
        let calls = calls.clone();
        FnListener(move |_: &u8| -> Result<(), Fault> {
            calls.fetch_add(1, Relaxed);
            if let Some(observers) = observers.upgrade() {
                // Ignore duplicates on later messages.
                let _ = observers.register(&sender, late_listener.clone());
            }
            Ok(())
        })
    };
    observers
        .register(&sender, dyn_listener(registrar))
        .unwrap();

    // The listener registered during delivery is not part of that delivery.
    observers.fire(&sender, 1).unwrap();
    assert_eq!(late.drain(), Vec::<u8>::new());
    observers.fire(&sender, 2).unwrap();
    assert_eq!(late.drain(), vec![2]);
    assert_eq!(calls.load(Relaxed), 2);
}

#[test]
fn listener_may_unregister_itself_during_delivery() {
    let observers: Arc<Observers<u8>> = Arc::new(Observers::new());
    let sender = SenderKey::new();
    let log = Log::new();
    let me: Arc<Mutex<Option<DynListener<u8>>>> = Arc::new(Mutex::new(None));

    let once = {
        let observers = Arc::downgrade(&observers);
        let sender = sender.clone();
        let me = me.clone();
        let log = log.listener();
        FnListener(move |m: &u8| {
            if let (Some(observers), Some(me)) = (observers.upgrade(), me.lock().unwrap().take()) {
                observers.unregister(&sender, &me);
            }
            Listener::receive(&log, m)
        })
    };
    let once = observers
        .register(&sender, dyn_listener(once))
        .unwrap();
    *me.lock().unwrap() = Some(once);

    observers.fire(&sender, 1).unwrap();
    observers.fire(&sender, 2).unwrap();
    assert_eq!(log.drain(), vec![1]);
    assert_eq!(observers.count(&sender), 0);
}

#[test]
fn dropped_sender_is_forgotten() {
    let observers: Observers<()> = Observers::new();
    let sender = SenderKey::new();
    observers
        .register(&sender, dyn_listener(NullListener))
        .unwrap();
    assert_eq!(observers.sender_count(), 1);
    drop(sender);
    assert_eq!(observers.sender_count(), 0);
}

#[test]
fn observation_and_unregister_all() {
    let observers: Observers<u8> = Observers::new();
    let sender = SenderKey::new();
    let view: Observation<'_, u8, DynListener<u8>> = observers.observe(&sender);
    assert_eq!(view.sender(), &sender);

    let log = Log::new();
    view.register(dyn_listener(log.listener())).unwrap();
    view.register_weak(dyn_listener(NullListener)).unwrap();
    view.register(dyn_listener(NullListener)).unwrap();
    assert_eq!(view.count(), 2, "the weak NullListener should be gone");

    view.fire(5).unwrap();
    view.unregister_all();
    view.fire(6).unwrap();
    assert_eq!(log.drain(), vec![5]);
    assert_eq!(view.count(), 0);
    assert!(std::ptr::eq(view.observers(), &observers));
}

#[test]
fn custom_observable() {
    #[derive(Clone, Debug, PartialEq)]
    struct Renamed(&'static str);

    struct Document {
        key: SenderKey,
        observers: Arc<Observers<Renamed>>,
    }
    impl Observable for Document {
        type Msg = Renamed;
        type Listener = DynListener<Renamed>;

        fn observe(&self) -> Observation<'_, Self::Msg, Self::Listener> {
            self.observers.observe(&self.key)
        }
    }

    let observers = Arc::new(Observers::new());
    let doc = Document {
        key: SenderKey::new(),
        observers: observers.clone(),
    };
    let other = Document {
        key: SenderKey::new(),
        observers,
    };
    let log = Log::new();
    let listener = doc.register(dyn_listener(log.listener())).unwrap();
    // Same listener may observe several senders.
    other.register(listener.clone()).unwrap();

    doc.fire(Renamed("a")).unwrap();
    (&other).fire(Renamed("b")).unwrap();
    Box::new(&doc).unregister(&listener);
    doc.fire(Renamed("c")).unwrap();
    assert_eq!(log.drain(), vec![Renamed("a"), Renamed("b")]);
}

#[test]
fn without_delivery_is_unsupported() {
    let observers: Observers<()> = Observers::without_delivery();
    let sender = SenderKey::new();
    observers
        .register(&sender, dyn_listener(NullListener))
        .unwrap();
    assert!(matches!(
        observers.fire(&sender, ()),
        Err(Error::Unsupported)
    ));
}
