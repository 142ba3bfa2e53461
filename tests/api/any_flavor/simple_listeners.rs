use super::flavor::{dyn_listener, Observers};
use tattle::{Flag, FnListener, Listener as _, Log, NullListener, SenderKey};

#[test]
fn null_accepts_everything() {
    let observers: Observers<()> = Observers::new();
    let sender = SenderKey::new();
    observers.register(&sender, dyn_listener(NullListener)).unwrap();
    observers.fire(&sender, ()).unwrap();
    assert_eq!(observers.count(&sender), 1);
}

#[test]
fn tuple() {
    let log = Log::new();

    assert!((log.listener(), NullListener).receive(&"LN").is_ok());
    assert_eq!(log.drain(), vec!["LN"]);

    assert!((log.listener(), log.listener()).receive(&"LL").is_ok());
    assert_eq!(log.drain(), vec!["LL", "LL"]);

    // A failure in the first listener means the second never hears the message.
    let failing = FnListener(|_: &&str| -> Result<(), tattle::Fault> { Err("no".into()) });
    assert!((failing, log.listener()).receive(&"FL").is_err());
    assert!((log.listener(), failing).receive(&"LF").is_err());
    assert_eq!(log.drain(), vec!["LF"]);
}

#[test]
fn log_outlived_by_listener() {
    let observers: Observers<u8> = Observers::new();
    let sender = SenderKey::new();
    let log = Log::new();
    observers.register(&sender, dyn_listener(log.listener())).unwrap();
    observers.fire(&sender, 1).unwrap();
    assert_eq!(log.drain(), vec![1]);

    // The registration outlives the log, and then does nothing.
    drop(log);
    observers.fire(&sender, 2).unwrap();
    assert_eq!(observers.count(&sender), 1);
}

#[test]
fn log_debug() {
    let log = Log::new();
    log.listener().receive(&"x").unwrap();
    assert_eq!(format!("{log:?}"), r#"Log(["x"])"#);
    assert_eq!(
        format!("{:?}", log.listener()),
        "LogListener { alive: true }"
    );
}

#[test]
fn flag_set() {
    let observers: Observers<&str> = Observers::new();
    let sender = SenderKey::new();
    let flag = Flag::new(false);
    observers.register(&sender, dyn_listener(flag.listener())).unwrap();

    assert!(!flag.get_and_clear());
    observers.fire(&sender, "a").unwrap();
    observers.fire(&sender, "b").unwrap();
    assert!(flag.get_and_clear());
    assert!(!flag.get_and_clear());

    flag.set();
    assert!(flag.get_and_clear());
}

#[test]
fn flag_debug() {
    assert_eq!(format!("{:?}", Flag::new(false)), "Flag(false)");
    assert_eq!(format!("{:?}", Flag::new(true)), "Flag(true)");

    // Test the listener's Debug in all states too
    let flag = Flag::new(false);
    let listener = flag.listener();
    assert_eq!(
        format!("{flag:?} {listener:?}"),
        "Flag(false) FlagListener { alive: true, value: false }"
    );
    listener.receive(&()).unwrap();
    assert_eq!(
        format!("{flag:?} {listener:?}"),
        "Flag(true) FlagListener { alive: true, value: true }"
    );
    drop(flag);
    assert_eq!(format!("{listener:?}"), "FlagListener { alive: false }");
}
