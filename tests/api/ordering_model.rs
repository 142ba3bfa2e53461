//! Model-based test of registration bookkeeping: for any sequence of registrations,
//! unregistrations, and dropped listeners, firing delivers to exactly the listeners a
//! simple list model says are registered, in the order it says.

use proptest::prelude::*;
use tattle::unsync::{dyn_listener, DynListener, Observers};
use tattle::{Error, Fault, FnListener, Listener as _, Log, LogListener, SenderKey};

const LISTENERS: usize = 4;

#[derive(Clone, Copy, Debug)]
enum Op {
    Register { id: usize, weak: bool },
    Unregister { id: usize },
    /// Drop the test's own strong reference to the listener.
    Drop { id: usize },
    Fire,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..LISTENERS, any::<bool>()).prop_map(|(id, weak)| Op::Register { id, weak }),
        (0..LISTENERS).prop_map(|id| Op::Unregister { id }),
        (0..LISTENERS).prop_map(|id| Op::Drop { id }),
        Just(Op::Fire),
    ]
}

/// A registration as the model sees it. `generation` distinguishes successive listeners
/// created for the same `id`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Registration {
    id: usize,
    generation: usize,
    weak: bool,
}

fn tagged_listener(log: LogListener<usize>, id: usize) -> DynListener<()> {
    dyn_listener(FnListener(move |_: &()| -> Result<(), Fault> {
        log.receive(&id)
    }))
}

proptest! {
    #[test]
    fn fire_matches_list_model(ops in proptest::collection::vec(op_strategy(), 0..40)) {
        let observers: Observers<()> = Observers::new();
        let sender = SenderKey::new();
        let log = Log::new();

        let mut handles: [Option<(usize, DynListener<()>)>; LISTENERS] = Default::default();
        let mut model: Vec<Registration> = Vec::new();
        let mut next_generation = 0;

        for op in ops {
            match op {
                Op::Register { id, weak } => {
                    let (generation, listener) = handles[id]
                        .get_or_insert_with(|| {
                            next_generation += 1;
                            (next_generation, tagged_listener(log.listener(), id))
                        })
                        .clone();
                    let result = if weak {
                        observers.register_weak(&sender, listener)
                    } else {
                        observers.register(&sender, listener)
                    };
                    if model.iter().any(|r| r.generation == generation) {
                        prop_assert!(matches!(result, Err(Error::AlreadyRegistered)));
                    } else {
                        prop_assert!(result.is_ok());
                        model.push(Registration { id, generation, weak });
                    }
                }
                Op::Unregister { id } => {
                    if let Some((generation, listener)) = &handles[id] {
                        observers.unregister(&sender, listener);
                        model.retain(|r| r.generation != *generation);
                    }
                }
                Op::Drop { id } => {
                    if let Some((generation, _)) = handles[id].take() {
                        model.retain(|r| !(r.generation == generation && r.weak));
                    }
                }
                Op::Fire => {
                    observers.fire(&sender, ()).unwrap();
                    let expected: Vec<usize> = model.iter().map(|r| r.id).collect();
                    prop_assert_eq!(log.drain(), expected);
                }
            }
            prop_assert_eq!(observers.count(&sender), model.len());
        }

        observers.unregister_all(&sender);
        prop_assert_eq!(observers.sender_count(), 0);
    }
}
