use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use crate::key::WeakSenderKey;
use crate::maybe_sync::Mutex;
use crate::{Error, Fault, Handle, Listener, SenderKey};

#[cfg(doc)]
use crate::{sync, unsync, Observable};

// -------------------------------------------------------------------------------------------------

/// Function which delivers one message to one listener, used by [`Observers::fire()`].
pub type Deliver<M, L> = fn(&L, &M) -> Result<(), Fault>;

/// Listener registry shared by any number of senders.
///
/// An `Observers<M, L>` keeps, for each [`SenderKey`], an ordered list of listeners of type
/// `L`, and delivers messages of type `M` fired by a sender to that sender's listeners, in
/// the order they were registered. Typically one registry exists per message type and is
/// shared via [`Arc`](alloc::sync::Arc) by every sender of that type of message;
/// senders never see each other's listeners.
///
/// Each listener is held either strongly ([`register()`](Self::register)) or weakly
/// ([`register_weak()`](Self::register_weak)). Weakly held listeners whose value has been
/// dropped are discarded whenever their sender's list is next touched.
///
/// The lists of senders whose keys have been dropped, together with any strongly held
/// listeners in them, are discarded by a sweep over the whole registry. The sweep runs
/// during registration, once the number of senders has doubled since the previous sweep,
/// and on every call to [`sender_count()`](Self::sender_count). Until a sweep runs, a
/// dropped sender's strongly held listeners stay alive; [`fire()`](Self::fire),
/// [`unregister()`](Self::unregister), and [`count()`](Self::count) never sweep.
///
/// We recommend that you use the type aliases [`sync::Observers`] or [`unsync::Observers`],
/// to avoid writing the type parameter `L` outside of special cases.
///
/// # Generic parameters
///
/// * `M` is the type of message delivered.
/// * `L` is the type of listener stored, usually a trait object pointer such as
///   [`unsync::DynListener<M>`](unsync::DynListener).
pub struct Observers<M, L: Handle> {
    table: Mutex<ListenerTable<L>>,
    deliver: Option<Deliver<M, L>>,
}

/// Registration entries for every sender, keyed by [`SenderKey::address()`].
struct ListenerTable<L: Handle> {
    buckets: BTreeMap<usize, Bucket<L>>,
    /// Bucket count at which registration next sweeps out dead senders.
    sweep_at: usize,
}

/// Lower bound for [`ListenerTable::sweep_at`], so small registries are not swept on
/// every registration.
const MIN_SWEEP_AT: usize = 16;

struct Bucket<L: Handle> {
    /// Keeps the key's address reserved for as long as this bucket exists.
    sender: WeakSenderKey,
    /// In registration order.
    entries: Vec<Entry<L>>,
}

struct Entry<L: Handle> {
    /// [`Handle::address()`] of the listener, cached so that weak entries can be compared.
    address: usize,
    held: Held<L>,
}

enum Held<L: Handle> {
    Strong(L),
    Weak(L::Weak),
}

// -------------------------------------------------------------------------------------------------

impl<M, L: Handle + Listener<M>> Observers<M, L> {
    /// Constructs a new [`Observers`] with no listeners, which delivers messages by calling
    /// [`Listener::receive()`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_delivery(deliver_to_listener::<M, L>)
    }
}

impl<M, L: Handle> Observers<M, L> {
    /// Constructs a new [`Observers`] with no listeners, which delivers messages by calling
    /// `deliver`.
    ///
    /// This allows the listener type to be something other than a [`Listener`]:
    ///
    /// ```
    /// use std::rc::Rc;
    /// use tattle::{Fault, Observers, SenderKey};
    ///
    /// type Callback = Rc<dyn Fn(&str) -> Result<(), Fault>>;
    ///
    /// let observers: Observers<&str, Callback> =
    ///     Observers::with_delivery(|callback, message| callback(message));
    /// let sender = SenderKey::new();
    /// observers.register(&sender, Rc::new(|message: &str| -> Result<(), Fault> {
    ///     assert_eq!(message, "hello");
    ///     Ok(())
    /// }))?;
    /// observers.fire(&sender, "hello")?;
    /// # Ok::<(), tattle::Error>(())
    /// ```
    #[must_use]
    pub fn with_delivery(deliver: Deliver<M, L>) -> Self {
        Self {
            table: Mutex::new(ListenerTable::new()),
            deliver: Some(deliver),
        }
    }

    /// Constructs a new [`Observers`] which accepts registrations but has no way to deliver
    /// messages: every call to [`fire()`](Self::fire) fails with [`Error::Unsupported`].
    ///
    /// This is the state of a registry whose listener type has not been given any delivery
    /// behavior; it is only useful as a placeholder.
    #[must_use]
    pub fn without_delivery() -> Self {
        Self {
            table: Mutex::new(ListenerTable::new()),
            deliver: None,
        }
    }

    /// Returns a view of this registry bound to `sender`, which is what
    /// [`Observable::observe()`] implementations return.
    pub fn observe<'a>(&'a self, sender: &'a SenderKey) -> Observation<'a, M, L> {
        Observation {
            observers: self,
            sender,
        }
    }

    /// Adds `listener` to the end of `sender`'s listeners, holding it strongly,
    /// and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRegistered`] if `listener` (by pointer identity) is already
    /// registered for `sender`, whether strongly or weakly.
    pub fn register(&self, sender: &SenderKey, listener: L) -> Result<L, Error> {
        self.insert(sender, listener, false)
    }

    /// Adds `listener` to the end of `sender`'s listeners, holding it weakly,
    /// and returns it.
    ///
    /// The registration does not keep the listener alive; once every other strong reference
    /// to it is dropped, it will no longer receive messages and the registration will be
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRegistered`] if `listener` (by pointer identity) is already
    /// registered for `sender`, whether strongly or weakly.
    pub fn register_weak(&self, sender: &SenderKey, listener: L) -> Result<L, Error> {
        self.insert(sender, listener, true)
    }

    fn insert(&self, sender: &SenderKey, listener: L, weak: bool) -> Result<L, Error> {
        let held = if weak {
            Held::Weak(L::downgrade(&listener))
        } else {
            Held::Strong(listener.clone())
        };
        let entry = Entry {
            address: L::address(&listener),
            held,
        };

        let mut table = self.table.lock();
        let result = table.insert(sender, entry);
        let garbage = if table.buckets.len() >= table.sweep_at {
            table.cleanup()
        } else {
            Vec::new()
        };
        drop(table);
        // Dead senders' listeners may run arbitrary code when dropped, so drop them unlocked.
        drop(garbage);

        let count = result?;
        tracing::trace!(?sender, weak, listeners = count, "registered listener");
        Ok(listener)
    }

    /// Removes `listener` (compared by pointer identity) from `sender`'s listeners.
    ///
    /// Does nothing if it is not registered.
    pub fn unregister(&self, sender: &SenderKey, listener: &L) {
        let address = L::address(listener);
        let removed = self.table.lock().remove(sender, address);
        if removed.is_some() {
            tracing::trace!(?sender, "unregistered listener");
        }
        // `removed` may be the last reference to the listener; dropped here, after unlocking.
        drop(removed);
    }

    /// Removes all of `sender`'s listeners.
    pub fn unregister_all(&self, sender: &SenderKey) {
        let removed = self.table.lock().buckets.remove(&sender.address());
        if let Some(bucket) = &removed {
            tracing::trace!(
                ?sender,
                listeners = bucket.entries.len(),
                "unregistered all listeners"
            );
        }
        drop(removed);
    }

    /// Delivers `message` to each of `sender`'s listeners, in registration order,
    /// and returns it.
    ///
    /// The set of listeners is captured before delivery begins, and no lock is held during
    /// delivery. Therefore, listeners may register and unregister listeners for the same
    /// sender; such changes take effect for later messages, and it is unspecified whether
    /// they affect this one.
    ///
    /// # Errors
    ///
    /// * [`Error::Unsupported`] if this registry was constructed by
    ///   [`without_delivery()`](Self::without_delivery).
    /// * [`Error::Listener`] if a listener failed. Listeners after it are not called.
    pub fn fire(&self, sender: &SenderKey, message: M) -> Result<M, Error> {
        let deliver = self.deliver.ok_or(Error::Unsupported)?;
        let listeners: Vec<L> = self.table.lock().snapshot(sender);
        tracing::trace!(?sender, listeners = listeners.len(), "firing message");

        for listener in &listeners {
            deliver(listener, &message).map_err(Error::Listener)?;
        }
        Ok(message)
    }

    /// Computes the exact count of listeners for `sender`, discarding any dead weak ones.
    ///
    /// This operation is intended for testing and diagnostic purposes.
    pub fn count(&self, sender: &SenderKey) -> usize {
        let mut table = self.table.lock();
        let Some(bucket) = table.buckets.get_mut(&sender.address()) else {
            return 0;
        };
        bucket.purge();
        let count = bucket.entries.len();
        if count == 0 {
            table.buckets.remove(&sender.address());
        }
        count
    }

    /// Computes the exact count of senders which have at least one live listener,
    /// discarding any dead listeners and senders.
    ///
    /// This operation is intended for testing and diagnostic purposes.
    pub fn sender_count(&self) -> usize {
        let mut table = self.table.lock();
        let garbage = table.cleanup();
        let count = table.buckets.len();
        drop(table);
        drop(garbage);
        count
    }
}

fn deliver_to_listener<M, L: Listener<M>>(listener: &L, message: &M) -> Result<(), Fault> {
    listener.receive(message)
}

impl<L: Handle> ListenerTable<L> {
    fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
            sweep_at: MIN_SWEEP_AT,
        }
    }

    /// Appends `entry` to `sender`'s bucket and returns the new number of entries.
    ///
    /// Only `sender`'s bucket is purged of dead weak entries.
    fn insert(&mut self, sender: &SenderKey, entry: Entry<L>) -> Result<usize, Error> {
        if let Some(bucket) = self.buckets.get_mut(&sender.address()) {
            bucket.purge();
            if bucket.entries.iter().any(|e| e.address == entry.address) {
                return Err(Error::AlreadyRegistered);
            }
        }
        let bucket = self
            .buckets
            .entry(sender.address())
            .or_insert_with(|| Bucket {
                sender: sender.downgrade(),
                entries: Vec::new(),
            });
        bucket.entries.push(entry);
        Ok(bucket.entries.len())
    }

    fn remove(&mut self, sender: &SenderKey, address: usize) -> Option<Entry<L>> {
        let bucket = self.buckets.get_mut(&sender.address())?;
        let index = bucket
            .entries
            .iter()
            .position(|entry| entry.address == address);
        // not swap_remove(), which would reorder the remaining listeners
        let removed = index.map(|index| bucket.entries.remove(index));
        if bucket.entries.is_empty() {
            self.buckets.remove(&sender.address());
        }
        removed
    }

    /// Returns strong references to the live listeners of `sender`, discarding dead ones
    /// in the same pass so that no listener is both delivered to and discarded.
    fn snapshot(&mut self, sender: &SenderKey) -> Vec<L> {
        let Some(bucket) = self.buckets.get_mut(&sender.address()) else {
            return Vec::new();
        };
        let mut live = Vec::with_capacity(bucket.entries.len());
        let before = bucket.entries.len();
        bucket.entries.retain(|entry| match &entry.held {
            Held::Strong(listener) => {
                live.push(listener.clone());
                true
            }
            Held::Weak(weak) => match L::upgrade(weak) {
                Some(listener) => {
                    live.push(listener);
                    true
                }
                None => false,
            },
        });
        let purged = before - bucket.entries.len();
        if purged > 0 {
            tracing::debug!(?sender, purged, "discarded dead weak listeners");
        }
        if bucket.entries.is_empty() {
            self.buckets.remove(&sender.address());
        }
        live
    }

    /// Discard all dead weak listeners, and all buckets which are empty or whose sender
    /// no longer exists.
    ///
    /// Returns the discarded buckets, which the caller should drop after unlocking.
    #[mutants::skip] // there are many ways to subtly break this
    fn cleanup(&mut self) -> Vec<Bucket<L>> {
        let dead: Vec<usize> = self
            .buckets
            .iter_mut()
            .filter_map(|(&address, bucket)| {
                if bucket.sender.is_alive() {
                    bucket.purge();
                    if !bucket.entries.is_empty() {
                        return None;
                    }
                }
                Some(address)
            })
            .collect();
        if !dead.is_empty() {
            tracing::debug!(purged = dead.len(), "discarded dead senders");
        }
        let garbage = dead
            .iter()
            .filter_map(|address| self.buckets.remove(address))
            .collect();
        self.sweep_at = MIN_SWEEP_AT.max(self.buckets.len() * 2);
        garbage
    }
}

impl<L: Handle> Bucket<L> {
    fn purge(&mut self) {
        self.entries.retain(|entry| match &entry.held {
            Held::Strong(_) => true,
            Held::Weak(weak) => L::is_alive(weak),
        });
    }
}

impl<M, L: Handle + Listener<M>> Default for Observers<M, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M, L: Handle> fmt::Debug for Observers<M, L> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        // not using fmt.debug_struct() so this is never printed on multiple lines
        if let Some(table) = self.table.try_lock() {
            let entries: usize = table.buckets.values().map(|b| b.entries.len()).sum();
            write!(
                fmt,
                "Observers {{ senders: {}, entries: {entries} }}",
                table.buckets.len()
            )
        } else {
            write!(fmt, "Observers(?)")
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// An [`Observers`] registry bound to one sender.
///
/// Returned by [`Observers::observe()`] and [`Observable::observe()`]; its methods are the
/// same as those of [`Observers`] with the sender argument filled in.
pub struct Observation<'a, M, L: Handle> {
    observers: &'a Observers<M, L>,
    sender: &'a SenderKey,
}

impl<'a, M, L: Handle> Observation<'a, M, L> {
    /// Returns the registry this view refers to.
    #[must_use]
    pub fn observers(&self) -> &'a Observers<M, L> {
        self.observers
    }

    /// Returns the sender this view is bound to.
    #[must_use]
    pub fn sender(&self) -> &'a SenderKey {
        self.sender
    }

    /// Equivalent to [`Observers::register()`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRegistered`] if `listener` is already registered.
    pub fn register(&self, listener: L) -> Result<L, Error> {
        self.observers.register(self.sender, listener)
    }

    /// Equivalent to [`Observers::register_weak()`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRegistered`] if `listener` is already registered.
    pub fn register_weak(&self, listener: L) -> Result<L, Error> {
        self.observers.register_weak(self.sender, listener)
    }

    /// Equivalent to [`Observers::unregister()`].
    pub fn unregister(&self, listener: &L) {
        self.observers.unregister(self.sender, listener)
    }

    /// Equivalent to [`Observers::unregister_all()`].
    pub fn unregister_all(&self) {
        self.observers.unregister_all(self.sender)
    }

    /// Equivalent to [`Observers::fire()`].
    ///
    /// # Errors
    ///
    /// See [`Observers::fire()`].
    pub fn fire(&self, message: M) -> Result<M, Error> {
        self.observers.fire(self.sender, message)
    }

    /// Equivalent to [`Observers::count()`].
    #[must_use]
    pub fn count(&self) -> usize {
        self.observers.count(self.sender)
    }
}

impl<M, L: Handle> Clone for Observation<'_, M, L> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<M, L: Handle> Copy for Observation<'_, M, L> {}

impl<M, L: Handle> fmt::Debug for Observation<'_, M, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observation")
            .field("sender", self.sender)
            .field("observers", self.observers)
            .finish()
    }
}

// -------------------------------------------------------------------------------------------------
