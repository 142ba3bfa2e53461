use alloc::boxed::Box;
use alloc::sync::{Arc, Weak};
use core::fmt;

use crate::{
    Error, Fault, FromSender, Handle, Observable, Observation, Observers, Property,
    PropertyTarget, SenderKey, Tracking, UpdatePropertyEvent,
};

#[cfg(doc)]
use crate::{sync, unsync};

/// A [`Property`] which fires an [`UpdatePropertyEvent`] whenever it is changed
/// through [`set()`](Self::set).
///
/// Wrappers are always constructed inside an [`Arc`], which is cloned to share them;
/// clones share one [`SenderKey`], so listeners registered through any clone hear about
/// writes made through every clone.
/// Writes made directly to the wrapped accessor, bypassing the wrapper, are not observed.
///
/// Every wrapper reports to an [`Observers`] registry, usually shared with every other
/// wrapper of the same value type, which is passed to its constructor.
///
/// We recommend that you use the type aliases [`sync::ObservableProperty`] or
/// [`unsync::ObservableProperty`], to avoid writing the type parameters `L` and `T`.
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use std::sync::Arc;
/// use tattle::{Log, Observable as _, unsync};
///
/// let observers = Arc::new(unsync::UpdatePropertyObservers::new());
/// let count = unsync::ObservableProperty::new(Cell::new(0), observers);
/// let log = Log::new();
/// count.register(Rc::new(log.listener()))?;
///
/// count.set(0)?; // not a change
/// count.set(5)?;
/// let events = log.drain();
/// assert_eq!(events.len(), 1);
/// assert_eq!((events[0].old_value(), events[0].new_value()), (&0, &5));
///
/// events[0].apply_old_value()?;
/// assert_eq!(count.get()?, 0);
/// # Ok::<(), tattle::Error>(())
/// ```
///
/// # Generic parameters
///
/// * `P` is the wrapped [`Property`].
/// * `V` is the type of the value.
/// * `L` is the type of listener the registry stores.
/// * `T` is the type-erased sender the events carry (see [`FromSender`]).
pub struct ObservableProperty<P, V, L: Handle, T: ?Sized = dyn PropertyTarget<V>> {
    property: P,
    key: SenderKey,
    observers: Arc<Observers<UpdatePropertyEvent<V, T>, L>>,
    tracking: Tracking<V>,
    /// Weak reference to `self`, given to events as their sender.
    sender: Weak<T>,
}

impl<P, V, L, T> ObservableProperty<P, V, L, T>
where
    P: Property<V>,
    V: Clone,
    L: Handle,
    T: ?Sized + FromSender<Self>,
{
    /// Wraps `property`, reporting changes to `observers`, and detecting changes with
    /// [`PartialEq`].
    #[must_use]
    pub fn new(property: P, observers: Arc<Observers<UpdatePropertyEvent<V, T>, L>>) -> Arc<Self>
    where
        V: PartialEq,
    {
        Self::with_tracking(property, observers, Tracking::default())
    }

    /// Wraps `property`, reporting changes to `observers`, and detecting changes and
    /// preserving old values as `tracking` specifies.
    #[must_use]
    pub fn with_tracking(
        property: P,
        observers: Arc<Observers<UpdatePropertyEvent<V, T>, L>>,
        tracking: Tracking<V>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            property,
            key: SenderKey::new(),
            observers,
            tracking,
            sender: T::from_sender(this.clone()),
        })
    }
}

impl<P, V, L, T> ObservableProperty<P, V, L, T>
where
    P: Property<V>,
    V: Clone,
    L: Handle,
    T: ?Sized,
{
    /// Reads the value from the wrapped accessor.
    ///
    /// # Errors
    ///
    /// [`Error::Accessor`] if the accessor fails.
    pub fn get(&self) -> Result<V, Error> {
        self.property.get().map_err(Error::Accessor)
    }

    /// Writes `value` to the wrapped accessor and notifies listeners, unless it is equal
    /// to the current value, in which case nothing happens.
    ///
    /// # Errors
    ///
    /// * [`Error::Accessor`] if reading or writing the accessor fails.
    ///   If writing fails, no event is fired.
    /// * [`Error::Listener`] if a listener fails. The value has still been written.
    /// * [`Error::Unsupported`] if the registry cannot deliver messages.
    pub fn set(&self, new_value: V) -> Result<(), Error> {
        let old_value = self.property.get().map_err(Error::Accessor)?;
        if self.tracking.equals(&old_value, &new_value) {
            return Ok(());
        }
        // Must happen before the write, since the old value may share state with the accessor.
        let old_value = self.tracking.snapshot(old_value);
        self.property
            .set(new_value.clone())
            .map_err(Error::Accessor)?;

        let event = UpdatePropertyEvent::new(self.sender.clone(), old_value, new_value);
        self.observers.fire(&self.key, event)?;
        Ok(())
    }
}

impl<P, V, L: Handle, T: ?Sized> ObservableProperty<P, V, L, T> {
    /// Returns the wrapped accessor.
    ///
    /// Writing to it directly bypasses change notification.
    #[must_use]
    pub fn property(&self) -> &P {
        &self.property
    }

    /// Returns the key identifying this wrapper as a sender.
    #[must_use]
    pub fn sender_key(&self) -> &SenderKey {
        &self.key
    }

    /// Returns the registry this wrapper reports changes to.
    #[must_use]
    pub fn observers(&self) -> &Arc<Observers<UpdatePropertyEvent<V, T>, L>> {
        &self.observers
    }
}

impl<P, V, L, T> PropertyTarget<V> for ObservableProperty<P, V, L, T>
where
    P: Property<V>,
    V: Clone,
    L: Handle,
    T: ?Sized,
{
    fn sender_key(&self) -> &SenderKey {
        &self.key
    }

    fn write(&self, value: V) -> Result<(), Error> {
        self.set(value)
    }
}

impl<P, V, L: Handle, T: ?Sized> Observable for ObservableProperty<P, V, L, T> {
    type Msg = UpdatePropertyEvent<V, T>;
    type Listener = L;

    fn observe(&self) -> Observation<'_, Self::Msg, Self::Listener> {
        self.observers.observe(&self.key)
    }
}

/// The wrapper is itself a [`Property`], so that wrappers may be nested.
///
/// Accessor faults of the inner property are passed through unchanged; other errors are
/// boxed.
impl<P, V, L, T> Property<V> for ObservableProperty<P, V, L, T>
where
    P: Property<V>,
    V: Clone,
    L: Handle,
    T: ?Sized,
{
    fn get(&self) -> Result<V, Fault> {
        ObservableProperty::get(self).map_err(into_fault)
    }

    fn set(&self, value: V) -> Result<(), Fault> {
        ObservableProperty::set(self, value).map_err(into_fault)
    }
}

pub(crate) fn into_fault(error: Error) -> Fault {
    match error {
        Error::Accessor(fault) => fault,
        other => Box::new(other),
    }
}

impl<P: fmt::Debug, V, L: Handle, T: ?Sized> fmt::Debug for ObservableProperty<P, V, L, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableProperty")
            .field("sender", &self.key)
            .field("property", &self.property)
            .finish_non_exhaustive()
    }
}
