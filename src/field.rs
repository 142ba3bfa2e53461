use alloc::sync::{Arc, Weak};
use core::fmt;

use crate::property::into_fault;
use crate::{
    Error, Fault, Field, FieldTarget, FromSender, Handle, Observable, Observation, Observers,
    SenderKey, Tracking, UpdateFieldEvent,
};

#[cfg(doc)]
use crate::{sync, unsync, ObservableProperty};

/// A [`Field`] which fires an [`UpdateFieldEvent`] whenever it is changed through
/// [`set()`](Self::set).
///
/// This is the counterpart of [`ObservableProperty`] for values which live inside some
/// item passed to each call. The wrapper, not the item, is the sender: listeners register
/// once with the wrapper and hear about writes to every item, and tell items apart by
/// [`UpdateFieldEvent::item()`].
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use std::sync::Arc;
/// use tattle::{FnField, Log, Observable as _, unsync};
///
/// #[derive(Debug)]
/// struct Person {
///     age: u32,
/// }
///
/// let observers = Arc::new(unsync::UpdateFieldObservers::new());
/// let age = unsync::ObservableField::new(
///     FnField::new(
///         |p: &Rc<RefCell<Person>>| Ok(p.try_borrow()?.age),
///         |p: &Rc<RefCell<Person>>, age: u32| {
///             p.try_borrow_mut()?.age = age;
///             Ok(())
///         },
///     ),
///     observers,
/// );
/// let log = Log::new();
/// age.register(Rc::new(log.listener()))?;
///
/// let alice = Rc::new(RefCell::new(Person { age: 30 }));
/// age.set(&alice, 31)?;
/// let [event] = <[_; 1]>::try_from(log.drain()).unwrap();
/// assert!(Rc::ptr_eq(event.item(), &alice));
/// assert_eq!((event.old_value(), event.new_value()), (&30, &31));
/// # Ok::<(), tattle::Error>(())
/// ```
///
/// # Generic parameters
///
/// * `F` is the wrapped [`Field`].
/// * `I` is the type of the items. Events hold a clone of the item, so it is usually a
///   cheap handle such as [`Rc`](alloc::rc::Rc).
/// * `V` is the type of the value.
/// * `L` is the type of listener the registry stores.
/// * `T` is the type-erased sender the events carry (see [`FromSender`]).
pub struct ObservableField<F, I, V, L: Handle, T: ?Sized = dyn FieldTarget<I, V>> {
    field: F,
    key: SenderKey,
    observers: Arc<Observers<UpdateFieldEvent<I, V, T>, L>>,
    tracking: Tracking<V>,
    sender: Weak<T>,
}

impl<F, I, V, L, T> ObservableField<F, I, V, L, T>
where
    F: Field<I, V>,
    I: Clone,
    V: Clone,
    L: Handle,
    T: ?Sized + FromSender<Self>,
{
    /// Wraps `field`, reporting changes to `observers`, and detecting changes with
    /// [`PartialEq`].
    #[must_use]
    pub fn new(field: F, observers: Arc<Observers<UpdateFieldEvent<I, V, T>, L>>) -> Arc<Self>
    where
        V: PartialEq,
    {
        Self::with_tracking(field, observers, Tracking::default())
    }

    /// Wraps `field`, reporting changes to `observers`, and detecting changes and
    /// preserving old values as `tracking` specifies.
    #[must_use]
    pub fn with_tracking(
        field: F,
        observers: Arc<Observers<UpdateFieldEvent<I, V, T>, L>>,
        tracking: Tracking<V>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            field,
            key: SenderKey::new(),
            observers,
            tracking,
            sender: T::from_sender(this.clone()),
        })
    }
}

impl<F, I, V, L, T> ObservableField<F, I, V, L, T>
where
    F: Field<I, V>,
    I: Clone,
    V: Clone,
    L: Handle,
    T: ?Sized,
{
    /// Reads the value in `item` through the wrapped accessor.
    ///
    /// # Errors
    ///
    /// [`Error::Accessor`] if the accessor fails.
    pub fn get(&self, item: &I) -> Result<V, Error> {
        self.field.get(item).map_err(Error::Accessor)
    }

    /// Writes `value` into `item` and notifies listeners, unless it is equal to the value
    /// already there, in which case nothing happens.
    ///
    /// # Errors
    ///
    /// * [`Error::Accessor`] if reading or writing the accessor fails.
    ///   If writing fails, no event is fired.
    /// * [`Error::Listener`] if a listener fails. The value has still been written.
    /// * [`Error::Unsupported`] if the registry cannot deliver messages.
    pub fn set(&self, item: &I, new_value: V) -> Result<(), Error> {
        let old_value = self.field.get(item).map_err(Error::Accessor)?;
        if self.tracking.equals(&old_value, &new_value) {
            return Ok(());
        }
        let old_value = self.tracking.snapshot(old_value);
        self.field
            .set(item, new_value.clone())
            .map_err(Error::Accessor)?;

        let event =
            UpdateFieldEvent::new(self.sender.clone(), item.clone(), old_value, new_value);
        self.observers.fire(&self.key, event)?;
        Ok(())
    }
}

impl<F, I, V, L: Handle, T: ?Sized> ObservableField<F, I, V, L, T> {
    /// Returns the wrapped accessor.
    #[must_use]
    pub fn field(&self) -> &F {
        &self.field
    }

    /// Returns the key identifying this wrapper as a sender.
    #[must_use]
    pub fn sender_key(&self) -> &SenderKey {
        &self.key
    }

    /// Returns the registry this wrapper reports changes to.
    #[must_use]
    pub fn observers(&self) -> &Arc<Observers<UpdateFieldEvent<I, V, T>, L>> {
        &self.observers
    }
}

impl<F, I, V, L, T> FieldTarget<I, V> for ObservableField<F, I, V, L, T>
where
    F: Field<I, V>,
    I: Clone,
    V: Clone,
    L: Handle,
    T: ?Sized,
{
    fn sender_key(&self) -> &SenderKey {
        &self.key
    }

    fn write(&self, item: &I, value: V) -> Result<(), Error> {
        self.set(item, value)
    }
}

impl<F, I, V, L: Handle, T: ?Sized> Observable for ObservableField<F, I, V, L, T> {
    type Msg = UpdateFieldEvent<I, V, T>;
    type Listener = L;

    fn observe(&self) -> Observation<'_, Self::Msg, Self::Listener> {
        self.observers.observe(&self.key)
    }
}

/// The wrapper is itself a [`Field`], so that wrappers may be nested.
impl<F, I, V, L, T> Field<I, V> for ObservableField<F, I, V, L, T>
where
    F: Field<I, V>,
    I: Clone,
    V: Clone,
    L: Handle,
    T: ?Sized,
{
    fn get(&self, item: &I) -> Result<V, Fault> {
        ObservableField::get(self, item).map_err(into_fault)
    }

    fn set(&self, item: &I, value: V) -> Result<(), Fault> {
        ObservableField::set(self, item, value).map_err(into_fault)
    }
}

impl<F: fmt::Debug, I, V, L: Handle, T: ?Sized> fmt::Debug for ObservableField<F, I, V, L, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableField")
            .field("sender", &self.key)
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}
