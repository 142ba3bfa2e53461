use alloc::sync::{Arc, Weak};
use core::fmt;

use crate::{Error, SenderKey};

#[cfg(doc)]
use crate::{sync, unsync, ObservableField, ObservableProperty};

// -------------------------------------------------------------------------------------------------

/// The sender of an [`UpdatePropertyEvent`], as seen by the event: something with an
/// identity which can be written to.
///
/// [`ObservableProperty`] implements this; it is a separate trait so that events need not
/// carry the property's accessor and listener types.
pub trait PropertyTarget<V> {
    /// Returns the identity under which this sender fires events.
    fn sender_key(&self) -> &SenderKey;

    /// Writes `value`, firing an event if it is a change.
    ///
    /// # Errors
    ///
    /// As for [`ObservableProperty::set()`].
    fn write(&self, value: V) -> Result<(), Error>;
}

/// The sender of an [`UpdateFieldEvent`], as seen by the event.
///
/// [`ObservableField`] implements this.
pub trait FieldTarget<I, V> {
    /// Returns the identity under which this sender fires events.
    fn sender_key(&self) -> &SenderKey;

    /// Writes `value` into `item`, firing an event if it is a change.
    ///
    /// # Errors
    ///
    /// As for [`ObservableField::set()`].
    fn write(&self, item: &I, value: V) -> Result<(), Error>;
}

/// Conversion from a weak reference to a concrete sender to the type-erased form which
/// events carry.
///
/// This is implemented for the trait objects `dyn PropertyTarget<V>` and
/// `dyn FieldTarget<I, V>`, for any sender, and for the same trait objects with
/// `+ Send + Sync`, for senders which are [`Send`] and [`Sync`].
/// The latter allows events of the [`sync`] flavor to be sent between threads;
/// the former allows events of the [`unsync`] flavor to have senders which are not
/// thread-safe.
///
/// # Generic parameters
///
/// * `Self` is the type-erased sender type being converted to.
/// * `S` is the concrete sender type being converted from.
pub trait FromSender<S> {
    /// Erases the type of `sender`.
    fn from_sender(sender: Weak<S>) -> Weak<Self>;
}

impl<V, S: PropertyTarget<V> + 'static> FromSender<S> for dyn PropertyTarget<V> {
    fn from_sender(sender: Weak<S>) -> Weak<Self> {
        sender
    }
}
impl<V, S: PropertyTarget<V> + Send + Sync + 'static> FromSender<S>
    for dyn PropertyTarget<V> + Send + Sync
{
    fn from_sender(sender: Weak<S>) -> Weak<Self> {
        sender
    }
}
impl<I, V, S: FieldTarget<I, V> + 'static> FromSender<S> for dyn FieldTarget<I, V> {
    fn from_sender(sender: Weak<S>) -> Weak<Self> {
        sender
    }
}
impl<I, V, S: FieldTarget<I, V> + Send + Sync + 'static> FromSender<S>
    for dyn FieldTarget<I, V> + Send + Sync
{
    fn from_sender(sender: Weak<S>) -> Weak<Self> {
        sender
    }
}

// -------------------------------------------------------------------------------------------------

/// Message describing one effective write to an [`ObservableProperty`].
///
/// Events are delivered by reference and may be cloned and kept by listeners.
/// They refer to their sender weakly; once the sender has been dropped,
/// [`sender()`](Self::sender) returns [`None`] and the `apply_*` methods fail.
///
/// # Generic parameters
///
/// * `V` is the type of the value.
/// * `T` is the type-erased sender, which determines whether the event is [`Send`] and
///   [`Sync`]. The [`sync::UpdatePropertyEvent`] and [`unsync::UpdatePropertyEvent`] aliases
///   choose it for you.
pub struct UpdatePropertyEvent<V, T: ?Sized = dyn PropertyTarget<V>> {
    sender: Weak<T>,
    old_value: V,
    new_value: V,
}

impl<V, T: ?Sized> UpdatePropertyEvent<V, T> {
    /// Constructs an event reporting that `sender` changed from `old_value` to `new_value`.
    ///
    /// Only senders construct events; use this when implementing your own property wrapper.
    #[must_use]
    pub fn new(sender: Weak<T>, old_value: V, new_value: V) -> Self {
        Self {
            sender,
            old_value,
            new_value,
        }
    }

    /// Returns the value before the write.
    #[must_use]
    pub fn old_value(&self) -> &V {
        &self.old_value
    }

    /// Returns the value written.
    #[must_use]
    pub fn new_value(&self) -> &V {
        &self.new_value
    }

    /// Returns the sender, if it still exists.
    #[must_use]
    pub fn sender(&self) -> Option<Arc<T>> {
        self.sender.upgrade()
    }

    /// Returns the old and new values, in that order.
    #[must_use]
    pub fn into_values(self) -> (V, V) {
        (self.old_value, self.new_value)
    }
}

impl<V, T: ?Sized + PropertyTarget<V>> UpdatePropertyEvent<V, T> {
    /// Returns whether this event was fired under `key`.
    ///
    /// Returns false if the sender no longer exists.
    #[must_use]
    pub fn is_sent_by(&self, key: &SenderKey) -> bool {
        self.sender()
            .is_some_and(|sender| sender.sender_key() == key)
    }
}

impl<V: Clone, T: ?Sized + PropertyTarget<V>> UpdatePropertyEvent<V, T> {
    /// Writes the old value back through the sender, undoing the change this event reports.
    ///
    /// This is an ordinary write, so it fires its own event if it changes the value.
    ///
    /// # Errors
    ///
    /// * [`Error::SenderDropped`] if the sender no longer exists.
    /// * Anything [`ObservableProperty::set()`] may return.
    pub fn apply_old_value(&self) -> Result<(), Error> {
        self.apply(self.old_value.clone())
    }

    /// Writes the new value again through the sender.
    ///
    /// # Errors
    ///
    /// * [`Error::SenderDropped`] if the sender no longer exists.
    /// * Anything [`ObservableProperty::set()`] may return.
    pub fn apply_new_value(&self) -> Result<(), Error> {
        self.apply(self.new_value.clone())
    }

    fn apply(&self, value: V) -> Result<(), Error> {
        self.sender().ok_or(Error::SenderDropped)?.write(value)
    }
}

impl<V: Clone, T: ?Sized> Clone for UpdatePropertyEvent<V, T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            old_value: self.old_value.clone(),
            new_value: self.new_value.clone(),
        }
    }
}

impl<V: fmt::Debug, T: ?Sized + PropertyTarget<V>> fmt::Debug for UpdatePropertyEvent<V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdatePropertyEvent")
            .field("sender", &SenderField(self.sender().as_deref().map(|s| s.sender_key())))
            .field("old_value", &self.old_value)
            .field("new_value", &self.new_value)
            .finish()
    }
}

// -------------------------------------------------------------------------------------------------

/// Message describing one effective write to an [`ObservableField`] of some item.
///
/// Like [`UpdatePropertyEvent`], but also carries the item which was written to.
///
/// # Generic parameters
///
/// * `I` is the type of the item.
/// * `V` is the type of the value.
/// * `T` is the type-erased sender; see [`UpdatePropertyEvent`].
pub struct UpdateFieldEvent<I, V, T: ?Sized = dyn FieldTarget<I, V>> {
    sender: Weak<T>,
    item: I,
    old_value: V,
    new_value: V,
}

impl<I, V, T: ?Sized> UpdateFieldEvent<I, V, T> {
    /// Constructs an event reporting that `sender` changed `item` from `old_value` to
    /// `new_value`.
    #[must_use]
    pub fn new(sender: Weak<T>, item: I, old_value: V, new_value: V) -> Self {
        Self {
            sender,
            item,
            old_value,
            new_value,
        }
    }

    /// Returns the item whose field was written.
    #[must_use]
    pub fn item(&self) -> &I {
        &self.item
    }

    /// Returns the value before the write.
    #[must_use]
    pub fn old_value(&self) -> &V {
        &self.old_value
    }

    /// Returns the value written.
    #[must_use]
    pub fn new_value(&self) -> &V {
        &self.new_value
    }

    /// Returns the sender, if it still exists.
    #[must_use]
    pub fn sender(&self) -> Option<Arc<T>> {
        self.sender.upgrade()
    }

    /// Returns the item, old value, and new value, in that order.
    #[must_use]
    pub fn into_values(self) -> (I, V, V) {
        (self.item, self.old_value, self.new_value)
    }
}

impl<I, V, T: ?Sized + FieldTarget<I, V>> UpdateFieldEvent<I, V, T> {
    /// Returns whether this event was fired under `key`.
    ///
    /// Returns false if the sender no longer exists.
    #[must_use]
    pub fn is_sent_by(&self, key: &SenderKey) -> bool {
        self.sender()
            .is_some_and(|sender| sender.sender_key() == key)
    }
}

impl<I, V: Clone, T: ?Sized + FieldTarget<I, V>> UpdateFieldEvent<I, V, T> {
    /// Writes the old value back into the item through the sender.
    ///
    /// # Errors
    ///
    /// * [`Error::SenderDropped`] if the sender no longer exists.
    /// * Anything [`ObservableField::set()`] may return.
    pub fn apply_old_value(&self) -> Result<(), Error> {
        self.apply(self.old_value.clone())
    }

    /// Writes the new value into the item again through the sender.
    ///
    /// # Errors
    ///
    /// * [`Error::SenderDropped`] if the sender no longer exists.
    /// * Anything [`ObservableField::set()`] may return.
    pub fn apply_new_value(&self) -> Result<(), Error> {
        self.apply(self.new_value.clone())
    }

    fn apply(&self, value: V) -> Result<(), Error> {
        self.sender()
            .ok_or(Error::SenderDropped)?
            .write(&self.item, value)
    }
}

impl<I: Clone, V: Clone, T: ?Sized> Clone for UpdateFieldEvent<I, V, T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            item: self.item.clone(),
            old_value: self.old_value.clone(),
            new_value: self.new_value.clone(),
        }
    }
}

impl<I, V, T> fmt::Debug for UpdateFieldEvent<I, V, T>
where
    I: fmt::Debug,
    V: fmt::Debug,
    T: ?Sized + FieldTarget<I, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateFieldEvent")
            .field("sender", &SenderField(self.sender().as_deref().map(|s| s.sender_key())))
            .field("item", &self.item)
            .field("old_value", &self.old_value)
            .field("new_value", &self.new_value)
            .finish()
    }
}

// -------------------------------------------------------------------------------------------------

/// Prints a sender's key, or `<dropped>`.
struct SenderField<'a>(Option<&'a SenderKey>);

impl fmt::Debug for SenderField<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(key) => fmt::Debug::fmt(key, f),
            None => f.write_str("<dropped>"),
        }
    }
}
