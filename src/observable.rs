use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::sync::Arc;

use crate::{Error, Handle, Observation};

#[cfg(doc)]
use crate::{Observers, SenderKey};

/// Ability to have listeners registered for messages about `self`.
///
/// An implementor only names the shared [`Observers`] registry it uses and the
/// [`SenderKey`] identifying itself, by implementing [`observe()`](Self::observe).
/// All the other methods are provided and forward to that registry.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use std::sync::Arc;
/// use tattle::{Log, Observable, Observation, SenderKey, unsync};
///
/// #[derive(Clone, Debug)]
/// struct Renamed(String);
///
/// struct Document {
///     key: SenderKey,
///     observers: Arc<unsync::Observers<Renamed>>,
/// }
///
/// impl Observable for Document {
///     type Msg = Renamed;
///     type Listener = unsync::DynListener<Renamed>;
///
///     fn observe(&self) -> Observation<'_, Self::Msg, Self::Listener> {
///         self.observers.observe(&self.key)
///     }
/// }
///
/// // One registry serves every document.
/// let observers = Arc::new(unsync::Observers::new());
/// let a = Document { key: SenderKey::new(), observers: observers.clone() };
/// let b = Document { key: SenderKey::new(), observers };
///
/// let log = Log::new();
/// a.register(Rc::new(log.listener()))?;
/// a.fire(Renamed("a".into()))?;
/// b.fire(Renamed("b".into()))?;
/// assert_eq!(log.drain().len(), 1);
/// # Ok::<(), tattle::Error>(())
/// ```
pub trait Observable {
    /// The type of message which listeners receive.
    type Msg;

    /// The type of listener which may be registered.
    type Listener: Handle;

    /// Returns the registry this value uses, bound to this value's sender key.
    fn observe(&self) -> Observation<'_, Self::Msg, Self::Listener>;

    /// Registers `listener`, holding it strongly, and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRegistered`] if `listener` is already registered.
    fn register(&self, listener: Self::Listener) -> Result<Self::Listener, Error> {
        self.observe().register(listener)
    }

    /// Registers `listener`, holding it weakly, and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRegistered`] if `listener` is already registered.
    fn register_weak(&self, listener: Self::Listener) -> Result<Self::Listener, Error> {
        self.observe().register_weak(listener)
    }

    /// Unregisters `listener`, if it is registered.
    fn unregister(&self, listener: &Self::Listener) {
        self.observe().unregister(listener)
    }

    /// Delivers `message` to all registered listeners and returns it.
    ///
    /// # Errors
    ///
    /// See [`Observers::fire()`].
    fn fire(&self, message: Self::Msg) -> Result<Self::Msg, Error> {
        self.observe().fire(message)
    }
}

impl<T: ?Sized + Observable> Observable for &T {
    type Msg = T::Msg;
    type Listener = T::Listener;

    fn observe(&self) -> Observation<'_, Self::Msg, Self::Listener> {
        (**self).observe()
    }
}
impl<T: ?Sized + Observable> Observable for Box<T> {
    type Msg = T::Msg;
    type Listener = T::Listener;

    fn observe(&self) -> Observation<'_, Self::Msg, Self::Listener> {
        (**self).observe()
    }
}
impl<T: ?Sized + Observable> Observable for Rc<T> {
    type Msg = T::Msg;
    type Listener = T::Listener;

    fn observe(&self) -> Observation<'_, Self::Msg, Self::Listener> {
        (**self).observe()
    }
}
impl<T: ?Sized + Observable> Observable for Arc<T> {
    type Msg = T::Msg;
    type Listener = T::Listener;

    fn observe(&self) -> Observation<'_, Self::Msg, Self::Listener> {
        (**self).observe()
    }
}
