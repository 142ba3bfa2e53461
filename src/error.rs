use alloc::boxed::Box;

#[cfg(doc)]
use crate::{Field, Listener, Observers, Property, UpdatePropertyEvent};

/// A failure reported by code outside this crate: a [`Listener`], or a [`Property`] or
/// [`Field`] accessor.
pub type Fault = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Errors produced by registration, dispatch, and change-tracked writes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The listener was already registered, strongly or weakly, for the same sender.
    ///
    /// Registration is strict while [`Observers::unregister()`] is tolerant of absent
    /// listeners, so that teardown code need not track what it registered.
    #[error("listener is already registered for this sender")]
    AlreadyRegistered,

    /// [`Observers::fire()`] was called on a registry which has no way to deliver messages
    /// (see [`Observers::without_delivery()`]).
    #[error("this registry has no delivery function")]
    Unsupported,

    /// An event was applied (e.g. [`UpdatePropertyEvent::apply_old_value()`]) after the
    /// wrapper that sent it was dropped.
    #[error("the sender of this event no longer exists")]
    SenderDropped,

    /// A listener failed while receiving a message.
    /// Listeners after it were not notified.
    #[error("listener failed")]
    Listener(#[source] Fault),

    /// The wrapped getter or setter failed.
    #[error("accessor failed")]
    Accessor(#[source] Fault),
}

impl Error {
    /// Returns whether this error reports an invalid argument to a registration operation.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::AlreadyRegistered)
    }
}
