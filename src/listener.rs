use alloc::rc::Rc;
use alloc::sync::Arc;
use core::fmt;

use crate::Fault;

#[cfg(doc)]
use crate::{sync, unsync, Error, Observable, Observers};

/// A receiver of messages fired through an [`Observers`] registry.
///
/// Listeners are typically used in trait object form behind a shared pointer,
/// [`unsync::DynListener`] or [`sync::DynListener`], since the registry identifies and
/// (optionally) weakly references them through that pointer.
///
/// # Generic parameters
///
/// * `M` is the type of message that can be received.
pub trait Listener<M>: fmt::Debug {
    /// Process the given message.
    ///
    /// # Requirements on implementors
    ///
    /// * This is called synchronously, on the thread which fired the message, while the
    ///   sender's write is still in progress from its caller's point of view.
    ///
    /// * The listener may register or unregister listeners, including itself, on the same
    ///   registry; this affects later messages but may or may not affect the one being
    ///   delivered.
    ///
    /// # Errors
    ///
    /// A returned error stops delivery of this message to the remaining listeners and is
    /// reported to whoever fired it, as [`Error::Listener`]. Effects of listeners that already
    /// ran, and of the write that caused the message, are not undone.
    fn receive(&self, message: &M) -> Result<(), Fault>;
}

impl<M, T: ?Sized + Listener<M>> Listener<M> for Rc<T> {
    fn receive(&self, message: &M) -> Result<(), Fault> {
        (**self).receive(message)
    }
}

impl<M, T: ?Sized + Listener<M>> Listener<M> for Arc<T> {
    fn receive(&self, message: &M) -> Result<(), Fault> {
        (**self).receive(message)
    }
}

impl<M, T: ?Sized + Listener<M>> Listener<M> for alloc::boxed::Box<T> {
    fn receive(&self, message: &M) -> Result<(), Fault> {
        (**self).receive(message)
    }
}

impl<M, T: ?Sized + Listener<M>> Listener<M> for &T {
    fn receive(&self, message: &M) -> Result<(), Fault> {
        (**self).receive(message)
    }
}

// -------------------------------------------------------------------------------------------------

/// A [`Listener`] which calls a function.
///
/// This exists because a blanket implementation of [`Listener`] for all functions would
/// conflict with the implementations for smart pointers.
///
/// ```
/// use std::rc::Rc;
/// use tattle::{FnListener, Observers, SenderKey, unsync::DynListener};
///
/// let observers: Observers<i32, DynListener<i32>> = Observers::new();
/// let sender = SenderKey::new();
/// observers.register(&sender, Rc::new(FnListener(|message: &i32| -> Result<(), tattle::Fault> {
///     assert_eq!(*message, 7);
///     Ok(())
/// })))?;
/// observers.fire(&sender, 7)?;
/// # Ok::<(), tattle::Error>(())
/// ```
#[expect(clippy::exhaustive_structs)]
#[derive(Clone, Copy)]
pub struct FnListener<F>(pub F);

impl<M, F> Listener<M> for FnListener<F>
where
    F: Fn(&M) -> Result<(), Fault>,
{
    fn receive(&self, message: &M) -> Result<(), Fault> {
        (self.0)(message)
    }
}

impl<F> fmt::Debug for FnListener<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnListener")
            .field(&crate::util::Unquote::type_name::<F>())
            .finish()
    }
}

// -------------------------------------------------------------------------------------------------
