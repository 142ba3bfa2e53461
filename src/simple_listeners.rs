use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::maybe_sync::Mutex;
use crate::{Fault, Listener};

// -------------------------------------------------------------------------------------------------

/// A [`Listener`] which discards all messages.
///
/// Use this when a [`Listener`] is demanded, but there is nothing it should do.
#[expect(clippy::exhaustive_structs)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NullListener;

impl<M> Listener<M> for NullListener {
    fn receive(&self, _message: &M) -> Result<(), Fault> {
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

/// Tuples of listeners may be used to distribute messages to multiple listeners with static
/// dispatch.
///
/// The second listener is not called if the first one fails.
impl<M, L1, L2> Listener<M> for (L1, L2)
where
    L1: Listener<M>,
    L2: Listener<M>,
{
    fn receive(&self, message: &M) -> Result<(), Fault> {
        self.0.receive(message)?;
        self.1.receive(message)
    }
}

// -------------------------------------------------------------------------------------------------

/// A [`Listener`] destination which stores clones of all the messages it receives.
///
/// This is only intended for testing; real listeners should not unboundedly allocate
/// duplicate messages.
///
/// # Generic parameters
///
/// * `M` is the type of the messages.
pub struct Log<M>(Arc<Mutex<Vec<M>>>);

/// [`Log::listener()`] implementation.
///
/// # Generic parameters
///
/// * `M` is the type of the messages.
pub struct LogListener<M>(Weak<Mutex<Vec<M>>>);

impl<M> Log<M> {
    /// Constructs a new empty [`Log`].
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }

    /// Returns a [`Listener`] which records the messages it receives in this `Log`.
    ///
    /// The listener does not keep the log alive; once the log is dropped, it discards
    /// messages.
    #[must_use]
    pub fn listener(&self) -> LogListener<M> {
        LogListener(Arc::downgrade(&self.0))
    }

    /// Remove and return all messages returned so far.
    ///
    /// ```
    /// use tattle::{Listener, Log};
    ///
    /// let log = Log::new();
    /// log.listener().receive(&1)?;
    /// log.listener().receive(&2)?;
    /// assert_eq!(log.drain(), vec![1, 2]);
    /// log.listener().receive(&3)?;
    /// assert_eq!(log.drain(), vec![3]);
    /// # Ok::<(), tattle::Fault>(())
    /// ```
    #[must_use]
    pub fn drain(&self) -> Vec<M> {
        core::mem::take(&mut *self.0.lock())
    }
}

impl<M: fmt::Debug> fmt::Debug for Log<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_lock() {
            Some(messages) => f.debug_tuple("Log").field(&*messages).finish(),
            None => write!(f, "Log(<locked>)"),
        }
    }
}

impl<M> fmt::Debug for LogListener<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogListener")
            .field("alive", &(self.0.strong_count() > 0))
            .finish()
    }
}

impl<M: Clone> Listener<M> for LogListener<M> {
    fn receive(&self, message: &M) -> Result<(), Fault> {
        if let Some(log) = self.0.upgrade() {
            log.lock().push(message.clone());
        }
        Ok(())
    }
}

impl<M> Clone for LogListener<M> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<M> Default for Log<M> {
    // This implementation cannot be derived because we do not want M: Default
    fn default() -> Self {
        Self::new()
    }
}

// -------------------------------------------------------------------------------------------------

/// A [`Listener`] destination which records only whether any messages have been received,
/// until cleared.
///
/// It is implemented as a shared [`AtomicBool`].
/// It is [`Send`] and [`Sync`] regardless of whether the `"sync"` crate feature is enabled.
///
/// The atomic orderings used are [`Release`](Ordering::Release) for setting the flag, and
/// [`Acquire`](Ordering::Acquire) for reading and clearing it.
///
/// The name of this type comes from the concept of a “dirty flag”, marking that state is
/// unsaved or out of sync. A typical use is to register its listener with a property and
/// re-read the property only when the flag was set.
pub struct Flag {
    shared: Arc<AtomicBool>,
}

/// [`Flag::listener()`] implementation.
#[derive(Clone)]
pub struct FlagListener {
    weak: Weak<AtomicBool>,
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // never multiline
        write!(f, "Flag({:?})", self.shared.load(Ordering::Relaxed))
    }
}
impl fmt::Debug for FlagListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strong = self.weak.upgrade();

        let mut ds = f.debug_struct("FlagListener");
        ds.field("alive", &strong.is_some());
        if let Some(strong) = strong {
            ds.field("value", &(strong.load(Ordering::Relaxed)));
        }
        ds.finish()
    }
}

impl Flag {
    const SET_ORDERING: Ordering = Ordering::Release;
    const GET_CLEAR_ORDERING: Ordering = Ordering::Acquire;

    /// Constructs a new [`Flag`] with the given initial value.
    ///
    /// ```
    /// # use tattle::Flag;
    /// assert_eq!(Flag::new(false).get_and_clear(), false);
    /// assert_eq!(Flag::new(true).get_and_clear(), true);
    /// ```
    #[must_use]
    pub fn new(value: bool) -> Self {
        Self {
            shared: Arc::new(AtomicBool::new(value)),
        }
    }

    /// Returns a [`Listener`] which will set this flag to [`true`] when it receives any
    /// message.
    #[must_use]
    pub fn listener(&self) -> FlagListener {
        FlagListener {
            weak: Arc::downgrade(&self.shared),
        }
    }

    /// Returns the flag value, setting it to [`false`] at the same time.
    #[allow(clippy::must_use_candidate)]
    #[inline]
    pub fn get_and_clear(&self) -> bool {
        self.shared.swap(false, Self::GET_CLEAR_ORDERING)
    }

    /// Set the flag value to [`true`].
    ///
    /// This is equivalent to `self.listener().receive(&())`, but more efficient.
    /// It may be useful in situations where the caller of `get_and_clear()` realizes it cannot
    /// actually complete its work, but wants to try again later.
    #[inline]
    pub fn set(&self) {
        self.shared.store(true, Self::SET_ORDERING);
    }
}

impl<M> Listener<M> for FlagListener {
    fn receive(&self, _message: &M) -> Result<(), Fault> {
        if let Some(cell) = self.weak.upgrade() {
            cell.store(true, Flag::SET_ORDERING);
        }
        Ok(())
    }
}
