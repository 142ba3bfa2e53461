use core::{fmt, ops};

/// Wrapper around [`core::cell::RefCell`] or [`std::sync::Mutex`] depending on whether
/// the `sync` feature is enabled.
///
/// Poisoning is always recovered from: the data guarded by our mutexes is kept consistent
/// by never running foreign code while the lock is held.
///
/// # Caution!
///
/// * This may or may not be `Sync`.
/// * This may or may not deadlock (rather than panic) if locked again from the same thread.
#[derive(Default)]
#[must_use]
pub(crate) struct Mutex<T: ?Sized>(InnerMutex<T>);

#[must_use]
pub(crate) struct MutexGuard<'a, T: ?Sized>(InnerMutexGuard<'a, T>);

cfg_if::cfg_if! {
    if #[cfg(feature = "sync")] {
        type InnerMutex<T> = std::sync::Mutex<T>;
        type InnerMutexGuard<'a, T> = std::sync::MutexGuard<'a, T>;
    } else {
        type InnerMutex<T> = core::cell::RefCell<T>;
        type InnerMutexGuard<'a, T> = core::cell::RefMut<'a, T>;
    }
}

impl<T> Mutex<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self(InnerMutex::new(value))
    }
}

impl<T: ?Sized> Mutex<T> {
    /// Acquires the lock.
    ///
    /// # Panics
    ///
    /// Without the `sync` feature, panics if the lock is already held on this thread.
    pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "sync")] {
                let guard = self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            } else {
                let guard = self.0.borrow_mut();
            }
        }

        MutexGuard(guard)
    }

    /// Acquires the lock if it is not currently held.
    pub(crate) fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "sync")] {
                use std::sync::TryLockError as E;
                let result = match self.0.try_lock() {
                    Ok(guard) => Some(guard),
                    Err(E::Poisoned(pe)) => Some(pe.into_inner()),
                    Err(E::WouldBlock) => None,
                };
            } else {
                let result = self.0.try_borrow_mut().ok();
            }
        }

        result.map(MutexGuard)
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_lock() {
            Some(guard) => f.debug_tuple("Mutex").field(&&*guard).finish(),
            None => write!(f, "Mutex(<locked>)"),
        }
    }
}

impl<T: ?Sized> ops::Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl<T: ?Sized> ops::DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
