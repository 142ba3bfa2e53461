use alloc::{rc, sync};

#[cfg(doc)]
use crate::{sync as sync_flavor, unsync as unsync_flavor, Observers};

/// A shared pointer to a listener, which can be compared by identity and downgraded to a
/// weak reference.
///
/// [`Observers`] requires its listener type to implement this trait so that it can
/// find a listener again in [`Observers::unregister()`], and so that listeners may be
/// registered without being kept alive by the registration.
///
/// This trait is implemented for [`Rc`](rc::Rc) and [`Arc`](sync::Arc), which are the
/// pointer types used by [`unsync_flavor::DynListener`] and [`sync_flavor::DynListener`].
pub trait Handle: Clone {
    /// The non-owning form of this pointer.
    type Weak;

    /// Creates a weak reference to the same value.
    fn downgrade(this: &Self) -> Self::Weak;

    /// Recovers a strong reference if the value has not been dropped.
    fn upgrade(weak: &Self::Weak) -> Option<Self>;

    /// Returns whether [`upgrade()`](Self::upgrade) would succeed, without creating (and
    /// possibly being the last to drop) a strong reference.
    fn is_alive(weak: &Self::Weak) -> bool;

    /// Returns the address of the pointed-to value, ignoring any metadata such as vtables.
    ///
    /// Two handles have the same address exactly when they point to the same allocation.
    fn address(this: &Self) -> usize;
}

impl<T: ?Sized> Handle for rc::Rc<T> {
    type Weak = rc::Weak<T>;

    fn downgrade(this: &Self) -> Self::Weak {
        rc::Rc::downgrade(this)
    }

    fn upgrade(weak: &Self::Weak) -> Option<Self> {
        weak.upgrade()
    }

    fn is_alive(weak: &Self::Weak) -> bool {
        weak.strong_count() > 0
    }

    fn address(this: &Self) -> usize {
        rc::Rc::as_ptr(this).cast::<()>() as usize
    }
}

impl<T: ?Sized> Handle for sync::Arc<T> {
    type Weak = sync::Weak<T>;

    fn downgrade(this: &Self) -> Self::Weak {
        sync::Arc::downgrade(this)
    }

    fn upgrade(weak: &Self::Weak) -> Option<Self> {
        weak.upgrade()
    }

    fn is_alive(weak: &Self::Weak) -> bool {
        weak.strong_count() > 0
    }

    fn address(this: &Self) -> usize {
        sync::Arc::as_ptr(this).cast::<()>() as usize
    }
}
