use alloc::sync::{Arc, Weak};
use core::fmt;

#[cfg(doc)]
use crate::{Observable, Observers};

// -------------------------------------------------------------------------------------------------

/// The identity under which listeners are registered with, and messages are fired through,
/// an [`Observers`] registry.
///
/// A `SenderKey` is compared only by identity: clones of a key are equal to each other and to
/// nothing else. Types implementing [`Observable`] usually own one key each.
///
/// Registries hold sender keys weakly. Once every clone of a key has been dropped, the
/// listeners registered under it become unreachable and are discarded the next time the
/// registry cleans up.
#[derive(Clone)]
pub struct SenderKey(Arc<Anchor>);

/// Allocation whose address serves as the identity of a [`SenderKey`].
/// It must not be zero-sized, so that distinct keys never share an address.
struct Anchor(#[allow(dead_code, reason = "only present to give the allocation a size")] u8);

/// Weak form of a [`SenderKey`], stored by registries.
///
/// Holding it keeps the key's allocation (not the key) alive, so the address cannot be
/// reused by another key while any registry still refers to it.
#[derive(Clone)]
pub(crate) struct WeakSenderKey(Weak<Anchor>);

impl SenderKey {
    /// Creates a new key, distinct from every other key.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(Anchor(0)))
    }

    /// Returns the address which identifies this key.
    pub(crate) fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub(crate) fn downgrade(&self) -> WeakSenderKey {
        WeakSenderKey(Arc::downgrade(&self.0))
    }
}

impl WeakSenderKey {
    /// Whether any [`SenderKey`] clone still exists.
    pub(crate) fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl Default for SenderKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for SenderKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for SenderKey {}

impl core::hash::Hash for SenderKey {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl fmt::Debug for SenderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SenderKey({:#x})", self.address())
    }
}

impl fmt::Pointer for SenderKey {
    /// Prints the address which identifies this key.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&Arc::as_ptr(&self.0), f)
    }
}

// -------------------------------------------------------------------------------------------------
