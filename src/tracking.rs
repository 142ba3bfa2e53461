use core::fmt;

#[cfg(doc)]
use crate::{ObservableField, ObservableProperty};

/// How an [`ObservableProperty`] or [`ObservableField`] decides whether a write is a
/// change, and how it preserves the old value for the change event.
///
/// * `equals(old, new)` returning true means the write is skipped entirely: the accessor
///   is not written and no event is fired. The default is [`PartialEq::eq`].
/// * `snapshot(old)` is applied to the value read before the write, and its result is the
///   event's old value. The default returns its input unchanged, which is correct whenever
///   `V` owns its data. If `V` is a handle to shared state which the accessor mutates in
///   place, `snapshot` must make a deep copy, or the old value would show the new state.
///
/// ```
/// use tattle::Tracking;
///
/// // Treat strings differing only in case as equal.
/// let tracking = Tracking::new(|a: &String, b: &String| a.eq_ignore_ascii_case(b));
/// assert!(tracking.equals(&"Ok".into(), &"OK".into()));
/// assert_eq!(tracking.snapshot("x".into()), "x");
/// ```
pub struct Tracking<V> {
    equals: fn(&V, &V) -> bool,
    snapshot: fn(V) -> V,
}

impl<V> Tracking<V> {
    /// Uses `equals` to detect changes, and keeps old values as they are.
    #[must_use]
    pub fn new(equals: fn(&V, &V) -> bool) -> Self {
        Self {
            equals,
            snapshot: core::convert::identity,
        }
    }

    /// Replaces the equality strategy.
    #[must_use]
    pub fn with_equality(self, equals: fn(&V, &V) -> bool) -> Self {
        Self { equals, ..self }
    }

    /// Replaces the snapshot strategy.
    #[must_use]
    pub fn with_snapshot(self, snapshot: fn(V) -> V) -> Self {
        Self { snapshot, ..self }
    }

    /// Returns whether `old` and `new` should be considered the same value.
    pub fn equals(&self, old: &V, new: &V) -> bool {
        (self.equals)(old, new)
    }

    /// Produces the value to report as the old value of a change.
    pub fn snapshot(&self, old: V) -> V {
        (self.snapshot)(old)
    }
}

impl<V: PartialEq> Default for Tracking<V> {
    fn default() -> Self {
        Self::new(<V as PartialEq>::eq)
    }
}

impl<V> Clone for Tracking<V> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<V> Copy for Tracking<V> {}

impl<V> fmt::Debug for Tracking<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracking")
            .field("equals", &self.equals)
            .field("snapshot", &self.snapshot)
            .finish()
    }
}
