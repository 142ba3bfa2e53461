use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{self, Ordering::Relaxed};

use crate::Fault;

#[cfg(doc)]
use crate::{ObservableField, ObservableProperty};

// -------------------------------------------------------------------------------------------------

/// Read/write access to a single value, which an [`ObservableProperty`] wraps.
///
/// This trait is implemented for
/// [`core::cell::Cell`],
/// [`core::cell::RefCell`],
/// [`std::sync::Mutex`] when the `"std"` feature is enabled,
/// and the [atomic types][core::sync::atomic] of at least 8 bits.
/// [`FnProperty`] builds one from a pair of functions.
///
/// Accessors are not required to be thread-safe; choose a mutex-guarded one such as
/// [`std::sync::Mutex`] if the value is written from several threads.
///
/// # Generic parameters
///
/// * `V` is the type of the value.
pub trait Property<V> {
    /// Returns the current value.
    ///
    /// # Errors
    ///
    /// May fail in any way the implementation sees fit; the fault is passed on unchanged
    /// by wrappers.
    fn get(&self) -> Result<V, Fault>;

    /// Replaces the current value.
    ///
    /// # Errors
    ///
    /// May fail in any way the implementation sees fit; the fault is passed on unchanged
    /// by wrappers.
    fn set(&self, value: V) -> Result<(), Fault>;
}

/// Read/write access to a value belonging to some item passed in each call,
/// which an [`ObservableField`] wraps.
///
/// Where a [`Property`] is a storage location, a `Field` is a way of finding the storage
/// location within an `I`, such as a struct field accessor.
/// [`FnField`] builds one from a pair of functions.
///
/// # Generic parameters
///
/// * `I` is the type of the item containing the value.
/// * `V` is the type of the value.
pub trait Field<I: ?Sized, V> {
    /// Returns the current value in `item`.
    ///
    /// # Errors
    ///
    /// May fail in any way the implementation sees fit; the fault is passed on unchanged
    /// by wrappers.
    fn get(&self, item: &I) -> Result<V, Fault>;

    /// Replaces the current value in `item`.
    ///
    /// # Errors
    ///
    /// May fail in any way the implementation sees fit; the fault is passed on unchanged
    /// by wrappers.
    fn set(&self, item: &I, value: V) -> Result<(), Fault>;
}

// -------------------------------------------------------------------------------------------------
// Pointer impls

macro_rules! impl_pointer_accessors {
    ($($ptr:ident),*) => {$(
        impl<V, P: ?Sized + Property<V>> Property<V> for $ptr<P> {
            fn get(&self) -> Result<V, Fault> {
                (**self).get()
            }
            fn set(&self, value: V) -> Result<(), Fault> {
                (**self).set(value)
            }
        }
        impl<I: ?Sized, V, F: ?Sized + Field<I, V>> Field<I, V> for $ptr<F> {
            fn get(&self, item: &I) -> Result<V, Fault> {
                (**self).get(item)
            }
            fn set(&self, item: &I, value: V) -> Result<(), Fault> {
                (**self).set(item, value)
            }
        }
    )*};
}
impl_pointer_accessors!(Box, Rc, Arc);

impl<V, P: ?Sized + Property<V>> Property<V> for &P {
    fn get(&self) -> Result<V, Fault> {
        (**self).get()
    }
    fn set(&self, value: V) -> Result<(), Fault> {
        (**self).set(value)
    }
}

// -------------------------------------------------------------------------------------------------
// `core::cell` impls

impl<T: Copy> Property<T> for core::cell::Cell<T> {
    fn get(&self) -> Result<T, Fault> {
        Ok(core::cell::Cell::get(self))
    }
    fn set(&self, value: T) -> Result<(), Fault> {
        core::cell::Cell::set(self, value);
        Ok(())
    }
}

/// A borrow conflict, such as writing while a listener holds a borrow, is reported as a
/// fault rather than a panic.
impl<T: Clone> Property<T> for core::cell::RefCell<T> {
    fn get(&self) -> Result<T, Fault> {
        Ok(self.try_borrow()?.clone())
    }
    fn set(&self, value: T) -> Result<(), Fault> {
        // Using mem::replace instead of assignment so that the old value will be dropped
        // after the borrow ends instead of before.
        let _old_value = core::mem::replace(&mut *self.try_borrow_mut()?, value);
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------
// `std::sync` impls

/// Poisoning is ignored, since a panic while the lock was held cannot have left a plain
/// value half-written.
#[cfg(feature = "std")]
impl<T: Clone> Property<T> for std::sync::Mutex<T> {
    fn get(&self) -> Result<T, Fault> {
        Ok(self
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }
    fn set(&self, value: T) -> Result<(), Fault> {
        let mut guard = self.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let _old_value = core::mem::replace(&mut *guard, value);
        drop(guard);
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------
// Atomic impls

macro_rules! impl_property_for_atomic {
    ($($atomic:ident $value:ident,)*) => {$(
        /// Accesses the value with [`Relaxed`] ordering.
        impl Property<$value> for atomic::$atomic {
            fn get(&self) -> Result<$value, Fault> {
                Ok(self.load(Relaxed))
            }
            fn set(&self, value: $value) -> Result<(), Fault> {
                self.store(value, Relaxed);
                Ok(())
            }
        }
    )*};
}

impl_property_for_atomic!(
    AtomicBool bool,
    AtomicI8 i8,
    AtomicU8 u8,
);
#[cfg(target_has_atomic = "16")]
impl_property_for_atomic!(
    AtomicI16 i16,
    AtomicU16 u16,
);
#[cfg(target_has_atomic = "32")]
impl_property_for_atomic!(
    AtomicI32 i32,
    AtomicU32 u32,
);
#[cfg(target_has_atomic = "64")]
impl_property_for_atomic!(
    AtomicI64 i64,
    AtomicU64 u64,
);
impl_property_for_atomic!(
    AtomicIsize isize,
    AtomicUsize usize,
);

// -------------------------------------------------------------------------------------------------

/// A [`Property`] made of a getter function and a setter function.
///
/// ```
/// use std::cell::RefCell;
/// use tattle::{FnProperty, Property as _};
///
/// let celsius = RefCell::new(20.0_f64);
/// let fahrenheit = FnProperty::new(
///     || Ok(*celsius.try_borrow()? * 9.0 / 5.0 + 32.0),
///     |f: f64| {
///         *celsius.try_borrow_mut()? = (f - 32.0) * 5.0 / 9.0;
///         Ok(())
///     },
/// );
/// assert_eq!(fahrenheit.get()?, 68.0);
/// fahrenheit.set(212.0)?;
/// assert_eq!(*celsius.borrow(), 100.0);
/// # Ok::<(), tattle::Fault>(())
/// ```
#[derive(Clone, Copy)]
pub struct FnProperty<G, S> {
    get: G,
    set: S,
}

impl<G, S> FnProperty<G, S> {
    /// Combines a getter and a setter.
    pub fn new<V>(get: G, set: S) -> Self
    where
        G: Fn() -> Result<V, Fault>,
        S: Fn(V) -> Result<(), Fault>,
    {
        Self { get, set }
    }
}

impl<V, G, S> Property<V> for FnProperty<G, S>
where
    G: Fn() -> Result<V, Fault>,
    S: Fn(V) -> Result<(), Fault>,
{
    fn get(&self) -> Result<V, Fault> {
        (self.get)()
    }
    fn set(&self, value: V) -> Result<(), Fault> {
        (self.set)(value)
    }
}

impl<G, S> fmt::Debug for FnProperty<G, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProperty")
            .field("get", &crate::util::Unquote::type_name::<G>())
            .field("set", &crate::util::Unquote::type_name::<S>())
            .finish()
    }
}

/// A [`Field`] made of a getter function and a setter function.
///
/// ```
/// use std::cell::RefCell;
/// use tattle::{Field as _, FnField};
///
/// struct Person {
///     name: String,
/// }
///
/// let name = FnField::new(
///     |p: &RefCell<Person>| Ok(p.try_borrow()?.name.clone()),
///     |p: &RefCell<Person>, name: String| {
///         p.try_borrow_mut()?.name = name;
///         Ok(())
///     },
/// );
/// let person = RefCell::new(Person { name: "Ada".into() });
/// name.set(&person, "Grace".into())?;
/// assert_eq!(name.get(&person)?, "Grace");
/// # Ok::<(), tattle::Fault>(())
/// ```
#[derive(Clone, Copy)]
pub struct FnField<G, S> {
    get: G,
    set: S,
}

impl<G, S> FnField<G, S> {
    /// Combines a getter and a setter.
    pub fn new<I: ?Sized, V>(get: G, set: S) -> Self
    where
        G: Fn(&I) -> Result<V, Fault>,
        S: Fn(&I, V) -> Result<(), Fault>,
    {
        Self { get, set }
    }
}

impl<I: ?Sized, V, G, S> Field<I, V> for FnField<G, S>
where
    G: Fn(&I) -> Result<V, Fault>,
    S: Fn(&I, V) -> Result<(), Fault>,
{
    fn get(&self, item: &I) -> Result<V, Fault> {
        (self.get)(item)
    }
    fn set(&self, item: &I, value: V) -> Result<(), Fault> {
        (self.set)(item, value)
    }
}

impl<G, S> fmt::Debug for FnField<G, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnField")
            .field("get", &crate::util::Unquote::type_name::<G>())
            .field("set", &crate::util::Unquote::type_name::<S>())
            .finish()
    }
}

// -------------------------------------------------------------------------------------------------
