#![no_std]

//! Library for change notification through shared listener registries.
//!
//! # What `tattle` does
//!
//! `tattle` lets values announce their changes to interested parties without having to own
//! a list of listeners each. Instead:
//!
//! * An [`Observers`] registry is shared by every sender of one kind of message, and keeps a
//!   separate, ordered list of listeners for each sender, keyed by the sender's
//!   [`SenderKey`]. A value which has no listeners costs nothing but its key.
//!
//! * [`ObservableProperty`] and [`ObservableField`] wrap a getter/setter pair (a
//!   [`Property`] or [`Field`]) and fire an [`UpdatePropertyEvent`] or [`UpdateFieldEvent`]
//!   through their registry whenever a write actually changes the value.
//!   Events record the old and new values, and can write either back through their sender,
//!   which makes undo and replay straightforward.
//!
//! Delivery is synchronous, on the thread that made the write, in registration order.
//! A listener may fail, in which case the remaining listeners are not called and the error
//! is returned to the writer; nothing is rolled back.
//!
//! # Getting started
//!
//! The types in this library are generic over the listener pointer type, which determines
//! whether they are <code>[Send] + [Sync]</code>. For convenience, a set of less-generic type
//! aliases is available in the [`sync`] and [`unsync`] modules.
//!
//! * To send messages from a type of your own, give each value a [`SenderKey`] and a shared
//!   [`Observers`], and implement [`Observable`].
//!
//! * To observe changes to a stored value, wrap its accessor in an [`ObservableProperty`]
//!   (or, for values inside many items, an [`ObservableField`]).
//!
//! * To receive messages, implement [`Listener`], or use an existing implementation such as
//!   [`Flag`], [`Log`], or [`FnListener`], and register it with
//!   [`Observable::register()`] or [`Observable::register_weak()`].
//!
//! # Features and platform requirements
//!
//! `tattle` is compatible with `no_std` platforms which have the `alloc` standard library
//! crate, a global allocator, and pointer-sized atomics.
//!
//! The following Cargo feature flags are defined:
//!
//! * `"std"`:
//!   Enable implementations of our traits for [`std`] types,
//!   rather than only [`core`] and [`alloc`] types.
//!
//! * `"sync"`:
//!   Makes use of [`std::sync`] to add [`Sync`] to [`Observers`],
//!   and adds the type aliases in [`sync`] which depend on that.
//!
//! # Logging
//!
//! Registration, unregistration, and firing are reported through [`tracing`] at trace level,
//! and discarding of dead listeners and senders at debug level.
//! No subscriber is installed by this library.
//!
#![cfg_attr(not(feature = "std"), doc = " [`std`]: https://doc.rust-lang.org/std/")]
#![cfg_attr(
    not(feature = "std"),
    doc = " [`std::sync`]: https://doc.rust-lang.org/std/sync/"
)]
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(explicit_outlives_requirements)]
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![warn(redundant_lifetimes)]
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
#![warn(unnameable_types)]
#![warn(unused_extern_crates)]
#![warn(unused_lifetimes)]
#![warn(unreachable_pub)]
#![warn(
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc
)]
#![warn(clippy::assigning_clones)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::exhaustive_enums)]
#![warn(clippy::exhaustive_structs)]
#![warn(clippy::inconsistent_struct_constructor)]
#![warn(clippy::large_stack_frames)]
#![warn(clippy::manual_let_else)]
#![warn(clippy::missing_panics_doc)]
#![warn(clippy::pedantic)]
#![warn(clippy::return_self_not_must_use)]
#![warn(clippy::should_panic_without_expect)]
#![warn(clippy::unnecessary_self_imports)]
#![warn(clippy::unnecessary_wraps)]
#![allow(clippy::bool_assert_comparison, reason = "less legible")]
#![allow(clippy::explicit_auto_deref)]
#![allow(clippy::explicit_iter_loop)]
#![allow(clippy::module_name_repetitions, reason = "names are re-exported at the root")]
#![allow(clippy::semicolon_if_nothing_returned, reason = "explicit delegation")]
#![cfg_attr(test, allow(clippy::arc_with_non_send_sync))]

// -------------------------------------------------------------------------------------------------

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

// -------------------------------------------------------------------------------------------------

mod accessor;
pub use accessor::{Field, FnField, FnProperty, Property};

mod error;
pub use error::{Error, Fault};

mod event;
pub use event::{FieldTarget, FromSender, PropertyTarget, UpdateFieldEvent, UpdatePropertyEvent};

mod field;
pub use field::ObservableField;

mod handle;
pub use handle::Handle;

mod key;
pub use key::SenderKey;

mod listener;
pub use listener::{FnListener, Listener};

mod maybe_sync;

mod observable;
pub use observable::Observable;

mod observers;
pub use observers::{Deliver, Observation, Observers};

mod property;
pub use property::ObservableProperty;

mod simple_listeners;
pub use simple_listeners::{Flag, FlagListener, Log, LogListener, NullListener};

mod tracking;
pub use tracking::Tracking;

mod util;

// -------------------------------------------------------------------------------------------------

/// Type aliases for use in applications where listeners and values are expected to
/// implement [`Sync`].
///
/// Some of the items in this module are only available with the `"sync"` feature.
#[cfg_attr(not(feature = "sync"), allow(rustdoc::broken_intra_doc_links))]
pub mod sync {
    use crate::{FieldTarget, Listener, PropertyTarget};
    use alloc::sync::Arc;

    #[cfg(doc)]
    use crate::unsync;

    /// Type-erased form of a [`Listener`] which accepts messages of type `M`.
    ///
    /// This type is [`Send`] and [`Sync`]. When that is not satisfiable, use
    /// [`unsync::DynListener`] instead.
    pub type DynListener<M> = Arc<dyn Listener<M> + Send + Sync>;

    /// Converts `listener` into a [`DynListener`].
    ///
    /// This function behaves identically to `Arc::new(listener)` followed by
    /// [unsized coercion](https://doc.rust-lang.org/reference/type-coercions.html#unsized-coercions).
    pub fn dyn_listener<M, L>(listener: L) -> DynListener<M>
    where
        L: Listener<M> + Send + Sync + 'static,
    {
        Arc::new(listener)
    }

    /// Listener registry.
    ///
    /// This type is [`Send`] and [`Sync`] and therefore requires all its [`Listener`]s to be so.
    /// When this requirement is undesired, use [`unsync::Observers`] instead.
    #[cfg(feature = "sync")]
    pub type Observers<M> = crate::Observers<M, DynListener<M>>;

    /// Change event of an [`ObservableProperty`], which is [`Send`] and [`Sync`] if `V` is.
    pub type UpdatePropertyEvent<V> =
        crate::UpdatePropertyEvent<V, dyn PropertyTarget<V> + Send + Sync>;

    /// Change event of an [`ObservableField`], which is [`Send`] and [`Sync`] if `I` and `V`
    /// are.
    pub type UpdateFieldEvent<I, V> =
        crate::UpdateFieldEvent<I, V, dyn FieldTarget<I, V> + Send + Sync>;

    /// Registry for the events of [`ObservableProperty`]s with values of type `V`.
    #[cfg(feature = "sync")]
    pub type UpdatePropertyObservers<V> = Observers<UpdatePropertyEvent<V>>;

    /// Registry for the events of [`ObservableField`]s with values of type `V` in items of
    /// type `I`.
    #[cfg(feature = "sync")]
    pub type UpdateFieldObservers<I, V> = Observers<UpdateFieldEvent<I, V>>;

    /// A [`Property`](crate::Property) which notifies listeners when it changes.
    ///
    /// This type is [`Send`] and [`Sync`] if `P` and `V` are, and therefore requires its
    /// listeners to be so. When this requirement is undesired, use
    /// [`unsync::ObservableProperty`] instead.
    #[cfg(feature = "sync")]
    pub type ObservableProperty<P, V> = crate::ObservableProperty<
        P,
        V,
        DynListener<UpdatePropertyEvent<V>>,
        dyn PropertyTarget<V> + Send + Sync,
    >;

    /// A [`Field`](crate::Field) which notifies listeners when it changes.
    ///
    /// This type is [`Send`] and [`Sync`] if `F`, `I`, and `V` are, and therefore requires
    /// its listeners to be so. When this requirement is undesired, use
    /// [`unsync::ObservableField`] instead.
    #[cfg(feature = "sync")]
    pub type ObservableField<F, I, V> = crate::ObservableField<
        F,
        I,
        V,
        DynListener<UpdateFieldEvent<I, V>>,
        dyn FieldTarget<I, V> + Send + Sync,
    >;
}

/// Type aliases for use in applications where listeners are not expected to implement
/// [`Sync`].
pub mod unsync {
    use crate::{FieldTarget, Listener, PropertyTarget};
    use alloc::rc::Rc;

    #[cfg(doc)]
    use crate::sync;

    /// Type-erased form of a [`Listener`] which accepts messages of type `M`.
    ///
    /// This type is not [`Send`] or [`Sync`]. When that is needed, use
    /// [`sync::DynListener`] instead.
    pub type DynListener<M> = Rc<dyn Listener<M>>;

    /// Converts `listener` into a [`DynListener`].
    ///
    /// This function behaves identically to `Rc::new(listener)` followed by
    /// [unsized coercion](https://doc.rust-lang.org/reference/type-coercions.html#unsized-coercions).
    pub fn dyn_listener<M, L>(listener: L) -> DynListener<M>
    where
        L: Listener<M> + 'static,
    {
        Rc::new(listener)
    }

    /// Listener registry.
    ///
    /// This type is not [`Send`] or [`Sync`]. When that is needed, use
    /// [`sync::Observers`] instead.
    pub type Observers<M> = crate::Observers<M, DynListener<M>>;

    /// Change event of an [`ObservableProperty`].
    ///
    /// This type is not [`Send`] or [`Sync`]. When that is needed, use
    /// [`sync::UpdatePropertyEvent`] instead.
    pub type UpdatePropertyEvent<V> = crate::UpdatePropertyEvent<V, dyn PropertyTarget<V>>;

    /// Change event of an [`ObservableField`].
    ///
    /// This type is not [`Send`] or [`Sync`]. When that is needed, use
    /// [`sync::UpdateFieldEvent`] instead.
    pub type UpdateFieldEvent<I, V> = crate::UpdateFieldEvent<I, V, dyn FieldTarget<I, V>>;

    /// Registry for the events of [`ObservableProperty`]s with values of type `V`.
    pub type UpdatePropertyObservers<V> = Observers<UpdatePropertyEvent<V>>;

    /// Registry for the events of [`ObservableField`]s with values of type `V` in items of
    /// type `I`.
    pub type UpdateFieldObservers<I, V> = Observers<UpdateFieldEvent<I, V>>;

    /// A [`Property`](crate::Property) which notifies listeners when it changes.
    ///
    /// This type is not [`Send`] or [`Sync`]. When that is needed, use
    /// [`sync::ObservableProperty`] instead.
    pub type ObservableProperty<P, V> = crate::ObservableProperty<
        P,
        V,
        DynListener<UpdatePropertyEvent<V>>,
        dyn PropertyTarget<V>,
    >;

    /// A [`Field`](crate::Field) which notifies listeners when it changes.
    ///
    /// This type is not [`Send`] or [`Sync`]. When that is needed, use
    /// [`sync::ObservableField`] instead.
    pub type ObservableField<F, I, V> = crate::ObservableField<
        F,
        I,
        V,
        DynListener<UpdateFieldEvent<I, V>>,
        dyn FieldTarget<I, V>,
    >;
}
