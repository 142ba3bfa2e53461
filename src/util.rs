use core::fmt;

/// Prints a type name without quotes when used as a [`fmt::Debug`] field.
///
/// Used for listeners and accessors built from closures, whose only identifying
/// information is the closure's type name.
pub(crate) struct Unquote(&'static str);

impl Unquote {
    pub(crate) fn type_name<T: ?Sized>() -> Self {
        Unquote(core::any::type_name::<T>())
    }
}

impl fmt::Debug for Unquote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
