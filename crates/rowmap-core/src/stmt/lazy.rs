use super::Value;
use crate::Result;

/// A deferred computation of a property value.
///
/// Loaders are registered on an [`Object`](super::Object) and run the first
/// time the property they target is read.
pub trait LazyLoad: core::fmt::Debug {
    /// Produces the property value. Called at most once per registration.
    fn load(&self) -> Result<Value>;
}
