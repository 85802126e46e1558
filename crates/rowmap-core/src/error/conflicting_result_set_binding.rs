use super::Error;

/// Error when two different bindings claim the same named result set.
#[derive(Debug)]
pub(super) struct ConflictingResultSetBindingError {
    result_set: Box<str>,
    previous: Box<str>,
    property: Box<str>,
}

impl std::error::Error for ConflictingResultSetBindingError {}

impl core::fmt::Display for ConflictingResultSetBindingError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "two different properties are mapped to the same result set `{}`: `{}` and `{}`",
            self.result_set, self.previous, self.property
        )
    }
}

impl Error {
    /// Creates a conflicting result set binding error.
    pub fn conflicting_result_set_binding(
        result_set: impl Into<String>,
        previous: impl Into<String>,
        property: impl Into<String>,
    ) -> Error {
        Error::from(super::ErrorKind::ConflictingResultSetBinding(
            ConflictingResultSetBindingError {
                result_set: result_set.into().into(),
                previous: previous.into().into(),
                property: property.into().into(),
            },
        ))
    }

    /// Returns `true` if this error is a conflicting result set binding error.
    pub fn is_conflicting_result_set_binding(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::ConflictingResultSetBinding(_)))
    }
}
