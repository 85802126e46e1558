use super::Error;

/// Wraps a failure raised while assembling a nested property.
#[derive(Debug)]
pub(super) struct NestedMaterializationError {
    property: Box<str>,
}

impl std::error::Error for NestedMaterializationError {}

impl core::fmt::Display for NestedMaterializationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "error getting nested result map values for `{}`",
            self.property
        )
    }
}

impl Error {
    /// Wraps `cause` as a failure of the nested property `property`.
    pub fn nested_materialization(property: impl Into<String>, cause: Error) -> Error {
        cause.context(Error::from(super::ErrorKind::NestedMaterialization(
            NestedMaterializationError {
                property: property.into().into(),
            },
        )))
    }

    /// Returns `true` if this error was raised while assembling a nested
    /// property.
    pub fn is_nested_materialization(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::NestedMaterialization(_)))
    }
}
