use super::Error;

/// Error when no converter can produce the requested type from a column.
#[derive(Debug)]
pub(super) struct ConversionUnavailableError {
    ty: Box<str>,
    column: Box<str>,
}

impl std::error::Error for ConversionUnavailableError {}

impl core::fmt::Display for ConversionUnavailableError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "no converter for {} from column `{}`", self.ty, self.column)
    }
}

impl Error {
    /// Creates a conversion unavailable error for the `(type, column)` pair.
    pub fn conversion_unavailable(ty: impl core::fmt::Display, column: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::ConversionUnavailable(
            ConversionUnavailableError {
                ty: ty.to_string().into(),
                column: column.into().into(),
            },
        ))
    }

    /// Returns `true` if this error is a conversion unavailable error.
    pub fn is_conversion_unavailable(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::ConversionUnavailable(_)))
    }
}
