use super::Error;

/// Error reported by a row source (cursor transport, unknown column label,
/// positioning failure).
#[derive(Debug)]
pub(super) struct RowSourceError {
    message: Box<str>,
}

impl std::error::Error for RowSourceError {}

impl core::fmt::Display for RowSourceError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "row source failure: {}", self.message)
    }
}

impl Error {
    /// Creates a row source error.
    pub fn row_source(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::RowSource(RowSourceError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error came from a row source.
    pub fn is_row_source(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::RowSource(_)))
    }
}
