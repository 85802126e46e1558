use super::Error;

/// Error when the mapping registry is inconsistent or cannot serve a
/// request.
///
/// This occurs when:
/// - A binding references a result map, statement or model that does not exist
/// - A statement produced rows but declares no result map
/// - A cursor is requested for a statement with several result maps
#[derive(Debug)]
pub(super) struct InvalidMappingError {
    message: Box<str>,
}

impl std::error::Error for InvalidMappingError {}

impl core::fmt::Display for InvalidMappingError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid mapping: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid mapping error.
    pub fn invalid_mapping(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidMapping(InvalidMappingError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid mapping error.
    pub fn is_invalid_mapping(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::InvalidMapping(_)))
    }
}
