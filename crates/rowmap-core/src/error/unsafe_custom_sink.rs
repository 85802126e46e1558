use super::Error;

/// Error when a caller-supplied sink is used with nested mappings over rows
/// that are not declared pre-ordered.
#[derive(Debug)]
pub(super) struct UnsafeCustomSinkError;

impl std::error::Error for UnsafeCustomSinkError {}

impl core::fmt::Display for UnsafeCustomSinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(
            "statements with nested result mappings cannot be safely used with a custom result sink; \
             disable `safe_result_handler_enabled` or declare the statement `result_ordered`",
        )
    }
}

impl Error {
    /// Creates an unsafe custom sink error.
    pub fn unsafe_custom_sink() -> Error {
        Error::from(super::ErrorKind::UnsafeCustomSink(UnsafeCustomSinkError))
    }

    /// Returns `true` if this error is an unsafe custom sink error.
    pub fn is_unsafe_custom_sink(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::UnsafeCustomSink(_)))
    }
}
