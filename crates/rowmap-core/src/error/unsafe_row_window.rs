use super::Error;

/// Error when a row window constrains a statement with nested mappings.
#[derive(Debug)]
pub(super) struct UnsafeRowWindowError;

impl std::error::Error for UnsafeRowWindowError {}

impl core::fmt::Display for UnsafeRowWindowError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(
            "statements with nested result mappings cannot be safely constrained by a row window; \
             disable `safe_row_bounds_enabled` to bypass this check",
        )
    }
}

impl Error {
    /// Creates an unsafe row window error.
    pub fn unsafe_row_window() -> Error {
        Error::from(super::ErrorKind::UnsafeRowWindow(UnsafeRowWindowError))
    }

    /// Returns `true` if this error is an unsafe row window error.
    pub fn is_unsafe_row_window(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::UnsafeRowWindow(_)))
    }
}
