use super::Error;

/// Error when a nested query bound to a singular property returns more than
/// one row.
#[derive(Debug)]
pub(super) struct TooManyResultsError {
    statement: Box<str>,
    found: usize,
}

impl std::error::Error for TooManyResultsError {}

impl core::fmt::Display for TooManyResultsError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "expected one result (or none) from `{}`, but found {}",
            self.statement, self.found
        )
    }
}

impl Error {
    /// Creates a too many results error.
    pub fn too_many_results(statement: impl Into<String>, found: usize) -> Error {
        Error::from(super::ErrorKind::TooManyResults(TooManyResultsError {
            statement: statement.into().into(),
            found,
        }))
    }

    /// Returns `true` if this error is a too many results error.
    pub fn is_too_many_results(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::TooManyResults(_)))
    }
}
