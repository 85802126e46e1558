use super::Error;

/// Error when no construction strategy can produce an instance of a type.
#[derive(Debug)]
pub(super) struct NoViableConstructorError {
    ty: Box<str>,
    detail: Box<str>,
}

impl std::error::Error for NoViableConstructorError {}

impl core::fmt::Display for NoViableConstructorError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "cannot create an instance of {}: {}",
            self.ty, self.detail
        )
    }
}

impl Error {
    /// Creates a no viable constructor error.
    pub fn no_viable_constructor(ty: impl core::fmt::Display, detail: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::NoViableConstructor(
            NoViableConstructorError {
                ty: ty.to_string().into(),
                detail: detail.into().into(),
            },
        ))
    }

    /// Returns `true` if this error is a no viable constructor error.
    pub fn is_no_viable_constructor(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::NoViableConstructor(_)))
    }
}
