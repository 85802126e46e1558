use super::Error;

/// Error raised by the failing unknown-column policy during automatic
/// mapping.
#[derive(Debug)]
pub(super) struct UnknownColumnError {
    statement: Box<str>,
    column: Box<str>,
    property: Box<str>,
    property_ty: Option<Box<str>>,
}

impl std::error::Error for UnknownColumnError {}

impl core::fmt::Display for UnknownColumnError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "unknown column `{}` detected on `{}` (property `{}`",
            self.column, self.statement, self.property
        )?;
        if let Some(ty) = &self.property_ty {
            write!(f, ", type {ty}")?;
        }
        f.write_str(")")
    }
}

impl Error {
    /// Creates an unknown column error.
    pub fn unknown_column(
        statement: impl Into<String>,
        column: impl Into<String>,
        property: impl Into<String>,
        property_ty: Option<String>,
    ) -> Error {
        Error::from(super::ErrorKind::UnknownColumn(UnknownColumnError {
            statement: statement.into().into(),
            column: column.into().into(),
            property: property.into().into(),
            property_ty: property_ty.map(Into::into),
        }))
    }

    /// Returns `true` if this error is an unknown column error.
    pub fn is_unknown_column(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::UnknownColumn(_)))
    }
}
