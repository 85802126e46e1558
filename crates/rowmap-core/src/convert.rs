//! Reading typed values out of columns.

use crate::{
    driver::ResultSet,
    stmt::{Type, Value},
    Result,
};

use indexmap::IndexMap;
use std::{fmt, sync::Arc};

/// Reads one column of the current row as a value of a specific type.
pub trait Converter: fmt::Debug {
    fn get(&self, rs: &dyn ResultSet, column: &str) -> Result<Value>;
}

/// Finds the converter for a (value type, column type) pair.
pub trait ConverterRegistry {
    /// Resolves a converter producing `ty` from a column declared as
    /// `column_ty`. `None` for `column_ty` means the column type is not known.
    fn resolve(&self, ty: &Type, column_ty: Option<&Type>) -> Option<Arc<dyn Converter>>;

    fn has(&self, ty: &Type, column_ty: Option<&Type>) -> bool {
        self.resolve(ty, column_ty).is_some()
    }

    /// Looks up a converter registered under `name`.
    fn named(&self, name: &str) -> Option<Arc<dyn Converter>>;
}

/// Casts the raw column value into the target type.
#[derive(Debug, Clone)]
pub struct Cast(pub Type);

impl Converter for Cast {
    fn get(&self, rs: &dyn ResultSet, column: &str) -> Result<Value> {
        self.0.cast(rs.get(column)?)
    }
}

/// The default registry.
///
/// Scalar types and [`Type::Unknown`] resolve to [`Cast`]. Converters
/// registered for a type take precedence, which is also how object-valued
/// types gain a converter.
#[derive(Debug, Default, Clone)]
pub struct Converters {
    by_type: IndexMap<Type, Arc<dyn Converter>>,
    by_name: IndexMap<String, Arc<dyn Converter>>,
}

impl Converters {
    pub fn new() -> Converters {
        Converters::default()
    }

    /// Registers `converter` for every column read as `ty`.
    pub fn register(&mut self, ty: Type, converter: impl Converter + 'static) -> &mut Self {
        self.by_type.insert(ty, Arc::new(converter));
        self
    }

    /// Registers `converter` for bindings that reference it by name.
    pub fn register_named(
        &mut self,
        name: impl Into<String>,
        converter: impl Converter + 'static,
    ) -> &mut Self {
        self.by_name.insert(name.into(), Arc::new(converter));
        self
    }
}

impl ConverterRegistry for Converters {
    fn resolve(&self, ty: &Type, column_ty: Option<&Type>) -> Option<Arc<dyn Converter>> {
        if let Some(converter) = self.by_type.get(ty) {
            return Some(converter.clone());
        }

        if !(ty.is_scalar() || ty.is_unknown()) {
            return None;
        }

        // Binary columns only read as bytes or as raw values
        if let Some(Type::Bytes) = column_ty {
            if !matches!(ty, Type::Bytes | Type::Unknown) {
                return None;
            }
        }

        Some(Arc::new(Cast(ty.clone())))
    }

    fn named(&self, name: &str) -> Option<Arc<dyn Converter>> {
        self.by_name.get(name).cloned()
    }
}
