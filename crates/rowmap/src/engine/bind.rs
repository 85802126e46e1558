use super::{row_source::prepend_prefix, Exec, RowSource};
use rowmap_core::{
    convert::Converter,
    schema::mapping::{Binding, ResultMap},
    stmt::{Object, Type, Value},
    Error, Result, UnknownColumnBehavior,
};

use std::{fmt, rc::Rc, sync::Arc};

/// A column bound to a property because their names match.
pub(super) struct AutoBinding {
    column: String,
    property: String,
    converter: Arc<dyn Converter>,

    /// The property cannot hold null
    primitive: bool,
}

/// Outcome of reading a binding's value.
pub(super) enum Fetched {
    Value(Value),

    /// The value arrives later: through a lazy load, a pending cached load, or
    /// a later result set. Counts as a found value.
    Deferred,
}

impl<'a> Exec<'a> {
    /// Binds every column no binding of `result_map` reads to the property
    /// of the same name. Returns `true` if any column carried a value.
    pub(super) fn apply_automatic_mappings(
        &mut self,
        rsw: &RowSource<'a>,
        result_map: &ResultMap,
        target: &Object,
        prefix: Option<&str>,
    ) -> Result<bool> {
        let call_setters_on_nulls = self.engine.config.call_setters_on_nulls;
        let auto_mappings = self.create_automatic_mappings(rsw, result_map, target, prefix)?;
        let mut found = false;

        for mapping in auto_mappings.iter() {
            let value = mapping.converter.get(rsw.result_set(), &mapping.column)?;
            found |= !value.is_null();

            if !value.is_null() || (call_setters_on_nulls && !mapping.primitive) {
                self.set_property(target, &mapping.property, value)?;
            }
        }

        Ok(found)
    }

    /// The automatic bindings for `result_map` under `prefix`, computed once
    /// per result set pass.
    fn create_automatic_mappings(
        &mut self,
        rsw: &RowSource<'a>,
        result_map: &ResultMap,
        target: &Object,
        prefix: Option<&str>,
    ) -> Result<Rc<Vec<AutoBinding>>> {
        let key = format!("{}:{}", result_map.id, prefix.unwrap_or(""));
        if let Some(auto_mappings) = self.auto_mappings.get(&key) {
            return Ok(auto_mappings.clone());
        }

        let split = rsw.column_split(result_map, prefix);
        let mut auto_mappings = vec![];

        for column in &split.unmapped {
            let name = match prefix.filter(|prefix| !prefix.is_empty()) {
                Some(prefix) => match column.get(prefix.len()..) {
                    Some(rest) if column.to_uppercase().starts_with(&prefix.to_uppercase()) => rest,
                    _ => continue,
                },
                None => column.as_str(),
            };

            let Some((property, ty, primitive)) = self.find_property(target, name) else {
                self.unknown_column(column, name, None)?;
                continue;
            };

            if result_map.mapped_properties.contains(&property) {
                continue;
            }

            if rsw.has_converter(&ty, rsw.column_ty(column)) {
                auto_mappings.push(AutoBinding {
                    column: column.clone(),
                    converter: rsw.converter(&ty, column)?,
                    property,
                    primitive,
                });
            } else {
                self.unknown_column(column, &property, Some(&ty))?;
            }
        }

        log::trace!(
            "automatic mapping for `{key}`: {} of {} unmapped columns",
            auto_mappings.len(),
            split.unmapped.len()
        );

        let auto_mappings = Rc::new(auto_mappings);
        self.auto_mappings.insert(key, auto_mappings.clone());
        Ok(auto_mappings)
    }

    /// Finds the property a column label names: its declared name, type and
    /// whether it rejects null. Open objects accept any name as-is.
    fn find_property(&self, target: &Object, name: &str) -> Option<(String, Type, bool)> {
        let camel = self.engine.config.map_underscore_to_camel_case;

        match self.schema().model(target.model()) {
            Some(model) => match model.find_field(name, camel) {
                Some(field) => Some((field.name.clone(), field.ty.clone(), !field.nullable)),
                None if model.is_map() => Some((name.to_string(), Type::Unknown, false)),
                None => None,
            },
            None if target.is_map() => Some((name.to_string(), Type::Unknown, false)),
            None => None,
        }
    }

    fn unknown_column(&self, column: &str, property: &str, ty: Option<&Type>) -> Result<()> {
        match self.engine.config.auto_mapping_unknown_column_behavior {
            UnknownColumnBehavior::None => Ok(()),
            UnknownColumnBehavior::Warning => {
                log::warn!(
                    "unknown column detected on `{}` automatic mapping: column={column}, property={property}, type={}",
                    self.statement.id,
                    DisplayTy(ty)
                );
                Ok(())
            }
            UnknownColumnBehavior::Failing => Err(Error::unknown_column(
                &self.statement.id,
                column,
                property,
                ty.map(ToString::to_string),
            )),
        }
    }

    /// Applies the bindings of `result_map` that read columns, run nested
    /// statements or wait for a later result set. Returns `true` if any of
    /// them found a value.
    pub(super) fn apply_property_mappings(
        &mut self,
        rsw: &RowSource<'a>,
        result_map: &'a ResultMap,
        target: &Object,
        prefix: Option<&str>,
    ) -> Result<bool> {
        let split = rsw.column_split(result_map, prefix);
        let call_setters_on_nulls = self.engine.config.call_setters_on_nulls;
        let mut found = false;

        for binding in result_map.property_bindings() {
            let column = match (&binding.column, &binding.nested_result_map) {
                (Some(column), None) => Some(prepend_prefix(column, prefix).to_uppercase()),
                _ => None,
            };

            let mapped = column.is_some_and(|column| split.mapped.contains(&column));
            if !(binding.is_composite() || mapped || binding.result_set.is_some()) {
                continue;
            }

            let value = self.property_mapping_value(rsw, target, binding, prefix)?;

            let Some(property) = &binding.property else {
                continue;
            };

            let value = match value {
                Fetched::Deferred => {
                    found = true;
                    continue;
                }
                Fetched::Value(value) => value,
            };

            found |= !value.is_null();

            if !value.is_null() || (call_setters_on_nulls && !self.is_primitive(target, property)) {
                self.set_property(target, property, value)?;
            }
        }

        Ok(found)
    }

    fn property_mapping_value(
        &mut self,
        rsw: &RowSource<'a>,
        target: &Object,
        binding: &'a Binding,
        prefix: Option<&str>,
    ) -> Result<Fetched> {
        if binding.nested_query.is_some() {
            self.nested_query_mapping_value(rsw, target, binding, prefix)
        } else if binding.result_set.is_some() {
            self.add_pending_child_relation(rsw, target, binding)?;
            Ok(Fetched::Deferred)
        } else {
            let column = binding.column.as_deref().unwrap_or_default();
            rsw.get_for(binding, &prepend_prefix(column, prefix))
                .map(Fetched::Value)
        }
    }
}

struct DisplayTy<'a>(Option<&'a Type>);

impl fmt::Display for DisplayTy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ty) => fmt::Display::fmt(ty, f),
            None => f.write_str("?"),
        }
    }
}
