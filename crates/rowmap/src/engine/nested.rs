use super::{row_source::prepend_prefix, Exec, RowSource};
use rowmap_core::{
    err,
    schema::mapping::{Binding, ResultMap},
    stmt::{CacheKey, Object, Value},
    Error, Result,
};

impl<'a> Exec<'a> {
    /// Builds, or completes, the object for the current row of a result map
    /// with nested result maps.
    ///
    /// A `partial` object seen on an earlier row only receives the nested
    /// result maps of this row. A new object is remembered under
    /// `combined_key`.
    pub(super) fn get_nested_row_value(
        &mut self,
        rsw: &RowSource<'a>,
        result_map: &'a ResultMap,
        combined_key: &CacheKey,
        prefix: Option<&str>,
        partial: Option<Value>,
    ) -> Result<Option<Value>> {
        let id = &result_map.id;

        if let Some(row_value) = partial {
            if let Value::Object(object) = &row_value {
                self.ancestors.insert(id.clone(), object.clone());
                let res = self.apply_nested_result_mappings(
                    rsw,
                    result_map,
                    object,
                    prefix,
                    combined_key,
                    false,
                );
                self.ancestors.remove(id);
                res?;
            }
            return Ok(Some(row_value));
        }

        let (mut row_value, used_constructor) = self.create_result_object(rsw, result_map, prefix)?;

        let object = row_value.as_ref().and_then(Value::as_object).cloned();
        if let Some(object) = object {
            if !self.has_converter_for_result(rsw, &result_map.ty) {
                let mut found = used_constructor;
                if self.should_apply_automatic_mappings(result_map, true) {
                    found = self.apply_automatic_mappings(rsw, result_map, &object, prefix)? || found;
                }
                found = self.apply_property_mappings(rsw, result_map, &object, prefix)? || found;

                self.ancestors.insert(id.clone(), object.clone());
                let res = self.apply_nested_result_mappings(
                    rsw,
                    result_map,
                    &object,
                    prefix,
                    combined_key,
                    true,
                );
                self.ancestors.remove(id);
                found = res? || found;

                found = object.pending_loads() > 0 || found;
                if !found && !self.engine.config.return_instance_for_empty_row {
                    row_value = None;
                }
            }
        }

        if let Some(value) = &row_value {
            if !combined_key.is_null() {
                self.nested_objects.insert(combined_key.clone(), value.clone());
            }
        }

        Ok(row_value)
    }

    /// Applies the nested result maps of `result_map` to `target`. Returns
    /// `true` if a new nested object was linked.
    ///
    /// `new_object` is set while `target` is assembled for the first time.
    /// Only then is an ancestor under construction linked in place of a
    /// nested object.
    fn apply_nested_result_mappings(
        &mut self,
        rsw: &RowSource<'a>,
        result_map: &'a ResultMap,
        target: &Object,
        parent_prefix: Option<&str>,
        parent_key: &CacheKey,
        new_object: bool,
    ) -> Result<bool> {
        let mut found = false;

        for binding in result_map.property_bindings() {
            if !binding.has_nested_result_map() {
                continue;
            }

            found = self
                .apply_nested_result_mapping(rsw, binding, target, parent_prefix, parent_key, new_object)
                .map_err(|err| Error::nested_materialization(binding.property_name(), err))?
                || found;
        }

        Ok(found)
    }

    fn apply_nested_result_mapping(
        &mut self,
        rsw: &RowSource<'a>,
        binding: &'a Binding,
        target: &Object,
        parent_prefix: Option<&str>,
        parent_key: &CacheKey,
        new_object: bool,
    ) -> Result<bool> {
        let Some(nested_id) = &binding.nested_result_map else {
            return Ok(false);
        };

        let prefix = column_prefix(parent_prefix, binding);
        let prefix = prefix.as_deref();
        let nested = self.schema().result_map(nested_id)?;
        let nested = self.resolve_discriminated_result_map(rsw, nested, prefix)?;

        if binding.column_prefix.is_none() {
            if let Some(ancestor) = self.ancestors.get(nested_id).cloned() {
                log::trace!("linking ancestor `{nested_id}` into `{}`", binding.property_name());
                if new_object {
                    self.link_objects(target, binding, ancestor.into())?;
                }
                return Ok(false);
            }
        }

        let row_key = self.create_row_key(rsw, nested, prefix)?;
        let combined_key = combine_keys(&row_key, parent_key);
        let known = self.known_object(&combined_key);
        let is_known = known.is_some();

        self.instantiate_collection_property(target, binding)?;

        if !self.any_not_null_column_has_value(rsw, binding, prefix)? {
            return Ok(false);
        }

        let row_value = self.get_nested_row_value(rsw, nested, &combined_key, prefix, known)?;

        match row_value {
            Some(value) if !value.is_null() && !is_known => {
                self.link_objects(target, binding, value)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Returns `false` when the row holds nothing for the nested result map:
    /// all of its not-null columns are null, or no column carries its
    /// prefix.
    fn any_not_null_column_has_value(
        &self,
        rsw: &RowSource<'a>,
        binding: &Binding,
        prefix: Option<&str>,
    ) -> Result<bool> {
        if !binding.not_null_columns.is_empty() {
            for column in &binding.not_null_columns {
                if !rsw.get_raw(&prepend_prefix(column, prefix))?.is_null() {
                    return Ok(true);
                }
            }
            return Ok(false);
        }

        if let Some(prefix) = prefix {
            let prefix = prefix.to_uppercase();
            return Ok(rsw
                .columns()
                .iter()
                .any(|column| column.name.to_uppercase().starts_with(&prefix)));
        }

        Ok(true)
    }

    /// Links `value` into the property of `target` that `binding` assigns:
    /// appended when the property holds a collection, set otherwise.
    pub(super) fn link_objects(&self, target: &Object, binding: &Binding, value: Value) -> Result<()> {
        let property = binding.property_name();

        if self.instantiate_collection_property(target, binding)? {
            self.append_property(target, property, value)
        } else {
            self.set_property(target, property, value)
        }
    }

    /// Creates the collection held by the property `binding` assigns if it is
    /// still null. Returns `true` if the property holds a collection.
    fn instantiate_collection_property(&self, target: &Object, binding: &Binding) -> Result<bool> {
        let property = binding.property_name();
        let factory = &self.engine.factory;

        match self.get_property(target, property)? {
            Value::Null => {
                let ty = match &binding.ty {
                    ty if !ty.is_unknown() => ty.clone(),
                    _ => self.property_ty(target, property).unwrap_or_default(),
                };

                if !factory.is_collection(&ty) {
                    return Ok(false);
                }

                let collection = factory.create(&ty).map_err(|err| {
                    err.context(err!("instantiating collection property `{property}`"))
                })?;
                self.set_property(target, property, collection)?;
                Ok(true)
            }
            Value::List(_) => Ok(true),
            _ => Ok(false),
        }
    }
}

/// The prefix of the columns a nested result map reads: the parent's prefix
/// followed by the binding's own, upper-cased.
pub(super) fn column_prefix(parent: Option<&str>, binding: &Binding) -> Option<String> {
    let prefix = format!(
        "{}{}",
        parent.unwrap_or(""),
        binding.column_prefix.as_deref().unwrap_or("")
    );

    if prefix.is_empty() {
        None
    } else {
        Some(prefix.to_uppercase())
    }
}

/// Identity of a nested object within its parent. Null unless both keys
/// have at least two components.
pub(super) fn combine_keys(row_key: &CacheKey, parent_key: &CacheKey) -> CacheKey {
    if row_key.update_count() > 1 && parent_key.update_count() > 1 {
        let mut combined = row_key.clone();
        combined.update(parent_key);
        combined
    } else {
        CacheKey::null()
    }
}
