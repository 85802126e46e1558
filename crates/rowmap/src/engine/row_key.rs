use super::{nested::column_prefix, row_source::prepend_prefix, Exec, RowSource};
use rowmap_core::{
    schema::mapping::{Binding, ResultMap},
    stmt::CacheKey,
    Result,
};

impl<'a> Exec<'a> {
    /// Computes the identity of the object the current row describes for
    /// `result_map`.
    ///
    /// The identity is built from the id bindings, or from the unmapped
    /// columns when the result map has no bindings. An identity with fewer
    /// than two components is null and matches nothing.
    pub(super) fn create_row_key(
        &self,
        rsw: &RowSource<'a>,
        result_map: &'a ResultMap,
        prefix: Option<&str>,
    ) -> Result<CacheKey> {
        let mut key = CacheKey::new();
        key.update(&result_map.id);

        let bindings: Vec<_> = result_map.id_bindings().collect();

        if bindings.is_empty() {
            if self.is_map_type(result_map) {
                self.row_key_for_map(rsw, &mut key)?;
            } else {
                self.row_key_for_unmapped_columns(rsw, result_map, &mut key, prefix)?;
            }
        } else {
            self.row_key_for_mapped_columns(rsw, result_map, &mut key, &bindings, prefix)?;
        }

        if key.update_count() < 2 {
            return Ok(CacheKey::null());
        }

        Ok(key)
    }

    fn row_key_for_mapped_columns(
        &self,
        rsw: &RowSource<'a>,
        result_map: &'a ResultMap,
        key: &mut CacheKey,
        bindings: &[&'a Binding],
        prefix: Option<&str>,
    ) -> Result<()> {
        let split = rsw.column_split(result_map, prefix);
        let empty_row_instance = self.engine.config.return_instance_for_empty_row;

        for binding in bindings {
            match &binding.nested_result_map {
                Some(id) if binding.result_set.is_none() => {
                    // A nested object is identified by its constructor arguments
                    let nested = self.schema().result_map(id)?;
                    let constructor: Vec<_> = nested.constructor_bindings().collect();
                    let prefix = column_prefix(prefix, binding);
                    self.row_key_for_mapped_columns(rsw, nested, key, &constructor, prefix.as_deref())?;
                }
                _ if binding.nested_query.is_none() => {
                    let Some(column) = &binding.column else {
                        continue;
                    };

                    let column = prepend_prefix(column, prefix);
                    if !split.mapped.contains(&column.to_uppercase()) {
                        continue;
                    }

                    let value = rsw.get_for(binding, &column)?;
                    if !value.is_null() || empty_row_instance {
                        key.update(&column);
                        key.update(value);
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn row_key_for_unmapped_columns(
        &self,
        rsw: &RowSource<'a>,
        result_map: &ResultMap,
        key: &mut CacheKey,
        prefix: Option<&str>,
    ) -> Result<()> {
        let Some(model) = self.schema().model_for(&result_map.ty) else {
            return Ok(());
        };

        let camel = self.engine.config.map_underscore_to_camel_case;
        let split = rsw.column_split(result_map, prefix);

        for column in &split.unmapped {
            let property = match prefix.filter(|prefix| !prefix.is_empty()) {
                Some(prefix) => match column.get(prefix.len()..) {
                    Some(rest) if column.to_uppercase().starts_with(&prefix.to_uppercase()) => rest,
                    _ => continue,
                },
                None => column.as_str(),
            };

            if model.find_field(property, camel).is_none() {
                continue;
            }

            if let Some(value) = rsw.get_string(column)? {
                key.update(column);
                key.update(value);
            }
        }

        Ok(())
    }

    fn row_key_for_map(&self, rsw: &RowSource<'a>, key: &mut CacheKey) -> Result<()> {
        for column in rsw.columns() {
            if let Some(value) = rsw.get_string(&column.name)? {
                key.update(&column.name);
                key.update(value);
            }
        }

        Ok(())
    }

    fn is_map_type(&self, result_map: &ResultMap) -> bool {
        result_map.ty.is_map()
            || self
                .schema()
                .model_for(&result_map.ty)
                .is_some_and(|model| model.is_map())
    }
}
