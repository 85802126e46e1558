use super::{nested::column_prefix, row_source::prepend_prefix, Exec, RowSource};
use rowmap_core::{
    err,
    schema::mapping::{AutoMapping, Binding, ResultMap},
    stmt::{Type, Value},
    AutoMappingBehavior, Error, Result,
};

impl<'a> Exec<'a> {
    /// Builds the object for the current row of a result map without nested
    /// result maps.
    ///
    /// Returns `None` when the row carried no value for the result map,
    /// unless empty rows produce instances.
    pub(super) fn get_row_value(
        &mut self,
        rsw: &RowSource<'a>,
        result_map: &'a ResultMap,
        prefix: Option<&str>,
    ) -> Result<Option<Value>> {
        let (row_value, used_constructor) = self.create_result_object(rsw, result_map, prefix)?;

        let object = row_value.as_ref().and_then(Value::as_object).cloned();
        let Some(object) = object else {
            return Ok(row_value);
        };

        if self.has_converter_for_result(rsw, &result_map.ty) {
            return Ok(row_value);
        }

        let mut found = used_constructor;
        if self.should_apply_automatic_mappings(result_map, false) {
            found = self.apply_automatic_mappings(rsw, result_map, &object, prefix)? || found;
        }
        found = self.apply_property_mappings(rsw, result_map, &object, prefix)? || found;
        found = object.pending_loads() > 0 || found;

        Ok(if found || self.engine.config.return_instance_for_empty_row {
            row_value
        } else {
            None
        })
    }

    /// Instantiates the target of `result_map` for the current row.
    ///
    /// The flag is `true` when the instance was built from constructor
    /// arguments. An instance with a lazily loaded nested statement is made
    /// lazy and keeps its constructor arguments.
    pub(super) fn create_result_object(
        &mut self,
        rsw: &RowSource<'a>,
        result_map: &'a ResultMap,
        prefix: Option<&str>,
    ) -> Result<(Option<Value>, bool)> {
        let mut args = vec![];
        let row_value = self.instantiate(rsw, result_map, &mut args, prefix)?;

        if let Some(Value::Object(object)) = &row_value {
            let config = &self.engine.config;
            let lazy = result_map.property_bindings().any(|binding| {
                binding.nested_query.is_some() && binding.is_lazy(config.lazy_loading_enabled)
            });

            if lazy && !self.has_converter_for_result(rsw, &result_map.ty) {
                object.make_lazy(args.clone(), config.aggressive_lazy_loading);
            }
        }

        let used_constructor = row_value.is_some() && !args.is_empty();
        Ok((row_value, used_constructor))
    }

    fn instantiate(
        &mut self,
        rsw: &RowSource<'a>,
        result_map: &'a ResultMap,
        args: &mut Vec<(Type, Value)>,
        prefix: Option<&str>,
    ) -> Result<Option<Value>> {
        let ty = &result_map.ty;

        if self.has_converter_for_result(rsw, ty) {
            self.create_primitive_result_object(rsw, result_map, prefix)
                .map(Some)
        } else if result_map.has_constructor_bindings() {
            self.create_parameterized_result_object(rsw, result_map, args, prefix)
        } else if self.is_default_constructible(ty) {
            self.engine.factory.create(ty).map(Some)
        } else if self.should_apply_automatic_mappings(result_map, false) {
            self.create_by_constructor_signature(rsw, result_map, args)
        } else {
            Err(Error::no_viable_constructor(
                ty,
                "no default constructor and automatic mapping is disabled",
            ))
        }
    }

    /// Reads the whole row as a single converted value.
    fn create_primitive_result_object(
        &self,
        rsw: &RowSource<'a>,
        result_map: &ResultMap,
        prefix: Option<&str>,
    ) -> Result<Value> {
        let column = match result_map.bindings.first().and_then(|b| b.column.as_deref()) {
            Some(column) => prepend_prefix(column, prefix),
            None => match rsw.columns().first() {
                Some(column) => column.name.clone(),
                None => {
                    return Err(Error::invalid_mapping(format!(
                        "result map `{}` reads a single value from a result set without columns",
                        result_map.id
                    )))
                }
            },
        };

        rsw.get(&result_map.ty, &column)
    }

    fn create_parameterized_result_object(
        &mut self,
        rsw: &RowSource<'a>,
        result_map: &'a ResultMap,
        args: &mut Vec<(Type, Value)>,
        prefix: Option<&str>,
    ) -> Result<Option<Value>> {
        let mut found = false;

        for binding in result_map.constructor_bindings() {
            let value = self
                .constructor_value(rsw, binding, prefix)
                .map_err(|err| {
                    err.context(err!(
                        "could not process constructor argument `{}` of result map `{}`",
                        binding
                            .property
                            .as_deref()
                            .or(binding.column.as_deref())
                            .unwrap_or("?"),
                        result_map.id
                    ))
                })?;

            found |= !value.is_null();
            args.push((binding.ty.clone(), value));
        }

        if !found {
            return Ok(None);
        }

        let (types, values): (Vec<Type>, Vec<Value>) = args.iter().cloned().unzip();
        self.engine
            .factory
            .create_with_args(&result_map.ty, &types, values)
            .map(Some)
    }

    fn constructor_value(
        &mut self,
        rsw: &RowSource<'a>,
        binding: &'a Binding,
        prefix: Option<&str>,
    ) -> Result<Value> {
        if binding.nested_query.is_some() {
            return self.nested_query_constructor_value(rsw, binding, prefix);
        }

        if let Some(id) = &binding.nested_result_map {
            let nested = self.schema().result_map(id)?;
            let prefix = column_prefix(prefix, binding);
            let value = self.get_row_value(rsw, nested, prefix.as_deref())?;
            return Ok(value.unwrap_or_default());
        }

        let Some(column) = &binding.column else {
            return Err(Error::invalid_mapping("constructor argument has no column"));
        };

        rsw.get_for(binding, &prepend_prefix(column, prefix))
    }

    /// Picks a constructor from the column types: the constructor marked for
    /// automatic mapping, else the first one whose parameter types equal the
    /// column types. Column `i` feeds parameter `i`.
    fn create_by_constructor_signature(
        &self,
        rsw: &RowSource<'a>,
        result_map: &ResultMap,
        args: &mut Vec<(Type, Value)>,
    ) -> Result<Option<Value>> {
        let ty = &result_map.ty;
        let columns = rsw.columns();

        let model = self
            .schema()
            .model_for(ty)
            .ok_or_else(|| Error::no_viable_constructor(ty, "type is not a known model"))?;

        let constructor = model.auto_map_constructor().or_else(|| {
            model.constructors.iter().find(|constructor| {
                constructor.params.len() == columns.len()
                    && constructor
                        .params
                        .iter()
                        .zip(columns)
                        .all(|(param, column)| param.ty == column.ty)
            })
        });

        let Some(constructor) = constructor else {
            let types: Vec<_> = columns.iter().map(|column| column.ty.to_string()).collect();
            return Err(Error::no_viable_constructor(
                ty,
                format!("no constructor matches [{}]", types.join(", ")),
            ));
        };

        let mut found = false;
        for (i, param) in constructor.params.iter().enumerate() {
            let Some(column) = columns.get(i) else {
                return Err(Error::no_viable_constructor(
                    ty,
                    format!(
                        "constructor takes {} arguments but the result set has {} columns",
                        constructor.params.len(),
                        columns.len()
                    ),
                ));
            };

            let value = rsw.get(&param.ty, &column.name)?;
            found |= !value.is_null();
            args.push((param.ty.clone(), value));
        }

        if !found {
            return Ok(None);
        }

        let (types, values): (Vec<Type>, Vec<Value>) = args.iter().cloned().unzip();
        self.engine
            .factory
            .create_with_args(ty, &types, values)
            .map(Some)
    }

    /// Returns `true` if the whole row converts into `ty` directly.
    pub(super) fn has_converter_for_result(&self, rsw: &RowSource<'_>, ty: &Type) -> bool {
        match rsw.columns() {
            [only] => rsw.has_converter(ty, Some(&only.ty)),
            _ => rsw.has_converter(ty, None),
        }
    }

    fn is_default_constructible(&self, ty: &Type) -> bool {
        match ty {
            Type::List(_) | Type::Map | Type::Unknown => true,
            Type::Model(_) => self
                .schema()
                .model_for(ty)
                .is_some_and(|model| model.default_constructor || model.is_map()),
            _ => false,
        }
    }

    pub(super) fn should_apply_automatic_mappings(&self, result_map: &ResultMap, nested: bool) -> bool {
        let behavior = match result_map.auto_mapping {
            AutoMapping::Inherit => self.engine.config.auto_mapping_behavior,
            AutoMapping::None => AutoMappingBehavior::None,
            AutoMapping::Partial => AutoMappingBehavior::Partial,
            AutoMapping::Full => AutoMappingBehavior::Full,
        };

        match behavior {
            AutoMappingBehavior::None => false,
            AutoMappingBehavior::Partial => !nested,
            AutoMappingBehavior::Full => true,
        }
    }
}
