use super::{bind::Fetched, row_source::prepend_prefix, Exec, RowSource};
use rowmap_core::{
    driver::QueryExecutor,
    factory::ObjectFactory,
    schema::{mapping::Binding, Statement},
    stmt::{CacheKey, LazyLoad, Object, Type, Value},
    Error, Result,
};

use std::{fmt, rc::Rc};

/// Runs a nested statement and shapes its rows into a property value.
pub(super) struct ResultLoader {
    executor: Rc<dyn QueryExecutor>,
    factory: Rc<dyn ObjectFactory>,
    statement: Statement,
    parameter: Value,
    key: CacheKey,

    /// Type of the property receiving the value
    target_ty: Type,
}

impl ResultLoader {
    pub(super) fn load_result(&self) -> Result<Value> {
        log::debug!(
            "loading nested statement `{}` for parameter {:?}",
            self.statement.id,
            self.parameter
        );

        let mut rows = self
            .executor
            .query(&self.statement, &self.parameter, &self.key)?;

        if self.factory.is_collection(&self.target_ty) {
            return Ok(Value::List(rows));
        }

        match rows.len() {
            0 => Ok(Value::Null),
            1 => Ok(rows.swap_remove(0)),
            n => Err(Error::too_many_results(&self.statement.id, n)),
        }
    }
}

impl LazyLoad for ResultLoader {
    fn load(&self) -> Result<Value> {
        self.load_result()
    }
}

impl fmt::Debug for ResultLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultLoader")
            .field("statement", &self.statement.id)
            .field("parameter", &self.parameter)
            .field("target_ty", &self.target_ty)
            .finish()
    }
}

impl<'a> Exec<'a> {
    /// Value of a constructor argument loaded by a nested statement. Always
    /// loaded right away.
    pub(super) fn nested_query_constructor_value(
        &self,
        rsw: &RowSource<'a>,
        binding: &Binding,
        prefix: Option<&str>,
    ) -> Result<Value> {
        let Some((statement, parameter)) = self.nested_query_parameter(rsw, binding, prefix)? else {
            return Ok(Value::Null);
        };

        let key = self.engine.executor.create_cache_key(statement, &parameter);
        self.result_loader(statement, parameter, key, &binding.ty)
            .load_result()
    }

    /// Value of a property loaded by a nested statement.
    ///
    /// A load of the same statement and parameter already cached or in
    /// flight is shared. Otherwise the statement runs now, or on first access
    /// of the property when the binding is lazy.
    pub(super) fn nested_query_mapping_value(
        &self,
        rsw: &RowSource<'a>,
        target: &Object,
        binding: &Binding,
        prefix: Option<&str>,
    ) -> Result<Fetched> {
        let Some((statement, parameter)) = self.nested_query_parameter(rsw, binding, prefix)? else {
            return Ok(Fetched::Value(Value::Null));
        };

        let executor = &self.engine.executor;
        let property = binding.property_name();
        let key = executor.create_cache_key(statement, &parameter);

        if executor.is_cached(statement, &key) {
            log::trace!("deferring `{property}` to the load cached under {key}");
            executor.defer_load(statement, target, property, &key, &binding.ty)?;
            return Ok(Fetched::Deferred);
        }

        let loader = self.result_loader(statement, parameter, key, &binding.ty);

        if binding.is_lazy(self.engine.config.lazy_loading_enabled) {
            target.add_loader(property, Box::new(loader))?;
            Ok(Fetched::Deferred)
        } else {
            loader.load_result().map(Fetched::Value)
        }
    }

    /// The nested statement of `binding` and the parameter to run it with.
    /// `None` when the row holds no parameter value.
    fn nested_query_parameter(
        &self,
        rsw: &RowSource<'a>,
        binding: &Binding,
        prefix: Option<&str>,
    ) -> Result<Option<(&'a Statement, Value)>> {
        let Some(id) = &binding.nested_query else {
            return Err(Error::invalid_mapping(format!(
                "binding `{}` has no nested statement",
                binding.property_name()
            )));
        };

        let statement = self.schema().statement(id)?;
        let parameter_ty = statement.parameter_type.as_ref();

        let parameter = if binding.is_composite() {
            self.prepare_composite_key_parameter(rsw, binding, parameter_ty, prefix)?
        } else {
            self.prepare_simple_key_parameter(rsw, binding, parameter_ty, prefix)?
        };

        Ok((!parameter.is_null()).then_some((statement, parameter)))
    }

    fn prepare_simple_key_parameter(
        &self,
        rsw: &RowSource<'a>,
        binding: &Binding,
        parameter_ty: Option<&Type>,
        prefix: Option<&str>,
    ) -> Result<Value> {
        let column = prepend_prefix(binding.column.as_deref().unwrap_or_default(), prefix);

        match parameter_ty {
            Some(ty) if rsw.has_converter(ty, None) => rsw.get(ty, &column),
            _ => rsw.get_raw(&column),
        }
    }

    /// Builds the parameter object from the composite columns. Null when
    /// none of them holds a value, so the nested statement is skipped.
    fn prepare_composite_key_parameter(
        &self,
        rsw: &RowSource<'a>,
        binding: &Binding,
        parameter_ty: Option<&Type>,
        prefix: Option<&str>,
    ) -> Result<Value> {
        let parameter = match parameter_ty {
            Some(ty) => self.engine.factory.create(ty)?,
            None => Object::map().into(),
        };

        let Value::Object(object) = &parameter else {
            return Err(Error::invalid_mapping(format!(
                "composite parameter of `{}` must be an object, not {}",
                binding.property_name(),
                parameter.type_name()
            )));
        };

        let mut found = false;
        for composite in &binding.composites {
            let ty = self
                .property_ty(object, &composite.property)
                .unwrap_or_default();
            let value = rsw.get(&ty, &prepend_prefix(&composite.column, prefix))?;

            if !value.is_null() {
                self.set_property(object, &composite.property, value)?;
                found = true;
            }
        }

        Ok(if found { parameter } else { Value::Null })
    }

    fn result_loader(
        &self,
        statement: &Statement,
        parameter: Value,
        key: CacheKey,
        target_ty: &Type,
    ) -> ResultLoader {
        ResultLoader {
            executor: self.engine.executor.clone(),
            factory: self.engine.factory.clone(),
            statement: statement.clone(),
            parameter,
            key,
            target_ty: target_ty.clone(),
        }
    }
}
