use super::{mapping::Binding, Schema};
use crate::{stmt::Type, Error, Result};

struct Verify<'a> {
    schema: &'a Schema,
}

impl Schema {
    pub(super) fn verify(&self) -> Result<()> {
        Verify { schema: self }.verify()
    }
}

impl Verify<'_> {
    fn verify(&self) -> Result<()> {
        for result_map in self.schema.result_maps.values() {
            self.verify_ty(&result_map.ty)
                .map_err(|err| err.context(crate::err!("result map `{}`", result_map.id)))?;

            for binding in &result_map.bindings {
                self.verify_binding(binding).map_err(|err| {
                    err.context(crate::err!(
                        "result map `{}`, property `{}`",
                        result_map.id,
                        binding.property_name()
                    ))
                })?;
            }
        }

        for statement in self.schema.statements.values() {
            for id in &statement.result_maps {
                self.schema
                    .result_map(id)
                    .map_err(|err| err.context(crate::err!("statement `{}`", statement.id)))?;
            }
        }

        Ok(())
    }

    fn verify_ty(&self, ty: &Type) -> Result<()> {
        match ty {
            Type::Model(name) if self.schema.model(name).is_none() => Err(Error::invalid_mapping(
                format!("no model named `{name}`"),
            )),
            Type::List(item) => self.verify_ty(item),
            _ => Ok(()),
        }
    }

    fn verify_binding(&self, binding: &Binding) -> Result<()> {
        if let Some(id) = &binding.nested_result_map {
            self.schema.result_map(id)?;
        }

        if let Some(id) = &binding.nested_query {
            self.schema.statement(id)?;
        }

        if let Some(link) = &binding.result_set {
            if link.columns.len() != link.foreign_columns.len() {
                return Err(Error::invalid_mapping(format!(
                    "result set `{}` links {} columns to {} foreign columns",
                    link.name,
                    link.columns.len(),
                    link.foreign_columns.len()
                )));
            }

            if binding.nested_result_map.is_none() {
                return Err(Error::invalid_mapping(format!(
                    "result set `{}` is linked without a nested result map",
                    link.name
                )));
            }
        }

        if binding.nested_result_map.is_some() && binding.nested_query.is_some() {
            return Err(Error::invalid_mapping(
                "a binding cannot use both a nested result map and a nested statement",
            ));
        }

        self.verify_ty(&binding.ty)
    }
}
