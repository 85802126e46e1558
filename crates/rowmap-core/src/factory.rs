//! Instantiating target types.

use crate::{
    schema::{app::Model, Schema},
    stmt::{Object, Type, Value},
    Error, Result,
};

use std::sync::Arc;

pub trait ObjectFactory {
    /// Creates an empty instance of `ty`.
    fn create(&self, ty: &Type) -> Result<Value>;

    /// Creates an instance of `ty` with the constructor taking `arg_types`.
    fn create_with_args(&self, ty: &Type, arg_types: &[Type], args: Vec<Value>) -> Result<Value>;

    /// Returns `true` if values of `ty` hold several elements.
    fn is_collection(&self, ty: &Type) -> bool {
        ty.is_list()
    }
}

/// Creates instances from the models of a [`Schema`].
#[derive(Debug, Clone)]
pub struct DefaultObjectFactory {
    schema: Arc<Schema>,
}

impl DefaultObjectFactory {
    pub fn new(schema: Arc<Schema>) -> DefaultObjectFactory {
        DefaultObjectFactory { schema }
    }

    fn model(&self, ty: &Type) -> Result<&Model> {
        self.schema
            .model_for(ty)
            .ok_or_else(|| Error::no_viable_constructor(ty, "type is not a known model"))
    }

    /// An instance with every declared field at its initial value.
    fn blank(model: &Model) -> Object {
        Object::with_fields(
            model.name.clone(),
            model
                .fields
                .iter()
                .map(|field| (field.name.clone(), field.initial_value())),
        )
    }
}

impl ObjectFactory for DefaultObjectFactory {
    fn create(&self, ty: &Type) -> Result<Value> {
        match ty {
            Type::List(_) => Ok(Value::List(vec![])),
            Type::Map | Type::Unknown => Ok(Object::map().into()),
            Type::Model(_) => {
                let model = self.model(ty)?;

                if !model.default_constructor && !model.is_map() {
                    return Err(Error::no_viable_constructor(
                        ty,
                        "no default constructor",
                    ));
                }

                Ok(Self::blank(model).into())
            }
            _ => Err(Error::no_viable_constructor(ty, "scalar types have no constructor")),
        }
    }

    fn create_with_args(&self, ty: &Type, arg_types: &[Type], args: Vec<Value>) -> Result<Value> {
        let model = self.model(ty)?;

        let Some(constructor) = model
            .constructors
            .iter()
            .find(|constructor| constructor.accepts(arg_types))
        else {
            let types: Vec<_> = arg_types.iter().map(ToString::to_string).collect();
            return Err(Error::no_viable_constructor(
                ty,
                format!("no constructor takes [{}]", types.join(", ")),
            ));
        };

        let object = Self::blank(model);

        for (param, arg) in constructor.params.iter().zip(args) {
            object.set(param.name.clone(), param.ty.cast(arg)?);
        }

        Ok(object.into())
    }
}
