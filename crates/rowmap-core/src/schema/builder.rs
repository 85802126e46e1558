use super::{app::Model, mapping::ResultMap, Schema, Statement};
use crate::{property::PropertyPath, stmt::Type, Result};

use indexmap::IndexMap;

/// Collects models, result maps and statements, then resolves and verifies
/// them into a [`Schema`].
#[derive(Debug, Default)]
pub struct Builder {
    models: Vec<Model>,
    result_maps: Vec<ResultMap>,
    statements: Vec<Statement>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    pub fn result_map(mut self, result_map: ResultMap) -> Self {
        self.result_maps.push(result_map);
        self
    }

    pub fn statement(mut self, statement: Statement) -> Self {
        self.statements.push(statement);
        self
    }

    pub fn build(self) -> Result<Schema> {
        let mut schema = Schema {
            models: self
                .models
                .into_iter()
                .map(|model| (model.name.clone(), model))
                .collect(),
            result_maps: IndexMap::new(),
            statements: self
                .statements
                .into_iter()
                .map(|statement| (statement.id.clone(), statement))
                .collect(),
        };

        for mut result_map in self.result_maps {
            resolve_binding_types(&schema, &mut result_map);
            result_map.index();
            schema
                .result_maps
                .insert(result_map.id.clone(), result_map);
        }

        force_nested_through_discriminators(&mut schema);

        schema.verify()?;
        Ok(schema)
    }
}

/// Fills in binding types left `Unknown` from the target model.
fn resolve_binding_types(schema: &Schema, result_map: &mut ResultMap) {
    let Some(model) = schema.model_for(&result_map.ty) else {
        return;
    };

    let arity = result_map.constructor_bindings().count();
    let positional = model
        .constructors
        .iter()
        .find(|constructor| constructor.params.len() == arity);

    let mut position = 0;
    for binding in &mut result_map.bindings {
        if binding.flags.constructor {
            if binding.ty.is_unknown() {
                let resolved = match &binding.property {
                    Some(name) => model.property_ty(name),
                    None => positional
                        .and_then(|constructor| constructor.params.get(position))
                        .map(|param| &param.ty),
                };
                if let Some(ty) = resolved {
                    binding.ty = ty.clone();
                }
            }
            position += 1;
            continue;
        }

        if !binding.ty.is_unknown() {
            continue;
        }

        if let Some(property) = &binding.property {
            if let Some(ty) = resolve_path_ty(schema, model, property) {
                binding.ty = ty;
            }
        }
    }
}

fn resolve_path_ty(schema: &Schema, model: &Model, path: &str) -> Option<Type> {
    let path = PropertyPath::parse(path);
    let mut current = model;

    for segment in path.parents() {
        current = schema.model_for(current.property_ty(segment)?)?;
    }

    current.property_ty(path.leaf()).cloned()
}

/// A result map whose discriminator can select a result map with nested
/// result maps is processed as nested too.
fn force_nested_through_discriminators(schema: &mut Schema) {
    loop {
        let forced: Vec<String> = schema
            .result_maps
            .values()
            .filter(|result_map| !result_map.has_nested_result_maps)
            .filter(|result_map| {
                result_map.discriminator.iter().any(|discriminator| {
                    discriminator.cases.values().any(|id| {
                        schema
                            .find_result_map(id)
                            .is_some_and(|case| case.has_nested_result_maps)
                    })
                })
            })
            .map(|result_map| result_map.id.clone())
            .collect();

        if forced.is_empty() {
            return;
        }

        for id in forced {
            log::debug!("result map `{id}` selects nested result maps through its discriminator");
            if let Some(result_map) = schema.result_maps.get_mut(&id) {
                result_map.has_nested_result_maps = true;
            }
        }
    }
}
