pub mod app;

mod builder;
pub use builder::Builder;

pub mod mapping;
use mapping::ResultMap;

mod statement;
pub use statement::Statement;

mod verify;

use crate::{Error, Result};
use indexmap::IndexMap;

/// The mapping registry: target models, result maps and statements.
///
/// Built once through [`Schema::builder`] and read-only afterwards.
#[derive(Debug, Default)]
pub struct Schema {
    /// Target types, by name
    pub models: IndexMap<String, app::Model>,

    /// Result maps, by id
    pub result_maps: IndexMap<String, ResultMap>,

    /// Statements, by id
    pub statements: IndexMap<String, Statement>,
}

impl Schema {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn model(&self, name: &str) -> Option<&app::Model> {
        self.models.get(name)
    }

    /// Returns the result map with the given id, failing if there is none.
    pub fn result_map(&self, id: &str) -> Result<&ResultMap> {
        self.result_maps
            .get(id)
            .ok_or_else(|| Error::invalid_mapping(format!("no result map named `{id}`")))
    }

    pub fn find_result_map(&self, id: &str) -> Option<&ResultMap> {
        self.result_maps.get(id)
    }

    /// Returns the statement with the given id, failing if there is none.
    pub fn statement(&self, id: &str) -> Result<&Statement> {
        self.statements
            .get(id)
            .ok_or_else(|| Error::invalid_mapping(format!("no statement named `{id}`")))
    }

    /// Model describing `ty`, if `ty` names one.
    pub fn model_for(&self, ty: &crate::stmt::Type) -> Option<&app::Model> {
        ty.as_model().and_then(|name| self.model(name))
    }
}
