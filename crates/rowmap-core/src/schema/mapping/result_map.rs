use super::{Binding, Discriminator};
use crate::stmt::Type;

use indexmap::IndexSet;

/// Describes how one row shape maps to a target type.
#[derive(Debug, Clone)]
pub struct ResultMap {
    pub id: String,

    /// Target type: a model, a map, or a scalar for single-column rows
    pub ty: Type,

    /// Bindings in declaration order
    pub bindings: Vec<Binding>,

    pub discriminator: Option<Discriminator>,

    pub auto_mapping: AutoMapping,

    /// Upper-cased labels of the columns the bindings read. Computed by the
    /// schema builder.
    pub mapped_columns: IndexSet<String>,

    /// Properties the bindings assign. Computed by the schema builder.
    pub mapped_properties: IndexSet<String>,

    /// True if a binding, or the result map of a discriminator case, applies
    /// a nested result map to the same row. Computed by the schema builder.
    pub has_nested_result_maps: bool,

    /// True if a binding runs a nested statement. Computed by the schema
    /// builder.
    pub has_nested_queries: bool,
}

/// Per result map override of the automatic mapping setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AutoMapping {
    /// Follow `auto_mapping_behavior`
    #[default]
    Inherit,

    /// Never map columns automatically
    None,

    /// Map columns automatically for top-level rows only
    Partial,

    /// Always map columns automatically
    Full,
}

impl ResultMap {
    pub fn new(id: impl Into<String>, ty: Type) -> ResultMap {
        ResultMap {
            id: id.into(),
            ty,
            bindings: vec![],
            discriminator: None,
            auto_mapping: AutoMapping::Inherit,
            mapped_columns: IndexSet::new(),
            mapped_properties: IndexSet::new(),
            has_nested_result_maps: false,
            has_nested_queries: false,
        }
    }

    pub fn binding(mut self, binding: Binding) -> ResultMap {
        self.bindings.push(binding);
        self
    }

    pub fn discriminator(mut self, discriminator: Discriminator) -> ResultMap {
        self.discriminator = Some(discriminator);
        self
    }

    pub fn auto_mapping(mut self, auto_mapping: AutoMapping) -> ResultMap {
        self.auto_mapping = auto_mapping;
        self
    }

    /// Bindings that identify a row: those flagged `id`, or every binding
    /// when none is.
    pub fn id_bindings(&self) -> impl Iterator<Item = &Binding> + '_ {
        let any_id = self.bindings.iter().any(Binding::is_id);
        self.bindings
            .iter()
            .filter(move |binding| !any_id || binding.is_id())
    }

    pub fn constructor_bindings(&self) -> impl Iterator<Item = &Binding> + '_ {
        self.bindings.iter().filter(|binding| binding.is_constructor())
    }

    /// Bindings assigned after the object is constructed.
    pub fn property_bindings(&self) -> impl Iterator<Item = &Binding> + '_ {
        self.bindings.iter().filter(|binding| !binding.is_constructor())
    }

    pub fn has_constructor_bindings(&self) -> bool {
        self.bindings.iter().any(Binding::is_constructor)
    }

    /// Recomputes the derived column and property sets.
    pub(crate) fn index(&mut self) {
        self.mapped_columns.clear();
        self.mapped_properties.clear();
        self.has_nested_result_maps = false;
        self.has_nested_queries = false;

        for binding in &self.bindings {
            if let Some(column) = &binding.column {
                self.mapped_columns.insert(column.to_uppercase());
            } else {
                for composite in &binding.composites {
                    self.mapped_columns.insert(composite.column.to_uppercase());
                }
            }

            if let Some(property) = &binding.property {
                self.mapped_properties.insert(property.clone());
            }

            self.has_nested_result_maps |= binding.has_nested_result_map();
            self.has_nested_queries |= binding.nested_query.is_some();
        }
    }
}
