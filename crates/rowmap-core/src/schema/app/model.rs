use super::{Constructor, Field};
use crate::{property, stmt::Type};

#[derive(Debug, Clone)]
pub struct Model {
    /// Name of the model, referenced by [`Type::Model`]
    pub name: String,

    pub kind: ModelKind,

    /// Declared properties
    pub fields: Vec<Field>,

    /// Constructors taking arguments
    pub constructors: Vec<Constructor>,

    /// True if the model can be created empty and populated afterwards
    pub default_constructor: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Fixed set of properties
    Struct,

    /// Open property bag; any name is a valid property
    Map,
}

impl Model {
    /// Creates a struct model with a default constructor and no fields.
    pub fn new(name: impl Into<String>) -> Model {
        Model {
            name: name.into(),
            kind: ModelKind::Struct,
            fields: vec![],
            constructors: vec![],
            default_constructor: true,
        }
    }

    /// Creates a model that accepts any property.
    pub fn map(name: impl Into<String>) -> Model {
        Model {
            kind: ModelKind::Map,
            ..Model::new(name)
        }
    }

    pub fn field(mut self, field: Field) -> Model {
        self.fields.push(field);
        self
    }

    /// Adds a constructor. Declaring any constructor removes the default
    /// constructor; call [`Model::with_default_constructor`] to keep it.
    pub fn constructor(mut self, constructor: Constructor) -> Model {
        if self.constructors.is_empty() {
            self.default_constructor = false;
        }
        self.constructors.push(constructor);
        self
    }

    pub fn with_default_constructor(mut self) -> Model {
        self.default_constructor = true;
        self
    }

    pub fn is_map(&self) -> bool {
        matches!(self.kind, ModelKind::Map)
    }

    /// Looks up a field by its exact name.
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Finds the field a column label refers to: names compare
    /// case-insensitively, and underscores are ignored when
    /// `underscore_to_camel_case` is set.
    pub fn find_field(&self, name: &str, underscore_to_camel_case: bool) -> Option<&Field> {
        let needle = property::normalize(name, underscore_to_camel_case);
        self.fields
            .iter()
            .find(|field| property::normalize(&field.name, false) == needle)
    }

    /// Type of the named property, searching fields then constructor
    /// parameters.
    pub fn property_ty(&self, name: &str) -> Option<&Type> {
        if let Some(field) = self.get_field(name) {
            return Some(&field.ty);
        }

        self.constructors
            .iter()
            .flat_map(|constructor| &constructor.params)
            .find(|param| param.name == name)
            .map(|param| &param.ty)
    }

    /// Non-nullable properties are never assigned null. Unknown properties of
    /// open models are nullable.
    pub fn is_nullable(&self, name: &str) -> bool {
        self.get_field(name).map(|field| field.nullable).unwrap_or(true)
    }

    /// The constructor preferred for inference, if one is marked.
    pub fn auto_map_constructor(&self) -> Option<&Constructor> {
        self.constructors.iter().find(|constructor| constructor.auto_map)
    }
}
