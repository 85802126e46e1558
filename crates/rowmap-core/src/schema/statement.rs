use crate::stmt::Type;

/// What the engine knows about a statement: which result maps its result
/// sets use, and what parameter it takes when run as a nested statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub id: String,

    /// Result map for each physical result set, in order
    pub result_maps: Vec<String>,

    /// Names of the physical result sets, for bindings linked to a later
    /// result set
    pub result_sets: Vec<String>,

    /// Rows for the same root object arrive contiguously
    pub result_ordered: bool,

    /// Type of the parameter the statement takes
    pub parameter_type: Option<Type>,
}

impl Statement {
    pub fn new(id: impl Into<String>) -> Statement {
        Statement {
            id: id.into(),
            result_maps: vec![],
            result_sets: vec![],
            result_ordered: false,
            parameter_type: None,
        }
    }

    pub fn result_map(mut self, id: impl Into<String>) -> Statement {
        self.result_maps.push(id.into());
        self
    }

    pub fn result_sets<I>(mut self, names: I) -> Statement
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.result_sets = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn ordered(mut self) -> Statement {
        self.result_ordered = true;
        self
    }

    pub fn parameter_type(mut self, ty: Type) -> Statement {
        self.parameter_type = Some(ty);
        self
    }
}
