use super::Binding;

use indexmap::IndexMap;

/// Picks a result map from the value of a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Discriminator {
    /// The column read, and the type it is read as
    pub binding: Binding,

    /// Column value rendered as text, to result map id
    pub cases: IndexMap<String, String>,
}

impl Discriminator {
    pub fn new(binding: Binding) -> Discriminator {
        Discriminator {
            binding,
            cases: IndexMap::new(),
        }
    }

    pub fn case(mut self, value: impl Into<String>, result_map: impl Into<String>) -> Discriminator {
        self.cases.insert(value.into(), result_map.into());
        self
    }

    /// Result map selected by `value`. A null column value selects the
    /// `"null"` case.
    pub fn map_id_for(&self, value: &str) -> Option<&str> {
        self.cases.get(value).map(String::as_str)
    }
}
