use crate::stmt::Type;

use indexmap::IndexSet;

/// Binds a source of data in the row to a property or constructor argument.
///
/// The source is one of: a column read through a converter, a nested result
/// map applied to the same row, or a nested statement run with values from
/// the row. A binding with a [`ResultSetLink`] receives its value from a later
/// physical result set instead.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Binding {
    /// Target property. May be a dotted path. Constructor bindings without a
    /// property are matched to parameters by position.
    pub property: Option<String>,

    pub column: Option<String>,

    /// Columns feeding a composite nested-statement parameter
    pub composites: Vec<Composite>,

    /// Type of the bound value. `Unknown` is resolved from the target model
    /// when the schema is built.
    pub ty: Type,

    /// Name of a registered converter to read the column with
    pub converter: Option<String>,

    /// Result map applied to the same row to build the value
    pub nested_result_map: Option<String>,

    /// Statement run to load the value
    pub nested_query: Option<String>,

    pub fetch: FetchType,

    /// Prefix of the columns that belong to the nested result map
    pub column_prefix: Option<String>,

    /// Columns of which at least one must be non-null for the nested result
    /// map to produce a value
    pub not_null_columns: IndexSet<String>,

    pub result_set: Option<ResultSetLink>,

    pub flags: BindingFlags,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingFlags {
    /// The binding contributes to row identity
    pub id: bool,

    /// The binding supplies a constructor argument
    pub constructor: bool,
}

/// One column of a composite nested-statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composite {
    /// Property of the parameter object that receives the column value
    pub property: String,

    pub column: String,
}

/// When a nested statement runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchType {
    /// Follow the `lazy_loading_enabled` setting
    #[default]
    Inherit,

    /// Run on first access of the property
    Lazy,

    /// Run while the row is materialized
    Eager,
}

/// Links a binding to rows of a later physical result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSetLink {
    /// Name of the result set, as listed by the statement
    pub name: String,

    /// Columns of the current row forming the key
    pub columns: Vec<String>,

    /// Corresponding columns of the later result set
    pub foreign_columns: Vec<String>,
}

impl Binding {
    /// Reads `column` into `property`.
    pub fn column(property: impl Into<String>, column: impl Into<String>) -> Binding {
        Binding {
            property: Some(property.into()),
            column: Some(column.into()),
            ..Binding::default()
        }
    }

    /// A constructor argument read from `column`. Matched to the constructor
    /// parameter by position.
    pub fn arg(column: impl Into<String>, ty: Type) -> Binding {
        Binding {
            column: Some(column.into()),
            ty,
            flags: BindingFlags {
                constructor: true,
                ..BindingFlags::default()
            },
            ..Binding::default()
        }
    }

    /// Builds `property` by applying result map `result_map` to the row.
    pub fn nested(property: impl Into<String>, result_map: impl Into<String>) -> Binding {
        Binding {
            property: Some(property.into()),
            nested_result_map: Some(result_map.into()),
            ..Binding::default()
        }
    }

    /// Loads `property` by running `statement` with the value of `column`.
    pub fn query(
        property: impl Into<String>,
        column: impl Into<String>,
        statement: impl Into<String>,
    ) -> Binding {
        Binding {
            property: Some(property.into()),
            column: Some(column.into()),
            nested_query: Some(statement.into()),
            ..Binding::default()
        }
    }

    pub fn ty(mut self, ty: Type) -> Binding {
        self.ty = ty;
        self
    }

    pub fn id(mut self) -> Binding {
        self.flags.id = true;
        self
    }

    pub fn constructor(mut self) -> Binding {
        self.flags.constructor = true;
        self
    }

    pub fn converter(mut self, name: impl Into<String>) -> Binding {
        self.converter = Some(name.into());
        self
    }

    pub fn lazy(mut self) -> Binding {
        self.fetch = FetchType::Lazy;
        self
    }

    pub fn eager(mut self) -> Binding {
        self.fetch = FetchType::Eager;
        self
    }

    pub fn column_prefix(mut self, prefix: impl Into<String>) -> Binding {
        self.column_prefix = Some(prefix.into());
        self
    }

    pub fn not_null<I, S>(mut self, columns: I) -> Binding
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.not_null_columns
            .extend(columns.into_iter().map(Into::into));
        self
    }

    /// Adds a column to a composite parameter. The binding's single column
    /// is dropped.
    pub fn composite(mut self, property: impl Into<String>, column: impl Into<String>) -> Binding {
        self.column = None;
        self.composites.push(Composite {
            property: property.into(),
            column: column.into(),
        });
        self
    }

    /// Receives the value from rows of the named later result set whose
    /// `foreign_columns` match this row's `columns`.
    pub fn result_set<I, J>(mut self, name: impl Into<String>, columns: I, foreign_columns: J) -> Binding
    where
        I: IntoIterator,
        I::Item: Into<String>,
        J: IntoIterator,
        J::Item: Into<String>,
    {
        self.result_set = Some(ResultSetLink {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            foreign_columns: foreign_columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn is_composite(&self) -> bool {
        !self.composites.is_empty()
    }

    pub fn is_id(&self) -> bool {
        self.flags.id
    }

    pub fn is_constructor(&self) -> bool {
        self.flags.constructor
    }

    /// Returns `true` if a nested result map applied to the current row
    /// supplies the value.
    pub fn has_nested_result_map(&self) -> bool {
        self.nested_result_map.is_some() && self.result_set.is_none()
    }

    /// Resolves the fetch type against the engine-wide default.
    pub fn is_lazy(&self, lazy_loading_enabled: bool) -> bool {
        match self.fetch {
            FetchType::Inherit => lazy_loading_enabled,
            FetchType::Lazy => true,
            FetchType::Eager => false,
        }
    }

    /// Property name, or an empty string for unnamed bindings.
    pub fn property_name(&self) -> &str {
        self.property.as_deref().unwrap_or("")
    }
}
