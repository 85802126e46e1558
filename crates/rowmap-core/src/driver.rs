//! Boundary with the code that runs queries.
//!
//! The engine never executes statements on its own. It reads rows through
//! [`ResultSet`], walks physical result sets through [`ResultSets`], and hands
//! nested statements to a [`QueryExecutor`].

pub mod mem;

use crate::{
    schema::Statement,
    stmt::{CacheKey, Object, Type, Value},
    Error, Result,
};

/// A column of a physical result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column label as reported by the row source
    pub name: String,

    /// Declared type of the column
    pub ty: Type,
}

/// How a row source may be positioned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorKind {
    /// Rows can only be read in order
    #[default]
    ForwardOnly,

    /// Rows can be addressed by position
    Scrollable,
}

/// One physical result set.
pub trait ResultSet {
    /// Columns in the order the row source reports them.
    fn columns(&self) -> &[Column];

    /// Advances to the next row. Returns `false` once the rows are exhausted.
    fn next(&mut self) -> Result<bool>;

    /// Reads `column` from the current row. Column labels match
    /// case-insensitively.
    fn get(&self, column: &str) -> Result<Value>;

    fn kind(&self) -> CursorKind {
        CursorKind::ForwardOnly
    }

    /// Positions the cursor on the 1-based `row`; the following call to
    /// [`ResultSet::next`] reads the row after it. Only scrollable cursors
    /// support this.
    fn absolute(&mut self, row: usize) -> Result<()> {
        let _ = row;
        Err(Error::row_source("cursor is forward-only"))
    }

    /// Releases the underlying cursor.
    fn close(&mut self) -> Result<()>;
}

/// The sequence of physical result sets produced by one statement.
pub trait ResultSets {
    /// Returns the next physical result set, or `None` when there are no more.
    fn next_result_set(&mut self) -> Result<Option<Box<dyn ResultSet>>>;
}

/// Runs nested statements on behalf of the engine.
pub trait QueryExecutor {
    /// Runs `statement` with `parameter`, returning one value per row.
    fn query(&self, statement: &Statement, parameter: &Value, key: &CacheKey) -> Result<Vec<Value>>;

    /// Key under which the result of running `statement` with `parameter` is
    /// cached.
    fn create_cache_key(&self, statement: &Statement, parameter: &Value) -> CacheKey {
        let mut key = CacheKey::new();
        key.update(&statement.id);
        key.update(parameter);
        key
    }

    /// Returns `true` if the result for `key` is cached or being loaded.
    fn is_cached(&self, statement: &Statement, key: &CacheKey) -> bool {
        let _ = (statement, key);
        false
    }

    /// Arranges for `property` of `target` to receive the result cached under
    /// `key` once that load completes.
    fn defer_load(
        &self,
        statement: &Statement,
        target: &Object,
        property: &str,
        key: &CacheKey,
        ty: &Type,
    ) -> Result<()> {
        let _ = (target, key, ty);
        Err(Error::invalid_mapping(format!(
            "deferred loads for `{}.{property}` are not supported by this executor",
            statement.id
        )))
    }
}

/// Executor used when none is configured. Mappings that run nested
/// statements fail.
#[derive(Debug, Default)]
pub struct NoExecutor;

impl QueryExecutor for NoExecutor {
    fn query(&self, statement: &Statement, _parameter: &Value, _key: &CacheKey) -> Result<Vec<Value>> {
        Err(Error::invalid_mapping(format!(
            "nested statement `{}` requires a query executor",
            statement.id
        )))
    }
}
