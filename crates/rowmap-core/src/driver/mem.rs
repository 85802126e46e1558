//! In-memory row sources.

use super::{Column, CursorKind, ResultSet, ResultSets};
use crate::{
    stmt::{Type, Value},
    Error, Result,
};

use std::{cell::Cell, collections::VecDeque, rc::Rc};

/// A result set backed by a vector of rows.
#[derive(Debug, Clone)]
pub struct MemResultSet {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,

    /// 1-based position of the current row; 0 is before the first row
    position: usize,

    kind: CursorKind,

    /// Reading this row fails with a row source error
    fail_at: Option<usize>,

    closed: Rc<Cell<bool>>,
}

impl MemResultSet {
    pub fn new<'a>(columns: impl IntoIterator<Item = (&'a str, Type)>) -> MemResultSet {
        MemResultSet {
            columns: columns
                .into_iter()
                .map(|(name, ty)| Column {
                    name: name.to_string(),
                    ty,
                })
                .collect(),
            rows: vec![],
            position: 0,
            kind: CursorKind::ForwardOnly,
            fail_at: None,
            closed: Rc::new(Cell::new(false)),
        }
    }

    /// Appends a row. Values are given in column order.
    pub fn row<I>(mut self, values: I) -> MemResultSet
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let row: Vec<Value> = values.into_iter().map(Into::into).collect();
        assert_eq!(
            row.len(),
            self.columns.len(),
            "row has {} values but the result set has {} columns",
            row.len(),
            self.columns.len()
        );
        self.rows.push(row);
        self
    }

    pub fn scrollable(mut self) -> MemResultSet {
        self.kind = CursorKind::Scrollable;
        self
    }

    /// Makes advancing onto the 1-based `row` fail.
    pub fn fail_at(mut self, row: usize) -> MemResultSet {
        self.fail_at = Some(row);
        self
    }

    /// Flag that flips once the result set is closed. Stays observable after
    /// the result set itself is handed to the engine.
    pub fn closed_flag(&self) -> Rc<Cell<bool>> {
        self.closed.clone()
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.get() {
            return Err(Error::row_source("result set is closed"));
        }
        Ok(())
    }
}

impl ResultSet for MemResultSet {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn next(&mut self) -> Result<bool> {
        self.check_open()?;

        if self.position >= self.rows.len() {
            self.position = self.rows.len() + 1;
            return Ok(false);
        }

        self.position += 1;

        if self.fail_at == Some(self.position) {
            return Err(Error::row_source(format!(
                "connection lost reading row {}",
                self.position
            )));
        }

        Ok(true)
    }

    fn get(&self, column: &str) -> Result<Value> {
        self.check_open()?;

        let Some(row) = self
            .position
            .checked_sub(1)
            .and_then(|index| self.rows.get(index))
        else {
            return Err(Error::row_source("no current row"));
        };

        let Some(index) = self
            .columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(column))
        else {
            return Err(Error::row_source(format!("no column named `{column}`")));
        };

        Ok(row[index].clone())
    }

    fn kind(&self) -> CursorKind {
        self.kind
    }

    fn absolute(&mut self, row: usize) -> Result<()> {
        self.check_open()?;

        if self.kind != CursorKind::Scrollable {
            return Err(Error::row_source("cursor is forward-only"));
        }

        self.position = row.min(self.rows.len() + 1);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed.set(true);
        Ok(())
    }
}

/// The physical result sets of one statement, in order.
#[derive(Default)]
pub struct MemResults {
    sets: VecDeque<Box<dyn ResultSet>>,

    /// Probing past this many result sets fails
    fail_after: Option<usize>,

    returned: usize,
}

impl MemResults {
    pub fn new() -> MemResults {
        MemResults::default()
    }

    pub fn single(set: impl ResultSet + 'static) -> MemResults {
        MemResults::new().with(set)
    }

    pub fn with(mut self, set: impl ResultSet + 'static) -> MemResults {
        self.sets.push_back(Box::new(set));
        self
    }

    /// Makes the request for result set `n + 1` fail.
    pub fn fail_after(mut self, n: usize) -> MemResults {
        self.fail_after = Some(n);
        self
    }
}

impl ResultSets for MemResults {
    fn next_result_set(&mut self) -> Result<Option<Box<dyn ResultSet>>> {
        if self.fail_after == Some(self.returned) {
            return Err(Error::row_source("driver failed to report more results"));
        }

        self.returned += 1;
        Ok(self.sets.pop_front())
    }
}

impl std::fmt::Debug for MemResults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemResults")
            .field("remaining", &self.sets.len())
            .field("fail_after", &self.fail_after)
            .finish()
    }
}
