//! Pulling objects one at a time.

use crate::{
    engine::{Exec, RowSource},
    sink::{First, ResultContext},
    RowWindow,
};
use rowmap_core::{schema::mapping::ResultMap, stmt::Value, Result};

/// Produces the objects of a result set lazily, one per call to `next`.
///
/// Returned by [`Engine::cursor`](crate::Engine::cursor). The window is
/// applied to objects rather than rows: the first `offset` objects are
/// skipped and at most `limit` are produced. The underlying result set is
/// closed once the cursor is exhausted, fails, or is dropped.
pub struct Cursor<'a> {
    exec: Exec<'a>,

    rsw: Option<RowSource<'a>>,

    result_map: &'a ResultMap,

    window: RowWindow,

    /// Objects materialized so far, including skipped ones
    index: usize,

    /// Objects handed out
    returned: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(
        exec: Exec<'a>,
        rsw: Option<RowSource<'a>>,
        result_map: &'a ResultMap,
        window: RowWindow,
    ) -> Cursor<'a> {
        Cursor {
            exec,
            rsw,
            result_map,
            window,
            index: 0,
            returned: 0,
        }
    }

    /// Returns `true` once every object has been produced.
    pub fn is_consumed(&self) -> bool {
        self.rsw.is_none()
    }

    /// Number of objects produced so far.
    pub fn returned(&self) -> usize {
        self.returned
    }

    fn fetch(&mut self) -> Result<Option<Value>> {
        let Some(rsw) = self.rsw.as_mut() else {
            return Ok(None);
        };

        let mut first = First::default();
        let mut cx = ResultContext::default();

        self.exec.handle_row_values(
            rsw,
            self.result_map,
            &mut first,
            &mut cx,
            RowWindow::default(),
            None,
        )?;

        Ok(first.0)
    }

    fn close(&mut self) {
        if let Some(mut rsw) = self.rsw.take() {
            rsw.close();
        }
    }
}

impl Iterator for Cursor<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Result<Value>> {
        loop {
            if !self.window.admits(self.returned) {
                self.close();
                return None;
            }

            match self.fetch() {
                Ok(Some(value)) => {
                    self.index += 1;
                    if self.index <= self.window.offset {
                        continue;
                    }

                    self.returned += 1;
                    return Some(Ok(value));
                }
                Ok(None) => {
                    self.close();
                    return None;
                }
                Err(err) => {
                    self.close();
                    return Some(Err(err));
                }
            }
        }
    }
}
