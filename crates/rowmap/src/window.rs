/// Restricts which rows of a result set are materialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowWindow {
    /// Rows skipped before the first one is read
    pub offset: usize,

    /// Maximum number of objects produced
    pub limit: Option<usize>,
}

impl RowWindow {
    pub fn new(offset: usize, limit: usize) -> RowWindow {
        RowWindow {
            offset,
            limit: Some(limit),
        }
    }

    pub fn offset(offset: usize) -> RowWindow {
        RowWindow {
            offset,
            limit: None,
        }
    }

    pub fn limit(limit: usize) -> RowWindow {
        RowWindow {
            offset: 0,
            limit: Some(limit),
        }
    }

    /// Returns `true` unless the window admits every row.
    pub fn is_bounded(&self) -> bool {
        self.offset > 0 || self.limit.is_some()
    }

    pub(crate) fn admits(&self, count: usize) -> bool {
        self.limit.map_or(true, |limit| count < limit)
    }
}
