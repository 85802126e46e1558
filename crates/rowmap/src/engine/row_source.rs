use rowmap_core::{
    convert::{Converter, ConverterRegistry},
    driver::{Column, CursorKind, ResultSet},
    schema::mapping::{Binding, ResultMap},
    stmt::{Type, Value},
    Error, Result,
};

use indexmap::IndexSet;
use std::{cell::RefCell, collections::HashMap, rc::Rc, sync::Arc};

/// Wraps one physical result set for the duration of its pass.
///
/// Converters are resolved per (type, column) and remembered, since the
/// affinity between a column and a converter depends on the shape of the
/// query. The result set is closed when the wrapper is closed or dropped.
pub(crate) struct RowSource<'a> {
    registry: &'a dyn ConverterRegistry,

    rs: Box<dyn ResultSet>,

    closed: bool,

    converters: RefCell<HashMap<(Type, String), Arc<dyn Converter>>>,

    /// Mapped and unmapped columns by `result map id:column prefix`
    column_split: RefCell<HashMap<String, Rc<ColumnSplit>>>,
}

pub(crate) struct ColumnSplit {
    /// Upper-cased labels of result set columns some binding reads
    pub(crate) mapped: IndexSet<String>,

    /// Labels, as reported, of the remaining columns
    pub(crate) unmapped: Vec<String>,
}

impl<'a> RowSource<'a> {
    pub(crate) fn new(registry: &'a dyn ConverterRegistry, rs: Box<dyn ResultSet>) -> RowSource<'a> {
        RowSource {
            registry,
            rs,
            closed: false,
            converters: RefCell::new(HashMap::new()),
            column_split: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn columns(&self) -> &[Column] {
        self.rs.columns()
    }

    pub(crate) fn result_set(&self) -> &dyn ResultSet {
        &*self.rs
    }

    /// Declared type of `column`, matched case-insensitively.
    pub(crate) fn column_ty(&self, column: &str) -> Option<&Type> {
        self.columns()
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(column))
            .map(|c| &c.ty)
    }

    pub(crate) fn next(&mut self) -> Result<bool> {
        self.rs.next()
    }

    /// Skips the first `offset` rows.
    pub(crate) fn skip_rows(&mut self, offset: usize) -> Result<()> {
        if offset == 0 {
            return Ok(());
        }

        match self.rs.kind() {
            CursorKind::Scrollable => self.rs.absolute(offset),
            CursorKind::ForwardOnly => {
                for _ in 0..offset {
                    if !self.rs.next()? {
                        break;
                    }
                }
                Ok(())
            }
        }
    }

    /// Converter reading `column` as `ty`.
    pub(crate) fn converter(&self, ty: &Type, column: &str) -> Result<Arc<dyn Converter>> {
        let key = (ty.clone(), column.to_uppercase());

        if let Some(converter) = self.converters.borrow().get(&key) {
            return Ok(converter.clone());
        }

        let converter = self
            .registry
            .resolve(ty, self.column_ty(column))
            .ok_or_else(|| Error::conversion_unavailable(ty, column))?;

        self.converters.borrow_mut().insert(key, converter.clone());
        Ok(converter)
    }

    pub(crate) fn has_converter(&self, ty: &Type, column_ty: Option<&Type>) -> bool {
        self.registry.has(ty, column_ty)
    }

    /// Reads `column` as `ty`.
    pub(crate) fn get(&self, ty: &Type, column: &str) -> Result<Value> {
        self.converter(ty, column)?.get(&*self.rs, column)
    }

    /// Reads `column` for `binding`, through the binding's named converter
    /// when it has one.
    pub(crate) fn get_for(&self, binding: &Binding, column: &str) -> Result<Value> {
        match &binding.converter {
            Some(name) => {
                let converter = self
                    .registry
                    .named(name)
                    .ok_or_else(|| Error::conversion_unavailable(format!("`{name}`"), column))?;
                converter.get(&*self.rs, column)
            }
            None => self.get(&binding.ty, column),
        }
    }

    /// Reads `column` without conversion.
    pub(crate) fn get_raw(&self, column: &str) -> Result<Value> {
        self.rs.get(column)
    }

    /// Reads `column` rendered as text. `None` if the column is null.
    pub(crate) fn get_string(&self, column: &str) -> Result<Option<String>> {
        Ok(self.rs.get(column)?.to_key_string())
    }

    /// Splits the result set columns into those `result_map` binds under
    /// `prefix` and the rest.
    pub(crate) fn column_split(&self, result_map: &ResultMap, prefix: Option<&str>) -> Rc<ColumnSplit> {
        let key = format!("{}:{}", result_map.id, prefix.unwrap_or(""));

        if let Some(split) = self.column_split.borrow().get(&key) {
            return split.clone();
        }

        let expected: IndexSet<String> = result_map
            .mapped_columns
            .iter()
            .map(|column| prepend_prefix(column, prefix).to_uppercase())
            .collect();

        let mut split = ColumnSplit {
            mapped: IndexSet::new(),
            unmapped: vec![],
        };

        for column in self.columns() {
            let upper = column.name.to_uppercase();
            if expected.contains(&upper) {
                split.mapped.insert(upper);
            } else {
                split.unmapped.push(column.name.clone());
            }
        }

        let split = Rc::new(split);
        self.column_split.borrow_mut().insert(key, split.clone());
        split
    }

    /// Closes the result set. Failures are logged and otherwise ignored.
    pub(crate) fn close(&mut self) {
        if self.closed {
            return;
        }

        self.closed = true;
        if let Err(err) = self.rs.close() {
            log::debug!("ignoring failure closing result set: {err}");
        }
    }
}

impl Drop for RowSource<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Prefixes `column` with `prefix`, if any.
pub(crate) fn prepend_prefix(column: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) if !column.is_empty() => format!("{prefix}{column}"),
        _ => column.to_string(),
    }
}
