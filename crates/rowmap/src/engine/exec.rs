use super::{Engine, RowSource};
use crate::{
    sink::{ResultContext, ResultSink},
    RowWindow,
};
use rowmap_core::{
    driver::ResultSets,
    schema::{
        mapping::{Binding, ResultMap},
        Schema, Statement,
    },
    stmt::{CacheKey, Object, Value},
    Error, Result,
};

use indexmap::IndexMap;
use std::{collections::HashMap, ops::ControlFlow, rc::Rc};

use super::bind::AutoBinding;

/// State of one call into the engine.
///
/// The identity and ancestor tables span one result set pass. Pending
/// relations and the result sets they wait for span the whole call.
pub(crate) struct Exec<'a> {
    pub(super) engine: &'a Engine,

    pub(super) statement: &'a Statement,

    /// Window requested by the caller
    pub(super) window: RowWindow,

    /// The caller supplied its own sink
    pub(super) custom_sink: bool,

    /// Objects by row identity, for joined rows describing the same object
    pub(super) nested_objects: HashMap<CacheKey, Value>,

    /// Objects under construction, by result map id
    pub(super) ancestors: HashMap<String, Object>,

    /// Objects waiting for rows of a later result set
    pub(super) pending_relations: HashMap<CacheKey, Vec<PendingRelation<'a>>>,

    /// Binding fed by each named later result set
    pub(super) next_result_maps: IndexMap<String, &'a Binding>,

    /// Automatic bindings by `result map id:column prefix`
    pub(super) auto_mappings: HashMap<String, Rc<Vec<AutoBinding>>>,

    /// Root object still being assembled when a pass stopped early
    pub(super) previous_row_value: Option<Value>,
}

#[derive(Debug, Clone)]
pub(crate) struct PendingRelation<'a> {
    pub(super) target: Object,
    pub(super) binding: &'a Binding,
}

impl<'a> Exec<'a> {
    pub(crate) fn new(
        engine: &'a Engine,
        statement: &'a Statement,
        window: RowWindow,
        custom_sink: bool,
    ) -> Exec<'a> {
        Exec {
            engine,
            statement,
            window,
            custom_sink,
            nested_objects: HashMap::new(),
            ancestors: HashMap::new(),
            pending_relations: HashMap::new(),
            next_result_maps: IndexMap::new(),
            auto_mappings: HashMap::new(),
            previous_row_value: None,
        }
    }

    pub(super) fn schema(&self) -> &'a Schema {
        let engine = self.engine;
        &engine.schema
    }

    pub(super) fn handle_result_sets(
        &mut self,
        results: &mut dyn ResultSets,
        mut sink: Option<&mut dyn ResultSink>,
    ) -> Result<Value> {
        let schema = self.schema();
        let statement = self.statement;
        let mut multiple_results = vec![];
        let mut result_set_count = 0;

        let mut rsw = self.first_result_set(results)?;
        self.validate_result_maps_count(rsw.as_ref())?;

        while result_set_count < statement.result_maps.len() {
            let Some(current) = rsw.take() else {
                break;
            };

            let result_map = schema.result_map(&statement.result_maps[result_set_count])?;

            match sink.as_deref_mut() {
                Some(sink) => self.handle_result_set(current, result_map, sink, None)?,
                None => {
                    let mut collected: Vec<Value> = vec![];
                    self.handle_result_set(current, result_map, &mut collected, None)?;
                    multiple_results.push(Value::List(collected));
                }
            }

            rsw = self.next_result_set(results);
            self.clean_up_after_result_set();
            result_set_count += 1;
        }

        while result_set_count < statement.result_sets.len() {
            let Some(current) = rsw.take() else {
                break;
            };

            let name = &statement.result_sets[result_set_count];
            if let Some(&parent) = self.next_result_maps.get(name) {
                let Some(id) = &parent.nested_result_map else {
                    return Err(Error::invalid_mapping(format!(
                        "result set `{name}` is linked to a binding without a nested result map"
                    )));
                };

                log::debug!("linking rows of result set `{name}` through result map `{id}`");
                let result_map = schema.result_map(id)?;
                self.handle_result_set(current, result_map, &mut Vec::<Value>::new(), Some(parent))?;
            } else {
                log::debug!("no binding waits for result set `{name}`; skipping it");
            }

            rsw = self.next_result_set(results);
            self.clean_up_after_result_set();
            result_set_count += 1;
        }

        Ok(if multiple_results.len() == 1 {
            multiple_results.swap_remove(0)
        } else {
            Value::List(multiple_results)
        })
    }

    /// Reads the first result set. Failures propagate.
    fn first_result_set(&self, results: &mut dyn ResultSets) -> Result<Option<RowSource<'a>>> {
        let engine = self.engine;
        let converters = &*engine.converters;
        Ok(results
            .next_result_set()?
            .map(|rs| RowSource::new(converters, rs)))
    }

    /// Probes for a further result set. A failing probe means there are no
    /// more result sets.
    fn next_result_set(&self, results: &mut dyn ResultSets) -> Option<RowSource<'a>> {
        let engine = self.engine;
        match results.next_result_set() {
            Ok(rs) => rs.map(|rs| RowSource::new(&*engine.converters, rs)),
            Err(err) => {
                log::debug!("ignoring failure probing for more result sets: {err}");
                None
            }
        }
    }

    pub(crate) fn validate_result_maps_count(&self, rsw: Option<&RowSource<'_>>) -> Result<()> {
        if rsw.is_some() && self.statement.result_maps.is_empty() {
            return Err(Error::invalid_mapping(format!(
                "a query was run and no result maps were found for statement `{}`",
                self.statement.id
            )));
        }
        Ok(())
    }

    fn clean_up_after_result_set(&mut self) {
        self.nested_objects.clear();
        self.ancestors.clear();
        self.auto_mappings.clear();
        self.previous_row_value = None;
    }

    /// Runs one pass over `rsw` and closes it, whatever the outcome.
    pub(crate) fn handle_result_set(
        &mut self,
        mut rsw: RowSource<'a>,
        result_map: &'a ResultMap,
        sink: &mut dyn ResultSink,
        parent: Option<&'a Binding>,
    ) -> Result<()> {
        log::debug!(
            "materializing result set with result map `{}` ({} columns)",
            result_map.id,
            rsw.columns().len()
        );

        let window = match parent {
            Some(_) => RowWindow::default(),
            None => self.window,
        };

        let mut cx = ResultContext::default();
        let result = self.handle_row_values(&mut rsw, result_map, sink, &mut cx, window, parent);
        rsw.close();

        log::debug!(
            "result set with result map `{}` done; {} objects",
            result_map.id,
            cx.count
        );
        result
    }

    pub(crate) fn handle_row_values(
        &mut self,
        rsw: &mut RowSource<'a>,
        result_map: &'a ResultMap,
        sink: &mut dyn ResultSink,
        cx: &mut ResultContext,
        window: RowWindow,
        parent: Option<&'a Binding>,
    ) -> Result<()> {
        if result_map.has_nested_result_maps {
            self.ensure_no_row_window()?;
            self.check_result_sink()?;
            self.handle_row_values_for_nested_result_map(rsw, result_map, sink, cx, window, parent)
        } else {
            self.handle_row_values_for_simple_result_map(rsw, result_map, sink, cx, window, parent)
        }
    }

    fn ensure_no_row_window(&self) -> Result<()> {
        if self.engine.config.safe_row_bounds_enabled && self.window.is_bounded() {
            return Err(Error::unsafe_row_window());
        }
        Ok(())
    }

    fn check_result_sink(&self) -> Result<()> {
        if self.custom_sink
            && self.engine.config.safe_result_handler_enabled
            && !self.statement.result_ordered
        {
            return Err(Error::unsafe_custom_sink());
        }
        Ok(())
    }

    fn handle_row_values_for_simple_result_map(
        &mut self,
        rsw: &mut RowSource<'a>,
        result_map: &'a ResultMap,
        sink: &mut dyn ResultSink,
        cx: &mut ResultContext,
        window: RowWindow,
        parent: Option<&'a Binding>,
    ) -> Result<()> {
        rsw.skip_rows(window.offset)?;

        while should_process_more_rows(cx, window) && rsw.next()? {
            let result_map = self.resolve_discriminated_result_map(rsw, result_map, None)?;

            if let Some(row_value) = self.get_row_value(rsw, result_map, None)? {
                self.store_object(rsw, row_value, parent, sink, cx)?;
            }
        }

        Ok(())
    }

    fn handle_row_values_for_nested_result_map(
        &mut self,
        rsw: &mut RowSource<'a>,
        result_map: &'a ResultMap,
        sink: &mut dyn ResultSink,
        cx: &mut ResultContext,
        window: RowWindow,
        parent: Option<&'a Binding>,
    ) -> Result<()> {
        let ordered = self.statement.result_ordered;

        rsw.skip_rows(window.offset)?;
        let mut row_value = self.previous_row_value.take();

        while should_process_more_rows(cx, window) && rsw.next()? {
            let result_map = self.resolve_discriminated_result_map(rsw, result_map, None)?;
            let row_key = self.create_row_key(rsw, result_map, None)?;
            log::trace!("row identity for `{}`: {row_key}", result_map.id);

            let partial = self.known_object(&row_key);

            if ordered {
                if partial.is_none() {
                    if let Some(previous) = row_value.take() {
                        self.nested_objects.clear();
                        self.store_object(rsw, previous, parent, sink, cx)?;
                    }
                }
                row_value = self.get_nested_row_value(rsw, result_map, &row_key, None, partial)?;
            } else {
                let first_seen = partial.is_none();
                row_value = self.get_nested_row_value(rsw, result_map, &row_key, None, partial)?;

                if first_seen {
                    if let Some(value) = &row_value {
                        self.store_object(rsw, value.clone(), parent, sink, cx)?;
                    }
                }
            }
        }

        if let Some(value) = row_value {
            if ordered && should_process_more_rows(cx, window) {
                self.store_object(rsw, value, parent, sink, cx)?;
            } else {
                self.previous_row_value = Some(value);
            }
        }

        Ok(())
    }

    /// Object previously built for `key` in this pass.
    pub(super) fn known_object(&self, key: &CacheKey) -> Option<Value> {
        if key.is_null() {
            return None;
        }
        self.nested_objects.get(key).cloned()
    }

    fn store_object(
        &mut self,
        rsw: &RowSource<'a>,
        row_value: Value,
        parent: Option<&'a Binding>,
        sink: &mut dyn ResultSink,
        cx: &mut ResultContext,
    ) -> Result<()> {
        match parent {
            Some(parent) => self.link_to_parents(rsw, parent, row_value),
            None => {
                cx.count += 1;
                if let ControlFlow::Break(()) = sink.accept(row_value) {
                    cx.stopped = true;
                }
                Ok(())
            }
        }
    }
}

fn should_process_more_rows(cx: &ResultContext, window: RowWindow) -> bool {
    !cx.stopped && window.admits(cx.count)
}
