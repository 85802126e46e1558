mod bind;
mod correlate;
mod deferred;
mod discriminator;
mod exec;
mod materialize;
mod meta;
mod nested;
mod row_key;
mod row_source;

pub(crate) use exec::Exec;
pub(crate) use row_source::RowSource;

use crate::{sink::ResultSink, Cursor, RowWindow};
use rowmap_core::{
    convert::{ConverterRegistry, Converters},
    driver::{NoExecutor, QueryExecutor, ResultSet, ResultSets},
    err,
    factory::{DefaultObjectFactory, ObjectFactory},
    stmt::Value,
    Config, Error, Result, Schema,
};

use std::{rc::Rc, sync::Arc};

/// Materializes rows into object graphs according to a [`Schema`].
///
/// An engine is cheap to share by reference. Every call gets its own
/// assembly state, so one engine may serve any number of calls.
pub struct Engine {
    pub(crate) schema: Arc<Schema>,
    pub(crate) config: Config,
    pub(crate) converters: Arc<dyn ConverterRegistry>,
    pub(crate) factory: Rc<dyn ObjectFactory>,
    pub(crate) executor: Rc<dyn QueryExecutor>,
}

pub struct Builder {
    schema: Arc<Schema>,
    config: Config,
    converters: Option<Arc<dyn ConverterRegistry>>,
    factory: Option<Rc<dyn ObjectFactory>>,
    executor: Option<Rc<dyn QueryExecutor>>,
}

impl Engine {
    pub fn builder(schema: impl Into<Arc<Schema>>) -> Builder {
        Builder {
            schema: schema.into(),
            config: Config::default(),
            converters: None,
            factory: None,
            executor: None,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Materializes every physical result set produced by `statement`.
    ///
    /// The first result set uses the statement's first result map, the second
    /// its second, and so on. Remaining result sets named by the statement
    /// feed bindings linked to them. Without a `sink`, objects are collected
    /// and returned: one list for a single result map, otherwise a list of
    /// lists. With a `sink`, objects go to the sink and an empty list is
    /// returned.
    pub fn handle_result_sets(
        &self,
        statement: &str,
        results: &mut dyn ResultSets,
        window: RowWindow,
        sink: Option<&mut dyn ResultSink>,
    ) -> Result<Value> {
        let statement = self.schema.statement(statement)?;

        Exec::new(self, statement, window, sink.is_some())
            .handle_result_sets(results, sink)
            .map_err(|err| {
                err.context(err!("handling results for statement `{}`", statement.id))
            })
    }

    /// Materializes a single result set with the named result map.
    ///
    /// Returns the collected objects when no `sink` is given.
    pub fn materialize(
        &self,
        statement: &str,
        result_set: Box<dyn ResultSet>,
        result_map: &str,
        window: RowWindow,
        sink: Option<&mut dyn ResultSink>,
    ) -> Result<Value> {
        let statement = self.schema.statement(statement)?;
        let result_map = self.schema.result_map(result_map)?;
        let rsw = RowSource::new(&*self.converters, result_set);

        let mut exec = Exec::new(self, statement, window, sink.is_some());
        let mut collected: Vec<Value> = vec![];
        let sink: &mut dyn ResultSink = match sink {
            Some(sink) => sink,
            None => &mut collected,
        };

        exec.handle_result_set(rsw, result_map, sink, None)
            .map_err(|err| {
                err.context(err!("handling results for statement `{}`", statement.id))
            })?;

        Ok(Value::List(collected))
    }

    /// Returns a cursor producing the objects of the statement's first result
    /// set one at a time. The statement must declare exactly one result map.
    pub fn cursor<'a>(
        &'a self,
        statement: &str,
        results: &mut dyn ResultSets,
        window: RowWindow,
    ) -> Result<Cursor<'a>> {
        let statement = self.schema.statement(statement)?;
        let rsw = results
            .next_result_set()?
            .map(|rs| RowSource::new(&*self.converters, rs));

        let exec = Exec::new(self, statement, window, false);
        exec.validate_result_maps_count(rsw.as_ref())?;

        if statement.result_maps.len() != 1 {
            return Err(Error::invalid_mapping(format!(
                "cursor results of `{}` cannot be mapped to {} result maps",
                statement.id,
                statement.result_maps.len()
            )));
        }

        let result_map = self.schema.result_map(&statement.result_maps[0])?;
        Ok(Cursor::new(exec, rsw, result_map, window))
    }
}

impl Builder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn converters(mut self, converters: impl ConverterRegistry + 'static) -> Self {
        self.converters = Some(Arc::new(converters));
        self
    }

    pub fn factory(mut self, factory: impl ObjectFactory + 'static) -> Self {
        self.factory = Some(Rc::new(factory));
        self
    }

    /// Sets the executor that runs nested statements.
    pub fn executor(mut self, executor: Rc<dyn QueryExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn build(self) -> Engine {
        let factory = self
            .factory
            .unwrap_or_else(|| Rc::new(DefaultObjectFactory::new(self.schema.clone())));

        Engine {
            converters: self
                .converters
                .unwrap_or_else(|| Arc::new(Converters::new())),
            factory,
            executor: self.executor.unwrap_or_else(|| Rc::new(NoExecutor)),
            config: self.config,
            schema: self.schema,
        }
    }
}
