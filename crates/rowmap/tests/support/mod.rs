#![allow(dead_code)]

use rowmap::{
    driver::{
        mem::{MemResultSet, MemResults},
        QueryExecutor,
    },
    schema::Statement,
    stmt::{CacheKey, Object, Type, Value},
    Config, Engine, Result, RowWindow, Schema,
};

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
    sync::Arc,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn engine(schema: Schema) -> Engine {
    engine_with(schema, Config::default())
}

pub fn engine_with(schema: Schema, config: Config) -> Engine {
    init_logging();
    Engine::builder(schema).config(config).build()
}

/// Runs `statement` over `sets` and returns the collected objects.
pub fn run(engine: &Engine, statement: &str, sets: Vec<MemResultSet>) -> Result<Value> {
    run_window(engine, statement, sets, RowWindow::default())
}

pub fn run_window(
    engine: &Engine,
    statement: &str,
    sets: Vec<MemResultSet>,
    window: RowWindow,
) -> Result<Value> {
    let mut results = sets
        .into_iter()
        .fold(MemResults::new(), |results, set| results.with(set));
    engine.handle_result_sets(statement, &mut results, window, None)
}

/// The objects of a single result list.
#[track_caller]
pub fn objects(value: &Value) -> Vec<Object> {
    value
        .expect_list()
        .iter()
        .map(|item| item.expect_object().clone())
        .collect()
}

/// Executor answering nested statements from canned result sets.
///
/// Rows are materialized by an engine over the same schema. Every call is
/// recorded.
pub struct MemExecutor {
    schema: Arc<Schema>,
    config: Config,

    /// Result set per (statement, parameter rendered as text), served once
    results: RefCell<HashMap<(String, String), MemResultSet>>,

    /// Keys reported as cached
    cached: RefCell<HashSet<CacheKey>>,

    pub queries: RefCell<Vec<(String, Value)>>,

    pub deferred: RefCell<Vec<(String, String)>>,
}

impl MemExecutor {
    pub fn new(schema: Arc<Schema>, config: Config) -> Rc<MemExecutor> {
        Rc::new(MemExecutor {
            schema,
            config,
            results: RefCell::new(HashMap::new()),
            cached: RefCell::new(HashSet::new()),
            queries: RefCell::new(vec![]),
            deferred: RefCell::new(vec![]),
        })
    }

    pub fn answer(&self, statement: &str, parameter: impl Into<Value>, rows: MemResultSet) {
        let parameter = parameter.into().to_key_string().unwrap_or_default();
        self.results
            .borrow_mut()
            .insert((statement.to_string(), parameter), rows);
    }

    pub fn mark_cached(&self, key: CacheKey) {
        self.cached.borrow_mut().insert(key);
    }

    pub fn query_count(&self) -> usize {
        self.queries.borrow().len()
    }
}

impl QueryExecutor for MemExecutor {
    fn query(&self, statement: &Statement, parameter: &Value, _key: &CacheKey) -> Result<Vec<Value>> {
        self.queries
            .borrow_mut()
            .push((statement.id.clone(), parameter.clone()));

        let lookup = (
            statement.id.clone(),
            parameter.to_key_string().unwrap_or_default(),
        );
        let Some(rows) = self.results.borrow_mut().remove(&lookup) else {
            return Ok(vec![]);
        };

        let engine = Engine::builder(self.schema.clone())
            .config(self.config.clone())
            .build();

        let value = engine.handle_result_sets(
            &statement.id,
            &mut MemResults::single(rows),
            RowWindow::default(),
            None,
        )?;

        match value {
            Value::List(items) => Ok(items),
            other => Ok(vec![other]),
        }
    }

    fn is_cached(&self, _statement: &Statement, key: &CacheKey) -> bool {
        self.cached.borrow().contains(key)
    }

    fn defer_load(
        &self,
        statement: &Statement,
        target: &Object,
        property: &str,
        _key: &CacheKey,
        _ty: &Type,
    ) -> Result<()> {
        self.deferred
            .borrow_mut()
            .push((statement.id.clone(), format!("{}.{property}", target.model())));
        Ok(())
    }
}
