mod support;

use pretty_assertions::assert_eq;
use rowmap::{
    driver::mem::MemResultSet,
    schema::{
        app::{Constructor, Field, Model},
        mapping::{Binding, ResultMap},
        Statement,
    },
    stmt::{CacheKey, Type, Value},
    Config, Engine, Schema,
};
use std::{rc::Rc, sync::Arc};
use support::*;

fn schema_with(posts: Binding) -> Arc<Schema> {
    Arc::new(
        Schema::builder()
            .model(
                Model::new("Author")
                    .field(Field::new("id", Type::I64))
                    .field(Field::nullable("name", Type::String))
                    .field(Field::nullable("posts", Type::list(Type::model("Post")))),
            )
            .model(
                Model::new("Post")
                    .field(Field::new("id", Type::I64))
                    .field(Field::nullable("subject", Type::String))
                    .field(Field::nullable("author", Type::model("Author"))),
            )
            .result_map(
                ResultMap::new("author", Type::model("Author"))
                    .binding(Binding::column("id", "id").id())
                    .binding(Binding::column("name", "name"))
                    .binding(posts),
            )
            .result_map(
                ResultMap::new("post", Type::model("Post"))
                    .binding(Binding::column("id", "id").id())
                    .binding(Binding::column("subject", "subject"))
                    .binding(Binding::query("author", "author_id", "selectAuthor")),
            )
            .result_map(
                ResultMap::new("plainAuthor", Type::model("Author"))
                    .binding(Binding::column("id", "id").id())
                    .binding(Binding::column("name", "name")),
            )
            .statement(Statement::new("selectAuthors").result_map("author"))
            .statement(
                Statement::new("selectPostsForAuthor")
                    .result_map("post")
                    .parameter_type(Type::I64),
            )
            .statement(
                Statement::new("selectAuthor")
                    .result_map("plainAuthor")
                    .parameter_type(Type::I64),
            )
            .statement(Statement::new("selectPosts").result_map("post"))
            .statement(Statement::new("selectPostsByKey").result_map("post"))
            .build()
            .unwrap(),
    )
}

fn posts_query() -> Binding {
    Binding::query("posts", "id", "selectPostsForAuthor")
}

fn engine_for(schema: &Arc<Schema>, config: Config) -> (Engine, Rc<MemExecutor>) {
    init_logging();
    let executor = MemExecutor::new(schema.clone(), config.clone());
    let engine = Engine::builder(schema.clone())
        .config(config)
        .executor(executor.clone())
        .build();
    (engine, executor)
}

fn author_rows() -> MemResultSet {
    MemResultSet::new([("id", Type::I64), ("name", Type::String)])
        .row([Value::I64(1), "Ann".into()])
}

fn post_rows(ids: &[i64]) -> MemResultSet {
    ids.iter().fold(
        MemResultSet::new([
            ("id", Type::I64),
            ("subject", Type::String),
            ("author_id", Type::I64),
        ]),
        |rows, id| rows.row([Value::I64(*id), format!("post {id}").into(), Value::Null]),
    )
}

fn subjects(value: &Value) -> Vec<Value> {
    objects(value).iter().map(|post| post.peek("subject")).collect()
}

#[test]
fn eager_nested_query() {
    let schema = schema_with(posts_query());
    let (engine, executor) = engine_for(&schema, Config::default());
    executor.answer("selectPostsForAuthor", 1i64, post_rows(&[10, 11]));

    let value = run(&engine, "selectAuthors", vec![author_rows()]).unwrap();
    let author = &objects(&value)[0];

    assert_eq!(executor.query_count(), 1);
    assert_eq!(
        executor.queries.borrow()[0],
        ("selectPostsForAuthor".to_string(), Value::I64(1))
    );
    assert_eq!(
        subjects(&author.peek("posts")),
        vec![Value::from("post 10"), Value::from("post 11")]
    );
}

#[test]
fn lazy_nested_query_runs_on_first_access() {
    let schema = schema_with(posts_query().lazy());
    let (engine, executor) = engine_for(&schema, Config::default());
    executor.answer("selectPostsForAuthor", 1i64, post_rows(&[10]));

    let value = run(&engine, "selectAuthors", vec![author_rows()]).unwrap();
    let author = &objects(&value)[0];

    assert_eq!(executor.query_count(), 0);
    assert!(author.is_lazy());
    assert!(author.has_pending_load("posts"));

    // Other properties do not trigger the load
    assert_eq!(author.get("name").unwrap(), Value::from("Ann"));
    assert_eq!(executor.query_count(), 0);

    let posts = author.get("posts").unwrap();
    assert_eq!(subjects(&posts), vec![Value::from("post 10")]);
    assert_eq!(executor.query_count(), 1);

    // The result is kept
    author.get("posts").unwrap();
    assert_eq!(executor.query_count(), 1);
}

#[test]
fn lazy_loading_enabled_globally() {
    let schema = schema_with(posts_query());
    let config = Config {
        lazy_loading_enabled: true,
        ..Config::default()
    };
    let (engine, executor) = engine_for(&schema, config);

    let value = run(&engine, "selectAuthors", vec![author_rows()]).unwrap();
    let author = &objects(&value)[0];

    assert!(author.has_pending_load("posts"));
    assert_eq!(executor.query_count(), 0);
}

#[test]
fn eager_binding_overrides_lazy_default() {
    let schema = schema_with(posts_query().eager());
    let config = Config {
        lazy_loading_enabled: true,
        ..Config::default()
    };
    let (engine, executor) = engine_for(&schema, config);
    executor.answer("selectPostsForAuthor", 1i64, post_rows(&[10]));

    run(&engine, "selectAuthors", vec![author_rows()]).unwrap();

    assert_eq!(executor.query_count(), 1);
}

#[test]
fn aggressive_lazy_loading_loads_everything() {
    let schema = schema_with(posts_query().lazy());
    let config = Config {
        aggressive_lazy_loading: true,
        ..Config::default()
    };
    let (engine, executor) = engine_for(&schema, config);
    executor.answer("selectPostsForAuthor", 1i64, post_rows(&[10]));

    let value = run(&engine, "selectAuthors", vec![author_rows()]).unwrap();
    let author = &objects(&value)[0];

    author.get("name").unwrap();
    assert_eq!(executor.query_count(), 1);
    assert_eq!(author.pending_loads(), 0);
}

#[test]
fn cached_load_is_deferred() {
    let schema = schema_with(posts_query());
    let (engine, executor) = engine_for(&schema, Config::default());

    let mut key = CacheKey::new();
    key.update("selectPostsForAuthor");
    key.update(&Value::I64(1));
    executor.mark_cached(key);

    let value = run(&engine, "selectAuthors", vec![author_rows()]).unwrap();

    assert_eq!(objects(&value).len(), 1);
    assert_eq!(executor.query_count(), 0);
    assert_eq!(
        *executor.deferred.borrow(),
        vec![("selectPostsForAuthor".to_string(), "Author.posts".to_string())]
    );
}

#[test]
fn null_parameter_skips_the_query() {
    let schema = schema_with(posts_query());
    let (engine, executor) = engine_for(&schema, Config::default());

    let rows = post_rows(&[10]);
    let value = run(&engine, "selectPosts", vec![rows]).unwrap();

    assert_eq!(executor.query_count(), 0);
    assert_eq!(objects(&value)[0].peek("author"), Value::Null);
}

#[test]
fn single_valued_property_rejects_many_rows() {
    let schema = schema_with(posts_query());
    let (engine, executor) = engine_for(&schema, Config::default());

    let authors = MemResultSet::new([("id", Type::I64), ("name", Type::String)])
        .row([Value::I64(1), "Ann".into()])
        .row([Value::I64(2), "Bob".into()]);
    executor.answer("selectAuthor", 1i64, authors);

    let rows = MemResultSet::new([
        ("id", Type::I64),
        ("subject", Type::String),
        ("author_id", Type::I64),
    ])
    .row([Value::I64(10), "x".into(), Value::I64(1)]);
    let err = run(&engine, "selectPosts", vec![rows]).unwrap_err();

    assert!(err.is_too_many_results());
}

#[test]
fn single_valued_property_takes_the_only_row() {
    let schema = schema_with(posts_query());
    let (engine, executor) = engine_for(&schema, Config::default());
    executor.answer("selectAuthor", 1i64, author_rows());

    let rows = MemResultSet::new([
        ("id", Type::I64),
        ("subject", Type::String),
        ("author_id", Type::I64),
    ])
    .row([Value::I64(10), "x".into(), Value::I64(1)]);
    let value = run(&engine, "selectPosts", vec![rows]).unwrap();
    let author = objects(&value)[0].peek("author");

    assert_eq!(author.expect_object().peek("name"), Value::from("Ann"));
}

#[test]
fn composite_parameter() {
    let schema = schema_with(
        Binding::query("posts", "id", "selectPostsByKey")
            .composite("authorId", "id")
            .composite("authorName", "name"),
    );
    let (engine, executor) = engine_for(&schema, Config::default());

    let rows = MemResultSet::new([("id", Type::I64), ("name", Type::String)])
        .row([Value::I64(1), "Ann".into()])
        .row([Value::Null, Value::Null]);
    run(&engine, "selectAuthors", vec![rows]).unwrap();

    // The second row has no parameter values and runs nothing
    let queries = executor.queries.borrow();
    assert_eq!(queries.len(), 1);

    // Without a parameter type the parameter is a property bag
    let parameter = queries[0].1.expect_object();
    assert!(parameter.is_map());
    assert_eq!(parameter.peek("authorId"), Value::I64(1));
    assert_eq!(parameter.peek("authorName"), Value::from("Ann"));
}

#[test]
fn nested_query_constructor_argument_loads_eagerly() {
    let schema = Arc::new(
        Schema::builder()
            .model(
                Model::new("Author")
                    .field(Field::new("id", Type::I64))
                    .field(Field::nullable("posts", Type::list(Type::model("Post"))))
                    .constructor(Constructor::new([
                        ("id", Type::I64),
                        ("posts", Type::list(Type::model("Post"))),
                    ])),
            )
            .model(
                Model::new("Post")
                    .field(Field::new("id", Type::I64))
                    .field(Field::nullable("subject", Type::String)),
            )
            .result_map(
                ResultMap::new("author", Type::model("Author"))
                    .binding(Binding::arg("id", Type::I64).id())
                    .binding(
                        Binding::query("posts", "id", "selectPostsForAuthor")
                            .constructor()
                            .lazy(),
                    ),
            )
            .result_map(
                ResultMap::new("post", Type::model("Post"))
                    .binding(Binding::column("id", "id").id())
                    .binding(Binding::column("subject", "subject")),
            )
            .statement(Statement::new("selectAuthors").result_map("author"))
            .statement(
                Statement::new("selectPostsForAuthor")
                    .result_map("post")
                    .parameter_type(Type::I64),
            )
            .build()
            .unwrap(),
    );

    let (engine, executor) = engine_for(&schema, Config::default());
    let posts = MemResultSet::new([("id", Type::I64), ("subject", Type::String)])
        .row([Value::I64(10), "x".into()]);
    executor.answer("selectPostsForAuthor", 1i64, posts);

    let rows = MemResultSet::new([("id", Type::I64)]).row([Value::I64(1)]);
    let value = run(&engine, "selectAuthors", vec![rows]).unwrap();
    let author = &objects(&value)[0];

    assert_eq!(executor.query_count(), 1);
    assert!(!author.is_lazy());
    assert_eq!(subjects(&author.peek("posts")), vec![Value::from("x")]);
}

#[test]
fn lazy_object_keeps_its_constructor_arguments() {
    let schema = Arc::new(
        Schema::builder()
            .model(
                Model::new("Author")
                    .field(Field::new("id", Type::I64))
                    .field(Field::nullable("name", Type::String))
                    .field(Field::nullable("posts", Type::list(Type::model("Post"))))
                    .constructor(Constructor::new([("id", Type::I64), ("name", Type::String)])),
            )
            .model(
                Model::new("Post")
                    .field(Field::new("id", Type::I64))
                    .field(Field::nullable("subject", Type::String)),
            )
            .result_map(
                ResultMap::new("author", Type::model("Author"))
                    .binding(Binding::column("id", "id").constructor().id())
                    .binding(Binding::column("name", "name").constructor())
                    .binding(posts_query().lazy()),
            )
            .result_map(
                ResultMap::new("post", Type::model("Post"))
                    .binding(Binding::column("id", "id").id())
                    .binding(Binding::column("subject", "subject")),
            )
            .statement(Statement::new("selectAuthors").result_map("author"))
            .statement(
                Statement::new("selectPostsForAuthor")
                    .result_map("post")
                    .parameter_type(Type::I64),
            )
            .build()
            .unwrap(),
    );

    let (engine, executor) = engine_for(&schema, Config::default());
    let posts = MemResultSet::new([("id", Type::I64), ("subject", Type::String)])
        .row([Value::I64(10), "x".into()]);
    executor.answer("selectPostsForAuthor", 1i64, posts);

    let value = run(&engine, "selectAuthors", vec![author_rows()]).unwrap();
    let author = &objects(&value)[0];

    assert!(author.is_lazy());
    assert_eq!(
        author.constructor_args(),
        vec![
            (Type::I64, Value::I64(1)),
            (Type::String, Value::from("Ann")),
        ]
    );
    assert_eq!(author.peek("name"), Value::from("Ann"));
    assert_eq!(executor.query_count(), 0);

    assert_eq!(subjects(&author.get("posts").unwrap()), vec![Value::from("x")]);
    assert_eq!(executor.query_count(), 1);
}
