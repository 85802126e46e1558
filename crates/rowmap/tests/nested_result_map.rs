mod support;

use pretty_assertions::assert_eq;
use rowmap::{
    driver::mem::{MemResultSet, MemResults},
    schema::{
        app::{Field, Model},
        mapping::{Binding, ResultMap},
        Statement,
    },
    sink,
    stmt::{Type, Value},
    Config, ResultSink, RowWindow, Schema,
};
use std::ops::ControlFlow;
use support::*;

fn models(builder: rowmap::schema::Builder) -> rowmap::schema::Builder {
    builder
        .model(
            Model::new("Blog")
                .field(Field::new("id", Type::I64))
                .field(Field::nullable("title", Type::String))
                .field(Field::nullable("author", Type::model("Author")))
                .field(Field::nullable("posts", Type::list(Type::model("Post")))),
        )
        .model(
            Model::new("Post")
                .field(Field::new("id", Type::I64))
                .field(Field::nullable("subject", Type::String))
                .field(Field::nullable("blog", Type::model("Blog"))),
        )
        .model(
            Model::new("Author")
                .field(Field::new("id", Type::I64))
                .field(Field::nullable("name", Type::String)),
        )
}

fn blog_map(posts: Binding) -> ResultMap {
    ResultMap::new("blog", Type::model("Blog"))
        .binding(Binding::column("id", "blog_id").id())
        .binding(Binding::column("title", "blog_title"))
        .binding(posts)
}

fn post_map() -> ResultMap {
    ResultMap::new("post", Type::model("Post"))
        .binding(Binding::column("id", "post_id").id())
        .binding(Binding::column("subject", "post_subject"))
}

fn schema_with(posts: Binding, statement: Statement) -> Schema {
    models(Schema::builder())
        .result_map(blog_map(posts))
        .result_map(post_map())
        .statement(statement)
        .build()
        .unwrap()
}

fn schema() -> Schema {
    schema_with(
        Binding::nested("posts", "post"),
        Statement::new("selectBlogs").result_map("blog"),
    )
}

fn blog_rows() -> MemResultSet {
    MemResultSet::new([
        ("blog_id", Type::I64),
        ("blog_title", Type::String),
        ("post_id", Type::I64),
        ("post_subject", Type::String),
    ])
}

fn post_ids(blog: &rowmap::stmt::Object) -> Vec<Value> {
    objects(&blog.peek("posts"))
        .iter()
        .map(|post| post.peek("id"))
        .collect()
}

#[test]
fn joined_rows_collapse_into_one_object() {
    let rows = blog_rows()
        .row([Value::I64(1), "A".into(), Value::I64(10), "x".into()])
        .row([Value::I64(1), "A".into(), Value::I64(11), "y".into()])
        .row([Value::I64(1), "A".into(), Value::I64(10), "x".into()])
        .row([Value::I64(2), "B".into(), Value::I64(20), "z".into()]);

    let engine = engine(schema());
    let value = run(&engine, "selectBlogs", vec![rows]).unwrap();
    let blogs = objects(&value);

    assert_eq!(blogs.len(), 2);
    assert_eq!(blogs[0].peek("title"), Value::from("A"));
    assert_eq!(post_ids(&blogs[0]), vec![Value::I64(10), Value::I64(11)]);
    assert_eq!(post_ids(&blogs[1]), vec![Value::I64(20)]);
}

#[test]
fn empty_nested_row_leaves_empty_collection() {
    let rows = blog_rows().row([Value::I64(1), "A".into(), Value::Null, Value::Null]);

    let engine = engine(schema());
    let value = run(&engine, "selectBlogs", vec![rows]).unwrap();
    let blog = &objects(&value)[0];

    assert_eq!(blog.peek("posts"), Value::List(vec![]));
}

#[test]
fn rows_without_identity_are_not_merged() {
    let rows = blog_rows()
        .row([Value::I64(1), "A".into(), Value::Null, "x".into()])
        .row([Value::I64(1), "A".into(), Value::Null, "x".into()]);

    let engine = engine(schema());
    let value = run(&engine, "selectBlogs", vec![rows]).unwrap();
    let blogs = objects(&value);
    let posts = objects(&blogs[0].peek("posts"));

    assert_eq!(blogs.len(), 1);
    assert_eq!(posts.len(), 2);
    assert!(!posts[0].ptr_eq(&posts[1]));
}

#[test]
fn ordered_rows_flush_on_identity_change() {
    let rows = || {
        blog_rows()
            .row([Value::I64(1), "A".into(), Value::I64(10), "x".into()])
            .row([Value::I64(2), "B".into(), Value::I64(20), "y".into()])
            .row([Value::I64(1), "A".into(), Value::I64(11), "z".into()])
    };

    // Unordered: identities are remembered across the whole pass
    let unordered = engine(schema());
    let value = run(&unordered, "selectBlogs", vec![rows()]).unwrap();
    let blogs = objects(&value);
    assert_eq!(blogs.len(), 2);
    assert_eq!(post_ids(&blogs[0]), vec![Value::I64(10), Value::I64(11)]);

    // Ordered: a blog is complete once the next identity shows up
    let engine = engine(schema_with(
        Binding::nested("posts", "post"),
        Statement::new("selectBlogs").result_map("blog").ordered(),
    ));
    let value = run(&engine, "selectBlogs", vec![rows()]).unwrap();
    let blogs = objects(&value);
    assert_eq!(blogs.len(), 3);
    assert_eq!(post_ids(&blogs[0]), vec![Value::I64(10)]);
    assert_eq!(post_ids(&blogs[2]), vec![Value::I64(11)]);
    assert!(!blogs[0].ptr_eq(&blogs[2]));
}

#[test]
fn ordered_sink_sees_each_object_once_complete() {
    let engine = engine(schema_with(
        Binding::nested("posts", "post"),
        Statement::new("selectBlogs").result_map("blog").ordered(),
    ));
    let rows = blog_rows()
        .row([Value::I64(1), "A".into(), Value::I64(10), "x".into()])
        .row([Value::I64(1), "A".into(), Value::I64(11), "y".into()])
        .row([Value::I64(2), "B".into(), Value::I64(20), "z".into()]);

    let mut seen = vec![];
    let mut record = sink::from_fn(|value: Value| {
        let blog = value.expect_object().clone();
        seen.push((blog.peek("id"), post_ids(&blog).len()));
        ControlFlow::Continue(())
    });

    let sink: &mut dyn ResultSink = &mut record;
    engine
        .handle_result_sets(
            "selectBlogs",
            &mut MemResults::single(rows),
            RowWindow::default(),
            Some(sink),
        )
        .unwrap();
    drop(record);

    assert_eq!(seen, vec![(Value::I64(1), 2), (Value::I64(2), 1)]);
}

#[test]
fn circular_reference_links_the_ancestor() {
    let schema = models(Schema::builder())
        .result_map(blog_map(Binding::nested("posts", "post")))
        .result_map(post_map().binding(Binding::nested("blog", "blog")))
        .statement(Statement::new("selectBlogs").result_map("blog"))
        .build()
        .unwrap();

    let rows = blog_rows()
        .row([Value::I64(1), "A".into(), Value::I64(10), "x".into()])
        .row([Value::I64(1), "A".into(), Value::I64(11), "y".into()]);

    let engine = engine(schema);
    let value = run(&engine, "selectBlogs", vec![rows]).unwrap();
    let blog = &objects(&value)[0];
    let posts = objects(&blog.peek("posts"));

    assert_eq!(posts.len(), 2);
    for post in &posts {
        assert!(post.peek("blog").expect_object().ptr_eq(blog));
    }
}

#[test]
fn not_null_columns_gate_the_nested_object() {
    let engine = engine(schema_with(
        Binding::nested("posts", "post").not_null(["post_id"]),
        Statement::new("selectBlogs").result_map("blog"),
    ));
    let rows = blog_rows().row([Value::I64(1), "A".into(), Value::Null, "orphan".into()]);
    let value = run(&engine, "selectBlogs", vec![rows]).unwrap();

    assert_eq!(objects(&value)[0].peek("posts"), Value::List(vec![]));
}

#[test]
fn column_prefix_selects_nested_columns() {
    let schema = models(Schema::builder())
        .result_map(
            ResultMap::new("blog", Type::model("Blog"))
                .binding(Binding::column("id", "id").id())
                .binding(Binding::nested("author", "author").column_prefix("author_")),
        )
        .result_map(
            ResultMap::new("author", Type::model("Author"))
                .binding(Binding::column("id", "id").id())
                .binding(Binding::column("name", "name")),
        )
        .statement(Statement::new("selectBlogs").result_map("blog"))
        .build()
        .unwrap();

    let engine = engine(schema);

    let rows = MemResultSet::new([
        ("id", Type::I64),
        ("author_id", Type::I64),
        ("author_name", Type::String),
    ])
    .row([Value::I64(1), Value::I64(5), "Ann".into()]);
    let value = run(&engine, "selectBlogs", vec![rows]).unwrap();
    let author = objects(&value)[0].peek("author");
    assert_eq!(author.expect_object().peek("id"), Value::I64(5));
    assert_eq!(author.expect_object().peek("name"), Value::from("Ann"));

    // No column carries the prefix, so there is no author
    let rows = MemResultSet::new([("id", Type::I64)]).row([Value::I64(1)]);
    let value = run(&engine, "selectBlogs", vec![rows]).unwrap();
    assert_eq!(objects(&value)[0].peek("author"), Value::Null);
}

#[test]
fn row_window_rejected_for_nested_result_maps() {
    let rows = || blog_rows().row([Value::I64(1), "A".into(), Value::I64(10), "x".into()]);

    let engine = engine(schema());
    let err = run_window(&engine, "selectBlogs", vec![rows()], RowWindow::limit(1)).unwrap_err();
    assert!(err.is_unsafe_row_window());

    let config = Config {
        safe_row_bounds_enabled: false,
        ..Config::default()
    };
    let engine = engine_with(schema(), config);
    let value = run_window(&engine, "selectBlogs", vec![rows()], RowWindow::limit(1)).unwrap();
    assert_eq!(objects(&value).len(), 1);
}

#[test]
fn custom_sink_requires_ordered_rows() {
    let engine = engine(schema());
    let rows = blog_rows().row([Value::I64(1), "A".into(), Value::I64(10), "x".into()]);
    let mut collected: Vec<Value> = vec![];
    let sink: &mut dyn ResultSink = &mut collected;

    let err = engine
        .handle_result_sets(
            "selectBlogs",
            &mut MemResults::single(rows),
            RowWindow::default(),
            Some(sink),
        )
        .unwrap_err();

    assert!(err.is_unsafe_custom_sink());
    assert!(collected.is_empty());
}

#[test]
fn nested_failure_names_the_property() {
    let schema = models(Schema::builder())
        .result_map(blog_map(Binding::nested("posts", "post")))
        .result_map(
            ResultMap::new("post", Type::model("Post"))
                .binding(Binding::column("id", "post_id").id().converter("missing")),
        )
        .statement(Statement::new("selectBlogs").result_map("blog"))
        .build()
        .unwrap();

    let engine = engine(schema);
    let rows = blog_rows().row([Value::I64(1), "A".into(), Value::I64(10), "x".into()]);
    let err = run(&engine, "selectBlogs", vec![rows]).unwrap_err();

    assert!(err.is_nested_materialization());
    assert!(err.is_conversion_unavailable());
    assert!(err.to_string().contains("`posts`"));
}
