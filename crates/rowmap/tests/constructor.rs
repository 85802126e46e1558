mod support;

use pretty_assertions::assert_eq;
use rowmap::{
    driver::mem::MemResultSet,
    schema::{
        app::{Constructor, Field, Model},
        mapping::{AutoMapping, Binding, ResultMap},
        Statement,
    },
    stmt::{Type, Value},
    Config, Schema,
};
use support::*;

fn author() -> Model {
    Model::new("Author")
        .field(Field::new("id", Type::I64))
        .field(Field::nullable("name", Type::String))
        .constructor(Constructor::new([("id", Type::I64)]))
}

#[test]
fn constructor_arguments_from_bindings() {
    let schema = Schema::builder()
        .model(author())
        .result_map(
            ResultMap::new("author", Type::model("Author"))
                .binding(Binding::arg("id", Type::I64).id())
                .binding(Binding::column("name", "name")),
        )
        .statement(Statement::new("selectAuthor").result_map("author"))
        .build()
        .unwrap();

    let rows = MemResultSet::new([("id", Type::I64), ("name", Type::String)])
        .row([Value::Null, Value::Null])
        .row([Value::I64(7), Value::Null])
        .row([Value::I64(8), "Eve".into()]);

    let engine = engine(schema);
    let value = run(&engine, "selectAuthor", vec![rows]).unwrap();
    let authors = objects(&value);

    // The row with every argument null produces nothing
    assert_eq!(authors.len(), 2);
    assert_eq!(authors[0].peek("id"), Value::I64(7));
    assert_eq!(authors[0].peek("name"), Value::Null);
    assert_eq!(authors[1].peek("name"), Value::from("Eve"));
}

#[test]
fn all_null_arguments_ignore_empty_row_setting() {
    let schema = Schema::builder()
        .model(author())
        .result_map(
            ResultMap::new("author", Type::model("Author")).binding(Binding::arg("id", Type::I64)),
        )
        .statement(Statement::new("selectAuthor").result_map("author"))
        .build()
        .unwrap();

    let config = Config {
        return_instance_for_empty_row: true,
        ..Config::default()
    };
    let engine = engine_with(schema, config);
    let rows = MemResultSet::new([("id", Type::I64)]).row([Value::Null]);
    let value = run(&engine, "selectAuthor", vec![rows]).unwrap();

    assert_eq!(value, Value::List(vec![]));
}

#[test]
fn argument_types_resolved_from_constructor() {
    let schema = Schema::builder()
        .model(
            Model::new("Point")
                .field(Field::new("x", Type::I32))
                .field(Field::new("y", Type::I32))
                .constructor(Constructor::new([("x", Type::I32), ("y", Type::I32)])),
        )
        .result_map(
            ResultMap::new("point", Type::model("Point"))
                .binding(Binding::arg("px", Type::Unknown))
                .binding(Binding::arg("py", Type::Unknown)),
        )
        .statement(Statement::new("selectPoint").result_map("point"))
        .build()
        .unwrap();

    assert_eq!(
        schema.result_map("point").unwrap().bindings[1].ty,
        Type::I32
    );

    let engine = engine(schema);
    let rows = MemResultSet::new([("px", Type::I64), ("py", Type::I64)]).row([3i64, 4i64]);
    let value = run(&engine, "selectPoint", vec![rows]).unwrap();
    let point = &objects(&value)[0];

    assert_eq!(point.peek("x"), Value::I32(3));
    assert_eq!(point.peek("y"), Value::I32(4));
}

#[test]
fn constructor_inferred_from_column_types() {
    let schema = Schema::builder()
        .model(
            Model::new("Tag")
                .field(Field::new("id", Type::I64))
                .field(Field::nullable("label", Type::String))
                .constructor(Constructor::new([("label", Type::String)]))
                .constructor(Constructor::new([("id", Type::I64), ("label", Type::String)])),
        )
        .result_map(ResultMap::new("tag", Type::model("Tag")))
        .statement(Statement::new("selectTags").result_map("tag"))
        .build()
        .unwrap();

    let engine = engine(schema);
    let rows = MemResultSet::new([("tag_id", Type::I64), ("tag_label", Type::String)])
        .row([Value::I64(1), "rust".into()]);
    let value = run(&engine, "selectTags", vec![rows]).unwrap();
    let tag = &objects(&value)[0];

    // Columns feed parameters by position, whatever their labels
    assert_eq!(tag.peek("id"), Value::I64(1));
    assert_eq!(tag.peek("label"), Value::from("rust"));
}

#[test]
fn marked_constructor_preferred() {
    let schema = Schema::builder()
        .model(
            Model::new("Tag")
                .field(Field::new("id", Type::I64))
                .field(Field::nullable("label", Type::String))
                .constructor(Constructor::new([("id", Type::I64), ("label", Type::String)]))
                .constructor(Constructor::new([("label", Type::String)]).auto_map()),
        )
        .result_map(ResultMap::new("tag", Type::model("Tag")))
        .statement(Statement::new("selectTags").result_map("tag"))
        .build()
        .unwrap();

    let engine = engine(schema);
    let rows = MemResultSet::new([("label", Type::String), ("extra", Type::I64)])
        .row([Value::from("rust"), Value::I64(9)]);
    let value = run(&engine, "selectTags", vec![rows]).unwrap();
    let tag = &objects(&value)[0];

    assert_eq!(tag.peek("label"), Value::from("rust"));
    assert_eq!(tag.peek("id"), Value::I64(0));
}

#[test]
fn no_matching_constructor() {
    let schema = Schema::builder()
        .model(
            Model::new("Tag")
                .field(Field::new("id", Type::I64))
                .constructor(Constructor::new([("id", Type::I64)])),
        )
        .result_map(ResultMap::new("tag", Type::model("Tag")))
        .statement(Statement::new("selectTags").result_map("tag"))
        .build()
        .unwrap();

    let engine = engine(schema);
    let rows = MemResultSet::new([("id", Type::String)]).row(["1"]);
    let err = run(&engine, "selectTags", vec![rows]).unwrap_err();

    assert!(err.is_no_viable_constructor());
    assert!(err.to_string().contains("[String]"));
}

#[test]
fn no_constructor_without_automatic_mapping() {
    let schema = Schema::builder()
        .model(
            Model::new("Tag")
                .field(Field::new("id", Type::I64))
                .constructor(Constructor::new([("id", Type::I64)])),
        )
        .result_map(ResultMap::new("tag", Type::model("Tag")).auto_mapping(AutoMapping::None))
        .statement(Statement::new("selectTags").result_map("tag"))
        .build()
        .unwrap();

    let engine = engine(schema);
    let rows = MemResultSet::new([("id", Type::I64)]).row([1i64]);
    let err = run(&engine, "selectTags", vec![rows]).unwrap_err();

    assert!(err.is_no_viable_constructor());
}

#[test]
fn nested_result_map_as_argument() {
    let schema = Schema::builder()
        .model(Model::new("Author").field(Field::nullable("name", Type::String)))
        .model(
            Model::new("Post")
                .field(Field::nullable("title", Type::String))
                .field(Field::nullable("author", Type::model("Author")))
                .constructor(Constructor::new([("author", Type::model("Author"))])),
        )
        .result_map(
            ResultMap::new("author", Type::model("Author"))
                .binding(Binding::column("name", "name")),
        )
        .result_map(
            ResultMap::new("post", Type::model("Post"))
                .binding(
                    Binding::nested("author", "author")
                        .constructor()
                        .column_prefix("author_"),
                )
                .binding(Binding::column("title", "title")),
        )
        .statement(Statement::new("selectPosts").result_map("post"))
        .build()
        .unwrap();

    let engine = engine(schema);
    let rows = MemResultSet::new([("title", Type::String), ("author_name", Type::String)])
        .row(["Hello", "Ann"]);
    let value = run(&engine, "selectPosts", vec![rows]).unwrap();
    let post = &objects(&value)[0];

    assert_eq!(post.peek("title"), Value::from("Hello"));
    assert_eq!(
        post.peek("author").expect_object().peek("name"),
        Value::from("Ann")
    );
}

#[test]
fn failing_argument_names_the_argument() {
    let schema = Schema::builder()
        .model(author())
        .result_map(
            ResultMap::new("author", Type::model("Author"))
                .binding(Binding::arg("id", Type::I64).converter("missing")),
        )
        .statement(Statement::new("selectAuthor").result_map("author"))
        .build()
        .unwrap();

    let engine = engine(schema);
    let rows = MemResultSet::new([("id", Type::I64)]).row([1i64]);
    let err = run(&engine, "selectAuthor", vec![rows]).unwrap_err();

    assert!(err.is_conversion_unavailable());
    assert!(err.to_string().contains("could not process constructor argument `id`"));
}
