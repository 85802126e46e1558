use pretty_assertions::assert_eq;
use rowmap_core::stmt::{Object, Type, Value};

// ---------------------------------------------------------------------------
// Null
// ---------------------------------------------------------------------------

#[test]
fn null_passes_through_every_type() {
    for ty in [Type::Bool, Type::I16, Type::String, Type::model("Author"), Type::Map] {
        assert_eq!(ty.cast(Value::Null).unwrap(), Value::Null);
    }
}

// ---------------------------------------------------------------------------
// Integers
// ---------------------------------------------------------------------------

#[test]
fn cast_i16_to_i64() {
    assert_eq!(Type::I64.cast(Value::I16(-3)).unwrap(), Value::I64(-3));
}

#[test]
fn cast_i64_to_i32_in_range() {
    assert_eq!(Type::I32.cast(Value::I64(42)).unwrap(), Value::I32(42));
}

#[test]
fn cast_i64_to_i16_out_of_range() {
    let err = Type::I16.cast(Value::I64(100_000)).unwrap_err();
    assert!(err.is_type_conversion());
}

#[test]
fn cast_string_to_integer() {
    assert_eq!(Type::I32.cast(Value::from(" 17 ")).unwrap(), Value::I32(17));
    assert!(Type::I32.cast(Value::from("seventeen")).is_err());
}

// ---------------------------------------------------------------------------
// Other scalars
// ---------------------------------------------------------------------------

#[test]
fn cast_to_bool() {
    assert_eq!(Type::Bool.cast(Value::I32(1)).unwrap(), Value::Bool(true));
    assert_eq!(Type::Bool.cast(Value::from("f")).unwrap(), Value::Bool(false));
    assert!(Type::Bool.cast(Value::I32(2)).unwrap_err().is_type_conversion());
}

#[test]
fn cast_to_f64() {
    assert_eq!(Type::F64.cast(Value::I64(2)).unwrap(), Value::F64(2.0));
    assert_eq!(Type::F64.cast(Value::from("1.5")).unwrap(), Value::F64(1.5));
}

#[test]
fn cast_scalars_to_string() {
    assert_eq!(Type::String.cast(Value::I64(7)).unwrap(), Value::from("7"));
    assert_eq!(Type::String.cast(Value::Bool(true)).unwrap(), Value::from("true"));
    assert!(Type::String.cast(Value::List(vec![])).is_err());
}

#[test]
fn cast_string_to_bytes() {
    assert_eq!(
        Type::Bytes.cast(Value::from("ab")).unwrap(),
        Value::Bytes(b"ab".to_vec())
    );
}

// ---------------------------------------------------------------------------
// Lists and objects
// ---------------------------------------------------------------------------

#[test]
fn cast_list_items() {
    assert_eq!(
        Type::list(Type::I64)
            .cast(Value::List(vec![Value::I32(1), Value::Null]))
            .unwrap(),
        Value::List(vec![Value::I64(1), Value::Null])
    );
}

#[test]
fn objects_pass_as_models_and_maps() {
    let author = Value::from(Object::new("Author"));
    assert_eq!(Type::model("Author").cast(author.clone()).unwrap(), author);
    assert_eq!(Type::Map.cast(author.clone()).unwrap(), author);
    assert!(Type::I64.cast(author).is_err());
}

#[test]
fn unknown_accepts_anything() {
    assert_eq!(Type::Unknown.cast(Value::I16(1)).unwrap(), Value::I16(1));
}

// ---------------------------------------------------------------------------
// Zero values and rendering
// ---------------------------------------------------------------------------

#[test]
fn zero_values() {
    assert_eq!(Type::I32.zero(), Value::I32(0));
    assert_eq!(Type::String.zero(), Value::from(""));
    assert_eq!(Type::list(Type::I64).zero(), Value::List(vec![]));
    assert_eq!(Type::model("Author").zero(), Value::Null);
}

#[test]
fn key_strings() {
    assert_eq!(Value::Null.to_key_string(), None);
    assert_eq!(Value::I16(3).to_key_string().as_deref(), Some("3"));
    assert_eq!(
        Value::List(vec![Value::from("a"), Value::Null])
            .to_key_string()
            .as_deref(),
        Some("[a, null]")
    );
}

#[test]
fn is_a() {
    assert!(Value::I32(1).is_a(&Type::I32));
    assert!(!Value::I32(1).is_a(&Type::I64));
    assert!(Value::Null.is_a(&Type::String));
    assert!(Value::from(Object::map()).is_a(&Type::Map));
    assert!(!Value::from(Object::new("Author")).is_a(&Type::model("Book")));
}
