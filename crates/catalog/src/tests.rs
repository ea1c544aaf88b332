use super::*;

fn ab_schema() -> Schema {
    Schema::new(
        vec![
            Attribute::new("a", DataType::Int),
            Attribute::new("b", DataType::String(4)),
        ],
        vec![0],
    )
}

#[test]
fn record_width_matches_spec_formula() {
    // 1 (sentinel) + 4 (int) + 4 (string) + 1 (delimiter) = 10
    assert_eq!(ab_schema().record_width(), 10);
}

#[test]
fn record_round_trip_matches_literal_bytes() {
    let schema = ab_schema();
    let mut record = vec![0u8; schema.record_width()];
    schema.set_attr(&mut record, 0, &Value::Int(7)).unwrap();
    schema
        .set_attr(&mut record, 1, &Value::String("hi".into()))
        .unwrap();

    assert_eq!(&record, b"|0007,hi  ");
    assert_eq!(schema.get_attr(&record, 0).unwrap(), Value::Int(7));
    assert_eq!(
        schema.get_attr(&record, 1).unwrap(),
        Value::String("hi".into())
    );
}

#[test]
fn serialize_then_deserialize_round_trips() {
    let schema = Schema::new(
        vec![
            Attribute::new("id", DataType::Int),
            Attribute::new("name", DataType::String(10)),
            Attribute::new("active", DataType::Bool),
        ],
        vec![0],
    );
    let text = schema.serialize();
    assert_eq!(
        text,
        "Schema with <3> attributes (id: INT, name: STRING[10], active: BOOL) with keys: (id)"
    );
    let parsed = Schema::deserialize(&text).unwrap();
    assert_eq!(parsed, schema);
}

#[test]
fn schema_with_no_keys_round_trips() {
    let schema = Schema::new(vec![Attribute::new("x", DataType::Float)], vec![]);
    let text = schema.serialize();
    assert_eq!(
        text,
        "Schema with <1> attributes (x: FLOAT) with keys: ()"
    );
    let parsed = Schema::deserialize(&text).unwrap();
    assert_eq!(parsed, schema);
}

#[test]
fn deserialize_rejects_malformed_type_tag() {
    let text = "Schema with <1> attributes (x: WEIRD) with keys: ()";
    let err = Schema::deserialize(text).unwrap_err();
    assert!(matches!(err, DbError::UnknownDataType(_)));
}

#[test]
fn deserialize_rejects_missing_delimiters() {
    let text = "not a schema at all";
    let err = Schema::deserialize(text).unwrap_err();
    assert!(matches!(err, DbError::SchemaDeserializationError(_)));
}

#[test]
fn set_attr_writes_comma_delimiter_for_non_first_attribute() {
    let schema = ab_schema();
    let mut record = vec![b'X'; schema.record_width()];
    schema
        .set_attr(&mut record, 1, &Value::String("ok".into()))
        .unwrap();
    assert_eq!(record[4], b',');
}

#[test]
fn get_attr_out_of_range_is_null_param() {
    let schema = ab_schema();
    let record = vec![0u8; schema.record_width()];
    let err = schema.get_attr(&record, 5).unwrap_err();
    assert!(matches!(err, DbError::NullParam(_)));
}

#[test]
fn bool_round_trips_as_single_byte() {
    let schema = Schema::new(vec![Attribute::new("flag", DataType::Bool)], vec![]);
    let mut record = vec![0u8; schema.record_width()];
    schema.set_attr(&mut record, 0, &Value::Bool(true)).unwrap();
    assert_eq!(&record, b"|1");
    assert_eq!(schema.get_attr(&record, 0).unwrap(), Value::Bool(true));
}

#[test]
fn string_longer_than_declared_width_is_truncated() {
    let schema = Schema::new(vec![Attribute::new("s", DataType::String(3))], vec![]);
    let mut record = vec![0u8; schema.record_width()];
    schema
        .set_attr(&mut record, 0, &Value::String("abcdef".into()))
        .unwrap();
    assert_eq!(schema.get_attr(&record, 0).unwrap(), Value::String("abc".into()));
}
