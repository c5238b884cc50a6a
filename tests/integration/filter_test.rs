//! Page-level behaviour of the script filter.

use crate::common::{create_filter, generate_users_page, ints, strings, users_page, users_schema};
use arrow::array::{Array, BooleanArray, Float64Array};
use arrow::record_batch::RecordBatch;
use sf_error::{classify_error, ErrorScope, SfError, TransformError};
use sf_traits::{FnEvaluator, MemoryOutput, PageOutput};
use sf_transform::ScriptFilter;
use sf_types::{Schema, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_appends_to_name_in_order() {
    let schema = users_schema();
    let (mut filter, output) =
        create_filter(&schema, r#"record["name"] = record["name"] + "!"; record"#);

    filter
        .add(users_page(&[(1, Some("a")), (2, Some("b"))]))
        .unwrap();

    assert_eq!(ints(&output, 0), vec![Some(1), Some(2)]);
    assert_eq!(
        strings(&output, 1),
        vec![Some("a!".to_string()), Some("b!".to_string())]
    );
}

#[test]
fn test_identity_preserves_every_record() {
    let schema = users_schema();
    let (mut filter, output) = create_filter(&schema, "record");

    let pages = [generate_users_page(100), generate_users_page(37)];
    for page in &pages {
        filter.add(page.clone()).unwrap();
    }

    let received = output.pages();
    assert_eq!(received.len(), 2);
    for (sent, got) in pages.iter().zip(&received) {
        assert_eq!(sent.num_rows(), got.num_rows());
        for column in 0..sent.num_columns() {
            assert_eq!(sent.column(column).as_ref(), got.column(column).as_ref());
        }
    }
}

#[test]
fn test_identity_keeps_nulls() {
    let schema = users_schema();
    let (mut filter, output) = create_filter(&schema, "record");

    filter.add(users_page(&[(1, None), (2, Some("b"))])).unwrap();

    assert_eq!(strings(&output, 1), vec![None, Some("b".to_string())]);
}

#[test]
fn test_omitted_column_is_null() {
    let schema = users_schema();
    let (mut filter, output) = create_filter(&schema, "#{ id: record.id }");

    filter.add(generate_users_page(10)).unwrap();

    assert_eq!(output.num_rows(), 10);
    assert!(strings(&output, 1).iter().all(Option::is_none));
    assert_eq!(ints(&output, 0)[9], Some(9));
}

#[test]
fn test_bool_into_numeric_column_fails() {
    let schema = users_schema();
    let (mut filter, output) = create_filter(&schema, "record.id = true; record");

    let err = filter.add(generate_users_page(3)).unwrap_err();

    match &err {
        SfError::Transform(TransformError::TypeMismatch {
            column,
            expected,
            actual,
        }) => {
            assert_eq!(column, "id");
            assert_eq!(expected, "int64");
            assert_eq!(actual, "bool");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(classify_error(&err), ErrorScope::Batch);
    assert!(output.pages().is_empty());
}

#[test]
fn test_throwing_script_fails_batch_with_message() {
    let schema = users_schema();
    let (mut filter, output) = create_filter(&schema, r#"throw "broken pipeline step";"#);

    let err = filter.add(generate_users_page(5)).unwrap_err();

    match &err {
        SfError::Transform(TransformError::UserCode(msg)) => {
            assert!(msg.contains("broken pipeline step"), "message: {msg}")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(output.pages().is_empty());
    assert_eq!(filter.stats().records_in, 1);
}

#[test]
fn test_failure_at_first_invocation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let evaluator = FnEvaluator::new(move |_record| {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(TransformError::UserCode("raised".to_string()).into())
    })
    .with_name("always-fails");

    let output = MemoryOutput::new();
    let schema = users_schema();
    let mut filter = ScriptFilter::with_evaluator(
        schema.clone(),
        schema,
        Box::new(evaluator),
        Box::new(output.clone()),
    );

    assert!(filter.add(generate_users_page(50)).is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(output.num_rows(), 0);
}

#[test]
fn test_failed_page_does_not_poison_next_page() {
    let schema = users_schema();
    let (mut filter, output) = create_filter(
        &schema,
        r#"
        if record.name == "bad" {
            throw "bad name";
        }
        record
        "#,
    );

    assert!(filter
        .add(users_page(&[(1, Some("ok")), (2, Some("bad"))]))
        .is_err());
    filter.add(users_page(&[(3, Some("fine"))])).unwrap();

    assert_eq!(ints(&output, 0), vec![Some(3)]);
    let stats = filter.stats();
    assert_eq!(stats.pages_in, 2);
    assert_eq!(stats.pages_out, 1);
    assert_eq!(stats.records_out, 1);
}

#[test]
fn test_numeric_coercion() {
    let schema = Arc::new(Schema::parse("count:long,ratio:double,flag:bool").unwrap());
    let (mut filter, output) = create_filter(
        &schema,
        "record.count = -3.7; record.ratio = 2; record.flag = record.count == 0; record",
    );

    let page = Arc::new(
        RecordBatch::try_new(
            schema.to_arrow(),
            vec![
                Arc::new(arrow::array::Int64Array::from(vec![0])),
                Arc::new(Float64Array::from(vec![0.0])),
                Arc::new(BooleanArray::from(vec![false])),
            ],
        )
        .unwrap(),
    );
    filter.add(page).unwrap();

    let pages = output.pages();
    let out = &pages[0];
    assert_eq!(ints(&output, 0), vec![Some(-3)]);
    let ratio = out.column(1).as_any().downcast_ref::<Float64Array>().unwrap();
    assert_eq!(ratio.value(0), 2.0);
    let flag = out.column(2).as_any().downcast_ref::<BooleanArray>().unwrap();
    assert!(!flag.value(0));
}

#[test]
fn test_non_string_into_string_column() {
    let schema = users_schema();
    let (mut filter, output) = create_filter(&schema, "record.name = record.id * 2; record");

    filter.add(users_page(&[(21, Some("x"))])).unwrap();

    assert_eq!(strings(&output, 1), vec![Some("42".to_string())]);
}

#[test]
fn test_nested_value_into_string_column_fails() {
    let schema = users_schema();
    let (mut filter, _output) = create_filter(&schema, "record.name = [1, 2]; record");

    let err = filter.add(users_page(&[(1, Some("x"))])).unwrap_err();
    assert!(matches!(
        err,
        SfError::Transform(TransformError::TypeMismatch { ref column, .. }) if column == "name"
    ));
}

#[test]
fn test_non_map_result_fails() {
    let schema = users_schema();
    let (mut filter, _output) = create_filter(&schema, "record.name");

    let err = filter.add(users_page(&[(1, Some("x"))])).unwrap_err();
    assert!(matches!(err, SfError::Transform(TransformError::UserCode(_))));
}

#[test]
fn test_evaluator_sees_generic_record() {
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    let evaluator = FnEvaluator::new(move |record| {
        sink.lock().unwrap().push(record.clone());
        Ok(record)
    });

    let schema = users_schema();
    let mut filter = ScriptFilter::with_evaluator(
        schema.clone(),
        schema,
        Box::new(evaluator),
        Box::new(MemoryOutput::new()),
    );
    filter.add(users_page(&[(7, None)])).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let keys: Vec<&str> = seen[0].keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["id", "name"]);
    assert_eq!(seen[0].get("id"), Some(&Value::Int(7)));
    assert_eq!(seen[0].get("name"), Some(&Value::Null));
}
