//! Type fidelity across the scripting boundary, one column type at a time.

use crate::common::create_filter;
use arrow::array::{
    Array, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
    TimestampMillisecondArray,
};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema, TimeUnit};
use arrow::record_batch::RecordBatch;
use sf_traits::PageOutput;
use sf_types::Schema;
use std::sync::Arc;

fn run_identity(schema: &Arc<Schema>, page: RecordBatch) -> RecordBatch {
    let (mut filter, output) = create_filter(schema, "record");
    filter.add(Arc::new(page)).unwrap();
    output.pages()[0].as_ref().clone()
}

#[test]
fn test_all_types_survive_identity() {
    let schema = Arc::new(
        Schema::parse("s:string,i:long,f:double,b:bool,t:timestamp").unwrap(),
    );
    let page = RecordBatch::try_new(
        schema.to_arrow(),
        vec![
            Arc::new(StringArray::from(vec![Some("héllo"), Some(""), None])),
            Arc::new(Int64Array::from(vec![Some(i64::MIN), Some(i64::MAX), None])),
            Arc::new(Float64Array::from(vec![Some(-0.25), Some(1e300), None])),
            Arc::new(BooleanArray::from(vec![Some(true), Some(false), None])),
            Arc::new(TimestampMillisecondArray::from(vec![
                Some(-86_400_001),
                Some(1_700_000_000_123),
                None,
            ])),
        ],
    )
    .unwrap();

    let out = run_identity(&schema, page.clone());

    assert_eq!(out.num_rows(), 3);
    for column in 0..page.num_columns() {
        assert_eq!(
            page.column(column).as_ref(),
            out.column(column).as_ref(),
            "column {column}"
        );
    }
}

#[test]
fn test_all_nulls_survive_identity() {
    let schema = Arc::new(
        Schema::parse("s:string,i:long,f:double,b:bool,t:timestamp").unwrap(),
    );
    let page = RecordBatch::try_new(
        schema.to_arrow(),
        vec![
            Arc::new(StringArray::from(vec![None::<&str>; 2])),
            Arc::new(Int64Array::from(vec![None::<i64>; 2])),
            Arc::new(Float64Array::from(vec![None::<f64>; 2])),
            Arc::new(BooleanArray::from(vec![None::<bool>; 2])),
            Arc::new(TimestampMillisecondArray::from(vec![None::<i64>; 2])),
        ],
    )
    .unwrap();

    let out = run_identity(&schema, page);

    for column in 0..out.num_columns() {
        assert_eq!(out.column(column).null_count(), 2, "column {column}");
    }
}

#[test]
fn test_timestamp_truncates_to_milliseconds() {
    let schema = Arc::new(Schema::parse("t:timestamp[us]").unwrap());
    let page = RecordBatch::try_new(
        schema.to_arrow(),
        vec![Arc::new(TimestampMicrosecondArray::from(vec![
            1_500_750, -1, 2_000_000,
        ]))],
    )
    .unwrap();

    let out = run_identity(&schema, page);
    let values = out
        .column(0)
        .as_any()
        .downcast_ref::<TimestampMicrosecondArray>()
        .unwrap();

    // sub-millisecond digits are dropped, negatives floor
    assert_eq!(values.value(0), 1_500_000);
    assert_eq!(values.value(1), -1_000);
    assert_eq!(values.value(2), 2_000_000);
}

#[test]
fn test_script_sees_timestamp_as_epoch_millis() {
    let schema = Arc::new(Schema::parse("t:timestamp,day:string").unwrap());
    let (mut filter, output) = create_filter(
        &schema,
        r#"record.day = format_ts(record.t, "%Y-%m-%d"); record.t += 1000; record"#,
    );

    let page = RecordBatch::try_new(
        schema.to_arrow(),
        vec![
            Arc::new(TimestampMillisecondArray::from(vec![86_400_000])),
            Arc::new(StringArray::from(vec![None::<&str>])),
        ],
    )
    .unwrap();
    filter.add(Arc::new(page)).unwrap();

    let pages = output.pages();
    let out = &pages[0];
    let t = out
        .column(0)
        .as_any()
        .downcast_ref::<TimestampMillisecondArray>()
        .unwrap();
    let day = out.column(1).as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(t.value(0), 86_401_000);
    assert_eq!(day.value(0), "1970-01-02");
}

#[test]
fn test_timestamp_timezone_survives_identity() {
    let arrow = ArrowSchema::new(vec![
        Field::new("id", DataType::Int64, true),
        Field::new(
            "at",
            DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
            true,
        ),
    ]);
    let schema = Arc::new(Schema::try_from_arrow(&arrow).unwrap());
    let page = RecordBatch::try_new(
        Arc::new(arrow),
        vec![
            Arc::new(Int64Array::from(vec![1, 2])),
            Arc::new(
                TimestampMillisecondArray::from(vec![Some(1_700_000_000_123), None])
                    .with_timezone("UTC"),
            ),
        ],
    )
    .unwrap();

    let out = run_identity(&schema, page.clone());

    assert_eq!(out.schema(), page.schema());
    assert_eq!(page.column(1).data_type(), out.column(1).data_type());
    assert_eq!(page.column(1).as_ref(), out.column(1).as_ref());
}
