//! Transaction, open/finish/close and evaluator release.

use crate::common::{generate_users_page, users_schema};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema, TimeUnit};
use sf_error::{classify_error, ErrorScope, SfError, TransformError};
use sf_traits::{Evaluator, MemoryOutput, PageOutput};
use sf_transform::{ScriptFilter, TransformConfig};
use sf_types::{ColumnType, GenericRecord};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Counts releases of the evaluator.
struct Tracked {
    releases: Arc<AtomicUsize>,
}

impl Evaluator for Tracked {
    fn invoke(&mut self, record: GenericRecord) -> sf_error::Result<GenericRecord> {
        Ok(record)
    }

    fn name(&self) -> &str {
        "tracked"
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

fn create_tracked_filter() -> (ScriptFilter, MemoryOutput, Arc<AtomicUsize>) {
    let releases = Arc::new(AtomicUsize::new(0));
    let output = MemoryOutput::new();
    let schema = users_schema();
    let filter = ScriptFilter::with_evaluator(
        schema.clone(),
        schema,
        Box::new(Tracked {
            releases: releases.clone(),
        }),
        Box::new(output.clone()),
    );
    (filter, output, releases)
}

#[test]
fn test_success_path_releases_once() {
    let (mut filter, output, releases) = create_tracked_filter();

    filter.add(generate_users_page(4)).unwrap();
    filter.finish().unwrap();
    assert_eq!(releases.load(Ordering::SeqCst), 1);

    filter.close();
    drop(filter);

    assert_eq!(releases.load(Ordering::SeqCst), 1);
    assert!(output.is_finished());
    assert!(output.is_closed());
}

#[test]
fn test_failure_path_releases_once() {
    let (mut filter, output, releases) = create_tracked_filter();

    let bad = Arc::new(
        arrow::record_batch::RecordBatch::try_new(
            Arc::new(ArrowSchema::new(vec![Field::new("id", DataType::Int64, true)])),
            vec![Arc::new(arrow::array::Int64Array::from(vec![1]))],
        )
        .unwrap(),
    );
    assert!(filter.add(bad).is_err());

    filter.close();
    assert_eq!(releases.load(Ordering::SeqCst), 1);
    assert!(!output.is_finished());
    assert!(output.is_closed());

    let err = filter.add(generate_users_page(1)).unwrap_err();
    assert!(matches!(err, SfError::Transform(TransformError::Released)));

    drop(filter);
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_transaction_passes_schema_through() {
    let arrow_schema = ArrowSchema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new(
            "at",
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            true,
        ),
    ]);
    let config = TransformConfig::with_script("record");

    let schema = ScriptFilter::transaction(&config, &arrow_schema).await.unwrap();

    assert_eq!(schema.len(), 2);
    assert_eq!(schema.columns()[0].column_type(), ColumnType::Int64);
    assert_eq!(
        schema.columns()[1].column_type(),
        ColumnType::Timestamp(TimeUnit::Microsecond)
    );
}

#[tokio::test]
async fn test_transaction_rejects_unsupported_column_before_any_page() {
    let arrow_schema = ArrowSchema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("blob", DataType::Binary, true),
    ]);
    let config = TransformConfig::with_script("record");

    let err = ScriptFilter::transaction(&config, &arrow_schema)
        .await
        .unwrap_err();

    match &err {
        SfError::Transform(TransformError::UnsupportedType { column, .. }) => {
            assert_eq!(column, "blob")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(classify_error(&err), ErrorScope::Run);
}

#[tokio::test]
async fn test_transaction_requires_one_script_source() {
    let arrow_schema = users_schema().to_arrow();

    let err = ScriptFilter::transaction(&TransformConfig::default(), &arrow_schema)
        .await
        .unwrap_err();
    assert!(matches!(err, SfError::Config(_)));
}

#[tokio::test]
async fn test_open_from_script_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"record.name = `${record.name}:${record.id}`;\nrecord")
        .unwrap();

    let config = TransformConfig::with_script_file(file.path());
    let schema = ScriptFilter::transaction(&config, &users_schema().to_arrow())
        .await
        .unwrap();

    let output = MemoryOutput::new();
    let mut filter = ScriptFilter::open(&config, schema, Box::new(output.clone()))
        .await
        .unwrap();
    filter.add(generate_users_page(2)).unwrap();
    filter.finish().unwrap();
    filter.close();

    assert_eq!(
        crate::common::strings(&output, 1),
        vec![Some("user0:0".to_string()), Some("user1:1".to_string())]
    );
}

#[tokio::test]
async fn test_parallel_instances_own_their_evaluators() {
    let config = TransformConfig::with_script("record.id = record.id + 1; record");
    let schema = ScriptFilter::transaction(&config, &users_schema().to_arrow())
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let output = MemoryOutput::new();
        let mut filter = ScriptFilter::open(&config, schema.clone(), Box::new(output.clone()))
            .await
            .unwrap();
        handles.push(tokio::task::spawn_blocking(move || {
            filter.add(generate_users_page(25)).unwrap();
            filter.finish().unwrap();
            filter.close();
            output
        }));
    }

    for handle in handles {
        let output = handle.await.unwrap();
        assert_eq!(output.num_rows(), 25);
        assert_eq!(crate::common::ints(&output, 0)[0], Some(1));
    }
}
