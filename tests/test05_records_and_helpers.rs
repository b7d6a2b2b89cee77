use sql_relay::prelude::*;
use sql_relay::test_utils::{ScriptedDriver, ScriptedResultSet};

fn config() -> ConnectionConfig {
    ConnectionConfig::new("Driver={Scripted};Server=test;")
}

/// `SELECT 1 as X, 'ABC', 0x0123` produces one named and two anonymous columns.
fn anonymous_columns() -> Vec<ScriptedResultSet> {
    let meta = vec![
        ColumnMeta::new("X", ColumnType::Number),
        ColumnMeta::new("", ColumnType::Text),
        ColumnMeta::new("", ColumnType::Binary),
    ];
    vec![ScriptedResultSet::with_meta(
        meta,
        vec![vec![
            vec![SqlValue::Int(1)],
            vec![SqlValue::Text("ABC".into())],
            vec![SqlValue::Blob(vec![0x01, 0x23])],
        ]],
    )]
}

#[tokio::test]
async fn query_objectifies_anonymous_columns() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedDriver::new().expect_any_query(anonymous_columns());

    let conn = Connection::open(driver, &config()).await?;
    let sets = conn
        .query("SELECT 1 as X, 'ABC', 0x0123", &[])
        .collect_records()
        .await?;
    conn.close().await?;

    assert_eq!(sets.len(), 1);
    assert_eq!(*sets[0].column_names, vec!["X", "Column1", "Column2"]);

    let record = &sets[0].records[0];
    assert_eq!(record.get("X"), Some(&SqlValue::Int(1)));
    assert_eq!(record.get("Column1"), Some(&SqlValue::Text("ABC".into())));
    assert_eq!(record.get("Column2"), Some(&SqlValue::Blob(vec![0x01, 0x23])));
    Ok(())
}

#[tokio::test]
async fn records_expose_typed_values() -> Result<(), Box<dyn std::error::Error>> {
    // The driver reads bit columns as 0/1 numbers and datetimes as text.
    let driver = ScriptedDriver::new().expect_any_query(vec![ScriptedResultSet::rows(
        &["id", "name", "active", "created"],
        vec![vec![
            SqlValue::Int(7),
            SqlValue::Text("widget".into()),
            SqlValue::Int(1),
            SqlValue::Text("2014-03-01 12:30:45.007".into()),
        ]],
    )]);

    let conn = Connection::open(driver, &config()).await?;
    let sets = conn
        .query("SELECT id, name, active, created FROM t", &[])
        .collect_records()
        .await?;
    conn.close().await?;

    let record = &sets[0].records[0];
    assert_eq!(record.get("id").and_then(SqlValue::as_int), Some(7));
    assert_eq!(record.get("name").and_then(SqlValue::as_text), Some("widget"));
    assert_eq!(record.get("active").and_then(SqlValue::as_bool), Some(true));
    let created = record
        .get("created")
        .and_then(SqlValue::as_timestamp)
        .unwrap();
    assert_eq!(created.to_string(), "2014-03-01 12:30:45.007");
    Ok(())
}

#[tokio::test]
async fn record_streams_preserve_more_chaining() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedDriver::new().expect_any_query(vec![
        ScriptedResultSet::rowcount(2),
        ScriptedResultSet::rows(&["v"], vec![vec![SqlValue::Int(5)]]),
    ]);

    let conn = Connection::open(driver, &config()).await?;
    let mut records = conn.query("INSERT ...; SELECT v FROM t", &[]);

    let first = records.next_records().await.unwrap()?;
    assert_eq!(first.rows_affected, Some(2));
    assert!(first.records.is_empty());
    assert!(first.more);

    let second = records.next_records().await.unwrap()?;
    assert_eq!(second.records[0].get("v"), Some(&SqlValue::Int(5)));
    assert!(!second.more);

    assert!(records.next_records().await.is_none());
    conn.close().await?;
    Ok(())
}

#[tokio::test]
async fn one_shot_query_opens_and_closes() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedDriver::new().expect_any_query(anonymous_columns());
    let log = driver.log();

    let sets = sql_relay::query(driver, &config(), "SELECT 1 as X, 'ABC', 0x0123", &[]).await?;
    assert_eq!(*sets[0].column_names, vec!["X", "Column1", "Column2"]);

    let log = log.lock().unwrap().clone();
    assert!(log[0].starts_with("open:"));
    assert_eq!(log.last().map(String::as_str), Some("close"));
    Ok(())
}

#[tokio::test]
async fn one_shot_query_raw_closes_after_failure() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedDriver::new()
        .expect_failure("SELECT broken", DriverError::new("syntax error"));
    let log = driver.log();

    let err = sql_relay::query_raw(driver, &config(), "SELECT broken", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlRelayError::Driver(_)));

    // The throwaway connection is still released.
    let log = log.lock().unwrap().clone();
    assert_eq!(log.last().map(String::as_str), Some("close"));
    Ok(())
}

#[tokio::test]
async fn invalid_parameters_surface_through_the_stream()
-> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedDriver::new();
    let log = driver.log();

    let conn = Connection::open(driver, &config()).await?;
    let err = conn
        .query_raw("SELECT ?", &[SqlValue::Json(serde_json::json!([1, 2]))])
        .collect_results()
        .await
        .unwrap_err();
    assert!(matches!(err, SqlRelayError::InvalidParameterType(_)));

    // Inlining failed before submission; the driver never saw a query.
    let log_entries = log.lock().unwrap().clone();
    assert!(log_entries.iter().all(|e| !e.starts_with("execute:")));

    conn.close().await?;
    Ok(())
}
