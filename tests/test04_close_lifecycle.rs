use sql_relay::prelude::*;
use sql_relay::test_utils::{ScriptedDriver, ScriptedResultSet};

fn config() -> ConnectionConfig {
    ConnectionConfig::new("Driver={Scripted};Server=test;")
}

#[tokio::test]
async fn queries_after_close_never_reach_the_driver() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedDriver::new();
    let log = driver.log();

    let conn = Connection::open(driver, &config()).await?;
    conn.close().await?;
    assert!(conn.is_closed());

    let err = conn
        .query_raw("SELECT 1", &[])
        .collect_results()
        .await
        .unwrap_err();
    assert!(matches!(err, SqlRelayError::ConnectionClosed));

    let log = log.lock().unwrap().clone();
    assert!(log.iter().all(|entry| !entry.starts_with("execute:")));
    assert_eq!(log.last().map(String::as_str), Some("close"));
    Ok(())
}

#[tokio::test]
async fn transaction_control_after_close_fails() -> Result<(), Box<dyn std::error::Error>> {
    let conn = Connection::open(ScriptedDriver::new(), &config()).await?;
    conn.close().await?;

    assert!(matches!(
        conn.begin_transaction().await.unwrap_err(),
        SqlRelayError::ConnectionClosed
    ));
    assert!(matches!(
        conn.commit().await.unwrap_err(),
        SqlRelayError::ConnectionClosed
    ));
    assert!(matches!(
        conn.rollback().await.unwrap_err(),
        SqlRelayError::ConnectionClosed
    ));
    Ok(())
}

#[tokio::test]
async fn close_is_queued_behind_earlier_operations() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedDriver::new().expect_any_query(vec![ScriptedResultSet::rows(
        &["n"],
        vec![vec![SqlValue::Int(1)]],
    )]);
    let log = driver.log();

    let conn = Connection::open(driver, &config()).await?;
    let pending = conn.query_raw("SELECT n FROM t", &[]);
    conn.close().await?;

    // The earlier query still ran to completion before the handle closed.
    let packages = pending.collect_results().await?;
    assert_eq!(packages[0].rows, vec![vec![SqlValue::Int(1)]]);

    let log = log.lock().unwrap().clone();
    let drained = log.iter().position(|e| e == "end_of_results").unwrap();
    let closed = log.iter().position(|e| e == "close").unwrap();
    assert!(drained < closed);
    Ok(())
}

#[tokio::test]
async fn dropping_every_handle_releases_the_driver() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedDriver::new();
    let log = driver.log();

    let conn = Connection::open(driver, &config()).await?;
    drop(conn);

    // The worker notices the abandoned queue and closes on its own.
    for _ in 0..100 {
        tokio::task::yield_now().await;
        if log.lock().unwrap().last().map(String::as_str) == Some("close") {
            return Ok(());
        }
    }
    panic!("driver handle was never released");
}

#[tokio::test]
async fn double_close_fails_cleanly() -> Result<(), Box<dyn std::error::Error>> {
    let conn = Connection::open(ScriptedDriver::new(), &config()).await?;
    conn.close().await?;
    assert!(matches!(
        conn.close().await.unwrap_err(),
        SqlRelayError::ConnectionClosed
    ));
    Ok(())
}

#[tokio::test]
async fn clones_share_the_closed_state() -> Result<(), Box<dyn std::error::Error>> {
    let conn = Connection::open(ScriptedDriver::new(), &config()).await?;
    let other = conn.clone();
    conn.close().await?;
    assert!(other.is_closed());
    assert!(matches!(
        other.begin_transaction().await.unwrap_err(),
        SqlRelayError::ConnectionClosed
    ));
    Ok(())
}
