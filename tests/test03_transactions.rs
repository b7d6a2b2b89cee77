use sql_relay::prelude::*;
use sql_relay::test_utils::{ScriptedDriver, ScriptedResultSet};

fn config() -> ConnectionConfig {
    ConnectionConfig::new("Driver={Scripted};Server=test;")
}

#[tokio::test]
async fn commit_scenario_runs_in_submission_order() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedDriver::new()
        .expect_query(
            "INSERT INTO t (v) VALUES ('a')",
            vec![ScriptedResultSet::rowcount(1)],
        )
        .expect_query(
            "INSERT INTO t (v) VALUES ('b')",
            vec![ScriptedResultSet::rowcount(1)],
        )
        .expect_query(
            "SELECT v FROM t",
            vec![ScriptedResultSet::rows(
                &["v"],
                vec![
                    vec![SqlValue::Text("a".into())],
                    vec![SqlValue::Text("b".into())],
                ],
            )],
        );
    let log = driver.log();

    let conn = Connection::open(driver, &config()).await?;

    conn.begin_transaction().await?;
    let i1 = conn.query_raw("INSERT INTO t (v) VALUES (?)", &[SqlValue::Text("a".into())]);
    let i2 = conn.query_raw("INSERT INTO t (v) VALUES (?)", &[SqlValue::Text("b".into())]);
    let i1 = i1.collect_results().await?;
    let i2 = i2.collect_results().await?;
    assert_eq!(i1[0].rows_affected, Some(1));
    assert_eq!(i2[0].rows_affected, Some(1));
    conn.commit().await?;

    let rows = conn
        .query_raw("SELECT v FROM t", &[])
        .collect_results()
        .await?;
    assert_eq!(
        rows[0].rows,
        vec![
            vec![SqlValue::Text("a".into())],
            vec![SqlValue::Text("b".into())],
        ]
    );
    conn.close().await?;

    let log = log.lock().unwrap().clone();
    assert_eq!(
        log,
        vec![
            "open:Driver={Scripted};Server=test;",
            "begin",
            "execute:INSERT INTO t (v) VALUES ('a')",
            "end_of_results",
            "execute:INSERT INTO t (v) VALUES ('b')",
            "end_of_results",
            "commit",
            "execute:SELECT v FROM t",
            "end_of_results",
            "close",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn rollback_scenario_returns_no_rows() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedDriver::new()
        .expect_any_query(vec![ScriptedResultSet::rowcount(1)])
        .expect_any_query(vec![ScriptedResultSet::rowcount(1)])
        .expect_query(
            "SELECT v FROM t",
            vec![ScriptedResultSet::rows(&["v"], vec![])],
        );
    let log = driver.log();

    let conn = Connection::open(driver, &config()).await?;

    conn.begin_transaction().await?;
    conn.query_raw("INSERT INTO t (v) VALUES ('a')", &[])
        .collect_results()
        .await?;
    conn.query_raw("INSERT INTO t (v) VALUES ('b')", &[])
        .collect_results()
        .await?;
    conn.rollback().await?;

    let rows = conn
        .query_raw("SELECT v FROM t", &[])
        .collect_results()
        .await?;
    assert!(rows[0].rows.is_empty());
    conn.close().await?;

    let log = log.lock().unwrap().clone();
    assert_eq!(log[1], "begin");
    assert_eq!(log[6], "rollback");
    Ok(())
}

#[tokio::test]
async fn transaction_control_queues_behind_queries() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedDriver::new()
        .expect_any_query(vec![ScriptedResultSet::rowcount(1)]);
    let log = driver.log();

    let conn = Connection::open(driver, &config()).await?;

    conn.begin_transaction().await?;
    // Submit the query and the commit back to back; the commit must wait for
    // the query to drain.
    let pending = conn.query_raw("INSERT INTO t (v) VALUES (1)", &[]);
    conn.commit().await?;
    pending.collect_results().await?;
    conn.close().await?;

    let log = log.lock().unwrap().clone();
    let execute = log
        .iter()
        .position(|e| e.starts_with("execute:"))
        .unwrap();
    let drained = log.iter().position(|e| e == "end_of_results").unwrap();
    let commit = log.iter().position(|e| e == "commit").unwrap();
    assert!(execute < drained && drained < commit);
    Ok(())
}

#[tokio::test]
async fn commit_failures_are_routed_to_the_caller() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedDriver::new()
        .fail_on_commit(DriverError::new("no transaction is active"))
        .expect_any_query(vec![ScriptedResultSet::rowcount(0)]);

    let conn = Connection::open(driver, &config()).await?;
    let err = conn.commit().await.unwrap_err();
    assert!(matches!(err, SqlRelayError::Driver(_)));

    // The failed commit must not block the queue.
    let packages = conn
        .query_raw("DELETE FROM t", &[])
        .collect_results()
        .await?;
    assert_eq!(packages[0].rows_affected, Some(0));

    conn.close().await?;
    Ok(())
}
